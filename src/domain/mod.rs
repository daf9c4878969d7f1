// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs, enums, and traits describing what the
// windowing engine works with:
//
//   - tokenized question/context blocks
//   - the separator template that interleaves them
//   - answer annotations, windows, and span records
//   - the error taxonomy shared by every layer below the CLI
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §6 (Enums), §10 (Traits)

/// Error taxonomy (configuration, lookup, data integrity)
pub mod error;

/// Tokenized question/context blocks and their kind
pub mod block;

/// Separator template: literal tokens and content slots
pub mod separator;

/// Answer annotations, windows, remapped answers, span records
pub mod annotation;

/// Core abstractions (content store, balancer)
pub mod traits;
