// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Filesystem and tokenizer concerns that the windowing engine
// only sees through traits:
//
//   layout.rs          — Where tokenized artifacts live on disk
//                        (blocks, tokenizer_info.json,
//                        answers_span.csv) and how they are read
//                        and written.
//
//   content_store.rs   — The two ContentStore implementations:
//                        eager in-memory maps and lazy per-file
//                        reads.
//
//   tokenizer_store.rs — Loads a HuggingFace tokenizer and turns
//                        raw text into TokenizedBlocks; maps
//                        character answer spans onto tokens.
//
//   report.rs          — Span table CSV export, row statistics,
//                        and the config used for a build.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling)

/// On-disk layout of a tokenized directory
pub mod layout;

/// Memory-resident and lazy content stores
pub mod content_store;

/// Tokenizer loading and text → block encoding
pub mod tokenizer_store;

/// Span table export and statistics
pub mod report;
