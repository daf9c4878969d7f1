// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// goal per command (prepare a tokenized directory, or build
// windowed span tables from one).
//
// Rules for this layer:
//   - No windowing arithmetic here (that's Layer 4)
//   - No printing here (that's Layer 1)
//   - No direct file formats (that's Layer 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Raw corpus → tokenized directory
pub mod prepare_use_case;

// Tokenized directory → span tables, stats and samples
pub mod build_use_case;
