// ============================================================
// Layer 4 — Windowing Pipeline
// ============================================================
// Turns long tokenized contexts plus answer annotations into
// fixed-length, labelled training windows.
//
//   AnswerAnnotation + blocks from the ContentStore
//       │
//       ▼
//   WindowPlan        → sliding windows over the context
//       │
//       ▼
//   AnswerRemapper    → answer present? where in the sequence?
//       │
//       ▼
//   SpanTableBuilder  → one flat row per (annotation, window)
//       │
//       ▼
//   Balancer          → answerable / unanswerable ratio
//       │
//       ▼
//   WindowDataset     → SampleAssembler on every access
//       │
//       ▼
//   WindowBatcher     → tensor batches for a Burn DataLoader
//
// The first three steps are pure functions; only the dataset
// touches the content store at access time.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Sliding window boundaries over one context
pub mod windows;

/// Inclusion rule and coordinate translation for answers
pub mod remapper;

/// Interleaves blocks and separators into padded sequences
pub mod assembler;

/// Builds the flat span table across all annotations
pub mod span_table;

/// Answerable / unanswerable rebalancing
pub mod balancer;

/// Implements Burn's Dataset trait over the span table
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Seeded train/validation split of question ids
pub mod splitter;
