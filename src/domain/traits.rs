// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The two collaborators the windowing engine depends on but
// does not implement itself:
//
//   ContentStore → where tokenized blocks come from
//                  (eager in-memory map, or lazy per-file reads)
//   Balancer     → how the answerable / unanswerable ratio of
//                  the span table is adjusted
//
// Both are programmed against as traits so the data layer never
// knows whether blocks live in RAM or on disk.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use std::sync::Arc;

use crate::domain::annotation::SpanRecord;
use crate::domain::block::{BlockKind, TokenizedBlock};
use crate::domain::error::Result;

// ─── ContentStore ─────────────────────────────────────────────────────────────
/// Keyed, read-only lookup of tokenized blocks.
///
/// Implementations:
///   - MemoryContentStore → every block loaded up front
///   - DiskContentStore   → one file read per lookup
///
/// Stores are shared by reference across readers, hence `Send + Sync`.
pub trait ContentStore: Send + Sync {
    /// Fetch a block, failing with `PrepError::Lookup` if the id is unknown.
    fn block(&self, kind: BlockKind, id: &str) -> Result<Arc<TokenizedBlock>>;
}

impl<S: ContentStore + ?Sized> ContentStore for Arc<S> {
    fn block(&self, kind: BlockKind, id: &str) -> Result<Arc<TokenizedBlock>> {
        (**self).block(kind, id)
    }
}

// ─── Balancer ─────────────────────────────────────────────────────────────────
/// Rebalances the span table between two classes of rows.
///
/// Contract: the output only contains rows taken from the input.
/// Balancing may drop or reorder rows but never invents one.
pub trait Balancer {
    fn balance(
        &self,
        rows:        Vec<SpanRecord>,
        is_positive: &dyn Fn(&SpanRecord) -> bool,
    ) -> Vec<SpanRecord>;
}
