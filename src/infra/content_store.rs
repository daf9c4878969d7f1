// ============================================================
// Layer 6 — Content Stores
// ============================================================
// Two implementations of the ContentStore trait:
//
//   MemoryContentStore → reads every block once at startup and
//                        serves lookups from two HashMaps.
//                        Unbounded memory, O(1) lookups.
//
//   DiskContentStore   → reads one JSON file per lookup.
//                        Bounded memory, one file read per call.
//
// Both hand out Arc<TokenizedBlock> and are immutable after
// construction, so a single store can be shared by every reader
// (data loader workers included). For the same identifiers they
// return identical blocks, so samples do not depend on the mode.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::domain::block::{BlockKind, TokenizedBlock};
use crate::domain::error::{PrepError, Result};
use crate::domain::traits::ContentStore;
use crate::infra::layout::TokenizedLayout;

// ─── MemoryContentStore ───────────────────────────────────────────────────────
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    questions: HashMap<String, Arc<TokenizedBlock>>,
    contexts:  HashMap<String, Arc<TokenizedBlock>>,
}

impl MemoryContentStore {
    pub fn from_blocks(
        questions: HashMap<String, TokenizedBlock>,
        contexts:  HashMap<String, TokenizedBlock>,
    ) -> Self {
        let wrap = |m: HashMap<String, TokenizedBlock>| -> HashMap<String, Arc<TokenizedBlock>> {
            m.into_iter().map(|(k, v)| (k, Arc::new(v))).collect()
        };
        Self {
            questions: wrap(questions),
            contexts:  wrap(contexts),
        }
    }

    /// Load every block under `layout`.
    /// With `selected_questions`, only those questions are kept in memory.
    pub fn load(layout: &TokenizedLayout, selected_questions: Option<&HashSet<String>>) -> Result<Self> {
        let contexts = load_kind(layout, BlockKind::Context, None)?;
        tracing::info!("Loaded {} contexts into memory", contexts.len());

        let questions = load_kind(layout, BlockKind::Question, selected_questions)?;
        tracing::info!("Loaded {} questions into memory", questions.len());

        Ok(Self { questions, contexts })
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }
}

fn load_kind(
    layout: &TokenizedLayout,
    kind:   BlockKind,
    only:   Option<&HashSet<String>>,
) -> Result<HashMap<String, Arc<TokenizedBlock>>> {
    let mut blocks = HashMap::new();
    for id in layout.list_ids(kind)? {
        if only.is_some_and(|keep| !keep.contains(&id)) {
            continue;
        }
        let block = layout.read_block(kind, &id)?;
        tracing::debug!("Loaded {} '{}' ({} tokens)", kind, id, block.len());
        blocks.insert(id, Arc::new(block));
    }
    Ok(blocks)
}

impl ContentStore for MemoryContentStore {
    fn block(&self, kind: BlockKind, id: &str) -> Result<Arc<TokenizedBlock>> {
        let map = match kind {
            BlockKind::Question => &self.questions,
            BlockKind::Context  => &self.contexts,
        };
        map.get(id)
            .cloned()
            .ok_or_else(|| PrepError::lookup(kind, id))
    }
}

// ─── DiskContentStore ─────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct DiskContentStore {
    layout: TokenizedLayout,
}

impl DiskContentStore {
    pub fn new(layout: TokenizedLayout) -> Self {
        Self { layout }
    }
}

impl ContentStore for DiskContentStore {
    fn block(&self, kind: BlockKind, id: &str) -> Result<Arc<TokenizedBlock>> {
        self.layout.read_block(kind, id).map(Arc::new)
    }
}
