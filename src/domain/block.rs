// ============================================================
// Layer 3 — Tokenized Block Domain Type
// ============================================================
// A question or a context after tokenisation. Blocks are
// produced once by the preparation step and are read-only from
// then on; the windowing engine only ever slices and copies them.
//
// All four fields are parallel arrays indexed by token position:
//
//   input_ids       [ 2054, 2003, 1996, ... ]
//   attention_mask  [    1,    1,    1, ... ]
//   offset_mapping  [ (0,4), (5,7), (8,11), ... ]   char spans
//   sequence_ids    [ Some(0), Some(0), ... ]
//
// offset_mapping and sequence_ids are optional on disk: a block
// may leave them empty and consumers substitute neutral values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::{PrepError, Result};

/// The two kinds of block the content store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Question,
    Context,
}

impl BlockKind {
    /// Directory name used by the on-disk layout
    pub fn dir_name(self) -> &'static str {
        match self {
            BlockKind::Question => "question",
            BlockKind::Context  => "context",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// One tokenized question or context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenizedBlock {
    pub input_ids: Vec<u32>,

    pub attention_mask: Vec<u32>,

    #[serde(default)]
    pub offset_mapping: Vec<(usize, usize)>,

    #[serde(default)]
    pub sequence_ids: Vec<Option<usize>>,
}

impl TokenizedBlock {
    /// Build a block from ids alone, every token attended.
    pub fn from_ids(input_ids: Vec<u32>) -> Self {
        let attention_mask = vec![1; input_ids.len()];
        Self {
            input_ids,
            attention_mask,
            offset_mapping: Vec::new(),
            sequence_ids:   Vec::new(),
        }
    }

    /// Number of tokens in the block
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    /// Check that the parallel arrays agree in length.
    /// Optional fields may be empty but never partially filled.
    pub fn validate(&self, kind: BlockKind, id: &str) -> Result<()> {
        let n = self.len();
        let optional_ok = |len: usize| len == 0 || len == n;

        if self.attention_mask.len() != n
            || !optional_ok(self.offset_mapping.len())
            || !optional_ok(self.sequence_ids.len())
        {
            return Err(PrepError::integrity(format!(
                "{kind} block '{id}' has mismatched field lengths \
                 (input_ids={}, attention_mask={}, offset_mapping={}, sequence_ids={})",
                n,
                self.attention_mask.len(),
                self.offset_mapping.len(),
                self.sequence_ids.len(),
            )));
        }
        Ok(())
    }

    /// Offset of token `i`, or the neutral `(0, 0)` when offsets were not stored.
    pub fn offset_at(&self, i: usize) -> (usize, usize) {
        self.offset_mapping.get(i).copied().unwrap_or((0, 0))
    }

    /// Sequence id of token `i`, or `None` when sequence ids were not stored.
    pub fn sequence_id_at(&self, i: usize) -> Option<usize> {
        self.sequence_ids.get(i).copied().flatten()
    }

    /// Copy tokens `start..=end` into a new block.
    ///
    /// `end` may run past the last token: the final window of a
    /// context is never clamped, so the slice simply comes back
    /// shorter and is padded later by the assembler.
    pub fn slice(&self, start: usize, end: usize) -> TokenizedBlock {
        let n    = self.len();
        let from = start.min(n);
        let to   = end.saturating_add(1).min(n).max(from);

        let take_optional = |len: usize| len == n;

        TokenizedBlock {
            input_ids:      self.input_ids[from..to].to_vec(),
            attention_mask: self.attention_mask[from..to].to_vec(),
            offset_mapping: if take_optional(self.offset_mapping.len()) {
                self.offset_mapping[from..to].to_vec()
            } else {
                Vec::new()
            },
            sequence_ids: if take_optional(self.sequence_ids.len()) {
                self.sequence_ids[from..to].to_vec()
            } else {
                Vec::new()
            },
        }
    }
}
