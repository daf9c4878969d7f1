// ============================================================
// Layer 4 — Sample Assembler
// ============================================================
// Interleaves a question block, a context window, and literal
// separator tokens into one fixed-length training sequence.
//
// Walk the separator template in order:
//
//   Literal(id)  → push one token: id, mask 1, offset (0,0), no seq id
//   ContentSlot  → push every token of the next pending block
//
// With template [CLS] Slot [SEP] Slot [SEP]:
//
//   [CLS] q0 q1 q2 [SEP] c0 c1 c2 c3 [SEP] [PAD] [PAD] ...
//
// Then right-pad input_ids with the padding id and the attention
// mask with 0 up to max_length. The assembled length before
// padding is len_question + len_window + n_seps; exceeding
// max_length means the window budget was computed wrong.

use std::collections::VecDeque;

use crate::domain::block::TokenizedBlock;
use crate::domain::error::{PrepError, Result};
use crate::domain::separator::{SeparatorEntry, SeparatorSpec};

/// Fixed-length model input before labels are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddedSequence {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
}

/// Assembles sequences for one separator template and length budget.
#[derive(Debug, Clone, Copy)]
pub struct SampleAssembler<'a> {
    spec:       &'a SeparatorSpec,
    max_length: usize,
}

impl<'a> SampleAssembler<'a> {
    pub fn new(spec: &'a SeparatorSpec, max_length: usize) -> Self {
        Self { spec, max_length }
    }

    /// Interleave `blocks` with the template's literals, without padding.
    ///
    /// Every field is carried through; blocks that did not store
    /// offsets or sequence ids contribute neutral values.
    pub fn combine(&self, blocks: &[&TokenizedBlock]) -> Result<TokenizedBlock> {
        let mut pending: VecDeque<&TokenizedBlock> = blocks.iter().copied().collect();

        let capacity = self.spec.n_seps() + blocks.iter().map(|b| b.len()).sum::<usize>();
        let mut out = TokenizedBlock {
            input_ids:      Vec::with_capacity(capacity),
            attention_mask: Vec::with_capacity(capacity),
            offset_mapping: Vec::with_capacity(capacity),
            sequence_ids:   Vec::with_capacity(capacity),
        };

        for entry in self.spec.entries() {
            match *entry {
                SeparatorEntry::Literal(token_id) => {
                    out.input_ids.push(token_id);
                    out.attention_mask.push(1);
                    out.offset_mapping.push((0, 0));
                    out.sequence_ids.push(None);
                }
                SeparatorEntry::ContentSlot => {
                    let block = pending.pop_front().ok_or_else(|| {
                        PrepError::configuration(format!(
                            "separator template has {} content slots but only {} blocks were supplied",
                            self.spec.content_slots(),
                            blocks.len()
                        ))
                    })?;
                    out.input_ids.extend_from_slice(&block.input_ids);
                    out.attention_mask.extend_from_slice(&block.attention_mask);
                    out.offset_mapping.extend((0..block.len()).map(|i| block.offset_at(i)));
                    out.sequence_ids.extend((0..block.len()).map(|i| block.sequence_id_at(i)));
                }
            }
        }

        if !pending.is_empty() {
            return Err(PrepError::configuration(format!(
                "separator template has {} content slots but {} blocks were supplied",
                self.spec.content_slots(),
                blocks.len()
            )));
        }

        Ok(out)
    }

    /// Combine a question and a context window, then pad to `max_length`.
    pub fn assemble(
        &self,
        question: &TokenizedBlock,
        context:  &TokenizedBlock,
    ) -> Result<PaddedSequence> {
        let combined = self.combine(&[question, context])?;

        let len = combined.len();
        if len > self.max_length {
            return Err(PrepError::configuration(format!(
                "assembled sequence has {len} tokens, more than max_length {}",
                self.max_length
            )));
        }

        let mut input_ids      = combined.input_ids;
        let mut attention_mask = combined.attention_mask;
        input_ids.resize(self.max_length, self.spec.padding_id());
        attention_mask.resize(self.max_length, 0);

        Ok(PaddedSequence { input_ids, attention_mask })
    }
}
