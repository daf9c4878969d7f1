// ============================================================
// Layer 4 — Answer Remapper
// ============================================================
// Decides, window by window, whether an answer is "present" and
// translates it from context coordinates into the coordinates of
// the assembled sequence.
//
// Inclusion rule:
//
//   overlap   = |window ∩ answer|          (inclusive ranges)
//   threshold = min(answer_length, min_answer_length)
//   present  ⇔ overlap ≥ threshold
//
// Short answers must be fully inside the window. Long answers
// only need `min_answer_length` covered tokens, so a window that
// sees the tail of a long answer still counts it.
//
// Translation for a present answer:
//
//   mapped = position - window.start + len_question + seps_before_context
//
// A long answer may be only partly covered. Its ends are clipped
// to the window first so that the label always lands on a token
// of the context segment.

use crate::domain::annotation::{RemappedAnswer, Window};

/// Remaps answers for one (question, separator template) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerRemapper {
    /// Index of the first context token inside the assembled sequence
    context_offset:    usize,
    min_answer_length: usize,
}

impl AnswerRemapper {
    pub fn new(len_question: usize, seps_before_context: usize, min_answer_length: usize) -> Self {
        Self {
            context_offset: len_question + seps_before_context,
            min_answer_length,
        }
    }

    pub fn context_offset(&self) -> usize {
        self.context_offset
    }

    /// Whether `[ans_start, ans_end]` counts as present in `window`.
    /// A reversed span is never present.
    pub fn includes(&self, window: Window, ans_start: usize, ans_end: usize) -> bool {
        if ans_end < ans_start {
            return false;
        }
        let answer_length = ans_end - ans_start + 1;
        let threshold     = answer_length.min(self.min_answer_length);
        window.overlap(ans_start, ans_end) >= threshold
    }

    /// Remap `[ans_start, ans_end]` into `window`, or return the sentinel.
    pub fn remap(&self, window: Window, ans_start: usize, ans_end: usize) -> RemappedAnswer {
        if !self.includes(window, ans_start, ans_end) {
            return RemappedAnswer::NONE;
        }

        let start = ans_start.max(window.start);
        let end   = ans_end.min(window.end);

        RemappedAnswer::new(
            start - window.start + self.context_offset,
            end   - window.start + self.context_offset,
        )
    }

    /// Remap one answer against every window, in window order.
    pub fn remap_all<I>(
        &self,
        windows:   I,
        ans_start: usize,
        ans_end:   usize,
    ) -> impl Iterator<Item = (Window, RemappedAnswer)>
    where
        I: IntoIterator<Item = Window>,
    {
        let remapper = *self;
        windows
            .into_iter()
            .map(move |w| (w, remapper.remap(w, ans_start, ans_end)))
    }
}
