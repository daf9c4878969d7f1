// ============================================================
// Layer 3 — Annotations, Windows, and Span Records
// ============================================================
// Coordinates live in two systems:
//
//   context coordinates   → token indices into the full,
//                           unwindowed context block
//   assembled coordinates → token indices into the final
//                           [CLS] question [SEP] window [SEP]
//                           sequence fed to the model
//
// AnswerAnnotation and Window are in context coordinates.
// RemappedAnswer is in assembled coordinates.
// All spans are inclusive on both ends.

use serde::{Deserialize, Serialize};

use crate::domain::error::{PrepError, Result};

/// One labelled answer: a token span inside an unwindowed context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerAnnotation {
    pub question_id:  String,
    pub context_id:   String,
    pub answer_start: usize,
    /// Inclusive
    pub answer_end:   usize,
}

impl AnswerAnnotation {
    pub fn new(
        question_id:  impl Into<String>,
        context_id:   impl Into<String>,
        answer_start: usize,
        answer_end:   usize,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            context_id:  context_id.into(),
            answer_start,
            answer_end,
        }
    }

    /// Returns the length of the answer span in tokens
    pub fn span_length(&self) -> usize {
        self.answer_end.saturating_sub(self.answer_start) + 1
    }

    /// Reject spans that are reversed or run past the context.
    pub fn validate(&self, context_len: usize) -> Result<()> {
        if self.answer_end < self.answer_start {
            return Err(PrepError::integrity(format!(
                "answer for question '{}' ends before it starts ({} < {})",
                self.question_id, self.answer_end, self.answer_start
            )));
        }
        if self.answer_end >= context_len {
            return Err(PrepError::integrity(format!(
                "answer for question '{}' ends at token {} but context '{}' has {} tokens",
                self.question_id, self.answer_end, self.context_id, context_len
            )));
        }
        Ok(())
    }
}

/// Inclusive token range of one context window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    pub start: usize,
    pub end:   usize,
}

impl Window {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of tokens, never zero for an inclusive range
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Number of tokens shared with the inclusive range `[start, end]`.
    pub fn overlap(&self, start: usize, end: usize) -> usize {
        let lo = self.start.max(start);
        let hi = self.end.min(end);
        if hi < lo { 0 } else { hi - lo + 1 }
    }
}

/// Answer position in assembled coordinates, or the "no answer" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RemappedAnswer {
    pub start: usize,
    pub end:   usize,
}

impl RemappedAnswer {
    /// Both positions point at the first token, conventionally [CLS].
    pub const NONE: RemappedAnswer = RemappedAnswer { start: 0, end: 0 };

    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_answerable(&self) -> bool {
        *self != Self::NONE
    }
}

/// One row of the flat span table: an annotation seen through one window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpanRecord {
    pub question_id:      String,
    pub context_id:       String,
    pub subcontext_start: usize,
    pub subcontext_end:   usize,
    pub answer_start:     usize,
    pub answer_end:       usize,
}

impl SpanRecord {
    pub fn new(annotation: &AnswerAnnotation, window: Window, answer: RemappedAnswer) -> Self {
        Self {
            question_id:      annotation.question_id.clone(),
            context_id:       annotation.context_id.clone(),
            subcontext_start: window.start,
            subcontext_end:   window.end,
            answer_start:     answer.start,
            answer_end:       answer.end,
        }
    }

    pub fn window(&self) -> Window {
        Window::new(self.subcontext_start, self.subcontext_end)
    }

    pub fn answer(&self) -> RemappedAnswer {
        RemappedAnswer::new(self.answer_start, self.answer_end)
    }

    pub fn is_answerable(&self) -> bool {
        self.answer().is_answerable()
    }
}
