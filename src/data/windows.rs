// ============================================================
// Layer 4 — Window Span Generator
// ============================================================
// Splits a long tokenized context into overlapping windows that
// each fit next to the question inside one model input.
//
// Token budget for one window:
//
//   max_length = len_question + n_seps + subcontext_max_length
//
// Windows are an arithmetic progression:
//
//   step    = subcontext_max_length - stride
//   count   = (len_context - stride) / step + 1     (at least 1)
//   window  = (i * step, i * step + subcontext_max_length - 1)
//
// Example with subcontext_max_length=5, stride=2, len_context=10:
//   step = 3, count = (10 - 2) / 3 + 1 = 3
//   Window 0: (0, 4)
//   Window 1: (3, 7)    overlaps window 0 by 2 tokens
//   Window 2: (6, 10)   end runs past token 9
//
// The last window is NOT clamped to the context. Slicing it
// yields a shorter block which the assembler pads.
//
// Reference: Devlin et al. (2019) BERT paper - sliding window approach

use crate::domain::annotation::Window;
use crate::domain::error::{PrepError, Result};

/// Window layout for one (question, context) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlan {
    /// Tokens of context that fit in one window
    pub subcontext_max_length: usize,
    /// Distance between the starts of consecutive windows
    pub step: usize,
    /// Number of windows
    pub count: usize,
}

impl WindowPlan {
    /// Compute the plan, failing when the budget leaves no room to advance.
    pub fn new(
        len_question: usize,
        len_context:  usize,
        max_length:   usize,
        stride:       usize,
        n_seps:       usize,
    ) -> Result<Self> {
        if len_context < 1 {
            return Err(PrepError::configuration("cannot window an empty context"));
        }

        let reserved = len_question.saturating_add(n_seps);
        let subcontext_max_length = max_length
            .checked_sub(reserved)
            .filter(|&n| n > 0)
            .ok_or_else(|| PrepError::configuration(format!(
                "question ({len_question} tokens) plus {n_seps} separators leave no room \
                 for context within max_length {max_length}"
            )))?;

        let step = subcontext_max_length
            .checked_sub(stride)
            .filter(|&n| n > 0)
            .ok_or_else(|| PrepError::configuration(format!(
                "stride {stride} must be smaller than the window capacity {subcontext_max_length}"
            )))?;

        // a context shorter than the stride still gets one window
        let count = len_context.saturating_sub(stride) / step + 1;

        Ok(Self { subcontext_max_length, step, count })
    }

    /// Window `i` of the plan
    pub fn window(&self, i: usize) -> Window {
        let start = i * self.step;
        Window::new(start, start + self.subcontext_max_length - 1)
    }

    /// Iterate over every window in order. The plan is `Copy`,
    /// so the sequence can be restarted as often as needed.
    pub fn windows(&self) -> impl Iterator<Item = Window> + '_ {
        (0..self.count).map(move |i| self.window(i))
    }
}

/// Convenience wrapper returning the windows directly.
pub fn generate_windows(
    len_question: usize,
    len_context:  usize,
    max_length:   usize,
    stride:       usize,
    n_seps:       usize,
) -> Result<Vec<Window>> {
    let plan = WindowPlan::new(len_question, len_context, max_length, stride, n_seps)?;
    Ok(plan.windows().collect())
}
