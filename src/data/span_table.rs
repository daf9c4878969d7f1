// ============================================================
// Layer 4 — Span Table Builder
// ============================================================
// Runs the window generator and the answer remapper over every
// annotation and flattens the result into one table:
//
//   annotation (q1, c1, 40..=42)
//       │
//       ▼  windows of c1 next to q1
//   (0, 99) (64, 163) (128, 227) ...
//       │
//       ▼  remap per window
//   SpanRecord(q1, c1,   0,  99, 52, 54)
//   SpanRecord(q1, c1,  64, 163,  0,  0)
//   ...
//
// Row order is annotation order, then window order. Per-annotation
// work is independent; in parallel mode rayon's indexed collect
// keeps the same order, so both modes return identical tables.
//
// Any configuration or integrity error aborts the whole build:
// there is no such thing as a partial table.

use rayon::prelude::*;

use crate::data::remapper::AnswerRemapper;
use crate::data::windows::WindowPlan;
use crate::domain::annotation::{AnswerAnnotation, SpanRecord};
use crate::domain::block::BlockKind;
use crate::domain::error::Result;
use crate::domain::separator::SeparatorSpec;
use crate::domain::traits::{Balancer, ContentStore};

/// Window budget shared by every annotation of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowParams {
    pub max_length:        usize,
    pub stride:            usize,
    pub min_answer_length: usize,
}

pub struct SpanTableBuilder<'a, S: ContentStore + ?Sized> {
    store:    &'a S,
    spec:     &'a SeparatorSpec,
    params:   WindowParams,
    parallel: bool,
}

impl<'a, S: ContentStore + ?Sized> SpanTableBuilder<'a, S> {
    pub fn new(store: &'a S, spec: &'a SeparatorSpec, params: WindowParams) -> Self {
        Self { store, spec, params, parallel: false }
    }

    /// Spread per-annotation work over the rayon thread pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Every window of one annotation, remapped.
    pub fn spans_for(&self, annotation: &AnswerAnnotation) -> Result<Vec<SpanRecord>> {
        let question = self.store.block(BlockKind::Question, &annotation.question_id)?;
        let context  = self.store.block(BlockKind::Context, &annotation.context_id)?;

        question.validate(BlockKind::Question, &annotation.question_id)?;
        context.validate(BlockKind::Context, &annotation.context_id)?;
        annotation.validate(context.len())?;

        let plan = WindowPlan::new(
            question.len(),
            context.len(),
            self.params.max_length,
            self.params.stride,
            self.spec.n_seps(),
        )?;

        let remapper = AnswerRemapper::new(
            question.len(),
            self.spec.seps_before_context(),
            self.params.min_answer_length,
        );

        Ok(remapper
            .remap_all(plan.windows(), annotation.answer_start, annotation.answer_end)
            .map(|(window, answer)| SpanRecord::new(annotation, window, answer))
            .collect())
    }

    /// The flat, unbalanced table.
    pub fn build(&self, annotations: &[AnswerAnnotation]) -> Result<Vec<SpanRecord>> {
        let per_annotation: Vec<Vec<SpanRecord>> = if self.parallel {
            annotations
                .par_iter()
                .map(|a| self.spans_for(a))
                .collect::<Result<_>>()?
        } else {
            annotations
                .iter()
                .map(|a| self.spans_for(a))
                .collect::<Result<_>>()?
        };

        let rows: Vec<SpanRecord> = per_annotation.into_iter().flatten().collect();

        tracing::info!(
            "Generated {} window spans from {} annotations",
            rows.len(),
            annotations.len()
        );
        Ok(rows)
    }

    /// Build, then rebalance answerable against unanswerable rows.
    pub fn build_balanced(
        &self,
        annotations: &[AnswerAnnotation],
        balancer:    &dyn Balancer,
    ) -> Result<Vec<SpanRecord>> {
        let rows = self.build(annotations)?;
        Ok(balancer.balance(rows, &|r: &SpanRecord| r.is_answerable()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::balancer::Resampler;
    use crate::domain::annotation::{RemappedAnswer, Window};
    use crate::domain::block::TokenizedBlock;
    use crate::domain::error::PrepError;
    use crate::domain::separator::{SeparatorEntry, SeparatorSpec};
    use crate::infra::content_store::MemoryContentStore;

    fn store() -> MemoryContentStore {
        let mut questions = std::collections::HashMap::new();
        let mut contexts  = std::collections::HashMap::new();
        questions.insert("q1".to_string(), TokenizedBlock::from_ids(vec![1, 2, 3]));
        questions.insert("q2".to_string(), TokenizedBlock::from_ids(vec![4, 5]));
        contexts.insert("c1".to_string(), TokenizedBlock::from_ids((10..16).collect()));
        contexts.insert("c2".to_string(), TokenizedBlock::from_ids((100..140).collect()));
        MemoryContentStore::from_blocks(questions, contexts)
    }

    fn one_sep() -> SeparatorSpec {
        use SeparatorEntry::*;
        SeparatorSpec::new(vec![ContentSlot, Literal(5), ContentSlot], 0).unwrap()
    }

    fn params(max_length: usize, stride: usize) -> WindowParams {
        WindowParams { max_length, stride, min_answer_length: 1 }
    }

    #[test]
    fn test_small_example_rows() {
        let store = store();
        let spec  = one_sep();
        let b     = SpanTableBuilder::new(&store, &spec, params(10, 1));

        let rows = b.build(&[AnswerAnnotation::new("q1", "c1", 2, 3)]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].window(), Window::new(0, 5));
        assert_eq!(rows[0].answer(), RemappedAnswer::new(6, 7));
        assert_eq!(rows[1].window(), Window::new(5, 10));
        assert_eq!(rows[1].answer(), RemappedAnswer::NONE);
    }

    #[test]
    fn test_rows_follow_annotation_then_window_order() {
        let store = store();
        let spec  = SeparatorSpec::bert(101, 102, 0);
        let b     = SpanTableBuilder::new(&store, &spec, params(16, 2));

        let annotations = vec![
            AnswerAnnotation::new("q2", "c2", 30, 31),
            AnswerAnnotation::new("q1", "c1", 0, 0),
        ];
        let rows = b.build(&annotations).unwrap();

        let first_q1 = rows.iter().position(|r| r.question_id == "q1").unwrap();
        assert!(rows[..first_q1].iter().all(|r| r.question_id == "q2"));
        assert!(rows[first_q1..].iter().all(|r| r.question_id == "q1"));
        for pair in rows[..first_q1].windows(2) {
            assert!(pair[0].subcontext_start < pair[1].subcontext_start);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let store = store();
        let spec  = SeparatorSpec::bert(101, 102, 0);
        let annotations: Vec<_> = (0..30)
            .map(|i| AnswerAnnotation::new(if i % 2 == 0 { "q1" } else { "q2" }, "c2", i, i + 3))
            .collect();

        let seq = SpanTableBuilder::new(&store, &spec, params(16, 3)).build(&annotations).unwrap();
        let par = SpanTableBuilder::new(&store, &spec, params(16, 3))
            .parallel(true)
            .build(&annotations)
            .unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn test_each_annotation_is_answerable_somewhere() {
        let store = store();
        let spec  = SeparatorSpec::bert(101, 102, 0);
        let b     = SpanTableBuilder::new(&store, &spec, params(16, 4));
        for start in 0..38 {
            let rows = b.build(&[AnswerAnnotation::new("q2", "c2", start, start + 2)]).unwrap();
            assert!(rows.iter().any(|r| r.is_answerable()), "answer at {start} lost");
        }
    }

    #[test]
    fn test_out_of_range_annotation_fails_the_build() {
        let store = store();
        let spec  = one_sep();
        let b     = SpanTableBuilder::new(&store, &spec, params(10, 1));
        let err = b
            .build(&[
                AnswerAnnotation::new("q1", "c1", 1, 2),
                AnswerAnnotation::new("q1", "c1", 4, 6),
            ])
            .unwrap_err();
        assert!(matches!(err, PrepError::DataIntegrity { .. }));
    }

    #[test]
    fn test_unknown_context_is_a_lookup_error() {
        let store = store();
        let spec  = one_sep();
        let b     = SpanTableBuilder::new(&store, &spec, params(10, 1));
        let err = b.build(&[AnswerAnnotation::new("q1", "missing", 0, 0)]).unwrap_err();
        assert!(err.is_lookup());
    }

    #[test]
    fn test_budget_error_surfaces() {
        let store = store();
        let spec  = SeparatorSpec::bert(101, 102, 0);
        // question 3 + 3 separators = 6 = max_length
        let b = SpanTableBuilder::new(&store, &spec, params(6, 0));
        let err = b.build(&[AnswerAnnotation::new("q1", "c1", 0, 0)]).unwrap_err();
        assert!(matches!(err, PrepError::Configuration { .. }));
    }

    #[test]
    fn test_balanced_build_keeps_every_answerable_row() {
        let store = store();
        let spec  = SeparatorSpec::bert(101, 102, 0);
        let b     = SpanTableBuilder::new(&store, &spec, params(12, 1));
        let annotations = vec![AnswerAnnotation::new("q2", "c2", 3, 4)];

        let raw      = b.build(&annotations).unwrap();
        let balanced = b.build_balanced(&annotations, &Resampler::new(1.0, 1)).unwrap();

        let answerable = raw.iter().filter(|r| r.is_answerable()).count();
        assert!(answerable > 0);
        assert_eq!(balanced.iter().filter(|r| r.is_answerable()).count(), answerable);
        assert_eq!(balanced.len(), 2 * answerable);
    }
}
