// ============================================================
// Layer 4 — Windowed Q&A Dataset
// ============================================================
// Holds the balanced span table and turns rows into fixed-length
// samples on demand. Nothing is pre-assembled: every access
//
//   1. looks up the row's question and context blocks
//   2. slices the context to the row's window
//   3. interleaves question, window, and separators
//   4. pads to max_length and attaches the remapped labels
//
// Implements Burn's Dataset trait so a DataLoader can index it.
// The store is shared through an Arc and never mutated, so the
// dataset can be read from many loader threads at once.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

use std::collections::HashSet;
use std::sync::Arc;

use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::assembler::SampleAssembler;
use crate::data::span_table::{SpanTableBuilder, WindowParams};
use crate::domain::annotation::{AnswerAnnotation, RemappedAnswer, SpanRecord};
use crate::domain::block::BlockKind;
use crate::domain::error::{PrepError, Result};
use crate::domain::separator::SeparatorSpec;
use crate::domain::traits::{Balancer, ContentStore};

/// One fully assembled and padded training sample.
/// Sequence format: [CLS] question [SEP] window [SEP] [PAD]...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSample {
    pub input_ids:       Vec<u32>,
    pub attention_mask:  Vec<u32>,
    pub start_positions: usize,
    pub end_positions:   usize,
}

impl WindowSample {
    pub fn is_answerable(&self) -> bool {
        RemappedAnswer::new(self.start_positions, self.end_positions).is_answerable()
    }

    /// Token ids of the labelled answer, if this window has one
    pub fn answer_ids(&self) -> Option<&[u32]> {
        if !self.is_answerable() {
            return None;
        }
        self.input_ids.get(self.start_positions..=self.end_positions)
    }
}

/// Construction parameters for a WindowDataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowOptions {
    pub max_length:         usize,
    pub stride:             usize,
    pub min_answer_length:  usize,
    /// Build the span table on the rayon thread pool
    pub parallel:           bool,
    /// Keep only annotations of these questions
    pub selected_questions: Option<Vec<String>>,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            max_length:         512,
            stride:             128,
            min_answer_length:  1,
            parallel:           false,
            selected_questions: None,
        }
    }
}

impl WindowOptions {
    pub fn params(&self) -> WindowParams {
        WindowParams {
            max_length:        self.max_length,
            stride:            self.stride,
            min_answer_length: self.min_answer_length,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_length == 0 {
            return Err(PrepError::configuration("max_length must be positive"));
        }
        if self.min_answer_length == 0 {
            return Err(PrepError::configuration("min_answer_length must be at least 1"));
        }
        Ok(())
    }

    pub fn question_filter(&self) -> Option<HashSet<String>> {
        self.selected_questions
            .as_ref()
            .map(|ids| ids.iter().cloned().collect())
    }
}

pub struct WindowDataset {
    store:      Arc<dyn ContentStore>,
    spec:       SeparatorSpec,
    max_length: usize,
    rows:       Vec<SpanRecord>,
}

impl WindowDataset {
    /// Build the span table for `annotations`, balance it, and keep it.
    pub fn build(
        store:       Arc<dyn ContentStore>,
        spec:        SeparatorSpec,
        annotations: &[AnswerAnnotation],
        options:     &WindowOptions,
        balancer:    &dyn Balancer,
    ) -> Result<Self> {
        options.validate()?;
        check_two_slots(&spec)?;

        let selected: Vec<AnswerAnnotation>;
        let annotations = match options.question_filter() {
            Some(keep) => {
                selected = annotations
                    .iter()
                    .filter(|a| keep.contains(&a.question_id))
                    .cloned()
                    .collect();
                tracing::info!(
                    "Kept {} of {} annotations for {} selected questions",
                    selected.len(),
                    annotations.len(),
                    keep.len()
                );
                &selected[..]
            }
            None => annotations,
        };

        let rows = SpanTableBuilder::new(&*store, &spec, options.params())
            .parallel(options.parallel)
            .build_balanced(annotations, balancer)?;

        tracing::info!(
            "Span table ready: {} rows ({} answerable)",
            rows.len(),
            rows.iter().filter(|r| r.is_answerable()).count()
        );

        Ok(Self { store, spec, max_length: options.max_length, rows })
    }

    /// Wrap an already built table.
    pub fn from_rows(
        store:      Arc<dyn ContentStore>,
        spec:       SeparatorSpec,
        max_length: usize,
        rows:       Vec<SpanRecord>,
    ) -> Result<Self> {
        check_two_slots(&spec)?;
        Ok(Self { store, spec, max_length, rows })
    }

    pub fn rows(&self) -> &[SpanRecord] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn spec(&self) -> &SeparatorSpec {
        &self.spec
    }

    /// Assemble row `index`. `Ok(None)` past the end of the table.
    pub fn sample(&self, index: usize) -> Result<Option<WindowSample>> {
        let Some(row) = self.rows.get(index) else {
            return Ok(None);
        };

        let question = self.store.block(BlockKind::Question, &row.question_id)?;
        let context  = self.store.block(BlockKind::Context, &row.context_id)?;
        let window   = context.slice(row.subcontext_start, row.subcontext_end);

        let padded = SampleAssembler::new(&self.spec, self.max_length)
            .assemble(&question, &window)?;

        Ok(Some(WindowSample {
            input_ids:       padded.input_ids,
            attention_mask:  padded.attention_mask,
            start_positions: row.answer_start,
            end_positions:   row.answer_end,
        }))
    }
}

fn check_two_slots(spec: &SeparatorSpec) -> Result<()> {
    if spec.content_slots() != 2 {
        return Err(PrepError::configuration(format!(
            "separator template must have exactly 2 content slots (question, context), found {}",
            spec.content_slots()
        )));
    }
    Ok(())
}

impl Dataset<WindowSample> for WindowDataset {
    fn get(&self, index: usize) -> Option<WindowSample> {
        match self.sample(index) {
            Ok(sample) => sample,
            Err(e) => {
                tracing::error!("Cannot assemble sample {}: {}", index, e);
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::data::balancer::{NoBalancing, Resampler};
    use crate::domain::block::TokenizedBlock;
    use crate::domain::separator::SeparatorEntry;
    use crate::infra::content_store::{DiskContentStore, MemoryContentStore};
    use crate::infra::layout::TokenizedLayout;

    fn blocks() -> (HashMap<String, TokenizedBlock>, HashMap<String, TokenizedBlock>) {
        let mut questions = HashMap::new();
        let mut contexts  = HashMap::new();
        questions.insert("q1".to_string(), TokenizedBlock::from_ids(vec![1, 2, 3]));
        questions.insert("q2".to_string(), TokenizedBlock::from_ids(vec![4, 4]));
        contexts.insert("c1".to_string(), TokenizedBlock::from_ids((10..16).collect()));
        contexts.insert("c2".to_string(), TokenizedBlock::from_ids((100..125).collect()));
        (questions, contexts)
    }

    fn memory_store() -> Arc<dyn ContentStore> {
        let (q, c) = blocks();
        Arc::new(MemoryContentStore::from_blocks(q, c))
    }

    fn one_sep() -> SeparatorSpec {
        use SeparatorEntry::*;
        SeparatorSpec::new(vec![ContentSlot, Literal(5), ContentSlot], 0).unwrap()
    }

    fn options(max_length: usize, stride: usize) -> WindowOptions {
        WindowOptions { max_length, stride, ..WindowOptions::default() }
    }

    #[test]
    fn test_small_example_sample() {
        let ds = WindowDataset::build(
            memory_store(),
            one_sep(),
            &[AnswerAnnotation::new("q1", "c1", 2, 3)],
            &options(10, 1),
            &NoBalancing,
        )
        .unwrap();

        assert_eq!(ds.len(), 2);
        let s = ds.get(0).unwrap();
        assert_eq!(s.input_ids, vec![1, 2, 3, 5, 10, 11, 12, 13, 14, 15]);
        assert_eq!(s.attention_mask, vec![1; 10]);
        assert_eq!((s.start_positions, s.end_positions), (6, 7));
        assert_eq!(s.answer_ids(), Some(&[12u32, 13][..]));

        // tail window (5, 10) only holds token 5, then padding
        let tail = ds.get(1).unwrap();
        assert_eq!(tail.input_ids, vec![1, 2, 3, 5, 15, 0, 0, 0, 0, 0]);
        assert_eq!(tail.attention_mask, vec![1, 1, 1, 1, 1, 0, 0, 0, 0, 0]);
        assert!(!tail.is_answerable());
        assert_eq!(tail.answer_ids(), None);
    }

    #[test]
    fn test_every_sample_has_max_length() {
        let ds = WindowDataset::build(
            memory_store(),
            SeparatorSpec::bert(101, 102, 0),
            &[AnswerAnnotation::new("q2", "c2", 7, 9), AnswerAnnotation::new("q1", "c1", 0, 1)],
            &options(12, 2),
            &NoBalancing,
        )
        .unwrap();

        for i in 0..ds.len() {
            let s = ds.get(i).unwrap();
            assert_eq!(s.input_ids.len(), 12);
            assert_eq!(s.attention_mask.len(), 12);
            if let Some(ids) = s.answer_ids() {
                assert!(ids.iter().all(|&t| t >= 10));
            }
        }
        assert!(ds.get(ds.len()).is_none());
    }

    #[test]
    fn test_selected_questions_restrict_rows() {
        let opts = WindowOptions {
            selected_questions: Some(vec!["q2".to_string()]),
            ..options(12, 2)
        };
        let ds = WindowDataset::build(
            memory_store(),
            SeparatorSpec::bert(101, 102, 0),
            &[AnswerAnnotation::new("q2", "c2", 7, 9), AnswerAnnotation::new("q1", "c1", 0, 1)],
            &opts,
            &NoBalancing,
        )
        .unwrap();
        assert!(ds.rows().iter().all(|r| r.question_id == "q2"));
    }

    #[test]
    fn test_memory_and_lazy_modes_give_identical_samples() {
        let dir    = tempfile::tempdir().unwrap();
        let layout = TokenizedLayout::new(dir.path());
        let (q, c) = blocks();
        for (id, b) in &q {
            layout.write_block(BlockKind::Question, id, b).unwrap();
        }
        for (id, b) in &c {
            layout.write_block(BlockKind::Context, id, b).unwrap();
        }

        let annotations = [AnswerAnnotation::new("q2", "c2", 15, 18)];
        let spec = SeparatorSpec::bert(101, 102, 0);
        let build = |store: Arc<dyn ContentStore>| {
            WindowDataset::build(store, spec.clone(), &annotations, &options(10, 1), &Resampler::default())
                .unwrap()
        };

        let memory = build(Arc::new(MemoryContentStore::load(&layout, None).unwrap()));
        let lazy   = build(Arc::new(DiskContentStore::new(layout.clone())));

        assert_eq!(memory.rows(), lazy.rows());
        for i in 0..memory.len() {
            assert_eq!(memory.get(i), lazy.get(i));
        }
    }

    #[test]
    fn test_missing_block_fails_only_that_access() {
        let a = AnswerAnnotation::new("q1", "c1", 0, 0);
        let rows = vec![
            SpanRecord::new(&a, crate::domain::annotation::Window::new(0, 5), RemappedAnswer::new(4, 4)),
            SpanRecord {
                context_id: "gone".to_string(),
                ..SpanRecord::new(&a, crate::domain::annotation::Window::new(0, 5), RemappedAnswer::NONE)
            },
        ];
        let ds = WindowDataset::from_rows(memory_store(), one_sep(), 10, rows).unwrap();

        assert!(ds.sample(1).unwrap_err().is_lookup());
        assert!(ds.get(1).is_none());
        assert!(ds.sample(0).unwrap().is_some());
    }

    #[test]
    fn test_template_needs_two_slots() {
        use SeparatorEntry::*;
        let spec = SeparatorSpec::new(vec![Literal(1), ContentSlot], 0).unwrap();
        let err = WindowDataset::from_rows(memory_store(), spec, 10, Vec::new()).err().unwrap();
        assert!(matches!(err, PrepError::Configuration { .. }));
    }

    #[test]
    fn test_zero_min_answer_length_is_rejected() {
        let opts = WindowOptions { min_answer_length: 0, ..options(10, 1) };
        let err = WindowDataset::build(memory_store(), one_sep(), &[], &opts, &NoBalancing)
            .err()
            .unwrap();
        assert!(matches!(err, PrepError::Configuration { .. }));
    }
}
