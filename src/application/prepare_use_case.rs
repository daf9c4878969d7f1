// ============================================================
// Layer 2 — PrepareUseCase
// ============================================================
// Turns a raw JSON corpus into a tokenized directory that the
// build step can read:
//
//   Step 1: Load the tokenizer              (Layer 6 - infra)
//   Step 2: Read the raw corpus             (Layer 6 - infra)
//   Step 3: Encode questions and contexts   (Layer 6 - infra)
//   Step 4: Map character answers → tokens  (Layer 6 - infra)
//   Step 5: Write blocks, answers_span.csv
//           and tokenizer_info.json         (Layer 6 - infra)
//
// Corpus format:
//   {
//     "questions": [{"id": "q1", "text": "who sat ?"}],
//     "contexts":  [{"id": "c1", "text": "the cat sat on the mat"}],
//     "answers":   [{"question_id": "q1", "context_id": "c1",
//                    "answer_start": 4, "answer_text": "cat"}]
//   }
// `answer_start` counts characters, not bytes.
//
// Reference: Rust Book §13 (Iterators and Closures)

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{
    annotation::AnswerAnnotation,
    block::{BlockKind, TokenizedBlock},
};
use crate::infra::{
    layout::{read_json, TokenizedLayout},
    tokenizer_store::{char_span_to_tokens, TokenizerStore},
};

// ─── Preparation Configuration ───────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareConfig {
    pub corpus_path:    String,
    pub tokenizer_path: String,
    pub output_dir:     String,
    pub cls_token:      String,
    pub sep_token:      String,
    pub pad_token:      String,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            corpus_path:    "data/corpus.json".to_string(),
            tokenizer_path: "tokenizer.json".to_string(),
            output_dir:     "data/tokenized".to_string(),
            cls_token:      "[CLS]".to_string(),
            sep_token:      "[SEP]".to_string(),
            pad_token:      "[PAD]".to_string(),
        }
    }
}

// ─── Raw Corpus ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawText {
    pub id:   String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAnswer {
    pub question_id:  String,
    pub context_id:   String,
    pub answer_start: usize,
    pub answer_text:  String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCorpus {
    #[serde(default)]
    pub questions: Vec<RawText>,
    #[serde(default)]
    pub contexts:  Vec<RawText>,
    #[serde(default)]
    pub answers:   Vec<RawAnswer>,
}

/// What a preparation run wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrepareSummary {
    pub questions:   usize,
    pub contexts:    usize,
    pub annotations: usize,
    /// Answers that could not be placed on context tokens
    pub skipped:     usize,
}

// ─── PrepareUseCase ───────────────────────────────────────────────────────────
pub struct PrepareUseCase {
    config: PrepareConfig,
}

impl PrepareUseCase {
    pub fn new(config: PrepareConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<PrepareSummary> {
        let cfg = &self.config;

        // ── Step 1: Tokenizer ────────────────────────────────────────────────
        let encoder = TokenizerStore::new(&cfg.tokenizer_path).load()?;
        let spec    = encoder.separator_spec(&cfg.cls_token, &cfg.sep_token, &cfg.pad_token)?;

        // ── Step 2: Corpus ───────────────────────────────────────────────────
        let corpus: RawCorpus = read_json(Path::new(&cfg.corpus_path))
            .with_context(|| format!("Cannot read corpus '{}'", cfg.corpus_path))?;
        tracing::info!(
            "Corpus: {} questions, {} contexts, {} answers",
            corpus.questions.len(),
            corpus.contexts.len(),
            corpus.answers.len()
        );

        let layout = TokenizedLayout::new(&cfg.output_dir);

        // ── Step 3: Encode and write blocks ──────────────────────────────────
        for q in &corpus.questions {
            let block = encoder.encode(&q.text)?;
            layout.write_block(BlockKind::Question, &q.id, &block)?;
        }

        let mut contexts: HashMap<&str, (&str, TokenizedBlock)> = HashMap::new();
        for c in &corpus.contexts {
            let block = encoder.encode(&c.text)?;
            layout.write_block(BlockKind::Context, &c.id, &block)?;
            contexts.insert(c.id.as_str(), (c.text.as_str(), block));
        }
        tracing::info!("Wrote blocks to '{}'", layout.root().display());

        // ── Step 4: Answers ──────────────────────────────────────────────────
        let mut annotations = Vec::with_capacity(corpus.answers.len());
        let mut skipped     = 0;
        for answer in &corpus.answers {
            match locate_answer(answer, &contexts) {
                Some(annotation) => annotations.push(annotation),
                None => {
                    tracing::warn!(
                        "Skipping answer of '{}' in '{}' at char {}: not found on context tokens",
                        answer.question_id,
                        answer.context_id,
                        answer.answer_start
                    );
                    skipped += 1;
                }
            }
        }

        // ── Step 5: Metadata ─────────────────────────────────────────────────
        layout.write_annotations(&annotations)?;
        layout.write_separator_spec(&spec)?;
        tracing::info!(
            "Prepared {} annotations ({} skipped) in '{}'",
            annotations.len(),
            skipped,
            layout.root().display()
        );

        Ok(PrepareSummary {
            questions:   corpus.questions.len(),
            contexts:    corpus.contexts.len(),
            annotations: annotations.len(),
            skipped,
        })
    }
}

/// Token span of `answer` inside its context, if the text matches
/// at the given character offset and covers at least one token.
fn locate_answer(
    answer:   &RawAnswer,
    contexts: &HashMap<&str, (&str, TokenizedBlock)>,
) -> Option<AnswerAnnotation> {
    let (text, block) = contexts.get(answer.context_id.as_str())?;

    let len = answer.answer_text.chars().count();
    let found: String = text.chars().skip(answer.answer_start).take(len).collect();
    if len == 0 || found != answer.answer_text {
        return None;
    }

    let (start, end) =
        char_span_to_tokens(&block.offset_mapping, answer.answer_start, answer.answer_start + len)?;
    Some(AnswerAnnotation::new(&answer.question_id, &answer.context_id, start, end))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::separator::SeparatorSpec;
    use crate::infra::tokenizer_store::write_test_tokenizer;

    fn answer(q: &str, c: &str, start: usize, text: &str) -> RawAnswer {
        RawAnswer {
            question_id:  q.to_string(),
            context_id:   c.to_string(),
            answer_start: start,
            answer_text:  text.to_string(),
        }
    }

    fn corpus() -> RawCorpus {
        RawCorpus {
            questions: vec![
                RawText { id: "q1".into(), text: "who sat ?".into() },
                RawText { id: "q2".into(), text: "the mat ?".into() },
            ],
            contexts: vec![RawText { id: "c1".into(), text: "the cat sat on the mat".into() }],
            answers: vec![
                answer("q1", "c1", 4, "cat"),
                answer("q2", "c1", 19, "mat"),
                answer("q2", "c1", 0, "dog"),     // text mismatch
                answer("q2", "c9", 0, "the"),     // unknown context
                answer("q1", "c1", 100, "cat"),   // past the end
            ],
        }
    }

    fn run(dir: &Path) -> (PrepareSummary, TokenizedLayout) {
        let tokenizer = write_test_tokenizer(dir);
        let corpus_path = dir.join("corpus.json");
        std::fs::write(&corpus_path, serde_json::to_string(&corpus()).unwrap()).unwrap();

        let cfg = PrepareConfig {
            corpus_path:    corpus_path.display().to_string(),
            tokenizer_path: tokenizer.display().to_string(),
            output_dir:     dir.join("tokenized").display().to_string(),
            ..PrepareConfig::default()
        };
        let summary = PrepareUseCase::new(cfg.clone()).execute().unwrap();
        (summary, TokenizedLayout::new(&cfg.output_dir))
    }

    #[test]
    fn test_prepare_writes_layout() {
        let dir = tempfile::tempdir().unwrap();
        let (summary, layout) = run(dir.path());

        assert_eq!(
            summary,
            PrepareSummary { questions: 2, contexts: 1, annotations: 2, skipped: 3 }
        );
        assert_eq!(layout.list_ids(BlockKind::Question).unwrap(), vec!["q1", "q2"]);
        assert_eq!(layout.read_separator_spec().unwrap(), SeparatorSpec::bert(2, 3, 0));

        let context = layout.read_block(BlockKind::Context, "c1").unwrap();
        assert_eq!(context.input_ids, vec![4, 5, 6, 7, 4, 8]);
    }

    #[test]
    fn test_answers_mapped_to_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let (_, layout) = run(dir.path());

        let annotations = layout.read_annotations().unwrap();
        assert_eq!(annotations[0], AnswerAnnotation::new("q1", "c1", 1, 1));
        assert_eq!(annotations[1], AnswerAnnotation::new("q2", "c1", 5, 5));
    }

    #[test]
    fn test_locate_multi_token_answer() {
        let block = TokenizedBlock {
            input_ids:      vec![4, 5, 6],
            attention_mask: vec![1, 1, 1],
            offset_mapping: vec![(0, 3), (4, 7), (8, 11)],
            sequence_ids:   vec![Some(0); 3],
        };
        let mut contexts = HashMap::new();
        contexts.insert("c1", ("the cat sat", block));

        let found = locate_answer(&answer("q", "c1", 4, "cat sat"), &contexts).unwrap();
        assert_eq!((found.answer_start, found.answer_end), (1, 2));
        assert!(locate_answer(&answer("q", "c1", 4, ""), &contexts).is_none());
    }

    #[test]
    fn test_comma_in_question_id_survives_the_build_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = corpus();
        raw.questions[0].id = "who, exactly?".to_string();
        raw.answers[0].question_id = "who, exactly?".to_string();
        let corpus_path = dir.path().join("corpus.json");
        std::fs::write(&corpus_path, serde_json::to_string(&raw).unwrap()).unwrap();

        let cfg = PrepareConfig {
            corpus_path:    corpus_path.display().to_string(),
            tokenizer_path: write_test_tokenizer(dir.path()).display().to_string(),
            output_dir:     dir.path().join("tokenized").display().to_string(),
            ..PrepareConfig::default()
        };
        PrepareUseCase::new(cfg.clone()).execute().unwrap();

        let layout      = TokenizedLayout::new(&cfg.output_dir);
        let annotations = layout.read_annotations().unwrap();
        assert_eq!(annotations[0], AnswerAnnotation::new("who, exactly?", "c1", 1, 1));
        assert!(layout.read_block(BlockKind::Question, "who, exactly?").is_ok());
    }

    #[test]
    fn test_path_like_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = corpus();
        raw.contexts[0].id = "../escape".to_string();
        let corpus_path = dir.path().join("corpus.json");
        std::fs::write(&corpus_path, serde_json::to_string(&raw).unwrap()).unwrap();

        let cfg = PrepareConfig {
            corpus_path:    corpus_path.display().to_string(),
            tokenizer_path: write_test_tokenizer(dir.path()).display().to_string(),
            output_dir:     dir.path().join("tokenized").display().to_string(),
            ..PrepareConfig::default()
        };
        let err = PrepareUseCase::new(cfg).execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::domain::error::PrepError>(),
            Some(crate::domain::error::PrepError::DataIntegrity { .. })
        ));
    }

    #[test]
    fn test_missing_corpus_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PrepareConfig {
            corpus_path:    dir.path().join("none.json").display().to_string(),
            tokenizer_path: write_test_tokenizer(dir.path()).display().to_string(),
            output_dir:     dir.path().join("out").display().to_string(),
            ..PrepareConfig::default()
        };
        assert!(PrepareUseCase::new(cfg).execute().is_err());
    }
}
