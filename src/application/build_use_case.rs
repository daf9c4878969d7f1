// ============================================================
// Layer 2 — BuildUseCase
// ============================================================
// Builds the window span table from a tokenized directory:
//
//   Step 1: Read tokenizer_info.json      (Layer 6 - infra)
//   Step 2: Read answers_span.csv         (Layer 6 - infra)
//   Step 3: Open the content store        (Layer 6 - infra)
//   Step 4: Split questions train/val     (Layer 4 - data)
//   Step 5: Build + balance span tables   (Layer 4 - data)
//   Step 6: Export tables, stats, config  (Layer 6 - infra)
//
// The same config also opens a single dataset for the `show`
// command, without a split or any export.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §4 (Datasets)

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    balancer::{NoBalancing, Resampler},
    dataset::{WindowDataset, WindowOptions},
    splitter::{distinct_questions, split_train_val},
};
use crate::domain::{
    annotation::AnswerAnnotation,
    separator::SeparatorSpec,
    traits::{Balancer, ContentStore},
};
use crate::infra::{
    content_store::{DiskContentStore, MemoryContentStore},
    layout::TokenizedLayout,
    report::{ReportWriter, TableStats},
};

// ─── Dataset Configuration ───────────────────────────────────────────────────
// Everything a build depends on. Saved next to the outputs so a
// table can be traced back to the parameters that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub tokenized_dir:       String,
    pub output_dir:          String,
    pub max_length:          usize,
    pub stride:              usize,
    pub min_answer_length:   usize,
    pub in_memory:           bool,
    pub parallel:            bool,
    pub selected_questions:  Option<Vec<String>>,
    /// Majority rows kept per minority row; None keeps every row
    pub balance_ratio:       Option<f64>,
    pub seed:                u64,
    /// Fraction of questions held out for validation
    pub validation_fraction: Option<f64>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            tokenized_dir:       "data/tokenized".to_string(),
            output_dir:          "output".to_string(),
            max_length:          512,
            stride:              128,
            min_answer_length:   1,
            in_memory:           true,
            parallel:            false,
            selected_questions:  None,
            balance_ratio:       Some(1.0),
            seed:                42,
            validation_fraction: None,
        }
    }
}

impl DatasetConfig {
    pub fn window_options(&self) -> WindowOptions {
        WindowOptions {
            max_length:         self.max_length,
            stride:             self.stride,
            min_answer_length:  self.min_answer_length,
            parallel:           self.parallel,
            selected_questions: self.selected_questions.clone(),
        }
    }

    fn balancer(&self) -> Box<dyn Balancer> {
        match self.balance_ratio {
            Some(ratio) => Box::new(Resampler::new(ratio, self.seed)),
            None        => Box::new(NoBalancing),
        }
    }
}

/// Row statistics of a finished build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub train:      TableStats,
    pub validation: Option<TableStats>,
}

// ─── BuildUseCase ─────────────────────────────────────────────────────────────
pub struct BuildUseCase {
    config: DatasetConfig,
}

impl BuildUseCase {
    pub fn new(config: DatasetConfig) -> Self {
        Self { config }
    }

    /// Build, balance and export the span table(s).
    pub fn execute(&self) -> Result<BuildSummary> {
        let cfg = &self.config;
        if let Some(f) = cfg.validation_fraction {
            anyhow::ensure!(
                (0.0..1.0).contains(&f),
                "validation_fraction must be in [0, 1), got {f}"
            );
        }

        // ── Steps 1-3: Inputs ────────────────────────────────────────────────
        let inputs   = Inputs::open(cfg)?;
        let options  = cfg.window_options();
        let balancer = cfg.balancer();

        // ── Steps 4-5: Split and build ───────────────────────────────────────
        let (train, validation) = match cfg.validation_fraction {
            Some(fraction) if fraction > 0.0 => {
                let questions = match &cfg.selected_questions {
                    Some(ids) => ids.clone(),
                    None      => distinct_questions(
                        inputs.annotations.iter().map(|a| a.question_id.as_str()),
                    ),
                };
                let (train_q, val_q) = split_train_val(questions, 1.0 - fraction, cfg.seed);
                tracing::info!(
                    "Split questions: {} training, {} validation",
                    train_q.len(),
                    val_q.len()
                );

                let train = inputs.dataset(&with_questions(&options, train_q), &*balancer)?;
                let val   = inputs.dataset(&with_questions(&options, val_q), &*balancer)?;
                (train, Some(val))
            }
            _ => (inputs.dataset(&options, &*balancer)?, None),
        };

        // ── Step 6: Export ───────────────────────────────────────────────────
        let writer = ReportWriter::new(&cfg.output_dir)?;
        writer.write_config(cfg)?;

        let train_stats = export(&writer, "train", &train)?;
        let val_stats = match &validation {
            Some(ds) => Some(export(&writer, "val", ds)?),
            None     => None,
        };

        tracing::info!("Reports written to '{}'", writer.dir().display());
        Ok(BuildSummary { train: train_stats, validation: val_stats })
    }

    /// One dataset over the whole (or selected) annotation set.
    pub fn open_dataset(&self) -> Result<WindowDataset> {
        let inputs = Inputs::open(&self.config)?;
        inputs.dataset(&self.config.window_options(), &*self.config.balancer())
    }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

struct Inputs {
    store:       Arc<dyn ContentStore>,
    spec:        SeparatorSpec,
    annotations: Vec<AnswerAnnotation>,
}

impl Inputs {
    fn open(cfg: &DatasetConfig) -> Result<Self> {
        let layout = TokenizedLayout::new(&cfg.tokenized_dir);

        let spec = layout
            .read_separator_spec()
            .with_context(|| format!("Cannot read separator template from '{}'", cfg.tokenized_dir))?;
        tracing::info!(
            "Separator template: {} literal tokens, {} before the context",
            spec.n_seps(),
            spec.seps_before_context()
        );

        let annotations = layout
            .read_annotations()
            .with_context(|| format!("Cannot read answer annotations from '{}'", cfg.tokenized_dir))?;
        tracing::info!("Read {} answer annotations", annotations.len());

        let store: Arc<dyn ContentStore> = if cfg.in_memory {
            let filter = cfg.window_options().question_filter();
            Arc::new(MemoryContentStore::load(&layout, filter.as_ref())?)
        } else {
            tracing::info!("Reading blocks lazily from '{}'", cfg.tokenized_dir);
            Arc::new(DiskContentStore::new(layout))
        };

        Ok(Self { store, spec, annotations })
    }

    fn dataset(&self, options: &WindowOptions, balancer: &dyn Balancer) -> Result<WindowDataset> {
        let dataset = WindowDataset::build(
            Arc::clone(&self.store),
            self.spec.clone(),
            &self.annotations,
            options,
            balancer,
        )?;
        Ok(dataset)
    }
}

fn with_questions(options: &WindowOptions, questions: Vec<String>) -> WindowOptions {
    WindowOptions {
        selected_questions: Some(questions),
        ..options.clone()
    }
}

fn export(writer: &ReportWriter, name: &str, dataset: &WindowDataset) -> Result<TableStats> {
    let stats = TableStats::from_rows(dataset.rows());
    tracing::info!(
        "{name}: {} windows, {} answerable ({:.1}%), {} questions, {} contexts",
        stats.rows,
        stats.answerable,
        stats.answerable_fraction() * 100.0,
        stats.questions,
        stats.contexts
    );
    writer.write_spans(name, dataset.rows())?;
    writer.write_stats(name, &stats)?;
    Ok(stats)
}
