// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands and their flags:
//   prepare — tokenize a raw corpus into the block layout
//   build   — build, balance and export span tables
//   show    — print one assembled window sample
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::{build_use_case::DatasetConfig, prepare_use_case::PrepareConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Tokenize a raw JSON corpus into a tokenized directory
    Prepare(PrepareArgs),

    /// Build the windowed span table(s) and export them
    Build(BuildArgs),

    /// Print one assembled sample as JSON
    Show(ShowArgs),
}

// ─── prepare ──────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// JSON file with `questions`, `contexts` and `answers`
    #[arg(long)]
    pub corpus: String,

    /// HuggingFace tokenizer.json
    #[arg(long)]
    pub tokenizer: String,

    /// Directory to write blocks and metadata into
    #[arg(long, default_value = "data/tokenized")]
    pub output_dir: String,

    #[arg(long, default_value = "[CLS]")]
    pub cls_token: String,

    #[arg(long, default_value = "[SEP]")]
    pub sep_token: String,

    #[arg(long, default_value = "[PAD]")]
    pub pad_token: String,
}

impl From<PrepareArgs> for PrepareConfig {
    fn from(a: PrepareArgs) -> Self {
        PrepareConfig {
            corpus_path:    a.corpus,
            tokenizer_path: a.tokenizer,
            output_dir:     a.output_dir,
            cls_token:      a.cls_token,
            sep_token:      a.sep_token,
            pad_token:      a.pad_token,
        }
    }
}

// ─── Window parameters (shared by build and show) ─────────────────────────────
#[derive(Args, Debug)]
pub struct WindowArgs {
    /// Tokenized directory produced by `prepare`
    #[arg(long, default_value = "data/tokenized")]
    pub tokenized_dir: String,

    /// Total sequence length including question and separators
    #[arg(long, default_value_t = 512)]
    pub max_length: usize,

    /// Tokens shared by consecutive windows
    #[arg(long, default_value_t = 128)]
    pub stride: usize,

    /// Answer tokens a window must contain to count as answerable
    #[arg(long, default_value_t = 1)]
    pub min_answer_length: usize,

    /// Read blocks from disk on every access instead of loading them
    #[arg(long)]
    pub lazy: bool,

    /// Build the span table on all cores
    #[arg(long)]
    pub parallel: bool,

    /// Only use these question ids (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub questions: Option<Vec<String>>,

    /// Undersample the majority class to this multiple of the minority
    #[arg(long, default_value_t = 1.0)]
    pub balance_ratio: f64,

    /// Keep every window instead of balancing the table
    #[arg(long)]
    pub no_balance: bool,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl WindowArgs {
    fn into_config(self, output_dir: String, validation_fraction: Option<f64>) -> DatasetConfig {
        DatasetConfig {
            tokenized_dir:      self.tokenized_dir,
            output_dir,
            max_length:         self.max_length,
            stride:             self.stride,
            min_answer_length:  self.min_answer_length,
            in_memory:          !self.lazy,
            parallel:           self.parallel,
            selected_questions: self.questions,
            balance_ratio:      (!self.no_balance).then_some(self.balance_ratio),
            seed:               self.seed,
            validation_fraction,
        }
    }
}

// ─── build ────────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub window: WindowArgs,

    /// Directory for span CSVs, stats and dataset_config.json
    #[arg(long, default_value = "output")]
    pub output_dir: String,

    /// Fraction of questions held out as a validation table
    #[arg(long)]
    pub validation_fraction: Option<f64>,
}

impl From<BuildArgs> for DatasetConfig {
    fn from(a: BuildArgs) -> Self {
        a.window.into_config(a.output_dir, a.validation_fraction)
    }
}

// ─── show ─────────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub window: WindowArgs,

    /// Row of the span table to assemble
    #[arg(long, default_value_t = 0)]
    pub index: usize,
}

impl From<ShowArgs> for DatasetConfig {
    fn from(a: ShowArgs) -> Self {
        a.window.into_config(DatasetConfig::default().output_dir, None)
    }
}
