// ============================================================
// Layer 6 — Span Table Reports
// ============================================================
// Writes what a build produced so it can be inspected without
// re-running the pipeline:
//
//   <output_dir>/
//     dataset_config.json     ← parameters the table was built with
//     train_spans.csv         ← one row per window
//     train_stats.json        ← row counts per class
//     val_spans.csv / val_stats.json   (when a split was requested)
//
// Example CSV output:
//   question_id,context_id,subcontext_start,subcontext_end,answer_start,answer_end
//   q-001,doc-17,0,499,212,215
//   q-001,doc-17,372,871,0,0
//
// Reference: Rust Book §12 (I/O and File Handling)

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::annotation::SpanRecord;
use crate::infra::layout::csv_field;

/// Row counts of one span table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStats {
    pub rows:         usize,
    pub answerable:   usize,
    pub unanswerable: usize,
    pub questions:    usize,
    pub contexts:     usize,
}

impl TableStats {
    pub fn from_rows(rows: &[SpanRecord]) -> Self {
        let answerable = rows.iter().filter(|r| r.is_answerable()).count();
        let questions: HashSet<&str> = rows.iter().map(|r| r.question_id.as_str()).collect();
        let contexts:  HashSet<&str> = rows.iter().map(|r| r.context_id.as_str()).collect();

        Self {
            rows: rows.len(),
            answerable,
            unanswerable: rows.len() - answerable,
            questions: questions.len(),
            contexts:  contexts.len(),
        }
    }

    /// Fraction of windows carrying an answer, 0.0 for an empty table
    pub fn answerable_fraction(&self) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            self.answerable as f64 / self.rows as f64
        }
    }
}

/// Writes reports into one output directory.
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    /// Create the writer, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `<name>_spans.csv`.
    pub fn write_spans(&self, name: &str, rows: &[SpanRecord]) -> Result<PathBuf> {
        let path = self.dir.join(format!("{name}_spans.csv"));
        let file = File::create(&path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;
        let mut w = BufWriter::new(file);

        writeln!(w, "question_id,context_id,subcontext_start,subcontext_end,answer_start,answer_end")?;
        for r in rows {
            writeln!(
                w,
                "{},{},{},{},{},{}",
                csv_field(&r.question_id),
                csv_field(&r.context_id),
                r.subcontext_start,
                r.subcontext_end,
                r.answer_start,
                r.answer_end,
            )?;
        }
        w.flush()?;

        tracing::debug!("Wrote {} span rows to '{}'", rows.len(), path.display());
        Ok(path)
    }

    /// Write `<name>_stats.json`.
    pub fn write_stats(&self, name: &str, stats: &TableStats) -> Result<PathBuf> {
        self.write_json(&format!("{name}_stats.json"), stats)
    }

    /// Write the configuration a table was built with.
    pub fn write_config<T: Serialize>(&self, config: &T) -> Result<PathBuf> {
        self.write_json("dataset_config.json", config)
    }

    fn write_json<T: Serialize + ?Sized>(&self, file_name: &str, value: &T) -> Result<PathBuf> {
        let path = self.dir.join(file_name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        Ok(path)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::annotation::{AnswerAnnotation, RemappedAnswer, Window};

    fn rows() -> Vec<SpanRecord> {
        let a = AnswerAnnotation::new("q1", "c1", 2, 3);
        let b = AnswerAnnotation::new("q2", "c1", 0, 0);
        vec![
            SpanRecord::new(&a, Window::new(0, 5), RemappedAnswer::new(6, 7)),
            SpanRecord::new(&a, Window::new(5, 10), RemappedAnswer::NONE),
            SpanRecord::new(&b, Window::new(0, 5), RemappedAnswer::new(4, 4)),
        ]
    }

    #[test]
    fn test_stats() {
        let stats = TableStats::from_rows(&rows());
        assert_eq!(stats.rows, 3);
        assert_eq!(stats.answerable, 2);
        assert_eq!(stats.unanswerable, 1);
        assert_eq!(stats.questions, 2);
        assert_eq!(stats.contexts, 1);
        assert!((stats.answerable_fraction() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(TableStats::default().answerable_fraction(), 0.0);
    }

    #[test]
    fn test_spans_csv() {
        let dir    = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path().join("out")).unwrap();
        let path   = writer.write_spans("train", &rows()).unwrap();

        let text  = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "q1,c1,0,5,6,7");
        assert_eq!(lines[2], "q1,c1,5,10,0,0");
    }

    #[test]
    fn test_spans_csv_quotes_ids() {
        let dir    = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path()).unwrap();
        let a      = AnswerAnnotation::new("what, exactly?", "c1", 0, 0);
        let path   = writer
            .write_spans("train", &[SpanRecord::new(&a, Window::new(0, 5), RemappedAnswer::NONE)])
            .unwrap();

        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().nth(1), Some("\"what, exactly?\",c1,0,5,0,0"));
    }

    #[test]
    fn test_stats_json_round_trip() {
        let dir    = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path()).unwrap();
        let stats  = TableStats::from_rows(&rows());
        let path   = writer.write_stats("val", &stats).unwrap();

        let back: TableStats = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back, stats);
    }
}
