// ============================================================
// Layer 6 — Tokenized Directory Layout
// ============================================================
// Everything the preparation step writes and the dataset reads
// lives under one directory:
//
//   tokenized/
//     tokenizer_info.json     ← separator template + padding id
//     answers_span.csv        ← question_id,context_id,answer_start,answer_end
//     question/
//       q-001.json            ← one TokenizedBlock per identifier
//       ...
//     context/
//       doc-17.json
//       ...
//
// Blocks are serde_json documents. The CSV is small and has four
// plain columns, so it is read and written by hand; identifier
// fields are quoted when they contain commas or quotes.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::annotation::AnswerAnnotation;
use crate::domain::block::{BlockKind, TokenizedBlock};
use crate::domain::error::{PrepError, Result};
use crate::domain::separator::{SeparatorSpec, TokenizerInfo};

pub const TOKENIZER_INFO_FILE: &str = "tokenizer_info.json";
pub const ANSWERS_FILE:        &str = "answers_span.csv";
const ANSWERS_HEADER:          &str = "question_id,context_id,answer_start,answer_end";
const BLOCK_EXTENSION:         &str = "json";

/// Paths and readers/writers for one tokenized directory.
#[derive(Debug, Clone)]
pub struct TokenizedLayout {
    root: PathBuf,
}

impl TokenizedLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn block_dir(&self, kind: BlockKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    pub fn block_path(&self, kind: BlockKind, id: &str) -> PathBuf {
        self.block_dir(kind).join(format!("{id}.{BLOCK_EXTENSION}"))
    }

    // ─── Blocks ───────────────────────────────────────────────────────────────

    /// Read one block; a missing file is a lookup failure, not an I/O one.
    pub fn read_block(&self, kind: BlockKind, id: &str) -> Result<TokenizedBlock> {
        let path = self.block_path(kind, id);
        match File::open(&path) {
            Ok(file) => serde_json::from_reader(BufReader::new(file))
                .map_err(|e| PrepError::parse(&path, e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(PrepError::lookup(kind, id)),
            Err(e) => Err(PrepError::io(&path, e)),
        }
    }

    pub fn write_block(&self, kind: BlockKind, id: &str, block: &TokenizedBlock) -> Result<()> {
        check_id(kind, id)?;
        let dir = self.block_dir(kind);
        fs::create_dir_all(&dir).map_err(|e| PrepError::io(&dir, e))?;
        write_json(&self.block_path(kind, id), block)
    }

    /// Identifiers of every stored block of `kind`, sorted.
    pub fn list_ids(&self, kind: BlockKind) -> Result<Vec<String>> {
        let dir = self.block_dir(kind);
        let entries = fs::read_dir(&dir).map_err(|e| PrepError::io(&dir, e))?;

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| PrepError::io(&dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(BLOCK_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    // ─── Separator template ───────────────────────────────────────────────────

    pub fn read_separator_spec(&self) -> Result<SeparatorSpec> {
        let info: TokenizerInfo = read_json(&self.root.join(TOKENIZER_INFO_FILE))?;
        SeparatorSpec::try_from(info)
    }

    pub fn write_separator_spec(&self, spec: &SeparatorSpec) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| PrepError::io(&self.root, e))?;
        write_json(&self.root.join(TOKENIZER_INFO_FILE), &spec.to_info())
    }

    // ─── Answer annotations ───────────────────────────────────────────────────

    pub fn read_annotations(&self) -> Result<Vec<AnswerAnnotation>> {
        let path = self.root.join(ANSWERS_FILE);
        let file = File::open(&path).map_err(|e| PrepError::io(&path, e))?;
        parse_annotations(BufReader::new(file), &path)
    }

    pub fn write_annotations(&self, annotations: &[AnswerAnnotation]) -> Result<()> {
        for a in annotations {
            check_id(BlockKind::Question, &a.question_id)?;
            check_id(BlockKind::Context, &a.context_id)?;
        }

        fs::create_dir_all(&self.root).map_err(|e| PrepError::io(&self.root, e))?;
        let path = self.root.join(ANSWERS_FILE);
        let file = File::create(&path).map_err(|e| PrepError::io(&path, e))?;

        let mut w = BufWriter::new(file);
        let write_all = |w: &mut BufWriter<File>| -> io::Result<()> {
            writeln!(w, "{ANSWERS_HEADER}")?;
            for a in annotations {
                writeln!(
                    w,
                    "{},{},{},{}",
                    csv_field(&a.question_id),
                    csv_field(&a.context_id),
                    a.answer_start,
                    a.answer_end
                )?;
            }
            w.flush()
        };
        write_all(&mut w).map_err(|e| PrepError::io(&path, e))
    }
}

/// Parse `answers_span.csv`. Column order is taken from the header.
fn parse_annotations(reader: impl BufRead, path: &Path) -> Result<Vec<AnswerAnnotation>> {
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(line) => line.map_err(|e| PrepError::io(path, e))?,
        None => return Ok(Vec::new()),
    };
    let columns = split_row(&header)
        .map_err(|e| PrepError::parse(path, format!("line 1: {e}")))?;
    let column = |name: &str| {
        columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PrepError::parse(path, format!("missing column '{name}'")))
    };
    let (q_col, c_col, s_col, e_col) = (
        column("question_id")?,
        column("context_id")?,
        column("answer_start")?,
        column("answer_end")?,
    );

    let mut annotations = Vec::new();
    for (n, line) in lines.enumerate() {
        let line = line.map_err(|e| PrepError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        // data rows start on line 2
        let row_no = n + 2;
        let fields = split_row(&line)
            .map_err(|e| PrepError::parse(path, format!("line {row_no}: {e}")))?;
        let field = |i: usize| {
            fields.get(i).map(String::as_str).ok_or_else(|| {
                PrepError::parse(path, format!("line {row_no}: expected {} fields", columns.len()))
            })
        };
        let index = |i: usize| -> Result<usize> {
            let raw = field(i)?;
            raw.parse::<usize>().map_err(|_| {
                PrepError::parse(path, format!("line {row_no}: '{raw}' is not a token index"))
            })
        };

        annotations.push(AnswerAnnotation::new(
            field(q_col)?,
            field(c_col)?,
            index(s_col)?,
            index(e_col)?,
        ));
    }
    Ok(annotations)
}

// ─── CSV fields ───────────────────────────────────────────────────────────────
// Identifiers come straight from the corpus, so they may hold
// commas or quotes. Such fields are written quoted, with inner
// quotes doubled:
//
//   what, exactly?   →  "what, exactly?"
//   say "hi"         →  "say ""hi"""

/// Quote `value` when it would not survive a plain comma split.
pub fn csv_field(value: &str) -> Cow<'_, str> {
    let needs_quotes = value.contains([',', '"', '\n', '\r']) || value.trim() != value;
    if needs_quotes {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Split one CSV line. Unquoted fields are trimmed, quoted ones kept verbatim.
fn split_row(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut field  = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.trim().is_empty() && !quoted => {
                field.clear();
                quoted    = true;
                in_quotes = true;
            }
            ',' => fields.push(finish_field(&mut field, &mut quoted)),
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(finish_field(&mut field, &mut quoted));
    Ok(fields)
}

fn finish_field(field: &mut String, quoted: &mut bool) -> String {
    let value = std::mem::take(field);
    if std::mem::take(quoted) {
        value
    } else {
        value.trim().to_string()
    }
}

/// Identifiers double as file names and CSV fields.
fn check_id(kind: BlockKind, id: &str) -> Result<()> {
    let bad = id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\', '\n', '\r', '\0']);
    if bad {
        return Err(PrepError::integrity(format!(
            "{kind} id {id:?} cannot be stored: ids must be non-empty and free of \
             path separators and line breaks"
        )));
    }
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| PrepError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| PrepError::parse(path, e))
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(|e| PrepError::io(path, e))?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer(&mut w, value).map_err(|e| PrepError::parse(path, e))?;
    w.flush().map_err(|e| PrepError::io(path, e))
}
