// ============================================================
// Layer 3 — Separator Template
// ============================================================
// Describes how a question block, a context window, and literal
// separator tokens are interleaved into one training sequence.
//
// BERT-style models use:
//
//   [CLS]  question  [SEP]  context  [SEP]
//   Lit    Slot      Lit    Slot     Lit
//
// On disk the template is a list of integers where -1 marks a
// content slot and any other value is a literal token id. Here
// it becomes a tagged enum so no token id is ever reserved.
//
// Two counts are derived once and reused for every window:
//   n_seps               → total literal tokens in the template
//   seps_before_context  → literal tokens placed before the
//                          last content slot (the context)

use serde::{Deserialize, Serialize};

use crate::domain::error::{PrepError, Result};

/// Value marking a content slot in the serialized template.
pub const CONTENT_SLOT_MARKER: i64 = -1;

/// One entry of the separator template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparatorEntry {
    /// Insert exactly this token id.
    Literal(u32),
    /// Insert the next pending content block in full.
    ContentSlot,
}

impl TryFrom<i64> for SeparatorEntry {
    type Error = PrepError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            CONTENT_SLOT_MARKER => Ok(SeparatorEntry::ContentSlot),
            v if v >= 0 => u32::try_from(v)
                .map(SeparatorEntry::Literal)
                .map_err(|_| PrepError::configuration(format!(
                    "separator token id {v} does not fit in u32"
                ))),
            v => Err(PrepError::configuration(format!(
                "separator value {v} is neither a token id nor the content marker {CONTENT_SLOT_MARKER}"
            ))),
        }
    }
}

impl From<SeparatorEntry> for i64 {
    fn from(entry: SeparatorEntry) -> Self {
        match entry {
            SeparatorEntry::Literal(id) => i64::from(id),
            SeparatorEntry::ContentSlot => CONTENT_SLOT_MARKER,
        }
    }
}

/// Serialized form stored in `tokenizer_info.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizerInfo {
    #[serde(alias = "seperators")]
    pub separators: Vec<i64>,
    pub padding_id: u32,
}

/// Validated separator template plus the padding token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatorSpec {
    entries:             Vec<SeparatorEntry>,
    padding_id:          u32,
    n_seps:              usize,
    seps_before_context: usize,
}

impl SeparatorSpec {
    /// Validate a template. At least one content slot is required.
    pub fn new(entries: Vec<SeparatorEntry>, padding_id: u32) -> Result<Self> {
        let last_slot = entries
            .iter()
            .rposition(|e| *e == SeparatorEntry::ContentSlot)
            .ok_or_else(|| PrepError::configuration(
                "separator template has no content slot"
            ))?;

        let is_literal = |e: &&SeparatorEntry| matches!(e, SeparatorEntry::Literal(_));
        let n_seps              = entries.iter().filter(is_literal).count();
        let seps_before_context = entries[..last_slot].iter().filter(is_literal).count();

        Ok(Self { entries, padding_id, n_seps, seps_before_context })
    }

    /// The usual `[CLS] question [SEP] context [SEP]` layout.
    pub fn bert(cls_id: u32, sep_id: u32, padding_id: u32) -> Self {
        use SeparatorEntry::*;
        let entries = vec![Literal(cls_id), ContentSlot, Literal(sep_id), ContentSlot, Literal(sep_id)];
        Self {
            entries,
            padding_id,
            n_seps: 3,
            seps_before_context: 2,
        }
    }

    pub fn entries(&self) -> &[SeparatorEntry] {
        &self.entries
    }

    pub fn padding_id(&self) -> u32 {
        self.padding_id
    }

    /// Number of literal tokens the template inserts
    pub fn n_seps(&self) -> usize {
        self.n_seps
    }

    /// Number of literal tokens placed before the context slot
    pub fn seps_before_context(&self) -> usize {
        self.seps_before_context
    }

    /// Number of content blocks the template consumes
    pub fn content_slots(&self) -> usize {
        self.entries.len() - self.n_seps
    }

    pub fn to_info(&self) -> TokenizerInfo {
        TokenizerInfo {
            separators: self.entries.iter().map(|&e| i64::from(e)).collect(),
            padding_id: self.padding_id,
        }
    }
}

impl TryFrom<TokenizerInfo> for SeparatorSpec {
    type Error = PrepError;

    fn try_from(info: TokenizerInfo) -> Result<Self> {
        let entries = info
            .separators
            .into_iter()
            .map(SeparatorEntry::try_from)
            .collect::<Result<Vec<_>>>()?;
        SeparatorSpec::new(entries, info.padding_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(raw: &[i64]) -> Result<SeparatorSpec> {
        SeparatorSpec::try_from(TokenizerInfo { separators: raw.to_vec(), padding_id: 0 })
    }

    #[test]
    fn test_counts_for_bert_layout() {
        let s = spec(&[101, -1, 102, -1, 102]).unwrap();
        assert_eq!(s.n_seps(), 3);
        assert_eq!(s.seps_before_context(), 2);
        assert_eq!(s.content_slots(), 2);
        assert_eq!(s, SeparatorSpec::bert(101, 102, 0));
    }

    #[test]
    fn test_counts_for_single_separator() {
        let s = spec(&[-1, 5, -1]).unwrap();
        assert_eq!(s.n_seps(), 1);
        assert_eq!(s.seps_before_context(), 1);
    }

    #[test]
    fn test_trailing_literals_are_not_before_context() {
        let s = spec(&[-1, -1, 9, 9]).unwrap();
        assert_eq!(s.n_seps(), 2);
        assert_eq!(s.seps_before_context(), 0);
    }

    #[test]
    fn test_template_without_slot_is_rejected() {
        let err = spec(&[101, 102]).unwrap_err();
        assert!(matches!(err, PrepError::Configuration { .. }));
    }

    #[test]
    fn test_other_negative_values_are_rejected() {
        assert!(spec(&[-2, -1, -1]).is_err());
    }

    #[test]
    fn test_legacy_key_is_accepted() {
        let info: TokenizerInfo =
            serde_json::from_str(r#"{"seperators": [-1, 3, -1], "padding_id": 1}"#).unwrap();
        let s = SeparatorSpec::try_from(info.clone()).unwrap();
        assert_eq!(s.padding_id(), 1);
        assert_eq!(s.to_info(), info);
    }
}
