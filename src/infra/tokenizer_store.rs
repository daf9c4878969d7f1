// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Loads a HuggingFace tokenizer.json and turns raw question and
// context strings into TokenizedBlocks for the content store.
//
// Questions and contexts are encoded separately and WITHOUT
// special tokens: [CLS]/[SEP] are inserted later, per window,
// by the separator template. Offsets are character offsets
// (encode_char_offsets) so answer spans given as character
// positions can be mapped onto tokens.
//
// Reference: tokenizers crate documentation

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokenizers::{Encoding, Tokenizer};

use crate::domain::block::TokenizedBlock;
use crate::domain::separator::SeparatorSpec;

pub struct TokenizerStore {
    path: PathBuf,
}

impl TokenizerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the tokenizer JSON file
    pub fn load(&self) -> Result<BlockEncoder> {
        let tokenizer = Tokenizer::from_file(&self.path).map_err(|e| {
            anyhow::anyhow!("Cannot load tokenizer from '{}': {}", self.path.display(), e)
        })?;
        tracing::info!("Loaded tokenizer from '{}'", self.path.display());
        Ok(BlockEncoder::new(tokenizer))
    }
}

/// Encodes text into blocks and resolves special tokens.
pub struct BlockEncoder {
    tokenizer: Tokenizer,
}

impl BlockEncoder {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }

    pub fn encode(&self, text: &str) -> Result<TokenizedBlock> {
        let encoding = self
            .tokenizer
            .encode_char_offsets(text, false)
            .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
        Ok(block_from_encoding(&encoding))
    }

    pub fn token_id(&self, token: &str) -> Result<u32> {
        self.tokenizer
            .token_to_id(token)
            .with_context(|| format!("Token '{token}' is not in the tokenizer vocabulary"))
    }

    /// `[CLS] question [SEP] context [SEP]` with ids from this vocabulary.
    pub fn separator_spec(&self, cls: &str, sep: &str, pad: &str) -> Result<SeparatorSpec> {
        Ok(SeparatorSpec::bert(
            self.token_id(cls)?,
            self.token_id(sep)?,
            self.token_id(pad)?,
        ))
    }
}

pub fn block_from_encoding(encoding: &Encoding) -> TokenizedBlock {
    TokenizedBlock {
        input_ids:      encoding.get_ids().to_vec(),
        attention_mask: encoding.get_attention_mask().to_vec(),
        offset_mapping: encoding.get_offsets().to_vec(),
        sequence_ids:   encoding.get_sequence_ids(),
    }
}

/// Map the character range `[char_start, char_end)` onto the
/// inclusive token span that covers it.
///
/// A token belongs to the answer if its characters intersect the
/// range. Returns None when no token does (empty or whitespace-only
/// answers, or offsets past the text).
pub fn char_span_to_tokens(
    offsets:    &[(usize, usize)],
    char_start: usize,
    char_end:   usize,
) -> Option<(usize, usize)> {
    let touches = |&(s, e): &(usize, usize)| s < char_end && e > char_start && e > s;

    let first = offsets.iter().position(touches)?;
    let last  = offsets.iter().rposition(touches)?;
    Some((first, last))
}

/// Tiny word-level tokenizer in HuggingFace JSON format.
#[cfg(test)]
pub(crate) fn write_test_tokenizer(dir: &std::path::Path) -> PathBuf {
    let json = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [
            {"id": 0, "content": "[PAD]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
            {"id": 1, "content": "[UNK]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
            {"id": 2, "content": "[CLS]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
            {"id": 3, "content": "[SEP]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
        ],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": {
                "[PAD]": 0, "[UNK]": 1, "[CLS]": 2, "[SEP]": 3,
                "the": 4, "cat": 5, "sat": 6, "on": 7, "mat": 8, "who": 9, "?": 10
            },
            "unk_token": "[UNK]"
        }
    });
    let path = dir.join("tokenizer.json");
    std::fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();
    path
}
