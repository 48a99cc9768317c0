//! Token counting and slicing over tiktoken vocabularies.
//!
//! Chunk budgeting operates on token counts, so boundary math has to use the
//! same vocabulary the downstream model bills against. Counts are budgeting
//! estimates, not exact billing, which is why an unknown model id falls back
//! to the default vocabulary instead of failing the caller.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, IntoStaticStr};
use tiktoken_rs::{CoreBPE, cl100k_base, get_bpe_from_model, o200k_base, p50k_base};

use crate::error::{Error, Result};
use crate::TRACING_TARGET;

/// A single token id within a vocabulary.
pub type TokenId = u32;

/// Known tiktoken vocabularies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, IntoStaticStr, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Vocabulary {
    /// The o200k_base vocabulary (gpt-4o family). Default fallback.
    #[default]
    O200kBase,
    /// The cl100k_base vocabulary (gpt-4 family).
    Cl100kBase,
    /// The p50k_base vocabulary (legacy completion models).
    P50kBase,
}

impl Vocabulary {
    fn load(self) -> Result<CoreBPE> {
        let bpe = match self {
            Self::O200kBase => o200k_base(),
            Self::Cl100kBase => cl100k_base(),
            Self::P50kBase => p50k_base(),
        };
        bpe.map_err(|e| Error::tokenization(e.to_string()))
    }
}

/// Deterministic tokenizer over a fixed vocabulary.
///
/// Cheaply cloneable; the underlying encoder is shared behind an `Arc`.
#[derive(Clone)]
pub struct Tokenizer {
    bpe: Arc<CoreBPE>,
    vocabulary: Vocabulary,
}

impl Tokenizer {
    /// Creates a tokenizer for the given vocabulary.
    pub fn new(vocabulary: Vocabulary) -> Result<Self> {
        Ok(Self {
            bpe: Arc::new(vocabulary.load()?),
            vocabulary,
        })
    }

    /// Creates a tokenizer with the default vocabulary.
    pub fn with_defaults() -> Result<Self> {
        Self::new(Vocabulary::default())
    }

    /// Creates a tokenizer for a model identifier.
    ///
    /// Unknown model ids fall back to the default vocabulary: an approximate
    /// count that is available beats an exact count that is not.
    pub fn for_model(model: &str) -> Result<Self> {
        match get_bpe_from_model(model) {
            Ok(bpe) => Ok(Self {
                bpe: Arc::new(bpe),
                vocabulary: Vocabulary::from_model(model),
            }),
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    model = %model,
                    error = %err,
                    "Unknown model id, falling back to default vocabulary"
                );
                Self::with_defaults()
            }
        }
    }

    /// Returns the vocabulary this tokenizer uses.
    pub fn vocabulary(&self) -> Vocabulary {
        self.vocabulary
    }

    /// Counts the tokens in `text`.
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Encodes `text` into its token sequence.
    pub fn encode(&self, text: &str) -> Vec<TokenId> {
        self.bpe.encode_ordinary(text)
    }

    /// Decodes a token sequence back into text.
    pub fn decode(&self, tokens: &[TokenId]) -> Result<String> {
        self.bpe
            .decode(tokens.to_vec())
            .map_err(|e| Error::tokenization(e.to_string()))
    }

    /// Returns the byte offset of the prefix `tokens[..index]` in the text
    /// the tokens were encoded from.
    ///
    /// A token boundary can fall inside a multi-byte scalar; when the prefix
    /// does not decode cleanly the index is stepped back until it does, so
    /// the returned offset always lies on a char boundary.
    pub fn prefix_offset(&self, tokens: &[TokenId], index: usize) -> usize {
        let mut index = index.min(tokens.len());
        loop {
            if index == 0 {
                return 0;
            }
            match self.bpe.decode(tokens[..index].to_vec()) {
                Ok(prefix) => return prefix.len(),
                Err(_) => index -= 1,
            }
        }
    }
}

impl Vocabulary {
    /// Maps a model identifier onto the vocabulary family it uses.
    fn from_model(model: &str) -> Self {
        if model.starts_with("gpt-4o") || model.starts_with("o1") || model.starts_with("o3") {
            Self::O200kBase
        } else if model.starts_with("gpt-4") || model.starts_with("gpt-3.5") {
            Self::Cl100kBase
        } else if model.starts_with("text-davinci") {
            Self::P50kBase
        } else {
            Self::default()
        }
    }
}

impl fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokenizer")
            .field("vocabulary", &self.vocabulary)
            .finish()
    }
}
