//! Source document type.

use serde::{Deserialize, Serialize};

use crate::token::Tokenizer;

/// An immutable source document: the full extracted text plus its total
/// token count under the pipeline's tokenizer.
///
/// Read once at pipeline start and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    text: String,
    total_tokens: usize,
}

impl Document {
    /// Creates a document, counting its tokens with the given tokenizer.
    pub fn new(text: impl Into<String>, tokenizer: &Tokenizer) -> Self {
        let text = text.into();
        let total_tokens = tokenizer.count(&text);
        Self { text, total_tokens }
    }

    /// Returns the full document text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the total token count.
    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    /// Returns the document length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns true if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_counts_tokens() {
        let tokenizer = Tokenizer::with_defaults().unwrap();
        let doc = Document::new("Hello world.", &tokenizer);
        assert_eq!(doc.text(), "Hello world.");
        assert_eq!(doc.total_tokens(), tokenizer.count("Hello world."));
        assert!(!doc.is_empty());
    }
}
