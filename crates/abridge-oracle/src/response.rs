//! Oracle response decoding.

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// The raw result of one oracle invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleResponse {
    /// The response text as returned by the provider.
    pub text: String,
}

impl OracleResponse {
    /// Creates a response from raw text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Returns true if the response carries no content.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Decodes the response payload into a typed value.
    ///
    /// Markdown code fences are stripped first since models often wrap JSON
    /// in them. Empty or undecodable payloads are errors, never defaults:
    /// the caller decides whether to retry.
    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T> {
        let payload = strip_code_fences(&self.text);
        if payload.is_empty() {
            return Err(Error::EmptyResponse);
        }
        Ok(serde_json::from_str(payload)?)
    }
}

/// Strips a surrounding markdown code fence, if present.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    match rest.strip_suffix("```") {
        Some(inner) => inner.trim(),
        None => rest.trim(),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Payload {
        value: u32,
    }

    #[test]
    fn test_decode_plain_json() {
        let resp = OracleResponse::new(r#"{"value": 7}"#);
        assert_eq!(resp.decode_json::<Payload>().unwrap(), Payload { value: 7 });
    }

    #[test]
    fn test_decode_fenced_json() {
        let resp = OracleResponse::new("```json\n{\"value\": 7}\n```");
        assert_eq!(resp.decode_json::<Payload>().unwrap(), Payload { value: 7 });

        let resp = OracleResponse::new("```\n{\"value\": 7}\n```");
        assert_eq!(resp.decode_json::<Payload>().unwrap(), Payload { value: 7 });
    }

    #[test]
    fn test_empty_response_is_error() {
        let resp = OracleResponse::new("   \n");
        let err = resp.decode_json::<Payload>().unwrap_err();
        assert!(matches!(err, Error::EmptyResponse));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_malformed_response_is_retryable() {
        let resp = OracleResponse::new("not json at all");
        let err = resp.decode_json::<Payload>().unwrap_err();
        assert!(err.is_retryable());
    }
}
