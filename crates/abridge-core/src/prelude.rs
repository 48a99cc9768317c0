//! Convenient re-exports for common use.

pub use crate::document::Document;
pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::token::{TokenId, Tokenizer, Vocabulary};
pub use crate::types::{GlobalGuide, PartialGuide, StageOutput};
