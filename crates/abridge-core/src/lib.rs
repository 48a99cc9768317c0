#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod document;
mod error;
mod token;

pub mod types;

#[doc(hidden)]
pub mod prelude;

pub use document::Document;
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use token::{TokenId, Tokenizer, Vocabulary};

/// Tracing target for core operations.
pub const TRACING_TARGET: &str = "abridge_core";
