#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
#[cfg(feature = "test-utils")]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;
mod oracle;
mod provider;
mod request;
mod response;

pub use crate::error::{Error, Result};
pub use crate::oracle::{Oracle, RigOracle};
pub use crate::provider::CompletionProvider;
pub use crate::request::{CallKind, OracleRequest};
pub use crate::response::OracleResponse;

/// Tracing target for this crate.
pub const TRACING_TARGET: &str = "abridge_oracle";
