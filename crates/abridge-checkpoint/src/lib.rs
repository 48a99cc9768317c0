#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod error;
mod key;
mod store;

pub use crate::config::StoreConfig;
pub use crate::error::{StoreError, StoreResult};
pub use crate::key::ArtifactKey;
pub use crate::store::CheckpointStore;

/// Tracing target for checkpoint storage operations.
pub const TRACING_TARGET: &str = "abridge_checkpoint";
