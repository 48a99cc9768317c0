#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod chapter;
mod config;
mod error;
mod guide;
mod pipeline;
mod prompt;
mod retry;
mod run;

pub use crate::chapter::{ChapterPipeline, StageState};
pub use crate::config::{PipelineConfig, PipelineConfigBuilder};
pub use crate::error::{Error, Result};
pub use crate::guide::GuideBuilder;
pub use crate::pipeline::{BookPipeline, CondensedBook};
pub use crate::retry::RetryPolicy;
pub use crate::run::RunMetadata;

/// Tracing target for pipeline operations.
pub const TRACING_TARGET: &str = "abridge_pipeline";
