//! Oracle request types.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, IntoStaticStr};

/// The pipeline call site issuing an oracle request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CallKind {
    /// Extract a partial guide from one coarse chunk.
    GuideMap,
    /// Deduplicate and compact the aggregated guide.
    GuidePolish,
    /// Condense one fine-grained chunk into a chapter.
    ChapterStage,
}

/// A request payload for one oracle invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleRequest {
    /// The call site issuing the request.
    pub kind: CallKind,
    /// Stage index for per-chunk call sites, if any.
    pub stage: Option<u32>,
    /// System preamble, if any.
    pub system: Option<String>,
    /// The request prompt.
    pub prompt: String,
    /// Output token budget for the response.
    pub max_tokens: u64,
}

impl OracleRequest {
    /// Creates a request for the given call site.
    pub fn new(kind: CallKind, prompt: impl Into<String>) -> Self {
        Self {
            kind,
            stage: None,
            system: None,
            prompt: prompt.into(),
            max_tokens: 4_096,
        }
    }

    /// Sets the stage index.
    pub fn with_stage(mut self, stage: u32) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Sets the system preamble.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Sets the output token budget.
    pub fn with_max_tokens(mut self, max_tokens: u64) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}
