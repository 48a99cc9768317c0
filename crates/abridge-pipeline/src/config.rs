//! Pipeline configuration.

use std::time::Duration;

use abridge_core::types::GuideCaps;
use abridge_segment::DEFAULT_TOLERANCE;
use derive_builder::Builder;

use crate::retry::RetryPolicy;

/// Configuration for one condensation pipeline.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct PipelineConfig {
    /// Tolerance band around the chunk-size target for both passes.
    #[builder(default = "DEFAULT_TOLERANCE")]
    pub tolerance: f64,

    /// Fraction of the coarse chunk size used for the chapter pass.
    #[builder(default = "0.25")]
    pub chapter_scale: f64,

    /// Caller-level target size for each condensed chapter, in tokens.
    #[builder(default = "2_048")]
    pub target_output_tokens: u64,

    /// Shrink factor applied to the output target before each stage call.
    ///
    /// Truncated output is worse than slightly short output, so the budget
    /// handed to the oracle under-shoots the caller-level target.
    #[builder(default = "0.85")]
    pub output_shrink: f64,

    /// Byte budget for the continuation cue carried between stages.
    #[builder(default = "1_200")]
    pub continuation_cue_chars: usize,

    /// Per-field item caps applied to each partial guide.
    #[builder(default)]
    pub guide_caps: GuideCaps,

    /// Retry policy for guide-map calls.
    #[builder(default)]
    pub map_retry: RetryPolicy,

    /// Retry policy for the single polish call. Smaller ceiling: polish is
    /// the most expensive call of the run.
    #[builder(default = "RetryPolicy::new(2, Duration::from_secs(1))")]
    pub polish_retry: RetryPolicy,

    /// Retry policy for chapter-stage calls.
    #[builder(default)]
    pub stage_retry: RetryPolicy,
}

impl PipelineConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(tolerance) = self.tolerance {
            if !(tolerance > 0.0 && tolerance < 1.0) {
                return Err(format!("tolerance must be in (0, 1), got {tolerance}"));
            }
        }
        if let Some(scale) = self.chapter_scale {
            if !(scale > 0.0 && scale <= 1.0) {
                return Err(format!("chapter_scale must be in (0, 1], got {scale}"));
            }
        }
        if let Some(shrink) = self.output_shrink {
            if !(shrink > 0.0 && shrink <= 1.0) {
                return Err(format!("output_shrink must be in (0, 1], got {shrink}"));
            }
        }
        if let Some(target) = self.target_output_tokens {
            if target == 0 {
                return Err("target_output_tokens must be at least 1".into());
            }
        }
        Ok(())
    }
}

impl PipelineConfig {
    /// Token budget handed to each chapter-stage call.
    pub fn stage_output_budget(&self) -> u64 {
        ((self.target_output_tokens as f64 * self.output_shrink).round() as u64).max(1)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            chapter_scale: 0.25,
            target_output_tokens: 2_048,
            output_shrink: 0.85,
            continuation_cue_chars: 1_200,
            guide_caps: GuideCaps::default(),
            map_retry: RetryPolicy::default(),
            polish_retry: RetryPolicy::new(2, Duration::from_secs(1)),
            stage_retry: RetryPolicy::default(),
        }
    }
}
