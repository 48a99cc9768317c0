//! Run identity and persisted run metadata.

use abridge_segment::SegmentParams;
use serde::{Deserialize, Serialize};

/// Metadata for one pipeline run, persisted as the `run.json` artifact.
///
/// Records the parameters a checkpoint tree was produced with, so a resume
/// attempt can verify it operates under identical settings, and the
/// watermark, so out-of-band inspection can tell how far a run got.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Run identity; namespaces every artifact of this run.
    pub run_id: String,
    /// When the run was created.
    pub created_at: jiff::Timestamp,
    /// Coarse segmentation parameters chosen for the document.
    pub params: SegmentParams,
    /// Tolerance band used for both segmentation passes.
    pub tolerance: f64,
    /// Chapter-pass scale factor applied to the coarse parameters.
    pub chapter_scale: f64,
    /// Model identifier serving the run, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Highest contiguous completed chapter stage index.
    #[serde(default)]
    pub watermark: Option<u32>,
}

impl RunMetadata {
    /// Creates metadata for a fresh run with a new v7 identity.
    pub fn new(params: SegmentParams, tolerance: f64, chapter_scale: f64) -> Self {
        Self {
            run_id: uuid::Uuid::now_v7().to_string(),
            created_at: jiff::Timestamp::now(),
            params,
            tolerance,
            chapter_scale,
            model: None,
            watermark: None,
        }
    }

    /// Sets the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Returns the fine-grained parameters for the chapter pass.
    pub fn chapter_params(&self) -> SegmentParams {
        self.params.scaled(self.chapter_scale)
    }

    /// Checks that another run's parameters match this one's.
    ///
    /// Parameter drift between a run and its resume attempt would shift
    /// every chunk boundary and silently misalign checkpoints.
    pub fn same_parameters(&self, other: &Self) -> bool {
        self.params == other.params
            && self.tolerance == other.tolerance
            && self.chapter_scale == other.chapter_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_ids_are_unique() {
        let params = SegmentParams::new(11_000, 1_100);
        let a = RunMetadata::new(params, 0.15, 0.25);
        let b = RunMetadata::new(params, 0.15, 0.25);
        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn test_parameter_drift_is_detected() {
        let a = RunMetadata::new(SegmentParams::new(11_000, 1_100), 0.15, 0.25);
        let mut b = a.clone();
        assert!(a.same_parameters(&b));
        b.params = SegmentParams::new(12_000, 1_200);
        assert!(!a.same_parameters(&b));
    }

    #[test]
    fn test_metadata_roundtrips_through_json() {
        let run = RunMetadata::new(SegmentParams::new(11_000, 1_100), 0.15, 0.25);
        let json = serde_json::to_string(&run).unwrap();
        let loaded: RunMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, run);
    }
}
