//! Pipeline error types.

use abridge_oracle::CallKind;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A single oracle call failed before any retry policy applied.
    #[error("oracle error: {0}")]
    Oracle(#[from] abridge_oracle::Error),

    /// Core domain error (tokenization, validation).
    #[error("core error: {0}")]
    Core(#[from] abridge_core::Error),

    /// Checkpoint storage error.
    #[error("checkpoint error: {0}")]
    Store(#[from] abridge_checkpoint::StoreError),

    /// All retry attempts for one stage were consumed.
    ///
    /// The run halts at this stage; earlier completed stages keep their
    /// artifacts and the carried run id can be passed to `resume`.
    #[error(
        "run {run_id}: {kind:?} stage {stage:?} exhausted after {attempts} attempts: {source}"
    )]
    StageExhausted {
        run_id: String,
        kind: CallKind,
        stage: Option<u32>,
        attempts: u32,
        source: abridge_oracle::Error,
    },

    /// A precondition for the requested operation does not hold.
    ///
    /// Fatal and not retried; the caller must restart the run.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Invalid pipeline configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates a stage-exhausted error.
    pub fn stage_exhausted(
        run_id: impl Into<String>,
        kind: CallKind,
        stage: Option<u32>,
        attempts: u32,
        source: abridge_oracle::Error,
    ) -> Self {
        Self::StageExhausted {
            run_id: run_id.into(),
            kind,
            stage,
            attempts,
            source,
        }
    }

    /// Creates a precondition error.
    pub fn precondition(message: impl std::fmt::Display) -> Self {
        Self::Precondition(message.to_string())
    }

    /// Creates a configuration error.
    pub fn config(message: impl std::fmt::Display) -> Self {
        Self::Config(message.to_string())
    }

    /// Returns true if re-invoking the run can make progress.
    ///
    /// Stage exhaustion leaves completed checkpoints behind, so a later
    /// attempt resumes past them. Precondition and configuration failures
    /// will fail the same way again.
    pub fn is_resumable(&self) -> bool {
        matches!(self, Self::StageExhausted { .. } | Self::Oracle(_))
    }
}
