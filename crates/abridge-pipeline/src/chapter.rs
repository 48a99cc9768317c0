//! Context-carrying chapter pipeline: the fine sequential pass.

use abridge_checkpoint::{ArtifactKey, CheckpointStore};
use abridge_core::types::{GlobalGuide, StageOutput};
use abridge_oracle::{CallKind, Error as OracleError, Oracle, OracleRequest};
use abridge_segment::Segmentation;
use strum::AsRefStr;
use tracing::instrument;

use crate::TRACING_TARGET;
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::prompt;
use crate::run::RunMetadata;

/// Lifecycle of one chapter stage within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum StageState {
    /// Segmented, not yet processed.
    Pending,
    /// An oracle call is outstanding.
    InProgress,
    /// Output persisted.
    Completed,
    /// Terminal: all retries consumed.
    Failed,
}

/// Condenses fine-grained chunks strictly in order.
///
/// Stage `i` starts only after stage `i-1` is completed, because its input
/// includes the previous stage's continuation cue. That dependency is what
/// keeps naming and tone consistent across the output, so no parallelism is
/// permitted across stage indices. Completed stages are loaded from the
/// checkpoint store and their oracle calls elided, which makes the pass
/// idempotent per stage index.
pub struct ChapterPipeline<'a> {
    oracle: &'a dyn Oracle,
    store: &'a CheckpointStore,
    config: &'a PipelineConfig,
}

impl<'a> ChapterPipeline<'a> {
    /// Creates a chapter pipeline.
    pub fn new(
        oracle: &'a dyn Oracle,
        store: &'a CheckpointStore,
        config: &'a PipelineConfig,
    ) -> Self {
        Self {
            oracle,
            store,
            config,
        }
    }

    /// Processes every chunk in order, returning the ordered stage outputs.
    ///
    /// Advances the run watermark after each completed stage. On exhaustion
    /// the run halts at that index: later stages are never attempted and
    /// earlier completed stages keep their artifacts.
    #[instrument(
        skip_all,
        fields(run_id = %run.run_id, chunks = segmentation.len()),
        target = TRACING_TARGET,
    )]
    pub async fn run(
        &self,
        run: &mut RunMetadata,
        segmentation: &Segmentation<'_>,
        guide: &GlobalGuide,
    ) -> Result<Vec<StageOutput>> {
        let mut outputs = Vec::with_capacity(segmentation.len());
        let mut previous_cue: Option<String> = None;

        for (index, chunk) in segmentation.chunks.iter().enumerate() {
            let stage = index as u32;
            let key = ArtifactKey::Chapter(stage);

            let output = if self.store.has(&run.run_id, key).await? {
                tracing::info!(
                    target: TRACING_TARGET,
                    stage,
                    state = StageState::Completed.as_ref(),
                    "Reusing completed stage from checkpoint"
                );
                self.store.read_json(&run.run_id, key).await?
            } else {
                let output = self
                    .condense(&run.run_id, stage, chunk.trimmed(), guide, previous_cue.as_deref())
                    .await?;
                self.store.write_json(&run.run_id, key, &output).await?;
                tracing::info!(
                    target: TRACING_TARGET,
                    stage,
                    state = StageState::Completed.as_ref(),
                    title = %output.title,
                    "Stage completed"
                );
                output
            };

            if run.watermark.is_none_or(|w| w < stage) {
                run.watermark = Some(stage);
                self.store
                    .write_json(&run.run_id, ArtifactKey::RunMetadata, run)
                    .await?;
            }

            previous_cue = Some(output.continuation_cue(self.config.continuation_cue_chars));
            outputs.push(output);
        }

        Ok(outputs)
    }

    /// Runs one chapter-stage oracle call with retries.
    async fn condense(
        &self,
        run_id: &str,
        stage: u32,
        chunk_text: &str,
        guide: &GlobalGuide,
        previous_cue: Option<&str>,
    ) -> Result<StageOutput> {
        tracing::debug!(
            target: TRACING_TARGET,
            stage,
            state = StageState::InProgress.as_ref(),
            has_cue = previous_cue.is_some(),
            "Starting stage"
        );

        let request = OracleRequest::new(
            CallKind::ChapterStage,
            prompt::chapter_prompt(chunk_text, guide, previous_cue),
        )
        .with_stage(stage)
        .with_system(prompt::CHAPTER_SYSTEM)
        .with_max_tokens(self.config.stage_output_budget());

        let oracle = self.oracle;
        let request_ref = &request;
        self.config
            .stage_retry
            .run("chapter_stage", move || async move {
                let response = oracle.invoke(request_ref).await?;
                let output: StageOutput = response.decode_json()?;
                output
                    .validate()
                    .map_err(|e| OracleError::invalid_response(e))?;
                Ok(output)
            })
            .await
            .map_err(|e| {
                tracing::warn!(
                    target: TRACING_TARGET,
                    stage,
                    state = StageState::Failed.as_ref(),
                    "Stage exhausted all attempts"
                );
                Error::stage_exhausted(
                    run_id,
                    CallKind::ChapterStage,
                    Some(stage),
                    self.config.stage_retry.max_attempts,
                    e,
                )
            })
    }
}
