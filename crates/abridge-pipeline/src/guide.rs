//! Guide builder: the coarse map-reduce pass.

use abridge_checkpoint::{ArtifactKey, CheckpointStore};
use abridge_core::types::{GlobalGuide, PartialGuide};
use abridge_oracle::{CallKind, Error as OracleError, Oracle, OracleRequest};
use abridge_segment::Segmentation;
use tracing::instrument;

use crate::TRACING_TARGET;
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::prompt;

/// Builds the document-wide guide from a coarse segmentation.
///
/// The map phase issues one extraction call per chunk, in order. A missing
/// partial cannot be skipped: the reduce phase assumes one guide per chunk,
/// so exhausted retries fail the whole run. The merged aggregate then goes
/// through exactly one polish call, which owns semantic deduplication;
/// entity dedup ("the old man" vs. "Grandfather") is not something
/// exact-match code can do.
pub struct GuideBuilder<'a> {
    oracle: &'a dyn Oracle,
    store: &'a CheckpointStore,
    config: &'a PipelineConfig,
}

impl<'a> GuideBuilder<'a> {
    /// Creates a guide builder.
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

    /// Builds (or reloads) the global guide for one run.
    #[instrument(skip_all, fields(run_id, chunks = segmentation.len()), target = TRACING_TARGET)]
    pub async fn build(
        &self,
        run_id: &str,
        segmentation: &Segmentation<'_>,
    ) -> Result<GlobalGuide> {
        if self.store.has(run_id, ArtifactKey::Guide).await? {
            tracing::info!(
                target: TRACING_TARGET,
                run_id,
                "Reusing polished guide from checkpoint"
            );
            return Ok(self.store.read_json(run_id, ArtifactKey::Guide).await?);
        }

        let mut partials = Vec::with_capacity(segmentation.len());
        for (index, chunk) in segmentation.chunks.iter().enumerate() {
            let stage = index as u32;
            partials.push(self.map_chunk(run_id, stage, chunk.trimmed()).await?);
        }

        let aggregate = GlobalGuide::merge(&partials);
        tracing::info!(
            target: TRACING_TARGET,
            run_id,
            partials = partials.len(),
            characters = aggregate.characters.len(),
            timeline = aggregate.timeline.len(),
            "Merged partial guides, polishing"
        );

        let guide = self.polish(run_id, &aggregate).await?;
        self.store
            .write_json(run_id, ArtifactKey::Guide, &guide)
            .await?;
        Ok(guide)
    }

    /// Extracts one partial guide, reusing a checkpointed partial if present.
    async fn map_chunk(
        &self,
        run_id: &str,
        stage: u32,
        chunk_text: &str,
    ) -> Result<PartialGuide> {
        let key = ArtifactKey::GuidePartial(stage);
        if self.store.has(run_id, key).await? {
            tracing::debug!(
                target: TRACING_TARGET,
                run_id,
                stage,
                "Reusing partial guide from checkpoint"
            );
            return Ok(self.store.read_json(run_id, key).await?);
        }

        let request = OracleRequest::new(
            CallKind::GuideMap,
            prompt::guide_map_prompt(chunk_text, &self.config.guide_caps),
        )
        .with_stage(stage)
        .with_system(prompt::GUIDE_MAP_SYSTEM);

        let oracle = self.oracle;
        let request_ref = &request;
        let partial = self
            .config
            .map_retry
            .run("guide_map", move || async move {
                let response = oracle.invoke(request_ref).await?;
                let partial: PartialGuide = response.decode_json()?;
                if partial.is_empty() {
                    return Err(OracleError::EmptyResponse);
                }
                Ok(partial)
            })
            .await
            .map_err(|e| {
                Error::stage_exhausted(
                    run_id,
                    CallKind::GuideMap,
                    Some(stage),
                    self.config.map_retry.max_attempts,
                    e,
                )
            })?;

        let mut partial = partial;
        partial.apply_caps(&self.config.guide_caps);
        self.store.write_json(run_id, key, &partial).await?;
        Ok(partial)
    }

    /// Runs the single polish call over the merged aggregate.
    async fn polish(&self, run_id: &str, aggregate: &GlobalGuide) -> Result<GlobalGuide> {
        let request = OracleRequest::new(
            CallKind::GuidePolish,
            prompt::guide_polish_prompt(aggregate),
        )
        .with_system(prompt::GUIDE_POLISH_SYSTEM);

        let oracle = self.oracle;
        let request_ref = &request;
        self.config
            .polish_retry
            .run("guide_polish", move || async move {
                let response = oracle.invoke(request_ref).await?;
                let guide: GlobalGuide = response.decode_json()?;
                guide
                    .validate()
                    .map_err(|e| OracleError::invalid_response(e))?;
                Ok(guide)
            })
            .await
            .map_err(|e| {
                Error::stage_exhausted(
                    run_id,
                    CallKind::GuidePolish,
                    None,
                    self.config.polish_retry.max_attempts,
                    e,
                )
            })
    }
}
