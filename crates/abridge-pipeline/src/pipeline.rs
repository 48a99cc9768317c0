//! Run-level orchestration.

use std::sync::Arc;

use abridge_checkpoint::{ArtifactKey, CheckpointStore};
use abridge_core::types::{GlobalGuide, StageOutput};
use abridge_core::{Document, Tokenizer};
use abridge_oracle::Oracle;
use abridge_segment::{ElasticSegmenter, compute_params};
use tracing::instrument;

use crate::TRACING_TARGET;
use crate::chapter::ChapterPipeline;
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::guide::GuideBuilder;
use crate::run::RunMetadata;

/// The final product of one run: the guide plus the ordered chapters.
///
/// Handed to downstream assembly (titling, formatting) as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct CondensedBook {
    /// The run that produced this output.
    pub run_id: String,
    /// The polished document-wide guide.
    pub guide: GlobalGuide,
    /// Condensed chapters, one per fine-grained chunk, in order.
    pub chapters: Vec<StageOutput>,
}

/// Orchestrates both passes of a condensation run.
///
/// `process` starts a fresh run; `resume` picks an interrupted run back up
/// under the same identity and skips every checkpointed stage. Within one
/// run there is a single logical worker: oracle calls are serialized even
/// in the map phase, trading latency for a predictable external call rate.
pub struct BookPipeline {
    oracle: Arc<dyn Oracle>,
    store: CheckpointStore,
    tokenizer: Tokenizer,
    config: PipelineConfig,
}

impl BookPipeline {
    /// Creates a pipeline.
    pub fn new(
        oracle: Arc<dyn Oracle>,
        store: CheckpointStore,
        tokenizer: Tokenizer,
        config: PipelineConfig,
    ) -> Self {
        Self {
            oracle,
            store,
            tokenizer,
            config,
        }
    }

    /// Condenses a document under a new run identity.
    #[instrument(skip_all, fields(text_len = text.len()), target = TRACING_TARGET)]
    pub async fn process(&self, text: &str) -> Result<CondensedBook> {
        let document = Document::new(text, &self.tokenizer);
        if document.is_empty() {
            return Err(Error::precondition("document is empty"));
        }

        let params = compute_params(document.total_tokens());
        let mut run = RunMetadata::new(params, self.config.tolerance, self.config.chapter_scale);

        tracing::info!(
            target: TRACING_TARGET,
            run_id = %run.run_id,
            total_tokens = document.total_tokens(),
            chunk_tokens = params.chunk_tokens,
            overlap_tokens = params.overlap_tokens,
            "Starting run"
        );

        self.store
            .write_text(&run.run_id, ArtifactKey::Source, document.text())
            .await?;
        self.store
            .write_json(&run.run_id, ArtifactKey::RunMetadata, &run)
            .await?;

        self.execute(&mut run, &document).await
    }

    /// Resumes an interrupted run under its original identity.
    ///
    /// Requires the persisted source document and run metadata; a missing
    /// source is fatal, since resume cannot reconstruct it. Parameters must
    /// match the original run exactly, otherwise every chunk boundary would
    /// shift and checkpoints would silently misalign.
    #[instrument(skip(self), target = TRACING_TARGET)]
    pub async fn resume(&self, run_id: &str) -> Result<CondensedBook> {
        if !self.store.has(run_id, ArtifactKey::RunMetadata).await? {
            return Err(Error::precondition(format!("unknown run: {run_id}")));
        }
        let mut run: RunMetadata = self
            .store
            .read_json(run_id, ArtifactKey::RunMetadata)
            .await?;

        if !self.store.has(run_id, ArtifactKey::Source).await? {
            return Err(Error::precondition(format!(
                "source document missing for run {run_id}"
            )));
        }
        let text = self.store.read_text(run_id, ArtifactKey::Source).await?;
        let document = Document::new(text, &self.tokenizer);

        let expected = compute_params(document.total_tokens());
        if run.params != expected
            || run.tolerance != self.config.tolerance
            || run.chapter_scale != self.config.chapter_scale
        {
            return Err(Error::precondition(format!(
                "parameters for run {run_id} do not match the current configuration"
            )));
        }

        tracing::info!(
            target: TRACING_TARGET,
            run_id,
            watermark = run.watermark,
            "Resuming run"
        );

        self.execute(&mut run, &document).await
    }

    /// Reruns a single chapter stage under a derived run identity.
    ///
    /// Artifacts are append-only, so the original run is left untouched:
    /// everything except the target stage is copied into the new namespace
    /// and only that stage is recomputed.
    #[instrument(skip(self), target = TRACING_TARGET)]
    pub async fn rerun_stage(&self, run_id: &str, stage: u32) -> Result<CondensedBook> {
        if !self.store.has(run_id, ArtifactKey::RunMetadata).await? {
            return Err(Error::precondition(format!("unknown run: {run_id}")));
        }
        let source: RunMetadata = self
            .store
            .read_json(run_id, ArtifactKey::RunMetadata)
            .await?;

        let derived = RunMetadata {
            run_id: format!("{run_id}-rerun-{stage:04}"),
            created_at: jiff::Timestamp::now(),
            watermark: stage.checked_sub(1),
            ..source
        };

        for name in self.store.list(run_id).await? {
            let Some(key) = ArtifactKey::parse(&name) else {
                continue;
            };
            if key == ArtifactKey::Chapter(stage) || key == ArtifactKey::RunMetadata {
                continue;
            }
            let payload = self.store.read_bytes(run_id, key).await?;
            self.store
                .write_bytes(&derived.run_id, key, payload)
                .await?;
        }
        self.store
            .write_json(&derived.run_id, ArtifactKey::RunMetadata, &derived)
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            run_id,
            derived_run_id = %derived.run_id,
            stage,
            "Rerunning single stage under derived run"
        );

        self.resume(&derived.run_id).await
    }

    async fn execute(&self, run: &mut RunMetadata, document: &Document) -> Result<CondensedBook> {
        let segmenter = ElasticSegmenter::new(self.tokenizer.clone(), run.tolerance)?;

        let coarse = segmenter.segment(document.text(), &run.params)?;
        let guide = GuideBuilder::new(self.oracle.as_ref(), &self.store, &self.config)
            .build(&run.run_id, &coarse)
            .await?;

        let fine = segmenter.segment(document.text(), &run.chapter_params())?;
        let chapters = ChapterPipeline::new(self.oracle.as_ref(), &self.store, &self.config)
            .run(run, &fine, &guide)
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            run_id = %run.run_id,
            chapters = chapters.len(),
            "Run complete"
        );

        Ok(CondensedBook {
            run_id: run.run_id.clone(),
            guide,
            chapters,
        })
    }
}

impl std::fmt::Debug for BookPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookPipeline")
            .field("store", &self.store)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use abridge_checkpoint::StoreConfig;
    use abridge_core::types::{ContentItem, GuideCharacter, PartialGuide};
    use abridge_oracle::CallKind;
    use abridge_oracle::mock::{MockOracle, MockOutcome};

    use super::*;
    use crate::retry::RetryPolicy;

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            map_retry: RetryPolicy::new(3, Duration::ZERO),
            polish_retry: RetryPolicy::new(2, Duration::ZERO),
            stage_retry: RetryPolicy::new(3, Duration::ZERO),
            ..PipelineConfig::default()
        }
    }

    fn partial() -> PartialGuide {
        PartialGuide {
            characters: vec![GuideCharacter {
                name: "Ada".to_string(),
                description: String::new(),
            }],
            ..Default::default()
        }
    }

    fn guide() -> GlobalGuide {
        GlobalGuide {
            characters: vec![GuideCharacter {
                name: "Ada".to_string(),
                description: "engineer".to_string(),
            }],
            ..Default::default()
        }
    }

    fn chapter(title: &str) -> StageOutput {
        StageOutput {
            title: title.to_string(),
            content: vec![ContentItem::Paragraph {
                text: format!("{title}."),
            }],
        }
    }

    /// Short document: one coarse chunk and one fine chunk.
    fn sample_text() -> String {
        "Ada studies the engine. The engine hums through the night.\n\n\
         By morning the calculations hold. She writes them down."
            .repeat(4)
    }

    fn pipeline(oracle: Arc<MockOracle>, store: CheckpointStore) -> BookPipeline {
        BookPipeline::new(
            oracle,
            store,
            Tokenizer::with_defaults().unwrap(),
            test_config(),
        )
    }

    fn script_full_run(oracle: &MockOracle) {
        oracle.enqueue(CallKind::GuideMap, Some(0), MockOutcome::json(&partial()));
        oracle.enqueue(CallKind::GuidePolish, None, MockOutcome::json(&guide()));
        oracle.enqueue(
            CallKind::ChapterStage,
            Some(0),
            MockOutcome::json(&chapter("Morning")),
        );
    }

    #[tokio::test]
    async fn test_process_persists_every_artifact() {
        let oracle = Arc::new(MockOracle::new());
        script_full_run(&oracle);
        // Real filesystem backend: artifacts must survive on disk.
        let dir = tempfile::tempdir().unwrap();
        let store =
            CheckpointStore::new(StoreConfig::fs(dir.path().to_string_lossy())).unwrap();
        let pipeline = pipeline(oracle.clone(), store.clone());

        let book = pipeline.process(&sample_text()).await.unwrap();
        assert_eq!(book.guide, guide());
        assert_eq!(book.chapters.len(), 1);

        let names = store.list(&book.run_id).await.unwrap();
        assert_eq!(
            names,
            vec![
                "chapter_0000.json",
                "guide.json",
                "guide_partial_0000.json",
                "run.json",
                "source.txt",
            ]
        );

        let run: RunMetadata = store
            .read_json(&book.run_id, ArtifactKey::RunMetadata)
            .await
            .unwrap();
        assert_eq!(run.watermark, Some(0));
    }

    #[tokio::test]
    async fn test_resume_of_finished_run_makes_no_oracle_calls() {
        let oracle = Arc::new(MockOracle::new());
        script_full_run(&oracle);
        let store = CheckpointStore::new(StoreConfig::Memory).unwrap();
        let book = pipeline(oracle, store.clone())
            .process(&sample_text())
            .await
            .unwrap();

        // Fresh unscripted oracle: any call would fail the run.
        let fresh = Arc::new(MockOracle::new());
        let resumed = pipeline(fresh.clone(), store)
            .resume(&book.run_id)
            .await
            .unwrap();

        assert_eq!(resumed, book);
        assert!(fresh.invocations().is_empty());
    }

    #[tokio::test]
    async fn test_resume_unknown_run_is_precondition_failure() {
        let store = CheckpointStore::new(StoreConfig::Memory).unwrap();
        let err = pipeline(Arc::new(MockOracle::new()), store)
            .resume("no-such-run")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
        assert!(!err.is_resumable());
    }

    #[tokio::test]
    async fn test_resume_with_missing_source_is_precondition_failure() {
        let oracle = Arc::new(MockOracle::new());
        script_full_run(&oracle);
        let store = CheckpointStore::new(StoreConfig::Memory).unwrap();
        let book = pipeline(oracle, store.clone())
            .process(&sample_text())
            .await
            .unwrap();

        store
            .delete(&book.run_id, ArtifactKey::Source)
            .await
            .unwrap();
        let err = pipeline(Arc::new(MockOracle::new()), store)
            .resume(&book.run_id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[tokio::test]
    async fn test_resume_with_drifted_parameters_is_precondition_failure() {
        let oracle = Arc::new(MockOracle::new());
        script_full_run(&oracle);
        let store = CheckpointStore::new(StoreConfig::Memory).unwrap();
        let book = pipeline(oracle, store.clone())
            .process(&sample_text())
            .await
            .unwrap();

        let mut drifted = test_config();
        drifted.tolerance = 0.2;
        let err = BookPipeline::new(
            Arc::new(MockOracle::new()),
            store,
            Tokenizer::with_defaults().unwrap(),
            drifted,
        )
        .resume(&book.run_id)
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[tokio::test]
    async fn test_interrupted_run_resumes_past_completed_stages() {
        // First attempt: guide succeeds, the chapter stage exhausts.
        let oracle = Arc::new(MockOracle::new());
        oracle.enqueue(CallKind::GuideMap, Some(0), MockOutcome::json(&partial()));
        oracle.enqueue(CallKind::GuidePolish, None, MockOutcome::json(&guide()));
        for _ in 0..3 {
            oracle.enqueue(
                CallKind::ChapterStage,
                Some(0),
                MockOutcome::Fail("rate limit".into()),
            );
        }
        let store = CheckpointStore::new(StoreConfig::Memory).unwrap();
        let err = pipeline(oracle, store.clone())
            .process(&sample_text())
            .await
            .unwrap_err();
        assert!(err.is_resumable());
        let Error::StageExhausted { run_id, stage, .. } = err else {
            panic!("expected stage exhaustion, got {err}");
        };
        assert_eq!(stage, Some(0));

        // Second attempt: only the failed chapter stage is replayed.
        let fresh = Arc::new(MockOracle::new());
        fresh.enqueue(
            CallKind::ChapterStage,
            Some(0),
            MockOutcome::json(&chapter("Morning")),
        );
        let book = pipeline(fresh.clone(), store)
            .resume(&run_id)
            .await
            .unwrap();

        assert_eq!(book.run_id, run_id);
        assert_eq!(book.guide, guide());
        assert_eq!(book.chapters[0].title, "Morning");
        assert_eq!(fresh.call_count(CallKind::GuideMap, Some(0)), 0);
        assert_eq!(fresh.call_count(CallKind::GuidePolish, None), 0);
        assert_eq!(fresh.call_count(CallKind::ChapterStage, Some(0)), 1);
    }

    #[tokio::test]
    async fn test_rerun_stage_recomputes_only_that_stage() {
        let oracle = Arc::new(MockOracle::new());
        script_full_run(&oracle);
        let store = CheckpointStore::new(StoreConfig::Memory).unwrap();
        let book = pipeline(oracle, store.clone())
            .process(&sample_text())
            .await
            .unwrap();

        let fresh = Arc::new(MockOracle::new());
        fresh.enqueue(
            CallKind::ChapterStage,
            Some(0),
            MockOutcome::json(&chapter("Morning, revised")),
        );
        let rerun = pipeline(fresh.clone(), store.clone())
            .rerun_stage(&book.run_id, 0)
            .await
            .unwrap();

        assert_eq!(rerun.run_id, format!("{}-rerun-0000", book.run_id));
        assert_eq!(rerun.chapters[0].title, "Morning, revised");
        // Guide was copied, not rebuilt.
        assert_eq!(fresh.call_count(CallKind::GuideMap, Some(0)), 0);
        assert_eq!(fresh.call_count(CallKind::GuidePolish, None), 0);
        // The original run is untouched.
        let original: StageOutput = store
            .read_json(&book.run_id, ArtifactKey::Chapter(0))
            .await
            .unwrap();
        assert_eq!(original.title, "Morning");
    }
}
