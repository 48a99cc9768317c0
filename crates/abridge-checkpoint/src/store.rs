//! Checkpoint store implementation.

use opendal::{Operator, services};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::TRACING_TARGET;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::key::ArtifactKey;

/// Run-scoped artifact store over an OpenDAL operator.
///
/// Each write lands under `{run_id}/{file_name}`. On the filesystem
/// backend writes are staged in an atomic write directory and renamed
/// into place, so readers never observe a partially written artifact.
#[derive(Clone)]
pub struct CheckpointStore {
    operator: Operator,
    config: StoreConfig,
}

impl CheckpointStore {
    /// Creates a checkpoint store from configuration.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        let operator = Self::create_operator(&config)?;

        tracing::info!(
            target: TRACING_TARGET,
            backend = config.backend_name(),
            "Checkpoint store initialized"
        );

        Ok(Self { operator, config })
    }

    /// Returns the configuration for this store.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Checks whether an artifact exists for the given run.
    pub async fn has(&self, run_id: &str, key: ArtifactKey) -> StoreResult<bool> {
        Ok(self.operator.exists(&key.path(run_id)).await?)
    }

    /// Reads an artifact as raw bytes.
    pub async fn read_bytes(&self, run_id: &str, key: ArtifactKey) -> StoreResult<Vec<u8>> {
        let path = key.path(run_id);
        let data = self.operator.read(&path).await?.to_vec();

        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            size = data.len(),
            "Artifact read"
        );

        Ok(data)
    }

    /// Writes an artifact from raw bytes.
    pub async fn write_bytes(
        &self,
        run_id: &str,
        key: ArtifactKey,
        data: Vec<u8>,
    ) -> StoreResult<()> {
        let path = key.path(run_id);
        let size = data.len();
        self.operator.write(&path, data).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            size,
            "Artifact written"
        );

        Ok(())
    }

    /// Reads an artifact as UTF-8 text.
    pub async fn read_text(&self, run_id: &str, key: ArtifactKey) -> StoreResult<String> {
        let data = self.read_bytes(run_id, key).await?;
        String::from_utf8(data).map_err(|_| StoreError::InvalidUtf8(key.path(run_id)))
    }

    /// Writes an artifact from UTF-8 text.
    pub async fn write_text(
        &self,
        run_id: &str,
        key: ArtifactKey,
        text: &str,
    ) -> StoreResult<()> {
        self.write_bytes(run_id, key, text.as_bytes().to_vec()).await
    }

    /// Reads and decodes a JSON artifact.
    pub async fn read_json<T: DeserializeOwned>(
        &self,
        run_id: &str,
        key: ArtifactKey,
    ) -> StoreResult<T> {
        let data = self.read_bytes(run_id, key).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Encodes and writes a JSON artifact.
    ///
    /// Artifacts are pretty-printed: run directories are meant to be
    /// read by people, not just by the resume path.
    pub async fn write_json<T: Serialize>(
        &self,
        run_id: &str,
        key: ArtifactKey,
        value: &T,
    ) -> StoreResult<()> {
        let data = serde_json::to_vec_pretty(value)?;
        self.write_bytes(run_id, key, data).await
    }

    /// Deletes an artifact. Deleting a missing artifact is not an error.
    pub async fn delete(&self, run_id: &str, key: ArtifactKey) -> StoreResult<()> {
        let path = key.path(run_id);
        self.operator.delete(&path).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            "Artifact deleted"
        );

        Ok(())
    }

    /// Lists artifact file names present for the given run.
    pub async fn list(&self, run_id: &str) -> StoreResult<Vec<String>> {
        use futures::TryStreamExt;

        let prefix = format!("{run_id}/");
        let entries: Vec<_> = self.operator.lister(&prefix).await?.try_collect().await?;

        let mut names: Vec<String> = entries
            .into_iter()
            .filter_map(|e| {
                e.path()
                    .strip_prefix(&prefix)
                    .filter(|name| !name.is_empty() && !name.ends_with('/'))
                    .map(str::to_string)
            })
            .collect();
        names.sort();
        Ok(names)
    }

    fn create_operator(config: &StoreConfig) -> StoreResult<Operator> {
        match config {
            #[cfg(feature = "fs")]
            StoreConfig::Fs { root } => {
                // Temp files are staged inside the root so the final rename
                // stays on one filesystem.
                let builder = services::Fs::default().root(root).atomic_write_dir(root);

                Operator::new(builder)
                    .map(|op| op.finish())
                    .map_err(|e| StoreError::init(e.to_string()))
            }

            #[cfg(feature = "memory")]
            StoreConfig::Memory => {
                let builder = services::Memory::default();

                Operator::new(builder)
                    .map(|op| op.finish())
                    .map_err(|e| StoreError::init(e.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for CheckpointStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckpointStore")
            .field("backend", &self.config.backend_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Artifact {
        title: String,
        order: u32,
    }

    fn memory_store() -> CheckpointStore {
        CheckpointStore::new(StoreConfig::Memory).unwrap()
    }

    #[tokio::test]
    async fn test_json_artifact_roundtrip() {
        let store = memory_store();
        let value = Artifact {
            title: "Opening".into(),
            order: 1,
        };

        assert!(!store.has("run-1", ArtifactKey::Chapter(0)).await.unwrap());
        store
            .write_json("run-1", ArtifactKey::Chapter(0), &value)
            .await
            .unwrap();
        assert!(store.has("run-1", ArtifactKey::Chapter(0)).await.unwrap());

        let loaded: Artifact = store
            .read_json("run-1", ArtifactKey::Chapter(0))
            .await
            .unwrap();
        assert_eq!(loaded, value);
    }

    #[tokio::test]
    async fn test_missing_artifact_is_not_found() {
        let store = memory_store();
        let err = store
            .read_bytes("run-1", ArtifactKey::Guide)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_runs_are_isolated() {
        let store = memory_store();
        store
            .write_text("run-a", ArtifactKey::Source, "alpha")
            .await
            .unwrap();

        assert!(!store.has("run-b", ArtifactKey::Source).await.unwrap());
        assert_eq!(
            store.read_text("run-a", ArtifactKey::Source).await.unwrap(),
            "alpha"
        );
    }

    #[tokio::test]
    async fn test_list_returns_sorted_file_names() {
        let store = memory_store();
        for stage in [2u32, 0, 1] {
            store
                .write_text("run-1", ArtifactKey::Chapter(stage), "text")
                .await
                .unwrap();
        }
        store
            .write_text("run-1", ArtifactKey::Source, "src")
            .await
            .unwrap();

        let names = store.list("run-1").await.unwrap();
        assert_eq!(
            names,
            vec![
                "chapter_0000.json",
                "chapter_0001.json",
                "chapter_0002.json",
                "source.txt",
            ]
        );
    }

    #[tokio::test]
    async fn test_overwrite_replaces_content() {
        let store = memory_store();
        store
            .write_text("run-1", ArtifactKey::Guide, "first")
            .await
            .unwrap();
        store
            .write_text("run-1", ArtifactKey::Guide, "second")
            .await
            .unwrap();
        assert_eq!(
            store.read_text("run-1", ArtifactKey::Guide).await.unwrap(),
            "second"
        );
    }

    #[cfg(feature = "fs")]
    #[tokio::test]
    async fn test_fs_backend_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_string_lossy().to_string();

        let store = CheckpointStore::new(StoreConfig::fs(&root)).unwrap();
        store
            .write_text("run-1", ArtifactKey::Source, "persisted")
            .await
            .unwrap();
        drop(store);

        let reopened = CheckpointStore::new(StoreConfig::fs(&root)).unwrap();
        assert_eq!(
            reopened
                .read_text("run-1", ArtifactKey::Source)
                .await
                .unwrap(),
            "persisted"
        );
    }
}
