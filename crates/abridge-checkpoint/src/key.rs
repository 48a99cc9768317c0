//! Artifact key naming.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Zero-padding width for stage indices in file names.
///
/// Four digits keep lexicographic and numeric order identical for any
/// realistic run while staying readable in a directory listing.
const STAGE_WIDTH: usize = 4;

/// A named artifact within one run.
///
/// Keys render to stable, human-decodable file names; nothing downstream
/// needs a manifest to tell what a run directory contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "artifact", rename_all = "snake_case")]
pub enum ArtifactKey {
    /// The normalized input document.
    Source,
    /// Run parameters and provenance metadata.
    RunMetadata,
    /// The merged and polished global guide.
    Guide,
    /// One per-chunk partial guide from the map pass.
    GuidePartial(u32),
    /// One condensed chapter from the sequential pass.
    Chapter(u32),
}

impl ArtifactKey {
    /// Returns the file name for this artifact.
    pub fn file_name(&self) -> String {
        match self {
            Self::Source => "source.txt".to_string(),
            Self::RunMetadata => "run.json".to_string(),
            Self::Guide => "guide.json".to_string(),
            Self::GuidePartial(stage) => {
                format!("guide_partial_{stage:0STAGE_WIDTH$}.json")
            }
            Self::Chapter(stage) => format!("chapter_{stage:0STAGE_WIDTH$}.json"),
        }
    }

    /// Returns the storage path for this artifact within a run namespace.
    pub fn path(&self, run_id: &str) -> String {
        format!("{run_id}/{}", self.file_name())
    }

    /// Parses a file name back into a key.
    ///
    /// Returns `None` for unknown names, which callers treat as foreign
    /// files in the run directory rather than errors.
    pub fn parse(file_name: &str) -> Option<Self> {
        match file_name {
            "source.txt" => return Some(Self::Source),
            "run.json" => return Some(Self::RunMetadata),
            "guide.json" => return Some(Self::Guide),
            _ => {}
        }
        let stage = |rest: &str| -> Option<u32> {
            rest.strip_suffix(".json")?.parse().ok()
        };
        if let Some(rest) = file_name.strip_prefix("guide_partial_") {
            return stage(rest).map(Self::GuidePartial);
        }
        if let Some(rest) = file_name.strip_prefix("chapter_") {
            return stage(rest).map(Self::Chapter);
        }
        None
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}
