//! Document-wide guide types.
//!
//! A `PartialGuide` is extracted from one coarse chunk; the reduce phase
//! concatenates the partials mechanically and a single polish call owns
//! semantic deduplication, so no list-level dedup happens here.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A character appearing in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideCharacter {
    /// Name as used in the text.
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
}

/// A location appearing in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideLocation {
    /// Name as used in the text.
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
}

/// A recurring term or concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideTerm {
    /// The term itself.
    pub term: String,
    /// Its meaning within the document.
    #[serde(default)]
    pub definition: String,
}

/// One event on the document timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Position in the merged, renumbered timeline (1-based).
    pub order: u32,
    /// What happens.
    pub summary: String,
}

/// Per-field item caps applied to a partial guide after decoding.
///
/// Over-long lists are valid but wasteful, so they are truncated rather
/// than failing the chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuideCaps {
    /// Maximum characters per chunk.
    pub characters: usize,
    /// Maximum locations per chunk.
    pub locations: usize,
    /// Maximum terms per chunk.
    pub terms: usize,
    /// Maximum themes per chunk.
    pub themes: usize,
    /// Maximum timeline events per chunk.
    pub timeline: usize,
}

impl Default for GuideCaps {
    fn default() -> Self {
        Self {
            characters: 12,
            locations: 8,
            terms: 10,
            themes: 6,
            timeline: 10,
        }
    }
}

/// Structured digest extracted from a single coarse chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialGuide {
    /// Characters introduced or active in the chunk.
    #[serde(default)]
    pub characters: Vec<GuideCharacter>,
    /// Locations appearing in the chunk.
    #[serde(default)]
    pub locations: Vec<GuideLocation>,
    /// Terms and concepts used in the chunk.
    #[serde(default)]
    pub terms: Vec<GuideTerm>,
    /// Themes present in the chunk.
    #[serde(default)]
    pub themes: Vec<String>,
    /// Events in chunk order.
    #[serde(default)]
    pub timeline: Vec<TimelineEvent>,
    /// Style descriptor for the chunk's prose.
    #[serde(default)]
    pub style: String,
}

impl PartialGuide {
    /// Returns true if every field is empty.
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
            && self.locations.is_empty()
            && self.terms.is_empty()
            && self.themes.is_empty()
            && self.timeline.is_empty()
            && self.style.trim().is_empty()
    }

    /// Applies per-field item caps, truncating over-long lists.
    pub fn apply_caps(&mut self, caps: &GuideCaps) {
        self.characters.truncate(caps.characters);
        self.locations.truncate(caps.locations);
        self.terms.truncate(caps.terms);
        self.themes.truncate(caps.themes);
        self.timeline.truncate(caps.timeline);
    }
}

/// The document-wide structured digest.
///
/// Built incrementally from per-chunk partials, then polished once; once
/// finalized it is read-only input to every chapter stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalGuide {
    /// All characters across the document.
    #[serde(default)]
    pub characters: Vec<GuideCharacter>,
    /// All locations across the document.
    #[serde(default)]
    pub locations: Vec<GuideLocation>,
    /// All terms across the document.
    #[serde(default)]
    pub terms: Vec<GuideTerm>,
    /// All themes across the document.
    #[serde(default)]
    pub themes: Vec<String>,
    /// The merged timeline, renumbered into a single increasing order.
    #[serde(default)]
    pub timeline: Vec<TimelineEvent>,
    /// Style descriptor for the whole document.
    #[serde(default)]
    pub style: String,
}

impl GlobalGuide {
    /// Merges per-chunk partials into a raw aggregate.
    ///
    /// List fields are concatenated without deduplication, the timeline is
    /// flattened and renumbered monotonically, and the first non-empty style
    /// descriptor is taken as the default.
    pub fn merge(partials: &[PartialGuide]) -> Self {
        let mut guide = Self::default();
        let mut order = 0u32;

        for partial in partials {
            guide.characters.extend(partial.characters.iter().cloned());
            guide.locations.extend(partial.locations.iter().cloned());
            guide.terms.extend(partial.terms.iter().cloned());
            guide.themes.extend(partial.themes.iter().cloned());
            for event in &partial.timeline {
                order += 1;
                guide.timeline.push(TimelineEvent {
                    order,
                    summary: event.summary.clone(),
                });
            }
            if guide.style.is_empty() && !partial.style.trim().is_empty() {
                guide.style = partial.style.clone();
            }
        }

        guide
    }

    /// Validates the guide as polish output.
    ///
    /// A guide with no content at all is not valid structured output; the
    /// caller treats this the same as a malformed response.
    pub fn validate(&self) -> Result<()> {
        let empty = self.characters.is_empty()
            && self.locations.is_empty()
            && self.terms.is_empty()
            && self.themes.is_empty()
            && self.timeline.is_empty()
            && self.style.trim().is_empty();
        if empty {
            return Err(Error::validation("polished guide has no content"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(name: &str, events: &[&str]) -> PartialGuide {
        PartialGuide {
            characters: vec![GuideCharacter {
                name: name.to_string(),
                description: String::new(),
            }],
            timeline: events
                .iter()
                .enumerate()
                .map(|(i, e)| TimelineEvent {
                    order: i as u32 + 1,
                    summary: e.to_string(),
                })
                .collect(),
            style: format!("style of {name}"),
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_concatenates_without_dedup() {
        let partials = vec![partial("Ada", &["a"]), partial("Ada", &["b"])];
        let guide = GlobalGuide::merge(&partials);
        // Same name twice: dedup is the polish call's job, not ours.
        assert_eq!(guide.characters.len(), 2);
    }

    #[test]
    fn test_merge_renumbers_timeline() {
        let partials = vec![partial("A", &["one", "two"]), partial("B", &["three"])];
        let guide = GlobalGuide::merge(&partials);
        let orders: Vec<u32> = guide.timeline.iter().map(|e| e.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(guide.timeline[2].summary, "three");
    }

    #[test]
    fn test_merge_takes_first_nonempty_style() {
        let mut first = partial("A", &[]);
        first.style = String::new();
        let second = partial("B", &[]);
        let guide = GlobalGuide::merge(&[first, second]);
        assert_eq!(guide.style, "style of B");
    }

    #[test]
    fn test_apply_caps_truncates() {
        let mut partial = PartialGuide {
            themes: (0..20).map(|i| format!("theme {i}")).collect(),
            ..Default::default()
        };
        partial.apply_caps(&GuideCaps::default());
        assert_eq!(partial.themes.len(), GuideCaps::default().themes);
    }

    #[test]
    fn test_empty_guide_fails_validation() {
        assert!(GlobalGuide::default().validate().is_err());
        let guide = GlobalGuide {
            style: "plain".to_string(),
            ..Default::default()
        };
        assert!(guide.validate().is_ok());
    }
}
