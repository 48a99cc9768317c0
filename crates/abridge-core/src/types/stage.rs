//! Chapter stage output types.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, IntoStaticStr};

use crate::error::{Error, Result};

/// Kind tag for an annotated key point.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum KeyPointKind {
    /// An interpretive insight.
    Insight,
    /// A concrete fact established by the text.
    Fact,
    /// A direct quote; requires attribution.
    Quote,
}

/// One content item within a stage output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    /// A narrative paragraph.
    Paragraph {
        /// Paragraph text.
        text: String,
    },
    /// An annotated key point.
    KeyPoint {
        /// Kind tag.
        kind: KeyPointKind,
        /// Key point text.
        text: String,
        /// Who said it; mandatory and non-empty for quotes, absent otherwise.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attribution: Option<String>,
    },
}

/// The condensed result of processing one fine-grained chunk.
///
/// Append-only once persisted: an existing artifact is never silently
/// overwritten, only superseded under a separate run identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutput {
    /// Chapter title.
    pub title: String,
    /// Ordered content items.
    pub content: Vec<ContentItem>,
}

impl StageOutput {
    /// Validates the structural contract of a stage output.
    ///
    /// Quote key points must carry a non-empty attribution; every other
    /// item must omit the field entirely rather than carry a null.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::validation("stage output has an empty title"));
        }
        if self.content.is_empty() {
            return Err(Error::validation("stage output has no content"));
        }
        for (i, item) in self.content.iter().enumerate() {
            match item {
                ContentItem::Paragraph { text } => {
                    if text.trim().is_empty() {
                        return Err(Error::validation(format!("content item {i} is empty")));
                    }
                }
                ContentItem::KeyPoint {
                    kind,
                    text,
                    attribution,
                } => {
                    if text.trim().is_empty() {
                        return Err(Error::validation(format!("content item {i} is empty")));
                    }
                    match (kind, attribution) {
                        (KeyPointKind::Quote, None) => {
                            return Err(Error::validation(format!(
                                "quote key point {i} is missing attribution"
                            )));
                        }
                        (KeyPointKind::Quote, Some(a)) if a.trim().is_empty() => {
                            return Err(Error::validation(format!(
                                "quote key point {i} has an empty attribution"
                            )));
                        }
                        (KeyPointKind::Quote, Some(_)) => {}
                        (_, Some(_)) => {
                            return Err(Error::validation(format!(
                                "non-quote key point {i} carries an attribution"
                            )));
                        }
                        (_, None) => {}
                    }
                }
            }
        }
        Ok(())
    }

    /// Renders the output as plain text for downstream context.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.title);
        for item in &self.content {
            out.push_str("\n\n");
            match item {
                ContentItem::Paragraph { text } => out.push_str(text),
                ContentItem::KeyPoint {
                    text, attribution, ..
                } => {
                    out.push_str(text);
                    if let Some(who) = attribution {
                        out.push_str(" — ");
                        out.push_str(who);
                    }
                }
            }
        }
        out
    }

    /// Derives a short continuation cue for the next stage.
    ///
    /// Returns the tail of the rendered text, truncated to at most
    /// `max_chars` bytes and advanced to a sentence boundary when one exists
    /// within the tail.
    pub fn continuation_cue(&self, max_chars: usize) -> String {
        let rendered = self.render_text();
        if rendered.len() <= max_chars {
            return rendered;
        }

        let mut start = rendered.len() - max_chars;
        while !rendered.is_char_boundary(start) {
            start += 1;
        }

        let tail = &rendered[start..];
        let cue = match tail.find(". ") {
            Some(pos) if pos + 2 < tail.len() => &tail[pos + 2..],
            _ => tail,
        };
        cue.trim_start().to_string()
    }
}
