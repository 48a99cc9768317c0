//! Prompt scaffolding for the three oracle call sites.
//!
//! The wording here carries no contract; call sites only rely on the
//! response shapes declared in `abridge-core`.

use abridge_core::types::{GlobalGuide, GuideCaps};

pub(crate) const GUIDE_MAP_SYSTEM: &str = "You extract structured reading guides \
from book excerpts. Respond with a single JSON object with the fields \
characters, locations, terms, themes, timeline, and style. No prose outside \
the JSON.";

pub(crate) const GUIDE_POLISH_SYSTEM: &str = "You deduplicate and compact reading \
guides. Merge near-duplicate characters, locations, and terms, drop redundant \
entries, and keep the timeline concise. Respond with a single JSON object of \
the same shape. No prose outside the JSON.";

pub(crate) const CHAPTER_SYSTEM: &str = "You condense book excerpts into short \
chapters. Respond with a single JSON object holding a title and a content \
array of paragraphs and key points. Quote key points must name who said \
them. No prose outside the JSON.";

pub(crate) fn guide_map_prompt(chunk_text: &str, caps: &GuideCaps) -> String {
    format!(
        "Extract a partial reading guide from the excerpt below. List at most \
         {} characters, {} locations, {} terms, {} themes, and {} timeline \
         events.\n\nEXCERPT:\n{chunk_text}",
        caps.characters, caps.locations, caps.terms, caps.themes, caps.timeline,
    )
}

pub(crate) fn guide_polish_prompt(aggregate: &GlobalGuide) -> String {
    // The aggregate always serializes; its fields are plain lists and strings.
    let json = serde_json::to_string_pretty(aggregate).unwrap_or_default();
    format!(
        "Deduplicate and compact this aggregated reading guide:\n\n{json}"
    )
}

pub(crate) fn chapter_prompt(
    chunk_text: &str,
    guide: &GlobalGuide,
    previous_cue: Option<&str>,
) -> String {
    let guide_json = serde_json::to_string_pretty(guide).unwrap_or_default();
    let mut prompt = format!("READING GUIDE:\n{guide_json}\n\n");
    if let Some(cue) = previous_cue {
        prompt.push_str(&format!("PREVIOUS CHAPTER ENDED WITH:\n{cue}\n\n"));
    }
    prompt.push_str(&format!(
        "Condense the excerpt below into one chapter, consistent with the \
         guide and continuous with the previous chapter.\n\nEXCERPT:\n{chunk_text}"
    ));
    prompt
}
