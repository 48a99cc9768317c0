//! Domain artifact types shared across the pipeline.

mod guide;
mod stage;

pub use guide::{
    GlobalGuide, GuideCaps, GuideCharacter, GuideLocation, GuideTerm, PartialGuide, TimelineEvent,
};
pub use stage::{ContentItem, KeyPointKind, StageOutput};
