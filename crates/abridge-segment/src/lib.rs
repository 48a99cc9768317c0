#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod chunk;
mod params;
mod segmenter;

pub use chunk::{Boundary, Chunk, ChunkMetadata, OwnedChunk, Segmentation};
pub use params::{DEFAULT_TOLERANCE, SegmentParams, compute_params};
pub use segmenter::ElasticSegmenter;

/// Tracing target for segmentation operations.
pub const TRACING_TARGET: &str = "abridge_segment";
