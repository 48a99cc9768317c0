//! Segmentation parameter calculation.
//!
//! Small documents get small, context-efficient chunks; very large documents
//! need large chunks to bound the total stage count and the number of oracle
//! calls. Clamps at both ends keep outlier input sizes from producing
//! degenerate settings.

use serde::{Deserialize, Serialize};

/// Reference band for total document size, in tokens.
const MIN_DOC_TOKENS: usize = 80_000;
const MAX_DOC_TOKENS: usize = 1_200_000;

/// Chunk-size band the document size interpolates over, in tokens.
const MIN_CHUNK_TOKENS: usize = 11_000;
const MAX_CHUNK_TOKENS: usize = 40_000;

/// Overlap is a fixed fraction of the chunk size, clamped to absolute bounds.
const OVERLAP_FRACTION: f64 = 0.10;
const MIN_OVERLAP_TOKENS: usize = 400;
const MAX_OVERLAP_TOKENS: usize = 2_000;

/// Default tolerance band around the chunk-size target.
pub const DEFAULT_TOLERANCE: f64 = 0.15;

/// Chunk-size and overlap targets for one segmentation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentParams {
    /// Target tokens per chunk.
    pub chunk_tokens: usize,
    /// Target overlap between consecutive chunks, in tokens.
    pub overlap_tokens: usize,
}

impl SegmentParams {
    /// Creates parameters directly.
    pub fn new(chunk_tokens: usize, overlap_tokens: usize) -> Self {
        Self {
            chunk_tokens,
            overlap_tokens,
        }
    }

    /// Scales the chunk target by `factor` and re-derives the overlap.
    ///
    /// Used for the fine-grained chapter pass, which re-segments the same
    /// document at a fraction of the coarse chunk size.
    pub fn scaled(&self, factor: f64) -> Self {
        let chunk_tokens = ((self.chunk_tokens as f64 * factor).round() as usize).max(1);
        Self {
            chunk_tokens,
            overlap_tokens: derive_overlap(chunk_tokens),
        }
    }
}

/// Derives chunk-size and overlap targets from the total document size.
///
/// Chunk size interpolates linearly between the chunk band as the document
/// moves through the reference band, clamped at both ends. Overlap is ~10%
/// of the resulting chunk size, clamped to `[400, 2000]` tokens.
pub fn compute_params(total_tokens: usize) -> SegmentParams {
    let chunk_tokens = if total_tokens <= MIN_DOC_TOKENS {
        MIN_CHUNK_TOKENS
    } else if total_tokens >= MAX_DOC_TOKENS {
        MAX_CHUNK_TOKENS
    } else {
        let t = (total_tokens - MIN_DOC_TOKENS) as f64 / (MAX_DOC_TOKENS - MIN_DOC_TOKENS) as f64;
        MIN_CHUNK_TOKENS + (t * (MAX_CHUNK_TOKENS - MIN_CHUNK_TOKENS) as f64).round() as usize
    };

    SegmentParams {
        chunk_tokens,
        overlap_tokens: derive_overlap(chunk_tokens),
    }
}

fn derive_overlap(chunk_tokens: usize) -> usize {
    ((chunk_tokens as f64 * OVERLAP_FRACTION).round() as usize)
        .clamp(MIN_OVERLAP_TOKENS, MAX_OVERLAP_TOKENS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_document_gets_minimum_chunk() {
        let params = compute_params(10_000);
        assert_eq!(params.chunk_tokens, MIN_CHUNK_TOKENS);
    }

    #[test]
    fn test_huge_document_gets_maximum_chunk() {
        let params = compute_params(5_000_000);
        assert_eq!(params.chunk_tokens, MAX_CHUNK_TOKENS);
        assert_eq!(params.overlap_tokens, MAX_OVERLAP_TOKENS);
    }

    #[test]
    fn test_interpolation_near_low_end() {
        // 100k tokens sits just above the reference minimum, so the chunk
        // size lands just above the minimum chunk size.
        let params = compute_params(100_000);
        assert!(params.chunk_tokens > MIN_CHUNK_TOKENS);
        assert!(params.chunk_tokens < 12_000);
        assert_eq!(
            params.overlap_tokens,
            (params.chunk_tokens as f64 * OVERLAP_FRACTION).round() as usize
        );
    }

    #[test]
    fn test_overlap_clamped_to_floor() {
        let params = SegmentParams::new(2_000, 0).scaled(1.0);
        assert_eq!(params.overlap_tokens, MIN_OVERLAP_TOKENS);
    }

    #[test]
    fn test_interpolation_is_monotonic() {
        let mut last = 0;
        for total in (MIN_DOC_TOKENS..=MAX_DOC_TOKENS).step_by(100_000) {
            let params = compute_params(total);
            assert!(params.chunk_tokens >= last);
            last = params.chunk_tokens;
        }
    }

    #[test]
    fn test_scaled_rederives_overlap() {
        let coarse = compute_params(500_000);
        let fine = coarse.scaled(0.25);
        assert_eq!(
            fine.chunk_tokens,
            (coarse.chunk_tokens as f64 * 0.25).round() as usize
        );
        assert!(fine.overlap_tokens >= MIN_OVERLAP_TOKENS);
        assert!(fine.overlap_tokens <= MAX_OVERLAP_TOKENS);
    }
}
