//! Elastic token-bounded segmentation.

use abridge_core::{Error, Result, Tokenizer};
use tracing::instrument;

use crate::chunk::{Boundary, Chunk, ChunkMetadata, Segmentation};
use crate::params::{DEFAULT_TOLERANCE, SegmentParams};
use crate::TRACING_TARGET;

/// Splits a long text into an ordered sequence of token-bounded chunks.
///
/// Boundary math runs on token indices and is mapped back to byte offsets by
/// decoding token prefixes, so cuts respect the tokenizer's notion of
/// position rather than naive character slicing. Within the tolerance window
/// the segmenter prefers the last paragraph break, then the last sentence
/// end, and otherwise falls back to a hard token cut (which may split
/// mid-sentence).
#[derive(Debug, Clone)]
pub struct ElasticSegmenter {
    tokenizer: Tokenizer,
    tolerance: f64,
}

impl ElasticSegmenter {
    /// Creates a segmenter with the given tolerance band.
    pub fn new(tokenizer: Tokenizer, tolerance: f64) -> Result<Self> {
        if !(tolerance > 0.0 && tolerance < 1.0) {
            return Err(Error::invalid_input(format!(
                "tolerance must be in (0, 1), got {tolerance}"
            )));
        }
        Ok(Self {
            tokenizer,
            tolerance,
        })
    }

    /// Creates a segmenter with the default tolerance.
    pub fn with_defaults(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Returns the tolerance band.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Segments `text` into chunks of roughly `params.chunk_tokens` tokens,
    /// overlapping consecutive chunks by roughly `params.overlap_tokens`.
    ///
    /// The returned chunks cover `[0, text.len())` exactly and monotonically,
    /// modulo the configured overlaps. Deterministic for fixed input and
    /// parameters.
    #[instrument(skip(self, text), fields(text_len = text.len()), target = TRACING_TARGET)]
    pub fn segment<'a>(&self, text: &'a str, params: &SegmentParams) -> Result<Segmentation<'a>> {
        if params.chunk_tokens == 0 {
            return Err(Error::invalid_input("chunk_tokens must be at least 1"));
        }

        let target = params.chunk_tokens;
        let tokens = self.tokenizer.encode(text);
        let total = tokens.len();

        let mut chunks: Vec<Chunk<'a>> = Vec::new();
        let mut boundaries: Vec<Boundary> = Vec::new();

        if total == 0 {
            return Ok(Segmentation { chunks, boundaries });
        }

        let slack = ((target as f64) * self.tolerance).round() as usize;
        let floor = target.saturating_sub(slack);

        let mut start_tok = 0usize;
        let mut start_char = 0usize;

        while start_tok < total {
            let remaining = total - start_tok;

            // Whatever is left fits under the ceiling: emit it as the final
            // chunk. It may be shorter than the tolerance floor.
            if remaining <= target + slack {
                let token_count = self.tokenizer.count(text[start_char..].trim());
                if token_count > 0 {
                    push_chunk(
                        &mut chunks,
                        &mut boundaries,
                        text,
                        start_char,
                        text.len(),
                        token_count,
                    );
                }
                break;
            }

            let end_target = start_tok + target;
            let end_tok = (end_target + slack).min(total);
            let max_char = self.tokenizer.prefix_offset(&tokens, end_tok);
            let window_start_tok = end_target.saturating_sub(slack).max(start_tok);
            let window_char = self
                .tokenizer
                .prefix_offset(&tokens, window_start_tok)
                .max(start_char);

            let mut cut = best_cut(&text[window_char..max_char])
                .map(|rel| window_char + rel)
                .unwrap_or(max_char);
            if cut <= start_char {
                cut = max_char;
            }

            let slice = &text[start_char..cut];
            let mut token_count = self.tokenizer.count(slice.trim());

            // Degenerate slice: force the cursor forward by half the target
            // window so adversarial input cannot stall the loop.
            if token_count == 0 {
                start_tok = (start_tok + (target / 2).max(1)).min(total);
                start_char = self.tokenizer.prefix_offset(&tokens, start_tok);
                continue;
            }

            // A chunk below the tolerance floor mid-document gets extended
            // forward by ~20% of its own length rather than emitted as a
            // pathologically short chunk.
            let mut end_char = cut;
            if token_count < floor && end_char < text.len() {
                let extended = char_floor(text, (end_char + slice.len() / 5).min(text.len()));
                if extended > end_char {
                    end_char = extended;
                    token_count = self.tokenizer.count(text[start_char..end_char].trim());
                }
            }

            push_chunk(
                &mut chunks,
                &mut boundaries,
                text,
                start_char,
                end_char,
                token_count,
            );

            if end_char >= text.len() {
                break;
            }

            // Overlap is proportional in characters because token density
            // varies with content. Never step back past start_char + 1, so
            // forward progress is guaranteed.
            let chunk_chars = end_char - start_char;
            let overlap_chars = ((params.overlap_tokens as f64 / token_count as f64)
                * chunk_chars as f64) as usize;
            let next_char = char_ceil(
                text,
                end_char.saturating_sub(overlap_chars).max(start_char + 1),
            );

            // Map the character cursor back into token space by re-encoding
            // the prefix. O(n) per step; acceptable at book scale.
            let next_tok = self.tokenizer.count(&text[..next_char]);
            start_tok = next_tok.max(start_tok + 1).min(total);
            start_char = next_char;
        }

        tracing::debug!(
            target: TRACING_TARGET,
            chunk_count = chunks.len(),
            total_tokens = total,
            "Segmentation complete"
        );

        Ok(Segmentation { chunks, boundaries })
    }
}

fn push_chunk<'a>(
    chunks: &mut Vec<Chunk<'a>>,
    boundaries: &mut Vec<Boundary>,
    text: &'a str,
    start: usize,
    end: usize,
    token_count: usize,
) {
    let index = chunks.len() as u32;
    chunks.push(Chunk::new(
        &text[start..end],
        ChunkMetadata::new(index, start, end, token_count),
    ));
    boundaries.push(Boundary {
        start,
        end,
        tokens: token_count,
    });
}

/// Finds the best cut point within the search window.
///
/// Latest boundary wins: the last paragraph break, else the last sentence
/// end. Returns a byte offset relative to the window start, or `None` when
/// the window holds no usable boundary.
fn best_cut(window: &str) -> Option<usize> {
    paragraph_cut(window).or_else(|| sentence_cut(window)).filter(|&rel| rel > 0)
}

fn paragraph_cut(window: &str) -> Option<usize> {
    window.rfind("\n\n").map(|pos| pos + 2)
}

fn sentence_cut(window: &str) -> Option<usize> {
    let mut last = None;
    let mut iter = window.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        if matches!(c, '.' | '!' | '?') {
            match iter.peek() {
                Some((_, next)) if next.is_whitespace() => last = Some(i + c.len_utf8()),
                None => last = Some(i + c.len_utf8()),
                _ => {}
            }
        }
    }
    last
}

/// Rounds `pos` down to the nearest char boundary.
fn char_floor(text: &str, mut pos: usize) -> usize {
    while pos > 0 && !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

/// Rounds `pos` up to the nearest char boundary.
fn char_ceil(text: &str, mut pos: usize) -> usize {
    while pos < text.len() && !text.is_char_boundary(pos) {
        pos += 1;
    }
    pos.min(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> Tokenizer {
        Tokenizer::with_defaults().unwrap()
    }

    /// `paragraphs` short paragraphs of three sentences each, so every
    /// tolerance window contains at least one paragraph break.
    fn sample_text(paragraphs: usize) -> String {
        let sentence = "The quick brown fox jumps over the lazy dog near the riverbank. ";
        let paragraph = sentence.repeat(3);
        let mut text = String::new();
        for _ in 0..paragraphs {
            text.push_str(paragraph.trim_end());
            text.push_str("\n\n");
        }
        text
    }

    #[test]
    fn test_short_document_yields_single_chunk() {
        let tk = tokenizer();
        let segmenter = ElasticSegmenter::with_defaults(tk.clone());
        let text = "A short paragraph. Nothing more to say.";
        let seg = segmenter
            .segment(text, &SegmentParams::new(1_000, 100))
            .unwrap();

        assert_eq!(seg.len(), 1);
        assert_eq!(seg.chunks[0].metadata.start_offset, 0);
        assert_eq!(seg.chunks[0].metadata.end_offset, text.len());
    }

    #[test]
    fn test_empty_document_yields_no_chunks() {
        let segmenter = ElasticSegmenter::with_defaults(tokenizer());
        let seg = segmenter.segment("", &SegmentParams::new(100, 10)).unwrap();
        assert!(seg.is_empty());
    }

    #[test]
    fn test_coverage_has_no_gaps() {
        let segmenter = ElasticSegmenter::with_defaults(tokenizer());
        let text = sample_text(40);
        let seg = segmenter
            .segment(&text, &SegmentParams::new(200, 20))
            .unwrap();

        assert!(seg.len() > 1);
        assert_eq!(seg.chunks[0].metadata.start_offset, 0);
        assert_eq!(seg.chunks.last().unwrap().metadata.end_offset, text.len());
        for pair in seg.chunks.windows(2) {
            // Next chunk starts at or before the previous end (overlap),
            // never after it (gap), and always makes forward progress.
            assert!(pair[1].metadata.start_offset <= pair[0].metadata.end_offset);
            assert!(pair[1].metadata.start_offset > pair[0].metadata.start_offset);
        }
    }

    #[test]
    fn test_token_budget_respected() {
        let tk = tokenizer();
        let segmenter = ElasticSegmenter::with_defaults(tk.clone());
        let text = sample_text(40);
        let target = 200usize;
        let seg = segmenter
            .segment(&text, &SegmentParams::new(target, 20))
            .unwrap();

        let slack = (target as f64 * segmenter.tolerance()).round() as usize;
        for chunk in &seg.chunks[..seg.len() - 1] {
            // Small margin absorbs prefix re-encoding drift at chunk seams.
            assert!(
                chunk.metadata.token_count + 3 >= target - slack,
                "chunk {} below floor: {}",
                chunk.metadata.index,
                chunk.metadata.token_count
            );
            assert!(
                chunk.metadata.token_count <= target + slack + 3,
                "chunk {} above ceiling: {}",
                chunk.metadata.index,
                chunk.metadata.token_count
            );
        }
    }

    #[test]
    fn test_deterministic() {
        let segmenter = ElasticSegmenter::with_defaults(tokenizer());
        let text = sample_text(25);
        let params = SegmentParams::new(150, 15);

        let a = segmenter.segment(&text, &params).unwrap();
        let b = segmenter.segment(&text, &params).unwrap();
        assert_eq!(a.boundaries, b.boundaries);
    }

    #[test]
    fn test_terminates_without_boundaries() {
        // No whitespace, no sentence terminals: every cut is a hard cut.
        let segmenter = ElasticSegmenter::with_defaults(tokenizer());
        let text = "a".repeat(8_000);
        let seg = segmenter
            .segment(&text, &SegmentParams::new(100, 10))
            .unwrap();

        assert!(seg.len() > 1);
        assert_eq!(seg.chunks.last().unwrap().metadata.end_offset, text.len());
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let segmenter = ElasticSegmenter::with_defaults(tokenizer());
        let text = sample_text(40);
        let seg = segmenter
            .segment(&text, &SegmentParams::new(200, 20))
            .unwrap();

        // Non-final cuts land right after a paragraph break.
        for chunk in &seg.chunks[..seg.len() - 1] {
            let end = chunk.metadata.end_offset;
            assert_eq!(&text[end - 2..end], "\n\n", "chunk {}", chunk.metadata.index);
        }
    }

    #[test]
    fn test_overlap_is_bounded() {
        let segmenter = ElasticSegmenter::with_defaults(tokenizer());
        let text = sample_text(40);
        let params = SegmentParams::new(200, 20);
        let seg = segmenter.segment(&text, &params).unwrap();

        for pair in seg.chunks.windows(2) {
            let overlap_bytes = pair[0]
                .metadata
                .end_offset
                .saturating_sub(pair[1].metadata.start_offset);
            // Proportional overlap stays near the configured token budget;
            // generously bound it at eight bytes per overlap token.
            assert!(overlap_bytes <= params.overlap_tokens * 8);
        }
    }

    #[test]
    fn test_invalid_tolerance_rejected() {
        assert!(ElasticSegmenter::new(tokenizer(), 0.0).is_err());
        assert!(ElasticSegmenter::new(tokenizer(), 1.0).is_err());
    }

    #[test]
    fn test_sentence_cut_fallback() {
        // Sentences but no paragraph breaks: cuts land on sentence ends.
        let segmenter = ElasticSegmenter::with_defaults(tokenizer());
        let text = "The quick brown fox jumps over the lazy dog near the river. ".repeat(120);
        let seg = segmenter
            .segment(&text, &SegmentParams::new(150, 15))
            .unwrap();

        assert!(seg.len() > 1);
        for chunk in &seg.chunks[..seg.len() - 1] {
            let end = chunk.metadata.end_offset;
            assert_eq!(&text[end - 1..end], ".", "chunk {}", chunk.metadata.index);
        }
    }
}
