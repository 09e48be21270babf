//! Text measurement oracle.
//!
//! The core never talks to a font engine. Width-dependent decisions (line
//! wrapping, bidi render positions, caret hit-testing) go through the
//! [`TextMeasurer`] trait; the enclosing widget supplies an implementation
//! backed by its shaping service. [`ColumnMeasurer`] is a self-contained
//! implementation that prices characters by their terminal column width,
//! good enough for fixed-pitch rendering and for tests.
//!
//! All offsets exchanged with the oracle are character offsets, matching the
//! rest of the crate.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

/// Measurement oracle consumed by the wrapper and the bidi engine.
pub trait TextMeasurer {
    /// Per-character advance in pixels for `text` at the given weight.
    ///
    /// An advance of 0 marks a character that renders as part of its
    /// predecessor's glyph (combining marks, ligature continuations); caret
    /// logic never places the cursor inside such a cluster.
    fn advances(&self, text: &str, bold: bool) -> Vec<u32>;

    /// Character offsets at which `text` breaks into visual sub-lines when
    /// constrained to `width` pixels. The first element is always 0; empty
    /// text yields a single empty sub-line. `bold_ranges` are `(start, end)`
    /// character spans measured at bold weight.
    ///
    /// Breaks prefer word boundaries and fall back to mid-word breaks when a
    /// single word exceeds the available width.
    fn break_offsets(&self, text: &str, width: u32, bold_ranges: &[(usize, usize)]) -> Vec<usize>;
}

/// Per-character advances with bold sub-ranges measured at bold weight.
///
/// Each bold span is measured as its own request so a shaping-backed
/// measurer never forms ligatures across a weight change.
pub(crate) fn styled_advances(
    measurer: &dyn TextMeasurer,
    text: &str,
    bold_ranges: &[(usize, usize)],
) -> Vec<u32> {
    let mut advances = measurer.advances(text, false);
    if bold_ranges.is_empty() {
        return advances;
    }
    let boundaries: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
    let char_count = boundaries.len();
    for &(start, end) in bold_ranges {
        let (start, end) = (start.min(char_count), end.min(char_count));
        if start >= end {
            continue;
        }
        let byte_start = boundaries[start];
        let byte_end = boundaries.get(end).copied().unwrap_or(text.len());
        let bold = measurer.advances(&text[byte_start..byte_end], true);
        advances[start..end].copy_from_slice(&bold);
    }
    advances
}

/// Column-based measurement: every character costs its terminal column
/// width times a fixed cell width.
#[derive(Clone, Copy, Debug)]
pub struct ColumnMeasurer {
    cell_width: u32,
    /// Extra pixels a bold character costs; lets tests observe that bold
    /// spans really are measured separately.
    bold_extra: u32,
}

impl Default for ColumnMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnMeasurer {
    /// Create a measurer with an 8-pixel cell and no bold surcharge.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cell_width: 8,
            bold_extra: 0,
        }
    }

    /// Override the pixel width of one column.
    #[must_use]
    pub fn with_cell_width(mut self, cell_width: u32) -> Self {
        self.cell_width = cell_width;
        self
    }

    /// Add a per-character surcharge for bold text.
    #[must_use]
    pub fn with_bold_extra(mut self, bold_extra: u32) -> Self {
        self.bold_extra = bold_extra;
        self
    }

    fn char_advance(&self, c: char, bold: bool) -> u32 {
        if c == '\t' {
            // Placeholder advance; tab stops are resolved by the layout.
            return self.cell_width;
        }
        let columns = UnicodeWidthChar::width(c).unwrap_or(0) as u32;
        if columns == 0 {
            return 0;
        }
        columns * self.cell_width + if bold { self.bold_extra } else { 0 }
    }
}

impl TextMeasurer for ColumnMeasurer {
    fn advances(&self, text: &str, bold: bool) -> Vec<u32> {
        text.chars().map(|c| self.char_advance(c, bold)).collect()
    }

    fn break_offsets(&self, text: &str, width: u32, bold_ranges: &[(usize, usize)]) -> Vec<usize> {
        let mut breaks = vec![0];
        if text.is_empty() || width == 0 {
            return breaks;
        }
        let advances = styled_advances(self, text, bold_ranges);

        // Word spans as character offsets.
        let mut words = Vec::new();
        let mut char_index = 0;
        for word in text.split_word_bounds() {
            let len = word.chars().count();
            words.push((char_index, char_index + len));
            char_index += len;
        }

        let mut line_start = 0;
        let mut x: u32 = 0;
        for (word_start, word_end) in words {
            let word_width: u32 = advances[word_start..word_end].iter().sum();
            if x + word_width <= width {
                x += word_width;
                continue;
            }
            if word_start > line_start {
                breaks.push(word_start);
                line_start = word_start;
                x = 0;
            }
            if word_width <= width {
                x = word_width;
                continue;
            }
            // A single word wider than the line: break mid-word.
            for i in word_start..word_end {
                if x + advances[i] > width && i > line_start {
                    breaks.push(i);
                    line_start = i;
                    x = 0;
                }
                x += advances[i];
            }
        }
        breaks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_advances() {
        let measurer = ColumnMeasurer::new().with_cell_width(10);
        assert_eq!(measurer.advances("ab c", false), vec![10, 10, 10, 10]);
    }

    #[test]
    fn test_wide_and_zero_width_advances() {
        let measurer = ColumnMeasurer::new().with_cell_width(10);
        // CJK is two columns; a combining accent is zero.
        assert_eq!(measurer.advances("中", false), vec![20]);
        assert_eq!(measurer.advances("e\u{301}", false), vec![10, 0]);
    }

    #[test]
    fn test_bold_extra_changes_advances() {
        let measurer = ColumnMeasurer::new().with_cell_width(10).with_bold_extra(2);
        assert_eq!(measurer.advances("ab", true), vec![12, 12]);
        let styled = styled_advances(&measurer, "abcd", &[(1, 3)]);
        assert_eq!(styled, vec![10, 12, 12, 10]);
    }

    #[test]
    fn test_break_offsets_word_boundaries() {
        let measurer = ColumnMeasurer::new().with_cell_width(1);
        // Width 7: "hello " fits, "world" wraps to its own line.
        let breaks = measurer.break_offsets("hello world", 7, &[]);
        assert_eq!(breaks, vec![0, 6]);
    }

    #[test]
    fn test_break_offsets_midword_fallback() {
        let measurer = ColumnMeasurer::new().with_cell_width(1);
        let breaks = measurer.break_offsets("abcdefghij", 4, &[]);
        assert_eq!(breaks, vec![0, 4, 8]);
    }

    #[test]
    fn test_break_offsets_empty_text() {
        let measurer = ColumnMeasurer::new();
        assert_eq!(measurer.break_offsets("", 80, &[]), vec![0]);
    }

    #[test]
    fn test_break_offsets_cover_text() {
        let measurer = ColumnMeasurer::new().with_cell_width(1);
        let text = "the quick brown fox jumps over the lazy dog";
        for width in 1..20 {
            let breaks = measurer.break_offsets(text, width, &[]);
            assert_eq!(breaks[0], 0);
            for pair in breaks.windows(2) {
                assert!(pair[0] < pair[1], "breaks must increase: {breaks:?}");
            }
            assert!(*breaks.last().unwrap() < text.chars().count());
        }
    }
}
