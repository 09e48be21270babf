//! Logical-to-visual line wrapping.
//!
//! The [`LineWrapper`] splits each logical line into one or more visual
//! lines that fit a pixel width, asking the [`TextMeasurer`] where the
//! breaks fall. It keeps a flat table of visual lines that mirrors the
//! structure of the line index one level up: binary-searchable by start
//! offset, incrementally respliced when the text changes.

use crate::content::{ChangeKind, TextChange, TextStore};
use crate::error::{Error, Result};
use crate::measure::TextMeasurer;
use crate::style::StyleRangeTable;

/// One wrapped segment of a logical line.
///
/// The visual lines of a logical line are contiguous and cover it exactly,
/// delimiter included; the last segment carries the delimiter characters in
/// its length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisualLine {
    /// Index of the logical line this segment belongs to.
    pub logical_line: usize,
    /// Start offset within the logical line.
    pub start_in_line: usize,
    /// Length in characters.
    pub length: usize,
}

#[derive(Clone, Copy, Debug)]
struct WrapEntry {
    /// Absolute logical start offset.
    start: usize,
    len: usize,
    logical_line: usize,
}

/// Wraps logical lines to a pixel width and answers offset/visual-line
/// queries.
///
/// A width of 0 means the owning widget is not realized yet: wrapping is
/// deferred and every query falls back to the identity mapping, one visual
/// line per logical line. The first `wrap` with a real width builds the
/// table.
#[derive(Debug, Default)]
pub struct LineWrapper {
    entries: Vec<WrapEntry>,
    width: u32,
}

impl LineWrapper {
    /// Create an unrealized wrapper (width 0, wrapping deferred).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current wrap width; 0 while deferred.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Whether wrapping is deferred pending a non-zero width.
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        self.width == 0
    }

    /// Set the wrap width and rebuild the visual line table. Width 0 clears
    /// the table and defers wrapping.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolated`] if the store and wrapper have
    /// fallen out of step.
    pub fn wrap(
        &mut self,
        width: u32,
        store: &TextStore,
        styles: &StyleRangeTable,
        measurer: &dyn TextMeasurer,
    ) -> Result<()> {
        self.width = width;
        self.entries.clear();
        if width == 0 {
            return Ok(());
        }
        for line in 0..store.line_count() {
            self.wrap_logical_line_into(line, store, styles, measurer)?;
        }
        Ok(())
    }

    /// Incrementally re-wrap the logical lines touched by a text change,
    /// splicing fresh visual lines in and shifting the rest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolated`] when the change does not match
    /// the store contents (stale change record).
    pub fn text_changed(
        &mut self,
        change: &TextChange,
        store: &TextStore,
        styles: &StyleRangeTable,
        measurer: &dyn TextMeasurer,
    ) -> Result<()> {
        if self.width == 0 {
            return Ok(());
        }
        if change.kind == ChangeKind::SetText {
            return self.wrap(self.width, store, styles, measurer);
        }

        let mut first = store.line_at_offset(change.start)?;
        if first > 0
            && change.start == store.offset_at_line(first)?
            && store.char_at(change.start - 1) == Some('\r')
        {
            // Same widening rule as the line index: a bare CR on the
            // previous line belongs to the affected window.
            first -= 1;
        }
        let old_last = first + change.replaced_line_count;
        let new_last = first + change.new_line_count;
        if new_last >= store.line_count() {
            return Err(Error::InvariantViolated(
                "text change window exceeds the line table",
            ));
        }

        let win_start = self.entries.partition_point(|e| e.logical_line < first);
        let win_end = self.entries.partition_point(|e| e.logical_line <= old_last);

        let mut fresh = Vec::new();
        for line in first..=new_last {
            wrap_one_line(self.width, line, store, styles, measurer, &mut fresh)?;
        }
        let fresh_len = fresh.len();

        let char_delta = change.new_char_count as isize - change.replaced_char_count as isize;
        let line_delta = change.new_line_count as isize - change.replaced_line_count as isize;
        self.entries.splice(win_start..win_end, fresh);
        for entry in &mut self.entries[win_start + fresh_len..] {
            entry.start = (entry.start as isize + char_delta) as usize;
            entry.logical_line = (entry.logical_line as isize + line_delta) as usize;
        }
        Ok(())
    }

    /// Re-wrap a range of logical lines in place (the line structure is
    /// unchanged but their width-relevant content is stale, e.g. a bold
    /// style was applied).
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] for a bad line range.
    pub fn rewrap_lines(
        &mut self,
        first: usize,
        last: usize,
        store: &TextStore,
        styles: &StyleRangeTable,
        measurer: &dyn TextMeasurer,
    ) -> Result<()> {
        if self.width == 0 {
            return Ok(());
        }
        if last >= store.line_count() || first > last {
            return Err(Error::OutOfRange {
                index: last,
                max: store.line_count() - 1,
            });
        }
        let win_start = self.entries.partition_point(|e| e.logical_line < first);
        let win_end = self.entries.partition_point(|e| e.logical_line <= last);
        let mut fresh = Vec::new();
        for line in first..=last {
            wrap_one_line(self.width, line, store, styles, measurer, &mut fresh)?;
        }
        self.entries.splice(win_start..win_end, fresh);
        Ok(())
    }

    /// Number of visual lines.
    #[must_use]
    pub fn visual_line_count(&self, store: &TextStore) -> usize {
        if self.width == 0 {
            store.line_count()
        } else {
            self.entries.len()
        }
    }

    /// The visual line at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] for a bad index.
    pub fn visual_line(&self, index: usize, store: &TextStore) -> Result<VisualLine> {
        if self.width == 0 {
            return Ok(VisualLine {
                logical_line: index,
                start_in_line: 0,
                length: store.line_length(index)?,
            });
        }
        let entry = self.entry(index)?;
        let line_start = store.offset_at_line(entry.logical_line)?;
        Ok(VisualLine {
            logical_line: entry.logical_line,
            start_in_line: entry.start - line_start,
            length: entry.len,
        })
    }

    /// The visual line containing a logical offset; `char_count` itself
    /// answers the last visual line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] past the end.
    pub fn visual_line_at_offset(&self, offset: usize, store: &TextStore) -> Result<usize> {
        if offset > store.char_count() {
            return Err(Error::OutOfRange {
                index: offset,
                max: store.char_count(),
            });
        }
        if self.width == 0 {
            return store.line_at_offset(offset);
        }
        Ok(self
            .entries
            .partition_point(|e| e.start <= offset)
            .saturating_sub(1))
    }

    /// The absolute start offset of a visual line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] for a bad index.
    pub fn offset_at_visual_line(&self, index: usize, store: &TextStore) -> Result<usize> {
        if self.width == 0 {
            return store.offset_at_line(index);
        }
        Ok(self.entry(index)?.start)
    }

    /// Index of the first visual line of a logical line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] for a bad logical line.
    pub fn first_visual_of_line(&self, logical_line: usize, store: &TextStore) -> Result<usize> {
        if logical_line >= store.line_count() {
            return Err(Error::OutOfRange {
                index: logical_line,
                max: store.line_count() - 1,
            });
        }
        if self.width == 0 {
            return Ok(logical_line);
        }
        Ok(self
            .entries
            .partition_point(|e| e.logical_line < logical_line))
    }

    /// The text of a visual line, delimiter included on the last segment of
    /// each logical line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] for a bad index.
    pub fn visual_text(&self, index: usize, store: &TextStore) -> Result<String> {
        if self.width == 0 {
            return store.line_full(index);
        }
        let entry = self.entry(index)?;
        store.text_range(entry.start, entry.len)
    }

    fn entry(&self, index: usize) -> Result<WrapEntry> {
        self.entries
            .get(index)
            .copied()
            .ok_or(Error::OutOfRange {
                index,
                max: self.entries.len().saturating_sub(1),
            })
    }

    fn wrap_logical_line_into(
        &mut self,
        line: usize,
        store: &TextStore,
        styles: &StyleRangeTable,
        measurer: &dyn TextMeasurer,
    ) -> Result<()> {
        let mut fresh = Vec::new();
        wrap_one_line(self.width, line, store, styles, measurer, &mut fresh)?;
        self.entries.extend(fresh);
        Ok(())
    }
}

/// Wrap one logical line, appending its visual segments to `out`.
fn wrap_one_line(
    width: u32,
    line: usize,
    store: &TextStore,
    styles: &StyleRangeTable,
    measurer: &dyn TextMeasurer,
    out: &mut Vec<WrapEntry>,
) -> Result<()> {
    let line_start = store.offset_at_line(line)?;
    let text = store.line(line)?;
    let text_len = text.chars().count();
    let full_len = store.line_length(line)?;

    let bold_ranges: Vec<(usize, usize)> = styles
        .bold_ranges(line_start, text_len)
        .iter()
        .map(|&(s, e)| (s - line_start, e - line_start))
        .collect();

    let breaks = measurer.break_offsets(&text, width, &bold_ranges);
    for (i, &break_offset) in breaks.iter().enumerate() {
        // The final segment picks up the line delimiter.
        let end = breaks.get(i + 1).copied().unwrap_or(full_len);
        out.push(WrapEntry {
            start: line_start + break_offset,
            len: end - break_offset,
            logical_line: line,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::ColumnMeasurer;

    fn fixture(text: &str, width: u32) -> (TextStore, StyleRangeTable, LineWrapper, ColumnMeasurer) {
        let store = TextStore::with_text(text);
        let styles = StyleRangeTable::new();
        let measurer = ColumnMeasurer::new().with_cell_width(1);
        let mut wrapper = LineWrapper::new();
        wrapper.wrap(width, &store, &styles, &measurer).unwrap();
        (store, styles, wrapper, measurer)
    }

    fn all_visual_text(wrapper: &LineWrapper, store: &TextStore) -> String {
        (0..wrapper.visual_line_count(store))
            .map(|i| wrapper.visual_text(i, store).unwrap())
            .collect()
    }

    #[test]
    fn test_wrap_coverage() {
        let (store, _, wrapper, _) = fixture("hello world wide web\nshort", 7);
        assert_eq!(all_visual_text(&wrapper, &store), store.text());
        assert!(wrapper.visual_line_count(&store) > 2);
    }

    #[test]
    fn test_empty_line_one_visual() {
        let (store, _, wrapper, _) = fixture("a\n\nb", 10);
        assert_eq!(wrapper.visual_line_count(&store), 3);
        let middle = wrapper.visual_line(1, &store).unwrap();
        assert_eq!(middle.logical_line, 1);
        assert_eq!(middle.length, 1); // only the delimiter
    }

    #[test]
    fn test_deferred_width_identity() {
        let (store, _, wrapper, _) = fixture("one two three four\nnext", 0);
        assert!(wrapper.is_deferred());
        assert_eq!(wrapper.visual_line_count(&store), 2);
        let first = wrapper.visual_line(0, &store).unwrap();
        assert_eq!(first.length, 19);
        assert_eq!(wrapper.visual_line_at_offset(5, &store).unwrap(), 0);
        assert_eq!(wrapper.offset_at_visual_line(1, &store).unwrap(), 19);
    }

    #[test]
    fn test_visual_line_at_offset_partition() {
        let (store, _, wrapper, _) = fixture("aaaa bbbb cccc", 5);
        for offset in 0..=store.char_count() {
            let v = wrapper.visual_line_at_offset(offset, &store).unwrap();
            let start = wrapper.offset_at_visual_line(v, &store).unwrap();
            let line = wrapper.visual_line(v, &store).unwrap();
            assert!(start <= offset);
            assert!(offset <= start + line.length);
        }
        assert!(
            wrapper
                .visual_line_at_offset(store.char_count() + 1, &store)
                .is_err()
        );
    }

    #[test]
    fn test_incremental_matches_full_rewrap() {
        let edits: &[(usize, usize, &str)] = &[
            (0, 0, "prefix "),
            (10, 3, ""),
            (5, 0, "\nnew line\n"),
            (0, 6, "crlf\r\n"),
            (12, 4, "x"),
        ];
        let (mut store, styles, mut wrapper, measurer) =
            fixture("hello world wide web\nshort tail\nlast", 7);

        for &(start, len, text) in edits {
            let change = store.replace_text_range(start, len, text).unwrap();
            wrapper
                .text_changed(&change, &store, &styles, &measurer)
                .unwrap();

            let mut full = LineWrapper::new();
            full.wrap(7, &store, &styles, &measurer).unwrap();
            assert_eq!(
                wrapper.visual_line_count(&store),
                full.visual_line_count(&store),
                "after edit {start},{len},{text:?}"
            );
            for i in 0..full.visual_line_count(&store) {
                assert_eq!(
                    wrapper.visual_line(i, &store).unwrap(),
                    full.visual_line(i, &store).unwrap(),
                    "visual line {i} after edit {start},{len},{text:?}"
                );
            }
        }
    }

    #[test]
    fn test_rewrap_lines_after_style_change() {
        let store = TextStore::with_text("bold text here");
        let mut styles = StyleRangeTable::new();
        let measurer = ColumnMeasurer::new().with_cell_width(1).with_bold_extra(1);
        let mut wrapper = LineWrapper::new();
        wrapper.wrap(6, &store, &styles, &measurer).unwrap();
        let before = wrapper.visual_line_count(&store);

        // Bold the first word: each character now costs 2, forcing an
        // earlier break.
        styles.set_style(crate::style::StyleRange::new(0, 4).with_bold());
        wrapper
            .rewrap_lines(0, 0, &store, &styles, &measurer)
            .unwrap();
        assert!(wrapper.visual_line_count(&store) > before);
        assert_eq!(all_visual_text(&wrapper, &store), store.text());
    }
}
