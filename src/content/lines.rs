//! Line start/length table over the gap buffer.

use crate::content::GapBuffer;
use crate::error::{Error, Result};

/// One line of text: start position and length in *physical* offsets, length
/// including the trailing delimiter. The line holding the gap also counts
/// the gap in its length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Line {
    pub start: usize,
    pub len: usize,
}

impl Line {
    fn end(self) -> usize {
        self.start + self.len
    }
}

/// Table of `(start, length)` pairs describing the logical lines of a
/// [`GapBuffer`].
///
/// Invariants: the lines partition the physical buffer exactly (no holes, no
/// overlaps); line 0 starts at physical position 0; there is always at least
/// one line, even for empty text; exactly one line straddles or abuts the
/// gap at any time. `\n`, `\r`, and `\r\n` each count as one delimiter, and
/// a `\r` followed logically by `\n` is one delimiter even while the gap
/// sits between the two characters.
///
/// The table is updated incrementally: an edit re-scans only the lines it
/// touched and shifts the rest.
#[derive(Clone, Debug)]
pub struct LineIndex {
    lines: Vec<Line>,
    /// Line containing the gap while one exists; stale otherwise.
    gap_line: usize,
}

impl Default for LineIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl LineIndex {
    /// Create a table describing an empty buffer: one empty line.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: vec![Line { start: 0, len: 0 }],
            gap_line: 0,
        }
    }

    /// Number of lines. Always at least 1.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Rebuild the whole table from the buffer.
    pub fn index_all(&mut self, buffer: &GapBuffer) {
        let (mut entries, tail_start) = scan_span(buffer, 0, buffer.physical_len());
        entries.push(Line {
            start: tail_start,
            len: buffer.physical_len() - tail_start,
        });
        self.lines = entries;
        self.update_gap_line(buffer);
    }

    /// The line containing a logical offset.
    ///
    /// An offset equal to [`GapBuffer::char_count`] is valid and answers the
    /// last line, so callers can ask about the insertion point past the end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] when `offset > char_count`.
    pub fn line_at_offset(&self, buffer: &GapBuffer, offset: usize) -> Result<usize> {
        let count = buffer.char_count();
        if offset > count {
            return Err(Error::OutOfRange {
                index: offset,
                max: count,
            });
        }
        let position = buffer.logical_to_physical(offset);
        // One past the last character is addressable for insertion.
        let last = self.lines[self.lines.len() - 1];
        if position == last.end() {
            return Ok(self.lines.len() - 1);
        }
        Ok(self.line_at_physical(position))
    }

    /// The line containing a physical position: binary search over the
    /// physical table, so the gap line's slack is naturally accounted for.
    pub(crate) fn line_at_physical(&self, position: usize) -> usize {
        let mut high = self.lines.len() as isize;
        let mut low: isize = -1;
        while high - low > 1 {
            let index = usize::try_from((high + low) / 2).unwrap_or(0);
            let line = self.lines[index];
            if position <= line.start {
                high = index as isize;
            } else if position < line.end() {
                high = index as isize;
                break;
            } else {
                low = index as isize;
            }
        }
        usize::try_from(high).unwrap_or(0)
    }

    /// The logical start offset of a line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] for a bad line index.
    pub fn offset_at_line(&self, buffer: &GapBuffer, index: usize) -> Result<usize> {
        if index == 0 {
            return Ok(0);
        }
        if index >= self.lines.len() {
            return Err(Error::OutOfRange {
                index,
                max: self.lines.len() - 1,
            });
        }
        let start = self.lines[index].start;
        if buffer.gap_exists() && start >= buffer.gap_end() {
            Ok(start - buffer.gap_len())
        } else {
            Ok(start)
        }
    }

    /// The text of a line without its trailing delimiter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] for a bad line index.
    pub fn line_text(&self, buffer: &GapBuffer, index: usize) -> Result<String> {
        let mut text = self.line_text_full(buffer, index)?;
        while text.ends_with(['\n', '\r']) {
            text.pop();
        }
        Ok(text)
    }

    /// The text of a line including its trailing delimiter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] for a bad line index.
    pub fn line_text_full(&self, buffer: &GapBuffer, index: usize) -> Result<String> {
        if index >= self.lines.len() {
            return Err(Error::OutOfRange {
                index,
                max: self.lines.len() - 1,
            });
        }
        let line = self.lines[index];
        let mut text = String::with_capacity(line.len);
        for position in line.start..line.end() {
            if !buffer.is_gap(position) {
                text.push(buffer.physical_char(position));
            }
        }
        Ok(text)
    }

    /// Logical length of a line, delimiter included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] for a bad line index.
    pub fn line_length(&self, buffer: &GapBuffer, index: usize) -> Result<usize> {
        if index >= self.lines.len() {
            return Err(Error::OutOfRange {
                index,
                max: self.lines.len() - 1,
            });
        }
        let line = self.lines[index];
        Ok(buffer.content_len(line.start, line.len))
    }

    /// Account for a gap that is about to disappear: shrink the gap line and
    /// pull trailing line starts back.
    pub(crate) fn remove_gap(&mut self, gap_len: usize) {
        self.lines[self.gap_line].len -= gap_len;
        for line in &mut self.lines[self.gap_line + 1..] {
            line.start -= gap_len;
        }
    }

    /// Account for a gap that has just been placed inside `line`: grow that
    /// line and push trailing line starts out.
    pub(crate) fn add_gap(&mut self, line: usize, gap_len: usize) {
        self.lines[line].len += gap_len;
        for line in &mut self.lines[line + 1..] {
            line.start += gap_len;
        }
        self.gap_line = line;
    }

    /// Re-locate the gap line after the table has been rebuilt around an
    /// edit.
    pub(crate) fn update_gap_line(&mut self, buffer: &GapBuffer) {
        if buffer.gap_exists() {
            self.gap_line = self.line_at_physical(buffer.gap_start());
        }
    }

    /// Re-scan the physical span covered by lines `first..=last` and splice
    /// the fresh line structure into the table. Lines outside the window are
    /// untouched; the caller is responsible for having already accounted for
    /// any gap movement via [`add_gap`](Self::add_gap)/[`remove_gap`](Self::remove_gap).
    pub(crate) fn reindex_window(&mut self, buffer: &GapBuffer, first: usize, last: usize) {
        let span_start = self.lines[first].start;
        let span_end = self.lines[last].end();
        let (mut entries, tail_start) = scan_span(buffer, span_start, span_end);

        let tail = Line {
            start: tail_start,
            len: span_end - tail_start,
        };
        let at_doc_end = last == self.lines.len() - 1;
        if buffer.content_len(tail.start, tail.len) > 0 || at_doc_end {
            // Content after the last delimiter, or the document's trailing
            // empty line (which also absorbs any gap slack at the very end).
            entries.push(tail);
        } else if tail.len > 0 {
            // Gap slack after the window's final delimiter: it belongs to
            // the line that delimiter closed.
            match entries.last_mut() {
                Some(entry) => entry.len = span_end - entry.start,
                None => entries.push(tail),
            }
        }

        self.lines.splice(first..=last, entries);
    }
}

/// Scan a physical span for line delimiters, skipping gap positions.
///
/// Returns the delimiter-terminated lines found plus the start of the
/// unterminated tail piece. Entry lengths are physical and include any gap
/// positions passed over. A `\r` whose next content character is `\n` (the
/// gap may sit between them) consumes both as one delimiter.
fn scan_span(buffer: &GapBuffer, span_start: usize, span_end: usize) -> (Vec<Line>, usize) {
    let mut entries = Vec::new();
    let mut start = span_start;
    let mut i = span_start;
    while i < span_end {
        if buffer.is_gap(i) {
            i += 1;
            continue;
        }
        let ch = buffer.physical_char(i);
        if ch == '\r' {
            let mut j = i + 1;
            while j < span_end && buffer.is_gap(j) {
                j += 1;
            }
            if j < span_end && buffer.physical_char(j) == '\n' {
                i = j;
            }
        } else if ch != '\n' {
            i += 1;
            continue;
        }
        entries.push(Line {
            start,
            len: i + 1 - start,
        });
        start = i + 1;
        i += 1;
    }
    (entries, start)
}
