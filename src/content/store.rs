//! The composed text content: gap buffer plus line index plus change
//! notification.

use crate::content::{GapBuffer, LineIndex};
use crate::error::Result;
use crate::event::{LogLevel, emit_log};
use std::fmt;

/// What kind of change a [`TextChange`] describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    /// A ranged `replace_text_range` edit.
    Replace,
    /// The content was replaced wholesale via `set_text`.
    SetText,
}

/// Structured description of one content change, delivered to listeners
/// after the mutation completes.
///
/// The line counts are expressed as deltas against the line table: an edit
/// that replaced the text of `replaced_line_count + 1` lines left
/// `new_line_count + 1` lines in their place. Replacing `""` with `"\n"`
/// reports `(0, 1)`; replacing `"\n\n"` with `"a"` reports `(2, 0)`.
#[derive(Clone, Debug)]
pub struct TextChange {
    pub kind: ChangeKind,
    /// Logical offset where the change starts.
    pub start: usize,
    /// Number of characters removed.
    pub replaced_char_count: usize,
    /// Number of characters inserted.
    pub new_char_count: usize,
    /// Line-table delta removed at `start`'s line.
    pub replaced_line_count: usize,
    /// Line-table delta inserted at `start`'s line.
    pub new_line_count: usize,
    /// The text that was removed.
    pub replaced_text: String,
}

/// Handle returned by [`TextStore::add_text_listener`].
pub type ListenerId = u64;

type Listener = Box<dyn FnMut(&TextChange)>;

/// Mutable text content with line indexing and change notification.
///
/// `TextStore` owns a [`GapBuffer`] and its [`LineIndex`] and is the only
/// way to mutate them, so the two can never be observed out of step: every
/// `replace_text_range` splices the buffer and re-indexes the affected lines
/// before returning. Listeners are notified strictly after the mutation; a
/// listener that panics leaves the store consistent.
pub struct TextStore {
    buffer: GapBuffer,
    lines: LineIndex,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: ListenerId,
}

impl fmt::Debug for TextStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextStore")
            .field("char_count", &self.char_count())
            .field("line_count", &self.line_count())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for TextStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TextStore {
    /// Create an empty store: no text, one empty line.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: GapBuffer::new(),
            lines: LineIndex::new(),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Create a store holding `text`.
    #[must_use]
    pub fn with_text(text: &str) -> Self {
        let mut store = Self::new();
        store.buffer.set_text(text);
        store.lines.index_all(&store.buffer);
        store
    }

    /// Number of characters stored.
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.buffer.char_count()
    }

    /// Number of lines. Always at least 1.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.line_count()
    }

    /// The character at a logical offset.
    #[must_use]
    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.buffer.char_at(offset)
    }

    /// A line's text without its trailing delimiter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`](crate::Error::OutOfRange) for a bad index.
    pub fn line(&self, index: usize) -> Result<String> {
        self.lines.line_text(&self.buffer, index)
    }

    /// A line's text including its trailing delimiter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`](crate::Error::OutOfRange) for a bad index.
    pub fn line_full(&self, index: usize) -> Result<String> {
        self.lines.line_text_full(&self.buffer, index)
    }

    /// A line's logical length, delimiter included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`](crate::Error::OutOfRange) for a bad index.
    pub fn line_length(&self, index: usize) -> Result<usize> {
        self.lines.line_length(&self.buffer, index)
    }

    /// The line containing a logical offset; `char_count` itself answers the
    /// last line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`](crate::Error::OutOfRange) past the end.
    pub fn line_at_offset(&self, offset: usize) -> Result<usize> {
        self.lines.line_at_offset(&self.buffer, offset)
    }

    /// The logical start offset of a line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`](crate::Error::OutOfRange) for a bad index.
    pub fn offset_at_line(&self, index: usize) -> Result<usize> {
        self.lines.offset_at_line(&self.buffer, index)
    }

    /// The text in `start..start + length`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`](crate::Error::OutOfRange) when the span
    /// exceeds the content.
    pub fn text_range(&self, start: usize, length: usize) -> Result<String> {
        self.buffer.text_range(start, length)
    }

    /// The whole content.
    #[must_use]
    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// The delimiter callers should use when inserting new lines. The
    /// content itself accepts `\n`, `\r`, and `\r\n` interchangeably.
    #[must_use]
    pub fn line_delimiter(&self) -> &'static str {
        if cfg!(windows) { "\r\n" } else { "\n" }
    }

    /// Direct access to the underlying buffer.
    #[must_use]
    pub fn buffer(&self) -> &GapBuffer {
        &self.buffer
    }

    /// Direct access to the line index.
    #[must_use]
    pub fn line_index(&self) -> &LineIndex {
        &self.lines
    }

    /// Register a change listener. Listeners run synchronously after each
    /// mutation, in registration order.
    pub fn add_text_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&TextChange) + 'static,
    {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a previously registered listener. Returns whether it existed.
    pub fn remove_text_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Replace `replace_length` characters at `start` with `new_text`, then
    /// notify listeners.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`](crate::Error::OutOfRange) when the
    /// replaced span exceeds the content; the store is left unchanged.
    pub fn replace_text_range(
        &mut self,
        start: usize,
        replace_length: usize,
        new_text: &str,
    ) -> Result<TextChange> {
        let change = self.apply_replace(start, replace_length, new_text)?;
        self.notify(&change);
        Ok(change)
    }

    /// Perform the splice and re-index of `replace_text_range` without
    /// notifying listeners. Embedders that invalidate derived state (styles,
    /// wrapping, bidi caches) between the mutation and the notification use
    /// this together with [`notify`](Self::notify).
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`](crate::Error::OutOfRange) when the
    /// replaced span exceeds the content; the store is left unchanged.
    pub fn apply_replace(
        &mut self,
        start: usize,
        replace_length: usize,
        new_text: &str,
    ) -> Result<TextChange> {
        // Validate everything before touching the buffer: the whole splice
        // completes or nothing changes.
        let replaced_text = self.buffer.text_range(start, replace_length)?;
        let line_count_before = self.lines.line_count();

        let mut first_line = self.lines.line_at_offset(&self.buffer, start)?;
        if first_line > 0
            && start == self.lines.offset_at_line(&self.buffer, first_line)?
            && self.buffer.char_at(start - 1) == Some('\r')
        {
            // A bare CR ends the previous line; the edit may pair it with an
            // LF arriving at the boundary, so count that line as affected.
            first_line -= 1;
        }
        let last_line = self
            .lines
            .line_at_offset(&self.buffer, start + replace_length)?;
        let old_span = last_line - first_line + 1;

        self.delete(start, replace_length);
        self.insert(start, new_text);

        let line_count_after = self.lines.line_count();
        let new_span = old_span + line_count_after - line_count_before;

        Ok(TextChange {
            kind: ChangeKind::Replace,
            start,
            replaced_char_count: replace_length,
            new_char_count: new_text.chars().count(),
            replaced_line_count: old_span - 1,
            new_line_count: new_span - 1,
            replaced_text,
        })
    }

    /// Dispatch a change to the registered listeners.
    pub fn notify(&mut self, change: &TextChange) {
        for (_, listener) in &mut self.listeners {
            listener(change);
        }
    }

    /// Replace the whole content, dropping the gap, then notify listeners
    /// with a [`ChangeKind::SetText`] change.
    pub fn set_text(&mut self, text: &str) -> TextChange {
        let change = self.apply_set_text(text);
        self.notify(&change);
        change
    }

    /// [`set_text`](Self::set_text) without the notification.
    pub fn apply_set_text(&mut self, text: &str) -> TextChange {
        let replaced_text = self.text();
        let replaced_line_count = self.lines.line_count() - 1;
        self.buffer.set_text(text);
        self.lines.index_all(&self.buffer);
        TextChange {
            kind: ChangeKind::SetText,
            start: 0,
            replaced_char_count: replaced_text.chars().count(),
            new_char_count: text.chars().count(),
            replaced_line_count,
            new_line_count: self.lines.line_count() - 1,
            replaced_text,
        }
    }

    /// Delete `length` characters at `position`. Offsets are pre-validated
    /// by the caller.
    fn delete(&mut self, position: usize, length: usize) {
        if length == 0 {
            return;
        }
        let mut start_line = self
            .lines
            .line_at_offset(&self.buffer, position)
            .expect("validated offset");
        if start_line > 0
            && position
                == self
                    .lines
                    .offset_at_line(&self.buffer, start_line)
                    .expect("validated line")
            && self.buffer.char_at(position - 1) == Some('\r')
        {
            start_line -= 1;
        }
        let end_line = self
            .lines
            .line_at_offset(&self.buffer, position + length)
            .expect("validated offset");

        self.adjust_gap(position + length, -(length as isize), end_line);
        if self.buffer.gap_start() == position + length {
            self.buffer.grow_gap_left(length);
        } else {
            self.buffer.grow_gap_right(length);
        }

        self.lines.reindex_window(&self.buffer, start_line, end_line);
        self.lines.update_gap_line(&self.buffer);
    }

    /// Insert `text` at `position`. Offsets are pre-validated by the caller.
    fn insert(&mut self, position: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        let chars: Vec<char> = text.chars().collect();
        let line = self
            .lines
            .line_at_offset(&self.buffer, position)
            .expect("validated offset");
        let mut first_line = line;
        if first_line > 0
            && position
                == self
                    .lines
                    .offset_at_line(&self.buffer, first_line)
                    .expect("validated line")
            && self.buffer.char_at(position - 1) == Some('\r')
            && chars[0] == '\n'
        {
            first_line -= 1;
        }

        self.adjust_gap(position, chars.len() as isize, line);
        self.buffer.write_into_gap(position, &chars);

        self.lines.reindex_window(&self.buffer, first_line, line);
        self.lines.update_gap_line(&self.buffer);
    }

    /// Put the gap where the next edit needs it, keeping the line table's
    /// physical offsets in step. `attach_line` is the line that will contain
    /// the relocated gap.
    fn adjust_gap(&mut self, position: usize, size_hint: isize, attach_line: usize) {
        if self.buffer.gap_settled(position, size_hint) {
            return;
        }
        if self.buffer.gap_exists() {
            self.lines.remove_gap(self.buffer.gap_len());
        }
        self.buffer.move_and_resize_gap(position, size_hint);
        self.lines.add_gap(attach_line, self.buffer.gap_len());
        emit_log(
            LogLevel::Debug,
            &format!("gap relocated to {position} (size {})", self.buffer.gap_len()),
        );
    }
}
