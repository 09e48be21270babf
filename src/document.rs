//! The assembled document: content, styles, wrapping, and bidi layout.
//!
//! [`StyledDocument`] wires the components together and enforces the
//! invalidation order an edit must follow: buffer, then line index (both
//! inside [`TextStore`]), then style ranges, then the visual wrap, then the
//! per-line bidi cache, and only then the external listeners. Each stage's
//! invalidation range depends on the previous stage's updated offsets, so
//! the order is not negotiable.
//!
//! Everything here is single-threaded and synchronous: a call mutates,
//! derives, and returns. Layout is computed lazily per line and cached until
//! an edit or style change invalidates it.

use crate::bidi::{BidiLine, BidiOptions, CaretDirection};
use crate::content::{ListenerId, TextChange, TextStore};
use crate::error::{Error, Result};
use crate::measure::TextMeasurer;
use crate::style::{StyleRange, StyleRangeTable};
use crate::wrap::{LineWrapper, VisualLine};
use std::collections::BTreeMap;

/// A styled, wrapped, bidi-capable text document.
pub struct StyledDocument {
    store: TextStore,
    styles: StyleRangeTable,
    wrapper: LineWrapper,
    /// Bidi layouts keyed by logical line; one entry per visual sub-line.
    bidi_cache: BTreeMap<usize, Vec<BidiLine>>,
    measurer: Box<dyn TextMeasurer>,
    tab_width: u32,
}

impl std::fmt::Debug for StyledDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyledDocument")
            .field("char_count", &self.store.char_count())
            .field("line_count", &self.store.line_count())
            .field("style_ranges", &self.styles.len())
            .field("wrap_width", &self.wrapper.width())
            .field("cached_layouts", &self.bidi_cache.len())
            .finish()
    }
}

impl StyledDocument {
    /// Create an empty document measured by `measurer`.
    #[must_use]
    pub fn new(measurer: Box<dyn TextMeasurer>) -> Self {
        Self {
            store: TextStore::new(),
            styles: StyleRangeTable::new(),
            wrapper: LineWrapper::new(),
            bidi_cache: BTreeMap::new(),
            measurer,
            tab_width: 64,
        }
    }

    /// Create a document holding `text`.
    #[must_use]
    pub fn with_text(text: &str, measurer: Box<dyn TextMeasurer>) -> Self {
        let mut document = Self::new(measurer);
        document.store = TextStore::with_text(text);
        document
    }

    // --- content contract -------------------------------------------------

    /// Number of characters.
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.store.char_count()
    }

    /// Number of logical lines, always at least 1.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.store.line_count()
    }

    /// A line's text without its delimiter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] for a bad index.
    pub fn line(&self, index: usize) -> Result<String> {
        self.store.line(index)
    }

    /// The line containing a logical offset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] past the end.
    pub fn line_at_offset(&self, offset: usize) -> Result<usize> {
        self.store.line_at_offset(offset)
    }

    /// The logical start offset of a line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] for a bad index.
    pub fn offset_at_line(&self, index: usize) -> Result<usize> {
        self.store.offset_at_line(index)
    }

    /// The text in `start..start + length`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] when the span exceeds the content.
    pub fn text_range(&self, start: usize, length: usize) -> Result<String> {
        self.store.text_range(start, length)
    }

    /// The whole text.
    #[must_use]
    pub fn text(&self) -> String {
        self.store.text()
    }

    /// The underlying content store.
    #[must_use]
    pub fn store(&self) -> &TextStore {
        &self.store
    }

    /// Subscribe to change notifications; they fire after the whole edit
    /// pipeline has run.
    pub fn add_text_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&TextChange) + 'static,
    {
        self.store.add_text_listener(listener)
    }

    /// Unsubscribe a listener.
    pub fn remove_text_listener(&mut self, id: ListenerId) -> bool {
        self.store.remove_text_listener(id)
    }

    // --- edits ------------------------------------------------------------

    /// Replace `replace_length` characters at `start` with `new_text`,
    /// updating every derived structure and then notifying listeners.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] when the replaced span exceeds the
    /// content; nothing changes in that case.
    pub fn replace(
        &mut self,
        start: usize,
        replace_length: usize,
        new_text: &str,
    ) -> Result<TextChange> {
        // Buffer and line index mutate atomically inside the store.
        let change = self.store.apply_replace(start, replace_length, new_text)?;

        // Style ranges see the edit as a delete followed by an insert.
        if change.replaced_char_count > 0 {
            self.styles
                .shift(change.start, -(change.replaced_char_count as isize));
        }
        if change.new_char_count > 0 {
            self.styles.shift(change.start, change.new_char_count as isize);
        }

        self.wrapper
            .text_changed(&change, &self.store, &self.styles, self.measurer.as_ref())?;
        self.invalidate_after_change(&change)?;

        self.store.notify(&change);
        Ok(change)
    }

    /// Reset the whole document text. Styles are discarded, the wrap and
    /// layout caches rebuilt.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolated`] if the rebuild fails.
    pub fn set_text(&mut self, text: &str) -> Result<TextChange> {
        let change = self.store.apply_set_text(text);
        self.styles = StyleRangeTable::new();
        self.wrapper
            .text_changed(&change, &self.store, &self.styles, self.measurer.as_ref())?;
        self.bidi_cache.clear();
        self.store.notify(&change);
        Ok(change)
    }

    // --- styles -----------------------------------------------------------

    /// Apply a style range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] when the range exceeds the content.
    pub fn set_style(&mut self, range: StyleRange) -> Result<()> {
        if range.end() > self.store.char_count() {
            return Err(Error::OutOfRange {
                index: range.end(),
                max: self.store.char_count(),
            });
        }
        if range.length == 0 {
            return Ok(());
        }
        self.styles.set_style(range);
        self.styled_region_changed(range.start, range.length)
    }

    /// Clear styling from a span.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] when the span exceeds the content.
    pub fn clear_style(&mut self, start: usize, length: usize) -> Result<()> {
        if start + length > self.store.char_count() {
            return Err(Error::OutOfRange {
                index: start + length,
                max: self.store.char_count(),
            });
        }
        if length == 0 {
            return Ok(());
        }
        self.styles.clear_style(start, length);
        self.styled_region_changed(start, length)
    }

    /// The styles overlapping a span, ordered and non-overlapping.
    #[must_use]
    pub fn styles_in_range(&self, start: usize, length: usize) -> Vec<StyleRange> {
        self.styles.styles_in_range(start, length)
    }

    /// The style at an offset, if any.
    #[must_use]
    pub fn style_at(&self, offset: usize) -> Option<&StyleRange> {
        self.styles.style_at(offset)
    }

    /// The style table itself.
    #[must_use]
    pub fn styles(&self) -> &StyleRangeTable {
        &self.styles
    }

    // --- wrapping ---------------------------------------------------------

    /// Set the wrap width in pixels and rebuild the visual lines. Width 0
    /// defers wrapping until the widget is realized.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolated`] if the rebuild fails.
    pub fn set_wrap_width(&mut self, width: u32) -> Result<()> {
        self.wrapper
            .wrap(width, &self.store, &self.styles, self.measurer.as_ref())?;
        self.bidi_cache.clear();
        Ok(())
    }

    /// Number of visual lines.
    #[must_use]
    pub fn visual_line_count(&self) -> usize {
        self.wrapper.visual_line_count(&self.store)
    }

    /// The visual line at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] for a bad index.
    pub fn visual_line(&self, index: usize) -> Result<VisualLine> {
        self.wrapper.visual_line(index, &self.store)
    }

    /// The visual line containing a logical offset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] past the end.
    pub fn visual_line_at_offset(&self, offset: usize) -> Result<usize> {
        self.wrapper.visual_line_at_offset(offset, &self.store)
    }

    /// The absolute start offset of a visual line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] for a bad index.
    pub fn offset_at_visual_line(&self, index: usize) -> Result<usize> {
        self.wrapper.offset_at_visual_line(index, &self.store)
    }

    // --- layout -----------------------------------------------------------

    /// Tab stop distance in pixels.
    pub fn set_tab_width(&mut self, tab_width: u32) {
        self.tab_width = tab_width;
        self.bidi_cache.clear();
    }

    /// The bidi layout of a visual line, computed on demand and cached until
    /// invalidated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] for a bad index.
    pub fn visual_line_layout(&mut self, index: usize) -> Result<&BidiLine> {
        let visual = self.wrapper.visual_line(index, &self.store)?;
        let logical = visual.logical_line;
        let sub = index - self.wrapper.first_visual_of_line(logical, &self.store)?;

        if !self.bidi_cache.contains_key(&logical) {
            let layouts = self.layout_line(logical)?;
            self.bidi_cache.insert(logical, layouts);
        }
        let layouts = self
            .bidi_cache
            .get(&logical)
            .expect("layout inserted above");
        layouts
            .get(sub)
            .ok_or(Error::InvariantViolated("bidi cache out of step with wrap"))
    }

    /// Caret x for a logical offset, resolved through wrapping and bidi
    /// reordering. Returns the visual line index and the x position on it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] past the end of the content.
    pub fn caret_position(
        &mut self,
        offset: usize,
        direction: CaretDirection,
    ) -> Result<(usize, u32)> {
        let visual = self.wrapper.visual_line_at_offset(offset, &self.store)?;
        let line_start = self.wrapper.offset_at_visual_line(visual, &self.store)?;
        let within = offset - line_start;
        let layout = self.visual_line_layout(visual)?;
        Ok((visual, layout.caret_x(within, direction)))
    }

    /// Drop cached layout for a range of logical lines. The edit pipeline
    /// calls this itself; embedders only need it when an external factor
    /// (font change, shaping setting) invalidates measurements.
    pub fn invalidate_layout(&mut self, first_line: usize, last_line: usize) {
        let keys: Vec<usize> = self
            .bidi_cache
            .range(first_line..=last_line)
            .map(|(&k, _)| k)
            .collect();
        for key in keys {
            self.bidi_cache.remove(&key);
        }
    }

    // --- internals --------------------------------------------------------

    /// Compute the bidi layouts for every visual sub-line of a logical line.
    fn layout_line(&self, logical: usize) -> Result<Vec<BidiLine>> {
        let line_start = self.store.offset_at_line(logical)?;
        let first_visual = self.wrapper.first_visual_of_line(logical, &self.store)?;
        let mut layouts = Vec::new();
        let mut index = first_visual;
        loop {
            let Ok(visual) = self.wrapper.visual_line(index, &self.store) else {
                break;
            };
            if visual.logical_line != logical {
                break;
            }
            let absolute_start = line_start + visual.start_in_line;
            let mut text = self.store.text_range(absolute_start, visual.length)?;
            while text.ends_with(['\n', '\r']) {
                text.pop();
            }
            let text_len = text.chars().count();
            let bold_ranges: Vec<(usize, usize)> = self
                .styles
                .bold_ranges(absolute_start, text_len)
                .iter()
                .map(|&(s, e)| (s - absolute_start, e - absolute_start))
                .collect();
            let options = BidiOptions {
                tab_width: self.tab_width,
                bold_ranges,
                segments: None,
            };
            layouts.push(BidiLine::new(&text, &options, self.measurer.as_ref())?);
            index += 1;
        }
        Ok(layouts)
    }

    /// Invalidate wrap and layout after a style change to a span.
    fn styled_region_changed(&mut self, start: usize, length: usize) -> Result<()> {
        let first = self.store.line_at_offset(start)?;
        let last = self.store.line_at_offset(start + length)?;
        self.wrapper.rewrap_lines(
            first,
            last,
            &self.store,
            &self.styles,
            self.measurer.as_ref(),
        )?;
        self.invalidate_layout(first, last);
        Ok(())
    }

    /// Invalidate the layout cache after a text change. Lines at and after
    /// the first affected line are dropped wholesale when the line structure
    /// shifted; otherwise only the touched lines go.
    fn invalidate_after_change(&mut self, change: &TextChange) -> Result<()> {
        let first = self.store.line_at_offset(change.start)?.saturating_sub(1);
        if change.replaced_line_count == change.new_line_count {
            self.invalidate_layout(first, first + change.new_line_count + 1);
        } else {
            self.bidi_cache.split_off(&first);
        }
        Ok(())
    }
}
