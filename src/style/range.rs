//! Style range value type.

use crate::color::Rgba;
use crate::style::TextAttributes;

/// A style annotation over a contiguous span of logical offsets.
///
/// `StyleRange` is a plain value: position (`start`/`length`) plus the
/// attributes applied there. `None` for a color means the widget default.
/// A range whose attributes are all defaults is "unstyled" and represents
/// the absence of style; the table never stores one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StyleRange {
    /// Logical start offset.
    pub start: usize,
    /// Length in characters.
    pub length: usize,
    /// Foreground color (`None` = widget default).
    pub fg: Option<Rgba>,
    /// Background color (`None` = widget default).
    pub bg: Option<Rgba>,
    /// Rendering attributes.
    pub attributes: TextAttributes,
}

impl StyleRange {
    /// Create an unstyled range covering `start..start + length`.
    #[must_use]
    pub fn new(start: usize, length: usize) -> Self {
        Self {
            start,
            length,
            ..Self::default()
        }
    }

    /// Return this range with the given foreground color.
    #[must_use]
    pub fn with_fg(mut self, color: Rgba) -> Self {
        self.fg = Some(color);
        self
    }

    /// Return this range with the given background color.
    #[must_use]
    pub fn with_bg(mut self, color: Rgba) -> Self {
        self.bg = Some(color);
        self
    }

    /// Return this range with the given attributes added.
    #[must_use]
    pub fn with_attributes(mut self, attrs: TextAttributes) -> Self {
        self.attributes |= attrs;
        self
    }

    /// Return this range with the bold attribute added.
    #[must_use]
    pub fn with_bold(self) -> Self {
        self.with_attributes(TextAttributes::BOLD)
    }

    /// Return this range with the underline attribute added.
    #[must_use]
    pub fn with_underline(self) -> Self {
        self.with_attributes(TextAttributes::UNDERLINE)
    }

    /// Return this range with the strikeout attribute added.
    #[must_use]
    pub fn with_strikeout(self) -> Self {
        self.with_attributes(TextAttributes::STRIKEOUT)
    }

    /// One past the last offset covered.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// Whether all attributes are defaults. Setting an unstyled range is
    /// treated as a clear, not a set.
    #[must_use]
    pub fn is_unstyled(&self) -> bool {
        self.fg.is_none() && self.bg.is_none() && self.attributes.is_empty()
    }

    /// Whether this range carries the bold weight used to split shaping
    /// requests in the bidi engine.
    #[must_use]
    pub fn is_bold(&self) -> bool {
        self.attributes.contains(TextAttributes::BOLD)
    }

    /// Whether `other` carries identical attributes (position ignored).
    #[must_use]
    pub fn same_attributes(&self, other: &Self) -> bool {
        self.fg == other.fg && self.bg == other.bg && self.attributes == other.attributes
    }

    /// Whether this range covers `offset`.
    #[must_use]
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end()
    }

    /// Whether this range overlaps `start..start + length`.
    #[must_use]
    pub fn overlaps(&self, start: usize, length: usize) -> bool {
        self.start < start + length && start < self.end()
    }
}
