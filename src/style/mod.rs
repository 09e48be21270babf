//! Style annotations over buffer offsets.
//!
//! A [`StyleRange`] describes the visual attributes of a contiguous span of
//! logical offsets. The [`StyleRangeTable`] keeps ranges sorted,
//! non-overlapping, and maximally merged under arbitrary sequences of
//! set/clear calls and buffer edits.

mod range;
mod table;

pub use range::StyleRange;
pub use table::StyleRangeTable;

use bitflags::bitflags;

bitflags! {
    /// Text rendering attributes carried by a [`StyleRange`].
    ///
    /// Attributes combine with bitwise OR. Font weight for shaping is
    /// derived from `BOLD`.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct TextAttributes: u32 {
        /// Bold/increased weight.
        const BOLD      = 0x01;
        /// Underlined text.
        const UNDERLINE = 0x02;
        /// Struck-through text.
        const STRIKEOUT = 0x04;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_combine() {
        let attrs = TextAttributes::BOLD | TextAttributes::UNDERLINE;
        assert!(attrs.contains(TextAttributes::BOLD));
        assert!(attrs.contains(TextAttributes::UNDERLINE));
        assert!(!attrs.contains(TextAttributes::STRIKEOUT));
    }
}
