//! Color values for style annotations.
//!
//! Styles reference colors by value. `None` in a [`StyleRange`](crate::StyleRange)
//! means "inherit the widget default" rather than a specific color, so this
//! module only needs a compact RGBA value type; blending and color-space
//! conversion are rendering concerns that live outside the core.

use crate::error::{Error, Result};

/// An 8-bit-per-channel RGBA color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    pub const BLUE: Self = Self::rgb(0, 0, 255);

    /// Create a fully opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create a color with an explicit alpha channel.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a `#RRGGBB` or `#RRGGBBAA` hex string (leading `#` optional).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for malformed input.
    pub fn from_hex(s: &str) -> Result<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if !hex.is_ascii() {
            return Err(Error::InvalidArgument(format!("malformed hex color: {s}")));
        }
        let parse = |range: std::ops::Range<usize>| -> Result<u8> {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| Error::InvalidArgument(format!("malformed hex color: {s}")))
        };
        match hex.len() {
            6 => Ok(Self::rgb(parse(0..2)?, parse(2..4)?, parse(4..6)?)),
            8 => Ok(Self::rgba(
                parse(0..2)?,
                parse(2..4)?,
                parse(4..6)?,
                parse(6..8)?,
            )),
            _ => Err(Error::InvalidArgument(format!(
                "malformed hex color: {s}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Rgba::from_hex("#ff0000"), Ok(Rgba::RED));
        assert_eq!(Rgba::from_hex("00ff00"), Ok(Rgba::GREEN));
        assert_eq!(Rgba::from_hex("#00000080"), Ok(Rgba::rgba(0, 0, 0, 0x80)));
    }

    #[test]
    fn test_from_hex_malformed() {
        assert!(Rgba::from_hex("#f00").is_err());
        assert!(Rgba::from_hex("not-a-color").is_err());
        assert!(Rgba::from_hex("#gggggg").is_err());
    }
}
