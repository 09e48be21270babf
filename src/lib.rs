//! `styledtext` - storage and layout core for styled text editors
//!
//! The mutable heart of a styled text widget, without the widget: a gap
//! buffer with incremental line indexing, an overlapping-range style table,
//! a logical-to-visual line wrapper, and a bidirectional text reordering
//! engine. Rendering, input handling, and font shaping stay outside; the
//! core consumes a [`TextMeasurer`] for widths and hands back offsets,
//! runs, and caret positions.
//!
//! # Examples
//!
//! ```
//! use styledtext::{ColumnMeasurer, StyleRange, StyledDocument};
//!
//! let mut doc = StyledDocument::with_text(
//!     "hello world",
//!     Box::new(ColumnMeasurer::new()),
//! );
//! doc.replace(5, 0, ",").unwrap();
//! doc.set_style(StyleRange::new(0, 5).with_bold()).unwrap();
//!
//! assert_eq!(doc.text(), "hello, world");
//! assert!(doc.style_at(2).unwrap().is_bold());
//! ```

// Crate-level lint configuration
#![allow(clippy::cast_possible_truncation)] // Intentional pixel/offset casts
#![allow(clippy::cast_sign_loss)] // Delta arithmetic is range-checked
#![allow(clippy::cast_possible_wrap)] // Offsets fit comfortably in isize
#![allow(clippy::module_name_repetitions)] // StyleRange, StyleRangeTable etc
#![allow(clippy::missing_const_for_fn)] // Many functions could be const, not critical
#![allow(clippy::doc_markdown)] // Allow technical names without backticks
#![allow(clippy::use_self)] // Allow explicit type names in impl blocks
#![allow(clippy::items_after_statements)] // Common pattern in tests
#![allow(clippy::collapsible_if)] // Sometimes nested ifs are clearer

pub mod bidi;
pub mod color;
pub mod content;
pub mod document;
pub mod error;
pub mod event;
pub mod measure;
pub mod style;
pub mod wrap;

// Re-export core types at crate root
pub use bidi::{BidiLine, BidiOptions, CaretDirection, CharClass, DirectionRun};
pub use color::Rgba;
pub use content::{ChangeKind, GapBuffer, LineIndex, ListenerId, TextChange, TextStore};
pub use document::StyledDocument;
pub use error::{Error, Result};
pub use event::{LogLevel, emit_log, set_log_callback};
pub use measure::{ColumnMeasurer, TextMeasurer};
pub use style::{StyleRange, StyleRangeTable, TextAttributes};
pub use wrap::{LineWrapper, VisualLine};
