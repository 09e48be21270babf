//! Mutable character storage with line indexing.
//!
//! The [`GapBuffer`] holds the characters; the [`LineIndex`] keeps a
//! binary-searchable table of line starts over the same physical layout; the
//! [`TextStore`] owns both, guarantees they are mutated together atomically
//! per replace, and notifies listeners after each change.
//!
//! Physical (gap-inclusive) offsets never leave this module: every public
//! API speaks logical character offsets.

mod gap;
mod lines;
mod store;

pub use gap::GapBuffer;
pub use lines::LineIndex;
pub use store::{ChangeKind, ListenerId, TextChange, TextStore};
