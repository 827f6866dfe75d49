//! Editable text with typed rich-text markers.
//!
//! # Core Types
//!
//! - [`SpanRange`] - Half-open byte range a marker is attached over
//! - [`SpanKind`] / [`Span`] - Typed marker kinds, no downcasting
//! - [`EmojiSpan`] - Marker for a run of text rendered as an emoji glyph
//! - [`SpanSet`] - The marker collection attached to one buffer
//! - [`EmojiFieldState`] - Observable state holder for the editable field
//!
//! # Example
//!
//! ```text
//! let field = EmojiFieldState::new("😀 hi");
//! field.edit(|editor| {
//!     editor.attach(EmojiSpan::new("😀"), SpanRange::new(0, 4));
//! });
//! assert_eq!(field.emoji_spans().len(), 1);
//! ```

mod field;
mod range;
mod span;

pub use field::{EmojiFieldState, FieldEditor, ListenerId};
pub use range::SpanRange;
pub use span::{EmojiSpan, GlyphId, LinkSpan, Span, SpanKind, SpanSet};
