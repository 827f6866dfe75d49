//! Foundation elements for emoji-aware text fields.

pub mod text;
