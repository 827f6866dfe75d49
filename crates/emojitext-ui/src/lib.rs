//! UI adapters for emoji-aware text fields.

mod watcher;

pub use watcher::{has_emoji_spans, refresh_emoji_spans, EmojiFieldWatcher};
