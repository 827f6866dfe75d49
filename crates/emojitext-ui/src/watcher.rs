//! Keeps emoji markers in a text field fresh across asset reloads.
//!
//! An [`EmojiFieldWatcher`] bridges one field and the process-wide
//! [`EmojiAssets`] registry. It stays subscribed to the registry only
//! while the field actually contains emoji markers, so fields without
//! emoji cost nothing on asset reloads.

use emojitext_assets::{EmojiAssets, EmojiLoadListener};
use emojitext_foundation::text::{EmojiFieldState, ListenerId, Span, SpanKind};
use std::cell::Cell;
use std::rc::Rc;

/// True iff the field has an emoji marker boundary in `[start, end)`.
///
/// This is a presence check, not a count: the scan stops at the first
/// boundary. Empty text and empty ranges have no markers by definition.
pub fn has_emoji_spans(field: &EmojiFieldState, start: usize, end: usize) -> bool {
    !field.is_empty()
        && end > start
        && field
            .next_span_boundary(SpanKind::Emoji, start)
            .map_or(false, |boundary| boundary < end)
}

/// Detaches and reattaches every emoji marker in `field` at its original
/// offsets, dropping each marker's cached glyph, then requests one redraw.
///
/// With `force == false` this is selective: if no marker is flagged
/// [`needs_refresh`](emojitext_foundation::text::EmojiSpan::needs_refresh),
/// nothing happens. Once any marker is flagged, every marker in the field
/// is re-touched, not only the flagged ones - glyphs resolve against
/// shared asset state, so a partial pass saves nothing.
///
/// Callable without a watcher by any component that needs to force a
/// visual refresh of a field.
pub fn refresh_emoji_spans(field: &EmojiFieldState, force: bool) {
    let spans = field.emoji_spans();
    if !force && !spans.iter().any(|(span, _)| span.needs_refresh()) {
        return;
    }
    let mut touched = false;
    for (span, range) in spans {
        if field.detach_span(&Span::from(span.clone())).is_none() {
            continue;
        }
        span.invalidate_glyph();
        field.reattach_span(span, range);
        touched = true;
    }
    if touched {
        log::trace!("refreshed emoji spans (force: {force})");
        field.request_redraw();
    }
}

struct WatcherInner {
    field: EmojiFieldState,
    assets: EmojiAssets,
    is_registered: Cell<bool>,
    text_listener: Cell<Option<ListenerId>>,
}

impl WatcherInner {
    /// Re-establishes the invariant: registered iff markers are present.
    fn sync_registration(this: &Rc<Self>) {
        let len = this.field.text_len();
        Self::set_registered(this, has_emoji_spans(&this.field, 0, len));
    }

    fn set_registered(this: &Rc<Self>, want: bool) {
        if this.is_registered.get() == want {
            return;
        }
        this.is_registered.set(want);
        let listener: Rc<dyn EmojiLoadListener> = this.clone();
        if want {
            this.assets.add_listener(&listener);
        } else {
            this.assets.remove_listener(&listener);
        }
        log::trace!("emoji watcher registered: {want}");
    }
}

impl EmojiLoadListener for WatcherInner {
    fn on_emoji_part_loaded(&self) {
        refresh_emoji_spans(&self.field, false);
    }

    fn on_emoji_pack_changed(&self) {
        refresh_emoji_spans(&self.field, true);
    }
}

/// Watches one text field and refreshes its emoji markers when glyph
/// assets load or the active pack changes.
///
/// The watcher subscribes to the asset registry only while the field
/// contains at least one emoji marker; the subscription is re-evaluated
/// after every completed edit. Dropping the watcher tears it down.
pub struct EmojiFieldWatcher {
    inner: Rc<WatcherInner>,
}

impl EmojiFieldWatcher {
    /// Binds a watcher to `field`, reporting asset reloads from `assets`.
    ///
    /// The initial marker scan happens here, so a field that already
    /// contains emoji is subscribed before the first edit.
    pub fn attach(field: &EmojiFieldState, assets: &EmojiAssets) -> Self {
        let inner = Rc::new(WatcherInner {
            field: field.clone(),
            assets: assets.clone(),
            is_registered: Cell::new(false),
            text_listener: Cell::new(None),
        });
        WatcherInner::sync_registration(&inner);

        // The field outlives the watcher in the host tree, so the edit
        // listener holds only a weak back-reference.
        let weak = Rc::downgrade(&inner);
        let id = field.add_change_listener(move || {
            if let Some(inner) = weak.upgrade() {
                WatcherInner::sync_registration(&inner);
            }
        });
        inner.text_listener.set(Some(id));

        Self { inner }
    }

    /// True while the watcher is subscribed to the asset registry.
    pub fn is_registered(&self) -> bool {
        self.inner.is_registered.get()
    }

    /// Stops watching: removes the edit listener and unsubscribes from
    /// the asset registry regardless of marker presence.
    pub fn teardown(&self) {
        if let Some(id) = self.inner.text_listener.take() {
            self.inner.field.remove_change_listener(id);
        }
        WatcherInner::set_registered(&self.inner, false);
    }
}

impl Drop for EmojiFieldWatcher {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for EmojiFieldWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmojiFieldWatcher")
            .field("is_registered", &self.inner.is_registered.get())
            .finish()
    }
}
