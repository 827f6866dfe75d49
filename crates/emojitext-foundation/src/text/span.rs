//! Typed span collection for rich-text markers.
//!
//! Spans are cheap `Rc` handles attached to a byte range of the field's
//! text. Identity is handle identity: the same emoji attached twice is two
//! distinct markers. Attachment uses exclusive-exclusive semantics, so an
//! insertion at either edge of a span does not grow it.

use super::SpanRange;
use smallvec::SmallVec;
use std::cell::Cell;
use std::rc::Rc;

/// Opaque handle to a rasterized glyph owned by the rendering layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphId(pub u64);

/// The closed set of marker kinds the collection can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpanKind {
    /// A run of text rendered as an emoji glyph.
    Emoji,
    /// A tappable link.
    Link,
}

struct EmojiSpanInner {
    emoji: String,
    needs_refresh: Cell<bool>,
    glyph: Cell<Option<GlyphId>>,
}

/// Marker denoting a run of text rendered as an emoji glyph.
///
/// The handle is cheap to clone; all clones refer to the same marker. The
/// rendering layer stores the resolved glyph on the span and flips
/// [`needs_refresh`](Self::needs_refresh) when it had to draw a placeholder
/// because the glyph asset was not loaded yet.
#[derive(Clone)]
pub struct EmojiSpan {
    inner: Rc<EmojiSpanInner>,
}

impl EmojiSpan {
    /// Creates a marker for the given emoji string.
    pub fn new(emoji: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(EmojiSpanInner {
                emoji: emoji.into(),
                needs_refresh: Cell::new(false),
                glyph: Cell::new(None),
            }),
        }
    }

    /// The source emoji this marker renders.
    pub fn emoji(&self) -> &str {
        &self.inner.emoji
    }

    /// True if the marker is waiting for its glyph asset.
    pub fn needs_refresh(&self) -> bool {
        self.inner.needs_refresh.get()
    }

    /// Flags the marker as waiting for a glyph asset.
    pub fn mark_needs_refresh(&self) {
        self.inner.needs_refresh.set(true);
    }

    /// The cached resolved glyph, if any.
    pub fn glyph(&self) -> Option<GlyphId> {
        self.inner.glyph.get()
    }

    /// Caches the resolved glyph and clears the refresh flag.
    pub fn set_glyph(&self, glyph: GlyphId) {
        self.inner.glyph.set(Some(glyph));
        self.inner.needs_refresh.set(false);
    }

    /// Drops the cached glyph so the next draw re-resolves it.
    ///
    /// Also clears the refresh flag: the marker is no longer waiting, it
    /// will be resolved against the current asset state on the next draw.
    pub fn invalidate_glyph(&self) {
        self.inner.glyph.set(None);
        self.inner.needs_refresh.set(false);
    }
}

impl PartialEq for EmojiSpan {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for EmojiSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmojiSpan")
            .field("emoji", &self.inner.emoji)
            .field("needs_refresh", &self.inner.needs_refresh.get())
            .finish()
    }
}

struct LinkSpanInner {
    url: String,
}

/// Marker denoting a tappable link.
#[derive(Clone)]
pub struct LinkSpan {
    inner: Rc<LinkSpanInner>,
}

impl LinkSpan {
    /// Creates a marker pointing at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(LinkSpanInner { url: url.into() }),
        }
    }

    /// The link target.
    pub fn url(&self) -> &str {
        &self.inner.url
    }
}

impl PartialEq for LinkSpan {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for LinkSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSpan")
            .field("url", &self.inner.url)
            .finish()
    }
}

/// A marker of any kind. Lookups filter on [`SpanKind`] so callers never
/// downcast.
#[derive(Clone, Debug, PartialEq)]
pub enum Span {
    Emoji(EmojiSpan),
    Link(LinkSpan),
}

impl Span {
    /// The kind of this marker.
    pub fn kind(&self) -> SpanKind {
        match self {
            Span::Emoji(_) => SpanKind::Emoji,
            Span::Link(_) => SpanKind::Link,
        }
    }

    /// The emoji payload, if this is an emoji marker.
    pub fn as_emoji(&self) -> Option<&EmojiSpan> {
        match self {
            Span::Emoji(span) => Some(span),
            Span::Link(_) => None,
        }
    }
}

impl From<EmojiSpan> for Span {
    fn from(span: EmojiSpan) -> Self {
        Span::Emoji(span)
    }
}

impl From<LinkSpan> for Span {
    fn from(span: LinkSpan) -> Self {
        Span::Link(span)
    }
}

#[derive(Clone, Debug)]
struct SpanEntry {
    span: Span,
    range: SpanRange,
}

/// The set of markers attached to one text buffer.
///
/// Fields typically carry a handful of spans, so entries live in a
/// `SmallVec` and every operation is a linear scan.
#[derive(Default)]
pub struct SpanSet {
    entries: SmallVec<[SpanEntry; 4]>,
}

impl SpanSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `span` over `range`.
    ///
    /// If the same handle is already attached it is moved, not duplicated,
    /// matching re-add semantics in the host text framework.
    pub fn attach(&mut self, span: impl Into<Span>, range: SpanRange) {
        let span = span.into();
        self.entries.retain(|entry| entry.span != span);
        self.entries.push(SpanEntry { span, range });
    }

    /// Detaches `span`, returning the range it covered.
    pub fn remove(&mut self, span: &Span) -> Option<SpanRange> {
        let pos = self.entries.iter().position(|entry| entry.span == *span)?;
        Some(self.entries.remove(pos).range)
    }

    /// The range `span` is attached over, if it is attached.
    pub fn range_of(&self, span: &Span) -> Option<SpanRange> {
        self.entries
            .iter()
            .find(|entry| entry.span == *span)
            .map(|entry| entry.range)
    }

    /// All spans of `kind` intersecting `range`, in attachment order.
    pub fn spans_of_kind(&self, kind: SpanKind, range: SpanRange) -> Vec<(Span, SpanRange)> {
        self.entries
            .iter()
            .filter(|entry| entry.span.kind() == kind && entry.range.intersects(&range))
            .map(|entry| (entry.span.clone(), entry.range))
            .collect()
    }

    /// All spans of `kind` regardless of position.
    pub fn all_of_kind(&self, kind: SpanKind) -> Vec<(Span, SpanRange)> {
        self.entries
            .iter()
            .filter(|entry| entry.span.kind() == kind)
            .map(|entry| (entry.span.clone(), entry.range))
            .collect()
    }

    /// The smallest start-or-end offset of a span of `kind` at or after
    /// `at`, or `None` if no such boundary exists.
    ///
    /// The scan is inclusive of `at`: a span starting exactly at the scan
    /// position counts. This is what makes "field contains a marker"
    /// equivalent to "a boundary exists in `[0, len)`".
    pub fn next_boundary(&self, kind: SpanKind, at: usize) -> Option<usize> {
        self.entries
            .iter()
            .filter(|entry| entry.span.kind() == kind)
            .flat_map(|entry| [entry.range.start(), entry.range.end()])
            .filter(|&boundary| boundary >= at)
            .min()
    }

    /// Shifts span offsets for an insertion of `inserted` bytes at `at`.
    ///
    /// Exclusive-exclusive: insertion at either edge of a span leaves the
    /// span covering its original text.
    pub fn on_insert(&mut self, at: usize, inserted: usize) {
        if inserted == 0 {
            return;
        }
        for entry in &mut self.entries {
            let start = entry.range.start();
            let end = entry.range.end();
            let new_start = if start >= at { start + inserted } else { start };
            let new_end = if end > at { end + inserted } else { end };
            entry.range = SpanRange::new(new_start, new_end);
        }
    }

    /// Collapses span offsets for a deletion of `range`.
    ///
    /// Boundaries inside the deleted range collapse to its start; spans
    /// left empty are dropped.
    pub fn on_delete(&mut self, range: SpanRange) {
        if range.is_empty() {
            return;
        }
        let collapse = |offset: usize| {
            if offset <= range.start() {
                offset
            } else if offset >= range.end() {
                offset - range.len()
            } else {
                range.start()
            }
        };
        for entry in &mut self.entries {
            entry.range = SpanRange::new(collapse(entry.range.start()), collapse(entry.range.end()));
        }
        self.entries.retain(|entry| !entry.range.is_empty());
    }

    /// Detaches every span.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
