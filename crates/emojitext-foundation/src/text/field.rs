//! Observable state holder for an emoji-capable text field.

use super::{EmojiSpan, Span, SpanKind, SpanRange, SpanSet};
use std::cell::RefCell;
use std::rc::Rc;

/// Stable handle to a registered change listener.
///
/// Ids stay valid across removals of other listeners, so a component can
/// deregister itself at teardown regardless of registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ChangeListener = Rc<dyn Fn()>;

struct FieldInner {
    text: String,
    spans: SpanSet,
    listeners: Vec<(ListenerId, ChangeListener)>,
    next_listener_id: u64,
    /// Flag to prevent concurrent edits
    is_editing: bool,
    redraw_pending: bool,
    redraw_count: u64,
}

/// RAII guard for is_editing flag - ensures panic safety
struct EditGuard<'a> {
    inner: &'a RefCell<FieldInner>,
}

impl<'a> EditGuard<'a> {
    fn new(inner: &'a RefCell<FieldInner>) -> Result<Self, ()> {
        if inner.borrow().is_editing {
            return Err(());
        }
        inner.borrow_mut().is_editing = true;
        Ok(Self { inner })
    }
}

impl Drop for EditGuard<'_> {
    fn drop(&mut self) {
        self.inner.borrow_mut().is_editing = false;
    }
}

/// Mutable view of the field handed to [`EmojiFieldState::edit`] closures.
///
/// Text edits keep span offsets consistent; attaching or detaching spans
/// counts as a change and triggers the post-edit notification like any
/// text mutation.
pub struct FieldEditor<'a> {
    text: &'a mut String,
    spans: &'a mut SpanSet,
    changed: bool,
}

impl FieldEditor<'_> {
    /// The current text.
    pub fn text(&self) -> &str {
        self.text
    }

    /// Inserts `s` at byte offset `at` (clamped to the text length).
    ///
    /// # Panics
    ///
    /// Panics if `at` is not a char boundary.
    pub fn insert(&mut self, at: usize, s: &str) {
        if s.is_empty() {
            return;
        }
        let at = at.min(self.text.len());
        self.text.insert_str(at, s);
        self.spans.on_insert(at, s.len());
        self.changed = true;
    }

    /// Appends `s` at the end of the text.
    pub fn append(&mut self, s: &str) {
        let len = self.text.len();
        self.insert(len, s);
    }

    /// Deletes the given byte range (clamped to the text length).
    ///
    /// Spans covering the deleted range collapse; spans left empty are
    /// detached.
    ///
    /// # Panics
    ///
    /// Panics if either clamped bound is not a char boundary.
    pub fn delete(&mut self, range: SpanRange) {
        let range = range.clamp(self.text.len());
        if range.is_empty() {
            return;
        }
        self.text.replace_range(range.start()..range.end(), "");
        self.spans.on_delete(range);
        self.changed = true;
    }

    /// Replaces the whole text and detaches every span.
    pub fn set_text(&mut self, s: &str) {
        if self.text.as_str() == s && self.spans.is_empty() {
            return;
        }
        self.text.clear();
        self.text.push_str(s);
        self.spans.clear();
        self.changed = true;
    }

    /// Attaches a span over `range` (clamped to the text length).
    ///
    /// Attaching over an empty clamped range is a no-op.
    pub fn attach(&mut self, span: impl Into<Span>, range: SpanRange) {
        let range = range.clamp(self.text.len());
        if range.is_empty() {
            return;
        }
        self.spans.attach(span, range);
        self.changed = true;
    }

    /// Detaches `span`; returns true if it was attached.
    pub fn remove_span(&mut self, span: &Span) -> bool {
        let removed = self.spans.remove(span).is_some();
        self.changed |= removed;
        removed
    }

    /// Detaches every span.
    pub fn clear_spans(&mut self) {
        if !self.spans.is_empty() {
            self.spans.clear();
            self.changed = true;
        }
    }
}

/// Observable editable text buffer with attached rich-text markers.
///
/// All mutation goes through [`edit`](Self::edit); change listeners fire
/// exactly once per completed edit. Span maintenance performed by the
/// rendering side ([`detach_span`](Self::detach_span) /
/// [`reattach_span`](Self::reattach_span)) does not count as an edit and
/// fires no listeners, mirroring host text frameworks where restyling a
/// span is not a text change.
///
/// # Thread Safety
///
/// Uses `Rc<RefCell<...>>` internally and is not thread-safe. Main thread
/// only.
#[derive(Clone)]
pub struct EmojiFieldState {
    inner: Rc<RefCell<FieldInner>>,
}

impl EmojiFieldState {
    /// Creates a field with the given initial text and no spans.
    pub fn new(initial_text: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(FieldInner {
                text: initial_text.into(),
                spans: SpanSet::new(),
                listeners: Vec::new(),
                next_listener_id: 0,
                is_editing: false,
                redraw_pending: false,
                redraw_count: 0,
            })),
        }
    }

    /// The current text content.
    pub fn text(&self) -> String {
        self.inner.borrow().text.clone()
    }

    /// Length of the text in bytes.
    pub fn text_len(&self) -> usize {
        self.inner.borrow().text.len()
    }

    /// True if the field holds no text.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().text.is_empty()
    }

    /// Edits the field content.
    ///
    /// After the closure returns, change listeners are notified exactly
    /// once if the closure changed anything, with all internal borrows
    /// released first.
    ///
    /// # Panics
    ///
    /// Panics if called while already editing (no nested edits).
    pub fn edit<F>(&self, f: F)
    where
        F: FnOnce(&mut FieldEditor),
    {
        // RAII guard ensures is_editing is cleared even on panic
        let _guard = EditGuard::new(&self.inner)
            .expect("EmojiFieldState does not support nested editing");

        // Edit a detached buffer so no borrow is live while the closure
        // runs; a nested edit then fails on the guard, not the RefCell.
        let (mut text, mut spans) = {
            let mut inner = self.inner.borrow_mut();
            (std::mem::take(&mut inner.text), std::mem::take(&mut inner.spans))
        };
        let mut editor = FieldEditor {
            text: &mut text,
            spans: &mut spans,
            changed: false,
        };
        f(&mut editor);
        let changed = editor.changed;
        {
            let mut inner = self.inner.borrow_mut();
            inner.text = text;
            inner.spans = spans;
        }

        // Clear is_editing before notifying so listeners see settled state
        drop(_guard);

        if changed {
            self.notify_listeners();
        }
    }

    fn notify_listeners(&self) {
        // Snapshot the ids, then clone each matched handle out of the
        // borrow before calling: listeners may add or remove listeners or
        // start a new edit from their callback. Listeners added during
        // dispatch fire from the next edit on; listeners removed during
        // dispatch are skipped by the id lookup.
        let ids: Vec<ListenerId> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .map(|(id, _)| *id)
            .collect();
        for id in ids {
            let listener = self
                .inner
                .borrow()
                .listeners
                .iter()
                .find(|(lid, _)| *lid == id)
                .map(|(_, listener)| listener.clone());
            if let Some(listener) = listener {
                listener();
            }
        }
    }

    /// Registers a listener fired after each completed edit.
    pub fn add_change_listener(&self, listener: impl Fn() + 'static) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_listener_id);
        inner.next_listener_id += 1;
        let listener: ChangeListener = Rc::new(listener);
        inner.listeners.push((id, listener));
        id
    }

    /// Removes a listener; returns true if it was registered.
    pub fn remove_change_listener(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(lid, _)| *lid != id);
        inner.listeners.len() != before
    }

    /// Number of registered change listeners.
    pub fn change_listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// All emoji markers with the ranges they cover, in attachment order.
    pub fn emoji_spans(&self) -> Vec<(EmojiSpan, SpanRange)> {
        self.inner
            .borrow()
            .spans
            .all_of_kind(SpanKind::Emoji)
            .into_iter()
            .filter_map(|(span, range)| match span {
                Span::Emoji(emoji) => Some((emoji, range)),
                Span::Link(_) => None,
            })
            .collect()
    }

    /// First boundary of a span of `kind` at or after `at`.
    pub fn next_span_boundary(&self, kind: SpanKind, at: usize) -> Option<usize> {
        self.inner.borrow().spans.next_boundary(kind, at)
    }

    /// Detaches a span without firing change listeners.
    ///
    /// Restyling markers is the rendering layer's business, not a text
    /// change.
    pub fn detach_span(&self, span: &Span) -> Option<SpanRange> {
        self.inner.borrow_mut().spans.remove(span)
    }

    /// Attaches a span without firing change listeners.
    pub fn reattach_span(&self, span: impl Into<Span>, range: SpanRange) {
        self.inner.borrow_mut().spans.attach(span, range);
    }

    /// Asks the host to repaint this field.
    ///
    /// Requests coalesce: the host consumes at most one pending request
    /// per frame via [`take_redraw_request`](Self::take_redraw_request).
    pub fn request_redraw(&self) {
        let mut inner = self.inner.borrow_mut();
        if !inner.redraw_pending {
            log::trace!("field redraw requested");
        }
        inner.redraw_pending = true;
        inner.redraw_count += 1;
    }

    /// Consumes the pending redraw request, if any.
    pub fn take_redraw_request(&self) -> bool {
        let mut inner = self.inner.borrow_mut();
        std::mem::take(&mut inner.redraw_pending)
    }

    /// Total number of redraw requests issued so far.
    pub fn redraw_count(&self) -> u64 {
        self.inner.borrow().redraw_count
    }
}

impl Default for EmojiFieldState {
    fn default() -> Self {
        Self::new("")
    }
}

impl PartialEq for EmojiFieldState {
    fn eq(&self, other: &Self) -> bool {
        // Same field instance, by pointer identity
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for EmojiFieldState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EmojiFieldState")
            .field("text", &inner.text)
            .field("spans", &inner.spans.len())
            .finish()
    }
}
