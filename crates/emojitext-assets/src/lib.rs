//! Emoji asset-loading notifications.
//!
//! [`EmojiAssets`] is the process-wide publish point for "emoji glyph
//! assets changed" events. It is an explicit object owned by the
//! application context and injected into whoever needs it - there is no
//! singleton. The loading pipeline itself lives elsewhere; this crate only
//! carries its listener registry.
//!
//! # Lifecycle
//!
//! The application creates one registry with [`EmojiAssets::new`] during
//! startup and calls [`EmojiAssets::teardown`] when shutting the UI down,
//! which drops every registration. Listeners are held weakly, so a
//! listener that is dropped without deregistering is pruned on the next
//! notification rather than leaked.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Callbacks fired when emoji glyph assets change.
pub trait EmojiLoadListener {
    /// A part of the active emoji pack finished loading; glyphs that were
    /// missing may now be available.
    fn on_emoji_part_loaded(&self);

    /// The active emoji pack was replaced; every resolved glyph is stale.
    fn on_emoji_pack_changed(&self);
}

struct AssetsInner {
    /// (data pointer address, weak listener) pairs; the address is the
    /// registration key.
    listeners: Vec<(usize, Weak<dyn EmojiLoadListener>)>,
    pack_generation: u64,
}

/// Listener registry for emoji asset reloads.
///
/// Cheap to clone; all clones refer to the same registry.
///
/// # Thread Safety
///
/// Uses `Rc<RefCell<...>>` internally and is not thread-safe. Main thread
/// only, like the rest of the UI stack.
#[derive(Clone)]
pub struct EmojiAssets {
    inner: Rc<RefCell<AssetsInner>>,
}

fn listener_key(listener: &Rc<dyn EmojiLoadListener>) -> usize {
    Rc::as_ptr(listener) as *const () as usize
}

impl EmojiAssets {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(AssetsInner {
                listeners: Vec::new(),
                pack_generation: 0,
            })),
        }
    }

    /// Registers a listener, keyed by handle identity.
    ///
    /// Adding the same handle twice is a no-op: a listener is notified at
    /// most once per event.
    pub fn add_listener(&self, listener: &Rc<dyn EmojiLoadListener>) {
        let key = listener_key(listener);
        let mut inner = self.inner.borrow_mut();
        if inner.listeners.iter().any(|(k, _)| *k == key) {
            return;
        }
        inner.listeners.push((key, Rc::downgrade(listener)));
    }

    /// Deregisters a listener; returns true if it was registered.
    pub fn remove_listener(&self, listener: &Rc<dyn EmojiLoadListener>) -> bool {
        let key = listener_key(listener);
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(k, _)| *k != key);
        inner.listeners.len() != before
    }

    /// Number of live registrations.
    pub fn listener_count(&self) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|(_, weak)| weak.upgrade().is_some())
            .count()
    }

    /// Broadcasts that a part of the active pack finished loading.
    pub fn notify_part_loaded(&self) {
        log::trace!("emoji assets: part loaded");
        self.dispatch(|listener| listener.on_emoji_part_loaded());
    }

    /// Broadcasts that the active pack was replaced.
    pub fn notify_pack_changed(&self) {
        let generation = {
            let mut inner = self.inner.borrow_mut();
            inner.pack_generation += 1;
            inner.pack_generation
        };
        log::debug!("emoji assets: pack changed (generation {generation})");
        self.dispatch(|listener| listener.on_emoji_pack_changed());
    }

    /// Monotonic counter bumped on every pack change.
    pub fn pack_generation(&self) -> u64 {
        self.inner.borrow().pack_generation
    }

    /// Drops every registration. Called once at application shutdown.
    pub fn teardown(&self) {
        self.inner.borrow_mut().listeners.clear();
    }

    fn dispatch<F>(&self, f: F)
    where
        F: Fn(&dyn EmojiLoadListener),
    {
        // Prune dead registrations, then call outside the borrow so a
        // listener may add or remove registrations from its callback.
        let live: Vec<Rc<dyn EmojiLoadListener>> = {
            let mut inner = self.inner.borrow_mut();
            inner.listeners.retain(|(_, weak)| weak.upgrade().is_some());
            inner
                .listeners
                .iter()
                .filter_map(|(_, weak)| weak.upgrade())
                .collect()
        };
        for listener in live {
            f(&*listener);
        }
    }
}

impl Default for EmojiAssets {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for EmojiAssets {
    fn eq(&self, other: &Self) -> bool {
        // Same registry instance, by pointer identity
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for EmojiAssets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EmojiAssets")
            .field("listeners", &inner.listeners.len())
            .field("pack_generation", &inner.pack_generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct Probe {
        parts: Cell<u32>,
        packs: Cell<u32>,
    }

    impl EmojiLoadListener for Probe {
        fn on_emoji_part_loaded(&self) {
            self.parts.set(self.parts.get() + 1);
        }

        fn on_emoji_pack_changed(&self) {
            self.packs.set(self.packs.get() + 1);
        }
    }

    fn probe() -> (Rc<Probe>, Rc<dyn EmojiLoadListener>) {
        let probe = Rc::new(Probe::default());
        let listener: Rc<dyn EmojiLoadListener> = probe.clone();
        (probe, listener)
    }

    #[test]
    fn notify_reaches_registered_listener() {
        let assets = EmojiAssets::new();
        let (probe, listener) = probe();
        assets.add_listener(&listener);

        assets.notify_part_loaded();
        assets.notify_pack_changed();
        assert_eq!(probe.parts.get(), 1);
        assert_eq!(probe.packs.get(), 1);
    }

    #[test]
    fn add_is_idempotent_per_handle() {
        let assets = EmojiAssets::new();
        let (probe, listener) = probe();
        assets.add_listener(&listener);
        assets.add_listener(&listener);
        assert_eq!(assets.listener_count(), 1);

        assets.notify_part_loaded();
        assert_eq!(probe.parts.get(), 1);
    }

    #[test]
    fn removed_listener_is_not_notified() {
        let assets = EmojiAssets::new();
        let (probe, listener) = probe();
        assets.add_listener(&listener);
        assert!(assets.remove_listener(&listener));
        assert!(!assets.remove_listener(&listener));

        assets.notify_part_loaded();
        assert_eq!(probe.parts.get(), 0);
        assert_eq!(assets.listener_count(), 0);
    }

    #[test]
    fn dropped_listener_is_pruned() {
        let assets = EmojiAssets::new();
        {
            let (_probe, listener) = probe();
            assets.add_listener(&listener);
            assert_eq!(assets.listener_count(), 1);
            // probe and listener drop here
        }
        assert_eq!(assets.listener_count(), 0);
        assets.notify_part_loaded(); // must not panic on dead entries
    }

    #[test]
    fn pack_generation_bumps_on_pack_change_only() {
        let assets = EmojiAssets::new();
        assert_eq!(assets.pack_generation(), 0);
        assets.notify_part_loaded();
        assert_eq!(assets.pack_generation(), 0);
        assets.notify_pack_changed();
        assets.notify_pack_changed();
        assert_eq!(assets.pack_generation(), 2);
    }

    #[test]
    fn teardown_drops_all_registrations() {
        let assets = EmojiAssets::new();
        let (probe, listener) = probe();
        assets.add_listener(&listener);
        assets.teardown();
        assert_eq!(assets.listener_count(), 0);

        assets.notify_pack_changed();
        assert_eq!(probe.packs.get(), 0);
    }

    #[test]
    fn listener_may_deregister_from_its_callback() {
        struct SelfRemover {
            assets: EmojiAssets,
            this: RefCell<Option<Rc<dyn EmojiLoadListener>>>,
            fired: Cell<u32>,
        }

        impl EmojiLoadListener for SelfRemover {
            fn on_emoji_part_loaded(&self) {
                self.fired.set(self.fired.get() + 1);
                if let Some(this) = self.this.borrow_mut().take() {
                    self.assets.remove_listener(&this);
                }
            }

            fn on_emoji_pack_changed(&self) {}
        }

        let assets = EmojiAssets::new();
        let remover = Rc::new(SelfRemover {
            assets: assets.clone(),
            this: RefCell::new(None),
            fired: Cell::new(0),
        });
        let listener: Rc<dyn EmojiLoadListener> = remover.clone();
        *remover.this.borrow_mut() = Some(listener.clone());
        assets.add_listener(&listener);

        assets.notify_part_loaded();
        assets.notify_part_loaded();
        assert_eq!(remover.fired.get(), 1);
    }
}
