//! Typed publish/subscribe registry owned by each event emitter

use ahash::AHashMap;
use smallvec::SmallVec;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

/// Trait for events dispatched through an [`EventRegistry`]
pub trait Event: 'static {
    /// Discriminant listeners subscribe to
    type Kind: Copy + Eq + Hash + fmt::Debug;

    /// Kind of this event
    fn kind(&self) -> Self::Kind;

    /// Event name for debugging
    fn event_name(&self) -> &'static str {
        "UnnamedEvent"
    }
}

/// Shared listener callback. Identity is the `Rc` allocation.
pub type Listener<E> = Rc<dyn Fn(&E)>;

/// Wrap a closure as a [`Listener`]
pub fn listener<E, F>(callback: F) -> Listener<E>
where
    F: Fn(&E) + 'static,
{
    Rc::new(callback)
}

/// Handle returned on subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct ListenerEntry<E> {
    id: ListenerId,
    callback: Listener<E>,
    once: bool,
}

fn same_callback<E>(a: &Listener<E>, b: &Listener<E>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Typed publish/subscribe hub owned by the component that emits
///
/// Dispatch is synchronous. Listeners only receive the event, never the
/// emitter, so they cannot re-enter the registry during `emit`.
pub struct EventRegistry<E: Event> {
    listeners: AHashMap<E::Kind, Vec<ListenerEntry<E>>>,
    next_id: u64,
}

impl<E: Event> EventRegistry<E> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            listeners: AHashMap::new(),
            next_id: 0,
        }
    }

    /// Subscribe `callback` to `kind`.
    ///
    /// Subscribing the same callback twice to one kind is a no-op that
    /// returns the id of the first subscription.
    pub fn on(&mut self, kind: E::Kind, callback: Listener<E>) -> ListenerId {
        self.register(kind, callback, false)
    }

    /// Subscribe `callback` for a single dispatch of `kind`.
    ///
    /// If `callback` is already subscribed to `kind`, the existing entry and
    /// its id are kept unchanged, so a listener added with [`on`](Self::on)
    /// stays persistent.
    pub fn once(&mut self, kind: E::Kind, callback: Listener<E>) -> ListenerId {
        self.register(kind, callback, true)
    }

    fn register(&mut self, kind: E::Kind, callback: Listener<E>, once: bool) -> ListenerId {
        let entries = self.listeners.entry(kind).or_default();
        if let Some(existing) = entries.iter().find(|e| same_callback(&e.callback, &callback)) {
            return existing.id;
        }

        let id = ListenerId(self.next_id);
        self.next_id += 1;
        entries.push(ListenerEntry { id, callback, once });
        id
    }

    /// Unsubscribe `callback` from `kind`. Returns false if it was not subscribed.
    pub fn off(&mut self, kind: E::Kind, callback: &Listener<E>) -> bool {
        self.remove_where(kind, |entry| same_callback(&entry.callback, callback))
    }

    /// Unsubscribe by handle
    pub fn off_id(&mut self, kind: E::Kind, id: ListenerId) -> bool {
        self.remove_where(kind, |entry| entry.id == id)
    }

    fn remove_where<P>(&mut self, kind: E::Kind, pred: P) -> bool
    where
        P: Fn(&ListenerEntry<E>) -> bool,
    {
        let Some(entries) = self.listeners.get_mut(&kind) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| !pred(entry));
        entries.len() != before
    }

    /// Check whether `callback` is subscribed to `kind`
    pub fn contains(&self, kind: E::Kind, callback: &Listener<E>) -> bool {
        self.listeners
            .get(&kind)
            .is_some_and(|entries| entries.iter().any(|e| same_callback(&e.callback, callback)))
    }

    /// Invoke every listener of `event.kind()`.
    ///
    /// The listener list is snapshotted and `once` listeners are dropped
    /// before the first callback runs.
    pub fn emit(&mut self, event: &E) {
        let Some(entries) = self.listeners.get_mut(&event.kind()) else {
            return;
        };
        if entries.is_empty() {
            return;
        }

        let batch: SmallVec<[Listener<E>; 4]> =
            entries.iter().map(|entry| Rc::clone(&entry.callback)).collect();
        entries.retain(|entry| !entry.once);

        for callback in batch {
            callback(event);
        }
    }

    /// Drop every listener of `kind`
    pub fn clear_event(&mut self, kind: E::Kind) {
        if let Some(entries) = self.listeners.get_mut(&kind) {
            entries.clear();
        }
    }

    /// Drop every listener
    pub fn clear_all_events(&mut self) {
        self.listeners.clear();
    }

    /// Get listener count for `kind`
    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }

    /// Get total listener count
    pub fn total_listeners(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }
}

impl<E: Event> Default for EventRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for EventRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("total_listeners", &self.total_listeners())
            .finish()
    }
}
