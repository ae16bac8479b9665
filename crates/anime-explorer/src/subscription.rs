//! Change notifications from the store.
//!
//! Listeners are plain callbacks. The handle returned by `subscribe`
//! removes its listener when dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// What changed in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Initial favourites load finished
    FavouritesLoaded { count: usize },
    /// A page-1 result replaced the list
    RecordsReplaced { page: u32, count: usize },
    /// A later page was appended to the list
    RecordsAppended { page: u32, count: usize },
    FavouriteToggled { id: u32, is_favourite: bool },
    GenreFilterChanged { genres: Vec<u32> },
    DisplayModeChanged { favourites_only: bool },
}

pub(crate) type Listener = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

#[derive(Default)]
pub(crate) struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, Listener)>>,
}

impl Registry {
    pub(crate) fn add(self: &Arc<Self>, listener: Listener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));

        Subscription {
            id,
            registry: Arc::downgrade(self),
        }
    }

    fn remove(&self, id: u64) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Call every listener. The list is copied first so a listener may
    /// subscribe or unsubscribe without deadlocking.
    pub(crate) fn notify(&self, event: &StoreEvent) {
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(event);
        }
    }
}

/// Handle for a registered listener
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Remove the listener now
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Keep the listener for the lifetime of the store
    pub fn detach(mut self) {
        self.registry = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting(counter: &Arc<AtomicUsize>) -> Listener {
        let counter = Arc::clone(counter);
        Arc::new(move |_event: &StoreEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_notify_and_unsubscribe() {
        let registry = Arc::new(Registry::default());
        let counter = Arc::new(AtomicUsize::new(0));

        let subscription = registry.add(counting(&counter));
        registry.notify(&StoreEvent::FavouritesLoaded { count: 0 });
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        subscription.unsubscribe();
        registry.notify(&StoreEvent::FavouritesLoaded { count: 0 });
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let registry = Arc::new(Registry::default());
        let counter = Arc::new(AtomicUsize::new(0));

        {
            let _subscription = registry.add(counting(&counter));
            assert_eq!(registry.len(), 1);
        }

        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_detach_keeps_listener() {
        let registry = Arc::new(Registry::default());
        let counter = Arc::new(AtomicUsize::new(0));

        registry.add(counting(&counter)).detach();
        registry.notify(&StoreEvent::DisplayModeChanged { favourites_only: true });

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_outlives_registry() {
        let registry = Arc::new(Registry::default());
        let counter = Arc::new(AtomicUsize::new(0));

        let subscription = registry.add(counting(&counter));
        drop(registry);
        // Nothing left to remove from; must not panic
        drop(subscription);
    }
}
