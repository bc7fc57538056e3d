//! Observer lists backing the session's subscription surface.
//!
//! Each list hands out a [`Subscription`] whose `unsubscribe` removes the
//! callback by identity (a monotonic id, never a positional index).
//! Emission snapshots the list first, so a callback that unsubscribes
//! itself — or anything else — cannot corrupt the in-flight iteration.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;
type Entries<T> = Mutex<Vec<(u64, Callback<T>)>>;

struct ListInner<T: 'static> {
    entries: Entries<T>,
    next_id: AtomicU64,
}

/// Shared list of subscribers for one event kind.
pub(crate) struct CallbackList<T: 'static> {
    inner: Arc<ListInner<T>>,
}

impl<T: 'static> Clone for CallbackList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: 'static> CallbackList<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(ListInner {
                entries: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn subscribe(&self, cb: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(cb)));

        let weak: Weak<ListInner<T>> = Arc::downgrade(&self.inner);
        Subscription {
            remove: Some(Box::new(move || {
                if let Some(list) = weak.upgrade() {
                    list.entries
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .retain(|(entry_id, _)| *entry_id != id);
                }
            })),
        }
    }

    /// Invoke every subscriber synchronously, in registration order.
    ///
    /// The lock is released before the first callback runs; callbacks may
    /// freely subscribe/unsubscribe or re-enter session accessors.
    pub(crate) fn emit(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = self
            .inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for cb in snapshot {
            cb(value);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Handle returned by the `on_*` registration methods.
///
/// Dropping the handle keeps the subscription alive; only an explicit
/// [`Subscription::unsubscribe`] removes the callback.
pub struct Subscription {
    remove: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn emits_in_registration_order() {
        let list: CallbackList<u32> = CallbackList::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let log = Arc::clone(&log);
            let _keep = list.subscribe(move |v: &u32| {
                log.lock().unwrap().push(format!("{tag}{v}"));
            });
        }
        list.emit(&7);
        assert_eq!(*log.lock().unwrap(), vec!["a7", "b7", "c7"]);
    }

    #[test]
    fn unsubscribe_removes_by_identity() {
        let list: CallbackList<u32> = CallbackList::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let first = {
            let hits = Arc::clone(&hits);
            list.subscribe(move |_| {
                hits.fetch_add(1, Ordering::Relaxed);
            })
        };
        let _second = {
            let hits = Arc::clone(&hits);
            list.subscribe(move |_| {
                hits.fetch_add(10, Ordering::Relaxed);
            })
        };

        first.unsubscribe();
        list.emit(&0);
        assert_eq!(hits.load(Ordering::Relaxed), 10);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn unsubscribing_inside_a_callback_does_not_break_iteration() {
        let list: CallbackList<u32> = CallbackList::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let sub = {
            let hits = Arc::clone(&hits);
            let slot = Arc::clone(&slot);
            list.subscribe(move |_| {
                hits.fetch_add(1, Ordering::Relaxed);
                // Self-unsubscribe mid-emission.
                if let Some(sub) = slot.lock().unwrap().take() {
                    sub.unsubscribe();
                }
            })
        };
        *slot.lock().unwrap() = Some(sub);
        let _tail = {
            let hits = Arc::clone(&hits);
            list.subscribe(move |_| {
                hits.fetch_add(100, Ordering::Relaxed);
            })
        };

        // First emission runs both callbacks from the snapshot.
        list.emit(&0);
        assert_eq!(hits.load(Ordering::Relaxed), 101);
        // The self-removed callback is gone for the next emission.
        list.emit(&0);
        assert_eq!(hits.load(Ordering::Relaxed), 201);
    }

    #[test]
    fn dropping_the_handle_keeps_the_subscription() {
        let list: CallbackList<u32> = CallbackList::new();
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let hits = Arc::clone(&hits);
            let _dropped = list.subscribe(move |_| {
                hits.fetch_add(1, Ordering::Relaxed);
            });
        }
        list.emit(&0);
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }
}
