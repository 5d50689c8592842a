// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan-out of mesh status reports to interested handlers.
//!
//! - [`SubscriptionId`] - Unique identifier of a registered handler
//! - [`Subscription`] - Deregistration handle returned by [`StatusDispatcher::subscribe`]
//! - [`StatusDispatcher`] - Ordered observer list owned by the mesh service

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::status::MeshStatus;

/// Unique identifier for a subscription.
///
/// IDs increase monotonically within a dispatcher, so ordering by ID is
/// ordering by subscription time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

/// Type alias for status handlers.
type StatusHandler = Arc<dyn Fn(&MeshStatus) + Send + Sync>;

struct DispatcherInner {
    next_id: AtomicU64,
    handlers: RwLock<BTreeMap<SubscriptionId, StatusHandler>>,
}

impl DispatcherInner {
    fn remove(&self, id: SubscriptionId) -> bool {
        self.handlers.write().remove(&id).is_some()
    }
}

/// Broadcasts every status message to all registered handlers.
///
/// Handlers run synchronously, in subscription order, on the task calling
/// [`dispatch`](Self::dispatch). Each handler decides for itself whether a
/// message concerns it. A panicking handler is logged and skipped; the
/// remaining handlers still receive the message.
///
/// The dispatcher is cheaply cloneable; clones share the same handler list.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use avion_mesh::dispatcher::StatusDispatcher;
/// use avion_mesh::status::MeshStatus;
/// use avion_mesh::types::Avid;
///
/// let dispatcher = StatusDispatcher::new();
/// let seen = Arc::new(AtomicUsize::new(0));
///
/// let counter = Arc::clone(&seen);
/// let subscription = dispatcher.subscribe(move |_status| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// dispatcher.dispatch(&MeshStatus::no_change(Avid::new("1")));
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
///
/// subscription.unsubscribe();
/// dispatcher.dispatch(&MeshStatus::no_change(Avid::new("1")));
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
/// ```
#[derive(Clone)]
pub struct StatusDispatcher {
    inner: Arc<DispatcherInner>,
}

impl StatusDispatcher {
    /// Creates a dispatcher with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                next_id: AtomicU64::new(1),
                handlers: RwLock::new(BTreeMap::new()),
            }),
        }
    }

    /// Registers a handler.
    ///
    /// The handler stays registered until the returned [`Subscription`] is
    /// dropped or [`Subscription::unsubscribe`] is called.
    #[must_use = "dropping the subscription unregisters the handler"]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&MeshStatus) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.handlers.write().insert(id, Arc::new(handler));
        tracing::trace!(%id, "Status handler subscribed");
        Subscription {
            id,
            dispatcher: Arc::downgrade(&self.inner),
        }
    }

    /// Unregisters a handler by ID.
    ///
    /// Returns `true` if a handler was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.remove(id)
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.handlers.read().len()
    }

    /// Removes every handler.
    pub fn clear(&self) {
        self.inner.handlers.write().clear();
    }

    /// Delivers a status message to every handler.
    ///
    /// The handler list is snapshotted first, so handlers may subscribe or
    /// unsubscribe while being called. Returns the number of handlers that
    /// completed without panicking.
    pub fn dispatch(&self, status: &MeshStatus) -> usize {
        let handlers: Vec<(SubscriptionId, StatusHandler)> = self
            .inner
            .handlers
            .read()
            .iter()
            .map(|(id, handler)| (*id, Arc::clone(handler)))
            .collect();

        let mut delivered = 0;
        for (id, handler) in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(status))) {
                Ok(()) => delivered += 1,
                Err(panic) => {
                    tracing::error!(
                        %id,
                        avid = %status.avid,
                        panic = panic_message(panic.as_ref()),
                        "Status handler panicked"
                    );
                }
            }
        }
        delivered
    }
}

impl Default for StatusDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StatusDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusDispatcher")
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

/// Handle to a registered status handler.
///
/// Dropping the handle unregisters the handler. The handle does not keep the
/// dispatcher alive.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    dispatcher: Weak<DispatcherInner>,
}

impl Subscription {
    /// Returns the subscription ID.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Unregisters the handler now.
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.dispatcher.upgrade() {
            inner.remove(self.id);
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Avid;
    use parking_lot::Mutex;

    fn status(avid: &str) -> MeshStatus {
        MeshStatus::no_change(Avid::new(avid))
    }

    #[test]
    fn new_dispatcher_has_no_subscribers() {
        let dispatcher = StatusDispatcher::new();
        assert_eq!(dispatcher.subscriber_count(), 0);
        assert_eq!(dispatcher.dispatch(&status("1")), 0);
    }

    #[test]
    fn subscription_ids_are_unique() {
        let dispatcher = StatusDispatcher::new();
        let a = dispatcher.subscribe(|_| {});
        let b = dispatcher.subscribe(|_| {});
        assert_ne!(a.id(), b.id());
        assert!(a.id() < b.id());
    }

    #[test]
    fn handlers_run_in_subscription_order() {
        let dispatcher = StatusDispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let subs: Vec<Subscription> = (0..5)
            .map(|i| {
                let order = Arc::clone(&order);
                dispatcher.subscribe(move |_| order.lock().push(i))
            })
            .collect();

        dispatcher.dispatch(&status("1"));
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
        drop(subs);
    }

    #[test]
    fn every_handler_sees_every_message() {
        let dispatcher = StatusDispatcher::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_a = Arc::clone(&seen);
        let _a = dispatcher.subscribe(move |s| seen_a.lock().push(("a", s.avid.clone())));
        let seen_b = Arc::clone(&seen);
        let _b = dispatcher.subscribe(move |s| seen_b.lock().push(("b", s.avid.clone())));

        assert_eq!(dispatcher.dispatch(&status("7")), 2);
        assert_eq!(
            *seen.lock(),
            vec![("a", Avid::new("7")), ("b", Avid::new("7"))]
        );
    }

    #[test]
    fn panicking_handler_does_not_block_others() {
        let dispatcher = StatusDispatcher::new();
        let reached = Arc::new(Mutex::new(false));

        let _bad = dispatcher.subscribe(|_| panic!("handler failure"));
        let flag = Arc::clone(&reached);
        let _good = dispatcher.subscribe(move |_| *flag.lock() = true);

        assert_eq!(dispatcher.dispatch(&status("1")), 1);
        assert!(*reached.lock());
        // The panicking handler stays registered
        assert_eq!(dispatcher.subscriber_count(), 2);
    }

    #[test]
    fn dropping_subscription_unregisters() {
        let dispatcher = StatusDispatcher::new();
        let sub = dispatcher.subscribe(|_| {});
        assert_eq!(dispatcher.subscriber_count(), 1);

        drop(sub);
        assert_eq!(dispatcher.subscriber_count(), 0);
    }

    #[test]
    fn unsubscribe_by_id() {
        let dispatcher = StatusDispatcher::new();
        let sub = dispatcher.subscribe(|_| {});
        let id = sub.id();

        assert!(dispatcher.unsubscribe(id));
        assert!(!dispatcher.unsubscribe(id));
        // Dropping after manual removal is harmless
        drop(sub);
        assert_eq!(dispatcher.subscriber_count(), 0);
    }

    #[test]
    fn subscription_outliving_dispatcher() {
        let dispatcher = StatusDispatcher::new();
        let sub = dispatcher.subscribe(|_| {});
        drop(dispatcher);
        sub.unsubscribe();
    }

    #[test]
    fn handler_may_unsubscribe_during_dispatch() {
        let dispatcher = StatusDispatcher::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let slot_clone = Arc::clone(&slot);
        let sub = dispatcher.subscribe(move |_| {
            slot_clone.lock().take();
        });
        *slot.lock() = Some(sub);

        assert_eq!(dispatcher.dispatch(&status("1")), 1);
        assert_eq!(dispatcher.subscriber_count(), 0);
    }

    #[test]
    fn clear_removes_all() {
        let dispatcher = StatusDispatcher::new();
        let _a = dispatcher.subscribe(|_| {});
        let _b = dispatcher.subscribe(|_| {});
        dispatcher.clear();
        assert_eq!(dispatcher.subscriber_count(), 0);
    }

    #[test]
    fn clones_share_handlers() {
        let dispatcher = StatusDispatcher::new();
        let clone = dispatcher.clone();
        let _sub = dispatcher.subscribe(|_| {});
        assert_eq!(clone.subscriber_count(), 1);
    }
}
