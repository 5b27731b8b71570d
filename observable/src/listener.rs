use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

use tracing::trace;

use crate::lock;

/// Identity of a registered listener: the address of its `Arc` allocation.
/// Two clones of the same `Arc` share an id, two separately allocated listeners never do.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ListenerId(usize);

impl ListenerId {
    pub fn of<L: ?Sized>(listener: &Arc<L>) -> Self { Self(Arc::as_ptr(listener) as *const () as usize) }

    fn of_weak<L: ?Sized>(listener: &Weak<L>) -> Self { Self(listener.as_ptr() as *const () as usize) }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{:#x}", self.0) }
}

type Listeners<L> = RwLock<HashMap<ListenerId, Arc<L>>>;

/// The set of listeners registered on one observable.
///
/// Registration and removal take the write lock. Firing takes the read lock only long enough to
/// copy the listener handles, then calls every listener with no lock held, so a listener may
/// subscribe, unsubscribe or read the observable it is being notified by.
pub struct ListenerSet<L: ?Sized>(Arc<Listeners<L>>);

impl<L: ?Sized> Clone for ListenerSet<L> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<L: ?Sized> Default for ListenerSet<L> {
    fn default() -> Self { Self::new() }
}

impl<L: ?Sized> std::fmt::Debug for ListenerSet<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet").field("listeners", &self.len()).finish()
    }
}

impl<L: ?Sized> ListenerSet<L> {
    pub fn new() -> Self { Self(Arc::new(RwLock::new(HashMap::new()))) }

    /// Registers a listener. Returns false if this exact listener was already registered.
    pub fn insert(&self, listener: Arc<L>) -> bool {
        let id = ListenerId::of(&listener);
        let mut listeners = lock::write(&self.0);
        if listeners.contains_key(&id) {
            return false;
        }
        listeners.insert(id, listener);
        true
    }

    /// Unregisters a listener. Returns false if it was not registered.
    pub fn remove(&self, listener: &Arc<L>) -> bool { lock::write(&self.0).remove(&ListenerId::of(listener)).is_some() }

    pub fn contains(&self, listener: &Arc<L>) -> bool { lock::read(&self.0).contains_key(&ListenerId::of(listener)) }

    pub fn len(&self) -> usize { lock::read(&self.0).len() }

    pub fn is_empty(&self) -> bool { lock::read(&self.0).is_empty() }

    /// Copies the current listener handles out from under the read lock
    pub fn snapshot(&self) -> Vec<Arc<L>> { lock::read(&self.0).values().cloned().collect() }

    /// Calls `f` once per listener registered at the time of the call, without holding any lock.
    ///
    /// A panic in `f` propagates and the remaining listeners are not called.
    pub fn notify(&self, mut f: impl FnMut(&L)) {
        let listeners = self.snapshot();
        trace!("notifying {} listener(s)", listeners.len());
        for listener in &listeners {
            f(&**listener);
        }
    }
}

impl<L: ?Sized + Send + Sync + 'static> ListenerSet<L> {
    /// Registers a listener and returns a guard which unregisters it when dropped.
    ///
    /// The guard holds no strong reference to the set, so it does not keep the observable alive. If the
    /// listener was already registered the guard is inert: dropping it leaves the existing registration alone.
    pub fn subscribe(&self, listener: Arc<L>) -> ListenerGuard {
        let registration = Registration { set: Arc::downgrade(&self.0), listener: Arc::downgrade(&listener) };
        if self.insert(listener) { ListenerGuard(Some(Box::new(registration))) } else { ListenerGuard(None) }
    }
}

trait Release: Send + Sync {
    fn release(&self);
}

struct Registration<L: ?Sized> {
    set: Weak<Listeners<L>>,
    // Holding the weak reference keeps the allocation (and therefore the id) from being reused
    listener: Weak<L>,
}

impl<L: ?Sized + Send + Sync> Release for Registration<L> {
    fn release(&self) {
        if let Some(set) = self.set.upgrade() {
            lock::write(&set).remove(&ListenerId::of_weak(&self.listener));
        }
    }
}

/// A subscription handle. Dropping it unregisters the listener.
#[must_use = "the listener is unregistered as soon as the guard is dropped"]
pub struct ListenerGuard(Option<Box<dyn Release>>);

impl ListenerGuard {
    /// Unregisters the listener now
    pub fn unsubscribe(mut self) {
        if let Some(registration) = self.0.take() {
            registration.release();
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(registration) = self.0.take() {
            registration.release();
        }
    }
}

impl std::fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_tuple("ListenerGuard").finish() }
}
