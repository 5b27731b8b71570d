use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, trace};

use crate::{
    change::ValueChange,
    error::BindError,
    lock,
    value::{ChangeListener, ObservableValue, ValueId},
};

lazy_static::lazy_static! {
    static ref GLOBAL_REGISTRY: BindingRegistry = BindingRegistry::new();
}

/// Unordered pair of bound values: `{a, b}` and `{b, a}` produce the same key
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
struct BindingKey(ValueId, ValueId);

impl BindingKey {
    fn new(a: ValueId, b: ValueId) -> Self { if a <= b { Self(a, b) } else { Self(b, a) } }
}

struct BindingEntry {
    // Unregisters both listeners. Owns strong handles to both values, so neither is dropped while bound.
    detach: Box<dyn FnOnce() + Send>,
}

/// The table of active bidirectional bindings.
///
/// A pair of values can be bound at most once at a time. [`ObservableValue::bind`] and friends use the
/// process-wide instance returned by [`BindingRegistry::global`]; a separate registry can be created with
/// [`BindingRegistry::new`] when bindings should be tracked independently, e.g. in tests.
pub struct BindingRegistry {
    bindings: Mutex<HashMap<BindingKey, BindingEntry>>,
}

impl Default for BindingRegistry {
    fn default() -> Self { Self::new() }
}

impl std::fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingRegistry").field("bindings", &self.len()).finish()
    }
}

impl BindingRegistry {
    pub fn new() -> Self { Self { bindings: Mutex::new(HashMap::new()) } }

    /// The process-wide registry, created on first use
    pub fn global() -> &'static BindingRegistry { &GLOBAL_REGISTRY }

    pub fn len(&self) -> usize { lock::lock(&self.bindings).len() }

    pub fn is_empty(&self) -> bool { lock::lock(&self.bindings).is_empty() }

    pub fn is_bound<T>(&self, a: &ObservableValue<T>, b: &ObservableValue<T>) -> bool {
        lock::lock(&self.bindings).contains_key(&BindingKey::new(a.id(), b.id()))
    }

    /// Binds `a` and `b` so that a change on either side is applied to the other, then gives `a` the value of `b`.
    ///
    /// With `notify_change` false the initial value is copied into `a` without notifying anyone. With
    /// `notify_change` true it is applied with [`ObservableValue::set`], so `a`'s listeners see the change.
    ///
    /// Fails with [`BindError::AlreadyBound`] if the pair is already bound (in either order), leaving the
    /// existing binding in place, and with [`BindError::SelfBinding`] if `a` and `b` are the same value.
    pub fn bind<T>(&self, a: &ObservableValue<T>, b: &ObservableValue<T>, notify_change: bool) -> Result<(), BindError>
    where T: Send + Sync + 'static {
        if a.ptr_eq(b) {
            debug!("rejected binding {} to itself", a.id());
            return Err(BindError::SelfBinding);
        }

        let binder = Arc::new(Binder::new());
        let a_listener: Arc<dyn ChangeListener<T>> = {
            let binder = binder.clone();
            let b = b.clone();
            Arc::new(move |source: &ObservableValue<T>, _: &ValueChange<T>| binder.propagate(Side::A, source, &b))
        };
        let b_listener: Arc<dyn ChangeListener<T>> = {
            let binder = binder.clone();
            let a = a.clone();
            Arc::new(move |source: &ObservableValue<T>, _: &ValueChange<T>| binder.propagate(Side::B, source, &a))
        };

        {
            let mut bindings = lock::lock(&self.bindings);
            let entry = match bindings.entry(BindingKey::new(a.id(), b.id())) {
                Entry::Occupied(_) => {
                    debug!("rejected binding {} <-> {}: already bound", a.id(), b.id());
                    return Err(BindError::AlreadyBound);
                }
                Entry::Vacant(entry) => entry,
            };

            // Listeners are installed inside the critical section so that a concurrent unbind of this
            // pair can never run before they exist.
            a.add_change_listener(a_listener.clone());
            b.add_change_listener(b_listener.clone());

            let (a, b) = (a.clone(), b.clone());
            entry.insert(BindingEntry {
                detach: Box::new(move || {
                    a.remove_change_listener(&a_listener);
                    b.remove_change_listener(&b_listener);
                }),
            });
        }
        debug!("bound {} <-> {}", a.id(), b.id());

        // Outside the lock: set() runs listeners, which may bind or unbind
        if notify_change {
            a.set(b.get());
        } else {
            a.set_silently(b.get());
        }
        Ok(())
    }

    /// Removes the binding between `a` and `b`, if any. Returns true if a binding was removed.
    pub fn unbind<T>(&self, a: &ObservableValue<T>, b: &ObservableValue<T>) -> bool {
        let removed = lock::lock(&self.bindings).remove(&BindingKey::new(a.id(), b.id()));
        match removed {
            Some(entry) => {
                // Dropping the entry may drop the last handle to a value, so this happens after the lock is released
                (entry.detach)();
                debug!("unbound {} <-> {}", a.id(), b.id());
                true
            }
            None => {
                trace!("unbind {} <-> {}: not bound", a.id(), b.id());
                false
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum BindState {
    Idle = 0,
    /// A change on side A is being applied to side B; B's resulting notification is an echo
    SuppressingFromA = 1,
    /// A change on side B is being applied to side A; A's resulting notification is an echo
    SuppressingFromB = 2,
}

impl Side {
    fn suppressing(self) -> BindState {
        match self {
            Side::A => BindState::SuppressingFromA,
            Side::B => BindState::SuppressingFromB,
        }
    }

    fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Echo suppression for one binding. Each binding owns its own state, so bindings never affect each other.
struct Binder {
    state: AtomicU8,
}

impl Binder {
    fn new() -> Self { Self { state: AtomicU8::new(BindState::Idle as u8) } }

    #[cfg(test)]
    fn state(&self) -> BindState {
        match self.state.load(Ordering::Acquire) {
            1 => BindState::SuppressingFromA,
            2 => BindState::SuppressingFromB,
            _ => BindState::Idle,
        }
    }

    fn transition(&self, from: BindState, to: BindState) -> Result<(), u8> {
        self.state.compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire).map(|_| ())
    }

    /// Called when `source` (on side `from`) has changed. Applies its current value to `target` unless
    /// the change is the echo of a propagation that started on the other side.
    fn propagate<T>(&self, from: Side, source: &ObservableValue<T>, target: &ObservableValue<T>) {
        let mine = from.suppressing();
        let theirs = from.other().suppressing();
        match self.transition(BindState::Idle, mine) {
            Ok(()) => {
                // If target doesn't actually change there is no echo to consume the state, and a panicking
                // listener on target may unwind before the echo arrives. Either way the state goes back to Idle.
                let _reset = ResetOnDrop { binder: self, state: mine };
                // Send the current value rather than the notified one so a late echo cannot reapply a stale value
                target.set(source.get());
            }
            Err(state) if state == theirs as u8 => {
                let _ = self.transition(theirs, BindState::Idle);
                trace!("suppressed echo on {}", source.id());
            }
            Err(_) => {
                // This side was set again while its own propagation is still running
                target.set(source.get());
            }
        }
    }
}

/// Returns a binder to `Idle` when dropped, unless its state has already moved on from `state`
struct ResetOnDrop<'a> {
    binder: &'a Binder,
    state: BindState,
}

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) { let _ = self.binder.transition(self.state, BindState::Idle); }
}
