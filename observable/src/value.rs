use std::sync::{Arc, RwLock};

use crate::{
    binder::BindingRegistry,
    change::{Slot, ValueChange, same_slot},
    error::BindError,
    listener::{ListenerGuard, ListenerSet},
    lock,
};

/// A listener notified when an [`ObservableValue`] changes.
pub trait ChangeListener<T>: Send + Sync {
    fn on_change(&self, source: &ObservableValue<T>, change: &ValueChange<T>);
}

impl<T, F> ChangeListener<T> for F
where F: Fn(&ObservableValue<T>, &ValueChange<T>) + Send + Sync
{
    fn on_change(&self, source: &ObservableValue<T>, change: &ValueChange<T>) { self(source, change) }
}

/// Trait for types that can be subscribed to an [`ObservableValue`] with [`ObservableValue::subscribe`].
pub trait IntoChangeListener<T> {
    fn into_change_listener(self) -> Arc<dyn ChangeListener<T>>;
}

impl<F, T> IntoChangeListener<T> for F
where
    F: Fn(ValueChange<T>) + Send + Sync + 'static,
    T: 'static,
{
    fn into_change_listener(self) -> Arc<dyn ChangeListener<T>> {
        Arc::new(move |_: &ObservableValue<T>, change: &ValueChange<T>| self(change.clone()))
    }
}

impl<T> IntoChangeListener<T> for Arc<dyn ChangeListener<T>> {
    fn into_change_listener(self) -> Arc<dyn ChangeListener<T>> { self }
}

impl<T> IntoChangeListener<T> for std::sync::mpsc::Sender<ValueChange<T>>
where T: Send + Sync + 'static
{
    fn into_change_listener(self) -> Arc<dyn ChangeListener<T>> {
        Arc::new(move |_: &ObservableValue<T>, change: &ValueChange<T>| {
            let _ = self.send(change.clone()); // Ignore send errors
        })
    }
}

#[cfg(feature = "tokio")]
impl<T> IntoChangeListener<T> for tokio::sync::mpsc::UnboundedSender<ValueChange<T>>
where T: Send + Sync + 'static
{
    fn into_change_listener(self) -> Arc<dyn ChangeListener<T>> {
        Arc::new(move |_: &ObservableValue<T>, change: &ValueChange<T>| {
            let _ = self.send(change.clone()); // Ignore send errors
        })
    }
}

/// Identity of an observable value, used to key bindings
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ValueId(usize);

impl std::fmt::Display for ValueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{:#x}", self.0) }
}

struct Inner<T> {
    slot: RwLock<Slot<T>>,
    listeners: ListenerSet<dyn ChangeListener<T>>,
}

/// A single value slot which notifies its listeners whenever the value is replaced.
///
/// Change detection is by identity, not equality: setting a different `Arc` holding an equal
/// value is a change, setting the same `Arc` again is not.
///
/// Cloning an `ObservableValue` yields another handle to the same slot.
///
/// ```rust
/// use reactive_observables::*;
/// use std::sync::Arc;
///
/// let name = ObservableValue::<String>::with_value("Buffy".to_string());
/// let _guard = name.subscribe(|change: ValueChange<String>| println!("{:?} -> {:?}", change.old, change.new));
///
/// let willow = Arc::new("Willow".to_string());
/// name.set(willow.clone()); // notifies
/// name.set(willow); // same allocation, no notification
/// ```
pub struct ObservableValue<T>(Arc<Inner<T>>);

impl<T> Clone for ObservableValue<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> Default for ObservableValue<T> {
    fn default() -> Self { Self::new() }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ObservableValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableValue").field("value", &*lock::read(&self.0.slot)).field("listeners", &self.0.listeners.len()).finish()
    }
}

impl<T> ObservableValue<T> {
    /// Creates an observable with no value
    pub fn new() -> Self { Self::from_slot(None) }

    pub fn with_value(value: impl Into<Arc<T>>) -> Self { Self::from_slot(Some(value.into())) }

    fn from_slot(slot: Slot<T>) -> Self { Self(Arc::new(Inner { slot: RwLock::new(slot), listeners: ListenerSet::new() })) }

    pub fn id(&self) -> ValueId { ValueId(Arc::as_ptr(&self.0) as usize) }

    /// True if both handles refer to the same observable
    pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.0, &other.0) }

    /// Returns the current value. The returned `Arc` is the one that was set.
    pub fn get(&self) -> Slot<T> { lock::read(&self.0.slot).clone() }

    /// Replaces the value and notifies listeners, unless `value` is the allocation already held.
    ///
    /// Listeners run on the calling thread after the slot has been updated, with no lock held.
    pub fn set(&self, value: impl Into<Slot<T>>) {
        let new = value.into();
        let old = {
            let mut slot = lock::write(&self.0.slot);
            if same_slot(&slot, &new) {
                return;
            }
            std::mem::replace(&mut *slot, new.clone())
        };
        self.fire(ValueChange::new(old, new));
    }

    /// Wraps `value` in a fresh `Arc` and sets it. Always notifies.
    pub fn set_value(&self, value: T) { self.set(Arc::new(value)) }

    /// Replaces the value without notifying anyone
    pub(crate) fn set_silently(&self, value: Slot<T>) { *lock::write(&self.0.slot) = value; }

    pub fn add_change_listener(&self, listener: Arc<dyn ChangeListener<T>>) { self.0.listeners.insert(listener); }

    pub fn remove_change_listener(&self, listener: &Arc<dyn ChangeListener<T>>) { self.0.listeners.remove(listener); }

    pub fn listener_count(&self) -> usize { self.0.listeners.len() }

    fn fire(&self, change: ValueChange<T>) { self.0.listeners.notify(|listener| listener.on_change(self, &change)); }
}

impl<T: 'static> ObservableValue<T> {
    /// Subscribes to changes. The listener is unregistered when the returned guard is dropped.
    pub fn subscribe<L>(&self, listener: L) -> ListenerGuard
    where L: IntoChangeListener<T> {
        self.0.listeners.subscribe(listener.into_change_listener())
    }
}

impl<T: Send + Sync + 'static> ObservableValue<T> {
    /// Binds this value to `other` without notifying this value's listeners of the initial sync.
    ///
    /// See [`ObservableValue::bind_with`].
    pub fn bind(&self, other: &ObservableValue<T>) -> Result<(), BindError> { self.bind_with(other, false) }

    /// Binds this value to `other` with a bidirectional link: a change on either side is applied to the other.
    ///
    /// When the binding is made, this value takes the value of `other`. If `notify_change` is false the
    /// value is copied directly and no listener on either side is notified.
    pub fn bind_with(&self, other: &ObservableValue<T>, notify_change: bool) -> Result<(), BindError> {
        BindingRegistry::global().bind(self, other, notify_change)
    }

    /// Removes the binding between this value and `other`, if there is one. Returns true if a binding was removed.
    pub fn unbind(&self, other: &ObservableValue<T>) -> bool { BindingRegistry::global().unbind(self, other) }

    pub fn is_bound_to(&self, other: &ObservableValue<T>) -> bool { BindingRegistry::global().is_bound(self, other) }
}

impl<T> From<Arc<T>> for ObservableValue<T> {
    fn from(value: Arc<T>) -> Self { Self::from_slot(Some(value)) }
}
