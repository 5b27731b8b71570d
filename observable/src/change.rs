use std::sync::Arc;

/// The content of an observable value slot. `None` means no value has been set.
pub type Slot<T> = Option<Arc<T>>;

/// True if both slots hold the same allocation (or are both empty). Equal values in distinct allocations are not the same.
pub fn same_slot<T>(a: &Slot<T>, b: &Slot<T>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Add,
    Remove,
}

/// A single element added to or removed from an observable collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionChange<E> {
    kind: ChangeKind,
    value: E,
}

impl<E> CollectionChange<E> {
    pub fn new(kind: ChangeKind, value: E) -> Self { Self { kind, value } }

    pub fn add(value: E) -> Self { Self::new(ChangeKind::Add, value) }

    pub fn remove(value: E) -> Self { Self::new(ChangeKind::Remove, value) }

    pub fn kind(&self) -> ChangeKind { self.kind }

    /// The added element for `Add`, the removed element for `Remove`
    pub fn value(&self) -> &E { &self.value }

    pub fn into_value(self) -> E { self.value }

    /// Builds a batch with one change of the given kind per value, preserving order
    pub fn batch(kind: ChangeKind, values: impl IntoIterator<Item = E>) -> Vec<Self> {
        values.into_iter().map(|value| Self::new(kind, value)).collect()
    }
}

/// The transition of an observable value from `old` to `new`
#[derive(Debug)]
pub struct ValueChange<T> {
    pub old: Slot<T>,
    pub new: Slot<T>,
}

impl<T> Clone for ValueChange<T> {
    fn clone(&self) -> Self { Self { old: self.old.clone(), new: self.new.clone() } }
}

impl<T> ValueChange<T> {
    pub fn new(old: Slot<T>, new: Slot<T>) -> Self { Self { old, new } }
}
