use std::sync::{Arc, RwLock, RwLockWriteGuard};

use tracing::trace;

use crate::{
    change::{ChangeKind, CollectionChange},
    container::Container,
    cursor::Cursor,
    listener::{ListenerGuard, ListenerSet},
    lock,
};

/// A listener notified with the batch of changes produced by one mutation of an [`ObservableCollection`].
pub trait CollectionChangeListener<E, C>: Send + Sync {
    fn on_change(&self, source: &ObservableCollection<E, C>, changes: &[CollectionChange<E>]);
}

impl<E, C, F> CollectionChangeListener<E, C> for F
where F: Fn(&ObservableCollection<E, C>, &[CollectionChange<E>]) + Send + Sync
{
    fn on_change(&self, source: &ObservableCollection<E, C>, changes: &[CollectionChange<E>]) { self(source, changes) }
}

/// Trait for types that can be subscribed to an [`ObservableCollection`] with [`ObservableCollection::subscribe`].
pub trait IntoCollectionListener<E, C> {
    fn into_collection_listener(self) -> Arc<dyn CollectionChangeListener<E, C>>;
}

impl<F, E, C> IntoCollectionListener<E, C> for F
where
    F: Fn(Vec<CollectionChange<E>>) + Send + Sync + 'static,
    E: Clone + 'static,
    C: 'static,
{
    fn into_collection_listener(self) -> Arc<dyn CollectionChangeListener<E, C>> {
        Arc::new(move |_: &ObservableCollection<E, C>, changes: &[CollectionChange<E>]| self(changes.to_vec()))
    }
}

impl<E, C> IntoCollectionListener<E, C> for Arc<dyn CollectionChangeListener<E, C>> {
    fn into_collection_listener(self) -> Arc<dyn CollectionChangeListener<E, C>> { self }
}

impl<E, C> IntoCollectionListener<E, C> for std::sync::mpsc::Sender<Vec<CollectionChange<E>>>
where
    E: Clone + Send + 'static,
    C: 'static,
{
    fn into_collection_listener(self) -> Arc<dyn CollectionChangeListener<E, C>> {
        Arc::new(move |_: &ObservableCollection<E, C>, changes: &[CollectionChange<E>]| {
            let _ = self.send(changes.to_vec()); // Ignore send errors
        })
    }
}

#[cfg(feature = "tokio")]
impl<E, C> IntoCollectionListener<E, C> for tokio::sync::mpsc::UnboundedSender<Vec<CollectionChange<E>>>
where
    E: Clone + Send + 'static,
    C: 'static,
{
    fn into_collection_listener(self) -> Arc<dyn CollectionChangeListener<E, C>> {
        Arc::new(move |_: &ObservableCollection<E, C>, changes: &[CollectionChange<E>]| {
            let _ = self.send(changes.to_vec()); // Ignore send errors
        })
    }
}

struct Inner<E, C> {
    container: RwLock<C>,
    listeners: ListenerSet<dyn CollectionChangeListener<E, C>>,
}

/// Wraps a container and notifies listeners of every element added to or removed from it.
///
/// Each mutating call applies the mutation to the container first and, only if the container actually
/// changed, sends one batch describing exactly the elements that were added or removed. Listeners run on
/// the mutating thread after the container lock has been released, so they may read the collection.
///
/// The collection owns its container, so there is no way to change it behind the listeners' back.
/// Cloning an `ObservableCollection` yields another handle to the same collection.
///
/// ```rust
/// use reactive_observables::*;
///
/// let numbers = ObservableCollection::new(vec![1, 2, 3]);
/// let _guard = numbers.subscribe(|changes: Vec<CollectionChange<i32>>| println!("{changes:?}"));
///
/// numbers.remove_all(&[2, 4]); // one batch: Remove(2)
/// numbers.remove_all(&[9]); // nothing removed, no notification
/// ```
pub struct ObservableCollection<E, C = Vec<E>>(Arc<Inner<E, C>>);

impl<E, C> Clone for ObservableCollection<E, C> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<E, C: std::fmt::Debug> std::fmt::Debug for ObservableCollection<E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableCollection")
            .field("container", &*lock::read(&self.0.container))
            .field("listeners", &self.0.listeners.len())
            .finish()
    }
}

/// Two collections are equal when their containers are equal
impl<E, C: PartialEq> PartialEq for ObservableCollection<E, C> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *lock::read(&self.0.container) == *lock::read(&other.0.container)
    }
}

impl<E: PartialEq> From<Vec<E>> for ObservableCollection<E> {
    fn from(elements: Vec<E>) -> Self { Self::new(elements) }
}

impl<E, C: Container<E>> ObservableCollection<E, C> {
    pub fn new(container: C) -> Self { Self(Arc::new(Inner { container: RwLock::new(container), listeners: ListenerSet::new() })) }

    pub fn len(&self) -> usize { lock::read(&self.0.container).len() }

    pub fn is_empty(&self) -> bool { lock::read(&self.0.container).is_empty() }

    pub fn contains(&self, value: &E) -> bool { lock::read(&self.0.container).contains(value) }

    pub fn contains_all<'a, I>(&self, values: I) -> bool
    where
        I: IntoIterator<Item = &'a E>,
        E: 'a,
    {
        let values: Vec<&E> = values.into_iter().collect();
        let container = lock::read(&self.0.container);
        values.into_iter().all(|value| container.contains(value))
    }

    /// Calls `f` with a borrow of the wrapped container.
    ///
    /// `f` runs under the container's read lock and must not mutate this collection.
    pub fn with<R>(&self, f: impl FnOnce(&C) -> R) -> R { f(&lock::read(&self.0.container)) }

    pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.0, &other.0) }

    pub fn add_change_listener(&self, listener: Arc<dyn CollectionChangeListener<E, C>>) { self.0.listeners.insert(listener); }

    pub fn remove_change_listener(&self, listener: &Arc<dyn CollectionChangeListener<E, C>>) { self.0.listeners.remove(listener); }

    pub fn listener_count(&self) -> usize { self.0.listeners.len() }

    /// Removes one element equal to `value`. Notifies a single `Remove` with the element actually removed.
    pub fn remove(&self, value: &E) -> bool {
        let removed = lock::write(&self.0.container).remove(value);
        match removed {
            Some(element) => {
                self.fire(vec![CollectionChange::remove(element)]);
                true
            }
            None => false,
        }
    }

    /// Removes one occurrence of each of `values`. Notifies one batch holding exactly the removed elements,
    /// or nothing if none were present. Returns true if anything was removed.
    pub fn remove_all<'a, I>(&self, values: I) -> bool
    where
        I: IntoIterator<Item = &'a E>,
        E: 'a,
    {
        let values: Vec<&E> = values.into_iter().collect();
        let removed: Vec<E> = {
            let mut container = lock::write(&self.0.container);
            values.into_iter().filter_map(|value| container.remove(value)).collect()
        };
        self.fire_removed(removed)
    }

    /// Removes every element for which `keep` returns false, notifying one batch for all of them.
    ///
    /// `keep` runs under the container's write lock and must not access this collection.
    pub fn retain(&self, mut keep: impl FnMut(&E) -> bool) -> bool {
        let removed = lock::write(&self.0.container).retain_with(&mut keep);
        self.fire_removed(removed)
    }

    /// Removes every element not present in `reference`, notifying one batch for all of them
    pub fn retain_all(&self, reference: &[E]) -> bool
    where E: PartialEq {
        self.retain(|element| reference.contains(element))
    }

    fn fire_removed(&self, removed: Vec<E>) -> bool {
        if removed.is_empty() {
            return false;
        }
        self.fire(CollectionChange::batch(ChangeKind::Remove, removed));
        true
    }

    pub(crate) fn write_container(&self) -> RwLockWriteGuard<'_, C> { lock::write(&self.0.container) }

    /// Removes the element a cursor yielded at `position`, notifying a single `Remove`
    pub(crate) fn remove_visited(&self, position: usize, value: &E) -> bool {
        let removed = lock::write(&self.0.container).remove_visited(position, value);
        match removed {
            Some(element) => {
                self.fire(vec![CollectionChange::remove(element)]);
                true
            }
            None => false,
        }
    }

    /// Sends a batch to every listener. Empty batches are dropped.
    pub(crate) fn fire(&self, changes: Vec<CollectionChange<E>>) {
        if changes.is_empty() {
            return;
        }
        trace!("firing {} collection change(s)", changes.len());
        self.0.listeners.notify(|listener| listener.on_change(self, &changes));
    }
}

impl<E: Clone, C: Container<E>> ObservableCollection<E, C> {
    /// Adds an element. Notifies a single `Add` if the container accepted it.
    pub fn add(&self, value: E) -> bool {
        let added = lock::write(&self.0.container).insert(value.clone());
        if added {
            self.fire(vec![CollectionChange::add(value)]);
        }
        added
    }

    /// Adds every element of `values`. Notifies one batch with an `Add` per accepted element, in order.
    /// Returns true if the container changed.
    pub fn add_all(&self, values: impl IntoIterator<Item = E>) -> bool {
        // collected up front so that a caller's iterator never runs under our lock
        let values: Vec<E> = values.into_iter().collect();
        let added: Vec<CollectionChange<E>> = {
            let mut container = lock::write(&self.0.container);
            values.into_iter().filter(|value| container.insert(value.clone())).map(CollectionChange::add).collect()
        };
        let changed = !added.is_empty();
        self.fire(added);
        changed
    }

    /// Removes every element. Notifies one batch with a `Remove` for each element that was present.
    pub fn clear(&self) {
        let changes = {
            let mut container = lock::write(&self.0.container);
            let changes: Vec<CollectionChange<E>> = container.elements().cloned().map(CollectionChange::remove).collect();
            container.clear();
            changes
        };
        self.fire(changes);
    }

    /// Returns a copy of the elements in iteration order
    pub fn to_vec(&self) -> Vec<E> { lock::read(&self.0.container).elements().cloned().collect() }

    /// Returns a cursor over a snapshot of the elements, whose [`Cursor::remove`] removes from this collection
    pub fn cursor(&self) -> Cursor<E, C> { Cursor::new(self.clone()) }
}

impl<E: 'static, C: 'static> ObservableCollection<E, C> {
    /// Subscribes to change batches. The listener is unregistered when the returned guard is dropped.
    pub fn subscribe<L>(&self, listener: L) -> ListenerGuard
    where L: IntoCollectionListener<E, C> {
        self.0.listeners.subscribe(listener.into_collection_listener())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    type Batches = Arc<Mutex<Vec<Vec<(ChangeKind, i32)>>>>;

    fn record<C: Container<i32> + 'static>(collection: &ObservableCollection<i32, C>) -> (ListenerGuard, Batches) {
        let batches: Batches = Arc::new(Mutex::new(Vec::new()));
        let guard = {
            let batches = batches.clone();
            collection.subscribe(move |changes: Vec<CollectionChange<i32>>| {
                batches.lock().unwrap().push(changes.iter().map(|c| (c.kind(), *c.value())).collect());
            })
        };
        (guard, batches)
    }

    #[test]
    fn test_set_container_rejects_duplicate_add() {
        let set = ObservableCollection::new(HashSet::from([1]));
        let (_guard, batches) = record(&set);

        assert!(!set.add(1));
        assert!(set.add(2));
        assert_eq!(*batches.lock().unwrap(), vec![vec![(ChangeKind::Add, 2)]]);
    }

    #[test]
    fn test_add_all_reports_only_accepted_elements() {
        let set = ObservableCollection::new(HashSet::from([2]));
        let (_guard, batches) = record(&set);

        assert!(set.add_all([1, 2, 3]));
        assert!(!set.add_all([1, 2]));
        assert_eq!(*batches.lock().unwrap(), vec![vec![(ChangeKind::Add, 1), (ChangeKind::Add, 3)]]);
    }

    #[test]
    fn test_retain_batches_removed_elements() {
        let list = ObservableCollection::new(vec![1, 2, 3, 4]);
        let (_guard, batches) = record(&list);

        assert!(list.retain_all(&[2, 4, 6]));
        assert!(!list.retain_all(&[2, 4]));
        assert_eq!(list.to_vec(), vec![2, 4]);
        assert_eq!(*batches.lock().unwrap(), vec![vec![(ChangeKind::Remove, 1), (ChangeKind::Remove, 3)]]);
    }

    #[test]
    fn test_clear_on_empty_collection_is_silent() {
        let list = ObservableCollection::<i32>::new(Vec::new());
        let (_guard, batches) = record(&list);
        list.clear();
        assert!(batches.lock().unwrap().is_empty());
    }

    #[test]
    fn test_listener_can_read_source() {
        let list = ObservableCollection::new(vec![1]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let listener: Arc<dyn CollectionChangeListener<i32, Vec<i32>>> = {
            let seen = seen.clone();
            Arc::new(move |source: &ObservableCollection<i32, Vec<i32>>, _: &[CollectionChange<i32>]| {
                seen.lock().unwrap().push(source.len());
            })
        };
        list.add_change_listener(listener.clone());
        list.add(2);
        list.remove_change_listener(&listener);
        list.add(3);
        assert_eq!(*seen.lock().unwrap(), vec![2]);
    }

    #[test]
    fn test_equality_compares_containers() {
        let a = ObservableCollection::new(vec![1, 2]);
        let b = ObservableCollection::new(vec![1, 2]);
        assert_eq!(a, b);
        b.add(3);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }
}
