use std::ops::{Deref, Range};

use crate::{
    change::{ChangeKind, CollectionChange},
    collection::ObservableCollection,
    container::SequenceContainer,
    cursor::ListCursor,
    error::ContainerError,
};

/// An [`ObservableCollection`] over a sequence, adding positional operations.
///
/// All of the collection operations are available through `Deref`. Positional mutations follow the
/// same rule: the container is changed first, then one batch is sent. An out-of-range index is
/// reported as a [`ContainerError`] and nothing is sent.
///
/// ```rust
/// use reactive_observables::*;
///
/// let list = ObservableList::new(vec!['a', 'c']);
/// list.insert(1, 'b').unwrap(); // Add('b')
/// assert_eq!(list.set(2, 'd'), Ok('c')); // Remove('c'), Add('d')
/// assert_eq!(list.to_vec(), vec!['a', 'b', 'd']);
/// assert!(list.remove_at(5).is_err()); // no notification
/// ```
pub struct ObservableList<E, C = Vec<E>>(ObservableCollection<E, C>);

impl<E, C> Clone for ObservableList<E, C> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<E, C> Deref for ObservableList<E, C> {
    type Target = ObservableCollection<E, C>;
    fn deref(&self) -> &Self::Target { &self.0 }
}

impl<E, C: std::fmt::Debug> std::fmt::Debug for ObservableList<E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_tuple("ObservableList").field(&self.0).finish() }
}

impl<E, C: PartialEq> PartialEq for ObservableList<E, C> {
    fn eq(&self, other: &Self) -> bool { self.0 == other.0 }
}

impl<E: PartialEq> From<Vec<E>> for ObservableList<E> {
    fn from(elements: Vec<E>) -> Self { Self::new(elements) }
}

impl<E, C: SequenceContainer<E>> ObservableList<E, C> {
    pub fn new(container: C) -> Self { Self(ObservableCollection::new(container)) }

    pub fn as_collection(&self) -> &ObservableCollection<E, C> { &self.0 }

    pub fn index_of(&self, value: &E) -> Option<usize> { self.0.with(|container| container.index_of(value)) }

    pub fn last_index_of(&self, value: &E) -> Option<usize> { self.0.with(|container| container.last_index_of(value)) }
}

impl<E: Clone, C: SequenceContainer<E>> ObservableList<E, C> {
    pub fn get(&self, index: usize) -> Option<E> { self.0.with(|container| container.get(index).cloned()) }

    /// Inserts `value` before the element at `index`; `index == len` appends. Notifies one `Add`.
    pub fn insert(&self, index: usize, value: E) -> Result<(), ContainerError> {
        self.0.write_container().insert_at(index, value.clone())?;
        self.0.fire(vec![CollectionChange::add(value)]);
        Ok(())
    }

    /// Removes and returns the element at `index`. Notifies one `Remove`.
    pub fn remove_at(&self, index: usize) -> Result<E, ContainerError> {
        let removed = self.0.write_container().remove_at(index)?;
        self.0.fire(vec![CollectionChange::remove(removed.clone())]);
        Ok(removed)
    }

    /// Replaces the element at `index`, returning the previous one. Notifies `[Remove(old), Add(value)]`.
    pub fn set(&self, index: usize, value: E) -> Result<E, ContainerError> {
        let old = self.0.write_container().replace(index, value.clone())?;
        self.0.fire(vec![CollectionChange::remove(old.clone()), CollectionChange::add(value)]);
        Ok(old)
    }

    /// Inserts all of `values` starting at `index`, in order. Notifies one batch of `Add`s.
    /// Returns true if anything was inserted.
    pub fn insert_all(&self, index: usize, values: impl IntoIterator<Item = E>) -> Result<bool, ContainerError> {
        let values: Vec<E> = values.into_iter().collect();
        if values.is_empty() {
            // still report a bad index
            let len = self.len();
            return if index <= len { Ok(false) } else { Err(ContainerError::IndexOutOfBounds { index, len }) };
        }
        self.0.write_container().insert_all_at(index, values.clone())?;
        self.0.fire(CollectionChange::batch(ChangeKind::Add, values));
        Ok(true)
    }

    /// Copies the elements in `range`. The copy is detached: changing it does not affect this list.
    pub fn sub_list(&self, range: Range<usize>) -> Result<Vec<E>, ContainerError> {
        self.0.with(|container| -> Result<Vec<E>, ContainerError> {
            container.check_range(&range)?;
            Ok(range.filter_map(|index| container.get(index).cloned()).collect())
        })
    }

    /// A bidirectional cursor positioned before the first element
    pub fn list_cursor(&self) -> ListCursor<E, C> { ListCursor::new(self.clone(), 0) }

    /// A bidirectional cursor positioned before the element at `index`; `index == len` is past the end
    pub fn list_cursor_at(&self, index: usize) -> Result<ListCursor<E, C>, ContainerError> {
        let len = self.len();
        if index > len {
            return Err(ContainerError::IndexOutOfBounds { index, len });
        }
        Ok(ListCursor::new(self.clone(), index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    fn record(list: &ObservableList<i32>) -> (crate::ListenerGuard, Arc<Mutex<Vec<Vec<CollectionChange<i32>>>>>) {
        let batches = Arc::new(Mutex::new(Vec::new()));
        let guard = {
            let batches = batches.clone();
            list.subscribe(move |changes: Vec<CollectionChange<i32>>| batches.lock().unwrap().push(changes))
        };
        (guard, batches)
    }

    #[test]
    fn test_set_fires_remove_then_add() {
        let list = ObservableList::from(vec![1, 2, 3]);
        let (_guard, batches) = record(&list);

        assert_eq!(list.set(1, 20), Ok(2));
        assert_eq!(*batches.lock().unwrap(), vec![vec![CollectionChange::remove(2), CollectionChange::add(20)]]);
    }

    #[test]
    fn test_bad_index_fires_nothing() {
        let list = ObservableList::from(vec![1, 2, 3]);
        let (_guard, batches) = record(&list);

        assert_eq!(list.set(3, 0), Err(ContainerError::IndexOutOfBounds { index: 3, len: 3 }));
        assert_eq!(list.insert(4, 0), Err(ContainerError::IndexOutOfBounds { index: 4, len: 3 }));
        assert_eq!(list.remove_at(3), Err(ContainerError::IndexOutOfBounds { index: 3, len: 3 }));
        assert_eq!(list.insert_all(4, [7]), Err(ContainerError::IndexOutOfBounds { index: 4, len: 3 }));
        assert_eq!(list.insert_all(4, Vec::new()), Err(ContainerError::IndexOutOfBounds { index: 4, len: 3 }));
        assert!(batches.lock().unwrap().is_empty());
        assert_eq!(list.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_insert_all_is_one_batch() {
        let list = ObservableList::from(vec![1, 4]);
        let (_guard, batches) = record(&list);

        assert_eq!(list.insert_all(1, [2, 3]), Ok(true));
        assert_eq!(list.insert_all(1, Vec::new()), Ok(false));
        assert_eq!(list.to_vec(), vec![1, 2, 3, 4]);
        assert_eq!(*batches.lock().unwrap(), vec![vec![CollectionChange::add(2), CollectionChange::add(3)]]);
    }

    #[test]
    fn test_sub_list_is_a_detached_copy() {
        let list = ObservableList::from(vec![1, 2, 3, 4]);
        let mut copy = list.sub_list(1..3).unwrap();
        assert_eq!(copy, vec![2, 3]);
        copy.push(9);
        assert_eq!(list.len(), 4);
        assert_eq!(list.sub_list(3..5), Err(ContainerError::InvalidRange { start: 3, end: 5, len: 4 }));
    }

    #[test]
    fn test_positional_reads() {
        let list = ObservableList::new(VecDeque::from([5, 6, 5]));
        assert_eq!(list.get(1), Some(6));
        assert_eq!(list.get(3), None);
        assert_eq!(list.index_of(&5), Some(0));
        assert_eq!(list.last_index_of(&5), Some(2));
        assert_eq!(list.index_of(&7), None);
    }
}
