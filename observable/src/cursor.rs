use crate::{
    collection::ObservableCollection,
    container::{Container, SequenceContainer},
    error::ContainerError,
    list::ObservableList,
};

/// Iterates a snapshot of an [`ObservableCollection`] taken when the cursor was created.
///
/// [`Cursor::remove`] removes the most recently returned element from the live collection and notifies
/// a `Remove`. No lock is held between calls.
pub struct Cursor<E, C = Vec<E>> {
    collection: ObservableCollection<E, C>,
    remaining: std::vec::IntoIter<E>,
    // number of yielded elements still in the collection, i.e. the position of the next one
    position: usize,
    current: Option<E>,
}

impl<E: Clone, C: Container<E>> Cursor<E, C> {
    pub(crate) fn new(collection: ObservableCollection<E, C>) -> Self {
        let remaining = collection.to_vec().into_iter();
        Self { collection, remaining, position: 0, current: None }
    }

    pub fn has_next(&self) -> bool { self.remaining.len() > 0 }

    /// Removes the element last returned by [`Iterator::next`] from the collection.
    ///
    /// Fails with [`ContainerError::NoCurrentElement`] before the first call to `next` and after a
    /// previous `remove`. If the element has already been removed by someone else nothing happens.
    pub fn remove(&mut self) -> Result<(), ContainerError> {
        let value = self.current.take().ok_or(ContainerError::NoCurrentElement)?;
        if self.collection.remove_visited(self.position - 1, &value) {
            self.position -= 1;
        }
        Ok(())
    }
}

impl<E: Clone, C: Container<E>> Iterator for Cursor<E, C> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        let value = self.remaining.next()?;
        self.position += 1;
        self.current = Some(value.clone());
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) { self.remaining.size_hint() }
}

/// A bidirectional cursor over an [`ObservableList`].
///
/// The cursor sits between elements: `next` returns the element after it, `previous` the one before.
/// It reads the live list on every step, and every modification goes through the list so listeners are
/// notified exactly as for the equivalent list operation.
pub struct ListCursor<E, C = Vec<E>> {
    list: ObservableList<E, C>,
    cursor: usize,
    // index of the element last returned by next or previous
    current: Option<usize>,
}

impl<E: Clone, C: SequenceContainer<E>> ListCursor<E, C> {
    pub(crate) fn new(list: ObservableList<E, C>, cursor: usize) -> Self { Self { list, cursor, current: None } }

    pub fn has_next(&self) -> bool { self.cursor < self.list.len() }

    pub fn has_previous(&self) -> bool { self.cursor > 0 }

    /// Index of the element a subsequent `next` would return
    pub fn next_index(&self) -> usize { self.cursor }

    /// Index of the element a subsequent `previous` would return, if any
    pub fn previous_index(&self) -> Option<usize> { self.cursor.checked_sub(1) }

    pub fn previous(&mut self) -> Option<E> {
        let index = self.cursor.checked_sub(1)?;
        let value = self.list.get(index)?;
        self.cursor = index;
        self.current = Some(index);
        Some(value)
    }

    /// Removes the element last returned by `next` or `previous`. Notifies one `Remove`.
    pub fn remove(&mut self) -> Result<(), ContainerError> {
        let index = self.current.ok_or(ContainerError::NoCurrentElement)?;
        self.list.remove_at(index)?;
        if index < self.cursor {
            self.cursor -= 1;
        }
        self.current = None;
        Ok(())
    }

    /// Replaces the element last returned by `next` or `previous`. Notifies `[Remove(old), Add(value)]`.
    pub fn set(&mut self, value: E) -> Result<(), ContainerError> {
        let index = self.current.ok_or(ContainerError::NoCurrentElement)?;
        self.list.set(index, value)?;
        Ok(())
    }

    /// Inserts `value` before the cursor, so a following `next` is unaffected. Notifies one `Add`.
    pub fn add(&mut self, value: E) -> Result<(), ContainerError> {
        self.list.insert(self.cursor, value)?;
        self.cursor += 1;
        self.current = None;
        Ok(())
    }
}

impl<E: Clone, C: SequenceContainer<E>> Iterator for ListCursor<E, C> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        let value = self.list.get(self.cursor)?;
        self.current = Some(self.cursor);
        self.cursor += 1;
        Some(value)
    }
}
