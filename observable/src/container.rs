use std::collections::{BTreeSet, HashSet, VecDeque};
use std::hash::{BuildHasher, Hash};
use std::ops::Range;

use crate::error::ContainerError;

/// Storage wrapped by an [`ObservableCollection`](crate::ObservableCollection).
///
/// Implementations report what actually happened (whether an element was accepted, which element was
/// removed) so the wrapper can describe the mutation exactly.
pub trait Container<E> {
    /// Adds an element. Returns false if the container rejected it (e.g. a duplicate in a set).
    fn insert(&mut self, value: E) -> bool;

    /// Removes one element equal to `value`, returning the removed element
    fn remove(&mut self, value: &E) -> Option<E>;

    fn contains(&self, value: &E) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool { self.len() == 0 }

    fn clear(&mut self);

    fn elements(&self) -> Box<dyn Iterator<Item = &E> + '_>;

    /// Removes every element for which `keep` returns false and returns the removed elements in iteration order
    fn retain_with(&mut self, keep: &mut dyn FnMut(&E) -> bool) -> Vec<E>;

    /// Removes the element a cursor just visited, which was yielded at iteration `position`.
    /// Containers without stable positions remove by value.
    fn remove_visited(&mut self, position: usize, value: &E) -> Option<E> {
        let _ = position;
        self.remove(value)
    }
}

/// A container with positional access
pub trait SequenceContainer<E>: Container<E> {
    fn get(&self, index: usize) -> Option<&E>;

    /// Replaces the element at `index`, returning the previous one
    fn replace(&mut self, index: usize, value: E) -> Result<E, ContainerError>;

    fn insert_at(&mut self, index: usize, value: E) -> Result<(), ContainerError>;

    fn remove_at(&mut self, index: usize) -> Result<E, ContainerError>;

    /// Inserts `values` starting at `index`, preserving their order
    fn insert_all_at(&mut self, index: usize, values: Vec<E>) -> Result<(), ContainerError>;

    fn index_of(&self, value: &E) -> Option<usize>;

    fn last_index_of(&self, value: &E) -> Option<usize>;

    fn check_range(&self, range: &Range<usize>) -> Result<(), ContainerError> {
        let len = self.len();
        if range.start > range.end || range.end > len {
            return Err(ContainerError::InvalidRange { start: range.start, end: range.end, len });
        }
        Ok(())
    }
}

fn check_index(index: usize, len: usize) -> Result<(), ContainerError> {
    if index < len { Ok(()) } else { Err(ContainerError::IndexOutOfBounds { index, len }) }
}

// insertion may target one past the end
fn check_insert_index(index: usize, len: usize) -> Result<(), ContainerError> {
    if index <= len { Ok(()) } else { Err(ContainerError::IndexOutOfBounds { index, len }) }
}

fn partition_out<C, E>(container: &mut C, keep: &mut dyn FnMut(&E) -> bool) -> Vec<E>
where C: Default + IntoIterator<Item = E> + FromIterator<E> {
    let (kept, removed): (Vec<E>, Vec<E>) = std::mem::take(container).into_iter().partition(|e| keep(e));
    *container = kept.into_iter().collect();
    removed
}

impl<E: PartialEq> Container<E> for Vec<E> {
    fn insert(&mut self, value: E) -> bool {
        self.push(value);
        true
    }

    fn remove(&mut self, value: &E) -> Option<E> {
        let index = self.iter().position(|e| e == value)?;
        Some(Vec::remove(self, index))
    }

    fn contains(&self, value: &E) -> bool { self.as_slice().contains(value) }

    fn len(&self) -> usize { Vec::len(self) }

    fn clear(&mut self) { Vec::clear(self) }

    fn elements(&self) -> Box<dyn Iterator<Item = &E> + '_> { Box::new(self.iter()) }

    fn retain_with(&mut self, keep: &mut dyn FnMut(&E) -> bool) -> Vec<E> { partition_out(self, keep) }

    fn remove_visited(&mut self, position: usize, value: &E) -> Option<E> {
        if self.as_slice().get(position) == Some(value) { Some(Vec::remove(self, position)) } else { Container::remove(self, value) }
    }
}

impl<E: PartialEq> SequenceContainer<E> for Vec<E> {
    fn get(&self, index: usize) -> Option<&E> { self.as_slice().get(index) }

    fn replace(&mut self, index: usize, value: E) -> Result<E, ContainerError> {
        check_index(index, Vec::len(self))?;
        Ok(std::mem::replace(&mut self[index], value))
    }

    fn insert_at(&mut self, index: usize, value: E) -> Result<(), ContainerError> {
        check_insert_index(index, Vec::len(self))?;
        Vec::insert(self, index, value);
        Ok(())
    }

    fn remove_at(&mut self, index: usize) -> Result<E, ContainerError> {
        check_index(index, Vec::len(self))?;
        Ok(Vec::remove(self, index))
    }

    fn insert_all_at(&mut self, index: usize, values: Vec<E>) -> Result<(), ContainerError> {
        check_insert_index(index, Vec::len(self))?;
        let tail = self.split_off(index);
        self.extend(values);
        self.extend(tail);
        Ok(())
    }

    fn index_of(&self, value: &E) -> Option<usize> { self.iter().position(|e| e == value) }

    fn last_index_of(&self, value: &E) -> Option<usize> { self.iter().rposition(|e| e == value) }
}

impl<E: PartialEq> Container<E> for VecDeque<E> {
    fn insert(&mut self, value: E) -> bool {
        self.push_back(value);
        true
    }

    fn remove(&mut self, value: &E) -> Option<E> {
        let index = self.iter().position(|e| e == value)?;
        VecDeque::remove(self, index)
    }

    fn contains(&self, value: &E) -> bool { VecDeque::contains(self, value) }

    fn len(&self) -> usize { VecDeque::len(self) }

    fn clear(&mut self) { VecDeque::clear(self) }

    fn elements(&self) -> Box<dyn Iterator<Item = &E> + '_> { Box::new(self.iter()) }

    fn retain_with(&mut self, keep: &mut dyn FnMut(&E) -> bool) -> Vec<E> { partition_out(self, keep) }

    fn remove_visited(&mut self, position: usize, value: &E) -> Option<E> {
        if VecDeque::get(self, position) == Some(value) { VecDeque::remove(self, position) } else { Container::remove(self, value) }
    }
}

impl<E: PartialEq> SequenceContainer<E> for VecDeque<E> {
    fn get(&self, index: usize) -> Option<&E> { VecDeque::get(self, index) }

    fn replace(&mut self, index: usize, value: E) -> Result<E, ContainerError> {
        let len = VecDeque::len(self);
        let slot = VecDeque::get_mut(self, index).ok_or(ContainerError::IndexOutOfBounds { index, len })?;
        Ok(std::mem::replace(slot, value))
    }

    fn insert_at(&mut self, index: usize, value: E) -> Result<(), ContainerError> {
        check_insert_index(index, VecDeque::len(self))?;
        VecDeque::insert(self, index, value);
        Ok(())
    }

    fn remove_at(&mut self, index: usize) -> Result<E, ContainerError> {
        let len = VecDeque::len(self);
        VecDeque::remove(self, index).ok_or(ContainerError::IndexOutOfBounds { index, len })
    }

    fn insert_all_at(&mut self, index: usize, values: Vec<E>) -> Result<(), ContainerError> {
        check_insert_index(index, VecDeque::len(self))?;
        for (offset, value) in values.into_iter().enumerate() {
            VecDeque::insert(self, index + offset, value);
        }
        Ok(())
    }

    fn index_of(&self, value: &E) -> Option<usize> { self.iter().position(|e| e == value) }

    fn last_index_of(&self, value: &E) -> Option<usize> { self.iter().rposition(|e| e == value) }
}

impl<E: Eq + Hash, S: BuildHasher + Default> Container<E> for HashSet<E, S> {
    fn insert(&mut self, value: E) -> bool { HashSet::insert(self, value) }

    fn remove(&mut self, value: &E) -> Option<E> { self.take(value) }

    fn contains(&self, value: &E) -> bool { HashSet::contains(self, value) }

    fn len(&self) -> usize { HashSet::len(self) }

    fn clear(&mut self) { HashSet::clear(self) }

    fn elements(&self) -> Box<dyn Iterator<Item = &E> + '_> { Box::new(self.iter()) }

    fn retain_with(&mut self, keep: &mut dyn FnMut(&E) -> bool) -> Vec<E> { partition_out(self, keep) }
}

impl<E: Ord> Container<E> for BTreeSet<E> {
    fn insert(&mut self, value: E) -> bool { BTreeSet::insert(self, value) }

    fn remove(&mut self, value: &E) -> Option<E> { self.take(value) }

    fn contains(&self, value: &E) -> bool { BTreeSet::contains(self, value) }

    fn len(&self) -> usize { BTreeSet::len(self) }

    fn clear(&mut self) { BTreeSet::clear(self) }

    fn elements(&self) -> Box<dyn Iterator<Item = &E> + '_> { Box::new(self.iter()) }

    fn retain_with(&mut self, keep: &mut dyn FnMut(&E) -> bool) -> Vec<E> { partition_out(self, keep) }
}
