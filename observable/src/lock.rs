use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

// Listeners never run while one of these guards is held, so a poisoned lock can only come from a panic
// inside container code (e.g. a user PartialEq). The protected data is still structurally valid.

pub(crate) fn read<T: ?Sized>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> { lock.read().unwrap_or_else(PoisonError::into_inner) }

pub(crate) fn write<T: ?Sized>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> { lock.write().unwrap_or_else(PoisonError::into_inner) }

pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> { mutex.lock().unwrap_or_else(PoisonError::into_inner) }
