use std::sync::{Arc, Mutex};

use reactive_observables::{ChangeKind, CollectionChange, ValueChange};
use tracing::Level;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() { tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init(); }

/// A collection listener plus a function which drains the batches it has received so far
#[allow(unused)]
pub fn change_watcher<E: Clone + Send + 'static>(
) -> (Box<dyn Fn(Vec<CollectionChange<E>>) + Send + Sync>, Box<dyn Fn() -> Vec<Vec<(ChangeKind, E)>> + Send + Sync>) {
    let batches = Arc::new(Mutex::new(Vec::new()));
    let watcher = {
        let batches = batches.clone();
        Box::new(move |changes: Vec<CollectionChange<E>>| {
            batches.lock().unwrap().push(changes);
        })
    };

    let check = Box::new(move || {
        let batches: Vec<Vec<(ChangeKind, E)>> =
            batches.lock().unwrap().drain(..).map(|b: Vec<CollectionChange<E>>| b.into_iter().map(|c| (c.kind(), c.into_value())).collect()).collect();
        batches
    });

    (watcher, check)
}

/// A value listener plus a function which drains the `(old, new)` pairs it has received so far
#[allow(unused)]
pub fn value_watcher<T: Clone + Send + Sync + 'static>(
) -> (Box<dyn Fn(ValueChange<T>) + Send + Sync>, Box<dyn Fn() -> Vec<(Option<T>, Option<T>)> + Send + Sync>) {
    let changes = Arc::new(Mutex::new(Vec::new()));
    let watcher = {
        let changes = changes.clone();
        Box::new(move |change: ValueChange<T>| {
            changes.lock().unwrap().push(change);
        })
    };

    let check = Box::new(move || {
        let changes: Vec<(Option<T>, Option<T>)> = changes
            .lock()
            .unwrap()
            .drain(..)
            .map(|c: ValueChange<T>| (c.old.as_deref().cloned(), c.new.as_deref().cloned()))
            .collect();
        changes
    });

    (watcher, check)
}
