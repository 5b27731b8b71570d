mod common;

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use common::value_watcher;
use reactive_observables::*;

#[test]
fn test_identity_change_detection() {
    let value = ObservableValue::<String>::new();
    let (watcher, check) = value_watcher::<String>();
    let _guard = value.subscribe(watcher);

    let buffy = Arc::new("Buffy".to_string());
    value.set(buffy.clone());
    value.set(buffy.clone());
    assert_eq!(check(), vec![(None, Some("Buffy".to_string()))]);

    // equal contents, different allocation
    value.set_value("Buffy".to_string());
    assert_eq!(check(), vec![(Some("Buffy".to_string()), Some("Buffy".to_string()))]);

    value.set(None::<Arc<String>>);
    value.set(None::<Arc<String>>);
    assert_eq!(check(), vec![(Some("Buffy".to_string()), None)]);
}

#[test]
fn test_dropping_guard_stops_delivery() {
    let value = ObservableValue::<i32>::with_value(0);
    let (watcher, check) = value_watcher::<i32>();
    let guard = value.subscribe(watcher);

    value.set_value(1);
    assert_eq!(value.listener_count(), 1);
    drop(guard);
    assert_eq!(value.listener_count(), 0);
    value.set_value(2);

    assert_eq!(check(), vec![(Some(0), Some(1))]);
}

#[test]
fn test_unsubscribe_is_explicit_drop() {
    let value = ObservableValue::<i32>::new();
    let (watcher, check) = value_watcher::<i32>();
    let guard = value.subscribe(watcher);
    guard.unsubscribe();
    value.set_value(1);
    assert!(check().is_empty());
}

#[test]
fn test_listener_registered_during_fire_sees_next_change() {
    let value = ObservableValue::<i32>::with_value(0);
    let (late_watcher, late_check) = value_watcher::<i32>();
    let late_watcher: Arc<dyn ChangeListener<i32>> = {
        Arc::new(move |_: &ObservableValue<i32>, change: &ValueChange<i32>| late_watcher(change.clone()))
    };

    let registrar: Arc<dyn ChangeListener<i32>> = Arc::new(move |source: &ObservableValue<i32>, _: &ValueChange<i32>| {
        source.add_change_listener(late_watcher.clone());
    });
    value.add_change_listener(registrar);

    value.set_value(1);
    assert!(late_check().is_empty());
    value.set_value(2);
    assert_eq!(late_check(), vec![(Some(1), Some(2))]);
    assert_eq!(value.listener_count(), 2);
}

#[test]
fn test_listener_may_remove_itself() {
    let value = ObservableValue::<i32>::new();
    let calls = Arc::new(Mutex::new(0));
    let slot: Arc<Mutex<Option<Arc<dyn ChangeListener<i32>>>>> = Arc::new(Mutex::new(None));

    let listener: Arc<dyn ChangeListener<i32>> = {
        let calls = calls.clone();
        let slot = slot.clone();
        Arc::new(move |source: &ObservableValue<i32>, _: &ValueChange<i32>| {
            *calls.lock().unwrap() += 1;
            if let Some(me) = slot.lock().unwrap().take() {
                source.remove_change_listener(&me);
            }
        })
    };
    *slot.lock().unwrap() = Some(listener.clone());
    value.add_change_listener(listener);

    value.set_value(1);
    value.set_value(2);
    assert_eq!(*calls.lock().unwrap(), 1);
    assert_eq!(value.listener_count(), 0);
}

#[test]
fn test_std_channel_listener() {
    let value = ObservableValue::<i32>::new();
    let (tx, rx) = std::sync::mpsc::channel::<ValueChange<i32>>();
    let _guard = value.subscribe(tx);

    let one = Arc::new(1);
    value.set(one.clone());
    let change = rx.try_recv().unwrap();
    assert!(change.old.is_none());
    assert!(Arc::ptr_eq(change.new.as_ref().unwrap(), &one));
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_duplicate_subscribe_keeps_existing_registration() {
    let value = ObservableValue::<i32>::new();
    let (watcher, check) = value_watcher::<i32>();
    let listener: Arc<dyn ChangeListener<i32>> = Arc::new(move |_: &ObservableValue<i32>, change: &ValueChange<i32>| watcher(change.clone()));

    value.add_change_listener(listener.clone());
    drop(value.subscribe(listener.clone()));
    assert_eq!(value.listener_count(), 1);

    value.set_value(1);
    assert_eq!(check(), vec![(None, Some(1))]);
}

#[test]
fn test_listener_panic_reaches_caller_and_value_stays_usable() {
    let value = ObservableValue::<i32>::with_value(0);
    let (watcher, check) = value_watcher::<i32>();
    let _watcher_guard = value.subscribe(watcher);
    let armed = Arc::new(AtomicBool::new(true));
    let _panicker = value.subscribe(move |_: ValueChange<i32>| {
        if armed.swap(false, Ordering::SeqCst) {
            panic!("listener failed");
        }
    });

    assert!(panic::catch_unwind(AssertUnwindSafe(|| value.set_value(1))).is_err());
    // the slot was updated before any listener ran
    assert_eq!(value.get().as_deref(), Some(&1));

    value.set_value(2);
    // whether the watcher saw the first change depends on listener order
    assert_eq!(check().last(), Some(&(Some(1), Some(2))));
    assert_eq!(value.listener_count(), 2);
}
