/*!
Observable values, observable collections and bidirectional binding between values

# Overview
- [`ObservableValue`] holds a single optional value and notifies its listeners whenever the value is replaced by
  a different allocation. Change detection is by `Arc` identity, not equality.
- Two values of the same type can be bound together. Afterwards a change on either side is applied to the other,
  and the echo of that propagation is suppressed so each side notifies exactly once per change.
- [`ObservableCollection`] wraps a [`Container`] (a `Vec`, `VecDeque`, `HashSet` or `BTreeSet`, or your own) and
  sends one batch of [`CollectionChange`]s per mutation, describing exactly what was added or removed.
- [`ObservableList`] adds positional operations on top of a [`SequenceContainer`].
- [`Cursor`] and [`ListCursor`] iterate a collection and route removals and edits through it, so they are
  observed like any other mutation.

Listeners are registered with set semantics keyed on `Arc` identity, or through `subscribe`, which accepts closures,
`std::sync::mpsc::Sender`s and (with the `tokio` feature) `tokio::sync::mpsc::UnboundedSender`s and returns a
[`ListenerGuard`] that unregisters on drop. Listeners always run on the thread that made the change, after the
change is complete and with no internal lock held.

# Values and binding

```rust
use reactive_observables::*;

let celsius = ObservableValue::<f64>::with_value(20.0);
let display = ObservableValue::<f64>::new();
let _guard = display.subscribe(|change: ValueChange<f64>| println!("display now {:?}", change.new));

display.bind(&celsius).unwrap(); // display takes 20.0 silently
celsius.set_value(25.0); // display now Some(25.0)
display.set_value(30.0); // celsius follows
assert_eq!(celsius.get().as_deref(), Some(&30.0));

assert_eq!(celsius.bind(&display), Err(BindError::AlreadyBound));
assert!(display.unbind(&celsius));
```

# Collections

```rust
use reactive_observables::*;
use std::collections::HashSet;

let tags = ObservableCollection::new(HashSet::new());
let (tx, rx) = std::sync::mpsc::channel::<Vec<CollectionChange<&str>>>();
let _guard = tags.subscribe(tx);

tags.add_all(["red", "green"]);
tags.add("red"); // already present, nothing sent
tags.clear();

assert_eq!(rx.try_iter().count(), 2);
```
*/

pub mod binder;
pub mod change;
pub mod collection;
pub mod container;
pub mod cursor;
pub mod error;
pub mod list;
pub mod listener;
mod lock;
pub mod value;

pub use binder::BindingRegistry;
pub use change::*;
pub use collection::*;
pub use container::*;
pub use cursor::*;
pub use error::*;
pub use list::*;
pub use listener::*;
pub use value::*;
