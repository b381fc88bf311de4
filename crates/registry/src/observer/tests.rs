use std::sync::Arc;

use super::*;

fn noop() -> Arc<dyn Observer<u32>> {
	from_fn(|_: &Configuration<u32>, _: Option<&u32>, _: &u32| {})
}

#[test]
fn register_is_idempotent() {
	let set = ObserverSet::new();
	let observer = noop();

	assert!(set.register(observer.clone()));
	assert!(!set.register(observer.clone()));
	assert_eq!(set.len(), 1);
	assert!(set.is_registered(&observer));
}

#[test]
fn deregister_unknown_observer_is_noop() {
	let set = ObserverSet::new();
	let registered = noop();
	let stranger = noop();
	set.register(registered.clone());

	assert!(!set.deregister(&stranger));
	assert_eq!(set.len(), 1);
	assert!(set.deregister(&registered));
	assert!(set.is_empty());
	assert!(!set.deregister(&registered));
}

#[test]
fn snapshot_preserves_registration_order() {
	let set = ObserverSet::new();
	let first = noop();
	let second = noop();
	let third = noop();
	set.register(second.clone());
	set.register(first.clone());
	set.register(third.clone());
	set.register(first.clone());

	let snapshot = set.snapshot();
	assert_eq!(snapshot.len(), 3);
	assert!(same_observer(&snapshot[0], &second));
	assert!(same_observer(&snapshot[1], &first));
	assert!(same_observer(&snapshot[2], &third));
}

#[test]
fn reregistering_after_removal_moves_to_end() {
	let set = ObserverSet::new();
	let a = noop();
	let b = noop();
	set.register(a.clone());
	set.register(b.clone());
	set.deregister(&a);
	set.register(a.clone());

	let snapshot = set.snapshot();
	assert!(same_observer(&snapshot[0], &b));
	assert!(same_observer(&snapshot[1], &a));
}
