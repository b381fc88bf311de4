//! Wiring, initialization and provider replacement from several threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, mpsc};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use lazycfg_registry::{Configuration, Registry, RegistryConfig, initializer, observer};

const THREADS: usize = 8;

fn isolated() -> Registry {
	Registry::with_config(RegistryConfig {
		discover_plugins: false,
		..RegistryConfig::default()
	})
}

#[test]
fn shared_dependency_initializes_once_under_contention() {
	let registry = isolated();
	let runs = Arc::new(AtomicUsize::new(0));
	let base = Configuration::<()>::of_unknown_provider(&registry, "base");
	let counter = runs.clone();
	base.add_initializer(initializer::from_fn("open-pool", move || {
		counter.fetch_add(1, Ordering::SeqCst);
		thread::sleep(Duration::from_millis(5));
		Ok(())
	}))
	.unwrap();
	let dependents: Vec<_> = (0..THREADS)
		.map(|i| {
			let cfg = Configuration::<()>::of_unknown_provider(&registry, format!("client-{i}"));
			cfg.add_dependency(&base).unwrap();
			cfg
		})
		.collect();

	let barrier = Barrier::new(THREADS);
	thread::scope(|s| {
		for cfg in &dependents {
			let barrier = &barrier;
			s.spawn(move || {
				barrier.wait();
				cfg.initialize().unwrap();
			});
		}
	});

	assert_eq!(runs.load(Ordering::SeqCst), 1);
	assert!(base.is_initialized());
	assert!(dependents.iter().all(|c| c.is_initialized()));
}

#[test]
fn concurrent_sets_notify_a_consistent_chain() {
	const SETS: u32 = 50;
	let registry = isolated();
	let level = Configuration::of(&registry, "level", 0u32);
	let changes = Arc::new(Mutex::new(Vec::new()));
	let sink = changes.clone();
	level.register(observer::from_fn(move |_, old: Option<&u32>, new: &u32| {
		sink.lock().push((old.copied(), *new));
	}));

	let barrier = Barrier::new(THREADS);
	thread::scope(|s| {
		for t in 0..THREADS as u32 {
			let (barrier, level) = (&barrier, &level);
			s.spawn(move || {
				barrier.wait();
				for i in 0..SETS {
					assert!(level.set(t * 1000 + i + 1));
				}
			});
		}
	});

	let changes = changes.lock();
	assert_eq!(changes.len(), THREADS * SETS as usize);
	assert_eq!(changes[0].0, Some(0));
	for pair in changes.windows(2) {
		assert_eq!(pair[1].0, Some(pair[0].1));
	}
	assert_eq!(changes.last().map(|c| c.1), Some(*level.get()));
}

#[test]
fn set_with_initializing_observer_races_initializer_that_sets() {
	let registry = isolated();
	let a = Configuration::of(&registry, "a", 0u32);
	let b = Configuration::<()>::of_unknown_provider(&registry, "b");
	let c = Configuration::<()>::of_unknown_provider(&registry, "c");
	c.add_initializer(initializer::from_fn("c-init", || Ok(()))).unwrap();

	let nested = c.clone();
	a.register(observer::from_fn(move |_, _, _: &u32| {
		nested.initialize().unwrap();
	}));
	let target = a.clone();
	b.add_initializer(initializer::from_fn("b-sets-a", move || {
		target.set(2);
		Ok(())
	}))
	.unwrap();

	let barrier = Arc::new(Barrier::new(2));
	let (done, finished) = mpsc::channel();

	let (setter, gate, tx) = (a.clone(), barrier.clone(), done.clone());
	thread::spawn(move || {
		gate.wait();
		setter.set(1);
		tx.send("set").unwrap();
	});
	let (init, gate, tx) = (b.clone(), barrier, done);
	thread::spawn(move || {
		gate.wait();
		init.initialize().unwrap();
		tx.send("initialize").unwrap();
	});

	for _ in 0..2 {
		finished.recv_timeout(Duration::from_secs(10)).expect("set and initialize must both finish");
	}
	assert!(b.is_initialized());
	assert!(c.is_initialized());
	assert!(matches!(*a.get(), 1 | 2));
}
