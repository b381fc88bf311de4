use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::{Configuration, Registry};

struct Counting {
	runs: AtomicUsize,
}

impl Initializer for Counting {
	fn name(&self) -> &str {
		"counting"
	}

	fn execute(&self) -> anyhow::Result<()> {
		self.runs.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}

#[test]
fn bind_attaches_initializer_and_edges() {
	let registry = Registry::new();
	let db = Configuration::<String>::of_unknown_provider(&registry, "db");
	let cache = Configuration::<String>::of_unknown_provider(&registry, "cache");
	let service = Configuration::<String>::of_unknown_provider(&registry, "service");

	bind(from_fn("service", || Ok(())), &service, &[&db, &cache]).unwrap();

	assert_eq!(service.initializer_count(), 1);
	assert_eq!(service.dependencies(), vec![Arc::<str>::from("db"), Arc::from("cache")]);
}

#[test]
fn failed_bind_leaves_target_untouched() {
	let registry = Registry::new();
	let a = Configuration::<()>::of_unknown_provider(&registry, "a");
	let b = Configuration::<()>::of_unknown_provider(&registry, "b");
	let c = Configuration::<()>::of_unknown_provider(&registry, "c");
	b.add_dependency(&a).unwrap();

	let err = bind(from_fn("a-init", || Ok(())), &a, &[&c, &b]).err().unwrap();

	assert!(matches!(err, RegistryError::CyclicDependency { .. }));
	assert!(a.dependencies().is_empty());
	assert_eq!(a.initializer_count(), 0);
}

#[test]
fn bind_after_initialization_fails_fast() {
	let registry = Registry::new();
	let target = Configuration::<()>::of_unknown_provider(&registry, "target");
	target.initialize().unwrap();

	let err = bind(from_fn("late", || Ok(())), &target, &[]).err().unwrap();
	assert!(matches!(err, RegistryError::AlreadyInitialized { .. }));
}

#[test]
fn custom_initializer_runs_once_per_target() {
	let registry = Registry::new();
	let counting = Arc::new(Counting { runs: AtomicUsize::new(0) });
	let target = Configuration::<()>::of_unknown_provider(&registry, "target");
	bind(counting.clone(), &target, &[]).unwrap();

	target.initialize().unwrap();
	target.initialize().unwrap();
	assert_eq!(counting.runs.load(Ordering::SeqCst), 1);
}

#[test]
fn execute_error_is_wrapped_with_context() {
	let registry = Registry::new();
	let target = Configuration::<()>::of_unknown_provider(&registry, "target");
	bind(from_fn("connect", || anyhow::bail!("connection refused")), &target, &[]).unwrap();

	let err = target.initialize().unwrap_err();
	assert_eq!(err.to_string(), "initializer `connect` failed while initializing `target`");
	let source = std::error::Error::source(&err).map(ToString::to_string);
	assert_eq!(source.as_deref(), Some("connection refused"));
	assert!(!target.is_initialized());
}

#[test]
fn fn_initializer_reports_name() {
	let init = FnInitializer::new("warm", || Ok(()));
	assert_eq!(init.name(), "warm");
	assert!(format!("{init:?}").contains("warm"));
}
