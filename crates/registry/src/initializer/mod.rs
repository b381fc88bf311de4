//! One-shot units of deferred work.

use std::fmt;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::graph::AsNode;

/// Work that runs once, when its target configuration is initialized.
///
/// `execute` may run again after a failed attempt is retried, depending on
/// the registry's [`RetryPolicy`](crate::RetryPolicy).
pub trait Initializer: Send + Sync {
	fn name(&self) -> &str;

	fn execute(&self) -> anyhow::Result<()>;
}

/// Initializer backed by a closure.
pub struct FnInitializer<F> {
	name: Arc<str>,
	body: F,
}

impl<F> FnInitializer<F>
where
	F: Fn() -> anyhow::Result<()> + Send + Sync,
{
	pub fn new(name: impl Into<Arc<str>>, body: F) -> Self {
		Self { name: name.into(), body }
	}
}

impl<F> Initializer for FnInitializer<F>
where
	F: Fn() -> anyhow::Result<()> + Send + Sync,
{
	fn name(&self) -> &str {
		&self.name
	}

	fn execute(&self) -> anyhow::Result<()> {
		(self.body)()
	}
}

impl<F> fmt::Debug for FnInitializer<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FnInitializer").field("name", &self.name).finish_non_exhaustive()
	}
}

/// Wraps a closure as a shareable initializer handle.
pub fn from_fn<F>(name: impl Into<Arc<str>>, body: F) -> Arc<dyn Initializer>
where
	F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
{
	Arc::new(FnInitializer::new(name, body))
}

/// Attaches `initializer` to `target` and adds each of `dependencies` as an edge on `target`.
///
/// Wiring errors surface here rather than at first initialization. If any
/// guard fails (target already started initializing, an edge would close a cycle, a
/// dependency from another registry), nothing is linked.
///
/// ```
/// use lazycfg_registry::{Configuration, Registry, bind, initializer};
///
/// let registry = Registry::new();
/// let storage = Configuration::of(&registry, "storage", "memory".to_string());
/// let cache = Configuration::<String>::of_unknown_provider(&registry, "cache");
///
/// let warm = initializer::from_fn("warm-cache", || Ok(()));
/// bind(warm, &cache, &[&storage]).unwrap();
///
/// assert_eq!(&*cache.dependencies()[0], "storage");
/// ```
pub fn bind(initializer: Arc<dyn Initializer>, target: &impl AsNode, dependencies: &[&dyn AsNode]) -> Result<Arc<dyn Initializer>, RegistryError> {
	let edges: Vec<_> = dependencies.iter().map(|d| d.node().clone()).collect();
	target.node().link(&edges, Some(initializer.clone()))?;
	Ok(initializer)
}

#[cfg(test)]
mod tests;
