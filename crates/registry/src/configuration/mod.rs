//! Provider slots and their place in the dependency graph.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwapOption;
use tracing::trace;

use crate::contract;
use crate::error::RegistryError;
use crate::graph::{AsNode, Node, NodeId, Phase};
use crate::initializer::Initializer;
use crate::observer::{Observer, ObserverSet};
use crate::registry::Registry;

struct Slot<P> {
	node: Arc<Node>,
	provider: ArcSwapOption<P>,
	observers: ObserverSet<P>,
	/// Set while observers run. Only touched under the registry's graph lock.
	notifying: AtomicBool,
}

/// A named runtime slot for a pluggable provider.
///
/// Handles are cheap to clone and share state. Equality is identity.
///
/// Provider selection and initialization are independent: [`get`](Self::get)
/// never triggers initialization, and [`set`](Self::set) works before and
/// after it.
pub struct Configuration<P> {
	inner: Arc<Slot<P>>,
}

impl<P> Clone for Configuration<P> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<P: Send + Sync + 'static> Configuration<P> {
	/// Creates a configuration in `registry`, optionally with an initial provider.
	pub fn new_in(registry: &Registry, name: impl Into<Arc<str>>, provider: Option<P>) -> Self {
		let node = registry.create_node(name.into());
		Self {
			inner: Arc::new(Slot {
				node,
				provider: ArcSwapOption::new(provider.map(Arc::new)),
				observers: ObserverSet::new(),
				notifying: AtomicBool::new(false),
			}),
		}
	}

	pub fn of(registry: &Registry, name: impl Into<Arc<str>>, provider: P) -> Self {
		Self::new_in(registry, name, Some(provider))
	}

	pub fn of_unknown_provider(registry: &Registry, name: impl Into<Arc<str>>) -> Self {
		Self::new_in(registry, name, None)
	}

	/// Returns the current provider.
	///
	/// # Panics
	///
	/// Panics with an uninitialized-provider usage error if no provider was ever set.
	#[track_caller]
	pub fn get(&self) -> Arc<P> {
		match self.try_get() {
			Ok(provider) => provider,
			Err(err) => contract::usage_error(err),
		}
	}

	pub fn try_get(&self) -> Result<Arc<P>, RegistryError> {
		self.inner.provider.load_full().ok_or_else(|| RegistryError::UninitializedProvider {
			configuration: self.inner.node.name_arc(),
		})
	}

	pub fn is_set(&self) -> bool {
		self.inner.provider.load().is_some()
	}

	/// Replaces the provider. Returns `false` if `provider` equals the current one.
	///
	/// On change, every observer is notified in registration order with the
	/// old and new provider, then the new provider is committed.
	///
	/// `set` runs under the registry's graph lock, the same re-entrant lock
	/// that wiring and initialization take. Callbacks may therefore set,
	/// wire or initialize other configurations, and callers on other threads
	/// wait for the whole notification to finish. Reads through
	/// [`get`](Self::get) never wait.
	///
	/// # Panics
	///
	/// Panics if called on this configuration from one of its own observer callbacks.
	#[track_caller]
	pub fn set(&self, provider: P) -> bool
	where
		P: PartialEq,
	{
		let _graph = self.inner.node.graph_lock();
		crate::require!(
			!self.inner.notifying.load(Ordering::Relaxed),
			"re-entrant set on configuration `{}` during observer notification",
			self.name()
		);

		let old = self.inner.provider.load_full();
		if old.as_deref() == Some(&provider) {
			trace!(configuration = %self.name(), "provider unchanged");
			return false;
		}

		let provider = Arc::new(provider);
		{
			let _notifying = Notifying::enter(&self.inner.notifying);
			for observer in self.inner.observers.snapshot() {
				observer.notify(self, old.as_deref(), &provider);
			}
		}
		self.inner.provider.store(Some(provider));
		trace!(configuration = %self.name(), observers = self.inner.observers.len(), "provider replaced");
		true
	}

	pub fn register(&self, observer: Arc<dyn Observer<P>>) -> bool {
		self.inner.observers.register(observer)
	}

	pub fn deregister(&self, observer: &Arc<dyn Observer<P>>) -> bool {
		self.inner.observers.deregister(observer)
	}

	pub fn is_registered(&self, observer: &Arc<dyn Observer<P>>) -> bool {
		self.inner.observers.is_registered(observer)
	}

	/// Requires `dependency` to be initialized before this configuration.
	///
	/// Adding an existing edge is a no-op. Fails without changing the graph if
	/// this configuration already started initializing or if `dependency`
	/// transitively depends on this one.
	pub fn add_dependency(&self, dependency: &impl AsNode) -> Result<(), RegistryError> {
		self.inner.node.link(std::slice::from_ref(dependency.node()), None)
	}

	/// Adds an initializer to run when this configuration is initialized.
	///
	/// Adding the same initializer handle twice keeps one entry.
	pub fn add_initializer(&self, initializer: Arc<dyn Initializer>) -> Result<(), RegistryError> {
		self.inner.node.link(&[], Some(initializer))
	}

	/// Initializes dependencies depth-first, then runs this configuration's initializers.
	///
	/// A no-op once initialized. On failure nothing still pending is marked
	/// initialized and the call may be retried.
	pub fn initialize(&self) -> Result<(), RegistryError> {
		self.inner.node.initialize().map(drop)
	}
}

impl<P> Configuration<P> {
	pub fn name(&self) -> &str {
		self.inner.node.name()
	}

	pub fn id(&self) -> NodeId {
		self.inner.node.id()
	}

	pub fn phase(&self) -> Phase {
		self.inner.node.phase()
	}

	pub fn is_initialized(&self) -> bool {
		self.inner.node.is_initialized()
	}

	/// Names of direct dependencies in insertion order.
	pub fn dependencies(&self) -> Vec<Arc<str>> {
		self.inner.node.dependencies().iter().map(|d| d.name_arc()).collect()
	}

	pub fn initializer_count(&self) -> usize {
		self.inner.node.initializer_count()
	}
}

impl<P> AsNode for Configuration<P> {
	fn node(&self) -> &Arc<Node> {
		&self.inner.node
	}
}

impl<P> PartialEq for Configuration<P> {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}
}

impl<P> Eq for Configuration<P> {}

impl<P> fmt::Debug for Configuration<P> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Configuration")
			.field("name", &self.name())
			.field("id", &self.id())
			.field("phase", &self.phase())
			.field("provider_set", &self.inner.provider.load().is_some())
			.finish()
	}
}

struct Notifying<'a>(&'a AtomicBool);

impl<'a> Notifying<'a> {
	fn enter(flag: &'a AtomicBool) -> Self {
		flag.store(true, Ordering::Relaxed);
		Self(flag)
	}
}

impl Drop for Notifying<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Relaxed);
	}
}
