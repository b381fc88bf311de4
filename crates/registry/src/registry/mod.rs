//! Registries of configurations.
//!
//! A [`Registry`] owns the append-only list of every configuration created in
//! it, the graph lock its nodes share, and the explicit plugin list.
//! Isolated registries suit tests; [`Registry::global`] serves static
//! registration, populated at load time and consumed once at start-up.

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::config::RegistryConfig;
use crate::graph::{self, GraphContext, Node};
use crate::plugin::{PluginDef, PluginKey};

static GLOBAL: OnceLock<Registry> = OnceLock::new();

#[derive(Default)]
pub(crate) struct PluginState {
	pub(crate) explicit: Vec<&'static PluginDef>,
	/// Plugins whose `install` was called, whether or not it succeeded.
	pub(crate) attempted: FxHashSet<PluginKey>,
}

pub struct Registry {
	pub(crate) context: Arc<GraphContext>,
	nodes: Mutex<Vec<Arc<Node>>>,
	pub(crate) plugins: Mutex<PluginState>,
	config: RegistryConfig,
}

impl Default for Registry {
	fn default() -> Self {
		Self::new()
	}
}

impl Registry {
	pub fn new() -> Self {
		Self::with_config(RegistryConfig::default())
	}

	pub fn with_config(config: RegistryConfig) -> Self {
		Self {
			context: Arc::new(GraphContext::new(config.retry)),
			nodes: Mutex::new(Vec::new()),
			plugins: Mutex::new(PluginState::default()),
			config,
		}
	}

	/// The process-wide registry, created with default settings on first use
	/// unless [`init_global`](Self::init_global) ran earlier.
	pub fn global() -> &'static Registry {
		GLOBAL.get_or_init(Registry::new)
	}

	/// Creates the process-wide registry with `config`.
	///
	/// Returns `false`, leaving the existing registry untouched, if it was already created.
	pub fn init_global(config: RegistryConfig) -> bool {
		let mut created = false;
		GLOBAL.get_or_init(|| {
			created = true;
			Registry::with_config(config)
		});
		created
	}

	pub fn config(&self) -> &RegistryConfig {
		&self.config
	}

	pub(crate) fn create_node(&self, name: Arc<str>) -> Arc<Node> {
		let node = Node::new(name, self.context.clone());
		self.nodes.lock().push(node.clone());
		node
	}

	/// Every node created in this registry, in creation order.
	pub fn nodes(&self) -> Vec<Arc<Node>> {
		self.nodes.lock().clone()
	}

	pub(crate) fn node_at(&self, index: usize) -> Option<Arc<Node>> {
		self.nodes.lock().get(index).cloned()
	}

	pub fn len(&self) -> usize {
		self.nodes.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.lock().is_empty()
	}

	pub fn configuration_names(&self) -> Vec<Arc<str>> {
		self.nodes.lock().iter().map(|n| n.name_arc()).collect()
	}

	/// Configuration names in the order a full bootstrap initializes them.
	pub fn topological_order(&self) -> Vec<Arc<str>> {
		graph::topological_order(&self.nodes()).iter().map(|n| n.name_arc()).collect()
	}

	/// Names of configurations that finished initializing.
	pub fn initialized_names(&self) -> Vec<Arc<str>> {
		self.nodes.lock().iter().filter(|n| n.is_initialized()).map(|n| n.name_arc()).collect()
	}

	/// Adds a plugin to install during the next bootstrap, alongside discovered ones.
	///
	/// Returns `false` if the same plugin was already added.
	pub fn add_plugin(&self, plugin: &'static PluginDef) -> bool {
		let mut plugins = self.plugins.lock();
		if plugins.explicit.iter().any(|p| p.key() == plugin.key()) {
			return false;
		}
		plugins.explicit.push(plugin);
		true
	}
}

impl std::fmt::Debug for Registry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Registry")
			.field("configurations", &self.len())
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}
