use std::sync::Arc;

/// Errors raised while wiring, reading or initializing configurations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
	/// `get` was called before any provider was set.
	#[error("uninitialized provider: configuration `{configuration}` has no provider")]
	UninitializedProvider { configuration: Arc<str> },

	/// The configuration started initializing, so its graph edges are frozen.
	#[error("configuration `{configuration}` already started initialization; its wiring is frozen")]
	AlreadyInitialized { configuration: Arc<str> },

	/// Linking `configuration -> dependency` would close a cycle.
	#[error("cyclic dependency: `{dependency}` already depends on `{configuration}`")]
	CyclicDependency { configuration: Arc<str>, dependency: Arc<str> },

	/// Both endpoints of an edge must live in the same registry.
	#[error("dependency `{dependency}` of `{configuration}` belongs to another registry")]
	ForeignRegistry { configuration: Arc<str>, dependency: Arc<str> },

	/// An initializer tried to initialize a configuration whose initialization is in progress.
	#[error("configuration `{configuration}` is already being initialized")]
	ReentrantInitialization { configuration: Arc<str> },

	/// An initializer body failed; the configuration stays uninitialized.
	#[error("initializer `{initializer}` failed while initializing `{configuration}`")]
	Initialization {
		configuration: Arc<str>,
		initializer: Arc<str>,
		#[source]
		source: anyhow::Error,
	},

	#[error("invalid registry config: {0}")]
	Config(#[from] toml::de::Error),
}

/// Top-level failure of [`Registry::initialize_all_configurations`](crate::Registry::initialize_all_configurations).
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
	#[error("plugin `{crate_name}::{plugin}` failed to install")]
	Plugin {
		plugin: &'static str,
		crate_name: &'static str,
		#[source]
		source: RegistryError,
	},

	#[error("initialization of `{configuration}` failed")]
	Initialization {
		configuration: Arc<str>,
		#[source]
		source: RegistryError,
	},
}

impl BootstrapError {
	/// The underlying registry error.
	pub fn registry_error(&self) -> &RegistryError {
		match self {
			Self::Plugin { source, .. } | Self::Initialization { source, .. } => source,
		}
	}
}
