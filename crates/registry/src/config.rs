//! Registry settings.

use serde::Deserialize;

use crate::error::RegistryError;

/// What a retried `initialize` does after an earlier attempt failed part way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetryPolicy {
	/// Re-run every initializer of the configuration on retry.
	#[default]
	RerunAll,
	/// Resume with the first initializer that did not complete.
	SkipCompleted,
}

/// Settings for a [`Registry`](crate::Registry).
///
/// ```toml
/// discover-plugins = true
/// disabled-plugins = ["telemetry"]
/// retry = "skip-completed"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RegistryConfig {
	/// Install plugins submitted through `inventory` during bootstrap.
	pub discover_plugins: bool,
	/// Plugin names skipped during bootstrap, whether discovered or added explicitly.
	pub disabled_plugins: Vec<String>,
	pub retry: RetryPolicy,
}

impl Default for RegistryConfig {
	fn default() -> Self {
		Self {
			discover_plugins: true,
			disabled_plugins: Vec::new(),
			retry: RetryPolicy::default(),
		}
	}
}

impl RegistryConfig {
	/// Parses settings from TOML; missing keys take their defaults.
	pub fn from_toml_str(input: &str) -> Result<Self, RegistryError> {
		Ok(toml::from_str(input)?)
	}

	pub fn is_plugin_disabled(&self, name: &str) -> bool {
		self.disabled_plugins.iter().any(|disabled| disabled == name)
	}
}
