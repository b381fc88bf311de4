//! Global initialization pass over a registry.

use tracing::{debug, info, warn};

use crate::error::BootstrapError;
use crate::plugin::{self, PluginDef};
use crate::registry::Registry;

/// What one [`Registry::initialize_all_configurations`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapReport {
	pub plugins_installed: usize,
	/// Configurations that moved to initialized during this call.
	pub configurations_initialized: usize,
	pub initializers_executed: usize,
}

impl Registry {
	/// Installs pending plugins, then initializes every configuration.
	///
	/// Configurations are visited in creation order; because initialization is
	/// idempotent and depth-first, the overall effect is one topologically
	/// ordered pass. Configurations created by initializers during the pass
	/// are visited too. The first failure stops the pass without rollback of
	/// what already completed, and a later call resumes from there.
	pub fn initialize_all_configurations(&self) -> Result<BootstrapReport, BootstrapError> {
		let _graph = self.context.lock.lock();
		let mut report = BootstrapReport {
			plugins_installed: self.install_plugins()?,
			..BootstrapReport::default()
		};

		let mut index = 0;
		while let Some(node) = self.node_at(index) {
			let stats = node.initialize().map_err(|source| BootstrapError::Initialization {
				configuration: node.name_arc(),
				source,
			})?;
			report.configurations_initialized += stats.configurations;
			report.initializers_executed += stats.initializers;
			index += 1;
		}

		info!(
			plugins = report.plugins_installed,
			configurations = report.configurations_initialized,
			initializers = report.initializers_executed,
			"bootstrap complete"
		);
		Ok(report)
	}

	/// Installs every enabled plugin not yet attempted in this registry.
	///
	/// A plugin is marked before `install` runs. One that fails part-way keeps
	/// whatever it already wired and is never installed again, so a later
	/// bootstrap cannot duplicate its configurations or initializers.
	fn install_plugins(&self) -> Result<usize, BootstrapError> {
		let mut candidates: Vec<&'static PluginDef> = self.plugins.lock().explicit.clone();
		if self.config().discover_plugins {
			candidates.extend(plugin::discovered());
		}
		candidates.sort_by_key(|p| p.key());
		candidates.dedup_by_key(|p| p.key());

		let mut installed = 0;
		for def in candidates {
			if self.config().is_plugin_disabled(def.name) {
				debug!(plugin = def.name, krate = def.crate_name, "plugin disabled");
				continue;
			}
			if !self.plugins.lock().attempted.insert(def.key()) {
				continue;
			}

			if let Err(source) = (def.install)(self) {
				warn!(plugin = def.name, krate = def.crate_name, error = %source, "plugin install failed; it will not be retried");
				return Err(BootstrapError::Plugin {
					plugin: def.name,
					crate_name: def.crate_name,
					source,
				});
			}
			debug!(plugin = def.name, krate = def.crate_name, "plugin installed");
			installed += 1;
		}
		Ok(installed)
	}
}
