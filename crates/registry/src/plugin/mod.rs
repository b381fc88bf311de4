//! Initializer plugins.
//!
//! A plugin wires initializers (and any configurations they need) into a
//! registry. Plugins are either submitted statically with
//! [`initializer_plugin!`](crate::initializer_plugin), which collects them
//! through `inventory`, or added explicitly with
//! [`Registry::add_plugin`](crate::Registry::add_plugin).

mod macros;

use crate::error::RegistryError;
use crate::registry::Registry;

pub(crate) type PluginKey = (&'static str, &'static str);

/// A plugin descriptor contributing initializers to a registry.
#[derive(Debug)]
pub struct PluginDef {
	pub name: &'static str,
	/// Crate that submitted the plugin; disambiguates equal names.
	pub crate_name: &'static str,
	pub description: &'static str,
	/// Called once per registry during bootstrap.
	pub install: fn(&Registry) -> Result<(), RegistryError>,
}

inventory::collect!(PluginDef);

impl PluginDef {
	pub const fn new(name: &'static str, crate_name: &'static str, description: &'static str, install: fn(&Registry) -> Result<(), RegistryError>) -> Self {
		Self {
			name,
			crate_name,
			description,
			install,
		}
	}

	pub(crate) fn key(&self) -> PluginKey {
		(self.crate_name, self.name)
	}
}

/// Every plugin submitted through `inventory`, ordered by crate then name.
pub fn discovered() -> Vec<&'static PluginDef> {
	let mut plugins: Vec<&'static PluginDef> = inventory::iter::<PluginDef>.into_iter().collect();
	plugins.sort_by_key(|p| p.key());
	plugins
}
