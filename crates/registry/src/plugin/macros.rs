//! Registration macro for initializer plugins.

/// Submits an initializer plugin for discovery during bootstrap.
///
/// `$install` is a `fn(&Registry) -> Result<(), RegistryError>`.
///
/// ```ignore
/// fn install_cache(registry: &Registry) -> Result<(), RegistryError> {
///     let cache = Configuration::<String>::of_unknown_provider(registry, "cache");
///     cache.add_initializer(initializer::from_fn("warm-cache", || Ok(())))
/// }
///
/// lazycfg_registry::initializer_plugin!(cache, "Warms the cache", install_cache);
/// ```
#[macro_export]
macro_rules! initializer_plugin {
	($name:ident, $description:literal, $install:path $(,)?) => {
		$crate::inventory::submit! {
			$crate::plugin::PluginDef::new(stringify!($name), env!("CARGO_PKG_NAME"), $description, $install)
		}
	};
}
