//! Configuration dependency graph and lazy initialization registry.
//!
//! A [`Configuration`] is a runtime slot holding a provider plus a node in a
//! dependency graph. [`Initializer`]s attach one-shot work to a configuration
//! and declare the configurations that must be ready first. A [`Registry`]
//! tracks every configuration it created and drives the global bootstrap
//! pass, including initializers contributed by plugins through `inventory`.
//!
//! # Modules
//!
//! - [`configuration`] - Provider slot, observers, graph wiring
//! - [`initializer`] - One-shot units of deferred work
//! - [`graph`] - Type-erased graph nodes, cycle guard, depth-first initialization
//! - [`observer`] - Change listeners for provider replacement
//! - [`registry`] - Process-wide and isolated registries
//! - [`plugin`] - Statically registered initializer plugins
//! - [`bootstrap`] - `initialize_all_configurations` and its report
//! - [`config`] - Registry settings, loadable from TOML
//!
//! # Concurrency
//!
//! Graph mutation and initialization are serialised per registry by a
//! re-entrant lock, so an initializer may wire or initialize other
//! configurations from inside [`Initializer::execute`]. Provider reads never
//! take a lock.

pub mod bootstrap;
pub mod config;
pub mod configuration;
pub mod contract;
pub mod error;
pub mod graph;
pub mod initializer;
pub mod observer;
pub mod plugin;
pub mod registry;

pub use bootstrap::BootstrapReport;
pub use config::{RegistryConfig, RetryPolicy};
pub use configuration::Configuration;
pub use error::{BootstrapError, RegistryError};
pub use graph::{AsNode, Node, NodeId, Phase};
pub use initializer::{FnInitializer, Initializer, bind};
pub use observer::{Observer, ObserverSet};
pub use plugin::PluginDef;
pub use registry::Registry;

#[doc(hidden)]
pub use inventory;
