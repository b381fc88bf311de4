//! Type-erased dependency graph.
//!
//! Every [`Configuration`](crate::Configuration) owns one [`Node`]. Nodes carry
//! the graph state (dependency edges, initializers, phase) independent of the
//! provider type, so edges may connect configurations of different types.
//!
//! Cycles are rejected when an edge is inserted, which keeps the
//! initialization walk free of cycle handling.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use rustc_hash::FxHashSet;
use tracing::{debug, trace, warn};

use crate::config::RetryPolicy;
use crate::error::RegistryError;
use crate::initializer::Initializer;

/// Process-unique identifier of a graph node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
	fn next() -> Self {
		static NEXT: AtomicU64 = AtomicU64::new(1);
		Self(NEXT.fetch_add(1, Ordering::Relaxed))
	}

	pub fn get(self) -> u64 {
		self.0
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Initialization state of a node. Moves forward only, except that a failed
/// attempt rolls `Initializing` back to `Uninitialized`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
	Uninitialized,
	Initializing,
	Initialized,
}

/// State shared by every node of one registry.
pub(crate) struct GraphContext {
	/// Serialises graph mutation, initialization call trees and provider replacement.
	pub(crate) lock: ReentrantMutex<()>,
	pub(crate) retry: RetryPolicy,
}

impl GraphContext {
	pub(crate) fn new(retry: RetryPolicy) -> Self {
		Self {
			lock: ReentrantMutex::new(()),
			retry,
		}
	}
}

struct NodeState {
	phase: Phase,
	dependencies: Vec<Arc<Node>>,
	initializers: Vec<Arc<dyn Initializer>>,
	/// Leading initializers that completed during the current or a failed attempt.
	completed: usize,
}

/// Graph node behind a configuration.
pub struct Node {
	id: NodeId,
	name: Arc<str>,
	context: Arc<GraphContext>,
	state: Mutex<NodeState>,
}

/// Anything that can appear as an endpoint of a dependency edge.
pub trait AsNode {
	fn node(&self) -> &Arc<Node>;
}

impl AsNode for Arc<Node> {
	fn node(&self) -> &Arc<Node> {
		self
	}
}

/// Counters for one initialization call tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct InitStats {
	pub(crate) configurations: usize,
	pub(crate) initializers: usize,
}

impl Node {
	pub(crate) fn new(name: Arc<str>, context: Arc<GraphContext>) -> Arc<Self> {
		let node = Arc::new(Self {
			id: NodeId::next(),
			name,
			context,
			state: Mutex::new(NodeState {
				phase: Phase::Uninitialized,
				dependencies: Vec::new(),
				initializers: Vec::new(),
				completed: 0,
			}),
		});
		debug!(configuration = %node.name, id = %node.id, "configuration created");
		node
	}

	pub fn id(&self) -> NodeId {
		self.id
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub(crate) fn name_arc(&self) -> Arc<str> {
		self.name.clone()
	}

	/// Takes the graph lock shared by every node of this node's registry.
	pub(crate) fn graph_lock(&self) -> ReentrantMutexGuard<'_, ()> {
		self.context.lock.lock()
	}

	pub fn phase(&self) -> Phase {
		self.state.lock().phase
	}

	pub fn is_initialized(&self) -> bool {
		self.phase() == Phase::Initialized
	}

	/// Direct dependencies in insertion order.
	pub fn dependencies(&self) -> Vec<Arc<Node>> {
		self.state.lock().dependencies.clone()
	}

	pub fn initializer_count(&self) -> usize {
		self.state.lock().initializers.len()
	}

	/// Returns `true` if `target` is reachable from `self`, including `self == target`.
	pub fn depends_on(self: &Arc<Self>, target: &Node) -> bool {
		let mut visited = FxHashSet::default();
		let mut stack = vec![self.clone()];
		while let Some(node) = stack.pop() {
			if node.id == target.id {
				return true;
			}
			if !visited.insert(node.id) {
				continue;
			}
			stack.extend(node.dependencies());
		}
		false
	}

	/// Adds `dependencies` as edges and `initializer` to this node.
	///
	/// All guards run before anything is linked, so a failing call leaves the
	/// graph unchanged.
	pub(crate) fn link(self: &Arc<Self>, dependencies: &[Arc<Node>], initializer: Option<Arc<dyn Initializer>>) -> Result<(), RegistryError> {
		let _graph = self.context.lock.lock();

		if self.phase() != Phase::Uninitialized {
			return Err(RegistryError::AlreadyInitialized {
				configuration: self.name.clone(),
			});
		}
		for dependency in dependencies {
			if !Arc::ptr_eq(&self.context, &dependency.context) {
				return Err(RegistryError::ForeignRegistry {
					configuration: self.name.clone(),
					dependency: dependency.name.clone(),
				});
			}
			if dependency.depends_on(self) {
				return Err(RegistryError::CyclicDependency {
					configuration: self.name.clone(),
					dependency: dependency.name.clone(),
				});
			}
		}

		let mut state = self.state.lock();
		for dependency in dependencies {
			if state.dependencies.iter().any(|d| d.id == dependency.id) {
				continue;
			}
			debug!(configuration = %self.name, dependency = %dependency.name, "dependency added");
			state.dependencies.push(dependency.clone());
		}
		if let Some(initializer) = initializer
			&& !state.initializers.iter().any(|i| std::ptr::addr_eq(Arc::as_ptr(i), Arc::as_ptr(&initializer)))
		{
			debug!(configuration = %self.name, initializer = initializer.name(), "initializer added");
			state.initializers.push(initializer);
		}
		Ok(())
	}

	/// Initializes every transitive dependency, then this node.
	///
	/// Dependencies are visited in insertion order with an explicit stack, so
	/// graph depth is not limited by the thread's stack. On failure every node
	/// this call moved to `Initializing` is rolled back to `Uninitialized`;
	/// nodes that finished before the failure stay initialized.
	pub(crate) fn initialize(self: &Arc<Self>) -> Result<InitStats, RegistryError> {
		let _graph = self.context.lock.lock();
		let mut stats = InitStats::default();
		if self.is_initialized() {
			return Ok(stats);
		}

		let mut rollback = Rollback::default();
		let result = self.walk(&mut rollback, &mut stats);
		if let Err(err) = &result {
			warn!(configuration = %self.name, error = %err, "initialization failed");
		}
		result.map(|()| stats)
	}

	fn walk(self: &Arc<Self>, rollback: &mut Rollback, stats: &mut InitStats) -> Result<(), RegistryError> {
		let mut stack = vec![(self.clone(), false)];
		while let Some((node, expanded)) = stack.pop() {
			if expanded {
				node.run_initializers(stats)?;
				let mut state = node.state.lock();
				state.phase = Phase::Initialized;
				state.completed = 0;
				stats.configurations += 1;
				debug!(configuration = %node.name, "configuration initialized");
				continue;
			}

			let dependencies = {
				let mut state = node.state.lock();
				match state.phase {
					Phase::Initialized => continue,
					Phase::Initializing => {
						return Err(RegistryError::ReentrantInitialization {
							configuration: node.name.clone(),
						});
					}
					Phase::Uninitialized => {}
				}
				state.phase = Phase::Initializing;
				state.dependencies.clone()
			};
			rollback.0.push(node.clone());
			stack.push((node, true));
			stack.extend(dependencies.into_iter().rev().map(|d| (d, false)));
		}
		Ok(())
	}

	fn run_initializers(&self, stats: &mut InitStats) -> Result<(), RegistryError> {
		let (initializers, start) = {
			let state = self.state.lock();
			let start = match self.context.retry {
				RetryPolicy::RerunAll => 0,
				RetryPolicy::SkipCompleted => state.completed,
			};
			(state.initializers.clone(), start)
		};

		for (index, initializer) in initializers.iter().enumerate().skip(start) {
			trace!(configuration = %self.name, initializer = initializer.name(), "executing initializer");
			initializer.execute().map_err(|source| RegistryError::Initialization {
				configuration: self.name.clone(),
				initializer: initializer.name().into(),
				source,
			})?;
			self.state.lock().completed = index + 1;
			stats.initializers += 1;
		}
		Ok(())
	}
}

impl fmt::Debug for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.state.lock();
		f.debug_struct("Node")
			.field("id", &self.id)
			.field("name", &self.name)
			.field("phase", &state.phase)
			.field("dependencies", &state.dependencies.iter().map(|d| &d.name).collect::<Vec<_>>())
			.field("initializers", &state.initializers.len())
			.finish()
	}
}

/// Resets nodes left in `Initializing` when an attempt ends, including by panic.
#[derive(Default)]
struct Rollback(Vec<Arc<Node>>);

impl Drop for Rollback {
	fn drop(&mut self) {
		for node in &self.0 {
			let mut state = node.state.lock();
			if state.phase == Phase::Initializing {
				state.phase = Phase::Uninitialized;
				trace!(configuration = %node.name, "initialization rolled back");
			}
		}
	}
}

/// Orders `nodes` and their transitive dependencies so every node follows its dependencies.
///
/// This is the order a sequence of `initialize` calls over `nodes` would visit them in.
pub fn topological_order(nodes: &[Arc<Node>]) -> Vec<Arc<Node>> {
	let mut visited = FxHashSet::default();
	let mut order = Vec::new();
	for root in nodes {
		let mut stack = vec![(root.clone(), false)];
		while let Some((node, expanded)) = stack.pop() {
			if expanded {
				order.push(node);
				continue;
			}
			if !visited.insert(node.id) {
				continue;
			}
			let dependencies = node.dependencies();
			stack.push((node, true));
			stack.extend(dependencies.into_iter().rev().map(|d| (d, false)));
		}
	}
	order
}
