//! Change listeners for provider replacement.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::configuration::Configuration;

/// Callback invoked when a configuration's provider changes.
///
/// `old` is `None` when the configuration had no provider yet. The callback
/// runs before the new provider is committed, so reading the configuration
/// from inside it still yields `old`.
pub trait Observer<P>: Send + Sync {
	fn notify(&self, configuration: &Configuration<P>, old: Option<&P>, new: &P);
}

impl<P, F> Observer<P> for F
where
	F: Fn(&Configuration<P>, Option<&P>, &P) + Send + Sync,
{
	fn notify(&self, configuration: &Configuration<P>, old: Option<&P>, new: &P) {
		self(configuration, old, new)
	}
}

/// Wraps a closure as a shareable observer handle.
pub fn from_fn<P, F>(f: F) -> Arc<dyn Observer<P>>
where
	P: 'static,
	F: Fn(&Configuration<P>, Option<&P>, &P) + Send + Sync + 'static,
{
	Arc::new(f)
}

/// Insertion-ordered, duplicate-free list of observers.
///
/// Observers are compared by handle identity: registering a clone of the same
/// `Arc` twice keeps one entry.
pub struct ObserverSet<P> {
	observers: Mutex<Vec<Arc<dyn Observer<P>>>>,
}

impl<P> Default for ObserverSet<P> {
	fn default() -> Self {
		Self {
			observers: Mutex::new(Vec::new()),
		}
	}
}

impl<P> ObserverSet<P> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends `observer`. Returns `false` if it was already registered.
	pub fn register(&self, observer: Arc<dyn Observer<P>>) -> bool {
		let mut observers = self.observers.lock();
		if observers.iter().any(|o| same_observer(o, &observer)) {
			return false;
		}
		observers.push(observer);
		true
	}

	/// Removes `observer`. Returns `false` if it was not registered.
	pub fn deregister(&self, observer: &Arc<dyn Observer<P>>) -> bool {
		let mut observers = self.observers.lock();
		let Some(pos) = observers.iter().position(|o| same_observer(o, observer)) else {
			return false;
		};
		observers.remove(pos);
		true
	}

	pub fn is_registered(&self, observer: &Arc<dyn Observer<P>>) -> bool {
		self.observers.lock().iter().any(|o| same_observer(o, observer))
	}

	/// Copies the current list so callbacks run without the lock held.
	pub fn snapshot(&self) -> Vec<Arc<dyn Observer<P>>> {
		self.observers.lock().clone()
	}

	pub fn len(&self) -> usize {
		self.observers.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.observers.lock().is_empty()
	}
}

// Compares data pointers only; vtable pointers may differ across codegen units.
fn same_observer<P>(a: &Arc<dyn Observer<P>>, b: &Arc<dyn Observer<P>>) -> bool {
	std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests;
