//! Precondition checks for wiring mistakes.
//!
//! Usage errors are programmer errors discoverable at start-up. They panic
//! with the caller's location instead of being returned.

use std::fmt::Display;

/// Panics with a usage error unless `condition` holds.
#[track_caller]
#[inline]
pub fn require<M: Display>(condition: bool, message: impl FnOnce() -> M) {
	if !condition {
		usage_error(message());
	}
}

/// Formats the message lazily and panics with a usage error unless the condition holds.
///
/// ```should_panic
/// let depth = 0;
/// lazycfg_registry::require!(depth > 0, "depth must be positive, got {depth}");
/// ```
#[macro_export]
macro_rules! require {
	($condition:expr, $($message:tt)+) => {
		$crate::contract::require($condition, || ::std::format!($($message)+))
	};
}

/// Panics with a usage error.
#[cold]
#[track_caller]
pub fn usage_error(message: impl Display) -> ! {
	panic!("usage error: {message}")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn require_passes_when_condition_holds() {
		require(true, || "unreachable");
	}

	#[test]
	#[should_panic(expected = "usage error: target missing")]
	fn require_panics_with_message() {
		require(false, || "target missing");
	}

	#[test]
	#[should_panic(expected = "usage error: dependency `db` is missing")]
	fn require_macro_formats_message() {
		let name = "db";
		crate::require!(name.is_empty(), "dependency `{name}` is missing");
	}
}
