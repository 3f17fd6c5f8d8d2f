//! Dispatch policy configuration.
//!
//! Every knob has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! precedence = "instance-first"   # or "type-first"
//! aggregation = "count-all"       # or "skip-nil"
//! mixin = "live"                  # or "snapshot"
//! auto-clear-scope = true
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which key level wins when an instance and its type both define a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Precedence {
	/// Instance-level entries shadow type-level entries.
	#[default]
	InstanceFirst,
	/// Type-level entries (and their mixins) are consulted first.
	TypeFirst,
}

/// Which results count when several callables answer one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Aggregation {
	/// Every invocation counts, `Nil` results included.
	#[default]
	CountAll,
	/// `Nil` results are dropped before counting.
	SkipNil,
}

/// How an extended type's methods reach the extending type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MixinMode {
	/// Lookups walk the extension chain at call time.
	#[default]
	Live,
	/// Linking copies the target's table into the source's, and every
	/// registration re-synchronizes the copies.
	///
	/// Copies always win: a source's own method with the same name as one of
	/// its targets' is replaced by the target's entry on the next resync,
	/// including the resync run by the registration that defined it.
	Snapshot,
}

/// Policy knobs of a [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct DispatchConfig {
	/// Candidate key order for instance dispatch.
	pub precedence: Precedence,
	/// Result aggregation for multi-callable entries.
	pub aggregation: Aggregation,
	/// Extension strategy.
	pub mixin: MixinMode,
	/// Clear the scope cell after a registration against the scoped type.
	pub auto_clear_scope: bool,
}

impl Default for DispatchConfig {
	fn default() -> Self {
		Self {
			precedence: Precedence::default(),
			aggregation: Aggregation::default(),
			mixin: MixinMode::default(),
			auto_clear_scope: true,
		}
	}
}

impl DispatchConfig {
	/// Parses a config from TOML source.
	pub fn from_toml(src: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(src)?)
	}

	/// Type-first lookup, nil-skipping aggregation and snapshot mixins.
	pub fn legacy() -> Self {
		Self {
			precedence: Precedence::TypeFirst,
			aggregation: Aggregation::SkipNil,
			mixin: MixinMode::Snapshot,
			auto_clear_scope: true,
		}
	}
}
