use thiserror::Error;

pub use protomix_primitives::DispatchError;

/// Errors that can occur while loading a [`DispatchConfig`](crate::DispatchConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
	/// The TOML source could not be parsed or holds unknown keys.
	#[error("invalid dispatch config: {0}")]
	Parse(#[from] toml::de::Error),
}
