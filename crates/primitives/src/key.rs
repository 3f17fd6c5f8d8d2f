use std::fmt;

use crate::{Instance, Prototype};

/// Folds a raw name into its lower-cased, comparable form.
///
/// Already-folded input is copied without re-allocation through the
/// Unicode lower-casing tables.
pub fn fold(raw: &str) -> Box<str> {
	if raw.chars().any(char::is_uppercase) {
		raw.to_lowercase().into_boxed_str()
	} else {
		raw.into()
	}
}

macro_rules! folded_key {
	($(#[$meta:meta])* $name:ident) => {
		$(#[$meta])*
		#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
		pub struct $name(Box<str>);

		impl $name {
			/// Creates a key, folding `raw` to lower case.
			pub fn new(raw: impl AsRef<str>) -> Self {
				Self(fold(raw.as_ref()))
			}

			/// Returns the folded key.
			#[inline]
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&self.0)
			}
		}

		impl From<&str> for $name {
			fn from(raw: &str) -> Self {
				Self::new(raw)
			}
		}

		impl From<String> for $name {
			fn from(raw: String) -> Self {
				Self::new(raw)
			}
		}

		impl From<&$name> for $name {
			fn from(key: &$name) -> Self {
				key.clone()
			}
		}
	};
}

folded_key! {
	/// Case-insensitive identity of a host type.
	TypeKey
}

folded_key! {
	/// Case-insensitive name of a prototype method.
	MethodName
}

impl TypeKey {
	/// Returns the key for the type of a live instance.
	pub fn of(instance: &dyn Prototype) -> Self {
		Self::new(instance.type_name())
	}
}

impl From<&Instance> for TypeKey {
	fn from(instance: &Instance) -> Self {
		Self::of(instance.as_ref())
	}
}

/// Opaque id of one live instance, minted by an identifier service.
///
/// Unlike [`TypeKey`], instance keys are compared verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceKey(Box<str>);

impl InstanceKey {
	/// Wraps an id produced by an identifier service.
	pub fn new(id: impl Into<Box<str>>) -> Self {
		Self(id.into())
	}

	/// Returns the raw id.
	#[inline]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for InstanceKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
