use thiserror::Error;

/// Errors raised while defining or invoking prototype methods.
///
/// Lookups that simply find nothing (empty tables, absent extension edges)
/// are not errors; only a dispatch that cannot be satisfied is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
	/// No candidate key holds an entry for the method.
	#[error("method (\"{name}\") not found (\"{type_name}\")")]
	MethodNotFound {
		/// Method name as the caller spelled it.
		name: String,
		/// Name of the receiver's type.
		type_name: String,
	},
	/// A value offered for registration cannot be invoked.
	#[error("{value} is an invalid callback")]
	InvalidCallback {
		/// Short description of the rejected value.
		value: String,
	},
	/// Failure reported by a callable itself.
	#[error("{0}")]
	Failed(String),
}

impl DispatchError {
	/// Creates a [`DispatchError::MethodNotFound`].
	pub fn not_found(name: impl Into<String>, type_name: impl Into<String>) -> Self {
		Self::MethodNotFound {
			name: name.into(),
			type_name: type_name.into(),
		}
	}

	/// Creates a [`DispatchError::Failed`] with the given message.
	pub fn failed(message: impl Into<String>) -> Self {
		Self::Failed(message.into())
	}
}
