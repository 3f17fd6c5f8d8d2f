//! Core types for prototype dispatch: keys, values, callables and errors.
//!
//! This crate provides the vocabulary shared by the method table and the
//! dispatcher:
//! - [`TypeKey`] / [`MethodName`]: case-insensitive identities
//! - [`InstanceKey`]: opaque id of one live instance
//! - [`Prototype`]: host types that can receive dynamic methods
//! - [`Value`]: dynamic arguments and results
//! - [`Method`] / [`Receiver`]: a registered callable and what it is bound to
//! - [`DispatchError`]: failures surfaced to callers and raised by callables

/// Dispatch error types.
pub mod error;
/// Case-insensitive type and method keys, plus opaque instance keys.
pub mod key;
/// Registered callables and their receivers.
pub mod method;
/// The host-side trait for dynamically extended types.
pub mod prototype;
/// Dynamic values passed to and returned from callables.
pub mod value;

pub use error::DispatchError;
pub use key::{InstanceKey, MethodName, TypeKey};
pub use method::{Method, Receiver};
pub use prototype::{Instance, Prototype, same_instance};
pub use value::Value;

/// Result alias for operations that can raise a [`DispatchError`].
pub type Result<T, E = DispatchError> = std::result::Result<T, E>;
