//! Host hook-in.
//!
//! Host types route unknown method calls here. [`Hooked::call`] is the
//! instance hook and [`Dispatcher::call_static`] the static one; both go
//! through the invoke-or-register path, so passing a lone
//! [`Value::Method`] registers it and anything else invokes.

use protomix_primitives::{Instance, Result, Value};

use crate::dispatch::Dispatcher;

/// Instance-side hook for unknown method calls.
pub trait Hooked {
	/// Forwards `name(args...)` to
	/// [`Dispatcher::invoke_or_register`].
	fn call(&self, dispatcher: &mut Dispatcher, name: &str, args: &[Value]) -> Result<Value>;
}

impl Hooked for Instance {
	fn call(&self, dispatcher: &mut Dispatcher, name: &str, args: &[Value]) -> Result<Value> {
		dispatcher.invoke_or_register(self, name, args)
	}
}

impl Dispatcher {
	/// Static hook: forwards `type_name::name(args...)` to
	/// [`invoke_or_register_static`](Self::invoke_or_register_static).
	pub fn call_static(&mut self, type_name: &str, name: &str, args: &[Value]) -> Result<Value> {
		self.invoke_or_register_static(type_name, name, args)
	}
}
