use std::fmt;
use std::rc::Rc;

use crate::{DispatchError, Instance, Prototype, TypeKey, Value};

type MethodFn = dyn Fn(Receiver<'_>, &[Value]) -> Result<Value, DispatchError>;

/// A callable registered under a method name.
///
/// Cloning is cheap; clones share the same closure, so a method copied into
/// another type's table by an extension still compares equal with
/// [`Method::ptr_eq`].
#[derive(Clone)]
pub struct Method(Rc<MethodFn>);

impl Method {
	/// Wraps a closure as a method.
	pub fn new<F>(f: F) -> Self
	where
		F: Fn(Receiver<'_>, &[Value]) -> Result<Value, DispatchError> + 'static,
	{
		Self(Rc::new(f))
	}

	/// Invokes the method with its receiver bound to `receiver`.
	#[inline]
	pub fn call(&self, receiver: Receiver<'_>, args: &[Value]) -> Result<Value, DispatchError> {
		(self.0)(receiver, args)
	}

	/// Returns `true` if both handles share one closure.
	pub fn ptr_eq(&self, other: &Method) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl fmt::Debug for Method {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Method({:p})", Rc::as_ptr(&self.0).cast::<()>())
	}
}

/// What a method is bound to when it runs.
///
/// Calls dispatched on an instance bind the instance; static calls, made
/// before any instance exists, bind the bare type key.
#[derive(Clone, Copy)]
pub enum Receiver<'a> {
	/// A live host instance.
	Instance(&'a Instance),
	/// A type, for static dispatch.
	Type(&'a TypeKey),
}

impl<'a> Receiver<'a> {
	/// Returns the bound instance, if any.
	pub fn instance(self) -> Option<&'a Instance> {
		match self {
			Self::Instance(instance) => Some(instance),
			Self::Type(_) => None,
		}
	}

	/// Returns the bound instance as a `T`.
	pub fn downcast_ref<T: Prototype>(self) -> Option<&'a T> {
		self.instance()?.as_ref().downcast_ref::<T>()
	}

	/// Returns the key of the receiver's type.
	pub fn type_key(self) -> TypeKey {
		match self {
			Self::Instance(instance) => TypeKey::of(instance.as_ref()),
			Self::Type(key) => key.clone(),
		}
	}

	/// Returns the receiver's type name as the host reports it.
	pub fn type_name(self) -> &'a str {
		match self {
			Self::Instance(instance) => instance.type_name(),
			Self::Type(key) => key.as_str(),
		}
	}
}

impl fmt::Debug for Receiver<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Instance(instance) => f
				.debug_tuple("Instance")
				.field(&instance.type_name())
				.finish(),
			Self::Type(key) => f.debug_tuple("Type").field(key).finish(),
		}
	}
}
