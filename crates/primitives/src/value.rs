use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::{Instance, Method};

/// A dynamic argument or result.
///
/// [`Value::Nil`] is the "absent" result a callable returns when it has
/// nothing to report.
#[derive(Clone, Default)]
pub enum Value {
	/// No value.
	#[default]
	Nil,
	/// Boolean.
	Bool(bool),
	/// Signed integer.
	Int(i64),
	/// Floating point number.
	Float(f64),
	/// Immutable string.
	Str(Rc<str>),
	/// Ordered list, also used for aggregated results.
	List(Vec<Value>),
	/// A live host instance.
	Instance(Instance),
	/// A callable.
	Method(Method),
	/// Any other host value.
	Opaque(Rc<dyn Any>),
}

impl Value {
	/// Returns `true` for [`Value::Nil`].
	#[inline]
	pub fn is_nil(&self) -> bool {
		matches!(self, Self::Nil)
	}

	/// Returns `true` if the value can be registered as a method.
	#[inline]
	pub fn is_callable(&self) -> bool {
		matches!(self, Self::Method(_))
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			Self::Int(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_float(&self) -> Option<f64> {
		match self {
			Self::Float(x) => Some(*x),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<&[Value]> {
		match self {
			Self::List(items) => Some(items),
			_ => None,
		}
	}

	pub fn as_instance(&self) -> Option<&Instance> {
		match self {
			Self::Instance(instance) => Some(instance),
			_ => None,
		}
	}

	pub fn as_method(&self) -> Option<&Method> {
		match self {
			Self::Method(method) => Some(method),
			_ => None,
		}
	}

	/// Downcasts an opaque host value.
	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		match self {
			Self::Opaque(any) => any.downcast_ref::<T>(),
			_ => None,
		}
	}

	/// Short human-readable description, used in error messages.
	pub fn describe(&self) -> String {
		match self {
			Self::Nil => "nil".to_string(),
			Self::Bool(b) => format!("bool {b}"),
			Self::Int(i) => format!("int {i}"),
			Self::Float(x) => format!("float {x}"),
			Self::Str(s) => format!("string {s:?}"),
			Self::List(items) => format!("list of {}", items.len()),
			Self::Instance(instance) => format!("instance of {}", instance.type_name()),
			Self::Method(_) => "method".to_string(),
			Self::Opaque(_) => "opaque value".to_string(),
		}
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Nil => write!(f, "Nil"),
			Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
			Self::Int(i) => f.debug_tuple("Int").field(i).finish(),
			Self::Float(x) => f.debug_tuple("Float").field(x).finish(),
			Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
			Self::List(items) => f.debug_tuple("List").field(items).finish(),
			Self::Instance(instance) => f
				.debug_tuple("Instance")
				.field(&instance.type_name())
				.finish(),
			Self::Method(method) => fmt::Debug::fmt(method, f),
			Self::Opaque(_) => write!(f, "Opaque(..)"),
		}
	}
}

/// Host handles compare by identity, everything else structurally.
impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Nil, Self::Nil) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Int(a), Self::Int(b)) => a == b,
			(Self::Float(a), Self::Float(b)) => a == b,
			(Self::Str(a), Self::Str(b)) => a == b,
			(Self::List(a), Self::List(b)) => a == b,
			(Self::Instance(a), Self::Instance(b)) => Rc::ptr_eq(a, b),
			(Self::Method(a), Self::Method(b)) => a.ptr_eq(b),
			(Self::Opaque(a), Self::Opaque(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}
}

impl From<()> for Value {
	fn from(_: ()) -> Self {
		Self::Nil
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

impl From<i64> for Value {
	fn from(i: i64) -> Self {
		Self::Int(i)
	}
}

impl From<i32> for Value {
	fn from(i: i32) -> Self {
		Self::Int(i64::from(i))
	}
}

impl From<f64> for Value {
	fn from(x: f64) -> Self {
		Self::Float(x)
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Self::Str(s.into())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Self::Str(s.into())
	}
}

impl From<Vec<Value>> for Value {
	fn from(items: Vec<Value>) -> Self {
		Self::List(items)
	}
}

impl From<Instance> for Value {
	fn from(instance: Instance) -> Self {
		Self::Instance(instance)
	}
}

impl From<Method> for Value {
	fn from(method: Method) -> Self {
		Self::Method(method)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(opt: Option<T>) -> Self {
		opt.map_or(Self::Nil, Into::into)
	}
}
