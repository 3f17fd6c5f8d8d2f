use std::any::Any;
use std::rc::Rc;

use crate::TypeKey;

/// A host type whose instances can receive methods at runtime.
///
/// Implement it with [`impl_prototype!`](crate::impl_prototype) unless the
/// reported type name must differ from the Rust type name.
pub trait Prototype: Any {
	/// Name of the host type, used for type-level registration and errors.
	fn type_name(&self) -> &str;
}

/// Shared handle to a live host instance.
pub type Instance = Rc<dyn Prototype>;

impl dyn Prototype {
	/// Returns the concrete instance if it is a `T`.
	pub fn downcast_ref<T: Prototype>(&self) -> Option<&T> {
		let any: &dyn Any = self;
		any.downcast_ref::<T>()
	}

	/// Returns `true` if the instance is a `T`.
	pub fn is<T: Prototype>(&self) -> bool {
		let any: &dyn Any = self;
		any.is::<T>()
	}

	/// Returns the folded key of this instance's type.
	pub fn type_key(&self) -> TypeKey {
		TypeKey::of(self)
	}
}

/// Returns `true` if both handles refer to the same live instance.
#[inline]
pub fn same_instance(a: &Instance, b: &Instance) -> bool {
	Rc::ptr_eq(a, b)
}

/// Implements [`Prototype`] for a host type.
///
/// The type name defaults to the stringified type; pass a second argument to
/// override it.
///
/// ```
/// use protomix_primitives::impl_prototype;
///
/// struct User;
/// impl_prototype!(User);
///
/// struct Customer;
/// impl_prototype!(Customer, "Shop.Customer");
/// ```
#[macro_export]
macro_rules! impl_prototype {
	($type:ty) => {
		$crate::impl_prototype!($type, stringify!($type));
	};
	($type:ty, $name:expr) => {
		impl $crate::Prototype for $type {
			fn type_name(&self) -> &str {
				$name
			}
		}
	};
}
