use std::fmt;

use protomix_primitives::{Instance, TypeKey, same_instance};

/// Single slot holding the instance currently mid-registration.
///
/// A second [`enter`](Self::enter) overwrites the first; there is no stack.
#[derive(Default)]
pub struct ScopeCell {
	slot: Option<Instance>,
}

impl ScopeCell {
	pub fn new() -> Self {
		Self::default()
	}

	/// Puts `instance` in scope, returning whatever was there before.
	pub fn enter(&mut self, instance: Instance) -> Option<Instance> {
		self.slot.replace(instance)
	}

	pub fn clear(&mut self) {
		self.slot = None;
	}

	/// Empties the slot, returning its content.
	pub fn take(&mut self) -> Option<Instance> {
		self.slot.take()
	}

	#[inline]
	pub fn is_occupied(&self) -> bool {
		self.slot.is_some()
	}

	#[inline]
	pub fn current(&self) -> Option<&Instance> {
		self.slot.as_ref()
	}

	/// Returns `true` if exactly `instance` is in scope.
	pub fn holds(&self, instance: &Instance) -> bool {
		self.slot
			.as_ref()
			.is_some_and(|current| same_instance(current, instance))
	}

	/// Clears the slot if it holds an instance of type `ty`.
	pub fn auto_clear(&mut self, ty: &TypeKey) -> bool {
		if let Some(current) = &self.slot
			&& TypeKey::of(current.as_ref()) == *ty
		{
			self.slot = None;
			return true;
		}
		false
	}
}

impl fmt::Debug for ScopeCell {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ScopeCell")
			.field("slot", &self.slot.as_ref().map(|instance| instance.type_name()))
			.finish()
	}
}
