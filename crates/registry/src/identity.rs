//! Instance identification.
//!
//! An [`IdentifierService`] mints opaque [`InstanceKey`]s; the
//! [`IdentityMap`] caches them per live instance without keeping the
//! instance alive.

use std::rc::{Rc, Weak};

use protomix_primitives::{Instance, InstanceKey, Prototype};
use rustc_hash::FxHashMap;
use tracing::trace;
use uuid::Uuid;

/// Mints instance keys.
///
/// A service must never hand out a key that is still cached for another
/// live instance.
pub trait IdentifierService {
	/// Returns a fresh key for `instance`.
	fn identify(&mut self, instance: &dyn Prototype) -> InstanceKey;
}

/// Random v4 UUID keys.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdentifier;

impl IdentifierService for UuidIdentifier {
	fn identify(&mut self, _instance: &dyn Prototype) -> InstanceKey {
		InstanceKey::new(Uuid::new_v4().simple().to_string())
	}
}

/// Deterministic `"<type>#<n>"` keys, counting from zero.
#[derive(Debug, Default, Clone)]
pub struct SequentialIdentifier {
	next: u64,
}

impl IdentifierService for SequentialIdentifier {
	fn identify(&mut self, instance: &dyn Prototype) -> InstanceKey {
		let n = self.next;
		self.next += 1;
		InstanceKey::new(format!("{}#{n}", instance.type_name()))
	}
}

struct Tracked {
	instance: Weak<dyn Prototype>,
	key: InstanceKey,
}

/// Weak, identity-keyed instance → key association.
///
/// Entries are keyed by allocation address. The held [`Weak`] pins the
/// allocation, so an address cannot be reused by another instance until the
/// entry is released or pruned.
pub struct IdentityMap {
	service: Box<dyn IdentifierService>,
	tracked: FxHashMap<usize, Tracked>,
}

fn address(instance: &Instance) -> usize {
	Rc::as_ptr(instance).cast::<()>() as usize
}

impl IdentityMap {
	pub fn new(service: impl IdentifierService + 'static) -> Self {
		Self {
			service: Box::new(service),
			tracked: FxHashMap::default(),
		}
	}

	/// Returns the cached key for `instance`, minting one on first sight.
	pub fn identify(&mut self, instance: &Instance) -> InstanceKey {
		let addr = address(instance);
		if let Some(tracked) = self.tracked.get(&addr)
			&& tracked.instance.strong_count() > 0
		{
			return tracked.key.clone();
		}
		let key = self.service.identify(instance.as_ref());
		trace!(%key, type_name = instance.type_name(), "identified instance");
		self.tracked.insert(
			addr,
			Tracked {
				instance: Rc::downgrade(instance),
				key: key.clone(),
			},
		);
		key
	}

	/// Returns the cached key without minting.
	pub fn key_of(&self, instance: &Instance) -> Option<&InstanceKey> {
		self.tracked
			.get(&address(instance))
			.filter(|tracked| tracked.instance.strong_count() > 0)
			.map(|tracked| &tracked.key)
	}

	/// Forgets `instance`, returning its key.
	pub fn release(&mut self, instance: &Instance) -> Option<InstanceKey> {
		self.tracked
			.remove(&address(instance))
			.map(|tracked| tracked.key)
	}

	/// Drops entries whose instance has died, returning their keys.
	pub fn prune(&mut self) -> Vec<InstanceKey> {
		let dead: Vec<usize> = self
			.tracked
			.iter()
			.filter(|(_, tracked)| tracked.instance.strong_count() == 0)
			.map(|(addr, _)| *addr)
			.collect();
		dead.into_iter()
			.filter_map(|addr| self.tracked.remove(&addr))
			.map(|tracked| tracked.key)
			.collect()
	}

	/// Number of tracked instances, dead or alive.
	pub fn len(&self) -> usize {
		self.tracked.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tracked.is_empty()
	}
}

impl Default for IdentityMap {
	fn default() -> Self {
		Self::new(UuidIdentifier)
	}
}

impl std::fmt::Debug for IdentityMap {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("IdentityMap")
			.field("tracked", &self.tracked.len())
			.finish()
	}
}
