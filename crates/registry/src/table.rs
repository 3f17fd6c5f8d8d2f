//! Method storage keyed by type or instance.
//!
//! Each key owns an insertion-ordered map from folded method name to a
//! [`MethodEntry`], the append-only list of callables registered under that
//! name. Lookups take an ordered candidate list and stop at the first key
//! that has the name; entries from different keys are never merged.

use std::fmt;

use indexmap::IndexMap;
use protomix_primitives::{InstanceKey, Method, MethodName, TypeKey};
use rustc_hash::{FxBuildHasher, FxHashMap};

/// Name → entry mapping for one key, in first-registration order.
pub type MethodMap = IndexMap<MethodName, MethodEntry, FxBuildHasher>;

/// Key of one table in the [`MethodTable`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableKey {
	/// Methods shared by every instance of a type.
	Type(TypeKey),
	/// Methods attached to one live instance.
	Instance(InstanceKey),
}

impl fmt::Display for TableKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Type(key) => write!(f, "type:{key}"),
			Self::Instance(key) => write!(f, "instance:{key}"),
		}
	}
}

impl From<TypeKey> for TableKey {
	fn from(key: TypeKey) -> Self {
		Self::Type(key)
	}
}

impl From<InstanceKey> for TableKey {
	fn from(key: InstanceKey) -> Self {
		Self::Instance(key)
	}
}

/// Callables registered under one (key, name) pair, in registration order.
#[derive(Debug, Clone, Default)]
pub struct MethodEntry {
	methods: Vec<Method>,
}

impl MethodEntry {
	pub fn push(&mut self, method: Method) {
		self.methods.push(method);
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.methods.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.methods.is_empty()
	}

	#[inline]
	pub fn as_slice(&self) -> &[Method] {
		&self.methods
	}

	pub fn iter(&self) -> impl Iterator<Item = &Method> + '_ {
		self.methods.iter()
	}
}

/// A successful lookup: the entry and the candidate key it was found under.
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a> {
	/// Candidate key holding the entry.
	pub key: &'a TableKey,
	/// The matched entry.
	pub entry: &'a MethodEntry,
}

/// Storage for every registered method.
#[derive(Debug, Default)]
pub struct MethodTable {
	tables: FxHashMap<TableKey, MethodMap>,
}

impl MethodTable {
	/// Creates an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends `method` to the entry for (`key`, `name`), creating the key's
	/// map and the entry as needed.
	///
	/// Returns the number of callables now registered under the pair.
	pub fn register(&mut self, key: TableKey, name: MethodName, method: Method) -> usize {
		let entry = self
			.tables
			.entry(key)
			.or_default()
			.entry(name)
			.or_default();
		entry.push(method);
		entry.len()
	}

	/// Returns the entry of the first candidate that has any callable
	/// registered under `name`.
	pub fn lookup<'a>(&'a self, candidates: &'a [TableKey], name: &MethodName) -> Option<Resolved<'a>> {
		candidates.iter().find_map(|key| {
			let entry = self.tables.get(key)?.get(name)?;
			(!entry.is_empty()).then_some(Resolved { key, entry })
		})
	}

	/// Returns the entry for exactly (`key`, `name`).
	pub fn entry(&self, key: &TableKey, name: &MethodName) -> Option<&MethodEntry> {
		self.tables.get(key)?.get(name)
	}

	/// Returns `true` if (`key`, `name`) holds at least one callable.
	pub fn contains(&self, key: &TableKey, name: &MethodName) -> bool {
		self.entry(key, name).is_some_and(|entry| !entry.is_empty())
	}

	/// Iterates the full name → entry mapping for `key`; empty if the key
	/// has never been registered against.
	pub fn get_all<'a>(
		&'a self,
		key: &TableKey,
	) -> impl Iterator<Item = (&'a MethodName, &'a MethodEntry)> + use<'a> {
		self.tables.get(key).into_iter().flat_map(|map| map.iter())
	}

	/// Empties every entry for `key`. Returns `false` if the key had no map.
	pub fn clear(&mut self, key: &TableKey) -> bool {
		match self.tables.get_mut(key) {
			Some(map) => {
				map.clear();
				true
			}
			None => false,
		}
	}

	/// Removes a single name from `key`, keeping the order of the rest.
	pub fn remove(&mut self, key: &TableKey, name: &MethodName) -> Option<MethodEntry> {
		self.tables.get_mut(key)?.shift_remove(name)
	}

	/// Forgets `key` entirely.
	pub fn drop_key(&mut self, key: &TableKey) -> bool {
		self.tables.remove(key).is_some()
	}

	/// Copies the full mapping of `target` into `source`. Entries of
	/// `target` replace entries of `source` with the same name.
	///
	/// Returns the number of names copied.
	pub fn merge_from(&mut self, source: &TableKey, target: &TableKey) -> usize {
		if source == target {
			return 0;
		}
		let Some(functions) = self.tables.get(target).cloned() else {
			return 0;
		};
		let copied = functions.len();
		let dst = self.tables.entry(source.clone()).or_default();
		for (name, entry) in functions {
			dst.insert(name, entry);
		}
		copied
	}

	/// Number of keys that own a map.
	pub fn len(&self) -> usize {
		self.tables.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tables.is_empty()
	}
}
