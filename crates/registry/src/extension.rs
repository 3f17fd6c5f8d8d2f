//! Mixin edges between types.
//!
//! An edge `source → target` means "source's dispatch table includes
//! target's methods". Edges are never removed. How the methods get there
//! depends on [`MixinMode`]: live lookups walk [`ExtensionGraph::chain`],
//! snapshot mode copies tables on link and re-copies on every registration.

use protomix_primitives::TypeKey;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::config::MixinMode;
use crate::table::{MethodTable, TableKey};

/// Directed extension edges, in declaration order per source.
#[derive(Debug, Default)]
pub struct ExtensionGraph {
	edges: FxHashMap<TypeKey, Vec<TypeKey>>,
}

impl ExtensionGraph {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records `source → target`. Returns `false` if the edge already exists
	/// or would be a self-edge.
	pub fn add_edge(&mut self, source: &TypeKey, target: &TypeKey) -> bool {
		if source == target || self.extending(source, target) {
			return false;
		}
		self.edges
			.entry(source.clone())
			.or_default()
			.push(target.clone());
		true
	}

	/// Links `source` to `target`; a no-op if already linked.
	///
	/// In [`MixinMode::Snapshot`] the target's current methods are copied
	/// into the source's table, replacing same-named entries.
	pub fn link(
		&mut self,
		table: &mut MethodTable,
		mode: MixinMode,
		source: &TypeKey,
		target: &TypeKey,
	) -> bool {
		if !self.add_edge(source, target) {
			trace!(%source, %target, "extension already linked");
			return false;
		}
		let copied = match mode {
			MixinMode::Live => 0,
			MixinMode::Snapshot => copy(table, source, target),
		};
		debug!(%source, %target, ?mode, copied, "linked extension");
		true
	}

	/// Returns `true` if `source → target` was recorded.
	pub fn extending(&self, source: &TypeKey, target: &TypeKey) -> bool {
		self.extensions(source).contains(target)
	}

	/// Types `source` extends, in declaration order.
	pub fn extensions(&self, source: &TypeKey) -> &[TypeKey] {
		self.edges.get(source).map_or(&[], Vec::as_slice)
	}

	/// Types that directly extend `target`.
	pub fn sources_of<'a>(&'a self, target: &'a TypeKey) -> impl Iterator<Item = &'a TypeKey> + 'a {
		self.edges
			.iter()
			.filter(move |(_, targets)| targets.contains(target))
			.map(|(source, _)| source)
	}

	/// `ty` followed by every type reachable through its edges: depth-first,
	/// declaration order, each type once.
	pub fn chain(&self, ty: &TypeKey) -> Vec<TypeKey> {
		let mut seen = FxHashSet::default();
		let mut order = Vec::new();
		let mut stack = vec![ty];
		while let Some(next) = stack.pop() {
			if !seen.insert(next) {
				continue;
			}
			order.push(next.clone());
			stack.extend(self.extensions(next).iter().rev());
		}
		order
	}

	/// Re-copies every target of `ty` into `ty`'s table.
	///
	/// Returns the number of names copied.
	pub fn propagate(&self, table: &mut MethodTable, ty: &TypeKey) -> usize {
		self.extensions(ty)
			.iter()
			.map(|target| copy(table, ty, target))
			.sum()
	}

	/// Propagates `ty`, then every type that extends it directly or
	/// transitively, nearest first.
	pub fn resync(&self, table: &mut MethodTable, ty: &TypeKey) {
		let mut copied = self.propagate(table, ty);
		let mut visited = FxHashSet::default();
		visited.insert(ty);
		let mut queue: Vec<&TypeKey> = self.sources_of(ty).collect();
		let mut cursor = 0;
		while let Some(&source) = queue.get(cursor) {
			cursor += 1;
			if !visited.insert(source) {
				continue;
			}
			copied += self.propagate(table, source);
			queue.extend(self.sources_of(source));
		}
		if copied > 0 {
			trace!(%ty, copied, "resynchronized extensions");
		}
	}

	/// Number of recorded edges.
	pub fn len(&self) -> usize {
		self.edges.values().map(Vec::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.edges.is_empty()
	}
}

fn copy(table: &mut MethodTable, source: &TypeKey, target: &TypeKey) -> usize {
	table.merge_from(&TableKey::Type(source.clone()), &TableKey::Type(target.clone()))
}
