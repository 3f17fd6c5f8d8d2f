//! The dispatch context.
//!
//! A [`Dispatcher`] owns every piece of dispatch state: the method table,
//! the extension graph, the scope cell and the instance identity map.
//! Nothing is global; build one per program (or per test).
//!
//! Resolution for an instance of type `T` consults an ordered candidate
//! list. With the default [`Precedence::InstanceFirst`] it is
//! `[instance, T, <types T extends>...]`; the first key holding the name
//! wins. When several callables are registered under that name they all
//! run, in registration order, and their results are aggregated per
//! [`Aggregation`].

use std::iter;

use indexmap::IndexSet;
use protomix_primitives::{
	DispatchError, Instance, InstanceKey, Method, MethodName, Receiver, Result, TypeKey, Value,
};
use rustc_hash::FxBuildHasher;
use tracing::{debug, trace, warn};

use crate::config::{Aggregation, DispatchConfig, MixinMode, Precedence};
use crate::extension::ExtensionGraph;
use crate::identity::{IdentifierService, IdentityMap, UuidIdentifier};
use crate::scope::ScopeCell;
use crate::table::{MethodEntry, MethodTable, TableKey};

/// Tracked-instance count below which registrations never trigger a prune.
const PRUNE_FLOOR: usize = 64;

/// What a definition or invocation is aimed at.
#[derive(Clone, Copy)]
pub enum Target<'a> {
	/// Every instance of a type, or the type itself for static calls.
	Type(&'a str),
	/// One live instance.
	Instance(&'a Instance),
}

impl<'a> From<&'a str> for Target<'a> {
	fn from(type_name: &'a str) -> Self {
		Self::Type(type_name)
	}
}

impl<'a> From<&'a Instance> for Target<'a> {
	fn from(instance: &'a Instance) -> Self {
		Self::Instance(instance)
	}
}

/// Dispatch context: method table, extension graph, scope and identities.
#[derive(Debug)]
pub struct Dispatcher {
	config: DispatchConfig,
	table: MethodTable,
	graph: ExtensionGraph,
	scope: ScopeCell,
	ids: IdentityMap,
	/// Identity map size at which the next registration prunes dead entries.
	prune_at: usize,
}

impl Default for Dispatcher {
	fn default() -> Self {
		Self::new()
	}
}

impl Dispatcher {
	/// Creates a dispatcher with the default config and UUID instance keys.
	pub fn new() -> Self {
		Self::with_config(DispatchConfig::default())
	}

	pub fn with_config(config: DispatchConfig) -> Self {
		Self::with_identifier(config, UuidIdentifier)
	}

	/// Creates a dispatcher minting instance keys with `service`.
	pub fn with_identifier(config: DispatchConfig, service: impl IdentifierService + 'static) -> Self {
		Self {
			config,
			table: MethodTable::new(),
			graph: ExtensionGraph::new(),
			scope: ScopeCell::new(),
			ids: IdentityMap::new(service),
			prune_at: PRUNE_FLOOR,
		}
	}

	#[inline]
	pub fn config(&self) -> &DispatchConfig {
		&self.config
	}

	#[inline]
	pub fn table(&self) -> &MethodTable {
		&self.table
	}

	#[inline]
	pub fn graph(&self) -> &ExtensionGraph {
		&self.graph
	}

	#[inline]
	pub fn scope(&self) -> &ScopeCell {
		&self.scope
	}

	#[inline]
	pub fn identities(&self) -> &IdentityMap {
		&self.ids
	}

	#[inline]
	pub fn scope_mut(&mut self) -> &mut ScopeCell {
		&mut self.scope
	}

	/// Registers `method` under `name` on `target`.
	///
	/// An instance target is put in scope, gets the method under its own
	/// instance key, and is returned for chaining. A type target returns the
	/// instance that was in scope when the registration started, if any.
	pub fn define<'a>(&mut self, target: impl Into<Target<'a>>, name: &str, method: Method) -> Option<Instance> {
		let name = MethodName::new(name);
		match target.into() {
			Target::Instance(instance) => {
				let ty = TypeKey::of(instance.as_ref());
				let key = self.identify(instance);
				self.scope.enter(instance.clone());
				self.register(TableKey::Instance(key), &ty, name, method);
				Some(instance.clone())
			}
			Target::Type(type_name) => {
				let ty = TypeKey::new(type_name);
				let chained = self.scope.current().cloned();
				self.register(TableKey::Type(ty.clone()), &ty, name, method);
				chained
			}
		}
	}

	/// Like [`define`](Self::define), for a dynamically supplied value.
	///
	/// # Errors
	///
	/// [`DispatchError::InvalidCallback`] if `value` is not a [`Value::Method`].
	pub fn define_value<'a>(
		&mut self,
		target: impl Into<Target<'a>>,
		name: &str,
		value: Value,
	) -> Result<Option<Instance>> {
		match value {
			Value::Method(method) => Ok(self.define(target, name, method)),
			other => {
				let value = other.describe();
				warn!(method = name, %value, "rejected invalid callback");
				Err(DispatchError::InvalidCallback { value })
			}
		}
	}

	/// Invokes `name` on `target` per the invocation policy.
	///
	/// # Errors
	///
	/// [`DispatchError::MethodNotFound`] if no candidate key has the name;
	/// any error a callable returns is propagated unchanged.
	pub fn invoke<'a>(&mut self, target: impl Into<Target<'a>>, name: &str, args: &[Value]) -> Result<Value> {
		let folded = MethodName::new(name);
		match target.into() {
			Target::Instance(instance) => {
				let ty = TypeKey::of(instance.as_ref());
				let id = self.ids.key_of(instance).cloned();
				let candidates = self.candidates(&ty, id.as_ref());
				let Some((_, methods)) = self.resolve(&candidates, &folded) else {
					return Err(DispatchError::not_found(name, instance.type_name()));
				};
				self.run(&methods, Receiver::Instance(instance), args)
			}
			Target::Type(type_name) => {
				let ty = TypeKey::new(type_name);
				let candidates = self.candidates(&ty, None);
				let Some((_, methods)) = self.resolve(&candidates, &folded) else {
					return Err(DispatchError::not_found(name, type_name));
				};
				self.run(&methods, Receiver::Type(&ty), args)
			}
		}
	}

	/// Unknown-instance-method entry point.
	///
	/// A sole [`Value::Method`] argument registers it: under the key the name
	/// already resolves to (instance or the instance's own type), or under
	/// the instance key when nothing resolves. The instance is returned for
	/// chaining and the scope is left empty. Any other arguments invoke the
	/// resolved entry.
	///
	/// # Errors
	///
	/// [`DispatchError::MethodNotFound`] when nothing resolves and the call is
	/// not a registration.
	pub fn invoke_or_register(&mut self, instance: &Instance, name: &str, args: &[Value]) -> Result<Value> {
		let ty = TypeKey::of(instance.as_ref());
		let id = self.ids.key_of(instance).cloned();
		let folded = MethodName::new(name);
		let candidates = self.candidates(&ty, id.as_ref());
		let callback = sole_method(args);

		if let Some((key, methods)) = self.resolve(&candidates, &folded) {
			let Some(method) = callback else {
				return self.run(&methods, Receiver::Instance(instance), args);
			};
			let key = match key {
				TableKey::Instance(_) => key,
				TableKey::Type(_) => TableKey::Type(ty.clone()),
			};
			self.register(key, &ty, folded, method);
			self.scope.clear();
			return Ok(Value::Instance(instance.clone()));
		}

		self.scope.enter(instance.clone());
		match callback {
			Some(method) => {
				let id = self.identify(instance);
				self.register(TableKey::Instance(id), &ty, folded, method);
				Ok(Value::Instance(instance.clone()))
			}
			None => {
				self.scope.clear();
				Err(DispatchError::not_found(name, instance.type_name()))
			}
		}
	}

	/// Unknown-static-method entry point; like
	/// [`invoke_or_register`](Self::invoke_or_register) but always aimed at
	/// the bare type key.
	///
	/// Registrations return the instance in scope (or [`Value::Nil`]).
	///
	/// # Errors
	///
	/// [`DispatchError::MethodNotFound`] when nothing resolves and the call is
	/// not a registration.
	pub fn invoke_or_register_static(&mut self, type_name: &str, name: &str, args: &[Value]) -> Result<Value> {
		if let Some(method) = sole_method(args) {
			return Ok(self.define(type_name, name, method).into());
		}
		self.invoke(type_name, name, args)
	}

	/// Makes `source` extend `target`. Returns `false` if already extending.
	pub fn extend(&mut self, source: impl Into<TypeKey>, target: impl Into<TypeKey>) -> bool {
		let (source, target) = (source.into(), target.into());
		self.graph
			.link(&mut self.table, self.config.mixin, &source, &target)
	}

	/// Makes every type in `sources` extend `target`, returning how many new
	/// edges were created.
	pub fn extend_all<I>(&mut self, sources: I, target: impl Into<TypeKey>) -> usize
	where
		I: IntoIterator,
		I::Item: Into<TypeKey>,
	{
		let target = target.into();
		sources
			.into_iter()
			.map(|source| self.extend(source, &target))
			.filter(|linked| *linked)
			.count()
	}

	pub fn extending(&self, source: impl Into<TypeKey>, target: impl Into<TypeKey>) -> bool {
		self.graph.extending(&source.into(), &target.into())
	}

	/// Types `source` extends, in declaration order.
	pub fn extensions(&self, source: impl Into<TypeKey>) -> &[TypeKey] {
		self.graph.extensions(&source.into())
	}

	/// Removes every type-level method of `type_name`. Extension edges and
	/// instance-level methods are kept.
	pub fn unregister(&mut self, type_name: &str) -> bool {
		let ty = TypeKey::new(type_name);
		let cleared = self.table.clear(&TableKey::Type(ty.clone()));
		if cleared {
			debug!(%ty, "unregistered prototype methods");
		}
		cleared
	}

	/// Removes `name` from exactly `target`'s own table.
	pub fn remove_method<'a>(&mut self, target: impl Into<Target<'a>>, name: &str) -> Option<MethodEntry> {
		let key = self.own_key(target.into())?;
		self.table.remove(&key, &MethodName::new(name))
	}

	/// Names `target` responds to, in resolution order, without duplicates.
	pub fn methods<'a>(&self, target: impl Into<Target<'a>>) -> Vec<MethodName> {
		let candidates = self.peek_candidates(target.into());
		let names: IndexSet<&MethodName, FxBuildHasher> = candidates
			.iter()
			.flat_map(|key| self.table.get_all(key))
			.map(|(name, _)| name)
			.collect();
		names.into_iter().cloned().collect()
	}

	/// Returns `true` if invoking `name` on `target` would find an entry.
	pub fn responds_to<'a>(&self, target: impl Into<Target<'a>>, name: &str) -> bool {
		let candidates = self.peek_candidates(target.into());
		self.table
			.lookup(&candidates, &MethodName::new(name))
			.is_some()
	}

	/// Forgets `instance`: its key and its instance-level methods.
	pub fn release(&mut self, instance: &Instance) -> bool {
		let Some(key) = self.ids.release(instance) else {
			return false;
		};
		self.table.drop_key(&TableKey::Instance(key));
		if self.scope.holds(instance) {
			self.scope.clear();
		}
		true
	}

	/// Drops identities and instance-level methods of dead instances.
	pub fn prune(&mut self) -> usize {
		let dead = self.ids.prune();
		for key in &dead {
			self.table.drop_key(&TableKey::Instance(key.clone()));
		}
		if !dead.is_empty() {
			debug!(count = dead.len(), "pruned dead instances");
		}
		dead.len()
	}

	/// Mints or returns the key of `instance`. Only registrations mint, and
	/// once the map has doubled since the last sweep, dead instances are
	/// pruned first.
	fn identify(&mut self, instance: &Instance) -> InstanceKey {
		if self.ids.len() >= self.prune_at {
			self.prune();
			self.prune_at = (self.ids.len() * 2).max(PRUNE_FLOOR);
		}
		self.ids.identify(instance)
	}

	fn register(&mut self, key: TableKey, ty: &TypeKey, name: MethodName, method: Method) {
		let handlers = self.table.register(key.clone(), name.clone(), method);
		debug!(%key, method = %name, handlers, "registered prototype method");
		self.registered(ty);
	}

	/// Registration event for `ty`.
	fn registered(&mut self, ty: &TypeKey) {
		if self.config.mixin == MixinMode::Snapshot {
			self.graph.resync(&mut self.table, ty);
		}
		if self.config.auto_clear_scope && self.scope.auto_clear(ty) {
			trace!(%ty, "cleared scope");
		}
	}

	fn candidates(&self, ty: &TypeKey, instance: Option<&InstanceKey>) -> Vec<TableKey> {
		let types = match self.config.mixin {
			MixinMode::Live => self.graph.chain(ty),
			MixinMode::Snapshot => vec![ty.clone()],
		};
		let types = types.into_iter().map(TableKey::Type);
		let Some(instance) = instance else {
			return types.collect();
		};
		let instance = iter::once(TableKey::Instance(instance.clone()));
		match self.config.precedence {
			Precedence::InstanceFirst => instance.chain(types).collect(),
			Precedence::TypeFirst => types.chain(instance).collect(),
		}
	}

	/// Candidates for read-only queries; never mints an instance key.
	fn peek_candidates(&self, target: Target<'_>) -> Vec<TableKey> {
		match target {
			Target::Instance(instance) => {
				self.candidates(&TypeKey::of(instance.as_ref()), self.ids.key_of(instance))
			}
			Target::Type(type_name) => self.candidates(&TypeKey::new(type_name), None),
		}
	}

	fn own_key(&self, target: Target<'_>) -> Option<TableKey> {
		match target {
			Target::Instance(instance) => self.ids.key_of(instance).cloned().map(TableKey::Instance),
			Target::Type(type_name) => Some(TableKey::Type(TypeKey::new(type_name))),
		}
	}

	fn resolve(&self, candidates: &[TableKey], name: &MethodName) -> Option<(TableKey, Vec<Method>)> {
		let resolved = self.table.lookup(candidates, name)?;
		trace!(key = %resolved.key, method = %name, handlers = resolved.entry.len(), "resolved");
		Some((resolved.key.clone(), resolved.entry.as_slice().to_vec()))
	}

	/// Runs the matched callables and aggregates their results.
	fn run(&self, methods: &[Method], receiver: Receiver<'_>, args: &[Value]) -> Result<Value> {
		if let [method] = methods {
			return method.call(receiver, args);
		}
		let mut results = Vec::with_capacity(methods.len());
		for method in methods {
			let result = method.call(receiver, args)?;
			if self.config.aggregation == Aggregation::SkipNil && result.is_nil() {
				continue;
			}
			results.push(result);
		}
		if results.len() == 1
			&& let Some(single) = results.pop()
		{
			return Ok(single);
		}
		Ok(Value::List(results))
	}
}

fn sole_method(args: &[Value]) -> Option<Method> {
	match args {
		[Value::Method(method)] => Some(method.clone()),
		_ => None,
	}
}
