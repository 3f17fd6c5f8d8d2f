//! Runtime method registration and dispatch.
//!
//! Host types opt in with [`impl_prototype!`]; methods are then attached at
//! runtime to a whole type or to one live instance, and types can extend
//! other types to inherit their methods.
//!
//! # Modules
//!
//! - [`dispatch`] - The [`Dispatcher`] context and the invocation policy
//! - [`table`] - Method storage keyed by type or instance
//! - [`extension`] - Mixin edges between types
//! - [`scope`] - The instance currently mid-registration
//! - [`identity`] - Instance keys and the weak identity map
//! - [`host`] - Hooks for routing unknown host calls
//! - [`config`] - Dispatch policy knobs, loadable from TOML
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//!
//! use protomix_registry::{Dispatcher, Instance, Method, Value, impl_prototype};
//!
//! struct User;
//! impl_prototype!(User);
//!
//! let mut dispatch = Dispatcher::new();
//! dispatch.define("User", "greet", Method::new(|_, _| Ok(Value::from("hi"))));
//!
//! let alice: Instance = Rc::new(User);
//! assert_eq!(dispatch.invoke(&alice, "GREET", &[]).unwrap(), Value::from("hi"));
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod extension;
pub mod host;
pub mod identity;
pub mod scope;
pub mod table;

pub use config::{Aggregation, DispatchConfig, MixinMode, Precedence};
pub use dispatch::{Dispatcher, Target};
pub use error::{ConfigError, DispatchError};
pub use extension::ExtensionGraph;
pub use host::Hooked;
pub use identity::{IdentifierService, IdentityMap, SequentialIdentifier, UuidIdentifier};
pub use protomix_primitives::{
	Instance, InstanceKey, Method, MethodName, Prototype, Receiver, Result, TypeKey, Value,
	impl_prototype, same_instance,
};
pub use scope::ScopeCell;
pub use table::{MethodEntry, MethodTable, Resolved, TableKey};
