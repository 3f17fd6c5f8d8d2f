use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use protomix_registry::{
	DispatchConfig, DispatchError, Dispatcher, Hooked, Instance, Method, MixinMode, Receiver,
	SequentialIdentifier, Value, impl_prototype, same_instance,
};
use rstest::rstest;

#[derive(Default)]
struct User {
	visits: Cell<i64>,
}
impl_prototype!(User);

#[derive(Default)]
struct Customer {
	visits: Cell<i64>,
}
impl_prototype!(Customer);

fn visits(receiver: Receiver<'_>) -> Option<&Cell<i64>> {
	receiver
		.downcast_ref::<User>()
		.map(|user| &user.visits)
		.or_else(|| receiver.downcast_ref::<Customer>().map(|customer| &customer.visits))
}

fn bump(by: i64) -> Method {
	Method::new(move |receiver, _| {
		let counter = visits(receiver).ok_or_else(|| DispatchError::failed("no counter"))?;
		counter.set(counter.get() + by);
		Ok(Value::Int(counter.get()))
	})
}

fn dispatcher(mixin: MixinMode) -> Dispatcher {
	let _ = tracing_subscriber::fmt::try_init();
	let config = DispatchConfig {
		mixin,
		..DispatchConfig::default()
	};
	Dispatcher::with_identifier(config, SequentialIdentifier::default())
}

fn user() -> Instance {
	Rc::new(User::default())
}

fn customer() -> Instance {
	Rc::new(Customer::default())
}

fn counter_of(instance: &Instance) -> i64 {
	instance
		.downcast_ref::<User>()
		.map(|user| user.visits.get())
		.or_else(|| instance.downcast_ref::<Customer>().map(|c| c.visits.get()))
		.unwrap_or_default()
}

#[rstest]
fn test_handler_runs_on_every_call(#[values(MixinMode::Live, MixinMode::Snapshot)] mixin: MixinMode) {
	let mut dispatch = dispatcher(mixin);
	dispatch.define("User", "visit", bump(1));
	let alice = user();
	dispatch.invoke(&alice, "visit", &[]).unwrap();
	dispatch.invoke(&alice, "visit", &[]).unwrap();
	assert_eq!(counter_of(&alice), 2);
}

#[rstest]
fn test_type_handler_visible_to_all_instances(
	#[values(MixinMode::Live, MixinMode::Snapshot)] mixin: MixinMode,
) {
	let mut dispatch = dispatcher(mixin);
	let before = user();
	dispatch.define("User", "visit", bump(1));
	let after = user();
	assert_eq!(dispatch.invoke(&before, "visit", &[]).unwrap(), Value::Int(1));
	assert_eq!(dispatch.invoke(&after, "visit", &[]).unwrap(), Value::Int(1));
}

#[rstest]
fn test_extension_binds_receiver_to_extender(
	#[values(MixinMode::Live, MixinMode::Snapshot)] mixin: MixinMode,
) {
	let mut dispatch = dispatcher(mixin);
	dispatch.define(
		"User",
		"kind",
		Method::new(|receiver, _| Ok(Value::from(receiver.type_name()))),
	);
	dispatch.define("User", "visit", bump(1));
	dispatch.extend("Customer", "User");

	let carol = customer();
	assert_eq!(dispatch.invoke(&carol, "kind", &[]).unwrap(), Value::from("Customer"));
	dispatch.invoke(&carol, "visit", &[]).unwrap();
	assert_eq!(counter_of(&carol), 1);
}

#[rstest]
fn test_multiple_handlers_all_run(#[values(MixinMode::Live, MixinMode::Snapshot)] mixin: MixinMode) {
	let mut dispatch = dispatcher(mixin);
	dispatch.define("User", "visit", bump(1));
	dispatch.define("User", "visit", bump(2));
	let alice = user();

	let first = dispatch.invoke(&alice, "visit", &[]).unwrap();
	assert_eq!(first, Value::List(vec![Value::Int(1), Value::Int(3)]));
	assert_eq!(counter_of(&alice), 3);
	dispatch.invoke(&alice, "visit", &[]).unwrap();
	assert_eq!(counter_of(&alice), 6);
}

#[test]
fn test_unknown_method_reports_name_and_type() {
	let mut dispatch = dispatcher(MixinMode::Live);
	let alice = user();
	let err = alice.call(&mut dispatch, "fly", &[]).unwrap_err();
	assert_eq!(err, DispatchError::not_found("fly", "User"));
	assert_eq!(err.to_string(), r#"method ("fly") not found ("User")"#);
	assert!(!dispatch.scope().is_occupied());
}

#[rstest]
fn test_double_extend_is_single_extend(
	#[values(MixinMode::Live, MixinMode::Snapshot)] mixin: MixinMode,
) {
	let mut dispatch = dispatcher(mixin);
	dispatch.define("User", "visit", bump(1));
	assert!(dispatch.extend("Customer", "User"));
	assert!(!dispatch.extend("Customer", "User"));
	assert_eq!(dispatch.graph().len(), 1);

	let carol = customer();
	assert_eq!(dispatch.invoke(&carol, "visit", &[]).unwrap(), Value::Int(1));
}

#[test]
fn test_host_hook_registration_flow() {
	let mut dispatch = dispatcher(MixinMode::Live);
	let alice = user();
	let bob = user();

	let chained = alice.call(&mut dispatch, "visit", &[Value::Method(bump(5))]).unwrap();
	assert!(matches!(chained, Value::Instance(ref i) if same_instance(i, &alice)));
	assert_eq!(alice.call(&mut dispatch, "VISIT", &[]).unwrap(), Value::Int(5));
	assert!(bob.call(&mut dispatch, "visit", &[]).is_err());

	dispatch.call_static("User", "visit", &[Value::Method(bump(1))]).unwrap();
	assert_eq!(bob.call(&mut dispatch, "visit", &[]).unwrap(), Value::Int(1));
	assert_eq!(alice.call(&mut dispatch, "visit", &[]).unwrap(), Value::Int(10));
}

#[test]
fn test_legacy_config_behaves_like_snapshot_copy() {
	let _ = tracing_subscriber::fmt::try_init();
	let config = DispatchConfig::from_toml(
		r#"
		precedence = "type-first"
		aggregation = "skip-nil"
		mixin = "snapshot"
		"#,
	)
	.unwrap();
	assert_eq!(config, DispatchConfig::legacy());

	let mut dispatch = Dispatcher::with_config(config);
	let alice = user();
	dispatch.define(&alice, "who", Method::new(|_, _| Ok(Value::from("instance"))));
	dispatch.define("User", "who", Method::new(|_, _| Ok(Value::from("type"))));
	assert_eq!(dispatch.invoke(&alice, "who", &[]).unwrap(), Value::from("type"));

	dispatch.define("User", "quiet", Method::new(|_, _| Ok(Value::Nil)));
	dispatch.define("User", "quiet", Method::new(|_, _| Ok(Value::Int(1))));
	assert_eq!(dispatch.invoke(&alice, "quiet", &[]).unwrap(), Value::Int(1));
}

#[test]
fn test_snapshot_propagates_through_chains() {
	let mut dispatch = dispatcher(MixinMode::Snapshot);
	dispatch.extend("Customer", "User");
	dispatch.extend("Vip", "Customer");
	dispatch.define("User", "kind", Method::new(|_, _| Ok(Value::from("user"))));
	assert!(dispatch.responds_to("Vip", "kind"));
	assert_eq!(dispatch.invoke("vip", "kind", &[]).unwrap(), Value::from("user"));
}

proptest! {
	#[test]
	fn instance_shadow_is_stable(calls in 1usize..16, names in proptest::collection::btree_set("[a-z]{1,8}", 1..4)) {
		let mut dispatch = dispatcher(MixinMode::Live);
		let alice = user();
		for name in &names {
			dispatch.define("User", name, Method::new(|_, _| Ok(Value::from("type"))));
			dispatch.define(&alice, name, Method::new(|_, _| Ok(Value::from("instance"))));
		}
		for _ in 0..calls {
			for name in &names {
				let result = dispatch.invoke(&alice, &name.to_uppercase(), &[]).unwrap();
				prop_assert_eq!(result, Value::from("instance"));
			}
		}
	}

	#[test]
	fn repeated_extend_is_idempotent(times in 1usize..8) {
		let mut dispatch = dispatcher(MixinMode::Live);
		let linked = (0..times).filter(|_| dispatch.extend("Customer", "User")).count();
		prop_assert_eq!(linked, 1);
		prop_assert_eq!(dispatch.extensions("customer").len(), 1);
	}
}
