//! # Propwire
//!
//! A reactive key-value store that keeps the local state of live subscribers
//! in sync with store keys.
//!
//! ## Store and registry
//!
//! - [`ValueStore`] - key to current [`Value`], change detection by identity
//! - [`SubscriptionRegistry`] - key to subscriber bindings, fan-out and lazy
//!   pruning of stale subscribers
//! - [`Binder`] - the context object tying both together; the only write path
//!
//! ## Bindings
//!
//! A subscriber binds named fields to keys through [`Bindings`]. Each field
//! either mirrors its key or shows a [`Transform`] of the key's value. A
//! transform that fails (or panics) never blocks delivery: the raw value is
//! shown instead.
//!
//! ## Adapter
//!
//! [`Connected`] implements [`Subscriber`] for a component driven by a
//! rendering engine: attach and detach hooks, merged local state and a
//! render hook.
//!
//! ```
//! use propwire::{Binder, Bindings, Connected, Transform, Value};
//!
//! let binder = Binder::new();
//! binder.set("count", Value::new(1_i64));
//!
//! let view = Connected::new(
//!     Bindings::new()
//!         .bind("count", "count")
//!         .bind_with("negated", "count", Transform::new(|v| {
//!             Ok(Value::new(-*v.try_ref::<i64>()?))
//!         })),
//! );
//! view.on_attach(&binder);
//!
//! binder.set("count", Value::new(5_i64));
//! assert_eq!(view.field_as::<i64>("count"), Some(5));
//! assert_eq!(view.field_as::<i64>("negated"), Some(-5));
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod registry;
pub mod runtime;
pub mod store;

pub use adapter::{Connected, ConnectedBuilder};
pub use config::Config;
pub use error::TransformError;
pub use registry::{
    BindingSpec, Bindings, FieldMap, LivenessSource, Subscriber, SubscriptionRegistry, Transform,
};
pub use runtime::Binder;
pub use store::{Value, ValueStore};
