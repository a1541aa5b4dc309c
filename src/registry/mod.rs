//! Subscription registry.
//!
//! Tracks which subscriber fields are bound to which keys, delivers changed
//! values to live subscribers and lazily collects stale ones.

mod binding;
mod registry;
mod subscriber;

pub use binding::{BindingSpec, Bindings, Transform};
pub use registry::SubscriptionRegistry;
pub use subscriber::{FieldMap, LivenessSource, Subscriber};
