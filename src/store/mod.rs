//! The value store.
//!
//! Holds the current [`Value`] of every key and detects changes by identity.

mod store;
mod value;

pub use store::ValueStore;
pub use value::Value;
