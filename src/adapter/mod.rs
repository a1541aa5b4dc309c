//! Rendering-engine adapter.
//!
//! [`Connected`] turns mount/unmount signals into binder calls and keeps the
//! local state a component renders from.

mod connected;

pub use connected::{Connected, ConnectedBuilder};
