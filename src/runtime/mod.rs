//! The binder context.
//!
//! This module ties the value store and the subscription registry together
//! behind [`Binder`], the handle applications pass around.

mod context;

pub use context::Binder;
