//! # Binder configuration.
//!
//! [`Config`] controls how eagerly bindings of detached subscribers are
//! collected and whether panicking transforms are isolated.
//!
//! # Example
//! ```
//! use propwire::{Binder, Config};
//!
//! let mut cfg = Config::default();
//! cfg.prune_on_detach = false;
//!
//! let binder = Binder::with_config(cfg);
//! assert!(!binder.config().prune_on_detach);
//! ```

/// Configuration for a [`Binder`](crate::Binder).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Run a full prune pass from the adapter's detach hook.
    ///
    /// When disabled, a detached subscriber keeps its bindings until a
    /// notification on one of its keys observes it as stale.
    pub prune_on_detach: bool,
    /// Treat a panicking transform like one returning an error.
    ///
    /// When disabled, the panic unwinds through `set` or `register`.
    pub isolate_panics: bool,
}

impl Default for Config {
    /// Provides a default configuration:
    /// - `prune_on_detach = true`
    /// - `isolate_panics = true`
    fn default() -> Self {
        Self {
            prune_on_detach: true,
            isolate_panics: true,
        }
    }
}
