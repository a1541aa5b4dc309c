use crate::config::Config;
use crate::registry::{Bindings, Subscriber, SubscriptionRegistry};
use crate::store::{Value, ValueStore};
use std::collections::HashMap;
use std::sync::Arc;

/// The store and its subscription registry, behind one handle.
///
/// A `Binder` is an explicit context: create one per application (or per
/// test) and pass it by reference. It is the only write path into the store.
///
/// All work happens inside the call that started it. `set` updates the store
/// and delivers to every bound subscriber before returning; `register`
/// delivers the initial snapshot before returning. Nothing is queued.
///
/// # Examples
///
/// ```
/// use propwire::{Binder, Bindings, Connected, Value};
///
/// let binder = Binder::new();
/// binder.set("count", Value::new(123_i64));
///
/// let counter = Connected::new(Bindings::new().bind("count", "count"));
/// counter.on_attach(&binder);
/// assert_eq!(counter.field_as::<i64>("count"), Some(123));
///
/// binder.set("count", Value::new(456_i64));
/// assert_eq!(counter.field_as::<i64>("count"), Some(456));
/// ```
pub struct Binder {
    config: Config,
    store: ValueStore,
    registry: SubscriptionRegistry,
}

impl Binder {
    /// Create an empty binder with the default [`Config`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an empty binder with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            store: ValueStore::new(),
            registry: SubscriptionRegistry::new(config.isolate_panics),
            config,
        }
    }

    /// Run a function against a fresh binder, tearing it down afterwards.
    ///
    /// # Examples
    ///
    /// ```
    /// use propwire::{Binder, Value};
    ///
    /// let len = Binder::scope(|binder| {
    ///     binder.set("a", Value::new(1_u8));
    ///     binder.store().len()
    /// });
    /// assert_eq!(len, 1);
    /// ```
    pub fn scope<F, R>(f: F) -> R
    where
        F: FnOnce(&Binder) -> R,
    {
        let binder = Self::new();
        let result = f(&binder);
        binder.teardown();
        result
    }

    /// The configuration this binder was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replace all store content; `None` empties the store.
    ///
    /// Bulk load only: no subscriber is notified, so existing subscribers keep
    /// showing their previous values until the next `set` on their keys.
    /// Bindings are left as they are.
    pub fn init(&self, initial: Option<HashMap<String, Value>>) {
        self.store.init(initial);
    }

    /// Current value of `key`, or `None` if it was never set.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.store.get(key)
    }

    /// Store `value` under `key` and, if that changed the store, deliver it to
    /// the subscribers bound to `key`.
    ///
    /// Writing the identical value (same allocation) again is a no-op.
    pub fn set(&self, key: &str, value: Value) {
        if !self.store.set(key, value.clone()) {
            tracing::trace!(message = "binder.set.unchanged", key);
            return;
        }
        let delivered = self.registry.notify(key, &value);
        tracing::debug!(message = "binder.set", key, delivered);
    }

    /// Bind `subscriber`'s fields to keys and deliver its initial state.
    ///
    /// Silently ignored when the subscriber is not live or `bindings` is empty.
    pub fn register<S>(&self, subscriber: &Arc<S>, bindings: &Bindings)
    where
        S: Subscriber + 'static,
    {
        let subscriber: Arc<dyn Subscriber> = Arc::clone(subscriber) as Arc<dyn Subscriber>;
        self.register_shared(&subscriber, bindings);
    }

    /// [`register`](Self::register) for an already type-erased handle.
    pub fn register_shared(&self, subscriber: &Arc<dyn Subscriber>, bindings: &Bindings) {
        self.registry.register(&self.store, Arc::clone(subscriber), bindings);
    }

    /// Remove bindings of subscribers that are no longer live.
    ///
    /// Returns how many bindings were removed.
    pub fn prune(&self) -> usize {
        self.registry.prune()
    }

    /// Clear both the store and every binding.
    pub fn teardown(&self) {
        self.store.clear();
        self.registry.clear();
        tracing::debug!(message = "binder.teardown");
    }

    /// The underlying value store.
    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    /// The underlying subscription registry.
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}
