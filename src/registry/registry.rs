use super::binding::{Bindings, Transform};
use super::subscriber::{same_subscriber, FieldMap, Subscriber};
use crate::store::{Value, ValueStore};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// One subscriber's bindings on one key.
#[derive(Clone)]
struct Entry {
    subscriber: Arc<dyn Subscriber>,
    /// Field name to transform. A field's transform is fixed on first insert.
    fields: Vec<(String, Transform)>,
}

impl Entry {
    fn transform_for(&self, field: &str) -> Option<&Transform> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, transform)| transform)
    }
}

/// Key to subscriber bindings, with fan-out and lazy pruning.
///
/// Per key, entries are kept in registration order and each subscriber
/// appears at most once. A subscriber whose liveness flag turns false is not
/// removed right away: its entries stay until a prune pass runs, either
/// explicitly or because a notification came across it. A detached
/// subscriber whose keys never change again therefore keeps its entries
/// until some prune pass happens.
pub struct SubscriptionRegistry {
    entries: RwLock<HashMap<String, Vec<Entry>>>,
    isolate_panics: bool,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    pub fn new(isolate_panics: bool) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            isolate_panics,
        }
    }

    /// Bind `subscriber`'s fields to store keys and deliver its initial state.
    ///
    /// Silently does nothing when the subscriber is not live or `bindings` is
    /// empty. Fields whose key is empty are skipped. A field already bound
    /// for this subscriber keeps its first transform.
    ///
    /// The subscriber receives one patch holding every staged field, computed
    /// from the current store values.
    pub fn register(
        &self,
        store: &ValueStore,
        subscriber: Arc<dyn Subscriber>,
        bindings: &Bindings,
    ) {
        if !subscriber.is_live() {
            tracing::debug!(message = "registry.register.ignored", reason = "not_live");
            return;
        }
        if bindings.is_empty() {
            tracing::debug!(message = "registry.register.ignored", reason = "no_bindings");
            return;
        }

        let mut staged: Vec<(String, String, Transform)> = Vec::with_capacity(bindings.len());
        {
            let mut entries = self.entries.write();
            for (field, spec) in bindings.iter() {
                let key = spec.key();
                if key.is_empty() {
                    tracing::debug!(
                        message = "registry.register.skip_field",
                        field,
                        reason = "empty_key"
                    );
                    continue;
                }

                let list = entries.entry(key.to_owned()).or_default();
                let existing = list
                    .iter()
                    .position(|e| same_subscriber(&e.subscriber, &subscriber));
                let idx = match existing {
                    Some(idx) => idx,
                    None => {
                        list.push(Entry {
                            subscriber: Arc::clone(&subscriber),
                            fields: Vec::new(),
                        });
                        list.len() - 1
                    }
                };
                let entry = &mut list[idx];
                let transform = match entry.transform_for(field) {
                    Some(existing) => existing.clone(),
                    None => {
                        let transform = spec.transform();
                        entry.fields.push((field.to_owned(), transform.clone()));
                        transform
                    }
                };
                staged.push((field.to_owned(), key.to_owned(), transform));
            }
        }

        if staged.is_empty() {
            return;
        }

        let mut snapshot = FieldMap::with_capacity(staged.len());
        for (field, key, transform) in staged {
            let value = store
                .get(&key)
                .map(|raw| self.resolve(&key, &field, &transform, &raw));
            snapshot.insert(field, value);
        }
        tracing::trace!(message = "registry.register.deliver", fields = snapshot.len());
        subscriber.apply_partial_state(snapshot);
    }

    /// Deliver a changed `value` of `key` to every live subscriber bound to it.
    ///
    /// Subscribers are visited in registration order and each receives one
    /// patch holding all of its fields bound to `key`. Stale subscribers are
    /// skipped; if any was seen, a full [`prune`](Self::prune) runs once the
    /// fan-out is complete.
    ///
    /// Transforms and subscriber callbacks run with no lock held. A transform
    /// must not `set` the key being delivered: that would start a nested
    /// fan-out for the same key, which is not guarded against.
    ///
    /// Returns the number of subscribers that received a patch.
    pub fn notify(&self, key: &str, value: &Value) -> usize {
        let targets: Vec<Entry> = match self.entries.read().get(key) {
            Some(list) if !list.is_empty() => list.clone(),
            _ => return 0,
        };

        let mut delivered = 0;
        let mut prune_needed = false;
        for entry in targets {
            if !entry.subscriber.is_live() {
                prune_needed = true;
                continue;
            }
            let mut patch = FieldMap::with_capacity(entry.fields.len());
            for (field, transform) in &entry.fields {
                patch.insert(field.clone(), Some(self.resolve(key, field, transform, value)));
            }
            tracing::trace!(message = "registry.notify.deliver", key, fields = patch.len());
            entry.subscriber.apply_partial_state(patch);
            delivered += 1;
        }

        if prune_needed {
            self.prune();
        }
        delivered
    }

    /// Drop every entry whose subscriber is no longer live, on every key.
    ///
    /// Liveness is read with no lock held, so `is_live` may query the
    /// registry. Keys left without entries are removed. Returns the number
    /// of entries removed.
    pub fn prune(&self) -> usize {
        let subscribers: Vec<Arc<dyn Subscriber>> = self
            .entries
            .read()
            .values()
            .flatten()
            .map(|e| Arc::clone(&e.subscriber))
            .collect();
        let stale: Vec<Arc<dyn Subscriber>> = subscribers
            .into_iter()
            .filter(|s| !s.is_live())
            .collect();
        if stale.is_empty() {
            tracing::debug!(message = "registry.prune", removed = 0_usize);
            return 0;
        }

        let mut entries = self.entries.write();
        let mut removed = 0;
        entries.retain(|_, list| {
            let before = list.len();
            list.retain(|e| !stale.iter().any(|s| same_subscriber(s, &e.subscriber)));
            removed += before - list.len();
            !list.is_empty()
        });
        tracing::debug!(message = "registry.prune", removed);
        removed
    }

    /// Number of subscribers bound to `key`, stale ones included.
    pub fn subscriber_count(&self, key: &str) -> usize {
        self.entries.read().get(key).map_or(0, Vec::len)
    }

    /// Returns `true` if `subscriber` has an entry on `key`.
    pub fn is_bound(&self, key: &str, subscriber: &Arc<dyn Subscriber>) -> bool {
        self.entries
            .read()
            .get(key)
            .is_some_and(|list| list.iter().any(|e| same_subscriber(&e.subscriber, subscriber)))
    }

    /// Field names `subscriber` has bound on `key`, in binding order.
    pub fn bound_fields(&self, key: &str, subscriber: &Arc<dyn Subscriber>) -> Vec<String> {
        self.entries
            .read()
            .get(key)
            .and_then(|list| list.iter().find(|e| same_subscriber(&e.subscriber, subscriber)))
            .map(|e| e.fields.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    /// Total number of (subscriber, key) entries.
    pub fn total_bindings(&self) -> usize {
        self.entries.read().values().map(Vec::len).sum()
    }

    /// Keys with at least one entry, in no particular order.
    pub fn bound_keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Forget every binding.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Run a field's transform, falling back to the raw value on failure.
    ///
    /// This is the only place a [`TransformError`](crate::TransformError) is
    /// consumed.
    fn resolve(&self, key: &str, field: &str, transform: &Transform, raw: &Value) -> Value {
        match transform.try_apply(raw, self.isolate_panics) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    message = "registry.transform_failed",
                    key,
                    field,
                    label = err.as_label(),
                    error = %err
                );
                raw.clone()
            }
        }
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new(true)
    }
}
