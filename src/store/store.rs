use super::Value;
use parking_lot::RwLock;
use std::collections::HashMap;

/// The mapping from key to current value.
///
/// `ValueStore` only detects changes; it does not know about subscribers.
/// [`Binder::set`](crate::Binder::set) pairs it with the registry to fan out
/// confirmed changes.
#[derive(Default)]
pub struct ValueStore {
    data: RwLock<HashMap<String, Value>>,
}

impl ValueStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole content of the store.
    ///
    /// `None` resets the store to empty. This is a bulk load, not a change:
    /// nothing is reported, and subscribers keep their last delivered values
    /// until the next `set` on their keys.
    pub fn init(&self, initial: Option<HashMap<String, Value>>) {
        let data = initial.unwrap_or_default();
        tracing::debug!(message = "store.init", keys = data.len());
        *self.data.write() = data;
    }

    /// Current value for `key`, or `None` if the key was never set.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.data.read().get(key).cloned()
    }

    /// Write `value` under `key` unless the identical value is already stored.
    ///
    /// Returns `true` when the store changed. Identity, not equality, decides:
    /// an equal value in a new allocation counts as a change.
    pub fn set(&self, key: &str, value: Value) -> bool {
        let mut data = self.data.write();
        match data.get(key) {
            Some(current) if current.ptr_eq(&value) => false,
            _ => {
                data.insert(key.to_owned(), value);
                true
            }
        }
    }

    /// Returns `true` if `key` holds a value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Number of keys holding a value.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns `true` if no key holds a value.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Snapshot of the keys currently set, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }

    /// Drop every value.
    pub fn clear(&self) {
        self.data.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_absent_key_is_none() {
        let store = ValueStore::new();
        assert!(store.get("missing").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn set_reports_changes_by_identity() {
        let store = ValueStore::new();
        let v = Value::new(1_i32);

        assert!(store.set("count", v.clone()));
        assert!(!store.set("count", v.clone()));

        // Same content, new allocation: still a change.
        assert!(store.set("count", Value::new(1_i32)));
        assert!(!store.get("count").is_some_and(|stored| stored.ptr_eq(&v)));
    }

    #[test]
    fn init_replaces_everything() {
        let store = ValueStore::new();
        store.set("stale", Value::new(()));

        let mut seed = HashMap::new();
        seed.insert("me.name".to_string(), Value::new("Thomas"));
        seed.insert("me.online".to_string(), Value::new(true));
        store.init(Some(seed));

        assert_eq!(store.len(), 2);
        assert!(!store.contains_key("stale"));
        assert_eq!(
            store.get("me.online").and_then(|v| v.downcast_ref::<bool>().copied()),
            Some(true)
        );
    }

    #[test]
    fn init_none_resets() {
        let store = ValueStore::new();
        store.set("a", Value::new(1_u8));
        store.init(None);
        assert!(store.is_empty());
        assert!(store.get("a").is_none());
    }

    #[test]
    fn keys_and_clear() {
        let store = ValueStore::new();
        store.set("a", Value::new(1_u8));
        store.set("b", Value::new(2_u8));

        let mut keys = store.keys();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

        store.clear();
        assert!(store.is_empty());
    }
}
