use crate::store::Value;
use indexmap::IndexMap;
use std::sync::Arc;

/// Field name to field value. `None` marks a field whose key holds no value.
pub type FieldMap = IndexMap<String, Option<Value>>;

/// Reports whether a subscriber should still receive updates.
///
/// The flag is owned by whoever drives the subscriber's lifecycle. The
/// registry only reads it: when registering, once per binding during a
/// notification, and during a prune pass. It is never read while the
/// registry holds its lock, so an implementation may query the registry.
pub trait LivenessSource {
    /// `true` while the subscriber is attached.
    fn is_live(&self) -> bool;
}

/// A consumer of bound field values.
pub trait Subscriber: LivenessSource + Send + Sync {
    /// Merge `patch` over the subscriber's local state, leaving fields not in
    /// the patch untouched.
    ///
    /// Called once per registration and once per notification, never once
    /// per field.
    fn apply_partial_state(&self, patch: FieldMap);
}

/// Identity of a subscriber handle: the address of its allocation.
pub(crate) fn same_subscriber(a: &Arc<dyn Subscriber>, b: &Arc<dyn Subscriber>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
