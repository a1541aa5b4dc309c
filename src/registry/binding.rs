use crate::error::TransformError;
use crate::store::Value;
use indexmap::map::Entry;
use indexmap::IndexMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

type TransformFn = dyn Fn(&Value) -> Result<Value, TransformError> + Send + Sync;

/// Maps a stored value to the value a field displays.
///
/// Cheap to clone; clones share the same function.
#[derive(Clone)]
pub struct Transform(Arc<TransformFn>);

impl Transform {
    /// A fallible transform.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// An infallible transform.
    pub fn map<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self::new(move |v| Ok(f(v)))
    }

    /// Passes the stored value through unchanged (same allocation).
    pub fn identity() -> Self {
        Self::new(|v| Ok(v.clone()))
    }

    /// Run the transform. With `isolate_panics`, a panic comes back as
    /// [`TransformError::Panicked`].
    pub fn try_apply(&self, raw: &Value, isolate_panics: bool) -> Result<Value, TransformError> {
        if !isolate_panics {
            return (self.0)(raw);
        }
        match catch_unwind(AssertUnwindSafe(|| (self.0)(raw))) {
            Ok(result) => result,
            Err(payload) => Err(TransformError::from_panic(payload.as_ref())),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transform(..)")
    }
}

/// How one field is bound: a bare key, or a key with a transform.
#[derive(Clone, Debug)]
pub enum BindingSpec {
    /// Bind the field to the key's value as-is.
    Plain(String),
    /// Bind the field to `transform(value)`.
    Configured {
        /// Store key.
        key: String,
        /// Applied to every value delivered to the field.
        transform: Transform,
    },
}

impl BindingSpec {
    /// Key this field reads from.
    pub fn key(&self) -> &str {
        match self {
            BindingSpec::Plain(key) => key,
            BindingSpec::Configured { key, .. } => key,
        }
    }

    /// The field's transform; identity for [`BindingSpec::Plain`].
    pub fn transform(&self) -> Transform {
        match self {
            BindingSpec::Plain(_) => Transform::identity(),
            BindingSpec::Configured { transform, .. } => transform.clone(),
        }
    }
}

impl From<&str> for BindingSpec {
    fn from(key: &str) -> Self {
        BindingSpec::Plain(key.to_owned())
    }
}

impl From<String> for BindingSpec {
    fn from(key: String) -> Self {
        BindingSpec::Plain(key)
    }
}

/// Field name to binding, in insertion order.
///
/// The first binding given for a field name is kept; later ones for the
/// same name are ignored, mirroring how the registry treats repeated
/// registrations.
///
/// # Example
/// ```
/// use propwire::{Bindings, Transform, Value};
///
/// let bindings = Bindings::new()
///     .bind("count", "key.2")
///     .bind_with("negated", "key.2", Transform::map(|v| {
///         Value::new(-v.downcast_ref::<i64>().copied().unwrap_or_default())
///     }));
///
/// assert_eq!(bindings.len(), 2);
/// assert_eq!(bindings.get("negated").map(|b| b.key()), Some("key.2"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Bindings {
    fields: IndexMap<String, BindingSpec>,
}

impl Bindings {
    /// An empty set of bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `field` to `spec` (a key or a [`BindingSpec`]).
    pub fn bind(mut self, field: impl Into<String>, spec: impl Into<BindingSpec>) -> Self {
        self.insert(field, spec);
        self
    }

    /// Bind `field` to `transform(value of key)`.
    pub fn bind_with(
        self,
        field: impl Into<String>,
        key: impl Into<String>,
        transform: Transform,
    ) -> Self {
        self.bind(
            field,
            BindingSpec::Configured {
                key: key.into(),
                transform,
            },
        )
    }

    /// Insert a binding in place. Returns `false` if `field` was already bound.
    pub fn insert(&mut self, field: impl Into<String>, spec: impl Into<BindingSpec>) -> bool {
        match self.fields.entry(field.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(spec.into());
                true
            }
        }
    }

    /// Binding for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&BindingSpec> {
        self.fields.get(field)
    }

    /// Number of bound fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no field is bound.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate `(field, binding)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BindingSpec)> {
        self.fields.iter().map(|(field, spec)| (field.as_str(), spec))
    }
}

impl<F, S> FromIterator<(F, S)> for Bindings
where
    F: Into<String>,
    S: Into<BindingSpec>,
{
    fn from_iter<I: IntoIterator<Item = (F, S)>>(iter: I) -> Self {
        let mut bindings = Bindings::new();
        for (field, spec) in iter {
            bindings.insert(field, spec);
        }
        bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_keeps_allocation() {
        let raw = Value::new(7_i32);
        let out = Transform::identity().try_apply(&raw, true);
        assert!(out.is_ok_and(|v| v.ptr_eq(&raw)));
    }

    #[test]
    fn map_and_new() {
        let raw = Value::new(7_i32);

        let neg = Transform::map(|v| Value::new(-v.downcast_ref::<i32>().copied().unwrap_or(0)));
        let out = neg.try_apply(&raw, true).ok();
        assert_eq!(out.as_ref().and_then(|v| v.downcast_ref::<i32>()), Some(&-7));

        let checked = Transform::new(|v| {
            let n = v.try_ref::<i32>()?;
            if *n < 0 {
                return Err(TransformError::failed("negative"));
            }
            Ok(Value::new(n.to_string()))
        });
        let out = checked.try_apply(&raw, true).ok();
        assert_eq!(
            out.as_ref().and_then(|v| v.downcast_ref::<String>()).map(String::as_str),
            Some("7")
        );
        assert_eq!(
            checked.try_apply(&Value::new(-1_i32), true).err(),
            Some(TransformError::failed("negative"))
        );
    }

    #[test]
    fn panics_are_caught_when_isolated() {
        let boom = Transform::map(|_| panic!("boom"));
        let err = boom.try_apply(&Value::new(()), true).err();
        assert_eq!(
            err,
            Some(TransformError::Panicked {
                message: "boom".into()
            })
        );
    }

    #[test]
    #[should_panic(expected = "boom")]
    fn panics_propagate_when_not_isolated() {
        let boom = Transform::map(|_| panic!("boom"));
        let _ = boom.try_apply(&Value::new(()), false);
    }

    #[test]
    fn spec_normalization() {
        let plain = BindingSpec::from("users");
        assert_eq!(plain.key(), "users");

        let raw = Value::new(1_u8);
        assert!(plain
            .transform()
            .try_apply(&raw, true)
            .is_ok_and(|v| v.ptr_eq(&raw)));
    }

    #[test]
    fn first_field_binding_wins() {
        let mut bindings = Bindings::new().bind("name", "me.name");
        assert!(!bindings.insert("name", "other.key"));
        assert_eq!(bindings.get("name").map(BindingSpec::key), Some("me.name"));
    }

    #[test]
    fn collect_preserves_order() {
        let bindings: Bindings = [("users", "users"), ("name", "me.name"), ("online", "me.online")]
            .into_iter()
            .collect();
        let fields: Vec<_> = bindings.iter().map(|(field, _)| field).collect();
        assert_eq!(fields, vec!["users", "name", "online"]);
    }
}
