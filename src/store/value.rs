use crate::error::TransformError;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// An opaque value held by the store.
///
/// Cloning a `Value` is cheap and yields a handle to the same allocation.
/// Two values are *identical* when they share an allocation; the store uses
/// this, not structural equality, to decide whether a write is a change.
/// Callers that modify an aggregate must build a new `Value` for the change
/// to be seen.
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Value {
    /// Wrap `value` in a fresh allocation.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Borrow the wrapped value as `T`, if it is one.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Like [`downcast_ref`](Self::downcast_ref) but reports a mismatch as a
    /// [`TransformError`], so transforms can use `?`.
    ///
    /// # Example
    /// ```
    /// use propwire::Value;
    ///
    /// let v = Value::new(3_i64);
    /// assert_eq!(v.try_ref::<i64>(), Ok(&3));
    /// assert!(v.try_ref::<String>().is_err());
    /// ```
    pub fn try_ref<T: Any>(&self) -> Result<&T, TransformError> {
        self.downcast_ref::<T>()
            .ok_or(TransformError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                found: self.type_name,
            })
    }

    /// Returns `true` if the wrapped value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Identity comparison: `true` when both handles share one allocation.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(&other.inner))
    }

    /// Name of the wrapped type, as recorded at construction.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value<{}>@{:p}", self.type_name, Arc::as_ptr(&self.inner))
    }
}
