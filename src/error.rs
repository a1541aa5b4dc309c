//! Error types produced while resolving bound field values.
//!
//! [`TransformError`] is the only error type in the crate and it never escapes
//! the public store API: when a field transform fails, the registry logs the
//! error and delivers the raw stored value instead.

use thiserror::Error;

/// # Errors produced by field transforms.
///
/// Transforms return `Result<Value, TransformError>`. Any `Err` (or a caught
/// panic, see [`Config::isolate_panics`](crate::Config::isolate_panics)) makes
/// the registry fall back to the untransformed value for that field.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// The transform rejected its input.
    #[error("transform failed: {reason}")]
    Failed {
        /// Human-readable cause.
        reason: String,
    },

    /// The stored value does not hold the type the transform expects.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Type the transform asked for.
        expected: &'static str,
        /// Type actually stored in the value.
        found: &'static str,
    },

    /// The transform panicked and the panic was caught.
    #[error("transform panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },
}

impl TransformError {
    /// Shorthand for [`TransformError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        TransformError::Failed {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use propwire::TransformError;
    ///
    /// let err = TransformError::failed("negative input");
    /// assert_eq!(err.as_label(), "transform_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TransformError::Failed { .. } => "transform_failed",
            TransformError::TypeMismatch { .. } => "transform_type_mismatch",
            TransformError::Panicked { .. } => "transform_panicked",
        }
    }

    /// Builds a [`TransformError::Panicked`] from a `catch_unwind` payload.
    pub(crate) fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        TransformError::Panicked { message }
    }
}
