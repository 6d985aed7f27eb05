//! Command envelope submitted to an [`AsyncWorker`](crate::AsyncWorker).
//!
//! A [`Command`] pairs an optional caller-assigned identifier with an
//! operation. The operation type is chosen by the module that owns the
//! worker: usually an enum matched exhaustively in its handler, or
//! [`OpaqueOperation`] when the module prefers integer-tag dispatch.

use std::any::Any;
use std::fmt;

/// A unit of work relayed from a producer to the worker's handler.
///
/// The core never inspects `id` or `operation`; both belong to the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<T> {
    /// Caller-assigned identifier. May be empty; uniqueness is not enforced.
    pub id: String,
    /// Operation to perform, interpreted only by the handler.
    pub operation: T,
}

impl<T> Command<T> {
    /// Creates a command with an empty identifier.
    pub fn new(operation: T) -> Self {
        Self {
            id: String::new(),
            operation,
        }
    }

    /// Creates a command with the given identifier.
    pub fn with_id(id: impl Into<String>, operation: T) -> Self {
        Self {
            id: id.into(),
            operation,
        }
    }

    /// Creates a command with a freshly generated UUID v4 identifier.
    pub fn with_generated_id(operation: T) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            operation,
        }
    }

    /// Splits the command into its identifier and operation.
    pub fn into_parts(self) -> (String, T) {
        (self.id, self.operation)
    }
}

/// Untyped operation: an integer tag plus an opaque payload.
///
/// Ownership of the payload moves with the command; once submitted the
/// producer can no longer reach it.
pub struct OpaqueOperation {
    /// Handler-defined operation tag.
    pub operation_type: i32,
    payload: Box<dyn Any + Send>,
}

impl OpaqueOperation {
    /// Wraps `payload` under the given tag.
    pub fn new<P: Any + Send>(operation_type: i32, payload: P) -> Self {
        Self {
            operation_type,
            payload: Box::new(payload),
        }
    }

    /// Borrows the payload if it is a `P`.
    #[must_use]
    pub fn payload_ref<P: Any>(&self) -> Option<&P> {
        self.payload.downcast_ref::<P>()
    }

    /// Takes the payload out if it is a `P`, otherwise returns `self` unchanged.
    ///
    /// # Errors
    ///
    /// Returns the original operation when the payload has a different type.
    pub fn into_payload<P: Any>(self) -> Result<P, Self> {
        let operation_type = self.operation_type;
        match self.payload.downcast::<P>() {
            Ok(payload) => Ok(*payload),
            Err(payload) => Err(Self {
                operation_type,
                payload,
            }),
        }
    }
}

impl fmt::Debug for OpaqueOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueOperation")
            .field("operation_type", &self.operation_type)
            .finish_non_exhaustive()
    }
}
