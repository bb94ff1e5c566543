//! The value captured when an operation under test fails.

use std::any::Any;
use std::fmt;

/// An error returned by, or a panic raised from, the operation under test.
///
/// Matchers inspect a `Failure` through its [`message`](Failure::message),
/// or recover the concrete value with [`downcast_ref`](Failure::downcast_ref).
pub struct Failure {
    message: String,
    payload: Box<dyn Any + Send>,
    panicked: bool,
}

impl Failure {
    pub(crate) fn from_error<E>(err: E) -> Failure
    where
        E: fmt::Display + Send + 'static,
    {
        Failure {
            message: err.to_string(),
            payload: Box::new(err),
            panicked: false,
        }
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Failure {
        Failure {
            message: panic_message(&*payload),
            payload,
            panicked: true,
        }
    }

    /// The `Display` form of the error, or the message the operation
    /// panicked with.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the operation panicked instead of returning an error.
    pub fn is_panic(&self) -> bool {
        self.panicked
    }

    /// Returns the captured value if it is of type `T`.
    ///
    /// For a returned `Err(e)` the captured value is `e`. For a panic it is
    /// the panic payload, usually a `&'static str` or a `String`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        let payload: &(dyn Any + Send) = &*self.payload;
        payload.downcast_ref::<T>()
    }

    /// Whether the captured value is of type `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    /// Consumes the failure, returning the captured value.
    pub fn into_inner(self) -> Box<dyn Any + Send> {
        self.payload
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("message", &self.message)
            .field("panicked", &self.panicked)
            .finish_non_exhaustive()
    }
}

// Same fallback text the standard panic hook prints.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}
