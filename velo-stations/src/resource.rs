//! Tri-state wrapper for the outcome of an asynchronous fetch.
//!
//! A fetch is always `Loading` before it settles into `Success` or `Error`.
//! Consumers treat `Loading` as "keep showing what you had"; it never
//! carries a payload, and neither does `Error`.

use std::fmt;

/// Outcome of a fetch, with failures represented as data.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource<T> {
    /// A fetch is in flight.
    Loading,
    /// The fetch succeeded.
    Success(T),
    /// The fetch failed; the message is presentable to the user.
    Error(String),
}

impl<T> Resource<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Resource::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Resource::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Resource::Error(_))
    }

    /// The payload, if this is `Success`.
    pub fn success(&self) -> Option<&T> {
        match self {
            Resource::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Consume the wrapper, returning the payload if this is `Success`.
    pub fn into_success(self) -> Option<T> {
        match self {
            Resource::Success(value) => Some(value),
            _ => None,
        }
    }

    /// The error message, if this is `Error`.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Resource::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Transform the payload, keeping `Loading` and `Error` as they are.
    pub fn map<U, F>(self, f: F) -> Resource<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Resource::Loading => Resource::Loading,
            Resource::Success(value) => Resource::Success(f(value)),
            Resource::Error(message) => Resource::Error(message),
        }
    }
}

impl<T, E: fmt::Display> From<Result<T, E>> for Resource<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Resource::Success(value),
            Err(e) => Resource::Error(e.to_string()),
        }
    }
}
