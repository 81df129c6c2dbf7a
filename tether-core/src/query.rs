//! Fail-fast query helpers

use crate::error::{DbError, Result};

/// Turn an optional row into `NotFound` when absent.
pub trait OptionExt<T> {
    fn or_not_found(self, what: impl Into<String>) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, what: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| DbError::not_found(what))
    }
}
