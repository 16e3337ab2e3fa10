pub mod favorites;
pub mod ingredients;
pub mod recipes;

use crate::error::AppError;
use crate::model::{GENERIC_FAIL, GENERIC_FAIL_MESSAGE};

/// Collapse an unexpected store failure into the generic user-facing error,
/// keeping the original as the cause chain for logs.
pub(crate) fn wrap_unexpected(err: AppError, operation: &'static str) -> AppError {
    AppError::new(GENERIC_FAIL, GENERIC_FAIL_MESSAGE)
        .with_context("operation", operation)
        .with_cause(err)
}
