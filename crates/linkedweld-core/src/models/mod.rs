//! Data models for LinkedWeld

mod alert;
mod candidate;
mod dashboard;
mod document;
mod expense;
mod notification;
mod project;
mod worker;

pub use alert::*;
pub use candidate::*;
pub use dashboard::*;
pub use document::*;
pub use expense::*;
pub use notification::*;
pub use project::*;
pub use worker::*;

use crate::error::{Error, Result};

/// Trim a required text field, rejecting blanks
pub(crate) fn required_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field, mapping blanks to `None`
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Reject negative or non-finite money amounts
pub(crate) fn non_negative(field: &str, value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::validation(format!("{field} must be zero or greater")));
    }
    Ok(value)
}
