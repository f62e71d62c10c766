/// Error types for the clinic core.
///
/// Every fallible operation in the crate returns `ClinicResult`, and the
/// variants follow the four outcomes a caller has to handle differently:
/// bad input, a conflicting record, a permission denial, and a missing
/// record. Validation and conflict errors carry a message suitable for
/// showing to the user; denials and not-found terminate the request.

use thiserror::Error;

pub type ClinicResult<T> = Result<T, ClinicError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClinicError {
    /// Missing or malformed form input.
    #[error("{0}")]
    Validation(String),

    /// The request was well-formed but collides with an existing record,
    /// such as a double-booked time or a duplicate email.
    #[error("{0}")]
    Conflict(String),

    /// The actor lacks permission for the operation. Not recoverable by
    /// retrying with different input.
    #[error("You do not have permission to perform that action")]
    Denied,

    /// A referenced id did not resolve to a record.
    #[error("The requested record was not found")]
    NotFound,
}

impl ClinicError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClinicError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ClinicError::Conflict(message.into())
    }

    /// Whether the error carries a message meant for the user, as opposed
    /// to a denial or missing record that ends the request outright.
    pub fn is_displayable(&self) -> bool {
        matches!(
            self,
            ClinicError::Validation(_) | ClinicError::Conflict(_)
        )
    }
}
