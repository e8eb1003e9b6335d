//! Fatal error taxonomy.
//!
//! Only deployment-level failures abort a comparison: an unreachable
//! endpoint, rejected credentials, an expired deadline, or a driver failure
//! during a global phase. Per-namespace read failures degrade to a
//! `transient read error` mismatch instead (see `MismatchReason`), since
//! comparisons intentionally run against clusters under concurrent mutation.

use mongodb::error::{Error as DriverError, ErrorKind};
use std::time::Duration;

/// Errors that abort the whole comparison. No partial report is produced.
#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    /// No endpoint responded within the probe window.
    #[error("endpoint unreachable: {0}")]
    Connectivity(String),

    /// Credentials were rejected by the deployment.
    #[error("authorization rejected: {0}")]
    Authorization(String),

    /// The caller's deadline expired; partial results are discarded.
    #[error("comparison deadline expired after {0:?}")]
    DeadlineExceeded(Duration),

    /// Any other driver failure during a global phase.
    #[error(transparent)]
    Driver(#[from] DriverError),
}

// MongoDB "Unauthorized" and "AuthenticationFailed" server codes.
const CODE_UNAUTHORIZED: i32 = 13;
const CODE_AUTHENTICATION_FAILED: i32 = 18;

/// Map a driver error onto the comparison taxonomy. Server-selection and
/// I/O failures mean the endpoint is unreachable; authentication failures
/// and the two server-side authorization codes are credential problems.
pub fn classify_driver_error(err: DriverError) -> CompareError {
    match err.kind.as_ref() {
        ErrorKind::Authentication { message, .. } => {
            CompareError::Authorization(message.clone())
        }
        ErrorKind::ServerSelection { message, .. } => {
            CompareError::Connectivity(message.clone())
        }
        ErrorKind::Io(io_err) => CompareError::Connectivity(io_err.to_string()),
        ErrorKind::Command(cmd)
            if cmd.code == CODE_UNAUTHORIZED || cmd.code == CODE_AUTHENTICATION_FAILED =>
        {
            CompareError::Authorization(cmd.message.clone())
        }
        _ => CompareError::Driver(err),
    }
}
