//! Error status - how an error should be handled

use std::fmt;

/// Whether an error is worth retrying.
///
/// - `Permanent`: retrying will not help (bad id, bad argument, fatal engine
///   state). The default for most kinds.
/// - `Temporary`: the operation may succeed if retried (engine call timed
///   out while the lane drains).
/// - `Persistent`: was temporary, but retries were exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorStatus {
    /// The error is final; retrying the same call will fail the same way
    Permanent,
    /// The error may clear on its own; the call can be retried
    Temporary,
    /// A temporary error that kept failing after retries
    Persistent,
}

impl ErrorStatus {
    /// Check if an error with this status should be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorStatus::Temporary)
    }

    /// Downgrade a temporary error after retries were exhausted
    pub fn persist(self) -> Self {
        match self {
            ErrorStatus::Temporary => ErrorStatus::Persistent,
            other => other,
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorStatus::Permanent => "permanent",
            ErrorStatus::Temporary => "temporary",
            ErrorStatus::Persistent => "persistent",
        };
        write!(f, "{}", s)
    }
}
