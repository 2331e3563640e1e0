//! Error kinds for fabled operations

use std::fmt;

/// The kind of error that occurred.
///
/// This enum categorizes errors to help callers write clear error handling
/// logic. Tool handlers match on ErrorKind to decide what to surface to the
/// agent and whether the session survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// The requested feature or operation is not supported
    Unsupported,

    /// Invalid configuration or parameters
    ConfigInvalid,

    /// Invalid argument passed to a tool call
    InvalidArgument,

    // =========================================================================
    // Game library errors
    // =========================================================================
    /// The requested game identifier is not in the library
    GameNotFound,

    /// A game file exists but the engine failed to load it
    GameLoadFailed,

    // =========================================================================
    // Session errors
    // =========================================================================
    /// The requested session id is unknown
    SessionNotFound,

    /// An active session already exists and must be closed first
    SessionConflict,

    /// The session has ended and cannot accept further calls
    SessionEnded,

    // =========================================================================
    // World introspection errors
    // =========================================================================
    /// The requested object id is not in the current world snapshot
    ObjectNotFound,

    /// The requested location id has not been discovered
    LocationNotFound,

    // =========================================================================
    // Save state errors
    // =========================================================================
    /// Save/load referenced a slot that does not exist
    InvalidSlot,

    /// Serialization/deserialization failed
    SerializationFailed,

    // =========================================================================
    // Engine errors
    // =========================================================================
    /// The interpreter produced an inconsistent or unrecoverable state.
    /// Fatal to the session; the session is marked ended.
    EngineFailure,

    /// An engine call exceeded its time bound. The session lane stays busy
    /// until the underlying call returns; callers may retry later.
    Timeout,

    // =========================================================================
    // IO errors
    // =========================================================================
    /// IO operation failed
    IoFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            // General
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::Unsupported => "Unsupported",
            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::InvalidArgument => "InvalidArgument",

            // Game library
            ErrorKind::GameNotFound => "GameNotFound",
            ErrorKind::GameLoadFailed => "GameLoadFailed",

            // Session
            ErrorKind::SessionNotFound => "SessionNotFound",
            ErrorKind::SessionConflict => "SessionConflict",
            ErrorKind::SessionEnded => "SessionEnded",

            // World
            ErrorKind::ObjectNotFound => "ObjectNotFound",
            ErrorKind::LocationNotFound => "LocationNotFound",

            // Save state
            ErrorKind::InvalidSlot => "InvalidSlot",
            ErrorKind::SerializationFailed => "SerializationFailed",

            // Engine
            ErrorKind::EngineFailure => "EngineFailure",
            ErrorKind::Timeout => "Timeout",

            // IO
            ErrorKind::IoFailed => "IoFailed",
        }
    }

    /// Check if this error kind is retryable by default
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Timeout)
    }

    /// Check if this error kind terminates the affected session.
    /// Only the session dies; the process never does.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, ErrorKind::EngineFailure)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::SessionNotFound.to_string(), "SessionNotFound");
        assert_eq!(ErrorKind::EngineFailure.to_string(), "EngineFailure");
    }

    #[test]
    fn test_is_retryable() {
        assert!(ErrorKind::Timeout.is_retryable());
        assert!(!ErrorKind::GameNotFound.is_retryable());
        assert!(!ErrorKind::SessionConflict.is_retryable());
    }

    #[test]
    fn test_is_session_fatal() {
        assert!(ErrorKind::EngineFailure.is_session_fatal());
        assert!(!ErrorKind::Timeout.is_session_fatal());
        assert!(!ErrorKind::ObjectNotFound.is_session_fatal());
    }
}
