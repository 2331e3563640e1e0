//! Error types for the session engine
//!
//! Re-exports fabled-error and provides domain-specific conveniences.

// Re-export the core error types
pub use fabled_error::{Error, ErrorKind, ErrorStatus, Result};

// =============================================================================
// Engine-specific error constructors
// =============================================================================

/// Create a GameNotFound error
pub fn game_not_found(game_id: impl Into<String>) -> Error {
    Error::game_not_found(game_id)
}

/// Create a GameLoadFailed error
pub fn game_load_failed(game_id: impl Into<String>, reason: impl Into<String>) -> Error {
    let game_id = game_id.into();
    Error::new(ErrorKind::GameLoadFailed, reason)
        .with_context("game_id", game_id)
}

/// Create a SessionNotFound error
pub fn session_not_found(session_id: impl Into<String>) -> Error {
    Error::session_not_found(session_id)
}

/// Create a SessionConflict error
pub fn session_conflict(active_id: impl Into<String>) -> Error {
    Error::session_conflict(active_id)
}

/// Create a SessionEnded error
pub fn session_ended(session_id: impl Into<String>) -> Error {
    let session_id = session_id.into();
    Error::new(
        ErrorKind::SessionEnded,
        format!("session '{}' has ended; create a new one", session_id),
    )
    .with_context("session_id", session_id)
}

/// Create an ObjectNotFound error
pub fn object_not_found(object_id: impl std::fmt::Display) -> Error {
    Error::object_not_found(object_id.to_string())
}

/// Create a LocationNotFound error
pub fn location_not_found(location_id: impl std::fmt::Display) -> Error {
    let location_id = location_id.to_string();
    Error::new(
        ErrorKind::LocationNotFound,
        format!("location '{}' has not been discovered", location_id),
    )
    .with_context("location_id", location_id)
}

/// Create an InvalidSlot error
pub fn invalid_slot(slot: impl Into<String>) -> Error {
    Error::invalid_slot(slot)
}

/// Create an EngineFailure error
pub fn engine_failure(reason: impl Into<String>) -> Error {
    Error::engine_failure(reason)
}

/// Create a Timeout error
pub fn timeout(operation_name: impl Into<String>, secs: u64) -> Error {
    let operation_name = operation_name.into();
    Error::timeout(format!("'{}' exceeded {}s bound", operation_name, secs))
        .with_context("engine_call", operation_name)
}

/// Create a SerializationFailed error
pub fn serialization_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::SerializationFailed, message)
}

/// Create an IoFailed error
pub fn io_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::IoFailed, message)
}

/// Create an InvalidArgument error
pub fn invalid_argument(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidArgument, message)
}

/// Create a ConfigInvalid error
pub fn config_invalid(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::ConfigInvalid, message)
}
