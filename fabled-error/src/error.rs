//! The main Error type for fabled

use crate::{ErrorKind, ErrorStatus};
use std::fmt;

/// The unified error type for all fabled operations.
///
/// This error type provides:
/// - `kind`: What type of error occurred
/// - `message`: Human-readable description
/// - `status`: Whether the error is retryable
/// - `operation`: What operation caused the error
/// - `context`: Key-value pairs for debugging
/// - `source`: The underlying error (if any)
///
/// # Example
///
/// ```rust
/// use fabled_error::{Error, ErrorKind, ErrorStatus};
///
/// let err = Error::new(ErrorKind::Timeout, "engine call exceeded bound")
///     .with_operation("session::step")
///     .with_status(ErrorStatus::Temporary)
///     .with_context("game", "zork1")
///     .with_context("command", "open mailbox");
///
/// assert_eq!(err.kind(), ErrorKind::Timeout);
/// assert!(err.status().is_retryable());
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: ErrorStatus,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let status = if kind.is_retryable() {
            ErrorStatus::Temporary
        } else {
            ErrorStatus::Permanent
        };

        Self {
            kind,
            message: message.into(),
            status,
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    // =========================================================================
    // Getters
    // =========================================================================

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the error status
    pub fn status(&self) -> ErrorStatus {
        self.status
    }

    /// Get the operation that caused this error
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Get the context key-value pairs
    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    /// Get the source error (if any)
    pub fn source_ref(&self) -> Option<&anyhow::Error> {
        self.source.as_ref()
    }

    // =========================================================================
    // Builders (chainable)
    // =========================================================================

    /// Set the error status
    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    /// Mark as temporary (retryable)
    pub fn temporary(mut self) -> Self {
        self.status = ErrorStatus::Temporary;
        self
    }

    /// Mark as permanent (not retryable)
    pub fn permanent(mut self) -> Self {
        self.status = ErrorStatus::Permanent;
        self
    }

    /// Set the operation that caused this error.
    ///
    /// If an operation was already set, the previous one is moved to context
    /// as "called" to preserve the call chain.
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        if !self.operation.is_empty() {
            self.context.push(("called", self.operation.to_string()));
        }
        self.operation = operation;
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Set the source error.
    ///
    /// # Panics (debug only)
    /// Panics in debug mode if source was already set.
    pub fn set_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "source error already set");
        self.source = Some(source.into());
        self
    }

    // =========================================================================
    // Status mutations
    // =========================================================================

    /// Mark as persistent after failed retries
    pub fn persist(mut self) -> Self {
        self.status = self.status.persist();
        self
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        self.status.is_retryable()
    }

    /// Check if this error terminates the affected session
    pub fn is_session_fatal(&self) -> bool {
        self.kind.is_session_fatal()
    }
}

// =============================================================================
// Display - compact, single-line format for logs
// =============================================================================

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) at {}", self.kind, self.status, self.operation)?;

        if !self.context.is_empty() {
            write!(f, ", context {{ ")?;
            for (i, (key, value)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", key, value)?;
            }
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        Ok(())
    }
}

// =============================================================================
// Debug - verbose, multi-line format for debugging
// =============================================================================

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}) at {}", self.kind, self.status, self.operation)?;

        if !self.message.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Message: {}", self.message)?;
        }

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Context:")?;
            for (key, value) in &self.context {
                writeln!(f, "        {}: {}", key, value)?;
            }
        }

        if let Some(source) = &self.source {
            writeln!(f)?;
            writeln!(f, "    Source: {:?}", source)?;
        }

        Ok(())
    }
}

// =============================================================================
// std::error::Error implementation
// =============================================================================

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

// =============================================================================
// Convenient From implementations (be careful not to leak raw errors!)
// =============================================================================

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(ErrorKind::IoFailed, err.to_string())
            .with_operation("io")
            .set_source(err)
    }
}

// =============================================================================
// Convenience constructors
// =============================================================================

impl Error {
    /// Create an Unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }

    /// Create an Unsupported error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported, message)
    }

    /// Create a GameNotFound error
    pub fn game_not_found(game_id: impl Into<String>) -> Self {
        let game_id = game_id.into();
        Self::new(ErrorKind::GameNotFound, format!("game '{}' not found", game_id))
            .with_context("game_id", game_id)
    }

    /// Create a SessionNotFound error
    pub fn session_not_found(session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        Self::new(ErrorKind::SessionNotFound, format!("session '{}' not found", session_id))
            .with_context("session_id", session_id)
    }

    /// Create a SessionConflict error
    pub fn session_conflict(active_id: impl Into<String>) -> Self {
        let active_id = active_id.into();
        Self::new(
            ErrorKind::SessionConflict,
            format!("session '{}' is still active; close it first", active_id),
        )
        .with_context("active_session", active_id)
    }

    /// Create an ObjectNotFound error
    pub fn object_not_found(object_id: impl Into<String>) -> Self {
        let object_id = object_id.into();
        Self::new(ErrorKind::ObjectNotFound, format!("object '{}' not found", object_id))
            .with_context("object_id", object_id)
    }

    /// Create an InvalidSlot error
    pub fn invalid_slot(slot: impl Into<String>) -> Self {
        let slot = slot.into();
        Self::new(ErrorKind::InvalidSlot, format!("no saved state in slot '{}'", slot))
            .with_context("slot", slot)
    }

    /// Create an EngineFailure error
    pub fn engine_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EngineFailure, message)
    }

    /// Create a Timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message).temporary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::new(ErrorKind::SessionNotFound, "session 'abc' not found");
        assert_eq!(err.kind(), ErrorKind::SessionNotFound);
        assert_eq!(err.message(), "session 'abc' not found");
        assert_eq!(err.status(), ErrorStatus::Permanent);
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::new(ErrorKind::EngineFailure, "duplicate owner")
            .with_operation("world::rebuild")
            .with_context("object", "leaflet")
            .with_context("owners", "mailbox, table");

        assert_eq!(err.operation(), "world::rebuild");
        assert_eq!(err.context().len(), 2);
        assert_eq!(err.context()[0], ("object", "leaflet".to_string()));
    }

    #[test]
    fn test_operation_chaining() {
        let err = Error::new(ErrorKind::IoFailed, "write failed")
            .with_operation("slots::save")
            .with_operation("service::save_game_state");

        assert_eq!(err.operation(), "service::save_game_state");
        assert_eq!(err.context().len(), 1);
        assert_eq!(err.context()[0], ("called", "slots::save".to_string()));
    }

    #[test]
    fn test_timeout_is_temporary() {
        let err = Error::timeout("step exceeded 30s");
        assert!(err.is_retryable());

        let err = Error::game_not_found("zork9");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_persist() {
        let err = Error::timeout("engine busy");
        assert!(err.is_retryable());

        let err = err.persist();
        assert!(!err.is_retryable());
        assert_eq!(err.status(), ErrorStatus::Persistent);
    }

    #[test]
    fn test_display() {
        let err = Error::new(ErrorKind::Timeout, "engine call still running")
            .with_operation("session::step")
            .with_context("game", "zork1")
            .with_context("command", "open mailbox");

        let display = format!("{}", err);
        assert!(display.contains("Timeout"));
        assert!(display.contains("temporary"));
        assert!(display.contains("session::step"));
        assert!(display.contains("game: zork1"));
    }

    #[test]
    fn test_convenience_constructors() {
        let err = Error::session_not_found("sess_1");
        assert_eq!(err.kind(), ErrorKind::SessionNotFound);
        assert!(err.message().contains("sess_1"));

        let err = Error::invalid_slot("quicksave");
        assert_eq!(err.kind(), ErrorKind::InvalidSlot);

        let err = Error::engine_failure("object tree has a cycle");
        assert!(err.is_session_fatal());
    }

    #[test]
    fn test_set_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::new(ErrorKind::GameLoadFailed, "zork1.z5 unreadable")
            .set_source(io_err);

        assert!(err.source_ref().is_some());
    }
}
