//! # fabled-error
//!
//! Unified error handling for fabled - following OpenDAL's error handling practices.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what error occurred (e.g., SessionNotFound, EngineFailure)
//! - **ErrorStatus**: Decide how to handle it (Permanent, Temporary, Persistent)
//! - **Error Context**: Assist in locating the cause with rich context
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use fabled_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::ObjectNotFound, "object 'lantern' not in snapshot")
//!         .with_operation("world::object_details")
//!         .with_context("object_id", "lantern")
//!         .with_context("session", "sess_0"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All functions return `Result<T, fabled_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context
//! - Don't abuse `From<OtherError>` to prevent raw error leakage
//! - An unrecognized game command is NOT an error: the parser's rejection
//!   text is a normal observation. Errors are reserved for the machinery
//!   around the game, never for the game talking back.

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using fabled Error
pub type Result<T> = std::result::Result<T, Error>;
