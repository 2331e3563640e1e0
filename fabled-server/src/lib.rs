//! # fabled-server
//!
//! The tool-call surface over the fabled session engine.
//!
//! ## Layers
//! - `request`: the closed `ToolRequest`/`ToolResponse` vocabulary
//! - `service`: exhaustive dispatch onto the session registry, one handler
//!   per tool
//! - `http`: thin axum transport (`POST /tools`, `GET /health`)
//! - `config`: environment-driven deployment settings

pub mod config;
pub mod http;
pub mod request;
pub mod service;

pub use config::ServerConfig;
pub use http::{router, serve};
pub use request::{ToolError, ToolRequest, ToolResponse};
pub use service::{GameService, HealthReport, DEFAULT_IDLE_TIMEOUT};
