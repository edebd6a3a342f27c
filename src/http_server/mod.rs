//! # HTTP Server Module
//!
//! Axum front end over the access control engine.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /api/auth/register`, `POST /api/auth/login` - Accounts and credentials
//! - `POST /api/files/upload` - Multipart upload
//! - `GET /api/files/:id` - File info, after authorization
//! - `GET /api/files/:id/download` - File payload, after authorization

pub mod auth_routes;
pub mod config;
pub mod errors;
pub mod file_routes;
pub mod observability_routes;
pub mod server;
pub mod state;

pub use config::HttpServerConfig;
pub use errors::{ErrorResponse, RequestError};
pub use server::{spawn_retention_sweeper, HttpServer};
pub use state::{AppState, StateError};
