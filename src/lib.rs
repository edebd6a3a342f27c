//! filegate - file sharing with validated uploads and policy-gated retrieval
//!
//! Uploads pass through a fixed validation pipeline before anything is
//! stored; every retrieval is decided by the access policy against the
//! record's visibility, password, owner and availability window.

pub mod access;
pub mod auth;
pub mod cli;
pub mod clock;
pub mod config;
pub mod file_storage;
pub mod http_server;
pub mod observability;
