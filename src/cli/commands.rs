//! CLI command implementations

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::auth::crypto::generate_secret;
use crate::config::Config;
use crate::http_server::{AppState, HttpServer};
use crate::observability::{init_logging, LogFormat};

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config, data_dir } => init(&config, data_dir.as_deref()),
        Command::Serve { config, port } => serve(&config, port),
    }
}

/// Write a default configuration with a fresh JWT secret
///
/// Refuses to overwrite an existing file.
pub fn init(config_path: &Path, data_dir: Option<&Path>) -> CliResult<()> {
    if config_path.exists() {
        return Err(CliError::already_initialized(config_path));
    }

    let mut config = Config::default();
    config.jwt.secret = generate_secret();
    if let Some(dir) = data_dir {
        config.data_dir = dir.to_path_buf();
    }

    let blob_dir = config.blob_dir();
    fs::create_dir_all(&blob_dir).map_err(|e| {
        CliError::io_error(format!("Failed to create directory {:?}: {}", blob_dir, e))
    })?;

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(config_path, config.to_json_pretty()?)?;

    println!(
        "{}",
        json!({
            "initialized": true,
            "config": config_path.display().to_string(),
            "data_dir": config.data_dir.display().to_string(),
        })
    );

    Ok(())
}

/// Start the HTTP server
///
/// Startup sequence:
/// 1. Configuration load and validation
/// 2. Logging
/// 3. Storage open (blob directory, metadata file)
/// 4. Serve until interrupted
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = Config::load(config_path)?;
    if let Some(port) = port {
        config.http.port = port;
    }

    init_logging(LogFormat::from_json_flag(config.logging.json))?;

    fs::create_dir_all(config.blob_dir()).map_err(|e| {
        CliError::boot_failed(format!("Failed to create {:?}: {}", config.blob_dir(), e))
    })?;
    let state = Arc::new(AppState::from_config(&config)?);

    tracing::info!(
        data_dir = %config.data_dir.display(),
        persist_metadata = config.persist_metadata,
        private_requires_auth = config.upload.private_requires_auth,
        "configuration loaded"
    );

    let server =
        HttpServer::with_config(config.http.clone(), state).with_sweep_interval(config.sweep_interval());

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_loadable_config() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("conf").join("filegate.json");
        let data_dir = temp.path().join("data");

        init(&config_path, Some(&data_dir)).unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.data_dir, data_dir);
        assert!(!config.jwt.secret.is_empty());
        assert!(data_dir.join("blobs").is_dir());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("filegate.json");
        fs::write(&config_path, "{}").unwrap();

        let err = init(&config_path, Some(temp.path())).unwrap_err();
        assert_eq!(err.code(), &super::super::errors::CliErrorCode::AlreadyInitialized);
        assert_eq!(fs::read_to_string(&config_path).unwrap(), "{}");
    }

    #[test]
    fn test_serve_rejects_invalid_config() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("filegate.json");
        fs::write(&config_path, r#"{"upload": {"max_request_bytes": 0}, "jwt": {"secret": "x"}}"#)
            .unwrap();

        assert!(serve(&config_path, None).is_err());
    }
}
