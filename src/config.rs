// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup into an [`AppConfig`] that is passed down explicitly.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for the account database, uploads and artifacts | `./data` |
//! | `UPLOAD_DIR` | Staging directory for uploads | `$DATA_DIR/uploads` |
//! | `OUTPUT_DIR` | Directory for processed artifacts | `$DATA_DIR/static` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `5000` |
//! | `SESSION_SECRET` | HMAC key for session cookies | Random per process |
//! | `MAX_UPLOAD_BYTES` | Request body limit for uploads | `16777216` |
//! | `ARTIFACT_TTL_SECS` | Age after which uploads/artifacts are deleted (`0` disables) | `86400` |
//! | `SWEEP_INTERVAL_SECS` | Interval between artifact sweeps | `600` |
//! | `TLS_CERT_PATH` | PEM certificate chain; enables HTTPS with `TLS_KEY_PATH` | Unset |
//! | `TLS_KEY_PATH` | PEM private key | Unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::storage::paths::DATA_ROOT;
use crate::storage::StoragePaths;

pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const UPLOAD_DIR_ENV: &str = "UPLOAD_DIR";
pub const OUTPUT_DIR_ENV: &str = "OUTPUT_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const SESSION_SECRET_ENV: &str = "SESSION_SECRET";
pub const MAX_UPLOAD_BYTES_ENV: &str = "MAX_UPLOAD_BYTES";
pub const ARTIFACT_TTL_SECS_ENV: &str = "ARTIFACT_TTL_SECS";
pub const SWEEP_INTERVAL_SECS_ENV: &str = "SWEEP_INTERVAL_SECS";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;
pub const DEFAULT_ARTIFACT_TTL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 600;

/// Default `RUST_LOG` filter when none is set.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            _ => Err(()),
        }
    }
}

/// Certificate and key for HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Process-wide configuration, built once and shared through `AppState`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub paths: StoragePaths,
    pub host: String,
    pub port: u16,
    /// `None` means a random key is generated at startup.
    pub session_secret: Option<String>,
    pub max_upload_bytes: usize,
    /// `None` disables the artifact sweeper.
    pub artifact_ttl: Option<Duration>,
    pub sweep_interval: Duration,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut paths = StoragePaths::new(var(DATA_DIR_ENV).unwrap_or_else(|| DATA_ROOT.to_string()));
        if let Some(dir) = var(UPLOAD_DIR_ENV) {
            paths = paths.with_uploads_dir(dir);
        }
        if let Some(dir) = var(OUTPUT_DIR_ENV) {
            paths = paths.with_output_dir(dir);
        }

        let ttl_secs = parse_or(
            var(ARTIFACT_TTL_SECS_ENV),
            ARTIFACT_TTL_SECS_ENV,
            DEFAULT_ARTIFACT_TTL_SECS,
        );
        let sweep_secs = parse_or(
            var(SWEEP_INTERVAL_SECS_ENV),
            SWEEP_INTERVAL_SECS_ENV,
            DEFAULT_SWEEP_INTERVAL_SECS,
        );

        let tls = match (var(TLS_CERT_PATH_ENV), var(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            _ => None,
        };

        Self {
            paths,
            host: var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(var(PORT_ENV), PORT_ENV, DEFAULT_PORT),
            session_secret: var(SESSION_SECRET_ENV),
            max_upload_bytes: parse_or(
                var(MAX_UPLOAD_BYTES_ENV),
                MAX_UPLOAD_BYTES_ENV,
                DEFAULT_MAX_UPLOAD_BYTES,
            ),
            artifact_ttl: (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs)),
            sweep_interval: Duration::from_secs(sweep_secs.max(1)),
            tls,
            log_format: var(LOG_FORMAT_ENV)
                .and_then(|value| value.parse().ok())
                .unwrap_or_default(),
        }
    }

    /// Defaults rooted at `data_dir`, ignoring the environment.
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self::from_lookup(|name| {
            (name == DATA_DIR_ENV).then(|| data_dir.to_string_lossy().into_owned())
        })
    }
}

/// Parse a numeric variable, falling back to the default on bad input.
///
/// Logging may not be initialized yet, so the warning goes to stderr.
fn parse_or<T: FromStr>(value: Option<String>, name: &str, default: T) -> T {
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            eprintln!("Ignoring invalid {name}={raw:?}, using default");
            default
        }),
        None => default,
    }
}
