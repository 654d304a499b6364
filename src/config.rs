// src/config.rs

//! Manages server configuration: loading, parsing, and validation.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// The server configuration, loaded once at startup and immutable afterwards.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    /// The address the listener binds to.
    #[serde(default = "default_host")]
    pub host: String,
    /// The port the listener binds to. `0` asks the OS for an ephemeral port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// The default tracing filter, overridable with `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// The maximum number of simultaneously connected clients.
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,
    #[serde(default)]
    pub tls: TlsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            max_clients: default_max_clients(),
            tls: TlsConfig::default(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    7878
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_max_clients() -> usize {
    10000
}

/// Configuration for the TLS layer. TLS is not optional here: fingerprints
/// are computed from the handshake, so there is nothing to serve without one.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TlsConfig {
    /// Path to the PEM-encoded certificate chain.
    #[serde(default = "default_cert_path")]
    pub cert_path: String,
    /// Path to the PEM-encoded private key.
    #[serde(default = "default_key_path")]
    pub key_path: String,
    /// How long a client may take to complete the TLS handshake, e.g. "10s".
    #[serde(default = "default_handshake_timeout", with = "humantime_serde")]
    pub handshake_timeout: Duration,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: default_cert_path(),
            key_path: default_key_path(),
            handshake_timeout: default_handshake_timeout(),
        }
    }
}

fn default_cert_path() -> String {
    "helloprint.crt".to_string()
}
fn default_key_path() -> String {
    "helloprint.key".to_string()
}
fn default_handshake_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML from '{path}'"))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.max_clients == 0 {
            return Err(anyhow!("max_clients cannot be 0"));
        }
        if self.tls.cert_path.trim().is_empty() {
            return Err(anyhow!("tls.cert_path cannot be empty"));
        }
        if self.tls.key_path.trim().is_empty() {
            return Err(anyhow!("tls.key_path cannot be empty"));
        }
        if self.tls.handshake_timeout.is_zero() {
            return Err(anyhow!("tls.handshake_timeout cannot be 0"));
        }
        Ok(())
    }
}
