//! Configuration module for leakboard.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;

/// PocketBase instance used when `POCKETBASE_URL` is not set.
pub const DEFAULT_POCKETBASE_URL: &str = "https://w.zaur.app";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the web server (default: 8080)
    pub http_port: u16,
    /// Base URL of the PocketBase record store, without trailing slash
    pub pocketbase_url: String,
    /// Mark the auth cookie `Secure` (production deployments only)
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            pocketbase_url: DEFAULT_POCKETBASE_URL.to_string(),
            secure_cookies: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `LEAKBOARD_HTTP_PORT`: HTTP port (default: 8080)
    /// - `POCKETBASE_URL`: record store base URL (default: "https://w.zaur.app")
    /// - `LEAKBOARD_ENV`: `production` enables secure cookies
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(port_str) = lookup("LEAKBOARD_HTTP_PORT") {
            match port_str.trim().parse() {
                Ok(port) => cfg.http_port = port,
                Err(_) => tracing::warn!(
                    "Ignoring invalid LEAKBOARD_HTTP_PORT {:?}, using {}",
                    port_str,
                    cfg.http_port
                ),
            }
        }

        if let Some(url) = lookup("POCKETBASE_URL") {
            let url = url.trim().trim_end_matches('/');
            if url.is_empty() {
                tracing::warn!("POCKETBASE_URL is empty, using {}", cfg.pocketbase_url);
            } else {
                cfg.pocketbase_url = url.to_string();
            }
        }

        if let Some(mode) = lookup("LEAKBOARD_ENV") {
            cfg.secure_cookies = mode.trim().eq_ignore_ascii_case("production");
        }

        cfg
    }
}
