//! Client configuration.
//!
//! All knobs live in an explicit [`Config`] value that is passed to
//! [`Client::new`](crate::Client::new) once at startup. [`Config::from_env`]
//! reads the `ZARAFA_*` environment variables over the defaults for
//! deployments that are configured that way.
use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::internal_prelude::*;

/// The default server URI used when none is configured.
pub const DEFAULT_SERVER_URI: &str = "http://127.0.0.1:236";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URI of the server. `http`, `https` and `file` (unix socket)
    /// schemes are supported.
    pub server_uri: String,

    /// Overall timeout for a single HTTP request.
    pub http_timeout_secs: u64,
    /// Timeout for establishing a new TCP connection.
    pub http_dial_timeout_secs: u64,
    /// TCP keep-alive interval for pooled connections.
    pub http_keepalive_secs: u64,
    /// How long idle pooled connections are kept around.
    pub http_idle_conn_timeout_secs: u64,
    /// Maximum number of idle pooled connections per host.
    pub http_max_idle_conns_per_host: usize,

    /// Read/write deadline for unix socket requests.
    pub socket_timeout_secs: u64,

    /// Interval of the session background refresh loop.
    pub session_refresh_interval_secs: u64,

    /// Kill switch disabling TLS certificate verification. Only meant for
    /// test and debug environments; engaging it logs a warning.
    pub danger_insecure_tls: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_uri: DEFAULT_SERVER_URI.to_string(),
            http_timeout_secs: 10,
            http_dial_timeout_secs: 30,
            http_keepalive_secs: 120,
            http_idle_conn_timeout_secs: 90,
            http_max_idle_conns_per_host: 100,
            socket_timeout_secs: 10,
            session_refresh_interval_secs: 300,
            danger_insecure_tls: false,
        }
    }
}

impl Config {
    /// Build a configuration from the environment, falling back to the
    /// defaults for anything unset or unparsable.
    ///
    /// Recognized variables:
    /// `ZARAFA_SERVER_DEFAULT_URI`,
    /// `ZARAFA_CLIENT_HTTP_TIMEOUT`,
    /// `ZARAFA_CLIENT_HTTP_DIAL_TIMEOUT`,
    /// `ZARAFA_CLIENT_HTTP_KEEPALIVE`,
    /// `ZARAFA_CLIENT_HTTP_IDLE_CONN_TIMEOUT`,
    /// `ZARAFA_CLIENT_HTTP_MAX_IDLE_CONNS_PER_HOST`,
    /// `ZARAFA_CLIENT_SOCKET_TIMEOUT`,
    /// `ZARAFA_CLIENT_SESSION_REFRESH_INTERVAL` (all durations in seconds),
    /// `ZARAFA_CLIENT_HTTP_INSECURE_SKIP_VERIFY` (`on`/`yes`/`true`).
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            server_uri: env::var("ZARAFA_SERVER_DEFAULT_URI").unwrap_or(defaults.server_uri),
            http_timeout_secs: env_u64("ZARAFA_CLIENT_HTTP_TIMEOUT", defaults.http_timeout_secs),
            http_dial_timeout_secs: env_u64(
                "ZARAFA_CLIENT_HTTP_DIAL_TIMEOUT",
                defaults.http_dial_timeout_secs,
            ),
            http_keepalive_secs: env_u64(
                "ZARAFA_CLIENT_HTTP_KEEPALIVE",
                defaults.http_keepalive_secs,
            ),
            http_idle_conn_timeout_secs: env_u64(
                "ZARAFA_CLIENT_HTTP_IDLE_CONN_TIMEOUT",
                defaults.http_idle_conn_timeout_secs,
            ),
            http_max_idle_conns_per_host: env_u64(
                "ZARAFA_CLIENT_HTTP_MAX_IDLE_CONNS_PER_HOST",
                defaults.http_max_idle_conns_per_host as u64,
            ) as usize,
            socket_timeout_secs: env_u64(
                "ZARAFA_CLIENT_SOCKET_TIMEOUT",
                defaults.socket_timeout_secs,
            ),
            session_refresh_interval_secs: env_u64(
                "ZARAFA_CLIENT_SESSION_REFRESH_INTERVAL",
                defaults.session_refresh_interval_secs,
            ),
            danger_insecure_tls: env_bool(
                "ZARAFA_CLIENT_HTTP_INSECURE_SKIP_VERIFY",
                defaults.danger_insecure_tls,
            ),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn http_dial_timeout(&self) -> Duration {
        Duration::from_secs(self.http_dial_timeout_secs)
    }

    pub fn http_keepalive(&self) -> Duration {
        Duration::from_secs(self.http_keepalive_secs)
    }

    pub fn http_idle_conn_timeout(&self) -> Duration {
        Duration::from_secs(self.http_idle_conn_timeout_secs)
    }

    pub fn socket_timeout(&self) -> Duration {
        Duration::from_secs(self.socket_timeout_secs)
    }

    pub fn session_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.session_refresh_interval_secs)
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    match env::var(name) {
        Ok(value) => match value.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("Ignoring unparsable value {value:?} for {name}");
                default
            }
        },
        Err(_) => default,
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    match env::var(name).as_deref() {
        Ok("on") | Ok("true") | Ok("yes") => true,
        Ok("off") | Ok("false") | Ok("no") => false,
        Ok(value) => {
            warn!("Ignoring unparsable value {value:?} for {name}");
            default
        }
        Err(_) => default,
    }
}
