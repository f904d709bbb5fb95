//! Process-wide session configuration.
//!
//! The session holds the three settings every round trip needs: the app tag
//! stamped into envelopes, the host endpoint, and the per-round-trip timeout.
//! It is configured once at startup and read-only afterwards.

use std::sync::OnceLock;
use std::time::Duration;

use crate::BridgeError;

/// Default session tag.
pub const DEFAULT_APP: &str = "photoshop";

/// Default host proxy endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3001";

/// Default round-trip timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Environment variable overriding the app tag.
pub const APP_ENV: &str = "PSBRIDGE_APP";

/// Environment variable overriding the endpoint.
pub const ENDPOINT_ENV: &str = "PSBRIDGE_ENDPOINT";

/// Environment variable overriding the timeout, in whole seconds.
pub const TIMEOUT_ENV: &str = "PSBRIDGE_TIMEOUT_SECS";

static SESSION: OnceLock<Session> = OnceLock::new();

/// Connection settings shared by every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    app: String,
    endpoint: String,
    timeout: Duration,
}

impl Session {
    /// Create validated session settings.
    ///
    /// # Errors
    /// Returns `BridgeError::Config` if the app tag is empty, the endpoint
    /// lacks an `http://` or `https://` scheme followed by a host, or the
    /// timeout is zero.
    pub fn new(
        app: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BridgeError> {
        let app = app.into();
        let endpoint = endpoint.into();

        if app.trim().is_empty() {
            return Err(BridgeError::Config("app tag cannot be empty".to_string()));
        }
        if !has_http_host(&endpoint) {
            return Err(BridgeError::Config(format!(
                "endpoint must be an http(s) URL, got '{endpoint}'"
            )));
        }
        if timeout.is_zero() {
            return Err(BridgeError::Config("timeout must be positive".to_string()));
        }

        Ok(Self {
            app,
            endpoint,
            timeout,
        })
    }

    /// Load settings from `PSBRIDGE_*` environment variables, falling back to
    /// the defaults.
    ///
    /// # Errors
    /// Returns `BridgeError::Config` on unparsable or invalid values.
    pub fn from_env() -> Result<Self, BridgeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns `BridgeError::Config` on unparsable or invalid values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BridgeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app = lookup(APP_ENV).unwrap_or_else(|| DEFAULT_APP.to_string());
        let endpoint = lookup(ENDPOINT_ENV).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let timeout = match lookup(TIMEOUT_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| BridgeError::Config(format!("{TIMEOUT_ENV}='{raw}': {e}")))?,
            None => DEFAULT_TIMEOUT,
        };

        Self::new(app, endpoint, timeout)
    }

    /// Session tag stamped into every envelope.
    #[must_use]
    pub fn app(&self) -> &str {
        &self.app
    }

    /// Host endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Per-round-trip timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            app: DEFAULT_APP.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Install the process-wide session.
///
/// Calling again with identical settings returns the installed session.
///
/// # Errors
/// Returns `BridgeError::Config` if a different session is already installed.
pub fn configure(session: Session) -> Result<&'static Session, BridgeError> {
    let installed = SESSION.get_or_init(|| {
        tracing::info!(
            app = %session.app,
            endpoint = %session.endpoint,
            timeout = ?session.timeout,
            "Configured host session"
        );
        session.clone()
    });

    if *installed == session {
        Ok(installed)
    } else {
        Err(BridgeError::Config(format!(
            "session already configured for {} at {}",
            installed.app, installed.endpoint
        )))
    }
}

/// The installed process-wide session.
///
/// # Errors
/// Returns `BridgeError::Config` if `configure` has not been called.
pub fn current() -> Result<&'static Session, BridgeError> {
    SESSION
        .get()
        .ok_or_else(|| BridgeError::Config("session not configured".to_string()))
}

fn has_http_host(endpoint: &str) -> bool {
    endpoint
        .strip_prefix("http://")
        .or_else(|| endpoint.strip_prefix("https://"))
        .and_then(|rest| rest.split(['/', '?', '#']).next())
        .is_some_and(|authority| !authority.is_empty() && !authority.contains(char::is_whitespace))
}
