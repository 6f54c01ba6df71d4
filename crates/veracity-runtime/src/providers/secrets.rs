//! Credential handling for evidence and reasoning providers.
//!
//! Credentials are wrapped in [`SecretString`] the moment they are read,
//! so they cannot show up in `Debug`/`Display` output or in logs. Call
//! [`ApiCredential::expose`] only where the value goes on the wire.
//!
//! ## Usage
//!
//! ```ignore
//! // Config first, then environment; None when neither is set.
//! let cred = ApiCredential::from_options(&options, "NEWSAPI_KEY", "NewsAPI key");
//!
//! request.header("X-Api-Key", cred.expose());
//! ```

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::fmt;

/// Config key holding an inline credential.
pub const API_KEY_OPTION: &str = "api_key";

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Provider `options` in the pipeline config
    Config,
    /// Environment variable
    Environment,
    /// Provided programmatically
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Config => write!(f, "config"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API credential.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Load from `options.api_key`, falling back to `env_var`.
    ///
    /// Returns `None` when neither holds a usable value. Empty strings and
    /// template placeholders such as `your_newsapi_key_here` count as unset.
    pub fn from_options(options: &JsonValue, env_var: &str, name: &'static str) -> Option<Self> {
        if let Some(value) = options[API_KEY_OPTION].as_str().filter(|v| is_usable(v)) {
            return Some(Self::new(value, CredentialSource::Config, name));
        }

        std::env::var(env_var)
            .ok()
            .filter(|v| is_usable(v))
            .map(|v| Self::new(v, CredentialSource::Environment, name))
    }

    /// Check whether [`from_options`](Self::from_options) would find a value.
    pub fn is_available(options: &JsonValue, env_var: &str) -> bool {
        options[API_KEY_OPTION].as_str().is_some_and(is_usable)
            || std::env::var(env_var).is_ok_and(|v| is_usable(&v))
    }

    /// Expose the value. Only call this where the credential goes on the wire.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

fn is_usable(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !(value.starts_with("your_") && value.ends_with("_here"))
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}
