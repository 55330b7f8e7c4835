//! Client configuration.
//!
//! A [`ClientConfig`] is built once by the host and handed to
//! [`DirectoryClient::new`](crate::client::DirectoryClient::new), which
//! validates it before any connection is attempted.
//!
//! ```rust
//! use ldap_provider::config::ClientConfig;
//!
//! let config = ClientConfig::from_json(
//!     r#"{"server": "ldaps://dc1.example.com", "bind_dn": "cn=admin,dc=example,dc=com", "bind_password": "secret"}"#,
//! )
//! .unwrap();
//! assert!(config.validate().is_ok());
//! assert!(!format!("{config:?}").contains("secret"));
//! ```

use crate::error::{DirectoryResult, ValidationError, ValidationResult};
use serde::Deserialize;
use std::fmt;

const SCHEMES: [&str; 3] = ["ldap", "ldaps", "ldapi"];

/// Server endpoint and bind identity.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Server URL, e.g. `ldaps://dc1.example.com:636`.
    pub server: String,
    pub bind_dn: String,
    /// Password for a simple bind. `None` selects an unauthenticated bind.
    #[serde(default)]
    pub bind_password: Option<String>,
}

impl ClientConfig {
    /// Configuration for an unauthenticated bind as `bind_dn`.
    pub fn new(server: impl Into<String>, bind_dn: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            bind_dn: bind_dn.into(),
            bind_password: None,
        }
    }

    /// Use a simple bind with `password`. An empty password keeps the
    /// unauthenticated bind.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        let password = password.into();
        self.bind_password = (!password.is_empty()).then_some(password);
        self
    }

    /// Decode the host's provider block.
    pub fn from_json(json: &str) -> DirectoryResult<Self> {
        let mut config: ClientConfig = serde_json::from_str(json)?;
        config.bind_password = config.bind_password.filter(|p| !p.is_empty());
        Ok(config)
    }

    /// Check the URL scheme and bind DN.
    pub fn validate(&self) -> ValidationResult<()> {
        let (scheme, rest) = self.server.split_once("://").ok_or_else(|| {
            ValidationError::invalid_configuration(format!(
                "server '{}' is not an LDAP URL",
                self.server
            ))
        })?;
        if !SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()) {
            return Err(ValidationError::invalid_enum("server scheme", scheme, &SCHEMES));
        }
        if rest.is_empty() && !scheme.eq_ignore_ascii_case("ldapi") {
            return Err(ValidationError::invalid_configuration(format!(
                "server '{}' has no host",
                self.server
            )));
        }
        if self.bind_dn.trim().is_empty() {
            return Err(ValidationError::missing_required("bind_dn"));
        }
        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("server", &self.server)
            .field("bind_dn", &self.bind_dn)
            .field(
                "bind_password",
                &self.bind_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
