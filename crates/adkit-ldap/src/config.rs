//! Configuration for connecting to the directory.

use crate::{dn::DistinguishedName, Result};
use adkit_core::Error;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Default LDAPS port.
pub const DEFAULT_LDAPS_PORT: u16 = 636;
/// Default connection timeout (seconds).
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 10;

const fn default_port() -> u16 {
    DEFAULT_LDAPS_PORT
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_connection_timeout_secs() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT_SECS
}

/// Connection and search settings supplied when a session is established.
///
/// TLS certificate verification is enabled unless explicitly turned off with
/// [`DirectoryConfig::with_tls_verification`] or `tls_verify = false` in a config file.
#[derive(Debug, Deserialize, Validate)]
pub struct DirectoryConfig {
    #[validate(length(min = 1))]
    host: String,

    #[serde(default = "default_port")]
    #[validate(range(min = 1))]
    port: u16,

    #[validate(length(min = 1))]
    bind_dn: String,

    bind_password: SecretString,

    base_dn: DistinguishedName,

    #[serde(default)]
    user_principal_suffix: Option<String>,

    #[serde(default = "default_tls_verify")]
    tls_verify: bool,

    #[serde(default)]
    tls_ca_cert: Option<PathBuf>,

    #[serde(default = "default_connection_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    connection_timeout_secs: u64,
}

impl DirectoryConfig {
    /// Creates a new directory configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the host or bind DN is empty or the resulting URL is
    /// invalid.
    pub fn new(
        host: impl Into<String>,
        bind_dn: impl Into<String>,
        bind_password: impl Into<SecretString>,
        base_dn: DistinguishedName,
    ) -> Result<Self> {
        let config = Self {
            host: host.into(),
            port: DEFAULT_LDAPS_PORT,
            bind_dn: bind_dn.into(),
            bind_password: bind_password.into(),
            base_dn,
            user_principal_suffix: None,
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            connection_timeout_secs: DEFAULT_CONNECTION_TIMEOUT_SECS,
        };
        config.check()?;
        Ok(config)
    }

    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the document is malformed or fails validation.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the file cannot be read or its contents are invalid.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|err| {
            Error::ConfigError(format!(
                "failed to read directory config {}: {err}",
                path.display()
            ))
        })?;
        Self::from_json_str(&json)
    }

    fn check(&self) -> Result<()> {
        self.validate()?;
        Url::parse(&self.url())?;
        Ok(())
    }

    /// Returns the `ldaps://host:port` endpoint URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!("ldaps://{}:{}", self.host, self.port)
    }

    /// Returns the directory host name.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the LDAPS port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the DN used for the administrative bind.
    #[must_use]
    pub fn bind_dn(&self) -> &str {
        &self.bind_dn
    }

    /// Returns the bind password.
    #[must_use]
    pub const fn bind_password(&self) -> &SecretString {
        &self.bind_password
    }

    /// Returns the base DN that every lookup searches beneath.
    #[must_use]
    pub const fn base_dn(&self) -> &DistinguishedName {
        &self.base_dn
    }

    /// Returns the suffix appended to new accounts' `userPrincipalName`.
    ///
    /// Falls back to the DNS domain spelled by the base DN's `DC` components.
    #[must_use]
    pub fn user_principal_suffix(&self) -> Option<String> {
        self.user_principal_suffix
            .clone()
            .or_else(|| self.base_dn.dns_domain())
    }

    /// Returns whether TLS certificate verification is enabled.
    #[must_use]
    pub const fn tls_verify(&self) -> bool {
        self.tls_verify
    }

    /// Optional PEM trust anchor used to validate the server certificate.
    #[must_use]
    pub fn tls_ca_cert(&self) -> Option<&Path> {
        self.tls_ca_cert.as_deref()
    }

    /// Returns the connection timeout duration.
    #[must_use]
    pub const fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Overrides the LDAPS port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Overrides the `userPrincipalName` suffix (without the leading `@`).
    #[must_use]
    pub fn with_user_principal_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.user_principal_suffix = Some(suffix.into());
        self
    }

    /// Enables or disables TLS certificate verification.
    ///
    /// Disabling verification exposes the bind credentials to any host that can intercept the
    /// connection.
    #[must_use]
    pub const fn with_tls_verification(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Sets the PEM trust anchor path.
    #[must_use]
    pub fn with_tls_ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.tls_ca_cert = Some(path.into());
        self
    }

    /// Overrides the connection timeout in seconds.
    #[must_use]
    pub const fn with_connection_timeout_secs(mut self, seconds: u64) -> Self {
        self.connection_timeout_secs = seconds;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn base_dn() -> DistinguishedName {
        DistinguishedName::parse("DC=test,DC=com").unwrap()
    }

    #[test]
    fn defaults_and_builder_overrides() {
        let config = DirectoryConfig::new(
            "dc01.test.com",
            "CN=svc,CN=Users,DC=test,DC=com",
            "secret".to_string(),
            base_dn(),
        )
        .unwrap();

        assert_eq!(config.url(), "ldaps://dc01.test.com:636");
        assert!(config.tls_verify());
        assert!(config.tls_ca_cert().is_none());
        assert_eq!(config.user_principal_suffix().as_deref(), Some("test.com"));
        assert_eq!(config.bind_password().expose_secret(), "secret");

        let config = config
            .with_port(3269)
            .with_user_principal_suffix("corp.test.com")
            .with_tls_ca_cert("cert/ca.pem")
            .with_connection_timeout_secs(30)
            .with_tls_verification(false);

        assert_eq!(config.url(), "ldaps://dc01.test.com:3269");
        assert_eq!(
            config.user_principal_suffix().as_deref(),
            Some("corp.test.com")
        );
        assert_eq!(config.tls_ca_cert(), Some(Path::new("cert/ca.pem")));
        assert_eq!(config.connection_timeout(), Duration::from_secs(30));
        assert!(!config.tls_verify());
    }

    #[test]
    fn rejects_empty_host() {
        let result = DirectoryConfig::new("", "CN=svc,DC=test,DC=com", "pw".to_string(), base_dn());
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn loads_json_with_defaults() {
        let config = DirectoryConfig::from_json_str(
            r#"{
                "host": "dc01.test.com",
                "bind_dn": "CN=svc,CN=Users,DC=test,DC=com",
                "bind_password": "secret",
                "base_dn": "DC=test,DC=com",
                "tls_ca_cert": "cert/certnew.crt"
            }"#,
        )
        .unwrap();

        assert_eq!(config.port(), DEFAULT_LDAPS_PORT);
        assert!(config.tls_verify());
        assert_eq!(config.base_dn(), &base_dn());
        assert_eq!(config.tls_ca_cert(), Some(Path::new("cert/certnew.crt")));
        assert_eq!(
            config.connection_timeout(),
            Duration::from_secs(DEFAULT_CONNECTION_TIMEOUT_SECS)
        );
    }

    #[test]
    fn json_validation_errors() {
        let bad_timeout = r#"{
            "host": "dc01", "bind_dn": "CN=svc", "bind_password": "x",
            "base_dn": "DC=test", "connection_timeout_secs": 0
        }"#;
        assert!(matches!(
            DirectoryConfig::from_json_str(bad_timeout),
            Err(Error::ConfigError(_))
        ));

        let bad_dn = r#"{"host": "dc01", "bind_dn": "CN=svc", "bind_password": "x", "base_dn": ""}"#;
        assert!(matches!(
            DirectoryConfig::from_json_str(bad_dn),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn debug_output_redacts_password() {
        let config = DirectoryConfig::new(
            "dc01.test.com",
            "CN=svc,DC=test,DC=com",
            "hunter2".to_string(),
            base_dn(),
        )
        .unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
