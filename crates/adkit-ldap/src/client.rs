//! Connection bootstrap backed by `ldap3`.

use crate::{
    config::DirectoryConfig,
    session::{
        DirectoryModification, DirectorySession, LdapAttribute, LdapEntry, SearchScope, Session,
    },
    Result,
};
use adkit_core::Error;
use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapConnSettings, Mod, SearchEntry};
use native_tls::{Certificate, TlsConnector};
use secrecy::ExposeSecret;
use std::collections::HashSet;
use std::fs;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Opens transport connections to the directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LdapConnector: Send + Sync {
    /// Opens a new, not yet authenticated, connection.
    async fn connect(&self) -> Result<Box<dyn DirectorySession>>;
}

/// Entry point that turns a [`DirectoryConfig`] into authenticated [`Session`]s.
pub struct DirectoryClient {
    config: Arc<DirectoryConfig>,
    connector: Box<dyn LdapConnector>,
}

impl DirectoryClient {
    /// Creates a client that connects over LDAPS with `ldap3`.
    #[must_use]
    pub fn new(config: DirectoryConfig) -> Self {
        let config = Arc::new(config);
        let connector: Box<dyn LdapConnector> = Box::new(Ldap3Connector::new(config.clone()));
        Self { config, connector }
    }

    /// Creates a client with a custom connector.
    #[must_use]
    pub fn with_connector(config: DirectoryConfig, connector: Box<dyn LdapConnector>) -> Self {
        Self {
            config: Arc::new(config),
            connector,
        }
    }

    /// Returns the configuration in use.
    #[must_use]
    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Connects and binds with the configured service account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the TLS trust anchor cannot be loaded and
    /// [`Error::TransportError`] if connecting or binding fails.
    pub async fn connect(&self) -> Result<Session> {
        let mut transport = self.connector.connect().await?;
        let bind_dn = self.config.bind_dn();
        debug!(bind_dn, "binding");

        transport
            .simple_bind(bind_dn, self.config.bind_password().expose_secret())
            .await
            .map_err(|err| {
                Error::TransportError(format!("bind as {bind_dn} failed: {}", err.detail()))
            })?;

        info!(url = %self.config.url(), bind_dn, "directory session established");
        Ok(Session::new(transport, self.config.base_dn().clone())
            .with_user_principal_suffix(self.config.user_principal_suffix()))
    }
}

impl std::fmt::Debug for DirectoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Connector backed by `ldap3` over `ldaps://`.
pub struct Ldap3Connector {
    config: Arc<DirectoryConfig>,
}

impl Ldap3Connector {
    /// Creates a new connector instance.
    #[must_use]
    pub fn new(config: Arc<DirectoryConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LdapConnector for Ldap3Connector {
    async fn connect(&self) -> Result<Box<dyn DirectorySession>> {
        let settings = build_ldap_settings(&self.config)?;
        let url = self.config.url();
        debug!(url = %url, "connecting");
        let (conn, ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(map_ldap_error)?;
        ldap3::drive!(conn);
        Ok(Box::new(Ldap3Session { inner: ldap }))
    }
}

struct Ldap3Session {
    inner: ldap3::Ldap,
}

#[async_trait]
impl DirectorySession for Ldap3Session {
    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<()> {
        self.inner
            .simple_bind(dn, password)
            .await
            .map_err(map_ldap_error)?
            .success()
            .map_err(map_ldap_error)?;
        Ok(())
    }

    async fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[&'static str],
    ) -> Result<Vec<LdapEntry>> {
        let (entries, _) = self
            .inner
            .search(base_dn, scope.into(), filter, attributes.to_vec())
            .await
            .map_err(map_ldap_error)?
            .success()
            .map_err(map_ldap_error)?;
        Ok(entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(|entry| LdapEntry {
                dn: entry.dn,
                attributes: entry.attrs,
                binary_attributes: entry.bin_attrs,
            })
            .collect())
    }

    async fn modify(&mut self, dn: &str, modifications: &[DirectoryModification]) -> Result<()> {
        let mods = modifications
            .iter()
            .map(|m| match m {
                DirectoryModification::Add { attribute, values } => {
                    Mod::Add(attribute.clone().into_bytes(), value_set(values))
                }
                DirectoryModification::Delete { attribute, values } => {
                    Mod::Delete(attribute.clone().into_bytes(), value_set(values))
                }
                DirectoryModification::Replace { attribute, values } => {
                    Mod::Replace(attribute.clone().into_bytes(), value_set(values))
                }
            })
            .collect::<Vec<_>>();

        self.inner
            .modify(dn, mods)
            .await
            .map_err(map_ldap_error)?
            .success()
            .map_err(map_ldap_error)?;
        Ok(())
    }

    async fn add(&mut self, dn: &str, attributes: &[LdapAttribute]) -> Result<()> {
        let attrs = attributes
            .iter()
            .map(|attribute| {
                (
                    attribute.name.clone().into_bytes(),
                    value_set(&attribute.values),
                )
            })
            .collect::<Vec<_>>();

        self.inner
            .add(dn, attrs)
            .await
            .map_err(map_ldap_error)?
            .success()
            .map_err(map_ldap_error)?;
        Ok(())
    }

    async fn modify_dn(
        &mut self,
        dn: &str,
        new_rdn: &str,
        delete_old_rdn: bool,
        new_superior: &str,
    ) -> Result<()> {
        self.inner
            .modifydn(dn, new_rdn, delete_old_rdn, Some(new_superior))
            .await
            .map_err(map_ldap_error)?
            .success()
            .map_err(map_ldap_error)?;
        Ok(())
    }

    async fn unbind(&mut self) -> Result<()> {
        self.inner.unbind().await.map_err(map_ldap_error)
    }
}

fn value_set(values: &[Vec<u8>]) -> HashSet<Vec<u8>> {
    values.iter().cloned().collect()
}

fn build_ldap_settings(config: &DirectoryConfig) -> Result<LdapConnSettings> {
    let settings = LdapConnSettings::new().set_conn_timeout(config.connection_timeout());
    Ok(match tls_connector(config)? {
        Some(connector) => settings.set_connector(connector),
        None => settings,
    })
}

/// Builds the TLS connector for non-default trust settings; `None` keeps the system roots.
///
/// Disabled verification is expressed only through the returned connector.
fn tls_connector(config: &DirectoryConfig) -> Result<Option<TlsConnector>> {
    let mut builder = TlsConnector::builder();

    if !config.tls_verify() {
        warn!(
            host = config.host(),
            "TLS certificate verification is disabled for the directory connection"
        );
        builder.danger_accept_invalid_certs(true);
    } else if let Some(cert_path) = config.tls_ca_cert() {
        let pem = fs::read(cert_path).map_err(|err| {
            Error::ConfigError(format!(
                "failed to read CA certificate {}: {err}",
                cert_path.display()
            ))
        })?;
        let certificate = Certificate::from_pem(&pem)
            .map_err(|err| Error::ConfigError(format!("invalid CA certificate: {err}")))?;
        builder.add_root_certificate(certificate);
    } else {
        return Ok(None);
    }

    builder
        .build()
        .map(Some)
        .map_err(|err| Error::ConfigError(format!("failed to construct TLS connector: {err}")))
}

fn map_ldap_error(err: ldap3::LdapError) -> Error {
    Error::TransportError(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dn::DistinguishedName;
    use crate::session::MockDirectorySession;

    fn sample_config() -> DirectoryConfig {
        DirectoryConfig::new(
            "dc01.test.com",
            "CN=svc-adkit,OU=Service,DC=test,DC=com",
            "hunter2".to_string(),
            DistinguishedName::parse("DC=test,DC=com").unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn connect_binds_with_service_account() {
        let mut transport = MockDirectorySession::new();
        transport
            .expect_simple_bind()
            .withf(|dn, password| {
                dn == "CN=svc-adkit,OU=Service,DC=test,DC=com" && password == "hunter2"
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let mut connector = MockLdapConnector::new();
        connector
            .expect_connect()
            .times(1)
            .return_once(move || Ok(Box::new(transport)));

        let client = DirectoryClient::with_connector(
            sample_config().with_user_principal_suffix("corp.test.com"),
            Box::new(connector),
        );
        let session = client.connect().await.unwrap();
        assert_eq!(session.base_dn().as_str(), "DC=test,DC=com");
        assert_eq!(session.user_principal_suffix(), Some("corp.test.com"));
    }

    #[tokio::test]
    async fn rejected_bind_is_transport_error() {
        let mut transport = MockDirectorySession::new();
        transport.expect_simple_bind().returning(|_, _| {
            Err(Error::TransportError(
                "rc=49 (invalidCredentials)".to_string(),
            ))
        });

        let mut connector = MockLdapConnector::new();
        connector
            .expect_connect()
            .return_once(move || Ok(Box::new(transport)));

        let client = DirectoryClient::with_connector(sample_config(), Box::new(connector));
        let err = client.connect().await.unwrap_err();
        assert!(
            matches!(err, Error::TransportError(detail) if detail.contains("invalidCredentials"))
        );
    }

    #[tokio::test]
    async fn connector_failure_passes_through() {
        let mut connector = MockLdapConnector::new();
        connector
            .expect_connect()
            .returning(|| Err(Error::TransportError("connection refused".to_string())));

        let client = DirectoryClient::with_connector(sample_config(), Box::new(connector));
        assert_eq!(
            client.connect().await.unwrap_err(),
            Error::TransportError("connection refused".to_string())
        );
    }

    #[test]
    fn missing_trust_anchor_is_config_error() {
        let config = sample_config().with_tls_ca_cert("/nonexistent/adkit-ca.pem");
        let result = build_ldap_settings(&config);
        assert!(
            matches!(result, Err(Error::ConfigError(detail)) if detail.contains("adkit-ca.pem"))
        );
    }

    #[test]
    fn malformed_trust_anchor_is_config_error() {
        let path = std::env::temp_dir().join(format!("adkit-bad-ca-{}.pem", std::process::id()));
        fs::write(&path, b"not a certificate").unwrap();

        let result = build_ldap_settings(&sample_config().with_tls_ca_cert(&path));
        fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn only_non_default_trust_gets_a_connector() {
        assert!(tls_connector(&sample_config()).unwrap().is_none());
        assert!(tls_connector(&sample_config().with_tls_verification(false))
            .unwrap()
            .is_some());
    }

    #[test]
    fn default_and_unverified_settings_build() {
        assert!(build_ldap_settings(&sample_config()).is_ok());
        assert!(build_ldap_settings(&sample_config().with_tls_verification(false)).is_ok());
    }
}
