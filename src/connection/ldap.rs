//! `ldap3` backed connector.
//!
//! Each [`Ldap3Connector::dial`] opens a fresh TCP (or TLS for `ldaps://`)
//! connection and spawns its driver on the current tokio runtime. The driver
//! task ends when the connection is closed.

use crate::attributes::AttributeSet;
use crate::connection::{
    Connector, DirectoryConnection, Modification, ModifyDnRequest, ProtocolError, ProtocolResult,
    SearchEntry, SearchRequest,
};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError, Mod, Scope};
use log::{debug, trace, warn};
use std::collections::HashSet;

/// Dials LDAP servers with `ldap3`.
#[derive(Debug, Clone, Default)]
pub struct Ldap3Connector {
    starttls: bool,
}

impl Ldap3Connector {
    /// Create a connector with default connection settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Upgrade plain `ldap://` connections with StartTLS.
    pub fn with_starttls(mut self) -> Self {
        self.starttls = true;
        self
    }
}

impl Connector for Ldap3Connector {
    type Connection = Ldap3Connection;

    async fn dial(&self, url: &str) -> ProtocolResult<Ldap3Connection> {
        debug!("Connecting to LDAP server at {}", url);
        let settings = LdapConnSettings::new().set_starttls(self.starttls);
        let (conn, ldap) = LdapConnAsync::with_settings(settings, url)
            .await
            .map_err(into_protocol_error)?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!("LDAP connection driver error: {}", e);
            }
        });

        Ok(Ldap3Connection { ldap })
    }
}

/// An open `ldap3` connection.
pub struct Ldap3Connection {
    ldap: Ldap,
}

impl DirectoryConnection for Ldap3Connection {
    async fn simple_bind(&mut self, bind_dn: &str, password: &str) -> ProtocolResult<()> {
        debug!("Performing LDAP simple bind as {}", bind_dn);
        self.ldap
            .simple_bind(bind_dn, password)
            .await
            .and_then(|result| result.success())
            .map(|_| ())
            .map_err(into_protocol_error)
    }

    async fn unauthenticated_bind(&mut self, bind_dn: &str) -> ProtocolResult<()> {
        // RFC 4513 5.1.2: a simple bind with a name and an empty password.
        debug!("Performing LDAP unauthenticated bind as {}", bind_dn);
        self.ldap
            .simple_bind(bind_dn, "")
            .await
            .and_then(|result| result.success())
            .map(|_| ())
            .map_err(into_protocol_error)
    }

    async fn add(&mut self, dn: &str, attributes: &AttributeSet) -> ProtocolResult<()> {
        let ldap_attrs: Vec<(&str, HashSet<&str>)> = attributes
            .iter()
            .map(|(name, values)| (name, values.iter().map(String::as_str).collect()))
            .collect();
        trace!("LDAP add {} with {} attributes", dn, ldap_attrs.len());
        self.ldap
            .add(dn, ldap_attrs)
            .await
            .and_then(|result| result.success())
            .map(|_| ())
            .map_err(into_protocol_error)
    }

    async fn search(&mut self, request: &SearchRequest) -> ProtocolResult<Vec<SearchEntry>> {
        trace!(
            "LDAP search base={} filter={} attributes={:?}",
            request.base, request.filter, request.attributes
        );
        let (entries, _result) = self
            .ldap
            .search(
                &request.base,
                Scope::Subtree,
                &request.filter,
                request.attributes.clone(),
            )
            .await
            .and_then(|result| result.success())
            .map_err(into_protocol_error)?;

        Ok(entries
            .into_iter()
            .map(ldap3::SearchEntry::construct)
            .map(|entry| SearchEntry {
                dn: entry.dn,
                attributes: AttributeSet::from(entry.attrs),
            })
            .collect())
    }

    async fn delete(&mut self, dn: &str) -> ProtocolResult<()> {
        trace!("LDAP delete {}", dn);
        self.ldap
            .delete(dn)
            .await
            .and_then(|result| result.success())
            .map(|_| ())
            .map_err(into_protocol_error)
    }

    async fn modify_dn(&mut self, request: &ModifyDnRequest) -> ProtocolResult<()> {
        trace!(
            "LDAP modify-DN {} -> {} (new superior: {:?})",
            request.dn, request.new_rdn, request.new_superior
        );
        self.ldap
            .modifydn(
                &request.dn,
                &request.new_rdn,
                request.delete_old_rdn,
                request.new_superior.as_deref(),
            )
            .await
            .and_then(|result| result.success())
            .map(|_| ())
            .map_err(into_protocol_error)
    }

    async fn modify(&mut self, dn: &str, modifications: &[Modification]) -> ProtocolResult<()> {
        let mods: Vec<Mod<String>> = modifications.iter().map(to_ldap_mod).collect();
        trace!("LDAP modify {} with {} changes", dn, mods.len());
        self.ldap
            .modify(dn, mods)
            .await
            .and_then(|result| result.success())
            .map(|_| ())
            .map_err(into_protocol_error)
    }

    async fn close(&mut self) -> ProtocolResult<()> {
        self.ldap.unbind().await.map_err(into_protocol_error)
    }
}

fn to_ldap_mod(modification: &Modification) -> Mod<String> {
    let values = |values: &[String]| values.iter().cloned().collect::<HashSet<String>>();
    match modification {
        Modification::Add { attribute, values: v } => Mod::Add(attribute.clone(), values(v)),
        Modification::Replace { attribute, values: v } => {
            Mod::Replace(attribute.clone(), values(v))
        }
        Modification::Delete { attribute, values: v } => Mod::Delete(attribute.clone(), values(v)),
    }
}

fn into_protocol_error(error: LdapError) -> ProtocolError {
    match error {
        LdapError::LdapResult { result } => ProtocolError::with_code(result.rc, result.text),
        other => ProtocolError::new(other.to_string()),
    }
}
