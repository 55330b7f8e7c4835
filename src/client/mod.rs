//! Directory client: the reconciliation engine.
//!
//! [`DirectoryClient`] turns [`DirectoryObject`]s into directory requests.
//! Every public operation opens its own connection, binds, runs, and closes
//! the connection again whether the operation succeeded or not. Nothing is
//! cached or retried between calls.
//!
//! # Modify
//!
//! [`DirectoryClient::modify`] reconciles an observed object with a desired
//! one in two phases:
//!
//! 1. When the names differ, a single modify-DN renames and/or moves the
//!    entry. A failure here stops the operation.
//! 2. The attribute sets are diffed (see [`diff::diff_attributes`]) and the
//!    resulting changes are sent in one modify request. An empty diff sends
//!    nothing.
//!
//! If phase 2 fails after a successful rename, the entry stays renamed.
//!
//! # Example Usage
//!
//! ```rust
//! use ldap_provider::client::DirectoryClient;
//! use ldap_provider::config::ClientConfig;
//! use ldap_provider::connection::InMemoryDirectory;
//! use ldap_provider::objects::{DirectoryObject, OrganizationalUnit};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("ldap://memory", "cn=admin,dc=example,dc=com");
//! let client = DirectoryClient::new(config, InMemoryDirectory::new())?;
//!
//! let mut desired = OrganizationalUnit::new("people", "dc=example,dc=com");
//! desired.description = "Staff accounts".to_string();
//! client.add(&desired).await?;
//!
//! let mut observed = OrganizationalUnit::new("people", "dc=example,dc=com");
//! client.search(&mut observed).await?;
//! assert_eq!(observed.description, "Staff accounts");
//!
//! desired.description = "All staff accounts".to_string();
//! client.modify(&observed, &desired).await?;
//! # Ok(())
//! # }
//! ```

pub mod diff;

use crate::config::ClientConfig;
use crate::connection::{Connector, DirectoryConnection, Ldap3Connector, SearchRequest};
use crate::dn;
use crate::error::{DirectoryError, DirectoryResult, OperationKind, RejectionContext};
use crate::objects::DirectoryObject;
use log::{debug, info, warn};
use std::future::Future;
use std::pin::Pin;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Reconciles directory objects against one server.
#[derive(Debug, Clone)]
pub struct DirectoryClient<C: Connector> {
    config: ClientConfig,
    connector: C,
}

impl DirectoryClient<Ldap3Connector> {
    /// Client talking to a real server through `ldap3`.
    pub fn ldap3(config: ClientConfig) -> DirectoryResult<Self> {
        Self::new(config, Ldap3Connector::new())
    }
}

impl<C: Connector> DirectoryClient<C> {
    /// Create a client. The configuration is validated here, before any
    /// connection is attempted.
    pub fn new(config: ClientConfig, connector: C) -> DirectoryResult<Self> {
        config.validate()?;
        Ok(Self { config, connector })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Create the entry for `object`.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::Rejected`] carrying the attempted attribute set when
    /// the server refuses the add.
    pub async fn add<O>(&self, object: &O) -> DirectoryResult<()>
    where
        O: DirectoryObject + ?Sized,
    {
        object.validate()?;
        let dn = object.distinguished_name();
        let attributes = object.to_attributes();
        debug!("Adding {} {}", object.kind(), dn);

        self.bind_then(move |connection| {
            Box::pin(async move {
                connection.add(&dn, &attributes).await.map_err(|source| {
                    DirectoryError::rejected(
                        OperationKind::Add,
                        &dn,
                        RejectionContext::Attributes(attributes.clone()),
                        source,
                    )
                })?;
                info!("Added {}", dn);
                Ok(())
            })
        })
        .await
    }

    /// Find the entry for `object` and populate it from the server.
    ///
    /// Searches the subtree under the object's path for its RDN and object
    /// classes, requesting every attribute the object maps. On success the
    /// object's fields and resolved DN reflect the server.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::NotFound`] for zero matches and
    /// [`DirectoryError::NonUniqueResult`] for more than one.
    pub async fn search<O>(&self, object: &mut O) -> DirectoryResult<()>
    where
        O: DirectoryObject + ?Sized,
    {
        let base = object.base_path().to_string();
        let filter = dn::filter(&object.relative_dn(), &object.object_class());
        let attributes: Vec<String> = object
            .to_attributes()
            .keys()
            .map(str::to_string)
            .collect();
        let request = SearchRequest::new(base.clone(), filter.clone(), attributes);
        debug!("Searching {} under '{}' with {}", object.kind(), base, filter);

        let mut entries = self
            .bind_then(move |connection| {
                Box::pin(async move {
                    connection.search(&request).await.map_err(|source| {
                        DirectoryError::rejected(
                            OperationKind::Search,
                            &request.base,
                            RejectionContext::None,
                            source,
                        )
                    })
                })
            })
            .await?;

        match entries.len() {
            0 => Err(DirectoryError::NotFound {
                server: self.config.server.clone(),
                base,
                filter,
            }),
            1 => {
                let entry = entries.remove(0);
                object.apply_attributes(&entry.attributes);
                object.set_resolved_dn(entry.dn);
                Ok(())
            }
            count => Err(DirectoryError::NonUniqueResult {
                server: self.config.server.clone(),
                base,
                filter,
                count,
            }),
        }
    }

    /// Delete the entry for `object`.
    pub async fn delete<O>(&self, object: &O) -> DirectoryResult<()>
    where
        O: DirectoryObject + ?Sized,
    {
        let dn = object.distinguished_name();
        debug!("Deleting {} {}", object.kind(), dn);

        self.bind_then(move |connection| {
            Box::pin(async move {
                connection.delete(&dn).await.map_err(|source| {
                    DirectoryError::rejected(OperationKind::Delete, &dn, RejectionContext::None, source)
                })?;
                info!("Deleted {}", dn);
                Ok(())
            })
        })
        .await
    }

    /// Reconcile the entry observed as `old` with the desired state `new`.
    ///
    /// When nothing differs no connection is opened. After a rename the
    /// naming attribute is left to the modify-DN and excluded from the
    /// attribute diff.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::Rejected`] with the rename target when the modify-DN
    /// fails (no attribute changes are attempted), or with the desired
    /// attribute set when the modify fails.
    pub async fn modify<O>(&self, old: &O, new: &O) -> DirectoryResult<()>
    where
        O: DirectoryObject + ?Sized,
    {
        new.validate()?;
        let rename = diff::plan_rename(old, new);
        let new_attributes = new.to_attributes();
        let mut modifications = diff::diff_attributes(&old.to_attributes(), &new_attributes);
        if rename.is_some() {
            let naming = new.kind().naming_attribute();
            modifications.retain(|m| !m.attribute().eq_ignore_ascii_case(naming));
        }

        if rename.is_none() && modifications.is_empty() {
            debug!("{} is up to date", old.distinguished_name());
            return Ok(());
        }

        let target = match &rename {
            Some(_) => new.distinguished_name(),
            None => old.distinguished_name(),
        };

        self.bind_then(move |connection| {
            Box::pin(async move {
                if let Some(request) = rename {
                    debug!(
                        "Renaming {} to {} under {:?}",
                        request.dn, request.new_rdn, request.new_superior
                    );
                    connection.modify_dn(&request).await.map_err(|source| {
                        DirectoryError::rejected(
                            OperationKind::ModifyDn,
                            &request.dn,
                            RejectionContext::Rename {
                                rdn: request.new_rdn.clone(),
                                new_superior: request.new_superior.clone(),
                            },
                            source,
                        )
                    })?;
                    info!("Renamed {} to {}", request.dn, target);
                }

                if modifications.is_empty() {
                    return Ok(());
                }
                debug!("Modifying {} with {} changes", target, modifications.len());
                connection
                    .modify(&target, &modifications)
                    .await
                    .map_err(|source| {
                        DirectoryError::rejected(
                            OperationKind::Modify,
                            &target,
                            RejectionContext::Attributes(new_attributes.clone()),
                            source,
                        )
                    })?;
                info!("Modified {}", target);
                Ok(())
            })
        })
        .await
    }

    /// Dial, bind, run `operation`, and close the connection on every path.
    ///
    /// A password selects a simple bind, otherwise an unauthenticated bind as
    /// the configured DN. A failed dial or bind skips `operation`.
    async fn bind_then<T, F>(&self, operation: F) -> DirectoryResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut C::Connection) -> BoxFuture<'c, DirectoryResult<T>> + Send,
    {
        let server = &self.config.server;
        let mut connection = self
            .connector
            .dial(server)
            .await
            .map_err(|source| DirectoryError::connection(server, source))?;

        let bound = match &self.config.bind_password {
            Some(password) => connection.simple_bind(&self.config.bind_dn, password).await,
            None => connection.unauthenticated_bind(&self.config.bind_dn).await,
        };

        let result = match bound {
            Ok(()) => operation(&mut connection).await,
            Err(source) => {
                warn!("Bind to {} as {} failed: {}", server, self.config.bind_dn, source);
                Err(DirectoryError::connection(server, source))
            }
        };

        if let Err(e) = connection.close().await {
            warn!("Failed to close connection to {}: {}", server, e);
        }
        result
    }
}
