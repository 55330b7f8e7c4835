//! Host lifecycle callbacks.
//!
//! An infrastructure-as-code host drives each managed object through
//! create, read, update, delete and import. [`ResourceLifecycle`] maps those
//! callbacks onto [`DirectoryClient`] operations and returns the DN the host
//! persists as the object's identity.
//!
//! | Callback      | Directory requests                   |
//! |---------------|--------------------------------------|
//! | create        | add, then search                     |
//! | read          | search                               |
//! | update        | modify-DN and/or modify, then search |
//! | delete        | delete                               |
//! | import        | search at an externally supplied DN  |
//!
//! ```rust
//! use ldap_provider::client::DirectoryClient;
//! use ldap_provider::config::ClientConfig;
//! use ldap_provider::connection::InMemoryDirectory;
//! use ldap_provider::lifecycle::ResourceLifecycle;
//! use ldap_provider::objects::{DirectoryObject, Group, ResourceKind};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("ldap://memory", "cn=admin,dc=example,dc=com");
//! let lifecycle = ResourceLifecycle::new(DirectoryClient::new(config, InMemoryDirectory::new())?);
//!
//! let mut group = Group::new("admins", "ou=groups,dc=example,dc=com");
//! let id = lifecycle.create(&mut group).await?;
//! assert_eq!(id, "cn=admins,ou=groups,dc=example,dc=com");
//!
//! let imported = lifecycle.import(ResourceKind::Group, &id).await?;
//! assert_eq!(imported.distinguished_name(), id);
//! # Ok(())
//! # }
//! ```

use crate::client::DirectoryClient;
use crate::connection::Connector;
use crate::error::DirectoryResult;
use crate::objects::{DirectoryObject, ManagedObject, ResourceKind};
use log::{info, warn};

/// Lifecycle callbacks over one directory client.
pub struct ResourceLifecycle<C: Connector> {
    client: DirectoryClient<C>,
}

impl<C: Connector> ResourceLifecycle<C> {
    pub fn new(client: DirectoryClient<C>) -> Self {
        Self { client }
    }

    /// Get the underlying client.
    pub fn client(&self) -> &DirectoryClient<C> {
        &self.client
    }

    /// Add `object`, read it back, and return its DN.
    pub async fn create<O>(&self, object: &mut O) -> DirectoryResult<String>
    where
        O: DirectoryObject + ?Sized,
    {
        self.client.add(&*object).await?;
        self.client.search(object).await?;
        let dn = object.distinguished_name();
        info!("Created {} {}", object.kind(), dn);
        Ok(dn)
    }

    /// Refresh `object` from the server.
    pub async fn read<O>(&self, object: &mut O) -> DirectoryResult<()>
    where
        O: DirectoryObject + ?Sized,
    {
        self.client.search(object).await
    }

    /// Refresh `object`, returning `false` when the entry no longer exists so
    /// the host can drop it from state.
    pub async fn read_optional<O>(&self, object: &mut O) -> DirectoryResult<bool>
    where
        O: DirectoryObject + ?Sized,
    {
        match self.client.search(object).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => {
                warn!(
                    "{} {} no longer exists",
                    object.kind(),
                    object.distinguished_name()
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Reconcile `old` into `new`, read `new` back, and return its DN.
    pub async fn update<O>(&self, old: &O, new: &mut O) -> DirectoryResult<String>
    where
        O: DirectoryObject + ?Sized,
    {
        self.client.modify(old, &*new).await?;
        self.client.search(new).await?;
        let dn = new.distinguished_name();
        info!("Updated {} {}", new.kind(), dn);
        Ok(dn)
    }

    /// Remove the entry for `object`.
    pub async fn delete<O>(&self, object: &O) -> DirectoryResult<()>
    where
        O: DirectoryObject + ?Sized,
    {
        self.client.delete(object).await?;
        info!("Deleted {} {}", object.kind(), object.distinguished_name());
        Ok(())
    }

    /// Adopt an existing entry of `kind` at `dn`.
    ///
    /// # Errors
    ///
    /// [`MalformedName`](crate::error::DirectoryError::MalformedName) when the
    /// DN is not named by the kind's naming attribute, or any search error.
    pub async fn import(&self, kind: ResourceKind, dn: &str) -> DirectoryResult<ManagedObject> {
        let mut object = ManagedObject::import(kind, dn)?;
        self.client.search(&mut object).await?;
        info!("Imported {} {}", kind, object.distinguished_name());
        Ok(object)
    }
}
