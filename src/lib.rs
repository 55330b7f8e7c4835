//! Reconciliation core for managing LDAP / Active Directory objects.
//!
//! Maps strongly typed organizational units, groups and users to and from
//! directory attribute sets, computes the minimal change between an observed
//! and a desired object, and issues the directory requests that apply it.
//!
//! # Core Components
//!
//! - [`AttributeSet`] - Multi-valued attributes exchanged with the directory
//! - [`dn`] - Distinguished name helpers and search filters
//! - [`DirectoryObject`] - Capabilities of [`OrganizationalUnit`], [`Group`] and [`User`]
//! - [`DirectoryClient`] - Bind, add, search, delete and modify reconciliation
//! - [`ResourceLifecycle`] - Create/read/update/delete/import callbacks for hosts
//! - [`connection`] - Wire collaborator trait with `ldap3` and in-memory implementations
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ldap_provider::{ClientConfig, DirectoryClient, ResourceLifecycle, User};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("ldaps://dc1.example.com", "cn=admin,dc=example,dc=com")
//!     .with_password("secret");
//! let lifecycle = ResourceLifecycle::new(DirectoryClient::ldap3(config)?);
//!
//! let mut user = User::new("alice", "ou=people,dc=example,dc=com");
//! user.email_address = "alice@example.com".to_string();
//! let id = lifecycle.create(&mut user).await?;
//! # Ok(())
//! # }
//! ```

pub mod attributes;
pub mod client;
pub mod config;
pub mod connection;
pub mod dn;
pub mod error;
pub mod lifecycle;
pub mod objects;

// Re-export commonly used types for convenience
pub use attributes::AttributeSet;
pub use client::DirectoryClient;
pub use config::ClientConfig;
pub use error::{DirectoryError, DirectoryResult, ValidationError, ValidationResult};
pub use lifecycle::ResourceLifecycle;
pub use objects::{
    DirectoryObject, Group, GroupCategory, GroupScope, ManagedObject, OrganizationalUnit,
    ResourceKind, SamAccountType, User,
};
