//! Directory wire collaborator.
//!
//! This module separates the reconciliation core from the LDAP protocol. The
//! [`Connector`] trait dials a server and hands back a [`DirectoryConnection`],
//! which exposes exactly the requests the core needs: bind, add, search,
//! delete, modify-DN, modify, and close.
//!
//! Two implementations ship with the crate:
//!
//! - [`Ldap3Connector`] talks to a real server through the `ldap3` crate.
//! - [`InMemoryDirectory`] keeps entries in memory, records every request,
//!   and can inject failures. It backs the test suite and local development.
//!
//! # Example Usage
//!
//! ```rust
//! use ldap_provider::attributes::AttributeSet;
//! use ldap_provider::connection::{Connector, DirectoryConnection, InMemoryDirectory, SearchRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let directory = InMemoryDirectory::new();
//! let mut connection = directory.dial("ldap://memory").await?;
//! connection.unauthenticated_bind("cn=admin,dc=example,dc=com").await?;
//!
//! let attributes = AttributeSet::new()
//!     .with("objectClass", ["top", "organizationalUnit"])
//!     .with("ou", ["people"]);
//! connection.add("ou=people,dc=example,dc=com", &attributes).await?;
//!
//! let request = SearchRequest::new(
//!     "dc=example,dc=com",
//!     "(&(ou=people)(objectClass=organizationalUnit))",
//!     vec!["ou".to_string()],
//! );
//! let entries = connection.search(&request).await?;
//! assert_eq!(entries.len(), 1);
//! connection.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod in_memory;
pub mod ldap;

pub use in_memory::{
    InMemoryConnection, InMemoryDirectory, InMemoryDirectoryStats, RecordedRequest, RequestKind,
};
pub use ldap::{Ldap3Connection, Ldap3Connector};

use crate::attributes::AttributeSet;
use std::fmt;
use std::future::Future;

/// LDAP result codes the core inspects or produces.
pub mod result_code {
    pub const SUCCESS: u32 = 0;
    pub const NO_SUCH_ATTRIBUTE: u32 = 16;
    pub const CONSTRAINT_VIOLATION: u32 = 19;
    pub const ATTRIBUTE_OR_VALUE_EXISTS: u32 = 20;
    pub const NO_SUCH_OBJECT: u32 = 32;
    pub const INVALID_CREDENTIALS: u32 = 49;
    pub const INSUFFICIENT_ACCESS_RIGHTS: u32 = 50;
    pub const UNWILLING_TO_PERFORM: u32 = 53;
    pub const NOT_ALLOWED_ON_NON_LEAF: u32 = 66;
    pub const ENTRY_ALREADY_EXISTS: u32 = 68;

    /// RFC 4511 name of `code`, when known.
    pub fn name(code: u32) -> Option<&'static str> {
        Some(match code {
            SUCCESS => "success",
            NO_SUCH_ATTRIBUTE => "noSuchAttribute",
            CONSTRAINT_VIOLATION => "constraintViolation",
            ATTRIBUTE_OR_VALUE_EXISTS => "attributeOrValueExists",
            NO_SUCH_OBJECT => "noSuchObject",
            INVALID_CREDENTIALS => "invalidCredentials",
            INSUFFICIENT_ACCESS_RIGHTS => "insufficientAccessRights",
            UNWILLING_TO_PERFORM => "unwillingToPerform",
            NOT_ALLOWED_ON_NON_LEAF => "notAllowedOnNonLeaf",
            ENTRY_ALREADY_EXISTS => "entryAlreadyExists",
            _ => return None,
        })
    }
}

/// Failure reported by the wire layer: a non-success LDAP result or a
/// transport error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    result_code: Option<u32>,
    message: String,
}

impl ProtocolError {
    /// Transport-level failure without an LDAP result code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            result_code: None,
            message: message.into(),
        }
    }

    /// Server result with a non-success code.
    pub fn with_code(result_code: u32, message: impl Into<String>) -> Self {
        Self {
            result_code: Some(result_code),
            message: message.into(),
        }
    }

    /// The LDAP result code, if the server answered.
    pub fn result_code(&self) -> Option<u32> {
        self.result_code
    }

    /// Diagnostic message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.result_code {
            Some(code) => match result_code::name(code) {
                Some(name) => write!(f, "LDAP result code {code} ({name}): {}", self.message),
                None => write!(f, "LDAP result code {code}: {}", self.message),
            },
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ProtocolError {}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Subtree search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub base: String,
    pub filter: String,
    /// Attributes to return. Empty means all user attributes.
    pub attributes: Vec<String>,
}

impl SearchRequest {
    pub fn new(base: impl Into<String>, filter: impl Into<String>, attributes: Vec<String>) -> Self {
        Self {
            base: base.into(),
            filter: filter.into(),
            attributes,
        }
    }
}

/// One entry returned by a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEntry {
    pub dn: String,
    pub attributes: AttributeSet,
}

/// Rename and/or move of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyDnRequest {
    pub dn: String,
    pub new_rdn: String,
    pub delete_old_rdn: bool,
    /// New parent. `None` keeps the entry in place (pure rename).
    pub new_superior: Option<String>,
}

/// A single change inside a modify request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modification {
    Add { attribute: String, values: Vec<String> },
    Replace { attribute: String, values: Vec<String> },
    Delete { attribute: String, values: Vec<String> },
}

impl Modification {
    pub fn add(attribute: impl Into<String>, values: &[String]) -> Self {
        Self::Add {
            attribute: attribute.into(),
            values: values.to_vec(),
        }
    }

    pub fn replace(attribute: impl Into<String>, values: &[String]) -> Self {
        Self::Replace {
            attribute: attribute.into(),
            values: values.to_vec(),
        }
    }

    pub fn delete(attribute: impl Into<String>, values: &[String]) -> Self {
        Self::Delete {
            attribute: attribute.into(),
            values: values.to_vec(),
        }
    }

    /// Attribute the change applies to.
    pub fn attribute(&self) -> &str {
        match self {
            Self::Add { attribute, .. }
            | Self::Replace { attribute, .. }
            | Self::Delete { attribute, .. } => attribute,
        }
    }

    /// Values carried by the change.
    pub fn values(&self) -> &[String] {
        match self {
            Self::Add { values, .. } | Self::Replace { values, .. } | Self::Delete { values, .. } => {
                values
            }
        }
    }
}

/// An open connection to a directory server.
///
/// Requests are issued serially by the caller. `add` only writes entries of the
/// attribute set that carry a value.
pub trait DirectoryConnection: Send {
    /// Bind with a DN and password.
    fn simple_bind(
        &mut self,
        bind_dn: &str,
        password: &str,
    ) -> impl Future<Output = ProtocolResult<()>> + Send;

    /// Bind asserting only a DN.
    fn unauthenticated_bind(&mut self, bind_dn: &str) -> impl Future<Output = ProtocolResult<()>> + Send;

    /// Create an entry.
    fn add(
        &mut self,
        dn: &str,
        attributes: &AttributeSet,
    ) -> impl Future<Output = ProtocolResult<()>> + Send;

    /// Search the subtree rooted at `request.base`.
    fn search(
        &mut self,
        request: &SearchRequest,
    ) -> impl Future<Output = ProtocolResult<Vec<SearchEntry>>> + Send;

    /// Delete an entry.
    fn delete(&mut self, dn: &str) -> impl Future<Output = ProtocolResult<()>> + Send;

    /// Rename and/or move an entry.
    fn modify_dn(
        &mut self,
        request: &ModifyDnRequest,
    ) -> impl Future<Output = ProtocolResult<()>> + Send;

    /// Apply attribute changes in one request.
    fn modify(
        &mut self,
        dn: &str,
        modifications: &[Modification],
    ) -> impl Future<Output = ProtocolResult<()>> + Send;

    /// Unbind and release the connection.
    fn close(&mut self) -> impl Future<Output = ProtocolResult<()>> + Send;
}

/// Dials directory servers.
pub trait Connector: Send + Sync {
    type Connection: DirectoryConnection;

    /// Open a connection to `url`.
    fn dial(&self, url: &str) -> impl Future<Output = ProtocolResult<Self::Connection>> + Send;
}
