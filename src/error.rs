//! Error types for directory reconciliation.
//!
//! Every failure in this crate is surfaced synchronously to the caller; nothing
//! is retried internally. Errors carry enough context (server, base, filter,
//! DN, attempted attribute set) to diagnose the failing request without
//! re-running it.

use crate::attributes::AttributeSet;
use crate::connection::ProtocolError;
use std::fmt;

/// Main error type for directory operations.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// Dialing the server or binding failed. Fatal to the whole operation.
    #[error("Connection to '{server}' failed: {source}")]
    Connection {
        server: String,
        #[source]
        source: ProtocolError,
    },

    /// The search matched no entry.
    #[error("Resource not found.\nserver: {server}\nbase: {base}\nfilter: {filter}")]
    NotFound {
        server: String,
        base: String,
        filter: String,
    },

    /// The search matched more than one entry. RDN plus base should be unique,
    /// so this points at directory corruption or a filter bug.
    #[error("Non-unique search result ({count} entries).\nserver: {server}\nbase: {base}\nfilter: {filter}")]
    NonUniqueResult {
        server: String,
        base: String,
        filter: String,
        count: usize,
    },

    /// A distinguished name could not be split into RDN and path.
    #[error("Invalid distinguished name '{dn}': {reason}")]
    MalformedName { dn: String, reason: String },

    /// Constrained input rejected before any network call.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The server rejected a request after a successful bind.
    #[error("{operation} of '{dn}' rejected: {source}{context}")]
    Rejected {
        operation: OperationKind,
        dn: String,
        context: RejectionContext,
        #[source]
        source: ProtocolError,
    },

    /// Host supplied state or configuration that is not valid JSON for the target type.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Directory request that can be rejected by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Add,
    Search,
    Delete,
    Modify,
    ModifyDn,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Add => "Add",
            OperationKind::Search => "Search",
            OperationKind::Delete => "Delete",
            OperationKind::Modify => "Modify",
            OperationKind::ModifyDn => "ModifyDN",
        };
        f.write_str(name)
    }
}

/// Diagnostic payload attached to a [`DirectoryError::Rejected`].
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionContext {
    None,
    /// The attribute set the request tried to write.
    Attributes(AttributeSet),
    /// Target of a failed rename or move.
    Rename {
        rdn: String,
        new_superior: Option<String>,
    },
}

impl fmt::Display for RejectionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionContext::None => Ok(()),
            RejectionContext::Attributes(attributes) => write!(f, "\nattributes: {attributes}"),
            RejectionContext::Rename { rdn, new_superior } => write!(
                f,
                "\nrdn: {rdn}\npath: {}",
                new_superior.as_deref().unwrap_or("")
            ),
        }
    }
}

/// Validation errors for host supplied values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Value outside a closed set of labels.
    #[error("Attribute '{attribute}' has invalid value '{value}', allowed values: {allowed:?}")]
    InvalidEnumValue {
        attribute: String,
        value: String,
        allowed: Vec<String>,
    },

    /// Two attributes that cannot both be set.
    #[error("Attributes '{first}' and '{second}' are mutually exclusive")]
    ConflictingAttributes { first: String, second: String },

    /// A required attribute is empty.
    #[error("Required attribute '{attribute}' is missing")]
    MissingRequiredAttribute { attribute: String },

    /// Client configuration that cannot be used to reach a server.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl DirectoryError {
    /// Create a connection error.
    pub fn connection(server: impl Into<String>, source: ProtocolError) -> Self {
        Self::Connection {
            server: server.into(),
            source,
        }
    }

    /// Create a malformed name error.
    pub fn malformed_name(dn: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedName {
            dn: dn.into(),
            reason: reason.into(),
        }
    }

    /// Create a rejection error.
    pub fn rejected(
        operation: OperationKind,
        dn: impl Into<String>,
        context: RejectionContext,
        source: ProtocolError,
    ) -> Self {
        Self::Rejected {
            operation,
            dn: dn.into(),
            context,
            source,
        }
    }

    /// Whether this error means the entry does not exist (yet).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl ValidationError {
    /// Create an invalid enum value error.
    pub fn invalid_enum(
        attribute: impl Into<String>,
        value: impl Into<String>,
        allowed: &[&str],
    ) -> Self {
        Self::InvalidEnumValue {
            attribute: attribute.into(),
            value: value.into(),
            allowed: allowed.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Create a conflicting attributes error.
    pub fn conflicting(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self::ConflictingAttributes {
            first: first.into(),
            second: second.into(),
        }
    }

    /// Create a missing required attribute error.
    pub fn missing_required(attribute: impl Into<String>) -> Self {
        Self::MissingRequiredAttribute {
            attribute: attribute.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }
}

// Result type aliases for convenience
pub type DirectoryResult<T> = Result<T, DirectoryError>;
pub type ValidationResult<T> = Result<T, ValidationError>;
