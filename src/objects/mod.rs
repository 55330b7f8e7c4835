//! Directory object model.
//!
//! Three variants are managed: [`OrganizationalUnit`], [`Group`] and [`User`].
//! Each implements [`DirectoryObject`], the capability set the client needs to
//! address, search, write and diff an entry. [`ManagedObject`] wraps the closed
//! variant set for callers that only learn the kind at runtime, such as a host
//! importing an existing entry by DN.
//!
//! # Naming
//!
//! Every object is named by one attribute (`ou` for organizational units,
//! `cn` for groups and users) and a container path. Until a search resolves
//! the authoritative DN, [`DirectoryObject::distinguished_name`] composes it
//! from the two.
//!
//! ```rust
//! use ldap_provider::objects::{DirectoryObject, User};
//!
//! let mut user = User::new("alice", "ou=people,dc=example,dc=com");
//! user.email_address = "alice@example.com".to_string();
//!
//! assert_eq!(user.relative_dn(), "cn=alice");
//! assert_eq!(user.distinguished_name(), "cn=alice,ou=people,dc=example,dc=com");
//! assert_eq!(user.base_dn(), "dc=example,dc=com");
//!
//! let attributes = user.to_attributes();
//! assert_eq!(attributes.get_first("mail"), "alice@example.com");
//! assert!(attributes.contains_key("uidNumber"));
//! assert!(!attributes.has_value("uidNumber"));
//! ```

pub mod group;
pub mod organizational_unit;
pub mod sam_account_type;
pub mod user;

pub use group::{Group, GroupCategory, GroupScope};
pub use organizational_unit::OrganizationalUnit;
pub use sam_account_type::SamAccountType;
pub use user::User;

use crate::attributes::AttributeSet;
use crate::dn;
use crate::error::{DirectoryError, DirectoryResult, ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Capabilities shared by every managed directory object.
pub trait DirectoryObject: Send + Sync {
    /// Variant of this object.
    fn kind(&self) -> ResourceKind;

    /// Object classes, falling back to the kind's defaults when none are set.
    fn object_class(&self) -> Vec<String>;

    /// `<naming attribute>=<escaped value>`.
    fn relative_dn(&self) -> String;

    /// DN of the containing entry.
    fn base_path(&self) -> &str;

    /// DN captured from the last successful search, if any.
    fn resolved_dn(&self) -> Option<&str>;

    /// Record the authoritative DN returned by the server.
    fn set_resolved_dn(&mut self, dn: String);

    /// Serialize every domain field under its directory attribute name.
    ///
    /// Unset optional fields appear as unset slots so a search still
    /// requests them.
    fn to_attributes(&self) -> AttributeSet;

    /// Populate domain fields from attributes fetched from the server.
    fn apply_attributes(&mut self, attributes: &AttributeSet);

    /// The resolved DN, or `relative_dn(),base_path()` before resolution.
    fn distinguished_name(&self) -> String {
        match self.resolved_dn() {
            Some(dn) => dn.to_string(),
            None => dn::compose_dn(&self.relative_dn(), self.base_path()),
        }
    }

    /// Trailing `dc=` chain of the path.
    fn base_dn(&self) -> String {
        dn::base_dn(self.base_path())
    }

    /// Check constrained fields before any request is sent.
    fn validate(&self) -> ValidationResult<()> {
        Ok(())
    }
}

/// The managed object variants and their host type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    OrganizationalUnit,
    Group,
    User,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::OrganizationalUnit,
        ResourceKind::Group,
        ResourceKind::User,
    ];

    /// Resource type name used by the host.
    pub fn type_name(&self) -> &'static str {
        match self {
            ResourceKind::OrganizationalUnit => "ldap_organizational_unit",
            ResourceKind::Group => "ldap_group",
            ResourceKind::User => "ldap_user",
        }
    }

    /// Attribute the RDN is built from.
    pub fn naming_attribute(&self) -> &'static str {
        match self {
            ResourceKind::OrganizationalUnit => "ou",
            ResourceKind::Group | ResourceKind::User => "cn",
        }
    }

    /// Object classes used when none are configured.
    pub fn default_object_classes(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::OrganizationalUnit => &["top", "organizationalUnit"],
            ResourceKind::Group => &["top", "group"],
            ResourceKind::User => &["top", "person", "organizationalPerson", "user"],
        }
    }

    /// Split `dn` into the naming value and container path, checking that the
    /// RDN uses this kind's naming attribute.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::MalformedName`] when the DN cannot be split or the
    /// RDN names another attribute.
    pub fn split_distinguished_name(&self, dn: &str) -> DirectoryResult<(String, String)> {
        let (relative_dn, path) = dn::parse_dn(dn)?;
        let naming = self.naming_attribute();
        match dn::split_rdn(&relative_dn) {
            Some((attribute, value))
                if attribute.eq_ignore_ascii_case(naming) && !value.is_empty() =>
            {
                Ok((value, path))
            }
            _ => Err(DirectoryError::malformed_name(
                dn,
                format!("{} must be named by '{naming}='", self.type_name()),
            )),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for ResourceKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_name() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|k| k.type_name()).collect();
                ValidationError::invalid_enum("resource_type", s, &allowed)
            })
    }
}

/// Any managed object, dispatched by variant.
#[derive(Debug, Clone, PartialEq)]
pub enum ManagedObject {
    OrganizationalUnit(OrganizationalUnit),
    Group(Group),
    User(User),
}

impl ManagedObject {
    /// Decode host state (a JSON object keyed by the host's field names) and
    /// validate it.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::Json`] for malformed state and
    /// [`DirectoryError::Validation`] for constraint violations.
    pub fn from_state(kind: ResourceKind, state: &str) -> DirectoryResult<Self> {
        let object = match kind {
            ResourceKind::OrganizationalUnit => {
                ManagedObject::OrganizationalUnit(serde_json::from_str(state)?)
            }
            ResourceKind::Group => ManagedObject::Group(serde_json::from_str(state)?),
            ResourceKind::User => ManagedObject::User(serde_json::from_str(state)?),
        };
        object.validate()?;
        Ok(object)
    }

    /// Encode as host state.
    pub fn to_state(&self) -> DirectoryResult<serde_json::Value> {
        let value = match self {
            ManagedObject::OrganizationalUnit(ou) => serde_json::to_value(ou)?,
            ManagedObject::Group(group) => serde_json::to_value(group)?,
            ManagedObject::User(user) => serde_json::to_value(user)?,
        };
        Ok(value)
    }

    /// Build an unresolved object of `kind` addressed by an existing DN.
    pub fn import(kind: ResourceKind, dn: &str) -> DirectoryResult<Self> {
        let (value, path) = kind.split_distinguished_name(dn)?;
        let mut object = match kind {
            ResourceKind::OrganizationalUnit => {
                ManagedObject::OrganizationalUnit(OrganizationalUnit::new(value, path))
            }
            ResourceKind::Group => ManagedObject::Group(Group::new(value, path)),
            ResourceKind::User => ManagedObject::User(User::new(value, path)),
        };
        object.set_resolved_dn(dn.to_string());
        Ok(object)
    }

    fn inner(&self) -> &dyn DirectoryObject {
        match self {
            ManagedObject::OrganizationalUnit(ou) => ou,
            ManagedObject::Group(group) => group,
            ManagedObject::User(user) => user,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn DirectoryObject {
        match self {
            ManagedObject::OrganizationalUnit(ou) => ou,
            ManagedObject::Group(group) => group,
            ManagedObject::User(user) => user,
        }
    }
}

impl DirectoryObject for ManagedObject {
    fn kind(&self) -> ResourceKind {
        self.inner().kind()
    }

    fn object_class(&self) -> Vec<String> {
        self.inner().object_class()
    }

    fn relative_dn(&self) -> String {
        self.inner().relative_dn()
    }

    fn base_path(&self) -> &str {
        self.inner().base_path()
    }

    fn resolved_dn(&self) -> Option<&str> {
        self.inner().resolved_dn()
    }

    fn set_resolved_dn(&mut self, dn: String) {
        self.inner_mut().set_resolved_dn(dn)
    }

    fn to_attributes(&self) -> AttributeSet {
        self.inner().to_attributes()
    }

    fn apply_attributes(&mut self, attributes: &AttributeSet) {
        self.inner_mut().apply_attributes(attributes)
    }

    fn validate(&self) -> ValidationResult<()> {
        self.inner().validate()
    }
}

/// Configured object classes, or the kind's defaults when empty.
pub(crate) fn effective_object_class(kind: ResourceKind, configured: &[String]) -> Vec<String> {
    if configured.is_empty() {
        kind.default_object_classes()
            .iter()
            .map(|class| class.to_string())
            .collect()
    } else {
        configured.to_vec()
    }
}

/// Numeric attribute value, `None` when unset or not a number.
pub(crate) fn parse_number(attributes: &AttributeSet, key: &str) -> Option<u32> {
    if !attributes.has_value(key) {
        return None;
    }
    attributes.get_first(key).trim().parse().ok()
}

/// Signed-or-unsigned 32-bit attribute value. Active Directory reports
/// bitmask attributes as signed integers.
pub(crate) fn parse_bits(attributes: &AttributeSet, key: &str) -> Option<u32> {
    if !attributes.has_value(key) {
        return None;
    }
    attributes
        .get_first(key)
        .trim()
        .parse::<i64>()
        .ok()
        .map(|value| value as u32)
}
