//! Groups and the `groupType` bitmask.
//!
//! Active Directory stores a group's category and scope in one integer,
//! `groupType`. The category takes the high bit and the scope one of three
//! low bits:
//!
//! | Label         | Mask         |
//! |---------------|--------------|
//! | `Distribution`| `0x00000000` |
//! | `Security`    | `0x80000000` |
//! | `Global`      | `0x00000002` |
//! | `DomainLocal` | `0x00000004` |
//! | `Universal`   | `0x00000008` |
//!
//! Decoding tests each bit on its own since category and scope share the
//! integer. Servers report the value signed, so `Security` + `Global` reads
//! back as `-2147483646`.
//!
//! ```rust
//! use ldap_provider::objects::{DirectoryObject, Group, GroupCategory, GroupScope};
//!
//! let mut group = Group::new("admins", "ou=groups,dc=example,dc=com");
//! group.group_category = Some(GroupCategory::Security);
//! group.group_scope = Some(GroupScope::Global);
//!
//! let attributes = group.to_attributes();
//! assert_eq!(attributes.get_first("groupType"), "2147483650");
//!
//! let mut observed = Group::new("admins", "ou=groups,dc=example,dc=com");
//! observed.apply_attributes(&attributes);
//! assert_eq!(observed.group_category, Some(GroupCategory::Security));
//! assert_eq!(observed.group_scope, Some(GroupScope::Global));
//! ```

use crate::attributes::AttributeSet;
use crate::dn;
use crate::error::{ValidationError, ValidationResult};
use crate::objects::{
    DirectoryObject, ResourceKind, SamAccountType, effective_object_class, parse_bits,
    parse_number,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const CATEGORY_MASKS: [(GroupCategory, u32); 2] = [
    (GroupCategory::Distribution, 0x0000_0000),
    (GroupCategory::Security, 0x8000_0000),
];

const SCOPE_MASKS: [(GroupScope, u32); 3] = [
    (GroupScope::Global, 0x0000_0002),
    (GroupScope::DomainLocal, 0x0000_0004),
    (GroupScope::Universal, 0x0000_0008),
];

/// Whether a group can be used in access control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GroupCategory {
    Distribution,
    Security,
}

/// Where a group can be used and who can be a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GroupScope {
    Global,
    DomainLocal,
    Universal,
}

impl GroupCategory {
    pub const LABELS: [&'static str; 2] = ["Distribution", "Security"];

    pub fn label(&self) -> &'static str {
        match self {
            GroupCategory::Distribution => "Distribution",
            GroupCategory::Security => "Security",
        }
    }

    fn mask(&self) -> u32 {
        CATEGORY_MASKS
            .iter()
            .find(|(category, _)| category == self)
            .map(|(_, mask)| *mask)
            .unwrap_or_default()
    }
}

impl GroupScope {
    pub const LABELS: [&'static str; 3] = ["Global", "DomainLocal", "Universal"];

    pub fn label(&self) -> &'static str {
        match self {
            GroupScope::Global => "Global",
            GroupScope::DomainLocal => "DomainLocal",
            GroupScope::Universal => "Universal",
        }
    }

    fn mask(&self) -> u32 {
        SCOPE_MASKS
            .iter()
            .find(|(scope, _)| scope == self)
            .map(|(_, mask)| *mask)
            .unwrap_or_default()
    }
}

/// Pack a category and scope into a `groupType` value.
pub fn encode_group_type(category: GroupCategory, scope: GroupScope) -> u32 {
    category.mask() | scope.mask()
}

/// Unpack a `groupType` value. The scope is `None` when no scope bit is set.
pub fn decode_group_type(mask: u32) -> (GroupCategory, Option<GroupScope>) {
    let security = GroupCategory::Security.mask();
    let category = if mask & security != 0 {
        GroupCategory::Security
    } else {
        GroupCategory::Distribution
    };
    let scope = SCOPE_MASKS
        .iter()
        .find(|(_, bit)| mask & bit != 0)
        .map(|(scope, _)| *scope);
    (category, scope)
}

impl fmt::Display for GroupCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for GroupScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GroupCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Distribution" => Ok(GroupCategory::Distribution),
            "Security" => Ok(GroupCategory::Security),
            _ => Err(ValidationError::invalid_enum(
                "group_category",
                s,
                &Self::LABELS,
            )),
        }
    }
}

impl FromStr for GroupScope {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Global" => Ok(GroupScope::Global),
            "DomainLocal" => Ok(GroupScope::DomainLocal),
            "Universal" => Ok(GroupScope::Universal),
            _ => Err(ValidationError::invalid_enum("group_scope", s, &Self::LABELS)),
        }
    }
}

impl TryFrom<String> for GroupCategory {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for GroupScope {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GroupCategory> for String {
    fn from(value: GroupCategory) -> Self {
        value.label().to_string()
    }
}

impl From<GroupScope> for String {
    fn from(value: GroupScope) -> Self {
        value.label().to_string()
    }
}

/// A `group` entry, named by `cn`.
///
/// `members` holds member DNs (`member`), `member_uids` POSIX member names
/// (`memberUid`). A group manages one or the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    #[serde(rename = "cn")]
    common_name: String,
    path: String,
    pub description: String,
    pub display_name: String,
    pub gid_number: Option<u32>,
    pub group_category: Option<GroupCategory>,
    pub group_scope: Option<GroupScope>,
    #[serde(rename = "homepage")]
    pub home_page: String,
    pub members: Vec<String>,
    pub member_uids: Vec<String>,
    pub name: String,
    pub object_class: Vec<String>,
    pub sam_account_name: String,
    pub sam_account_type: Option<SamAccountType>,
    #[serde(skip)]
    dn: Option<String>,
}

impl Group {
    pub fn new(common_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            common_name: common_name.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Value of the `cn` naming attribute.
    pub fn common_name(&self) -> &str {
        &self.common_name
    }

    /// Rename. Forgets any resolved DN.
    pub fn set_common_name(&mut self, common_name: impl Into<String>) {
        self.common_name = common_name.into();
        self.dn = None;
    }

    /// Move under another container. Forgets any resolved DN.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
        self.dn = None;
    }

    /// Encoded `groupType`, when both category and scope are set.
    pub fn group_type(&self) -> Option<u32> {
        match (self.group_category, self.group_scope) {
            (Some(category), Some(scope)) => Some(encode_group_type(category, scope)),
            _ => None,
        }
    }
}

impl DirectoryObject for Group {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Group
    }

    fn object_class(&self) -> Vec<String> {
        effective_object_class(self.kind(), &self.object_class)
    }

    fn relative_dn(&self) -> String {
        dn::relative_dn("cn", &self.common_name)
    }

    fn base_path(&self) -> &str {
        &self.path
    }

    fn resolved_dn(&self) -> Option<&str> {
        self.dn.as_deref()
    }

    fn set_resolved_dn(&mut self, dn: String) {
        self.dn = Some(dn);
    }

    fn to_attributes(&self) -> AttributeSet {
        let mut attributes = AttributeSet::new();
        attributes.insert_single("cn", &self.common_name);
        attributes.insert_single("description", &self.description);
        attributes.insert_single("displayName", &self.display_name);
        attributes.insert_optional("gidNumber", self.gid_number.map(|n| n.to_string()));
        attributes.insert_optional("groupType", self.group_type().map(|t| t.to_string()));
        attributes.insert("member", self.members.iter().cloned());
        attributes.insert("memberUid", self.member_uids.iter().cloned());
        attributes.insert_single("name", &self.name);
        attributes.insert("objectClass", self.object_class());
        attributes.insert_single("sAMAccountName", &self.sam_account_name);
        attributes.insert_optional(
            "sAMAccountType",
            self.sam_account_type.map(|t| t.value().to_string()),
        );
        attributes.insert_single("wWWHomePage", &self.home_page);
        attributes
    }

    fn apply_attributes(&mut self, attributes: &AttributeSet) {
        if attributes.has_value("cn") {
            self.common_name = attributes.get_first("cn").to_string();
        }
        self.description = attributes.get_first("description").to_string();
        self.display_name = attributes.get_first("displayName").to_string();
        self.gid_number = parse_number(attributes, "gidNumber");
        match parse_bits(attributes, "groupType") {
            Some(mask) => {
                let (category, scope) = decode_group_type(mask);
                self.group_category = Some(category);
                self.group_scope = scope;
            }
            None => {
                self.group_category = None;
                self.group_scope = None;
            }
        }
        self.home_page = attributes.get_first("wWWHomePage").to_string();
        self.members = attributes.get("member").to_vec();
        self.member_uids = attributes.get("memberUid").to_vec();
        self.name = attributes.get_first("name").to_string();
        self.object_class = attributes.get("objectClass").to_vec();
        self.sam_account_name = attributes.get_first("sAMAccountName").to_string();
        self.sam_account_type =
            parse_number(attributes, "sAMAccountType").and_then(SamAccountType::from_value);
    }

    fn validate(&self) -> ValidationResult<()> {
        if !self.members.is_empty() && !self.member_uids.is_empty() {
            return Err(ValidationError::conflicting("members", "member_uids"));
        }
        Ok(())
    }
}
