//! User accounts.

use crate::attributes::AttributeSet;
use crate::dn;
use crate::objects::{
    DirectoryObject, ResourceKind, SamAccountType, effective_object_class, parse_number,
};
use serde::{Deserialize, Serialize};

/// A `user` entry, named by `cn`.
///
/// POSIX fields (`uid`, `uid_number`, `gid_number`, `home_directory`) are only
/// meaningful when the object classes include `posixAccount`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(rename = "cn")]
    common_name: String,
    path: String,
    pub city: String,
    pub country: String,
    pub description: String,
    pub display_name: String,
    pub email_address: String,
    pub gid_number: Option<u32>,
    pub given_name: String,
    pub home_directory: String,
    pub name: String,
    pub object_class: Vec<String>,
    pub postal_code: String,
    pub sam_account_name: String,
    pub sam_account_type: Option<SamAccountType>,
    pub state: String,
    pub street_address: String,
    pub surname: String,
    pub uid: String,
    pub uid_number: Option<u32>,
    pub user_principal_name: String,
    #[serde(skip)]
    dn: Option<String>,
}

impl User {
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
}

impl DirectoryObject for User {
    fn kind(&self) -> ResourceKind {
        ResourceKind::User
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
        attributes.insert_single("l", &self.city);
        attributes.insert_single("cn", &self.common_name);
        attributes.insert_single("c", &self.country);
        attributes.insert_single("description", &self.description);
        attributes.insert_single("displayName", &self.display_name);
        attributes.insert_single("mail", &self.email_address);
        attributes.insert_optional("gidNumber", self.gid_number.map(|n| n.to_string()));
        attributes.insert_single("givenName", &self.given_name);
        attributes.insert_single("homeDirectory", &self.home_directory);
        attributes.insert_single("name", &self.name);
        attributes.insert("objectClass", self.object_class());
        attributes.insert_single("postalCode", &self.postal_code);
        attributes.insert_single("sAMAccountName", &self.sam_account_name);
        attributes.insert_optional(
            "sAMAccountType",
            self.sam_account_type.map(|t| t.value().to_string()),
        );
        attributes.insert_single("st", &self.state);
        attributes.insert_single("streetAddress", &self.street_address);
        attributes.insert_single("sn", &self.surname);
        attributes.insert_single("uid", &self.uid);
        attributes.insert_optional("uidNumber", self.uid_number.map(|n| n.to_string()));
        attributes.insert_single("userPrincipalName", &self.user_principal_name);
        attributes
    }

    fn apply_attributes(&mut self, attributes: &AttributeSet) {
        self.city = attributes.get_first("l").to_string();
        if attributes.has_value("cn") {
            self.common_name = attributes.get_first("cn").to_string();
        }
        self.country = attributes.get_first("c").to_string();
        self.description = attributes.get_first("description").to_string();
        self.display_name = attributes.get_first("displayName").to_string();
        self.email_address = attributes.get_first("mail").to_string();
        self.gid_number = parse_number(attributes, "gidNumber");
        self.given_name = attributes.get_first("givenName").to_string();
        self.home_directory = attributes.get_first("homeDirectory").to_string();
        self.name = attributes.get_first("name").to_string();
        self.object_class = attributes.get("objectClass").to_vec();
        self.postal_code = attributes.get_first("postalCode").to_string();
        self.sam_account_name = attributes.get_first("sAMAccountName").to_string();
        self.sam_account_type =
            parse_number(attributes, "sAMAccountType").and_then(SamAccountType::from_value);
        self.state = attributes.get_first("st").to_string();
        self.street_address = attributes.get_first("streetAddress").to_string();
        self.surname = attributes.get_first("sn").to_string();
        self.uid = attributes.get_first("uid").to_string();
        self.uid_number = parse_number(attributes, "uidNumber");
        self.user_principal_name = attributes.get_first("userPrincipalName").to_string();
    }
}
