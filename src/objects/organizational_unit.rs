//! Organizational units.

use crate::attributes::AttributeSet;
use crate::dn;
use crate::objects::{DirectoryObject, ResourceKind, effective_object_class};
use serde::{Deserialize, Serialize};

/// An `organizationalUnit` entry, named by `ou`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationalUnit {
    #[serde(rename = "ou")]
    unit: String,
    path: String,
    pub city: String,
    pub country: String,
    pub description: String,
    pub name: String,
    pub object_class: Vec<String>,
    pub postal_code: String,
    pub state: String,
    pub street_address: String,
    #[serde(skip)]
    dn: Option<String>,
}

impl OrganizationalUnit {
    pub fn new(unit: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Value of the `ou` naming attribute.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Rename. Forgets any resolved DN.
    pub fn set_unit(&mut self, unit: impl Into<String>) {
        self.unit = unit.into();
        self.dn = None;
    }

    /// Move under another container. Forgets any resolved DN.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
        self.dn = None;
    }
}

impl DirectoryObject for OrganizationalUnit {
    fn kind(&self) -> ResourceKind {
        ResourceKind::OrganizationalUnit
    }

    fn object_class(&self) -> Vec<String> {
        effective_object_class(self.kind(), &self.object_class)
    }

    fn relative_dn(&self) -> String {
        dn::relative_dn("ou", &self.unit)
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
        attributes.insert_single("c", &self.country);
        attributes.insert_single("description", &self.description);
        attributes.insert_single("name", &self.name);
        attributes.insert("objectClass", self.object_class());
        attributes.insert_single("ou", &self.unit);
        attributes.insert_single("postalCode", &self.postal_code);
        attributes.insert_single("st", &self.state);
        attributes.insert_single("streetAddress", &self.street_address);
        attributes
    }

    fn apply_attributes(&mut self, attributes: &AttributeSet) {
        self.object_class = attributes.get("objectClass").to_vec();
        self.city = attributes.get_first("l").to_string();
        self.country = attributes.get_first("c").to_string();
        self.description = attributes.get_first("description").to_string();
        self.name = attributes.get_first("name").to_string();
        if attributes.has_value("ou") {
            self.unit = attributes.get_first("ou").to_string();
        }
        self.postal_code = attributes.get_first("postalCode").to_string();
        self.state = attributes.get_first("st").to_string();
        self.street_address = attributes.get_first("streetAddress").to_string();
    }
}
