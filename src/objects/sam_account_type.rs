//! `sAMAccountType` values.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Security Account Manager account type, stored as a single integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SamAccountType {
    DomainObject,
    GroupObject,
    NonSecurityGroupObject,
    AliasObject,
    NonSecurityAliasObject,
    NormalUserAccount,
    MachineAccount,
    TrustAccount,
    AppBasicGroup,
    AppQueryGroup,
}

const TABLE: [(SamAccountType, &str, u32); 10] = [
    (SamAccountType::DomainObject, "DomainObject", 0x0000_0000),
    (SamAccountType::GroupObject, "GroupObject", 0x1000_0000),
    (SamAccountType::NonSecurityGroupObject, "NonSecurityGroupObject", 0x1000_0001),
    (SamAccountType::AliasObject, "AliasObject", 0x2000_0000),
    (SamAccountType::NonSecurityAliasObject, "NonSecurityAliasObject", 0x2000_0001),
    (SamAccountType::NormalUserAccount, "NormalUserAccount", 0x3000_0000),
    (SamAccountType::MachineAccount, "MachineAccount", 0x3000_0001),
    (SamAccountType::TrustAccount, "TrustAccount", 0x3000_0002),
    (SamAccountType::AppBasicGroup, "AppBasicGroup", 0x4000_0000),
    (SamAccountType::AppQueryGroup, "AppQueryGroup", 0x4000_0001),
];

impl SamAccountType {
    /// Integer stored in `sAMAccountType`.
    pub fn value(&self) -> u32 {
        TABLE
            .iter()
            .find(|(kind, _, _)| kind == self)
            .map(|(_, _, value)| *value)
            .unwrap_or_default()
    }

    /// Label used by hosts.
    pub fn label(&self) -> &'static str {
        TABLE
            .iter()
            .find(|(kind, _, _)| kind == self)
            .map(|(_, label, _)| *label)
            .unwrap_or_default()
    }

    /// Decode an `sAMAccountType` value. Unknown values yield `None`.
    pub fn from_value(value: u32) -> Option<Self> {
        TABLE
            .iter()
            .find(|(_, _, v)| *v == value)
            .map(|(kind, _, _)| *kind)
    }
}

impl fmt::Display for SamAccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SamAccountType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TABLE
            .iter()
            .find(|(_, label, _)| *label == s)
            .map(|(kind, _, _)| *kind)
            .ok_or_else(|| {
                let allowed: Vec<&str> = TABLE.iter().map(|(_, label, _)| *label).collect();
                ValidationError::invalid_enum("sam_account_type", s, &allowed)
            })
    }
}

impl TryFrom<String> for SamAccountType {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SamAccountType> for String {
    fn from(value: SamAccountType) -> Self {
        value.label().to_string()
    }
}
