//! Representative objects, fully populated and empty.

use super::{GROUPS, PEOPLE};
use ldap_provider::objects::{
    Group, GroupCategory, GroupScope, OrganizationalUnit, SamAccountType, User,
};

pub fn organizational_unit() -> OrganizationalUnit {
    let mut ou = OrganizationalUnit::new("engineering", PEOPLE);
    ou.city = "Wellington".to_string();
    ou.country = "NZ".to_string();
    ou.description = "Engineering staff".to_string();
    ou.name = "engineering".to_string();
    ou.object_class = vec!["top".to_string(), "organizationalUnit".to_string()];
    ou.postal_code = "6011".to_string();
    ou.state = "Wellington".to_string();
    ou.street_address = "1 Lambton Quay".to_string();
    ou
}

pub fn group() -> Group {
    let mut group = Group::new("admins", GROUPS);
    group.description = "Domain administrators".to_string();
    group.display_name = "Admins".to_string();
    group.gid_number = Some(5000);
    group.group_category = Some(GroupCategory::Security);
    group.group_scope = Some(GroupScope::Global);
    group.home_page = "https://intranet.example.com/admins".to_string();
    group.members = vec![
        format!("cn=alice,{PEOPLE}"),
        format!("cn=bob,{PEOPLE}"),
    ];
    group.name = "admins".to_string();
    group.object_class = vec!["top".to_string(), "group".to_string()];
    group.sam_account_name = "admins".to_string();
    group.sam_account_type = Some(SamAccountType::GroupObject);
    group
}

pub fn posix_group() -> Group {
    let mut group = Group::new("developers", GROUPS);
    group.gid_number = Some(5001);
    group.member_uids = vec!["alice".to_string(), "bob".to_string()];
    group.object_class = vec!["top".to_string(), "posixGroup".to_string()];
    group
}

pub fn user() -> User {
    let mut user = User::new("alice", PEOPLE);
    user.city = "Wellington".to_string();
    user.country = "NZ".to_string();
    user.description = "Platform engineer".to_string();
    user.display_name = "Alice Smith".to_string();
    user.email_address = "alice@example.com".to_string();
    user.gid_number = Some(5000);
    user.given_name = "Alice".to_string();
    user.home_directory = "/home/alice".to_string();
    user.name = "alice".to_string();
    user.object_class = vec![
        "top".to_string(),
        "person".to_string(),
        "organizationalPerson".to_string(),
        "user".to_string(),
        "posixAccount".to_string(),
    ];
    user.postal_code = "6011".to_string();
    user.sam_account_name = "alice".to_string();
    user.sam_account_type = Some(SamAccountType::NormalUserAccount);
    user.state = "Wellington".to_string();
    user.street_address = "1 Lambton Quay".to_string();
    user.surname = "Smith".to_string();
    user.uid = "alice".to_string();
    user.uid_number = Some(1001);
    user.user_principal_name = "alice@example.com".to_string();
    user
}
