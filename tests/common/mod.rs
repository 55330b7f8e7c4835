//! Shared helpers for the integration tests.
//!
//! Every test runs against an [`InMemoryDirectory`] seeded with a small
//! `dc=example,dc=com` tree.

#![allow(dead_code)]

use ldap_provider::attributes::AttributeSet;
use ldap_provider::client::DirectoryClient;
use ldap_provider::config::ClientConfig;
use ldap_provider::connection::InMemoryDirectory;
use ldap_provider::lifecycle::ResourceLifecycle;

pub mod fixtures;

pub const SERVER: &str = "ldap://dc1.example.com";
pub const BASE: &str = "dc=example,dc=com";
pub const PEOPLE: &str = "ou=people,dc=example,dc=com";
pub const GROUPS: &str = "ou=groups,dc=example,dc=com";
pub const ADMIN_DN: &str = "cn=admin,dc=example,dc=com";
pub const ADMIN_PASSWORD: &str = "secret";

/// Route `log` output through the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Directory holding the `people` and `groups` containers.
pub async fn seeded_directory() -> InMemoryDirectory {
    init_logging();
    let directory = InMemoryDirectory::new();
    directory.register_credentials(ADMIN_DN, ADMIN_PASSWORD).await;
    for (dn, ou) in [(PEOPLE, "people"), (GROUPS, "groups")] {
        let attributes = AttributeSet::new()
            .with("objectClass", ["top", "organizationalUnit"])
            .with("ou", [ou]);
        directory.insert_entry(dn, &attributes).await;
    }
    directory.clear_requests().await;
    directory
}

/// Client binding as the admin with a password.
pub fn client(directory: &InMemoryDirectory) -> DirectoryClient<InMemoryDirectory> {
    let config = ClientConfig::new(SERVER, ADMIN_DN).with_password(ADMIN_PASSWORD);
    DirectoryClient::new(config, directory.clone()).expect("valid configuration")
}

/// Client using an unauthenticated bind.
pub fn anonymous_client(directory: &InMemoryDirectory) -> DirectoryClient<InMemoryDirectory> {
    let config = ClientConfig::new(SERVER, ADMIN_DN);
    DirectoryClient::new(config, directory.clone()).expect("valid configuration")
}

pub fn lifecycle(directory: &InMemoryDirectory) -> ResourceLifecycle<InMemoryDirectory> {
    ResourceLifecycle::new(client(directory))
}

/// Every dialled connection has been closed.
pub async fn assert_all_closed(directory: &InMemoryDirectory) {
    let stats = directory.stats().await;
    assert_eq!(
        stats.open_connections, 0,
        "{} connection(s) left open after {} dial(s)",
        stats.open_connections, stats.dials
    );
}
