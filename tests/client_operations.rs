//! DirectoryClient behaviour against the in-memory directory.

mod common;

use common::{ADMIN_DN, GROUPS, PEOPLE, SERVER, fixtures};
use ldap_provider::attributes::AttributeSet;
use ldap_provider::connection::{
    InMemoryDirectory, Modification, ModifyDnRequest, ProtocolError, RecordedRequest,
    RequestKind, result_code,
};
use ldap_provider::error::{DirectoryError, OperationKind, RejectionContext};
use ldap_provider::objects::{DirectoryObject, Group, OrganizationalUnit, ResourceKind, User};
use ldap_provider::{ClientConfig, DirectoryClient};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

async fn observed_user(client: &DirectoryClient<InMemoryDirectory>) -> User {
    let mut observed = User::new("alice", PEOPLE);
    client.search(&mut observed).await.expect("alice exists");
    observed
}

#[tokio::test]
async fn add_writes_only_valued_attributes() {
    let directory = common::seeded_directory().await;
    let client = common::client(&directory);
    let mut user = User::new("alice", PEOPLE);
    user.email_address = "alice@example.com".to_string();

    client.add(&user).await.unwrap();

    let entry = directory.entry(&format!("cn=alice,{PEOPLE}")).await.unwrap();
    assert_eq!(entry.attributes.get("mail"), ["alice@example.com"]);
    assert_eq!(
        entry.attributes.get("objectClass"),
        ["top", "person", "organizationalPerson", "user"]
    );
    assert!(!entry.attributes.contains_key("uidNumber"));
    assert!(!entry.attributes.contains_key("description"));
    common::assert_all_closed(&directory).await;
}

#[tokio::test]
async fn rejected_add_carries_attribute_snapshot() {
    let directory = common::seeded_directory().await;
    let client = common::client(&directory);
    let user = fixtures::user();
    client.add(&user).await.unwrap();

    let error = client.add(&user).await.unwrap_err();
    match &error {
        DirectoryError::Rejected {
            operation,
            dn,
            context,
            source,
        } => {
            assert_eq!(*operation, OperationKind::Add);
            assert_eq!(dn, &format!("cn=alice,{PEOPLE}"));
            assert_eq!(context, &RejectionContext::Attributes(user.to_attributes()));
            assert_eq!(source.result_code(), Some(result_code::ENTRY_ALREADY_EXISTS));
        }
        other => panic!("expected a rejected add, got {other:?}"),
    }
    assert!(error.to_string().contains("mail: [alice@example.com]"));
    common::assert_all_closed(&directory).await;
}

#[tokio::test]
async fn search_with_one_match_populates_object() {
    let directory = common::seeded_directory().await;
    let client = common::client(&directory);
    let user = fixtures::user();
    client.add(&user).await.unwrap();

    let mut observed = User::new("alice", PEOPLE);
    observed.object_class = user.object_class.clone();
    client.search(&mut observed).await.unwrap();

    assert_eq!(observed, {
        let mut expected = user.clone();
        expected.set_resolved_dn(format!("cn=alice,{PEOPLE}"));
        expected
    });
    assert_eq!(observed.resolved_dn(), Some(format!("cn=alice,{PEOPLE}").as_str()));
    common::assert_all_closed(&directory).await;
}

#[tokio::test]
async fn search_requests_every_mapped_attribute() {
    let directory = common::seeded_directory().await;
    let client = common::client(&directory);
    client.add(&User::new("alice", PEOPLE)).await.unwrap();
    directory.clear_requests().await;

    let mut observed = User::new("alice", PEOPLE);
    client.search(&mut observed).await.unwrap();

    let searches = directory.requests_of(RequestKind::Search).await;
    let [RecordedRequest::Search(request)] = searches.as_slice() else {
        panic!("expected exactly one search, got {searches:?}");
    };
    assert_eq!(request.base, PEOPLE);
    assert_eq!(
        request.filter,
        "(&(cn=alice)(objectClass=top)(objectClass=person)(objectClass=organizationalPerson)(objectClass=user))"
    );
    let expected: Vec<String> = User::new("alice", PEOPLE)
        .to_attributes()
        .keys()
        .map(str::to_string)
        .collect();
    assert_eq!(request.attributes, expected);
    assert!(request.attributes.contains(&"uidNumber".to_string()));
}

#[tokio::test]
async fn search_without_match_is_not_found() {
    let directory = common::seeded_directory().await;
    let client = common::client(&directory);

    let mut missing = User::new("carol", PEOPLE);
    let error = client.search(&mut missing).await.unwrap_err();

    assert!(error.is_not_found());
    match error {
        DirectoryError::NotFound {
            server,
            base,
            filter,
        } => {
            assert_eq!(server, SERVER);
            assert_eq!(base, PEOPLE);
            assert!(filter.contains("(cn=carol)"));
        }
        other => panic!("expected not found, got {other:?}"),
    }
    assert_eq!(missing.resolved_dn(), None);
    common::assert_all_closed(&directory).await;
}

#[tokio::test]
async fn search_with_two_matches_is_non_unique() {
    let directory = common::seeded_directory().await;
    let client = common::client(&directory);
    client.add(&User::new("alice", PEOPLE)).await.unwrap();
    client
        .add(&OrganizationalUnit::new("contractors", PEOPLE))
        .await
        .unwrap();
    client
        .add(&User::new("alice", format!("ou=contractors,{PEOPLE}")))
        .await
        .unwrap();

    let mut ambiguous = User::new("alice", PEOPLE);
    let error = client.search(&mut ambiguous).await.unwrap_err();

    assert!(matches!(
        error,
        DirectoryError::NonUniqueResult { count: 2, .. }
    ));
    assert_eq!(ambiguous.resolved_dn(), None);
    common::assert_all_closed(&directory).await;
}

#[tokio::test]
async fn modify_with_no_changes_sends_nothing() {
    let directory = common::seeded_directory().await;
    let client = common::client(&directory);
    client.add(&fixtures::user()).await.unwrap();
    let mut observed = User::new("alice", PEOPLE);
    observed.object_class = fixtures::user().object_class;
    client.search(&mut observed).await.unwrap();
    directory.clear_requests().await;
    let dials = directory.stats().await.dials;

    client.modify(&observed, &observed).await.unwrap();
    client.modify(&observed, &fixtures::user()).await.unwrap();

    assert!(directory.requests_of(RequestKind::Modify).await.is_empty());
    assert!(directory.requests_of(RequestKind::ModifyDn).await.is_empty());
    assert_eq!(directory.stats().await.dials, dials);
}

#[tokio::test]
async fn modify_emits_minimal_changes() {
    let directory = common::seeded_directory().await;
    let client = common::client(&directory);
    let mut old = User::new("alice", PEOPLE);
    old.description = "a".to_string();
    client.add(&old).await.unwrap();
    let observed = observed_user(&client).await;
    directory.clear_requests().await;

    let mut new = User::new("alice", PEOPLE);
    new.description = "b".to_string();
    new.email_address = "x".to_string();
    client.modify(&observed, &new).await.unwrap();

    let requests = directory.requests_of(RequestKind::Modify).await;
    assert_eq!(
        requests,
        vec![RecordedRequest::Modify {
            dn: format!("cn=alice,{PEOPLE}"),
            modifications: vec![
                Modification::replace("description", &strings(&["b"])),
                Modification::add("mail", &strings(&["x"])),
            ],
        }]
    );
    let entry = directory.entry(&format!("cn=alice,{PEOPLE}")).await.unwrap();
    assert_eq!(entry.attributes.get("description"), ["b"]);
    common::assert_all_closed(&directory).await;
}

#[tokio::test]
async fn modify_deletes_cleared_attributes() {
    let directory = common::seeded_directory().await;
    let client = common::client(&directory);
    let mut old = User::new("alice", PEOPLE);
    old.description = "a".to_string();
    old.uid_number = Some(1001);
    client.add(&old).await.unwrap();
    let observed = observed_user(&client).await;

    let new = User::new("alice", PEOPLE);
    client.modify(&observed, &new).await.unwrap();

    let entry = directory.entry(&format!("cn=alice,{PEOPLE}")).await.unwrap();
    assert!(!entry.attributes.contains_key("description"));
    assert!(!entry.attributes.contains_key("uidNumber"));
}

#[tokio::test]
async fn rename_keeps_entry_in_place() {
    let directory = common::seeded_directory().await;
    let client = common::client(&directory);
    client.add(&User::new("alice", PEOPLE)).await.unwrap();
    let observed = observed_user(&client).await;
    directory.clear_requests().await;

    let mut renamed = observed.clone();
    renamed.set_common_name("alice.smith");
    client.modify(&observed, &renamed).await.unwrap();

    assert_eq!(
        directory.requests_of(RequestKind::ModifyDn).await,
        vec![RecordedRequest::ModifyDn(ModifyDnRequest {
            dn: format!("cn=alice,{PEOPLE}"),
            new_rdn: "cn=alice.smith".to_string(),
            delete_old_rdn: true,
            new_superior: None,
        })]
    );
    // The naming attribute is handled by the modify-DN.
    assert!(directory.requests_of(RequestKind::Modify).await.is_empty());

    let entry = directory
        .entry(&format!("cn=alice.smith,{PEOPLE}"))
        .await
        .unwrap();
    assert_eq!(entry.attributes.get("cn"), ["alice.smith"]);
    assert!(directory.entry(&format!("cn=alice,{PEOPLE}")).await.is_none());
}

#[tokio::test]
async fn move_keeps_relative_name() {
    let directory = common::seeded_directory().await;
    let client = common::client(&directory);
    client.add(&Group::new("admins", PEOPLE)).await.unwrap();
    let mut observed = Group::new("admins", PEOPLE);
    client.search(&mut observed).await.unwrap();

    let mut moved = observed.clone();
    moved.set_path(GROUPS);
    client.modify(&observed, &moved).await.unwrap();

    let renames = directory.requests_of(RequestKind::ModifyDn).await;
    let [RecordedRequest::ModifyDn(request)] = renames.as_slice() else {
        panic!("expected one modify-DN");
    };
    assert_eq!(request.new_rdn, "cn=admins");
    assert_eq!(request.new_superior.as_deref(), Some(GROUPS));
    assert!(directory.entry(&format!("cn=admins,{GROUPS}")).await.is_some());
}

#[tokio::test]
async fn rename_and_move_in_one_request_then_modify() {
    let directory = common::seeded_directory().await;
    let client = common::client(&directory);
    client.add(&User::new("alice", PEOPLE)).await.unwrap();
    let observed = observed_user(&client).await;
    directory.clear_requests().await;

    let mut desired = observed.clone();
    desired.set_common_name("alice.smith");
    desired.set_path(GROUPS);
    desired.description = "moved".to_string();
    client.modify(&observed, &desired).await.unwrap();

    let kinds: Vec<RequestKind> = directory
        .requests()
        .await
        .iter()
        .map(RecordedRequest::kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            RequestKind::Dial,
            RequestKind::Bind,
            RequestKind::ModifyDn,
            RequestKind::Modify,
            RequestKind::Close,
        ]
    );

    let renames = directory.requests_of(RequestKind::ModifyDn).await;
    let [RecordedRequest::ModifyDn(request)] = renames.as_slice() else {
        panic!("expected one modify-DN");
    };
    assert_eq!(request.new_rdn, "cn=alice.smith");
    assert_eq!(request.new_superior.as_deref(), Some(GROUPS));

    let modifies = directory.requests_of(RequestKind::Modify).await;
    let [RecordedRequest::Modify { dn, modifications }] = modifies.as_slice() else {
        panic!("expected one modify");
    };
    assert_eq!(dn, &format!("cn=alice.smith,{GROUPS}"));
    assert_eq!(
        modifications,
        &vec![Modification::add("description", &strings(&["moved"]))]
    );
}

#[tokio::test]
async fn failed_rename_skips_attribute_changes() {
    let directory = common::seeded_directory().await;
    let client = common::client(&directory);
    client.add(&User::new("alice", PEOPLE)).await.unwrap();
    let observed = observed_user(&client).await;
    directory.clear_requests().await;
    directory
        .fail_next(
            RequestKind::ModifyDn,
            ProtocolError::with_code(result_code::INSUFFICIENT_ACCESS_RIGHTS, "denied"),
        )
        .await;

    let mut desired = observed.clone();
    desired.set_common_name("bob");
    desired.description = "renamed".to_string();
    let error = client.modify(&observed, &desired).await.unwrap_err();

    match error {
        DirectoryError::Rejected {
            operation: OperationKind::ModifyDn,
            context: RejectionContext::Rename { rdn, new_superior },
            ..
        } => {
            assert_eq!(rdn, "cn=bob");
            assert_eq!(new_superior, None);
        }
        other => panic!("expected a rejected modify-DN, got {other:?}"),
    }
    assert!(directory.requests_of(RequestKind::Modify).await.is_empty());
    common::assert_all_closed(&directory).await;
}

#[tokio::test]
async fn failed_modify_after_rename_leaves_entry_renamed() {
    let directory = common::seeded_directory().await;
    let client = common::client(&directory);
    client.add(&User::new("alice", PEOPLE)).await.unwrap();
    let observed = observed_user(&client).await;
    directory
        .fail_next(
            RequestKind::Modify,
            ProtocolError::with_code(result_code::CONSTRAINT_VIOLATION, "bad value"),
        )
        .await;

    let mut desired = observed.clone();
    desired.set_common_name("bob");
    desired.description = "renamed".to_string();
    let error = client.modify(&observed, &desired).await.unwrap_err();

    match error {
        DirectoryError::Rejected {
            operation: OperationKind::Modify,
            dn,
            context: RejectionContext::Attributes(attributes),
            ..
        } => {
            assert_eq!(dn, format!("cn=bob,{PEOPLE}"));
            assert_eq!(attributes, desired.to_attributes());
        }
        other => panic!("expected a rejected modify, got {other:?}"),
    }
    assert!(directory.entry(&format!("cn=bob,{PEOPLE}")).await.is_some());
    common::assert_all_closed(&directory).await;
}

#[tokio::test]
async fn bind_failure_short_circuits() {
    let directory = common::seeded_directory().await;
    let config = ClientConfig::new(SERVER, ADMIN_DN).with_password("wrong");
    let client = DirectoryClient::new(config, directory.clone()).unwrap();

    let error = client.add(&User::new("alice", PEOPLE)).await.unwrap_err();

    match error {
        DirectoryError::Connection { server, source } => {
            assert_eq!(server, SERVER);
            assert_eq!(source.result_code(), Some(result_code::INVALID_CREDENTIALS));
        }
        other => panic!("expected a connection error, got {other:?}"),
    }
    let kinds: Vec<RequestKind> = directory
        .requests()
        .await
        .iter()
        .map(RecordedRequest::kind)
        .collect();
    assert_eq!(
        kinds,
        vec![RequestKind::Dial, RequestKind::Bind, RequestKind::Close]
    );
    assert_eq!(directory.stats().await.entry_count, 2);
    common::assert_all_closed(&directory).await;
}

#[tokio::test]
async fn bind_mode_follows_password() {
    let directory = common::seeded_directory().await;
    common::client(&directory)
        .delete(&OrganizationalUnit::new("groups", "dc=example,dc=com"))
        .await
        .unwrap();
    common::anonymous_client(&directory)
        .delete(&OrganizationalUnit::new("people", "dc=example,dc=com"))
        .await
        .unwrap();

    assert_eq!(
        directory.requests_of(RequestKind::Bind).await,
        vec![
            RecordedRequest::SimpleBind {
                dn: ADMIN_DN.to_string()
            },
            RecordedRequest::UnauthenticatedBind {
                dn: ADMIN_DN.to_string()
            },
        ]
    );
    assert_eq!(directory.stats().await.entry_count, 0);
}

#[tokio::test]
async fn delete_of_missing_entry_is_rejected() {
    let directory = common::seeded_directory().await;
    let client = common::client(&directory);

    let error = client.delete(&User::new("ghost", PEOPLE)).await.unwrap_err();

    match error {
        DirectoryError::Rejected {
            operation: OperationKind::Delete,
            source,
            ..
        } => assert_eq!(source.result_code(), Some(result_code::NO_SUCH_OBJECT)),
        other => panic!("expected a rejected delete, got {other:?}"),
    }
    common::assert_all_closed(&directory).await;
}

#[tokio::test]
async fn group_members_round_trip_through_directory() {
    let directory = common::seeded_directory().await;
    let client = common::client(&directory);
    let group = fixtures::group();
    client.add(&group).await.unwrap();

    let mut observed = Group::new("admins", GROUPS);
    client.search(&mut observed).await.unwrap();

    assert_eq!(observed.members, group.members);
    assert_eq!(observed.group_category, group.group_category);
    assert_eq!(observed.group_scope, group.group_scope);
    assert_eq!(observed.gid_number, Some(5000));

    let mut desired = observed.clone();
    desired.members.reverse();
    client.modify(&observed, &desired).await.unwrap();

    let modifies = directory.requests_of(RequestKind::Modify).await;
    let [RecordedRequest::Modify { modifications, .. }] = modifies.as_slice() else {
        panic!("expected one modify");
    };
    assert_eq!(
        modifications,
        &vec![Modification::replace("member", &desired.members)]
    );
}

#[tokio::test]
async fn escaped_name_in_server_form_is_not_renamed() {
    let directory = common::seeded_directory().await;
    let client = common::client(&directory);
    let server_dn = "CN=Smith\\, John,OU=people,DC=example,DC=com";
    let attributes = AttributeSet::new()
        .with("objectClass", ResourceKind::User.default_object_classes().iter().copied())
        .with("cn", ["Smith, John"])
        .with("sn", ["Smith"]);
    directory.insert_entry(server_dn, &attributes).await;

    let mut observed = User::new("Smith, John", PEOPLE);
    client.search(&mut observed).await.unwrap();
    assert_eq!(observed.resolved_dn(), Some(server_dn));
    directory.clear_requests().await;

    let mut desired = User::new("Smith, John", PEOPLE);
    desired.surname = "Smith".to_string();
    client.modify(&observed, &desired).await.unwrap();
    assert!(directory.requests().await.is_empty());

    desired.description = "Contractor".to_string();
    client.modify(&observed, &desired).await.unwrap();
    assert!(directory.requests_of(RequestKind::ModifyDn).await.is_empty());
    let modifies = directory.requests_of(RequestKind::Modify).await;
    let [RecordedRequest::Modify { dn, modifications }] = modifies.as_slice() else {
        panic!("expected one modify, got {modifies:?}");
    };
    assert_eq!(dn, server_dn);
    assert_eq!(
        modifications,
        &vec![Modification::add("description", &strings(&["Contractor"]))]
    );
    let entry = directory.entry(server_dn).await.unwrap();
    assert_eq!(entry.attributes.get("description"), ["Contractor"]);
    common::assert_all_closed(&directory).await;
}
