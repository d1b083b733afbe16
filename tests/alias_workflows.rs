//! Add/delete workflows and membership reporting against a mock Directory API.

mod common;

use common::*;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use galias::api::models::DeleteReport;

const GROUPS_PATH: &str = "/admin/directory/v1/groups";

#[tokio::test]
async fn add_creates_missing_alias_then_member_appears() {
    let server = MockServer::start().await;
    let alias = "new@example.com";

    // lookup before creation misses, lookups after creation hit
    Mock::given(method("GET"))
        .and(path(format!("{GROUPS_PATH}/{alias}")))
        .respond_with(SequenceResponder::new(vec![
            ResponseTemplate::new(404).set_body_json(not_found_body("Resource Not Found: groupKey")),
            ResponseTemplate::new(200).set_body_json(group_json(alias)),
        ]))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(GROUPS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(group_json(alias)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/groups/v1/groups/{alias}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{GROUPS_PATH}/{alias}/members")))
        .respond_with(ResponseTemplate::new(200).set_body_json(member_json("dest@example.com")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{GROUPS_PATH}/{alias}/members")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(member_page(vec![member_json("dest@example.com")], None)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let report = client
        .ensure_alias_member("token", alias, "dest@example.com")
        .await
        .expect("add should create the alias and insert the member");

    assert!(report.created_alias);
    assert!(!report.already_member);
    assert_eq!(report.alias, alias);
    assert_eq!(report.members.len(), 1);
    assert_eq!(report.members[0].email, "dest@example.com");
}

#[tokio::test]
async fn add_tolerates_duplicate_member() {
    let server = MockServer::start().await;
    let alias = "team@example.com";

    Mock::given(method("GET"))
        .and(path(format!("{GROUPS_PATH}/{alias}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(group_json(alias)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{GROUPS_PATH}/{alias}/members")))
        .respond_with(ResponseTemplate::new(409).set_body_json(duplicate_member_body()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{GROUPS_PATH}/{alias}/members")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(member_page(vec![member_json("dest@example.com")], None)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let report = client
        .ensure_alias_member("token", alias, "dest@example.com")
        .await
        .expect("duplicate insert should be tolerated");

    assert!(!report.created_alias);
    assert!(report.already_member);
}

#[tokio::test]
async fn delete_on_unknown_alias_is_a_noop() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{GROUPS_PATH}/ghost@example.com")))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(not_found_body("Resource Not Found: groupKey")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let report = client
        .remove_alias_member("token", "ghost@example.com", "dest@example.com")
        .await
        .expect("unknown alias should report, not fail");

    assert!(matches!(report, DeleteReport::UnknownAlias { alias } if alias == "ghost@example.com"));
}

#[tokio::test]
async fn delete_of_non_member_mutates_nothing() {
    let server = MockServer::start().await;
    let alias = "team@example.com";

    Mock::given(method("GET"))
        .and(path(format!("{GROUPS_PATH}/{alias}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(group_json(alias)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{GROUPS_PATH}/{alias}/hasMember/stranger@example.com")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"isMember": false})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{GROUPS_PATH}/{alias}/members")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(member_page(vec![member_json("a@example.com")], None)),
        )
        .expect(1)
        .mount(&server)
        .await;

    // no removal and no group delete may be issued
    Mock::given(method("DELETE"))
        .and(path(format!("{GROUPS_PATH}/{alias}/members/stranger@example.com")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(format!("{GROUPS_PATH}/{alias}")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let report = client
        .remove_alias_member("token", alias, "stranger@example.com")
        .await
        .expect("non-member delete should warn, not fail");

    match report {
        DeleteReport::NotAMember { members, .. } => {
            assert_eq!(members.len(), 1);
            assert_eq!(members[0].email, "a@example.com");
        }
        other => panic!("expected NotAMember, got {other:?}"),
    }
}

#[tokio::test]
async fn deleting_last_member_removes_the_alias() {
    let server = MockServer::start().await;
    let alias = "solo@example.com";

    Mock::given(method("GET"))
        .and(path(format!("{GROUPS_PATH}/{alias}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(group_json(alias)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{GROUPS_PATH}/{alias}/hasMember/last@example.com")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"isMember": true})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(format!("{GROUPS_PATH}/{alias}/members/last@example.com")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{GROUPS_PATH}/{alias}/members")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "kind": "admin#directory#members" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(format!("{GROUPS_PATH}/{alias}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let report = client
        .remove_alias_member("token", alias, "last@example.com")
        .await
        .expect("emptying delete should remove the alias");

    match report {
        DeleteReport::Removed {
            alias_deleted,
            members,
            ..
        } => {
            assert!(alias_deleted);
            assert!(members.is_empty());
        }
        other => panic!("expected Removed, got {other:?}"),
    }
}

#[tokio::test]
async fn delete_keeps_alias_with_remaining_members() {
    let server = MockServer::start().await;
    let alias = "team@example.com";

    Mock::given(method("GET"))
        .and(path(format!("{GROUPS_PATH}/{alias}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(group_json(alias)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{GROUPS_PATH}/{alias}/hasMember/b@example.com")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"isMember": true})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(format!("{GROUPS_PATH}/{alias}/members/b@example.com")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{GROUPS_PATH}/{alias}/members")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(member_page(vec![member_json("a@example.com")], None)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(format!("{GROUPS_PATH}/{alias}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let report = client
        .remove_alias_member("token", alias, "b@example.com")
        .await
        .expect("delete with remaining members should keep the alias");

    match report {
        DeleteReport::Removed {
            alias_deleted,
            members,
            ..
        } => {
            assert!(!alias_deleted);
            assert_eq!(members.len(), 1);
            assert_eq!(members[0].email, "a@example.com");
        }
        other => panic!("expected Removed, got {other:?}"),
    }
}

#[tokio::test]
async fn memberships_for_all_users_invert_and_sort() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(GROUPS_PATH))
        .and(query_param("domain", "example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(group_page(
            vec![group_json("g1@example.com"), group_json("g2@example.com")],
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{GROUPS_PATH}/g1@example.com/members")))
        .respond_with(ResponseTemplate::new(200).set_body_json(member_page(
            vec![member_json("a@example.com"), member_json("b@example.com")],
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{GROUPS_PATH}/g2@example.com/members")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(member_page(vec![member_json("b@example.com")], None)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let memberships = client
        .list_memberships("token", "example.com", &[])
        .await
        .expect("all-user memberships should resolve");

    assert_eq!(memberships.len(), 2);
    assert_eq!(memberships[0].address, "a@example.com");
    assert_eq!(memberships[0].groups, ["g1@example.com"]);
    assert_eq!(memberships[1].address, "b@example.com");
    assert_eq!(memberships[1].groups, ["g1@example.com", "g2@example.com"]);
}

#[tokio::test]
async fn memberships_follow_the_given_address_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(GROUPS_PATH))
        .and(query_param("userKey", "b@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(group_page(
            vec![group_json("g1@example.com"), group_json("g2@example.com")],
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(GROUPS_PATH))
        .and(query_param("userKey", "a@example.com"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(group_page(vec![group_json("g1@example.com")], None)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let addresses = vec!["b@example.com".to_string(), "a@example.com".to_string()];
    let memberships = client
        .list_memberships("token", "example.com", &addresses)
        .await
        .expect("explicit memberships should resolve");

    assert_eq!(memberships[0].address, "b@example.com");
    assert_eq!(memberships[0].groups, ["g1@example.com", "g2@example.com"]);
    assert_eq!(memberships[1].address, "a@example.com");
    assert_eq!(memberships[1].groups, ["g1@example.com"]);
}
