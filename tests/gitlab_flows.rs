//! GitLab flows driven end-to-end against a local mock server.

use forgectl::gitlab::creator::StructureCreator;
use forgectl::gitlab::lister::{list_accessible_projects, write_records, RepositoryRecord};
use forgectl::gitlab::GitLabClient;
use forgectl::outline::parse_outline;
use mockito::Matcher;
use std::time::Duration;

fn client(server: &mockito::ServerGuard) -> GitLabClient {
    GitLabClient::new(&server.url(), "test-token").unwrap()
}

fn page_query(page: &str) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("membership".into(), "true".into()),
        Matcher::UrlEncoded("page".into(), page.into()),
        Matcher::UrlEncoded("per_page".into(), "100".into()),
    ])
}

#[tokio::test]
async fn lister_stops_on_the_first_empty_page() {
    let mut server = mockito::Server::new_async().await;
    let page1 = server
        .mock("GET", "/api/v4/projects")
        .match_query(page_query("1"))
        .match_header("PRIVATE-TOKEN", "test-token")
        .with_header("content-type", "application/json")
        .with_body(
            r#"[{"ssh_url_to_repo": "git@gitlab.test:acme/widget.git",
                 "path_with_namespace": "acme/widget"}]"#,
        )
        .create_async()
        .await;
    let page2 = server
        .mock("GET", "/api/v4/projects")
        .match_query(page_query("2"))
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let records = list_accessible_projects(&client(&server)).await;

    page1.assert_async().await;
    page2.assert_async().await;
    assert_eq!(
        records,
        vec![RepositoryRecord {
            clone_address: "git@gitlab.test:acme/widget.git".to_string(),
            namespace_path: "acme/widget".to_string(),
        }]
    );
}

#[tokio::test]
async fn lister_keeps_partial_results_when_a_page_fails() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/v4/projects")
        .match_query(page_query("1"))
        .with_header("content-type", "application/json")
        .with_body(
            r#"[{"ssh_url_to_repo": "git@gitlab.test:acme/widget.git",
                 "path_with_namespace": "acme/widget"}]"#,
        )
        .create_async()
        .await;
    server
        .mock("GET", "/api/v4/projects")
        .match_query(page_query("2"))
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let records = list_accessible_projects(&client(&server)).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].namespace_path, "acme/widget");
}

#[tokio::test]
async fn lister_skips_entries_missing_clone_address_or_path() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/v4/projects")
        .match_query(page_query("1"))
        .with_header("content-type", "application/json")
        .with_body(
            r#"[{"ssh_url_to_repo": "git@gitlab.test:acme/widget.git",
                 "path_with_namespace": "acme/widget"},
                {"path_with_namespace": "acme/orphan"},
                {"ssh_url_to_repo": "", "path_with_namespace": "acme/empty"}]"#,
        )
        .create_async()
        .await;
    server
        .mock("GET", "/api/v4/projects")
        .match_query(page_query("2"))
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let records = list_accessible_projects(&client(&server)).await;
    assert_eq!(records.len(), 1);
}

#[test]
fn written_file_has_one_line_per_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("repos.txt");
    let records = vec![
        RepositoryRecord {
            clone_address: "git@gitlab.test:acme/widget.git".to_string(),
            namespace_path: "acme/widget".to_string(),
        },
        RepositoryRecord {
            clone_address: "git@gitlab.test:acme/gear.git".to_string(),
            namespace_path: "acme/gear".to_string(),
        },
    ];

    write_records(&records, &path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        content,
        "git@gitlab.test:acme/widget.git acme/widget\n\
         git@gitlab.test:acme/gear.git acme/gear\n"
    );
}

#[tokio::test]
async fn leaf_root_creates_a_single_project_and_no_groups() {
    let mut server = mockito::Server::new_async().await;
    let projects = server
        .mock("POST", "/api/v4/projects")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "name": "widget",
            "path": "widget",
            "namespace_id": 42,
            "visibility": "private"
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 7}"#)
        .expect(1)
        .create_async()
        .await;
    let groups = server
        .mock("POST", "/api/v4/groups")
        .expect(0)
        .create_async()
        .await;

    let creator =
        StructureCreator::new(client(&server), Some(42)).with_creation_delay(Duration::ZERO);
    let structure = parse_outline("- widget");
    let stats = creator.run(&structure).await;

    projects.assert_async().await;
    groups.assert_async().await;
    assert_eq!(stats.projects_created, 1);
    assert_eq!(stats.groups_created, 0);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn group_conflict_reuses_the_existing_id_and_descends() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/v4/groups")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": {"name": ["has already been taken"]}}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/api/v4/groups")
        .match_query(Matcher::UrlEncoded("search".into(), "platform".into()))
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id": 99, "path": "platform", "parent_id": null}]"#)
        .create_async()
        .await;
    let child = server
        .mock("POST", "/api/v4/projects")
        .match_body(Matcher::PartialJson(serde_json::json!({"namespace_id": 99})))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 8}"#)
        .expect(1)
        .create_async()
        .await;

    let creator = StructureCreator::new(client(&server), None).with_creation_delay(Duration::ZERO);
    let structure = parse_outline("- platform\n  - api-service");
    let stats = creator.run(&structure).await;

    child.assert_async().await;
    assert_eq!(stats.existing, 1);
    assert_eq!(stats.projects_created, 1);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn group_conflict_without_a_match_skips_the_whole_subtree() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/v4/groups")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": {"name": ["has already been taken"]}}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/api/v4/groups")
        .match_query(Matcher::UrlEncoded("search".into(), "platform".into()))
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id": 99, "path": "something-else", "parent_id": null}]"#)
        .create_async()
        .await;
    let projects = server
        .mock("POST", "/api/v4/projects")
        .expect(0)
        .create_async()
        .await;

    let creator = StructureCreator::new(client(&server), None).with_creation_delay(Duration::ZERO);
    let structure = parse_outline("- platform\n  - api-service\n  - web-service");
    let stats = creator.run(&structure).await;

    projects.assert_async().await;
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.projects_created, 0);
}

#[tokio::test]
async fn group_failure_other_than_conflict_skips_children_without_lookup() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/v4/groups")
        .with_status(403)
        .with_body("insufficient permissions")
        .create_async()
        .await;
    let search = server
        .mock("GET", "/api/v4/groups")
        .expect(0)
        .create_async()
        .await;
    let projects = server
        .mock("POST", "/api/v4/projects")
        .expect(0)
        .create_async()
        .await;

    let creator = StructureCreator::new(client(&server), None).with_creation_delay(Duration::ZERO);
    let structure = parse_outline("- platform\n  - api-service");
    let stats = creator.run(&structure).await;

    search.assert_async().await;
    projects.assert_async().await;
    assert_eq!(stats.failed, 1);
}

#[tokio::test]
async fn project_conflict_is_acknowledged_without_lookup() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/v4/projects")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": {"name": ["has already been taken"]}}"#)
        .create_async()
        .await;
    let search = server
        .mock("GET", "/api/v4/projects")
        .expect(0)
        .create_async()
        .await;

    let creator = StructureCreator::new(client(&server), None).with_creation_delay(Duration::ZERO);
    let structure = parse_outline("- widget");
    let stats = creator.run(&structure).await;

    search.assert_async().await;
    assert_eq!(stats.existing, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.projects_created, 0);
}

#[tokio::test]
async fn nested_outline_creates_parents_before_children() {
    let mut server = mockito::Server::new_async().await;
    let group = server
        .mock("POST", "/api/v4/groups")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "name": "platform",
            "path": "platform"
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 11, "path": "platform", "parent_id": null}"#)
        .expect(1)
        .create_async()
        .await;
    let child = server
        .mock("POST", "/api/v4/projects")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "name": "Price Service",
            "path": "price-service",
            "namespace_id": 11
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 12}"#)
        .expect(1)
        .create_async()
        .await;

    let creator = StructureCreator::new(client(&server), None).with_creation_delay(Duration::ZERO);
    let structure = parse_outline("- platform\n  - Price Service");
    let stats = creator.run(&structure).await;

    group.assert_async().await;
    child.assert_async().await;
    assert_eq!(stats.groups_created, 1);
    assert_eq!(stats.projects_created, 1);
}

#[tokio::test]
async fn dry_run_visits_every_child_without_any_network() {
    let creator = StructureCreator::dry_run(None);
    assert!(creator.is_dry_run());
    creator.authenticate().await.unwrap();

    let structure =
        parse_outline("- platform\n  - commons\n    - commons-lib\n  - api-service\n- tools");
    let stats = creator.run(&structure).await;

    // platform and commons are planned groups; commons-lib, api-service and
    // tools are planned projects. Every child was visited even though no
    // group ever produced a real id.
    assert_eq!(stats.groups_created, 2);
    assert_eq!(stats.projects_created, 3);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn authentication_failure_is_fatal_before_any_creation() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/v4/user")
        .with_status(401)
        .with_body(r#"{"message": "401 Unauthorized"}"#)
        .create_async()
        .await;

    let creator = StructureCreator::new(client(&server), None).with_creation_delay(Duration::ZERO);
    let err = creator.authenticate().await.unwrap_err();
    assert!(matches!(
        err,
        forgectl::error::ForgeError::Client { status: 401, .. }
    ));
}
