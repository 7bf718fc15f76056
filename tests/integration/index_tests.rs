use super::demo_dir;
use indoc::indoc;
use sqlc_index::config::Settings;
use sqlc_index::db::{CREATE_USER, DELETE_USER, GET_USER, LIST_USERS};
use sqlc_index::query_index::LineRange;
use sqlc_index::sql_parser::{QueryCommand, SqlParser};
use std::fs;

#[test]
fn demo_project_is_indexed() {
    let root = demo_dir();
    let index = sqlc_index::build_index(&root, Settings::default()).unwrap();

    assert_eq!(index.names(), vec!["CreateUser", "DeleteUser", "GetUser", "ListUsers"]);

    let hits = index.lookup("CreateUser").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].path, root.join("query.sql"));
    assert_eq!(hits[0].command, QueryCommand::One);
    assert_eq!(
        hits[0].range,
        LineRange {
            line: 0,
            start: 0,
            end: "-- name: CreateUser :one".len()
        }
    );

    assert_eq!(index.lookup("DeleteUser").unwrap()[0].command, QueryCommand::Exec);
    assert_eq!(
        index.patterns_for_config(&root.join("sqlc.yaml")).unwrap(),
        &["query.sql".to_string()]
    );
}

/// The query client must run the same SQL the query file declares.
#[test]
fn query_client_matches_query_file() {
    let queries = SqlParser::new()
        .parse_file(&demo_dir().join("query.sql"))
        .unwrap();

    let sql_for = |name: &str| {
        queries
            .iter()
            .find(|q| q.name == name)
            .map(|q| q.sql.clone())
            .unwrap_or_else(|| panic!("{} missing from query.sql", name))
    };

    assert_eq!(sql_for("CreateUser"), CREATE_USER);
    assert_eq!(sql_for("GetUser"), GET_USER);
    assert_eq!(sql_for("ListUsers"), LIST_USERS);
    assert_eq!(sql_for("DeleteUser"), DELETE_USER);
}

#[test]
fn nested_projects_with_shared_query_file() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    fs::create_dir_all(root.join("shared")).unwrap();
    fs::create_dir_all(root.join("app/queries")).unwrap();
    fs::create_dir_all(root.join("reports")).unwrap();

    fs::write(
        root.join("shared/common.sql"),
        "-- name: Ping :one\nSELECT 1;\n",
    )
    .unwrap();
    fs::write(
        root.join("app/queries/users.sql"),
        indoc! {"
            -- name: GetUser :one
            SELECT * FROM users WHERE id = $1;

            -- name: BulkInsertUsers :copyfrom
            INSERT INTO users (username, email) VALUES ($1, $2);
        "},
    )
    .unwrap();
    fs::write(
        root.join("app/sqlc.yaml"),
        indoc! {"
            version: '2'
            sql:
              - engine: postgresql
                queries: [queries/, ../shared/common.sql]
                schema: schema.sql
                gen:
                  go: {package: app, out: app}
        "},
    )
    .unwrap();
    fs::write(
        root.join("reports/sqlc.json"),
        r#"{"version": "2", "sql": [{"queries": ["../shared/*.sql"], "gen": {"go": {"package": "reports", "out": "reports"}}}]}"#,
    )
    .unwrap();

    let mut index = sqlc_index::build_index(root, Settings::default()).unwrap();

    assert_eq!(index.configs().len(), 2);
    assert_eq!(index.names(), vec!["BulkInsertUsers", "GetUser", "Ping"]);
    assert_eq!(
        index.lookup("BulkInsertUsers").unwrap()[0].command,
        QueryCommand::CopyFrom
    );
    // Selected by both configs, indexed once
    assert_eq!(index.lookup("Ping").unwrap().len(), 1);

    // Dropping one config keeps files the other still selects
    index.invalidate_config(&root.join("app/sqlc.yaml"));
    assert!(index.lookup("GetUser").is_none());
    assert_eq!(index.lookup("Ping").unwrap().len(), 1);
}

#[test]
fn settings_restrict_config_names() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(
        root.join("sqlc.yml"),
        "sql:\n  - queries: q.sql\n    gen: {go: {package: db, out: db}}\n",
    )
    .unwrap();
    fs::write(root.join("q.sql"), "-- name: Only :exec\nDELETE FROM t;\n").unwrap();

    let settings = Settings {
        config_names: vec!["sqlc.yaml".to_string()],
        ..Settings::default()
    };
    let index = sqlc_index::build_index(root, settings).unwrap();
    assert!(index.is_empty());

    let index = sqlc_index::build_index(root, Settings::default()).unwrap();
    assert!(index.lookup("Only").is_some());
}
