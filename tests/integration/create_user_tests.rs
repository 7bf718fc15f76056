use super::setup_test_db;
use sqlc_index::connection::Connection;
use sqlc_index::db::{CreateUserParams, Error, Queries};
use std::process::Command;

const UNREACHABLE: &str = "postgresql://postgres@127.0.0.1:1/testdb?sslmode=disable&connect_timeout=2";

fn create_user(database_url: &str) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_create-user"));
    cmd.env("RUST_LOG", "info")
        .env_remove("DATABASE_URL")
        .args(["--database-url", database_url]);
    cmd
}

#[tokio::test]
async fn open_fails_for_unreachable_database() {
    let err = Connection::open(UNREACHABLE).await.err().expect("connect to fail");
    assert!(format!("{:#}", err).contains("Failed to connect to database"));
}

#[test]
fn binary_exits_with_logged_error_when_database_is_unreachable() {
    let output = create_user(UNREACHABLE).output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Failed to connect to database"), "{}", stderr);
    assert!(!stderr.contains("Created user"), "{}", stderr);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn create_user_inserts_one_row() {
    let db = setup_test_db().await;
    let queries = Queries::new(&db.client);

    let user = queries
        .create_user(CreateUserParams {
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(user.username, "testuser");
    assert_eq!(user.email, "test@example.com");

    let count: i64 = db
        .client
        .query_one("SELECT count(*) FROM users", &[])
        .await
        .unwrap()
        .get(0);
    assert_eq!(count, 1);

    assert_eq!(queries.get_user(user.id).await.unwrap(), Some(user.clone()));
    assert_eq!(queries.list_users().await.unwrap(), vec![user.clone()]);

    queries.delete_user(user.id).await.unwrap();
    assert_eq!(queries.get_user(user.id).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn constraint_violations_are_classified() {
    let db = setup_test_db().await;
    let queries = Queries::new(&db.client);
    let username = format!("user_{}", uuid::Uuid::new_v4().simple());

    queries
        .create_user(CreateUserParams {
            username: username.clone(),
            email: "a@example.com".to_string(),
        })
        .await
        .unwrap();

    let duplicate = queries
        .create_user(CreateUserParams {
            username,
            email: "b@example.com".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(duplicate, Error::UniqueViolation(_)));
    assert_eq!(duplicate.constraint(), Some("users_username_key"));

    let bad_email = queries
        .create_user(CreateUserParams {
            username: "someone".to_string(),
            email: "no-at-sign".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(bad_email, Error::CheckViolation(_)));
    assert_eq!(bad_email.constraint(), Some("users_email_check"));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn binary_inserts_and_logs_user() {
    let db = setup_test_db().await;

    let output = create_user(&db.connection_string).output().unwrap();

    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Created user: User {"), "{}", stderr);
    assert!(stderr.contains("username: \"testuser\""), "{}", stderr);

    let count: i64 = db
        .client
        .query_one("SELECT count(*) FROM users WHERE username = 'testuser'", &[])
        .await
        .unwrap()
        .get(0);
    assert_eq!(count, 1);
}
