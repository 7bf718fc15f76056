use super::demo_dir;
use std::process::Command;

fn sqlc_index() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sqlc-index"));
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn lookup_by_method_name() {
    let output = sqlc_index()
        .arg("--root")
        .arg(demo_dir())
        .args(["lookup", "create_user"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("CreateUser (create_user)"), "{}", stdout);
    assert!(stdout.contains("query.sql:1 :one"), "{}", stdout);
}

#[test]
fn lookup_unknown_name_fails() {
    let output = sqlc_index()
        .arg("--root")
        .arg(demo_dir())
        .args(["lookup", "DropEverything"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("No query named 'DropEverything'"), "{}", stderr);
}

#[test]
fn list_as_json() {
    let output = sqlc_index()
        .arg("--root")
        .arg(demo_dir())
        .args(["list", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = entries.as_array().unwrap();

    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0]["name"], "CreateUser");
    assert_eq!(entries[0]["method"], "create_user");
    assert_eq!(entries[0]["hits"][0]["command"], ":one");
    assert_eq!(entries[0]["hits"][0]["range"]["line"], 0);
}

#[test]
fn patterns_of_config() {
    let output = sqlc_index()
        .arg("--root")
        .arg(demo_dir())
        .arg("patterns")
        .arg(demo_dir().join("sqlc.yaml"))
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "query.sql\n");
}
