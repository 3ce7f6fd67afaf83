use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn holding(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("holding").unwrap();
    cmd.current_dir(dir.path()).env("HOLDING_ROOT", dir.path());
    cmd
}

fn init_workspace(dir: &TempDir) {
    holding(dir).arg("init").assert().success();
}

// ---------------------------------------------------------------------------
// holding init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_directory_tree() {
    let dir = TempDir::new().unwrap();
    holding(&dir).arg("init").assert().success();

    assert!(dir.path().join(".holding").is_dir());
    assert!(dir.path().join(".holding/projects").is_dir());
    assert!(dir.path().join(".holding/users").is_dir());
    assert!(dir.path().join(".holding/uploads").is_dir());
    assert!(dir.path().join(".holding/notifications").is_dir());
    assert!(dir.path().join(".holding/config.yaml").exists());
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    holding(&dir).arg("init").assert().success();
    holding(&dir).arg("init").assert().success();
}

#[test]
fn seed_requires_init() {
    let dir = TempDir::new().unwrap();
    holding(&dir)
        .arg("seed")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

// ---------------------------------------------------------------------------
// holding seed
// ---------------------------------------------------------------------------

#[test]
fn seed_prints_demo_credentials() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);

    holding(&dir)
        .arg("seed")
        .assert()
        .success()
        .stdout(predicate::str::contains("joao.completo@email.com"));
}

// ---------------------------------------------------------------------------
// holding user
// ---------------------------------------------------------------------------

#[test]
fn user_create_and_list() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);

    holding(&dir)
        .args([
            "user", "create", "Ana Silva", "ana@email.com",
            "--role", "client", "--client-type", "partner",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("provisional password"));

    holding(&dir)
        .args(["user", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ana@email.com"))
        .stdout(predicate::str::contains("partner"));
}

#[test]
fn user_create_rejects_bad_email() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);

    holding(&dir)
        .args(["user", "create", "Ana", "not-an-email"])
        .assert()
        .failure();
}

#[test]
fn user_delete_refused_while_project_member() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);
    holding(&dir).arg("seed").assert().success();

    let list = holding(&dir).args(["user", "list", "--json"]).output().unwrap();
    let users: serde_json::Value = serde_json::from_slice(&list.stdout).unwrap();
    let joao = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["email"] == "joao.completo@email.com")
        .unwrap();

    holding(&dir)
        .args(["user", "delete", joao["id"].as_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("still a member"));
}

// ---------------------------------------------------------------------------
// holding project
// ---------------------------------------------------------------------------

#[test]
fn project_create_list_and_advance() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);
    holding(&dir).arg("seed").assert().success();

    let list = holding(&dir).args(["project", "list", "--json"]).output().unwrap();
    let projects: serde_json::Value = serde_json::from_slice(&list.stdout).unwrap();
    let id = projects[0]["id"].as_str().unwrap().to_string();
    assert_eq!(projects[0]["current_phase"], 2);

    holding(&dir)
        .args([
            "project", "advance", &id,
            "--from-phase", "2",
            "--actor", "caio@escritorio.com",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("advanced to phase 3"));

    // a stale advance from the same phase is a no-op, not an error
    holding(&dir)
        .args([
            "project", "advance", &id,
            "--from-phase", "2",
            "--actor", "caio@escritorio.com",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("already past phase 2"));
}

#[test]
fn project_show_prints_phase_table() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);
    holding(&dir).arg("seed").assert().success();

    let list = holding(&dir).args(["project", "list", "--json"]).output().unwrap();
    let projects: serde_json::Value = serde_json::from_slice(&list.stdout).unwrap();
    let id = projects[0]["id"].as_str().unwrap().to_string();

    holding(&dir)
        .args(["project", "show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Diagnóstico"))
        .stdout(predicate::str::contains("Suporte"));
}

#[test]
fn project_delete_removes_it() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);
    holding(&dir).arg("seed").assert().success();

    let list = holding(&dir).args(["project", "list", "--json"]).output().unwrap();
    let projects: serde_json::Value = serde_json::from_slice(&list.stdout).unwrap();
    let id = projects[0]["id"].as_str().unwrap().to_string();

    holding(&dir).args(["project", "delete", &id]).assert().success();

    let list = holding(&dir).args(["project", "list", "--json"]).output().unwrap();
    let projects: serde_json::Value = serde_json::from_slice(&list.stdout).unwrap();
    assert!(projects.as_array().unwrap().is_empty());
}
