use std::fs;

use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

macro_rules! atomkit {
    () => {
        assert_cmd::cargo::cargo_bin_cmd!("atomkit")
    };
}

fn create_project(store: &str, plan: &str) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    fs::write(dir.path().join("store.json"), store).expect("write store.json");
    fs::write(dir.path().join("plan.json"), plan).expect("write plan.json");
    dir
}

fn read_store(dir: &TempDir) -> Value {
    let content = fs::read_to_string(dir.path().join("store.json")).expect("read store.json");
    serde_json::from_str(&content).expect("parse store.json")
}

const SEEDED_STORE: &str = r#"{"widgets": [{"id": "w1", "name": "old"}]}"#;

const UPDATE_AND_CREATE: &str = r#"{"operations": [
    {"type": "update", "collection": "widgets", "data": {"name": "new"}, "filter": {"id": "w1"}},
    {"type": "create", "collection": "gadgets", "data": {"id": "g1", "size": 3}}
]}"#;

#[test]
fn run_commits_plan_and_saves_store() {
    let project = create_project(SEEDED_STORE, UPDATE_AND_CREATE);

    atomkit!()
        .args(["run", "plan.json", "--store", "store.json"])
        .current_dir(project.path())
        .assert()
        .success()
        .stdout(contains("Transaction completed: 2 operation(s) executed"))
        .stdout(contains("✓ op-1 update widgets where id = \"w1\""))
        .stdout(contains("✓ op-2 create gadgets"));

    let store = read_store(&project);
    assert_eq!(store["widgets"][0]["name"], "new");
    assert_eq!(store["gadgets"][0]["id"], "g1");
}

#[test]
fn dry_run_leaves_store_untouched() {
    let project = create_project(SEEDED_STORE, UPDATE_AND_CREATE);

    atomkit!()
        .args(["run", "plan.json", "--store", "store.json", "--dry-run"])
        .current_dir(project.path())
        .assert()
        .success();

    let store = read_store(&project);
    assert_eq!(store["widgets"][0]["name"], "old");
    assert!(store.get("gadgets").is_none());
}

#[test]
fn missing_store_file_is_created() {
    let dir = TempDir::new().expect("create temp dir");
    fs::write(
        dir.path().join("plan.json"),
        r#"{"operations": [{"type": "create", "collection": "widgets", "data": {"name": "a"}}]}"#,
    )
    .expect("write plan.json");

    atomkit!()
        .args(["run", "plan.json", "--store", "fresh.json"])
        .current_dir(dir.path())
        .assert()
        .success();

    let content = fs::read_to_string(dir.path().join("fresh.json")).expect("read fresh.json");
    let store: Value = serde_json::from_str(&content).expect("parse fresh.json");
    assert_eq!(store["widgets"][0]["name"], "a");
    assert!(store["widgets"][0]["id"].is_string());
}

#[test]
fn json_flag_prints_machine_readable_result() {
    let project = create_project(SEEDED_STORE, UPDATE_AND_CREATE);

    let output = atomkit!()
        .args(["run", "plan.json", "--store", "store.json", "--json"])
        .current_dir(project.path())
        .output()
        .expect("run atomkit");

    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).expect("stdout is json");
    assert_eq!(report["success"], true);
    assert_eq!(report["results"].as_array().map(Vec::len), Some(2));
    assert_eq!(report["results"][1]["operation_id"], "op-2");
    assert_eq!(report["notification"]["level"], "success");
}

#[test]
fn empty_plan_fails_without_writing_store() {
    let project = create_project(SEEDED_STORE, r#"{"operations": []}"#);

    atomkit!()
        .args(["run", "plan.json", "--store", "store.json"])
        .current_dir(project.path())
        .assert()
        .failure()
        .stdout(contains("Transaction failed: no operations to execute"))
        .stderr(contains("error: transaction did not run"));

    let content = fs::read_to_string(project.path().join("store.json")).expect("read store");
    assert_eq!(content, SEEDED_STORE);
}

#[test]
fn yaml_plan_runs() {
    let project = create_project(SEEDED_STORE, "{}");
    fs::write(
        project.path().join("plan.yaml"),
        "operations:\n  - type: delete\n    collection: widgets\n    filter:\n      id: w1\n",
    )
    .expect("write plan.yaml");

    atomkit!()
        .args(["run", "plan.yaml", "--store", "store.json"])
        .current_dir(project.path())
        .assert()
        .success()
        .stdout(contains("Transaction completed: 1 operation(s) executed"));

    let store = read_store(&project);
    assert_eq!(store["widgets"].as_array().map(Vec::len), Some(0));
}

#[test]
fn invalid_plan_reports_cause() {
    let project = create_project(
        SEEDED_STORE,
        r#"{"operations": [{"type": "delete", "collection": "widgets"}]}"#,
    );

    atomkit!()
        .args(["run", "plan.json", "--store", "store.json"])
        .current_dir(project.path())
        .assert()
        .failure()
        .stderr(contains("error: invalid plan in"))
        .stderr(contains(
            "caused by: delete operation on 'widgets' requires a non-empty filter",
        ));
}

#[test]
fn malformed_store_is_reported() {
    let project = create_project("not json", UPDATE_AND_CREATE);

    atomkit!()
        .args(["run", "plan.json", "--store", "store.json"])
        .current_dir(project.path())
        .assert()
        .failure()
        .stderr(contains("error: store error"));
}

#[test]
fn config_file_sets_id_field() {
    let project = create_project(
        "{}",
        r#"{"operations": [{"type": "create", "collection": "widgets", "data": {"name": "a"}}]}"#,
    );
    fs::write(project.path().join("atomkit.toml"), "id-field = \"uuid\"\n")
        .expect("write atomkit.toml");

    atomkit!()
        .args(["run", "plan.json", "--store", "store.json"])
        .current_dir(project.path())
        .assert()
        .success();

    let store = read_store(&project);
    assert!(store["widgets"][0]["uuid"].is_string());
    assert!(store["widgets"][0].get("id").is_none());
}

#[test]
fn explicit_config_must_exist() {
    let project = create_project(SEEDED_STORE, UPDATE_AND_CREATE);

    atomkit!()
        .args([
            "run",
            "plan.json",
            "--store",
            "store.json",
            "--config",
            "missing.toml",
        ])
        .current_dir(project.path())
        .assert()
        .failure()
        .stderr(contains("failed to read 'missing.toml'"));
}

#[test]
fn invalid_config_is_rejected() {
    let project = create_project(SEEDED_STORE, UPDATE_AND_CREATE);
    fs::write(
        project.path().join("atomkit.toml"),
        "preparation-policy = \"sometimes\"\n",
    )
    .expect("write atomkit.toml");

    atomkit!()
        .args(["run", "plan.json", "--store", "store.json"])
        .current_dir(project.path())
        .assert()
        .failure()
        .stderr(contains("invalid configuration in 'atomkit.toml'"));
}
