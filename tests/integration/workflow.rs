use predicates::prelude::*;

use crate::common::TestEnv;

#[test]
fn test_full_package_lifecycle() {
    let env = TestEnv::new();

    env.cpm()
        .args(["init", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully initialized package 'demo'"));
    assert!(env.work_dir().join("demo").join("colony.yaml").exists());

    std::fs::write(
        env.work_dir().join("demo").join("templates").join("workflow.json"),
        r#"{"name": "{{ Values.name }}", "replicas": {{ Values.replicas }}}"#,
    )
    .unwrap();
    let values_path = env.work_dir().join("demo").join("values.yaml");
    let values = std::fs::read_to_string(&values_path).unwrap();
    std::fs::write(&values_path, format!("{values}name: demo\n")).unwrap();

    env.cpm()
        .args(["pack", "demo", "--output", "dist"])
        .assert()
        .success()
        .stdout(predicate::str::contains("demo-0.1.0.cpm"));
    assert!(env.work_dir().join("dist").join("demo-0.1.0.cpm").is_file());

    env.cpm()
        .args(["publish", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("published successfully"));
    assert!(env.home().join("registry").join("demo-0.1.0.cpm").is_file());

    env.cpm()
        .args(["search", "dem"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NAME"))
        .stdout(predicate::str::contains("demo-0.1.0.cpm"));

    // With no local "demo" left, install resolves through the registry
    std::fs::rename(env.work_dir().join("demo"), env.work_dir().join("demo-src")).unwrap();
    env.cpm()
        .args(["install", "demo", "--version", "0.1.0", "--colonyid", "colony-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Installation complete"))
        .stderr(predicate::str::contains("not found locally"));

    let state = env.state();
    assert_eq!(state[0]["name"], "demo");
    assert_eq!(state[0]["version"], "0.1.0");

    env.cpm()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("NAME"))
        .stdout(predicate::str::contains("COLONY_ID"))
        .stdout(predicate::str::contains("demo"));

    env.cpm()
        .args(["uninstall", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Package demo uninstalled."));

    env.cpm()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No packages installed."));
}

#[test]
fn test_list_json() {
    let env = TestEnv::new();
    std::fs::create_dir_all(env.home()).unwrap();
    std::fs::write(
        env.home().join("state.json"),
        r#"[{"name":"web","version":"0.1.0","colonyId":"c1","installTime":"2026-01-01T12:00:00Z"}]"#,
    )
    .unwrap();

    let output = env.cpm().args(["list", "--format", "json"]).output().unwrap();
    assert!(output.status.success());
    let releases: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(releases[0]["name"], "web");
    assert_eq!(releases[0]["colonyId"], "c1");
}

#[test]
fn test_search_without_matches() {
    let env = TestEnv::new();
    env.cpm()
        .args(["search", "nothing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No packages found."));
}

#[test]
fn test_home_flag_overrides_environment() {
    let env = TestEnv::new();
    let other_home = env.work_dir().join("other-home");

    env.cpm().args(["init", "demo"]).assert().success();
    env.cpm()
        .args(["--home", other_home.to_str().unwrap(), "publish", "demo"])
        .assert()
        .success();

    assert!(other_home.join("registry").join("demo-0.1.0.cpm").is_file());
    assert!(!env.home().join("registry").exists());
}
