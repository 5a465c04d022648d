use cpm_cli::test_utils::PackageFixture;
use predicates::prelude::*;

use crate::common::TestEnv;

#[test]
fn test_init_existing_directory_fails() {
    let env = TestEnv::new();
    env.cpm().args(["init", "demo"]).assert().success();
    env.cpm()
        .args(["init", "demo"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_pack_without_manifest_fails() {
    let env = TestEnv::new();
    env.write_package(
        &PackageFixture::new("empty").without_manifest().file("README.md", "# empty\n"),
    );
    env.cpm()
        .args(["pack", "empty"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("colony.yaml not found"));
}

#[test]
fn test_uninstall_unknown_release_fails() {
    let env = TestEnv::new();
    env.cpm()
        .args(["uninstall", "ghost"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Release ghost not found"));
}

#[test]
fn test_registry_install_requires_version() {
    let env = TestEnv::new();
    env.cpm()
        .args(["install", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("version is required"));
}

#[test]
fn test_registry_install_unknown_version() {
    let env = TestEnv::new();
    env.cpm()
        .args(["install", "nowhere", "--version", "1.0.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found in registry"));
}

#[test]
fn test_invalid_rendered_output_shows_raw_text() {
    let env = TestEnv::new();
    env.write_package(&PackageFixture::new("broken").template("spec.json", "{{ Values.x }} oops"));

    env.cpm()
        .args(["install", "broken", "--set", "x=1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse rendered templates as JSON"))
        .stderr(predicate::str::contains("[1 oops]"));
    assert!(!env.home().join("state.json").exists());
}

#[test]
fn test_missing_value_names_template() {
    let env = TestEnv::new();
    env.write_package(&PackageFixture::new("strict").template("spec.json", r#"{"a": "{{ Values.missing }}"}"#));

    env.cpm()
        .args(["install", "strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("render failed"))
        .stderr(predicate::str::contains("spec.json"));
}

#[test]
fn test_misspelled_value_suggests_close_match() {
    let env = TestEnv::new();
    env.write_package(
        &PackageFixture::new("typo")
            .values("environment: dev\n")
            .template("spec.json", r#"{"env": "{{ Values.enviroment }}"}"#),
    );

    env.cpm()
        .args(["install", "typo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Did you mean one of these?"))
        .stderr(predicate::str::contains("Values.environment"));
}

#[test]
fn test_undefined_value_in_condition_fails() {
    let env = TestEnv::new();
    env.write_package(&PackageFixture::new("cond").template(
        "spec.json",
        r#"{% if Values.missing %}{"a": 1}{% else %}{"b": 2}{% endif %}"#,
    ));

    env.cpm()
        .args(["install", "cond"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("render failed"))
        .stderr(predicate::str::contains("Values.missing"));
}

#[test]
fn test_malformed_set_fails() {
    let env = TestEnv::new();
    env.write_package(&PackageFixture::demo());
    env.cpm()
        .args(["install", "demo", "--set", "novalue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("novalue"));
}
