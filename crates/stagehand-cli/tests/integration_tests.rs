//! End-to-end tests for the stagehand binary.
//!
//! Each test builds a throwaway feature pack on disk and drives the real
//! binary with assert_cmd. stdin is never a terminal here, so `run` skips
//! prompting and relies on answers files plus declared defaults.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn stagehand() -> Command {
    let mut cmd = Command::cargo_bin("stagehand").unwrap();
    cmd.arg("--no-color");
    cmd
}

/// A pack with one always-active feature and one feature switched on by a
/// multi-choice answer.
fn write_pack(dir: &TempDir) {
    let features = dir.path().join("features");
    fs::create_dir_all(&features).unwrap();

    fs::write(
        features.join("00-base.toml"),
        r#"
        [feature]
        id = "base"

        [[options]]
        id = "projectName"
        prompt = "Project name"
        kind = "text"
        default = "demo"
        required = true

        [[options]]
        id = "features"
        prompt = "Extra features"
        kind = "multi-choice"
        choices = ["docker"]
        default = []

        [[stages]]
        name = "setup"

        [[stages.dependencies]]
        names = ["express"]

        [[stages.templates]]
        source = "templates/app"
        destination = "."

        [[stages.mods]]
        path = ".gitignore"
        mods = ["gitignore-node"]
        "#,
    )
    .unwrap();

    fs::write(
        features.join("10-docker.toml"),
        r#"
        [feature]
        id = "docker"
        depends_on = ["base"]

        [feature.activated_by]
        type = "includes"
        key = "features"
        member = "docker"

        [[stages]]
        name = "install"

        [[stages.scripts]]
        command = "true"
        "#,
    )
    .unwrap();

    let templates = dir.path().join("templates/app");
    fs::create_dir_all(&templates).unwrap();
    fs::write(templates.join("README.md"), "# {{projectName}}\n").unwrap();
}

fn write_answers(dir: &TempDir, json: &str) -> std::path::PathBuf {
    let path = dir.path().join("answers.json");
    fs::write(&path, json).unwrap();
    path
}

// ── Surface ───────────────────────────────────────────────────────────────────

#[test]
fn help_lists_subcommands() {
    stagehand()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn version_flag_matches_cargo() {
    stagehand()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn completions_emit_bash_script() {
    stagehand()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("complete"));
}

#[test]
fn unknown_flag_exits_2() {
    stagehand()
        .args(["run", "--wat"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn missing_pack_exits_3() {
    stagehand()
        .args(["run", "--pack", "/definitely/not/a/pack"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("not found"));
}

// ── list ──────────────────────────────────────────────────────────────────────

#[test]
fn list_json_includes_every_feature() {
    let pack = TempDir::new().unwrap();
    write_pack(&pack);

    let output = stagehand()
        .args(["list", "--pack"])
        .arg(pack.path())
        .args(["--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let rows = parsed.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], "base");
    assert_eq!(rows[1]["id"], "docker");
    assert_eq!(rows[1]["depends_on"][0], "base");
    assert_eq!(rows[1]["conditional"], true);
}

#[test]
fn list_table_marks_conditional_features() {
    let pack = TempDir::new().unwrap();
    write_pack(&pack);

    stagehand()
        .args(["list", "--pack"])
        .arg(pack.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("docker*"))
        .stdout(predicate::str::contains("2 features"));
}

// ── plan ──────────────────────────────────────────────────────────────────────

#[test]
fn plan_shows_activation_without_touching_files() {
    let pack = TempDir::new().unwrap();
    write_pack(&pack);
    let answers = write_answers(&pack, r#"{"projectName": "demo", "features": []}"#);

    stagehand()
        .args(["plan", "--pack"])
        .arg(pack.path())
        .args(["--answers"])
        .arg(&answers)
        .assert()
        .success()
        .stdout(predicate::str::contains("base"))
        .stdout(predicate::str::contains("docker (inactive)"))
        .stdout(predicate::str::contains("1 of 2 features would run"));
}

#[test]
fn plan_reports_dependency_cycles() {
    let pack = TempDir::new().unwrap();
    let features = pack.path().join("features");
    fs::create_dir_all(&features).unwrap();
    fs::write(
        features.join("a.toml"),
        "[feature]\nid = \"a\"\ndepends_on = [\"b\"]\n",
    )
    .unwrap();
    fs::write(
        features.join("b.toml"),
        "[feature]\nid = \"b\"\ndepends_on = [\"a\"]\n",
    )
    .unwrap();

    stagehand()
        .args(["plan", "--pack"])
        .arg(pack.path())
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("cycle"));
}

// ── run ───────────────────────────────────────────────────────────────────────

#[test]
fn run_executes_all_stage_steps() {
    let pack = TempDir::new().unwrap();
    write_pack(&pack);
    let project = TempDir::new().unwrap();
    let answers = write_answers(
        &pack,
        r#"{"projectName": "shiny", "features": ["docker"]}"#,
    );

    stagehand()
        .args(["run", "--pack"])
        .arg(pack.path())
        .args(["--project"])
        .arg(project.path())
        .args(["--answers"])
        .arg(&answers)
        .assert()
        .success();

    // Dependency merge
    let manifest = fs::read_to_string(project.path().join("manifest.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&manifest).unwrap();
    assert_eq!(parsed["dependencies"]["express"], "*");

    // Template copy with substitution
    let readme = fs::read_to_string(project.path().join("README.md")).unwrap();
    assert_eq!(readme, "# shiny\n");

    // Codemod
    let gitignore = fs::read_to_string(project.path().join(".gitignore")).unwrap();
    assert!(gitignore.contains("node_modules/"));
}

#[test]
fn run_is_idempotent() {
    let pack = TempDir::new().unwrap();
    write_pack(&pack);
    let project = TempDir::new().unwrap();
    let answers = write_answers(&pack, r#"{"projectName": "demo", "features": []}"#);

    for _ in 0..2 {
        stagehand()
            .args(["run", "--pack"])
            .arg(pack.path())
            .args(["--project"])
            .arg(project.path())
            .args(["--answers"])
            .arg(&answers)
            .assert()
            .success();
    }

    let gitignore = fs::read_to_string(project.path().join(".gitignore")).unwrap();
    assert_eq!(gitignore.matches("node_modules/").count(), 1);
}

#[test]
fn failing_script_exits_1_and_keeps_earlier_changes() {
    let pack = TempDir::new().unwrap();
    let features = pack.path().join("features");
    fs::create_dir_all(&features).unwrap();
    fs::write(
        features.join("00-ok.toml"),
        r#"
        [feature]
        id = "ok"

        [[stages]]
        name = "merge"

        [[stages.dependencies]]
        names = ["left-pad"]
        "#,
    )
    .unwrap();
    fs::write(
        features.join("10-broken.toml"),
        r#"
        [feature]
        id = "broken"

        [[stages]]
        name = "explode"

        [[stages.scripts]]
        command = "exit 9"
        "#,
    )
    .unwrap();
    let project = TempDir::new().unwrap();

    stagehand()
        .args(["run", "--pack"])
        .arg(pack.path())
        .args(["--project"])
        .arg(project.path())
        .assert()
        .failure()
        .code(1);

    // No rollback: the merge from the completed feature stays.
    let manifest = fs::read_to_string(project.path().join("manifest.json")).unwrap();
    assert!(manifest.contains("left-pad"));
}

#[test]
fn missing_required_answer_exits_4() {
    let pack = TempDir::new().unwrap();
    let features = pack.path().join("features");
    fs::create_dir_all(&features).unwrap();
    fs::write(
        features.join("base.toml"),
        r#"
        [feature]
        id = "base"

        [[options]]
        id = "name"
        kind = "text"
        required = true
        "#,
    )
    .unwrap();
    let project = TempDir::new().unwrap();

    stagehand()
        .args(["run", "--pack"])
        .arg(pack.path())
        .args(["--project"])
        .arg(project.path())
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("name"));
}

#[test]
fn malformed_answers_file_exits_2() {
    let pack = TempDir::new().unwrap();
    write_pack(&pack);
    let answers = write_answers(&pack, "not json at all");

    stagehand()
        .args(["run", "--pack"])
        .arg(pack.path())
        .args(["--answers"])
        .arg(&answers)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("answers"));
}
