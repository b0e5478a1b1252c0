use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ADD_GRAPH: &str = r#"
[[node]]
name = "a"
op = "var"
precision = 8

[[node]]
name = "b"
op = "var"

[[node]]
name = "c"
op = "scalar_add"
inputs = ["a", "b"]
assign = true
"#;

const OUT_OF_RANGE_GRAPH: &str = r#"
[[node]]
name = "a"
op = "var"
precision = 20

[[node]]
name = "b"
op = "var"

[[node]]
name = "d"
op = "scalar_sub"
inputs = ["a", "b"]
"#;

const CLIP_GRAPH: &str = r#"
[[node]]
name = "x"
op = "var"

[[node]]
name = "y"
op = "clip"
inputs = ["x"]
a_min = -128
a_max = 127
"#;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn prover() -> Command {
    let mut cmd = Command::cargo_bin("cvm-prover").unwrap();
    cmd.env("CLICOLOR", "0").env("NO_COLOR", "1");
    cmd
}

fn stdout_of(cmd: &mut Command, code: i32) -> String {
    let output = cmd.output().unwrap();
    assert_eq!(output.status.code(), Some(code), "{output:?}");
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn proves_add_graph() {
    let dir = TempDir::new().unwrap();
    let graph = write(dir.path(), "add.toml", ADD_GRAPH);

    let stdout = stdout_of(prover().arg(&graph).args(["--timeout", "60000"]), 0);
    assert!(stdout.contains("Success: The model is deterministic"), "{stdout}");
}

#[test]
fn verdict_is_printed_once() {
    let dir = TempDir::new().unwrap();
    let graph = write(dir.path(), "add.toml", ADD_GRAPH);

    let output = prover().arg(&graph).output().unwrap();
    assert_eq!(output.status.code(), Some(0), "{output:?}");
    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(stdout.matches("The model is deterministic").count(), 1, "{stdout}");
    assert!(!stderr.contains("The model is deterministic"), "{stderr}");
}

#[test]
fn proves_clip_graph() {
    let dir = TempDir::new().unwrap();
    let graph = write(dir.path(), "clip.toml", CLIP_GRAPH);

    let stdout = stdout_of(prover().arg(&graph).args(["--timeout", "60000"]), 0);
    assert!(stdout.contains("Success: The model is deterministic"), "{stdout}");
}

#[test]
fn colliding_destination_fails() {
    let dir = TempDir::new().unwrap();
    let graph = write(
        dir.path(),
        "collide.toml",
        &format!("{ADD_GRAPH}destination = \"a\"\n"),
    );

    let stdout = stdout_of(prover().arg(&graph), 1);
    assert!(stdout.contains("variable `a` is already introduced"), "{stdout}");
}

#[test]
fn proves_rerooted_leaf() {
    let dir = TempDir::new().unwrap();
    let graph = write(dir.path(), "add.toml", ADD_GRAPH);

    let stdout = stdout_of(prover().arg(&graph).args(["--root", "a"]), 0);
    assert!(stdout.contains("Success"), "{stdout}");
}

#[test]
fn unsatisfiable_graph_is_vacuous() {
    let dir = TempDir::new().unwrap();
    let graph = write(dir.path(), "sub.toml", OUT_OF_RANGE_GRAPH);

    let stdout = stdout_of(prover().arg(&graph).arg("--show-props"), 0);
    assert!(
        stdout.contains("Model cannot be satisfied, so it's proved to be deterministic"),
        "{stdout}"
    );
}

#[test]
fn config_file_is_applied() {
    let dir = TempDir::new().unwrap();
    let graph = write(dir.path(), "add.toml", ADD_GRAPH);
    let config = write(dir.path(), "prover.toml", "timeout_ms = 60000\nshow_props = true\n");

    let stdout = stdout_of(prover().arg(&graph).arg("--config").arg(&config), 0);
    assert!(stdout.contains("Success"), "{stdout}");
}

#[test]
fn invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let graph = write(dir.path(), "add.toml", ADD_GRAPH);
    let config = write(dir.path(), "prover.toml", "timeout = 1\n");

    let stdout = stdout_of(prover().arg(&graph).arg("-c").arg(&config), 1);
    assert!(stdout.contains("failed to read prover config"), "{stdout}");
}

#[test]
fn unknown_operator_fails() {
    let dir = TempDir::new().unwrap();
    let graph = write(
        dir.path(),
        "bad.toml",
        "[[node]]\nname = \"a\"\nop = \"scalar_pow\"\n",
    );

    let stdout = stdout_of(prover().arg(&graph), 1);
    assert!(stdout.contains("unknown operator `scalar_pow`"), "{stdout}");
}

#[test]
fn unknown_root_fails() {
    let dir = TempDir::new().unwrap();
    let graph = write(dir.path(), "add.toml", ADD_GRAPH);

    let stdout = stdout_of(prover().arg(&graph).args(["--root", "z"]), 1);
    assert!(stdout.contains("root `z` is not a declared node"), "{stdout}");
}

#[test]
fn missing_graph_file_fails() {
    let dir = TempDir::new().unwrap();
    let stdout = stdout_of(prover().arg(dir.path().join("absent.toml")), 1);
    assert!(stdout.contains("failed to load model graph"), "{stdout}");
}

#[test]
fn lists_registered_ops() {
    let stdout = stdout_of(prover().arg("--list-ops"), 0);
    let names: Vec<_> = stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    assert_eq!(
        names,
        ["clip", "scalar_add", "scalar_div", "scalar_mul", "scalar_sub", "var"]
    );
}

#[test]
fn graph_is_required() {
    prover().assert().failure();
}
