//! Integration tests for `portsmith status`

mod common;

use common::{PortKind, TestProject};

fn project_with_port() -> TestProject {
    let project = TestProject::new();
    project.add_port_archive("libfoo", "1.0", PortKind::Generic);
    project.write_manifest(&format!(
        r#"[[port]]
name = "libfoo"
version = "1.0"
sources = ["{mirror}"]
"#,
        mirror = project.mirror_url()
    ));
    project
}

#[test]
fn test_status_before_and_after_build() {
    let project = project_with_port();

    let output = project.run(&["status"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("<libfoo-1.0 (libfoo-1.0.tar.gz)>"));
    assert!(!stdout.contains("[ Installed ]"));

    assert!(project.run(&["build"]).status.success());

    let output = project.run(&["status"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[ Extracted ]"));
    assert!(stdout.contains("[ Patched ]"));
    assert!(stdout.contains("[ Configured ]"));
    assert!(stdout.contains("[ Built ]"));
    assert!(stdout.contains("[ Installed ]"));
}

#[test]
fn test_status_json_output() {
    let project = project_with_port();
    assert!(project.run(&["build"]).status.success());

    let output = project.run(&["status", "--json"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("invalid JSON");
    let ports = parsed.as_array().expect("expected an array");
    assert_eq!(ports.len(), 1);
    assert_eq!(ports[0]["name"], "libfoo");
    assert_eq!(ports[0]["version"], "1.0");
    assert_eq!(ports[0]["installed"], true);
}

#[test]
fn test_status_lists_duplicate_names_separately() {
    let project = TestProject::new();
    project.add_port_archive("python", "2.7", PortKind::Generic);
    project.write_manifest(&format!(
        r#"[[port]]
name = "python"
version = "2.7"
sources = ["{mirror}"]

[[port]]
name = "python"
version = "2.7"
sources = ["{mirror}"]
strategy = "python"
dependencies = ["python"]
"#,
        mirror = project.mirror_url()
    ));

    let output = project.run(&["status"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("python-2.7 (").count(), 2);
}
