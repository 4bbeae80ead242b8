//! Common test utilities and helpers
//!
//! Builds a self-contained project directory: a manifest, a `file://`
//! mirror of generated source archives, and stub tools that log every
//! invocation instead of doing real work. No network and no real toolchain
//! is touched; extraction uses the system `tar`.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Test project context
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

/// What a generated source archive contains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    /// A `./configure` stub that logs and dumps its environment
    Generic,
    /// A `./configure` stub that fails
    BrokenConfigure,
    /// A `setup.py` tree for the python strategy
    Python,
}

impl TestProject {
    /// Create a new test project with stub tools and an empty mirror
    pub fn new() -> Self {
        let project = Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        };
        project.create_dir("mirror");
        project.create_dir("staging");

        let log = project.path().join("order.log");
        project.write_tool(
            "fake-make",
            &format!(
                "#!/bin/sh\necho \"make:$(basename \"$PWD\") $*\" >> {}\nexit 0\n",
                log.display()
            ),
        );
        project.write_tool(
            "fake-patch",
            &format!(
                "#!/bin/sh\ncat > /dev/null\necho \"patch:$(basename \"$PWD\") $*\" >> {}\nexit 0\n",
                log.display()
            ),
        );
        project.write_tool(
            "fake-python",
            &format!(
                "#!/bin/sh\necho \"python:$(basename \"$PWD\") $*\" >> {}\nexit 0\n",
                log.display()
            ),
        );
        project.write_tool(
            "fake-fetch",
            &format!(
                "#!/bin/sh\nurl=\"$1\"\ndest=\"$3\"\necho \"fetch:$url\" >> {}\nsrc=\"${{url#file://}}\"\nif [ -f \"$src\" ]; then\n  cp \"$src\" \"$dest\"\n  exit 0\nfi\necho \"cannot fetch $url\" >&2\nexit 1\n",
                log.display()
            ),
        );
        project
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// The `file://` source prefix for the local mirror
    pub fn mirror_url(&self) -> String {
        format!("file://{}/mirror/", self.path().display())
    }

    /// The accumulated tool invocation log
    pub fn order_log(&self) -> String {
        std::fs::read_to_string(self.path().join("order.log")).unwrap_or_default()
    }

    /// True if a marker file exists under the extracted tree
    pub fn marker_exists(&self, repository: &str, marker: &str) -> bool {
        self.path()
            .join("buildroot")
            .join(repository)
            .join(marker)
            .exists()
    }

    /// Write the manifest with stub tool paths plus the given port tables
    pub fn write_manifest(&self, ports: &str) {
        let bin = self.path().join("bin");
        let manifest = format!(
            r#"[config]
prefix = "{prefix}"
make_flags = "-j4"

[config.tools]
make = "{bin}/fake-make"
patch = "{bin}/fake-patch"
fetch = "{bin}/fake-fetch"
python = "{bin}/fake-python"

{ports}"#,
            prefix = self.path().join("prefix").display(),
            bin = bin.display(),
        );
        self.create_file("portsmith.toml", &manifest);
    }

    /// Generate `<name>-<version>.tar.gz` in the mirror with the tree a
    /// port of the given kind expects
    pub fn add_port_archive(&self, name: &str, version: &str, kind: PortKind) {
        let repository = format!("{name}-{version}");
        let tree = self.path().join("staging").join(&repository);
        std::fs::create_dir_all(&tree).expect("Failed to create staging tree");

        match kind {
            PortKind::Generic => {
                let log = self.path().join("order.log");
                let script = format!(
                    "#!/bin/sh\necho \"configure:$(basename \"$PWD\") $*\" >> {log}\necho \"CPPFLAGS=$CPPFLAGS\" > env.dump\necho \"CFLAGS=$CFLAGS\" >> env.dump\necho \"LDFLAGS=$LDFLAGS\" >> env.dump\necho \"LD_LIBRARY_PATH=$LD_LIBRARY_PATH\" >> env.dump\necho \"PATH=$PATH\" >> env.dump\nexit 0\n",
                    log = log.display()
                );
                write_executable(&tree.join("configure"), &script);
            }
            PortKind::BrokenConfigure => {
                write_executable(
                    &tree.join("configure"),
                    "#!/bin/sh\necho \"configure exploded\" >&2\nexit 1\n",
                );
            }
            PortKind::Python => {
                std::fs::write(tree.join("setup.py"), "# stub setup script\n")
                    .expect("Failed to write setup.py");
            }
        }

        let archive = self
            .path()
            .join("mirror")
            .join(format!("{repository}.tar.gz"));
        let status = Command::new("tar")
            .arg("czf")
            .arg(&archive)
            .arg("-C")
            .arg(self.path().join("staging"))
            .arg(&repository)
            .status()
            .expect("Failed to run tar");
        assert!(status.success(), "tar failed to create {repository}.tar.gz");
    }

    /// Drop a patch distfile into the mirror
    pub fn add_patch_file(&self, name: &str) {
        self.create_file(&format!("mirror/{name}"), "--- a\n+++ b\n");
    }

    /// Run the portsmith binary in the project directory
    pub fn run(&self, args: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_portsmith"));
        cmd.current_dir(self.path());
        for arg in args {
            cmd.arg(arg);
        }
        cmd.output().expect("Failed to execute portsmith")
    }

    fn write_tool(&self, name: &str, content: &str) {
        let path = self.path().join("bin").join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create bin directory");
        }
        write_executable(&path, content);
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

fn write_executable(path: &std::path::Path, content: &str) {
    std::fs::write(path, content).expect("Failed to write script");
    let mut perms = std::fs::metadata(path)
        .expect("Failed to stat script")
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).expect("Failed to chmod script");
}
