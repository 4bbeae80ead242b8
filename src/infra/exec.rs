//! External command execution
//!
//! Every build step shells out through here. Commands run under `sh -c` in
//! an explicit working directory, with the run-wide environment overlay plus
//! per-command compiler/linker augmentation. Exactly one child is in flight
//! at a time; the only concurrency is a background drain of stderr so
//! neither pipe can back up and stall the child.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use tracing::{debug, error};

use crate::error::ExecError;

/// Additive overlay on the process environment, computed once per run.
///
/// Values here shadow the inherited environment for every child; the
/// inherited environment itself is never mutated.
#[derive(Debug, Clone, Default)]
pub struct EnvOverlay {
    vars: Vec<(String, String)>,
}

impl EnvOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or replace a variable in the overlay
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.vars.retain(|(k, _)| *k != key);
        self.vars.push((key, value.into()));
    }

    /// Overlay value for a key, if set
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Runs external commands with the shaped build environment.
#[derive(Debug, Clone)]
pub struct Executor {
    overlay: EnvOverlay,
    prefix: PathBuf,
    verbose: bool,
}

impl Executor {
    pub fn new(overlay: EnvOverlay, prefix: PathBuf, verbose: bool) -> Self {
        Self {
            overlay,
            prefix,
            verbose,
        }
    }

    /// Run a command in `workdir`, failing on a non-zero exit status.
    pub fn run(&self, command: &str, workdir: &Path) -> Result<(), ExecError> {
        self.run_with_env(command, workdir, &[])
    }

    /// Run a command with additional per-recipe environment variables.
    ///
    /// In verbose mode stdout is streamed line by line while stderr is
    /// drained in the background; in quiet mode both are captured and only
    /// surface on failure.
    pub fn run_with_env(
        &self,
        command: &str,
        workdir: &Path,
        extra_env: &[(String, String)],
    ) -> Result<(), ExecError> {
        println!("Will execute `{command}`");

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in self.overlay.iter() {
            cmd.env(key, value);
        }
        for (key, value) in self.command_env(workdir) {
            cmd.env(key, value);
        }
        for (key, value) in extra_env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|e| ExecError::Spawn {
            command: command.to_string(),
            error: e.to_string(),
        })?;
        let pid = child.id();

        let stdout = child.stdout.take().ok_or_else(|| ExecError::Spawn {
            command: command.to_string(),
            error: "stdout pipe not captured".to_string(),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| ExecError::Spawn {
            command: command.to_string(),
            error: "stderr pipe not captured".to_string(),
        })?;

        let stderr_drain = thread::spawn(move || {
            let mut buf = String::new();
            let _ = BufReader::new(stderr).read_to_string(&mut buf);
            buf
        });

        let mut output = String::new();
        if self.verbose {
            for line in BufReader::new(stdout).lines() {
                match line {
                    Ok(line) => println!("{line}"),
                    Err(_) => break,
                }
            }
        } else {
            let _ = BufReader::new(stdout).read_to_string(&mut output);
        }

        let status = child.wait().map_err(|e| ExecError::Wait {
            command: command.to_string(),
            error: e.to_string(),
        })?;
        let stderr_output = stderr_drain.join().unwrap_or_default();

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            error!("Error executing `{command}`:\n{stderr_output}\nExit code was: {code} (pid {pid})");
            debug!("Complete output: {output}");
            return Err(ExecError::NonZeroExit {
                command: command.to_string(),
                code,
                stderr: stderr_output,
            });
        }
        Ok(())
    }

    /// Per-command compiler, linker, and runtime search augmentation.
    ///
    /// Appends the working directory's local `include` and `lib` to any
    /// existing CPPFLAGS/LDFLAGS/LD_LIBRARY_PATH; falls back to the install
    /// prefix's `include`/`lib` when nothing is set yet.
    fn command_env(&self, workdir: &Path) -> Vec<(String, String)> {
        let include = workdir.join("include");
        let lib = workdir.join("lib");

        let cppflags = match self.current("CPPFLAGS") {
            Some(prev) => format!("{prev} -I{}", include.display()),
            None => format!("-I{}", self.prefix.join("include").display()),
        };
        let ldflags = match self.current("LDFLAGS") {
            Some(prev) => format!("{prev} -L{}", lib.display()),
            None => format!("-L{}", self.prefix.join("lib").display()),
        };
        let library_path = match self.current("LD_LIBRARY_PATH") {
            Some(prev) => format!("{prev}:{}", lib.display()),
            None => self.prefix.join("lib").display().to_string(),
        };

        vec![
            ("CPPFLAGS".to_string(), cppflags),
            ("LDFLAGS".to_string(), ldflags),
            ("LD_LIBRARY_PATH".to_string(), library_path),
        ]
    }

    /// Effective value of a variable: overlay first, then process env
    fn current(&self, key: &str) -> Option<String> {
        self.overlay
            .get(key)
            .map(str::to_string)
            .or_else(|| std::env::var(key).ok())
    }
}
