//! Build strategies
//!
//! Every recipe shares one lifecycle; a strategy only decides which commands
//! run for configure/build/install and which marker namespace tracks them.
//! Package quirks are fields on the configure/make strategy rather than new
//! types: extra arguments, injected search paths, per-stage environment, a
//! replacement configure program, or a custom install sequence.
//!
//! Argument values may reference `{prefix}`, which expands to the configured
//! install prefix at command-construction time.

use std::fmt;

use crate::config::Config;

/// Expand `{prefix}` placeholders against the active configuration
fn expand(template: &str, config: &Config) -> String {
    template.replace("{prefix}", &config.prefix.display().to_string())
}

/// Strategy contract: command construction per stage.
pub trait Strategy: fmt::Debug + Send + Sync {
    /// Marker namespace; `None` uses the default `.patched`-style dotfiles.
    /// Strategies sharing a build path must not share a namespace.
    fn marker_namespace(&self) -> Option<&str> {
        None
    }

    /// Configure command, or `None` when the recipe has no configure step
    /// (such recipes always count as configured).
    fn configure_command(&self, config: &Config) -> Option<String>;

    /// Build command
    fn build_command(&self, config: &Config) -> String;

    /// Install commands, run in order from the build path
    fn install_commands(&self, config: &Config) -> Vec<String>;

    /// Extra process environment for every stage command of this recipe
    fn stage_env(&self, config: &Config) -> Vec<(String, String)> {
        let _ = config;
        Vec::new()
    }
}

/// The `./configure --prefix=... && make && make install` family.
///
/// Default field values give the plain autoconf recipe; anything with a
/// quirk sets only the fields it needs.
#[derive(Debug, Clone, Default)]
pub struct ConfigureMake {
    /// Extra arguments appended to the configure command
    pub configure_args: String,
    /// Extra arguments appended to the make command
    pub make_args: String,
    /// Leave the global parallelism flags out of the make command
    pub override_make_flags: bool,
    /// `CFLAGS=<value>` appended to the make command
    pub cflags: String,
    /// Replacement for the `./configure --prefix=...` invocation
    pub configure_program: Option<String>,
    /// The recipe has no configure step at all
    pub no_configure: bool,
    /// Extra `-I` search paths injected into the configure command
    pub include_paths: Vec<String>,
    /// Extra `-L` search paths injected into the configure command
    pub lib_paths: Vec<String>,
    /// Extra process environment for every stage command
    pub env: Vec<(String, String)>,
    /// Replacement install sequence; empty means `make install`
    pub install: Vec<String>,
}

impl Strategy for ConfigureMake {
    fn configure_command(&self, config: &Config) -> Option<String> {
        if self.no_configure {
            return None;
        }
        let mut command = match &self.configure_program {
            Some(program) => expand(program, config),
            None => format!("./configure --prefix={}", config.prefix.display()),
        };
        for path in &self.include_paths {
            command.push_str(" -I");
            command.push_str(&expand(path, config));
        }
        for path in &self.lib_paths {
            command.push_str(" -L");
            command.push_str(&expand(path, config));
        }
        if !self.configure_args.is_empty() {
            command.push(' ');
            command.push_str(&expand(&self.configure_args, config));
        }
        Some(command)
    }

    fn build_command(&self, config: &Config) -> String {
        let mut command = config.tools.make.clone();
        if !self.override_make_flags && !config.make_flags.is_empty() {
            command.push(' ');
            command.push_str(&config.make_flags);
        }
        if !self.make_args.is_empty() {
            command.push(' ');
            command.push_str(&expand(&self.make_args, config));
        }
        if !self.cflags.is_empty() {
            command.push_str(" CFLAGS=");
            command.push_str(&self.cflags);
        }
        command
    }

    fn install_commands(&self, config: &Config) -> Vec<String> {
        if self.install.is_empty() {
            vec![format!("{} install", config.tools.make)]
        } else {
            self.install.iter().map(|c| expand(c, config)).collect()
        }
    }

    fn stage_env(&self, config: &Config) -> Vec<(String, String)> {
        self.env
            .iter()
            .map(|(k, v)| (k.clone(), expand(v, config)))
            .collect()
    }
}

/// Language-toolchain recipes: the tool's own build and install steps
/// (`python setup.py build` / `python setup.py install --prefix=...`).
///
/// Uses a private marker namespace so it can track completion against a
/// source tree another strategy also builds.
#[derive(Debug, Clone, Default)]
pub struct ToolchainDriven {
    /// Override for the configured language tool binary
    pub tool: Option<String>,
}

impl ToolchainDriven {
    fn tool(&self, config: &Config) -> String {
        self.tool.clone().unwrap_or_else(|| config.python_tool())
    }
}

impl Strategy for ToolchainDriven {
    fn marker_namespace(&self) -> Option<&str> {
        Some("python")
    }

    fn configure_command(&self, _config: &Config) -> Option<String> {
        None
    }

    fn build_command(&self, config: &Config) -> String {
        format!("{} setup.py build", self.tool(config))
    }

    fn install_commands(&self, config: &Config) -> Vec<String> {
        vec![format!(
            "{} setup.py install --prefix={}",
            self.tool(config),
            config.prefix.display()
        )]
    }
}
