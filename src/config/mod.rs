//! Global build configuration
//!
//! The `[config]` table of the manifest: install prefix, directory layout,
//! external tool paths, and make parallelism. Every value has a default so
//! a manifest can consist of nothing but `[[port]]` tables.

pub mod defaults;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Paths to the external tools every build step shells out to.
///
/// Defaults are discovered on `PATH`; a manifest can pin any of them to an
/// absolute path instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tools {
    /// Make implementation used for build and install stages
    pub make: String,
    /// Patch tool used to apply patch distfiles
    pub patch: String,
    /// Download tool; invoked as `<fetch> <url> -O <dest>`
    pub fetch: String,
    /// Archiver used for extraction
    pub tar: String,
    /// Language toolchain binary for toolchain-driven ports.
    /// Defaults to `<prefix>/bin/python` so a freshly built interpreter
    /// drives the ports that depend on it.
    pub python: Option<String>,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            make: find_tool("make"),
            patch: find_tool("patch"),
            fetch: find_tool("wget"),
            tar: find_tool("tar"),
            python: None,
        }
    }
}

/// Global build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Install prefix for every port
    pub prefix: PathBuf,
    /// Directory holding extracted source trees
    pub build_root: PathBuf,
    /// Directory holding cached distfiles and patches
    pub distfiles: PathBuf,
    /// External tool paths
    pub tools: Tools,
    /// Flags appended to every make invocation (parallelism)
    pub make_flags: String,
    /// Stream child stdout while building
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: PathBuf::from(defaults::DEFAULT_PREFIX),
            build_root: PathBuf::from(defaults::DEFAULT_BUILD_ROOT),
            distfiles: PathBuf::from(defaults::DEFAULT_DISTFILES),
            tools: Tools::default(),
            make_flags: defaults::make_flags(),
            verbose: false,
        }
    }
}

impl Config {
    /// Override the install prefix (the `--prefix` CLI flag)
    #[must_use]
    pub fn with_prefix(mut self, prefix: PathBuf) -> Self {
        self.prefix = prefix;
        self
    }

    /// Enable streaming of child stdout
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Language tool binary, following the prefix unless pinned
    pub fn python_tool(&self) -> String {
        self.tools.python.clone().unwrap_or_else(|| {
            self.prefix.join("bin").join("python").display().to_string()
        })
    }

    /// Resolve the build root and distfiles directories against the
    /// directory the manifest was loaded from.
    pub fn anchor_to(&mut self, base: &Path) {
        if self.build_root.is_relative() {
            self.build_root = base.join(&self.build_root);
        }
        if self.distfiles.is_relative() {
            self.distfiles = base.join(&self.distfiles);
        }
    }
}

/// Locate a tool on `PATH`, falling back to the bare name
fn find_tool(name: &str) -> String {
    which::which(name).map_or_else(|_| name.to_string(), |p| p.display().to_string())
}
