//! Manifest (portsmith.toml) parsing and validation
//!
//! The manifest is the declarative catalogue: a `[config]` table plus one
//! `[[port]]` table per component. Ports are registered in declaration
//! order, which is also the default build order. Validation catches
//! configuration errors (bad archive suffixes, dangling dependency names)
//! before anything is fetched or run.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::config::Config;
use crate::core::recipe::{Recipe, SourceLayout};
use crate::core::strategy::{ConfigureMake, Strategy, ToolchainDriven};
use crate::error::ManifestError;
use crate::infra::fetch::ArchiveKind;

/// Which strategy builds a port
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// `./configure --prefix=... && make && make install`
    #[default]
    ConfigureMake,
    /// `<tool> setup.py build` / `<tool> setup.py install --prefix=...`
    Python,
}

/// One `[[port]]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortEntry {
    pub name: String,
    pub version: String,
    /// Archive file name; defaults to `<name>-<version>.tar.gz`
    pub filename: Option<String>,
    /// Source location prefixes tried in order
    #[serde(default)]
    pub sources: Vec<String>,
    /// Names of ports that must reach each stage first
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Patch distfile applied before configure
    pub patch: Option<String>,
    #[serde(default)]
    pub strategy: StrategyKind,

    // configure/make knobs
    #[serde(default)]
    pub configure_args: String,
    #[serde(default)]
    pub make_args: String,
    #[serde(default)]
    pub override_make_flags: bool,
    #[serde(default)]
    pub cflags: String,
    pub configure_program: Option<String>,
    #[serde(default)]
    pub no_configure: bool,
    #[serde(default)]
    pub include_paths: Vec<String>,
    #[serde(default)]
    pub lib_paths: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub install: Vec<String>,

    // toolchain knobs
    pub tool: Option<String>,

    // source tree layout
    #[serde(default)]
    pub fused_name: bool,
    pub build_subdir: Option<String>,
}

impl PortEntry {
    pub fn filename(&self) -> String {
        self.filename
            .clone()
            .unwrap_or_else(|| format!("{}-{}.tar.gz", self.name, self.version))
    }

    fn strategy(&self) -> Box<dyn Strategy> {
        match self.strategy {
            StrategyKind::ConfigureMake => Box::new(ConfigureMake {
                configure_args: self.configure_args.clone(),
                make_args: self.make_args.clone(),
                override_make_flags: self.override_make_flags,
                cflags: self.cflags.clone(),
                configure_program: self.configure_program.clone(),
                no_configure: self.no_configure,
                include_paths: self.include_paths.clone(),
                lib_paths: self.lib_paths.clone(),
                env: self.env.clone().into_iter().collect(),
                install: self.install.clone(),
            }),
            StrategyKind::Python => Box::new(ToolchainDriven {
                tool: self.tool.clone(),
            }),
        }
    }

    fn into_recipe(self) -> Recipe {
        let strategy = self.strategy();
        let filename = self.filename();
        let mut recipe = Recipe::new(self.name, self.version, filename, strategy)
            .with_sources(self.sources)
            .with_dependencies(self.dependencies)
            .with_layout(SourceLayout {
                fused: self.fused_name,
                subdir: self.build_subdir,
            });
        if let Some(patch) = self.patch {
            recipe = recipe.with_patch(patch);
        }
        recipe
    }
}

/// The whole manifest file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub config: Config,
    #[serde(default, rename = "port")]
    pub ports: Vec<PortEntry>,
}

impl Manifest {
    /// Parse a manifest from TOML text and validate it
    pub fn from_toml(content: &str) -> Result<Self, ManifestError> {
        let manifest: Manifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load a manifest file, anchoring relative directories next to it
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        let mut manifest = Self::from_toml(&content)?;
        if let Some(base) = path.parent() {
            manifest.config.anchor_to(base);
        }
        Ok(manifest)
    }

    /// Reject configuration errors before any work starts
    pub fn validate(&self) -> Result<(), ManifestError> {
        for (index, port) in self.ports.iter().enumerate() {
            if port.name.is_empty() {
                return Err(ManifestError::MissingField {
                    index,
                    field: "name".to_string(),
                });
            }
            if port.version.is_empty() {
                return Err(ManifestError::MissingField {
                    index,
                    field: "version".to_string(),
                });
            }
            let filename = port.filename();
            if ArchiveKind::from_filename(&filename).is_none() {
                return Err(ManifestError::UnsupportedArchive {
                    port: port.name.clone(),
                    filename,
                });
            }
            for dependency in &port.dependencies {
                if !self.ports.iter().any(|p| p.name == *dependency) {
                    return Err(ManifestError::UnknownDependency {
                        port: port.name.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Split into configuration and recipes in declaration order
    pub fn into_parts(self) -> (Config, Vec<Recipe>) {
        let config = self.config;
        let recipes = self.ports.into_iter().map(PortEntry::into_recipe).collect();
        (config, recipes)
    }
}
