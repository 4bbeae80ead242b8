//! Build recipes and their lifecycle state machine
//!
//! A recipe is one buildable component: identity, archive, sources,
//! dependencies, and a strategy. The lifecycle is shared by every strategy:
//! patch (optional) -> configure -> build -> install, each stage skipped when
//! its marker is set, gated on dependency resolution, and rolled back (marker
//! cleared) when its command fails so a re-run retries it.

use serde::Serialize;
use std::path::PathBuf;

use tracing::warn;

use crate::config::Config;
use crate::core::resolver::{self, BuildContext};
use crate::core::stage::{FileMarkerStore, MarkerStore, Stage};
use crate::core::strategy::Strategy;
use crate::error::StageError;
use crate::infra::fetch;

/// Where a recipe's buildable tree sits under the build root.
///
/// The default is `<name>-<version>`; `fused` drops the separator (tcl
/// style) and `subdir` descends into the extracted tree (tcl's `unix`,
/// samba's `source3`, a binding's nested build directory).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLayout {
    pub fused: bool,
    pub subdir: Option<String>,
}

/// One buildable component registered with the builder.
#[derive(Debug)]
pub struct Recipe {
    name: String,
    version: String,
    filename: String,
    sources: Vec<String>,
    dependencies: Vec<String>,
    patch_file: Option<String>,
    layout: SourceLayout,
    strategy: Box<dyn Strategy>,
    markers: Box<dyn MarkerStore>,
}

/// Per-stage completion snapshot for the status display
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecipeStatus {
    pub name: String,
    pub version: String,
    pub filename: String,
    pub extracted: bool,
    pub patched: bool,
    pub configured: bool,
    pub built: bool,
    pub installed: bool,
}

impl Recipe {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        filename: impl Into<String>,
        strategy: Box<dyn Strategy>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            filename: filename.into(),
            sources: Vec::new(),
            dependencies: Vec::new(),
            patch_file: None,
            layout: SourceLayout::default(),
            strategy,
            markers: Box::new(FileMarkerStore),
        }
    }

    /// Source locations tried in order when fetching
    #[must_use]
    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    /// Names of recipes that must reach each stage before this one
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Patch distfile applied before configure
    #[must_use]
    pub fn with_patch(mut self, patch: impl Into<String>) -> Self {
        self.patch_file = Some(patch.into());
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: SourceLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Substitute the marker backend (used by tests)
    #[must_use]
    pub fn with_marker_store(mut self, markers: Box<dyn MarkerStore>) -> Self {
        self.markers = markers;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn patch_file(&self) -> Option<&str> {
        self.patch_file.as_deref()
    }

    pub fn strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }

    /// Directory name of the extracted source tree under the build root
    pub fn repository(&self) -> String {
        if self.layout.fused {
            format!("{}{}", self.name, self.version)
        } else {
            format!("{}-{}", self.name, self.version)
        }
    }

    /// Display label, `name-version`
    pub fn label(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// Directory stage commands run from (and markers live in)
    pub fn build_path(&self, config: &Config) -> PathBuf {
        let root = config.build_root.join(self.repository());
        match &self.layout.subdir {
            Some(subdir) => root.join(subdir),
            None => root,
        }
    }

    /// Root of the extracted tree (what `clean` removes)
    pub fn source_tree(&self, config: &Config) -> PathBuf {
        config.build_root.join(self.repository())
    }

    fn marker_name(&self, stage: Stage) -> String {
        match self.strategy.marker_namespace() {
            Some(namespace) => format!("{namespace}.{}", stage.marker()),
            None => format!(".{}", stage.marker()),
        }
    }

    /// Whether a stage has completed, as the dependency resolver sees it.
    ///
    /// Configure is implicitly complete for recipes with no configure step;
    /// everything else is the persisted marker.
    pub fn stage_done(&self, stage: Stage, config: &Config) -> bool {
        if stage == Stage::Configure && self.strategy.configure_command(config).is_none() {
            return true;
        }
        self.markers
            .is_done(&self.build_path(config), &self.marker_name(stage))
    }

    /// Ensure the distfile is cached and the source tree extracted.
    ///
    /// Idempotent; called by the orchestrator for selected targets and by
    /// each stage before running commands, so a recipe pulled in purely as a
    /// dependency still gets fetched and unpacked.
    pub fn ensure_sources(&self, cx: &mut BuildContext) -> Result<(), StageError> {
        let config = cx.config();
        fetch::ensure_cached(
            cx.executor(),
            &config.distfiles,
            &self.filename,
            &self.sources,
            &config.tools.fetch,
        )?;
        if !self.build_path(config).is_dir() {
            println!(" -> extracting {}", self.label());
            fetch::extract(
                cx.executor(),
                &config.build_root,
                &config.distfiles,
                &self.filename,
                &config.tools.tar,
            )?;
        }
        Ok(())
    }

    /// Drive one stage by name
    pub fn run(&self, cx: &mut BuildContext, stage: Stage) -> Result<(), StageError> {
        match stage {
            Stage::Patch => self.patch(cx),
            Stage::Configure => self.configure(cx),
            Stage::Build => self.build(cx),
            Stage::Install => self.install(cx),
        }
    }

    /// Drive the full lifecycle so this recipe is installed into the prefix
    /// and usable by its dependents. Completed stages are skipped.
    pub fn satisfy(&self, cx: &mut BuildContext) -> Result<(), StageError> {
        self.ensure_sources(cx)?;
        for stage in Stage::ALL {
            self.run(cx, stage)?;
        }
        Ok(())
    }

    /// Apply the declared patch, if any.
    ///
    /// With no patch declared there is nothing to run, but the stage is
    /// still recorded so every recipe carries the same four markers.
    pub fn patch(&self, cx: &mut BuildContext) -> Result<(), StageError> {
        if self.stage_done(Stage::Patch, cx.config()) {
            println!("{} already patched...", self.label());
            return Ok(());
        }
        let Some(patch_file) = self.patch_file.clone() else {
            self.ensure_sources(cx)?;
            return self
                .markers
                .set_done(
                    &self.build_path(cx.config()),
                    &self.marker_name(Stage::Patch),
                    true,
                )
                .map_err(StageError::from);
        };
        resolver::ensure_stage(cx, self, Stage::Patch)?;

        let config = cx.config();
        let distfile = fetch::ensure_cached(
            cx.executor(),
            &config.distfiles,
            &patch_file,
            &self.sources,
            &config.tools.fetch,
        )?;
        let command = format!("{} -p0 < {}", config.tools.patch, distfile.display());
        self.ensure_sources(cx)?;
        self.run_stage(cx, Stage::Patch, &[command])
    }

    pub fn configure(&self, cx: &mut BuildContext) -> Result<(), StageError> {
        // Configure-less recipes have nothing to do or gate on
        let Some(command) = self.strategy.configure_command(cx.config()) else {
            return Ok(());
        };
        if self.stage_done(Stage::Configure, cx.config()) {
            println!("{} already configured...", self.label());
            return Ok(());
        }
        resolver::ensure_stage(cx, self, Stage::Configure)?;

        self.ensure_sources(cx)?;
        self.run_stage(cx, Stage::Configure, &[command])
    }

    pub fn build(&self, cx: &mut BuildContext) -> Result<(), StageError> {
        if !self.stage_done(Stage::Configure, cx.config()) {
            return Err(StageError::NotConfigured {
                recipe: self.label(),
            });
        }
        if self.stage_done(Stage::Build, cx.config()) {
            println!("{} already built...", self.label());
            return Ok(());
        }
        resolver::ensure_stage(cx, self, Stage::Build)?;

        let command = self.strategy.build_command(cx.config());
        self.ensure_sources(cx)?;
        self.run_stage(cx, Stage::Build, &[command])
    }

    pub fn install(&self, cx: &mut BuildContext) -> Result<(), StageError> {
        if self.stage_done(Stage::Install, cx.config()) {
            println!("{} already installed...", self.label());
            return Ok(());
        }
        resolver::ensure_stage(cx, self, Stage::Install)?;

        let commands = self.strategy.install_commands(cx.config());
        self.ensure_sources(cx)?;
        self.run_stage(cx, Stage::Install, &commands)
    }

    /// Run a stage's commands, persisting the marker on success and
    /// clearing it on failure so an interrupted stage is retried.
    fn run_stage(
        &self,
        cx: &mut BuildContext,
        stage: Stage,
        commands: &[String],
    ) -> Result<(), StageError> {
        let build_path = self.build_path(cx.config());
        let marker = self.marker_name(stage);
        let env = self.strategy.stage_env(cx.config());

        for command in commands {
            if let Err(err) = cx.executor().run_with_env(command, &build_path, &env) {
                if let Err(marker_err) = self.markers.set_done(&build_path, &marker, false) {
                    warn!("{marker_err}");
                }
                return Err(err.into());
            }
        }
        self.markers.set_done(&build_path, &marker, true)?;
        Ok(())
    }

    /// Completion snapshot across all stages
    pub fn status(&self, config: &Config) -> RecipeStatus {
        RecipeStatus {
            name: self.name.clone(),
            version: self.version.clone(),
            filename: self.filename.clone(),
            extracted: self.build_path(config).is_dir(),
            patched: self.stage_done(Stage::Patch, config),
            configured: self.stage_done(Stage::Configure, config),
            built: self.stage_done(Stage::Build, config),
            installed: self.stage_done(Stage::Install, config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::Registry;
    use crate::core::strategy::{ConfigureMake, ToolchainDriven};
    use crate::infra::exec::{EnvOverlay, Executor};
    use tempfile::TempDir;

    fn test_config(root: &TempDir) -> Config {
        let mut config = Config::default().with_prefix(root.path().join("prefix"));
        config.build_root = root.path().join("buildroot");
        config.distfiles = root.path().join("distfiles");
        config.tools.make = "true".to_string();
        config
    }

    fn generic(name: &str, version: &str) -> Recipe {
        Recipe::new(
            name,
            version,
            format!("{name}-{version}.tar.gz"),
            Box::<ConfigureMake>::default(),
        )
    }

    #[test]
    fn test_default_build_path() {
        let root = TempDir::new().unwrap();
        let config = test_config(&root);
        let recipe = generic("libfoo", "1.0");
        assert_eq!(recipe.repository(), "libfoo-1.0");
        assert_eq!(
            recipe.build_path(&config),
            config.build_root.join("libfoo-1.0")
        );
    }

    #[test]
    fn test_fused_layout_with_subdir() {
        let root = TempDir::new().unwrap();
        let config = test_config(&root);
        let recipe = generic("tcl", "8.5.11").with_layout(SourceLayout {
            fused: true,
            subdir: Some("unix".to_string()),
        });
        assert_eq!(recipe.repository(), "tcl8.5.11");
        assert_eq!(
            recipe.build_path(&config),
            config.build_root.join("tcl8.5.11").join("unix")
        );
        assert_eq!(
            recipe.source_tree(&config),
            config.build_root.join("tcl8.5.11")
        );
    }

    #[test]
    fn test_nested_subdir_layout() {
        let root = TempDir::new().unwrap();
        let config = test_config(&root);
        let recipe = generic("samba", "3.6").with_layout(SourceLayout {
            fused: false,
            subdir: Some("source3".to_string()),
        });
        assert_eq!(
            recipe.build_path(&config),
            config.build_root.join("samba-3.6").join("source3")
        );
    }

    #[test]
    fn test_marker_names_by_namespace() {
        let generic = generic("libfoo", "1.0");
        assert_eq!(generic.marker_name(Stage::Configure), ".configured");

        let toolchain = Recipe::new(
            "binding",
            "1.0",
            "binding-1.0.tar.gz",
            Box::<ToolchainDriven>::default(),
        );
        assert_eq!(toolchain.marker_name(Stage::Build), "python.built");
    }

    #[test]
    fn test_toolchain_recipe_is_always_configured() {
        let root = TempDir::new().unwrap();
        let config = test_config(&root);
        let recipe = Recipe::new(
            "binding",
            "1.0",
            "binding-1.0.tar.gz",
            Box::<ToolchainDriven>::default(),
        );
        assert!(recipe.stage_done(Stage::Configure, &config));
        assert!(!recipe.stage_done(Stage::Build, &config));
    }

    #[test]
    fn test_build_refuses_when_not_configured() {
        let root = TempDir::new().unwrap();
        let config = test_config(&root);
        let registry = Registry::default();
        let executor = Executor::new(EnvOverlay::new(), config.prefix.clone(), false);
        let mut cx = BuildContext::new(&config, &executor, &registry);

        let recipe = generic("libfoo", "1.0");
        let err = recipe.build(&mut cx).unwrap_err();
        assert!(matches!(err, StageError::NotConfigured { .. }));
    }

    #[test]
    fn test_stage_skips_when_marker_set() {
        let root = TempDir::new().unwrap();
        let config = test_config(&root);
        let registry = Registry::default();
        let executor = Executor::new(EnvOverlay::new(), config.prefix.clone(), false);
        let mut cx = BuildContext::new(&config, &executor, &registry);

        let recipe = generic("libfoo", "1.0");
        let build_path = recipe.build_path(&config);
        std::fs::create_dir_all(&build_path).unwrap();
        // Pre-set markers: no distfile exists, so any command attempt
        // (or fetch) would error out
        for stage in [Stage::Configure, Stage::Build, Stage::Install] {
            recipe
                .markers
                .set_done(&build_path, &recipe.marker_name(stage), true)
                .unwrap();
        }
        recipe.configure(&mut cx).unwrap();
        recipe.build(&mut cx).unwrap();
        recipe.install(&mut cx).unwrap();
    }

    #[test]
    fn test_marker_cleared_when_command_fails() {
        let root = TempDir::new().unwrap();
        let mut config = test_config(&root);
        config.tools.make = "false".to_string();
        let registry = Registry::default();
        let executor = Executor::new(EnvOverlay::new(), config.prefix.clone(), false);
        let mut cx = BuildContext::new(&config, &executor, &registry);

        let recipe = generic("libfoo", "1.0").with_sources(vec![]);
        let build_path = recipe.build_path(&config);
        std::fs::create_dir_all(&build_path).unwrap();
        std::fs::create_dir_all(&config.distfiles).unwrap();
        std::fs::write(config.distfiles.join("libfoo-1.0.tar.gz"), "x").unwrap();
        recipe
            .markers
            .set_done(&build_path, ".configured", true)
            .unwrap();

        let err = recipe.build(&mut cx).unwrap_err();
        assert!(matches!(err, StageError::Exec(_)));
        assert!(!recipe.stage_done(Stage::Build, &config));
    }

    #[test]
    fn test_patch_without_patch_file_records_the_stage() {
        let root = TempDir::new().unwrap();
        let config = test_config(&root);
        let registry = Registry::default();
        let executor = Executor::new(EnvOverlay::new(), config.prefix.clone(), false);
        let mut cx = BuildContext::new(&config, &executor, &registry);

        let recipe = generic("libfoo", "1.0");
        std::fs::create_dir_all(recipe.build_path(&config)).unwrap();
        std::fs::create_dir_all(&config.distfiles).unwrap();
        std::fs::write(config.distfiles.join("libfoo-1.0.tar.gz"), "x").unwrap();

        recipe.patch(&mut cx).unwrap();
        assert!(recipe.stage_done(Stage::Patch, &config));
        // Second call skips without touching anything
        recipe.patch(&mut cx).unwrap();
    }

    #[test]
    fn test_status_reflects_markers() {
        let root = TempDir::new().unwrap();
        let config = test_config(&root);
        let recipe = generic("libfoo", "1.0");
        let build_path = recipe.build_path(&config);
        std::fs::create_dir_all(&build_path).unwrap();
        recipe
            .markers
            .set_done(&build_path, ".configured", true)
            .unwrap();

        let status = recipe.status(&config);
        assert!(status.extracted);
        assert!(status.configured);
        assert!(!status.built);
        assert!(!status.installed);
    }
}
