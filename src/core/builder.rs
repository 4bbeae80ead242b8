//! Build orchestration
//!
//! The builder owns the recipe registry and the two on-disk roots, shapes
//! the run-wide environment overlay, and drives the full lifecycle
//! (fetch -> extract -> patch -> configure -> build -> install) for one or
//! all registered recipes in registration order. The first failure halts
//! the whole run; completed stage markers stay behind so the next run
//! resumes past them.

use std::path::Path;

use tracing::info;

use crate::config::defaults;
use crate::config::Config;
use crate::core::recipe::{Recipe, RecipeStatus};
use crate::core::resolver::BuildContext;
use crate::error::PortsmithError;
use crate::infra::exec::{EnvOverlay, Executor};
use crate::infra::fetch;
use crate::infra::filesystem;

/// Insertion-ordered recipe collection.
///
/// Lookup by name returns the first registration; later recipes with the
/// same name (one source tree built under two strategies) stay reachable
/// through iteration order only.
#[derive(Debug, Default)]
pub struct Registry {
    recipes: Vec<Recipe>,
}

impl Registry {
    pub fn register(&mut self, recipe: Recipe) {
        self.recipes.push(recipe);
    }

    /// First registered recipe with this name
    pub fn lookup(&self, name: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.iter()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

/// The build orchestrator.
pub struct Builder {
    config: Config,
    registry: Registry,
}

impl Builder {
    /// Create a builder, creating the build root and distfiles cache.
    /// Either directory being uncreatable is fatal.
    pub fn new(config: Config) -> Result<Self, PortsmithError> {
        filesystem::create_dir_all(&config.build_root)?;
        filesystem::create_dir_all(&config.distfiles)?;
        Ok(Self {
            config,
            registry: Registry::default(),
        })
    }

    pub fn register(&mut self, recipe: Recipe) {
        self.registry.register(recipe);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compute the run-wide environment overlay from the current process
    /// environment: the prefix's `bin`/`lib` on the search paths and its
    /// `include`/`lib` on the compile and link flags. Additive only; the
    /// inherited environment is never replaced.
    pub fn shape_environment(&self) -> EnvOverlay {
        Self::shape_environment_with(&self.config.prefix, |key| std::env::var(key).ok())
    }

    fn shape_environment_with(
        prefix: &Path,
        getenv: impl Fn(&str) -> Option<String>,
    ) -> EnvOverlay {
        let mut overlay = EnvOverlay::new();
        let bin = prefix.join("bin").display().to_string();
        let lib = prefix.join("lib").display().to_string();
        let include = prefix.join("include").display().to_string();

        match getenv("PATH") {
            Some(path) if path.split(':').any(|entry| entry == bin) => {}
            Some(path) => {
                let newpath = format!("{bin}:{path}");
                info!("Setting up new environment variable PATH: {newpath}");
                overlay.set("PATH", newpath);
            }
            None => {
                info!("Setting up new environment variable PATH: {bin}");
                overlay.set("PATH", bin.clone());
            }
        }

        match getenv("LD_LIBRARY_PATH") {
            Some(path) if path.split(':').any(|entry| entry == lib) => {}
            Some(path) => {
                let newpath = format!("{lib}:{path}");
                info!("Setting up new environment variable LD_LIBRARY_PATH: {newpath}");
                overlay.set("LD_LIBRARY_PATH", newpath);
            }
            None => {
                info!("Setting up new environment variable LD_LIBRARY_PATH: {lib}");
                overlay.set("LD_LIBRARY_PATH", lib.clone());
            }
        }

        let cflags = match getenv("CFLAGS") {
            Some(prev) => format!("{prev} -I{include}"),
            None => format!("-I{include}"),
        };
        info!("Setting up new environment variable CFLAGS: {cflags}");
        overlay.set("CFLAGS", cflags);

        let ldflags = match getenv("LDFLAGS") {
            Some(prev) => format!("{prev} -L{lib}"),
            None => format!("-L{lib}"),
        };
        info!("Setting up new environment variable LDFLAGS: {ldflags}");
        overlay.set("LDFLAGS", ldflags);

        overlay
    }

    /// Recipes selected by name, in registration order
    fn select(&self, selector: &str) -> Result<Vec<&Recipe>, PortsmithError> {
        let selected: Vec<&Recipe> = if selector == defaults::ALL_PORTS {
            self.registry.iter().collect()
        } else {
            self.registry
                .iter()
                .filter(|r| r.name() == selector)
                .collect()
        };
        if selected.is_empty() && selector != defaults::ALL_PORTS {
            return Err(PortsmithError::UnknownTarget {
                name: selector.to_string(),
            });
        }
        Ok(selected)
    }

    fn executor(&self) -> Executor {
        Executor::new(
            self.shape_environment(),
            self.config.prefix.clone(),
            self.config.verbose,
        )
    }

    /// Drive the full lifecycle for one port (or `"all"`).
    ///
    /// Dependencies of the selected ports are pulled in by the resolver,
    /// not by selection.
    pub fn build(&self, selector: &str) -> Result<(), PortsmithError> {
        println!("=> Building target {selector}");

        let selected = self.select(selector)?;
        let executor = self.executor();
        let mut cx = BuildContext::new(&self.config, &executor, &self.registry);

        println!("Ports in this target:");
        for recipe in &selected {
            println!(" -> {}", recipe.label());
        }

        for recipe in selected {
            println!("=> Building {}", recipe.label());
            recipe.ensure_sources(&mut cx)?;
            println!(" -> patching...");
            recipe.patch(&mut cx)?;
            println!(" -> configure...");
            recipe.configure(&mut cx)?;
            println!(" -> build...");
            recipe.build(&mut cx)?;
            println!(" -> install...");
            recipe.install(&mut cx)?;
            println!(" -> done.");
        }

        println!("=> Target {selector} built.");
        Ok(())
    }

    /// Populate the distfiles cache (archives and patches) without building
    pub fn fetch(&self, selector: &str) -> Result<(), PortsmithError> {
        let selected = self.select(selector)?;
        let executor = self.executor();

        for recipe in selected {
            println!("=> Fetching {}", recipe.label());
            fetch::ensure_cached(
                &executor,
                &self.config.distfiles,
                recipe.filename(),
                recipe.sources(),
                &self.config.tools.fetch,
            )?;
            if let Some(patch_file) = recipe.patch_file() {
                fetch::ensure_cached(
                    &executor,
                    &self.config.distfiles,
                    patch_file,
                    recipe.sources(),
                    &self.config.tools.fetch,
                )?;
            }
        }
        Ok(())
    }

    /// Remove extracted source trees (markers go with them)
    pub fn clean(&self, selector: &str) -> Result<(), PortsmithError> {
        let selected = self.select(selector)?;
        for recipe in selected {
            let tree = recipe.source_tree(&self.config);
            println!("=> Cleaning {} ({})", recipe.label(), tree.display());
            filesystem::remove_dir_all(&tree)?;
        }
        Ok(())
    }

    /// Per-recipe stage completion, in registration order
    pub fn status(&self) -> Vec<RecipeStatus> {
        self.registry
            .iter()
            .map(|r| r.status(&self.config))
            .collect()
    }
}
