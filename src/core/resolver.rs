//! Lazy dependency resolution
//!
//! There is no precomputed graph: before acting, each stage method asks the
//! resolver for its direct dependencies, checking each against the same
//! stage's predicate and driving unsatisfied ones through their lifecycle,
//! which recurses back here for their own dependencies in turn. Full
//! transitive ordering falls out of the recursion. The context tracks the
//! in-progress (recipe, stage) chain and turns a cyclic manifest into a
//! typed error instead of unbounded recursion.

use tracing::error;

use crate::config::Config;
use crate::core::builder::Registry;
use crate::core::recipe::Recipe;
use crate::core::stage::Stage;
use crate::error::StageError;
use crate::infra::exec::Executor;

/// Shared state threaded through one build run.
pub struct BuildContext<'a> {
    config: &'a Config,
    executor: &'a Executor,
    registry: &'a Registry,
    in_progress: Vec<(String, Stage)>,
}

impl<'a> BuildContext<'a> {
    pub fn new(config: &'a Config, executor: &'a Executor, registry: &'a Registry) -> Self {
        Self {
            config,
            executor,
            registry,
            in_progress: Vec::new(),
        }
    }

    pub fn config(&self) -> &'a Config {
        self.config
    }

    pub fn executor(&self) -> &'a Executor {
        self.executor
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Record that `name` is being driven to `stage`, failing on re-entry
    fn enter(&mut self, name: &str, stage: Stage) -> Result<(), StageError> {
        if self
            .in_progress
            .iter()
            .any(|(n, s)| n == name && *s == stage)
        {
            let mut chain: Vec<String> = self
                .in_progress
                .iter()
                .map(|(n, s)| format!("{n} ({s})"))
                .collect();
            chain.push(format!("{name} ({stage})"));
            return Err(StageError::DependencyCycle { chain });
        }
        self.in_progress.push((name.to_string(), stage));
        Ok(())
    }

    fn leave(&mut self) {
        self.in_progress.pop();
    }
}

/// Make every direct dependency of `recipe` usable for `stage`.
///
/// A dependency whose own `stage` predicate already holds is skipped; an
/// unsatisfied one is driven through its full lifecycle (its stage methods
/// recurse through here for its own dependencies), so a dependent never
/// runs a command against a half-built dependency. The first failing
/// dependency aborts resolution, naming the blocker.
pub fn ensure_stage(
    cx: &mut BuildContext,
    recipe: &Recipe,
    stage: Stage,
) -> Result<(), StageError> {
    for dep_name in recipe.dependencies() {
        let Some(dep) = cx.registry().lookup(dep_name) else {
            error!("Dependency {dep_name} not found. Check your manifest.");
            return Err(StageError::MissingDependency {
                recipe: recipe.label(),
                dependency: dep_name.clone(),
            });
        };
        if dep.stage_done(stage, cx.config()) {
            continue;
        }

        cx.enter(dep_name, stage)?;
        let result = dep.satisfy(cx);
        cx.leave();

        if let Err(err) = result {
            error!(
                "Can't continue with {}: dependency {} failed to {stage}",
                recipe.label(),
                dep.label()
            );
            return Err(StageError::DependencyFailed {
                recipe: recipe.label(),
                dependency: dep.label(),
                stage,
                source: Box::new(err),
            });
        }
    }
    Ok(())
}
