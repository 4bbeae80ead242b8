//! Error types for portsmith
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::stage::Stage;

/// Command execution errors
#[derive(Error, Debug)]
pub enum ExecError {
    /// The shell could not be spawned
    #[error("Failed to spawn `{command}`: {error}")]
    Spawn { command: String, error: String },

    /// Waiting on the child failed
    #[error("Failed to wait on `{command}`: {error}")]
    Wait { command: String, error: String },

    /// The command exited with a non-zero status
    #[error("Command `{command}` exited with code {code}:\n{stderr}")]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },
}

/// Distfile fetch and extraction errors
#[derive(Error, Debug)]
pub enum FetchError {
    /// No source location declared for a missing distfile
    #[error("No sources declared for '{file}' and it is not in the distfiles cache")]
    NoSources { file: String },

    /// Every declared source failed to produce the file
    #[error("All {attempts} sources failed for '{file}'")]
    SourcesExhausted { file: String, attempts: usize },

    /// Archive suffix not recognized at extraction time
    #[error("Unsupported archive format: '{filename}'")]
    UnsupportedArchive { filename: String },

    /// Extraction or retrieval command failed
    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// Stage marker persistence errors
#[derive(Error, Debug)]
pub enum MarkerError {
    /// Marker file could not be written
    #[error("Failed to write marker '{path}': {error}")]
    Write { path: PathBuf, error: String },

    /// Marker file could not be removed
    #[error("Failed to remove marker '{path}': {error}")]
    Remove { path: PathBuf, error: String },
}

/// Build lifecycle errors
#[derive(Error, Debug)]
pub enum StageError {
    /// Build requested before configure completed
    #[error("Can't build '{recipe}': not configured")]
    NotConfigured { recipe: String },

    /// A declared dependency name is not registered
    #[error("Dependency '{dependency}' of '{recipe}' not found. Check your manifest.")]
    MissingDependency { recipe: String, dependency: String },

    /// Recursive resolution re-entered an in-progress (recipe, stage) pair
    #[error("Dependency cycle detected: {}", chain.join(" -> "))]
    DependencyCycle { chain: Vec<String> },

    /// A dependency could not be driven to the requested stage
    #[error("Can't {stage} '{recipe}': dependency '{dependency}' failed")]
    DependencyFailed {
        recipe: String,
        dependency: String,
        stage: Stage,
        #[source]
        source: Box<StageError>,
    },

    /// A stage command failed
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// A distfile or patch could not be fetched or extracted
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A stage marker could not be updated
    #[error(transparent)]
    Marker(#[from] MarkerError),
}

/// Manifest loading and validation errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file could not be read
    #[error("Failed to read manifest '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Manifest is not valid TOML
    #[error("Failed to parse manifest: {source}")]
    Parse {
        #[from]
        source: toml::de::Error,
    },

    /// A port entry is missing a required value
    #[error("Port entry {index} is missing a {field}")]
    MissingField { index: usize, field: String },

    /// A port's archive filename has an unsupported suffix
    #[error("Port '{port}' uses unsupported archive format '{filename}'")]
    UnsupportedArchive { port: String, filename: String },

    /// A port declares a dependency on a name no port provides
    #[error("Port '{port}' depends on unknown port '{dependency}'")]
    UnknownDependency { port: String, dependency: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Build root or distfiles directory could not be created
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },
}

/// Top-level portsmith error type
#[derive(Error, Debug)]
pub enum PortsmithError {
    /// Stage lifecycle error
    #[error(transparent)]
    Stage(#[from] StageError),

    /// Fetch error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Execution error
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// Manifest error
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Marker error
    #[error(transparent)]
    Marker(#[from] MarkerError),

    /// Requested build target is not registered
    #[error("Port '{name}' is not registered. Check your manifest.")]
    UnknownTarget { name: String },

    /// IO error
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}
