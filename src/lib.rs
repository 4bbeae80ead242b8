//! Portsmith - ports-style source build orchestrator
//!
//! Given a declarative catalogue of components (name, version, archive,
//! dependencies, optional patch), portsmith fetches, extracts, patches,
//! configures, compiles, and installs each one into a common prefix, in
//! dependency order, persisting per-stage progress so repeated runs are
//! incremental.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Business logic: recipes, strategies, resolution, orchestration
//! - [`infra`] - Infrastructure layer (process execution, fetching, filesystem)
//! - [`config`] - Configuration and defaults
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
