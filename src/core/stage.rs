//! Lifecycle stages and persisted completion markers
//!
//! Stage completion survives process death as marker files under each build
//! path. Presence means done; the timestamp payload is informational and
//! never parsed. Extraction is not a tracked stage: the build path existing
//! is its marker.

use std::fmt;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::MarkerError;

/// One unit of idempotent, dependency-gated lifecycle work.
///
/// Order is Patch (optional) -> Configure -> Build -> Install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Patch,
    Configure,
    Build,
    Install,
}

impl Stage {
    /// All stages in lifecycle order
    pub const ALL: [Stage; 4] = [Stage::Patch, Stage::Configure, Stage::Build, Stage::Install];

    /// Marker name component ("patched", "configured", ...)
    pub fn marker(self) -> &'static str {
        match self {
            Self::Patch => "patched",
            Self::Configure => "configured",
            Self::Build => "built",
            Self::Install => "installed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self {
            Self::Patch => "patch",
            Self::Configure => "configure",
            Self::Build => "build",
            Self::Install => "install",
        };
        write!(f, "{action}")
    }
}

/// Persisted per-stage completion flags.
///
/// The filesystem implementation below is the on-disk contract existing
/// build trees rely on; tests or future backends can substitute their own.
pub trait MarkerStore: fmt::Debug + Send + Sync {
    /// True iff the marker exists and is readable
    fn is_done(&self, build_path: &Path, marker: &str) -> bool;

    /// `ok = true` writes the marker; `ok = false` removes it (idempotent)
    fn set_done(&self, build_path: &Path, marker: &str, ok: bool) -> Result<(), MarkerError>;
}

/// Marker files under the build path (`.configured`, `python.built`, ...)
#[derive(Debug, Clone, Copy, Default)]
pub struct FileMarkerStore;

impl MarkerStore for FileMarkerStore {
    fn is_done(&self, build_path: &Path, marker: &str) -> bool {
        std::fs::File::open(build_path.join(marker)).is_ok()
    }

    fn set_done(&self, build_path: &Path, marker: &str, ok: bool) -> Result<(), MarkerError> {
        let path = build_path.join(marker);
        if ok {
            let stamp = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            std::fs::write(&path, format!("{stamp}\n")).map_err(|e| MarkerError::Write {
                path,
                error: e.to_string(),
            })
        } else {
            match std::fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(MarkerError::Remove {
                    path,
                    error: e.to_string(),
                }),
            }
        }
    }
}
