//! Default configuration values

/// Manifest file name looked up in the working directory
pub const MANIFEST_FILE: &str = "portsmith.toml";

/// Default install prefix
pub const DEFAULT_PREFIX: &str = "/opt/portsmith";

/// Default build root, relative to the manifest directory
pub const DEFAULT_BUILD_ROOT: &str = "buildroot";

/// Default distfiles cache, relative to the manifest directory
pub const DEFAULT_DISTFILES: &str = "distfiles";

/// Selector meaning "every registered port"
pub const ALL_PORTS: &str = "all";

/// Default parallelism flags passed to every make invocation
pub fn make_flags() -> String {
    format!("-j{}", num_cpus::get())
}
