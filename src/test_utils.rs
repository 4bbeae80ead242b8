//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    /// Generate a valid port name (lowercase alphanumeric with hyphens)
    pub fn port_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,20}[a-z0-9]?".prop_filter("Name must not be empty", |s| !s.is_empty())
    }

    /// Generate a dotted version string
    pub fn version() -> impl Strategy<Value = String> {
        (0u32..100, 0u32..100, 0u32..100)
            .prop_map(|(major, minor, patch)| format!("{major}.{minor}.{patch}"))
    }

    /// Generate a supported archive filename
    pub fn archive_filename() -> impl Strategy<Value = String> {
        let suffix = prop_oneof![
            Just("tar.gz".to_string()),
            Just("tgz".to_string()),
            Just("tar.bz2".to_string()),
            Just("tbz2".to_string()),
        ];
        (port_name(), version(), suffix)
            .prop_map(|(name, version, suffix)| format!("{name}-{version}.{suffix}"))
    }

    /// Generate a source location prefix, with and without trailing slash
    pub fn source_url() -> impl Strategy<Value = String> {
        ("[a-z]{3,10}", "[a-z]{2,5}", proptest::bool::ANY).prop_map(|(domain, tld, slash)| {
            if slash {
                format!("http://{domain}.{tld}/pub/")
            } else {
                format!("http://{domain}.{tld}/pub")
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use crate::infra::fetch::ArchiveKind;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_port_name_generator(name in port_name()) {
            prop_assert!(!name.is_empty());
            prop_assert!(name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        }

        #[test]
        fn test_archive_filename_generator(filename in archive_filename()) {
            prop_assert!(ArchiveKind::from_filename(&filename).is_some());
        }
    }
}
