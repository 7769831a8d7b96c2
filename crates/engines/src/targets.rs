//! Target list defaulting and deduplication.

use crate::platform::{HostPlatform, ResolvedPlatform, resolve};
use clientgen_core::{BinaryTarget, Result};
use std::collections::HashSet;
use tracing::debug;

/// Ordered, duplicate-free set of resolved platforms.
///
/// One set is built per resolution pass and every insertion goes through it,
/// so duplicates are detected across the whole target list.
#[derive(Debug, Default, Clone)]
pub struct TargetSet {
    seen: HashSet<String>,
    platforms: Vec<ResolvedPlatform>,
}

impl TargetSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a platform. Returns `false` if one with the same name was already present.
    pub fn insert(&mut self, platform: ResolvedPlatform) -> bool {
        if self.seen.insert(platform.name().to_string()) {
            self.platforms.push(platform);
            true
        } else {
            false
        }
    }

    /// Whether a platform with this name has been inserted.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    /// Number of distinct platforms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    /// Platforms in first-seen order.
    #[must_use]
    pub fn into_vec(self) -> Vec<ResolvedPlatform> {
        self.platforms
    }
}

/// Append `native` when no requested target can run locally.
///
/// That is the case when the list is empty or every entry is a darwin or
/// windows target.
#[must_use]
pub fn with_native_default(targets: &[BinaryTarget]) -> Vec<BinaryTarget> {
    let mut targets = targets.to_vec();
    if targets.iter().all(BinaryTarget::is_non_linux_os) {
        targets.push(BinaryTarget::native());
    }
    targets
}

/// Default, resolve and deduplicate a target list.
///
/// The result is never empty and contains no two platforms with the same name.
///
/// # Errors
///
/// Returns a configuration error if any target is unknown.
pub fn resolve_targets(
    targets: &[BinaryTarget],
    host: &HostPlatform,
) -> Result<Vec<ResolvedPlatform>> {
    let requested = with_native_default(targets);
    debug!(?requested, "final binary targets");

    let mut set = TargetSet::new();
    for target in &requested {
        let platform = resolve(target, host)?;
        let name = platform.name().to_string();
        if !set.insert(platform) {
            debug!(%target, platform = %name, "skipping duplicate binary target");
        }
    }

    Ok(set.into_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, Os};

    fn targets(names: &[&str]) -> Vec<BinaryTarget> {
        names.iter().copied().map(BinaryTarget::new).collect()
    }

    fn names(platforms: &[ResolvedPlatform]) -> Vec<&str> {
        platforms.iter().map(ResolvedPlatform::name).collect()
    }

    fn linux() -> HostPlatform {
        HostPlatform::new(Os::Linux, Arch::X64)
    }

    #[test]
    fn test_empty_list_gets_native() {
        let resolved = resolve_targets(&[], &linux()).unwrap();
        assert_eq!(names(&resolved), vec!["linux-static-x64"]);
    }

    #[test]
    fn test_darwin_and_windows_get_native() {
        let resolved = resolve_targets(&targets(&["darwin", "windows"]), &linux()).unwrap();
        assert_eq!(names(&resolved), vec!["darwin", "windows", "linux-static-x64"]);
    }

    #[test]
    fn test_linux_target_suppresses_native_default() {
        let defaulted = with_native_default(&targets(&["darwin", "debian-openssl-3.0.x"]));
        assert!(!defaulted.iter().any(BinaryTarget::is_native));
    }

    #[test]
    fn test_explicit_native_is_not_added_twice() {
        let defaulted = with_native_default(&targets(&["native"]));
        assert_eq!(defaulted, targets(&["native"]));
    }

    #[test]
    fn test_duplicates_are_removed_across_targets() {
        let resolved = resolve_targets(
            &targets(&["native", "linux", "native", "linux-musl", "darwin", "darwin"]),
            &linux(),
        )
        .unwrap();
        assert_eq!(names(&resolved), vec!["linux-static-x64", "darwin"]);
    }

    #[test]
    fn test_unknown_target_fails_resolution() {
        assert!(resolve_targets(&targets(&["plan9"]), &linux()).is_err());
    }

    #[test]
    fn test_target_set_tracks_names() {
        let mut set = TargetSet::new();
        assert!(set.is_empty());
        assert!(set.insert(ResolvedPlatform::from_name("darwin").unwrap()));
        assert!(!set.insert(ResolvedPlatform::from_name("darwin").unwrap()));
        assert!(set.contains("darwin"));
        assert_eq!(set.len(), 1);
    }
}
