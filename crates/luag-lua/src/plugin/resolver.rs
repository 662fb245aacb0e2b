//! Version-compatible plugin search.

use super::{PluginHandle, PluginLoader};
use crate::error::PluginError;
use luag_runtime::Version;
use mlua::Lua;
use std::env::consts::DLL_SUFFIX;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Number of minors probed when no limit is configured.
pub const DEFAULT_MAX_PROBE: u32 = 100;

/// File name of the core library for `version`, e.g. `luag-lib-1.4.so`.
#[must_use]
pub fn library_file_name(version: Version) -> String {
    format!("luag-lib-{}.{}{DLL_SUFFIX}", version.major, version.minor)
}

/// File name of the editor library.
#[must_use]
pub fn editor_file_name() -> String {
    format!("luag-lib-editor{DLL_SUFFIX}")
}

/// Finds the closest installed library serving `requested`.
///
/// Probes minors `requested.minor .. requested.minor + max_probe` of the
/// same major and returns the first that exists on disk.
#[must_use]
pub fn find_core(dir: &Path, requested: Version, max_probe: u32) -> Option<(Version, PathBuf)> {
    (0..max_probe)
        .map_while(|delta| requested.minor.checked_add(delta))
        .map(|minor| Version::new(requested.major, minor))
        .map(|candidate| (candidate, dir.join(library_file_name(candidate))))
        .find(|(_, path)| path.is_file())
}

/// Resolves and activates plugins from one library directory.
#[derive(Clone)]
pub struct PluginResolver {
    dir: PathBuf,
    max_probe: u32,
    loader: Arc<dyn PluginLoader>,
}

impl std::fmt::Debug for PluginResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginResolver")
            .field("dir", &self.dir)
            .field("max_probe", &self.max_probe)
            .finish_non_exhaustive()
    }
}

impl PluginResolver {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, loader: Arc<dyn PluginLoader>) -> Self {
        Self {
            dir: dir.into(),
            max_probe: DEFAULT_MAX_PROBE,
            loader,
        }
    }

    /// Sets how many minors are probed. Zero is clamped to one.
    #[must_use]
    pub fn with_max_probe(mut self, max_probe: u32) -> Self {
        self.max_probe = max_probe.max(1);
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn max_probe(&self) -> u32 {
        self.max_probe
    }

    /// The library that would serve `requested`, without loading it.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Incompatible`] if none is installed.
    pub fn find_core(&self, requested: Version) -> Result<(Version, PathBuf), PluginError> {
        find_core(&self.dir, requested, self.max_probe)
            .ok_or_else(|| PluginError::incompatible(requested))
    }

    /// Finds, opens and activates the core library for `requested`.
    ///
    /// # Errors
    ///
    /// - [`PluginError::Incompatible`] if no library serves the version
    /// - any open or activation error from the loader
    pub fn resolve(&self, lua: &Lua, requested: Version) -> Result<PluginHandle, PluginError> {
        let (version, path) = self.find_core(requested)?;
        tracing::debug!(
            requested = %requested,
            resolved = %version,
            path = %path.display(),
            "Core library found"
        );
        let plugin = self.loader.open(&path)?;
        PluginHandle::activate(plugin, lua, path, Some(version))
    }

    /// Opens and activates the editor library.
    ///
    /// # Errors
    ///
    /// - [`PluginError::EditorMissing`] if it is not installed
    /// - any open or activation error from the loader
    pub fn resolve_editor(&self, lua: &Lua) -> Result<PluginHandle, PluginError> {
        let path = self.dir.join(editor_file_name());
        if !path.is_file() {
            return Err(PluginError::EditorMissing);
        }
        let plugin = self.loader.open(&path)?;
        PluginHandle::activate(plugin, lua, path, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::Plugin;
    use proptest::prelude::*;
    use std::fs;

    struct Inert;

    impl Plugin for Inert {
        fn activate(&mut self, _lua: &Lua) -> Result<(), PluginError> {
            Ok(())
        }

        fn deactivate(&mut self) -> Result<(), PluginError> {
            Ok(())
        }
    }

    struct InertLoader;

    impl PluginLoader for InertLoader {
        fn open(&self, _path: &Path) -> Result<Box<dyn Plugin>, PluginError> {
            Ok(Box::new(Inert))
        }
    }

    fn install(dir: &Path, versions: &[(u32, u32)]) {
        for &(major, minor) in versions {
            fs::write(dir.join(library_file_name(Version::new(major, minor))), b"")
                .expect("write fake library");
        }
    }

    #[test]
    fn closest_minor_at_or_above_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        install(dir.path(), &[(1, 2), (1, 4), (1, 5)]);

        let found = find_core(dir.path(), Version::new(1, 3), 10).expect("found");
        assert_eq!(found.0, Version::new(1, 4));
        assert_eq!(found.1, dir.path().join(library_file_name(Version::new(1, 4))));
    }

    #[test]
    fn exact_match_is_preferred() {
        let dir = tempfile::tempdir().expect("tempdir");
        install(dir.path(), &[(1, 3), (1, 4)]);
        let found = find_core(dir.path(), Version::new(1, 3), 10).expect("found");
        assert_eq!(found.0, Version::new(1, 3));
    }

    #[test]
    fn never_crosses_major() {
        let dir = tempfile::tempdir().expect("tempdir");
        install(dir.path(), &[(2, 0), (2, 3), (0, 9)]);
        assert!(find_core(dir.path(), Version::new(1, 0), 100).is_none());
    }

    #[test]
    fn probe_window_is_bounded() {
        let dir = tempfile::tempdir().expect("tempdir");
        install(dir.path(), &[(1, 13)]);
        assert!(find_core(dir.path(), Version::new(1, 3), 10).is_none());
        assert!(find_core(dir.path(), Version::new(1, 3), 11).is_some());
    }

    #[test]
    fn high_minor_does_not_overflow() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(find_core(dir.path(), Version::new(1, u32::MAX - 1), 10).is_none());
    }

    #[test]
    fn resolver_reports_incompatible_version() {
        let dir = tempfile::tempdir().expect("tempdir");
        install(dir.path(), &[(1, 1)]);
        let resolver = PluginResolver::new(dir.path(), Arc::new(InertLoader));
        let lua = Lua::new();

        let err = resolver
            .resolve(&lua, Version::new(1, 3))
            .expect_err("1.1 cannot serve 1.3");
        assert!(matches!(err, PluginError::Incompatible { major: 1, minor: 3 }));
    }

    #[test]
    fn editor_is_loaded_by_fixed_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let resolver = PluginResolver::new(dir.path(), Arc::new(InertLoader));
        let lua = Lua::new();

        let err = resolver.resolve_editor(&lua).expect_err("not installed");
        assert!(matches!(err, PluginError::EditorMissing));

        fs::write(dir.path().join(editor_file_name()), b"").expect("write editor");
        let handle = resolver.resolve_editor(&lua).expect("editor");
        assert_eq!(handle.version(), None);
    }

    #[test]
    fn max_probe_zero_is_clamped() {
        let resolver = PluginResolver::new("/nonexistent", Arc::new(InertLoader)).with_max_probe(0);
        assert_eq!(resolver.max_probe(), 1);
    }

    proptest! {
        #[test]
        fn resolution_is_monotonic(
            major in 0u32..4,
            minor in 0u32..20,
            k in 0u32..10,
            noise in proptest::collection::vec(0u32..40, 0..6),
        ) {
            let dir = tempfile::tempdir().expect("tempdir");
            // Libraries below the requested minor, in other majors, and
            // above m+k never shadow the expected one.
            let mut installed = vec![(major, minor + k), (major + 1, minor)];
            for n in noise {
                if n < minor || n > minor + k {
                    installed.push((major, n));
                }
            }
            install(dir.path(), &installed);

            let found = find_core(dir.path(), Version::new(major, minor), 10);
            prop_assert_eq!(found.map(|(v, _)| v), Some(Version::new(major, minor + k)));
        }
    }
}
