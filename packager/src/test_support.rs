//! Scratch package trees for tests.
//!
//! Available to unit tests and, through the `test-support` feature, to the
//! behaviour suites under `tests/`.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Metadata for the reference `foo-1.0-1-x86_64` package.
pub const SAMPLE_METADATA: &str =
    r#"{"name":"foo","version":"1.0","release":"1","architecture":"x86_64"}"#;

/// Manifest satisfying the `manifest.json` rule.
pub const SAMPLE_MANIFEST: &str = r#"{"files":["data/usr/bin/foo"],"scripts":["postinstall"]}"#;

/// Install/remove hooks every valid package carries.
pub const SCRIPT_PATHS: [&str; 4] = [
    "scripts/preinstall",
    "scripts/postinstall",
    "scripts/preremove",
    "scripts/postremove",
];

/// A package source tree rooted in a temporary directory.
///
/// The directory is removed when the value is dropped.
#[derive(Debug)]
pub struct PackageTree {
    dir: TempDir,
}

impl PackageTree {
    /// Create an empty tree.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir creation succeeds"),
        }
    }

    /// Create a tree satisfying every APG rule, with a small payload.
    ///
    /// # Panics
    ///
    /// Panics if any file cannot be written.
    #[must_use]
    pub fn valid() -> Self {
        let tree = Self::empty();
        tree.write_file("metadata.json", SAMPLE_METADATA);
        tree.write_file("manifest.json", SAMPLE_MANIFEST);
        tree.write_file("data/usr/bin/foo", "#!/bin/sh\necho foo\n");
        tree.write_file("data/usr/share/doc/foo/README", "foo docs\n");
        for script in SCRIPT_PATHS {
            tree.write_script(script);
        }
        tree
    }

    /// Return the tree root.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Return the absolute path of `relative` inside the tree.
    #[must_use]
    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write `contents` to `relative`, creating parent directories.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write_file(&self, relative: &str, contents: impl AsRef<[u8]>) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directories");
        }
        fs::write(&path, contents).expect("write tree file");
    }

    /// Write an executable shell script to `relative`.
    ///
    /// # Panics
    ///
    /// Panics if the script cannot be written or its mode changed.
    pub fn write_script(&self, relative: &str) {
        self.write_file(relative, "#!/bin/sh\nexit 0\n");
        self.set_mode(relative, 0o755);
    }

    /// Create `relative` as a directory.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created.
    pub fn create_dir(&self, relative: &str) {
        fs::create_dir_all(self.path(relative)).expect("create directory");
    }

    /// Remove `relative`, whether it is a file or a directory.
    ///
    /// # Panics
    ///
    /// Panics if the entry cannot be removed.
    pub fn remove(&self, relative: &str) {
        let path = self.path(relative);
        if path.is_dir() {
            fs::remove_dir_all(&path).expect("remove directory");
        } else {
            fs::remove_file(&path).expect("remove file");
        }
    }

    /// Set the Unix permission bits of `relative`.
    ///
    /// # Panics
    ///
    /// Panics if the permissions cannot be changed.
    #[cfg(unix)]
    pub fn set_mode(&self, relative: &str, mode: u32) {
        use std::os::unix::fs::PermissionsExt;

        fs::set_permissions(self.path(relative), fs::Permissions::from_mode(mode))
            .expect("set permissions");
    }

    /// Permission bits are not modelled on this platform.
    #[cfg(not(unix))]
    pub fn set_mode(&self, _relative: &str, _mode: u32) {}
}
