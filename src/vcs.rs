//! Narrow view of a version-controlled tree.
//!
//! `ognibuild` never needs the full surface of a VCS library: it reads a handful
//! of files, occasionally writes one back while applying a fixer, and exports a
//! clean copy of the tree for sandboxed builds. [`VcsTree`] is that surface,
//! independent of which VCS (or none) backs it.

use std::io;
use std::path::Path;

/// Operations `ognibuild` needs against a version-controlled (or plain) source tree.
pub trait VcsTree: std::fmt::Debug {
    /// Read the full contents of `path` relative to the tree root.
    fn get_file_text(&self, path: &Path) -> Result<Vec<u8>, io::Error>;

    /// Write `data` to `path`, without requiring the write to be atomic.
    fn put_file_bytes_non_atomic(&self, path: &Path, data: &[u8]) -> Result<(), io::Error>;

    /// Whether `path` exists in the tree.
    fn has_filename(&self, path: &Path) -> bool;

    /// Commit any pending changes, returning the new revision id, if the backend
    /// tracks history. Trees with no history (e.g. a plain directory) are no-ops.
    fn commit(&self, message: &str) -> Result<Option<String>, io::Error>;

    /// Export the tree (optionally rooted at `subpath`) to `to_dir` on disk.
    fn export_to(&self, to_dir: &Path, subpath: &Path) -> Result<(), io::Error>;

    /// The current revision id, if the backend tracks history.
    fn last_revision(&self) -> Option<String>;

    /// Discard any uncommitted changes. No-op for trees with no working copy state.
    fn revert(&self) -> Result<(), io::Error>;

    /// The root directory of the tree on disk.
    fn basedir(&self) -> &Path;
}

/// A [`VcsTree`] over a plain directory with no version control at all.
///
/// `commit`, `last_revision` and `revert` are all no-ops: there is no history to
/// manage. This is what callers reach for when a project wasn't checked out from
/// a VCS in the first place.
#[derive(Debug, Clone)]
pub struct LocalVcsTree {
    basedir: std::path::PathBuf,
}

impl LocalVcsTree {
    /// Wrap `basedir` as an un-versioned tree.
    pub fn new(basedir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            basedir: basedir.into(),
        }
    }
}

impl VcsTree for LocalVcsTree {
    fn get_file_text(&self, path: &Path) -> Result<Vec<u8>, io::Error> {
        std::fs::read(self.basedir.join(path))
    }

    fn put_file_bytes_non_atomic(&self, path: &Path, data: &[u8]) -> Result<(), io::Error> {
        let full = self.basedir.join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(full, data)
    }

    fn has_filename(&self, path: &Path) -> bool {
        self.basedir.join(path).exists()
    }

    fn commit(&self, _message: &str) -> Result<Option<String>, io::Error> {
        Ok(None)
    }

    fn export_to(&self, to_dir: &Path, subpath: &Path) -> Result<(), io::Error> {
        let source = self.basedir.join(subpath);
        let options = fs_extra::dir::CopyOptions::new().content_only(true);
        std::fs::create_dir_all(to_dir)?;
        fs_extra::dir::copy(&source, to_dir, &options)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(())
    }

    fn last_revision(&self) -> Option<String> {
        None
    }

    fn revert(&self) -> Result<(), io::Error> {
        Ok(())
    }

    fn basedir(&self) -> &Path {
        &self.basedir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_tree_roundtrips_file_contents() {
        let td = tempfile::tempdir().unwrap();
        let tree = LocalVcsTree::new(td.path());
        tree.put_file_bytes_non_atomic(Path::new("foo.txt"), b"hello")
            .unwrap();
        assert!(tree.has_filename(Path::new("foo.txt")));
        assert_eq!(tree.get_file_text(Path::new("foo.txt")).unwrap(), b"hello");
        assert!(tree.commit("msg").unwrap().is_none());
        assert!(tree.last_revision().is_none());
    }

    #[test]
    fn local_tree_exports_directory_contents() {
        let src = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("a.txt"), b"a").unwrap();
        let tree = LocalVcsTree::new(src.path());
        let dst = tempfile::tempdir().unwrap();
        let export_dir = dst.path().join("export");
        tree.export_to(&export_dir, Path::new("")).unwrap();
        assert_eq!(std::fs::read(export_dir.join("a.txt")).unwrap(), b"a");
    }
}
