//! Context for working with Debian packages.
//!
//! This module provides a context for operations on Debian packages,
//! including editing, committing changes, and managing dependencies.

use crate::dependencies::debian::DebianDependency;
use crate::vcs::VcsTree;
pub use buildlog_consultant::sbuild::Phase;
use debian_control::lossless::relations::{Entry, Relations};
use std::path::{Path, PathBuf};

/// Errors that can occur when working with Debian packages.
#[derive(Debug)]
pub enum Error {
    /// Circular dependency detected.
    CircularDependency(String),
    /// No source stanza found in debian/control.
    MissingSource,
    /// I/O error when accessing files.
    IoError(std::io::Error),
    /// Invalid field value in control file.
    InvalidField(String, String),
    /// A file couldn't be parsed in its expected format.
    Parse(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::CircularDependency(pkg) => write!(f, "Circular dependency on {}", pkg),
            Error::MissingSource => write!(f, "No source stanza"),
            Error::IoError(e) => write!(f, "{}", e),
            Error::InvalidField(field, e) => write!(f, "Invalid field {}: {}", field, e),
            Error::Parse(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

/// A parsed view of a file in the packaging tree.
///
/// Holds the typed value (a `Control`, `Deb822` or `Makefile`) alongside the
/// text it was parsed from, so [`FileEditor::commit`] can tell whether
/// anything actually changed before writing the file back.
pub struct FileEditor<'a, T> {
    tree: &'a dyn VcsTree,
    path: PathBuf,
    orig_text: String,
    value: T,
}

impl<'a, T> std::ops::Deref for FileEditor<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<'a, T> std::ops::DerefMut for FileEditor<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<'a, T: ToString> FileEditor<'a, T> {
    /// Write the current value back to the tree if it differs from what was read.
    ///
    /// Returns whether anything changed.
    pub fn commit(&self) -> Result<bool, Error> {
        let new_text = self.value.to_string();
        if new_text == self.orig_text {
            return Ok(false);
        }
        self.tree.put_file_bytes_non_atomic(&self.path, new_text.as_bytes())?;
        Ok(true)
    }
}

/// Add `entry` to `rels`, unless a relation on one of the same package names
/// is already present.
fn ensure_relation(rels: &mut Relations, entry: Entry) {
    let names: std::collections::HashSet<String> =
        entry.relations().map(|r| r.name()).collect();
    let already_present = rels
        .entries()
        .any(|e| e.relations().any(|r| names.contains(&r.name())));
    if !already_present {
        let mut entries: Vec<Entry> = rels.entries().collect();
        entries.push(entry);
        *rels = Relations::from(entries);
    }
}

/// Context for working with Debian packages.
///
/// This structure provides methods for modifying Debian package files,
/// committing changes, and managing dependencies.
pub struct DebianPackagingContext {
    /// Working tree containing the package source.
    pub tree: Box<dyn VcsTree>,
    /// Path within the tree where the package is located.
    pub subpath: PathBuf,
    /// Committer information (name, email).
    pub committer: (String, String),
    /// Whether to update the changelog during commits.
    pub update_changelog: bool,
}

impl DebianPackagingContext {
    /// Create a new Debian packaging context.
    ///
    /// # Arguments
    /// * `tree` - Working tree containing the package source
    /// * `subpath` - Path within the tree where the package is located
    /// * `committer` - Optional committer information (name, email)
    /// * `update_changelog` - Whether to update the changelog during commits
    ///
    /// # Returns
    /// A new DebianPackagingContext instance
    pub fn new(
        tree: Box<dyn VcsTree>,
        subpath: &Path,
        committer: Option<(String, String)>,
        update_changelog: bool,
    ) -> Self {
        Self {
            tree,
            subpath: subpath.to_path_buf(),
            committer: committer.unwrap_or_else(|| debian_changelog::get_maintainer().unwrap()),
            update_changelog,
        }
    }

    /// Check if a file exists in the package tree.
    pub fn has_filename(&self, path: &Path) -> bool {
        self.tree.has_filename(&self.subpath.join(path))
    }

    /// Get the absolute path of a file in the package tree.
    pub fn abspath(&self, path: &Path) -> PathBuf {
        self.tree.basedir().join(&self.subpath).join(path)
    }

    fn edit<T>(&self, relpath: &Path) -> Result<FileEditor<'_, T>, Error>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Debug,
    {
        let path = self.subpath.join(relpath);
        let data = self.tree.get_file_text(&path)?;
        let orig_text =
            String::from_utf8(data).map_err(|e| Error::Parse(format!("{}: {}", relpath.display(), e)))?;
        let value = orig_text
            .parse::<T>()
            .map_err(|e| Error::Parse(format!("{}: {:?}", relpath.display(), e)))?;
        Ok(FileEditor {
            tree: self.tree.as_ref(),
            path,
            orig_text,
            value,
        })
    }

    /// Commit changes to the package tree.
    ///
    /// # Arguments
    /// * `summary` - Commit message summary
    /// * `update_changelog` - Whether to update the changelog (overrides context setting)
    ///
    /// # Returns
    /// Ok(true) if changes were committed, Error otherwise
    pub fn commit(&self, summary: &str, update_changelog: Option<bool>) -> Result<bool, Error> {
        let update_changelog = update_changelog.unwrap_or(self.update_changelog);

        if update_changelog {
            let path = self.subpath.join("debian/changelog");
            let data = self.tree.get_file_text(&path)?;
            let mut cl = debian_changelog::ChangeLog::read_relaxed(&data[..])
                .map_err(|e| Error::Parse(format!("debian/changelog: {:?}", e)))?;
            cl.auto_add_change(&[summary], self.committer.clone(), None, None);
            self.tree.put_file_bytes_non_atomic(&path, cl.to_string().as_bytes())?;
        }

        self.tree.commit(summary)?;
        Ok(true)
    }

    /// Add a dependency to the package.
    ///
    /// # Arguments
    /// * `phase` - Build phase for the dependency
    /// * `requirement` - Debian dependency to add
    ///
    /// # Returns
    /// Ok(true) if dependency was added, Ok(false) if already present, Error otherwise
    pub fn add_dependency(
        &self,
        phase: &Phase,
        requirement: &DebianDependency,
    ) -> Result<bool, Error> {
        match phase {
            Phase::AutoPkgTest(n) => self.add_test_dependency(n, requirement),
            Phase::Build => self.add_build_dependency(requirement),
            Phase::BuildEnv => {
                // TODO(jelmer): Actually, we probably just want to install it on the host system?
                log::warn!("Unknown phase {:?}", phase);
                Ok(false)
            }
            Phase::CreateSession => {
                log::warn!("Unknown phase {:?}", phase);
                Ok(false)
            }
        }
    }

    /// Create an editor for the debian/control file.
    pub fn edit_control(&self) -> Result<FileEditor<'_, debian_control::lossless::Control>, Error> {
        self.edit(Path::new("debian/control"))
    }

    fn add_build_dependency(&self, requirement: &DebianDependency) -> Result<bool, Error> {
        assert!(requirement.iter().next().is_some());
        let control = self.edit_control()?;

        for binary in control.binaries() {
            let name = binary.name().unwrap_or_default();
            if requirement.touches_package(&name) {
                return Err(Error::CircularDependency(name));
            }
        }

        let mut source = control.source().ok_or(Error::MissingSource)?;
        let mut build_depends = source.build_depends().unwrap_or_else(Relations::new);
        for rel in requirement.iter() {
            ensure_relation(&mut build_depends, rel);
        }
        source.set_build_depends(&build_depends);

        let desc = requirement.relation_string();

        if !control.commit()? {
            log::info!("Giving up; build dependency {} was already present.", desc);
            return Ok(false);
        }

        log::info!("Adding build dependency: {}", desc);
        self.commit(&format!("Add missing build dependency on {}.", desc), None)?;
        Ok(true)
    }

    /// Create an editor for the debian/tests/control file.
    pub fn edit_tests_control(&self) -> Result<FileEditor<'_, deb822_lossless::Deb822>, Error> {
        self.edit(Path::new("debian/tests/control"))
    }

    /// Create an editor for the debian/rules file.
    pub fn edit_rules(&self) -> Result<FileEditor<'_, makefile_lossless::Makefile>, Error> {
        self.edit(Path::new("debian/rules"))
    }

    fn add_test_dependency(
        &self,
        testname: &str,
        requirement: &DebianDependency,
    ) -> Result<bool, Error> {
        // TODO(jelmer): If requirement is for one of our binary packages but "@" is already
        // present then don't do anything.

        let editor = self.edit_tests_control()?;

        let mut command_counter = 1;
        for para in editor.paragraphs() {
            let name = para.get("Tests").unwrap_or_else(|| {
                let name = format!("command{}", command_counter);
                command_counter += 1;
                name
            });

            if name != testname {
                continue;
            }

            for rel in requirement.iter() {
                let depends = para.get("Depends").unwrap_or_default();
                let mut rels: Relations = depends.parse().map_err(|e| {
                    Error::InvalidField(format!("Test Depends for {}", testname), e)
                })?;
                ensure_relation(&mut rels, rel);
                para.insert("Depends", &rels.to_string());
            }
        }

        let desc = requirement.relation_string();

        if !editor.commit()? {
            log::info!(
                "Giving up; dependency {} for test {} was already present.",
                desc,
                testname,
            );
            return Ok(false);
        }

        log::info!("Adding dependency to test {}: {}", testname, desc);
        self.commit(
            &format!("Add missing dependency for test {} on {}.", testname, desc),
            None,
        )?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::LocalVcsTree;

    fn setup(path: &Path) -> DebianPackagingContext {
        std::fs::create_dir_all(path.join("debian")).unwrap();
        std::fs::write(
            path.join("debian/control"),
            r###"Source: blah
Build-Depends: libc6

Package: python-blah
Depends: ${python3:Depends}
Description: A python package
 Foo
"###,
        )
        .unwrap();
        std::fs::write(
            path.join("debian/changelog"),
            r###"blah (0.1) UNRELEASED; urgency=medium

  * Initial release. (Closes: #XXXXXX)

 -- Jelmer Vernooĳ <jelmer@debian.org>  Sat, 04 Apr 2020 14:12:13 +0000
"###,
        )
        .unwrap();

        DebianPackagingContext::new(
            Box::new(LocalVcsTree::new(path)),
            Path::new(""),
            Some(("ognibuild".to_owned(), "<ognibuild@jelmer.uk>".to_owned())),
            false,
        )
    }

    #[test]
    fn test_already_present() {
        let td = tempfile::tempdir().unwrap();
        let context = setup(td.path());
        let dep = DebianDependency::simple("libc6");
        assert!(!context.add_build_dependency(&dep).unwrap());
    }

    #[test]
    fn test_basic() {
        let td = tempfile::tempdir().unwrap();
        let context = setup(td.path());
        let dep = DebianDependency::simple("foo");
        assert!(context.add_build_dependency(&dep).unwrap());
        let control = std::fs::read_to_string(td.path().join("debian/control")).unwrap();
        assert_eq!(
            control,
            r###"Source: blah
Build-Depends: foo, libc6

Package: python-blah
Depends: ${python3:Depends}
Description: A python package
 Foo
"###
        );
    }

    #[test]
    fn test_circular() {
        let td = tempfile::tempdir().unwrap();
        let context = setup(td.path());
        let dep = DebianDependency::simple("python-blah");
        assert!(matches!(
            context.add_build_dependency(&dep),
            Err(Error::CircularDependency(_))
        ));
    }
}
