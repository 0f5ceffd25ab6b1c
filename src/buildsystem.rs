use crate::dependency::Dependency;
use crate::fix_build::BuildFixer;
use crate::installer::{Error as InstallerError, InstallationScope, Installer};
use crate::output::Output;
use crate::session::Session;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    // Build: necessary to build the package
    Build,
    // core: necessary to do anything with the package
    Core,
    // test: necessary to run the tests
    Test,
    // dev: necessary for development (e.g. linters, yacc)
    Dev,
}

impl Stage {
    pub fn all() -> &'static [Stage] {
        &[Stage::Build, Stage::Core, Stage::Test, Stage::Dev]
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Stage::Build => write!(f, "build"),
            Stage::Core => write!(f, "core"),
            Stage::Test => write!(f, "test"),
            Stage::Dev => write!(f, "dev"),
        }
    }
}

/// Which part of the dependency surface a declared dependency belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyCategory {
    /// Required both to build and to run.
    Universal,
    /// Required only to build.
    Build,
    /// Named, optional build extra (e.g. a Cargo feature or a setuptools extra).
    BuildExtra(String),
    /// Required only at runtime.
    Runtime,
    /// Named, optional runtime extra.
    RuntimeExtra(String),
    /// Required to run the test suite.
    Test,
    /// Required for development only (linters, codegen tools, ...).
    Dev,
}

/// Where an install() call should place files.
#[derive(Debug, Clone)]
pub struct InstallTarget {
    pub scope: InstallationScope,
    pub prefix: Option<PathBuf>,
}

/// Errors raised while driving a build system.
#[derive(Debug)]
pub enum Error {
    /// No build system recognized the directory.
    NoBuildToolsFound,
    /// This build system doesn't support the requested operation.
    Unimplemented,
    /// The underlying command failed and buildlog-consultant couldn't (or could) explain why.
    Error(crate::analyze::AnalyzedError),
    /// Installing a declared dependency failed.
    InstallerError(InstallerError),
    /// A session-level failure (I/O, process spawn, ...).
    SessionError(crate::session::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::NoBuildToolsFound => write!(f, "no build tools found"),
            Error::Unimplemented => write!(f, "not implemented for this build system"),
            Error::Error(e) => write!(f, "{}", e),
            Error::InstallerError(e) => write!(f, "{}", e),
            Error::SessionError(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<crate::analyze::AnalyzedError> for Error {
    fn from(e: crate::analyze::AnalyzedError) -> Self {
        Error::Error(e)
    }
}

impl From<InstallerError> for Error {
    fn from(e: InstallerError) -> Self {
        Error::InstallerError(e)
    }
}

impl From<crate::session::Error> for Error {
    fn from(e: crate::session::Error) -> Self {
        Error::SessionError(e)
    }
}

/// A particular build system (Make, Cargo, setup.py, ...) detected in a source tree.
pub trait BuildSystem {
    /// Short, stable name used in logs and the `info` report (e.g. "make", "cargo").
    fn name(&self) -> &str;

    /// Produce a source distribution tarball in `target_directory`, returning its path.
    fn dist(
        &self,
        session: &dyn Session,
        installer: &dyn Installer,
        target_directory: &Path,
        quiet: bool,
    ) -> Result<std::ffi::OsString, Error>;

    /// Run the test suite.
    fn test(&self, session: &dyn Session, installer: &dyn Installer) -> Result<(), Error>;

    /// Build the project in place.
    fn build(&self, session: &dyn Session, installer: &dyn Installer) -> Result<(), Error>;

    /// Remove build artifacts.
    fn clean(&self, session: &dyn Session, installer: &dyn Installer) -> Result<(), Error>;

    /// Install the project into `install_target`.
    fn install(
        &self,
        session: &dyn Session,
        installer: &dyn Installer,
        install_target: &InstallTarget,
    ) -> Result<(), Error>;

    /// Dependencies this build system can read out of its manifest, if any.
    fn get_declared_dependencies(
        &self,
        session: &dyn Session,
        fixers: Option<&[&dyn BuildFixer<InstallerError>]>,
    ) -> Result<Vec<(DependencyCategory, Box<dyn Dependency>)>, Error>;

    /// Outputs (binaries, libraries, modules) this build system declares, if any.
    fn get_declared_outputs(
        &self,
        session: &dyn Session,
        fixers: Option<&[&dyn BuildFixer<InstallerError>]>,
    ) -> Result<Vec<Box<dyn Output>>, Error>;

    /// Downcast support, for drivers that need to recover their concrete type.
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Look up `name` on `$PATH`, installing the binary that provides it if it's missing.
pub fn guaranteed_which(
    session: &dyn Session,
    installer: &dyn Installer,
    name: &str,
) -> Result<PathBuf, Error> {
    if let Some(path) = crate::session::which(session, name) {
        return Ok(PathBuf::from(path));
    }
    let binary_req = crate::dependencies::BinaryDependency::new(name);
    installer.install(&binary_req, InstallationScope::Global)?;
    crate::session::which(session, name)
        .map(PathBuf::from)
        .ok_or(Error::NoBuildToolsFound)
}

/// The name of every build system `probe()` knows how to detect, in probing order.
pub fn supported_buildsystem_names() -> Vec<&'static str> {
    vec![
        "pear",
        "setup.py",
        "pyproject.toml",
        "setup.cfg",
        "npm",
        "waf",
        "gem",
        "dist-zilla",
        "make",
    ]
}

/// Probe `path` with every known build system and return the ones that matched.
///
/// Order matters: more specific build systems are probed before generic
/// fallbacks (e.g. a bare Makefile), since a directory can satisfy more than
/// one probe.
pub fn detect_buildsystems(path: &Path) -> Vec<Box<dyn BuildSystem>> {
    let mut ret: Vec<Box<dyn BuildSystem>> = vec![];

    if let Some(bs) = crate::buildsystems::pear::Pear::probe(path) {
        ret.push(bs);
    }
    if let Some(bs) = crate::buildsystems::python::SetupPy::probe(path) {
        ret.push(bs);
    }
    if let Some(bs) = crate::buildsystems::python::PyProject::probe(path) {
        ret.push(bs);
    }
    if let Some(bs) = crate::buildsystems::python::SetupCfg::probe(path) {
        ret.push(bs);
    }
    if let Some(bs) = crate::buildsystems::node::Node::probe(path) {
        ret.push(bs);
    }
    if let Some(bs) = crate::buildsystems::waf::Waf::probe(path) {
        ret.push(bs);
    }
    if let Some(bs) = crate::buildsystems::ruby::Gem::probe(path) {
        ret.push(bs);
    }
    if let Some(bs) = crate::buildsystems::perl::DistZilla::probe(path) {
        ret.push(bs);
    }
    if let Some(bs) = crate::buildsystems::make::Make::probe(path) {
        ret.push(bs);
    }

    ret
}
