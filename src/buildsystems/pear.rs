//! Support for PHP PEAR packages.
//!
//! This module provides functionality for building, testing, and distributing
//! software that uses the PEAR `package.xml` packaging format.

use crate::buildsystem::{BuildSystem, Error};
use crate::dependency::Dependency;
use crate::installer::{InstallationScope, Installer};
use crate::session::Session;
use std::path::PathBuf;

/// PEAR build system.
///
/// This build system handles PHP projects packaged with `package.xml`.
#[derive(Debug)]
pub struct Pear {
    #[allow(dead_code)]
    path: PathBuf,
}

impl Pear {
    /// Create a new Pear build system.
    ///
    /// # Arguments
    /// * `path` - Path to package.xml
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Ensure the `pear` binary is available before driving it.
    fn setup(&self, session: &dyn Session, installer: &dyn Installer) -> Result<(), Error> {
        let binary_req = crate::dependencies::BinaryDependency::new("pear");
        if !binary_req.present(session) {
            installer.install(&binary_req, InstallationScope::Global)?;
        }
        Ok(())
    }

    /// Probe a directory to check if it contains a PEAR package.
    ///
    /// # Arguments
    /// * `path` - Path to check for package.xml
    ///
    /// # Returns
    /// Some(BuildSystem) if a package.xml is found, None otherwise
    pub fn probe(path: &std::path::Path) -> Option<Box<dyn BuildSystem>> {
        let path = path.join("package.xml");
        if path.exists() {
            log::debug!("Found package.xml, assuming pear package.");
            Some(Box::new(Self::new(path)))
        } else {
            None
        }
    }
}

impl BuildSystem for Pear {
    fn name(&self) -> &str {
        "pear"
    }

    fn dist(
        &self,
        session: &dyn Session,
        installer: &dyn Installer,
        target_directory: &std::path::Path,
        quiet: bool,
    ) -> Result<std::ffi::OsString, Error> {
        self.setup(session, installer)?;
        let dc = crate::dist_catcher::DistCatcher::default(
            &session.external_path(std::path::Path::new(".")),
        );
        session
            .command(vec!["pear", "package"])
            .quiet(quiet)
            .run_detecting_problems()?;
        Ok(dc.copy_single(target_directory).unwrap().unwrap())
    }

    fn test(&self, session: &dyn Session, installer: &dyn Installer) -> Result<(), Error> {
        self.setup(session, installer)?;
        session
            .command(vec!["pear", "run-tests"])
            .run_detecting_problems()?;
        Ok(())
    }

    fn build(&self, session: &dyn Session, installer: &dyn Installer) -> Result<(), Error> {
        self.setup(session, installer)?;
        session
            .command(vec!["pear", "build"])
            .run_detecting_problems()?;
        Ok(())
    }

    /// Clean build artifacts.
    ///
    /// Always returns Error::Unimplemented; pear has no clean step.
    fn clean(&self, _session: &dyn Session, _installer: &dyn Installer) -> Result<(), Error> {
        Err(Error::Unimplemented)
    }

    fn install(
        &self,
        session: &dyn Session,
        installer: &dyn Installer,
        _install_target: &crate::buildsystem::InstallTarget,
    ) -> Result<(), Error> {
        self.setup(session, installer)?;
        session
            .command(vec!["pear", "install", "package.xml"])
            .run_detecting_problems()?;
        Ok(())
    }

    fn get_declared_dependencies(
        &self,
        _session: &dyn Session,
        _fixers: Option<&[&dyn crate::fix_build::BuildFixer<crate::installer::Error>]>,
    ) -> Result<
        Vec<(
            crate::buildsystem::DependencyCategory,
            Box<dyn crate::dependency::Dependency>,
        )>,
        Error,
    > {
        Err(Error::Unimplemented)
    }

    fn get_declared_outputs(
        &self,
        _session: &dyn Session,
        _fixers: Option<&[&dyn crate::fix_build::BuildFixer<crate::installer::Error>]>,
    ) -> Result<Vec<Box<dyn crate::output::Output>>, Error> {
        Err(Error::Unimplemented)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
