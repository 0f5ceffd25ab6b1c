//! Support for Python build systems.
//!
//! This module provides functionality for building, testing, and installing
//! Python packages. Three drivers are recognized, matching the signal files
//! a Python source tree can carry: a legacy `setup.py` ([`SetupPy`]), a PEP
//! 517/518 `pyproject.toml` ([`PyProject`]), and a bare `setup.cfg` with no
//! `setup.py` ([`SetupCfg`]).

use crate::analyze::{run_detecting_problems, AnalyzedError};
use crate::buildsystem::{BuildSystem, DependencyCategory, Error, InstallTarget};
use crate::dependencies::python::{PythonDependency, PythonPackageDependency};
use crate::dependency::Dependency;
use crate::dist_catcher::DistCatcher;
use crate::fix_build::BuildFixer;
use crate::installer::{Error as InstallerError, InstallationScope, Installer};
use crate::output::{BinaryOutput, Output, PythonPackageOutput};
use crate::session::Session;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::io::Seek;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Distribution {
    name: Option<String>,
    requires: Vec<String>,
    setup_requires: Vec<String>,
    install_requires: Vec<String>,
    tests_require: Vec<String>,
    scripts: Vec<String>,
    packages: Vec<String>,
    entry_points: HashMap<String, Vec<String>>,
}

fn load_toml(path: &Path) -> Option<pyproject_toml::PyProjectToml> {
    let p = path.join("pyproject.toml");
    let text = std::fs::read_to_string(p).ok()?;
    toml::from_str(&text)
        .map_err(|e| log::warn!("Error parsing pyproject.toml: {}", e))
        .ok()
}

/// Whether a pyproject.toml declares a `[tool.poetry]` section.
fn has_poetry_section(path: &Path) -> bool {
    let p = path.join("pyproject.toml");
    let Ok(text) = std::fs::read_to_string(p) else {
        return false;
    };
    let Ok(value) = text.parse::<toml::Value>() else {
        return false;
    };
    value
        .get("tool")
        .and_then(|t| t.get("poetry"))
        .is_some()
}

/// A parsed `setup.cfg` file.
#[derive(Debug)]
struct SetupCfgFile {
    ini: ini::Ini,
}

impl SetupCfgFile {
    fn load(path: &Path) -> Option<Self> {
        let p = path.join("setup.cfg");
        if !p.exists() {
            return None;
        }
        match ini::Ini::load_from_file(&p) {
            Ok(ini) => Some(Self { ini }),
            Err(e) => {
                log::warn!("Error parsing setup.cfg: {}", e);
                None
            }
        }
    }

    fn has_section(&self, section: &str) -> bool {
        self.ini.section(Some(section)).is_some()
    }

    fn get_section(&self, section: &str) -> Option<SetupCfgSection> {
        self.ini
            .section(Some(section))
            .map(|props| SetupCfgSection { props: props.clone() })
    }
}

/// A single section of a `setup.cfg` file.
#[derive(Debug)]
struct SetupCfgSection {
    props: ini::Properties,
}

impl SetupCfgSection {
    fn has_key(&self, key: &str) -> bool {
        self.props.get(key).is_some()
    }

    fn get_str(&self, key: &str) -> Option<String> {
        self.props.get(key).map(|s| s.to_string())
    }

    /// setuptools list values are newline- (or comma-) separated.
    fn get_list(&self, key: &str) -> Vec<String> {
        self.props
            .get(key)
            .map(|s| {
                s.split(['\n', ','])
                    .map(|item| item.trim())
                    .filter(|item| !item.is_empty())
                    .map(|item| item.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

const SETUP_WRAPPER: &str = r#"""
try:
    import setuptools
except ImportError:
    pass
import distutils
from distutils import core
import sys

import os
script_name = "%(script_name)s"
os.chdir(os.path.dirname(script_name))

g = {"__file__": os.path.basename(script_name), "__name__": "__main__"}
try:
    core._setup_stop_after = "init"
    sys.argv[0] = script_name
    with open(script_name, "rb") as f:
        exec(f.read(), g)
except SystemExit:
    # Hmm, should we do something if exiting with a non-zero code
    # (ie. error)?
    pass

if core._setup_distribution is None:
    raise RuntimeError(
        (
            "'distutils.core.setup()' was never called -- "
            "perhaps '%s' is not a Distutils setup script?"
        )
        % script_name
    )

d = core._setup_distribution
r = {
    'name': getattr(d, "name", None) or None,
    'setup_requires': getattr(d, "setup_requires", []),
    'install_requires': getattr(d, "install_requires", []),
    'tests_require': getattr(d, "tests_require", []) or [],
    'scripts': getattr(d, "scripts", []) or [],
    'entry_points': getattr(d, "entry_points", None) or {},
    'packages': getattr(d, "packages", []) or [],
    'requires': d.get_requires() or [],
    }
import os
import json
with open(%(output_path)s, 'w') as f:
    json.dump(r, f)
"""#;

#[derive(Debug)]
/// A Python setuptools-based build system driven by a `setup.py` script.
pub struct SetupPy {
    path: PathBuf,
    config: Option<SetupCfgFile>,
}

impl SetupPy {
    /// Create a new SetupPy build system with the specified path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_owned(),
            config: SetupCfgFile::load(path),
        }
    }

    /// Probe a directory for a `setup.py`-driven Python project.
    pub fn probe(path: &Path) -> Option<Box<dyn BuildSystem>> {
        if path.join("setup.py").exists() {
            log::debug!("Found setup.py, assuming python project.");
            Some(Box::new(Self::new(path)))
        } else {
            None
        }
    }

    fn determine_interpreter(&self) -> String {
        if let Some(config) = self.config.as_ref() {
            let python_requires = config
                .get_section("options")
                .and_then(|s| s.get_str("python_requires"));
            if python_requires
                .map(|pr| !pr.contains("2.7"))
                .unwrap_or(true)
            {
                return "python3".to_owned();
            }
        }
        let path = self.path.join("setup.py");
        crate::shebang::shebang_binary(&path)
            .ok()
            .flatten()
            .unwrap_or_else(|| "python3".to_owned())
    }

    fn extract_setup(
        &self,
        session: &dyn Session,
        fixers: Option<&[&dyn BuildFixer<InstallerError>]>,
    ) -> Option<Distribution> {
        let interpreter = self.determine_interpreter();

        let mut output_f = tempfile::NamedTempFile::new_in(session.location().join("tmp")).ok()?;
        let argv: Vec<String> = vec![
            interpreter,
            "-c".to_string(),
            SETUP_WRAPPER
                .replace(
                    "%(script_name)s",
                    session.pwd().join("setup.py").to_str().unwrap(),
                )
                .replace(
                    "%(output_path)s",
                    &format!(
                        "\"/{}\"",
                        output_f
                            .path()
                            .to_str()
                            .unwrap()
                            .strip_prefix(session.location().to_str().unwrap())
                            .unwrap()
                    ),
                ),
        ];
        let r = if let Some(fixers) = fixers {
            session
                .command(argv.iter().map(|x| x.as_str()).collect::<Vec<_>>())
                .quiet(true)
                .run_fixing_problems::<_, Error>(fixers)
                .map(|_| ())
                .map_err(|e| e.to_string())
        } else {
            session
                .command(argv.iter().map(|x| x.as_str()).collect())
                .check_call()
                .map_err(|e| e.to_string())
        };
        match r {
            Ok(_) => (),
            Err(e) => {
                log::warn!("Unable to load setup.py metadata: {}", e);
                return None;
            }
        }
        output_f.seek(std::io::SeekFrom::Start(0)).ok()?;
        serde_json::from_reader(output_f).ok()
    }

    fn setup_requires(&self) -> Vec<PythonPackageDependency> {
        let mut ret = vec![];
        if let Some(options) = self.config.as_ref().and_then(|c| c.get_section("options")) {
            for require in options.get_list("setup_requires") {
                if let Ok(dep) = PythonPackageDependency::try_from(require) {
                    ret.push(dep);
                }
            }
        }
        ret
    }

    fn run_setup(
        &self,
        session: &dyn Session,
        installer: &dyn Installer,
        args: Vec<&str>,
    ) -> Result<(), Error> {
        // Install the setup_requires beforehand, since otherwise
        // setuptools might fetch eggs instead of our preferred installer.
        let setup_requires = self
            .setup_requires()
            .into_iter()
            .map(|x| Box::new(x) as Box<dyn Dependency>)
            .collect::<Vec<_>>();
        crate::installer::install_missing_deps(
            session,
            installer,
            &[InstallationScope::Global],
            setup_requires
                .iter()
                .map(|x| x.as_ref())
                .collect::<Vec<_>>()
                .as_slice(),
        )?;
        let interpreter = self.determine_interpreter();
        let mut args = args.clone();
        args.insert(0, &interpreter);
        args.insert(1, "setup.py");
        session.command(args).run_detecting_problems()?;
        Ok(())
    }
}

impl BuildSystem for SetupPy {
    fn name(&self) -> &str {
        "setup.py"
    }

    fn test(&self, session: &dyn Session, installer: &dyn Installer) -> Result<(), Error> {
        if self.path.join("tox.ini").exists() {
            run_detecting_problems(
                session,
                vec!["tox", "--skip-missing-interpreters"],
                None,
                false,
                None,
                None,
                None,
                None,
                None,
                None,
            )?;
            return Ok(());
        }
        if self
            .config
            .as_ref()
            .map(|c| c.has_section("tool:pytest") || c.has_section("pytest"))
            .unwrap_or(false)
        {
            session.command(vec!["pytest"]).run_detecting_problems()?;
            return Ok(());
        }
        // Pre-emptively install setuptools, since distutils doesn't provide
        // a 'test' subcommand and some packages fall back to distutils
        // if setuptools is not available.
        let setuptools_dep = PythonPackageDependency::simple("setuptools");
        if !setuptools_dep.present(session) {
            installer.install(&setuptools_dep, InstallationScope::Global)?;
        }
        match self.run_setup(session, installer, vec!["test"]) {
            Ok(_) => Ok(()),
            Err(Error::Error(AnalyzedError::Unidentified { lines, .. }))
                if lines.contains(&"error: invalid command 'test'".to_string()) =>
            {
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn build(&self, session: &dyn Session, installer: &dyn Installer) -> Result<(), Error> {
        self.run_setup(session, installer, vec!["build"])
    }

    fn dist(
        &self,
        session: &dyn Session,
        installer: &dyn Installer,
        target_directory: &Path,
        quiet: bool,
    ) -> Result<std::ffi::OsString, Error> {
        let dc = DistCatcher::new(vec![session.external_path(Path::new("dist"))]);
        let mut preargs = vec![];
        if quiet {
            preargs.push("--quiet");
        }
        // Preemptively install setuptools since some packages fail in some way without it.
        let setuptools_req = PythonPackageDependency::simple("setuptools");
        if !setuptools_req.present(session) {
            installer.install(&setuptools_req, InstallationScope::Global)?;
        }
        preargs.push("sdist");
        self.run_setup(session, installer, preargs)?;
        Ok(dc.copy_single(target_directory).unwrap().unwrap())
    }

    fn clean(&self, session: &dyn Session, installer: &dyn Installer) -> Result<(), Error> {
        self.run_setup(session, installer, vec!["clean"])
    }

    fn install(
        &self,
        session: &dyn Session,
        installer: &dyn Installer,
        install_target: &InstallTarget,
    ) -> Result<(), Error> {
        let mut args = vec![];
        if install_target.scope == InstallationScope::User {
            args.push("--user".to_string());
        }
        if let Some(prefix) = install_target.prefix.as_ref() {
            args.push(format!("--prefix={}", prefix.to_str().unwrap()));
        }
        args.insert(0, "install".to_owned());
        self.run_setup(
            session,
            installer,
            args.iter().map(|x| x.as_str()).collect(),
        )
    }

    fn get_declared_dependencies(
        &self,
        session: &dyn Session,
        fixers: Option<&[&dyn BuildFixer<InstallerError>]>,
    ) -> Result<Vec<(DependencyCategory, Box<dyn Dependency>)>, Error> {
        let mut ret: Vec<(DependencyCategory, Box<dyn Dependency>)> = vec![];
        if let Some(distribution) = self.extract_setup(session, fixers) {
            for require in &distribution.requires {
                if let Ok(dep) = PythonPackageDependency::try_from(require.clone()) {
                    ret.push((DependencyCategory::Universal, Box::new(dep)));
                }
            }
            for require in &distribution.setup_requires {
                if let Ok(dep) = PythonPackageDependency::try_from(require.clone()) {
                    ret.push((DependencyCategory::Build, Box::new(dep)));
                }
            }
            for require in &distribution.install_requires {
                if let Ok(dep) = PythonPackageDependency::try_from(require.clone()) {
                    ret.push((DependencyCategory::Universal, Box::new(dep)));
                }
            }
            for require in &distribution.tests_require {
                if let Ok(dep) = PythonPackageDependency::try_from(require.clone()) {
                    ret.push((DependencyCategory::Test, Box::new(dep)));
                }
            }
        }
        if let Some(options) = self.config.as_ref().and_then(|c| c.get_section("options")) {
            for require in options.get_list("setup_requires") {
                if let Ok(dep) = PythonPackageDependency::try_from(require) {
                    ret.push((DependencyCategory::Build, Box::new(dep)));
                }
            }
            for require in options.get_list("install_requires") {
                if let Ok(dep) = PythonPackageDependency::try_from(require) {
                    ret.push((DependencyCategory::Universal, Box::new(dep)));
                }
            }
        }
        Ok(ret)
    }

    fn get_declared_outputs(
        &self,
        session: &dyn Session,
        fixers: Option<&[&dyn BuildFixer<InstallerError>]>,
    ) -> Result<Vec<Box<dyn Output>>, Error> {
        let mut ret: Vec<Box<dyn Output>> = vec![];
        let mut all_packages = HashSet::new();
        if let Some(distribution) = self.extract_setup(session, fixers) {
            for script in &distribution.scripts {
                ret.push(Box::new(BinaryOutput(
                    Path::new(script)
                        .file_name()
                        .unwrap()
                        .to_str()
                        .unwrap()
                        .to_owned(),
                )));
            }
            for script in distribution
                .entry_points
                .get("console_scripts")
                .unwrap_or(&vec![])
            {
                if let Some((name, _)) = script.split_once('=') {
                    ret.push(Box::new(BinaryOutput(name.trim().to_string())));
                }
            }
            all_packages.extend(distribution.packages);
        }
        if let Some(options) = self.config.as_ref().and_then(|c| c.get_section("options")) {
            all_packages.extend(options.get_list("packages"));
            for script in options.get_list("scripts") {
                let p = Path::new(&script);
                ret.push(Box::new(BinaryOutput(
                    p.file_name().unwrap().to_str().unwrap().to_owned(),
                )));
            }
            for script in options.get_list("entry_points") {
                if let Some((name, _)) = script.split_once('=') {
                    ret.push(Box::new(BinaryOutput(name.trim().to_string())));
                }
            }
        }
        for package in all_packages {
            ret.push(Box::new(PythonPackageOutput::new(&package, Some("cpython3"))));
        }
        Ok(ret)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[derive(Debug)]
/// A PEP 517/518 build system driven by `pyproject.toml` (poetry, flit, hatch, ...).
pub struct PyProject {
    path: PathBuf,
    pyproject: pyproject_toml::PyProjectToml,
}

impl PyProject {
    /// Create a new PyProject build system with the specified path.
    pub fn new(path: &Path, pyproject: pyproject_toml::PyProjectToml) -> Self {
        Self {
            path: path.to_owned(),
            pyproject,
        }
    }

    /// Probe a directory for a `pyproject.toml`-driven Python project.
    pub fn probe(path: &Path) -> Option<Box<dyn BuildSystem>> {
        let pyproject = load_toml(path)?;
        log::debug!("Found pyproject.toml, assuming python project.");
        Some(Box::new(Self::new(path, pyproject)))
    }
}

impl BuildSystem for PyProject {
    fn name(&self) -> &str {
        "pyproject.toml"
    }

    fn dist(
        &self,
        session: &dyn Session,
        installer: &dyn Installer,
        target_directory: &Path,
        _quiet: bool,
    ) -> Result<std::ffi::OsString, Error> {
        if !has_poetry_section(&self.path) {
            return Err(Error::Unimplemented);
        }
        log::info!("Found pyproject.toml with poetry section, assuming poetry project.");
        let venv_dep = crate::dependencies::BinaryDependency::new("python3");
        if !venv_dep.present(session) {
            installer.install(&venv_dep, InstallationScope::Global)?;
        }
        let pip_dep = crate::dependencies::BinaryDependency::new("pip3");
        if !pip_dep.present(session) {
            installer.install(&pip_dep, InstallationScope::Global)?;
        }
        session
            .command(vec!["pip3", "install", "poetry"])
            .user("root")
            .check_call()?;
        let dc = DistCatcher::new(vec![session.external_path(Path::new("dist"))]);
        session
            .command(vec!["poetry", "build", "-f", "sdist"])
            .run_detecting_problems()?;
        Ok(dc.copy_single(target_directory).unwrap().unwrap())
    }

    fn test(&self, _session: &dyn Session, _installer: &dyn Installer) -> Result<(), Error> {
        Err(Error::Unimplemented)
    }

    fn build(&self, _session: &dyn Session, _installer: &dyn Installer) -> Result<(), Error> {
        Err(Error::Unimplemented)
    }

    fn clean(&self, _session: &dyn Session, _installer: &dyn Installer) -> Result<(), Error> {
        Err(Error::Unimplemented)
    }

    fn install(
        &self,
        _session: &dyn Session,
        _installer: &dyn Installer,
        _install_target: &InstallTarget,
    ) -> Result<(), Error> {
        Err(Error::Unimplemented)
    }

    fn get_declared_dependencies(
        &self,
        _session: &dyn Session,
        _fixers: Option<&[&dyn BuildFixer<InstallerError>]>,
    ) -> Result<Vec<(DependencyCategory, Box<dyn Dependency>)>, Error> {
        let mut ret: Vec<(DependencyCategory, Box<dyn Dependency>)> = vec![];
        if let Some(build_system) = self.pyproject.build_system.as_ref() {
            for require in &build_system.requires {
                ret.push((
                    DependencyCategory::Build,
                    Box::new(PythonPackageDependency::from(require.clone())),
                ));
            }
        }
        if let Some(project) = self.pyproject.project.as_ref() {
            if let Some(dependencies) = project.dependencies.as_ref() {
                for dep in dependencies {
                    ret.push((
                        DependencyCategory::Universal,
                        Box::new(PythonPackageDependency::from(dep.clone())),
                    ));
                }
            }
            if let Some(extras) = project.optional_dependencies.as_ref() {
                for (name, deps) in extras {
                    for dep in deps {
                        ret.push((
                            DependencyCategory::RuntimeExtra(name.clone()),
                            Box::new(PythonPackageDependency::from(dep.clone())),
                        ));
                    }
                }
            }
            if let Some(requires_python) = project.requires_python.as_ref() {
                ret.push((
                    DependencyCategory::Universal,
                    Box::new(PythonDependency::from(requires_python)),
                ));
            }
        }
        Ok(ret)
    }

    fn get_declared_outputs(
        &self,
        _session: &dyn Session,
        _fixers: Option<&[&dyn BuildFixer<InstallerError>]>,
    ) -> Result<Vec<Box<dyn Output>>, Error> {
        let mut ret: Vec<Box<dyn Output>> = vec![];
        if let Some(project) = self.pyproject.project.as_ref() {
            if let Some(scripts) = project.scripts.as_ref() {
                for (script, _from) in scripts {
                    ret.push(Box::new(BinaryOutput(script.to_string())));
                }
            }
            if let Some(gui_scripts) = project.gui_scripts.as_ref() {
                for (script, _from) in gui_scripts {
                    ret.push(Box::new(BinaryOutput(script.to_string())));
                }
            }
            ret.push(Box::new(PythonPackageOutput::new(
                &project.name,
                project.version.as_ref().map(|v| v.to_string()).as_deref(),
            )));
        }
        Ok(ret)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[derive(Debug)]
/// A Python project that carries only a `setup.cfg`, with no `setup.py`.
///
/// These rely on a PEP 517 front end (`pep517.build`) to actually invoke the
/// build backend named in the (usually absent or minimal) `pyproject.toml`.
pub struct SetupCfg {
    config: SetupCfgFile,
}

impl SetupCfg {
    /// Create a new SetupCfg build system with the specified path.
    pub fn new(config: SetupCfgFile) -> Self {
        Self { config }
    }

    /// Probe a directory for a bare `setup.cfg` project (no `setup.py`).
    pub fn probe(path: &Path) -> Option<Box<dyn BuildSystem>> {
        if path.join("setup.py").exists() {
            return None;
        }
        let config = SetupCfgFile::load(path)?;
        log::debug!("Found setup.cfg without setup.py, assuming python project.");
        Some(Box::new(Self::new(config)))
    }

    fn setup(&self, session: &dyn Session, installer: &dyn Installer) -> Result<(), Error> {
        for name in ["pep517", "pip"] {
            let dep = PythonPackageDependency::simple(name);
            if !dep.present(session) {
                installer.install(&dep, InstallationScope::Global)?;
            }
        }
        Ok(())
    }
}

impl BuildSystem for SetupCfg {
    fn name(&self) -> &str {
        "setup.cfg"
    }

    fn dist(
        &self,
        session: &dyn Session,
        installer: &dyn Installer,
        target_directory: &Path,
        _quiet: bool,
    ) -> Result<std::ffi::OsString, Error> {
        self.setup(session, installer)?;
        let dc = DistCatcher::new(vec![session.external_path(Path::new("dist"))]);
        session
            .command(vec!["python3", "-m", "pep517.build", "-s", "."])
            .run_detecting_problems()?;
        Ok(dc.copy_single(target_directory).unwrap().unwrap())
    }

    fn test(&self, _session: &dyn Session, _installer: &dyn Installer) -> Result<(), Error> {
        Err(Error::Unimplemented)
    }

    fn build(&self, _session: &dyn Session, _installer: &dyn Installer) -> Result<(), Error> {
        Err(Error::Unimplemented)
    }

    fn clean(&self, _session: &dyn Session, _installer: &dyn Installer) -> Result<(), Error> {
        Err(Error::Unimplemented)
    }

    fn install(
        &self,
        _session: &dyn Session,
        _installer: &dyn Installer,
        _install_target: &InstallTarget,
    ) -> Result<(), Error> {
        Err(Error::Unimplemented)
    }

    fn get_declared_dependencies(
        &self,
        _session: &dyn Session,
        _fixers: Option<&[&dyn BuildFixer<InstallerError>]>,
    ) -> Result<Vec<(DependencyCategory, Box<dyn Dependency>)>, Error> {
        let mut ret: Vec<(DependencyCategory, Box<dyn Dependency>)> = vec![];
        if let Some(options) = self.config.get_section("options") {
            for require in options.get_list("setup_requires") {
                if let Ok(dep) = PythonPackageDependency::try_from(require) {
                    ret.push((DependencyCategory::Build, Box::new(dep)));
                }
            }
            for require in options.get_list("install_requires") {
                if let Ok(dep) = PythonPackageDependency::try_from(require) {
                    ret.push((DependencyCategory::Universal, Box::new(dep)));
                }
            }
        }
        Ok(ret)
    }

    fn get_declared_outputs(
        &self,
        _session: &dyn Session,
        _fixers: Option<&[&dyn BuildFixer<InstallerError>]>,
    ) -> Result<Vec<Box<dyn Output>>, Error> {
        let mut ret: Vec<Box<dyn Output>> = vec![];
        if let Some(options) = self.config.get_section("options") {
            for package in options.get_list("packages") {
                ret.push(Box::new(PythonPackageOutput::new(&package, Some("cpython3"))));
            }
            for script in options.get_list("scripts") {
                let p = Path::new(&script);
                ret.push(Box::new(BinaryOutput(
                    p.file_name().unwrap().to_str().unwrap().to_owned(),
                )));
            }
            if options.has_key("entry_points") {
                for script in options.get_list("entry_points") {
                    if let Some((name, _)) = script.split_once('=') {
                        ret.push(Box::new(BinaryOutput(name.trim().to_string())));
                    }
                }
            }
        }
        Ok(ret)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
