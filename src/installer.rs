use crate::dependency::Dependency;

#[derive(Debug)]
pub enum Error {
    UnknownDependencyFamily,
    UnsupportedScope(InstallationScope),
    AnalyzedError(crate::analyze::AnalyzedError),
    SessionError(crate::session::Error),
    Other(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::UnknownDependencyFamily => write!(f, "Unknown dependency family"),
            Error::UnsupportedScope(scope) => write!(f, "Unsupported scope: {:?}", scope),
            Error::AnalyzedError(e) => write!(f, "{}", e),
            Error::SessionError(e) => write!(f, "{}", e),
            Error::Other(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for Error {}

impl From<crate::analyze::AnalyzedError> for Error {
    fn from(e: crate::analyze::AnalyzedError) -> Self {
        Error::AnalyzedError(e)
    }
}

impl From<crate::session::Error> for Error {
    fn from(e: crate::session::Error) -> Self {
        Error::SessionError(e)
    }
}

/// An explanation is a human-readable description of what to do to install a dependency.
pub struct Explanation {
    pub message: String,
    pub command: Option<Vec<String>>,
}

/// The scope of an installation.
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum InstallationScope {
    /// Under /usr in the system
    Global,

    /// In the current users' home directory
    User,

    /// Vendored in the projects' source directory
    Vendor,
}

/// An installer can take a dependency and install it into the session.
pub trait Installer {
    /// Install the dependency into the session.
    fn install(&self, dep: &dyn Dependency, scope: InstallationScope) -> Result<(), Error>;

    /// Explain how to install the dependency.
    fn explain(&self, dep: &dyn Dependency, scope: InstallationScope)
        -> Result<Explanation, Error>;

    fn explain_some(
        &self,
        deps: Vec<Box<dyn Dependency>>,
        scope: InstallationScope,
    ) -> Result<(Vec<Explanation>, Vec<Box<dyn Dependency>>), Error> {
        let mut explanations = Vec::new();
        let mut failed = Vec::new();
        for dep in deps {
            match self.explain(&*dep, scope) {
                Ok(explanation) => explanations.push(explanation),
                Err(Error::UnknownDependencyFamily) => failed.push(dep),
                Err(e) => {
                    return Err(e);
                }
            }
        }
        Ok((explanations, failed))
    }

    fn install_some(
        &self,
        deps: Vec<Box<dyn Dependency>>,
        scope: InstallationScope,
    ) -> Result<(Vec<Box<dyn Dependency>>, Vec<Box<dyn Dependency>>), Error> {
        let mut installed = Vec::new();
        let mut failed = Vec::new();

        for dep in deps {
            match self.install(&*dep, scope) {
                Ok(()) => installed.push(dep),
                Err(Error::UnknownDependencyFamily) => failed.push(dep),
                Err(e) => {
                    return Err(e);
                }
            }
        }
        Ok((installed, failed))
    }
}

/// A null installer does nothing.
pub struct NullInstaller;

impl NullInstaller {
    pub fn new() -> Self {
        NullInstaller
    }
}

impl Default for NullInstaller {
    fn default() -> Self {
        NullInstaller::new()
    }
}

impl Installer for NullInstaller {
    fn install(&self, _dep: &dyn Dependency, _scope: InstallationScope) -> Result<(), Error> {
        Err(Error::UnknownDependencyFamily)
    }

    fn explain(
        &self,
        _dep: &dyn Dependency,
        _scope: InstallationScope,
    ) -> Result<Explanation, Error> {
        Err(Error::UnknownDependencyFamily)
    }
}

/// An installer that tries a list of installers in order, falling through to
/// the next one whenever a dependency's family isn't recognized.
pub struct StackedInstaller<'a> {
    subs: Vec<Box<dyn Installer + 'a>>,
}

impl<'a> StackedInstaller<'a> {
    /// Create a new stacked installer from a list of sub-installers, tried in order.
    pub fn new(subs: Vec<Box<dyn Installer + 'a>>) -> Self {
        Self { subs }
    }
}

impl<'a> Installer for StackedInstaller<'a> {
    fn install(&self, dep: &dyn Dependency, scope: InstallationScope) -> Result<(), Error> {
        for sub in &self.subs {
            match sub.install(dep, scope) {
                Err(Error::UnknownDependencyFamily) => continue,
                result => return result,
            }
        }
        Err(Error::UnknownDependencyFamily)
    }

    fn explain(
        &self,
        dep: &dyn Dependency,
        scope: InstallationScope,
    ) -> Result<Explanation, Error> {
        for sub in &self.subs {
            match sub.explain(dep, scope) {
                Err(Error::UnknownDependencyFamily) => continue,
                result => return result,
            }
        }
        Err(Error::UnknownDependencyFamily)
    }
}

/// Build the native (non-system-package-manager) resolvers: one per
/// supported language ecosystem.
fn native_installers<'a>(session: &'a dyn crate::session::Session) -> Vec<Box<dyn Installer + 'a>> {
    vec![
        Box::new(crate::dependencies::go::GoResolver::new(session)),
        Box::new(crate::dependencies::haskell::HackageResolver::new(session)),
        Box::new(crate::dependencies::node::NpmResolver::new(session)),
        Box::new(crate::dependencies::octave::OctaveForgeResolver::new(
            session,
        )),
        Box::new(crate::dependencies::perl::CPAN::new(session, false)),
        Box::new(crate::dependencies::python::PypiResolver::new(session)),
        Box::new(crate::dependencies::r::RResolver::new(
            session,
            "https://cran.r-project.org",
        )),
    ]
}

/// Decide whether dependencies should be installed system-wide (requires
/// root) or into the current user's home directory.
///
/// This mirrors the upstream Python's `user_local` decision in
/// `auto_resolver`, minus the schroot-specific special case: a session
/// doesn't expose enough information to tell "is this a schroot" apart from
/// "is this some other kind of root session", so we fold both into the
/// `root` check.
pub fn auto_installation_scope(session: &dyn crate::session::Session) -> InstallationScope {
    match crate::session::get_user(session) {
        Ok(user) if user == "root" => InstallationScope::Global,
        _ => InstallationScope::User,
    }
}

/// Build the default installer stack: the system package manager (when the
/// `debian` feature is enabled) plus every native ecosystem resolver.
pub fn auto_installer<'a>(
    session: &'a dyn crate::session::Session,
    scope: InstallationScope,
    dep_server_url: Option<&url::Url>,
) -> Box<dyn Installer + 'a> {
    let mut subs: Vec<Box<dyn Installer + 'a>> = vec![];

    #[cfg(feature = "debian")]
    {
        if scope == InstallationScope::Global {
            if let Some(url) = dep_server_url {
                subs.push(Box::new(crate::debian::dep_server::DepServerAptInstaller::from_session(
                    session, url,
                )));
            } else {
                subs.push(Box::new(crate::debian::apt::AptInstaller::from_session(
                    session,
                )));
            }
        }
    }

    subs.extend(native_installers(session));

    Box::new(StackedInstaller::new(subs))
}

/// Build an installer stack from an explicit list of installer names, as
/// requested on the command line (`--installer`, `--apt`, `--native`).
///
/// Recognized names: `"auto"`, `"apt"`, `"native"`, `"dep-server"`, and the
/// individual ecosystem names (`"go"`, `"hackage"`, `"npm"`, `"octave"`,
/// `"cpan"`, `"pypi"`, `"cran"`).
pub fn select_installers<'a>(
    session: &'a dyn crate::session::Session,
    names: &[&str],
    dep_server_url: Option<&url::Url>,
) -> Result<Box<dyn Installer + 'a>, Error> {
    let mut subs: Vec<Box<dyn Installer + 'a>> = vec![];

    for name in names {
        match *name {
            "auto" => {
                let scope = auto_installation_scope(session);
                return Ok(auto_installer(session, scope, dep_server_url));
            }
            "native" => subs.extend(native_installers(session)),
            #[cfg(feature = "debian")]
            "apt" => {
                if let Some(url) = dep_server_url {
                    subs.push(Box::new(
                        crate::debian::dep_server::DepServerAptInstaller::from_session(
                            session, url,
                        ),
                    ));
                } else {
                    subs.push(Box::new(crate::debian::apt::AptInstaller::from_session(
                        session,
                    )));
                }
            }
            #[cfg(feature = "debian")]
            "dep-server" => {
                let url = dep_server_url.ok_or_else(|| {
                    Error::Other("dep-server installer requested without a URL".to_string())
                })?;
                subs.push(Box::new(
                    crate::debian::dep_server::DepServerAptInstaller::from_session(session, url),
                ));
            }
            "go" => subs.push(Box::new(crate::dependencies::go::GoResolver::new(session))),
            "hackage" => subs.push(Box::new(crate::dependencies::haskell::HackageResolver::new(
                session,
            ))),
            "npm" => subs.push(Box::new(crate::dependencies::node::NpmResolver::new(
                session,
            ))),
            "octave" => subs.push(Box::new(
                crate::dependencies::octave::OctaveForgeResolver::new(session),
            )),
            "cpan" => subs.push(Box::new(crate::dependencies::perl::CPAN::new(
                session, false,
            ))),
            "pypi" => subs.push(Box::new(crate::dependencies::python::PypiResolver::new(
                session,
            ))),
            "cran" => subs.push(Box::new(crate::dependencies::r::RResolver::new(
                session,
                "https://cran.r-project.org",
            ))),
            other => {
                return Err(Error::Other(format!("unknown installer: {}", other)));
            }
        }
    }

    Ok(Box::new(StackedInstaller::new(subs)))
}

/// Install every dependency in `deps` that isn't already present, trying
/// each scope in `scopes` in order until one succeeds.
pub fn install_missing_deps(
    session: &dyn crate::session::Session,
    installer: &dyn Installer,
    scopes: &[InstallationScope],
    deps: &[&dyn Dependency],
) -> Result<(), Error> {
    for dep in deps {
        if dep.present(session) {
            continue;
        }
        let mut last_err = None;
        let mut installed = false;
        for scope in scopes {
            match installer.install(*dep, *scope) {
                Ok(()) => {
                    installed = true;
                    break;
                }
                Err(e) => last_err = Some(e),
            }
        }
        if !installed {
            return Err(last_err.unwrap_or(Error::UnknownDependencyFamily));
        }
    }
    Ok(())
}