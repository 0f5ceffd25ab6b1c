//! Session abstraction: run commands in a well defined filesystem root and user identity.
//!
//! Three concrete variants are provided: [`plain::PlainSession`] (runs directly on the
//! host), [`schroot::SchrootSession`] (runs inside an schroot chroot) and
//! [`unshare::UnshareSession`] (runs inside a disposable user/mount/pid namespace).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Plain sessions that run commands directly on the host.
pub mod plain;
/// Schroot-backed chroot sessions.
pub mod schroot;
/// Unshare-namespace sandboxed sessions.
pub mod unshare;

/// Errors that can occur while setting up or using a session.
#[derive(Debug)]
pub enum Error {
    /// A command exited with a non-zero status.
    CalledProcessError(i32),
    /// An I/O error occurred while spawning or communicating with a command.
    IoError(std::io::Error),
    /// Setting up the session itself failed (short reason, detailed message).
    SetupFailure(String, String),
    /// An error specific to fetching or unpacking a sandbox image.
    ImageError(ImageError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::CalledProcessError(retcode) => {
                write!(f, "command exited with status {}", retcode)
            }
            Error::IoError(e) => write!(f, "I/O error: {}", e),
            Error::SetupFailure(reason, detail) => {
                write!(f, "failed to set up session: {}: {}", reason, detail)
            }
            Error::ImageError(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e)
    }
}

/// Errors specific to fetching or unpacking a sandbox base image.
#[derive(Debug)]
pub enum ImageError {
    /// The host architecture has no known image for it.
    UnsupportedArchitecture {
        /// The `std::env::consts::ARCH` value that was not recognized.
        arch: String,
    },
    /// No cached image was found and downloading was not requested.
    CachedImageNotFound {
        /// Path where the cached image was expected.
        path: PathBuf,
    },
    /// Downloading an image requires a feature that isn't enabled.
    DownloadNotAvailable {
        /// Human-readable explanation.
        reason: String,
    },
    /// Downloading the image failed.
    DownloadFailed {
        /// URL that was being fetched.
        url: String,
        /// Underlying error description.
        error: String,
    },
}

impl std::fmt::Display for ImageError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ImageError::UnsupportedArchitecture { arch } => {
                write!(f, "unsupported architecture: {}", arch)
            }
            ImageError::CachedImageNotFound { path } => {
                write!(f, "no cached image at {}", path.display())
            }
            ImageError::DownloadNotAvailable { reason } => write!(f, "{}", reason),
            ImageError::DownloadFailed { url, error } => {
                write!(f, "failed to download {}: {}", url, error)
            }
        }
    }
}

/// A project exported into, or already present in, a session's filesystem.
pub enum Project {
    /// A project materialized into a temporary, session-owned directory.
    Temporary {
        /// Host-visible path to the exported tree.
        external_path: PathBuf,
        /// Session-visible (guest) path to the exported tree.
        internal_path: PathBuf,
        /// Host-visible path of the enclosing temporary directory, removed when dropped.
        td: PathBuf,
    },
    /// A project already present at a fixed location; nothing to clean up.
    Existing {
        /// Host-visible path.
        external_path: PathBuf,
        /// Session-visible (guest) path.
        internal_path: PathBuf,
    },
}

impl Project {
    /// Host-visible path to the project.
    pub fn external_path(&self) -> &Path {
        match self {
            Project::Temporary { external_path, .. } => external_path,
            Project::Existing { external_path, .. } => external_path,
        }
    }

    /// Session-visible (guest) path to the project.
    pub fn internal_path(&self) -> &Path {
        match self {
            Project::Temporary { internal_path, .. } => internal_path,
            Project::Existing { internal_path, .. } => internal_path,
        }
    }

    /// Path to the enclosing temporary directory, if this project owns one.
    pub fn temp_dir(&self) -> Option<&Path> {
        match self {
            Project::Temporary { td, .. } => Some(td),
            Project::Existing { .. } => None,
        }
    }
}

/// An executable environment: host, chroot, or unshare sandbox.
///
/// All commands take an argv, and optionally a working directory, a user to run as, and
/// environment overrides. Implementations are not safe to share between logical tasks
/// running concurrently; callers that need parallelism should allocate one session per task.
pub trait Session {
    /// Change the session's notion of the current working directory.
    fn chdir(&mut self, path: &Path) -> Result<(), Error>;

    /// The session's current working directory (guest path).
    fn pwd(&self) -> &Path;

    /// Translate a guest path into a host-visible path.
    fn external_path(&self, path: &Path) -> PathBuf;

    /// The host-visible root of this session.
    fn location(&self) -> PathBuf;

    /// Run a command, returning its captured stdout on success.
    fn check_output(
        &self,
        argv: Vec<&str>,
        cwd: Option<&Path>,
        user: Option<&str>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Vec<u8>, Error>;

    /// Run a command, discarding output, failing if it exits non-zero.
    fn check_call(
        &self,
        argv: Vec<&str>,
        cwd: Option<&Path>,
        user: Option<&str>,
        env: Option<HashMap<String, String>>,
    ) -> Result<(), Error>;

    /// Ensure the invoking user has a usable home directory inside the session.
    fn create_home(&self) -> Result<(), Error>;

    /// Whether `path` exists inside the session.
    fn exists(&self, path: &Path) -> bool;

    /// Create a directory inside the session.
    fn mkdir(&self, path: &Path) -> Result<(), Error>;

    /// Recursively remove a path inside the session.
    fn rmtree(&self, path: &Path) -> Result<(), Error>;

    /// Copy a host directory into a fresh temporary location inside the session.
    fn project_from_directory(&self, path: &Path, subdir: Option<&str>) -> Result<Project, Error>;

    /// Export a version-controlled tree into a fresh temporary location inside the session.
    fn project_from_vcs(
        &self,
        tree: &dyn crate::vcs::VcsTree,
        include_controldir: Option<bool>,
        subdir: Option<&str>,
    ) -> Result<Project, Error>;

    /// Spawn a command, returning the live child.
    #[allow(clippy::too_many_arguments)]
    fn popen(
        &self,
        argv: Vec<&str>,
        cwd: Option<&Path>,
        user: Option<&str>,
        stdout: Option<std::process::Stdio>,
        stderr: Option<std::process::Stdio>,
        stdin: Option<std::process::Stdio>,
        env: Option<&HashMap<String, String>>,
    ) -> Result<std::process::Child, Error>;

    /// Whether this session's root is temporary and will be torn down on drop.
    fn is_temporary(&self) -> bool;

    /// Start building a command to run in this session.
    fn command<'a>(&'a self, argv: Vec<&'a str>) -> CommandBuilder<'a> {
        CommandBuilder::new(self, argv)
    }

    /// List the entries of a directory inside the session.
    fn read_dir(&self, path: &Path) -> Result<Vec<std::fs::DirEntry>, Error>;
}

/// Accumulates `cwd`/`user`/`env` overrides for a command, then dispatches through a
/// [`Session`].
pub struct CommandBuilder<'a> {
    session: &'a dyn Session,
    argv: Vec<&'a str>,
    cwd: Option<&'a Path>,
    user: Option<&'a str>,
    env: Option<HashMap<String, String>>,
    quiet: bool,
    stdout: Option<std::process::Stdio>,
    stderr: Option<std::process::Stdio>,
    stdin: Option<std::process::Stdio>,
}

impl<'a> CommandBuilder<'a> {
    /// Start building a command for `argv` against `session`.
    pub fn new(session: &'a dyn Session, argv: Vec<&'a str>) -> Self {
        Self {
            session,
            argv,
            cwd: None,
            user: None,
            env: None,
            quiet: false,
            stdout: None,
            stderr: None,
            stdin: None,
        }
    }

    /// Set the child's stdout handle for [`run`](Self::run).
    pub fn stdout(mut self, stdout: std::process::Stdio) -> Self {
        self.stdout = Some(stdout);
        self
    }

    /// Set the child's stderr handle for [`run`](Self::run).
    pub fn stderr(mut self, stderr: std::process::Stdio) -> Self {
        self.stderr = Some(stderr);
        self
    }

    /// Set the child's stdin handle for [`run`](Self::run).
    pub fn stdin(mut self, stdin: std::process::Stdio) -> Self {
        self.stdin = Some(stdin);
        self
    }

    /// Spawn the command with the configured stdio and wait for it to exit.
    pub fn run(self) -> Result<std::process::ExitStatus, Error> {
        let child = self.session.popen(
            self.argv,
            self.cwd,
            self.user,
            self.stdout,
            self.stderr,
            self.stdin,
            self.env.as_ref(),
        )?;
        child
            .wait_with_output()
            .map(|o| o.status)
            .map_err(Error::IoError)
    }

    /// Run the command in `cwd`.
    pub fn cwd(mut self, cwd: &'a Path) -> Self {
        self.cwd = Some(cwd);
        self
    }

    /// Run the command as `user`.
    pub fn user(mut self, user: &'a str) -> Self {
        self.user = Some(user);
        self
    }

    /// Set environment variable overrides for the command.
    pub fn env(mut self, env: HashMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    /// Suppress the "Running ..." log line.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Run the command, discarding output, failing if it exits non-zero.
    pub fn check_call(&self) -> Result<(), Error> {
        self.session
            .check_call(self.argv.clone(), self.cwd, self.user, self.env.clone())
    }

    /// Run the command, returning its captured stdout on success.
    pub fn check_output(&self) -> Result<Vec<u8>, Error> {
        self.session
            .check_output(self.argv.clone(), self.cwd, self.user, self.env.clone())
    }

    /// Run the command through the tee-based log analyzer, returning the collected lines
    /// on success, or a classified [`crate::analyze::AnalyzedError`] on failure.
    pub fn run_detecting_problems(&self) -> Result<Vec<String>, crate::analyze::AnalyzedError> {
        crate::analyze::run_detecting_problems(
            self.session,
            self.argv.clone(),
            None,
            self.quiet,
            self.cwd,
            self.user,
            self.env.clone(),
            None,
            None,
            None,
        )
    }

    /// Run the command, retrying with `fixers` applied whenever a recognized problem occurs.
    pub fn run_fixing_problems<I, E>(
        &self,
        fixers: &[&dyn crate::fix_build::BuildFixer<I>],
    ) -> Result<Vec<String>, crate::fix_build::IterateBuildError<E>>
    where
        I: std::error::Error,
        E: From<I> + std::error::Error + From<std::io::Error>,
    {
        crate::fix_build::run_fixing_problems::<I, E>(
            fixers,
            None,
            self.session,
            &self.argv,
            self.quiet,
            self.cwd,
            self.user,
            self.env.as_ref(),
        )
    }
}

/// Look up `name` on `$PATH` inside the session, returning its full path if found.
pub fn which(session: &dyn Session, name: &str) -> Option<String> {
    let ret = match session.check_output(vec!["which", name], Some(Path::new("/")), None, None) {
        Ok(ret) => ret,
        Err(Error::CalledProcessError(_)) => return None,
        Err(e) => {
            log::warn!("Unexpected error looking up {}: {}", name, e);
            return None;
        }
    };
    if ret.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(&ret).trim().to_string())
    }
}

/// Return the name of the user the session is currently running as.
pub fn get_user(session: &dyn Session) -> Result<String, Error> {
    let out = session.check_output(vec!["sh", "-c", "echo $USER"], Some(Path::new("/")), None, None)?;
    Ok(String::from_utf8_lossy(&out).trim().to_string())
}

/// Ensure `~/.cache`/the home directory exists for the invoking user. Used by drivers
/// whose tools (e.g. pip) expect a writable home directory.
pub fn create_home(session: &dyn Session) -> Result<(), Error> {
    let home = session.check_output(
        vec!["sh", "-c", "echo $HOME"],
        Some(Path::new("/")),
        None,
        None,
    )?;
    let home = String::from_utf8_lossy(&home).trim().to_string();
    if home.is_empty() {
        return Ok(());
    }
    if !session.exists(Path::new(&home)) {
        session.mkdir(Path::new(&home))?;
    }
    Ok(())
}

/// Spawn `argv`, forwarding every line of its merged stdout/stderr to the user's terminal
/// while simultaneously accumulating it (lossily decoded) for log analysis.
///
/// Returns `(retcode, lines)`.
#[allow(clippy::too_many_arguments)]
pub fn run_with_tee(
    session: &dyn Session,
    argv: Vec<&str>,
    cwd: Option<&Path>,
    user: Option<&str>,
    env: Option<HashMap<String, String>>,
    stdin: Option<std::process::Stdio>,
    stdout: Option<std::process::Stdio>,
    stderr: Option<std::process::Stdio>,
) -> Result<(i32, Vec<String>), Error> {
    use std::io::{BufRead, Write};
    use std::sync::mpsc;

    let mut child = session.popen(
        argv,
        cwd,
        user,
        stdout.or(Some(std::process::Stdio::piped())),
        stderr.or(Some(std::process::Stdio::piped())),
        stdin,
        env.as_ref(),
    )?;

    let (tx, rx) = mpsc::channel::<String>();

    let stdout_thread = child.stdout.take().map(|out| {
        let tx = tx.clone();
        std::thread::spawn(move || {
            for line in std::io::BufReader::new(out).lines().map_while(Result::ok) {
                let _ = tx.send(line);
            }
        })
    });
    let stderr_thread = child.stderr.take().map(|err| {
        std::thread::spawn(move || {
            for line in std::io::BufReader::new(err).lines().map_while(Result::ok) {
                let _ = tx.send(line);
            }
        })
    });
    drop(tx);

    let mut lines = Vec::new();
    let stdout_handle = std::io::stdout();
    for line in rx {
        let _ = writeln!(stdout_handle.lock(), "{}", line);
        lines.push(line);
    }

    if let Some(t) = stdout_thread {
        let _ = t.join();
    }
    if let Some(t) = stderr_thread {
        let _ = t.join();
    }

    let status = child.wait()?;
    Ok((status.code().unwrap_or(-1), lines))
}
