use crate::session::{Error, Project, Session};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A session that runs commands directly on the host, with no sandboxing.
///
/// `location()` is `/`; when `user` differs from the current user, commands are wrapped
/// in `sudo -u user`.
pub struct PlainSession {
    cwd: PathBuf,
}

impl PlainSession {
    /// Create a new plain session rooted at the process's current directory.
    pub fn new() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")),
        }
    }

    fn prepend_user<'a>(&'a self, user: Option<&'a str>, mut args: Vec<&'a str>) -> Vec<&'a str> {
        if let Some(user) = user {
            if user != whoami::username() {
                args = vec!["sudo", "-u", user].into_iter().chain(args).collect();
            }
        }
        args
    }

    fn resolve_cwd<'a>(&'a self, cwd: Option<&'a Path>) -> PathBuf {
        match cwd {
            Some(cwd) if cwd.is_absolute() => cwd.to_path_buf(),
            Some(cwd) => self.cwd.join(cwd),
            None => self.cwd.clone(),
        }
    }
}

impl Default for PlainSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for PlainSession {
    fn chdir(&mut self, path: &Path) -> Result<(), Error> {
        self.cwd = self.resolve_cwd(Some(path));
        Ok(())
    }

    fn pwd(&self) -> &Path {
        &self.cwd
    }

    fn external_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    fn location(&self) -> PathBuf {
        PathBuf::from("/")
    }

    fn check_output(
        &self,
        argv: Vec<&str>,
        cwd: Option<&Path>,
        user: Option<&str>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Vec<u8>, Error> {
        let argv = self.prepend_user(user, argv);
        let mut cmd = std::process::Command::new(argv[0]);
        cmd.args(&argv[1..]).current_dir(self.resolve_cwd(cwd));

        if let Some(env) = env {
            cmd.envs(env);
        }

        let output = cmd.output()?;
        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(Error::CalledProcessError(output.status.code().unwrap_or(-1)))
        }
    }

    fn check_call(
        &self,
        argv: Vec<&str>,
        cwd: Option<&Path>,
        user: Option<&str>,
        env: Option<HashMap<String, String>>,
    ) -> Result<(), Error> {
        let argv = self.prepend_user(user, argv);
        let mut cmd = std::process::Command::new(argv[0]);
        cmd.args(&argv[1..]).current_dir(self.resolve_cwd(cwd));

        if let Some(env) = env {
            cmd.envs(env);
        }

        let status = cmd.status()?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::CalledProcessError(status.code().unwrap_or(-1)))
        }
    }

    fn create_home(&self) -> Result<(), Error> {
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.external_path(path).exists()
    }

    fn mkdir(&self, path: &Path) -> Result<(), Error> {
        std::fs::create_dir_all(self.external_path(path)).map_err(Error::IoError)
    }

    fn rmtree(&self, path: &Path) -> Result<(), Error> {
        let path = self.external_path(path);
        if path.is_dir() {
            std::fs::remove_dir_all(path).map_err(Error::IoError)
        } else if path.exists() {
            std::fs::remove_file(path).map_err(Error::IoError)
        } else {
            Ok(())
        }
    }

    fn project_from_directory(&self, path: &Path, subdir: Option<&str>) -> Result<Project, Error> {
        let internal_path = match subdir {
            Some(subdir) => path.join(subdir),
            None => path.to_path_buf(),
        };
        Ok(Project::Existing {
            external_path: internal_path.clone(),
            internal_path,
        })
    }

    fn project_from_vcs(
        &self,
        tree: &dyn crate::vcs::VcsTree,
        _include_controldir: Option<bool>,
        subdir: Option<&str>,
    ) -> Result<Project, Error> {
        let td = tempfile::tempdir().map_err(Error::IoError)?;
        let subdir = subdir.unwrap_or("package");
        let export_directory = td.path().join(subdir);
        tree.export_to(&export_directory, Path::new(""))
            .map_err(|e| Error::SetupFailure("vcs export failed".to_string(), e.to_string()))?;
        Ok(Project::Temporary {
            internal_path: export_directory.clone(),
            external_path: export_directory,
            td: td.into_path(),
        })
    }

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
    ) -> Result<std::process::Child, Error> {
        let argv = self.prepend_user(user, argv);
        let mut cmd = std::process::Command::new(argv[0]);
        cmd.args(&argv[1..]).current_dir(self.resolve_cwd(cwd));

        if let Some(env) = env {
            cmd.envs(env.clone());
        }
        if let Some(stdin) = stdin {
            cmd.stdin(stdin);
        }
        if let Some(stdout) = stdout {
            cmd.stdout(stdout);
        }
        if let Some(stderr) = stderr {
            cmd.stderr(stderr);
        }

        cmd.spawn().map_err(Error::IoError)
    }

    fn is_temporary(&self) -> bool {
        false
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<std::fs::DirEntry>, Error> {
        std::fs::read_dir(self.external_path(path))
            .map_err(Error::IoError)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(Error::IoError)
    }
}
