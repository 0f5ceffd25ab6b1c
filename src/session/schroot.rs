//! Sessions backed by an existing [schroot](https://wiki.debian.org/Schroot) chroot.
//!
//! A [`SchrootSession`] opens a throwaway schroot session (`schroot -b`) on construction
//! and closes it (`schroot -e`) on drop; every command is run via `schroot -r -c
//! session:<id>`.

use crate::session::{CommandBuilder, Error, Project, Session};
use rand::Rng;
use std::collections::HashMap;
use std::iter;
use std::path::{Path, PathBuf};

/// Strip a chroot name down to characters schroot accepts in a session name.
pub fn sanitize_session_name(name: &str) -> String {
    name.chars()
        .filter(|&c| c.is_alphanumeric() || "_-.".contains(c))
        .collect()
}

/// Generate a session name from `prefix` plus a random alphanumeric suffix.
pub fn generate_session_id(prefix: &str) -> String {
    let suffix: String = String::from_utf8(
        iter::repeat(())
            .map(|()| rand::thread_rng().sample(rand::distributions::Alphanumeric))
            .take(8)
            .collect(),
    )
    .unwrap();
    format!("{}-{}", sanitize_session_name(prefix), suffix)
}

/// A session running inside an schroot chroot.
pub struct SchrootSession {
    chroot: String,
    session_id: String,
    location: PathBuf,
    cwd: PathBuf,
}

impl SchrootSession {
    /// Open a new session against `chroot` (a name from `schroot -l`).
    ///
    /// `session_prefix`, if given, is used as the base name schroot assigns the session;
    /// otherwise schroot picks one itself.
    pub fn new(chroot: &str, session_prefix: Option<&str>) -> Result<Self, Error> {
        let mut argv = vec!["schroot".to_string(), "-c".to_string(), chroot.to_string()];
        if let Some(prefix) = session_prefix {
            argv.push("-n".to_string());
            argv.push(sanitize_session_name(prefix));
        }
        argv.push("-b".to_string());

        let output = std::process::Command::new(&argv[0])
            .args(&argv[1..])
            .stderr(std::process::Stdio::piped())
            .output()
            .map_err(Error::IoError)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            let reason = lines.last().copied().unwrap_or("no output from schroot");
            return Err(Error::SetupFailure(
                reason.to_string(),
                stderr.to_string(),
            ));
        }

        let session_id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        log::info!("Opened schroot session {} (from {})", session_id, chroot);

        let location_output = std::process::Command::new("schroot")
            .args(["--location", "-c", &format!("session:{}", session_id)])
            .output()
            .map_err(Error::IoError)?;
        let location = PathBuf::from(
            String::from_utf8_lossy(&location_output.stdout)
                .trim()
                .to_string(),
        );

        Ok(Self {
            chroot: chroot.to_string(),
            session_id,
            location,
            cwd: PathBuf::from("/"),
        })
    }

    fn run_argv<'a>(
        &'a self,
        argv: Vec<&'a str>,
        cwd: Option<&'a Path>,
        user: Option<&'a str>,
        env: Option<&HashMap<String, String>>,
    ) -> Vec<String> {
        let mut base = vec![
            "schroot".to_string(),
            "-r".to_string(),
            "-c".to_string(),
            format!("session:{}", self.session_id),
        ];
        let cwd = cwd.unwrap_or(&self.cwd);
        base.push("-d".to_string());
        base.push(cwd.to_string_lossy().to_string());
        if let Some(user) = user {
            base.push("-u".to_string());
            base.push(user.to_string());
        }
        base.push("--".to_string());

        if let Some(env) = env.filter(|e| !e.is_empty()) {
            let assignments = env
                .iter()
                .map(|(k, v)| format!("{}={} ", k, shlex::try_quote(v).unwrap()))
                .collect::<String>();
            let quoted_argv = argv
                .iter()
                .map(|a| shlex::try_quote(a).unwrap().to_string())
                .collect::<Vec<_>>()
                .join(" ");
            base.extend(["sh".to_string(), "-c".to_string(), format!("{}{}", assignments, quoted_argv)]);
        } else {
            base.extend(argv.into_iter().map(|s| s.to_string()));
        }
        base
    }
}

impl Drop for SchrootSession {
    fn drop(&mut self) {
        let output = std::process::Command::new("schroot")
            .args(["-c", &format!("session:{}", self.session_id), "-e"])
            .output();
        match output {
            Ok(output) if output.status.success() => {}
            Ok(output) => {
                for line in String::from_utf8_lossy(&output.stderr).lines() {
                    if let Some(msg) = line.strip_prefix("E: ") {
                        log::error!("{}", msg);
                    }
                }
                log::warn!(
                    "Failed to close schroot session {}, leaving stray.",
                    self.session_id
                );
            }
            Err(e) => log::warn!("Failed to close schroot session {}: {}", self.session_id, e),
        }
    }
}

impl Session for SchrootSession {
    fn chdir(&mut self, path: &Path) -> Result<(), Error> {
        self.cwd = path.to_path_buf();
        Ok(())
    }

    fn pwd(&self) -> &Path {
        &self.cwd
    }

    fn external_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            self.location.join(path.strip_prefix("/").unwrap())
        } else {
            self.location
                .join(self.cwd.strip_prefix("/").unwrap_or(&self.cwd))
                .join(path)
        }
    }

    fn location(&self) -> PathBuf {
        self.location.clone()
    }

    fn check_output(
        &self,
        argv: Vec<&str>,
        cwd: Option<&Path>,
        user: Option<&str>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Vec<u8>, Error> {
        let argv = self.run_argv(argv, cwd, user, env.as_ref());
        let output = std::process::Command::new(&argv[0]).args(&argv[1..]).output()?;
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
        let argv = self.run_argv(argv, cwd, user, env.as_ref());
        let status = std::process::Command::new(&argv[0]).args(&argv[1..]).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::CalledProcessError(status.code().unwrap_or(-1)))
        }
    }

    fn create_home(&self) -> Result<(), Error> {
        crate::session::create_home(self)
    }

    fn exists(&self, path: &Path) -> bool {
        self.external_path(path).exists()
    }

    fn mkdir(&self, path: &Path) -> Result<(), Error> {
        std::fs::create_dir(self.external_path(path)).map_err(Error::IoError)
    }

    fn rmtree(&self, path: &Path) -> Result<(), Error> {
        std::fs::remove_dir_all(self.external_path(path)).map_err(Error::IoError)
    }

    fn project_from_directory(&self, path: &Path, subdir: Option<&str>) -> Result<Project, Error> {
        let subdir = subdir.unwrap_or("package");
        let build_dir = self.location.join("build");
        std::fs::create_dir_all(&build_dir).map_err(Error::IoError)?;
        let td = tempfile::tempdir_in(&build_dir).map_err(Error::IoError)?;
        let reldir = PathBuf::from("/").join(
            td.path()
                .strip_prefix(&self.location)
                .unwrap_or(td.path()),
        );
        let export_directory = td.path().join(subdir);

        let mut options = fs_extra::dir::CopyOptions::new();
        options.copy_inside = true;
        fs_extra::dir::copy(path, &export_directory, &options)
            .map_err(|e| Error::SetupFailure("copy failed".to_string(), e.to_string()))?;

        Ok(Project::Temporary {
            external_path: export_directory,
            internal_path: reldir.join(subdir),
            td: td.into_path(),
        })
    }

    fn project_from_vcs(
        &self,
        tree: &dyn crate::vcs::VcsTree,
        _include_controldir: Option<bool>,
        subdir: Option<&str>,
    ) -> Result<Project, Error> {
        let subdir = subdir.unwrap_or("package");
        let build_dir = self.location.join("build");
        std::fs::create_dir_all(&build_dir).map_err(Error::IoError)?;
        let td = tempfile::tempdir_in(&build_dir).map_err(Error::IoError)?;
        let reldir = PathBuf::from("/").join(
            td.path()
                .strip_prefix(&self.location)
                .unwrap_or(td.path()),
        );
        let export_directory = td.path().join(subdir);
        tree.export_to(&export_directory, Path::new(""))
            .map_err(|e| Error::SetupFailure("vcs export failed".to_string(), e.to_string()))?;

        Ok(Project::Temporary {
            external_path: export_directory,
            internal_path: reldir.join(subdir),
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
        let argv = self.run_argv(argv, cwd, user, env);
        let mut cmd = std::process::Command::new(&argv[0]);
        cmd.args(&argv[1..]);
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
        true
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<std::fs::DirEntry>, Error> {
        std::fs::read_dir(self.external_path(path))
            .map_err(Error::IoError)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(Error::IoError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_unsafe_characters() {
        assert_eq!(sanitize_session_name("sid/amd64"), "sidamd64");
        assert_eq!(sanitize_session_name("my-chroot_1.0"), "my-chroot_1.0");
    }

    #[test]
    fn generate_session_id_keeps_prefix() {
        let id = generate_session_id("sid");
        assert!(id.starts_with("sid-"));
        assert_eq!(id.len(), "sid-".len() + 8);
    }
}
