//! Debian-specific variant of the generic build-and-fix loop.
//!
//! Where [`crate::fix_build::run_fixing_problems`] installs missing
//! dependencies into a session, this module mutates the package's own
//! `debian/control`/`debian/tests/control` so the fix survives in the
//! packaging branch, resetting the tree and retrying the build after
//! every change.

use crate::debian::build::{attempt_build, BuildOnceError, BuildOnceResult};
use crate::debian::context::Error;
use crate::fix_build::InterimError;
use crate::vcs::VcsTree;
use buildlog_consultant::sbuild::Phase;
use buildlog_consultant::Problem;
use std::path::{Path, PathBuf};

/// Copy the build log from a failed build into the user's log cache.
pub fn rescue_build_log(
    output_directory: &Path,
    tree: Option<&dyn VcsTree>,
) -> Result<(), std::io::Error> {
    let xdg_cache_dir = std::env::var("XDG_CACHE_HOME").ok().map_or_else(
        || std::env::home_dir().unwrap().join(".cache"),
        PathBuf::from,
    );
    let buildlogs_dir = xdg_cache_dir.join("ognibuild/buildlogs");
    std::fs::create_dir_all(&buildlogs_dir)?;

    let target_log_file = buildlogs_dir.join(format!(
        "{}-{}.log",
        tree.map_or_else(|| PathBuf::from("build"), |t| t.basedir().to_path_buf())
            .display(),
        chrono::Local::now().format("%Y-%m-%d_%H%M%s"),
    ));
    std::fs::copy(output_directory.join("build.log"), &target_log_file)?;
    log::info!("Build log available in {}", target_log_file.display());

    Ok(())
}

/// A fixer that can resolve a problem encountered during a Debian package build,
/// given the phase (build, a named autopkgtest, ...) it occurred in.
pub trait DebianBuildFixer: std::fmt::Debug + std::fmt::Display {
    /// Check if this fixer can potentially resolve the given problem.
    fn can_fix(&self, problem: &dyn Problem) -> bool;

    /// Attempt to resolve the given problem.
    fn fix(&self, problem: &dyn Problem, phase: &Phase) -> Result<bool, InterimError<Error>>;
}

fn resolve_error(
    problem: &dyn Problem,
    phase: &Phase,
    fixers: &[&dyn DebianBuildFixer],
) -> Result<bool, InterimError<Error>> {
    let relevant_fixers = fixers
        .iter()
        .filter(|fixer| fixer.can_fix(problem))
        .collect::<Vec<_>>();
    if relevant_fixers.is_empty() {
        log::warn!("No fixer found for {:?}", problem);
        return Ok(false);
    }
    for fixer in relevant_fixers {
        log::info!("Attempting to use fixer {} to address {:?}", fixer, problem);
        if fixer.fix(problem, phase)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Error raised when [`build_incrementally`] gives up.
#[derive(Debug)]
pub enum IterateBuildError {
    /// The fixer attempt limit was reached.
    FixerLimitReached(usize),
    /// A problem was recognized but the fixer for it didn't resolve it, or it recurred.
    Persistent(Phase, Box<dyn Problem>),
    /// The build log could not be classified into a known problem.
    Unidentified {
        /// Phase the build was in when it failed, if known.
        phase: Option<Phase>,
        /// Process return code.
        retcode: i32,
        /// Human-readable description of the error.
        description: String,
    },
    /// A fixer failed for a reason unrelated to the problem it was trying to fix.
    Other(Error),
    /// Resetting the working tree between attempts failed.
    ResetTree(std::io::Error),
}

impl std::fmt::Display for IterateBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IterateBuildError::FixerLimitReached(limit) => {
                write!(f, "Fixer limit reached: {}", limit)
            }
            IterateBuildError::Persistent(phase, p) => {
                write!(f, "Persistent build problem in {}: {}", phase, p)
            }
            IterateBuildError::Unidentified {
                phase,
                retcode,
                description,
            } => write!(
                f,
                "Unidentified error (phase {:?}, retcode {}): {}",
                phase, retcode, description
            ),
            IterateBuildError::Other(e) => write!(f, "{}", e),
            IterateBuildError::ResetTree(e) => write!(f, "Failed to reset tree: {}", e),
        }
    }
}

impl std::error::Error for IterateBuildError {}

/// Default number of fix attempts before giving up.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Build a package, fixing up missing build/test dependencies in the
/// packaging branch itself and retrying, until it builds or the fixers run out.
#[allow(clippy::too_many_arguments)]
pub fn build_incrementally(
    local_tree: &dyn VcsTree,
    suffix: Option<&str>,
    build_suite: Option<&str>,
    output_directory: &Path,
    build_command: &str,
    fixers: &[&dyn DebianBuildFixer],
    build_changelog_entry: Option<&str>,
    max_iterations: Option<usize>,
    subpath: &Path,
    source_date_epoch: Option<chrono::DateTime<chrono::Utc>>,
    apt_repository: Option<&str>,
    apt_repository_key: Option<&str>,
    extra_repositories: Option<&Vec<&str>>,
    run_gbp_dch: bool,
) -> Result<BuildOnceResult, IterateBuildError> {
    let mut fixed_errors: std::collections::HashSet<Box<dyn Problem>> =
        std::collections::HashSet::new();

    loop {
        match attempt_build(
            local_tree,
            suffix,
            build_suite,
            output_directory,
            build_command,
            build_changelog_entry,
            subpath,
            source_date_epoch,
            run_gbp_dch,
            apt_repository,
            apt_repository_key,
            extra_repositories,
        ) {
            Ok(result) => return Ok(result),
            Err(BuildOnceError::Unidentified {
                phase,
                retcode,
                description,
                ..
            }) => {
                log::warn!("Build failed with unidentified error. Giving up.");
                return Err(IterateBuildError::Unidentified {
                    phase,
                    retcode,
                    description,
                });
            }
            Err(BuildOnceError::Detailed {
                phase,
                retcode,
                error,
                description,
                ..
            }) => {
                let phase = match phase {
                    Some(phase) => phase,
                    None => {
                        log::info!("No relevant context, not making any changes.");
                        return Err(IterateBuildError::Unidentified {
                            phase: None,
                            retcode,
                            description,
                        });
                    }
                };

                if fixed_errors.contains(&error) {
                    log::warn!("Error was still not fixed on second try. Giving up.");
                    return Err(IterateBuildError::Persistent(phase, error));
                }

                if let Some(limit) = max_iterations {
                    if fixed_errors.len() > limit {
                        log::warn!("Last fix did not address the issue. Giving up.");
                        return Err(IterateBuildError::FixerLimitReached(limit));
                    }
                }

                local_tree.revert().map_err(IterateBuildError::ResetTree)?;

                match resolve_error(error.as_ref(), &phase, fixers) {
                    Ok(true) => {}
                    Ok(false) => {
                        log::warn!("Failed to resolve error {:?}. Giving up.", error);
                        return Err(IterateBuildError::Persistent(phase, error));
                    }
                    Err(InterimError::Other(context_error)) => {
                        if matches!(context_error, Error::CircularDependency(_)) {
                            log::warn!(
                                "Unable to fix {:?}; it would introduce a circular dependency.",
                                error
                            );
                        }
                        return Err(IterateBuildError::Other(context_error));
                    }
                    Err(InterimError::Recognized(_)) | Err(InterimError::Unidentified { .. }) => {
                        return Err(IterateBuildError::Persistent(phase, error));
                    }
                }

                fixed_errors.insert(error);

                let log_path = output_directory.join("build.log");
                if log_path.exists() {
                    let mut i = 1;
                    while output_directory.join(format!("build.log.{}", i)).exists() {
                        i += 1;
                    }
                    std::fs::rename(&log_path, output_directory.join(format!("build.log.{}", i)))
                        .map_err(|e| IterateBuildError::Other(Error::IoError(e)))?;
                }
            }
        }
    }
}
