use clap::Parser;
#[cfg(feature = "debian")]
use debian_control::Control;
use ognibuild::analyze::AnalyzedError;
use ognibuild::buildsystem::Error;
use ognibuild::vcs::{LocalVcsTree, VcsTree};
use std::path::{Path, PathBuf};

#[derive(Clone, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Auto,
    Vcs,
    Buildsystem,
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Mode::Auto),
            "vcs" => Ok(Mode::Vcs),
            "buildsystem" => Ok(Mode::Buildsystem),
            _ => Err(format!("Unknown mode: {}", s)),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Mode::Auto => write!(f, "auto"),
            Mode::Vcs => write!(f, "vcs"),
            Mode::Buildsystem => write!(f, "buildsystem"),
        }
    }
}

#[derive(Parser)]
struct Args {
    #[clap(short, long, default_value = "unstable-amd64-sbuild")]
    /// Name of chroot to use
    chroot: String,

    #[clap(default_value = ".")]
    /// Directory with upstream source.
    directory: PathBuf,

    #[clap(long)]
    /// Path to packaging directory.
    packaging_directory: Option<PathBuf>,

    #[clap(long, default_value = "..")]
    /// Target directory
    target_directory: PathBuf,

    #[clap(long)]
    /// Enable debug output.
    debug: bool,

    #[clap(long, default_value = "auto")]
    /// Mechanism to use to create buildsystem
    mode: Mode,

    #[clap(long)]
    /// Include control directory in tarball.
    include_controldir: bool,
}

/// Copy `tree` into a plain `dist.tar.gz` at `target`, with no build tooling involved.
fn simple_export(tree: &dyn VcsTree, target: &Path) {
    let td = tempfile::tempdir().unwrap();
    tree.export_to(td.path(), Path::new("")).unwrap();
    let status = std::process::Command::new("tar")
        .arg("czf")
        .arg(target)
        .arg("-C")
        .arg(td.path())
        .arg(".")
        .status()
        .unwrap();
    if !status.success() {
        log::error!("tar exited with {}", status);
    }
}

pub fn main() -> Result<(), i32> {
    let args = Args::parse();
    env_logger::builder()
        .filter_level(if args.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    let tree = LocalVcsTree::new(&args.directory);

    #[cfg(feature = "debian")]
    let (packaging_tree, package_name): (Option<LocalVcsTree>, Option<String>) =
        if let Some(packaging_directory) = &args.packaging_directory {
            let packaging_tree = LocalVcsTree::new(packaging_directory);
            let text = packaging_tree
                .get_file_text(Path::new("debian/control"))
                .unwrap();
            let control: Control = String::from_utf8(text).unwrap().parse().unwrap();
            let package_name = control.source().unwrap().name().unwrap();
            (Some(packaging_tree), Some(package_name))
        } else {
            (None, None)
        };

    #[cfg(not(feature = "debian"))]
    let (packaging_tree, package_name): (Option<LocalVcsTree>, Option<String>) = (None, None);

    let target = args
        .target_directory
        .canonicalize()
        .unwrap()
        .join("dist.tar.gz");

    match args.mode {
        Mode::Vcs => {
            simple_export(&tree, &target);
            Ok(())
        }
        Mode::Auto | Mode::Buildsystem => {
            #[cfg(not(target_os = "linux"))]
            {
                log::error!("Unsupported mode: {}", args.mode);
                Err(1)
            }
            #[cfg(target_os = "linux")]
            match ognibuild::dist::create_dist_schroot(
                &tree,
                &args.target_directory.canonicalize().unwrap(),
                &args.chroot,
                packaging_tree.as_ref().map(|t| t as &dyn VcsTree),
                package_name.as_deref(),
                Some(args.include_controldir),
                &mut ognibuild::logs::NoLogManager,
                None,
            ) {
                Ok(ret) => {
                    log::info!("Created {}", ret.to_str().unwrap());
                    Ok(())
                }
                Err(Error::SessionError(e)) => {
                    log::error!("Session error: {}", e);
                    Err(1)
                }
                Err(Error::InstallerError(e)) => {
                    log::error!("Dependency install error: {}", e);
                    Err(1)
                }
                Err(Error::NoBuildToolsFound) => {
                    if args.mode == Mode::Buildsystem {
                        log::error!("No build system detected, unable to create tarball");
                        Err(1)
                    } else {
                        log::info!("No build system detected, falling back to simple export.");
                        simple_export(&tree, &target);
                        Ok(())
                    }
                }
                Err(Error::Unimplemented) => {
                    if args.mode == Mode::Buildsystem {
                        log::error!("Unable to ask buildsystem for tarball");
                        Err(1)
                    } else {
                        log::info!("Build system does not support dist tarball creation, falling back to simple export.");
                        simple_export(&tree, &target);
                        Ok(())
                    }
                }
                Err(Error::Error(AnalyzedError::Unidentified { lines, .. })) => {
                    log::error!("Unidentified error: {:?}", lines);
                    Err(1)
                }
                Err(Error::Error(error)) => {
                    log::error!("Identified error during dist creation: {}", error);
                    Err(1)
                }
            }
        }
    }
}
