use clap::Parser;
use debian_control::lossless::relations::{Entry, Relations};
use ognibuild::session::Session;
use ognibuild::vcs::{LocalVcsTree, VcsTree};
use std::io::Write;
use std::path::{Path, PathBuf};

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

#[derive(Parser)]
struct Args {
    #[clap(short, long)]
    /// Be verbose
    debug: bool,

    #[clap(short, long)]
    /// Update current package
    update: bool,

    #[clap(short, long, default_value = ".")]
    /// Directory to run in
    directory: PathBuf,
}

fn main() -> Result<(), i8> {
    let args = Args::parse();

    env_logger::builder()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .filter(
            None,
            if args.debug {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            },
        )
        .init();

    let wt = LocalVcsTree::new(&args.directory);
    let subpath = Path::new("");

    let mut build_deps = vec![];
    let mut test_deps = vec![];

    let mut session: Box<dyn Session> = Box::new(ognibuild::session::plain::PlainSession::new());
    let project = session.project_from_vcs(&wt, None, None).unwrap();
    for bs in ognibuild::buildsystem::detect_buildsystems(&wt.basedir().join(subpath)) {
        session.chdir(project.internal_path()).unwrap();

        let (bs_build_deps, bs_test_deps) =
            ognibuild::debian::upstream_deps::get_project_wide_deps(session.as_ref(), bs.as_ref());
        build_deps.extend(bs_build_deps);
        test_deps.extend(bs_test_deps);
    }
    if !build_deps.is_empty() {
        println!(
            "Build-Depends: {}",
            build_deps
                .iter()
                .map(|x| x.relation_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    if !test_deps.is_empty() {
        println!(
            "Test-Depends: {}",
            test_deps
                .iter()
                .map(|x| x.relation_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    if args.update {
        let packaging_context = ognibuild::debian::context::DebianPackagingContext::new(
            Box::new(wt.clone()),
            subpath,
            None,
            true,
        );
        let edit = packaging_context.edit_control().unwrap();
        let mut source = edit.source().unwrap();
        let mut relations = source.build_depends().unwrap_or_else(Relations::new);
        let old_str = relations.to_string();

        for build_dep in build_deps {
            for entry in build_dep.iter() {
                ensure_relation(&mut relations, entry);
            }
        }

        if old_str != relations.to_string() {
            log::info!("Bumped to {}", relations);
            source.set_build_depends(&relations);
        }

        edit.commit().unwrap();
    }
    Ok(())
}
