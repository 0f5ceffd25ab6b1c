//! Debian build dependency handling.
//!
//! This module provides functionality for handling Debian build dependencies,
//! including tie-breaking between multiple potential dependencies.

use crate::dependencies::debian::DebianDependency;
use crate::dependencies::debian::TieBreaker;
use crate::session::Session;
use debian_control::lossless::relations::Relations;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Tie-breaker for Debian build dependencies.
///
/// This tie-breaker selects the most commonly used dependency based on
/// analyzing build dependencies across all source packages in the locally
/// cached APT Sources indexes.
pub struct BuildDependencyTieBreaker {
    /// Directory holding the cached `*_Sources` index files (normally
    /// `/var/lib/apt/lists`, resolved inside the session).
    sources_dir: PathBuf,
    /// Cached counts of build dependency usage
    counts: RefCell<Option<HashMap<String, i32>>>,
}

impl BuildDependencyTieBreaker {
    /// Create a new BuildDependencyTieBreaker from a session.
    ///
    /// # Arguments
    /// * `session` - Session to use for accessing the local APT cache
    ///
    /// # Returns
    /// A new BuildDependencyTieBreaker instance
    pub fn from_session(session: &dyn Session) -> Self {
        Self {
            sources_dir: session.external_path(Path::new("/var/lib/apt/lists")),
            counts: RefCell::new(None),
        }
    }

    /// Count the occurrences of each build dependency across all cached source packages.
    ///
    /// This method scans the cached `*_Sources` indexes under `sources_dir` and counts
    /// how many times each package is used as a build dependency.
    ///
    /// # Returns
    /// HashMap mapping package names to their usage count
    fn count(&self) -> HashMap<String, i32> {
        let mut counts = HashMap::new();

        let entries = match std::fs::read_dir(&self.sources_dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!(
                    "Unable to read apt lists directory {}: {}",
                    self.sources_dir.display(),
                    e
                );
                return counts;
            }
        };

        for entry in entries.filter_map(Result::ok) {
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if !file_name.contains("_Sources") {
                continue;
            }

            let ext = Path::new(file_name.as_ref())
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default();

            let f = match std::fs::File::open(entry.path()) {
                Ok(f) => f,
                Err(_) => continue,
            };

            let mut text = String::new();
            if crate::debian::file_search::unwrap(f, &ext)
                .read_to_string(&mut text)
                .is_err()
            {
                continue;
            }

            let doc: deb822_lossless::Deb822 = match text.parse() {
                Ok(doc) => doc,
                Err(_) => continue,
            };

            for para in doc.paragraphs() {
                for field in ["Build-Depends", "Build-Depends-Indep", "Build-Depends-Arch"] {
                    let value = match para.get(field) {
                        Some(value) => value,
                        None => continue,
                    };
                    let rels: Relations = match value.parse() {
                        Ok(rels) => rels,
                        Err(_) => continue,
                    };
                    for e in rels.entries() {
                        for r in e.relations() {
                            *counts.entry(r.name()).or_insert(0) += 1;
                        }
                    }
                }
            }
        }
        counts
    }
}

/// Implementation of TieBreaker for BuildDependencyTieBreaker.
impl TieBreaker for BuildDependencyTieBreaker {
    /// Break a tie between multiple Debian dependencies by selecting the most commonly used one.
    ///
    /// # Arguments
    /// * `reqs` - Slice of Debian dependency candidates to choose from
    ///
    /// # Returns
    /// The most commonly used dependency, or None if no candidates are available
    fn break_tie<'a>(&self, reqs: &[&'a DebianDependency]) -> Option<&'a DebianDependency> {
        if self.counts.borrow().is_none() {
            let counts = self.count();
            self.counts.replace(Some(counts));
        }

        let c = self.counts.borrow();
        let count = c.clone().unwrap();
        let mut by_count = HashMap::new();
        for req in reqs {
            let name = req.package_names().into_iter().next().unwrap();
            by_count.insert(req, count[&name]);
        }
        if by_count.is_empty() {
            return None;
        }
        let top = by_count.iter().max_by_key(|k| k.1).unwrap();
        log::info!(
            "Breaking tie between [{:?}] to {:?} based on build-depends count",
            reqs.iter().map(|r| r.relation_string()).collect::<Vec<_>>(),
            top.0.relation_string(),
        );
        Some(*top.0)
    }
}
