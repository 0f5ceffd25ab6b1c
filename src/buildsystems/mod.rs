/// Make (and GNU Autotools) build system implementation.
pub mod make;
/// Node.js build system implementation.
pub mod node;
/// Pear (PHP) build system implementation.
pub mod pear;
/// Perl Dist::Zilla build system implementation.
pub mod perl;
/// Python build system implementations (setup.py, pyproject.toml, setup.cfg).
pub mod python;
/// Ruby gem build system implementation.
pub mod ruby;
/// Waf build system implementation.
pub mod waf;
