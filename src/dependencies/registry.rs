//! Central registration of every `Dependency` type's JSON requirement
//! family, mirroring the original's single `Requirement._JSON_DESERIALIZERS`
//! table but built on `inventory::submit!` so lookups go through the same
//! open, write-once-at-startup registry `SPEC_FULL.md` calls for elsewhere
//! (problem-to-requirement converters, fixers).
//!
//! Each entry just pairs a family tag with the concrete type's own derived
//! `Deserialize` impl; there is no attempt to reproduce the original's
//! string/tuple wire shapes exactly (see `dependency_from_json`'s doc
//! comment) since every `Dependency` struct here already derives
//! `Serialize`/`Deserialize` in a shape appropriate for Rust.

use crate::register_requirement_family;

register_requirement_family!("binary", crate::dependencies::BinaryDependency);
register_requirement_family!(
    "vcs-access",
    crate::dependencies::VcsControlDirectoryAccessDependency
);
register_requirement_family!("lua-module", crate::dependencies::LuaModuleDependency);
register_requirement_family!("cargo-crate", crate::dependencies::CargoCrateDependency);
register_requirement_family!("pkg-config", crate::dependencies::PkgConfigDependency);
register_requirement_family!("path", crate::dependencies::PathDependency);
register_requirement_family!("c-header", crate::dependencies::CHeaderDependency);
register_requirement_family!(
    "javascript-runtime",
    crate::dependencies::JavaScriptRuntimeDependency
);
register_requirement_family!("vala-package", crate::dependencies::ValaPackageDependency);
register_requirement_family!("ruby-gem", crate::dependencies::RubyGemDependency);
register_requirement_family!("dh-addon", crate::dependencies::DhAddonDependency);
register_requirement_family!("library", crate::dependencies::LibraryDependency);
register_requirement_family!(
    "static-library",
    crate::dependencies::StaticLibraryDependency
);
register_requirement_family!("ruby-file", crate::dependencies::RubyFileDependency);
register_requirement_family!(
    "sprockets-file",
    crate::dependencies::SprocketsFileDependency
);
register_requirement_family!("cmakefile", crate::dependencies::CMakeFileDependency);
register_requirement_family!(
    "maven-artifact",
    crate::dependencies::MavenArtifactDependency
);
register_requirement_family!("gnome-common", crate::dependencies::GnomeCommonDependency);
register_requirement_family!("qt-module", crate::dependencies::QtModuleDependency);
register_requirement_family!("qt", crate::dependencies::QTDependency);
register_requirement_family!("x11", crate::dependencies::X11Dependency);
register_requirement_family!(
    "certificate-authority",
    crate::dependencies::CertificateAuthorityDependency
);
register_requirement_family!("libtool", crate::dependencies::LibtoolDependency);
register_requirement_family!(
    "boost-component",
    crate::dependencies::BoostComponentDependency
);
register_requirement_family!(
    "kf5-component",
    crate::dependencies::KF5ComponentDependency
);
register_requirement_family!(
    "gnulib-directory",
    crate::dependencies::GnulibDirectoryDependency
);
register_requirement_family!(
    "introspection-type-lib",
    crate::dependencies::IntrospectionTypelibDependency
);

register_requirement_family!(
    "autoconf-macro",
    crate::dependencies::autoconf::AutoconfMacroDependency
);

register_requirement_family!("go-package", crate::dependencies::go::GoPackageDependency);
register_requirement_family!("go", crate::dependencies::go::GoDependency);

register_requirement_family!(
    "haskell-package",
    crate::dependencies::haskell::HaskellPackageDependency
);

register_requirement_family!(
    "java-class",
    crate::dependencies::java::JavaClassDependency
);
register_requirement_family!("jdk", crate::dependencies::java::JDKDependency);
register_requirement_family!("jre", crate::dependencies::java::JREDependency);
register_requirement_family!("jdk-file", crate::dependencies::java::JDKFileDependency);

register_requirement_family!(
    "latex-package",
    crate::dependencies::latex::LatexPackageDependency
);

register_requirement_family!(
    "npm-package",
    crate::dependencies::node::NodePackageDependency
);
register_requirement_family!(
    "node-module",
    crate::dependencies::node::NodeModuleDependency
);

register_requirement_family!(
    "octave-package",
    crate::dependencies::octave::OctavePackageDependency
);

register_requirement_family!(
    "perl-module",
    crate::dependencies::perl::PerlModuleDependency
);
register_requirement_family!(
    "perl-predeclared",
    crate::dependencies::perl::PerlPreDeclaredDependency
);
register_requirement_family!("perl-file", crate::dependencies::perl::PerlFileDependency);

register_requirement_family!("php-class", crate::dependencies::php::PhpClassDependency);
register_requirement_family!(
    "php-package",
    crate::dependencies::php::PhpPackageDependency
);
register_requirement_family!(
    "php-extension",
    crate::dependencies::php::PhpExtensionDependency
);

register_requirement_family!(
    "pytest-plugin",
    crate::dependencies::pytest::PytestPluginDependency
);

register_requirement_family!(
    "python-package",
    crate::dependencies::python::PythonPackageDependency
);
register_requirement_family!(
    "python-module",
    crate::dependencies::python::PythonModuleDependency
);
register_requirement_family!("python", crate::dependencies::python::PythonDependency);

register_requirement_family!("r-package", crate::dependencies::r::RPackageDependency);

register_requirement_family!("vague", crate::dependencies::vague::VagueDependency);

register_requirement_family!("xml-entity", crate::dependencies::xml::XmlEntityDependency);

#[cfg(feature = "debian")]
register_requirement_family!("debian", crate::dependencies::debian::DebianDependency);
