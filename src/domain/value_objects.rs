//! Domain value objects representing immutable concepts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Package ecosystems a dependency can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Npm,
    Pip,
    Maven,
    Gradle,
    Composer,
    NuGet,
    Go,
    Cargo,
    Gem,
}

impl Ecosystem {
    /// Get all supported ecosystems
    pub fn all() -> Vec<Ecosystem> {
        vec![
            Ecosystem::Npm,
            Ecosystem::Pip,
            Ecosystem::Maven,
            Ecosystem::Gradle,
            Ecosystem::Composer,
            Ecosystem::NuGet,
            Ecosystem::Go,
            Ecosystem::Cargo,
            Ecosystem::Gem,
        ]
    }

    /// Get the canonical name for this ecosystem, as used in reports and cache keys
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::Pip => "pip",
            Ecosystem::Maven => "maven",
            Ecosystem::Gradle => "gradle",
            Ecosystem::Composer => "composer",
            Ecosystem::NuGet => "nuget",
            Ecosystem::Go => "go",
            Ecosystem::Cargo => "cargo",
            Ecosystem::Gem => "gem",
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Normalized severity levels, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
    High,
    Critical,
}

impl Severity {
    /// Map an upstream free-text severity label onto the closed enum.
    ///
    /// Surrounding whitespace is ignored and matching is case-insensitive.
    /// The mapping is total: unknown or absent labels map to `Low`.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(|l| l.trim().to_lowercase()).as_deref() {
            Some("critical") => Severity::Critical,
            Some("high") => Severity::High,
            Some("medium") | Some("moderate") => Severity::Moderate,
            _ => Severity::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The manifest files probed in a repository, in enumeration order.
///
/// The order of [`ManifestKind::all`] fixes the order in which parsed
/// dependencies are grouped in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestKind {
    PackageJson,
    RequirementsTxt,
    GoMod,
    PomXml,
    CargoToml,
    ComposerJson,
    Gemfile,
}

impl ManifestKind {
    pub fn all() -> [ManifestKind; 7] {
        [
            ManifestKind::PackageJson,
            ManifestKind::RequirementsTxt,
            ManifestKind::GoMod,
            ManifestKind::PomXml,
            ManifestKind::CargoToml,
            ManifestKind::ComposerJson,
            ManifestKind::Gemfile,
        ]
    }

    pub fn filename(&self) -> &'static str {
        match self {
            ManifestKind::PackageJson => "package.json",
            ManifestKind::RequirementsTxt => "requirements.txt",
            ManifestKind::GoMod => "go.mod",
            ManifestKind::PomXml => "pom.xml",
            ManifestKind::CargoToml => "Cargo.toml",
            ManifestKind::ComposerJson => "composer.json",
            ManifestKind::Gemfile => "Gemfile",
        }
    }

    /// Repository languages (as reported by the hosting API) that make this manifest worth probing
    pub fn languages(&self) -> &'static [&'static str] {
        match self {
            ManifestKind::PackageJson => &["JavaScript", "TypeScript"],
            ManifestKind::RequirementsTxt => &["Python"],
            ManifestKind::GoMod => &["Go"],
            ManifestKind::PomXml => &["Java"],
            ManifestKind::CargoToml => &["Rust"],
            ManifestKind::ComposerJson => &["PHP"],
            ManifestKind::Gemfile => &["Ruby"],
        }
    }

    pub fn ecosystem(&self) -> Ecosystem {
        match self {
            ManifestKind::PackageJson => Ecosystem::Npm,
            ManifestKind::RequirementsTxt => Ecosystem::Pip,
            ManifestKind::GoMod => Ecosystem::Go,
            ManifestKind::PomXml => Ecosystem::Maven,
            ManifestKind::CargoToml => Ecosystem::Cargo,
            ManifestKind::ComposerJson => Ecosystem::Composer,
            ManifestKind::Gemfile => Ecosystem::Gem,
        }
    }

    /// Whether any of the given repository languages selects this manifest
    pub fn is_selected_by<'a, I>(&self, languages: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        languages
            .into_iter()
            .any(|lang| self.languages().contains(&lang))
    }
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.filename())
    }
}
