//! Traits for manifest parsers

use crate::application::errors::ParseError;
use crate::domain::{Dependency, Ecosystem, ManifestKind};
use tracing::warn;

use super::{
    ComposerParser, GemfileParser, GoModParser, MavenParser, NpmParser, RequirementsTxtParser,
    CargoParser,
};

/// Trait for parsing dependency manifests.
///
/// Parsers are pure: they never touch the network and never fail outward.
/// [`PackageFileParser::parse`] turns any parse error into an empty list.
pub trait PackageFileParser: Send + Sync {
    /// Get the ecosystem this parser handles
    fn ecosystem(&self) -> Ecosystem;

    /// Parse the manifest content and extract dependencies in declaration order.
    ///
    /// `include_dev` only affects manifests with a separate development section.
    fn parse_file(&self, content: &str, include_dev: bool) -> Result<Vec<Dependency>, ParseError>;

    /// Parse the manifest, degrading any failure to "no dependencies found"
    fn parse(&self, content: &str, include_dev: bool) -> Vec<Dependency> {
        match self.parse_file(content, include_dev) {
            Ok(dependencies) => dependencies,
            Err(e) => {
                warn!(
                    ecosystem = %self.ecosystem(),
                    error = %e,
                    "Failed to parse manifest, treating it as empty"
                );
                Vec::new()
            }
        }
    }
}

/// Resolves manifests to their parsers
pub struct ParserFactory;

impl ParserFactory {
    /// The parser for a manifest kind
    pub fn parser_for(kind: ManifestKind) -> &'static dyn PackageFileParser {
        match kind {
            ManifestKind::PackageJson => &NpmParser,
            ManifestKind::RequirementsTxt => &RequirementsTxtParser,
            ManifestKind::GoMod => &GoModParser,
            ManifestKind::PomXml => &MavenParser,
            ManifestKind::CargoToml => &CargoParser,
            ManifestKind::ComposerJson => &ComposerParser,
            ManifestKind::Gemfile => &GemfileParser,
        }
    }
}
