//! PHP ecosystem parser (composer.json)

use super::npm::parse_json_manifest;
use super::traits::PackageFileParser;
use crate::application::errors::ParseError;
use crate::domain::{Dependency, Ecosystem};

/// Parser for composer.json files
#[derive(Debug, Default, Clone, Copy)]
pub struct ComposerParser;

impl ComposerParser {
    pub fn new() -> Self {
        Self
    }
}

impl PackageFileParser for ComposerParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Composer
    }

    fn parse_file(&self, content: &str, include_dev: bool) -> Result<Vec<Dependency>, ParseError> {
        parse_json_manifest(
            content,
            Ecosystem::Composer,
            "require",
            "require-dev",
            include_dev,
        )
    }
}
