//! Ruby ecosystem parser (Gemfile)

use super::traits::PackageFileParser;
use crate::application::errors::ParseError;
use crate::domain::{Dependency, Ecosystem};
use regex::Regex;

/// Parser for Gemfile files.
///
/// Reads `gem` directives: the first quoted argument is the name and the
/// second, if any, the version constraint (kept as written).
#[derive(Debug, Default, Clone, Copy)]
pub struct GemfileParser;

impl GemfileParser {
    pub fn new() -> Self {
        Self
    }
}

impl PackageFileParser for GemfileParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Gem
    }

    fn parse_file(&self, content: &str, _include_dev: bool) -> Result<Vec<Dependency>, ParseError> {
        let quoted = Regex::new(r#""([^"]*)"|'([^']*)'"#)?;
        let mut dependencies = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if !line.starts_with("gem ") {
                continue;
            }

            let mut args = quoted
                .captures_iter(line)
                .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
                .map(|m| m.as_str());

            let Some(name) = args.next() else {
                continue;
            };
            let version = args.next().unwrap_or_default();

            dependencies.push(Dependency::new(name, version, Ecosystem::Gem));
        }

        Ok(dependencies)
    }
}
