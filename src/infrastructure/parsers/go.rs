//! Go ecosystem parser (go.mod)

use super::traits::PackageFileParser;
use crate::application::errors::ParseError;
use crate::domain::{Dependency, Ecosystem};

/// Parser for go.mod files
#[derive(Debug, Default, Clone, Copy)]
pub struct GoModParser;

impl GoModParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a single require directive (keyword already stripped)
    fn parse_require_line(line: &str) -> Option<Dependency> {
        let line = line.split("//").next().unwrap_or(line);
        let mut tokens = line.split_whitespace();
        let name = tokens.next()?;
        let version = tokens.next()?;

        Some(Dependency::new(name, version, Ecosystem::Go))
    }
}

impl PackageFileParser for GoModParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }

    fn parse_file(&self, content: &str, _include_dev: bool) -> Result<Vec<Dependency>, ParseError> {
        let mut dependencies = Vec::new();
        let mut in_require_block = false;

        for line in content.lines() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with("//") {
                continue;
            }

            if in_require_block {
                if line == ")" {
                    in_require_block = false;
                } else if let Some(dependency) = Self::parse_require_line(line) {
                    dependencies.push(dependency);
                }
                continue;
            }

            if let Some(rest) = line.strip_prefix("require ") {
                let rest = rest.trim();
                if rest == "(" {
                    in_require_block = true;
                } else if let Some(dependency) = Self::parse_require_line(rest) {
                    dependencies.push(dependency);
                }
            }
        }

        Ok(dependencies)
    }
}
