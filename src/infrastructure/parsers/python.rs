//! Python ecosystem parser (requirements.txt)

use super::traits::PackageFileParser;
use crate::application::errors::ParseError;
use crate::domain::{Dependency, Ecosystem};
use regex::Regex;

const DEFAULT_OPERATOR: &str = "==";

/// Parser for requirements.txt files
#[derive(Debug, Default, Clone, Copy)]
pub struct RequirementsTxtParser;

impl RequirementsTxtParser {
    pub fn new() -> Self {
        Self
    }

    /// Lines that carry no requirement: blanks, comments and pip options (`-r`, `--index-url`)
    fn is_skipped(line: &str) -> bool {
        line.is_empty() || line.starts_with('#') || line.starts_with('-')
    }
}

impl PackageFileParser for RequirementsTxtParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Pip
    }

    fn parse_file(&self, content: &str, _include_dev: bool) -> Result<Vec<Dependency>, ParseError> {
        let requirement = Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*)([<>=!~]+)?([0-9.]+)?")?;
        let mut dependencies = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if Self::is_skipped(line) {
                continue;
            }

            let Some(caps) = requirement.captures(line) else {
                continue;
            };

            let name = &caps[1];
            let operator = caps.get(2).map_or(DEFAULT_OPERATOR, |m| m.as_str());
            let version = caps.get(3).map_or("", |m| m.as_str());

            dependencies.push(Dependency::new(name, version, Ecosystem::Pip).with_constraint(operator));
        }

        Ok(dependencies)
    }
}
