//! Rust ecosystem parser (Cargo.toml)

use super::traits::PackageFileParser;
use crate::application::errors::ParseError;
use crate::domain::{Dependency, Ecosystem};
use regex::Regex;

/// Parser for Cargo.toml files.
///
/// Every non-bracketed `key = value` line is read as a dependency, after the
/// whole document has been checked to be valid TOML.
#[derive(Debug, Default, Clone, Copy)]
pub struct CargoParser;

impl CargoParser {
    pub fn new() -> Self {
        Self
    }

    fn unquote(value: &str) -> &str {
        value.trim().trim_matches(|c| c == '"' || c == '\'').trim()
    }

    /// `{ version = "1.0", features = [...] }` yields `1.0`
    fn inline_table_version(value: &str, version_regex: &Regex) -> Option<String> {
        version_regex
            .captures(value)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

impl PackageFileParser for CargoParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Cargo
    }

    fn parse_file(&self, content: &str, _include_dev: bool) -> Result<Vec<Dependency>, ParseError> {
        content.parse::<toml::Table>()?;
        let version_regex = Regex::new(r#"\bversion\s*=\s*["']([^"']*)["']"#)?;

        let mut dependencies = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };

            let name = Self::unquote(key);
            if name.is_empty() {
                continue;
            }

            let value = value.trim();
            let version = if value.starts_with('{') {
                Self::inline_table_version(value, &version_regex).unwrap_or_default()
            } else {
                Self::unquote(value).to_string()
            };

            dependencies.push(Dependency::new(name, version, Ecosystem::Cargo));
        }

        Ok(dependencies)
    }
}
