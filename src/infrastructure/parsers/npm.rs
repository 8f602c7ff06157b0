//! Node.js ecosystem parser (package.json)

use super::traits::PackageFileParser;
use crate::application::errors::ParseError;
use crate::domain::{Dependency, Ecosystem};
use serde_json::Value;

/// Parser for package.json files
#[derive(Debug, Default, Clone, Copy)]
pub struct NpmParser;

impl NpmParser {
    pub fn new() -> Self {
        Self
    }
}

/// Strip leading operator characters (`^`, `~`, `>=`, `v`...) from a declared version.
///
/// Returns an empty string when nothing numeric remains (e.g. `"*"` or `"latest"`);
/// [`Dependency::new`] turns that into the `latest` sentinel.
pub(crate) fn clean_version_string(version_str: &str) -> &str {
    version_str
        .trim()
        .trim_start_matches(|c: char| !c.is_ascii_digit())
}

/// Extract dependencies from one name→version section of a JSON manifest.
///
/// Non-string version values (e.g. objects) are skipped.
pub(crate) fn extract_json_section(
    json: &Value,
    section: &str,
    ecosystem: Ecosystem,
    is_dev: bool,
) -> Vec<Dependency> {
    let Some(deps) = json.get(section).and_then(|d| d.as_object()) else {
        return Vec::new();
    };

    deps.iter()
        .filter_map(|(name, version_value)| {
            let version = version_value.as_str()?;
            Some(Dependency::new(name.as_str(), clean_version_string(version), ecosystem).dev(is_dev))
        })
        .collect()
}

/// Parse a JSON manifest with a required and a development section
pub(crate) fn parse_json_manifest(
    content: &str,
    ecosystem: Ecosystem,
    required_section: &str,
    dev_section: &str,
    include_dev: bool,
) -> Result<Vec<Dependency>, ParseError> {
    let json: Value = serde_json::from_str(content)?;
    if !json.is_object() {
        return Err(ParseError::MissingSection {
            section: required_section.to_string(),
        });
    }

    let mut dependencies = extract_json_section(&json, required_section, ecosystem, false);
    if include_dev {
        dependencies.extend(extract_json_section(&json, dev_section, ecosystem, true));
    }

    Ok(dependencies)
}

impl PackageFileParser for NpmParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }

    fn parse_file(&self, content: &str, include_dev: bool) -> Result<Vec<Dependency>, ParseError> {
        parse_json_manifest(
            content,
            Ecosystem::Npm,
            "dependencies",
            "devDependencies",
            include_dev,
        )
    }
}
