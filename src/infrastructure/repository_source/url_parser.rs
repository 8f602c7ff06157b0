//! Utility for parsing GitHub repository URLs into owner/repo, optional ref and path

use regex::Regex;

/// Branch assumed when the URL names none
pub const DEFAULT_BRANCH: &str = "main";

const HTTP_PATTERN: &str = r"^https?://(?:www\.)?github\.com/([^/\s?#]+)/([^/\s?#]+?)(?:\.git)?(?:/tree/([^/\s?#]+)(?:/([^?#\s]+?))?)?/?(?:[?#]\S*)?$";
const SSH_PATTERN: &str = r"^git@github\.com:([^/\s]+)/([^/\s]+?)(?:\.git)?/?$";
const GIT_PATTERN: &str = r"^git://github\.com/([^/\s]+)/([^/\s]+?)(?:\.git)?/?$";
const SHORTHAND_PATTERN: &str = r"^github:([^/\s]+)/([^/\s#]+?)(?:#(\S+))?$";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRepositoryUrl {
    pub owner: String,
    pub repo: String,
    /// Branch or tag named in the URL, if any
    pub r#ref: Option<String>,
    /// Subdirectory named after `/tree/<branch>/`, if any
    pub path: Option<String>,
}

impl ParsedRepositoryUrl {
    pub fn branch(&self) -> &str {
        self.r#ref.as_deref().unwrap_or(DEFAULT_BRANCH)
    }

    /// Repository-relative path of a file, honoring the subdirectory
    pub fn file_path(&self, filename: &str) -> String {
        match &self.path {
            Some(dir) => format!("{}/{}", dir, filename),
            None => filename.to_string(),
        }
    }
}

/// Parse the accepted GitHub URL forms:
/// - https://github.com/owner/repo[.git][/tree/branch[/path]]
/// - git@github.com:owner/repo[.git]
/// - git://github.com/owner/repo[.git]
/// - github:owner/repo[#branch]
pub fn parse_github_repo_url(input: &str) -> Option<ParsedRepositoryUrl> {
    let trimmed = input.trim();

    let (pattern, has_tree) = if trimmed.starts_with("http://") || trimmed.starts_with("https://")
    {
        (HTTP_PATTERN, true)
    } else if trimmed.starts_with("git@") {
        (SSH_PATTERN, false)
    } else if trimmed.starts_with("git://") {
        (GIT_PATTERN, false)
    } else if trimmed.starts_with("github:") {
        (SHORTHAND_PATTERN, false)
    } else {
        return None;
    };

    let captures = Regex::new(pattern).ok()?.captures(trimmed)?;
    let group = |i: usize| {
        captures
            .get(i)
            .map(|m| m.as_str().trim_matches('/').to_string())
            .filter(|s| !s.is_empty())
    };

    let owner = group(1)?;
    let repo = group(2)?;
    let r#ref = group(3);
    let path = if has_tree { group(4) } else { None };

    Some(ParsedRepositoryUrl {
        owner,
        repo,
        r#ref,
        path,
    })
}
