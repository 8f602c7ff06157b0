//! Java ecosystem parser (Maven pom.xml)

use super::traits::PackageFileParser;
use crate::application::errors::ParseError;
use crate::domain::{Dependency, Ecosystem};
use regex::Regex;

/// Parser for Maven pom.xml files
#[derive(Debug, Default, Clone, Copy)]
pub struct MavenParser;

impl MavenParser {
    pub fn new() -> Self {
        Self
    }
}

impl PackageFileParser for MavenParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Maven
    }

    fn parse_file(&self, content: &str, _include_dev: bool) -> Result<Vec<Dependency>, ParseError> {
        // DOTALL so blocks and comments can span lines
        let comment_regex = Regex::new(r"(?s)<!--.*?-->")?;
        let dependency_regex = Regex::new(r"(?s)<dependency>(.*?)</dependency>")?;
        let group_regex = Regex::new(r"(?s)<groupId>\s*(.*?)\s*</groupId>")?;
        let artifact_regex = Regex::new(r"(?s)<artifactId>\s*(.*?)\s*</artifactId>")?;
        let version_regex = Regex::new(r"(?s)<version>\s*(.*?)\s*</version>")?;

        let field = |regex: &Regex, block: &str| -> Option<String> {
            regex
                .captures(block)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let content = comment_regex.replace_all(content, "");

        let mut dependencies = Vec::new();
        for caps in dependency_regex.captures_iter(&content) {
            // An unclosed <dependency> swallows the next opening tag; keep only the innermost block
            let block = caps[1].rsplit("<dependency>").next().unwrap_or(&caps[1]);

            let (Some(group_id), Some(artifact_id), Some(version)) = (
                field(&group_regex, block),
                field(&artifact_regex, block),
                field(&version_regex, block),
            ) else {
                continue;
            };

            dependencies.push(Dependency::new(
                format!("{}:{}", group_id, artifact_id),
                version,
                Ecosystem::Maven,
            ));
        }

        Ok(dependencies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maven_parser() {
        let parser = MavenParser::new();
        let content = r#"
<project>
  <dependencies>
    <dependency>
      <groupId>org.springframework</groupId>
      <artifactId>spring-core</artifactId>
      <version>5.3.21</version>
    </dependency>
    <dependency>
      <groupId>junit</groupId>
      <artifactId>junit</artifactId>
      <version>
        4.13.2
      </version>
      <scope>test</scope>
    </dependency>
    <dependency>
      <groupId>org.projectlombok</groupId>
      <artifactId>lombok</artifactId>
    </dependency>
  </dependencies>
</project>
"#;

        let deps = parser.parse_file(content, false).unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].name, "org.springframework:spring-core");
        assert_eq!(deps[0].version, "5.3.21");
        assert_eq!(deps[1].name, "junit:junit");
        assert_eq!(deps[1].version, "4.13.2");
        assert!(deps.iter().all(|d| d.ecosystem == Ecosystem::Maven));
    }

    #[test]
    fn test_maven_property_versions_are_kept_verbatim() {
        let parser = MavenParser::new();
        let content = "<dependency><groupId>g</groupId><artifactId>a</artifactId><version>${lib.version}</version></dependency>";

        let deps = parser.parse(content, false);
        assert_eq!(deps[0].version, "${lib.version}");
    }

    #[test]
    fn test_maven_parser_without_dependencies() {
        let parser = MavenParser::new();
        assert!(parser.parse("<project><modelVersion>4.0.0</modelVersion></project>", false).is_empty());
    }

    #[test]
    fn test_maven_parser_ignores_commented_out_dependencies() {
        let parser = MavenParser::new();
        let content = r#"
<project>
  <dependencies>
    <!-- <dependency>
      <groupId>log4j</groupId>
      <artifactId>log4j</artifactId>
      <version>1.2.17</version>
    </dependency> -->
    <dependency>
      <groupId>com.google.guava</groupId>
      <!-- pinned for JDK 8 --><artifactId>guava</artifactId>
      <version>32.1.3-jre</version>
    </dependency>
  </dependencies>
</project>
"#;

        let deps = parser.parse_file(content, false).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "com.google.guava:guava");
        assert_eq!(deps[0].version, "32.1.3-jre");
    }

    #[test]
    fn test_maven_parser_malformed_documents() {
        let parser = MavenParser::new();
        let cases: &[(&str, &str, &[(&str, &str)])] = &[
            (
                "unclosed dependency before a complete one",
                "<dependencies>
                   <dependency><groupId>broken</groupId><artifactId>half</artifactId>
                   <dependency><groupId>g</groupId><artifactId>a</artifactId><version>1.0</version></dependency>
                 </dependencies>",
                &[("g:a", "1.0")],
            ),
            (
                "unclosed trailing dependency",
                "<dependencies><dependency><groupId>g</groupId><artifactId>a</artifactId><version>1.0</version>",
                &[],
            ),
            (
                "unterminated comment",
                "<!-- <dependency><groupId>g</groupId><artifactId>a</artifactId><version>1.0</version></dependency>",
                &[("g:a", "1.0")],
            ),
            ("not xml at all", "{\"dependencies\": []}", &[]),
        ];

        for (case, content, expected) in cases {
            let deps = parser.parse(content, false);
            let pairs: Vec<(&str, &str)> = deps
                .iter()
                .map(|d| (d.name.as_str(), d.version.as_str()))
                .collect();
            assert_eq!(pairs, expected.to_vec(), "{}", case);
        }
    }
}
