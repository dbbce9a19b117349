//! Site configuration loaded from `site.yaml`.
//!
//! | Key          | Purpose                                        |
//! |--------------|------------------------------------------------|
//! | `title`      | Site title (required)                          |
//! | `navigation` | Global navigation bar entries (optional)       |
//! | `prefix`     | URL prefix prepended by templates (optional)   |
//! | `path`       | Site root directory (optional, default `.`)    |
//!
//! # Example
//!
//! ```yaml
//! title: My Blog
//! prefix: /blog
//! navigation:
//!   - label: Home
//!     target: index.html
//!   - label: About
//!     target: about.html
//! ```
//!
//! The site root is expected to contain `pages/`, `templates/`, `static/`
//! and the generated `public/` subtrees; the accessors below derive those
//! paths so no other module hard-codes the layout.

mod error;

pub mod defaults;

pub use error::ConfigError;

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// One navigation bar entry, usable at site level or per page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavEntry {
    /// Text shown for the entry
    pub label: String,
    /// Output-relative link target
    pub target: String,
}

/// Root configuration structure representing `site.yaml`.
///
/// Serialized wholesale into the template context as `site`, so every field
/// is reachable from templates (`{{ site.title }}`, `{{ site.prefix }}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Site title
    pub title: String,

    /// Global navigation bar
    #[serde(default)]
    pub navigation: Option<Vec<NavEntry>>,

    /// URL prefix for generated links
    #[serde(default)]
    pub prefix: Option<String>,

    /// Site root directory containing `pages/`, `templates/`, `static/`
    #[serde(default = "defaults::root")]
    pub path: PathBuf,
}

impl SiteConfig {
    /// Parse configuration from a YAML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: SiteConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from a file path.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Directory holding page descriptors.
    pub fn pages_path(&self) -> PathBuf {
        self.path.join("pages")
    }

    /// Directory holding templates.
    pub fn templates_path(&self) -> PathBuf {
        self.path.join("templates")
    }

    /// Directory holding static assets copied verbatim.
    pub fn static_path(&self) -> PathBuf {
        self.path.join("static")
    }

    /// Build output directory, created on demand.
    pub fn public_path(&self) -> PathBuf {
        self.path.join("public")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_minimal() {
        let config = SiteConfig::from_str("title: My Blog").unwrap();
        assert_eq!(config.title, "My Blog");
        assert!(config.navigation.is_none());
        assert!(config.prefix.is_none());
        assert_eq!(config.path, PathBuf::from("."));
    }

    #[test]
    fn test_from_str_full() {
        let config = SiteConfig::from_str(
            r#"
            title: My Blog
            prefix: /blog
            path: site
            navigation:
              - label: Home
                target: index.html
              - label: About
                target: about.html
            "#,
        )
        .unwrap();

        assert_eq!(config.prefix.as_deref(), Some("/blog"));
        let nav = config.navigation.unwrap();
        assert_eq!(nav.len(), 2);
        assert_eq!(nav[0].label, "Home");
        assert_eq!(nav[1].target, "about.html");
    }

    #[test]
    fn test_missing_title_rejected() {
        assert!(SiteConfig::from_str("prefix: /blog").is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = SiteConfig::from_str("title: x\nsurprise: true");
        assert!(result.is_err());
    }

    #[test]
    fn test_derived_paths() {
        let config = SiteConfig::from_str("title: x\npath: /srv/site").unwrap();
        assert_eq!(config.pages_path(), PathBuf::from("/srv/site/pages"));
        assert_eq!(
            config.templates_path(),
            PathBuf::from("/srv/site/templates")
        );
        assert_eq!(config.static_path(), PathBuf::from("/srv/site/static"));
        assert_eq!(config.public_path(), PathBuf::from("/srv/site/public"));
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = SiteConfig::from_path(Path::new("/nope/site.yaml"));
        assert!(matches!(result, Err(ConfigError::Io(..))));
    }
}
