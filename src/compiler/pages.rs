//! Page descriptor loading.
//!
//! A page descriptor is one YAML document under `pages/`. Loading resolves
//! it into a fully-materialized [`Page`] record: external data files are
//! parsed and merged in, defaulted fields are filled with named rules, and
//! every file consulted is recorded in the page's source set so staleness
//! checks see multi-source pages correctly.
//!
//! The source set is never empty: its first entry is always the descriptor
//! itself, and it never changes once the page is loaded.

use crate::{
    compiler::{BuildError, OUTPUT_EXT},
    config::{NavEntry, SiteConfig},
    timestamp::TimestampIndex,
};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Markdown extensions applied to every page body.
///
/// Page-specified extensions are appended to these; duplicates are
/// harmless (the option flags are idempotent).
pub const BASELINE_EXTENSIONS: &[&str] = &["tables", "footnotes", "strikethrough", "tasklists"];

/// Raw descriptor shape as authored in YAML.
///
/// `title` and `body` are required; everything else has a named default
/// rule applied by [`Page::load`]. Unknown keys are rejected outright so a
/// typo never silently drops data.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPage {
    title: String,
    body: String,
    #[serde(default)]
    internal: BTreeMap<String, Value>,
    #[serde(default)]
    external: BTreeMap<String, PathBuf>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    extensions: Option<Vec<String>>,
    #[serde(default)]
    navigation: Option<Vec<NavEntry>>,
}

/// One logical page, fully resolved.
///
/// Immutable after [`Page::load`] and discarded at the end of the build
/// run. Serialized into the template context as `page` (minus `sources`,
/// which is build machinery, not content).
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    /// Page title
    pub title: String,
    /// Raw markdown body
    pub body: String,
    /// Free-form data private to the page
    pub internal: BTreeMap<String, Value>,
    /// Referenced data files, resolved to their parsed contents
    pub external: BTreeMap<String, Value>,
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    /// Page tags
    pub tags: Vec<String>,
    /// Resolved markdown extension identifiers (baseline + page-specified)
    pub extensions: Vec<String>,
    /// Per-page navigation bar override
    pub navigation: Option<Vec<NavEntry>>,
    /// Path segments relative to the pages root, extension stripped
    pub path: Vec<String>,
    /// Canonical output-relative link
    pub link: String,
    /// Every file that contributed to this record; first entry is the
    /// descriptor itself
    #[serde(skip)]
    pub sources: Vec<PathBuf>,
}

impl Page {
    /// Resolve a descriptor file into a page record.
    ///
    /// Pure function of filesystem state at call time; the only side
    /// effects are the file reads themselves.
    pub fn load(
        descriptor: &Path,
        config: &SiteConfig,
        index: &TimestampIndex,
    ) -> Result<Self, BuildError> {
        let text = fs::read_to_string(descriptor)
            .map_err(|err| BuildError::Io(descriptor.to_path_buf(), err))?;
        let raw: RawPage = serde_yaml::from_str(&text)
            .map_err(|err| BuildError::MalformedContent(descriptor.to_path_buf(), err))?;

        let mut sources = vec![descriptor.to_path_buf()];
        let mut external = BTreeMap::new();
        for (name, referenced) in raw.external {
            // Relative references are resolved against the site root.
            let referenced = if referenced.is_relative() {
                config.path.join(referenced)
            } else {
                referenced
            };
            let text = fs::read_to_string(&referenced).map_err(|_| BuildError::MissingSource {
                path: referenced.clone(),
                referenced_from: descriptor.to_path_buf(),
            })?;
            let value: Value = serde_yaml::from_str(&text)
                .map_err(|err| BuildError::MalformedContent(referenced.clone(), err))?;
            sources.push(referenced);
            external.insert(name, value);
        }

        let date = match raw.date {
            Some(date) => date,
            None => synthesize_date(index.timestamp_of(descriptor)),
        };

        let path = derive_path(descriptor, &config.pages_path())?;
        let link = derive_link(&path);

        let mut extensions: Vec<String> = BASELINE_EXTENSIONS
            .iter()
            .map(ToString::to_string)
            .collect();
        extensions.extend(raw.extensions.unwrap_or_default());

        Ok(Self {
            title: raw.title,
            body: raw.body,
            internal: raw.internal,
            external,
            date,
            tags: raw.tags.unwrap_or_default(),
            extensions,
            navigation: raw.navigation,
            path,
            link,
            sources,
        })
    }
}

/// Format a file timestamp as a calendar date in local time.
fn synthesize_date(time: std::time::SystemTime) -> String {
    DateTime::<Local>::from(time).format("%Y-%m-%d").to_string()
}

/// Path segments of a descriptor relative to the pages root, with the
/// storage extension stripped from the final segment.
pub fn derive_path(descriptor: &Path, pages_root: &Path) -> Result<Vec<String>, BuildError> {
    let relative = descriptor
        .strip_prefix(pages_root)
        .map_err(|_| BuildError::OutsideRoot(descriptor.to_path_buf()))?;

    let mut segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    if let Some(last) = segments.last_mut()
        && let Some(stem) = Path::new(last.as_str()).file_stem()
    {
        *last = stem.to_string_lossy().into_owned();
    }

    Ok(segments)
}

/// Join path segments into the canonical output-relative link.
///
/// The final segment already has its storage extension stripped, so the
/// output extension is appended rather than substituted (a stem like
/// `archive.tar` keeps its inner dot).
pub fn derive_link(segments: &[String]) -> String {
    let path: PathBuf = segments.iter().collect();
    let mut link = path.into_os_string();
    link.push(".");
    link.push(OUTPUT_EXT);
    link.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    /// 2023-05-01 12:00:00 UTC. Noon keeps the local calendar date on
    /// 2023-05-01 for UTC and every zone west of it.
    const FIXED_MTIME: Duration = Duration::from_secs(1_682_942_400);

    fn site_in(dir: &Path) -> SiteConfig {
        let mut config = SiteConfig::from_str("title: Test").unwrap();
        config.path = dir.to_path_buf();
        config
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_path_and_link_derivation() {
        let segments = derive_path(
            Path::new("pages/blog/post-1.yaml"),
            Path::new("pages"),
        )
        .unwrap();
        assert_eq!(segments, vec!["blog".to_string(), "post-1".to_string()]);
        assert_eq!(derive_link(&segments), "blog/post-1.html");
    }

    #[test]
    fn test_dotted_stem_keeps_inner_dot() {
        let segments =
            derive_path(Path::new("pages/dl/archive.tar.yaml"), Path::new("pages")).unwrap();
        assert_eq!(segments, vec!["dl".to_string(), "archive.tar".to_string()]);
        assert_eq!(derive_link(&segments), "dl/archive.tar.html");
    }

    #[test]
    fn test_derive_path_outside_root() {
        let result = derive_path(Path::new("elsewhere/post.yaml"), Path::new("pages"));
        assert!(matches!(result, Err(BuildError::OutsideRoot(_))));
    }

    #[test]
    fn test_load_minimal_descriptor_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = site_in(dir.path());
        let descriptor = config.pages_path().join("index.yaml");
        write(&descriptor, "title: Home\nbody: '# hello'");
        fs::File::options()
            .write(true)
            .open(&descriptor)
            .unwrap()
            .set_modified(SystemTime::UNIX_EPOCH + FIXED_MTIME)
            .unwrap();

        let index = TimestampIndex::new();
        let page = Page::load(&descriptor, &config, &index).unwrap();

        assert_eq!(page.title, "Home");
        assert!(page.tags.is_empty());
        assert!(page.internal.is_empty());
        assert!(page.external.is_empty());
        assert!(page.navigation.is_none());
        assert_eq!(page.path, vec!["index".to_string()]);
        assert_eq!(page.link, "index.html");
        assert_eq!(page.sources, vec![descriptor.clone()]);

        // Date synthesized from the descriptor's own (pinned) mtime.
        assert_eq!(page.date, "2023-05-01");

        // Baseline extensions are always present.
        assert_eq!(
            page.extensions,
            BASELINE_EXTENSIONS
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_synthesize_date_formats_calendar_day() {
        let time = SystemTime::UNIX_EPOCH + FIXED_MTIME;
        assert_eq!(synthesize_date(time), "2023-05-01");
    }

    #[test]
    fn test_load_explicit_fields_win_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = site_in(dir.path());
        let descriptor = config.pages_path().join("post.yaml");
        write(
            &descriptor,
            r#"
            title: Post
            body: hello
            date: "2023-05-01"
            tags: [rust, blog]
            extensions: [smart_punctuation]
            navigation:
              - label: Up
                target: index.html
            "#,
        );

        let index = TimestampIndex::new();
        let page = Page::load(&descriptor, &config, &index).unwrap();

        assert_eq!(page.date, "2023-05-01");
        assert_eq!(page.tags, vec!["rust", "blog"]);
        assert_eq!(page.navigation.unwrap()[0].label, "Up");
        // Page extensions are appended after the baseline.
        assert_eq!(
            page.extensions.last().map(String::as_str),
            Some("smart_punctuation")
        );
        assert_eq!(page.extensions.len(), BASELINE_EXTENSIONS.len() + 1);
    }

    #[test]
    fn test_load_merges_external_data_and_records_sources() {
        let dir = tempfile::tempdir().unwrap();
        let config = site_in(dir.path());
        let descriptor = config.pages_path().join("links.yaml");
        let data = dir.path().join("data/links.yaml");
        write(&data, "- name: docs\n  url: https://example.org");
        write(
            &descriptor,
            "title: Links\nbody: see below\nexternal:\n  links: data/links.yaml",
        );

        let index = TimestampIndex::new();
        let page = Page::load(&descriptor, &config, &index).unwrap();

        assert_eq!(page.sources, vec![descriptor, data]);
        let links = page.external.get("links").unwrap();
        assert_eq!(
            links[0]["name"],
            Value::String("docs".into())
        );
    }

    #[test]
    fn test_load_missing_external_source() {
        let dir = tempfile::tempdir().unwrap();
        let config = site_in(dir.path());
        let descriptor = config.pages_path().join("broken.yaml");
        write(
            &descriptor,
            "title: Broken\nbody: x\nexternal:\n  gone: data/gone.yaml",
        );

        let index = TimestampIndex::new();
        let result = Page::load(&descriptor, &config, &index);
        assert!(matches!(result, Err(BuildError::MissingSource { .. })));
    }

    #[test]
    fn test_load_malformed_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let config = site_in(dir.path());
        let descriptor = config.pages_path().join("bad.yaml");
        // Required field `body` absent.
        write(&descriptor, "title: Bad");

        let index = TimestampIndex::new();
        let result = Page::load(&descriptor, &config, &index);
        assert!(matches!(result, Err(BuildError::MalformedContent(..))));
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let config = site_in(dir.path());
        let descriptor = config.pages_path().join("typo.yaml");
        write(&descriptor, "title: T\nbody: x\nbdoy: oops");

        let index = TimestampIndex::new();
        let result = Page::load(&descriptor, &config, &index);
        assert!(matches!(result, Err(BuildError::MalformedContent(..))));
    }

    #[test]
    fn test_nested_descriptor_preserves_depth() {
        let dir = tempfile::tempdir().unwrap();
        let config = site_in(dir.path());
        let descriptor = config.pages_path().join("blog/2023/post-1.yaml");
        write(&descriptor, "title: Deep\nbody: x");

        let index = TimestampIndex::new();
        let page = Page::load(&descriptor, &config, &index).unwrap();
        assert_eq!(
            page.path,
            vec!["blog".to_string(), "2023".to_string(), "post-1".to_string()]
        );
        assert_eq!(page.link, "blog/2023/post-1.html");
    }
}
