//! Site definitions loaded from YAML.
//!
//! Everything the pipeline consumes is externally supplied here, nothing is
//! computed: row selectors, field specs, the primary date pattern, limits,
//! timeouts, and the per-site feed metadata. A minimal definition:
//!
//! ```yaml
//! sites:
//!   - name: example-society
//!     url: https://example.or.jp/topics/
//!     base_url: https://example.or.jp/
//!     title_rows: "ul.topics li"
//!     title: { selector: a, index: 0 }
//!     href: { selector: a, index: 0 }
//!     date: { selector: .date, index: 0 }
//!     date_pattern:
//!       regex: '(\d{4})\.(\d{1,2})\.(\d{1,2})'
//!       order: ymd
//! ```

use std::error::Error;

use serde::Deserialize;
use tracing::info;

use crate::dates::PatternSpec;

/// Where to look for one field inside a row: an optional descendant
/// selector and the index to start scanning from. No selector means "read
/// directly from the row element itself".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldSpec {
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub index: usize,
}

/// Which fields a row must produce to be accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequiredFields {
    /// Title suffices; an absent href falls back to the base URL.
    #[default]
    TitleOnly,
    /// Rows without an href are dropped.
    TitleAndLink,
}

/// How the listing page is obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    /// Headless Chrome; required for script-rendered listings.
    #[default]
    Browser,
    /// Plain HTTP GET for server-rendered pages.
    Static,
}

/// Listing content that lives inside an iframe.
#[derive(Debug, Clone, Deserialize)]
pub struct IframeConfig {
    pub selector: String,
    #[serde(default)]
    pub index: usize,
}

/// Channel-level feed metadata; falls back to values derived from the site
/// name.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for FeedInfo {
    fn default() -> Self {
        FeedInfo {
            title: None,
            description: None,
            language: default_language(),
        }
    }
}

fn default_language() -> String {
    "ja".to_string()
}

fn default_max_items() -> usize {
    10
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// One listing page and how to read it.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Short identifier; also the output file stem.
    pub name: String,
    /// Page to navigate to.
    pub url: String,
    /// Base for resolving relative hrefs and the feed's channel link.
    pub base_url: String,
    /// Selector for the title-bearing row elements.
    pub title_rows: String,
    /// Selector for the date-bearing row elements, when dates live in a
    /// separately-queried column.
    #[serde(default)]
    pub date_rows: Option<String>,
    #[serde(default)]
    pub title: FieldSpec,
    #[serde(default)]
    pub href: FieldSpec,
    #[serde(default)]
    pub date: FieldSpec,
    /// Site-specific date dialect, tried before the built-ins.
    #[serde(default)]
    pub date_pattern: Option<PatternSpec>,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    /// Present when the listing lives inside an iframe.
    #[serde(default)]
    pub iframe: Option<IframeConfig>,
    #[serde(default)]
    pub require: RequiredFields,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub render: RenderMode,
    /// Consent/notice button labels to click, in order, before extraction.
    #[serde(default)]
    pub popup_labels: Vec<String>,
    /// Drop records older than this many days; records without a derived
    /// date are kept.
    #[serde(default)]
    pub max_age_days: Option<i64>,
    #[serde(default)]
    pub feed: FeedInfo,
}

#[derive(Debug, Deserialize)]
struct SitesFile {
    sites: Vec<SiteConfig>,
}

/// Load site definitions from a YAML file.
pub fn load_sites(path: &str) -> Result<Vec<SiteConfig>, Box<dyn Error>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read site definitions `{path}`: {e}"))?;
    let file: SitesFile = serde_yaml::from_str(&raw)
        .map_err(|e| format!("cannot parse site definitions `{path}`: {e}"))?;
    info!(path, count = file.sites.len(), "Loaded site definitions");
    Ok(file.sites)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
sites:
  - name: example-society
    url: https://example.or.jp/topics/
    base_url: https://example.or.jp/
    title_rows: "ul.topics li"
    date_rows: "ul.topics li .date"
    title: { selector: a, index: 0 }
    href: { selector: a, index: 0 }
    date: { selector: ".date", index: 0 }
    date_pattern:
      regex: '(\d{4})\.(\d{1,2})\.(\d{1,2})'
      order: ymd
    max_items: 5
    require: title-and-link
    render: static
    max_age_days: 3
  - name: embedded
    url: https://example.com/news
    base_url: https://example.com/
    title_rows: "div.item"
    iframe:
      selector: "iframe#list"
    popup_labels: ["同意する", "閉じる"]
"#;

    #[test]
    fn test_parse_sample_definitions() {
        let file: SitesFile = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(file.sites.len(), 2);

        let first = &file.sites[0];
        assert_eq!(first.name, "example-society");
        assert_eq!(first.max_items, 5);
        assert_eq!(first.require, RequiredFields::TitleAndLink);
        assert_eq!(first.render, RenderMode::Static);
        assert_eq!(first.max_age_days, Some(3));
        assert_eq!(first.title.selector.as_deref(), Some("a"));
        assert!(first.date_pattern.is_some());
    }

    #[test]
    fn test_defaults_applied() {
        let file: SitesFile = serde_yaml::from_str(SAMPLE).unwrap();
        let second = &file.sites[1];
        assert_eq!(second.max_items, 10);
        assert_eq!(second.timeout_ms, 30_000);
        assert_eq!(second.require, RequiredFields::TitleOnly);
        assert_eq!(second.render, RenderMode::Browser);
        assert!(second.title.selector.is_none());
        assert_eq!(second.iframe.as_ref().unwrap().index, 0);
        assert_eq!(second.popup_labels.len(), 2);
        assert_eq!(second.feed.language, "ja");
    }
}
