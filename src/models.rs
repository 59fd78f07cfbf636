//! Data model for extracted listing records.
//!
//! A [`Record`] is one row of a listing page after extraction: headline,
//! absolute link, description, and (when one could be derived) a publication
//! date. Records are created and fully populated by the extraction pipeline,
//! are immutable once returned, and are consumed read-only by the feed
//! serializer. Nothing persists between runs.

use chrono::NaiveDate;
use serde::Serialize;

/// A single extracted listing entry.
///
/// # Invariants
///
/// * `title` is never empty — empty-title rows are dropped by the pipeline.
/// * `link` is always an absolute URL. Relative hrefs are joined against the
///   site's base URL; an absent href falls back to the base URL itself unless
///   the site marks the link as mandatory, in which case the row is dropped.
/// * `pub_date`, when present, is a real calendar date ([`NaiveDate`] cannot
///   represent a "Feb 30").
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    /// The headline text of the row.
    pub title: String,
    /// Absolute URL of the linked article or page.
    pub link: String,
    /// Entry description; defaults to the title when the listing carries no
    /// separate summary text.
    pub description: String,
    /// Publication date at day granularity, if one could be derived.
    pub pub_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_creation() {
        let record = Record {
            title: "新しいお知らせ".to_string(),
            link: "https://example.org/news/1".to_string(),
            description: "新しいお知らせ".to_string(),
            pub_date: NaiveDate::from_ymd_opt(2025, 8, 7),
        };
        assert_eq!(record.title, "新しいお知らせ");
        assert_eq!(record.pub_date.unwrap().to_string(), "2025-08-07");
    }

    #[test]
    fn test_record_serialization() {
        let record = Record {
            title: "Annual meeting".to_string(),
            link: "https://example.org/meeting".to_string(),
            description: "Annual meeting".to_string(),
            pub_date: None,
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("Annual meeting"));
        assert!(json.contains("\"pub_date\":null"));
    }
}
