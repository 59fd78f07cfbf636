//! Row-by-row extraction pipeline.
//!
//! Resolves the enumeration root (descending into an iframe when one is
//! configured), pairs the title and date sequences, and walks each row
//! through title → link → date into a [`Record`]. Failures are row-scoped:
//! a row that cannot produce a record is skipped with its index logged and
//! the walk continues. Only title-root resolution failures and an
//! unresolved iframe abort the whole run.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use crate::config::{RequiredFields, SiteConfig};
use crate::dates::{self, DatePattern};
use crate::errors::ScrapeError;
use crate::extract::{fields, rows};
use crate::models::Record;
use crate::scope::DocumentScope;
use crate::utils::truncate_for_log;

/// Join an href against the base URL. An absent href, or one the URL parser
/// rejects, resolves to the base URL itself.
pub fn resolve_link(href: Option<&str>, base: &Url) -> String {
    match href {
        Some(h) => base
            .join(h)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| base.to_string()),
        None => base.to_string(),
    }
}

enum RowOutcome {
    Accepted(Record),
    Skipped(SkipReason),
}

enum SkipReason {
    EmptyTitle,
    MissingLink,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyTitle => write!(f, "title is empty after all fallbacks"),
            SkipReason::MissingLink => write!(f, "href is required but absent"),
        }
    }
}

/// Extract up to `max_items` records from `scope` per the site definition.
///
/// Returns records in enumeration order. An empty vector is a valid outcome
/// (the page had no usable rows); scope-resolution failures are reported as
/// errors instead.
pub fn extract_records(
    scope: &DocumentScope,
    site: &SiteConfig,
) -> Result<Vec<Record>, ScrapeError> {
    let timeout = Duration::from_millis(site.timeout_ms);

    let child;
    let scope = if let Some(frame) = &site.iframe {
        child = scope.resolve_child_scope(&frame.selector, frame.index, timeout)?;
        &child
    } else {
        scope
    };

    scope.wait_until_present(&site.title_rows, timeout)?;
    let title_rows = scope.locate(&site.title_rows)?;
    info!(site = %site.name, count = title_rows.len(), "Located title rows");

    let date_rows = match &site.date_rows {
        Some(selector) => scope.locate(selector)?,
        None => Vec::new(),
    };
    debug!(count = date_rows.len(), "Located date rows");

    let base = Url::parse(&site.base_url)
        .map_err(|e| ScrapeError::Config(format!("bad base_url `{}`: {e}", site.base_url)))?;
    let primary = site
        .date_pattern
        .as_ref()
        .map(|spec| spec.compile())
        .transpose()?;

    let mut records = Vec::new();
    for row in rows::paired_rows(&title_rows, &date_rows, site.max_items) {
        match extract_row(&row, site, &base, primary.as_ref()) {
            RowOutcome::Accepted(record) => {
                debug!(
                    row = row.index,
                    title = %record.title,
                    link = %record.link,
                    pub_date = %record.pub_date.map(dates::format_ymd).unwrap_or_default(),
                    "Accepted row"
                );
                records.push(record);
            }
            RowOutcome::Skipped(reason) => {
                warn!(site = %site.name, row = row.index, %reason, "Skipping row");
            }
        }
    }

    Ok(records)
}

fn extract_row(
    row: &rows::RowPair<'_>,
    site: &SiteConfig,
    base: &Url,
    primary: Option<&DatePattern>,
) -> RowOutcome {
    let title = fields::title_text(&row.title_row, &site.title);
    if title.is_empty() {
        return RowOutcome::Skipped(SkipReason::EmptyTitle);
    }

    let href = fields::first_attribute(&row.title_row, &site.href, "href");
    if href.is_none() && site.require == RequiredFields::TitleAndLink {
        return RowOutcome::Skipped(SkipReason::MissingLink);
    }
    let link = resolve_link(href.as_deref(), base);

    // A missing date row means the same element serves as both title and
    // date container.
    let date_target = row.date_row.as_ref().unwrap_or(&row.title_row);
    let date_text = fields::first_text(date_target, &site.date);
    let pub_date = dates::normalize(&date_text, primary);
    if pub_date.is_none() && !date_text.is_empty() {
        debug!(
            row = row.index,
            text = %truncate_for_log(&date_text, 120),
            "No date derived from row text"
        );
    }

    RowOutcome::Accepted(Record {
        description: title.clone(),
        title,
        link,
        pub_date,
    })
}
