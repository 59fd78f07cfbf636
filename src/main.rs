//! # listing2rss
//!
//! Scrapes browser-rendered listing pages (news/topic feeds of
//! organizations), extracts structured records (title, link, date), and
//! republishes them as RSS 2.0 feeds.
//!
//! ## Usage
//!
//! ```sh
//! listing2rss -c sites.yaml -o ./feeds
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture, per site:
//! 1. **Capture**: render the listing page (headless Chrome or plain GET)
//!    and pre-resolve any iframe documents into one queryable snapshot
//! 2. **Extraction**: pair title/date rows, pull fields, normalize dates
//! 3. **Post-filter**: optionally drop records past the freshness cutoff
//! 4. **Output**: render and write one RSS file per site
//!
//! Sites are independent: a site that fails to capture or extract is logged
//! and skipped, and the run continues.

use chrono::{Duration as ChronoDuration, Utc};
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod browser;
mod cli;
mod config;
mod dates;
mod errors;
mod extract;
mod fetch;
mod models;
mod outputs;
mod scope;
mod utils;

use cli::Cli;
use config::RenderMode;
use extract::pipeline::extract_records;
use models::Record;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("listing2rss starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.config, ?args.output_dir, ?args.site, "Parsed CLI arguments");

    // ---- Load site definitions ----
    let mut sites = config::load_sites(&args.config)?;
    if !args.site.is_empty() {
        sites.retain(|s| args.site.iter().any(|name| name == &s.name));
    }
    if sites.is_empty() {
        warn!("No sites selected; nothing to do");
        return Ok(());
    }

    // Early check: ensure the feed output dir is writable
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Launch the browser only if some site needs rendering ----
    let browser = if sites.iter().any(|s| s.render == RenderMode::Browser) {
        info!(headless = !args.headful, "Launching browser");
        Some(browser::Browser::launch(!args.headful).await?)
    } else {
        None
    };

    // ---- Process sites ----
    let mut total_records = 0usize;
    let mut failed_sites = 0usize;
    for site in &sites {
        info!(site = %site.name, url = %site.url, "Processing site");

        let scope = match fetch::capture(site, browser.as_ref()).await {
            Ok(scope) => scope,
            Err(e) => {
                error!(site = %site.name, error = %e, "Failed to capture page; skipping site");
                failed_sites += 1;
                continue;
            }
        };

        let records = match extract_records(&scope, site) {
            Ok(records) => records,
            Err(e) => {
                error!(site = %site.name, error = %e, "Extraction failed; skipping site");
                failed_sites += 1;
                continue;
            }
        };
        if records.is_empty() {
            // Valid outcome, distinct from the failures above: the page was
            // reachable but produced no usable rows.
            warn!(site = %site.name, "Extraction produced no records; writing empty feed");
        }

        let records = apply_freshness_cutoff(records, site.max_age_days);

        match outputs::rss::write_feed(site, &records, &args.output_dir).await {
            Ok(path) => {
                info!(site = %site.name, count = records.len(), path = %path, "Site completed");
                total_records += records.len();
            }
            Err(e) => {
                error!(site = %site.name, error = %e, "Failed to write feed");
                failed_sites += 1;
            }
        }
    }

    if let Some(browser) = browser {
        let _ = browser.close().await;
    }

    let elapsed = start_time.elapsed();
    info!(
        sites = sites.len(),
        failed = failed_sites,
        records = total_records,
        ?elapsed,
        "Execution complete"
    );

    Ok(())
}

/// Drop records older than the cutoff. Records without a derived date are
/// kept — only a date that is both present and too old excludes a record.
fn apply_freshness_cutoff(records: Vec<Record>, max_age_days: Option<i64>) -> Vec<Record> {
    let Some(days) = max_age_days else {
        return records;
    };
    let cutoff = Utc::now().date_naive() - ChronoDuration::days(days);
    let before = records.len();
    let kept: Vec<Record> = records
        .into_iter()
        .filter(|r| r.pub_date.is_none_or(|d| d >= cutoff))
        .collect();
    if kept.len() != before {
        debug!(dropped = before - kept.len(), "Applied freshness cutoff");
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(pub_date: Option<NaiveDate>) -> Record {
        Record {
            title: "t".to_string(),
            link: "https://example.org/".to_string(),
            description: "t".to_string(),
            pub_date,
        }
    }

    #[test]
    fn test_freshness_cutoff_disabled_keeps_everything() {
        let records = vec![record(NaiveDate::from_ymd_opt(2000, 1, 1)), record(None)];
        assert_eq!(apply_freshness_cutoff(records, None).len(), 2);
    }

    #[test]
    fn test_freshness_cutoff_keeps_undated_records() {
        let old = NaiveDate::from_ymd_opt(2000, 1, 1);
        let today = Some(Utc::now().date_naive());
        let records = vec![record(old), record(None), record(today)];
        let kept = apply_freshness_cutoff(records, Some(3));
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().any(|r| r.pub_date.is_none()));
        assert!(kept.iter().any(|r| r.pub_date == today));
    }
}
