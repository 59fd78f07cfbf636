//! Snapshot capture: render-mode dispatch, bounded retries, and iframe
//! pre-resolution.
//!
//! The engine consumes a [`DocumentScope`] whose backing tree has already
//! reached the desired load state; this module produces that scope. For
//! iframe-hosted listings the embedded documents are fetched up front and
//! registered by their raw `src` attribute, so scope resolution later is a
//! pure lookup.

use std::collections::HashMap;
use std::error::Error;
use std::time::Duration;

use rand::{rng, Rng};
use scraper::Html;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::browser::{Browser, DEFAULT_UA};
use crate::config::{RenderMode, SiteConfig};
use crate::scope::{parse_selector, DocumentScope};

const MAX_FETCH_ATTEMPTS: usize = 3;
const BASE_RETRY_DELAY: Duration = Duration::from_secs(1);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Capture a ready document scope for `site`.
///
/// Fetches the listing page (rendered or static per the site definition),
/// and when an iframe is configured, pre-resolves each wrapper's embedded
/// document. An iframe child that cannot be fetched is logged and left
/// unregistered — scope resolution will then report it as unresolved rather
/// than silently falling back to the top-level document.
pub async fn capture(
    site: &SiteConfig,
    browser: Option<&Browser>,
) -> Result<DocumentScope, Box<dyn Error>> {
    let timeout = Duration::from_millis(site.timeout_ms);

    // With an iframe in play the title rows live inside it, so the outer
    // page only needs the wrapper attached.
    let outer_wait = site
        .iframe
        .as_ref()
        .map(|f| f.selector.as_str())
        .unwrap_or(site.title_rows.as_str());
    let outer = fetch_html(site, &site.url, Some(outer_wait), timeout, browser, true).await?;

    let Some(frame_cfg) = &site.iframe else {
        return Ok(DocumentScope::root(&outer));
    };

    let page_url = Url::parse(&site.url)?;
    let srcs: Vec<String> = {
        let doc = Html::parse_document(&outer);
        let sel = parse_selector(&frame_cfg.selector)?;
        doc.select(&sel)
            .filter_map(|el| el.value().attr("src").map(str::to_string))
            .collect()
    };
    debug!(site = %site.name, count = srcs.len(), "Found iframe wrappers");

    let mut frames = HashMap::new();
    for src in srcs {
        let resolved = match page_url.join(&src) {
            Ok(u) => u,
            Err(e) => {
                warn!(%src, error = %e, "Skipping iframe with unresolvable src");
                continue;
            }
        };
        match fetch_html(
            site,
            resolved.as_str(),
            Some(site.title_rows.as_str()),
            timeout,
            browser,
            false,
        )
        .await
        {
            Ok(html) => {
                frames.insert(src, html);
            }
            Err(e) => warn!(%src, error = %e, "Failed to fetch iframe document"),
        }
    }

    Ok(DocumentScope::root_with_frames(&outer, frames))
}

/// Fetch one page as HTML with bounded exponential backoff.
async fn fetch_html(
    site: &SiteConfig,
    url: &str,
    wait_selector: Option<&str>,
    timeout: Duration,
    browser: Option<&Browser>,
    with_popups: bool,
) -> Result<String, Box<dyn Error>> {
    let mut attempt = 0usize;
    loop {
        let result = match site.render {
            RenderMode::Browser => {
                let Some(browser) = browser else {
                    return Err("browser render mode requested but no browser is running".into());
                };
                let labels: &[String] = if with_popups { &site.popup_labels } else { &[] };
                browser.fetch_page(url, wait_selector, timeout, labels).await
            }
            RenderMode::Static => fetch_static(url).await,
        };

        match result {
            Ok(html) => return Ok(html),
            Err(e) => {
                attempt += 1;
                if attempt >= MAX_FETCH_ATTEMPTS {
                    return Err(e);
                }

                // backoff calc
                let mut delay = BASE_RETRY_DELAY.saturating_mul(1 << (attempt - 1));
                if delay > MAX_RETRY_DELAY {
                    delay = MAX_RETRY_DELAY;
                }
                let jitter_ms: u64 = rng().random_range(0..=250);
                let delay = delay + Duration::from_millis(jitter_ms);

                warn!(
                    attempt,
                    max = MAX_FETCH_ATTEMPTS,
                    %url,
                    ?delay,
                    error = %e,
                    "Fetch failed; backing off"
                );
                sleep(delay).await;
            }
        }
    }
}

/// Plain HTTP GET for server-rendered listings.
async fn fetch_static(url: &str) -> Result<String, Box<dyn Error>> {
    let client = reqwest::Client::builder().user_agent(DEFAULT_UA).build()?;
    let body = client
        .get(url)
        .header("Accept-Language", "ja,en;q=0.8")
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(body)
}
