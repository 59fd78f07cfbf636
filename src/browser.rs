//! Browser automation using chromiumoxide.
//!
//! The extraction engine never talks to the browser; it consumes the HTML
//! snapshots this module produces. Navigation, load waiting, popup
//! dismissal, and the attached-element poll all live here.

use std::error::Error;
use std::time::{Duration, Instant};

use chromiumoxide::browser::{Browser as ChromeBrowser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tracing::{debug, info};

use crate::errors::ScrapeError;

pub const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// How often the attached-element poll re-checks the page.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Browser wrapper for rendering listing pages.
pub struct Browser {
    browser: ChromeBrowser,
    handle: tokio::task::JoinHandle<()>,
}

impl Browser {
    /// Launch a Chrome instance configured for Japanese listing sites:
    /// `ja-JP` locale, desktop user agent, hardened flags.
    pub async fn launch(headless: bool) -> Result<Self, Box<dyn Error>> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--mute-audio")
            .arg("--lang=ja-JP")
            .arg("--accept-lang=ja,en;q=0.8")
            .arg(format!("--user-agent={DEFAULT_UA}"))
            .window_size(1366, 900);
        if !headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| format!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = ChromeBrowser::launch(config).await?;

        // The handler task must keep running for the browser to work.
        let handle = tokio::spawn(async move {
            loop {
                match handler.next().await {
                    Some(Ok(_)) => continue,
                    Some(Err(_)) => continue,
                    None => break,
                }
            }
        });

        Ok(Self { browser, handle })
    }

    /// Navigate to `url`, run the popup sequence, wait for `wait_selector`
    /// to attach, and return the rendered page HTML.
    pub async fn fetch_page(
        &self,
        url: &str,
        wait_selector: Option<&str>,
        timeout: Duration,
        popup_labels: &[String],
    ) -> Result<String, Box<dyn Error>> {
        info!(%url, "Navigating");
        let page = self.browser.new_page(url).await?;
        page.wait_for_navigation().await?;

        if !popup_labels.is_empty() {
            dismiss_popups(&page, popup_labels).await;
        }

        if let Some(selector) = wait_selector {
            wait_for_attached(&page, selector, timeout).await?;
        }

        let html = page.content().await?;
        let _ = page.close().await;
        Ok(html)
    }

    /// Close the browser.
    pub async fn close(mut self) -> Result<(), Box<dyn Error>> {
        let _ = self.browser.close().await;
        self.handle.abort();
        Ok(())
    }
}

/// Poll until at least one element matching `selector` is attached.
/// Attachment suffices; the element may be hidden.
async fn wait_for_attached(
    page: &Page,
    selector: &str,
    timeout: Duration,
) -> Result<(), Box<dyn Error>> {
    let deadline = Instant::now() + timeout;
    loop {
        if page.find_element(selector).await.is_ok() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(Box::new(ScrapeError::ScopeTimeout {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Click through consent/notice buttons in order, stopping at the first
/// label that never appears. Best-effort: a failed click is logged, never
/// fatal, and the extraction engine is unaware this ran.
pub async fn dismiss_popups(page: &Page, labels: &[String]) {
    for (step, label) in labels.iter().enumerate() {
        if click_by_label(page, label).await {
            info!(step = step + 1, %label, "Dismissed popup");
            tokio::time::sleep(Duration::from_millis(500)).await;
        } else {
            debug!(step = step + 1, %label, "Popup label not found; stopping sequence");
            break;
        }
    }
}

async fn click_by_label(page: &Page, label: &str) -> bool {
    // JSON-encode the label so quotes and backslashes survive injection.
    let Ok(needle) = serde_json::to_string(label) else {
        return false;
    };
    let script = format!(
        r#"(() => {{
            const needle = {needle}.toLowerCase();
            const nodes = Array.from(document.querySelectorAll('button, [role="button"], a'));
            const hit = nodes.find(n => (n.innerText || '').toLowerCase().includes(needle));
            if (hit) {{ hit.click(); return true; }}
            return false;
        }})()"#
    );
    match page.evaluate(script).await {
        Ok(result) => result.into_value::<bool>().unwrap_or(false),
        Err(e) => {
            debug!(error = %e, %label, "Popup probe failed");
            false
        }
    }
}
