//! Queryable tree boundaries: the top-level document and nested frames.
//!
//! A [`DocumentScope`] is the engine's view of one tree — either the page
//! document itself or the document embedded in an iframe. Both variants
//! expose the same capability set: locate elements by selector, wait for a
//! selector to attach, and resolve a nested frame into a new scope.
//!
//! Scopes are backed by an HTML snapshot captured by the fetch layer. A
//! snapshot never mutates, so `wait_until_present` degenerates to a presence
//! check; it still reports [`ScrapeError::ScopeTimeout`] with the caller's
//! timeout on absence so snapshot and live scopes share one contract.
//! Embedded documents are pre-fetched by the capture step and registered
//! under the iframe's raw `src` attribute; a wrapper whose document was
//! never registered resolves to [`ScrapeError::FrameUnresolved`].

use std::collections::HashMap;
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::errors::ScrapeError;

/// Parse a CSS selector, rejecting empty strings up front. An empty selector
/// must fail fast rather than silently matching everything.
pub(crate) fn parse_selector(raw: &str) -> Result<Selector, ScrapeError> {
    if raw.trim().is_empty() {
        return Err(ScrapeError::InvalidSelector("selector is empty".to_string()));
    }
    Selector::parse(raw).map_err(|e| ScrapeError::InvalidSelector(format!("`{raw}`: {e}")))
}

#[derive(Debug)]
pub struct ScopeTree {
    html: Html,
    /// Pre-resolved embedded documents, keyed by the iframe's raw `src`.
    frames: HashMap<String, String>,
}

/// One queryable tree with its pre-resolved frame registry.
///
/// The two variants carry the same capabilities; `Frame` exists so logs and
/// errors can say which side of an iframe boundary they came from.
#[derive(Debug)]
pub enum DocumentScope {
    Root(ScopeTree),
    Frame(ScopeTree),
}

impl DocumentScope {
    /// Build a root scope over a page snapshot with no embedded documents.
    pub fn root(html: &str) -> Self {
        Self::root_with_frames(html, HashMap::new())
    }

    /// Build a root scope over a page snapshot plus pre-fetched iframe
    /// documents keyed by raw `src` attribute value.
    pub fn root_with_frames(html: &str, frames: HashMap<String, String>) -> Self {
        DocumentScope::Root(ScopeTree {
            html: Html::parse_document(html),
            frames,
        })
    }

    fn tree(&self) -> &ScopeTree {
        match self {
            DocumentScope::Root(tree) | DocumentScope::Frame(tree) => tree,
        }
    }

    /// All elements matching `selector` within this scope, in document order.
    pub fn locate(&self, selector: &str) -> Result<Vec<ElementHandle<'_>>, ScrapeError> {
        let sel = parse_selector(selector)?;
        Ok(self
            .tree()
            .html
            .select(&sel)
            .map(|el| ElementHandle { el })
            .collect())
    }

    /// Wait until at least one element matching `selector` is attached.
    ///
    /// Attachment is sufficient — visibility is not required, so elements
    /// hidden via CSS are still extractable. On a snapshot the tree cannot
    /// change, so presence now decides the wait; the timeout is carried into
    /// the error for parity with live scopes.
    pub fn wait_until_present(&self, selector: &str, timeout: Duration) -> Result<(), ScrapeError> {
        let sel = parse_selector(selector)?;
        if self.tree().html.select(&sel).next().is_some() {
            Ok(())
        } else {
            Err(ScrapeError::ScopeTimeout {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
        }
    }

    /// Resolve the `index`-th iframe matching `selector` into a new scope.
    ///
    /// A wrapper that never attached is a [`ScrapeError::ScopeTimeout`]; a
    /// wrapper that attached without a registered document (no `src`, or the
    /// capture step could not fetch it) is [`ScrapeError::FrameUnresolved`].
    pub fn resolve_child_scope(
        &self,
        selector: &str,
        index: usize,
        timeout: Duration,
    ) -> Result<DocumentScope, ScrapeError> {
        let wrappers = self.locate(selector)?;
        let Some(wrapper) = wrappers.get(index) else {
            return Err(ScrapeError::ScopeTimeout {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        };

        let Some(src) = wrapper.attribute("src") else {
            return Err(ScrapeError::FrameUnresolved {
                selector: selector.to_string(),
            });
        };

        match self.tree().frames.get(&src) {
            Some(child_html) => {
                debug!(%src, "Resolved child scope");
                Ok(DocumentScope::Frame(ScopeTree {
                    html: Html::parse_document(child_html),
                    frames: self.tree().frames.clone(),
                }))
            }
            None => Err(ScrapeError::FrameUnresolved {
                selector: selector.to_string(),
            }),
        }
    }
}

/// Reference to one node in a scope's tree.
#[derive(Debug, Clone, Copy)]
pub struct ElementHandle<'a> {
    el: ElementRef<'a>,
}

impl<'a> ElementHandle<'a> {
    /// Concatenated text content of the node's subtree, trimmed.
    ///
    /// Text content rather than rendered text: hidden elements still yield
    /// their text, matching the attachment-not-visibility wait contract.
    pub fn text(&self) -> String {
        self.el.text().collect::<String>().trim().to_string()
    }

    /// The value of attribute `name`, if set.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.el.value().attr(name).map(|v| v.to_string())
    }

    /// Descendants of this node matching `selector`, in document order.
    /// Never escapes the node's subtree.
    pub fn locate(&self, selector: &str) -> Result<Vec<ElementHandle<'a>>, ScrapeError> {
        let sel = parse_selector(selector)?;
        Ok(self.el.select(&sel).map(|el| ElementHandle { el }).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
          <ul class="news">
            <li><a href="/n/1">First</a><span class="d">2025.08.01</span></li>
            <li><a href="/n/2">Second</a><span class="d">2025.08.02</span></li>
          </ul>
          <div class="other"><span class="d">1999.01.01</span></div>
        </body></html>
    "#;

    #[test]
    fn test_locate_returns_document_order() {
        let scope = DocumentScope::root(LISTING);
        let rows = scope.locate("ul.news li").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text(), "First2025.08.01");
    }

    #[test]
    fn test_locate_rejects_empty_selector() {
        let scope = DocumentScope::root(LISTING);
        assert!(matches!(
            scope.locate("   "),
            Err(ScrapeError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_wait_until_present_ok_when_attached() {
        let scope = DocumentScope::root(LISTING);
        assert!(scope
            .wait_until_present("ul.news li", Duration::from_millis(100))
            .is_ok());
    }

    #[test]
    fn test_wait_until_present_times_out_when_absent() {
        let scope = DocumentScope::root(LISTING);
        let err = scope
            .wait_until_present(".missing", Duration::from_millis(100))
            .unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::ScopeTimeout { timeout_ms: 100, .. }
        ));
    }

    #[test]
    fn test_element_locate_stays_in_subtree() {
        let scope = DocumentScope::root(LISTING);
        let rows = scope.locate("ul.news li").unwrap();
        let dates = rows[0].locate(".d").unwrap();
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].text(), "2025.08.01");
    }

    #[test]
    fn test_attribute_read() {
        let scope = DocumentScope::root(LISTING);
        let links = scope.locate("ul.news li a").unwrap();
        assert_eq!(links[0].attribute("href").as_deref(), Some("/n/1"));
        assert_eq!(links[0].attribute("title"), None);
    }

    #[test]
    fn test_resolve_child_scope_with_registered_document() {
        let outer = r#"<html><body><iframe id="f" src="/embed/news"></iframe></body></html>"#;
        let inner = r#"<html><body><ul class="news"><li>Embedded</li></ul></body></html>"#;
        let mut frames = HashMap::new();
        frames.insert("/embed/news".to_string(), inner.to_string());

        let scope = DocumentScope::root_with_frames(outer, frames);
        let child = scope
            .resolve_child_scope("iframe#f", 0, Duration::from_millis(100))
            .unwrap();
        assert!(matches!(child, DocumentScope::Frame(_)));
        let rows = child.locate("ul.news li").unwrap();
        assert_eq!(rows[0].text(), "Embedded");
    }

    #[test]
    fn test_resolve_child_scope_unregistered_is_frame_unresolved() {
        let outer = r#"<html><body><iframe id="f" src="/embed/news"></iframe></body></html>"#;
        let scope = DocumentScope::root(outer);
        let err = scope
            .resolve_child_scope("iframe#f", 0, Duration::from_millis(100))
            .unwrap_err();
        assert!(matches!(err, ScrapeError::FrameUnresolved { .. }));
    }

    #[test]
    fn test_resolve_child_scope_missing_wrapper_is_timeout() {
        let scope = DocumentScope::root("<html><body></body></html>");
        let err = scope
            .resolve_child_scope("iframe", 0, Duration::from_millis(100))
            .unwrap_err();
        assert!(matches!(err, ScrapeError::ScopeTimeout { .. }));
    }
}
