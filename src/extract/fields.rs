//! Field lookups inside one parent element.
//!
//! Listings interleave decorative or empty nodes before the real content
//! node at a fixed relative position, so a lookup scans forward from the
//! configured start index and takes the first non-empty hit instead of
//! demanding an exact index match. Lookups return sentinels ("" / `None`)
//! rather than failing; real errors are confined to scope resolution.

use crate::config::FieldSpec;
use crate::scope::ElementHandle;

/// First non-empty trimmed text among the elements matching `spec.selector`
/// inside `parent`, scanning from `spec.index` in document order. With no
/// selector, the parent's own text. Never escapes the parent's subtree.
pub fn first_text(parent: &ElementHandle<'_>, spec: &FieldSpec) -> String {
    let Some(selector) = spec.selector.as_deref() else {
        return parent.text();
    };
    let Ok(candidates) = parent.locate(selector) else {
        return String::new();
    };
    for candidate in candidates.into_iter().skip(spec.index) {
        let text = candidate.text();
        if !text.is_empty() {
            return text;
        }
    }
    String::new()
}

/// Same scan as [`first_text`] but reading attribute `attr`; with no
/// selector the attribute is read from `parent` itself. Empty values do not
/// qualify.
pub fn first_attribute(
    parent: &ElementHandle<'_>,
    spec: &FieldSpec,
    attr: &str,
) -> Option<String> {
    let Some(selector) = spec.selector.as_deref() else {
        return parent.attribute(attr).filter(|v| !v.is_empty());
    };
    let Ok(candidates) = parent.locate(selector) else {
        return None;
    };
    for candidate in candidates.into_iter().skip(spec.index) {
        if let Some(value) = candidate.attribute(attr) {
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}

/// Title lookup with the link-metadata fallback: when the text scan comes up
/// empty and a selector was supplied, the `title` attribute of the candidate
/// at the configured index is tried. Some sites expose the headline only
/// that way.
pub fn title_text(parent: &ElementHandle<'_>, spec: &FieldSpec) -> String {
    let title = first_text(parent, spec);
    if !title.is_empty() {
        return title;
    }
    let Some(selector) = spec.selector.as_deref() else {
        return title;
    };
    let Ok(candidates) = parent.locate(selector) else {
        return title;
    };
    candidates
        .get(spec.index)
        .and_then(|el| el.attribute("title"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_default()
}
