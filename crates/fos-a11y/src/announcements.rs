//! Page Announcements
//!
//! Derives the text announced after a visit from the page heading, the
//! document title or the URL, in the document's language.

use fos_dom::Document;
use fos_nav::Location;

use crate::options::{Announcements, WILDCARD_LOCALE};
use crate::template::render;

/// Announcement for the page currently in `document`
///
/// The page is named by the first `heading_selector` match (its
/// `aria-label`, else its text), else by the document title, else by the
/// rendered `url` template. Returns `None` when no template set applies to
/// the document language.
pub fn get_page_announcement(
    document: &Document,
    heading_selector: &str,
    announcements: &Announcements,
) -> Option<String> {
    let lang = match document.lang().trim() {
        "" => WILDCARD_LOCALE,
        lang => lang,
    };
    let Some(templates) = announcements.resolve(lang) else {
        tracing::debug!("No announcement templates for locale {}", lang);
        return None;
    };

    let location = match Location::from_url(document.url(), "about:blank") {
        Ok(location) => location,
        Err(err) => {
            tracing::warn!("Cannot announce page with URL {:?}: {}", document.url(), err);
            return None;
        }
    };
    let (href, url, path) = (location.href(), location.url(), location.pathname());

    let heading = document.query_selector(heading_selector);
    if heading.is_none() {
        tracing::warn!("No main heading ({}) found on new page", heading_selector);
    }
    let heading_name = heading.and_then(|id| {
        let tree = document.tree();
        tree.get_attribute(id, "aria-label")
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string)
            .or_else(|| non_empty(collapse_whitespace(&tree.text_content(id))))
    });

    let title = heading_name
        .or_else(|| non_empty(document.title()))
        .unwrap_or_else(|| render(&templates.url, &[("href", href), ("url", url), ("path", path)]));

    Some(render(
        &templates.visit,
        &[("title", title.as_str()), ("href", href), ("url", url), ("path", path)],
    ))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}
