//! Plugin Configuration
//!
//! Options for the accessibility plugin. Every field has a default, so
//! hosts only name what they want to change, in Rust or as JSON.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::A11yError;

/// Locale key matching any document language
pub const WILDCARD_LOCALE: &str = "*";

/// Announcement templates for one language
///
/// `visit` is announced after every visit; `url` names the page when it
/// has neither a heading nor a title. Both accept `{title}`, `{href}`,
/// `{url}` and `{path}` (`{title}` is empty inside `url`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemplateSet {
    pub visit: String,
    pub url: String,
}

impl TemplateSet {
    pub fn new(visit: &str, url: &str) -> Self {
        Self { visit: visit.to_string(), url: url.to_string() }
    }
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::new("Navigated to: {title}", "New page at {url}")
    }
}

/// One entry of a locale-keyed translation map
///
/// Entries are checked one by one, so a broken locale only silences
/// itself.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LocaleTemplates {
    Set(TemplateSet),
    Malformed(serde_json::Value),
}

/// Announcement templates, either one set or one per language
///
/// Shapes matching neither form are kept as `Malformed` and produce no
/// announcement instead of failing to load.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Announcements {
    Templates(TemplateSet),
    Translations(HashMap<String, LocaleTemplates>),
    Malformed(serde_json::Value),
}

impl Default for Announcements {
    fn default() -> Self {
        Self::Templates(TemplateSet::default())
    }
}

impl Announcements {
    /// Locale-keyed translations from `(locale, set)` pairs
    pub fn translations<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, TemplateSet)>,
        K: Into<String>,
    {
        Self::Translations(entries.into_iter().map(|(k, v)| (k.into(), LocaleTemplates::Set(v))).collect())
    }

    /// Template set for `lang`: exact key, then the wildcard, then the
    /// flat set
    ///
    /// A malformed entry selected for `lang` resolves to `None`; malformed
    /// entries of other locales are ignored.
    pub fn resolve(&self, lang: &str) -> Option<&TemplateSet> {
        match self {
            Self::Templates(set) => Some(set),
            Self::Translations(map) => match map.get(lang).or_else(|| map.get(WILDCARD_LOCALE))? {
                LocaleTemplates::Set(set) => Some(set),
                LocaleTemplates::Malformed(_) => None,
            },
            Self::Malformed(_) => None,
        }
    }

    fn map_sets(&mut self, f: impl Fn(&mut TemplateSet)) {
        match self {
            Self::Templates(set) => f(set),
            Self::Translations(map) => map.values_mut().for_each(|entry| {
                if let LocaleTemplates::Set(set) = entry {
                    f(set);
                }
            }),
            Self::Malformed(_) => {}
        }
    }
}

/// Accessibility plugin options
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct A11yOptions {
    /// Element focused after each visit; empty disables focus handling
    pub content_selector: String,
    /// Element whose text names the new page
    pub heading_selector: String,
    /// Disable transitions for users who prefer reduced motion
    pub respect_reduced_motion: bool,
    /// Focus `[autofocus]` elements instead of the content element
    pub autofocus: bool,
    pub announcements: Announcements,
    /// Milliseconds to wait before writing an announcement
    pub announcement_delay: u64,
    /// Replaces the `visit` template of every set
    pub announcement_template: Option<String>,
    /// Replaces the `url` template of every set
    pub url_template: Option<String>,
}

impl Default for A11yOptions {
    fn default() -> Self {
        Self {
            content_selector: "body".to_string(),
            heading_selector: "h1".to_string(),
            respect_reduced_motion: false,
            autofocus: false,
            announcements: Announcements::default(),
            announcement_delay: 100,
            announcement_template: None,
            url_template: None,
        }
    }
}

impl A11yOptions {
    /// Parse options from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, A11yError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.announcement_delay)
    }

    /// Announcement templates with the single-template options applied
    pub fn effective_announcements(&self) -> Announcements {
        let mut announcements = self.announcements.clone();
        if self.announcement_template.is_none() && self.url_template.is_none() {
            return announcements;
        }
        announcements.map_sets(|set| {
            if let Some(visit) = &self.announcement_template {
                set.visit = visit.clone();
            }
            if let Some(url) = &self.url_template {
                set.url = url.clone();
            }
        });
        announcements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = A11yOptions::default();
        assert_eq!(options.content_selector, "body");
        assert_eq!(options.heading_selector, "h1");
        assert!(!options.respect_reduced_motion);
        assert!(!options.autofocus);
        assert_eq!(options.delay(), Duration::from_millis(100));
        assert_eq!(options.announcements.resolve("en"), Some(&TemplateSet::default()));
    }

    #[test]
    fn test_from_json_partial() {
        let options = A11yOptions::from_json(r#"{"contentSelector": "main", "announcementDelay": 0}"#).unwrap();
        assert_eq!(options.content_selector, "main");
        assert_eq!(options.delay(), Duration::ZERO);
        assert_eq!(options.heading_selector, "h1");
    }

    #[test]
    fn test_from_json_translations() {
        let options = A11yOptions::from_json(
            r#"{"announcements": {
                "de": {"visit": "Navigiert zu: {title}", "url": "Neue Seite unter {url}"},
                "*": {"visit": "Navigated to: {title}", "url": "New page at {url}"}
            }}"#,
        )
        .unwrap();
        assert!(matches!(options.announcements, Announcements::Translations(_)));
        assert_eq!(options.announcements.resolve("de").unwrap().visit, "Navigiert zu: {title}");
        assert_eq!(options.announcements.resolve("fr").unwrap().visit, "Navigated to: {title}");
    }

    #[test]
    fn test_from_json_malformed_announcements() {
        let options = A11yOptions::from_json(r#"{"announcements": "Navigated"}"#).unwrap();
        assert!(matches!(options.announcements, Announcements::Malformed(_)));
        assert_eq!(options.announcements.resolve("*"), None);
    }

    #[test]
    fn test_malformed_entry_only_affects_its_locale() {
        let options = A11yOptions::from_json(
            r#"{"announcements": {
                "de": {"visit": "Navigiert zu: {title}", "url": "Neue Seite unter {url}"},
                "fr": "broken",
                "*": {"visit": "Navigated to: {title}"}
            }}"#,
        )
        .unwrap();
        let announcements = options.effective_announcements();
        assert_eq!(announcements.resolve("de").unwrap().visit, "Navigiert zu: {title}");
        assert_eq!(announcements.resolve("fr"), None);
        // Wildcard entry is missing `url`
        assert_eq!(announcements.resolve("it"), None);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(A11yOptions::from_json("{"), Err(A11yError::Config(_))));
        assert!(A11yOptions::from_json(r#"{"autofocus": "yes"}"#).is_err());
    }

    #[test]
    fn test_translations_without_match() {
        let announcements = Announcements::translations([("de", TemplateSet::new("{title}", "{url}"))]);
        assert_eq!(announcements.resolve("it"), None);
    }

    #[test]
    fn test_legacy_templates_override() {
        let options = A11yOptions {
            announcements: Announcements::translations([
                ("de", TemplateSet::new("Seite {title}", "Adresse {url}")),
                ("*", TemplateSet::default()),
            ]),
            announcement_template: Some("Now on {title}".to_string()),
            ..A11yOptions::default()
        };
        let effective = options.effective_announcements();
        assert_eq!(effective.resolve("de").unwrap().visit, "Now on {title}");
        assert_eq!(effective.resolve("de").unwrap().url, "Adresse {url}");
        assert_eq!(effective.resolve("*").unwrap().visit, "Now on {title}");
    }
}
