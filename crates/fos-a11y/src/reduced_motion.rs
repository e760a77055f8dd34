//! Reduced Motion Support
//!
//! prefers-reduced-motion handling for page transitions.

use std::cell::Cell;
use std::rc::Rc;

use fos_nav::Visit;

/// Motion preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionPreference {
    #[default]
    NoPreference,
    Reduce,
}

/// Where the user's motion preference comes from
pub trait MotionPreferenceSource {
    fn motion_preference(&self) -> MotionPreference;

    fn prefers_reduced_motion(&self) -> bool {
        self.motion_preference() == MotionPreference::Reduce
    }
}

impl MotionPreferenceSource for MotionPreference {
    fn motion_preference(&self) -> MotionPreference {
        *self
    }
}

/// Media preferences shared with the host, updated when the system
/// setting changes
#[derive(Debug, Clone, Default)]
pub struct MediaPreferences {
    reduced_motion: Rc<Cell<bool>>,
}

impl MediaPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reduced_motion(&self, reduce: bool) {
        self.reduced_motion.set(reduce);
    }

    /// Check a `prefers-reduced-motion` media feature
    ///
    /// Accepts `(prefers-reduced-motion: reduce | no-preference)` and the
    /// boolean form `(prefers-reduced-motion)`. Other features and values
    /// never match.
    pub fn matches(&self, query: &str) -> bool {
        let Some((feature, value)) = parse_media_feature(query) else {
            return false;
        };
        if feature != "prefers-reduced-motion" {
            return false;
        }
        let reduce = self.reduced_motion.get();
        match value.as_deref() {
            None | Some("reduce") => reduce,
            Some("no-preference") => !reduce,
            Some(_) => false,
        }
    }
}

/// Split `(feature: value)` into lowercased feature and optional value
fn parse_media_feature(query: &str) -> Option<(String, Option<String>)> {
    let inner = query.trim().strip_prefix('(')?.strip_suffix(')')?;
    let (feature, value) = match inner.split_once(':') {
        Some((feature, value)) => (feature, Some(value.trim().to_ascii_lowercase())),
        None => (inner, None),
    };
    let feature = feature.trim().to_ascii_lowercase();
    if feature.is_empty() || value.as_deref() == Some("") {
        return None;
    }
    Some((feature, value))
}

impl MotionPreferenceSource for MediaPreferences {
    fn motion_preference(&self) -> MotionPreference {
        if self.matches("(prefers-reduced-motion: reduce)") {
            MotionPreference::Reduce
        } else {
            MotionPreference::NoPreference
        }
    }
}

/// Turn off transition and scroll animations for this visit
pub fn disable_visit_animations(visit: &mut Visit) {
    visit.animation.animate = false;
    visit.scroll.animate = Some(false);
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_nav::{Location, VisitId};

    #[test]
    fn test_static_preference() {
        assert!(MotionPreference::Reduce.prefers_reduced_motion());
        assert!(!MotionPreference::NoPreference.prefers_reduced_motion());
    }

    #[test]
    fn test_media_query_matcher() {
        let prefs = MediaPreferences::new();
        assert!(!prefs.matches("(prefers-reduced-motion: reduce)"));
        assert!(prefs.matches("(prefers-reduced-motion: no-preference)"));

        prefs.clone().set_reduced_motion(true);
        assert!(prefs.matches("(prefers-reduced-motion: reduce)"));
        assert!(!prefs.matches("(prefers-reduced-motion: no-preference)"));
        assert!(!prefs.matches("(prefers-color-scheme: dark)"));
        assert_eq!(prefs.motion_preference(), MotionPreference::Reduce);
    }

    #[test]
    fn test_media_query_parsing() {
        let prefs = MediaPreferences::new();
        prefs.set_reduced_motion(true);
        assert!(prefs.matches("  ( Prefers-Reduced-Motion :REDUCE ) "));
        assert!(prefs.matches("(prefers-reduced-motion)"));
        assert!(!prefs.matches("(prefers-reduced-motion: reduced)"));
        assert!(!prefs.matches("(prefers-reduced-motion:)"));
        assert!(!prefs.matches("prefers-reduced-motion: reduce"));
        assert!(!prefs.matches("(prefers-reduced-motion-extra: reduce)"));
        assert!(!prefs.matches("(prefers-contrast: reduce)"));
    }

    #[test]
    fn test_disable_visit_animations() {
        let loc = Location::from_url("http://localhost/", "about:blank").unwrap();
        let mut visit = Visit::new(VisitId(1), loc.clone(), loc);
        disable_visit_animations(&mut visit);
        assert!(!visit.animation.animate);
        assert_eq!(visit.scroll.animate, Some(false));
    }
}
