//! Visit - one client-side navigation
//!
//! A visit is created when navigation starts, passed by reference through
//! every hook, and dropped when the visit ends. Plugins attach their own
//! per-visit state through [`Extensions`] instead of extending the type.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use url::Url;

/// Visit shared between the navigator and hook handlers
pub type SharedVisit = Rc<RefCell<Visit>>;

/// Unique visit identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisitId(pub u64);

/// Resolved URL split the way templates and anchors need it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    href: String,
    url: String,
    pathname: String,
    hash: String,
}

impl Location {
    /// Resolve `input` against `base` (absolute URLs ignore the base)
    pub fn from_url(input: &str, base: &str) -> Result<Self, url::ParseError> {
        let parsed = match Url::parse(input) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base)?.join(input)?,
            Err(err) => return Err(err),
        };
        Ok(Self::from(&parsed))
    }

    /// Full URL including origin
    pub fn href(&self) -> &str {
        &self.href
    }

    /// Path, query and fragment without the origin
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Path only
    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    /// Fragment including `#`, or empty
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

impl From<&Url> for Location {
    fn from(parsed: &Url) -> Self {
        let pathname = parsed.path().to_string();
        let mut url = pathname.clone();
        if let Some(query) = parsed.query() {
            url.push('?');
            url.push_str(query);
        }
        let hash = parsed.fragment().map(|f| format!("#{f}")).unwrap_or_default();
        url.push_str(&hash);
        Self {
            href: parsed.as_str().to_string(),
            url,
            pathname,
            hash,
        }
    }
}

/// Animation settings for the page transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationSettings {
    pub animate: bool,
    pub name: Option<String>,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self { animate: true, name: None }
    }
}

/// Scroll behaviour after content replacement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollSettings {
    /// Reset the scroll position to the top
    pub reset: bool,
    /// Anchor to scroll to (without `#`)
    pub target: Option<String>,
    /// Smooth scrolling; `None` leaves the decision to the scroll handler
    pub animate: Option<bool>,
}

/// One navigation
#[derive(Debug)]
pub struct Visit {
    pub id: VisitId,
    pub from: Location,
    pub to: Location,
    pub animation: AnimationSettings,
    pub scroll: ScrollSettings,
    pub extensions: Extensions,
}

impl Visit {
    pub fn new(id: VisitId, from: Location, to: Location) -> Self {
        let target = to.hash().strip_prefix('#').filter(|h| !h.is_empty()).map(str::to_string);
        Self {
            id,
            from,
            to,
            animation: AnimationSettings::default(),
            scroll: ScrollSettings {
                reset: target.is_none(),
                target,
                animate: None,
            },
            extensions: Extensions::default(),
        }
    }

    /// Wrap into the shared form hooks expect
    pub fn into_shared(self) -> SharedVisit {
        Rc::new(RefCell::new(self))
    }
}

/// Type-keyed map of per-visit plugin data
#[derive(Default)]
pub struct Extensions {
    map: HashMap<TypeId, Box<dyn Any>>,
}

impl Extensions {
    /// Insert a value, returning the previous value of the same type
    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        self.map
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok().map(|boxed| *boxed))
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.map.get(&TypeId::of::<T>())?.downcast_ref::<T>()
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.map.get_mut(&TypeId::of::<T>())?.downcast_mut::<T>()
    }

    /// Get the value of type `T`, inserting one built by `init` if missing
    pub fn get_or_insert_with<T: 'static>(&mut self, init: impl FnOnce() -> T) -> &mut T {
        self.map
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(init()))
            .downcast_mut::<T>()
            .expect("entries are keyed by their own TypeId")
    }

    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.map
            .remove(&TypeId::of::<T>())
            .and_then(|old| old.downcast::<T>().ok().map(|boxed| *boxed))
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions").field("len", &self.map.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_relative() {
        let loc = Location::from_url("/docs/intro?lang=en#setup", "https://example.com/").unwrap();
        assert_eq!(loc.href(), "https://example.com/docs/intro?lang=en#setup");
        assert_eq!(loc.url(), "/docs/intro?lang=en#setup");
        assert_eq!(loc.pathname(), "/docs/intro");
        assert_eq!(loc.hash(), "#setup");
    }

    #[test]
    fn test_location_root() {
        let loc = Location::from_url("http://localhost/", "about:blank").unwrap();
        assert_eq!(loc.url(), "/");
        assert_eq!(loc.pathname(), "/");
        assert_eq!(loc.hash(), "");
    }

    #[test]
    fn test_location_invalid_base() {
        assert!(Location::from_url("/page", "not a url").is_err());
    }

    #[test]
    fn test_visit_scroll_target_from_hash() {
        let from = Location::from_url("/", "http://localhost/").unwrap();
        let to = Location::from_url("/about#team", "http://localhost/").unwrap();
        let visit = Visit::new(VisitId(1), from.clone(), to);
        assert_eq!(visit.scroll.target.as_deref(), Some("team"));
        assert!(!visit.scroll.reset);

        let plain = Visit::new(VisitId(2), from.clone(), from);
        assert!(plain.scroll.reset);
        assert!(plain.animation.animate);
    }

    #[test]
    fn test_extensions_typed_slots() {
        #[derive(Debug, PartialEq)]
        struct Marker(u8);

        let mut ext = Extensions::default();
        assert!(ext.insert(Marker(1)).is_none());
        assert_eq!(ext.insert(Marker(2)), Some(Marker(1)));
        ext.get_mut::<Marker>().unwrap().0 = 3;
        assert_eq!(ext.get::<Marker>(), Some(&Marker(3)));
        assert_eq!(ext.get::<String>(), None);

        *ext.get_or_insert_with(|| String::from("a")) += "b";
        assert_eq!(ext.get::<String>().map(String::as_str), Some("ab"));
        assert_eq!(ext.len(), 2);

        assert_eq!(ext.remove::<Marker>(), Some(Marker(3)));
        assert!(!ext.contains::<Marker>());
    }
}
