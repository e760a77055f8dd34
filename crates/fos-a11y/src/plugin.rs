//! Accessibility Plugin
//!
//! Hooks into the navigator's visit lifecycle:
//!
//! - `visit:start` (before): stamps the visit with a [`VisitA11y`] record and
//!   turns off animations for users who prefer reduced motion
//! - `visit:start`: marks `<html>` as `aria-busy`
//! - `visit:end` (before): clears `aria-busy`
//! - `visit:end`: waits one tick, then runs `content:focus` and
//!   `content:announce`
//! - `scroll:anchor`: moves focus to the anchor target
//!
//! `content:focus` and `content:announce` are created by the plugin. Hosts
//! can subscribe to them like any other hook, replace their default
//! handlers, or change the visit's [`VisitA11y`] record before they run.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use fos_dom::{NodeId, SharedDocument};
use fos_nav::{
    find_anchor_element, sync_handler, Announce, HookArgs, HookFuture, HookHandle, HookHandler, HookOptions, Hooks,
    Navigator, SharedVisit, Visit, SCROLL_ANCHOR, VISIT_END, VISIT_START,
};

use crate::announcements::get_page_announcement;
use crate::focus::{focus_autofocus_element, focus_element, FocusRef};
use crate::live_region::{AnnouncementSink, Announcer};
use crate::options::A11yOptions;
use crate::reduced_motion::{disable_visit_animations, MediaPreferences, MotionPreferenceSource};
use crate::A11yError;

/// Hook announcing the new page
pub const CONTENT_ANNOUNCE: &str = "content:announce";
/// Hook focusing the new content
pub const CONTENT_FOCUS: &str = "content:focus";

/// What to announce after a visit
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Announcement {
    /// Derive the announcement from the new page
    #[default]
    Default,
    /// Announce nothing
    Suppress,
    /// Announce this text
    Text(String),
}

impl From<&str> for Announcement {
    fn from(text: &str) -> Self {
        if text.is_empty() { Self::Suppress } else { Self::Text(text.to_string()) }
    }
}

impl From<String> for Announcement {
    fn from(text: String) -> Self {
        if text.is_empty() { Self::Suppress } else { Self::Text(text) }
    }
}

/// Where to move focus after a visit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusTarget {
    Selector(String),
    Element(NodeId),
    /// Leave focus where it is
    Disabled,
}

impl FocusTarget {
    pub fn as_focus_ref(&self) -> Option<FocusRef<'_>> {
        match self {
            Self::Selector(selector) => Some(FocusRef::Selector(selector)),
            Self::Element(id) => Some(FocusRef::Element(*id)),
            Self::Disabled => None,
        }
    }
}

impl From<&str> for FocusTarget {
    fn from(selector: &str) -> Self {
        if selector.trim().is_empty() { Self::Disabled } else { Self::Selector(selector.to_string()) }
    }
}

impl From<NodeId> for FocusTarget {
    fn from(id: NodeId) -> Self {
        Self::Element(id)
    }
}

/// Accessibility intent of one visit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitA11y {
    pub announce: Announcement,
    pub focus: FocusTarget,
}

impl VisitA11y {
    /// Default intent: derive the announcement, focus `content_selector`
    pub fn new(content_selector: &str) -> Self {
        Self { announce: Announcement::Default, focus: FocusTarget::from(content_selector) }
    }
}

/// Access to the accessibility record stored on a [`Visit`]
pub trait VisitA11yExt {
    fn a11y(&self) -> Option<&VisitA11y>;
    fn a11y_mut(&mut self) -> Option<&mut VisitA11y>;
    fn set_a11y(&mut self, a11y: VisitA11y);
}

impl VisitA11yExt for Visit {
    fn a11y(&self) -> Option<&VisitA11y> {
        self.extensions.get::<VisitA11y>()
    }

    fn a11y_mut(&mut self) -> Option<&mut VisitA11y> {
        self.extensions.get_mut::<VisitA11y>()
    }

    fn set_a11y(&mut self, a11y: VisitA11y) {
        self.extensions.insert(a11y);
    }
}

/// Plugin metadata
#[derive(Debug, Clone)]
pub struct PluginInfo {
    /// Human-readable plugin name
    pub name: &'static str,
    /// Plugin version (semver)
    pub version: &'static str,
}

struct Mounted {
    hooks: Weak<Hooks>,
    handles: Vec<HookHandle>,
}

struct PluginState {
    document: SharedDocument,
    options: RefCell<A11yOptions>,
    announcer: Rc<dyn AnnouncementSink>,
    motion: Rc<dyn MotionPreferenceSource>,
    mounted: RefCell<Option<Mounted>>,
}

/// Screen reader announcements, focus management and busy marking for
/// client-side navigation
pub struct A11yPlugin {
    state: Rc<PluginState>,
}

impl A11yPlugin {
    /// Create the plugin with a live region announcer and settable media
    /// preferences
    pub fn new(document: SharedDocument, options: A11yOptions) -> Self {
        let announcer = Rc::new(Announcer::new(Rc::clone(&document)));
        Self::with_capabilities(document, options, announcer, Rc::new(MediaPreferences::new()))
    }

    /// Create the plugin with custom announcement and motion sources
    pub fn with_capabilities(
        document: SharedDocument,
        options: A11yOptions,
        announcer: Rc<dyn AnnouncementSink>,
        motion: Rc<dyn MotionPreferenceSource>,
    ) -> Self {
        Self {
            state: Rc::new(PluginState {
                document,
                options: RefCell::new(options),
                announcer,
                motion,
                mounted: RefCell::new(None),
            }),
        }
    }

    pub fn info(&self) -> PluginInfo {
        PluginInfo { name: "A11yPlugin", version: env!("CARGO_PKG_VERSION") }
    }

    /// Current options
    pub fn options(&self) -> A11yOptions {
        self.state.options.borrow().clone()
    }

    /// Replace the options; takes effect from the next hook call
    pub fn set_options(&self, options: A11yOptions) {
        *self.state.options.borrow_mut() = options;
    }

    /// Modify the options in place
    pub fn update_options(&self, f: impl FnOnce(&mut A11yOptions)) {
        f(&mut self.state.options.borrow_mut());
    }

    pub fn is_mounted(&self) -> bool {
        self.state.mounted.borrow().is_some()
    }

    /// Register the plugin's hooks and announcer with `navigator`
    pub fn mount(&self, navigator: &Navigator) -> Result<(), A11yError> {
        if self.is_mounted() {
            return Err(A11yError::AlreadyMounted);
        }
        let hooks = navigator.hooks();
        for name in [CONTENT_ANNOUNCE, CONTENT_FOCUS] {
            if !hooks.exists(name) {
                hooks.create(name)?;
            }
        }

        let state = &self.state;
        let handles = vec![
            hooks.before(VISIT_START, Rc::clone(state).prepare_visit())?,
            hooks.on(VISIT_START, Rc::clone(state).mark_busy(), HookOptions::default())?,
            hooks.before(VISIT_END, Rc::clone(state).unmark_busy())?,
            hooks.on(
                VISIT_END,
                Rc::clone(state).handle_visit_end(Rc::downgrade(hooks)),
                HookOptions::default(),
            )?,
            hooks.on(SCROLL_ANCHOR, Rc::clone(state).focus_anchor(), HookOptions::default())?,
        ];

        navigator.set_announcer(Some(Rc::new(NavigatorAnnouncer(Rc::clone(&state.announcer)))));
        *state.mounted.borrow_mut() = Some(Mounted { hooks: Rc::downgrade(hooks), handles });
        tracing::debug!("Mounted {}", self.info().name);
        Ok(())
    }

    /// Remove every handler and the announcer installed by [`mount`](Self::mount)
    pub fn unmount(&self, navigator: &Navigator) {
        let Some(mounted) = self.state.mounted.borrow_mut().take() else {
            return;
        };
        if let Some(hooks) = mounted.hooks.upgrade() {
            for handle in &mounted.handles {
                hooks.off(handle);
            }
        }
        navigator.set_announcer(None);
        tracing::debug!("Unmounted {}", self.info().name);
    }

    /// Announce `message` right away
    #[must_use = "the future resolves once the message was written"]
    pub fn announce(&self, message: &str) -> HookFuture {
        self.state.announcer.announce(message, Duration::ZERO)
    }

    /// Default `content:focus` handler
    pub fn focus_handler(&self) -> HookHandler {
        self.state.focus_handler()
    }

    /// Default `content:announce` handler
    pub fn announce_handler(&self) -> HookHandler {
        self.state.announce_handler()
    }
}

impl PluginState {
    fn a11y_of(&self, visit: &SharedVisit) -> VisitA11y {
        let visit = visit.borrow();
        visit
            .a11y()
            .cloned()
            .unwrap_or_else(|| VisitA11y::new(&self.options.borrow().content_selector))
    }

    fn prepare_visit(self: Rc<Self>) -> impl Fn(SharedVisit, HookArgs) -> HookFuture + 'static {
        let state = self;
        sync_handler(move |visit, _| {
            let options = state.options.borrow();
            let mut visit = visit.borrow_mut();
            visit.set_a11y(VisitA11y::new(&options.content_selector));
            if options.respect_reduced_motion && state.motion.prefers_reduced_motion() {
                tracing::debug!("Reduced motion preferred, disabling animations");
                disable_visit_animations(&mut visit);
            }
        })
    }

    fn mark_busy(self: Rc<Self>) -> impl Fn(SharedVisit, HookArgs) -> HookFuture + 'static {
        let state = self;
        sync_handler(move |_, _| {
            let mut doc = state.document.borrow_mut();
            let html = doc.document_element();
            doc.tree_mut().set_attribute(html, "aria-busy", "true");
        })
    }

    fn unmark_busy(self: Rc<Self>) -> impl Fn(SharedVisit, HookArgs) -> HookFuture + 'static {
        let state = self;
        sync_handler(move |_, _| {
            let mut doc = state.document.borrow_mut();
            let html = doc.document_element();
            doc.tree_mut().remove_attribute(html, "aria-busy");
        })
    }

    fn handle_visit_end(self: Rc<Self>, hooks: Weak<Hooks>) -> impl Fn(SharedVisit, HookArgs) -> HookFuture + 'static {
        let state = self;
        move |visit: SharedVisit, _args: HookArgs| -> HookFuture {
            let state = Rc::clone(&state);
            let hooks = hooks.clone();
            Box::pin(async move {
                // Let the content swap settle before touching the new page
                smol::future::yield_now().await;
                let Some(hooks) = hooks.upgrade() else {
                    return;
                };
                if let Err(err) = hooks.call(CONTENT_FOCUS, &visit, HookArgs::None, Some(state.focus_handler())).await {
                    tracing::warn!("Focus stage failed: {}", err);
                }
                if let Err(err) = hooks
                    .call(CONTENT_ANNOUNCE, &visit, HookArgs::None, Some(state.announce_handler()))
                    .await
                {
                    tracing::warn!("Announcement stage failed: {}", err);
                }
            })
        }
    }

    fn focus_anchor(self: Rc<Self>) -> impl Fn(SharedVisit, HookArgs) -> HookFuture + 'static {
        let state = self;
        sync_handler(move |_, args| {
            let HookArgs::ScrollAnchor { hash } = args else {
                return;
            };
            let mut doc = state.document.borrow_mut();
            if let Some(anchor) = find_anchor_element(&doc, hash) {
                focus_element(&mut doc, anchor);
            }
        })
    }

    fn focus_handler(self: &Rc<Self>) -> HookHandler {
        let state = Rc::clone(self);
        Rc::new(move |visit: SharedVisit, _args: HookArgs| -> HookFuture {
            state.focus_content(&visit);
            Box::pin(std::future::ready(()))
        })
    }

    fn focus_content(&self, visit: &SharedVisit) {
        let target = self.a11y_of(visit).focus;
        let Some(focus_ref) = target.as_focus_ref() else {
            tracing::debug!("Focus disabled for this visit");
            return;
        };
        let autofocus = self.options.borrow().autofocus;
        let mut doc = self.document.borrow_mut();
        if focus_autofocus_element(&mut doc, autofocus) {
            return;
        }
        focus_element(&mut doc, focus_ref);
    }

    fn announce_handler(self: &Rc<Self>) -> HookHandler {
        let state = Rc::clone(self);
        Rc::new(move |visit: SharedVisit, _args: HookArgs| -> HookFuture {
            let Some(message) = state.resolve_announcement(&visit) else {
                return Box::pin(std::future::ready(()));
            };
            let delay = state.options.borrow().delay();
            state.announcer.announce(&message, delay)
        })
    }

    /// Text to announce for `visit`, recording derived text on the visit
    fn resolve_announcement(&self, visit: &SharedVisit) -> Option<String> {
        let message = match self.a11y_of(visit).announce {
            Announcement::Suppress => None,
            Announcement::Text(text) => Some(text),
            Announcement::Default => {
                let options = self.options.borrow();
                let derived = get_page_announcement(
                    &self.document.borrow(),
                    &options.heading_selector,
                    &options.effective_announcements(),
                );
                if let Some(a11y) = visit.borrow_mut().a11y_mut() {
                    a11y.announce = derived.clone().map_or(Announcement::Suppress, Announcement::from);
                }
                derived
            }
        };
        message.filter(|text| !text.is_empty())
    }
}

struct NavigatorAnnouncer(Rc<dyn AnnouncementSink>);

impl Announce for NavigatorAnnouncer {
    fn announce(&self, message: &str) -> HookFuture {
        self.0.announce(message, Duration::ZERO)
    }
}
