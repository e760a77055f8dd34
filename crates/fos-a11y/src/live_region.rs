//! Live Region Support
//!
//! A single visually-hidden ARIA live region per document, used to
//! announce page changes to screen readers.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::Duration;

use fos_dom::{Document, NodeId, SharedDocument};
use fos_nav::HookFuture;

/// Id of the live region element
pub const LIVE_REGION_ID: &str = "a11y-announcer";

/// Clips the region off-screen while keeping it in the accessibility tree
pub const VISUALLY_HIDDEN_STYLE: &str = "position:absolute;top:0;left:0;clip:rect(0 0 0 0);\
clip-path:inset(50%);overflow:hidden;white-space:nowrap;word-wrap:normal;width:1px;height:1px;";

/// Live region politeness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LiveRegionMode {
    Off,
    #[default]
    Polite,
    Assertive,
}

impl LiveRegionMode {
    /// `aria-live` attribute value
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Polite => "polite",
            Self::Assertive => "assertive",
        }
    }
}

/// Live region configuration
#[derive(Debug, Clone)]
pub struct LiveRegionConfig {
    /// Politeness level: off, polite, assertive
    pub politeness: LiveRegionMode,
    /// Whether to announce the entire region or just changes
    pub atomic: bool,
}

impl Default for LiveRegionConfig {
    fn default() -> Self {
        Self::assertive().with_atomic(true)
    }
}

impl LiveRegionConfig {
    /// Create polite live region
    pub fn polite() -> Self {
        Self { politeness: LiveRegionMode::Polite, atomic: false }
    }

    /// Create assertive live region
    pub fn assertive() -> Self {
        Self { politeness: LiveRegionMode::Assertive, atomic: false }
    }

    /// Set atomic mode
    pub fn with_atomic(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }
}

/// Destination for page announcements
pub trait AnnouncementSink {
    /// Announce `message` after `delay`; resolves once the message was written
    #[must_use = "delayed announcements are only written when the future is awaited"]
    fn announce(&self, message: &str, delay: Duration) -> HookFuture;
}

/// Find the live region in `document`, creating it at the end of `<body>`
///
/// Returns `None` when the document has no body to attach to.
pub fn acquire_region(document: &mut Document, config: &LiveRegionConfig) -> Option<NodeId> {
    if let Some(region) = document.get_element_by_id(LIVE_REGION_ID) {
        return Some(region);
    }

    let body = document.body();
    if !document.tree().is_connected(body) {
        tracing::warn!("Cannot create live region without a document body");
        return None;
    }

    let tree = document.tree_mut();
    let region = tree.create_element("p");
    tree.set_attribute(region, "id", LIVE_REGION_ID);
    tree.set_attribute(region, "aria-live", config.politeness.as_str());
    tree.set_attribute(region, "aria-atomic", if config.atomic { "true" } else { "false" });
    tree.set_attribute(region, "style", VISUALLY_HIDDEN_STYLE);
    tree.append_child(body, region);
    tracing::debug!("Created live region {:?}", region);
    Some(region)
}

/// Announcement intents, in call order
///
/// Each `announce` call takes the next ticket. Delayed announcements stay
/// `pending` until their future completes or is dropped.
#[derive(Debug, Default)]
struct Intents {
    issued: u64,
    written: u64,
    pending: BTreeSet<u64>,
}

impl Intents {
    fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Newest live intent that nothing newer has overwritten
    fn is_latest(&self, ticket: u64) -> bool {
        ticket > self.written && self.pending.last() == Some(&ticket)
    }
}

/// Pending delayed announcement; releases its ticket when dropped
struct Pending {
    intents: Rc<RefCell<Intents>>,
    ticket: u64,
}

impl Pending {
    fn new(intents: Rc<RefCell<Intents>>, ticket: u64) -> Self {
        intents.borrow_mut().pending.insert(ticket);
        Self { intents, ticket }
    }

    fn is_latest(&self) -> bool {
        self.intents.borrow().is_latest(self.ticket)
    }
}

impl Drop for Pending {
    fn drop(&mut self) {
        self.intents.borrow_mut().pending.remove(&self.ticket);
    }
}

/// Screen reader announcer backed by a live region
///
/// The announcer owns one region per document and keeps it across content
/// swaps: a region detached by a swap is re-attached to `<body>` with its
/// text intact.
///
/// Only the most recent announcement is kept. A delayed write resolves
/// without writing when a newer `announce` call was written first or is
/// still pending; dropping a pending future withdraws only that intent.
#[derive(Clone)]
pub struct Announcer {
    document: SharedDocument,
    config: LiveRegionConfig,
    region: Rc<Cell<NodeId>>,
    intents: Rc<RefCell<Intents>>,
}

impl Announcer {
    /// Create the announcer and its live region
    pub fn new(document: SharedDocument) -> Self {
        Self::with_config(document, LiveRegionConfig::default())
    }

    pub fn with_config(document: SharedDocument, config: LiveRegionConfig) -> Self {
        let announcer = Self {
            document,
            config,
            region: Rc::new(Cell::new(NodeId::NONE)),
            intents: Rc::new(RefCell::new(Intents::default())),
        };
        announcer.acquire_region();
        announcer
    }

    /// Live region of the current document, re-attached or created if
    /// missing
    pub fn acquire_region(&self) -> Option<NodeId> {
        self.acquire_in(&mut self.document.borrow_mut())
    }

    fn acquire_in(&self, doc: &mut Document) -> Option<NodeId> {
        let known = self.region.get();
        if doc.tree().is_connected(known) {
            return Some(known);
        }

        if let Some(found) = doc.get_element_by_id(LIVE_REGION_ID) {
            self.region.set(found);
            return Some(found);
        }

        if doc.tree().get_attribute(known, "id") == Some(LIVE_REGION_ID) {
            let body = doc.body();
            if doc.tree().is_connected(body) && doc.tree_mut().append_child(body, known) {
                tracing::debug!("Re-attached live region {:?}", known);
                return Some(known);
            }
        }

        let region = acquire_region(doc, &self.config)?;
        self.region.set(region);
        Some(region)
    }

    /// Live region owned by this announcer, attached or not
    pub fn region(&self) -> Option<NodeId> {
        let doc = self.document.borrow();
        let known = self.region.get();
        if doc.tree().get_attribute(known, "id") == Some(LIVE_REGION_ID) {
            Some(known)
        } else {
            doc.get_element_by_id(LIVE_REGION_ID)
        }
    }

    /// Current text of the live region
    pub fn region_text(&self) -> String {
        self.region()
            .map(|region| self.document.borrow().tree().text_content(region))
            .unwrap_or_default()
    }

    /// Write `message` to the live region after `delay`
    ///
    /// A zero delay writes before returning, so the message is announced
    /// even if the returned future is never awaited.
    ///
    /// Repeating the current region text appends a period, since screen
    /// readers skip unchanged content.
    #[must_use = "delayed announcements are only written when the future is awaited"]
    pub fn announce(&self, message: &str, delay: Duration) -> HookFuture {
        let ticket = self.intents.borrow_mut().issue();
        if delay.is_zero() {
            self.write(ticket, message);
            return Box::pin(std::future::ready(()));
        }

        let pending = Pending::new(Rc::clone(&self.intents), ticket);
        let announcer = self.clone();
        let message = message.to_string();
        Box::pin(async move {
            smol::Timer::after(delay).await;
            if !pending.is_latest() {
                tracing::debug!("Announcement superseded: {}", message);
                return;
            }
            announcer.write(ticket, &message);
        })
    }

    fn write(&self, ticket: u64, message: &str) {
        self.intents.borrow_mut().written = ticket;

        let mut doc = self.document.borrow_mut();
        let Some(region) = self.acquire_in(&mut doc) else {
            return;
        };
        let tree = doc.tree_mut();
        let message = if tree.text_content(region) == message { format!("{message}.") } else { message.to_string() };
        tree.set_text_content(region, "");
        tree.set_text_content(region, &message);
        tracing::debug!("Announced: {}", message);
    }
}

impl AnnouncementSink for Announcer {
    fn announce(&self, message: &str, delay: Duration) -> HookFuture {
        Announcer::announce(self, message, delay)
    }
}
