//! Navigator
//!
//! Minimal client-side navigation engine: owns the hook registry, creates
//! visits and runs them through `visit:start → content:replace → visit:end`.
//! Fetching is out of scope; callers hand over the new page's markup.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use fos_dom::{Document, NodeId, SharedDocument};
use fos_html::HtmlParser;

use crate::hooks::{CONTENT_REPLACE, SCROLL_ANCHOR, VISIT_END, VISIT_START};
use crate::{HookArgs, HookFuture, HookHandler, Hooks, Location, NavError, SharedVisit, Visit, VisitId};

/// Programmatic announcement entry point installed by plugins
pub trait Announce {
    /// Announce `message` to assistive technology
    ///
    /// Implementations should write immediate announcements before
    /// returning, so callers may drop the future.
    #[must_use = "the future resolves once the message was written"]
    fn announce(&self, message: &str) -> HookFuture;
}

/// Navigator configuration
#[derive(Debug, Clone)]
pub struct NavigatorOptions {
    /// Selectors of the elements whose content is swapped on each visit
    pub containers: Vec<String>,
}

impl Default for NavigatorOptions {
    fn default() -> Self {
        Self { containers: vec!["body".to_string()] }
    }
}

/// Client-side navigation engine
pub struct Navigator {
    document: SharedDocument,
    hooks: Rc<Hooks>,
    options: NavigatorOptions,
    announcer: RefCell<Option<Rc<dyn Announce>>>,
    next_visit: Cell<u64>,
}

impl Navigator {
    pub fn new(document: SharedDocument) -> Self {
        Self::with_options(document, NavigatorOptions::default())
    }

    pub fn with_options(document: SharedDocument, options: NavigatorOptions) -> Self {
        Self {
            document,
            hooks: Rc::new(Hooks::with_core_hooks()),
            options,
            announcer: RefCell::new(None),
            next_visit: Cell::new(1),
        }
    }

    pub fn hooks(&self) -> &Rc<Hooks> {
        &self.hooks
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    pub fn options(&self) -> &NavigatorOptions {
        &self.options
    }

    /// Create a visit from the current document URL to `url`
    pub fn create_visit(&self, url: &str) -> Result<Visit, NavError> {
        let current = self.document.borrow().url().to_string();
        let from = Location::from_url(&current, "about:blank")?;
        let to = Location::from_url(url, &current)?;
        let id = VisitId(self.next_visit.get());
        self.next_visit.set(id.0 + 1);
        Ok(Visit::new(id, from, to))
    }

    /// Navigate to `url`, whose page markup is `html`
    pub async fn navigate(&self, url: &str, html: &str) -> Result<SharedVisit, NavError> {
        let visit = self.create_visit(url)?.into_shared();
        self.run_visit(&visit, html).await?;
        Ok(visit)
    }

    /// Run an already created visit to completion
    pub async fn run_visit(&self, visit: &SharedVisit, html: &str) -> Result<(), NavError> {
        let href = visit.borrow().to.href().to_string();
        tracing::info!("Visiting {}", href);
        let page = Rc::new(HtmlParser::new().parse_with_url(html, &href));

        self.hooks.call(VISIT_START, visit, HookArgs::None, None).await?;
        self.hooks
            .call(CONTENT_REPLACE, visit, HookArgs::None, Some(self.replace_content(page)))
            .await?;
        self.hooks.call(VISIT_END, visit, HookArgs::None, None).await?;
        Ok(())
    }

    fn replace_content(&self, page: Rc<Document>) -> HookHandler {
        let document = Rc::clone(&self.document);
        let containers = self.options.containers.clone();
        Rc::new(move |_visit: SharedVisit, _args: HookArgs| -> HookFuture {
            swap_containers(&mut document.borrow_mut(), &page, &containers);
            Box::pin(std::future::ready(()))
        })
    }

    /// Jump to an anchor on the current page
    ///
    /// Returns whether the anchor exists.
    pub async fn scroll_to_anchor(&self, hash: &str) -> Result<bool, NavError> {
        let hash = hash.trim_start_matches('#').to_string();
        let current = self.document.borrow().url().to_string();
        let visit = self.create_visit(&format!("#{hash}")).or_else(|_| self.create_visit(&current))?;
        let visit = visit.into_shared();

        let found = self.get_anchor_element(&hash).is_some();
        let document = Rc::clone(&self.document);
        let scroll: HookHandler = Rc::new(move |_visit: SharedVisit, args: HookArgs| -> HookFuture {
            if let HookArgs::ScrollAnchor { hash } = args {
                let mut doc = document.borrow_mut();
                if let Some(anchor) = find_anchor_element(&doc, &hash) {
                    doc.scroll_into_view(anchor);
                }
            }
            Box::pin(std::future::ready(()))
        });
        self.hooks
            .call(SCROLL_ANCHOR, &visit, HookArgs::ScrollAnchor { hash }, Some(scroll))
            .await?;
        Ok(found)
    }

    /// Element targeted by `hash`
    pub fn get_anchor_element(&self, hash: &str) -> Option<NodeId> {
        find_anchor_element(&self.document.borrow(), hash)
    }

    /// Install (or remove) the programmatic announcer
    pub fn set_announcer(&self, announcer: Option<Rc<dyn Announce>>) {
        *self.announcer.borrow_mut() = announcer;
    }

    pub fn has_announcer(&self) -> bool {
        self.announcer.borrow().is_some()
    }

    /// Announce `message` through the installed announcer, if any
    #[must_use = "`None` means no announcer is installed"]
    pub fn announce(&self, message: &str) -> Option<HookFuture> {
        let announcer = self.announcer.borrow().clone()?;
        Some(announcer.announce(message))
    }
}

/// Resolve an anchor target by `id`, then by `<a name>`
pub fn find_anchor_element(document: &Document, hash: &str) -> Option<NodeId> {
    let name = hash.trim_start_matches('#');
    if name.is_empty() {
        return None;
    }
    document.get_element_by_id(name).or_else(|| {
        let tree = document.tree();
        tree.descendants(tree.root()).find(|&id| {
            tree.tag_name(id) == Some("a") && tree.get_attribute(id, "name") == Some(name)
        })
    })
}

fn swap_containers(document: &mut Document, page: &Document, containers: &[String]) {
    for selector in containers {
        let (Some(target), Some(source)) = (document.query_selector(selector), page.query_selector(selector)) else {
            tracing::warn!("Container {} missing on current or new page", selector);
            continue;
        };
        let tree = document.tree_mut();
        tree.remove_children(target);
        for child in page.tree().children(source) {
            if let Some(copy) = tree.import_node(page.tree(), child) {
                tree.append_child(target, copy);
            }
        }
    }

    document.set_title(&page.title());
    let lang = page.lang();
    if lang.is_empty() {
        let html = document.document_element();
        document.tree_mut().remove_attribute(html, "lang");
    } else {
        document.set_lang(lang);
    }
    document.set_url(page.url());
}
