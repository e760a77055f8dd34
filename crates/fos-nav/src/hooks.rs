//! Lifecycle Hooks
//!
//! Named hooks that plugins subscribe to. Calling a hook runs, in order:
//! every `before` handler, then the last `replace` handler (or the default
//! handler supplied by the caller), then every remaining handler.
//! Handlers are async; each one is awaited before the next starts, so a
//! single visit never interleaves its own stages.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use crate::{HookError, SharedVisit};

/// Boxed future returned by hook handlers
pub type HookFuture = Pin<Box<dyn Future<Output = ()>>>;

/// Hook handler
pub type HookHandler = Rc<dyn Fn(SharedVisit, HookArgs) -> HookFuture>;

pub const VISIT_START: &str = "visit:start";
pub const CONTENT_REPLACE: &str = "content:replace";
pub const VISIT_END: &str = "visit:end";
pub const SCROLL_ANCHOR: &str = "scroll:anchor";

/// Hooks every navigator provides
pub const CORE_HOOKS: &[&str] = &[VISIT_START, CONTENT_REPLACE, VISIT_END, SCROLL_ANCHOR];

/// Extra data passed alongside the visit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum HookArgs {
    #[default]
    None,
    /// In-page jump to `hash` (without `#`)
    ScrollAnchor { hash: String },
}

/// Registration options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookOptions {
    /// Run before the default handler
    pub before: bool,
    /// Run instead of the default handler
    pub replace: bool,
    /// Unregister after the first run
    pub once: bool,
}

impl HookOptions {
    pub fn before() -> Self {
        Self { before: true, ..Self::default() }
    }

    pub fn replace() -> Self {
        Self { replace: true, ..Self::default() }
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }
}

/// Returned by [`Hooks::on`]; pass to [`Hooks::off`] to unregister
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HookHandle {
    hook: String,
    id: u64,
}

impl HookHandle {
    pub fn hook(&self) -> &str {
        &self.hook
    }
}

struct Registration {
    id: u64,
    options: HookOptions,
    handler: HookHandler,
}

/// Hook registry
#[derive(Default)]
pub struct Hooks {
    registry: RefCell<HashMap<String, Vec<Registration>>>,
    next_id: Cell<u64>,
}

impl Hooks {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the core navigation hooks
    pub fn with_core_hooks() -> Self {
        let hooks = Self::new();
        for name in CORE_HOOKS {
            hooks.registry.borrow_mut().insert((*name).to_string(), Vec::new());
        }
        hooks
    }

    /// Register a new hook name
    pub fn create(&self, name: &str) -> Result<(), HookError> {
        let mut registry = self.registry.borrow_mut();
        if registry.contains_key(name) {
            return Err(HookError::AlreadyExists(name.to_string()));
        }
        registry.insert(name.to_string(), Vec::new());
        tracing::debug!("Created hook {}", name);
        Ok(())
    }

    pub fn exists(&self, name: &str) -> bool {
        self.registry.borrow().contains_key(name)
    }

    /// Subscribe `handler` to hook `name`
    pub fn on<F>(&self, name: &str, handler: F, options: HookOptions) -> Result<HookHandle, HookError>
    where
        F: Fn(SharedVisit, HookArgs) -> HookFuture + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        let Some(registrations) = registry.get_mut(name) else {
            tracing::warn!("Cannot subscribe to unknown hook {}", name);
            return Err(HookError::Unknown(name.to_string()));
        };
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        registrations.push(Registration {
            id,
            options,
            handler: Rc::new(handler),
        });
        Ok(HookHandle { hook: name.to_string(), id })
    }

    /// Subscribe a handler that runs before the default handler
    pub fn before<F>(&self, name: &str, handler: F) -> Result<HookHandle, HookError>
    where
        F: Fn(SharedVisit, HookArgs) -> HookFuture + 'static,
    {
        self.on(name, handler, HookOptions::before())
    }

    /// Unsubscribe; returns false if the handler was already gone
    pub fn off(&self, handle: &HookHandle) -> bool {
        let mut registry = self.registry.borrow_mut();
        let Some(registrations) = registry.get_mut(&handle.hook) else {
            return false;
        };
        let before = registrations.len();
        registrations.retain(|r| r.id != handle.id);
        registrations.len() != before
    }

    /// Number of handlers subscribed to `name`
    pub fn handler_count(&self, name: &str) -> usize {
        self.registry.borrow().get(name).map_or(0, Vec::len)
    }

    /// Run hook `name` for `visit`
    ///
    /// Handlers are snapshotted before the first one runs, so handlers may
    /// subscribe, unsubscribe or call other hooks while this call is in
    /// progress.
    pub async fn call(
        &self,
        name: &str,
        visit: &SharedVisit,
        args: HookArgs,
        default: Option<HookHandler>,
    ) -> Result<(), HookError> {
        let (before, main, after) = {
            let mut registry = self.registry.borrow_mut();
            let Some(registrations) = registry.get_mut(name) else {
                return Err(HookError::Unknown(name.to_string()));
            };

            let mut before = Vec::new();
            let mut after = Vec::new();
            let mut replacement = None;
            for registration in registrations.iter() {
                let handler = Rc::clone(&registration.handler);
                if registration.options.before {
                    before.push(handler);
                } else if registration.options.replace {
                    replacement = Some(handler);
                } else {
                    after.push(handler);
                }
            }
            registrations.retain(|r| !r.options.once);
            (before, replacement.or(default), after)
        };

        tracing::debug!("Calling hook {} for visit {:?}", name, visit.borrow().id);
        for handler in before.into_iter().chain(main).chain(after) {
            handler(Rc::clone(visit), args.clone()).await;
        }
        Ok(())
    }
}

/// Wrap a synchronous closure as a hook handler
pub fn sync_handler<F>(f: F) -> impl Fn(SharedVisit, HookArgs) -> HookFuture + 'static
where
    F: Fn(&SharedVisit, &HookArgs) + 'static,
{
    move |visit: SharedVisit, args: HookArgs| -> HookFuture {
        f(&visit, &args);
        Box::pin(std::future::ready(()))
    }
}
