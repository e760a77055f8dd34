//! fOS Navigation
//!
//! Client-side page navigation for single-page sites:
//! - Visit lifecycle (`visit:start`, `content:replace`, `visit:end`)
//! - Named hooks with before/replace/once registration
//! - In-page anchor jumps (`scroll:anchor`)
//! - Per-visit plugin state via typed extensions

mod hooks;
mod navigator;
mod visit;

pub use hooks::{
    sync_handler, HookArgs, HookFuture, HookHandle, HookHandler, HookOptions, Hooks, CONTENT_REPLACE,
    CORE_HOOKS, SCROLL_ANCHOR, VISIT_END, VISIT_START,
};
pub use navigator::{find_anchor_element, Announce, Navigator, NavigatorOptions};
pub use visit::{AnimationSettings, Extensions, Location, ScrollSettings, SharedVisit, Visit, VisitId};

/// Hook registry error
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HookError {
    #[error("Unknown hook: {0}")]
    Unknown(String),

    #[error("Hook already exists: {0}")]
    AlreadyExists(String),
}

/// Navigation error
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    Hook(#[from] HookError),
}
