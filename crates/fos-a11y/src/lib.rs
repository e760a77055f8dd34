//! fOS Accessibility
//!
//! Accessibility for client-side navigation in the fOS engine.
//!
//! Features:
//! - Page announcements through a visually-hidden live region
//! - Focus management after each visit (content element or autofocus)
//! - Localized announcement templates
//! - `aria-busy` marking while a visit is in progress
//! - Reduced motion support

pub mod announcements;
pub mod focus;
pub mod live_region;
pub mod options;
pub mod plugin;
pub mod reduced_motion;
pub mod template;

pub use announcements::get_page_announcement;
pub use focus::{focus_autofocus_element, focus_element, get_autofocus_element, FocusRef};
pub use live_region::{acquire_region, AnnouncementSink, Announcer, LiveRegionConfig, LiveRegionMode, LIVE_REGION_ID};
pub use options::{A11yOptions, Announcements, LocaleTemplates, TemplateSet};
pub use plugin::{
    A11yPlugin, Announcement, FocusTarget, PluginInfo, VisitA11y, VisitA11yExt, CONTENT_ANNOUNCE, CONTENT_FOCUS,
};
pub use reduced_motion::{MediaPreferences, MotionPreference, MotionPreferenceSource};
pub use template::render;

/// Accessibility error
#[derive(Debug, thiserror::Error)]
pub enum A11yError {
    #[error("Invalid options: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Hook registration failed: {0}")]
    Hook(#[from] fos_nav::HookError),

    #[error("Plugin is already mounted")]
    AlreadyMounted,
}
