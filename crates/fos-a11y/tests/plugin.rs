//! Visit lifecycle tests for the accessibility plugin

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use fos_a11y::{
    A11yError, A11yOptions, A11yPlugin, AnnouncementSink, Announcement, FocusTarget, MotionPreference, VisitA11y,
    VisitA11yExt, CONTENT_ANNOUNCE, CONTENT_FOCUS, LIVE_REGION_ID,
};
use fos_html::HtmlParser;
use fos_nav::{sync_handler, HookArgs, HookFuture, HookOptions, Navigator, CONTENT_REPLACE, VISIT_END, VISIT_START};

const HOME: &str = r#"<html lang="en"><head><title>Home</title></head>
<body><main><h1>Welcome</h1></main></body></html>"#;

const ABOUT: &str = r#"<html lang="en"><head><title>About us</title></head>
<body><main><h1>About</h1><p id="team">Team</p><a name="contact">Contact</a></main></body></html>"#;

const FORM: &str = r#"<html><head><title>Search</title></head>
<body><main><h1>Search</h1><input id="query" autofocus></main></body></html>"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct RecordingSink {
    calls: RefCell<Vec<(String, Duration)>>,
}

impl AnnouncementSink for RecordingSink {
    fn announce(&self, message: &str, delay: Duration) -> HookFuture {
        self.calls.borrow_mut().push((message.to_string(), delay));
        Box::pin(async {})
    }
}

struct Harness {
    nav: Navigator,
    plugin: A11yPlugin,
    sink: Rc<RecordingSink>,
}

impl Harness {
    fn new(options: A11yOptions) -> Self {
        Self::with_motion(options, MotionPreference::NoPreference)
    }

    fn with_motion(options: A11yOptions, motion: MotionPreference) -> Self {
        init_tracing();
        let document = Rc::new(RefCell::new(HtmlParser::new().parse_with_url(HOME, "http://localhost/")));
        let nav = Navigator::new(Rc::clone(&document));
        let sink = Rc::new(RecordingSink::default());
        let plugin = A11yPlugin::with_capabilities(document, options, sink.clone(), Rc::new(motion));
        plugin.mount(&nav).expect("mount");
        Self { nav, plugin, sink }
    }

    fn busy(&self) -> Option<String> {
        let doc = self.nav.document().borrow();
        doc.tree().get_attribute(doc.document_element(), "aria-busy").map(str::to_string)
    }

    fn calls(&self) -> Vec<(String, Duration)> {
        self.sink.calls.borrow().clone()
    }
}

#[test]
fn test_mount_creates_hooks() {
    let h = Harness::new(A11yOptions::default());
    assert!(h.nav.hooks().exists(CONTENT_ANNOUNCE));
    assert!(h.nav.hooks().exists(CONTENT_FOCUS));
    assert!(h.nav.has_announcer());
    assert!(h.plugin.is_mounted());
}

#[test]
fn test_mount_twice_fails() {
    let h = Harness::new(A11yOptions::default());
    assert!(matches!(h.plugin.mount(&h.nav), Err(A11yError::AlreadyMounted)));
}

#[test]
fn test_visit_start_stamps_visit_and_marks_busy() -> anyhow::Result<()> {
    let h = Harness::new(A11yOptions::default());
    let visit = h.nav.create_visit("/about")?.into_shared();

    smol::block_on(h.nav.hooks().call(VISIT_START, &visit, HookArgs::None, None))?;

    assert_eq!(
        visit.borrow().a11y(),
        Some(&VisitA11y { announce: Announcement::Default, focus: FocusTarget::Selector("body".to_string()) })
    );
    assert_eq!(h.busy().as_deref(), Some("true"));

    smol::block_on(h.nav.hooks().call(VISIT_END, &visit, HookArgs::None, None))?;
    assert_eq!(h.busy(), None);
    Ok(())
}

#[test]
fn test_busy_during_content_replacement_only() -> anyhow::Result<()> {
    let h = Harness::new(A11yOptions::default());
    let seen = Rc::new(RefCell::new(Vec::new()));
    for hook in [CONTENT_REPLACE, VISIT_END] {
        let seen = Rc::clone(&seen);
        let document = Rc::clone(h.nav.document());
        h.nav.hooks().on(
            hook,
            sync_handler(move |_, _| {
                let doc = document.borrow();
                let busy = doc.tree().get_attribute(doc.document_element(), "aria-busy").map(str::to_string);
                seen.borrow_mut().push((hook, busy));
            }),
            HookOptions::default(),
        )?;
    }

    smol::block_on(h.nav.navigate("/about", ABOUT))?;
    assert_eq!(
        *seen.borrow(),
        vec![(CONTENT_REPLACE, Some("true".to_string())), (VISIT_END, None)]
    );
    Ok(())
}

#[test]
fn test_reduced_motion_ignored_by_default() -> anyhow::Result<()> {
    let h = Harness::with_motion(A11yOptions::default(), MotionPreference::Reduce);
    let visit = h.nav.create_visit("/about")?.into_shared();
    smol::block_on(h.nav.hooks().call(VISIT_START, &visit, HookArgs::None, None))?;
    assert!(visit.borrow().animation.animate);
    assert_eq!(visit.borrow().scroll.animate, None);
    Ok(())
}

#[test]
fn test_reduced_motion_disables_animations() -> anyhow::Result<()> {
    let options = A11yOptions { respect_reduced_motion: true, ..A11yOptions::default() };
    let h = Harness::with_motion(options, MotionPreference::Reduce);
    let visit = h.nav.create_visit("/about")?.into_shared();
    smol::block_on(h.nav.hooks().call(VISIT_START, &visit, HookArgs::None, None))?;
    assert!(!visit.borrow().animation.animate);
    assert_eq!(visit.borrow().scroll.animate, Some(false));
    Ok(())
}

#[test]
fn test_reduced_motion_without_preference() -> anyhow::Result<()> {
    let options = A11yOptions { respect_reduced_motion: true, ..A11yOptions::default() };
    let h = Harness::new(options);
    let visit = h.nav.create_visit("/about")?.into_shared();
    smol::block_on(h.nav.hooks().call(VISIT_START, &visit, HookArgs::None, None))?;
    assert!(visit.borrow().animation.animate);
    Ok(())
}

#[test]
fn test_navigation_focuses_content_and_announces() -> anyhow::Result<()> {
    let options = A11yOptions { content_selector: "main".to_string(), ..A11yOptions::default() };
    let h = Harness::new(options);

    let visit = smol::block_on(h.nav.navigate("/about", ABOUT))?;

    assert_eq!(h.calls(), vec![("Navigated to: About".to_string(), Duration::from_millis(100))]);
    assert_eq!(
        visit.borrow().a11y().map(|a| a.announce.clone()),
        Some(Announcement::Text("Navigated to: About".to_string()))
    );

    let doc = h.nav.document().borrow();
    let main = doc.query_selector("main");
    assert!(main.is_some());
    assert_eq!(doc.active_element(), main);
    assert_eq!(doc.scrolled_into_view(), None);
    Ok(())
}

#[test]
fn test_announcement_delay_option() -> anyhow::Result<()> {
    let h = Harness::new(A11yOptions::default());
    h.plugin.update_options(|options| options.announcement_delay = 250);
    smol::block_on(h.nav.navigate("/about", ABOUT))?;
    assert_eq!(h.calls()[0].1, Duration::from_millis(250));
    Ok(())
}

#[test]
fn test_suppressed_announcement() -> anyhow::Result<()> {
    let h = Harness::new(A11yOptions::default());
    h.nav.hooks().before(
        CONTENT_ANNOUNCE,
        sync_handler(|visit, _| {
            if let Some(a11y) = visit.borrow_mut().a11y_mut() {
                a11y.announce = Announcement::from("");
            }
        }),
    )?;

    smol::block_on(h.nav.navigate("/about", ABOUT))?;
    assert!(h.calls().is_empty());
    Ok(())
}

#[test]
fn test_custom_announcement() -> anyhow::Result<()> {
    let h = Harness::new(A11yOptions::default());
    h.nav.hooks().before(
        CONTENT_ANNOUNCE,
        sync_handler(|visit, _| {
            if let Some(a11y) = visit.borrow_mut().a11y_mut() {
                a11y.announce = Announcement::from("Custom message");
            }
        }),
    )?;

    smol::block_on(h.nav.navigate("/about", ABOUT))?;
    assert_eq!(h.calls()[0].0, "Custom message");
    Ok(())
}

#[test]
fn test_empty_focus_leaves_focus_alone() -> anyhow::Result<()> {
    let h = Harness::new(A11yOptions::default());
    h.nav.hooks().before(
        CONTENT_FOCUS,
        sync_handler(|visit, _| {
            if let Some(a11y) = visit.borrow_mut().a11y_mut() {
                a11y.focus = FocusTarget::from("");
            }
        }),
    )?;

    smol::block_on(h.nav.navigate("/about", ABOUT))?;
    let doc = h.nav.document().borrow();
    assert_eq!(doc.active_element(), Some(doc.body()));
    assert!(!doc.tree().has_attribute(doc.body(), "tabindex"));
    Ok(())
}

#[test]
fn test_focus_handler_can_be_replaced() -> anyhow::Result<()> {
    let options = A11yOptions { content_selector: "main".to_string(), ..A11yOptions::default() };
    let h = Harness::new(options);
    let document = Rc::clone(h.nav.document());
    h.nav.hooks().on(
        CONTENT_FOCUS,
        sync_handler(move |_, _| {
            let mut doc = document.borrow_mut();
            if let Some(team) = doc.get_element_by_id("team") {
                fos_a11y::focus_element(&mut doc, team);
            }
        }),
        HookOptions::replace(),
    )?;

    smol::block_on(h.nav.navigate("/about", ABOUT))?;
    let doc = h.nav.document().borrow();
    assert_eq!(doc.active_element(), doc.get_element_by_id("team"));
    Ok(())
}

#[test]
fn test_autofocus_preferred_when_enabled() -> anyhow::Result<()> {
    let options = A11yOptions { content_selector: "main".to_string(), autofocus: true, ..A11yOptions::default() };
    let h = Harness::new(options);

    smol::block_on(h.nav.navigate("/search", FORM))?;
    let doc = h.nav.document().borrow();
    assert_eq!(doc.active_element(), doc.get_element_by_id("query"));
    let main = doc.query_selector("main").unwrap();
    assert!(!doc.tree().has_attribute(main, "tabindex"));
    Ok(())
}

#[test]
fn test_autofocus_ignored_by_default() -> anyhow::Result<()> {
    let options = A11yOptions { content_selector: "main".to_string(), ..A11yOptions::default() };
    let h = Harness::new(options);

    smol::block_on(h.nav.navigate("/search", FORM))?;
    let doc = h.nav.document().borrow();
    assert_eq!(doc.active_element(), doc.query_selector("main"));
    Ok(())
}

#[test]
fn test_autofocus_falls_back_to_content() -> anyhow::Result<()> {
    let options = A11yOptions { content_selector: "main".to_string(), autofocus: true, ..A11yOptions::default() };
    let h = Harness::new(options);

    smol::block_on(h.nav.navigate("/about", ABOUT))?;
    let doc = h.nav.document().borrow();
    assert_eq!(doc.active_element(), doc.query_selector("main"));
    Ok(())
}

#[test]
fn test_anchor_jump_moves_focus() -> anyhow::Result<()> {
    let h = Harness::new(A11yOptions::default());
    smol::block_on(h.nav.navigate("/about", ABOUT))?;

    assert!(smol::block_on(h.nav.scroll_to_anchor("#team"))?);
    {
        let doc = h.nav.document().borrow();
        assert_eq!(doc.active_element(), doc.get_element_by_id("team"));
    }

    assert!(smol::block_on(h.nav.scroll_to_anchor("contact"))?);
    let doc = h.nav.document().borrow();
    let contact = doc.query_selector("a[name=contact]");
    assert_eq!(doc.active_element(), contact);
    Ok(())
}

#[test]
fn test_navigator_announce() {
    let h = Harness::new(A11yOptions::default());
    let done = h.nav.announce("Hello").expect("announcer installed");
    smol::block_on(done);
    smol::block_on(h.plugin.announce("Again"));
    assert_eq!(
        h.calls(),
        vec![("Hello".to_string(), Duration::ZERO), ("Again".to_string(), Duration::ZERO)]
    );
}

#[test]
fn test_unmount_removes_handlers() -> anyhow::Result<()> {
    let h = Harness::new(A11yOptions::default());
    h.plugin.unmount(&h.nav);
    assert!(!h.plugin.is_mounted());
    assert!(!h.nav.has_announcer());

    let visit = h.nav.create_visit("/about")?.into_shared();
    smol::block_on(h.nav.hooks().call(VISIT_START, &visit, HookArgs::None, None))?;
    assert!(visit.borrow().a11y().is_none());
    assert_eq!(h.busy(), None);

    smol::block_on(h.nav.navigate("/about", ABOUT))?;
    assert!(h.calls().is_empty());

    h.plugin.mount(&h.nav)?;
    assert!(h.nav.has_announcer());
    Ok(())
}

#[test]
fn test_live_region_survives_content_swap() -> anyhow::Result<()> {
    init_tracing();
    let document = Rc::new(RefCell::new(HtmlParser::new().parse_with_url(HOME, "http://localhost/")));
    let nav = Navigator::new(Rc::clone(&document));
    let options = A11yOptions { announcement_delay: 0, ..A11yOptions::default() };
    let plugin = A11yPlugin::new(Rc::clone(&document), options);
    plugin.mount(&nav)?;
    let region = document.borrow().get_element_by_id(LIVE_REGION_ID).expect("live region created");

    let mut texts = Vec::new();
    for _ in 0..3 {
        smol::block_on(nav.navigate("/about", ABOUT))?;
        let doc = document.borrow();
        assert_eq!(doc.get_element_by_id(LIVE_REGION_ID), Some(region));
        assert_eq!(doc.tree().parent(region), doc.body());
        assert_eq!(doc.tree().query_selector_all(doc.tree().root(), "[aria-live]").len(), 1);
        texts.push(doc.tree().text_content(region));
    }
    assert_eq!(texts, vec!["Navigated to: About", "Navigated to: About.", "Navigated to: About"]);
    Ok(())
}

#[test]
fn test_unawaited_navigator_announcement_is_written() -> anyhow::Result<()> {
    init_tracing();
    let document = Rc::new(RefCell::new(HtmlParser::new().parse_with_url(HOME, "http://localhost/")));
    let nav = Navigator::new(Rc::clone(&document));
    let plugin = A11yPlugin::new(Rc::clone(&document), A11yOptions::default());
    plugin.mount(&nav)?;

    let first = nav.announce("First").expect("announcer installed");
    drop(nav.announce("Second"));
    smol::block_on(first);

    let doc = document.borrow();
    let region = doc.get_element_by_id(LIVE_REGION_ID).expect("live region");
    assert_eq!(doc.tree().text_content(region), "Second");
    Ok(())
}

#[test]
fn test_localized_announcement_end_to_end() -> anyhow::Result<()> {
    let options = A11yOptions::from_json(
        r#"{
            "announcements": {
                "de": {"visit": "Navigiert zu: {title}", "url": "Neue Seite unter {url}"},
                "*": {"visit": "Navigated to: {title}", "url": "New page at {url}"}
            },
            "announcementDelay": 0
        }"#,
    )?;
    let h = Harness::new(options);

    smol::block_on(h.nav.navigate("/ueber", r#"<html lang="de"><body><h1>Über uns</h1></body></html>"#))?;
    smol::block_on(h.nav.navigate("/plain", "<html><body></body></html>"))?;

    let messages: Vec<String> = h.calls().into_iter().map(|(message, _)| message).collect();
    assert_eq!(messages, vec!["Navigiert zu: Über uns", "Navigated to: New page at /plain"]);
    Ok(())
}
