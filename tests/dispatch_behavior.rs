use std::cell::RefCell;
use std::rc::Rc;

use dom_simulate::{
    Error, NodeId, Page, PageConfig, Result, ScrollGeometry, Target, dispatch,
    set_editable_content, set_form_control_value,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

const FIXTURE: &str = r#"
<div id="mocha">
  <button id="first">one</button>
  <button id="second">two</button>
  <input id="name" type="text">
  <input id="upload" type="file">
  <div id="editor" contenteditable="true"></div>
  <div id="pad"></div>
  <div id="scroller"><p>long content</p></div>
</div>
"#;

type Log = Rc<RefCell<Vec<String>>>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn fixture() -> Result<Page> {
    init_tracing();
    Page::from_html(FIXTURE)
}

fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn listen(page: &mut Page, node: NodeId, event: &str, log: &Log, label: &str) -> Result<()> {
    let log = Rc::clone(log);
    let label = label.to_string();
    page.add_event_listener(node, event, false, move |_page, event| {
        log.borrow_mut()
            .push(format!("{label}:{}", event.event_type()));
        Ok(())
    })?;
    Ok(())
}

#[test]
fn click_runs_inline_handler_once() -> Result<()> {
    let mut page = fixture()?;
    let button = page.select_one("#first")?;
    let log = new_log();
    let seen = Rc::clone(&log);
    page.set_event_handler(button, "click", move |_page, event| {
        assert!(!event.is_trusted());
        assert_eq!(event.detail(), 1);
        seen.borrow_mut().push(format!("onclick:{}", event.client_x().unwrap_or(-1.0)));
        Ok(())
    })?;

    dispatch(&mut page, button, "click", &json!({ "clientX": 12 }))?;
    assert_eq!(*log.borrow(), vec!["onclick:12"]);
    Ok(())
}

#[test]
fn sequence_targets_fire_in_order() -> Result<()> {
    let mut page = fixture()?;
    let first = page.select_one("#first")?;
    let second = page.select_one("#second")?;
    let log = new_log();
    listen(&mut page, first, "click", &log, "first")?;
    listen(&mut page, second, "click", &log, "second")?;

    dispatch(&mut page, vec![first, second], "click", &json!({}))?;
    assert_eq!(*log.borrow(), vec!["first:click", "second:click"]);

    log.borrow_mut().clear();
    let buttons = page.select_all("button")?;
    dispatch(&mut page, buttons, "click", &json!(null))?;
    assert_eq!(*log.borrow(), vec!["first:click", "second:click"]);
    Ok(())
}

#[test]
fn invalid_sequence_entry_stops_the_walk() -> Result<()> {
    let mut page = fixture()?;
    let first = page.select_one("#first")?;
    let second = page.select_one("#second")?;
    let document = page.document();
    let log = new_log();
    listen(&mut page, first, "click", &log, "first")?;
    listen(&mut page, second, "click", &log, "second")?;

    let result = dispatch(&mut page, vec![None, Some(second)], "click", &json!({}));
    assert!(matches!(result, Err(Error::InvalidTarget(ref msg)) if msg.contains("target[0]")));
    assert!(log.borrow().is_empty());

    let result = dispatch(
        &mut page,
        Target::Sequence(vec![first.into(), document.into(), second.into()]),
        "click",
        &json!({}),
    );
    assert!(matches!(result, Err(Error::InvalidTarget(_))));
    assert_eq!(*log.borrow(), vec!["first:click"]);
    Ok(())
}

#[test]
fn nested_sequences_are_flattened_in_order() -> Result<()> {
    let mut page = fixture()?;
    let first = page.select_one("#first")?;
    let second = page.select_one("#second")?;
    let log = new_log();
    listen(&mut page, first, "mousedown", &log, "first")?;
    listen(&mut page, second, "mousedown", &log, "second")?;

    let target = Target::Sequence(vec![
        Target::Sequence(vec![second.into(), first.into()]),
        Target::Sequence(Vec::new()),
        second.into(),
    ]);
    dispatch(&mut page, target, "mousedown", &json!({}))?;
    assert_eq!(
        *log.borrow(),
        vec!["second:mousedown", "first:mousedown", "second:mousedown"]
    );
    Ok(())
}

#[test]
fn null_target_is_rejected_before_anything_fires() -> Result<()> {
    let mut page = fixture()?;
    let first = page.select_one("#first")?;
    let log = new_log();
    listen(&mut page, first, "click", &log, "first")?;

    assert!(matches!(
        dispatch(&mut page, Target::Null, "click", &json!({})),
        Err(Error::InvalidTarget(_))
    ));
    assert!(matches!(
        dispatch(&mut page, None::<NodeId>, "random-unknown", &json!({})),
        Err(Error::InvalidTarget(_))
    ));
    let document = page.document();
    assert!(matches!(
        dispatch(&mut page, document, "click", &json!({})),
        Err(Error::InvalidTarget(_))
    ));
    assert!(log.borrow().is_empty());
    Ok(())
}

#[test]
fn unknown_kind_is_rejected() -> Result<()> {
    let mut page = fixture()?;
    let first = page.select_one("#first")?;
    let log = new_log();
    listen(&mut page, first, "click", &log, "first")?;

    for kind in ["random-unknown", "Click", "", "onclick"] {
        match dispatch(&mut page, first, kind, &json!({})) {
            Err(Error::UnsupportedEventKind(name)) => assert_eq!(name, kind),
            other => panic!("expected unsupported kind for {kind:?}, got {other:?}"),
        }
    }
    assert!(matches!(
        dispatch(&mut page, Vec::<NodeId>::new(), "random-unknown", &json!({})),
        Err(Error::UnsupportedEventKind(_))
    ));
    assert!(log.borrow().is_empty());
    Ok(())
}

#[test]
fn touch_event_carries_touch_lists() -> Result<()> {
    let mut page = fixture()?;
    let pad = page.select_one("#pad")?;
    let log = new_log();
    let seen = Rc::clone(&log);
    page.set_event_handler(pad, "touchstart", move |_page, event| {
        let touch = event.touch().map(|t| t.changed_touches.len()).unwrap_or(0);
        seen.borrow_mut().push(format!("touchstart:{touch}"));
        Ok(())
    })?;

    dispatch(
        &mut page,
        pad,
        "touchstart",
        &json!({ "changedTouches": [{ "identifier": 3, "clientX": 4, "clientY": 5 }] }),
    )?;
    assert_eq!(*log.borrow(), vec!["touchstart:1"]);
    Ok(())
}

#[test]
fn unsupported_touch_is_skipped_with_a_warning() -> Result<()> {
    let config = PageConfig {
        touch_supported: false,
        ..PageConfig::default()
    };
    let mut page = Page::from_html_with_config(FIXTURE, config)?;
    page.enable_trace(true);
    let pad = page.select_one("#pad")?;
    let log = new_log();
    listen(&mut page, pad, "touchstart", &log, "pad")?;

    dispatch(&mut page, pad, "touchstart", &json!({}))?;
    assert!(log.borrow().is_empty());
    let logs = page.take_trace_logs();
    assert!(
        logs.iter()
            .any(|line| line == "[touch] skipped touchstart target=#pad reason=unsupported"),
        "missing warning in {logs:?}"
    );

    page.set_touch_supported(true);
    dispatch(&mut page, pad, "touchstart", &json!({}))?;
    assert_eq!(*log.borrow(), vec!["pad:touchstart"]);
    Ok(())
}

#[test]
fn keyboard_kinds_reach_their_handler_properties() -> Result<()> {
    let mut page = fixture()?;
    let name = page.select_one("#name")?;
    let log = new_log();
    for kind in ["keydown", "keyup", "keypress"] {
        let seen = Rc::clone(&log);
        page.set_event_handler(name, kind, move |_page, event| {
            seen.borrow_mut().push(format!(
                "{}:{}:{}",
                event.event_type(),
                event.key().unwrap_or("?"),
                event.char_code().unwrap_or(u32::MAX)
            ));
            Ok(())
        })?;
    }

    for kind in ["keydown", "keyup", "keypress"] {
        dispatch(&mut page, name, kind, &json!({ "key": "a" }))?;
    }
    assert_eq!(
        *log.borrow(),
        vec!["keydown:a:0", "keyup:a:0", "keypress:a:97"]
    );
    Ok(())
}

#[test]
fn keyup_key_round_trips_verbatim() -> Result<()> {
    let mut page = fixture()?;
    let name = page.select_one("#name")?;
    let seen: Rc<RefCell<Option<(String, u32)>>> = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&seen);
    page.add_event_listener(name, "keyup", false, move |_page, event| {
        let key = event.key().unwrap_or_default().to_string();
        *sink.borrow_mut() = Some((key, event.key_code().unwrap_or(0)));
        Ok(())
    })?;

    dispatch(&mut page, name, "keyup", &json!({ "key": "a" }))?;
    assert_eq!(*seen.borrow(), Some(("a".to_string(), 65)));

    dispatch(&mut page, name, "keyup", &json!({ "key": "ArrowLeft", "keyCode": 37 }))?;
    assert_eq!(*seen.borrow(), Some(("ArrowLeft".to_string(), 37)));
    Ok(())
}

#[test]
fn wheel_without_element_scroll_leaves_offsets_alone() -> Result<()> {
    let mut page = fixture()?;
    let scroller = page.select_one("#scroller")?;
    page.set_scroll_geometry(scroller, ScrollGeometry::new(100.0, 100.0, 100.0, 600.0))?;
    let log = new_log();
    listen(&mut page, scroller, "wheel", &log, "scroller")?;

    dispatch(&mut page, scroller, "wheel", &json!({ "deltaX": 0, "deltaY": 200 }))?;
    assert_eq!(*log.borrow(), vec!["scroller:wheel"]);
    assert_eq!(page.scroll_top(scroller)?, 0.0);
    assert_eq!(page.scroll_left(scroller)?, 0.0);
    Ok(())
}

#[test]
fn wheel_element_scroll_moves_and_clamps_offsets() -> Result<()> {
    let mut page = fixture()?;
    let scroller = page.select_one("#scroller")?;
    let options = json!({ "deltaX": 0, "deltaY": 200, "elementScroll": true });

    // Scrollable range larger than the delta.
    page.set_scroll_geometry(scroller, ScrollGeometry::new(100.0, 100.0, 100.0, 600.0))?;
    dispatch(&mut page, scroller, "wheel", &options)?;
    assert_eq!(page.scroll_top(scroller)?, 200.0);
    dispatch(&mut page, scroller, "wheel", &options)?;
    assert_eq!(page.scroll_top(scroller)?, 400.0);
    dispatch(&mut page, scroller, "wheel", &options)?;
    assert_eq!(page.scroll_top(scroller)?, 500.0);

    // Scrollable range smaller than the delta.
    let small = page.select_one("#pad")?;
    page.set_scroll_geometry(small, ScrollGeometry::new(100.0, 100.0, 100.0, 220.0))?;
    dispatch(&mut page, small, "wheel", &options)?;
    assert_eq!(page.scroll_top(small)?, 120.0);

    dispatch(
        &mut page,
        small,
        "wheel",
        &json!({ "deltaY": -500, "deltaX": 40, "elementScroll": true }),
    )?;
    assert_eq!(page.scroll_top(small)?, 0.0);
    assert_eq!(page.scroll_left(small)?, 0.0);
    Ok(())
}

#[test]
fn wheel_element_scroll_ignores_prevent_default() -> Result<()> {
    let mut page = fixture()?;
    let scroller = page.select_one("#scroller")?;
    page.set_scroll_geometry(scroller, ScrollGeometry::new(100.0, 100.0, 100.0, 600.0))?;
    page.add_event_listener(scroller, "wheel", false, |page, event| {
        event.prevent_default();
        assert!(event.default_prevented());
        assert_eq!(page.scroll_top(event.target())?, 0.0);
        Ok(())
    })?;

    dispatch(
        &mut page,
        scroller,
        "wheel",
        &json!({ "deltaY": 50, "elementScroll": true }),
    )?;
    assert_eq!(page.scroll_top(scroller)?, 50.0);
    Ok(())
}

#[test]
fn change_installs_files_before_listeners_run() -> Result<()> {
    let mut page = fixture()?;
    let upload = page.select_one("#upload")?;
    let log = new_log();
    let seen = Rc::clone(&log);
    page.add_event_listener(upload, "change", false, move |page, event| {
        let names = page
            .files(event.target())?
            .map(|files| files.names())
            .unwrap_or_default();
        seen.borrow_mut().push(format!("{}:{}", names.len(), names.join(",")));
        Ok(())
    })?;

    dispatch(
        &mut page,
        upload,
        "change",
        &json!({ "data": { "target": { "files": [{ "file": "a.png" }, { "file": "b.jpg" }] } } }),
    )?;
    assert_eq!(*log.borrow(), vec!["2:a.png,b.jpg"]);

    // Plain change events leave the installed list in place.
    dispatch(&mut page, upload, "change", &json!({}))?;
    assert_eq!(log.borrow().last().map(String::as_str), Some("2:a.png,b.jpg"));
    Ok(())
}

#[test]
fn change_files_apply_to_any_element() -> Result<()> {
    let mut page = fixture()?;
    let pad = page.select_one("#pad")?;
    assert_eq!(page.files(pad)?, None);

    dispatch(
        &mut page,
        pad,
        "change",
        &json!({ "data": { "target": { "files": ["notes.txt"] } } }),
    )?;
    let files = page.files(pad)?.unwrap_or_default();
    assert_eq!(files.names(), vec!["notes.txt"]);
    Ok(())
}

#[test]
fn form_control_value_fires_input_once() -> Result<()> {
    let mut page = fixture()?;
    let name = page.select_one("#name")?;
    let log = new_log();
    listen(&mut page, name, "input", &log, "name")?;

    set_form_control_value(&mut page, name, "foo")?;
    assert_eq!(page.value(name)?, "foo");
    assert_eq!(*log.borrow(), vec!["name:input"]);
    Ok(())
}

#[test]
fn editable_content_fires_input_once() -> Result<()> {
    let mut page = fixture()?;
    let editor = page.select_one("#editor")?;
    let mocha = page.select_one("#mocha")?;
    let log = new_log();
    listen(&mut page, editor, "input", &log, "editor")?;
    listen(&mut page, mocha, "input", &log, "mocha")?;

    set_editable_content(&mut page, editor, "foo")?;
    assert_eq!(page.inner_html(editor)?, "foo");
    assert_eq!(*log.borrow(), vec!["editor:input", "mocha:input"]);
    Ok(())
}

#[test]
fn form_control_value_drives_textarea_and_select() -> Result<()> {
    init_tracing();
    let mut page = Page::from_html(
        r#"<form id="order">
  <textarea id="notes">old</textarea>
  <select id="size"><option value="s">S</option><option value="m">M</option></select>
</form>"#,
    )?;
    let notes = page.select_one("#notes")?;
    let size = page.select_one("#size")?;
    assert_eq!(page.value(notes)?, "old");
    assert_eq!(page.value(size)?, "s");

    let log = new_log();
    for (node, label) in [(notes, "notes"), (size, "size")] {
        let seen = Rc::clone(&log);
        let label = label.to_string();
        page.add_event_listener(node, "input", false, move |page, event| {
            let value = page.value(event.target())?;
            seen.borrow_mut().push(format!("{label}:{value}"));
            Ok(())
        })?;
    }

    set_form_control_value(&mut page, notes, "foo")?;
    set_form_control_value(&mut page, size, "m")?;

    assert_eq!(page.value(notes)?, "foo");
    assert_eq!(page.value(size)?, "m");
    assert_eq!(*log.borrow(), vec!["notes:foo", "size:m"]);
    Ok(())
}

#[test]
fn editable_content_accepts_truncated_markup() -> Result<()> {
    let mut page = fixture()?;
    let editor = page.select_one("#editor")?;
    let log = new_log();
    listen(&mut page, editor, "input", &log, "editor")?;

    set_editable_content(&mut page, editor, "x <b")?;
    assert_eq!(page.inner_html(editor)?, "x ");

    set_editable_content(&mut page, editor, "a</")?;
    assert_eq!(page.text_content(editor), "a</");
    assert_eq!(*log.borrow(), vec!["editor:input", "editor:input"]);
    Ok(())
}

#[test]
fn handler_error_propagates_and_stops_the_sequence() -> Result<()> {
    let mut page = fixture()?;
    let first = page.select_one("#first")?;
    let second = page.select_one("#second")?;
    let log = new_log();
    page.add_event_listener(first, "click", false, |_page, _event| {
        Err(Error::handler("boom"))
    })?;
    listen(&mut page, second, "click", &log, "second")?;

    match dispatch(&mut page, vec![first, second], "click", &json!({})) {
        Err(Error::Handler(message)) => assert_eq!(message, "boom"),
        other => panic!("expected handler error, got {other:?}"),
    }
    assert!(log.borrow().is_empty());
    Ok(())
}

#[test]
fn handlers_may_dispatch_reentrantly() -> Result<()> {
    let mut page = fixture()?;
    let first = page.select_one("#first")?;
    let second = page.select_one("#second")?;
    let log = new_log();
    page.add_event_listener(first, "click", false, move |page, _event| {
        dispatch(page, second, "focus", &json!({}))
    })?;
    listen(&mut page, second, "focus", &log, "second")?;

    dispatch(&mut page, first, "click", &json!({}))?;
    assert_eq!(*log.borrow(), vec!["second:focus"]);
    Ok(())
}

#[test]
fn trace_records_dispatch_and_delivery() -> Result<()> {
    let mut page = fixture()?;
    page.enable_trace(true);
    let first = page.select_one("#first")?;
    listen(&mut page, first, "click", &new_log(), "first")?;

    dispatch(&mut page, first, "click", &json!({}))?;
    let logs = page.take_trace_logs();
    assert_eq!(
        logs.first().map(String::as_str),
        Some("[dispatch] click target=#first bubbles=true cancelable=true augmentations=0")
    );
    assert!(logs.iter().any(|line| {
        line == "[event] click target=#first current=#first phase=target default_prevented=false"
    }));
    assert!(
        logs.last()
            .is_some_and(|line| line.starts_with("[event] done click target=#first"))
    );
    Ok(())
}

#[test]
fn bubbles_override_keeps_event_at_target() -> Result<()> {
    let mut page = fixture()?;
    let first = page.select_one("#first")?;
    let mocha = page.select_one("#mocha")?;
    let log = new_log();
    listen(&mut page, first, "click", &log, "first")?;
    listen(&mut page, mocha, "click", &log, "mocha")?;

    dispatch(&mut page, first, "click", &json!({ "bubbles": false }))?;
    assert_eq!(*log.borrow(), vec!["first:click"]);

    log.borrow_mut().clear();
    dispatch(&mut page, first, "click", &json!({}))?;
    assert_eq!(*log.borrow(), vec!["first:click", "mocha:click"]);
    Ok(())
}
