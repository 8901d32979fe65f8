//! Target resolution, event construction and delivery.
//!
//! [`dispatch`] is the single entry point: it validates the target, parses
//! the event kind, builds a [`SyntheticEvent`] from the option bag and hands
//! it to the host. Two behaviors deliberately go beyond what a native event
//! can do and are modelled as explicit [`Augmentation`]s rather than being
//! folded into construction:
//!
//! - `change` with `data.target.files` installs a file list on the target
//!   before delivery, overriding the read-only `files` slot;
//! - `wheel` with `elementScroll: true` moves the target's scroll offset by
//!   the wheel deltas after delivery, clamped to its scrollable range.

use serde_json::Value;

use crate::config::EnvironmentDefaults;
use crate::dom::NodeId;
use crate::error::{Error, Result};
use crate::event::{
    Event, EventFamily, EventInit, EventKind, KeyboardEventInit, Modifiers, MouseEventInit,
    PointerFields, Touch, TouchEventInit, UiEventInit, WheelEventInit,
};
use crate::files::FileList;
use crate::host::{Host, ScrollOffset};
use crate::options::OptionBag;

#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Null,
    Node(NodeId),
    Sequence(Vec<Target>),
}

impl From<NodeId> for Target {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl From<Option<NodeId>> for Target {
    fn from(node: Option<NodeId>) -> Self {
        node.map_or(Self::Null, Self::Node)
    }
}

impl From<Vec<NodeId>> for Target {
    fn from(nodes: Vec<NodeId>) -> Self {
        Self::Sequence(nodes.into_iter().map(Self::Node).collect())
    }
}

impl From<&[NodeId]> for Target {
    fn from(nodes: &[NodeId]) -> Self {
        Self::Sequence(nodes.iter().copied().map(Self::Node).collect())
    }
}

impl<const N: usize> From<[NodeId; N]> for Target {
    fn from(nodes: [NodeId; N]) -> Self {
        Self::Sequence(nodes.into_iter().map(Self::Node).collect())
    }
}

impl From<Vec<Option<NodeId>>> for Target {
    fn from(nodes: Vec<Option<NodeId>>) -> Self {
        Self::Sequence(nodes.into_iter().map(Self::from).collect())
    }
}

impl From<Vec<Target>> for Target {
    fn from(targets: Vec<Target>) -> Self {
        Self::Sequence(targets)
    }
}

/// A side effect applied outside the normal event pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Augmentation {
    /// Installed as the target's `files` before delivery.
    FileList(FileList),
    /// Added to the target's scroll offset after delivery.
    ElementScroll { delta_x: f64, delta_y: f64 },
}

impl Augmentation {
    fn before_delivery(&self) -> bool {
        match self {
            Self::FileList(_) => true,
            Self::ElementScroll { .. } => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticEvent {
    pub event: Event,
    pub augmentations: Vec<Augmentation>,
}

/// Dispatches one `kind` event on each element of `target`, in order.
///
/// A top-level null or non-element target fails with
/// [`Error::InvalidTarget`] before the kind is looked at. Inside a sequence
/// each entry is checked right before its own delivery, so entries that came
/// earlier have already been delivered when a bad one aborts the walk.
pub fn dispatch<H>(host: &mut H, target: impl Into<Target>, kind: &str, options: &Value) -> Result<()>
where
    H: Host + ?Sized,
{
    let target = target.into();
    if !matches!(target, Target::Sequence(_)) {
        resolve_element(host, &target, &[])?;
    }
    let kind: EventKind = kind.parse()?;
    let options = OptionBag::new(options);
    fan_out(host, &target, kind, &options, &mut Vec::new())
}

fn fan_out<H>(
    host: &mut H,
    target: &Target,
    kind: EventKind,
    options: &OptionBag<'_>,
    path: &mut Vec<usize>,
) -> Result<()>
where
    H: Host + ?Sized,
{
    let Target::Sequence(items) = target else {
        let node = resolve_element(host, target, path)?;
        return deliver_to(host, node, kind, options);
    };

    for (index, item) in items.iter().enumerate() {
        path.push(index);
        stacker::maybe_grow(32 * 1024, 1024 * 1024, || {
            fan_out(host, item, kind, options, path)
        })?;
        path.pop();
    }
    Ok(())
}

fn resolve_element<H>(host: &H, target: &Target, path: &[usize]) -> Result<NodeId>
where
    H: Host + ?Sized,
{
    let at = describe_path(path);
    match target {
        Target::Node(node) if host.is_element(*node) => Ok(*node),
        Target::Node(node) => Err(Error::InvalidTarget(format!(
            "{at} ({}) is not an element",
            host.describe(*node)
        ))),
        Target::Null => Err(Error::InvalidTarget(format!("{at} is null"))),
        Target::Sequence(_) => Err(Error::InvalidTarget(format!("{at} is a sequence"))),
    }
}

fn describe_path(path: &[usize]) -> String {
    let mut out = String::from("target");
    for index in path {
        out.push_str(&format!("[{index}]"));
    }
    out
}

/// Delivers one event to an element the caller already holds.
///
/// This is the single-target path under [`dispatch`]; it does no sequence
/// handling.
pub fn deliver_to<H>(host: &mut H, node: NodeId, kind: EventKind, options: &OptionBag<'_>) -> Result<()>
where
    H: Host + ?Sized,
{
    if !host.is_element(node) {
        return Err(Error::InvalidTarget(format!(
            "{} is not an element",
            host.describe(node)
        )));
    }

    if kind.family() == EventFamily::Touch && !host.supports_touch() {
        let line = format!(
            "[touch] skipped {kind} target={} reason=unsupported",
            host.describe(node)
        );
        host.warn(line);
        return Ok(());
    }

    let SyntheticEvent {
        mut event,
        augmentations,
    } = construct(&host.environment(), node, kind, options);

    tracing::debug!(
        target: "dom_simulate::dispatch",
        kind = %kind,
        node = node.index(),
        augmentations = augmentations.len(),
        "dispatching synthetic event"
    );
    let line = format!(
        "[dispatch] {kind} target={} bubbles={} cancelable={} augmentations={}",
        host.describe(node),
        event.bubbles(),
        event.cancelable(),
        augmentations.len()
    );
    host.trace(line);

    for augmentation in augmentations.iter().filter(|a| a.before_delivery()) {
        apply_augmentation(host, node, augmentation)?;
    }
    host.deliver(&mut event)?;
    for augmentation in augmentations.iter().filter(|a| !a.before_delivery()) {
        apply_augmentation(host, node, augmentation)?;
    }
    Ok(())
}

/// Builds the event for `kind` on `node`. Fields the bag leaves out fall
/// back to per-kind defaults and, for pointer coordinates, to `environment`.
pub fn construct(
    environment: &EnvironmentDefaults,
    node: NodeId,
    kind: EventKind,
    options: &OptionBag<'_>,
) -> SyntheticEvent {
    let init = match kind.family() {
        EventFamily::Mouse => EventInit::Mouse(mouse_init(kind, options, environment)),
        EventFamily::Touch => EventInit::Touch(touch_init(options)),
        EventFamily::Keyboard => EventInit::Keyboard(keyboard_init(kind, options)),
        EventFamily::Wheel => EventInit::Wheel(wheel_init(kind, options, environment)),
        EventFamily::Form => EventInit::Ui(UiEventInit {
            detail: options.integer("detail").unwrap_or(0),
        }),
    };

    let bubbles = options.flag("bubbles").unwrap_or(kind.default_bubbles());
    let cancelable = options
        .flag("cancelable")
        .unwrap_or(kind.default_cancelable());

    SyntheticEvent {
        event: Event::new(kind, node, init).with_flags(bubbles, cancelable),
        augmentations: augmentations_for(kind, options),
    }
}

fn augmentations_for(kind: EventKind, options: &OptionBag<'_>) -> Vec<Augmentation> {
    match kind {
        EventKind::Wheel if options.flag("elementScroll") == Some(true) => {
            vec![Augmentation::ElementScroll {
                delta_x: options.number("deltaX").unwrap_or(0.0),
                delta_y: options.number("deltaY").unwrap_or(0.0),
            }]
        }
        EventKind::Change => options
            .path(&["data", "target", "files"])
            .and_then(Value::as_array)
            .map(|files| vec![Augmentation::FileList(FileList::from_descriptors(files))])
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn apply_augmentation<H>(host: &mut H, node: NodeId, augmentation: &Augmentation) -> Result<()>
where
    H: Host + ?Sized,
{
    match augmentation {
        Augmentation::FileList(files) => {
            let line = format!(
                "[files] target={} count={}",
                host.describe(node),
                files.len()
            );
            host.force_files(node, files.clone())?;
            host.trace(line);
        }
        Augmentation::ElementScroll { delta_x, delta_y } => {
            let before = host.scroll_offset(node)?;
            let geometry = host.scroll_geometry(node)?;
            let after = geometry.clamp(ScrollOffset {
                top: before.top + delta_y,
                left: before.left + delta_x,
            });
            host.set_scroll_offset(node, after)?;
            let line = format!(
                "[scroll] target={} top={}->{} left={}->{}",
                host.describe(node),
                before.top,
                after.top,
                before.left,
                after.left
            );
            host.trace(line);
        }
    }
    Ok(())
}

fn modifiers(options: &OptionBag<'_>) -> Modifiers {
    Modifiers {
        ctrl: options.flag("ctrlKey").unwrap_or(false),
        alt: options.flag("altKey").unwrap_or(false),
        shift: options.flag("shiftKey").unwrap_or(false),
        meta: options.flag("metaKey").unwrap_or(false),
    }
}

fn mouse_init(
    kind: EventKind,
    options: &OptionBag<'_>,
    environment: &EnvironmentDefaults,
) -> MouseEventInit {
    let buttons = options
        .integer("buttons")
        .and_then(|value| u16::try_from(value).ok())
        .unwrap_or(environment.buttons);
    MouseEventInit {
        screen_x: options.number("screenX").unwrap_or(environment.screen_x),
        screen_y: options.number("screenY").unwrap_or(environment.screen_y),
        client_x: options.number("clientX").unwrap_or(environment.client_x),
        client_y: options.number("clientY").unwrap_or(environment.client_y),
        button: options
            .integer("button")
            .and_then(|value| i16::try_from(value).ok())
            .unwrap_or(environment.button),
        buttons,
        detail: options.integer("detail").unwrap_or(kind.default_detail()),
        modifiers: modifiers(options),
        pointer: kind.is_pointer().then(|| PointerFields {
            pointer_id: options.integer("pointerId").unwrap_or(1),
            pointer_type: options.text("pointerType").unwrap_or("mouse").to_string(),
            is_primary: options.flag("isPrimary").unwrap_or(true),
            width: options.number("width").unwrap_or(1.0),
            height: options.number("height").unwrap_or(1.0),
            pressure: options
                .number("pressure")
                .unwrap_or(if buttons == 0 { 0.0 } else { 0.5 }),
        }),
    }
}

fn touch_list(options: &OptionBag<'_>, name: &str) -> Vec<Touch> {
    let Some(items) = options.array(name) else {
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.is_object())
        .map(|(index, item)| {
            let point = OptionBag::new(item);
            let client_x = point.number("clientX").unwrap_or(0.0);
            let client_y = point.number("clientY").unwrap_or(0.0);
            Touch {
                identifier: point.integer("identifier").unwrap_or(index as i64),
                screen_x: point.number("screenX").unwrap_or(client_x),
                screen_y: point.number("screenY").unwrap_or(client_y),
                client_x,
                client_y,
                page_x: point.number("pageX").unwrap_or(client_x),
                page_y: point.number("pageY").unwrap_or(client_y),
            }
        })
        .collect()
}

fn touch_init(options: &OptionBag<'_>) -> TouchEventInit {
    TouchEventInit {
        touches: touch_list(options, "touches"),
        target_touches: touch_list(options, "targetTouches"),
        changed_touches: touch_list(options, "changedTouches"),
        scale: options.number("scale").unwrap_or(1.0),
        rotation: options.number("rotation").unwrap_or(0.0),
        detail: options.integer("detail").unwrap_or(0),
        modifiers: modifiers(options),
    }
}

fn keyboard_init(kind: EventKind, options: &OptionBag<'_>) -> KeyboardEventInit {
    let key = options.text("key").unwrap_or_default();
    let single = {
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Some(ch),
            _ => None,
        }
    };
    let code_field = |name: &str| {
        options
            .integer(name)
            .and_then(|value| u32::try_from(value).ok())
    };

    let key_code = code_field("keyCode").unwrap_or_else(|| {
        single
            .filter(char::is_ascii_alphanumeric)
            .map(|ch| ch.to_ascii_uppercase() as u32)
            .unwrap_or(0)
    });
    let char_code = code_field("charCode").unwrap_or_else(|| match kind {
        EventKind::KeyPress => single.map(|ch| ch as u32).unwrap_or(key_code),
        _ => 0,
    });
    let which = code_field("which").unwrap_or(match kind {
        EventKind::KeyPress => char_code,
        _ => key_code,
    });

    KeyboardEventInit {
        key: key.to_string(),
        code: options.text("code").unwrap_or_default().to_string(),
        key_code,
        char_code,
        which,
        location: code_field("location").unwrap_or(0),
        repeat: options.flag("repeat").unwrap_or(false),
        modifiers: modifiers(options),
    }
}

fn wheel_init(
    kind: EventKind,
    options: &OptionBag<'_>,
    environment: &EnvironmentDefaults,
) -> WheelEventInit {
    WheelEventInit {
        mouse: mouse_init(kind, options, environment),
        delta_x: options.number("deltaX").unwrap_or(0.0),
        delta_y: options.number("deltaY").unwrap_or(0.0),
        delta_z: options.number("deltaZ").unwrap_or(0.0),
        delta_mode: options
            .integer("deltaMode")
            .and_then(|value| u32::try_from(value).ok())
            .unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(kind: EventKind, options: &Value) -> SyntheticEvent {
        construct(
            &EnvironmentDefaults {
                screen_x: 5.0,
                screen_y: 6.0,
                client_x: 7.0,
                client_y: 8.0,
                button: 0,
                buttons: 0,
            },
            NodeId(1),
            kind,
            &OptionBag::new(options),
        )
    }

    #[test]
    fn mouse_fields_fall_back_to_environment() {
        let built = build(EventKind::Click, &json!({ "clientX": 40, "ctrlKey": true }));
        let mouse = built.event.mouse().expect("mouse init");
        assert_eq!(mouse.client_x, 40.0);
        assert_eq!(mouse.client_y, 8.0);
        assert_eq!(mouse.screen_x, 5.0);
        assert_eq!(mouse.detail, 1);
        assert!(mouse.modifiers.ctrl);
        assert!(mouse.pointer.is_none());
        assert!(built.event.bubbles());
        assert!(built.event.cancelable());
        assert!(built.augmentations.is_empty());
    }

    #[test]
    fn dblclick_detail_and_flag_overrides() {
        let built = build(
            EventKind::DblClick,
            &json!({ "bubbles": false, "cancelable": false, "button": 2 }),
        );
        assert_eq!(built.event.detail(), 2);
        assert_eq!(built.event.button(), Some(2));
        assert!(!built.event.bubbles());
        assert!(!built.event.cancelable());
    }

    #[test]
    fn pointer_kinds_carry_pointer_fields() {
        let built = build(
            EventKind::PointerDown,
            &json!({ "pointerType": "pen", "buttons": 1 }),
        );
        let pointer = built.event.pointer().expect("pointer fields");
        assert_eq!(pointer.pointer_type, "pen");
        assert_eq!(pointer.pointer_id, 1);
        assert!(pointer.is_primary);
        assert_eq!(pointer.pressure, 0.5);
    }

    #[test]
    fn keyboard_key_is_carried_verbatim() {
        let built = build(EventKind::KeyUp, &json!({ "key": "a" }));
        let keyboard = built.event.keyboard().expect("keyboard init");
        assert_eq!(keyboard.key, "a");
        assert_eq!(keyboard.key_code, 65);
        assert_eq!(keyboard.char_code, 0);
        assert_eq!(keyboard.which, 65);

        let built = build(EventKind::KeyDown, &json!({ "key": "Enter", "code": "Enter" }));
        assert_eq!(built.event.key(), Some("Enter"));
        assert_eq!(built.event.code(), Some("Enter"));
        assert_eq!(built.event.key_code(), Some(0));
    }

    #[test]
    fn keypress_char_code_defaults() {
        let built = build(EventKind::KeyPress, &json!({ "key": "a" }));
        assert_eq!(built.event.char_code(), Some('a' as u32));
        assert_eq!(built.event.keyboard().map(|k| k.which), Some('a' as u32));

        let built = build(EventKind::KeyPress, &json!({ "keyCode": 13 }));
        assert_eq!(built.event.key(), Some(""));
        assert_eq!(built.event.char_code(), Some(13));

        let built = build(
            EventKind::KeyDown,
            &json!({ "key": "a", "keyCode": 10, "charCode": 11, "which": 12 }),
        );
        let keyboard = built.event.keyboard().expect("keyboard init");
        assert_eq!((keyboard.key_code, keyboard.char_code, keyboard.which), (10, 11, 12));
    }

    #[test]
    fn touch_lists_are_read_from_the_bag() {
        let built = build(
            EventKind::TouchStart,
            &json!({
                "touches": [{ "clientX": 10, "clientY": 20 }, "junk", { "identifier": 9 }],
                "scale": 2.0
            }),
        );
        let touch = built.event.touch().expect("touch init");
        assert_eq!(touch.touches.len(), 2);
        assert_eq!(touch.touches[0].identifier, 0);
        assert_eq!(touch.touches[0].page_x, 10.0);
        assert_eq!(touch.touches[1].identifier, 9);
        assert!(touch.changed_touches.is_empty());
        assert_eq!(touch.scale, 2.0);
        assert!(built.event.cancelable());
        assert!(!build(EventKind::TouchCancel, &json!({})).event.cancelable());
    }

    #[test]
    fn wheel_scroll_augmentation_only_when_flag_is_true() {
        let plain = build(EventKind::Wheel, &json!({ "deltaX": 0, "deltaY": 200 }));
        assert_eq!(plain.event.delta_y(), Some(200.0));
        assert!(plain.augmentations.is_empty());

        let truthy = build(
            EventKind::Wheel,
            &json!({ "deltaY": 200, "elementScroll": 1 }),
        );
        assert!(truthy.augmentations.is_empty());

        let scrolled = build(
            EventKind::Wheel,
            &json!({ "deltaX": 3, "deltaY": 200, "elementScroll": true }),
        );
        assert_eq!(
            scrolled.augmentations,
            vec![Augmentation::ElementScroll {
                delta_x: 3.0,
                delta_y: 200.0
            }]
        );
        assert_eq!(scrolled.event.client_x(), Some(7.0));
    }

    #[test]
    fn change_files_augmentation() {
        let built = build(
            EventKind::Change,
            &json!({ "data": { "target": { "files": [{ "file": "a.png" }, { "file": "b.jpg" }] } } }),
        );
        match built.augmentations.as_slice() {
            [Augmentation::FileList(files)] => assert_eq!(files.names(), vec!["a.png", "b.jpg"]),
            other => panic!("unexpected augmentations: {other:?}"),
        }

        let empty = build(EventKind::Change, &json!({ "data": { "target": { "files": [] } } }));
        assert!(matches!(
            empty.augmentations.as_slice(),
            [Augmentation::FileList(files)] if files.is_empty()
        ));

        let not_array = build(
            EventKind::Change,
            &json!({ "data": { "target": { "files": "a.png" } } }),
        );
        assert!(not_array.augmentations.is_empty());

        let input = build(
            EventKind::Input,
            &json!({ "data": { "target": { "files": [{ "file": "a.png" }] } } }),
        );
        assert!(input.augmentations.is_empty());
    }

    #[test]
    fn form_events_use_ui_init() {
        let built = build(EventKind::Submit, &json!({ "detail": 4 }));
        assert_eq!(built.event.init(), &EventInit::Ui(UiEventInit { detail: 4 }));
        assert!(built.event.cancelable());
        assert!(!build(EventKind::Blur, &json!(null)).event.bubbles());
    }

    #[test]
    fn target_conversions() {
        let a = NodeId(1);
        let b = NodeId(2);
        assert_eq!(Target::from(a), Target::Node(a));
        assert_eq!(Target::from(None::<NodeId>), Target::Null);
        assert_eq!(
            Target::from([a, b]),
            Target::Sequence(vec![Target::Node(a), Target::Node(b)])
        );
        assert_eq!(
            Target::from(vec![Some(a), None]),
            Target::Sequence(vec![Target::Node(a), Target::Null])
        );
        assert_eq!(describe_path(&[1, 0]), "target[1][0]");
    }
}
