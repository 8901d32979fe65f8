use std::fmt;
use std::str::FromStr;

use crate::dom::NodeId;
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFamily {
    Mouse,
    Touch,
    Keyboard,
    Wheel,
    Form,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    DblClick,
    MouseDown,
    MouseUp,
    MouseMove,
    MouseOver,
    MouseOut,
    MouseEnter,
    MouseLeave,
    ContextMenu,
    PointerDown,
    PointerUp,
    PointerMove,
    PointerOver,
    PointerOut,
    PointerEnter,
    PointerLeave,
    PointerCancel,
    TouchStart,
    TouchMove,
    TouchEnd,
    TouchCancel,
    KeyDown,
    KeyUp,
    KeyPress,
    Wheel,
    Change,
    Input,
    Focus,
    Blur,
    FocusIn,
    FocusOut,
    Select,
    Submit,
    Reset,
    Scroll,
    Resize,
}

impl EventKind {
    pub const ALL: [EventKind; 37] = [
        Self::Click,
        Self::DblClick,
        Self::MouseDown,
        Self::MouseUp,
        Self::MouseMove,
        Self::MouseOver,
        Self::MouseOut,
        Self::MouseEnter,
        Self::MouseLeave,
        Self::ContextMenu,
        Self::PointerDown,
        Self::PointerUp,
        Self::PointerMove,
        Self::PointerOver,
        Self::PointerOut,
        Self::PointerEnter,
        Self::PointerLeave,
        Self::PointerCancel,
        Self::TouchStart,
        Self::TouchMove,
        Self::TouchEnd,
        Self::TouchCancel,
        Self::KeyDown,
        Self::KeyUp,
        Self::KeyPress,
        Self::Wheel,
        Self::Change,
        Self::Input,
        Self::Focus,
        Self::Blur,
        Self::FocusIn,
        Self::FocusOut,
        Self::Select,
        Self::Submit,
        Self::Reset,
        Self::Scroll,
        Self::Resize,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::DblClick => "dblclick",
            Self::MouseDown => "mousedown",
            Self::MouseUp => "mouseup",
            Self::MouseMove => "mousemove",
            Self::MouseOver => "mouseover",
            Self::MouseOut => "mouseout",
            Self::MouseEnter => "mouseenter",
            Self::MouseLeave => "mouseleave",
            Self::ContextMenu => "contextmenu",
            Self::PointerDown => "pointerdown",
            Self::PointerUp => "pointerup",
            Self::PointerMove => "pointermove",
            Self::PointerOver => "pointerover",
            Self::PointerOut => "pointerout",
            Self::PointerEnter => "pointerenter",
            Self::PointerLeave => "pointerleave",
            Self::PointerCancel => "pointercancel",
            Self::TouchStart => "touchstart",
            Self::TouchMove => "touchmove",
            Self::TouchEnd => "touchend",
            Self::TouchCancel => "touchcancel",
            Self::KeyDown => "keydown",
            Self::KeyUp => "keyup",
            Self::KeyPress => "keypress",
            Self::Wheel => "wheel",
            Self::Change => "change",
            Self::Input => "input",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::FocusIn => "focusin",
            Self::FocusOut => "focusout",
            Self::Select => "select",
            Self::Submit => "submit",
            Self::Reset => "reset",
            Self::Scroll => "scroll",
            Self::Resize => "resize",
        }
    }

    pub fn family(self) -> EventFamily {
        match self {
            Self::Click
            | Self::DblClick
            | Self::MouseDown
            | Self::MouseUp
            | Self::MouseMove
            | Self::MouseOver
            | Self::MouseOut
            | Self::MouseEnter
            | Self::MouseLeave
            | Self::ContextMenu
            | Self::PointerDown
            | Self::PointerUp
            | Self::PointerMove
            | Self::PointerOver
            | Self::PointerOut
            | Self::PointerEnter
            | Self::PointerLeave
            | Self::PointerCancel => EventFamily::Mouse,
            Self::TouchStart | Self::TouchMove | Self::TouchEnd | Self::TouchCancel => {
                EventFamily::Touch
            }
            Self::KeyDown | Self::KeyUp | Self::KeyPress => EventFamily::Keyboard,
            Self::Wheel => EventFamily::Wheel,
            Self::Change
            | Self::Input
            | Self::Focus
            | Self::Blur
            | Self::FocusIn
            | Self::FocusOut
            | Self::Select
            | Self::Submit
            | Self::Reset
            | Self::Scroll
            | Self::Resize => EventFamily::Form,
        }
    }

    pub fn is_pointer(self) -> bool {
        matches!(
            self,
            Self::PointerDown
                | Self::PointerUp
                | Self::PointerMove
                | Self::PointerOver
                | Self::PointerOut
                | Self::PointerEnter
                | Self::PointerLeave
                | Self::PointerCancel
        )
    }

    pub fn default_bubbles(self) -> bool {
        !matches!(
            self,
            Self::MouseEnter
                | Self::MouseLeave
                | Self::PointerEnter
                | Self::PointerLeave
                | Self::Focus
                | Self::Blur
                | Self::Scroll
                | Self::Resize
        )
    }

    pub fn default_cancelable(self) -> bool {
        match self.family() {
            EventFamily::Mouse => !matches!(
                self,
                Self::MouseEnter
                    | Self::MouseLeave
                    | Self::PointerEnter
                    | Self::PointerLeave
                    | Self::PointerCancel
            ),
            EventFamily::Touch => self != Self::TouchCancel,
            EventFamily::Keyboard | EventFamily::Wheel => true,
            EventFamily::Form => matches!(self, Self::Submit | Self::Reset),
        }
    }

    /// `detail` for mouse events is the click count.
    pub fn default_detail(self) -> i64 {
        match self {
            Self::Click => 1,
            Self::DblClick => 2,
            _ => 0,
        }
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == src)
            .ok_or_else(|| Error::UnsupportedEventKind(src.to_string()))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointerFields {
    pub pointer_id: i64,
    pub pointer_type: String,
    pub is_primary: bool,
    pub width: f64,
    pub height: f64,
    pub pressure: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MouseEventInit {
    pub screen_x: f64,
    pub screen_y: f64,
    pub client_x: f64,
    pub client_y: f64,
    pub button: i16,
    pub buttons: u16,
    pub detail: i64,
    pub modifiers: Modifiers,
    pub pointer: Option<PointerFields>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Touch {
    pub identifier: i64,
    pub screen_x: f64,
    pub screen_y: f64,
    pub client_x: f64,
    pub client_y: f64,
    pub page_x: f64,
    pub page_y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TouchEventInit {
    pub touches: Vec<Touch>,
    pub target_touches: Vec<Touch>,
    pub changed_touches: Vec<Touch>,
    pub scale: f64,
    pub rotation: f64,
    pub detail: i64,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyboardEventInit {
    pub key: String,
    pub code: String,
    pub key_code: u32,
    pub char_code: u32,
    pub which: u32,
    pub location: u32,
    pub repeat: bool,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WheelEventInit {
    pub mouse: MouseEventInit,
    pub delta_x: f64,
    pub delta_y: f64,
    pub delta_z: f64,
    pub delta_mode: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiEventInit {
    pub detail: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventInit {
    Mouse(MouseEventInit),
    Touch(TouchEventInit),
    Keyboard(KeyboardEventInit),
    Wheel(WheelEventInit),
    Ui(UiEventInit),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    None,
    Capturing,
    AtTarget,
    Bubbling,
}

impl EventPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Capturing => "capture",
            Self::AtTarget => "target",
            Self::Bubbling => "bubble",
        }
    }
}

/// A constructed synthetic event.
///
/// Handlers get `&mut Event` and read the caller's fields through the same
/// accessors a native event exposes (`key()`, `delta_y()`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    kind: EventKind,
    target: NodeId,
    current_target: NodeId,
    phase: EventPhase,
    bubbles: bool,
    cancelable: bool,
    default_prevented: bool,
    propagation_stopped: bool,
    immediate_propagation_stopped: bool,
    init: EventInit,
}

impl Event {
    pub fn new(kind: EventKind, target: NodeId, init: EventInit) -> Self {
        Self {
            kind,
            target,
            current_target: target,
            phase: EventPhase::None,
            bubbles: kind.default_bubbles(),
            cancelable: kind.default_cancelable(),
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
            init,
        }
    }

    pub fn with_flags(mut self, bubbles: bool, cancelable: bool) -> Self {
        self.bubbles = bubbles;
        self.cancelable = cancelable;
        self
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn event_type(&self) -> &'static str {
        self.kind.as_str()
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn current_target(&self) -> NodeId {
        self.current_target
    }

    pub fn phase(&self) -> EventPhase {
        self.phase
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn cancelable(&self) -> bool {
        self.cancelable
    }

    /// Always false: nothing here came from a real input device.
    pub fn is_trusted(&self) -> bool {
        false
    }

    pub fn init(&self) -> &EventInit {
        &self.init
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped
    }

    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }

    pub(crate) fn enter(&mut self, node: NodeId, phase: EventPhase) {
        self.current_target = node;
        self.phase = phase;
    }

    pub(crate) fn finish(&mut self) {
        self.current_target = self.target;
        self.phase = EventPhase::None;
    }

    pub fn mouse(&self) -> Option<&MouseEventInit> {
        match &self.init {
            EventInit::Mouse(mouse) => Some(mouse),
            EventInit::Wheel(wheel) => Some(&wheel.mouse),
            _ => None,
        }
    }

    pub fn pointer(&self) -> Option<&PointerFields> {
        self.mouse().and_then(|mouse| mouse.pointer.as_ref())
    }

    pub fn touch(&self) -> Option<&TouchEventInit> {
        match &self.init {
            EventInit::Touch(touch) => Some(touch),
            _ => None,
        }
    }

    pub fn keyboard(&self) -> Option<&KeyboardEventInit> {
        match &self.init {
            EventInit::Keyboard(keyboard) => Some(keyboard),
            _ => None,
        }
    }

    pub fn wheel(&self) -> Option<&WheelEventInit> {
        match &self.init {
            EventInit::Wheel(wheel) => Some(wheel),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.keyboard().map(|keyboard| keyboard.key.as_str())
    }

    pub fn code(&self) -> Option<&str> {
        self.keyboard().map(|keyboard| keyboard.code.as_str())
    }

    pub fn key_code(&self) -> Option<u32> {
        self.keyboard().map(|keyboard| keyboard.key_code)
    }

    pub fn char_code(&self) -> Option<u32> {
        self.keyboard().map(|keyboard| keyboard.char_code)
    }

    pub fn delta_x(&self) -> Option<f64> {
        self.wheel().map(|wheel| wheel.delta_x)
    }

    pub fn delta_y(&self) -> Option<f64> {
        self.wheel().map(|wheel| wheel.delta_y)
    }

    pub fn client_x(&self) -> Option<f64> {
        self.mouse().map(|mouse| mouse.client_x)
    }

    pub fn client_y(&self) -> Option<f64> {
        self.mouse().map(|mouse| mouse.client_y)
    }

    pub fn button(&self) -> Option<i16> {
        self.mouse().map(|mouse| mouse.button)
    }

    pub fn modifiers(&self) -> Modifiers {
        match &self.init {
            EventInit::Mouse(mouse) => mouse.modifiers,
            EventInit::Wheel(wheel) => wheel.mouse.modifiers,
            EventInit::Touch(touch) => touch.modifiers,
            EventInit::Keyboard(keyboard) => keyboard.modifiers,
            EventInit::Ui(_) => Modifiers::default(),
        }
    }

    pub fn detail(&self) -> i64 {
        match &self.init {
            EventInit::Mouse(mouse) => mouse.detail,
            EventInit::Wheel(wheel) => wheel.mouse.detail,
            EventInit::Touch(touch) => touch.detail,
            EventInit::Keyboard(_) => 0,
            EventInit::Ui(ui) => ui.detail,
        }
    }
}
