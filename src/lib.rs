//! Deterministic synthetic DOM event dispatch for tests.
//!
//! [`dispatch`] builds a platform-shaped event (mouse, pointer, touch,
//! keyboard, wheel or a generic form event) from a loose JSON option bag and
//! delivers it synchronously to one element or to each element of a target
//! sequence. [`set_form_control_value`] and [`set_editable_content`] simulate
//! typing by changing state and then firing `input`.
//!
//! The environment is reached through the [`Host`] trait. [`Page`] is the
//! in-memory host: an HTML fixture, a small selector engine, listener
//! registration and a bounded trace log.
//!
//! ```
//! use dom_simulate::{dispatch, Page, Result};
//! use serde_json::json;
//!
//! fn main() -> Result<()> {
//!     let mut page = Page::from_html(r#"<button id="go">Go</button>"#)?;
//!     let button = page.select_one("#go")?;
//!     page.set_event_handler(button, "click", |page, event| {
//!         let target = event.target();
//!         page.set_attr(target, "data-clicked", "yes")
//!     })?;
//!
//!     dispatch(&mut page, button, "click", &json!({ "clientX": 10 }))?;
//!     assert_eq!(page.attr(button, "data-clicked").as_deref(), Some("yes"));
//!     Ok(())
//! }
//! ```

mod config;
mod dispatcher;
mod dom;
mod error;
mod event;
mod files;
mod form_input;
mod host;
mod html;
mod listeners;
mod options;
mod page;
mod selector;
mod trace;

pub use config::{DEFAULT_TRACE_LOG_LIMIT, EnvironmentDefaults, PageConfig, TraceConfig};
pub use dispatcher::{Augmentation, SyntheticEvent, Target, construct, deliver_to, dispatch};
pub use dom::NodeId;
pub use error::{Error, Result};
pub use event::{
    Event, EventFamily, EventInit, EventKind, EventPhase, KeyboardEventInit, Modifiers,
    MouseEventInit, PointerFields, Touch, TouchEventInit, UiEventInit, WheelEventInit,
};
pub use files::{FileList, SyntheticFile};
pub use form_input::{set_editable_content, set_form_control_value};
pub use host::{Host, ScrollGeometry, ScrollOffset};
pub use listeners::{Handler, ListenerId};
pub use options::OptionBag;
pub use page::Page;
