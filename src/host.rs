//! The capability surface the dispatcher needs from its environment.
//!
//! The dispatcher never reaches for a global document. Everything it touches
//! (element checks, the event pipeline, scroll offsets, value slots) goes
//! through a [`Host`], so a deterministic in-memory host such as
//! [`Page`](crate::Page) can stand in for a browser.

use crate::config::EnvironmentDefaults;
use crate::dom::NodeId;
use crate::error::Result;
use crate::event::Event;
use crate::files::FileList;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollOffset {
    pub top: f64,
    pub left: f64,
}

/// Viewport and content size of a scroll container.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollGeometry {
    pub client_width: f64,
    pub client_height: f64,
    pub scroll_width: f64,
    pub scroll_height: f64,
}

impl ScrollGeometry {
    pub fn new(client_width: f64, client_height: f64, scroll_width: f64, scroll_height: f64) -> Self {
        Self {
            client_width,
            client_height,
            scroll_width,
            scroll_height,
        }
    }

    pub fn max_offset(&self) -> ScrollOffset {
        ScrollOffset {
            top: (self.scroll_height - self.client_height).max(0.0),
            left: (self.scroll_width - self.client_width).max(0.0),
        }
    }

    pub fn clamp(&self, offset: ScrollOffset) -> ScrollOffset {
        let max = self.max_offset();
        ScrollOffset {
            top: offset.top.clamp(0.0, max.top),
            left: offset.left.clamp(0.0, max.left),
        }
    }
}

pub trait Host {
    fn is_element(&self, node: NodeId) -> bool;

    /// Short label for logs and error messages, e.g. `#mocha` or `div`.
    fn describe(&self, node: NodeId) -> String;

    fn environment(&self) -> EnvironmentDefaults;

    /// Whether `node` is editable through `contenteditable` on itself or an
    /// ancestor.
    fn is_content_editable(&self, node: NodeId) -> bool;

    /// Some hosts cannot deliver synthetic touch events.
    fn supports_touch(&self) -> bool {
        true
    }

    /// Runs `event` through capture, target and bubble phases on
    /// `event.target()`. Every handler has returned when this does.
    fn deliver(&mut self, event: &mut Event) -> Result<()>;

    fn scroll_offset(&self, node: NodeId) -> Result<ScrollOffset>;

    fn scroll_geometry(&self, node: NodeId) -> Result<ScrollGeometry>;

    fn set_scroll_offset(&mut self, node: NodeId, offset: ScrollOffset) -> Result<()>;

    /// Installs `files` on `node` regardless of the element kind.
    fn force_files(&mut self, node: NodeId, files: FileList) -> Result<()>;

    fn set_value(&mut self, node: NodeId, value: &str) -> Result<()>;

    fn set_inner_html(&mut self, node: NodeId, html: &str) -> Result<()>;

    fn trace(&mut self, line: String) {
        tracing::debug!(target: "dom_simulate", "{line}");
    }

    fn warn(&mut self, line: String) {
        tracing::warn!(target: "dom_simulate", "{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_offset_never_negative() {
        let geometry = ScrollGeometry::new(100.0, 200.0, 50.0, 120.0);
        assert_eq!(geometry.max_offset(), ScrollOffset { top: 0.0, left: 0.0 });
    }

    #[test]
    fn clamp_keeps_offsets_in_range() {
        let geometry = ScrollGeometry::new(100.0, 200.0, 300.0, 400.0);
        let clamped = geometry.clamp(ScrollOffset {
            top: 450.0,
            left: -10.0,
        });
        assert_eq!(clamped, ScrollOffset { top: 200.0, left: 0.0 });
    }
}
