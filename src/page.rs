use std::collections::BTreeMap;
use std::rc::Rc;

use crate::config::{EnvironmentDefaults, PageConfig};
use crate::dom::{Dom, NodeId};
use crate::error::{Error, Result};
use crate::event::{Event, EventPhase};
use crate::files::FileList;
use crate::host::{Host, ScrollGeometry, ScrollOffset};
use crate::html::parse_html;
use crate::listeners::{Handler, ListenerId, ListenerStore};
use crate::selector::Selector;
use crate::trace::TraceState;

/// A deterministic in-memory document that implements [`Host`].
///
/// Handlers registered here receive `&mut Page`, so they can inspect or
/// mutate the document and dispatch further events while running.
pub struct Page {
    dom: Dom,
    listeners: ListenerStore,
    environment: EnvironmentDefaults,
    touch_supported: bool,
    trace: TraceState,
}

impl Page {
    pub fn new() -> Self {
        Self::with_config(PageConfig::default())
    }

    pub fn with_config(config: PageConfig) -> Self {
        Self {
            dom: Dom::new(),
            listeners: ListenerStore::default(),
            environment: config.environment,
            touch_supported: config.touch_supported,
            trace: TraceState::new(&config.trace),
        }
    }

    pub fn from_html(html: &str) -> Result<Self> {
        Self::from_html_with_config(html, PageConfig::default())
    }

    pub fn from_html_with_config(html: &str, config: PageConfig) -> Result<Self> {
        config.validate()?;
        let mut page = Self::with_config(config);
        page.dom = parse_html(html)?;
        Ok(page)
    }

    pub fn document(&self) -> NodeId {
        self.dom.root
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace.set_enabled(enabled);
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace.set_events(enabled);
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        self.trace.set_limit(max_entries)
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.trace.take()
    }

    pub fn set_environment_defaults(&mut self, environment: EnvironmentDefaults) {
        self.environment = environment;
    }

    pub fn set_touch_supported(&mut self, supported: bool) {
        self.touch_supported = supported;
    }

    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.dom.create_element(None, tag_name, BTreeMap::new())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.dom.append_child(parent, child)
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.dom.by_id(id)
    }

    pub fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.select_all(selector)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    pub fn select_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let parsed = Selector::parse(selector)?;
        Ok(self
            .dom
            .descendant_elements(self.dom.root)
            .into_iter()
            .filter(|node| parsed.matches(&self.dom, *node))
            .collect())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.dom.parent(node)
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.dom.tag_name(node)
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.dom.attr(node, name)
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.dom.set_attr(node, name, value)
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> Result<()> {
        self.dom.remove_attr(node, name)
    }

    pub fn is_content_editable(&self, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            match self.dom.attr(current, "contenteditable").as_deref() {
                Some("false") => return false,
                Some(_) => return true,
                None => cursor = self.dom.parent(current),
            }
        }
        false
    }

    pub fn value(&self, node: NodeId) -> Result<String> {
        self.dom.value(node)
    }

    pub fn text_content(&self, node: NodeId) -> String {
        self.dom.text_content(node)
    }

    pub fn inner_html(&self, node: NodeId) -> Result<String> {
        self.dom.inner_html(node)
    }

    pub fn files(&self, node: NodeId) -> Result<Option<FileList>> {
        self.dom.files(node)
    }

    pub fn scroll_top(&self, node: NodeId) -> Result<f64> {
        Ok(self.dom.scroll_offset(node)?.top)
    }

    pub fn scroll_left(&self, node: NodeId) -> Result<f64> {
        Ok(self.dom.scroll_offset(node)?.left)
    }

    /// Layout is not computed here; scroll containers get their viewport and
    /// content size from the caller.
    pub fn set_scroll_geometry(&mut self, node: NodeId, geometry: ScrollGeometry) -> Result<()> {
        self.dom.set_scroll_geometry(node, geometry)
    }

    pub fn add_event_listener<F>(
        &mut self,
        node: NodeId,
        event: &str,
        capture: bool,
        handler: F,
    ) -> Result<ListenerId>
    where
        F: Fn(&mut Page, &mut Event) -> Result<()> + 'static,
    {
        self.require_listener_target(node, event)?;
        Ok(self.listeners.add(node, event, capture, Rc::new(handler)))
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Sets the `on<event>` handler property of `node`, e.g. `onclick`.
    pub fn set_event_handler<F>(&mut self, node: NodeId, event: &str, handler: F) -> Result<()>
    where
        F: Fn(&mut Page, &mut Event) -> Result<()> + 'static,
    {
        self.require_listener_target(node, event)?;
        let handler: Handler = Rc::new(handler);
        self.listeners.set_inline(node, event, Some(handler));
        Ok(())
    }

    pub fn clear_event_handler(&mut self, node: NodeId, event: &str) {
        self.listeners.set_inline(node, event, None);
    }

    pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
        self.listeners.count(node, event)
    }

    fn require_listener_target(&self, node: NodeId, event: &str) -> Result<()> {
        if node == self.dom.root || self.dom.is_element(node) {
            return Ok(());
        }
        Err(Error::InvalidTarget(format!(
            "cannot listen for {event} on {}",
            self.dom.node_label(node)
        )))
    }

    fn deliver_event(&mut self, event: &mut Event) -> Result<()> {
        let target = event.target();

        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.dom.parent(node);
        }
        path.reverse();
        let ancestors = &path[..path.len() - 1];

        // Capture phase.
        for node in ancestors {
            event.enter(*node, EventPhase::Capturing);
            self.invoke_listeners(*node, event, true)?;
            if event.propagation_stopped() {
                return self.finish_event(event, "propagation_stopped");
            }
        }

        // Target phase: capture listeners first.
        event.enter(target, EventPhase::AtTarget);
        self.invoke_listeners(target, event, true)?;
        if event.propagation_stopped() {
            return self.finish_event(event, "propagation_stopped");
        }
        self.invoke_listeners(target, event, false)?;
        if event.propagation_stopped() {
            return self.finish_event(event, "propagation_stopped");
        }

        if event.bubbles() {
            for node in ancestors.iter().rev() {
                event.enter(*node, EventPhase::Bubbling);
                self.invoke_listeners(*node, event, false)?;
                if event.propagation_stopped() {
                    return self.finish_event(event, "propagation_stopped");
                }
            }
        }

        self.finish_event(event, "completed")
    }

    fn invoke_listeners(&mut self, node: NodeId, event: &mut Event, capture: bool) -> Result<()> {
        let listeners = self.listeners.get(node, event.event_type(), capture);
        for listener in listeners {
            // Removed by an earlier handler in this delivery.
            if !self.listeners.contains(listener.id) {
                continue;
            }
            if self.trace.events_enabled() {
                let line = format!(
                    "[event] {} target={} current={} phase={} default_prevented={}",
                    event.event_type(),
                    self.dom.node_label(event.target()),
                    self.dom.node_label(event.current_target()),
                    event.phase().as_str(),
                    event.default_prevented()
                );
                self.trace.event_line(line);
            }
            (listener.handler)(self, event)?;
            if event.immediate_propagation_stopped() {
                break;
            }
        }
        Ok(())
    }

    fn finish_event(&mut self, event: &mut Event, outcome: &str) -> Result<()> {
        if self.trace.events_enabled() {
            let line = format!(
                "[event] done {} target={} current={} outcome={} default_prevented={} propagation_stopped={} immediate_stopped={}",
                event.event_type(),
                self.dom.node_label(event.target()),
                self.dom.node_label(event.current_target()),
                outcome,
                event.default_prevented(),
                event.propagation_stopped(),
                event.immediate_propagation_stopped()
            );
            self.trace.event_line(line);
        }
        event.finish();
        Ok(())
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for Page {
    fn is_element(&self, node: NodeId) -> bool {
        self.dom.is_element(node)
    }

    fn describe(&self, node: NodeId) -> String {
        self.dom.node_label(node)
    }

    fn environment(&self) -> EnvironmentDefaults {
        self.environment
    }

    fn is_content_editable(&self, node: NodeId) -> bool {
        Page::is_content_editable(self, node)
    }

    fn supports_touch(&self) -> bool {
        self.touch_supported
    }

    fn deliver(&mut self, event: &mut Event) -> Result<()> {
        let target = event.target();
        if !self.dom.is_element(target) {
            return Err(Error::InvalidTarget(format!(
                "{} is not an element",
                self.dom.node_label(target)
            )));
        }
        stacker::maybe_grow(64 * 1024, 1024 * 1024, || self.deliver_event(event))
    }

    fn scroll_offset(&self, node: NodeId) -> Result<ScrollOffset> {
        self.dom.scroll_offset(node)
    }

    fn scroll_geometry(&self, node: NodeId) -> Result<ScrollGeometry> {
        self.dom.scroll_geometry(node)
    }

    fn set_scroll_offset(&mut self, node: NodeId, offset: ScrollOffset) -> Result<()> {
        self.dom.set_scroll_offset(node, offset)
    }

    fn force_files(&mut self, node: NodeId, files: FileList) -> Result<()> {
        self.dom.set_files(node, files)
    }

    fn set_value(&mut self, node: NodeId, value: &str) -> Result<()> {
        self.dom.set_value(node, value)
    }

    fn set_inner_html(&mut self, node: NodeId, html: &str) -> Result<()> {
        self.dom.set_inner_html(node, html)
    }

    fn trace(&mut self, line: String) {
        self.trace.line(line);
    }

    fn warn(&mut self, line: String) {
        self.trace.warn_line(line);
    }
}
