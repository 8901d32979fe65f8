use std::collections::VecDeque;

use crate::config::TraceConfig;
use crate::error::{Error, Result};

/// Bounded in-memory trace log. Every recorded line is also emitted as a
/// `tracing` event so an installed subscriber sees the same stream.
#[derive(Debug, Clone)]
pub(crate) struct TraceState {
    enabled: bool,
    events: bool,
    limit: usize,
    logs: VecDeque<String>,
}

impl TraceState {
    pub(crate) fn new(config: &TraceConfig) -> Self {
        Self {
            enabled: config.enabled,
            events: config.events,
            limit: config.log_limit.max(1),
            logs: VecDeque::new(),
        }
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn set_events(&mut self, enabled: bool) {
        self.events = enabled;
    }

    pub(crate) fn events_enabled(&self) -> bool {
        self.enabled && self.events
    }

    pub(crate) fn set_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::InvalidConfig(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.limit = max_entries;
        while self.logs.len() > self.limit {
            self.logs.pop_front();
        }
        Ok(())
    }

    pub(crate) fn take(&mut self) -> Vec<String> {
        self.logs.drain(..).collect()
    }

    pub(crate) fn event_line(&mut self, line: String) {
        if self.events_enabled() {
            tracing::debug!(target: "dom_simulate::event", "{line}");
            self.push(line);
        }
    }

    /// Warnings always reach `tracing`; they are kept in the log only while
    /// tracing is enabled.
    pub(crate) fn warn_line(&mut self, line: String) {
        tracing::warn!(target: "dom_simulate", "{line}");
        if self.enabled {
            self.push(line);
        }
    }

    pub(crate) fn line(&mut self, line: String) {
        if self.enabled {
            tracing::debug!(target: "dom_simulate", "{line}");
            self.push(line);
        }
    }

    fn push(&mut self, line: String) {
        if self.logs.len() >= self.limit {
            self.logs.pop_front();
        }
        self.logs.push_back(line);
    }
}
