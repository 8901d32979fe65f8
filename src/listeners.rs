use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::dom::NodeId;
use crate::error::Result;
use crate::event::Event;
use crate::page::Page;

pub type Handler = Rc<dyn Fn(&mut Page, &mut Event) -> Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Clone)]
pub(crate) struct Listener {
    pub(crate) id: ListenerId,
    pub(crate) capture: bool,
    pub(crate) inline: bool,
    pub(crate) handler: Handler,
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("capture", &self.capture)
            .field("inline", &self.inline)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ListenerStore {
    map: HashMap<NodeId, HashMap<String, Vec<Listener>>>,
    next_id: u64,
}

impl ListenerStore {
    fn next_id(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }

    pub(crate) fn add(
        &mut self,
        node_id: NodeId,
        event: &str,
        capture: bool,
        handler: Handler,
    ) -> ListenerId {
        let id = self.next_id();
        self.map
            .entry(node_id)
            .or_default()
            .entry(event.to_string())
            .or_default()
            .push(Listener {
                id,
                capture,
                inline: false,
                handler,
            });
        id
    }

    /// An inline `on<type>` handler keeps the slot it got when first set;
    /// replacing it does not move it behind later listeners.
    pub(crate) fn set_inline(&mut self, node_id: NodeId, event: &str, handler: Option<Handler>) {
        let existing = self
            .map
            .get_mut(&node_id)
            .and_then(|events| events.get_mut(event))
            .and_then(|listeners| {
                let pos = listeners.iter().position(|l| l.inline)?;
                Some((listeners, pos))
            });

        match (existing, handler) {
            (Some((listeners, pos)), Some(handler)) => listeners[pos].handler = handler,
            (Some((listeners, pos)), None) => {
                listeners.remove(pos);
                self.prune(node_id, event);
            }
            (None, Some(handler)) => {
                let id = self.next_id();
                self.map
                    .entry(node_id)
                    .or_default()
                    .entry(event.to_string())
                    .or_default()
                    .push(Listener {
                        id,
                        capture: false,
                        inline: true,
                        handler,
                    });
            }
            (None, None) => {}
        }
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let mut found = None;
        for (node_id, events) in &mut self.map {
            for (event, listeners) in events.iter_mut() {
                if let Some(pos) = listeners.iter().position(|l| l.id == id && !l.inline) {
                    listeners.remove(pos);
                    found = Some((*node_id, event.clone()));
                    break;
                }
            }
            if found.is_some() {
                break;
            }
        }

        match found {
            Some((node_id, event)) => {
                self.prune(node_id, &event);
                true
            }
            None => false,
        }
    }

    pub(crate) fn contains(&self, id: ListenerId) -> bool {
        self.map
            .values()
            .flat_map(HashMap::values)
            .any(|listeners| listeners.iter().any(|l| l.id == id))
    }

    fn prune(&mut self, node_id: NodeId, event: &str) {
        let Some(events) = self.map.get_mut(&node_id) else {
            return;
        };
        if events.get(event).is_some_and(Vec::is_empty) {
            events.remove(event);
        }
        if events.is_empty() {
            self.map.remove(&node_id);
        }
    }

    pub(crate) fn get(&self, node_id: NodeId, event: &str, capture: bool) -> Vec<Listener> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .map(|listeners| {
                listeners
                    .iter()
                    .filter(|listener| listener.capture == capture)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn count(&self, node_id: NodeId, event: &str) -> usize {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .map(Vec::len)
            .unwrap_or(0)
    }
}
