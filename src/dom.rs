use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};
use crate::files::FileList;
use crate::host::{ScrollGeometry, ScrollOffset};
use crate::html::{escape_attr, escape_text, is_void_tag, parse_fragment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node_type: NodeType,
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    pub(crate) attrs: BTreeMap<String, String>,
    pub(crate) value: String,
    pub(crate) files: Option<FileList>,
    pub(crate) scroll_offset: ScrollOffset,
    pub(crate) scroll_geometry: ScrollGeometry,
}

impl Element {
    fn new(tag_name: String, attrs: BTreeMap<String, String>) -> Self {
        let value = attrs.get("value").cloned().unwrap_or_default();
        let is_file_input = tag_name == "input"
            && attrs
                .get("type")
                .map(|kind| kind.eq_ignore_ascii_case("file"))
                .unwrap_or(false);
        Self {
            tag_name,
            attrs,
            value,
            files: is_file_input.then(FileList::default),
            scroll_offset: ScrollOffset::default(),
            scroll_geometry: ScrollGeometry::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Dom {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    id_index: HashMap<String, NodeId>,
}

impl Dom {
    pub(crate) fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            node_type: NodeType::Document,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(node_id.0)
    }

    fn create_node(&mut self, parent: Option<NodeId>, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            node_type,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id.0].children.push(id);
        }
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: Option<NodeId>,
        tag_name: &str,
        attrs: BTreeMap<String, String>,
    ) -> NodeId {
        let element = Element::new(tag_name.to_ascii_lowercase(), attrs);
        let id = self.create_node(parent, NodeType::Element(element));
        if parent.is_some() && self.is_connected(id) {
            if let Some(id_attr) = self.attr(id, "id") {
                self.id_index.entry(id_attr).or_insert(id);
            }
        }
        id
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.create_node(Some(parent), NodeType::Text(text))
    }

    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.node(parent).is_none() || self.node(child).is_none() {
            return Err(Error::InvalidTarget(format!(
                "appendChild with unknown node (parent={}, child={})",
                parent.0, child.0
            )));
        }
        if matches!(self.nodes[parent.0].node_type, NodeType::Text(_)) {
            return Err(Error::InvalidTarget("appendChild parent is a text node".into()));
        }
        if child == self.root || child == parent || self.is_descendant_of(parent, child) {
            return Err(Error::InvalidTarget(
                "appendChild would create a cycle".into(),
            ));
        }

        if let Some(old_parent) = self.nodes[child.0].parent {
            self.nodes[old_parent.0].children.retain(|node| *node != child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.rebuild_id_index();
        Ok(())
    }

    pub(crate) fn element(&self, node_id: NodeId) -> Option<&Element> {
        match &self.node(node_id)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, node_id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_or_err(&self, node_id: NodeId, what: &str) -> Result<&Element> {
        self.element(node_id).ok_or_else(|| {
            Error::InvalidTarget(format!("{what} target node-{} is not an element", node_id.0))
        })
    }

    fn element_mut_or_err(&mut self, node_id: NodeId, what: &str) -> Result<&mut Element> {
        self.element_mut(node_id).ok_or_else(|| {
            Error::InvalidTarget(format!("{what} target node-{} is not an element", node_id.0))
        })
    }

    pub(crate) fn is_element(&self, node_id: NodeId) -> bool {
        self.element(node_id).is_some()
    }

    pub(crate) fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|e| e.tag_name.as_str())
    }

    pub(crate) fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.node(node_id).and_then(|node| node.parent)
    }

    pub(crate) fn children(&self, node_id: NodeId) -> &[NodeId] {
        self.node(node_id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    pub(crate) fn is_descendant_of(&self, node_id: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = self.parent(node_id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub(crate) fn is_connected(&self, node_id: NodeId) -> bool {
        node_id == self.root || self.is_descendant_of(node_id, self.root)
    }

    pub(crate) fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    pub(crate) fn rebuild_id_index(&mut self) {
        let mut index = HashMap::new();
        for node in self.descendant_elements(self.root) {
            if let Some(id) = self.attr(node, "id") {
                index.entry(id).or_insert(node);
            }
        }
        self.id_index = index;
    }

    /// Elements below `node_id` in document order, excluding `node_id`.
    pub(crate) fn descendant_elements(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node_id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if self.is_element(current) {
                out.push(current);
            }
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    pub(crate) fn text_content(&self, node_id: NodeId) -> String {
        let Some(node) = self.node(node_id) else {
            return String::new();
        };
        match &node.node_type {
            NodeType::Text(text) => text.clone(),
            NodeType::Document | NodeType::Element(_) => {
                let mut out = String::new();
                for child in &node.children {
                    out.push_str(&self.text_content(*child));
                }
                out
            }
        }
    }

    pub(crate) fn inner_html(&self, node_id: NodeId) -> Result<String> {
        self.element_or_err(node_id, "innerHTML")?;
        let mut out = String::new();
        for child in self.children(node_id) {
            self.dump_node(*child, &mut out);
        }
        Ok(out)
    }

    pub(crate) fn set_inner_html(&mut self, node_id: NodeId, html: &str) -> Result<()> {
        self.element_or_err(node_id, "innerHTML")?;

        let fragment = parse_fragment(html)?;

        let old_children = std::mem::take(&mut self.nodes[node_id.0].children);
        for child in old_children {
            self.nodes[child.0].parent = None;
        }

        let children = fragment.children(fragment.root).to_vec();
        for child in children {
            self.clone_subtree_from_dom(&fragment, child, node_id)?;
        }

        self.rebuild_id_index();
        let mut subtree = vec![node_id];
        subtree.extend(self.descendant_elements(node_id));
        self.initialize_form_controls(subtree);
        Ok(())
    }

    fn clone_subtree_from_dom(
        &mut self,
        source: &Dom,
        source_node: NodeId,
        parent: NodeId,
    ) -> Result<NodeId> {
        stacker::maybe_grow(32 * 1024, 1024 * 1024, || {
            let node_type = match &source.nodes[source_node.0].node_type {
                NodeType::Document => {
                    return Err(Error::HtmlParse(
                        "document node cannot be inserted as content".into(),
                    ));
                }
                other => other.clone(),
            };

            let node = self.create_node(Some(parent), node_type);
            for child in source.children(source_node) {
                self.clone_subtree_from_dom(source, *child, node)?;
            }
            Ok(node)
        })
    }

    pub(crate) fn value(&self, node_id: NodeId) -> Result<String> {
        Ok(self.element_or_err(node_id, "value")?.value.clone())
    }

    pub(crate) fn set_value(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        if self.tag_name(node_id) == Some("select") {
            return self.set_select_value(node_id, value);
        }
        self.element_mut_or_err(node_id, "value")?.value = value.to_string();
        Ok(())
    }

    fn set_select_value(&mut self, select_node: NodeId, requested: &str) -> Result<()> {
        let options: Vec<NodeId> = self
            .descendant_elements(select_node)
            .into_iter()
            .filter(|node| self.tag_name(*node) == Some("option"))
            .collect();

        let mut matched = None;
        for option in &options {
            let value = self.option_value(*option);
            let selected = matched.is_none() && value == requested;
            if selected {
                matched = Some(value);
            }
            if let Some(element) = self.element_mut(*option) {
                if selected {
                    element.attrs.insert("selected".into(), String::new());
                } else {
                    element.attrs.remove("selected");
                }
            }
        }

        self.element_mut_or_err(select_node, "value")?.value = matched.unwrap_or_default();
        Ok(())
    }

    fn option_value(&self, option: NodeId) -> String {
        self.attr(option, "value")
            .unwrap_or_else(|| self.text_content(option).trim().to_string())
    }

    /// Textarea and select values come from their content once parsing is done.
    pub(crate) fn initialize_form_control_values(&mut self) {
        let nodes = self.all_elements();
        self.initialize_form_controls(nodes);
    }

    fn initialize_form_controls(&mut self, nodes: Vec<NodeId>) {
        for node in nodes {
            match self.tag_name(node) {
                Some("textarea") => {
                    let text = self.text_content(node);
                    if let Some(element) = self.element_mut(node) {
                        element.value = text;
                    }
                }
                Some("select") => {
                    let options: Vec<NodeId> = self
                        .descendant_elements(node)
                        .into_iter()
                        .filter(|option| self.tag_name(*option) == Some("option"))
                        .collect();
                    let selected = options
                        .iter()
                        .copied()
                        .find(|option| self.attr(*option, "selected").is_some())
                        .or_else(|| options.first().copied());
                    let value = selected
                        .map(|option| self.option_value(option))
                        .unwrap_or_default();
                    if let Some(element) = self.element_mut(node) {
                        element.value = value;
                    }
                }
                _ => {}
            }
        }
    }

    fn all_elements(&self) -> Vec<NodeId> {
        (0..self.nodes.len())
            .map(NodeId)
            .filter(|node| self.is_element(*node))
            .collect()
    }

    pub(crate) fn attr(&self, node_id: NodeId, name: &str) -> Option<String> {
        self.element(node_id)
            .and_then(|e| e.attrs.get(&name.to_ascii_lowercase()).cloned())
    }

    pub(crate) fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let lowered = name.to_ascii_lowercase();
        let element = self.element_mut_or_err(node_id, "setAttribute")?;
        element.attrs.insert(lowered.clone(), value.to_string());
        if lowered == "value" {
            element.value = value.to_string();
        }
        if lowered == "type" && element.tag_name == "input" {
            if value.eq_ignore_ascii_case("file") {
                element.files.get_or_insert_with(FileList::default);
            } else {
                element.files = None;
            }
        }
        if lowered == "id" {
            self.rebuild_id_index();
        }
        Ok(())
    }

    pub(crate) fn remove_attr(&mut self, node_id: NodeId, name: &str) -> Result<()> {
        let lowered = name.to_ascii_lowercase();
        self.element_mut_or_err(node_id, "removeAttribute")?
            .attrs
            .remove(&lowered);
        if lowered == "id" {
            self.rebuild_id_index();
        }
        Ok(())
    }

    pub(crate) fn files(&self, node_id: NodeId) -> Result<Option<FileList>> {
        Ok(self.element_or_err(node_id, "files")?.files.clone())
    }

    pub(crate) fn set_files(&mut self, node_id: NodeId, files: FileList) -> Result<()> {
        self.element_mut_or_err(node_id, "files")?.files = Some(files);
        Ok(())
    }

    pub(crate) fn scroll_offset(&self, node_id: NodeId) -> Result<ScrollOffset> {
        Ok(self.element_or_err(node_id, "scroll")?.scroll_offset)
    }

    pub(crate) fn set_scroll_offset(&mut self, node_id: NodeId, offset: ScrollOffset) -> Result<()> {
        let element = self.element_mut_or_err(node_id, "scroll")?;
        element.scroll_offset = element.scroll_geometry.clamp(offset);
        Ok(())
    }

    pub(crate) fn scroll_geometry(&self, node_id: NodeId) -> Result<ScrollGeometry> {
        Ok(self.element_or_err(node_id, "scroll")?.scroll_geometry)
    }

    pub(crate) fn set_scroll_geometry(
        &mut self,
        node_id: NodeId,
        geometry: ScrollGeometry,
    ) -> Result<()> {
        let element = self.element_mut_or_err(node_id, "scroll")?;
        element.scroll_geometry = geometry;
        element.scroll_offset = geometry.clamp(element.scroll_offset);
        Ok(())
    }

    pub(crate) fn node_label(&self, node_id: NodeId) -> String {
        if let Some(id) = self.attr(node_id, "id") {
            if !id.is_empty() {
                return format!("#{id}");
            }
        }
        match self.node(node_id).map(|node| &node.node_type) {
            Some(NodeType::Element(element)) => element.tag_name.clone(),
            Some(NodeType::Document) => "#document".into(),
            Some(NodeType::Text(_)) => format!("#text-{}", node_id.0),
            None => format!("node-{}", node_id.0),
        }
    }

    pub(crate) fn dump_node(&self, node_id: NodeId, out: &mut String) {
        let Some(node) = self.node(node_id) else {
            return;
        };
        match &node.node_type {
            NodeType::Document => {
                for child in &node.children {
                    self.dump_node(*child, out);
                }
            }
            NodeType::Text(text) => out.push_str(&escape_text(text)),
            NodeType::Element(element) => {
                out.push('<');
                out.push_str(&element.tag_name);
                for (k, v) in &element.attrs {
                    out.push(' ');
                    out.push_str(k);
                    if !v.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&escape_attr(v));
                        out.push('"');
                    }
                }
                out.push('>');
                if is_void_tag(&element.tag_name) {
                    return;
                }
                for child in &node.children {
                    self.dump_node(*child, out);
                }
                out.push_str("</");
                out.push_str(&element.tag_name);
                out.push('>');
            }
        }
    }
}
