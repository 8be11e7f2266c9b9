//! Arena of XML nodes
//!
//! A package part is parsed once into an [XmlTree]: every node lives in one vector and is
//! addressed by a [NodeId]. Mutations are expressed as splicing children lists, so inserting
//! a run of sibling paragraphs in the middle of the body never invalidates the ids held by
//! the caller. Detached nodes stay in the arena and are simply unreachable from the root.
//!
//! Names are kept qualified (`w:p`, `wp:inline`) exactly as written in the part. Text nodes
//! hold unescaped text; escaping happens again on serialization.

use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XmlError {
    #[error("part is not UTF-8")]
    Encoding,
    #[error("malformed XML {0}")]
    Malformed(String),
    #[error("XML has no root element")]
    NoRoot,
    #[error("element <{0}> is never closed")]
    Unclosed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
enum NodeData {
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

#[derive(Debug, Clone)]
pub struct XmlTree {
    nodes: Vec<Node>,
    root: NodeId,
    declaration: Option<String>,
}

impl XmlTree {
    /// Parse a part from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, XmlError> {
        let source = std::str::from_utf8(bytes).map_err(|_| XmlError::Encoding)?;
        Self::parse(source)
    }

    pub fn parse(source: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(source);
        let mut nodes: Vec<Node> = Vec::new();
        let mut root: Option<NodeId> = None;
        let mut declaration = None;
        let mut stack: Vec<NodeId> = Vec::new();

        let malformed = |position: u64, err: &dyn std::fmt::Display| {
            XmlError::Malformed(format!("at byte {}: {}", position, err))
        };

        loop {
            let position = reader.buffer_position() as u64;
            let event = reader
                .read_event()
                .map_err(|err| malformed(position, &err))?;
            match event {
                Event::Decl(decl) => {
                    declaration = Some(format!("<?{}?>", String::from_utf8_lossy(&decl)));
                }
                Event::Start(start) => {
                    let id = open_element(&mut nodes, &mut root, &stack, &start)
                        .map_err(|err| malformed(position, &err))?;
                    stack.push(id);
                }
                Event::Empty(start) => {
                    open_element(&mut nodes, &mut root, &stack, &start)
                        .map_err(|err| malformed(position, &err))?;
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(text) => {
                    if let Some(parent) = stack.last().copied() {
                        let text = text
                            .unescape()
                            .map_err(|err| malformed(position, &err))?
                            .into_owned();
                        push_leaf(&mut nodes, parent, NodeData::Text(text));
                    }
                }
                Event::CData(cdata) => {
                    if let Some(parent) = stack.last().copied() {
                        let text = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                        push_leaf(&mut nodes, parent, NodeData::CData(text));
                    }
                }
                Event::Comment(comment) => {
                    if let Some(parent) = stack.last().copied() {
                        let text = String::from_utf8_lossy(&comment).into_owned();
                        push_leaf(&mut nodes, parent, NodeData::Comment(text));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            let name = match &nodes[open.0].data {
                NodeData::Element { name, .. } => name.clone(),
                _ => String::new(),
            };
            return Err(XmlError::Unclosed(name));
        }

        Ok(Self {
            nodes,
            root: root.ok_or(XmlError::NoRoot)?,
            declaration,
        })
    }

    /// Serialize the whole tree, declaration included.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        if let Some(decl) = &self.declaration {
            out.push_str(decl);
            out.push_str("\r\n");
        }
        self.write_node(self.root, &mut out);
        out
    }

    /// Serialize one subtree, without declaration.
    pub fn subtree_to_string(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];
        match &node.data {
            NodeData::Element { name, attrs } => {
                out.push('<');
                out.push_str(name);
                for (key, value) in attrs {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    out.push_str(&escape(value.as_str()));
                    out.push('"');
                }
                if node.children.is_empty() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for child in &node.children {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            NodeData::Text(text) => out.push_str(&partial_escape(text.as_str())),
            NodeData::CData(text) => {
                out.push_str("<![CDATA[");
                out.push_str(text);
                out.push_str("]]>");
            }
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn is(&self, id: NodeId, name: &str) -> bool {
        self.name(id) == Some(name)
    }

    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Direct element children with the given qualified name.
    pub fn children_named(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.is(*child, name))
            .collect()
    }

    pub fn first_child_named(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|child| self.is(*child, name))
    }

    /// Pre-order walk of the subtree rooted at `id`, `id` included.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            for child in self.children(current).iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// First element named `name` in document order below `id`.
    pub fn find_descendant(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(id)
            .into_iter()
            .find(|node| self.is(*node, name))
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text(text) | NodeData::CData(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Concatenated text of every text node in the subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|node| self.text(node))
            .collect()
    }

    pub fn create_element(&mut self, name: &str, attrs: &[(&str, &str)]) -> NodeId {
        self.push_detached(NodeData::Element {
            name: name.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_detached(NodeData::Text(text.to_string()))
    }

    fn push_detached(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
    }

    /// Insert `node` right after `sibling` under the same parent.
    pub fn insert_after(&mut self, sibling: NodeId, node: NodeId) {
        if let (Some(parent), Some(index)) = (self.parent(sibling), self.index_in_parent(sibling))
        {
            self.insert_child(parent, index + 1, node);
        }
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|child| *child == id)
    }

    /// Remove `id` from its parent's children. The node keeps its own subtree.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != id);
        }
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current == self.root
    }

    /// Copy a subtree of this tree into a new detached subtree.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let copy = self.push_detached(self.nodes[id.0].data.clone());
        let children = self.nodes[id.0].children.clone();
        for child in children {
            let child_copy = self.deep_clone(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Copy a subtree of another tree into this arena, detached.
    pub fn import(&mut self, other: &XmlTree, id: NodeId) -> NodeId {
        let copy = self.push_detached(other.nodes[id.0].data.clone());
        for child in other.children(id) {
            let child_copy = self.import(other, *child);
            self.append_child(copy, child_copy);
        }
        copy
    }
}

fn push_leaf(nodes: &mut Vec<Node>, parent: NodeId, data: NodeData) {
    let id = NodeId(nodes.len());
    nodes.push(Node {
        parent: Some(parent),
        children: Vec::new(),
        data,
    });
    nodes[parent.0].children.push(id);
}

/// Push a new element under the innermost open element (or as the root).
fn open_element(
    nodes: &mut Vec<Node>,
    root: &mut Option<NodeId>,
    stack: &[NodeId],
    start: &BytesStart<'_>,
) -> Result<NodeId, String> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| err.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| err.to_string())?
            .into_owned();
        attrs.push((key, value));
    }

    let id = NodeId(nodes.len());
    nodes.push(Node {
        parent: stack.last().copied(),
        children: Vec::new(),
        data: NodeData::Element { name, attrs },
    });
    match stack.last() {
        Some(parent) => nodes[parent.0].children.push(id),
        None if root.is_none() => *root = Some(id),
        None => return Err("more than one root element".to_string()),
    }
    Ok(id)
}
