//! Fragment documents: parsed input wrapped in a canonical shell
//!
//! [`load_fragment`] parses a value with [`crate::parser::parse_fragment`] and
//! deep-copies every top-level node into the `<body>` of a fresh shell:
//!
//! ```text
//! #document
//! └── html
//!     ├── head
//!     └── body
//!         └── (fragment nodes)
//! ```
//!
//! The copy lives in an arena owned by the [`FragmentDocument`]; nothing is
//! shared with the reference-counted parse tree, which is dropped once the
//! copy is complete. Copying, traversal and dropping are all iterative, so
//! arbitrarily deep input cannot exhaust the call stack.

use markup5ever_rcdom::{Handle, NodeData};
use std::fmt;

/// Index of a node inside its [`FragmentDocument`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Element name and attributes, in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
}

impl Element {
    /// Element with no attributes
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Tag name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attributes as `(name, value)` pairs, in source order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Value of the attribute called `name`
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// What a node holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Synthetic document root
    Document,
    /// Element with name and attributes
    Element(Element),
    /// Character data
    Text(String),
    /// `<!-- ... -->` contents
    Comment(String),
    /// `<!DOCTYPE ...>` name
    Doctype(String),
    /// `<?target ...?>` target
    ProcessingInstruction(String),
}

/// Node in a [`FragmentDocument`]
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    /// What the node holds
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Element data, if this is an element
    pub fn as_element(&self) -> Option<&Element> {
        match &self.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Parent node; `None` only for the document root
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes, in source order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Shell document whose body holds one parsed fragment
#[derive(Debug, Clone)]
pub struct FragmentDocument {
    nodes: Vec<Node>,
    head: NodeId,
    body: NodeId,
    base_uri: String,
}

impl FragmentDocument {
    /// Empty shell: `#document > html > (head, body)`
    pub fn shell(base_uri: impl Into<String>) -> Self {
        let mut document = Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            head: NodeId(0),
            body: NodeId(0),
            base_uri: base_uri.into(),
        };
        let html = document.append(document.root(), NodeKind::Element(Element::new("html")));
        document.head = document.append(html, NodeKind::Element(Element::new("head")));
        document.body = document.append(html, NodeKind::Element(Element::new("body")));
        document
    }

    /// Document root
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The shell's `<head>`; always empty for loaded fragments
    pub fn head(&self) -> NodeId {
        self.head
    }

    /// The shell's `<body>`, parent of the fragment's top-level nodes
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Base URI the fragment was loaded with
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Node behind `id`
    ///
    /// # Panics
    ///
    /// Panics if `id` comes from a different document.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Children of `id`, in source order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Total number of nodes, shell included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document holds nothing but the shell
    pub fn is_empty(&self) -> bool {
        self.children(self.body).is_empty()
    }

    /// Append a new node as the last child of `parent`
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Deep-copy the parse-tree node `source` and its subtree under `parent`
    pub fn append_copy(&mut self, parent: NodeId, source: &Handle) -> NodeId {
        let copied = self.append(parent, copy_kind(source));
        let mut pending: Vec<(Handle, NodeId)> = source
            .children
            .borrow()
            .iter()
            .rev()
            .map(|child| (child.clone(), copied))
            .collect();

        while let Some((handle, parent)) = pending.pop() {
            let id = self.append(parent, copy_kind(&handle));
            pending.extend(
                handle
                    .children
                    .borrow()
                    .iter()
                    .rev()
                    .map(|child| (child.clone(), id)),
            );
        }

        copied
    }

    /// `id` and all nodes below it, in depth-first pre-order
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            document: self,
            stack: vec![id],
        }
    }

    /// Concatenated text of all text nodes below `id`
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .filter_map(|node| match self.node(node).kind() {
                NodeKind::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for FragmentDocument {
    /// Indented outline of the tree, one node per line
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(self.root(), 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = self.node(id);
            write!(f, "{:indent$}", "", indent = depth * 2)?;
            match node.kind() {
                NodeKind::Document => writeln!(f, "#document")?,
                NodeKind::Element(element) => {
                    write!(f, "<{}", element.name())?;
                    for (name, value) in element.attributes() {
                        write!(f, " {}={:?}", name, value)?;
                    }
                    writeln!(f, ">")?;
                }
                NodeKind::Text(text) => writeln!(f, "{:?}", text)?,
                NodeKind::Comment(text) => writeln!(f, "<!--{}-->", text)?,
                NodeKind::Doctype(name) => writeln!(f, "<!DOCTYPE {}>", name)?,
                NodeKind::ProcessingInstruction(target) => writeln!(f, "<?{}?>", target)?,
            }
            stack.extend(node.children().iter().rev().map(|&child| (child, depth + 1)));
        }
        Ok(())
    }
}

/// Pre-order iterator returned by [`FragmentDocument::descendants`]
pub struct Descendants<'a> {
    document: &'a FragmentDocument,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.document.children(id).iter().rev().copied());
        Some(id)
    }
}

/// Parse `raw` and wrap the result in a shell document
///
/// Every top-level node of the parse becomes a child of the shell's body, in
/// source order. `base_uri` is recorded on the document; it does not affect
/// the shape of the tree.
///
/// # Examples
///
/// ```rust
/// use safe_html_validator::fragment::{load_fragment, NodeKind};
///
/// let document = load_fragment("<td>cell</td>text", "https://example.com/");
/// let body = document.children(document.body());
/// assert_eq!(body.len(), 2);
/// assert_eq!(document.node(body[0]).as_element().map(|e| e.name()), Some("td"));
/// assert_eq!(document.node(body[1]).kind(), &NodeKind::Text("text".to_string()));
/// assert_eq!(document.base_uri(), "https://example.com/");
/// ```
pub fn load_fragment(raw: &str, base_uri: &str) -> FragmentDocument {
    let parsed = crate::parser::parse_fragment(raw);
    let mut document = FragmentDocument::shell(base_uri);
    let body = document.body();
    for node in parsed.document.children.borrow().iter() {
        document.append_copy(body, node);
    }
    document
}

fn copy_kind(handle: &Handle) -> NodeKind {
    match handle.data {
        NodeData::Document => NodeKind::Document,
        NodeData::Element {
            ref name,
            ref attrs,
            ..
        } => NodeKind::Element(Element {
            name: name.local.to_string(),
            attributes: attrs
                .borrow()
                .iter()
                .map(|attr| {
                    let name = match attr.name.prefix {
                        Some(ref prefix) => format!("{}:{}", prefix, attr.name.local),
                        None => attr.name.local.to_string(),
                    };
                    (name, attr.value.to_string())
                })
                .collect(),
        }),
        NodeData::Text { ref contents } => NodeKind::Text(contents.borrow().to_string()),
        NodeData::Comment { ref contents } => NodeKind::Comment(contents.to_string()),
        NodeData::Doctype { ref name, .. } => NodeKind::Doctype(name.to_string()),
        NodeData::ProcessingInstruction { ref target, .. } => {
            NodeKind::ProcessingInstruction(target.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(document: &FragmentDocument, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|&id| match document.node(id).kind() {
                NodeKind::Element(element) => element.name().to_string(),
                NodeKind::Text(_) => "#text".to_string(),
                NodeKind::Comment(_) => "#comment".to_string(),
                NodeKind::Doctype(_) => "#doctype".to_string(),
                NodeKind::ProcessingInstruction(_) => "#pi".to_string(),
                NodeKind::Document => "#document".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_shell_layout() {
        let document = FragmentDocument::shell("");
        let root_children = document.children(document.root());
        assert_eq!(names(&document, root_children), ["html"]);
        let html = root_children[0];
        assert_eq!(names(&document, document.children(html)), ["head", "body"]);
        assert!(document.is_empty());
        assert!(document.children(document.head()).is_empty());
        assert_eq!(document.node(document.body()).parent(), Some(html));
        assert_eq!(document.node_count(), 4);
    }

    #[test]
    fn test_load_empty_fragment() {
        let document = load_fragment("", "");
        assert!(document.is_empty());
        assert_eq!(document.node_count(), 4);
    }

    #[test]
    fn test_load_keeps_top_level_order() {
        let document = load_fragment("a<b>b</b><!--c--><li>d</li>", "");
        let body = document.children(document.body());
        assert_eq!(names(&document, body), ["#text", "b", "#comment", "li"]);
        assert_eq!(document.text_content(document.body()), "abd");
    }

    #[test]
    fn test_deep_copy_preserves_structure_and_attributes() {
        let document = load_fragment(r#"<table><td colspan="2"><em>x</em></td></table>"#, "");
        let body = document.body();
        let table = document.children(body)[0];
        let td = document.children(table)[0];
        let em = document.children(td)[0];

        let td_element = document.node(td).as_element().unwrap();
        assert_eq!(td_element.name(), "td");
        assert_eq!(td_element.attribute("colspan"), Some("2"));
        assert_eq!(td_element.attribute("COLSPAN"), Some("2"));
        assert_eq!(document.node(em).parent(), Some(td));
        assert_eq!(document.node(table).parent(), Some(body));
    }

    #[test]
    fn test_descendants_are_pre_order() {
        let document = load_fragment("<a><b></b><c><d></d></c></a><e></e>", "");
        let order: Vec<NodeId> = document.descendants(document.body()).skip(1).collect();
        assert_eq!(names(&document, &order), ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_deep_nesting_does_not_overflow() {
        let depth = 50_000;
        let input = "<b>".repeat(depth);
        let document = load_fragment(&input, "");
        assert_eq!(document.descendants(document.body()).count(), depth + 1);
    }

    #[test]
    fn test_display_outline() {
        let document = load_fragment(r#"<p class="x">hi</p>"#, "");
        let outline = document.to_string();
        assert!(outline.contains("      <p class=\"x\">\n"));
        assert!(outline.contains("        \"hi\"\n"));
    }
}
