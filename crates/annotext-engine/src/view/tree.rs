use std::collections::BTreeMap;

use serde::Serialize;

use crate::text::{Span, utf16_len, utf16_to_byte};

/// Handle to a node in a [`ViewTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

/// A boundary point with DOM semantics.
///
/// For a text node `offset` counts UTF-16 code units into its text; for an
/// element it is a child index (the point sits before that child).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub node: NodeId,
    pub offset: usize,
}

impl Point {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    live: bool,
}

/// Owned, comparable picture of a subtree. Two views render the same when
/// their snapshots are equal, regardless of arena layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ViewSnapshot {
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
        children: Vec<ViewSnapshot>,
    },
    Text(String),
}

/// Arena tree standing in for the rendered document (the DOM in a browser,
/// a styled line buffer in a terminal).
///
/// Nodes merged away by [`ViewTree::normalize`] or removed by
/// [`ViewTree::unwrap`] are released and their slots reused by later inserts,
/// so repainting keeps the arena at a steady size. Ids of released nodes must
/// not be used again. Nodes removed with [`ViewTree::detach`] stay allocated
/// and may be re-attached.
#[derive(Debug, Clone)]
pub struct ViewTree {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
}

impl ViewTree {
    /// A tree holding a single root element.
    pub fn new(root_tag: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Element(Element::new(root_tag)),
                parent: None,
                children: Vec::new(),
                live: true,
            }],
            free: Vec::new(),
        }
    }

    /// A root element containing `text` as one text node (none if empty).
    pub fn with_text(root_tag: impl Into<String>, text: &str) -> Self {
        let mut tree = Self::new(root_tag);
        if !text.is_empty() {
            let leaf = tree.create_text(text);
            tree.append_child(tree.root(), leaf);
        }
        tree
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.push(NodeData::Element(element))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let node = Node {
            data,
            parent: None,
            children: Vec::new(),
            live: true,
        };
        if let Some(id) = self.free.pop() {
            self.nodes[id.0] = node;
            return id;
        }
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Returns a node with no parent and no children to the free list.
    fn release(&mut self, node: NodeId) {
        let slot = &mut self.nodes[node.0];
        slot.data = NodeData::Text(String::new());
        slot.parent = None;
        slot.children.clear();
        slot.live = false;
        self.free.push(node);
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// A tree always holds its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Slots allocated in the arena, live or free.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Appends `child` to `parent`, detaching it from any previous parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Removes `node` from its parent's child list.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.get(node.0).is_some_and(|n| n.live)
    }

    pub fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.0].data
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Text(t) => Some(t),
            NodeData::Element(_) => None,
        }
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Element(e) => Some(e),
            NodeData::Text(_) => None,
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.attrs.get(name).map(String::as_str)
    }

    /// True if `node` is `ancestor` or lies beneath it.
    pub fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.parent(n);
        }
        false
    }

    /// Nodes beneath `node` in document order (pre-order), excluding `node`.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    /// Text leaves under `node` with their spans relative to the start of `node`.
    pub fn text_leaves(&self, node: NodeId) -> Vec<(NodeId, Span)> {
        let mut offset = 0;
        let mut out = Vec::new();
        for n in self.descendants(node) {
            if let Some(t) = self.text(n) {
                let len = utf16_len(t);
                out.push((n, Span::new(offset, offset + len)));
                offset += len;
            }
        }
        out
    }

    pub fn text_content(&self, node: NodeId) -> String {
        if let Some(t) = self.text(node) {
            return t.to_string();
        }
        self.descendants(node)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Text length of a subtree in UTF-16 code units.
    pub fn text_len(&self, node: NodeId) -> usize {
        if let Some(t) = self.text(node) {
            return utf16_len(t);
        }
        self.descendants(node)
            .into_iter()
            .filter_map(|n| self.text(n))
            .map(utf16_len)
            .sum()
    }

    /// Maps a text offset under `container` to a boundary point.
    ///
    /// An offset on the border of two leaves resolves to the start of the
    /// later leaf; the end of the text resolves to the end of the last leaf.
    pub fn leaf_at(&self, container: NodeId, offset: usize) -> Option<Point> {
        let leaves = self.text_leaves(container);
        if let Some((node, span)) = leaves.iter().find(|(_, span)| span.contains(offset)) {
            return Some(Point::new(*node, offset - span.start));
        }
        match leaves.last() {
            Some((node, span)) if span.end == offset => Some(Point::new(*node, span.len())),
            None if offset == 0 => Some(Point::new(container, 0)),
            _ => None,
        }
    }

    /// Splits a text node at `units`, inserting the tail as a new sibling.
    ///
    /// Returns the tail node, or `None` if `node` is not text or `units` is
    /// not a valid boundary.
    pub fn split_text(&mut self, node: NodeId, units: usize) -> Option<NodeId> {
        let text = self.text(node)?;
        let at = utf16_to_byte(text, units)?;
        let tail_text = text[at..].to_string();
        let head_text = text[..at].to_string();
        self.nodes[node.0].data = NodeData::Text(head_text);

        let tail = self.create_text(tail_text);
        if let Some(parent) = self.nodes[node.0].parent {
            let idx = self.index_in_parent(node)?;
            self.nodes[tail.0].parent = Some(parent);
            self.nodes[parent.0].children.insert(idx + 1, tail);
        }
        Some(tail)
    }

    /// Replaces `node` in its parent by a new element that contains it.
    pub fn wrap(&mut self, node: NodeId, element: Element) -> NodeId {
        let wrapper = self.create_element(element);
        if let Some(parent) = self.nodes[node.0].parent
            && let Some(idx) = self.index_in_parent(node)
        {
            self.nodes[parent.0].children[idx] = wrapper;
            self.nodes[wrapper.0].parent = Some(parent);
        }
        self.nodes[node.0].parent = Some(wrapper);
        self.nodes[wrapper.0].children.push(node);
        wrapper
    }

    /// Replaces an element by its children, in place.
    pub fn unwrap(&mut self, node: NodeId) {
        let Some(parent) = self.nodes[node.0].parent else {
            return;
        };
        let Some(idx) = self.index_in_parent(node) else {
            return;
        };
        let children = std::mem::take(&mut self.nodes[node.0].children);
        for &c in &children {
            self.nodes[c.0].parent = Some(parent);
        }
        let siblings = &mut self.nodes[parent.0].children;
        siblings.remove(idx);
        for (i, c) in children.into_iter().enumerate() {
            siblings.insert(idx + i, c);
        }
        self.nodes[node.0].parent = None;
        self.release(node);
    }

    /// Merges adjacent text siblings and drops empty text nodes, like DOM
    /// `Node.normalize()`.
    pub fn normalize(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            let children = std::mem::take(&mut self.nodes[n.0].children);
            let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());
            for c in children {
                match self.text(c).map(str::to_owned) {
                    Some(t) if t.is_empty() => {
                        self.nodes[c.0].parent = None;
                        self.release(c);
                    }
                    Some(t) => {
                        let prev = kept.last().copied().filter(|&p| self.text(p).is_some());
                        match prev {
                            Some(prev) => {
                                if let NodeData::Text(p) = &mut self.nodes[prev.0].data {
                                    p.push_str(&t);
                                }
                                self.nodes[c.0].parent = None;
                                self.release(c);
                            }
                            None => kept.push(c),
                        }
                    }
                    None => {
                        stack.push(c);
                        kept.push(c);
                    }
                }
            }
            self.nodes[n.0].children = kept;
        }
    }

    /// Elements beneath `node` that satisfy `pred`, in document order.
    pub fn find_elements(&self, node: NodeId, pred: impl Fn(&Element) -> bool) -> Vec<NodeId> {
        self.descendants(node)
            .into_iter()
            .filter(|&n| self.element(n).is_some_and(&pred))
            .collect()
    }

    pub fn snapshot(&self, node: NodeId) -> ViewSnapshot {
        match &self.nodes[node.0].data {
            NodeData::Text(t) => ViewSnapshot::Text(t.clone()),
            NodeData::Element(e) => ViewSnapshot::Element {
                tag: e.tag.clone(),
                attrs: e.attrs.clone(),
                children: self
                    .children(node)
                    .iter()
                    .map(|&c| self.snapshot(c))
                    .collect(),
            },
        }
    }

    /// Serializes a subtree as HTML, escaping text and attribute values.
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].data {
            NodeData::Text(t) => out.push_str(&html_escape::encode_text(t)),
            NodeData::Element(e) => {
                out.push('<');
                out.push_str(&e.tag);
                for (name, value) in &e.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(value));
                    out.push('"');
                }
                out.push('>');
                for &c in self.children(node) {
                    self.write_html(c, out);
                }
                out.push_str("</");
                out.push_str(&e.tag);
                out.push('>');
            }
        }
    }

    fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.nodes[node.0].parent?;
        self.nodes[parent.0].children.iter().position(|&c| c == node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> (ViewTree, NodeId, NodeId, NodeId) {
        // <p>The <b>quick</b> fox</p>
        let mut tree = ViewTree::new("p");
        let root = tree.root();
        let a = tree.create_text("The ");
        let b = tree.create_element(Element::new("b"));
        let b_text = tree.create_text("quick");
        let c = tree.create_text(" fox");
        tree.append_child(root, a);
        tree.append_child(root, b);
        tree.append_child(b, b_text);
        tree.append_child(root, c);
        (tree, a, b_text, c)
    }

    #[test]
    fn text_content_follows_document_order() {
        let (tree, ..) = sample();
        assert_eq!(tree.text_content(tree.root()), "The quick fox");
        assert_eq!(tree.text_len(tree.root()), 13);
    }

    #[test]
    fn text_leaves_accumulate_offsets() {
        let (tree, a, b_text, c) = sample();
        assert_eq!(
            tree.text_leaves(tree.root()),
            vec![
                (a, Span::new(0, 4)),
                (b_text, Span::new(4, 9)),
                (c, Span::new(9, 13)),
            ]
        );
    }

    #[test]
    fn leaf_at_prefers_later_leaf_on_border() {
        let (tree, a, b_text, c) = sample();
        let root = tree.root();
        assert_eq!(tree.leaf_at(root, 0), Some(Point::new(a, 0)));
        assert_eq!(tree.leaf_at(root, 4), Some(Point::new(b_text, 0)));
        assert_eq!(tree.leaf_at(root, 13), Some(Point::new(c, 4)));
        assert_eq!(tree.leaf_at(root, 14), None);
    }

    #[test]
    fn is_descendant_is_inclusive() {
        let (tree, a, b_text, _) = sample();
        assert!(tree.is_descendant(a, tree.root()));
        assert!(tree.is_descendant(tree.root(), tree.root()));
        assert!(!tree.is_descendant(a, b_text));
    }

    #[test]
    fn split_wrap_unwrap_normalize_round_trip() {
        let mut tree = ViewTree::with_text("div", "The quick brown fox");
        let root = tree.root();
        let before = tree.snapshot(root);

        let leaf = tree.children(root)[0];
        let middle = tree.split_text(leaf, 4).unwrap();
        let tail = tree.split_text(middle, 5).unwrap();
        assert_eq!(tree.text(leaf), Some("The "));
        assert_eq!(tree.text(middle), Some("quick"));
        assert_eq!(tree.text(tail), Some(" brown fox"));

        let mark = tree.wrap(middle, Element::new("mark"));
        assert_eq!(
            tree.to_html(root),
            "<div>The <mark>quick</mark> brown fox</div>"
        );

        tree.unwrap(mark);
        tree.normalize(root);
        assert_eq!(tree.snapshot(root), before);
    }

    #[test]
    fn repeated_split_wrap_unwrap_reuses_slots() {
        let mut tree = ViewTree::with_text("div", "The quick brown fox");
        let root = tree.root();
        for _ in 0..1000 {
            let leaf = tree.children(root)[0];
            let middle = tree.split_text(leaf, 4).unwrap();
            tree.split_text(middle, 5).unwrap();
            let mark = tree.wrap(middle, Element::new("mark"));
            tree.unwrap(mark);
            tree.normalize(root);
        }
        assert_eq!(tree.len(), 2);
        assert!(tree.capacity() <= 5);
        assert_eq!(tree.text_content(root), "The quick brown fox");
    }

    #[test]
    fn released_nodes_are_not_contained() {
        let mut tree = ViewTree::with_text("div", "ab");
        let root = tree.root();
        let leaf = tree.children(root)[0];
        let tail = tree.split_text(leaf, 1).unwrap();
        tree.normalize(root);
        assert!(tree.contains(leaf));
        assert!(!tree.contains(tail));
        assert_eq!(tree.children(root), &[leaf]);
    }

    #[test]
    fn normalize_drops_empty_text() {
        let mut tree = ViewTree::new("div");
        let root = tree.root();
        let empty = tree.create_text("");
        let t = tree.create_text("x");
        tree.append_child(root, empty);
        tree.append_child(root, t);
        tree.normalize(root);
        assert_eq!(tree.children(root), &[t]);
    }

    #[test]
    fn html_is_escaped() {
        let mut tree = ViewTree::with_text("div", "a < b & c");
        let root = tree.root();
        let leaf = tree.children(root)[0];
        tree.wrap(leaf, Element::new("mark").with_attr("title", "say \"hi\""));
        assert_eq!(
            tree.to_html(root),
            "<div><mark title=\"say &quot;hi&quot;\">a &lt; b &amp; c</mark></div>"
        );
    }
}
