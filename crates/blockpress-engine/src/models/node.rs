use super::attrs::{AttrValue, Attrs};
use super::inline::{Inline, plain_text};

/// Every block type the editor knows about.
///
/// The set is closed: behavior is attached to a type through the schema
/// registry and the controller dispatch, never by string lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeType {
    Paragraph,
    Heading,
    CodeBlock,
    Image,
    Gallery,
    Alert,
    Embed,
    Promo,
}

impl NodeType {
    pub const ALL: &'static [NodeType] = &[
        NodeType::Paragraph,
        NodeType::Heading,
        NodeType::CodeBlock,
        NodeType::Image,
        NodeType::Gallery,
        NodeType::Alert,
        NodeType::Embed,
        NodeType::Promo,
    ];

    /// Stable type name, as used by the editor's JSON model.
    pub fn name(self) -> &'static str {
        match self {
            NodeType::Paragraph => "paragraph",
            NodeType::Heading => "heading",
            NodeType::CodeBlock => "codeBlock",
            NodeType::Image => "image",
            NodeType::Gallery => "imageGallery",
            NodeType::Alert => "alert",
            NodeType::Embed => "codeEmbed",
            NodeType::Promo => "promoBlock",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single block of structured content.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeType,
    pub attrs: Attrs,
    /// Inline content for container types; always empty for atomic types.
    pub content: Vec<Inline>,
}

impl Node {
    pub fn new(kind: NodeType) -> Self {
        Self {
            kind,
            attrs: Attrs::new(),
            content: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &'static str, value: impl Into<AttrValue>) -> Self {
        self.attrs.set(name, value);
        self
    }

    pub fn with_content(mut self, content: Vec<Inline>) -> Self {
        self.content = content;
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_content(vec![Inline::text(text)])
    }

    pub fn plain_text(&self) -> String {
        plain_text(&self.content)
    }
}

/// Transient identity of a block within one loaded document.
///
/// Ids survive inserts, removals and moves of other blocks, so controllers
/// and their UI flags can address a block without tracking indices. They are
/// never serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u64);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "block-{}", self.0)
    }
}

/// The ordered sequence of top-level nodes making up one post.
#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<Node>,
    ids: Vec<BlockId>,
    next_id: u64,
}

/// Documents compare by content only; block ids are session-local.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let mut doc = Self::new();
        for node in nodes {
            doc.push(node);
        }
        doc
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &Node)> {
        self.ids.iter().copied().zip(self.nodes.iter())
    }

    pub fn ids(&self) -> &[BlockId] {
        &self.ids
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn id_at(&self, index: usize) -> Option<BlockId> {
        self.ids.get(index).copied()
    }

    pub fn index_of(&self, id: BlockId) -> Option<usize> {
        self.ids.iter().position(|candidate| *candidate == id)
    }

    pub fn node(&self, id: BlockId) -> Option<&Node> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    pub(crate) fn node_mut(&mut self, id: BlockId) -> Option<&mut Node> {
        let index = self.index_of(id)?;
        self.nodes.get_mut(index)
    }

    pub fn push(&mut self, node: Node) -> BlockId {
        let id = self.allocate_id();
        self.nodes.push(node);
        self.ids.push(id);
        id
    }

    /// Inserts at `index`, clamped to the end of the document.
    pub(crate) fn insert(&mut self, index: usize, node: Node) -> BlockId {
        let index = index.min(self.nodes.len());
        let id = self.allocate_id();
        self.nodes.insert(index, node);
        self.ids.insert(index, id);
        id
    }

    pub(crate) fn remove(&mut self, id: BlockId) -> Option<Node> {
        let index = self.index_of(id)?;
        self.ids.remove(index);
        Some(self.nodes.remove(index))
    }

    /// Moves a block so that it ends up at `to` (clamped).
    pub(crate) fn move_block(&mut self, id: BlockId, to: usize) -> bool {
        let Some(from) = self.index_of(id) else {
            return false;
        };
        let to = to.min(self.nodes.len() - 1);
        if from == to {
            return false;
        }
        let node = self.nodes.remove(from);
        let id = self.ids.remove(from);
        self.nodes.insert(to, node);
        self.ids.insert(to, id);
        true
    }

    /// Replaces the whole content, issuing fresh ids.
    pub(crate) fn replace_all(&mut self, nodes: Vec<Node>) {
        self.nodes.clear();
        self.ids.clear();
        for node in nodes {
            self.push(node);
        }
    }

    fn allocate_id(&mut self) -> BlockId {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(text: &str) -> Node {
        Node::new(NodeType::Paragraph).with_text(text)
    }

    #[test]
    fn test_ids_survive_structural_edits() {
        let mut doc = Document::from_nodes(vec![para("a"), para("b"), para("c")]);
        let b = doc.id_at(1).unwrap();

        let inserted = doc.insert(0, para("z"));
        assert_eq!(doc.index_of(b), Some(2));
        assert_eq!(doc.index_of(inserted), Some(0));

        doc.remove(inserted);
        assert_eq!(doc.index_of(b), Some(1));
        assert_eq!(doc.node(b).unwrap().plain_text(), "b");
    }

    #[test]
    fn test_move_block_clamps_target() {
        let mut doc = Document::from_nodes(vec![para("a"), para("b"), para("c")]);
        let a = doc.id_at(0).unwrap();

        assert!(doc.move_block(a, 99));
        let texts: Vec<_> = doc.nodes().iter().map(Node::plain_text).collect();
        assert_eq!(texts, vec!["b", "c", "a"]);
        assert!(!doc.move_block(a, 2));
    }

    #[test]
    fn test_equality_ignores_ids() {
        let mut left = Document::from_nodes(vec![para("x")]);
        left.insert(0, para("y"));
        let right = Document::from_nodes(vec![para("y"), para("x")]);
        assert_eq!(left, right);
    }

    #[test]
    fn test_replace_all_issues_fresh_ids() {
        let mut doc = Document::from_nodes(vec![para("old")]);
        let old = doc.id_at(0).unwrap();
        doc.replace_all(vec![para("new")]);
        assert_eq!(doc.index_of(old), None);
        assert_eq!(doc.len(), 1);
    }
}
