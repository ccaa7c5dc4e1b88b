//! Content trees.
//!
//! Both the bill being parsed and the authoritative code are represented the
//! same way: an arena of [`ContentNode`]s addressed by [`NodeId`], with parent
//! and ordered-children links plus an index from `citation_path` to nodes.
//!
//! ```text
//! nodes:    [ t5, s101, a, 1, b ]          (arena slots)
//! children: t5 -> [s101], s101 -> [a, b], a -> [1]
//! by_path:  "/us/usc/t5/s101/a" -> [slot 2]
//! ```
//!
//! ## Invariants
//!
//! - A node's `citation_path` is its parent's path plus one segment.
//! - Siblings have unique `order` values; children lists are kept sorted.
//! - Every node in a tree carries the tree's `version_id`.
//!
//! Trees arriving from the outside go through [`ContentTree::from_records`],
//! which checks the structural invariants. [`TreeBuilder`] is the in-process
//! way to assemble one and derives paths and orders itself.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

/// Gap between the `order` values the builder hands to consecutive siblings.
///
/// Leaves room for nodes inserted by amendments to slot in between existing
/// siblings without renumbering the immutable authoritative tree.
pub const ORDER_STRIDE: u64 = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(pub u64);

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Title,
    Subtitle,
    Chapter,
    Subchapter,
    Part,
    Section,
    Subsection,
    Paragraph,
    Subparagraph,
    Clause,
    Subclause,
    Item,
    Subitem,
    QuotedBlock,
    Text,
    #[serde(other)]
    Other,
}

impl NodeKind {
    /// Short tag used when a node has no label to derive a path segment from.
    fn slug(self) -> &'static str {
        match self {
            NodeKind::Title => "t",
            NodeKind::Subtitle => "st",
            NodeKind::Chapter => "ch",
            NodeKind::Subchapter => "sch",
            NodeKind::Part => "pt",
            NodeKind::Section => "s",
            NodeKind::Subsection => "ss",
            NodeKind::Paragraph => "p",
            NodeKind::Subparagraph => "sp",
            NodeKind::Clause => "cl",
            NodeKind::Subclause => "scl",
            NodeKind::Item => "i",
            NodeKind::Subitem => "si",
            NodeKind::QuotedBlock => "qb",
            NodeKind::Text => "tx",
            NodeKind::Other => "n",
        }
    }

    /// Levels whose path segment carries a kind prefix (`t5`, `s101`).
    fn prefixed(self) -> bool {
        matches!(self, NodeKind::Title | NodeKind::Section | NodeKind::Chapter | NodeKind::Subchapter | NodeKind::Part)
    }
}

/// One node of a bill or code tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentNode {
    pub id: NodeId,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    pub order: u64,
    pub kind: NodeKind,
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub body_text: Option<String>,
    #[serde(default)]
    pub display_label: Option<String>,
    pub citation_path: String,
    pub version_id: VersionId,
}

impl ContentNode {
    pub fn body(&self) -> &str {
        self.body_text.as_deref().unwrap_or("")
    }
}

/// Serialized form of a tree: the ordered forest handed over by ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeRecords {
    pub version_id: VersionId,
    pub nodes: Vec<ContentNode>,
}

/// Turn a display label into a path segment.
///
/// `"(b)"` -> `"b"`, `"SEC. 5."` -> `"s5"` for a section, `"§ 1395w-4."` ->
/// `"s1395w-4"`. Returns `None` when nothing usable is left.
pub fn label_segment(kind: NodeKind, label: &str) -> Option<String> {
    let lowered = label.trim().to_ascii_lowercase();
    let mut rest = label.trim();
    for prefix in ["section", "sec.", "sec", "title", "§§", "§"] {
        if lowered.starts_with(prefix) {
            rest = &rest[prefix.len()..];
            break;
        }
    }
    let core: String = rest.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '-').collect();
    let core = core.trim_matches('-');
    if core.is_empty() {
        return None;
    }
    if kind.prefixed() { Some(format!("{}{}", kind.slug(), core)) } else { Some(core.to_string()) }
}

/// Path segment for a node: derived from its label, or from its kind and
/// sibling position when the label yields nothing.
pub fn path_segment(kind: NodeKind, label: Option<&str>, position: u64) -> String {
    label.and_then(|l| label_segment(kind, l)).unwrap_or_else(|| format!("{}{}", kind.slug(), position))
}

/// Arena-backed content tree for a single version.
#[derive(Debug, Clone)]
pub struct ContentTree {
    version_id: VersionId,
    nodes: Vec<ContentNode>,
    slots: HashMap<NodeId, usize>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    by_path: HashMap<String, Vec<usize>>,
}

impl ContentTree {
    /// Validate and index an ordered forest of records.
    pub fn from_records(records: TreeRecords) -> Result<Self> {
        let TreeRecords { version_id, nodes } = records;

        let mut ids = HashSet::new();
        for node in &nodes {
            if !ids.insert(node.id) {
                return Err(Error::InvalidTree(format!("duplicate node id {}", node.id)));
            }
            if node.version_id != version_id {
                return Err(Error::InvalidTree(format!(
                    "node {} belongs to {}, tree is {}",
                    node.id, node.version_id, version_id
                )));
            }
        }
        for node in &nodes {
            if let Some(parent) = node.parent_id {
                if !ids.contains(&parent) {
                    return Err(Error::InvalidTree(format!("node {} has unknown parent {}", node.id, parent)));
                }
            }
        }

        let tree = Self::index(version_id, nodes);

        for list in tree.children.iter().chain(std::iter::once(&tree.roots)) {
            for pair in list.windows(2) {
                if tree.nodes[pair[0]].order == tree.nodes[pair[1]].order {
                    return Err(Error::InvalidTree(format!(
                        "siblings {} and {} share order {}",
                        tree.nodes[pair[0]].id, tree.nodes[pair[1]].id, tree.nodes[pair[0]].order
                    )));
                }
            }
        }

        // Anything not reachable from a root sits on a parent cycle.
        let reachable = tree.roots.iter().map(|&r| 1 + tree.descendant_slots(r).len()).sum::<usize>();
        if reachable != tree.nodes.len() {
            return Err(Error::InvalidTree("parent links form a cycle".to_string()));
        }

        Ok(tree)
    }

    /// Parse and validate the JSON interchange form (`{"version_id", "nodes"}`).
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_records(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Build indexes without validation. Callers guarantee the invariants.
    fn index(version_id: VersionId, nodes: Vec<ContentNode>) -> Self {
        let slots: HashMap<NodeId, usize> = nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
        let mut children = vec![Vec::new(); nodes.len()];
        let mut roots = Vec::new();
        let mut by_path: HashMap<String, Vec<usize>> = HashMap::new();

        for (slot, node) in nodes.iter().enumerate() {
            match node.parent_id.and_then(|p| slots.get(&p)) {
                Some(&parent) => children[parent].push(slot),
                None => roots.push(slot),
            }
            by_path.entry(node.citation_path.clone()).or_default().push(slot);
        }
        for list in children.iter_mut().chain(std::iter::once(&mut roots)) {
            list.sort_by_key(|&s| nodes[s].order);
        }

        ContentTree { version_id, nodes, slots, children, roots, by_path }
    }

    pub fn version_id(&self) -> VersionId {
        self.version_id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&ContentNode> {
        self.slots.get(&id).map(|&s| &self.nodes[s])
    }

    pub fn roots(&self) -> impl Iterator<Item = &ContentNode> {
        self.roots.iter().map(|&s| &self.nodes[s])
    }

    pub fn child_nodes(&self, id: NodeId) -> impl Iterator<Item = &ContentNode> {
        let list = self.slots.get(&id).map(|&s| self.children[s].as_slice()).unwrap_or(&[]);
        list.iter().map(|&s| &self.nodes[s])
    }

    pub fn nodes_at(&self, path: &str) -> Vec<&ContentNode> {
        self.by_path.get(path).map(|slots| slots.iter().map(|&s| &self.nodes[s]).collect()).unwrap_or_default()
    }

    pub fn records(&self) -> TreeRecords {
        TreeRecords { version_id: self.version_id, nodes: self.nodes.clone() }
    }

    /// Pre-order descendant slots of `slot`, excluding `slot` itself.
    fn descendant_slots(&self, slot: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.children[slot].iter().rev().copied().collect();
        while let Some(s) = stack.pop() {
            out.push(s);
            stack.extend(self.children[s].iter().rev());
        }
        out
    }
}

/// Read access to the authoritative code, as the engine needs it.
///
/// Implementations must be safe to share between bills processed in parallel;
/// the engine never writes through this trait.
pub trait CodeLookup {
    /// All nodes of `base_version` whose `citation_path` equals `path`.
    fn find_by_citation_path(&self, path: &str, base_version: VersionId) -> Vec<&ContentNode>;

    /// Every descendant of `id`, pre-order, excluding `id`.
    fn find_descendants(&self, id: NodeId) -> Vec<&ContentNode>;

    /// Direct children of `id` in sibling order.
    fn children(&self, id: NodeId) -> Vec<&ContentNode>;

    fn node(&self, id: NodeId) -> Option<&ContentNode>;

    /// First id not used by any existing node; inserted nodes count up from here.
    fn next_node_id(&self) -> NodeId;
}

impl CodeLookup for ContentTree {
    fn find_by_citation_path(&self, path: &str, base_version: VersionId) -> Vec<&ContentNode> {
        if base_version != self.version_id {
            return Vec::new();
        }
        self.nodes_at(path)
    }

    fn find_descendants(&self, id: NodeId) -> Vec<&ContentNode> {
        match self.slots.get(&id) {
            Some(&slot) => self.descendant_slots(slot).into_iter().map(|s| &self.nodes[s]).collect(),
            None => Vec::new(),
        }
    }

    fn children(&self, id: NodeId) -> Vec<&ContentNode> {
        self.child_nodes(id).collect()
    }

    fn node(&self, id: NodeId) -> Option<&ContentNode> {
        self.get(id)
    }

    fn next_node_id(&self) -> NodeId {
        NodeId(self.nodes.iter().map(|n| n.id.0 + 1).max().unwrap_or(0))
    }
}

/// Fields for a node added through [`TreeBuilder::add`].
#[derive(Debug, Clone)]
pub struct NodeSpec {
    kind: NodeKind,
    label: Option<String>,
    heading: Option<String>,
    body: Option<String>,
}

impl NodeSpec {
    pub fn new(kind: NodeKind) -> Self {
        NodeSpec { kind, label: None, heading: None, body: None }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn heading(mut self, heading: &str) -> Self {
        self.heading = Some(heading.to_string());
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }
}

/// Incremental tree assembly with derived paths and strided orders.
///
/// ```text
/// TreeBuilder::new(v1, "/us/usc")
///   add(None,      Title   "5")    -> /us/usc/t5
///   add(Some(t5),  Section "101")  -> /us/usc/t5/s101
///   add(Some(s101), Subsection "(a)") -> /us/usc/t5/s101/a
/// ```
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    version_id: VersionId,
    root_path: String,
    next_id: u64,
    nodes: Vec<ContentNode>,
    child_counts: HashMap<Option<NodeId>, u64>,
}

impl TreeBuilder {
    pub fn new(version_id: VersionId, root_path: &str) -> Self {
        TreeBuilder {
            version_id,
            root_path: root_path.trim_end_matches('/').to_string(),
            next_id: 1,
            nodes: Vec::new(),
            child_counts: HashMap::new(),
        }
    }

    /// Start ids at `first` (keeps ids of several trees disjoint in fixtures).
    pub fn starting_at(mut self, first: u64) -> Self {
        self.next_id = first;
        self
    }

    pub fn add(&mut self, parent: Option<NodeId>, spec: NodeSpec) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;

        let position = self.child_counts.entry(parent).or_insert(0);
        let order = *position * ORDER_STRIDE;
        *position += 1;

        let parent_path = parent
            .and_then(|p| self.nodes.iter().find(|n| n.id == p))
            .map(|n| n.citation_path.clone())
            .unwrap_or_else(|| self.root_path.clone());
        let segment = path_segment(spec.kind, spec.label.as_deref(), order / ORDER_STRIDE);

        self.nodes.push(ContentNode {
            id,
            parent_id: parent,
            order,
            kind: spec.kind,
            heading: spec.heading,
            body_text: spec.body,
            display_label: spec.label,
            citation_path: format!("{parent_path}/{segment}"),
            version_id: self.version_id,
        });
        id
    }

    pub fn build(self) -> ContentTree {
        ContentTree::index(self.version_id, self.nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (ContentTree, NodeId, NodeId) {
        let mut b = TreeBuilder::new(VersionId(1), "/us/usc");
        let t5 = b.add(None, NodeSpec::new(NodeKind::Title).label("5"));
        let s101 = b.add(Some(t5), NodeSpec::new(NodeKind::Section).label("§ 101.").heading("Executive departments"));
        let a = b.add(Some(s101), NodeSpec::new(NodeKind::Subsection).label("(a)").body("The Attorney General"));
        b.add(Some(a), NodeSpec::new(NodeKind::Paragraph).label("(1)").body("shall report"));
        b.add(Some(s101), NodeSpec::new(NodeKind::Subsection).label("(b)").body("Other"));
        (b.build(), s101, a)
    }

    #[test]
    fn builder_derives_paths_from_labels() {
        let (tree, _, _) = sample();
        assert_eq!(tree.nodes_at("/us/usc/t5/s101/a/1").len(), 1);
        assert_eq!(tree.nodes_at("/us/usc/t5/s101/b")[0].body(), "Other");
        assert!(tree.nodes_at("/us/usc/t5/s101/c").is_empty());
    }

    #[test]
    fn descendants_are_preorder_and_exclude_self() {
        let (tree, s101, a) = sample();
        let paths: Vec<&str> = tree.find_descendants(s101).iter().map(|n| n.citation_path.as_str()).collect();
        assert_eq!(paths, vec!["/us/usc/t5/s101/a", "/us/usc/t5/s101/a/1", "/us/usc/t5/s101/b"]);
        assert_eq!(tree.find_descendants(a).len(), 1);
    }

    #[test]
    fn lookup_respects_base_version() {
        let (tree, _, _) = sample();
        assert_eq!(tree.find_by_citation_path("/us/usc/t5/s101", VersionId(1)).len(), 1);
        assert!(tree.find_by_citation_path("/us/usc/t5/s101", VersionId(2)).is_empty());
        assert_eq!(tree.next_node_id(), NodeId(6));
    }

    #[test]
    fn label_segments() {
        assert_eq!(label_segment(NodeKind::Subsection, "(b)").as_deref(), Some("b"));
        assert_eq!(label_segment(NodeKind::Section, "SEC. 5.").as_deref(), Some("s5"));
        assert_eq!(label_segment(NodeKind::Section, "§ 1395w-4.").as_deref(), Some("s1395w-4"));
        assert_eq!(label_segment(NodeKind::Paragraph, "()"), None);
    }

    #[test]
    fn from_records_rejects_broken_forests() {
        let (tree, _, _) = sample();
        let mut records = tree.records();
        records.nodes[1].parent_id = Some(NodeId(99));
        assert!(matches!(ContentTree::from_records(records), Err(Error::InvalidTree(_))));

        let mut records = tree.records();
        records.nodes[4].order = records.nodes[2].order;
        assert!(matches!(ContentTree::from_records(records), Err(Error::InvalidTree(_))));

        let mut records = tree.records();
        records.nodes[0].parent_id = Some(NodeId(4));
        assert!(matches!(ContentTree::from_records(records), Err(Error::InvalidTree(_))));

        assert!(ContentTree::from_records(tree.records()).is_ok());
    }

    #[test]
    fn json_interchange() {
        let (tree, _, a) = sample();
        let json = serde_json::to_string(&tree.records()).unwrap();
        let back = ContentTree::from_json(&json).unwrap();
        assert_eq!(back.len(), tree.len());
        assert_eq!(back.get(a), tree.get(a));

        assert!(matches!(ContentTree::from_json("{\"version_id\": 1}"), Err(Error::Json(_))));
    }
}
