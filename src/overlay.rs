//! Diff overlay.
//!
//! The authoritative code is never written. Amendments produce sparse
//! [`DiffRecord`]s instead: one record per touched node, carrying only the
//! fields that changed.
//!
//! Two layers:
//!
//! - [`OverlayView`] is what appliers read and write during one walk: the
//!   authoritative node with this walk's earlier edits laid over it, plus the
//!   nodes the walk inserted. Each record it hands out holds the cumulative
//!   field value, so a second edit to the same node builds on the first.
//! - [`DiffOverlay`] is the shared, append-only store the records end up in,
//!   partitioned by version.
//!
//! ## Reading the store
//!
//! Records are never rewritten. [`DiffOverlay::materialize`] folds a
//! version's records in append order, last write per field wins, which is
//! the same as the composed result of every edit.

use crate::error::ApplyError;
use crate::tree::CodeLookup;
use crate::{ContentNode, NodeId, VersionId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Field-level override of one node in one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRecord {
    pub target_node_id: NodeId,
    pub version_id: VersionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_label: Option<String>,
}

impl DiffRecord {
    fn new(target_node_id: NodeId, version_id: VersionId) -> Self {
        DiffRecord { target_node_id, version_id, heading: None, body_text: None, display_label: None }
    }

    pub fn is_empty(&self) -> bool {
        self.heading.is_none() && self.body_text.is_none() && self.display_label.is_none()
    }

    /// Lay `later` over `self`; populated fields of `later` win.
    pub fn merge(&mut self, later: &DiffRecord) {
        if later.heading.is_some() {
            self.heading.clone_from(&later.heading);
        }
        if later.body_text.is_some() {
            self.body_text.clone_from(&later.body_text);
        }
        if later.display_label.is_some() {
            self.display_label.clone_from(&later.display_label);
        }
    }

    /// Apply to a node. An empty string blanks the field.
    pub fn apply_to(&self, node: &mut ContentNode) {
        let set = |field: &mut Option<String>, value: &Option<String>| {
            if let Some(v) = value {
                *field = if v.is_empty() { None } else { Some(v.clone()) };
            }
        };
        set(&mut node.heading, &self.heading);
        set(&mut node.body_text, &self.body_text);
        set(&mut node.display_label, &self.display_label);
    }
}

/// One walk's view of the code: authoritative tree plus the walk's edits.
pub struct OverlayView<'a, L: CodeLookup + ?Sized> {
    lookup: &'a L,
    base_version: VersionId,
    version_id: VersionId,
    edits: HashMap<NodeId, ContentNode>,
    struck: HashSet<NodeId>,
    inserted: Vec<NodeId>,
    inserted_children: HashMap<NodeId, Vec<NodeId>>,
    inserted_paths: HashMap<String, Vec<NodeId>>,
    next_id: u64,
}

impl<'a, L: CodeLookup + ?Sized> OverlayView<'a, L> {
    pub fn new(lookup: &'a L, base_version: VersionId, version_id: VersionId) -> Self {
        OverlayView {
            lookup,
            base_version,
            version_id,
            edits: HashMap::new(),
            struck: HashSet::new(),
            inserted: Vec::new(),
            inserted_children: HashMap::new(),
            inserted_paths: HashMap::new(),
            next_id: lookup.next_node_id().0,
        }
    }

    pub fn version_id(&self) -> VersionId {
        self.version_id
    }

    /// Current state of `id`.
    pub fn node(&self, id: NodeId) -> Option<ContentNode> {
        self.edits.get(&id).or_else(|| self.lookup.node(id)).cloned()
    }

    pub fn is_struck(&self, id: NodeId) -> bool {
        self.struck.contains(&id)
    }

    /// The single live node at `path`. Struck nodes do not count; nodes
    /// inserted earlier in the walk do.
    pub fn find(&self, path: &str) -> Result<ContentNode, ApplyError> {
        let mut ids: Vec<NodeId> =
            self.lookup.find_by_citation_path(path, self.base_version).into_iter().map(|n| n.id).collect();
        ids.extend(self.inserted_paths.get(path).into_iter().flatten().copied());
        ids.retain(|id| !self.struck.contains(id));

        match ids.as_slice() {
            [id] => self.node(*id).ok_or_else(|| ApplyError::TargetMissing { path: path.to_string() }),
            [] => Err(ApplyError::TargetMissing { path: path.to_string() }),
            _ => Err(ApplyError::TargetAmbiguous { path: path.to_string(), count: ids.len() }),
        }
    }

    /// Children of `id` in sibling order, struck ones included.
    pub fn children(&self, id: NodeId) -> Vec<ContentNode> {
        let mut ids: Vec<NodeId> = self.lookup.children(id).into_iter().map(|n| n.id).collect();
        ids.extend(self.inserted_children.get(&id).into_iter().flatten().copied());
        let mut nodes: Vec<ContentNode> = ids.into_iter().filter_map(|id| self.node(id)).collect();
        nodes.sort_by_key(|n| n.order);
        nodes
    }

    /// Pre-order descendants of `id`, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<ContentNode> {
        let mut out = Vec::new();
        let mut stack: Vec<ContentNode> = self.children(id).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(self.children(node.id).into_iter().rev());
            out.push(node);
        }
        out
    }

    pub fn allocate_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Store the new state of an existing node. Returns the record of the
    /// fields that changed, or `None` when nothing did.
    pub fn write(&mut self, updated: ContentNode) -> Option<DiffRecord> {
        let current = self.node(updated.id)?;
        let mut diff = DiffRecord::new(updated.id, self.version_id);
        if current.heading != updated.heading {
            diff.heading = Some(updated.heading.clone().unwrap_or_default());
        }
        if current.body_text != updated.body_text {
            diff.body_text = Some(updated.body_text.clone().unwrap_or_default());
        }
        if current.display_label != updated.display_label {
            diff.display_label = Some(updated.display_label.clone().unwrap_or_default());
        }
        if diff.is_empty() {
            return None;
        }
        self.edits.insert(updated.id, updated);
        Some(diff)
    }

    /// Blank every text field of `id`.
    pub fn strike(&mut self, id: NodeId) -> Option<DiffRecord> {
        let mut node = self.node(id)?;
        self.struck.insert(id);
        let was_blank = node.heading.is_none() && node.body_text.is_none() && node.display_label.is_none();
        node.heading = None;
        node.body_text = None;
        node.display_label = None;
        self.edits.insert(id, node);
        (!was_blank).then(|| DiffRecord {
            heading: Some(String::new()),
            body_text: Some(String::new()),
            display_label: Some(String::new()),
            ..DiffRecord::new(id, self.version_id)
        })
    }

    /// Add a node created by this walk. Returns its full-field audit record.
    pub fn insert(&mut self, mut node: ContentNode) -> DiffRecord {
        node.version_id = self.version_id;
        if let Some(parent) = node.parent_id {
            self.inserted_children.entry(parent).or_default().push(node.id);
        }
        self.inserted_paths.entry(node.citation_path.clone()).or_default().push(node.id);
        self.inserted.push(node.id);

        let diff = DiffRecord {
            heading: node.heading.clone(),
            body_text: node.body_text.clone(),
            display_label: node.display_label.clone(),
            ..DiffRecord::new(node.id, self.version_id)
        };
        self.edits.insert(node.id, node);
        diff
    }

    /// Inserted nodes in creation order, in their final state.
    pub fn finish(self) -> Vec<ContentNode> {
        let OverlayView { inserted, mut edits, .. } = self;
        inserted.into_iter().filter_map(|id| edits.remove(&id)).collect()
    }
}

type Partition = Arc<Mutex<Vec<DiffRecord>>>;

/// Shared append-only store of diff records, one partition per version.
///
/// Finding a partition takes a short read lock on the map; appends then lock
/// only that partition, so bills writing different versions never contend.
#[derive(Debug, Default)]
pub struct DiffOverlay {
    partitions: RwLock<HashMap<VersionId, Partition>>,
}

impl DiffOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    fn partition(&self, version_id: VersionId) -> Partition {
        if let Some(p) = self.partitions.read().unwrap_or_else(PoisonError::into_inner).get(&version_id) {
            return Arc::clone(p);
        }
        let mut map = self.partitions.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(version_id).or_default())
    }

    /// Append records, keeping their order within each version.
    pub fn append(&self, records: impl IntoIterator<Item = DiffRecord>) {
        let mut grouped: BTreeMap<VersionId, Vec<DiffRecord>> = BTreeMap::new();
        for record in records {
            grouped.entry(record.version_id).or_default().push(record);
        }
        for (version_id, records) in grouped {
            let partition = self.partition(version_id);
            partition.lock().unwrap_or_else(PoisonError::into_inner).extend(records);
        }
    }

    pub fn records(&self, version_id: VersionId) -> Vec<DiffRecord> {
        let map = self.partitions.read().unwrap_or_else(PoisonError::into_inner);
        match map.get(&version_id) {
            Some(p) => p.lock().unwrap_or_else(PoisonError::into_inner).clone(),
            None => Vec::new(),
        }
    }

    pub fn versions(&self) -> Vec<VersionId> {
        let mut versions: Vec<VersionId> =
            self.partitions.read().unwrap_or_else(PoisonError::into_inner).keys().copied().collect();
        versions.sort();
        versions
    }

    /// Fold a version's records per node, in append order.
    pub fn materialize(&self, version_id: VersionId) -> BTreeMap<NodeId, DiffRecord> {
        let mut folded: BTreeMap<NodeId, DiffRecord> = BTreeMap::new();
        for record in self.records(version_id) {
            folded
                .entry(record.target_node_id)
                .and_modify(|acc| acc.merge(&record))
                .or_insert_with(|| record.clone());
        }
        folded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NodeKind, NodeSpec, TreeBuilder};

    fn code() -> (crate::ContentTree, NodeId) {
        let mut b = TreeBuilder::new(VersionId(1), "/us/usc");
        let t = b.add(None, NodeSpec::new(NodeKind::Title).label("5"));
        let s = b.add(Some(t), NodeSpec::new(NodeKind::Section).label("101").heading("Departments"));
        let a = b.add(Some(s), NodeSpec::new(NodeKind::Subsection).label("(a)").body("one two"));
        (b.build(), a)
    }

    #[test]
    fn edits_compose_through_the_view() {
        let (tree, a) = code();
        let mut view = OverlayView::new(&tree, VersionId(1), VersionId(2));

        let mut node = view.find("/us/usc/t5/s101/a").unwrap();
        node.body_text = Some("one three".into());
        let first = view.write(node).unwrap();

        let mut node = view.find("/us/usc/t5/s101/a").unwrap();
        assert_eq!(node.body(), "one three");
        node.body_text = Some("four three".into());
        let second = view.write(node).unwrap();
        assert_eq!(second.body_text.as_deref(), Some("four three"));
        assert!(second.heading.is_none());

        let unchanged = view.find("/us/usc/t5/s101/a").unwrap();
        assert!(view.write(unchanged).is_none());

        let store = DiffOverlay::new();
        store.append([first, second]);
        let folded = store.materialize(VersionId(2));
        assert_eq!(folded[&a].body_text.as_deref(), Some("four three"));
        assert_eq!(store.records(VersionId(2)).len(), 2);
        assert!(store.records(VersionId(1)).is_empty());
    }

    #[test]
    fn struck_nodes_are_not_found_but_inserted_ones_are() {
        let (tree, a) = code();
        let mut view = OverlayView::new(&tree, VersionId(1), VersionId(2));
        let diff = view.strike(a).unwrap();
        assert_eq!(diff.body_text.as_deref(), Some(""));
        assert!(view.strike(a).is_none());
        assert!(matches!(view.find("/us/usc/t5/s101/a"), Err(ApplyError::TargetMissing { .. })));

        let mut fresh = tree.get(a).unwrap().clone();
        fresh.id = view.allocate_id();
        fresh.order += 1;
        view.insert(fresh.clone());
        assert_eq!(view.find("/us/usc/t5/s101/a").unwrap().id, fresh.id);
        assert_eq!(fresh.id, NodeId(4));

        let inserted = view.finish();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].version_id, VersionId(2));
    }

    #[test]
    fn materialized_blanks_clear_fields() {
        let (tree, a) = code();
        let mut node = tree.get(a).unwrap().clone();
        let record = DiffRecord { body_text: Some(String::new()), ..DiffRecord::new(a, VersionId(2)) };
        record.apply_to(&mut node);
        assert_eq!(node.body_text, None);
        assert_eq!(node.display_label.as_deref(), Some("(a)"));
    }
}
