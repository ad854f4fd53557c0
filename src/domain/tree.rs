//! Arena-backed editable EAOG tree.
//!
//! Children are owned by their parent through the arena; the parent link is a plain index kept
//! in agreement with the parent's children list. Subtrees that are removed, freshly built or
//! grafted stay in the same arena with no parent until they are inserted again or discarded.
//! They are not part of the document reachable from [`EaogTree::root`].

use std::collections::HashSet;
use std::fmt;

use generational_arena::{Arena, Index};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::domain::brief::normalize_brief;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::naming::{check_name, unique_name, PATH_SEPARATOR};
use crate::domain::schema::{validate, NodeData, NodeRecord, ValidationErrors};

/// Stable handle of a node inside one [`EaogTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Index);

/// Where [`EaogTree::insert`] places the new node relative to `this`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Before,
    After,
    /// Last child of `this`
    Child,
    /// New node takes the slot of `this`, which becomes its last child
    Parent,
}

/// Splice side relative to an anchor child in [`EaogTree::add_child`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorPosition {
    Before,
    #[default]
    After,
}

/// Tree node stored in the arena.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl TreeNode {
    fn new(data: NodeData, parent: Option<NodeId>) -> Self {
        Self {
            data,
            parent,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// One editable EAOG document.
#[derive(Debug)]
pub struct EaogTree {
    arena: Arena<TreeNode>,
    root: NodeId,
}

impl EaogTree {
    /// Single-node tree.
    pub fn new(data: NodeData) -> Self {
        let mut arena = Arena::new();
        let root = NodeId(arena.insert(TreeNode::new(data, None)));
        Self { arena, root }
    }

    /// Build a tree from validated data.
    pub fn from_record(record: NodeRecord) -> Self {
        let mut arena = Arena::new();
        let root = Self::build(&mut arena, record, None);
        Self { arena, root }
    }

    /// Validate canonical JSON and build a tree from it.
    pub fn from_value(value: &Value) -> Result<Self, ValidationErrors> {
        Ok(Self::from_record(validate(value)?))
    }

    /// Import JSON, normalizing brief form first when `accept_brief` is set.
    pub fn import(value: &Value, accept_brief: bool) -> Result<Self, ValidationErrors> {
        if accept_brief {
            Self::from_value(&normalize_brief(value.clone()))
        } else {
            Self::from_value(value)
        }
    }

    fn build(arena: &mut Arena<TreeNode>, record: NodeRecord, parent: Option<NodeId>) -> NodeId {
        let NodeRecord { data, children } = record;
        let id = NodeId(arena.insert(TreeNode::new(data, parent)));
        for child in children {
            let child_id = Self::build(arena, child, Some(id));
            if let Some(node) = arena.get_mut(id.0) {
                node.children.push(child_id);
            }
        }
        id
    }

    /// Build a detached subtree inside this arena.
    pub fn build_detached(&mut self, record: &NodeRecord) -> NodeId {
        Self::build(&mut self.arena, record.clone(), None)
    }

    /// Create a detached single node.
    pub fn add_node(&mut self, data: NodeData) -> DomainResult<NodeId> {
        check_name(&data.name).map_err(|violation| DomainError::InvalidName {
            name: data.name.clone(),
            violation,
        })?;
        Ok(NodeId(self.arena.insert(TreeNode::new(data, None))))
    }

    // ============================================================
    // Queries
    // ============================================================

    #[instrument(level = "trace", skip(self))]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.arena.get(id.0)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.get(id).map(|node| &node.data)
    }

    pub(crate) fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.arena.get_mut(id.0).map(|node| &mut node.data)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id.0)
    }

    fn node(&self, id: NodeId) -> DomainResult<&TreeNode> {
        self.arena.get(id.0).ok_or(DomainError::NodeNotFound)
    }

    fn name_of(&self, id: NodeId) -> String {
        self.data(id).map(|d| d.name.clone()).unwrap_or_default()
    }

    #[instrument(level = "trace", skip(self))]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    #[instrument(level = "trace", skip(self))]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?.checked_sub(1)?;
        self.children(parent).get(index).copied()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Topmost ancestor of `id`: the document root, or the top of a detached subtree.
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Whether `id` belongs to the document reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(id) && self.root_of(id) == self.root
    }

    /// Nodes from the top of `id`'s tree down to `id` itself.
    pub fn path_nodes(&self, id: NodeId) -> Vec<NodeId> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut nodes = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            nodes.push(parent);
            current = parent;
        }
        nodes.reverse();
        nodes
    }

    /// Slash-delimited name path from the top of `id`'s tree.
    pub fn path(&self, id: NodeId) -> Option<String> {
        let names: Vec<&str> = self
            .path_nodes(id)
            .into_iter()
            .filter_map(|n| self.data(n))
            .map(|d| d.name.as_str())
            .collect();
        if names.is_empty() {
            return None;
        }
        let separator = PATH_SEPARATOR.to_string();
        Some(names.join(separator.as_str()))
    }

    /// Number of ancestors of `id`; the root has depth 0.
    pub fn depth(&self, id: NodeId) -> usize {
        self.path_nodes(id).len().saturating_sub(1)
    }

    /// Whether `ancestor` is a proper ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Pre-order traversal starting at (and including) `start`.
    #[instrument(level = "trace", skip(self))]
    pub fn traverse(&self, start: NodeId) -> Traverse<'_> {
        Traverse::new(self, start)
    }

    /// All nodes below `id` in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.traverse(id).skip(1).collect()
    }

    /// First node in pre-order below and including `start` matching `predicate`.
    pub fn find<P>(&self, start: NodeId, predicate: P) -> Option<NodeId>
    where
        P: Fn(&NodeData) -> bool,
    {
        self.traverse(start)
            .find(|&id| self.data(id).is_some_and(&predicate))
    }

    /// Number of nodes in the document.
    pub fn len(&self) -> usize {
        self.traverse(self.root).count()
    }

    /// Resolve `path` starting at `this`. The first segment names `this` itself, the following
    /// segments walk named children. Empty segments are ignored.
    pub fn descendant_by_path(&self, this: NodeId, path: &str) -> Option<NodeId> {
        let mut segments = path.split(PATH_SEPARATOR).filter(|s| !s.is_empty());
        let first = segments.next()?;
        if self.data(this)?.name != first {
            return None;
        }
        segments.try_fold(this, |current, segment| {
            self.children(current)
                .iter()
                .copied()
                .find(|&c| self.data(c).is_some_and(|d| d.name == segment))
        })
    }

    /// Resolve `path` from the document root.
    pub fn node_by_path(&self, path: &str) -> Option<NodeId> {
        self.descendant_by_path(self.root, path)
    }

    // ============================================================
    // Structural edits
    // ============================================================

    fn ensure_detached(&self, id: NodeId) -> DomainResult<()> {
        let node = self.node(id)?;
        if node.parent.is_some() || id == self.root {
            return Err(DomainError::NodeAttached(node.data.name.clone()));
        }
        Ok(())
    }

    fn ensure_composite(&self, id: NodeId) -> DomainResult<()> {
        let data = &self.node(id)?.data;
        if data.node_type().is_leaf() {
            return Err(DomainError::NotComposite {
                name: data.name.clone(),
                node_type: data.node_type(),
            });
        }
        Ok(())
    }

    fn ensure_acyclic(&self, new: NodeId, this: NodeId) -> DomainResult<()> {
        if new == this || self.is_ancestor(new, this) {
            return Err(DomainError::WouldCreateCycle(self.name_of(new)));
        }
        Ok(())
    }

    fn sibling_names(&self, parent: NodeId, except: NodeId) -> Vec<String> {
        self.children(parent)
            .iter()
            .filter(|&&c| c != except)
            .filter_map(|&c| self.data(c))
            .map(|d| d.name.clone())
            .collect()
    }

    /// Give `id` a name unique among the children of its parent.
    fn uniquify(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let used = self.sibling_names(parent, id);
        if let Some(data) = self.data_mut(id) {
            let unique = unique_name(&data.name, used.iter().map(String::as_str));
            if unique != data.name {
                debug!("Renamed '{}' to '{}' to keep sibling names unique", data.name, unique);
                data.name = unique;
            }
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, index: usize) {
        if let Some(node) = self.arena.get_mut(parent.0) {
            let index = index.min(node.children.len());
            node.children.insert(index, child);
        }
        if let Some(node) = self.arena.get_mut(child.0) {
            node.parent = Some(parent);
        }
        self.uniquify(child);
    }

    /// Unlink `id` from its parent, returning the former parent and index.
    fn detach(&mut self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        if let Some(node) = self.arena.get_mut(parent.0) {
            node.children.remove(index);
        }
        if let Some(node) = self.arena.get_mut(id.0) {
            node.parent = None;
        }
        Some((parent, index))
    }

    /// Insert the detached node `new` relative to `this`.
    pub fn insert(&mut self, this: NodeId, new: NodeId, position: Position) -> DomainResult<()> {
        self.node(this)?;
        self.ensure_detached(new)?;
        self.ensure_acyclic(new, this)?;

        match position {
            Position::Before | Position::After => {
                let parent = self
                    .parent(this)
                    .ok_or_else(|| DomainError::RootHasNoSiblings(self.name_of(this)))?;
                let index = self.index_in_parent(this).ok_or(DomainError::NodeNotFound)?;
                let index = match position {
                    Position::After => index + 1,
                    _ => index,
                };
                self.attach(parent, new, index);
            }
            Position::Child => {
                self.add_child(this, new, None, AnchorPosition::After)?;
            }
            Position::Parent => {
                self.ensure_composite(new)?;
                match self.detach(this) {
                    Some((parent, index)) => self.attach(parent, new, index),
                    None if this == self.root => self.root = new,
                    None => {}
                }
                let last = self.children(new).len();
                self.attach(new, this, last);
            }
        }

        debug!(
            "Inserted '{}' {:?} '{}'",
            self.name_of(new),
            position,
            self.name_of(this)
        );
        Ok(())
    }

    /// Splice the detached node `child` into `this`'s children, next to `anchor` or at the end.
    pub fn add_child(
        &mut self,
        this: NodeId,
        child: NodeId,
        anchor: Option<NodeId>,
        position: AnchorPosition,
    ) -> DomainResult<()> {
        self.ensure_composite(this)?;
        self.ensure_detached(child)?;
        self.ensure_acyclic(child, this)?;

        let index = match anchor {
            None => self.children(this).len(),
            Some(anchor) => {
                let index = self
                    .children(this)
                    .iter()
                    .position(|&c| c == anchor)
                    .ok_or_else(|| DomainError::AnchorNotFound {
                        parent: self.name_of(this),
                        anchor: self.name_of(anchor),
                    })?;
                match position {
                    AnchorPosition::Before => index,
                    AnchorPosition::After => index + 1,
                }
            }
        };
        self.attach(this, child, index);
        Ok(())
    }

    /// Detach `this` from its parent and return it.
    ///
    /// With `delete_subtree == false` the children of `this` are spliced into the parent at the
    /// vacated index, keeping their order.
    pub fn remove(&mut self, this: NodeId, delete_subtree: bool) -> DomainResult<NodeId> {
        let name = self.node(this)?.data.name.clone();
        let Some((parent, index)) = self.detach(this) else {
            return Err(DomainError::CannotRemoveRoot(name));
        };

        if !delete_subtree {
            let children = self
                .arena
                .get_mut(this.0)
                .map(|node| std::mem::take(&mut node.children))
                .unwrap_or_default();
            for (offset, child) in children.into_iter().enumerate() {
                self.attach(parent, child, index + offset);
            }
        }

        debug!(
            "Removed '{}' from '{}' (delete_subtree={})",
            name,
            self.name_of(parent),
            delete_subtree
        );
        Ok(this)
    }

    /// Put the detached node `new` where `this` was.
    ///
    /// The new node goes after the former previous sibling, else before the former next
    /// sibling, else becomes the only child of the former parent. Replacing the root makes
    /// `new` the root. `this` is left detached.
    pub fn replace_with(&mut self, this: NodeId, new: NodeId) -> DomainResult<()> {
        self.node(this)?;
        self.ensure_detached(new)?;
        self.ensure_acyclic(new, this)?;

        let Some(parent) = self.parent(this) else {
            if this == self.root {
                debug!("Replaced root '{}' with '{}'", self.name_of(this), self.name_of(new));
                self.root = new;
            }
            return Ok(());
        };

        let previous = self.previous_sibling(this);
        let next = self.next_sibling(this);
        self.remove(this, true)?;
        match (previous, next) {
            (Some(previous), _) => self.insert(previous, new, Position::After),
            (None, Some(next)) => self.insert(next, new, Position::Before),
            (None, None) => self.insert(parent, new, Position::Child),
        }
    }

    /// Replace `this` with a fresh `empty` placeholder and return the placeholder.
    pub fn replace_with_placeholder(&mut self, this: NodeId) -> DomainResult<NodeId> {
        let name = self.node(this)?.data.name.clone();
        let placeholder = self.add_node(NodeData::placeholder(&name))?;
        if let Err(e) = self.replace_with(this, placeholder) {
            self.discard(placeholder)?;
            return Err(e);
        }
        Ok(placeholder)
    }

    /// Flatten `this` into its parent when both are sequential composites.
    pub fn shrink_sequential_parent(&mut self, this: NodeId) -> bool {
        let Some(parent) = self.parent(this) else {
            return false;
        };
        let sequential = |id| self.data(id).is_some_and(|d| d.node_type().is_sequential());
        if !sequential(this) || !sequential(parent) {
            return false;
        }
        match self.remove(this, false) {
            Ok(removed) => {
                self.free(removed);
                true
            }
            Err(_) => false,
        }
    }

    /// Move `source` relative to `target`. All preconditions are checked before mutating.
    pub fn move_to(&mut self, source: NodeId, target: NodeId, position: Position) -> DomainResult<()> {
        self.node(target)?;
        let source_name = self.node(source)?.data.name.clone();
        if source == target {
            return Err(DomainError::SelfDrop(source_name));
        }
        if self.is_ancestor(source, target) {
            return Err(DomainError::WouldCreateCycle(source_name));
        }
        if source == self.root {
            return Err(DomainError::CannotRemoveRoot(source_name));
        }
        match position {
            Position::Before | Position::After if self.parent(target).is_none() => {
                return Err(DomainError::RootHasNoSiblings(self.name_of(target)));
            }
            Position::Child => self.ensure_composite(target)?,
            Position::Parent => self.ensure_composite(source)?,
            _ => {}
        }

        if self.parent(source).is_some() {
            self.remove(source, true)?;
        }
        self.insert(target, source, position)
    }

    /// Drop a detached subtree from the arena.
    pub fn discard(&mut self, id: NodeId) -> DomainResult<()> {
        self.ensure_detached(id)?;
        self.free(id);
        Ok(())
    }

    /// Free every node not reachable from the root. Returns how many nodes were dropped.
    pub fn prune_detached(&mut self) -> usize {
        let reachable: HashSet<Index> = self.traverse(self.root).map(|id| id.0).collect();
        let doomed: Vec<Index> = self
            .arena
            .iter()
            .map(|(index, _)| index)
            .filter(|index| !reachable.contains(index))
            .collect();
        for index in &doomed {
            self.arena.remove(*index);
        }
        if !doomed.is_empty() {
            debug!("Pruned {} detached nodes", doomed.len());
        }
        doomed.len()
    }

    /// Number of nodes held in the arena, detached subtrees included.
    pub fn arena_len(&self) -> usize {
        self.arena.len()
    }

    fn free(&mut self, id: NodeId) {
        let doomed: Vec<NodeId> = self.traverse(id).collect();
        for node in doomed {
            self.arena.remove(node.0);
        }
    }

    /// Rename a node; the name is re-uniquified among its siblings. Returns the final name.
    pub fn rename(&mut self, id: NodeId, name: &str) -> DomainResult<String> {
        self.node(id)?;
        check_name(name).map_err(|violation| DomainError::InvalidName {
            name: name.to_string(),
            violation,
        })?;
        Ok(self.relabel(id, name))
    }

    /// Rename without the reserved-name check; used for framework token rendering.
    pub(crate) fn relabel(&mut self, id: NodeId, name: &str) -> String {
        if let Some(data) = self.data_mut(id) {
            data.name = name.to_string();
        }
        self.uniquify(id);
        self.name_of(id)
    }

    /// Replace a node's data from a form edit. Switching between leaf and composite kinds is
    /// rejected since children would have to be invented or dropped.
    pub fn update_data(&mut self, id: NodeId, data: NodeData) -> DomainResult<()> {
        let current = self.node(id)?.data.node_type();
        let next = data.node_type();
        if current.is_leaf() != next.is_leaf() {
            return Err(DomainError::KindChange {
                from: current,
                to: next,
            });
        }
        check_name(&data.name).map_err(|violation| DomainError::InvalidName {
            name: data.name.clone(),
            violation,
        })?;
        if let Some(slot) = self.data_mut(id) {
            *slot = data;
        }
        self.uniquify(id);
        debug!("Updated node '{}'", self.name_of(id));
        Ok(())
    }

    // ============================================================
    // Copy and projection
    // ============================================================

    fn record_of(&self, id: NodeId) -> NodeRecord {
        let node = &self.arena[id.0];
        NodeRecord {
            data: node.data.clone(),
            children: node
                .children
                .iter()
                .filter(|c| self.contains(**c))
                .map(|&c| self.record_of(c))
                .collect(),
        }
    }

    /// Validated-record projection of the subtree at `id`.
    pub fn to_record(&self, id: NodeId) -> DomainResult<NodeRecord> {
        self.node(id)?;
        Ok(self.record_of(id))
    }

    /// Canonical JSON of the subtree at `id`.
    pub fn to_json(&self, id: NodeId) -> DomainResult<Value> {
        Ok(self.to_record(id)?.to_value())
    }

    /// Canonical JSON of the whole document.
    pub fn to_value(&self) -> Value {
        self.record_of(self.root).to_value()
    }

    /// Independent tree holding a copy of the subtree at `id`.
    pub fn clone_subtree(&self, id: NodeId) -> DomainResult<EaogTree> {
        Ok(EaogTree::from_record(self.to_record(id)?))
    }

    /// Independent copy of the document, without detached subtrees.
    pub fn clone_tree(&self) -> EaogTree {
        EaogTree::from_record(self.record_of(self.root))
    }

    /// Deep-copy the document of `other` into this arena as a detached subtree.
    pub fn graft(&mut self, other: &EaogTree) -> NodeId {
        Self::build(&mut self.arena, other.record_of(other.root), None)
    }

    /// Structural equality of two subtrees, possibly in different trees.
    pub fn subtree_eq(&self, a: NodeId, other: &EaogTree, b: NodeId) -> bool {
        match (self.to_json(a), other.to_json(b)) {
            (Ok(left), Ok(right)) => left == right,
            _ => false,
        }
    }
}

impl Clone for EaogTree {
    fn clone(&self) -> Self {
        self.clone_tree()
    }
}

impl PartialEq for EaogTree {
    fn eq(&self, other: &Self) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }
}

impl fmt::Display for EaogTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string_pretty(&self.to_value()).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Pre-order iterator over node ids.
pub struct Traverse<'a> {
    tree: &'a EaogTree,
    stack: Vec<NodeId>,
}

impl<'a> Traverse<'a> {
    fn new(tree: &'a EaogTree, start: NodeId) -> Self {
        let stack = if tree.contains(start) {
            vec![start]
        } else {
            Vec::new()
        };
        Self { tree, stack }
    }
}

impl Iterator for Traverse<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        // Push children in reverse order for left-to-right traversal
        for &child in self.tree.children(current).iter().rev() {
            self.stack.push(child);
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::NodeKind;
    use serde_json::json;

    fn sample() -> EaogTree {
        EaogTree::from_value(&json!({
            "type": "sand",
            "name": "root",
            "children": [
                {"type": "instruction", "name": "a"},
                {"type": "sand", "name": "b", "children": [
                    {"type": "instruction", "name": "b1"},
                    {"type": "instruction", "name": "b2"}
                ]},
                {"type": "instruction", "name": "c"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn given_removed_and_built_subtrees_when_pruning_then_only_document_remains() {
        let mut tree = sample();
        let b = tree.node_by_path("root/b").unwrap();
        tree.remove(b, true).unwrap();
        let loose = instruction(&mut tree, "loose");

        let dropped = tree.prune_detached();

        assert_eq!(dropped, 4);
        assert_eq!(tree.arena_len(), tree.len());
        assert!(!tree.contains(b));
        assert!(!tree.contains(loose));
        assert_eq!(names(&tree, tree.root()), vec!["a", "c"]);
        assert_eq!(tree.prune_detached(), 0);
    }

    fn names(tree: &EaogTree, id: NodeId) -> Vec<String> {
        tree.children(id)
            .iter()
            .map(|&c| tree.data(c).unwrap().name.clone())
            .collect()
    }

    fn instruction(tree: &mut EaogTree, name: &str) -> NodeId {
        tree.add_node(NodeData::new(name, NodeKind::bare(crate::domain::kind::NodeType::Instruction)))
            .unwrap()
    }

    #[test]
    fn given_tree_when_resolving_paths_then_walks_named_children() {
        let tree = sample();
        let b2 = tree.node_by_path("root/b/b2").unwrap();

        assert_eq!(tree.path(b2).unwrap(), "root/b/b2");
        assert_eq!(tree.node_by_path("/root//b/b2/"), Some(b2));
        assert_eq!(tree.node_by_path("b/b2"), None);
        assert_eq!(tree.node_by_path("root/x"), None);
        assert_eq!(tree.depth(b2), 2);
    }

    #[test]
    fn given_sibling_positions_when_inserting_then_places_at_correct_index() {
        let mut tree = sample();
        let b = tree.node_by_path("root/b").unwrap();
        let x = instruction(&mut tree, "x");
        let y = instruction(&mut tree, "y");

        tree.insert(b, x, Position::Before).unwrap();
        tree.insert(b, y, Position::After).unwrap();

        assert_eq!(names(&tree, tree.root()), vec!["a", "x", "b", "y", "c"]);
        assert_eq!(tree.parent(x), Some(tree.root()));
    }

    #[test]
    fn given_root_when_inserting_sibling_then_fails() {
        let mut tree = sample();
        let x = instruction(&mut tree, "x");

        let err = tree.insert(tree.root(), x, Position::Before).unwrap_err();

        assert_eq!(err, DomainError::RootHasNoSiblings("root".to_string()));
    }

    #[test]
    fn given_parent_position_when_inserting_then_new_node_takes_slot() {
        let mut tree = sample();
        let a = tree.node_by_path("root/a").unwrap();
        let wrapper = tree
            .add_node(NodeData::new("wrap", NodeKind::Pand))
            .unwrap();

        tree.insert(a, wrapper, Position::Parent).unwrap();

        assert_eq!(names(&tree, tree.root()), vec!["wrap", "b", "c"]);
        assert_eq!(tree.node_by_path("root/wrap/a"), Some(a));
    }

    #[test]
    fn given_root_when_inserting_parent_then_new_node_becomes_root() {
        let mut tree = sample();
        let old_root = tree.root();
        let wrapper = tree
            .add_node(NodeData::new("outer", NodeKind::Sand))
            .unwrap();

        tree.insert(old_root, wrapper, Position::Parent).unwrap();

        assert_eq!(tree.root(), wrapper);
        assert_eq!(tree.parent(old_root), Some(wrapper));
        assert!(tree.node_by_path("outer/root/b/b1").is_some());
    }

    #[test]
    fn given_leaf_new_node_when_inserting_as_parent_then_fails() {
        let mut tree = sample();
        let a = tree.node_by_path("root/a").unwrap();
        let x = instruction(&mut tree, "x");

        let err = tree.insert(a, x, Position::Parent).unwrap_err();

        assert!(matches!(err, DomainError::NotComposite { .. }));
        assert_eq!(names(&tree, tree.root()), vec!["a", "b", "c"]);
    }

    #[test]
    fn given_attached_node_when_inserting_then_fails() {
        let mut tree = sample();
        let a = tree.node_by_path("root/a").unwrap();
        let c = tree.node_by_path("root/c").unwrap();

        let err = tree.insert(a, c, Position::After).unwrap_err();

        assert_eq!(err, DomainError::NodeAttached("c".to_string()));
    }

    #[test]
    fn given_duplicate_name_when_adding_child_then_suffixes() {
        let mut tree = sample();
        let b = tree.node_by_path("root/b").unwrap();
        let b1 = tree.node_by_path("root/b/b1").unwrap();
        let first = instruction(&mut tree, "b2");
        let second = instruction(&mut tree, "b2");

        tree.add_child(b, first, Some(b1), AnchorPosition::Before).unwrap();
        tree.add_child(b, second, None, AnchorPosition::After).unwrap();

        assert_eq!(names(&tree, b), vec!["b2-0", "b1", "b2", "b2-1"]);
    }

    #[test]
    fn given_foreign_anchor_when_adding_child_then_fails() {
        let mut tree = sample();
        let b = tree.node_by_path("root/b").unwrap();
        let a = tree.node_by_path("root/a").unwrap();
        let x = instruction(&mut tree, "x");

        let err = tree.add_child(b, x, Some(a), AnchorPosition::After).unwrap_err();

        assert!(matches!(err, DomainError::AnchorNotFound { .. }));
    }

    #[test]
    fn given_root_when_removing_then_fails() {
        let mut tree = sample();
        let root = tree.root();

        assert_eq!(
            tree.remove(root, true),
            Err(DomainError::CannotRemoveRoot("root".to_string()))
        );
    }

    #[test]
    fn given_node_when_removing_with_subtree_then_detaches_it() {
        let mut tree = sample();
        let b = tree.node_by_path("root/b").unwrap();

        let removed = tree.remove(b, true).unwrap();

        assert_eq!(names(&tree, tree.root()), vec!["a", "c"]);
        assert_eq!(tree.parent(removed), None);
        assert_eq!(tree.children(removed).len(), 2);
        assert_eq!(tree.len(), 3);
        tree.discard(removed).unwrap();
        assert!(!tree.contains(removed));
    }

    #[test]
    fn given_middle_node_when_replacing_then_takes_same_index() {
        let mut tree = sample();
        let b = tree.node_by_path("root/b").unwrap();
        let x = instruction(&mut tree, "x");

        tree.replace_with(b, x).unwrap();

        assert_eq!(names(&tree, tree.root()), vec!["a", "x", "c"]);
    }

    #[test]
    fn given_only_child_when_replacing_then_falls_back_to_parent() {
        let mut tree = EaogTree::from_value(&json!({
            "type": "sand", "name": "root", "children": [{"type": "empty", "name": "only"}]
        }))
        .unwrap();
        let only = tree.node_by_path("root/only").unwrap();
        let x = instruction(&mut tree, "x");

        tree.replace_with(only, x).unwrap();

        assert_eq!(names(&tree, tree.root()), vec!["x"]);
    }

    #[test]
    fn given_node_when_replacing_with_placeholder_then_placeholder_holds_position() {
        let mut tree = sample();
        let a = tree.node_by_path("root/a").unwrap();

        let placeholder = tree.replace_with_placeholder(a).unwrap();

        let data = tree.data(placeholder).unwrap();
        assert_eq!(data.name, "a-placeholder");
        assert_eq!(data.description.as_deref(), Some("This is a placeholder node"));
        assert_eq!(tree.index_in_parent(placeholder), Some(0));
        assert!(!tree.is_attached(a));
    }

    #[test]
    fn given_descendant_target_when_moving_then_rejects_before_mutating() {
        let mut tree = sample();
        let b = tree.node_by_path("root/b").unwrap();
        let b1 = tree.node_by_path("root/b/b1").unwrap();
        let before = tree.clone_tree();

        assert!(matches!(
            tree.move_to(b, b1, Position::After),
            Err(DomainError::WouldCreateCycle(_))
        ));
        assert!(matches!(
            tree.move_to(b, b, Position::Child),
            Err(DomainError::SelfDrop(_))
        ));
        assert_eq!(tree, before);
    }

    #[test]
    fn given_node_when_moving_into_composite_then_becomes_last_child() {
        let mut tree = sample();
        let a = tree.node_by_path("root/a").unwrap();
        let b = tree.node_by_path("root/b").unwrap();

        tree.move_to(a, b, Position::Child).unwrap();

        assert_eq!(names(&tree, b), vec!["b1", "b2", "a"]);
        assert_eq!(tree.path(a).unwrap(), "root/b/a");
    }

    #[test]
    fn given_sibling_name_when_renaming_then_uniquifies() {
        let mut tree = sample();
        let c = tree.node_by_path("root/c").unwrap();

        assert_eq!(tree.rename(c, "a").unwrap(), "a-0");
        assert!(matches!(
            tree.rename(c, "#x"),
            Err(DomainError::InvalidName { .. })
        ));
    }

    #[test]
    fn given_leaf_when_updating_to_composite_then_rejects_kind_change() {
        let mut tree = sample();
        let a = tree.node_by_path("root/a").unwrap();

        let err = tree
            .update_data(a, NodeData::new("a", NodeKind::Sand))
            .unwrap_err();
        assert!(matches!(err, DomainError::KindChange { .. }));

        tree.update_data(a, NodeData::new("a", NodeKind::End).with_description("stop"))
            .unwrap();
        assert_eq!(tree.data(a).unwrap().description.as_deref(), Some("stop"));
    }

    #[test]
    fn given_other_tree_when_grafting_then_copies_as_detached_subtree() {
        let mut tree = sample();
        let other = sample();

        let grafted = tree.graft(&other);

        assert!(!tree.is_attached(grafted));
        assert!(tree.subtree_eq(grafted, &other, other.root()));
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn given_tree_when_traversing_then_yields_pre_order() {
        let tree = sample();
        let order: Vec<String> = tree
            .traverse(tree.root())
            .map(|id| tree.data(id).unwrap().name.clone())
            .collect();

        assert_eq!(order, vec!["root", "a", "b", "b1", "b2", "c"]);
        let b = tree.node_by_path("root/b").unwrap();
        assert_eq!(tree.descendants(b).len(), 2);
        assert_eq!(
            tree.find(tree.root(), |d| d.name == "b2"),
            tree.node_by_path("root/b/b2")
        );
    }
}
