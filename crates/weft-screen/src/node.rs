#![forbid(unsafe_code)]

//! Node arena.
//!
//! Nodes live in a slot vector addressed by [`NodeId`]. Each node stores its
//! parent id and an ordered child list; the order of that list is the paint
//! order (later children are drawn over earlier ones), so raising or lowering
//! a node just moves it within its parent's list.
//!
//! Ids carry a generation, so an id kept after its node was removed is
//! reported as stale instead of silently aliasing a new node.

use std::fmt;
use std::sync::Arc;

use weft_layout::{PositionSpec, ResolvedBox};

use crate::error::{ScreenError, StructuralReason};
use crate::style::NodeStyle;

/// Handle to a node in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

bitflags::bitflags! {
    /// Per-node switches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u8 {
        /// Not painted, not hit-testable, children skipped.
        const HIDDEN  = 0b0000_0001;
        /// Skip the background fill (overlays).
        const NO_FILL = 0b0000_0010;
        /// Size every axis without a declared size from content.
        const SHRINK  = 0b0000_0100;
        /// Dock borders even when the screen does not.
        const DOCKED  = 0b0000_1000;
        /// Inside a scrollable parent, stay put when the parent scrolls.
        const FIXED   = 0b0001_0000;
    }
}

/// What a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeKind {
    /// A plain box with optional content.
    #[default]
    Box,
    /// A box whose content and children scroll.
    ScrollableBox {
        /// First visible content line.
        base: usize,
    },
}

impl NodeKind {
    pub const fn scrollable() -> Self {
        Self::ScrollableBox { base: 0 }
    }

    /// Rows the content is shifted up by.
    #[inline]
    pub const fn scroll_base(&self) -> usize {
        match self {
            Self::Box => 0,
            Self::ScrollableBox { base } => *base,
        }
    }
}

/// One node of the tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub spec: PositionSpec,
    pub style: Arc<NodeStyle>,
    pub flags: NodeFlags,
    /// Content, one entry per line.
    pub lines: Vec<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    last_box: Option<ResolvedBox>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            spec: PositionSpec::new(),
            style: NodeStyle::shared_default(),
            flags: NodeFlags::empty(),
            lines: Vec::new(),
            parent: None,
            children: Vec::new(),
            last_box: None,
        }
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Box from the last successful render pass, if the node was laid out.
    #[inline]
    pub fn last_box(&self) -> Option<&ResolvedBox> {
        self.last_box.as_ref()
    }

    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.flags.contains(NodeFlags::HIDDEN)
    }

    /// Content joined back into one string.
    pub fn content(&self) -> String {
        self.lines.join("\n")
    }

    pub fn set_content(&mut self, text: &str) {
        self.lines = text.split('\n').map(str::to_string).collect();
        if text.is_empty() {
            self.lines.clear();
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena of nodes with a fixed root.
#[derive(Debug, Clone)]
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// A tree holding only the root node.
    pub fn new() -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        };
        tree.root = tree.create(NodeKind::Box);
        tree
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, the root included.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create a detached node.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let node = Some(Node::new(kind));
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.node = node;
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node,
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node, ScreenError> {
        self.get(id)
            .ok_or(ScreenError::structural(id, StructuralReason::StaleId))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, ScreenError> {
        self.get_mut(id)
            .ok_or(ScreenError::structural(id, StructuralReason::StaleId))
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Children in paint order. Empty for stale ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[][..], Node::children)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.parent(n);
        }
        false
    }

    /// Whether the node hangs off the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(id) && self.is_ancestor(self.root, id)
    }

    /// Attach `child` as the topmost child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), ScreenError> {
        let end = self.children(parent).len();
        self.insert(parent, child, end)
    }

    /// Attach `child` at `index` in `parent`'s child list (clamped). A child
    /// attached elsewhere is moved.
    pub fn insert(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<(), ScreenError> {
        self.node(parent)?;
        self.node(child)?;
        if child == self.root {
            return Err(ScreenError::structural(child, StructuralReason::Root));
        }
        if self.is_ancestor(child, parent) {
            return Err(ScreenError::structural(child, StructuralReason::Cycle));
        }
        self.unlink(child);
        let siblings = &mut self.node_mut(parent)?.children;
        let index = index.min(siblings.len());
        siblings.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Remove `id` from its parent; the subtree stays alive.
    pub fn detach(&mut self, id: NodeId) -> Result<(), ScreenError> {
        self.node(id)?;
        if id == self.root {
            return Err(ScreenError::structural(id, StructuralReason::Root));
        }
        self.unlink(id);
        self.clear_boxes(id);
        Ok(())
    }

    /// Destroy `id` and its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<(), ScreenError> {
        self.detach(id)?;
        for n in self.subtree(id) {
            let slot = &mut self.slots[n.index()];
            slot.node = None;
            self.free.push(n.index);
        }
        Ok(())
    }

    /// Move `id` to the top of its siblings.
    pub fn raise(&mut self, id: NodeId) -> Result<(), ScreenError> {
        self.set_index(id, usize::MAX)
    }

    /// Move `id` to the bottom of its siblings.
    pub fn lower(&mut self, id: NodeId) -> Result<(), ScreenError> {
        self.set_index(id, 0)
    }

    /// Move `id` to position `index` among its siblings (clamped).
    pub fn set_index(&mut self, id: NodeId, index: usize) -> Result<(), ScreenError> {
        let parent = self
            .node(id)?
            .parent
            .ok_or(ScreenError::structural(id, StructuralReason::Detached))?;
        let siblings = &mut self.node_mut(parent)?.children;
        siblings.retain(|&c| c != id);
        let index = index.min(siblings.len());
        siblings.insert(index, id);
        Ok(())
    }

    /// `id` and its descendants in paint order (pre-order).
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let Some(node) = self.get(n) else { continue };
            out.push(n);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    fn unlink(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = None;
        }
    }

    pub(crate) fn clear_boxes(&mut self, id: NodeId) {
        for n in self.subtree(id) {
            if let Some(node) = self.get_mut(n) {
                node.last_box = None;
            }
        }
    }

    /// Replace every cached box with the results of one pass.
    pub(crate) fn commit_boxes(&mut self, boxes: &[(NodeId, ResolvedBox)]) {
        for slot in &mut self.slots {
            if let Some(node) = slot.node.as_mut() {
                node.last_box = None;
            }
        }
        for &(id, resolved) in boxes {
            if let Some(node) = self.get_mut(id) {
                node.last_box = Some(resolved);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with(n: usize) -> (Tree, Vec<NodeId>) {
        let mut tree = Tree::new();
        let root = tree.root();
        let ids: Vec<_> = (0..n)
            .map(|_| {
                let id = tree.create(NodeKind::Box);
                tree.append(root, id).expect("attach");
                id
            })
            .collect();
        (tree, ids)
    }

    #[test]
    fn append_orders_children() {
        let (tree, ids) = tree_with(3);
        assert_eq!(tree.children(tree.root()), ids.as_slice());
        assert!(ids.iter().all(|&id| tree.is_attached(id)));
    }

    #[test]
    fn raise_lower_and_set_index() {
        let (mut tree, ids) = tree_with(3);
        let root = tree.root();
        tree.raise(ids[0]).expect("raise");
        assert_eq!(tree.children(root), &[ids[1], ids[2], ids[0]]);
        tree.lower(ids[0]).expect("lower");
        assert_eq!(tree.children(root), &[ids[0], ids[1], ids[2]]);
        tree.set_index(ids[2], 1).expect("move");
        assert_eq!(tree.children(root), &[ids[0], ids[2], ids[1]]);
    }

    #[test]
    fn cycles_are_rejected() {
        let (mut tree, ids) = tree_with(1);
        let child = tree.create(NodeKind::Box);
        tree.append(ids[0], child).expect("attach");
        let err = tree.append(child, ids[0]).expect_err("cycle");
        assert!(matches!(
            err,
            ScreenError::Structural {
                reason: StructuralReason::Cycle,
                ..
            }
        ));
        let root = tree.root();
        assert!(tree.append(ids[0], root).is_err());
    }

    #[test]
    fn remove_frees_subtree_and_stales_ids() {
        let (mut tree, ids) = tree_with(1);
        let child = tree.create(NodeKind::Box);
        tree.append(ids[0], child).expect("attach");
        let before = tree.len();
        tree.remove(ids[0]).expect("remove");
        assert_eq!(tree.len(), before - 2);
        assert!(tree.get(ids[0]).is_none());
        assert!(tree.get(child).is_none());

        let reused = tree.create(NodeKind::Box);
        assert!(reused != ids[0] && reused != child);
        assert!(tree.get(ids[0]).is_none());
        assert!(matches!(
            tree.detach(child),
            Err(ScreenError::Structural {
                reason: StructuralReason::StaleId,
                ..
            })
        ));
    }

    #[test]
    fn detached_nodes_are_not_attached() {
        let (mut tree, ids) = tree_with(2);
        tree.detach(ids[1]).expect("detach");
        assert!(!tree.is_attached(ids[1]));
        assert!(tree.contains(ids[1]));
        assert!(tree.set_index(ids[1], 0).is_err());
        let root = tree.root();
        assert!(tree.remove(root).is_err());
    }

    #[test]
    fn content_lines() {
        let mut tree = Tree::new();
        let id = tree.create(NodeKind::Box);
        let node = tree.get_mut(id).expect("live");
        node.set_content("a\nb");
        assert_eq!(node.lines, vec!["a", "b"]);
        node.set_content("");
        assert!(node.lines.is_empty());
    }
}
