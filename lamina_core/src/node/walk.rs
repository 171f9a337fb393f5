// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use alloc::vec::Vec;

use super::id::{INVALID, NodeId};
use super::store::Topology;

/// An iterator over a sibling list, either literal or composed.
///
/// Created by [`SceneTree::children`](super::SceneTree::children) and
/// [`SceneTree::composed_children`](super::SceneTree::composed_children).
#[derive(Debug)]
pub struct Children<'a> {
    topo: &'a Topology,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(topo: &'a Topology, first: u32) -> Self {
        Self {
            topo,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.topo.next_sibling[idx as usize];
        Some(self.topo.id(idx))
    }
}

/// Whether a [`Walk`] step enters or leaves a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Visit {
    /// The node is reached before any of its composed descendants.
    Enter,
    /// All of the node's composed descendants have been visited (or skipped).
    Leave,
}

#[derive(Clone, Copy, Debug)]
struct Frame {
    node: u32,
    next: u32,
}

/// A composed pre-order traversal yielding an [`Enter`](Visit::Enter) and a
/// [`Leave`](Visit::Leave) step for every node.
///
/// Call [`skip_subtree`](Self::skip_subtree) right after receiving an `Enter`
/// step to jump straight to that node's `Leave` step.
///
/// Created by [`SceneTree::walk`](super::SceneTree::walk).
#[derive(Debug)]
pub struct Walk<'a> {
    topo: &'a Topology,
    root: u32,
    stack: Vec<Frame>,
    started: bool,
    skip: bool,
}

impl<'a> Walk<'a> {
    pub(crate) fn new(topo: &'a Topology, root: u32) -> Self {
        Self {
            topo,
            root,
            stack: Vec::new(),
            started: false,
            skip: false,
        }
    }

    /// Skips the children of the node that was just entered.
    ///
    /// Only meaningful immediately after an [`Enter`](Visit::Enter) step.
    #[inline]
    pub fn skip_subtree(&mut self) {
        self.skip = true;
    }
}

impl Iterator for Walk<'_> {
    type Item = (NodeId, Visit);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            if self.root == INVALID {
                return None;
            }
            self.stack.push(Frame {
                node: self.root,
                next: self.topo.first_composed_child(self.root),
            });
            return Some((self.topo.id(self.root), Visit::Enter));
        }

        if self.skip {
            self.skip = false;
            let frame = self.stack.pop()?;
            return Some((self.topo.id(frame.node), Visit::Leave));
        }

        let top = self.stack.last_mut()?;
        if top.next == INVALID {
            let frame = self.stack.pop()?;
            return Some((self.topo.id(frame.node), Visit::Leave));
        }
        let child = top.next;
        top.next = self.topo.next_sibling[child as usize];
        self.stack.push(Frame {
            node: child,
            next: self.topo.first_composed_child(child),
        });
        Some((self.topo.id(child), Visit::Enter))
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;
    use crate::node::{NodeKind, SceneTree};

    type Tree = SceneTree<(), ()>;

    fn enters(tree: &Tree, root: NodeId) -> Vec<NodeId> {
        tree.walk(root)
            .filter(|(_, v)| *v == Visit::Enter)
            .map(|(id, _)| id)
            .collect()
    }

    #[test]
    fn enter_and_leave_are_balanced() {
        let mut tree = Tree::new();
        let a = tree.create_node(NodeKind::Visual);
        let b = tree.create_node(NodeKind::Visual);
        let c = tree.create_node(NodeKind::Visual);
        tree.append_child(a, b);
        tree.append_child(b, c);

        let steps: Vec<_> = tree.walk(a).collect();
        assert_eq!(
            steps,
            vec![
                (a, Visit::Enter),
                (b, Visit::Enter),
                (c, Visit::Enter),
                (c, Visit::Leave),
                (b, Visit::Leave),
                (a, Visit::Leave),
            ]
        );
    }

    #[test]
    fn pre_order_over_siblings() {
        let mut tree = Tree::new();
        let root = tree.create_node(NodeKind::Group);
        let a = tree.create_node(NodeKind::Visual);
        let b = tree.create_node(NodeKind::Visual);
        let a1 = tree.create_node(NodeKind::Visual);
        tree.append_child(root, a);
        tree.append_child(root, b);
        tree.append_child(a, a1);

        assert_eq!(enters(&tree, root), vec![root, a, a1, b]);
    }

    #[test]
    fn skip_subtree_jumps_to_leave() {
        let mut tree = Tree::new();
        let root = tree.create_node(NodeKind::Group);
        let a = tree.create_node(NodeKind::Visual);
        let a1 = tree.create_node(NodeKind::Visual);
        let b = tree.create_node(NodeKind::Visual);
        tree.append_child(root, a);
        tree.append_child(a, a1);
        tree.append_child(root, b);

        let mut walk = tree.walk(root);
        let mut seen = Vec::new();
        while let Some((id, visit)) = walk.next() {
            if visit == Visit::Enter && id == a {
                walk.skip_subtree();
            }
            seen.push((id, visit));
        }
        assert_eq!(
            seen,
            vec![
                (root, Visit::Enter),
                (a, Visit::Enter),
                (a, Visit::Leave),
                (b, Visit::Enter),
                (b, Visit::Leave),
                (root, Visit::Leave),
            ]
        );
    }

    #[test]
    fn shadow_root_replaces_children() {
        let mut tree = Tree::new();
        let host = tree.create_node(NodeKind::Visual);
        let light = tree.create_node(NodeKind::Visual);
        let shadow = tree.create_node(NodeKind::Group);
        let inner = tree.create_node(NodeKind::Visual);
        tree.append_child(host, light);
        tree.append_child(shadow, inner);
        tree.attach_shadow(host, shadow);

        // No slot: light children are not part of the composed tree.
        assert_eq!(enters(&tree, host), vec![host, shadow, inner]);
    }

    #[test]
    fn slot_renders_light_children() {
        let mut tree = Tree::new();
        let host = tree.create_node(NodeKind::Visual);
        let light_a = tree.create_node(NodeKind::Visual);
        let light_b = tree.create_node(NodeKind::Visual);
        let shadow = tree.create_node(NodeKind::Group);
        let before = tree.create_node(NodeKind::Visual);
        let slot = tree.create_node(NodeKind::Slot);
        let fallback = tree.create_node(NodeKind::Visual);
        let after = tree.create_node(NodeKind::Visual);
        tree.append_child(host, light_a);
        tree.append_child(host, light_b);
        tree.append_child(shadow, before);
        tree.append_child(shadow, slot);
        tree.append_child(slot, fallback);
        tree.append_child(shadow, after);
        tree.attach_shadow(host, shadow);

        assert_eq!(
            enters(&tree, host),
            vec![host, shadow, before, slot, light_a, light_b, after]
        );

        // With the light children gone the slot's fallback shows instead.
        tree.remove_child(host, light_a);
        tree.remove_child(host, light_b);
        assert_eq!(
            enters(&tree, host),
            vec![host, shadow, before, slot, fallback, after]
        );
    }

    #[test]
    fn empty_walk_for_leaf() {
        let mut tree = Tree::new();
        let leaf = tree.create_node(NodeKind::Visual);
        let steps: Vec<_> = tree.walk(leaf).collect();
        assert_eq!(steps, vec![(leaf, Visit::Enter), (leaf, Visit::Leave)]);
    }
}
