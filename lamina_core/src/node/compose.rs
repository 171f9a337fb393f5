// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The composed tree: literal topology with shadow roots and slots applied.
//!
//! A host with a shadow root has exactly one composed child, the shadow root.
//! Its light children are reparented, in order, under the host's *assigned
//! slot*: the first [`Slot`](NodeKind::Slot) in a pre-order walk of the shadow
//! tree. While the host has light children they replace the slot's own
//! (fallback) children. Light children of a host without a slot are not part
//! of the composed tree.
//!
//! Every composed child list is a literal sibling list (or the single shadow
//! root), so iteration always follows `next_sibling`.

use alloc::vec::Vec;
use core::cmp::Ordering;

use super::id::{Dimension, INVALID, NodeId, NodeKind};
use super::store::{SceneTree, Topology};
use super::walk::Children;

impl Topology {
    /// The host whose shadow tree literally contains `idx`, or `INVALID`.
    pub(crate) fn shadow_tree_host(&self, idx: u32) -> u32 {
        let mut cur = idx;
        loop {
            let host = self.host[cur as usize];
            if host != INVALID {
                return host;
            }
            cur = self.parent[cur as usize];
            if cur == INVALID {
                return INVALID;
            }
        }
    }

    /// The slot the light children of `host` render through, or `INVALID`.
    pub(crate) fn assigned_slot(&self, host: u32) -> u32 {
        let root = self.shadow_root[host as usize];
        if root == INVALID {
            return INVALID;
        }
        let mut cur = self.first_child[root as usize];
        while cur != INVALID {
            if self.kind[cur as usize] == NodeKind::Slot {
                return cur;
            }
            if self.first_child[cur as usize] != INVALID {
                cur = self.first_child[cur as usize];
                continue;
            }
            while self.next_sibling[cur as usize] == INVALID {
                cur = self.parent[cur as usize];
                if cur == root || cur == INVALID {
                    return INVALID;
                }
            }
            cur = self.next_sibling[cur as usize];
        }
        INVALID
    }

    /// The host a slot is assigned to, when its light children replace the
    /// slot's fallback.
    fn filled_slot_host(&self, slot: u32) -> u32 {
        if self.kind[slot as usize] != NodeKind::Slot {
            return INVALID;
        }
        let host = self.shadow_tree_host(slot);
        if host != INVALID
            && self.first_child[host as usize] != INVALID
            && self.assigned_slot(host) == slot
        {
            host
        } else {
            INVALID
        }
    }

    pub(crate) fn first_composed_child(&self, idx: u32) -> u32 {
        let root = self.shadow_root[idx as usize];
        if root != INVALID {
            return root;
        }
        let host = self.filled_slot_host(idx);
        if host != INVALID {
            return self.first_child[host as usize];
        }
        self.first_child[idx as usize]
    }

    pub(crate) fn composed_parent(&self, idx: u32) -> u32 {
        let host = self.host[idx as usize];
        if host != INVALID {
            return host;
        }
        let p = self.parent[idx as usize];
        if p == INVALID {
            return INVALID;
        }
        if self.shadow_root[p as usize] != INVALID {
            // A light child: rendered through the slot, if there is one.
            return self.assigned_slot(p);
        }
        if self.filled_slot_host(p) != INVALID {
            // Fallback content displaced by light children.
            return INVALID;
        }
        p
    }

    /// Returns `true` if `ancestor` is a strict composed ancestor of `idx`.
    pub(crate) fn is_composed_ancestor(&self, ancestor: u32, idx: u32) -> bool {
        let mut cur = self.composed_parent(idx);
        while cur != INVALID {
            if cur == ancestor {
                return true;
            }
            cur = self.composed_parent(cur);
        }
        false
    }

    pub(crate) fn composed_depth(&self, idx: u32) -> u32 {
        let mut depth = 0;
        let mut cur = self.composed_parent(idx);
        while cur != INVALID {
            depth += 1;
            cur = self.composed_parent(cur);
        }
        depth
    }

    /// A key whose lexicographic order is composed pre-order.
    ///
    /// The first element is the composed root; each following element is the
    /// position of the next node on the path among its composed siblings.
    pub(crate) fn tree_order_key(&self, idx: u32) -> Vec<u32> {
        let mut key = Vec::new();
        let mut cur = idx;
        loop {
            let p = self.composed_parent(cur);
            if p == INVALID {
                key.push(cur);
                break;
            }
            let mut position = 0;
            if self.host[cur as usize] == INVALID {
                let mut prev = self.prev_sibling[cur as usize];
                while prev != INVALID {
                    position += 1;
                    prev = self.prev_sibling[prev as usize];
                }
            }
            key.push(position);
            cur = p;
        }
        key.reverse();
        key
    }

    /// The nearest renderable at or above `idx` in the composed tree.
    pub(crate) fn nearest_renderable(&self, idx: u32) -> u32 {
        let mut cur = idx;
        while cur != INVALID && !self.kind[cur as usize].is_renderable() {
            cur = self.composed_parent(cur);
        }
        cur
    }

    /// The viewport whose render context places `idx`: the nearest composed
    /// viewport strictly above it.
    pub(crate) fn context_of(&self, idx: u32) -> u32 {
        let mut cur = self.composed_parent(idx);
        while cur != INVALID && self.kind[cur as usize] != NodeKind::Viewport {
            cur = self.composed_parent(cur);
        }
        cur
    }

    /// The buffers a renderable draws into: those of the nearest scene at or
    /// above it, stopping at its context's viewport.
    pub(crate) fn dimension_of(&self, idx: u32) -> Dimension {
        let mut cur = if self.kind[idx as usize] == NodeKind::Viewport {
            self.composed_parent(idx)
        } else {
            idx
        };
        while cur != INVALID {
            let kind = self.kind[cur as usize];
            if let Some(dimension) = Dimension::of_scene(kind) {
                return dimension;
            }
            if kind == NodeKind::Viewport {
                break;
            }
            cur = self.composed_parent(cur);
        }
        Dimension::Flat
    }

    /// Returns `true` if `idx` is `root` or a composed descendant of it with
    /// no hidden node in between.
    ///
    /// The visibility of `idx` itself is not considered: a hidden node still
    /// occupies its slot.
    pub(crate) fn is_rendered(&self, idx: u32, root: u32) -> bool {
        if idx == root {
            return true;
        }
        let mut cur = self.composed_parent(idx);
        while cur != INVALID {
            if cur == root {
                return true;
            }
            if !self.visible[cur as usize] {
                return false;
            }
            cur = self.composed_parent(cur);
        }
        false
    }
}

impl<C2, C3> SceneTree<C2, C3> {
    /// Returns the parent of a node in the composed tree.
    ///
    /// For a shadow root this is its host. For a light child it is the host's
    /// assigned slot. `None` for roots and for nodes the composition drops.
    #[must_use]
    pub fn composed_parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        self.opt(self.topo.composed_parent(id.idx))
    }

    /// Returns an iterator over the children of a node in the composed tree.
    #[must_use]
    pub fn composed_children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(&self.topo, self.topo.first_composed_child(id.idx))
    }

    /// Returns the slot that receives the light children of `host`.
    #[must_use]
    pub fn assigned_slot(&self, host: NodeId) -> Option<NodeId> {
        self.validate(host);
        self.opt(self.topo.assigned_slot(host.idx))
    }

    /// Returns the number of composed ancestors of a node.
    #[must_use]
    pub fn composed_depth(&self, id: NodeId) -> u32 {
        self.validate(id);
        self.topo.composed_depth(id.idx)
    }

    /// Returns `true` if `ancestor` is a strict composed ancestor of `id`.
    #[must_use]
    pub fn is_composed_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.validate(ancestor);
        self.validate(id);
        self.topo.is_composed_ancestor(ancestor.idx, id.idx)
    }

    /// Orders two nodes by composed pre-order.
    ///
    /// An ancestor sorts before its descendants.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale or the nodes have no common composed
    /// ancestor.
    #[must_use]
    pub fn compare_tree_order(&self, a: NodeId, b: NodeId) -> Ordering {
        self.validate(a);
        self.validate(b);
        if a == b {
            return Ordering::Equal;
        }
        let ka = self.topo.tree_order_key(a.idx);
        let kb = self.topo.tree_order_key(b.idx);
        assert!(ka[0] == kb[0], "nodes have no common ancestor");
        ka.cmp(&kb)
    }
}
