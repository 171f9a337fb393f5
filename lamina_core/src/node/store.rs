// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, and property management.

use alloc::vec::Vec;

use understory_dirty::{Channel, CycleHandling, DirtyTracker};

use super::id::{Dimension, INVALID, NodeId, NodeKind};
use super::walk::{Children, Walk};
use crate::collect::TreeParts;
use crate::command::Draw;
use crate::dirty;
use crate::range::{CommandRange, ShortRange};

/// Literal and shadow links between nodes.
///
/// Kept apart from [`Placement`] so a traversal can borrow the tree shape while
/// a collector rewrites placements.
#[derive(Debug, Default)]
pub(crate) struct Topology {
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) last_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // A host points at its shadow root and the shadow root back at its host.
    pub(crate) shadow_root: Vec<u32>,
    pub(crate) host: Vec<u32>,

    pub(crate) kind: Vec<NodeKind>,
    pub(crate) visible: Vec<bool>,
    pub(crate) sealed: Vec<bool>,

    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
}

impl Topology {
    /// Builds a handle for a live slot.
    #[inline]
    pub(crate) fn id(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Returns `true` if `id` names the current occupant of its slot.
    #[inline]
    pub(crate) fn is_current(&self, id: NodeId) -> bool {
        id.idx < self.len && self.generation[id.idx as usize] == id.generation
    }

    /// The literal parent, or the host for a shadow root.
    #[inline]
    pub(crate) fn tree_parent(&self, idx: u32) -> u32 {
        let p = self.parent[idx as usize];
        if p != INVALID {
            p
        } else {
            self.host[idx as usize]
        }
    }

    /// Returns `true` if `ancestor` is `idx` or reachable from it through
    /// parent and host links.
    pub(crate) fn is_tree_ancestor_or_self(&self, ancestor: u32, idx: u32) -> bool {
        let mut cur = idx;
        while cur != INVALID {
            if cur == ancestor {
                return true;
            }
            cur = self.tree_parent(cur);
        }
        false
    }

    /// Returns `true` if the literal subtree at `idx` contains a slot.
    pub(crate) fn contains_slot(&self, idx: u32) -> bool {
        if self.kind[idx as usize] == NodeKind::Slot {
            return true;
        }
        let mut cur = self.first_child[idx as usize];
        while cur != INVALID {
            if self.kind[cur as usize] == NodeKind::Slot {
                return true;
            }
            if self.first_child[cur as usize] != INVALID {
                cur = self.first_child[cur as usize];
                continue;
            }
            while self.next_sibling[cur as usize] == INVALID {
                cur = self.parent[cur as usize];
                if cur == idx || cur == INVALID {
                    return false;
                }
            }
            cur = self.next_sibling[cur as usize];
        }
        false
    }
}

/// Where each node sits in its render context, written by collection.
#[derive(Debug, Default)]
pub(crate) struct Placement {
    pub(crate) subtree: Vec<ShortRange>,
    pub(crate) commands: Vec<CommandRange>,
    pub(crate) dimension: Vec<Dimension>,
    // Viewport slot whose context last placed the node, or INVALID.
    pub(crate) owner: Vec<u32>,
    // Collection pass that last wrote the node.
    pub(crate) stamp: Vec<u32>,
}

impl Placement {
    fn push(&mut self) {
        self.subtree.push(ShortRange::EMPTY);
        self.commands.push(CommandRange::default());
        self.dimension.push(Dimension::Flat);
        self.owner.push(INVALID);
        self.stamp.push(0);
    }

    pub(crate) fn reset(&mut self, idx: u32) {
        let i = idx as usize;
        self.subtree[i] = ShortRange::EMPTY;
        self.commands[i] = CommandRange::default();
        self.dimension[i] = Dimension::Flat;
        self.owner[i] = INVALID;
        self.stamp[i] = 0;
    }
}

/// Struct-of-arrays storage for all nodes.
///
/// Nodes are addressed by [`NodeId`] handles. Internally, each node occupies
/// a slot in parallel arrays. Destroyed nodes are recycled via a free list,
/// and generation counters prevent stale handle access.
///
/// `C2` and `C3` are the 2D and 3D command types. The tree stores them but
/// never looks inside; see [`Command`](crate::command::Command).
///
/// Every mutation marks the affected node in one of the [`dirty`] channels.
/// Nothing else happens until a [`SceneGraphCache`](crate::cache::SceneGraphCache)
/// builds.
#[derive(Debug)]
pub struct SceneTree<C2, C3> {
    pub(crate) topo: Topology,
    pub(crate) placement: Placement,
    pub(crate) draw2d: Vec<Draw<C2>>,
    pub(crate) draw3d: Vec<Draw<C3>>,
    pub(crate) dirty: DirtyTracker<u32>,
}

impl<C2, C3> Default for SceneTree<C2, C3> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C2, C3> SceneTree<C2, C3> {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            topo: Topology::default(),
            placement: Placement::default(),
            draw2d: Vec::new(),
            draw3d: Vec::new(),
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
        }
    }

    // -- Allocation API --

    /// Creates a new detached, visible, unsealed node and returns its handle.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let t = &mut self.topo;
        let idx = if let Some(idx) = t.free_list.pop() {
            let i = idx as usize;
            t.parent[i] = INVALID;
            t.first_child[i] = INVALID;
            t.last_child[i] = INVALID;
            t.next_sibling[i] = INVALID;
            t.prev_sibling[i] = INVALID;
            t.shadow_root[i] = INVALID;
            t.host[i] = INVALID;
            t.kind[i] = kind;
            t.visible[i] = true;
            t.sealed[i] = false;
            self.placement.reset(idx);
            self.draw2d[i].clear();
            self.draw3d[i].clear();
            idx
        } else {
            let idx = t.len;
            t.len += 1;
            t.parent.push(INVALID);
            t.first_child.push(INVALID);
            t.last_child.push(INVALID);
            t.next_sibling.push(INVALID);
            t.prev_sibling.push(INVALID);
            t.shadow_root.push(INVALID);
            t.host.push(INVALID);
            t.kind.push(kind);
            t.visible.push(true);
            t.sealed.push(false);
            t.generation.push(0);
            self.placement.push();
            self.draw2d.push(Draw::default());
            self.draw3d.push(Draw::default());
            idx
        };
        self.topo.id(idx)
    }

    /// Destroys a node, freeing its slot for reuse.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, the node is sealed, or the node is still
    /// connected (has a parent, children, a host, or a shadow root).
    pub fn destroy_node(&mut self, id: NodeId) {
        self.validate(id);
        self.assert_unsealed(id.idx);
        let i = id.idx as usize;
        let t = &self.topo;
        assert!(t.first_child[i] == INVALID, "cannot destroy node with children");
        assert!(
            t.parent[i] == INVALID && t.host[i] == INVALID,
            "cannot destroy attached node"
        );
        assert!(
            t.shadow_root[i] == INVALID,
            "cannot destroy node hosting a shadow root"
        );

        self.dirty.remove_key(id.idx);
        self.draw2d[i].clear();
        self.draw3d[i].clear();

        // Bump generation so old handles immediately fail validation.
        self.topo.generation[i] += 1;
        self.topo.free_list.push(id.idx);
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.topo.is_current(id) && !self.topo.free_list.contains(&id.idx)
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale or sealed, if `child` already has a
    /// parent or is a shadow root, or if the edge would create a cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        self.assert_attachable(p, c);

        let t = &mut self.topo;
        let last = t.last_child[p as usize];
        t.parent[c as usize] = p;
        t.prev_sibling[c as usize] = last;
        t.next_sibling[c as usize] = INVALID;
        if last == INVALID {
            t.first_child[p as usize] = c;
        } else {
            t.next_sibling[last as usize] = c;
        }
        t.last_child[p as usize] = c;

        self.mark_structure(p, c);
    }

    /// Inserts `child` before `sibling` in the sibling list.
    ///
    /// `child` must not already have a parent. `sibling` must have a parent.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`append_child`](Self::append_child),
    /// or if `sibling` has no parent.
    pub fn insert_before(&mut self, child: NodeId, sibling: NodeId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        let p = self.topo.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");
        self.assert_attachable(p, c);

        let t = &mut self.topo;
        let prev = t.prev_sibling[s as usize];
        t.parent[c as usize] = p;
        t.next_sibling[c as usize] = s;
        t.prev_sibling[c as usize] = prev;
        if prev != INVALID {
            t.next_sibling[prev as usize] = c;
        } else {
            t.first_child[p as usize] = c;
        }
        t.prev_sibling[s as usize] = c;

        self.mark_structure(p, c);
    }

    /// Detaches `child` from `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale or sealed, or if `child` is not a
    /// child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.topo.parent[c as usize] == p,
            "node is not a child of the given parent"
        );
        self.assert_unsealed(p);
        self.assert_unsealed(c);

        // Mark before unlinking so the host of an enclosing shadow tree is
        // still reachable.
        self.mark_structure(p, c);
        self.unlink_from_parent(c);
    }

    /// Attaches `root` as the shadow root of `host`.
    ///
    /// While attached, `root` replaces the host's light children in the
    /// composed tree; the light children render only through a slot.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale or sealed, `root` is not a
    /// [`Group`](NodeKind::Group), `root` is attached anywhere, `host` already
    /// hosts a shadow root, or the attachment would create a cycle.
    pub fn attach_shadow(&mut self, host: NodeId, root: NodeId) {
        self.validate(host);
        self.validate(root);
        let h = host.idx;
        let r = root.idx;
        self.assert_unsealed(h);
        self.assert_unsealed(r);
        let t = &self.topo;
        assert!(
            t.kind[r as usize] == NodeKind::Group,
            "shadow root must be a group"
        );
        assert!(
            t.parent[r as usize] == INVALID && t.host[r as usize] == INVALID,
            "shadow root is already attached"
        );
        assert!(
            t.shadow_root[h as usize] == INVALID,
            "node already hosts a shadow root"
        );
        assert!(
            !t.is_tree_ancestor_or_self(r, h),
            "cannot attach a node to its own descendant"
        );

        self.topo.shadow_root[h as usize] = r;
        self.topo.host[r as usize] = h;
        self.dirty.mark(h, dirty::SUBTREE);
    }

    /// Detaches and returns the shadow root of `host`, if any.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or sealed.
    pub fn detach_shadow(&mut self, host: NodeId) -> Option<NodeId> {
        self.validate(host);
        self.assert_unsealed(host.idx);
        let h = host.idx;
        let r = self.topo.shadow_root[h as usize];
        if r == INVALID {
            return None;
        }
        self.topo.shadow_root[h as usize] = INVALID;
        self.topo.host[r as usize] = INVALID;
        self.dirty.mark(h, dirty::SUBTREE);
        Some(self.topo.id(r))
    }

    /// Freezes a node: any further mutation of it panics.
    pub fn seal(&mut self, id: NodeId) {
        self.validate(id);
        self.topo.sealed[id.idx as usize] = true;
    }

    // -- Mutation API (auto-marks dirty) --

    /// Shows or hides a node and its composed subtree.
    ///
    /// A hidden renderable keeps its flat-array slot but contributes no
    /// commands and no descendants.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or sealed.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.validate(id);
        self.assert_unsealed(id.idx);
        if self.topo.visible[id.idx as usize] == visible {
            return;
        }
        self.topo.visible[id.idx as usize] = visible;
        self.dirty.mark(id.idx, dirty::SUBTREE);
    }

    /// Replaces a node's 2D commands.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or sealed.
    pub fn set_commands_2d(&mut self, id: NodeId, pre: Vec<C2>, post: Vec<C2>) {
        self.validate(id);
        self.assert_unsealed(id.idx);
        self.draw2d[id.idx as usize] = Draw { pre, post };
        self.dirty.mark(id.idx, dirty::COMMANDS);
    }

    /// Replaces a node's 3D commands.
    ///
    /// 3D collection has no pre/post split, so the commands are emitted
    /// before the node's descendants.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or sealed.
    pub fn set_commands_3d(&mut self, id: NodeId, commands: Vec<C3>) {
        self.validate(id);
        self.assert_unsealed(id.idx);
        self.draw3d[id.idx as usize] = Draw {
            pre: commands,
            post: Vec::new(),
        };
        self.dirty.mark(id.idx, dirty::COMMANDS);
    }

    // -- Property getters (read-only, no dirty marking) --

    /// Returns the kind a node was created with.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.validate(id);
        self.topo.kind[id.idx as usize]
    }

    /// Returns the node's own visibility flag.
    #[must_use]
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.validate(id);
        self.topo.visible[id.idx as usize]
    }

    /// Returns whether the node has been sealed.
    #[must_use]
    pub fn is_sealed(&self, id: NodeId) -> bool {
        self.validate(id);
        self.topo.sealed[id.idx as usize]
    }

    /// Returns the literal parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        self.opt(self.topo.parent[id.idx as usize])
    }

    /// Returns an iterator over the literal children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(&self.topo, self.topo.first_child[id.idx as usize])
    }

    /// Returns the shadow root attached to `host`, if any.
    #[must_use]
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.validate(host);
        self.opt(self.topo.shadow_root[host.idx as usize])
    }

    /// Returns the host a shadow root is attached to, if any.
    #[must_use]
    pub fn shadow_host(&self, root: NodeId) -> Option<NodeId> {
        self.validate(root);
        self.opt(self.topo.host[root.idx as usize])
    }

    /// Returns the node's 2D commands.
    #[must_use]
    pub fn draw_2d(&self, id: NodeId) -> &Draw<C2> {
        self.validate(id);
        &self.draw2d[id.idx as usize]
    }

    /// Returns the node's 3D commands.
    #[must_use]
    pub fn draw_3d(&self, id: NodeId) -> &Draw<C3> {
        self.validate(id);
        &self.draw3d[id.idx as usize]
    }

    /// Returns the node's flat-array span as of the last build.
    ///
    /// Only meaningful for renderables that were placed by a build.
    #[must_use]
    pub fn subtree_range(&self, id: NodeId) -> ShortRange {
        self.validate(id);
        self.placement.subtree[id.idx as usize]
    }

    /// Returns the node's command spans as of the last build.
    #[must_use]
    pub fn command_range(&self, id: NodeId) -> CommandRange {
        self.validate(id);
        self.placement.commands[id.idx as usize]
    }

    /// Returns which buffers the node wrote to in the last build.
    #[must_use]
    pub fn dimension(&self, id: NodeId) -> Dimension {
        self.validate(id);
        self.placement.dimension[id.idx as usize]
    }

    /// Returns a composed pre-order traversal starting at `root`.
    #[must_use]
    pub fn walk(&self, root: NodeId) -> Walk<'_> {
        self.validate(root);
        Walk::new(&self.topo, root.idx)
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(
            self.topo.is_current(id),
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.topo.len {
                self.topo.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    #[inline]
    pub(crate) fn opt(&self, idx: u32) -> Option<NodeId> {
        (idx != INVALID).then(|| self.topo.id(idx))
    }

    fn assert_unsealed(&self, idx: u32) {
        assert!(!self.topo.sealed[idx as usize], "node is sealed");
    }

    fn assert_attachable(&self, p: u32, c: u32) {
        self.assert_unsealed(p);
        self.assert_unsealed(c);
        assert!(p != c, "cannot attach a node to itself");
        let t = &self.topo;
        assert!(
            t.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        assert!(
            t.host[c as usize] == INVALID,
            "shadow root cannot be a child"
        );
        assert!(
            !t.is_tree_ancestor_or_self(c, p),
            "cannot attach a node to its own descendant"
        );
    }

    /// Marks the effects of `c` joining or leaving `p`.
    ///
    /// A slot moving in or out of a shadow tree can change which slot the
    /// host's light children render through, so the host is marked too.
    fn mark_structure(&mut self, p: u32, c: u32) {
        self.dirty.mark(p, dirty::SUBTREE);
        if self.topo.contains_slot(c) {
            let host = self.topo.shadow_tree_host(p);
            if host != INVALID {
                self.dirty.mark(host, dirty::SUBTREE);
            }
        }
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let t = &mut self.topo;
        let p = t.parent[idx as usize];
        let prev = t.prev_sibling[idx as usize];
        let next = t.next_sibling[idx as usize];

        if prev != INVALID {
            t.next_sibling[prev as usize] = next;
        } else {
            t.first_child[p as usize] = next;
        }
        if next != INVALID {
            t.prev_sibling[next as usize] = prev;
        } else {
            t.last_child[p as usize] = prev;
        }

        t.parent[idx as usize] = INVALID;
        t.prev_sibling[idx as usize] = INVALID;
        t.next_sibling[idx as usize] = INVALID;
    }

    /// Splits the tree into the views a collection works on.
    pub(crate) fn parts(&mut self) -> TreeParts<'_, C2, C3> {
        TreeParts {
            topo: &self.topo,
            placement: &mut self.placement,
            draw2d: &self.draw2d,
            draw3d: &self.draw3d,
        }
    }

    /// Drains one dirty channel in deterministic order.
    pub(crate) fn take_dirty(&mut self, channel: Channel) -> Vec<u32> {
        self.dirty.drain(channel).deterministic().run().collect()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;

    type Tree = SceneTree<u8, u8>;

    #[test]
    fn create_and_destroy() {
        let mut tree = Tree::new();
        let id = tree.create_node(NodeKind::Visual);
        assert!(tree.is_alive(id));
        tree.destroy_node(id);
        assert!(!tree.is_alive(id));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut tree = Tree::new();
        let id1 = tree.create_node(NodeKind::Visual);
        tree.destroy_node(id1);
        let id2 = tree.create_node(NodeKind::Group);
        assert!(!tree.is_alive(id1));
        assert!(tree.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
        assert_eq!(tree.kind(id2), NodeKind::Group);
    }

    #[test]
    fn reused_slot_starts_clean() {
        let mut tree = Tree::new();
        let id = tree.create_node(NodeKind::Visual);
        tree.set_commands_2d(id, vec![1], vec![2]);
        tree.set_visible(id, false);
        tree.destroy_node(id);
        let id = tree.create_node(NodeKind::Visual);
        assert!(tree.is_visible(id));
        assert!(tree.draw_2d(id).is_empty());
        assert_eq!(tree.subtree_range(id), ShortRange::EMPTY);
    }

    #[test]
    fn append_and_query_children() {
        let mut tree = Tree::new();
        let parent = tree.create_node(NodeKind::Visual);
        let a = tree.create_node(NodeKind::Visual);
        let b = tree.create_node(NodeKind::Visual);
        tree.append_child(parent, a);
        tree.append_child(parent, b);

        assert_eq!(tree.parent(a), Some(parent));
        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![a, b]);
    }

    #[test]
    fn insert_before_works() {
        let mut tree = Tree::new();
        let parent = tree.create_node(NodeKind::Visual);
        let a = tree.create_node(NodeKind::Visual);
        let b = tree.create_node(NodeKind::Visual);
        let c = tree.create_node(NodeKind::Visual);
        tree.append_child(parent, a);
        tree.append_child(parent, c);
        tree.insert_before(b, c);
        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![a, b, c]);

        // Appending after an insert still lands at the end.
        let d = tree.create_node(NodeKind::Visual);
        tree.append_child(parent, d);
        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![a, b, c, d]);
    }

    #[test]
    fn remove_last_child_keeps_tail_consistent() {
        let mut tree = Tree::new();
        let parent = tree.create_node(NodeKind::Visual);
        let a = tree.create_node(NodeKind::Visual);
        let b = tree.create_node(NodeKind::Visual);
        tree.append_child(parent, a);
        tree.append_child(parent, b);
        tree.remove_child(parent, b);
        let c = tree.create_node(NodeKind::Visual);
        tree.append_child(parent, c);
        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![a, c]);
        assert_eq!(tree.parent(b), None);
    }

    #[test]
    fn shadow_links_are_symmetric() {
        let mut tree = Tree::new();
        let host = tree.create_node(NodeKind::Visual);
        let root = tree.create_node(NodeKind::Group);
        tree.attach_shadow(host, root);
        assert_eq!(tree.shadow_root(host), Some(root));
        assert_eq!(tree.shadow_host(root), Some(host));

        assert_eq!(tree.detach_shadow(host), Some(root));
        assert_eq!(tree.shadow_root(host), None);
        assert_eq!(tree.shadow_host(root), None);
        assert_eq!(tree.detach_shadow(host), None);
    }

    #[test]
    fn mutations_mark_channels() {
        let mut tree = Tree::new();
        let parent = tree.create_node(NodeKind::Visual);
        let child = tree.create_node(NodeKind::Visual);

        tree.append_child(parent, child);
        assert_eq!(tree.take_dirty(dirty::SUBTREE), vec![parent.idx]);

        tree.set_commands_2d(child, vec![1], Vec::new());
        assert!(tree.take_dirty(dirty::SUBTREE).is_empty());
        assert_eq!(tree.take_dirty(dirty::COMMANDS), vec![child.idx]);

        tree.set_visible(child, false);
        assert_eq!(tree.take_dirty(dirty::SUBTREE), vec![child.idx]);

        // No change, no mark.
        tree.set_visible(child, false);
        assert!(tree.take_dirty(dirty::SUBTREE).is_empty());
    }

    #[test]
    fn moving_a_slot_marks_the_host() {
        let mut tree = Tree::new();
        let host = tree.create_node(NodeKind::Visual);
        let root = tree.create_node(NodeKind::Group);
        let wrapper = tree.create_node(NodeKind::Visual);
        let slot = tree.create_node(NodeKind::Slot);
        tree.append_child(root, wrapper);
        tree.attach_shadow(host, root);
        let _ = tree.take_dirty(dirty::SUBTREE);

        tree.append_child(wrapper, slot);
        let marked = tree.take_dirty(dirty::SUBTREE);
        assert!(marked.contains(&wrapper.idx));
        assert!(marked.contains(&host.idx));
    }

    #[test]
    fn destroy_clears_pending_marks() {
        let mut tree = Tree::new();
        let id = tree.create_node(NodeKind::Visual);
        tree.set_commands_2d(id, vec![1], Vec::new());
        tree.destroy_node(id);
        assert!(tree.take_dirty(dirty::COMMANDS).is_empty());
    }

    #[test]
    #[should_panic(expected = "cannot destroy node with children")]
    fn destroy_with_children_panics() {
        let mut tree = Tree::new();
        let parent = tree.create_node(NodeKind::Visual);
        let child = tree.create_node(NodeKind::Visual);
        tree.append_child(parent, child);
        tree.destroy_node(parent);
    }

    #[test]
    #[should_panic(expected = "cannot destroy attached node")]
    fn destroy_attached_panics() {
        let mut tree = Tree::new();
        let parent = tree.create_node(NodeKind::Visual);
        let child = tree.create_node(NodeKind::Visual);
        tree.append_child(parent, child);
        tree.destroy_node(child);
    }

    #[test]
    #[should_panic(expected = "cannot attach a node to itself")]
    fn self_attach_panics() {
        let mut tree = Tree::new();
        let a = tree.create_node(NodeKind::Visual);
        tree.append_child(a, a);
    }

    #[test]
    #[should_panic(expected = "cannot attach a node to its own descendant")]
    fn cycle_panics() {
        let mut tree = Tree::new();
        let a = tree.create_node(NodeKind::Visual);
        let b = tree.create_node(NodeKind::Visual);
        tree.append_child(a, b);
        tree.append_child(b, a);
    }

    #[test]
    #[should_panic(expected = "cannot attach a node to its own descendant")]
    fn cycle_through_shadow_panics() {
        let mut tree = Tree::new();
        let host = tree.create_node(NodeKind::Visual);
        let root = tree.create_node(NodeKind::Group);
        let inner = tree.create_node(NodeKind::Visual);
        tree.append_child(root, inner);
        tree.attach_shadow(host, root);
        tree.append_child(inner, host);
    }

    #[test]
    #[should_panic(expected = "node is not a child of the given parent")]
    fn remove_from_wrong_parent_panics() {
        let mut tree = Tree::new();
        let a = tree.create_node(NodeKind::Visual);
        let b = tree.create_node(NodeKind::Visual);
        let c = tree.create_node(NodeKind::Visual);
        tree.append_child(a, c);
        tree.remove_child(b, c);
    }

    #[test]
    #[should_panic(expected = "node is sealed")]
    fn sealed_node_rejects_children() {
        let mut tree = Tree::new();
        let a = tree.create_node(NodeKind::Visual);
        let b = tree.create_node(NodeKind::Visual);
        tree.seal(a);
        tree.append_child(a, b);
    }

    #[test]
    #[should_panic(expected = "node is sealed")]
    fn sealed_node_rejects_commands() {
        let mut tree = Tree::new();
        let a = tree.create_node(NodeKind::Visual);
        tree.seal(a);
        tree.set_commands_2d(a, vec![1], Vec::new());
    }

    #[test]
    #[should_panic(expected = "shadow root must be a group")]
    fn non_group_shadow_root_panics() {
        let mut tree = Tree::new();
        let host = tree.create_node(NodeKind::Visual);
        let root = tree.create_node(NodeKind::Visual);
        tree.attach_shadow(host, root);
    }

    #[test]
    #[should_panic(expected = "shadow root cannot be a child")]
    fn shadow_root_as_child_panics() {
        let mut tree = Tree::new();
        let host = tree.create_node(NodeKind::Visual);
        let root = tree.create_node(NodeKind::Group);
        let other = tree.create_node(NodeKind::Visual);
        tree.attach_shadow(host, root);
        tree.append_child(other, root);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_handle_panics_on_append() {
        let mut tree = Tree::new();
        let a = tree.create_node(NodeKind::Visual);
        let b = tree.create_node(NodeKind::Visual);
        tree.destroy_node(b);
        tree.append_child(a, b);
    }
}
