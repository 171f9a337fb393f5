// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node identity and kind.

use core::fmt;

/// Sentinel value indicating "no node" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to a node in a [`SceneTree`](super::SceneTree).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a node is destroyed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    /// Slot index into the tree's arrays.
    pub(crate) idx: u32,
    /// Generation counter; must match the tree's generation for this slot.
    pub(crate) generation: u32,
}

impl NodeId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}@gen{})", self.idx, self.generation)
    }
}

/// What a node is, as far as collection is concerned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A non-renderable structural node. Traversal passes straight through
    /// it. Shadow roots are groups.
    #[default]
    Group,
    /// A non-renderable insertion point inside a shadow tree. The first slot
    /// of a shadow tree renders the host's light children in its place.
    Slot,
    /// A renderable boundary that owns its own flat array and buffers.
    Viewport,
    /// A renderable whose subtree draws into the 2D channels.
    Scene2d,
    /// A renderable whose subtree draws into the 3D buffer.
    Scene3d,
    /// A plain renderable drawing into its governing scene's channel.
    Visual,
}

impl NodeKind {
    /// Returns `true` for kinds that occupy a flat-array slot.
    #[inline]
    #[must_use]
    pub const fn is_renderable(self) -> bool {
        matches!(
            self,
            Self::Viewport | Self::Scene2d | Self::Scene3d | Self::Visual
        )
    }

    /// Returns `true` for the two scene kinds.
    #[inline]
    #[must_use]
    pub const fn is_scene(self) -> bool {
        matches!(self, Self::Scene2d | Self::Scene3d)
    }
}

/// Which buffers a renderable's commands go to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// The 2D color and encode buffers.
    #[default]
    Flat,
    /// The single 3D buffer.
    Spatial,
}

impl Dimension {
    /// The dimension a scene kind establishes, if any.
    #[inline]
    #[must_use]
    pub const fn of_scene(kind: NodeKind) -> Option<Self> {
        match kind {
            NodeKind::Scene2d => Some(Self::Flat),
            NodeKind::Scene3d => Some(Self::Spatial),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderable_kinds() {
        assert!(!NodeKind::Group.is_renderable());
        assert!(!NodeKind::Slot.is_renderable());
        assert!(NodeKind::Viewport.is_renderable());
        assert!(NodeKind::Scene2d.is_renderable());
        assert!(NodeKind::Scene3d.is_renderable());
        assert!(NodeKind::Visual.is_renderable());
    }

    #[test]
    fn scene_dimensions() {
        assert_eq!(Dimension::of_scene(NodeKind::Scene2d), Some(Dimension::Flat));
        assert_eq!(
            Dimension::of_scene(NodeKind::Scene3d),
            Some(Dimension::Spatial)
        );
        assert_eq!(Dimension::of_scene(NodeKind::Visual), None);
    }

    #[test]
    fn debug_format() {
        let id = NodeId {
            idx: 3,
            generation: 2,
        };
        assert_eq!(alloc::format!("{id:?}"), "NodeId(3@gen2)");
    }
}
