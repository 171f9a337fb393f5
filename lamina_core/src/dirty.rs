// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channels and the per-root dirt state.
//!
//! Mutations on a [`SceneTree`](crate::node::SceneTree) mark one of two
//! [`understory_dirty`] channels on the raw slot index of the affected node:
//!
//! - [`SUBTREE`]: the node's composed subtree changed shape (children added,
//!   removed or reordered, visibility toggled, shadow root attached). The
//!   whole subtree is walked again and its flat-array slice replaced.
//! - [`COMMANDS`]: the node's own draw commands changed but its structure did
//!   not. Only the node's pre and post spans are spliced.
//!
//! Neither channel propagates: minimal dirty roots are computed by the
//! [`SceneGraphCache`](crate::cache::SceneGraphCache) when it drains both
//! channels at the start of a build.

use understory_dirty::Channel;

/// Structural change below a node.
pub const SUBTREE: Channel = Channel::new(0);

/// Draw-command change on a single node.
pub const COMMANDS: Channel = Channel::new(1);

bitflags::bitflags! {
    /// What kind of work a dirty root needs.
    ///
    /// A root whose state is exactly [`COMMANDS`](Self::COMMANDS) takes the
    /// splice-in-place path; anything containing
    /// [`SUBTREE`](Self::SUBTREE) re-walks the subtree.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DirtState: u8 {
        /// The subtree must be walked again.
        const SUBTREE = 0b01;
        /// Only this node's own commands changed.
        const COMMANDS = 0b10;
    }
}

impl DirtState {
    /// Returns `true` if only the node's own commands changed.
    #[inline]
    #[must_use]
    pub fn is_commands_only(self) -> bool {
        self == Self::COMMANDS
    }

    /// Returns `true` if the subtree must be walked again.
    #[inline]
    #[must_use]
    pub fn is_structural(self) -> bool {
        self.contains(Self::SUBTREE)
    }
}
