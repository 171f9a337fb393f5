// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw-command contracts.
//!
//! The core never interprets draw commands. It only needs to know which 2D
//! channel a command belongs to ([`Command::channels`]) and how to splice a
//! sequence of commands into a backing buffer ([`CommandBuffer`]).

use alloc::vec::Vec;
use core::ops::Range;

bitflags::bitflags! {
    /// The 2D output channels a command contributes to.
    ///
    /// 3D collection ignores the mask: every 3D command lands in the single
    /// 3D buffer.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Channels: u8 {
        /// Visible color output.
        const COLOR = 0b01;
        /// Encoded output (e.g. hit-test ids).
        const ENCODE = 0b10;
    }
}

/// A draw command stored in a node and copied into command buffers.
pub trait Command: Clone {
    /// Which 2D channels this command belongs to.
    ///
    /// A command may belong to either channel, both, or neither (in which
    /// case it is dropped during 2D collection).
    fn channels(&self) -> Channels {
        Channels::COLOR
    }
}

/// A flat command buffer owned by a rendering backend.
///
/// The only mutation the core performs is replacing a contiguous sub-range
/// with a new sequence of a possibly different length.
pub trait CommandBuffer {
    /// Element type.
    type Command: Command;

    /// Current number of commands.
    fn len(&self) -> usize;

    /// Returns `true` if the buffer holds no commands.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces `range` with `elements`, growing or shrinking the buffer.
    ///
    /// `range` is always within `0..=len()`.
    fn replace_range(&mut self, range: Range<usize>, elements: &[Self::Command]);
}

impl<C: Command> CommandBuffer for Vec<C> {
    type Command = C;

    fn len(&self) -> usize {
        Self::len(self)
    }

    fn replace_range(&mut self, range: Range<usize>, elements: &[C]) {
        self.splice(range, elements.iter().cloned());
    }
}

/// A node's raw draw output: commands before and after its descendants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Draw<C> {
    /// Commands emitted before descending into children.
    pub pre: Vec<C>,
    /// Commands emitted after all children.
    pub post: Vec<C>,
}

impl<C> Default for Draw<C> {
    fn default() -> Self {
        Self {
            pre: Vec::new(),
            post: Vec::new(),
        }
    }
}

impl<C> Draw<C> {
    /// Returns `true` if the node draws nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pre.is_empty() && self.post.is_empty()
    }

    /// Drops all commands, keeping the allocations.
    pub fn clear(&mut self) {
        self.pre.clear();
        self.post.clear();
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Tagged(u8, Channels);

    impl Command for Tagged {
        fn channels(&self) -> Channels {
            self.1
        }
    }

    #[test]
    fn vec_replace_range_grows_and_shrinks() {
        let mut buf = vec![
            Tagged(0, Channels::COLOR),
            Tagged(1, Channels::COLOR),
            Tagged(2, Channels::COLOR),
        ];
        buf.replace_range(1..2, &[Tagged(7, Channels::COLOR), Tagged(8, Channels::COLOR)]);
        let ids: Vec<u8> = buf.iter().map(|c| c.0).collect();
        assert_eq!(ids, vec![0, 7, 8, 2]);

        buf.replace_range(0..3, &[]);
        let ids: Vec<u8> = buf.iter().map(|c| c.0).collect();
        assert_eq!(ids, vec![2]);
        assert_eq!(CommandBuffer::len(&buf), 1);
    }

    #[test]
    fn replace_at_end_appends() {
        let mut buf: Vec<Tagged> = Vec::new();
        assert!(CommandBuffer::is_empty(&buf));
        buf.replace_range(0..0, &[Tagged(1, Channels::ENCODE)]);
        assert_eq!(buf, vec![Tagged(1, Channels::ENCODE)]);
    }

    #[test]
    fn default_channel_is_color() {
        #[derive(Clone)]
        struct Plain;
        impl Command for Plain {}
        assert_eq!(Plain.channels(), Channels::COLOR);
    }

    #[test]
    fn draw_default_is_empty() {
        let mut draw: Draw<Tagged> = Draw::default();
        assert!(draw.is_empty());
        draw.post.push(Tagged(3, Channels::all()));
        assert!(!draw.is_empty());
        draw.clear();
        assert!(draw.is_empty());
    }
}
