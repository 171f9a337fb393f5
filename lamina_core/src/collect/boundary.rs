// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Staging state for one collection.

use alloc::vec::Vec;
use core::ops::Range;

use super::{offset_delta, to_pos};
use crate::cache::RenderContext;
use crate::command::{Channels, Command, CommandBuffer};
use crate::node::NodeId;
use crate::range::{CommandRange, ShortRange};

/// Reusable staging lists, owned by the cache across builds.
///
/// A [`BoundaryContext`] borrows them for the length of one collection and
/// clears them on entry, so nothing leaks from one collection into the next.
#[derive(Debug)]
pub(crate) struct Scratch<C2, C3> {
    pub(crate) nodes: Vec<NodeId>,
    pub(crate) color: Vec<C2>,
    pub(crate) encode: Vec<C2>,
    pub(crate) spatial: Vec<C3>,
}

impl<C2, C3> Default for Scratch<C2, C3> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            color: Vec::new(),
            encode: Vec::new(),
            spatial: Vec::new(),
        }
    }
}

impl<C2, C3> Scratch<C2, C3> {
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.color.clear();
        self.encode.clear();
        self.spatial.clear();
    }
}

/// Where a collection starts writing in each sequence of a render context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Origin {
    pub(crate) index: u32,
    pub(crate) color: u32,
    pub(crate) encode: u32,
    pub(crate) spatial: u32,
}

impl Origin {
    /// The origin of a region previously occupied by a node.
    ///
    /// Both ranges must already be clamped to the current sequence lengths.
    /// The color variant doubles as the spatial position of 3D nodes.
    pub(crate) fn of_region(subtree: ShortRange, commands: CommandRange) -> Self {
        Self {
            index: subtree.start,
            color: commands.color.start(),
            encode: commands.encode.start(),
            spatial: commands.color.start(),
        }
    }
}

/// Which slices of a render context a collection replaces.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Region {
    pub(crate) nodes: Range<usize>,
    pub(crate) color: Option<Range<usize>>,
    pub(crate) encode: Option<Range<usize>>,
    pub(crate) spatial: Option<Range<usize>>,
}

/// The cursor state of one collection.
///
/// Offsets grow as commands are accumulated: each accessor is the origin
/// plus the number of entries staged so far.
#[derive(Debug)]
pub(crate) struct BoundaryContext<'a, C2, C3> {
    scratch: &'a mut Scratch<C2, C3>,
    origin: Origin,
}

impl<'a, C2, C3> BoundaryContext<'a, C2, C3> {
    pub(crate) fn new(scratch: &'a mut Scratch<C2, C3>, origin: Origin) -> Self {
        scratch.clear();
        Self { scratch, origin }
    }

    /// Flat-array position of the next staged node.
    #[inline]
    pub(crate) fn index(&self) -> u32 {
        self.origin.index + to_pos(self.scratch.nodes.len())
    }

    #[inline]
    pub(crate) fn color_offset(&self) -> u32 {
        self.origin.color + to_pos(self.scratch.color.len())
    }

    #[inline]
    pub(crate) fn encode_offset(&self) -> u32 {
        self.origin.encode + to_pos(self.scratch.encode.len())
    }

    #[inline]
    pub(crate) fn spatial_offset(&self) -> u32 {
        self.origin.spatial + to_pos(self.scratch.spatial.len())
    }

    /// Stages `id` and returns its flat-array position.
    pub(crate) fn start_subtree(&mut self, id: NodeId) -> u32 {
        let at = self.index();
        self.scratch.nodes.push(id);
        at
    }

    /// Closes the span opened by [`start_subtree`](Self::start_subtree).
    pub(crate) fn end_subtree(&self, start: u32) -> ShortRange {
        ShortRange::new(start, self.index())
    }

    /// Appends 2D commands to the channels their masks select.
    pub(crate) fn collect_commands(&mut self, commands: &[C2])
    where
        C2: Command,
    {
        for command in commands {
            let channels = command.channels();
            if channels.contains(Channels::COLOR) {
                self.scratch.color.push(command.clone());
            }
            if channels.contains(Channels::ENCODE) {
                self.scratch.encode.push(command.clone());
            }
        }
    }

    /// Appends 3D commands to the spatial list.
    pub(crate) fn collect_spatial(&mut self, commands: &[C3])
    where
        C3: Clone,
    {
        self.scratch.spatial.extend_from_slice(commands);
    }

    /// Splices the staged lists over `region`.
    pub(crate) fn update_buffer<B2, B3>(
        self,
        ctx: &mut RenderContext<B2, B3>,
        region: Region,
    ) -> Spliced
    where
        B2: CommandBuffer<Command = C2>,
        B3: CommandBuffer<Command = C3>,
    {
        let scratch = self.scratch;
        let mut out = Spliced {
            nodes: offset_delta(scratch.nodes.len(), region.nodes.len()),
            ..Spliced::default()
        };
        ctx.nodes.splice(region.nodes, scratch.nodes.drain(..));

        if let Some(range) = region.color {
            out.color = offset_delta(scratch.color.len(), range.len());
            ctx.color.replace_range(range, &scratch.color);
            out.splices += 1;
        }
        if let Some(range) = region.encode {
            out.encode = offset_delta(scratch.encode.len(), range.len());
            ctx.encode.replace_range(range, &scratch.encode);
            out.splices += 1;
        }
        if let Some(range) = region.spatial {
            out.spatial = offset_delta(scratch.spatial.len(), range.len());
            ctx.spatial.replace_range(range, &scratch.spatial);
            out.splices += 1;
        }
        scratch.clear();
        out
    }
}

/// Length changes produced by [`BoundaryContext::update_buffer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Spliced {
    pub(crate) nodes: i32,
    pub(crate) color: i32,
    pub(crate) encode: i32,
    pub(crate) spatial: i32,
    /// Number of buffer splices performed.
    pub(crate) splices: u32,
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;
    use crate::range::Variant;

    #[derive(Clone, Debug, PartialEq)]
    struct Op(u8, Channels);

    impl Command for Op {
        fn channels(&self) -> Channels {
            self.1
        }
    }

    type Ctx = RenderContext<Vec<Op>, Vec<Op>>;

    fn id(idx: u32) -> NodeId {
        NodeId { idx, generation: 0 }
    }

    #[test]
    fn offsets_advance_with_staged_entries() {
        let mut scratch = Scratch::<Op, Op>::default();
        let mut bc = BoundaryContext::new(
            &mut scratch,
            Origin {
                index: 4,
                color: 10,
                encode: 2,
                spatial: 0,
            },
        );
        let start = bc.start_subtree(id(0));
        assert_eq!(start, 4);
        bc.collect_commands(&[
            Op(1, Channels::COLOR),
            Op(2, Channels::all()),
            Op(3, Channels::ENCODE),
            Op(4, Channels::empty()),
        ]);
        assert_eq!(bc.color_offset(), 12);
        assert_eq!(bc.encode_offset(), 4);
        bc.start_subtree(id(1));
        assert_eq!(bc.end_subtree(start), ShortRange::new(4, 6));
    }

    #[test]
    fn entering_clears_leftovers() {
        let mut scratch = Scratch::<Op, Op>::default();
        scratch.color.push(Op(9, Channels::COLOR));
        scratch.nodes.push(id(3));
        let bc = BoundaryContext::new(&mut scratch, Origin::default());
        assert_eq!(bc.index(), 0);
        assert_eq!(bc.color_offset(), 0);
    }

    #[test]
    fn update_buffer_reports_deltas() {
        let mut ctx = Ctx::default();
        ctx.nodes = vec![id(0), id(1), id(2)];
        ctx.color = vec![Op(0, Channels::COLOR), Op(1, Channels::COLOR)];

        let mut scratch = Scratch::default();
        let mut bc = BoundaryContext::new(
            &mut scratch,
            Origin {
                index: 1,
                color: 1,
                ..Origin::default()
            },
        );
        bc.start_subtree(id(5));
        bc.start_subtree(id(6));
        bc.collect_commands(&[Op(7, Channels::COLOR), Op(8, Channels::COLOR)]);
        let spliced = bc.update_buffer(
            &mut ctx,
            Region {
                nodes: 1..2,
                color: Some(1..2),
                encode: Some(0..0),
                spatial: None,
            },
        );
        assert_eq!(
            spliced,
            Spliced {
                nodes: 1,
                color: 1,
                encode: 0,
                spatial: 0,
                splices: 2,
            }
        );
        assert_eq!(ctx.nodes, vec![id(0), id(5), id(6), id(2)]);
        let colors: Vec<u8> = ctx.color.iter().map(|c| c.0).collect();
        assert_eq!(colors, vec![0, 7, 8]);
    }

    #[test]
    fn region_origin_starts_at_pre() {
        let commands = CommandRange {
            color: Variant::new(3, 5, 8, 9),
            encode: Variant::new(1, 1, 2, 2),
        };
        let origin = Origin::of_region(ShortRange::new(4, 6), commands);
        assert_eq!(
            origin,
            Origin {
                index: 4,
                color: 3,
                encode: 1,
                spatial: 3,
            }
        );
    }
}
