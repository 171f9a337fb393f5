// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 2D collection: color and encode channels with a pre/post split.

use super::boundary::{BoundaryContext, Region, Spliced};
use super::{Cursor, Delta, Lane, to_pos};
use crate::cache::RenderContext;
use crate::command::{Command, CommandBuffer, Draw};
use crate::node::Dimension;
use crate::range::CommandRange;

/// Collects into a context's color and encode buffers.
///
/// Pre commands are emitted on entering a node and post commands on leaving
/// it, so a node's span brackets its descendants in both channels.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Collector2d;

impl Lane for Collector2d {
    const DIMENSION: Dimension = Dimension::Flat;

    fn cursor<C2, C3>(bc: &BoundaryContext<'_, C2, C3>) -> Cursor {
        Cursor {
            color: bc.color_offset(),
            encode: bc.encode_offset(),
        }
    }

    fn collect_pre<C2: Command, C3: Clone>(
        bc: &mut BoundaryContext<'_, C2, C3>,
        draw2d: &Draw<C2>,
        _: &Draw<C3>,
    ) {
        bc.collect_commands(&draw2d.pre);
    }

    fn collect_post<C2: Command, C3: Clone>(
        bc: &mut BoundaryContext<'_, C2, C3>,
        draw2d: &Draw<C2>,
        _: &Draw<C3>,
    ) {
        bc.collect_commands(&draw2d.post);
    }

    fn clamp<B2: CommandBuffer, B3: CommandBuffer>(
        commands: CommandRange,
        ctx: &RenderContext<B2, B3>,
    ) -> CommandRange {
        commands.with_clamp(to_pos(ctx.color.len()), to_pos(ctx.encode.len()))
    }

    fn region(commands: CommandRange) -> Region {
        Region {
            color: Some(commands.color.as_range()),
            encode: Some(commands.encode.as_range()),
            ..Region::default()
        }
    }

    fn pre_region(commands: CommandRange) -> Region {
        Region {
            color: Some(commands.color.pre.as_range()),
            encode: Some(commands.encode.pre.as_range()),
            ..Region::default()
        }
    }

    fn post_region(commands: CommandRange) -> Region {
        Region {
            color: Some(commands.color.post.as_range()),
            encode: Some(commands.encode.post.as_range()),
            ..Region::default()
        }
    }

    fn delta(spliced: Spliced) -> Delta {
        Delta {
            color: spliced.color,
            encode: spliced.encode,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;
    use crate::collect::boundary::Origin;
    use crate::collect::{Scratch, command_range};
    use crate::command::Channels;
    use crate::range::Variant;

    #[derive(Clone, Debug, PartialEq)]
    struct Op(u8, Channels);

    impl Command for Op {
        fn channels(&self) -> Channels {
            self.1
        }
    }

    #[test]
    fn pre_and_post_bracket_children() {
        let parent = Draw {
            pre: vec![Op(1, Channels::COLOR), Op(2, Channels::all())],
            post: vec![Op(3, Channels::COLOR)],
        };
        let child = Draw {
            pre: vec![Op(4, Channels::ENCODE)],
            post: Vec::new(),
        };
        let none: Draw<Op> = Draw::default();

        let mut scratch = Scratch::<Op, Op>::default();
        let mut bc = BoundaryContext::new(&mut scratch, Origin::default());
        let pre = Collector2d::cursor(&bc);
        Collector2d::collect_pre(&mut bc, &parent, &none);
        let mid = Collector2d::cursor(&bc);
        Collector2d::collect_pre(&mut bc, &child, &none);
        Collector2d::collect_post(&mut bc, &child, &none);
        let post = Collector2d::cursor(&bc);
        Collector2d::collect_post(&mut bc, &parent, &none);
        let end = Collector2d::cursor(&bc);

        assert_eq!(
            command_range(pre, mid, post, end),
            CommandRange {
                color: Variant::new(0, 2, 2, 3),
                encode: Variant::new(0, 1, 2, 2),
            }
        );
    }

    #[test]
    fn regions_select_both_channels() {
        let commands = CommandRange {
            color: Variant::new(1, 2, 4, 6),
            encode: Variant::new(0, 0, 1, 1),
        };
        let full = Collector2d::region(commands);
        assert_eq!(full.color, Some(1..6));
        assert_eq!(full.encode, Some(0..1));
        assert_eq!(full.spatial, None);
        assert_eq!(Collector2d::pre_region(commands).color, Some(1..2));
        assert_eq!(Collector2d::post_region(commands).color, Some(4..6));
        assert_eq!(Collector2d::post_region(commands).encode, Some(1..1));
    }
}
