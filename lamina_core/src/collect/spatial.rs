// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 3D collection: a single channel with no post commands.

use super::boundary::{BoundaryContext, Region, Spliced};
use super::{Cursor, Delta, Lane, to_pos};
use crate::cache::RenderContext;
use crate::command::{Command, CommandBuffer, Draw};
use crate::node::Dimension;
use crate::range::CommandRange;

/// Collects into a context's spatial buffer.
///
/// All of a node's commands are emitted on entry. The node's color variant
/// holds its spatial position; the encode variant stays at zero.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Collector3d;

impl Lane for Collector3d {
    const DIMENSION: Dimension = Dimension::Spatial;

    fn cursor<C2, C3>(bc: &BoundaryContext<'_, C2, C3>) -> Cursor {
        Cursor {
            color: bc.spatial_offset(),
            encode: 0,
        }
    }

    fn collect_pre<C2: Command, C3: Clone>(
        bc: &mut BoundaryContext<'_, C2, C3>,
        _: &Draw<C2>,
        draw3d: &Draw<C3>,
    ) {
        bc.collect_spatial(&draw3d.pre);
        bc.collect_spatial(&draw3d.post);
    }

    fn collect_post<C2: Command, C3: Clone>(
        _: &mut BoundaryContext<'_, C2, C3>,
        _: &Draw<C2>,
        _: &Draw<C3>,
    ) {
    }

    fn clamp<B2: CommandBuffer, B3: CommandBuffer>(
        commands: CommandRange,
        ctx: &RenderContext<B2, B3>,
    ) -> CommandRange {
        commands.with_clamp(to_pos(ctx.spatial.len()), 0)
    }

    fn region(commands: CommandRange) -> Region {
        Region {
            spatial: Some(commands.color.as_range()),
            ..Region::default()
        }
    }

    fn pre_region(commands: CommandRange) -> Region {
        Region {
            spatial: Some(commands.color.pre.as_range()),
            ..Region::default()
        }
    }

    fn post_region(_: CommandRange) -> Region {
        Region::default()
    }

    fn delta(spliced: Spliced) -> Delta {
        Delta {
            color: spliced.spatial,
            encode: 0,
        }
    }
}
