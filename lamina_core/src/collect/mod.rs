// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collection: walking a dirty region and splicing its output into a render
//! context.
//!
//! There are three kinds of collection, all driven by the `Collector`:
//!
//! - **Context rebuild**: walk a viewport's whole composed subtree and replace
//!   the context's flat array and buffers.
//! - **Subtree**: walk one renderable's composed subtree and replace the slice
//!   it occupied. The length change is then propagated as a [`Patch`]: every
//!   ancestor's span grows or shrinks at its trailing end, and every later
//!   flat-array entry shifts.
//! - **Commands**: re-emit one renderable's own pre and post commands in
//!   place. Descendants shift by the pre delta; ancestors and later entries
//!   shift by the total.
//!
//! The per-dimension details (which channels, whether there is a post span)
//! live in `Collector2d` and `Collector3d`.

mod boundary;
mod flat;
mod spatial;

use alloc::vec::Vec;
use core::ops::{Add, Range};

use crate::cache::RenderContext;
use crate::command::{Command, CommandBuffer, Draw};
use crate::node::{Dimension, INVALID, NodeId, NodeKind, Placement, Topology, Visit, Walk};
use crate::range::{CommandRange, Variant};

pub(crate) use boundary::{BoundaryContext, Origin, Region, Scratch, Spliced};
pub(crate) use flat::Collector2d;
pub(crate) use spatial::Collector3d;

#[expect(
    clippy::cast_possible_truncation,
    reason = "flat arrays and command buffers are addressed with u32 positions"
)]
#[inline]
pub(crate) fn to_pos(len: usize) -> u32 {
    len as u32
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "flat arrays and command buffers are addressed with u32 positions"
)]
#[inline]
pub(crate) fn offset_delta(new: usize, old: usize) -> i32 {
    (new as i64 - old as i64) as i32
}

/// A length change in the two variants of a [`CommandRange`].
///
/// For 3D nodes `color` is the change in the spatial buffer and `encode` is
/// always zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Delta {
    /// Change in the color (or spatial) buffer.
    pub color: i32,
    /// Change in the encode buffer.
    pub encode: i32,
}

impl Delta {
    /// Returns `true` if neither channel changed length.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.color == 0 && self.encode == 0
    }
}

impl Add for Delta {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            color: self.color + rhs.color,
            encode: self.encode + rhs.encode,
        }
    }
}

/// A length change to propagate past a collected region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Patch {
    /// First flat-array position after the collected region, after splicing.
    pub index: u32,
    /// Change in flat-array length.
    pub nodes: i32,
    /// Change in the command buffers of [`dimension`](Self::dimension).
    pub commands: Delta,
    /// Which buffers changed.
    pub dimension: Dimension,
}

impl Patch {
    /// Returns `true` if nothing after the region moves.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nodes == 0 && self.commands.is_zero()
    }
}

/// Command-buffer positions of the active lane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Cursor {
    pub(crate) color: u32,
    pub(crate) encode: u32,
}

/// Builds a node's range from the cursor before its pre commands, after
/// them, before its post commands and after them.
pub(crate) fn command_range(pre: Cursor, mid: Cursor, post: Cursor, end: Cursor) -> CommandRange {
    CommandRange {
        color: Variant::new(pre.color, mid.color, post.color, end.color),
        encode: Variant::new(pre.encode, mid.encode, post.encode, end.encode),
    }
}

/// One output dimension of a render context.
pub(crate) trait Lane {
    const DIMENSION: Dimension;

    fn cursor<C2, C3>(bc: &BoundaryContext<'_, C2, C3>) -> Cursor;

    fn collect_pre<C2: Command, C3: Clone>(
        bc: &mut BoundaryContext<'_, C2, C3>,
        draw2d: &Draw<C2>,
        draw3d: &Draw<C3>,
    );

    fn collect_post<C2: Command, C3: Clone>(
        bc: &mut BoundaryContext<'_, C2, C3>,
        draw2d: &Draw<C2>,
        draw3d: &Draw<C3>,
    );

    /// Pulls a stored range under this lane's buffer lengths.
    fn clamp<B2: CommandBuffer, B3: CommandBuffer>(
        commands: CommandRange,
        ctx: &RenderContext<B2, B3>,
    ) -> CommandRange;

    /// The buffer slices a node's whole span occupies.
    fn region(commands: CommandRange) -> Region;

    /// The buffer slices a node's own pre commands occupy.
    fn pre_region(commands: CommandRange) -> Region;

    /// The buffer slices a node's own post commands occupy.
    fn post_region(commands: CommandRange) -> Region;

    fn delta(spliced: Spliced) -> Delta;
}

/// Borrowed views of a tree's arrays, split so traversal can read topology
/// while placements are rewritten.
#[derive(Debug)]
pub(crate) struct TreeParts<'a, C2, C3> {
    pub(crate) topo: &'a Topology,
    pub(crate) placement: &'a mut Placement,
    pub(crate) draw2d: &'a [Draw<C2>],
    pub(crate) draw3d: &'a [Draw<C3>],
}

#[derive(Clone, Copy, Debug)]
struct Open {
    start: u32,
    pre: Cursor,
    mid: Cursor,
}

impl<C2: Command, C3: Command> TreeParts<'_, C2, C3> {
    /// Walks the composed subtree of `root`, staging every renderable and its
    /// commands, and records each renderable's new placement.
    ///
    /// Visible viewports below `root` are pushed to `nested`.
    ///
    /// # Panics
    ///
    /// Panics if a scene of the other dimension is reached.
    fn walk_region<L: Lane>(
        &mut self,
        bc: &mut BoundaryContext<'_, C2, C3>,
        root: u32,
        context: u32,
        stamp: u32,
        nested: &mut Vec<u32>,
    ) {
        let topo = self.topo;
        let mut walk = Walk::new(topo, root);
        let mut open: Vec<Open> = Vec::new();
        while let Some((id, visit)) = walk.next() {
            let i = id.idx as usize;
            let kind = topo.kind[i];
            let visible = topo.visible[i];
            if !kind.is_renderable() {
                if visit == Visit::Enter && !visible {
                    walk.skip_subtree();
                }
                continue;
            }
            match visit {
                Visit::Enter => {
                    if let Some(dimension) = Dimension::of_scene(kind) {
                        assert!(
                            dimension == L::DIMENSION,
                            "scenes of different dimension must be separated by a viewport"
                        );
                    }
                    let start = bc.start_subtree(id);
                    let pre = L::cursor(bc);
                    if kind == NodeKind::Viewport {
                        walk.skip_subtree();
                        if visible {
                            nested.push(id.idx);
                        }
                    } else if !visible {
                        walk.skip_subtree();
                    } else {
                        L::collect_pre(bc, &self.draw2d[i], &self.draw3d[i]);
                    }
                    open.push(Open {
                        start,
                        pre,
                        mid: L::cursor(bc),
                    });
                }
                Visit::Leave => {
                    let Some(frame) = open.pop() else {
                        continue;
                    };
                    let post = L::cursor(bc);
                    if visible && kind != NodeKind::Viewport {
                        L::collect_post(bc, &self.draw2d[i], &self.draw3d[i]);
                    }
                    let end = L::cursor(bc);
                    let p = &mut *self.placement;
                    p.subtree[i] = bc.end_subtree(frame.start);
                    p.commands[i] = command_range(frame.pre, frame.mid, post, end);
                    p.dimension[i] = L::DIMENSION;
                    p.owner[i] = context;
                    p.stamp[i] = stamp;
                }
            }
        }
    }

    /// Returns `true` if the entry for `idx` is live: placed by `context`, at
    /// a position whose flat-array entry is still this node.
    pub(crate) fn is_placed(&self, idx: u32, context: u32, nodes: &[NodeId]) -> bool {
        let start = self.placement.subtree[idx as usize].start as usize;
        self.placement.owner[idx as usize] == context
            && nodes.get(start) == Some(&self.topo.id(idx))
    }

    /// Applies a length change to the composed ancestors of `node` that sit
    /// in `context`: spans grow at the trailing end and post commands move.
    fn patch_ancestors(&mut self, node: u32, context: u32, stamp: u32, patch: Patch) {
        let topo = self.topo;
        let p = &mut *self.placement;
        let mut cur = topo.composed_parent(node);
        while cur != INVALID && cur != context {
            let i = cur as usize;
            if topo.kind[i].is_renderable() && p.owner[i] == context && p.stamp[i] != stamp {
                p.subtree[i] = p.subtree[i].with_resize(patch.nodes);
                if p.dimension[i] == patch.dimension {
                    p.commands[i] = p.commands[i]
                        .with_post_offset(patch.commands.color, patch.commands.encode);
                }
            }
            cur = topo.composed_parent(cur);
        }
    }

    /// Shifts the live entries in `range` of the flat array.
    ///
    /// `range` is in post-splice positions; an entry is live if its stored
    /// start equals its position before the splice.
    fn shift_entries(
        &mut self,
        nodes: &[NodeId],
        range: Range<usize>,
        context: u32,
        stamp: u32,
        patch: Patch,
    ) {
        let p = &mut *self.placement;
        let end = range.end.min(nodes.len());
        for (j, &id) in nodes.iter().enumerate().take(end).skip(range.start) {
            if !self.topo.is_current(id) {
                continue;
            }
            let i = id.idx as usize;
            if p.owner[i] != context || p.stamp[i] == stamp {
                continue;
            }
            if p.subtree[i].start != to_pos(j).saturating_add_signed(-patch.nodes) {
                continue;
            }
            p.subtree[i] = p.subtree[i].with_offset(patch.nodes);
            if p.dimension[i] == patch.dimension {
                p.commands[i] = p.commands[i].with_offset(patch.commands.color, patch.commands.encode);
            }
        }
    }
}

/// Drives the collections of one build.
#[derive(Debug)]
pub(crate) struct Collector<'a, C2, C3> {
    parts: TreeParts<'a, C2, C3>,
    scratch: &'a mut Scratch<C2, C3>,
    stamp: &'a mut u32,
    /// Viewports reached by subtree walks, waiting for a context rebuild.
    pub(crate) nested: Vec<u32>,
    /// Buffer splices performed so far.
    pub(crate) splices: u32,
}

impl<'a, C2: Command, C3: Command> Collector<'a, C2, C3> {
    pub(crate) fn new(
        parts: TreeParts<'a, C2, C3>,
        scratch: &'a mut Scratch<C2, C3>,
        stamp: &'a mut u32,
    ) -> Self {
        Self {
            parts,
            scratch,
            stamp,
            nested: Vec::new(),
            splices: 0,
        }
    }

    #[inline]
    pub(crate) fn topo(&self) -> &'a Topology {
        self.parts.topo
    }

    /// See [`TreeParts::is_placed`].
    pub(crate) fn is_placed(&self, idx: u32, context: u32, nodes: &[NodeId]) -> bool {
        self.parts.is_placed(idx, context, nodes)
    }

    fn next_stamp(&mut self) -> u32 {
        *self.stamp = self.stamp.wrapping_add(1).max(1);
        *self.stamp
    }

    /// Replaces the whole content of `viewport`'s context.
    ///
    /// Top-level renderables under a [`Scene3d`](NodeKind::Scene3d) are
    /// collected into the spatial buffer, all others into the 2D channels.
    pub(crate) fn rebuild_context<B2, B3>(&mut self, viewport: u32, ctx: &mut RenderContext<B2, B3>)
    where
        B2: CommandBuffer<Command = C2>,
        B3: CommandBuffer<Command = C3>,
    {
        let stamp = self.next_stamp();
        let topo = self.parts.topo;
        let mut bc = BoundaryContext::new(&mut *self.scratch, Origin::default());
        let mut walk = Walk::new(topo, viewport);
        while let Some((id, visit)) = walk.next() {
            if visit == Visit::Leave || id.idx == viewport {
                continue;
            }
            let kind = topo.kind[id.idx as usize];
            if !kind.is_renderable() {
                if !topo.visible[id.idx as usize] {
                    walk.skip_subtree();
                }
                continue;
            }
            walk.skip_subtree();
            if kind == NodeKind::Scene3d {
                self.parts
                    .walk_region::<Collector3d>(&mut bc, id.idx, viewport, stamp, &mut self.nested);
            } else {
                self.parts
                    .walk_region::<Collector2d>(&mut bc, id.idx, viewport, stamp, &mut self.nested);
            }
        }
        let region = Region {
            nodes: 0..ctx.nodes.len(),
            color: Some(0..ctx.color.len()),
            encode: Some(0..ctx.encode.len()),
            spatial: Some(0..ctx.spatial.len()),
        };
        let spliced = bc.update_buffer(ctx, region);
        self.splices += spliced.splices;
    }

    /// Walks the composed subtree of the placed renderable `node` and
    /// replaces the slice it occupied in `context`.
    pub(crate) fn collect_subtree<B2, B3>(
        &mut self,
        node: u32,
        context: u32,
        ctx: &mut RenderContext<B2, B3>,
    ) -> Patch
    where
        B2: CommandBuffer<Command = C2>,
        B3: CommandBuffer<Command = C3>,
    {
        match self.parts.topo.dimension_of(node) {
            Dimension::Flat => self.subtree_in::<Collector2d, B2, B3>(node, context, ctx),
            Dimension::Spatial => self.subtree_in::<Collector3d, B2, B3>(node, context, ctx),
        }
    }

    /// Re-emits the own commands of the placed renderable `node` in place.
    pub(crate) fn collect_commands<B2, B3>(
        &mut self,
        node: u32,
        context: u32,
        ctx: &mut RenderContext<B2, B3>,
    ) -> Patch
    where
        B2: CommandBuffer<Command = C2>,
        B3: CommandBuffer<Command = C3>,
    {
        match self.parts.placement.dimension[node as usize] {
            Dimension::Flat => self.commands_in::<Collector2d, B2, B3>(node, context, ctx),
            Dimension::Spatial => self.commands_in::<Collector3d, B2, B3>(node, context, ctx),
        }
    }

    fn subtree_in<L: Lane, B2, B3>(
        &mut self,
        node: u32,
        context: u32,
        ctx: &mut RenderContext<B2, B3>,
    ) -> Patch
    where
        B2: CommandBuffer<Command = C2>,
        B3: CommandBuffer<Command = C3>,
    {
        let stamp = self.next_stamp();
        let i = node as usize;
        let old_subtree = self.parts.placement.subtree[i].with_clamp(to_pos(ctx.nodes.len()));
        let old_commands = L::clamp(self.parts.placement.commands[i], ctx);

        let mut bc = BoundaryContext::new(
            &mut *self.scratch,
            Origin::of_region(old_subtree, old_commands),
        );
        self.parts
            .walk_region::<L>(&mut bc, node, context, stamp, &mut self.nested);
        let new_end = self.parts.placement.subtree[i].end;

        let region = Region {
            nodes: old_subtree.as_range(),
            ..L::region(old_commands)
        };
        let spliced = bc.update_buffer(ctx, region);
        self.splices += spliced.splices;

        let patch = Patch {
            index: new_end,
            nodes: spliced.nodes,
            commands: L::delta(spliced),
            dimension: L::DIMENSION,
        };
        if !patch.is_empty() {
            self.parts.patch_ancestors(node, context, stamp, patch);
            let range = new_end as usize..ctx.nodes.len();
            self.parts
                .shift_entries(&ctx.nodes, range, context, stamp, patch);
        }
        patch
    }

    fn commands_in<L: Lane, B2, B3>(
        &mut self,
        node: u32,
        context: u32,
        ctx: &mut RenderContext<B2, B3>,
    ) -> Patch
    where
        B2: CommandBuffer<Command = C2>,
        B3: CommandBuffer<Command = C3>,
    {
        let stamp = self.next_stamp();
        let i = node as usize;
        let old = L::clamp(self.parts.placement.commands[i], ctx);
        let subtree = self.parts.placement.subtree[i];
        let (draw2d, draw3d) = (self.parts.draw2d, self.parts.draw3d);
        let (draw2d, draw3d) = (&draw2d[i], &draw3d[i]);

        // Post first: it lies after the pre span, so splicing it leaves the
        // pre positions intact.
        let mut bc = BoundaryContext::new(&mut *self.scratch, Origin::default());
        L::collect_post(&mut bc, draw2d, draw3d);
        let post = bc.update_buffer(ctx, L::post_region(old));

        let mut bc = BoundaryContext::new(&mut *self.scratch, Origin::default());
        L::collect_pre(&mut bc, draw2d, draw3d);
        let pre = bc.update_buffer(ctx, L::pre_region(old));
        self.splices += pre.splices + post.splices;

        let (dpre, dpost) = (L::delta(pre), L::delta(post));
        self.parts.placement.commands[i] = CommandRange {
            color: old
                .color
                .with_pre_resize(dpre.color)
                .with_post_resize(dpost.color),
            encode: old
                .encode
                .with_pre_resize(dpre.encode)
                .with_post_resize(dpost.encode),
        };

        let total = Patch {
            index: subtree.end,
            nodes: 0,
            commands: dpre + dpost,
            dimension: L::DIMENSION,
        };
        if !dpre.is_zero() {
            let inner = Patch {
                commands: dpre,
                ..total
            };
            let range = subtree.start as usize + 1..subtree.end as usize;
            self.parts
                .shift_entries(&ctx.nodes, range, context, stamp, inner);
        }
        if !total.is_empty() {
            self.parts.patch_ancestors(node, context, stamp, total);
            let range = subtree.end as usize..ctx.nodes.len();
            self.parts
                .shift_entries(&ctx.nodes, range, context, stamp, total);
        }
        total
    }
}
