// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Consistency checking for incrementally built contexts.
//!
//! [`verify`] collects every context again from scratch, using only the
//! public traversal API, and compares the result against what a
//! [`SceneGraphCache`] holds: the set of contexts, each flat array, every
//! placed node's ranges, and the buffer contents.
//!
//! This is a test and debugging aid. It allocates and walks the whole tree.

use alloc::vec::Vec;

use crate::cache::{RenderContext, SceneGraphCache};
use crate::command::{Channels, Command, CommandBuffer};
use crate::node::{Dimension, NodeId, NodeKind, SceneTree, Visit};
use crate::range::{CommandRange, ShortRange, Variant};

/// A buffer of a render context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// The 2D color channel.
    Color,
    /// The 2D encode channel.
    Encode,
    /// The 3D buffer.
    Spatial,
}

/// A mismatch between a cache and a from-scratch collection.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// A rendered viewport has no context.
    #[error("viewport {viewport:?} is rendered but has no context")]
    MissingContext {
        /// The viewport.
        viewport: NodeId,
    },
    /// A context exists for a viewport that is not rendered.
    #[error("context for {viewport:?} outlived its viewport")]
    UnexpectedContext {
        /// The viewport.
        viewport: NodeId,
    },
    /// The flat array differs.
    #[error("flat array of {viewport:?} differs at position {position}")]
    FlatArray {
        /// The viewport.
        viewport: NodeId,
        /// The first differing position (or the shorter length).
        position: usize,
    },
    /// A node's stored subtree range is wrong.
    #[error("{node:?} has subtree range {actual:?}, expected {expected:?}")]
    SubtreeRange {
        /// The node.
        node: NodeId,
        /// The recomputed range.
        expected: ShortRange,
        /// The stored range.
        actual: ShortRange,
    },
    /// A node's stored command range is wrong.
    #[error("{node:?} has command range {actual:?}, expected {expected:?}")]
    CommandRange {
        /// The node.
        node: NodeId,
        /// The recomputed range.
        expected: CommandRange,
        /// The stored range.
        actual: CommandRange,
    },
    /// A node's stored dimension is wrong.
    #[error("{node:?} is placed in the wrong buffers")]
    Dimension {
        /// The node.
        node: NodeId,
    },
    /// A command buffer differs.
    #[error("{buffer:?} buffer of {viewport:?} differs at position {position}")]
    Buffer {
        /// The viewport.
        viewport: NodeId,
        /// Which buffer.
        buffer: BufferKind,
        /// The first differing position (or the shorter length).
        position: usize,
    },
}

#[derive(Clone, Copy)]
struct Placed {
    node: NodeId,
    subtree: ShortRange,
    commands: CommandRange,
    dimension: Dimension,
}

struct Expected<C2, C3> {
    nodes: Vec<NodeId>,
    color: Vec<C2>,
    encode: Vec<C2>,
    spatial: Vec<C3>,
    placed: Vec<Placed>,
    nested: Vec<NodeId>,
}

impl<C2: Command, C3: Command> Expected<C2, C3> {
    fn cursor(&self, dimension: Dimension) -> (u32, u32) {
        match dimension {
            Dimension::Flat => (len(self.color.len()), len(self.encode.len())),
            Dimension::Spatial => (len(self.spatial.len()), 0),
        }
    }

    fn emit_2d(&mut self, commands: &[C2]) {
        for command in commands {
            let channels = command.channels();
            if channels.contains(Channels::COLOR) {
                self.color.push(command.clone());
            }
            if channels.contains(Channels::ENCODE) {
                self.encode.push(command.clone());
            }
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "flat arrays and command buffers are addressed with u32 positions"
)]
fn len(n: usize) -> u32 {
    n as u32
}

struct Open {
    start: u32,
    pre: (u32, u32),
    mid: (u32, u32),
    dimension: Dimension,
    scene: bool,
}

/// Collects the context of `viewport` from scratch.
fn expect_context<C2: Command, C3: Command>(
    tree: &SceneTree<C2, C3>,
    viewport: NodeId,
) -> Expected<C2, C3> {
    let mut out = Expected {
        nodes: Vec::new(),
        color: Vec::new(),
        encode: Vec::new(),
        spatial: Vec::new(),
        placed: Vec::new(),
        nested: Vec::new(),
    };
    let mut scenes: Vec<Dimension> = Vec::new();
    let mut open: Vec<Open> = Vec::new();
    let mut walk = tree.walk(viewport);
    while let Some((id, visit)) = walk.next() {
        if id == viewport {
            continue;
        }
        let kind = tree.kind(id);
        let visible = tree.is_visible(id);
        if !kind.is_renderable() {
            if visit == Visit::Enter && !visible {
                walk.skip_subtree();
            }
            continue;
        }
        match visit {
            Visit::Enter => {
                let scene = Dimension::of_scene(kind);
                if let Some(dimension) = scene {
                    scenes.push(dimension);
                }
                let dimension = scenes.last().copied().unwrap_or_default();
                let start = len(out.nodes.len());
                out.nodes.push(id);
                let pre = out.cursor(dimension);
                if kind == NodeKind::Viewport {
                    walk.skip_subtree();
                    if visible {
                        out.nested.push(id);
                    }
                } else if !visible {
                    walk.skip_subtree();
                } else {
                    match dimension {
                        Dimension::Flat => out.emit_2d(&tree.draw_2d(id).pre),
                        Dimension::Spatial => {
                            let draw = tree.draw_3d(id);
                            out.spatial.extend(draw.pre.iter().cloned());
                            out.spatial.extend(draw.post.iter().cloned());
                        }
                    }
                }
                open.push(Open {
                    start,
                    pre,
                    mid: out.cursor(dimension),
                    dimension,
                    scene: scene.is_some(),
                });
            }
            Visit::Leave => {
                let Some(frame) = open.pop() else {
                    continue;
                };
                let post = out.cursor(frame.dimension);
                if visible && kind != NodeKind::Viewport && frame.dimension == Dimension::Flat {
                    out.emit_2d(&tree.draw_2d(id).post);
                }
                let end = out.cursor(frame.dimension);
                if frame.scene {
                    scenes.pop();
                }
                out.placed.push(Placed {
                    node: id,
                    subtree: ShortRange::new(frame.start, len(out.nodes.len())),
                    commands: CommandRange {
                        color: Variant::new(frame.pre.0, frame.mid.0, post.0, end.0),
                        encode: Variant::new(frame.pre.1, frame.mid.1, post.1, end.1),
                    },
                    dimension: frame.dimension,
                });
            }
        }
    }
    out
}

fn first_difference<T: PartialEq>(a: &[T], b: &[T]) -> Option<usize> {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .or_else(|| (a.len() != b.len()).then(|| a.len().min(b.len())))
}

fn compare_context<C2, C3, B2, B3>(
    tree: &SceneTree<C2, C3>,
    viewport: NodeId,
    expected: &Expected<C2, C3>,
    actual: &RenderContext<B2, B3>,
) -> Result<(), VerifyError>
where
    C2: Command + PartialEq,
    C3: Command + PartialEq,
    B2: AsRef<[C2]>,
    B3: AsRef<[C3]>,
{
    if let Some(position) = first_difference(&expected.nodes, actual.nodes()) {
        return Err(VerifyError::FlatArray { viewport, position });
    }
    for placed in &expected.placed {
        let node = placed.node;
        let subtree = tree.subtree_range(node);
        if subtree != placed.subtree {
            return Err(VerifyError::SubtreeRange {
                node,
                expected: placed.subtree,
                actual: subtree,
            });
        }
        if tree.dimension(node) != placed.dimension {
            return Err(VerifyError::Dimension { node });
        }
        let commands = tree.command_range(node);
        if commands != placed.commands {
            return Err(VerifyError::CommandRange {
                node,
                expected: placed.commands,
                actual: commands,
            });
        }
    }
    let buffers = [
        (BufferKind::Color, first_difference(&expected.color, actual.color().as_ref())),
        (BufferKind::Encode, first_difference(&expected.encode, actual.encode().as_ref())),
        (BufferKind::Spatial, first_difference(&expected.spatial, actual.spatial().as_ref())),
    ];
    for (buffer, difference) in buffers {
        if let Some(position) = difference {
            return Err(VerifyError::Buffer {
                viewport,
                buffer,
                position,
            });
        }
    }
    Ok(())
}

/// Checks every context of `cache` against a from-scratch collection of
/// `tree`.
///
/// Call right after a build: pending mutations are not reflected in the
/// cache yet and would be reported as mismatches.
///
/// # Errors
///
/// Returns the first mismatch found. Contexts are checked root first, then
/// nested viewports in discovery order.
pub fn verify<C2, C3, B2, B3>(
    tree: &SceneTree<C2, C3>,
    cache: &SceneGraphCache<B2, B3>,
) -> Result<(), VerifyError>
where
    C2: Command + PartialEq,
    C3: Command + PartialEq,
    B2: CommandBuffer<Command = C2> + AsRef<[C2]>,
    B3: CommandBuffer<Command = C3> + AsRef<[C3]>,
{
    let mut pending = alloc::vec![cache.root()];
    let mut seen: Vec<NodeId> = Vec::new();
    while let Some(viewport) = pending.pop() {
        let Some(actual) = cache.context(viewport) else {
            return Err(VerifyError::MissingContext { viewport });
        };
        let expected = expect_context(tree, viewport);
        compare_context(tree, viewport, &expected, actual)?;
        seen.push(viewport);
        pending.extend(expected.nested.iter().rev().copied());
    }
    for (viewport, _) in cache.contexts() {
        if !seen.contains(&viewport) {
            return Err(VerifyError::UnexpectedContext { viewport });
        }
    }
    Ok(())
}
