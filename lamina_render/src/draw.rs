// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 2D draw operations.

use alloc::vec;
use alloc::vec::Vec;

use kurbo::Rect;
use lamina_core::command::{Channels, Command, Draw};

use crate::clip::ClipShape;

/// Straight-alpha RGBA, each component in `0.0..=1.0`.
pub type Color = [f32; 4];

/// A single 2D draw operation.
///
/// Operations are replayed in buffer order. Clip pushes and pops are written
/// to both channels so that the encode pass clips hit regions the same way
/// the color pass clips pixels.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Fill a rectangle.
    Fill {
        /// Area to fill.
        rect: Rect,
        /// Fill color.
        color: Color,
    },
    /// Stroke the outline of a rectangle.
    Stroke {
        /// Outline to stroke.
        rect: Rect,
        /// Stroke color.
        color: Color,
        /// Stroke width in user units.
        width: f64,
    },
    /// Intersect the current clip with a shape.
    PushClip(ClipShape),
    /// Restore the clip that was active before the matching push.
    PopClip,
    /// Write `id` into the encode target under `rect`.
    HitRegion {
        /// Area the id covers.
        rect: Rect,
        /// Id written to the encode target.
        id: u32,
    },
}

impl DrawOp {
    /// Shorthand for [`DrawOp::Fill`].
    #[must_use]
    pub fn fill(rect: Rect, color: Color) -> Self {
        Self::Fill { rect, color }
    }

    /// Shorthand for [`DrawOp::Stroke`].
    #[must_use]
    pub fn stroke(rect: Rect, color: Color, width: f64) -> Self {
        Self::Stroke { rect, color, width }
    }

    /// Shorthand for [`DrawOp::HitRegion`].
    #[must_use]
    pub fn hit(rect: Rect, id: u32) -> Self {
        Self::HitRegion { rect, id }
    }

    /// Wraps a node's own output and all of its descendants in a clip.
    ///
    /// The push and `body` go before the children; the pop goes after them.
    #[must_use]
    pub fn bracket(clip: impl Into<ClipShape>, body: impl IntoIterator<Item = Self>) -> Draw<Self> {
        let mut pre = vec![Self::PushClip(clip.into())];
        pre.extend(body);
        Draw {
            pre,
            post: vec![Self::PopClip],
        }
    }

    /// Area the operation touches, if it has one.
    ///
    /// Strokes are inflated by half their width.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Self::Fill { rect, .. } | Self::HitRegion { rect, .. } => Some(*rect),
            Self::Stroke { rect, width, .. } => Some(rect.inflate(width / 2.0, width / 2.0)),
            Self::PushClip(clip) => Some(clip.bounds()),
            Self::PopClip => None,
        }
    }
}

impl Command for DrawOp {
    fn channels(&self) -> Channels {
        match self {
            Self::Fill { .. } | Self::Stroke { .. } => Channels::COLOR,
            Self::HitRegion { .. } => Channels::ENCODE,
            Self::PushClip(_) | Self::PopClip => Channels::all(),
        }
    }
}

/// Ids of the hit regions in an encode buffer, in replay order.
#[must_use]
pub fn hit_ids(ops: &[DrawOp]) -> Vec<u32> {
    ops.iter()
        .filter_map(|op| match op {
            DrawOp::HitRegion { id, .. } => Some(*id),
            _ => None,
        })
        .collect()
}
