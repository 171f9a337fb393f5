// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Half-open interval arithmetic for flat-array and command-buffer positions.
//!
//! Every type here is a small `Copy` value and every operation returns a new
//! value instead of mutating in place. The operations are total: offsets
//! saturate at zero, resizes never move an end before its start, and
//! [`with_clamp`](Segment::with_clamp) pulls every bound under an externally
//! supplied length (used right after a backing buffer shrank or before it has
//! grown to its final size).
//!
//! The layering is:
//!
//! - [`ShortRange`]: a plain `[start, end)` interval; used for a node's
//!   position in the flat array.
//! - [`Segment`]: `[start, end)` plus an `extend` high-water mark, with
//!   `start <= end <= extend`.
//! - [`Variant`]: a `pre` and a `post` segment for one output channel, with
//!   `pre.end <= post.start`. Pre commands live in `[pre.start, pre.end)`,
//!   descendant output in `[pre.end, post.start)` and post commands in
//!   `[post.start, post.end)`. The pre segment's `extend` always reaches to
//!   `post.start`.
//! - [`CommandRange`]: one [`Variant`] per 2D channel (color and encode).

use core::fmt;
use core::ops::Range;

#[inline]
fn shift(value: u32, delta: i32) -> u32 {
    value.saturating_add_signed(delta)
}

/// A half-open `[start, end)` interval of flat-array positions.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ShortRange {
    /// First position covered.
    pub start: u32,
    /// One past the last position covered.
    pub end: u32,
}

impl ShortRange {
    /// The empty range at position zero.
    pub const EMPTY: Self = Self { start: 0, end: 0 };

    /// Creates a range, raising `end` to `start` if it lies before it.
    #[inline]
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self {
            start,
            end: if end < start { start } else { end },
        }
    }

    /// Number of positions covered.
    #[inline]
    #[must_use]
    pub const fn len(self) -> u32 {
        self.end - self.start
    }

    /// Returns `true` if the range covers nothing.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Returns `true` if `position` lies inside the range.
    #[inline]
    #[must_use]
    pub const fn contains(self, position: u32) -> bool {
        self.start <= position && position < self.end
    }

    /// Replaces the end, never moving it before the start.
    #[inline]
    #[must_use]
    pub const fn with_end(self, end: u32) -> Self {
        Self::new(self.start, end)
    }

    /// Moves both bounds by `delta`.
    #[inline]
    #[must_use]
    pub fn with_offset(self, delta: i32) -> Self {
        Self::new(shift(self.start, delta), shift(self.end, delta))
    }

    /// Grows (or shrinks) the end by `delta`.
    #[inline]
    #[must_use]
    pub fn with_resize(self, delta: i32) -> Self {
        self.with_end(shift(self.end, delta))
    }

    /// Pulls both bounds under `max`.
    #[inline]
    #[must_use]
    pub fn with_clamp(self, max: u32) -> Self {
        Self::new(self.start.min(max), self.end.min(max))
    }

    /// Converts to a `usize` range for slicing.
    #[inline]
    #[must_use]
    pub const fn as_range(self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl fmt::Debug for ShortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A `[start, end)` interval with an `extend` high-water mark.
///
/// Invariant: `start <= end <= extend`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Segment {
    /// First position of the segment's own content.
    pub start: u32,
    /// One past the last position of the segment's own content.
    pub end: u32,
    /// Furthest position this segment governs while its owner is resized.
    pub extend: u32,
}

impl Segment {
    /// Creates a segment, restoring `start <= end <= extend` if needed.
    #[inline]
    #[must_use]
    pub const fn new(start: u32, end: u32, extend: u32) -> Self {
        let end = if end < start { start } else { end };
        let extend = if extend < end { end } else { extend };
        Self { start, end, extend }
    }

    /// A zero-length segment at `at`.
    #[inline]
    #[must_use]
    pub const fn point(at: u32) -> Self {
        Self {
            start: at,
            end: at,
            extend: at,
        }
    }

    /// Length of the segment's own content.
    #[inline]
    #[must_use]
    pub const fn len(self) -> u32 {
        self.end - self.start
    }

    /// Returns `true` if the segment holds no content.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Replaces the end, raising `extend` along with it when needed.
    #[inline]
    #[must_use]
    pub const fn with_end(self, end: u32) -> Self {
        Self::new(self.start, end, self.extend)
    }

    /// Replaces the high-water mark, never dropping it below the end.
    #[inline]
    #[must_use]
    pub const fn with_extend(self, extend: u32) -> Self {
        Self::new(self.start, self.end, extend)
    }

    /// Moves all three bounds by `delta`.
    #[inline]
    #[must_use]
    pub fn with_offset(self, delta: i32) -> Self {
        Self::new(
            shift(self.start, delta),
            shift(self.end, delta),
            shift(self.extend, delta),
        )
    }

    /// Grows (or shrinks) the content by `delta`, carrying `extend` along.
    #[inline]
    #[must_use]
    pub fn with_resize(self, delta: i32) -> Self {
        Self::new(self.start, shift(self.end, delta), shift(self.extend, delta))
    }

    /// Pulls all three bounds under `max`.
    #[inline]
    #[must_use]
    pub fn with_clamp(self, max: u32) -> Self {
        Self::new(
            self.start.min(max),
            self.end.min(max),
            self.extend.min(max),
        )
    }

    /// Converts the content to a `usize` range for slicing.
    #[inline]
    #[must_use]
    pub const fn as_range(self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}(^{})", self.start, self.end, self.extend)
    }
}

/// The pre/post split of one node's output in one channel.
///
/// Invariant: `pre.end <= post.start`, and `pre.extend == post.start`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Variant {
    /// Commands emitted before the node's descendants.
    pub pre: Segment,
    /// Commands emitted after the node's descendants.
    pub post: Segment,
}

impl Variant {
    /// Creates a variant from the four content bounds.
    #[must_use]
    pub fn new(pre_start: u32, pre_end: u32, post_start: u32, post_end: u32) -> Self {
        Self::normalized(
            Segment::new(pre_start, pre_end, pre_end),
            Segment::new(post_start, post_end, post_end),
        )
    }

    /// A variant with no content and no descendants at `at`.
    #[inline]
    #[must_use]
    pub const fn point(at: u32) -> Self {
        Self {
            pre: Segment::point(at),
            post: Segment::point(at),
        }
    }

    fn normalized(pre: Segment, post: Segment) -> Self {
        let post_start = post.start.max(pre.end);
        let post = Segment::new(post_start, post.end, post.extend);
        let pre = Segment::new(pre.start, pre.end, post.start);
        Self { pre, post }
    }

    /// First position covered by the node (start of its pre commands).
    #[inline]
    #[must_use]
    pub const fn start(self) -> u32 {
        self.pre.start
    }

    /// One past the last position covered by the node (end of its post commands).
    #[inline]
    #[must_use]
    pub const fn end(self) -> u32 {
        self.post.end
    }

    /// Total length, including descendant output.
    #[inline]
    #[must_use]
    pub const fn len(self) -> u32 {
        self.post.end - self.pre.start
    }

    /// Returns `true` if the node covers nothing in this channel.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.post.end == self.pre.start
    }

    /// The full span as a `usize` range.
    #[inline]
    #[must_use]
    pub const fn as_range(self) -> Range<usize> {
        self.pre.start as usize..self.post.end as usize
    }

    /// The descendant span `[pre.end, post.start)` as a `usize` range.
    #[inline]
    #[must_use]
    pub const fn inner(self) -> Range<usize> {
        self.pre.end as usize..self.post.start as usize
    }

    /// Replaces the end of the pre commands, pushing the post segment forward
    /// if it would otherwise start before it.
    #[must_use]
    pub fn with_pre_end(self, end: u32) -> Self {
        Self::normalized(self.pre.with_end(end), self.post)
    }

    /// Replaces the start of the post commands, keeping `pre.end <= post.start`.
    #[must_use]
    pub fn with_post_start(self, start: u32) -> Self {
        Self::normalized(
            self.pre,
            Segment::new(start, self.post.end, self.post.extend),
        )
    }

    /// Replaces the end of the post commands.
    #[must_use]
    pub fn with_post_end(self, end: u32) -> Self {
        Self::normalized(self.pre, self.post.with_end(end).with_extend(end))
    }

    /// Moves the post segment by `delta`; used when descendant output changed
    /// length by `delta`.
    #[must_use]
    pub fn with_post_offset(self, delta: i32) -> Self {
        Self::normalized(self.pre, self.post.with_offset(delta))
    }

    /// Moves the whole variant by `delta`.
    #[must_use]
    pub fn with_offset(self, delta: i32) -> Self {
        Self::normalized(self.pre.with_offset(delta), self.post.with_offset(delta))
    }

    /// Resizes the pre commands by `delta`, moving everything after them.
    #[must_use]
    pub fn with_pre_resize(self, delta: i32) -> Self {
        Self::normalized(self.pre.with_resize(delta), self.post.with_offset(delta))
    }

    /// Resizes the post commands by `delta`.
    #[must_use]
    pub fn with_post_resize(self, delta: i32) -> Self {
        Self::normalized(self.pre, self.post.with_resize(delta))
    }

    /// Pulls every bound under `max`.
    #[must_use]
    pub fn with_clamp(self, max: u32) -> Self {
        Self::normalized(self.pre.with_clamp(max), self.post.with_clamp(max))
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variant")
            .field("pre", &self.pre)
            .field("post", &self.post)
            .finish()
    }
}

/// A node's position in both 2D channels.
///
/// 3D nodes only use [`color`](Self::color); their `encode` variant stays at
/// zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CommandRange {
    /// Position in the color buffer (and the single 3D buffer).
    pub color: Variant,
    /// Position in the encode buffer.
    pub encode: Variant,
}

impl CommandRange {
    /// A range with no content at the given offsets.
    #[inline]
    #[must_use]
    pub const fn point(color: u32, encode: u32) -> Self {
        Self {
            color: Variant::point(color),
            encode: Variant::point(encode),
        }
    }

    /// Moves both channels.
    #[must_use]
    pub fn with_offset(self, color: i32, encode: i32) -> Self {
        Self {
            color: self.color.with_offset(color),
            encode: self.encode.with_offset(encode),
        }
    }

    /// Moves the post segments of both channels.
    #[must_use]
    pub fn with_post_offset(self, color: i32, encode: i32) -> Self {
        Self {
            color: self.color.with_post_offset(color),
            encode: self.encode.with_post_offset(encode),
        }
    }

    /// Pulls each channel under its buffer length.
    #[must_use]
    pub fn with_clamp(self, color_len: u32, encode_len: u32) -> Self {
        Self {
            color: self.color.with_clamp(color_len),
            encode: self.encode.with_clamp(encode_len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_segment_ok(s: Segment) {
        assert!(s.start <= s.end, "start > end in {s:?}");
        assert!(s.end <= s.extend, "end > extend in {s:?}");
    }

    fn assert_variant_ok(v: Variant) {
        assert_segment_ok(v.pre);
        assert_segment_ok(v.post);
        assert!(v.pre.end <= v.post.start, "pre overlaps post in {v:?}");
        assert_eq!(v.pre.extend, v.post.start, "pre extend detached in {v:?}");
    }

    #[test]
    fn short_range_basics() {
        let r = ShortRange::new(3, 7);
        assert_eq!(r.len(), 4);
        assert!(r.contains(3));
        assert!(r.contains(6));
        assert!(!r.contains(7));
        assert!(!r.is_empty());
        assert_eq!(r.as_range(), 3..7);
    }

    #[test]
    fn short_range_new_never_inverts() {
        let r = ShortRange::new(5, 2);
        assert_eq!(r, ShortRange::new(5, 5));
        assert!(r.is_empty());
    }

    #[test]
    fn short_range_offset_saturates() {
        assert_eq!(ShortRange::new(3, 7).with_offset(2), ShortRange::new(5, 9));
        assert_eq!(ShortRange::new(3, 7).with_offset(-5), ShortRange::new(0, 2));
        assert_eq!(ShortRange::new(3, 7).with_offset(-10), ShortRange::new(0, 0));
    }

    #[test]
    fn short_range_resize_and_clamp() {
        let r = ShortRange::new(2, 4);
        assert_eq!(r.with_resize(3), ShortRange::new(2, 7));
        assert_eq!(r.with_resize(-5), ShortRange::new(2, 2));
        assert_eq!(r.with_end(10), ShortRange::new(2, 10));
        assert_eq!(r.with_clamp(3), ShortRange::new(2, 3));
        assert_eq!(r.with_clamp(1), ShortRange::new(1, 1));
    }

    #[test]
    fn segment_new_restores_order() {
        assert_eq!(Segment::new(4, 2, 1), Segment::new(4, 4, 4));
        assert_eq!(Segment::new(1, 3, 2), Segment::new(1, 3, 3));
        assert_segment_ok(Segment::new(9, 0, 5));
    }

    #[test]
    fn segment_with_end_raises_extend() {
        let s = Segment::new(2, 4, 6);
        assert_eq!(s.with_end(5), Segment::new(2, 5, 6));
        assert_eq!(s.with_end(8), Segment::new(2, 8, 8));
        assert_eq!(s.with_end(0), Segment::new(2, 2, 6));
    }

    #[test]
    fn segment_offset_and_resize() {
        let s = Segment::new(2, 4, 6);
        assert_eq!(s.with_offset(3), Segment::new(5, 7, 9));
        assert_eq!(s.with_offset(-3), Segment::new(0, 1, 3));
        assert_eq!(s.with_resize(2), Segment::new(2, 6, 8));
        assert_eq!(s.with_resize(-1), Segment::new(2, 3, 5));
        // Shrinking past the start collapses to a point that keeps its start.
        let collapsed = s.with_resize(-10);
        assert_eq!(collapsed.start, 2);
        assert!(collapsed.is_empty());
        assert_segment_ok(collapsed);
    }

    #[test]
    fn segment_clamp() {
        let s = Segment::new(2, 4, 6);
        assert_eq!(s.with_clamp(5), Segment::new(2, 4, 5));
        assert_eq!(s.with_clamp(3), Segment::new(2, 3, 3));
        assert_eq!(s.with_clamp(0), Segment::point(0));
    }

    #[test]
    fn segment_ops_preserve_invariant() {
        let seeds = [
            Segment::point(0),
            Segment::new(0, 3, 3),
            Segment::new(2, 4, 9),
            Segment::new(7, 7, 12),
        ];
        for s in seeds {
            for d in -12..=12 {
                assert_segment_ok(s.with_offset(d));
                assert_segment_ok(s.with_resize(d));
            }
            for v in 0..=14 {
                assert_segment_ok(s.with_end(v));
                assert_segment_ok(s.with_extend(v));
                assert_segment_ok(s.with_clamp(v));
            }
        }
    }

    #[test]
    fn variant_layout() {
        let v = Variant::new(2, 4, 9, 10);
        assert_eq!(v.start(), 2);
        assert_eq!(v.end(), 10);
        assert_eq!(v.len(), 8);
        assert_eq!(v.inner(), 4..9);
        assert_eq!(v.pre.extend, 9);
        assert_variant_ok(v);
    }

    #[test]
    fn variant_new_repairs_overlap() {
        let v = Variant::new(2, 6, 4, 5);
        assert_eq!(v.post.start, 6);
        assert_eq!(v.post.end, 6);
        assert_variant_ok(v);
    }

    #[test]
    fn variant_point_is_empty() {
        let v = Variant::point(5);
        assert!(v.is_empty());
        assert_eq!(v.as_range(), 5..5);
        assert_variant_ok(v);
    }

    #[test]
    fn variant_pre_end_pushes_post() {
        let v = Variant::new(0, 2, 3, 4);
        let grown = v.with_pre_end(5);
        assert_eq!(grown.pre.end, 5);
        assert_eq!(grown.post.start, 5);
        assert_variant_ok(grown);

        let shrunk = v.with_pre_end(1);
        assert_eq!(shrunk.pre.end, 1);
        assert_eq!(shrunk.post.start, 3);
        assert_variant_ok(shrunk);
    }

    #[test]
    fn variant_post_start_and_end() {
        let v = Variant::new(0, 2, 5, 6);
        assert_eq!(v.with_post_start(1).post.start, 2);
        assert_eq!(v.with_post_start(4).post.start, 4);
        assert_eq!(v.with_post_end(9).post.end, 9);
        assert_eq!(v.with_post_end(9).post.extend, 9);
        assert_eq!(v.with_post_end(3).post.end, 5);
        assert_variant_ok(v.with_post_start(1));
        assert_variant_ok(v.with_post_end(3));
    }

    #[test]
    fn variant_post_offset_moves_only_post() {
        let v = Variant::new(1, 3, 6, 8);
        let moved = v.with_post_offset(4);
        assert_eq!(moved, Variant::new(1, 3, 10, 12));
        let back = v.with_post_offset(-2);
        assert_eq!(back, Variant::new(1, 3, 4, 6));
        // Pulling the post segment before the pre end pins it there.
        let pinned = v.with_post_offset(-6);
        assert_eq!(pinned.post.start, 3);
        assert_variant_ok(pinned);
    }

    #[test]
    fn variant_resizes() {
        let v = Variant::new(1, 3, 6, 8);
        assert_eq!(v.with_pre_resize(2), Variant::new(1, 5, 8, 10));
        assert_eq!(v.with_pre_resize(-2), Variant::new(1, 1, 4, 6));
        assert_eq!(v.with_post_resize(3), Variant::new(1, 3, 6, 11));
        assert_eq!(v.with_post_resize(-2), Variant::new(1, 3, 6, 6));
        assert_eq!(v.with_offset(-1), Variant::new(0, 2, 5, 7));
    }

    #[test]
    fn variant_shrink_to_zero_keeps_position() {
        let v = Variant::new(4, 6, 6, 7);
        let empty = v.with_pre_resize(-2).with_post_resize(-1);
        assert_eq!(empty, Variant::point(4));
    }

    #[test]
    fn variant_clamp_against_short_buffer() {
        let v = Variant::new(2, 4, 8, 12);
        let c = v.with_clamp(6);
        assert_eq!(c, Variant::new(2, 4, 6, 6));
        assert_variant_ok(c);
        assert_eq!(v.with_clamp(0), Variant::point(0));
    }

    #[test]
    fn variant_ops_preserve_invariant() {
        let seeds = [
            Variant::point(0),
            Variant::new(0, 2, 2, 3),
            Variant::new(1, 3, 6, 8),
            Variant::new(5, 5, 9, 9),
        ];
        for v in seeds {
            for d in -10..=10 {
                assert_variant_ok(v.with_offset(d));
                assert_variant_ok(v.with_post_offset(d));
                assert_variant_ok(v.with_pre_resize(d));
                assert_variant_ok(v.with_post_resize(d));
            }
            for x in 0..=12 {
                assert_variant_ok(v.with_pre_end(x));
                assert_variant_ok(v.with_post_start(x));
                assert_variant_ok(v.with_post_end(x));
                assert_variant_ok(v.with_clamp(x));
            }
        }
    }

    #[test]
    fn command_range_channels_are_independent() {
        let r = CommandRange {
            color: Variant::new(0, 1, 4, 5),
            encode: Variant::new(0, 0, 2, 2),
        };
        let moved = r.with_offset(3, -1);
        assert_eq!(moved.color, Variant::new(3, 4, 7, 8));
        assert_eq!(moved.encode, Variant::new(0, 0, 1, 1));

        let grown = r.with_post_offset(2, 1);
        assert_eq!(grown.color, Variant::new(0, 1, 6, 7));
        assert_eq!(grown.encode, Variant::new(0, 0, 3, 3));

        let clamped = r.with_clamp(3, 10);
        assert_eq!(clamped.color, Variant::new(0, 1, 3, 3));
        assert_eq!(clamped.encode, r.encode);
    }
}
