// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clip shapes for clip brackets.

use kurbo::{Point, Rect, RoundedRect, Shape};

/// A shape a subtree's output is clipped to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClipShape {
    /// An axis-aligned rectangle.
    Rect(Rect),
    /// A rectangle with rounded corners.
    RoundedRect(RoundedRect),
}

impl ClipShape {
    /// The smallest axis-aligned rectangle containing the shape.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        match self {
            Self::Rect(rect) => *rect,
            Self::RoundedRect(rounded) => rounded.bounding_box(),
        }
    }

    /// Returns `true` if `point` lies inside the clip.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        match self {
            Self::Rect(rect) => rect.contains(point),
            Self::RoundedRect(rounded) => rounded.contains(point),
        }
    }
}

impl From<Rect> for ClipShape {
    fn from(rect: Rect) -> Self {
        Self::Rect(rect)
    }
}

impl From<RoundedRect> for ClipShape {
    fn from(rounded: RoundedRect) -> Self {
        Self::RoundedRect(rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounded_corner_is_outside() {
        let clip = ClipShape::from(RoundedRect::new(0.0, 0.0, 20.0, 20.0, 8.0));
        assert_eq!(clip.bounds(), Rect::new(0.0, 0.0, 20.0, 20.0));
        assert!(clip.contains(Point::new(10.0, 10.0)));
        assert!(!clip.contains(Point::new(0.5, 0.5)));
    }

    #[test]
    fn rect_clip_matches_rect() {
        let rect = Rect::new(5.0, 5.0, 15.0, 10.0);
        let clip = ClipShape::from(rect);
        assert_eq!(clip.bounds(), rect);
        assert!(clip.contains(Point::new(5.0, 5.0)));
        assert!(!clip.contains(Point::new(15.0, 7.0)));
    }
}
