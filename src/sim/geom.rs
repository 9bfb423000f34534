//! Axis-aligned geometry shared by bodies, the grid and world bounds
//!
//! All rectangles are stored as top-left corner plus size, with y growing
//! downward (screen space): `up` means toward smaller y.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle (top-left + size)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from two corners (order independent)
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.right(), self.bottom())
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Strict intersection: touching edges do not count
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.right() <= other.left()
            || self.bottom() <= other.top()
            || self.left() >= other.right()
            || self.top() >= other.bottom())
    }

    /// Inclusive point containment
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }

    /// Closest point inside the rectangle to `p`
    pub fn clamp_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min(), self.max().max(self.min()))
    }

    /// Grow on every side by `margin`
    pub fn expanded(&self, margin: f32) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }

    /// True if every coordinate is finite and the size is positive
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::new(0.0, 0.0, crate::consts::WORLD_WIDTH, crate::consts::WORLD_HEIGHT)
    }
}

/// Per-side boolean flags, used for touching/blocked state and collision masks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sides {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Sides {
    pub const NONE: Sides = Sides {
        up: false,
        down: false,
        left: false,
        right: false,
    };

    pub const ALL: Sides = Sides {
        up: true,
        down: true,
        left: true,
        right: true,
    };

    pub const fn new(left: bool, right: bool, up: bool, down: bool) -> Self {
        Self {
            up,
            down,
            left,
            right,
        }
    }

    /// No side set
    #[inline]
    pub fn none(&self) -> bool {
        !(self.up || self.down || self.left || self.right)
    }

    #[inline]
    pub fn any(&self) -> bool {
        !self.none()
    }

    pub fn clear(&mut self) {
        *self = Sides::NONE;
    }

    /// Set the side facing direction `sign` on `axis` (+x = right, +y = down)
    pub fn set(&mut self, axis: Axis, sign: f32) {
        match axis {
            Axis::X if sign > 0.0 => self.right = true,
            Axis::X => self.left = true,
            Axis::Y if sign > 0.0 => self.down = true,
            Axis::Y => self.up = true,
        }
    }

    /// Read the side facing direction `sign` on `axis`
    pub fn get(&self, axis: Axis, sign: f32) -> bool {
        match axis {
            Axis::X if sign > 0.0 => self.right,
            Axis::X => self.left,
            Axis::Y if sign > 0.0 => self.down,
            Axis::Y => self.up,
        }
    }
}

/// Separation axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    #[inline]
    pub fn of(self, v: Vec2) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }

    #[inline]
    pub fn component_mut(self, v: &mut Vec2) -> &mut f32 {
        match self {
            Axis::X => &mut v.x,
            Axis::Y => &mut v.y,
        }
    }

    #[inline]
    pub fn other(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }

    /// Unit vector along this axis
    #[inline]
    pub fn unit(self) -> Vec2 {
        match self {
            Axis::X => Vec2::X,
            Axis::Y => Vec2::Y,
        }
    }
}

/// Direction of the last displacement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
}

impl Facing {
    /// Vertical motion wins over horizontal
    pub fn from_delta(delta: Vec2, current: Facing) -> Facing {
        if delta.y < 0.0 {
            Facing::Up
        } else if delta.y > 0.0 {
            Facing::Down
        } else if delta.x < 0.0 {
            Facing::Left
        } else if delta.x > 0.0 {
            Facing::Right
        } else {
            current
        }
    }
}
