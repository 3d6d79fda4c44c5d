use std::f32::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

/// A point (or displacement) in field space, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` (radians, y grows downwards)
    pub fn from_angle(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn length(&self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Angle of this vector as returned by `atan2(y, x)`
    pub fn angle(&self) -> f32 {
        self.y.atan2(self.x)
    }

    pub fn scaled(&self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Unit vector in the same direction, or `None` for a degenerate vector
    pub fn normalized(&self) -> Option<Self> {
        let len = self.length();
        if len > f32::EPSILON && len.is_finite() {
            Some(self.scaled(1.0 / len))
        } else {
            None
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

/// Euclidean distance between two points
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (a - b).length()
}

/// Signed shortest angular delta from `current` to `target`, in `(-π, π]`
///
/// Non-finite inputs yield `0.0` so a single bad frame cannot spin a heading.
pub fn normalize_angle_diff(target: f32, current: f32) -> f32 {
    let mut diff = target - current;
    if !diff.is_finite() {
        return 0.0;
    }

    // Large multiples are folded first so the correction loops stay short.
    if diff.abs() > 4.0 * TAU {
        diff %= TAU;
    }
    while diff > PI {
        diff -= TAU;
    }
    while diff <= -PI {
        diff += TAU;
    }
    diff
}

/// Wrap an absolute angle into `(-π, π]`
pub fn wrap_angle(angle: f32) -> f32 {
    normalize_angle_diff(angle, 0.0)
}

/// Heading that points from `from` towards `to`
pub fn heading_towards(from: Vec2, to: Vec2) -> f32 {
    (to - from).angle()
}
