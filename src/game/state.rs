use super::geometry::{distance, Vec2};

/// One link of a snake chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub pos: Vec2,
    /// Collision and render radius
    pub size: f32,
}

impl Segment {
    pub fn new(pos: Vec2, size: f32) -> Self {
        Self { pos, size }
    }
}

/// A snake in continuous space
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    /// Chain segments, with head at index 0
    pub segments: Vec<Segment>,
    /// Current movement angle in radians
    pub heading: f32,
    /// Angle the heading is interpolating towards
    pub target_heading: f32,
    /// Smoothing constant for heading interpolation (per second)
    pub turn_gain: f32,
    /// Base speed in pixels per second, before modifiers
    pub speed: f32,
    /// Desired centre-to-centre distance between consecutive segments
    pub spacing: f32,
    /// Fraction of excess distance closed per relaxation pass
    pub follow_fraction: f32,
    /// Target segment count; the tail is trimmed down to this
    pub desired_length: usize,
    /// Segments still to be appended, one per tick
    pub pending_growth: usize,
}

impl Snake {
    /// Lay out `length` segments behind `head`, opposite to `heading`
    pub fn new(head: Vec2, heading: f32, length: usize, radius: f32, spacing: f32) -> Self {
        let back = Vec2::from_angle(heading).scaled(-spacing);
        let length = length.max(1);
        let segments = (0..length)
            .map(|i| Segment::new(head + back.scaled(i as f32), radius))
            .collect();

        Self {
            segments,
            heading,
            target_heading: heading,
            turn_gain: 8.0,
            speed: 100.0,
            spacing,
            follow_fraction: 0.8,
            desired_length: length,
            pending_growth: 0,
        }
    }

    /// Head segment. Chains are never empty.
    pub fn head(&self) -> Segment {
        self.segments[0]
    }

    pub fn head_pos(&self) -> Vec2 {
        self.segments[0].pos
    }

    pub fn tail(&self) -> Segment {
        self.segments[self.segments.len() - 1]
    }

    pub fn radius(&self) -> f32 {
        self.segments[0].size
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the snake is empty (should never happen in practice)
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Queue `count` extra segments and raise the desired length to match,
    /// never beyond `cap`
    pub fn queue_growth(&mut self, count: usize, cap: usize) {
        let room = cap.saturating_sub(self.desired_length);
        let count = count.min(room);
        self.desired_length += count;
        self.pending_growth += count;
    }

    /// Drop up to `count` tail segments, keeping at least `min_length`
    pub fn remove_tail(&mut self, count: usize, min_length: usize) -> usize {
        let keep = min_length.max(1);
        let removable = self.segments.len().saturating_sub(keep).min(count);
        let new_len = self.segments.len() - removable;
        self.segments.truncate(new_len);
        self.desired_length = self.desired_length.min(new_len.max(keep));
        self.pending_growth = 0;
        removable
    }

    /// Whether any segment from `skip` onwards lies within `threshold` of `point`
    pub fn touches(&self, point: Vec2, threshold: f32, skip: usize) -> bool {
        self.segments
            .iter()
            .skip(skip)
            .any(|s| distance(point, s.pos) < threshold)
    }
}

/// Consumable that grows the snake
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Food {
    pub pos: Vec2,
}

/// Static round hazard
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub pos: Vec2,
    pub size: f32,
}

/// Which side launched a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Faction {
    Player,
    Rival,
}

impl Faction {
    pub fn opponent(&self) -> Faction {
        match self {
            Faction::Player => Faction::Rival,
            Faction::Rival => Faction::Player,
        }
    }
}

/// A power ball in flight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    pub pos: Vec2,
    /// Velocity in pixels per second
    pub vel: Vec2,
    pub size: f32,
    pub owner: Faction,
}

impl Projectile {
    pub fn advance(&mut self, dt: f32) {
        self.pos += self.vel.scaled(dt);
    }

    pub fn is_out_of_bounds(&self, width: f32, height: f32) -> bool {
        self.pos.x < 0.0 || self.pos.x > width || self.pos.y < 0.0 || self.pos.y > height
    }
}

/// Axis-aligned playing field with its origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field {
    pub width: f32,
    pub height: f32,
}

impl Field {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Whether a circle of `radius` at `pos` pokes past an edge
    pub fn crosses_edge(&self, pos: Vec2, radius: f32) -> bool {
        pos.x < radius
            || pos.x > self.width - radius
            || pos.y < radius
            || pos.y > self.height - radius
    }

    pub fn clamp(&self, pos: Vec2, margin: f32) -> Vec2 {
        Vec2::new(
            pos.x.clamp(margin, (self.width - margin).max(margin)),
            pos.y.clamp(margin, (self.height - margin).max(margin)),
        )
    }
}
