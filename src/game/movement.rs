//! Continuous-space steering and chain update
//!
//! A tick moves a snake in three steps: the heading eases towards its target,
//! a candidate head position is computed from heading and speed, and once the
//! rules engine accepts that candidate the chain is updated behind it. The
//! body follows with a single damped relaxation pass per tick, so segments
//! trail behind on sharp turns rather than snapping into place.

use super::geometry::{distance, normalize_angle_diff, wrap_angle, Vec2};
use super::state::{Segment, Snake};

/// Heading differences below this are treated as already on target
const HEADING_EPSILON: f32 = 1e-3;

/// Ease the heading towards the target heading
///
/// `heading += diff * turn_gain * dt`, with the blend factor capped at 1 so a
/// long frame can never overshoot the target.
pub fn steer(snake: &mut Snake, dt: f32) {
    steer_limited(snake, dt, None);
}

/// Like [`steer`], but the difference fed into the blend is first clamped to
/// `max_step` radians, so a large reversal turns as a wide arc
pub fn steer_limited(snake: &mut Snake, dt: f32, max_step: Option<f32>) {
    let mut diff = normalize_angle_diff(snake.target_heading, snake.heading);
    if diff.abs() <= HEADING_EPSILON {
        return;
    }
    if let Some(limit) = max_step {
        diff = diff.clamp(-limit, limit);
    }

    let blend = (snake.turn_gain * dt).clamp(0.0, 1.0);
    let next = snake.heading + diff * blend;
    if next.is_finite() {
        snake.heading = wrap_angle(next);
    }
}

/// Where the head would be after moving `speed * dt` along the heading
///
/// Returns `None` when the result is not finite; callers skip the move for
/// that tick.
pub fn candidate_head(snake: &Snake, speed: f32, dt: f32) -> Option<Vec2> {
    let step = Vec2::from_angle(snake.heading).scaled(speed * dt);
    let next = snake.head_pos() + step;
    next.is_finite().then_some(next)
}

/// Commit an accepted head position and update the chain behind it
pub fn apply_move(snake: &mut Snake, head: Vec2) {
    if !head.is_finite() || snake.is_empty() {
        return;
    }

    let linked = advance_head(snake, head);
    relax_chain(snake);
    grow_and_trim(snake, linked);
}

/// Move the head segment, leaving its old position behind as a new body
/// segment once it has pulled a full spacing away from the neck.
/// Returns whether a segment was inserted.
fn advance_head(snake: &mut Snake, head: Vec2) -> bool {
    let old = snake.head();
    let needs_link = match snake.segments.get(1) {
        Some(neck) => distance(old.pos, neck.pos) >= snake.spacing,
        None => true,
    };

    if needs_link {
        snake.segments.insert(1, Segment::new(old.pos, old.size));
    }
    snake.segments[0].pos = head;
    needs_link
}

/// One damped pass pulling each segment towards its predecessor
pub fn relax_chain(snake: &mut Snake) {
    let spacing = snake.spacing;
    let fraction = snake.follow_fraction;

    for i in 1..snake.segments.len() {
        let lead = snake.segments[i - 1].pos;
        let current = &mut snake.segments[i];

        let delta = lead - current.pos;
        let dist = delta.length();
        if !dist.is_finite() || dist <= f32::EPSILON || dist <= spacing {
            continue;
        }

        let pull = delta.scaled((dist - spacing) / dist * fraction);
        let next = current.pos + pull;
        if next.is_finite() {
            current.pos = next;
        }
    }
}

/// Consume one queued segment, then trim down to the desired length
///
/// A tick adds at most one segment: when the head already laid a new link
/// the link counts as the growth, otherwise the tail is duplicated.
fn grow_and_trim(snake: &mut Snake, linked: bool) {
    if snake.pending_growth > 0 {
        if !linked {
            let tail = snake.tail();
            snake.segments.push(tail);
        }
        snake.pending_growth -= 1;
    }

    let keep = snake.desired_length.max(1);
    if snake.segments.len() > keep {
        snake.segments.truncate(keep);
    }
}
