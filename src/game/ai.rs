//! Rival snake brain
//!
//! The rival re-evaluates its behaviour every `decision_interval_secs`:
//! it avoids the player when too close, chases food or the player when
//! within chase range, and otherwise wanders with a bias away from walls.
//! Between decisions it occasionally picks a random point to explore. A
//! separate attack policy decides when to launch a power ball at the player.

use std::f32::consts::{FRAC_PI_2, PI};

use rand::Rng;
use tracing::{debug, trace};

use super::config::{AggressiveConfig, AttackConfig, HitEffect, RivalConfig, RivalSpawn};
use super::geometry::{distance, heading_towards, Vec2};
use super::movement::{apply_move, candidate_head, steer_limited};
use super::state::{Faction, Field, Projectile, Snake};
use super::timer::{Countdown, TimedAbility};

/// Frame rate per-frame chances are expressed at
const FRAME_RATE: f32 = 60.0;

/// Behaviour picked by the last decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Avoid,
    Chase,
    Wander,
}

/// What the rival can see on a given tick
#[derive(Debug, Clone, Copy)]
pub struct Perception {
    /// `None` when the player is out of play
    pub player_head: Option<Vec2>,
    pub food: Option<Vec2>,
    pub field: Field,
}

/// Result of applying a projectile hit to a snake
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitOutcome {
    Trimmed(usize),
    Regenerating(f32),
    Ignored,
}

/// Apply a hit effect to `snake`, using `regeneration` as its out-of-play timer
pub fn apply_hit(snake: &mut Snake, effect: HitEffect, regeneration: &mut Countdown) -> HitOutcome {
    if regeneration.is_running() {
        return HitOutcome::Ignored;
    }
    match effect {
        HitEffect::TrimTail {
            segments,
            min_length,
        } => HitOutcome::Trimmed(snake.remove_tail(segments, min_length)),
        HitEffect::Regenerate {
            min_secs,
            secs_per_segment,
        } => {
            let secs = min_secs.max(snake.len() as f32 * secs_per_segment);
            regeneration.start(secs);
            HitOutcome::Regenerating(regeneration.remaining())
        }
    }
}

/// Ranged attack bookkeeping
#[derive(Debug, Clone, Default)]
pub struct AttackState {
    /// Launches stay locked until the player first uses an ability
    pub unlocked: bool,
    cooldown: Countdown,
    rapid_window: Countdown,
    rapid_interval: Countdown,
    last_target: Option<Vec2>,
    target_velocity: Vec2,
    target_speed: f32,
    pub launches: u32,
}

impl AttackState {
    pub fn tick(&mut self, dt: f32) {
        self.cooldown.tick(dt);
        self.rapid_window.tick(dt);
        self.rapid_interval.tick(dt);
    }

    pub fn is_ready(&self) -> bool {
        self.cooldown.is_ready()
    }

    pub fn in_rapid_exchange(&self) -> bool {
        self.rapid_window.is_running()
    }

    /// Track the target between ticks for lead aiming
    pub fn observe(&mut self, config: &AttackConfig, target: Vec2, dt: f32) {
        if let Some(last) = self.last_target {
            let velocity = (target - last).scaled(1.0 / dt);
            if velocity.is_finite() {
                self.target_velocity = velocity;
                let alpha = config.speed_smoothing.clamp(0.0, 1.0);
                self.target_speed += (velocity.length() - self.target_speed) * alpha;
            }
        }
        self.last_target = Some(target);
    }

    pub fn forget_target(&mut self) {
        self.last_target = None;
    }

    /// Weighted chance of launching this tick at distance `dist`
    pub fn launch_probability(&self, config: &AttackConfig, aggressiveness: f32, dist: f32) -> f32 {
        let half = (config.max_range - config.min_range) / 2.0;
        let mid = config.min_range + half;
        let range_score = if half > 0.0 {
            (1.0 - (dist - mid).abs() / half).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let sight_score = if dist < config.sight_ceiling { 1.0 } else { 0.0 };
        let speed = self.target_speed;
        let band = config.predictable_speed_min..=config.predictable_speed_max;
        let predictability = if band.contains(&speed) { 1.0 } else { 0.3 };

        let weighted = config.aggressiveness_weight * aggressiveness
            + config.range_weight * range_score
            + config.sight_weight * sight_score
            + config.predictability_weight * predictability;
        (config.fire_chance * weighted).clamp(0.0, 1.0)
    }

    /// Aim at where the target will be when the ball arrives
    pub fn aim(
        &self,
        config: &AttackConfig,
        from: Vec2,
        target: Vec2,
        fallback_heading: f32,
    ) -> Projectile {
        let travel = distance(from, target) / config.projectile_speed;
        let lead = target + self.target_velocity.scaled(travel);
        let dir = (lead - from)
            .normalized()
            .or_else(|| (target - from).normalized())
            .unwrap_or_else(|| Vec2::from_angle(fallback_heading));

        Projectile {
            pos: from,
            vel: dir.scaled(config.projectile_speed),
            size: config.projectile_radius,
            owner: Faction::Rival,
        }
    }

    /// Decide whether to launch at `target` this tick
    pub fn consider_launch<R: Rng>(
        &mut self,
        config: &AttackConfig,
        aggressiveness: f32,
        from: Vec2,
        target: Vec2,
        heading: f32,
        rng: &mut R,
    ) -> Option<Projectile> {
        if !self.unlocked {
            return None;
        }

        let dist = distance(from, target);
        if self.rapid_window.is_running() {
            if self.rapid_interval.is_ready() && dist <= config.max_range {
                self.rapid_interval.start(config.rapid_fire_interval_secs);
                self.launches += 1;
                trace!(dist, "Rapid exchange launch");
                return Some(self.aim(config, from, target, heading));
            }
            return None;
        }

        if !self.cooldown.is_ready() || dist < config.min_range || dist > config.max_range {
            return None;
        }

        let p = self.launch_probability(config, aggressiveness, dist);
        if rng.gen::<f32>() >= p {
            return None;
        }

        self.cooldown.start(config.cooldown_secs);
        if rng.gen::<f32>() < config.rapid_exchange_chance {
            debug!(secs = config.rapid_exchange_secs, "Rival opened a rapid exchange");
            self.rapid_window.start(config.rapid_exchange_secs);
            self.rapid_interval.start(config.rapid_fire_interval_secs);
        }
        self.launches += 1;
        trace!(dist, p, target_speed = self.target_speed, "Rival launched");
        Some(self.aim(config, from, target, heading))
    }

    /// Launch outside the weighted policy. Restarts the regular cooldown.
    pub fn forced_launch(
        &mut self,
        config: &AttackConfig,
        from: Vec2,
        target: Vec2,
        heading: f32,
    ) -> Projectile {
        self.cooldown.start(config.cooldown_secs);
        self.launches += 1;
        self.aim(config, from, target, heading)
    }
}

/// The AI-controlled snake and its decision state
#[derive(Debug, Clone)]
pub struct Rival {
    pub snake: Snake,
    pub behavior: Behavior,
    decision: Countdown,
    pub aggressive: TimedAbility,
    pub regeneration: Countdown,
    pub attack: AttackState,
    pub foods_eaten: u32,
}

impl Rival {
    pub fn spawn<R: Rng>(config: &RivalConfig, field: &Field, rng: &mut R) -> Self {
        let (head, heading) = match config.spawn {
            RivalSpawn::RandomCorner { inset } => {
                let x = if rng.gen_bool(0.5) { inset } else { field.width - inset };
                let y = if rng.gen_bool(0.5) { inset } else { field.height - inset };
                let head = Vec2::new(x, y);
                // Face into the field so the chain trails back towards the corner
                (head, heading_towards(head, field.center()))
            }
            RivalSpawn::Fraction { x, y } => (Vec2::new(field.width * x, field.height * y), PI),
        };

        let mut snake = Snake::new(
            head,
            heading,
            config.base_length,
            config.segment_radius,
            config.spacing,
        );
        for segment in &mut snake.segments {
            segment.pos = field.clamp(segment.pos, config.segment_radius);
        }
        snake.turn_gain = config.turn_gain;
        snake.speed = config.speed;
        snake.follow_fraction = config.follow_fraction;

        Self {
            snake,
            behavior: Behavior::Wander,
            decision: Countdown::new(),
            aggressive: TimedAbility::new(),
            regeneration: Countdown::new(),
            attack: AttackState::default(),
            foods_eaten: 0,
        }
    }

    /// The rival is out of play while regenerating
    pub fn is_active(&self) -> bool {
        self.regeneration.is_ready()
    }

    pub fn current_speed(&self, config: &RivalConfig) -> f32 {
        match &config.aggressive {
            Some(aggressive) if self.aggressive.is_active() => {
                self.snake.speed * aggressive.speed_multiplier
            }
            _ => self.snake.speed,
        }
    }

    /// Advance timers and run the decision loop. Returns a projectile when the
    /// attack policy fires.
    pub fn think<R: Rng>(
        &mut self,
        config: &RivalConfig,
        perception: &Perception,
        dt: f32,
        rng: &mut R,
    ) -> Option<Projectile> {
        self.attack.tick(dt);
        if self.regeneration.is_running() {
            if self.regeneration.tick(dt) {
                debug!(length = self.snake.len(), "Rival back in play");
            }
            return None;
        }

        if self.aggressive.tick(dt) {
            debug!("Rival aggressive mode ended");
        }
        if let Some(aggressive) = &config.aggressive {
            self.roll_spontaneous_aggression(aggressive, dt, rng);
        }

        let player = perception.player_head?;

        self.decision.tick(dt);
        if self.decision.is_ready() {
            self.decide(config, player, perception, rng);
            self.decision.start(config.decision_interval_secs);
        }

        if rng.gen::<f32>() < config.exploration_chance {
            self.explore(perception.field, rng);
        }

        let attack = config.attack.as_ref()?;
        self.attack.observe(attack, player, dt);
        self.attack.consider_launch(
            attack,
            config.aggressiveness,
            self.snake.head_pos(),
            player,
            self.snake.heading,
            rng,
        )
    }

    fn decide<R: Rng>(
        &mut self,
        config: &RivalConfig,
        player: Vec2,
        perception: &Perception,
        rng: &mut R,
    ) {
        let head = self.snake.head_pos();
        let dist = distance(head, player);

        let desired = if dist < config.avoid_radius {
            self.behavior = Behavior::Avoid;
            heading_towards(player, head)
        } else if dist < config.chase_radius && rng.gen::<f32>() < config.aggressiveness {
            self.behavior = Behavior::Chase;
            match perception.food {
                Some(food) => heading_towards(head, food),
                None => {
                    if let Some(aggressive) = &config.aggressive {
                        if rng.gen::<f32>() < aggressive.chance && self.enter_aggressive(aggressive)
                        {
                            debug!(
                                secs = aggressive.duration_secs,
                                "Rival turned aggressive on the chase"
                            );
                        }
                    }
                    heading_towards(head, player)
                }
            }
        } else {
            self.behavior = Behavior::Wander;
            self.wander_heading(config, perception.field, rng)
        };

        trace!(behavior = ?self.behavior, dist, desired, "Rival decision");
        if desired.is_finite() {
            self.snake.target_heading = desired;
        }
    }

    fn enter_aggressive(&mut self, config: &AggressiveConfig) -> bool {
        self.aggressive.try_activate(config.duration_secs, config.cooldown_secs)
    }

    /// Per-tick random entry into aggressive mode, scaled from a 60 Hz chance
    fn roll_spontaneous_aggression<R: Rng>(
        &mut self,
        config: &AggressiveConfig,
        dt: f32,
        rng: &mut R,
    ) {
        if config.random_chance <= 0.0 || !self.aggressive.can_activate() {
            return;
        }
        let frames = dt * FRAME_RATE;
        let chance = 1.0 - (1.0 - config.random_chance.clamp(0.0, 1.0)).powf(frames);
        if rng.gen::<f32>() < chance && self.enter_aggressive(config) {
            debug!(secs = config.duration_secs, "Rival turned aggressive at random");
        }
    }

    fn wander_heading<R: Rng>(&self, config: &RivalConfig, field: Field, rng: &mut R) -> f32 {
        let head = self.snake.head_pos();
        let mut heading = self.snake.target_heading;
        if rng.gen::<f32>() < config.wander_chance {
            heading += (rng.gen::<f32>() - 0.5) * config.wander_spread;
        }

        let margin = config.wall_margin;
        if head.x < margin {
            heading = 0.0;
        } else if head.x > field.width - margin {
            heading = PI;
        }
        if head.y < margin {
            heading = FRAC_PI_2;
        } else if head.y > field.height - margin {
            heading = -FRAC_PI_2;
        }
        heading
    }

    fn explore<R: Rng>(&mut self, field: Field, rng: &mut R) {
        let r = self.snake.radius();
        let (max_x, max_y) = (field.width - r, field.height - r);
        if max_x <= r || max_y <= r {
            return;
        }
        let point = Vec2::new(rng.gen_range(r..max_x), rng.gen_range(r..max_y));
        self.snake.target_heading = heading_towards(self.snake.head_pos(), point);
    }

    /// Steer, move and keep the rival inside the field
    pub fn advance(&mut self, config: &RivalConfig, field: &Field, dt: f32) {
        if !self.is_active() {
            return;
        }
        steer_limited(&mut self.snake, dt, Some(config.max_turn_per_decision));
        let speed = self.current_speed(config);
        if let Some(head) = candidate_head(&self.snake, speed, dt) {
            apply_move(&mut self.snake, head);
            self.bounce_off_walls(field);
        }
    }

    /// Reflect the heading off any wall the head crossed and pull it back in
    pub fn bounce_off_walls(&mut self, field: &Field) {
        let r = self.snake.radius();
        let head = self.snake.head_pos();
        let mut bounced = false;

        if head.x < r || head.x > field.width - r {
            self.snake.heading = PI - self.snake.heading;
            self.snake.target_heading = PI - self.snake.target_heading;
            bounced = true;
        }
        if head.y < r || head.y > field.height - r {
            self.snake.heading = -self.snake.heading;
            self.snake.target_heading = -self.snake.target_heading;
            bounced = true;
        }

        if bounced {
            self.snake.segments[0].pos = field.clamp(head, r);
            trace!(x = head.x, y = head.y, "Rival bounced off a wall");
        }
    }

    pub fn eat_food(&mut self, config: &RivalConfig) {
        self.snake.queue_growth(config.growth_per_food, config.max_length);
        self.foods_eaten += 1;
    }

    pub fn take_hit(&mut self, config: &RivalConfig) -> HitOutcome {
        let outcome = apply_hit(&mut self.snake, config.hit_effect, &mut self.regeneration);
        if matches!(outcome, HitOutcome::Regenerating(_)) {
            self.aggressive.active.clear();
            self.attack.forget_target();
        }
        outcome
    }
}
