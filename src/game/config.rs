use std::f32::consts::{FRAC_PI_4, PI};

use serde::{Deserialize, Serialize};

/// Rule set for a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameMode {
    Classic,
    TimeAttack,
    Obstacle,
}

impl GameMode {
    pub fn name(&self) -> &'static str {
        match self {
            GameMode::Classic => "classic",
            GameMode::TimeAttack => "time-attack",
            GameMode::Obstacle => "obstacle",
        }
    }
}

/// What happens when the player's head touches the rival's body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RivalContact {
    /// Touching the rival ends the round
    Lethal,
    /// Snakes phase through each other; conflict is settled by projectiles
    PassThrough,
}

/// Effect of a projectile striking a snake head
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HitEffect {
    /// Remove `segments` from the tail, never going below `min_length`
    TrimTail { segments: usize, min_length: usize },
    /// Take the snake out of play for `max(min_secs, len * secs_per_segment)`
    Regenerate { min_secs: f32, secs_per_segment: f32 },
}

/// Where the rival's chain is laid out at round start
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RivalSpawn {
    /// A random corner, `inset` pixels from both edges
    RandomCorner { inset: f32 },
    /// A fixed fraction of the field, facing left
    Fraction { x: f32, y: f32 },
}

/// Player snake tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Collision and render radius of every segment
    pub segment_radius: f32,
    /// Desired centre-to-centre distance between consecutive segments
    pub spacing: f32,
    /// Segment count at round start
    pub base_length: usize,
    /// Speed before level scaling, in pixels per second
    pub base_speed: f32,
    /// Pixels per second added to `base_speed` per level
    pub level_speed_bonus: f32,
    /// Fractional speed increase per level above 1
    pub level_speed_step: f32,
    /// Classic mode speed-up per food eaten, in pixels per second
    pub food_speed_step: f32,
    /// Cap on the accumulated classic speed-up
    pub max_food_speed_bonus: f32,
    /// Exponential smoothing constant for heading interpolation
    pub turn_gain: f32,
    /// Fraction of excess distance a body segment closes per tick
    pub follow_fraction: f32,
    /// Segments near the neck ignored by the self-collision check
    pub self_skip: usize,
    /// Self collision threshold as a multiple of `segment_radius`
    pub self_collision_factor: f32,
    /// Segments queued per food eaten
    pub growth_per_food: usize,
    /// Score needed per extra segment of desired length
    pub growth_divisor: u32,
    /// Points per food at level 1
    pub points_per_food: u32,
}

impl PlayerConfig {
    /// `(base + bonus * level) * (1 + step * (level - 1))`
    pub fn speed_for_level(&self, level: u32) -> f32 {
        let above = level.saturating_sub(1) as f32;
        let raw = self.base_speed + self.level_speed_bonus * level as f32;
        raw * (1.0 + above * self.level_speed_step)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            segment_radius: 15.0,
            spacing: 15.0,
            base_length: 3,
            base_speed: 100.0,
            level_speed_bonus: 20.0,
            level_speed_step: 0.2,
            food_speed_step: 2.0,
            max_food_speed_bonus: 60.0,
            turn_gain: 8.0,
            follow_fraction: 0.8,
            self_skip: 3,
            self_collision_factor: 1.2,
            growth_per_food: 2,
            growth_divisor: 5,
            points_per_food: 10,
        }
    }
}

/// Temporary speed-up the rival enters while chasing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggressiveConfig {
    /// Chance of turning aggressive when a chase targets the player
    pub chance: f32,
    /// Chance per 60 Hz frame of turning aggressive unprompted
    pub random_chance: f32,
    pub duration_secs: f32,
    pub cooldown_secs: f32,
    pub speed_multiplier: f32,
}

impl Default for AggressiveConfig {
    fn default() -> Self {
        Self {
            chance: 0.3,
            random_chance: 0.002,
            duration_secs: 3.0,
            cooldown_secs: 4.0,
            speed_multiplier: 1.5,
        }
    }
}

/// Ranged attack policy of the rival
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackConfig {
    /// Minimum gap between regular launches
    pub cooldown_secs: f32,
    /// Distance band in which a launch is considered
    pub min_range: f32,
    pub max_range: f32,
    /// Distance under which the target counts as in sight
    pub sight_ceiling: f32,
    /// Scales the weighted launch probability
    pub fire_chance: f32,
    pub aggressiveness_weight: f32,
    pub range_weight: f32,
    pub sight_weight: f32,
    pub predictability_weight: f32,
    /// Target speed band (px/s) considered predictable
    pub predictable_speed_min: f32,
    pub predictable_speed_max: f32,
    /// Smoothing factor for the target speed estimate
    pub speed_smoothing: f32,
    pub projectile_speed: f32,
    pub projectile_radius: f32,
    /// Chance that a launch opens a rapid exchange window
    pub rapid_exchange_chance: f32,
    pub rapid_exchange_secs: f32,
    /// Launch interval inside a rapid exchange window
    pub rapid_fire_interval_secs: f32,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 1.5,
            min_range: 60.0,
            max_range: 260.0,
            sight_ceiling: 220.0,
            fire_chance: 0.08,
            aggressiveness_weight: 0.4,
            range_weight: 0.3,
            sight_weight: 0.15,
            predictability_weight: 0.15,
            predictable_speed_min: 40.0,
            predictable_speed_max: 220.0,
            speed_smoothing: 0.2,
            projectile_speed: 280.0,
            projectile_radius: 8.0,
            rapid_exchange_chance: 0.25,
            rapid_exchange_secs: 3.0,
            rapid_fire_interval_secs: 0.4,
        }
    }
}

/// Periodic scripted power-ball exchange between the two snakes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub interval_secs: f32,
    /// Probability that the player fires first
    pub player_first_chance: f32,
    pub rival_answer_delay_secs: f32,
    pub player_answer_delay_secs: f32,
    /// Speed of the auto-aimed player ball
    pub player_ball_speed: f32,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5.0,
            player_first_chance: 0.6,
            rival_answer_delay_secs: 0.8,
            player_answer_delay_secs: 0.6,
            player_ball_speed: 360.0,
        }
    }
}

/// Named presets for the rival snake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RivalProfile {
    /// Slow deliberate rival, lethal to touch, no projectiles
    Classic,
    /// Twitchy rival that phases through and duels with power balls
    Duel,
}

/// Every tunable the rival AI reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RivalConfig {
    pub segment_radius: f32,
    pub spacing: f32,
    pub base_length: usize,
    pub max_length: usize,
    pub speed: f32,
    pub turn_gain: f32,
    pub follow_fraction: f32,
    pub spawn: RivalSpawn,

    /// Seconds between behaviour re-evaluations
    pub decision_interval_secs: f32,
    /// Probability of chasing when the player is within `chase_radius`
    pub aggressiveness: f32,
    pub avoid_radius: f32,
    pub chase_radius: f32,
    /// Largest heading change a single decision may request
    pub max_turn_per_decision: f32,
    /// Probability that a wander decision perturbs the heading
    pub wander_chance: f32,
    /// Full width of the random wander perturbation
    pub wander_spread: f32,
    /// Distance from a wall at which wandering is redirected inwards
    pub wall_margin: f32,
    /// Per-tick chance of heading for a random point instead
    pub exploration_chance: f32,

    pub contact: RivalContact,
    pub eats_food: bool,
    pub growth_per_food: usize,
    pub hit_effect: HitEffect,
    pub aggressive: Option<AggressiveConfig>,
    pub attack: Option<AttackConfig>,
    pub exchange: Option<ExchangeConfig>,
}

impl RivalConfig {
    pub fn from_profile(profile: RivalProfile, player_radius: f32) -> Self {
        match profile {
            RivalProfile::Classic => Self {
                segment_radius: 10.0,
                spacing: 14.0,
                base_length: 5,
                max_length: 15,
                speed: 90.0,
                turn_gain: 6.0,
                follow_fraction: 0.8,
                spawn: RivalSpawn::RandomCorner { inset: 50.0 },
                decision_interval_secs: 0.5,
                aggressiveness: 0.7,
                avoid_radius: 50.0,
                chase_radius: 100.0,
                max_turn_per_decision: PI,
                wander_chance: 0.3,
                wander_spread: PI,
                wall_margin: 30.0,
                exploration_chance: 0.002,
                contact: RivalContact::Lethal,
                eats_food: true,
                growth_per_food: 1,
                hit_effect: HitEffect::TrimTail {
                    segments: 2,
                    min_length: 3,
                },
                aggressive: None,
                attack: None,
                exchange: None,
            },
            RivalProfile::Duel => Self {
                segment_radius: player_radius * 0.9,
                spacing: player_radius * 0.9,
                base_length: 3,
                max_length: 15,
                speed: 80.0,
                turn_gain: 5.0,
                follow_fraction: 0.3,
                spawn: RivalSpawn::Fraction { x: 0.75, y: 0.25 },
                decision_interval_secs: 0.2,
                aggressiveness: 0.7,
                avoid_radius: 80.0,
                chase_radius: 150.0,
                max_turn_per_decision: FRAC_PI_4,
                wander_chance: 0.3,
                wander_spread: PI,
                wall_margin: 30.0,
                exploration_chance: 0.005,
                contact: RivalContact::PassThrough,
                eats_food: true,
                growth_per_food: 2,
                hit_effect: HitEffect::Regenerate {
                    min_secs: 2.0,
                    secs_per_segment: 0.1,
                },
                aggressive: Some(AggressiveConfig::default()),
                attack: Some(AttackConfig::default()),
                exchange: Some(ExchangeConfig::default()),
            },
        }
    }
}

impl Default for RivalConfig {
    fn default() -> Self {
        Self::from_profile(RivalProfile::Duel, PlayerConfig::default().segment_radius)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodConfig {
    pub radius: f32,
    /// Rejection-sampling attempts before the board is declared full
    pub placement_attempts: usize,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            radius: 12.0,
            placement_attempts: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstacleConfig {
    /// Obstacles at round start are `base_count + level`
    pub base_count: usize,
    pub min_radius: f32,
    pub max_radius: f32,
    /// Obstacles are kept this far from the field edges
    pub edge_margin: f32,
    pub placement_attempts: usize,
    /// Obstacles never spawn closer than this to the player's head
    pub head_clearance: f32,
    /// Simulated seconds between injection rolls
    pub inject_interval_secs: f32,
    pub inject_chance: f32,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            base_count: 3,
            min_radius: 15.0,
            max_radius: 30.0,
            edge_margin: 50.0,
            placement_attempts: 50,
            head_clearance: 80.0,
            inject_interval_secs: 10.0,
            inject_chance: 0.3,
        }
    }
}

/// Player projectile tuning and the effect of rival projectiles on the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileConfig {
    pub speed: f32,
    pub radius: f32,
    pub cooldown_secs: f32,
    /// Applied to the player when a rival ball lands
    pub player_hit: HitEffect,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            speed: 300.0,
            radius: 6.0,
            cooldown_secs: 1.0,
            player_hit: HitEffect::TrimTail {
                segments: 2,
                min_length: 3,
            },
        }
    }
}

/// Hands-free burst of speed that fires on a fixed cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoBoostConfig {
    pub interval_secs: f32,
    pub duration_secs: f32,
    pub multiplier: f32,
}

impl Default for AutoBoostConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5.0,
            duration_secs: 2.0,
            multiplier: 3.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityConfig {
    pub boost_duration_secs: f32,
    pub boost_cooldown_secs: f32,
    pub boost_multiplier: f32,
    /// `None` leaves boosting to the player
    pub auto_boost: Option<AutoBoostConfig>,
}

impl Default for AbilityConfig {
    fn default() -> Self {
        Self {
            boost_duration_secs: 2.0,
            boost_cooldown_secs: 5.0,
            boost_multiplier: 2.5,
            auto_boost: Some(AutoBoostConfig::default()),
        }
    }
}

/// Configuration for a game session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Width of the playing field in pixels
    pub field_width: f32,
    /// Height of the playing field in pixels
    pub field_height: f32,
    pub mode: GameMode,
    /// Difficulty scalar, starting at 1
    pub level: u32,
    /// Upper bound on a single tick's delta time, in seconds
    pub max_delta_secs: f32,
    /// Round length in time-attack mode
    pub time_limit_secs: f32,

    pub player: PlayerConfig,
    /// `None` plays without a rival
    pub rival: Option<RivalConfig>,
    pub food: FoodConfig,
    pub obstacles: ObstacleConfig,
    pub projectiles: ProjectileConfig,
    pub abilities: AbilityConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            field_width: 600.0,
            field_height: 600.0,
            mode: GameMode::Classic,
            level: 1,
            max_delta_secs: 0.1,
            time_limit_secs: 60.0,
            player: PlayerConfig::default(),
            rival: Some(RivalConfig::default()),
            food: FoodConfig::default(),
            obstacles: ObstacleConfig::default(),
            projectiles: ProjectileConfig::default(),
            abilities: AbilityConfig::default(),
        }
    }
}

impl GameConfig {
    /// Create a configuration for a mode and level with default tuning
    pub fn new(mode: GameMode, level: u32) -> Self {
        Self {
            mode,
            level: level.max(1),
            ..Default::default()
        }
    }

    /// Replace the rival with a preset, or remove it
    ///
    /// The automatic boost only runs against the duel rival.
    pub fn with_rival(mut self, profile: Option<RivalProfile>) -> Self {
        self.rival = profile.map(|p| RivalConfig::from_profile(p, self.player.segment_radius));
        self.abilities.auto_boost = match profile {
            Some(RivalProfile::Duel) => Some(AutoBoostConfig::default()),
            _ => None,
        };
        self
    }

    /// A small field without a rival for tests
    pub fn small() -> Self {
        Self {
            field_width: 300.0,
            field_height: 300.0,
            ..Default::default()
        }
        .with_rival(None)
    }

    /// Score awarded per food at the configured level
    pub fn points_per_food(&self) -> u32 {
        self.player.points_per_food * self.level
    }

    /// Validate configuration parameters
    ///
    /// # Returns
    ///
    /// `Ok(())` if all parameters are valid, `Err(String)` with an error message otherwise.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.field_width > 0.0 && self.field_height > 0.0) {
            return Err(format!(
                "field must have positive size, got {}x{}",
                self.field_width, self.field_height
            ));
        }

        if self.level == 0 {
            return Err("level must be at least 1".to_string());
        }

        if !(self.max_delta_secs > 0.0) {
            return Err(format!(
                "max_delta_secs must be positive, got {}",
                self.max_delta_secs
            ));
        }

        if self.mode == GameMode::TimeAttack && !(self.time_limit_secs > 0.0) {
            return Err(format!(
                "time_limit_secs must be positive in time-attack mode, got {}",
                self.time_limit_secs
            ));
        }

        let player = &self.player;
        if !(player.segment_radius > 0.0) || !(player.spacing > 0.0) {
            return Err("player segment_radius and spacing must be positive".to_string());
        }

        if player.base_length < 2 {
            return Err(format!(
                "player base_length must be at least 2, got {}",
                player.base_length
            ));
        }

        if player.segment_radius * 2.0 >= self.field_width.min(self.field_height) {
            return Err("field is too small for the player snake".to_string());
        }

        if !(player.base_speed > 0.0) {
            return Err(format!("player base_speed must be positive, got {}", player.base_speed));
        }

        if !(0.0..=1.0).contains(&player.follow_fraction) {
            return Err(format!(
                "player follow_fraction must be in [0, 1], got {}",
                player.follow_fraction
            ));
        }

        if player.food_speed_step < 0.0 || player.max_food_speed_bonus < 0.0 {
            return Err("player food speed-up cannot be negative".to_string());
        }

        if player.growth_divisor == 0 {
            return Err("player growth_divisor must be at least 1".to_string());
        }

        if let Some(rival) = &self.rival {
            if !(rival.segment_radius > 0.0) || !(rival.spacing > 0.0) {
                return Err("rival segment_radius and spacing must be positive".to_string());
            }

            if rival.base_length == 0 || rival.base_length > rival.max_length {
                return Err(format!(
                    "rival base_length ({}) must be in 1..=max_length ({})",
                    rival.base_length, rival.max_length
                ));
            }

            if !(rival.decision_interval_secs > 0.0) {
                return Err(format!(
                    "rival decision_interval_secs must be positive, got {}",
                    rival.decision_interval_secs
                ));
            }

            if !(0.0..=1.0).contains(&rival.aggressiveness) {
                return Err(format!(
                    "rival aggressiveness must be in [0, 1], got {}",
                    rival.aggressiveness
                ));
            }

            if rival.avoid_radius > rival.chase_radius {
                return Err(format!(
                    "rival avoid_radius ({}) cannot exceed chase_radius ({})",
                    rival.avoid_radius, rival.chase_radius
                ));
            }

            if let Some(attack) = &rival.attack {
                if attack.min_range > attack.max_range {
                    return Err(format!(
                        "attack min_range ({}) cannot exceed max_range ({})",
                        attack.min_range, attack.max_range
                    ));
                }

                if !(attack.projectile_speed > 0.0) {
                    return Err("attack projectile_speed must be positive".to_string());
                }
            }
        }

        if let Some(auto) = &self.abilities.auto_boost {
            if !(auto.interval_secs > 0.0) || auto.duration_secs < 0.0 {
                return Err(format!(
                    "auto boost interval ({}) must be positive and duration ({}) non-negative",
                    auto.interval_secs, auto.duration_secs
                ));
            }
        }

        if self.food.placement_attempts == 0 {
            return Err("food placement_attempts must be at least 1".to_string());
        }

        if self.obstacles.min_radius > self.obstacles.max_radius {
            return Err(format!(
                "obstacle min_radius ({}) cannot exceed max_radius ({})",
                self.obstacles.min_radius, self.obstacles.max_radius
            ));
        }

        Ok(())
    }
}
