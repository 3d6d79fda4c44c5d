//! Headless rounds driven by a scripted pilot
//!
//! Useful for soak-testing the simulation and for tuning the rival: every
//! round runs at a fixed tick with no terminal attached, and a per-round
//! summary plus totals are printed at the end.

use anyhow::{ensure, Result};
use std::f32::consts::FRAC_PI_2;
use tracing::{debug, info};

use crate::game::geometry::{distance, heading_towards, normalize_angle_diff};
use crate::game::{
    Ability, GameConfig, GameObserver, GameOverReason, GamePhase, GameSession, NullObserver,
    RivalContact, Vec2,
};
use crate::metrics::{format_time, GameMetrics};

/// Settings for a batch of headless rounds
#[derive(Debug, Clone)]
pub struct SimulateConfig {
    pub rounds: usize,
    /// Base seed; round `i` uses `seed + i`. Entropy when absent.
    pub seed: Option<u64>,
    /// Fixed simulation step, in seconds
    pub tick_secs: f32,
    /// Rounds still running after this many simulated seconds are cut off
    pub max_round_secs: f32,
}

impl Default for SimulateConfig {
    fn default() -> Self {
        Self {
            rounds: 10,
            seed: None,
            tick_secs: 1.0 / 60.0,
            max_round_secs: 180.0,
        }
    }
}

/// A food-seeking autopilot for the player snake
#[derive(Debug, Clone)]
pub struct Pilot {
    /// Distance from an edge at which the pilot turns back to the centre
    pub wall_margin: f32,
    /// How far ahead obstacles are checked
    pub look_ahead: f32,
    /// Keep at least this far from a lethal rival head
    pub rival_clearance: f32,
    /// Boost when the food is further than this
    pub boost_distance: f32,
    /// Fire when the rival head is closer than this and roughly ahead
    pub fire_range: f32,
    pub fire_cone: f32,
}

impl Default for Pilot {
    fn default() -> Self {
        Self {
            wall_margin: 60.0,
            look_ahead: 50.0,
            rival_clearance: 70.0,
            boost_distance: 220.0,
            fire_range: 260.0,
            fire_cone: 0.25,
        }
    }
}

impl Pilot {
    fn near_wall<O: GameObserver>(&self, session: &GameSession<O>, pos: Vec2) -> bool {
        let field = &session.world().field;
        pos.x < self.wall_margin
            || pos.y < self.wall_margin
            || pos.x > field.width - self.wall_margin
            || pos.y > field.height - self.wall_margin
    }

    /// Heading the player should ease towards this tick
    pub fn heading<O: GameObserver>(&self, session: &GameSession<O>) -> f32 {
        let world = session.world();
        let head = world.player.head_pos();

        if self.near_wall(session, head) {
            return heading_towards(head, world.field.center());
        }

        if session.config().rival.as_ref().map(|r| r.contact) == Some(RivalContact::Lethal) {
            if let Some(rival) = &world.rival {
                let rival_head = rival.snake.head_pos();
                if distance(head, rival_head) < self.rival_clearance {
                    return heading_towards(rival_head, head);
                }
            }
        }

        let target = world.food.map(|f| f.pos).unwrap_or_else(|| world.field.center());
        let mut heading = heading_towards(head, target);

        // Sidestep anything sitting on the line to the target
        let clearance = world.player.radius() + 10.0;
        let lookout = head + Vec2::from_angle(heading).scaled(self.look_ahead);
        if let Some(obstacle) = world
            .obstacles
            .iter()
            .find(|o| distance(lookout, o.pos) < o.size + clearance)
        {
            let side = normalize_angle_diff(heading_towards(head, obstacle.pos), heading);
            heading += if side > 0.0 { -FRAC_PI_2 } else { FRAC_PI_2 };
        }

        heading
    }

    /// Ability worth using this tick, if any
    pub fn ability<O: GameObserver>(&self, session: &GameSession<O>) -> Option<Ability> {
        let world = session.world();
        let player = &world.player;
        let head = player.head_pos();
        let abilities = session.abilities();

        if let Some(rival) = world.rival.as_ref().filter(|r| r.is_active()) {
            let rival_head = rival.snake.head_pos();
            let bearing = normalize_angle_diff(heading_towards(head, rival_head), player.heading);
            let in_range = distance(head, rival_head) < self.fire_range;
            if abilities.can_launch() && in_range && bearing.abs() < self.fire_cone {
                return Some(Ability::PowerBall);
            }
        }

        let food_far = world
            .food
            .map(|f| distance(head, f.pos) > self.boost_distance)
            .unwrap_or(false);
        let aligned = world
            .food
            .map(|f| normalize_angle_diff(heading_towards(head, f.pos), player.heading).abs() < 0.2)
            .unwrap_or(false);
        if food_far && aligned && abilities.boost.can_activate() && !self.near_wall(session, head) {
            return Some(Ability::SpeedBoost);
        }

        None
    }
}

/// Outcome of one headless round
#[derive(Debug, Clone, PartialEq)]
pub struct RoundResult {
    pub round: usize,
    pub score: u32,
    pub length: usize,
    pub elapsed: f32,
    /// `None` when the round hit the time cap
    pub reason: Option<GameOverReason>,
    pub balls_fired: u32,
    pub hits: usize,
}

impl RoundResult {
    pub fn is_win(&self) -> bool {
        self.reason.map(|r| r.is_win()).unwrap_or(false)
    }
}

pub struct SimulateMode {
    config: SimulateConfig,
    game_config: GameConfig,
    pilot: Pilot,
    metrics: GameMetrics,
}

impl SimulateMode {
    pub fn new(config: SimulateConfig, game_config: GameConfig) -> Self {
        Self {
            config,
            game_config,
            pilot: Pilot::default(),
            metrics: GameMetrics::new(),
        }
    }

    pub fn metrics(&self) -> &GameMetrics {
        &self.metrics
    }

    /// Run every round and print the results
    pub fn run(&mut self) -> Result<Vec<RoundResult>> {
        ensure!(self.config.rounds > 0, "At least one round is required");
        ensure!(
            self.config.tick_secs.is_finite() && self.config.tick_secs > 0.0,
            "Tick must be a positive number of seconds"
        );

        self.print_header();

        let mut results = Vec::with_capacity(self.config.rounds);
        for round in 1..=self.config.rounds {
            let result = self.play_round(round);
            println!("{}", Self::format_round(&result));
            results.push(result);
        }

        self.print_totals(&results);
        Ok(results)
    }

    /// Play a single round to completion or to the time cap
    pub fn play_round(&mut self, round: usize) -> RoundResult {
        let mut session = match self.config.seed {
            Some(seed) => {
                GameSession::with_seed(self.game_config.clone(), NullObserver, seed + round as u64)
            }
            None => GameSession::new(self.game_config.clone(), NullObserver),
        };
        session.start();

        let mut hits = 0;
        let cap = self.config.max_round_secs;
        while session.phase() == GamePhase::Running && session.elapsed() < cap {
            session.steer(self.pilot.heading(&session));
            if let Some(ability) = self.pilot.ability(&session) {
                if session.trigger(ability) {
                    debug!(round, ?ability, "Pilot used an ability");
                }
            }
            let report = session.tick(self.config.tick_secs);
            hits += report.hits.len();
        }

        let summary = session.summary().cloned();
        if let Some(summary) = &summary {
            self.metrics.on_game_over(summary);
        } else {
            info!(round, elapsed = session.elapsed(), "Round cut off at the time cap");
        }

        RoundResult {
            round,
            score: session.score(),
            length: session.world().player.len(),
            elapsed: session.elapsed(),
            reason: summary.map(|s| s.reason),
            balls_fired: session.abilities().balls_fired,
            hits,
        }
    }

    fn print_header(&self) {
        println!("{}", "=".repeat(70));
        println!("Slither Snake - Headless Simulation");
        println!("{}", "=".repeat(70));
        println!("Rounds: {}", self.config.rounds);
        println!(
            "Mode: {} (level {})",
            self.game_config.mode.name(),
            self.game_config.level
        );
        println!(
            "Rival: {}",
            if self.game_config.rival.is_some() { "on" } else { "off" }
        );
        match self.config.seed {
            Some(seed) => println!("Seed: {}", seed),
            None => println!("Seed: random"),
        }
        println!("{}", "=".repeat(70));
    }

    fn format_round(result: &RoundResult) -> String {
        let outcome = match result.reason {
            Some(reason) if reason.is_win() => format!("WIN ({})", reason.message()),
            Some(reason) => reason.message().to_string(),
            None => "time cap".to_string(),
        };
        format!(
            "Round {:>3} | Score: {:>5} | Len: {:>3} | Time: {} | Balls: {:>2} | Hits: {:>2} | {}",
            result.round,
            result.score,
            result.length,
            format_time(result.elapsed),
            result.balls_fired,
            result.hits,
            outcome
        )
    }

    fn print_totals(&self, results: &[RoundResult]) {
        let total: u64 = results.iter().map(|r| r.score as u64).sum();
        let best = results.iter().map(|r| r.score).max().unwrap_or(0);
        let longest = results.iter().map(|r| r.length).max().unwrap_or(0);
        let wins = results.iter().filter(|r| r.is_win()).count();
        let cut_off = results.iter().filter(|r| r.reason.is_none()).count();

        println!("{}", "=".repeat(70));
        println!("Rounds finished: {}", results.len() - cut_off);
        println!("Rounds cut off: {}", cut_off);
        println!("Wins: {}", wins);
        println!("Best score: {}", best);
        println!("Average score: {:.1}", total as f32 / results.len().max(1) as f32);
        println!("Longest snake: {}", longest);
        println!("{}", "=".repeat(70));
    }
}
