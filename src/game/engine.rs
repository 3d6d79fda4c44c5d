use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace, warn};

use super::abilities::{Ability, ExchangeDirector, PlayerAbilities};
use super::ai::{apply_hit, HitOutcome, Perception, Rival};
use super::collision::{detect_terminal, projectile_hits_head, reaches_food, GameOverReason};
use super::config::{GameConfig, GameMode};
use super::events::{EffectEvent, GameObserver, GameOverSummary, NullObserver, SoundEvent};
use super::geometry::{distance, Vec2};
use super::movement::{apply_move, candidate_head, steer};
use super::particles::ParticleKind;
use super::state::{Faction, Field, Food, Obstacle, Projectile, Snake};
use super::timer::Countdown;

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Idle,
    Running,
    Paused,
    GameOver,
}

/// Everything on the field
#[derive(Debug, Clone)]
pub struct World {
    pub field: Field,
    pub player: Snake,
    pub rival: Option<Rival>,
    /// `None` only once the board is full
    pub food: Option<Food>,
    pub obstacles: Vec<Obstacle>,
    pub projectiles: Vec<Projectile>,
}

impl World {
    /// Lay out a fresh round: player in the centre facing right, rival at its
    /// spawn point, obstacles for obstacle mode, then the first food
    pub fn new<R: Rng>(config: &GameConfig, rng: &mut R) -> Self {
        let field = Field::new(config.field_width, config.field_height);

        let p = &config.player;
        let mut player =
            Snake::new(field.center(), 0.0, p.base_length, p.segment_radius, p.spacing);
        player.turn_gain = p.turn_gain;
        player.speed = p.speed_for_level(config.level);
        player.follow_fraction = p.follow_fraction;

        let rival = config.rival.as_ref().map(|rc| Rival::spawn(rc, &field, rng));

        let mut world = Self {
            field,
            player,
            rival,
            food: None,
            obstacles: Vec::new(),
            projectiles: Vec::new(),
        };

        if config.mode == GameMode::Obstacle {
            world.generate_obstacles(config, rng);
        }
        world.food = world.spawn_food(config, rng);
        world
    }

    /// Whether a circle of `clearance` at `pos` overlaps no snake segment
    /// or obstacle
    pub fn is_free(&self, pos: Vec2, clearance: f32) -> bool {
        let rival_segments = self.rival.iter().flat_map(|r| r.snake.segments.iter());
        let on_snake = self
            .player
            .segments
            .iter()
            .chain(rival_segments)
            .any(|s| distance(pos, s.pos) < s.size + clearance);
        let on_obstacle = self
            .obstacles
            .iter()
            .any(|o| distance(pos, o.pos) < o.size + clearance);
        !on_snake && !on_obstacle
    }

    /// Rejection-sample a free food position; `None` means the board is full
    pub fn spawn_food<R: Rng>(&self, config: &GameConfig, rng: &mut R) -> Option<Food> {
        let r = config.food.radius;
        let (max_x, max_y) = (self.field.width - r, self.field.height - r);
        if max_x <= r || max_y <= r {
            return None;
        }

        (0..config.food.placement_attempts)
            .map(|_| Vec2::new(rng.gen_range(r..max_x), rng.gen_range(r..max_y)))
            .find(|&pos| self.is_free(pos, r))
            .map(|pos| Food { pos })
    }

    /// Pick a spot for one more obstacle, keeping clear of the player's head
    pub fn place_obstacle<R: Rng>(&self, config: &GameConfig, rng: &mut R) -> Option<Obstacle> {
        let oc = &config.obstacles;
        let margin = oc.edge_margin;
        let (max_x, max_y) = (self.field.width - margin, self.field.height - margin);
        if max_x <= margin || max_y <= margin {
            return None;
        }

        let head = self.player.head_pos();
        for _ in 0..oc.placement_attempts {
            let size = if oc.max_radius > oc.min_radius {
                rng.gen_range(oc.min_radius..=oc.max_radius)
            } else {
                oc.min_radius
            };
            let pos = Vec2::new(rng.gen_range(margin..max_x), rng.gen_range(margin..max_y));

            if distance(pos, head) < oc.head_clearance || !self.is_free(pos, size) {
                continue;
            }
            if let Some(food) = self.food {
                if distance(pos, food.pos) < size + config.food.radius {
                    continue;
                }
            }
            return Some(Obstacle { pos, size });
        }
        None
    }

    pub fn generate_obstacles<R: Rng>(&mut self, config: &GameConfig, rng: &mut R) {
        let count = config.obstacles.base_count + config.level as usize;
        for _ in 0..count {
            match self.place_obstacle(config, rng) {
                Some(obstacle) => self.obstacles.push(obstacle),
                None => debug!("No room for another obstacle"),
            }
        }
    }
}

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub ate_food: bool,
    pub rival_ate_food: bool,
    /// Sides launching a power ball this tick
    pub launches: Vec<Faction>,
    /// Sides struck by a power ball this tick
    pub hits: Vec<Faction>,
    pub game_over: Option<GameOverReason>,
}

/// A round of the game, advanced by the caller with `tick`
pub struct GameSession<O: GameObserver = NullObserver> {
    config: GameConfig,
    phase: GamePhase,
    world: World,
    score: u32,
    elapsed: f32,
    ticks: u64,
    last_timer_report: Option<u32>,
    abilities: PlayerAbilities,
    player_regeneration: Countdown,
    exchange: Option<ExchangeDirector>,
    obstacle_timer: Countdown,
    summary: Option<GameOverSummary>,
    rng: StdRng,
    observer: O,
}

impl GameSession<NullObserver> {
    /// A session nobody listens to
    pub fn headless(config: GameConfig) -> Self {
        Self::new(config, NullObserver)
    }
}

impl<O: GameObserver> GameSession<O> {
    pub fn new(config: GameConfig, observer: O) -> Self {
        Self::with_rng(config, observer, StdRng::from_entropy())
    }

    /// A session whose every random draw is reproducible
    pub fn with_seed(config: GameConfig, observer: O, seed: u64) -> Self {
        Self::with_rng(config, observer, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, observer: O, mut rng: StdRng) -> Self {
        let world = World::new(&config, &mut rng);
        let mut session = Self {
            config,
            phase: GamePhase::Idle,
            world,
            score: 0,
            elapsed: 0.0,
            ticks: 0,
            last_timer_report: None,
            abilities: PlayerAbilities::new(),
            player_regeneration: Countdown::new(),
            exchange: None,
            obstacle_timer: Countdown::new(),
            summary: None,
            rng,
            observer,
        };
        session.reset_timers();
        session
    }

    fn reset_timers(&mut self) {
        self.abilities.reset(&self.config.abilities);
        self.player_regeneration.clear();
        let exchange = self.config.rival.as_ref().and_then(|r| r.exchange.as_ref());
        match (&mut self.exchange, exchange) {
            (Some(director), Some(config)) => director.reset(config),
            (slot, config) => *slot = config.map(ExchangeDirector::new),
        }
        self.obstacle_timer = if self.config.mode == GameMode::Obstacle {
            Countdown::started(self.config.obstacles.inject_interval_secs)
        } else {
            Countdown::new()
        };
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Direct access for scripted setups and tools
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Simulated seconds spent running
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn abilities(&self) -> &PlayerAbilities {
        &self.abilities
    }

    /// Whether the rival is inside a rapid power-ball window
    pub fn rival_in_rapid_exchange(&self) -> bool {
        self.world
            .rival
            .as_ref()
            .is_some_and(|r| r.attack.in_rapid_exchange())
    }

    /// False while the player is out of play after a hit
    pub fn player_active(&self) -> bool {
        self.player_regeneration.is_ready()
    }

    /// Seconds left on the time-attack clock
    pub fn time_left(&self) -> Option<f32> {
        (self.config.mode == GameMode::TimeAttack)
            .then(|| (self.config.time_limit_secs - self.elapsed).max(0.0))
    }

    pub fn summary(&self) -> Option<&GameOverSummary> {
        self.summary.as_ref()
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Idle to running. Returns false from any other phase.
    pub fn start(&mut self) -> bool {
        if self.phase != GamePhase::Idle {
            return false;
        }
        self.phase = GamePhase::Running;
        info!(
            mode = self.config.mode.name(),
            level = self.config.level,
            rival = self.world.rival.is_some(),
            "Game started"
        );

        self.observer.on_score(self.score);
        if self.config.mode == GameMode::TimeAttack {
            self.report_timer();
        }
        if self.world.food.is_none() {
            warn!("No free spot for the first food");
            self.finish(GameOverReason::BoardFull);
        }
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.phase != GamePhase::Running {
            return false;
        }
        self.phase = GamePhase::Paused;
        debug!(elapsed = self.elapsed, "Game paused");
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.phase != GamePhase::Paused {
            return false;
        }
        self.phase = GamePhase::Running;
        debug!(elapsed = self.elapsed, "Game resumed");
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        match self.phase {
            GamePhase::Running => self.pause(),
            GamePhase::Paused => self.resume(),
            _ => false,
        }
    }

    /// Back to idle with a fresh world
    pub fn reset(&mut self) {
        self.world = World::new(&self.config, &mut self.rng);
        self.phase = GamePhase::Idle;
        self.score = 0;
        self.elapsed = 0.0;
        self.ticks = 0;
        self.last_timer_report = None;
        self.summary = None;
        self.reset_timers();
        debug!("Session reset");
    }

    pub fn restart(&mut self) {
        self.reset();
        self.start();
    }

    /// Set the heading the player eases towards
    pub fn steer(&mut self, heading: f32) {
        if self.phase == GamePhase::Running && heading.is_finite() {
            self.world.player.target_heading = heading;
        }
    }

    /// Use a player ability. Returns whether it fired.
    pub fn trigger(&mut self, ability: Ability) -> bool {
        if self.phase != GamePhase::Running || !self.player_active() {
            return false;
        }

        let head = self.world.player.head_pos();
        let used = match ability {
            Ability::SpeedBoost => {
                let used = self.abilities.try_boost(&self.config.abilities);
                if used {
                    debug!(secs = self.config.abilities.boost_duration_secs, "Speed boost");
                    self.observer.on_sound(SoundEvent::SpeedBoost);
                    self.observer.on_effect(EffectEvent {
                        kind: ParticleKind::SpeedBoost,
                        pos: head,
                    });
                }
                used
            }
            Ability::PowerBall => {
                let ball = self
                    .abilities
                    .try_launch(&self.config.projectiles, &self.world.player);
                match ball {
                    Some(ball) => {
                        debug!(heading = self.world.player.heading, "Player launched a power ball");
                        self.world.projectiles.push(ball);
                        self.observer.on_sound(SoundEvent::Whoosh);
                        true
                    }
                    None => false,
                }
            }
        };

        if used {
            self.unlock_rival_attacks();
        }
        used
    }

    /// Any ability use, manual or automatic, lets the rival shoot back
    fn unlock_rival_attacks(&mut self) {
        if let Some(rival) = self.world.rival.as_mut() {
            if !rival.attack.unlocked {
                rival.attack.unlocked = true;
                debug!("Rival projectiles unlocked");
            }
        }
    }

    fn run_auto_boost(&mut self, dt: f32) {
        if !self.player_active() {
            return;
        }
        if !self.abilities.tick_auto_boost(&self.config.abilities, dt) {
            return;
        }
        debug!("Automatic speed boost");
        self.observer.on_sound(SoundEvent::SpeedBoost);
        self.observer.on_effect(EffectEvent {
            kind: ParticleKind::SpeedBoost,
            pos: self.world.player.head_pos(),
        });
        self.unlock_rival_attacks();
    }

    /// Advance the round by `dt` seconds
    ///
    /// Does nothing unless running. Non-finite or non-positive deltas are
    /// ignored and long frames are clamped to `max_delta_secs`.
    pub fn tick(&mut self, dt: f32) -> TickReport {
        let mut report = TickReport::default();
        if self.phase != GamePhase::Running {
            return report;
        }
        if !dt.is_finite() || dt <= 0.0 {
            trace!(dt, "Ignoring unusable delta");
            return report;
        }
        let dt = dt.min(self.config.max_delta_secs);
        self.elapsed += dt;
        self.ticks += 1;

        if self.abilities.tick(dt) {
            debug!("Speed boost ended");
        }
        if self.player_regeneration.tick(dt) {
            debug!("Player back in play");
        }
        self.run_auto_boost(dt);

        if self.config.mode == GameMode::TimeAttack {
            self.report_timer();
            if self.elapsed >= self.config.time_limit_secs {
                self.finish(GameOverReason::TimeUp);
                report.game_over = Some(GameOverReason::TimeUp);
                return report;
            }
        }

        self.run_rival_brain(dt, &mut report);
        self.run_exchange(dt, &mut report);

        if let Some(reason) = self.move_player(dt, &mut report) {
            report.game_over = Some(reason);
            return report;
        }
        if let Some(reason) = self.move_rival(dt, &mut report) {
            report.game_over = Some(reason);
            return report;
        }

        self.update_projectiles(dt, &mut report);

        if self.config.mode == GameMode::Obstacle {
            self.maybe_inject_obstacle(dt);
        }

        if let Some(food) = self.world.food {
            self.observer.on_effect(EffectEvent {
                kind: ParticleKind::Sparkle,
                pos: food.pos,
            });
        }

        report
    }

    fn run_rival_brain(&mut self, dt: f32, report: &mut TickReport) {
        let perception = Perception {
            player_head: self.player_active().then(|| self.world.player.head_pos()),
            food: self.world.food.map(|f| f.pos),
            field: self.world.field,
        };
        let (Some(rival), Some(config)) = (self.world.rival.as_mut(), self.config.rival.as_ref())
        else {
            return;
        };

        if let Some(ball) = rival.think(config, &perception, dt, &mut self.rng) {
            trace!(x = ball.pos.x, y = ball.pos.y, "Rival launched a power ball");
            self.world.projectiles.push(ball);
            self.observer.on_sound(SoundEvent::Whoosh);
            report.launches.push(Faction::Rival);
        }
    }

    fn run_exchange(&mut self, dt: f32, report: &mut TickReport) {
        let Some(director) = self.exchange.as_mut() else {
            return;
        };
        let Some(rival_config) = self.config.rival.as_ref() else {
            return;
        };
        let Some(exchange) = rival_config.exchange.as_ref() else {
            return;
        };
        let Some(rival) = self.world.rival.as_mut() else {
            return;
        };

        let player_cooling = !self.abilities.can_launch();
        let rival_cooling = !rival.attack.is_ready();
        let projectiles = &self.world.projectiles;
        let busy = |side: Faction| {
            let cooling = match side {
                Faction::Player => player_cooling,
                Faction::Rival => rival_cooling,
            };
            cooling || projectiles.iter().any(|p| p.owner == side)
        };
        let launches = director.tick(exchange, dt, busy, &mut self.rng);

        for side in launches {
            if !rival.is_active() || self.player_regeneration.is_running() {
                continue;
            }
            let rival_head = rival.snake.head_pos();
            let player_head = self.world.player.head_pos();
            let heading = rival.snake.heading;

            let ball = match side {
                Faction::Player => Some(self.abilities.aimed_launch(
                    &self.config.projectiles,
                    exchange.player_ball_speed,
                    &self.world.player,
                    rival_head,
                )),
                Faction::Rival => rival_config.attack.as_ref().map(|attack| {
                    rival
                        .attack
                        .forced_launch(attack, rival_head, player_head, heading)
                }),
            };

            if let Some(ball) = ball {
                self.world.projectiles.push(ball);
                self.observer.on_sound(SoundEvent::Whoosh);
                report.launches.push(side);
            }
        }
    }

    fn move_player(&mut self, dt: f32, report: &mut TickReport) -> Option<GameOverReason> {
        if self.player_regeneration.is_running() {
            return None;
        }

        steer(&mut self.world.player, dt);
        let multiplier = self.abilities.speed_multiplier(&self.config.abilities);
        let speed = self.world.player.speed * multiplier;
        let head = candidate_head(&self.world.player, speed, dt)?;

        let rival = match (&self.world.rival, &self.config.rival) {
            (Some(r), Some(c)) if r.is_active() => Some((&r.snake, c.contact)),
            _ => None,
        };
        let terminal = detect_terminal(
            &self.config,
            &self.world.field,
            &self.world.player,
            head,
            &self.world.obstacles,
            rival,
        );
        if let Some(reason) = terminal {
            if reason == GameOverReason::Wall {
                let pos = self.world.field.clamp(head, 0.0);
                self.observer.on_effect(EffectEvent {
                    kind: ParticleKind::WallHit,
                    pos,
                });
            }
            self.finish(reason);
            return Some(reason);
        }

        apply_move(&mut self.world.player, head);
        self.observer.on_effect(EffectEvent {
            kind: ParticleKind::Trail,
            pos: self.world.player.tail().pos,
        });

        let food = self.world.food?;
        if reaches_food(&food, head, self.world.player.radius(), self.config.food.radius) {
            report.ate_food = true;
            return self.player_eats(food);
        }
        None
    }

    fn player_eats(&mut self, food: Food) -> Option<GameOverReason> {
        let p = &self.config.player;
        self.score += self.config.points_per_food();
        let cap = p.base_length + (self.score / p.growth_divisor) as usize;
        self.world.player.queue_growth(p.growth_per_food, cap);
        if self.config.mode == GameMode::Classic {
            let ceiling = p.speed_for_level(self.config.level) + p.max_food_speed_bonus;
            let player = &mut self.world.player;
            player.speed = (player.speed + p.food_speed_step).min(ceiling);
        }

        debug!(
            score = self.score,
            desired_length = self.world.player.desired_length,
            "Food eaten"
        );
        self.observer.on_sound(SoundEvent::Eat);
        self.observer.on_effect(EffectEvent {
            kind: ParticleKind::FoodBurst,
            pos: food.pos,
        });
        self.observer.on_score(self.score);

        self.respawn_food()
    }

    fn respawn_food(&mut self) -> Option<GameOverReason> {
        self.world.food = self.world.spawn_food(&self.config, &mut self.rng);
        if self.world.food.is_some() {
            return None;
        }
        warn!(score = self.score, "No free spot left for food");
        self.finish(GameOverReason::BoardFull);
        Some(GameOverReason::BoardFull)
    }

    fn move_rival(&mut self, dt: f32, report: &mut TickReport) -> Option<GameOverReason> {
        let (Some(rival), Some(config)) = (self.world.rival.as_mut(), self.config.rival.as_ref())
        else {
            return None;
        };
        if !rival.is_active() {
            return None;
        }

        rival.advance(config, &self.world.field, dt);
        if !config.eats_food {
            return None;
        }

        let food = self.world.food?;
        let head = rival.snake.head_pos();
        if !reaches_food(&food, head, rival.snake.radius(), self.config.food.radius) {
            return None;
        }

        rival.eat_food(config);
        debug!(
            length = rival.snake.len(),
            eaten = rival.foods_eaten,
            "Rival ate the food"
        );
        report.rival_ate_food = true;
        self.observer.on_effect(EffectEvent {
            kind: ParticleKind::FoodBurst,
            pos: food.pos,
        });
        self.respawn_food()
    }

    fn update_projectiles(&mut self, dt: f32, report: &mut TickReport) {
        let field = self.world.field;
        let mut flying = Vec::with_capacity(self.world.projectiles.len());
        let mut hits = Vec::new();

        for mut ball in std::mem::take(&mut self.world.projectiles) {
            ball.advance(dt);
            if ball.is_out_of_bounds(field.width, field.height) {
                continue;
            }

            let hit = match ball.owner {
                Faction::Player => self
                    .world
                    .rival
                    .as_ref()
                    .is_some_and(|r| r.is_active() && projectile_hits_head(&ball, &r.snake)),
                Faction::Rival => {
                    self.player_active() && projectile_hits_head(&ball, &self.world.player)
                }
            };

            if hit {
                hits.push((ball.owner.opponent(), ball.pos));
            } else {
                flying.push(ball);
            }
        }
        self.world.projectiles = flying;

        for (target, pos) in hits {
            if self.resolve_hit(target, pos) {
                report.hits.push(target);
            }
        }

        for ball in &self.world.projectiles {
            self.observer.on_effect(EffectEvent {
                kind: ParticleKind::PowerBallTrail,
                pos: ball.pos,
            });
        }
    }

    fn resolve_hit(&mut self, target: Faction, pos: Vec2) -> bool {
        let outcome = match target {
            Faction::Rival => match (self.world.rival.as_mut(), self.config.rival.as_ref()) {
                (Some(rival), Some(config)) => rival.take_hit(config),
                _ => HitOutcome::Ignored,
            },
            Faction::Player => apply_hit(
                &mut self.world.player,
                self.config.projectiles.player_hit,
                &mut self.player_regeneration,
            ),
        };

        if outcome == HitOutcome::Ignored {
            return false;
        }

        info!(?target, ?outcome, "Power ball hit");
        self.observer.on_sound(SoundEvent::Explosion);
        self.observer.on_effect(EffectEvent {
            kind: ParticleKind::Explosion,
            pos,
        });
        true
    }

    fn maybe_inject_obstacle(&mut self, dt: f32) {
        if !self.obstacle_timer.tick(dt) {
            return;
        }
        self.obstacle_timer.start(self.config.obstacles.inject_interval_secs);

        if self.rng.gen::<f32>() >= self.config.obstacles.inject_chance {
            return;
        }
        match self.world.place_obstacle(&self.config, &mut self.rng) {
            Some(obstacle) => {
                debug!(
                    x = obstacle.pos.x,
                    y = obstacle.pos.y,
                    total = self.world.obstacles.len() + 1,
                    "Obstacle added"
                );
                self.world.obstacles.push(obstacle);
            }
            None => trace!("No room to add an obstacle"),
        }
    }

    fn report_timer(&mut self) {
        let left = (self.config.time_limit_secs - self.elapsed).max(0.0).ceil() as u32;
        if self.last_timer_report != Some(left) {
            self.last_timer_report = Some(left);
            self.observer.on_timer(left);
        }
    }

    fn finish(&mut self, reason: GameOverReason) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        self.phase = GamePhase::GameOver;

        let summary = GameOverSummary {
            score: self.score,
            snake_length: self.world.player.len(),
            elapsed_time: self.elapsed,
            mode: self.config.mode,
            reason,
            is_win: reason.is_win(),
        };

        info!(
            score = summary.score,
            length = summary.snake_length,
            elapsed = summary.elapsed_time,
            reason = %reason,
            "Game over"
        );

        if summary.is_win {
            self.observer.on_sound(SoundEvent::Success);
        } else {
            self.observer.on_sound(SoundEvent::Hit);
            self.observer.on_effect(EffectEvent {
                kind: ParticleKind::Explosion,
                pos: self.world.player.head_pos(),
            });
        }
        self.observer.on_game_over(&summary);
        self.summary = Some(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::{HitEffect, RivalProfile};
    use crate::game::events::EventLog;
    use std::f32::consts::PI;

    const FRAME: f32 = 1.0 / 60.0;

    fn session(config: GameConfig) -> GameSession<EventLog> {
        GameSession::with_seed(config, EventLog::new(), 42)
    }

    #[test]
    fn test_new_session_is_idle() {
        let mut game = session(GameConfig::small());
        assert_eq!(game.phase(), GamePhase::Idle);
        assert_eq!(game.score(), 0);
        assert_eq!(game.world().player.len(), 3);
        assert!(game.world().food.is_some());

        let head = game.world().player.head_pos();
        game.tick(FRAME);
        assert_eq!(game.world().player.head_pos(), head);
    }

    #[test]
    fn test_basic_movement() {
        let mut game = session(GameConfig::small());
        assert!(game.start());
        let head = game.world().player.head_pos();

        let report = game.tick(FRAME);
        assert!(report.game_over.is_none());
        assert!(game.world().player.head_pos().x > head.x);
        assert_eq!(game.ticks(), 1);
    }

    #[test]
    fn test_food_consumption() {
        let mut game = session(GameConfig::small());
        game.start();
        let head = game.world().player.head_pos();
        game.world_mut().food = Some(Food {
            pos: Vec2::new(head.x + 15.0, head.y),
        });

        let report = game.tick(FRAME);
        assert!(report.ate_food);
        assert_eq!(game.score(), 10);
        assert_eq!(game.observer().scores, vec![0, 10]);
        assert_eq!(game.observer().count_sound(SoundEvent::Eat), 1);

        let food = game.world().food.unwrap();
        assert!(distance(food.pos, head) > 1.0);
        assert!(game.world().is_free(food.pos, game.config().food.radius));

        game.tick(FRAME);
        game.tick(FRAME);
        assert_eq!(game.world().player.len(), 5);
    }

    fn feed_player(game: &mut GameSession<EventLog>) -> TickReport {
        let head = game.world().player.head_pos();
        game.world_mut().food = Some(Food {
            pos: Vec2::new(head.x + 15.0, head.y),
        });
        game.tick(FRAME)
    }

    #[test]
    fn test_classic_speeds_up_per_food() {
        let mut game = session(GameConfig::small());
        game.start();
        let before = game.world().player.speed;

        assert!(feed_player(&mut game).ate_food);
        let step = game.config().player.food_speed_step;
        assert!((game.world().player.speed - (before + step)).abs() < 1e-4);

        // Capped above the level speed
        let ceiling = before + game.config().player.max_food_speed_bonus;
        game.world_mut().player.speed = ceiling - 0.5;
        assert!(feed_player(&mut game).ate_food);
        assert!((game.world().player.speed - ceiling).abs() < 1e-4);
    }

    #[test]
    fn test_time_attack_keeps_level_speed() {
        let mut config = GameConfig::small();
        config.mode = GameMode::TimeAttack;
        let mut game = session(config);
        game.start();
        let before = game.world().player.speed;

        assert!(feed_player(&mut game).ate_food);
        assert_eq!(game.world().player.speed, before);
    }

    #[test]
    fn test_food_sparkles_every_tick() {
        let mut game = session(GameConfig::small());
        game.start();
        game.tick(FRAME);
        game.tick(FRAME);
        assert_eq!(game.observer().count_effect(ParticleKind::Sparkle), 2);
    }

    #[test]
    fn test_auto_boost_fires_and_unlocks_rival() {
        let mut game = session(GameConfig::default());
        game.start();
        game.world_mut().player.speed = 10.0;

        for _ in 0..45 {
            game.tick(0.1);
        }
        assert!(!game.abilities().auto_boost.is_active());
        assert!(!game.world().rival.as_ref().unwrap().attack.unlocked);
        assert_eq!(game.observer().count_sound(SoundEvent::SpeedBoost), 0);

        for _ in 0..10 {
            game.tick(0.1);
        }
        assert_eq!(game.phase(), GamePhase::Running);
        assert!(game.abilities().auto_boost.is_active());
        assert_eq!(game.observer().count_sound(SoundEvent::SpeedBoost), 1);
        assert_eq!(game.observer().count_effect(ParticleKind::SpeedBoost), 1);
        assert!(game.world().rival.as_ref().unwrap().attack.unlocked);
    }

    #[test]
    fn test_obstacles_injected_over_time() {
        let mut config = GameConfig::new(GameMode::Obstacle, 1).with_rival(None);
        config.obstacles.inject_interval_secs = 1.0;
        config.obstacles.inject_chance = 1.0;
        let mut game = session(config);
        game.start();
        game.world_mut().player.speed = 0.0;
        let initial = game.world().obstacles.len();
        assert_eq!(initial, 4);

        for _ in 0..5 {
            game.tick(0.1);
        }
        assert_eq!(game.world().obstacles.len(), initial);

        for _ in 0..30 {
            game.tick(0.1);
        }
        assert_eq!(game.phase(), GamePhase::Running);
        assert_eq!(game.world().obstacles.len(), initial + 3);
        let head = game.world().player.head_pos();
        for obstacle in &game.world().obstacles {
            assert!(distance(obstacle.pos, head) >= game.config().obstacles.head_clearance);
        }
    }

    #[test]
    fn test_rival_ball_trims_player_tail() {
        let mut game = session(GameConfig::default());
        game.start();
        let center = game.world().field.center();
        let mut player = Snake::new(center, 0.0, 6, 15.0, 15.0);
        player.speed = 0.0;
        game.world_mut().player = player;
        game.world_mut().projectiles.push(Projectile {
            pos: Vec2::new(center.x + 12.0, center.y),
            vel: Vec2::new(-280.0, 0.0),
            size: 8.0,
            owner: Faction::Rival,
        });

        let report = game.tick(FRAME);
        assert_eq!(report.hits, vec![Faction::Player]);
        assert_eq!(game.world().player.len(), 4);
        assert!(game.player_active());
        assert!(game.world().projectiles.iter().all(|p| p.owner != Faction::Rival));
        assert_eq!(game.observer().count_sound(SoundEvent::Explosion), 1);
        assert_eq!(game.phase(), GamePhase::Running);
    }

    #[test]
    fn test_scripted_exchange_fires_both_sides() {
        let mut config = GameConfig::default();
        config.abilities.auto_boost = None;
        if let Some(rival) = config.rival.as_mut() {
            rival.hit_effect = HitEffect::TrimTail {
                segments: 1,
                min_length: 3,
            };
        }
        let mut game = session(config);
        game.start();
        {
            let world = game.world_mut();
            world.player.speed = 0.0;
            let head = world.player.head_pos();
            let rival = world.rival.as_mut().unwrap();
            rival.snake = Snake::new(Vec2::new(head.x + 200.0, head.y), PI, 3, 13.5, 13.5);
            rival.snake.speed = 0.0;
        }

        let mut launches = Vec::new();
        for _ in 0..270 {
            launches.extend(game.tick(FRAME).launches);
        }
        // Nothing before the first five second interval
        assert!(launches.is_empty());

        for _ in 0..120 {
            launches.extend(game.tick(FRAME).launches);
        }
        assert!(launches.contains(&Faction::Player), "launches {launches:?}");
        assert!(launches.contains(&Faction::Rival), "launches {launches:?}");
        assert_eq!(game.exchange.as_ref().map(|d| d.rounds), Some(1));
        assert!(!game.world().rival.as_ref().unwrap().attack.unlocked);
    }

    #[test]
    fn test_wall_collision_ends_round() {
        let mut game = session(GameConfig::small());
        game.start();
        let mut snake = Snake::new(Vec2::new(20.0, 150.0), PI, 3, 15.0, 15.0);
        snake.speed = 120.0;
        game.world_mut().player = snake;

        let mut reason = None;
        for _ in 0..10 {
            reason = reason.or(game.tick(FRAME).game_over);
        }
        assert_eq!(reason, Some(GameOverReason::Wall));
        assert_eq!(game.phase(), GamePhase::GameOver);

        let summary = game.summary().unwrap();
        assert!(!summary.is_win);
        assert_eq!(summary.reason.message(), "Hit wall");
        assert_eq!(game.observer().game_overs.len(), 1);
        assert_eq!(game.observer().count_sound(SoundEvent::Hit), 1);
        assert_eq!(game.observer().count_sound(SoundEvent::Success), 0);

        // Terminated games do not update
        let head = game.world().player.head_pos();
        game.tick(FRAME);
        assert_eq!(game.world().player.head_pos(), head);
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut game = session(GameConfig::default());
        game.start();
        assert!(game.trigger(Ability::SpeedBoost));
        game.tick(FRAME);

        assert!(game.pause());
        let head = game.world().player.head_pos();
        let boost_left = game.abilities().boost.active.remaining();
        let elapsed = game.elapsed();
        for _ in 0..100 {
            game.tick(FRAME);
        }
        assert_eq!(game.world().player.head_pos(), head);
        assert_eq!(game.abilities().boost.active.remaining(), boost_left);
        assert_eq!(game.elapsed(), elapsed);
        assert!(!game.trigger(Ability::PowerBall));

        assert!(game.resume());
        game.tick(FRAME);
        assert_ne!(game.world().player.head_pos(), head);
    }

    #[test]
    fn test_delta_is_sanitised() {
        let mut game = session(GameConfig::small());
        game.start();
        let head = game.world().player.head_pos();

        game.tick(f32::NAN);
        game.tick(-1.0);
        game.tick(0.0);
        assert_eq!(game.world().player.head_pos(), head);
        assert_eq!(game.ticks(), 0);

        game.tick(5.0);
        let moved = distance(game.world().player.head_pos(), head);
        assert!(moved <= 120.0 * 0.1 + 1e-3);
        assert!((game.elapsed() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_time_attack_expiry_is_a_win() {
        let mut config = GameConfig::small();
        config.mode = GameMode::TimeAttack;
        config.time_limit_secs = 1.0;
        let mut game = session(config);
        game.start();
        game.world_mut().food = None;

        for _ in 0..12 {
            game.tick(0.1);
        }
        let summary = game.summary().unwrap();
        assert_eq!(summary.reason, GameOverReason::TimeUp);
        assert!(summary.is_win);
        assert_eq!(summary.mode, GameMode::TimeAttack);
        assert_eq!(game.observer().timers.first(), Some(&1));
        assert_eq!(game.observer().count_sound(SoundEvent::Success), 1);
    }

    #[test]
    fn test_full_board_at_start() {
        let mut config = GameConfig::small();
        config.field_width = 100.0;
        config.field_height = 100.0;
        config.food.radius = 40.0;
        let mut game = session(config);
        assert!(game.world().food.is_none());

        game.start();
        assert_eq!(game.phase(), GamePhase::GameOver);
        let summary = game.summary().unwrap();
        assert_eq!(summary.reason, GameOverReason::BoardFull);
        assert!(summary.is_win);
    }

    #[test]
    fn test_ability_unlocks_rival_attacks() {
        let mut game = session(GameConfig::default());
        game.start();
        assert!(!game.world().rival.as_ref().unwrap().attack.unlocked);

        assert!(game.trigger(Ability::PowerBall));
        assert!(game.world().rival.as_ref().unwrap().attack.unlocked);
        assert_eq!(game.world().projectiles.len(), 1);
        assert_eq!(game.observer().count_sound(SoundEvent::Whoosh), 1);

        // Launcher cooldown
        assert!(!game.trigger(Ability::PowerBall));
    }

    #[test]
    fn test_power_ball_sends_rival_to_regenerate() {
        let mut game = session(GameConfig::default());
        game.start();
        {
            let world = game.world_mut();
            let head = world.player.head_pos();
            let rival = world.rival.as_mut().unwrap();
            rival.snake = Snake::new(Vec2::new(head.x + 40.0, head.y), 0.0, 3, 13.5, 13.5);
        }
        assert!(game.trigger(Ability::PowerBall));

        let mut hit = false;
        for _ in 0..30 {
            hit |= game.tick(FRAME).hits.contains(&Faction::Rival);
        }
        assert!(hit);
        assert!(!game.world().rival.as_ref().unwrap().is_active());
        assert!(game.observer().count_sound(SoundEvent::Explosion) >= 1);
        assert_eq!(game.phase(), GamePhase::Running);
    }

    #[test]
    fn test_lethal_rival_contact() {
        let config = GameConfig::default().with_rival(Some(RivalProfile::Classic));
        let mut game = session(config);
        game.start();
        {
            let world = game.world_mut();
            let head = world.player.head_pos();
            let rival = world.rival.as_mut().unwrap();
            rival.snake = Snake::new(Vec2::new(head.x + 20.0, head.y), PI / 2.0, 5, 10.0, 14.0);
            rival.regeneration.clear();
        }

        let report = game.tick(FRAME);
        assert_eq!(report.game_over, Some(GameOverReason::Rival));
    }

    #[test]
    fn test_obstacle_mode_layout() {
        let config = GameConfig::new(GameMode::Obstacle, 2);
        let game = session(config);
        let world = game.world();
        assert_eq!(world.obstacles.len(), 5);

        let head = world.player.head_pos();
        for obstacle in &world.obstacles {
            assert!(distance(obstacle.pos, head) >= 80.0);
            assert!(obstacle.pos.x >= 50.0 && obstacle.pos.x <= 550.0);
        }
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut game = session(GameConfig::small());
        game.start();
        game.world_mut().player.heading = PI;
        game.world_mut().player.target_heading = PI;
        for _ in 0..600 {
            game.tick(0.1);
        }
        assert_eq!(game.phase(), GamePhase::GameOver);
        assert!(!game.start());

        game.restart();
        assert_eq!(game.phase(), GamePhase::Running);
        assert_eq!(game.score(), 0);
        assert_eq!(game.elapsed(), 0.0);
        assert!(game.summary().is_none());
    }

    #[test]
    fn test_seeded_sessions_match() {
        let a = GameSession::with_seed(GameConfig::default(), NullObserver, 7);
        let b = GameSession::with_seed(GameConfig::default(), NullObserver, 7);
        assert_eq!(a.world().food, b.world().food);
        assert_eq!(
            a.world().rival.as_ref().unwrap().snake.head_pos(),
            b.world().rival.as_ref().unwrap().snake.head_pos()
        );
    }
}
