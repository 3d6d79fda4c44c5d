use rand::Rng;
use tracing::debug;

use super::config::{AbilityConfig, ExchangeConfig, ProjectileConfig};
use super::geometry::Vec2;
use super::state::{Faction, Projectile, Snake};
use super::timer::{Countdown, TimedAbility};

/// Player-triggered abilities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ability {
    SpeedBoost,
    PowerBall,
}

/// Cooldown state for the player's abilities
#[derive(Debug, Clone, Default)]
pub struct PlayerAbilities {
    pub boost: TimedAbility,
    /// Hands-free boost, its cooldown doubles as the firing interval
    pub auto_boost: TimedAbility,
    pub ball_cooldown: Countdown,
    pub balls_fired: u32,
}

impl PlayerAbilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true on the tick the boost runs out
    pub fn tick(&mut self, dt: f32) -> bool {
        self.ball_cooldown.tick(dt);
        self.boost.tick(dt)
    }

    pub fn try_boost(&mut self, config: &AbilityConfig) -> bool {
        self.boost
            .try_activate(config.boost_duration_secs, config.boost_cooldown_secs)
    }

    /// Advance the automatic boost. Returns true on the tick it fires.
    pub fn tick_auto_boost(&mut self, config: &AbilityConfig, dt: f32) -> bool {
        let Some(auto) = &config.auto_boost else {
            return false;
        };
        self.auto_boost.tick(dt);
        self.auto_boost.try_activate(auto.duration_secs, auto.interval_secs)
    }

    pub fn speed_multiplier(&self, config: &AbilityConfig) -> f32 {
        let manual = if self.boost.is_active() {
            config.boost_multiplier
        } else {
            1.0
        };
        match &config.auto_boost {
            Some(auto) if self.auto_boost.is_active() => manual * auto.multiplier,
            _ => manual,
        }
    }

    pub fn can_launch(&self) -> bool {
        self.ball_cooldown.is_ready()
    }

    /// Launch a power ball from the head along the current heading
    pub fn try_launch(&mut self, config: &ProjectileConfig, snake: &Snake) -> Option<Projectile> {
        if !self.can_launch() {
            return None;
        }
        self.ball_cooldown.start(config.cooldown_secs);
        self.balls_fired += 1;
        Some(Projectile {
            pos: snake.head_pos(),
            vel: Vec2::from_angle(snake.heading).scaled(config.speed),
            size: config.radius,
            owner: Faction::Player,
        })
    }

    /// Launch an auto-aimed ball at `target`, ignoring the manual cooldown
    pub fn aimed_launch(
        &mut self,
        projectiles: &ProjectileConfig,
        speed: f32,
        snake: &Snake,
        target: Vec2,
    ) -> Projectile {
        let from = snake.head_pos();
        let dir = (target - from)
            .normalized()
            .unwrap_or_else(|| Vec2::from_angle(snake.heading));
        self.balls_fired += 1;
        Projectile {
            pos: from,
            vel: dir.scaled(speed),
            size: projectiles.radius,
            owner: Faction::Player,
        }
    }

    /// Clear every timer and arm the automatic boost for its first interval
    pub fn reset(&mut self, config: &AbilityConfig) {
        self.boost.reset();
        self.auto_boost.reset();
        if let Some(auto) = &config.auto_boost {
            self.auto_boost.cooldown.start(auto.interval_secs);
        }
        self.ball_cooldown.clear();
        self.balls_fired = 0;
    }
}

/// Drives the periodic two-sided power-ball exchange
///
/// When the interval elapses one side fires, chosen at random, and the other
/// answers after a short delay.
#[derive(Debug, Clone)]
pub struct ExchangeDirector {
    interval: Countdown,
    answer: Option<(Faction, Countdown)>,
    pub rounds: u32,
}

impl ExchangeDirector {
    pub fn new(config: &ExchangeConfig) -> Self {
        Self {
            interval: Countdown::started(config.interval_secs),
            answer: None,
            rounds: 0,
        }
    }

    pub fn pending_answer(&self) -> Option<Faction> {
        self.answer.map(|(side, _)| side)
    }

    /// Advance the exchange clock and return the sides that should fire now
    ///
    /// `busy` reports whether a side already has a ball in flight; an opening
    /// shot is skipped while either side is busy.
    pub fn tick<R: Rng>(
        &mut self,
        config: &ExchangeConfig,
        dt: f32,
        busy: impl Fn(Faction) -> bool,
        rng: &mut R,
    ) -> Vec<Faction> {
        let mut launches = Vec::new();

        if let Some((side, delay)) = self.answer.as_mut() {
            if delay.tick(dt) {
                launches.push(*side);
                self.answer = None;
            }
        }

        if self.interval.tick(dt) {
            self.interval.start(config.interval_secs);
            if self.answer.is_some() || busy(Faction::Player) || busy(Faction::Rival) {
                debug!("Skipping exchange, a ball is already in flight");
                return launches;
            }

            let first = if rng.gen::<f32>() < config.player_first_chance {
                Faction::Player
            } else {
                Faction::Rival
            };
            let delay = match first {
                Faction::Player => config.rival_answer_delay_secs,
                Faction::Rival => config.player_answer_delay_secs,
            };
            self.answer = Some((first.opponent(), Countdown::started(delay)));
            self.rounds += 1;
            debug!(?first, round = self.rounds, "Power ball exchange");
            launches.push(first);
        }

        launches
    }

    /// Restart the interval, dropping any pending answer
    pub fn reset(&mut self, config: &ExchangeConfig) {
        *self = Self::new(config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn snake() -> Snake {
        Snake::new(Vec2::new(100.0, 100.0), 0.0, 3, 15.0, 15.0)
    }

    #[test]
    fn test_speed_boost_lifecycle() {
        let config = AbilityConfig::default();
        let mut abilities = PlayerAbilities::new();
        assert_eq!(abilities.speed_multiplier(&config), 1.0);

        assert!(abilities.try_boost(&config));
        assert_eq!(abilities.speed_multiplier(&config), 2.5);
        assert!(!abilities.try_boost(&config));

        let mut ended = false;
        for _ in 0..21 {
            ended |= abilities.tick(0.1);
        }
        assert!(ended);
        assert_eq!(abilities.speed_multiplier(&config), 1.0);
        // Cooldown of 5s runs from activation
        assert!(!abilities.try_boost(&config));
        for _ in 0..30 {
            abilities.tick(0.1);
        }
        assert!(abilities.try_boost(&config));
    }

    #[test]
    fn test_auto_boost_cadence() {
        let config = AbilityConfig::default();
        let mut abilities = PlayerAbilities::new();
        abilities.reset(&config);

        let mut fired_at = Vec::new();
        let mut boosted_ticks = 0;
        for i in 0..120 {
            if abilities.tick_auto_boost(&config, 0.1) {
                fired_at.push(i);
            }
            if abilities.speed_multiplier(&config) > 3.0 {
                boosted_ticks += 1;
            }
        }
        // Every 5s for 2s, first at the end of the opening interval
        assert_eq!(fired_at.len(), 2, "fired at {fired_at:?}");
        assert!((48..=50).contains(&fired_at[0]));
        assert!((98..=100).contains(&fired_at[1]));
        assert!((38..=42).contains(&boosted_ticks), "boosted {boosted_ticks}");
    }

    #[test]
    fn test_auto_boost_stacks_and_can_be_disabled() {
        let mut config = AbilityConfig::default();
        let mut abilities = PlayerAbilities::new();
        abilities.auto_boost.try_activate(2.0, 5.0);
        assert!(abilities.try_boost(&config));
        assert!((abilities.speed_multiplier(&config) - 2.5 * 3.5).abs() < 1e-4);

        config.auto_boost = None;
        assert_eq!(abilities.speed_multiplier(&config), 2.5);

        abilities.reset(&config);
        for _ in 0..100 {
            assert!(!abilities.tick_auto_boost(&config, 0.1));
        }
        assert!(abilities.try_boost(&config));
    }

    #[test]
    fn test_power_ball_cooldown() {
        let config = ProjectileConfig::default();
        let mut abilities = PlayerAbilities::new();
        let snake = snake();

        let ball = abilities.try_launch(&config, &snake).unwrap();
        assert_eq!(ball.owner, Faction::Player);
        assert!((ball.vel.x - 300.0).abs() < 1e-3);
        assert!(abilities.try_launch(&config, &snake).is_none());

        for _ in 0..11 {
            abilities.tick(0.1);
        }
        assert!(abilities.try_launch(&config, &snake).is_some());
        assert_eq!(abilities.balls_fired, 2);
    }

    #[test]
    fn test_aimed_launch_points_at_target() {
        let mut abilities = PlayerAbilities::new();
        let target = Vec2::new(100.0, 300.0);
        let ball = abilities.aimed_launch(&ProjectileConfig::default(), 360.0, &snake(), target);
        assert!(ball.vel.x.abs() < 1e-3);
        assert!((ball.vel.y - 360.0).abs() < 1e-3);
    }

    #[test]
    fn test_exchange_fires_then_answers() {
        let config = ExchangeConfig::default();
        let mut director = ExchangeDirector::new(&config);
        let mut rng = StdRng::seed_from_u64(8);

        let mut fired = Vec::new();
        for _ in 0..55 {
            fired.extend(director.tick(&config, 0.1, |_| false, &mut rng));
        }
        assert_eq!(fired.len(), 1);
        let first = fired[0];
        assert_eq!(director.pending_answer(), Some(first.opponent()));

        for _ in 0..10 {
            fired.extend(director.tick(&config, 0.1, |_| false, &mut rng));
        }
        assert_eq!(fired, vec![first, first.opponent()]);
        assert_eq!(director.pending_answer(), None);
    }

    #[test]
    fn test_exchange_reset_drops_pending_answer() {
        let config = ExchangeConfig::default();
        let mut director = ExchangeDirector::new(&config);
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..55 {
            director.tick(&config, 0.1, |_| false, &mut rng);
        }
        assert!(director.pending_answer().is_some());

        director.reset(&config);
        assert_eq!(director.pending_answer(), None);
        assert_eq!(director.rounds, 0);
        let fired: Vec<Faction> = (0..45)
            .flat_map(|_| director.tick(&config, 0.1, |_| false, &mut rng))
            .collect();
        assert!(fired.is_empty());
    }

    #[test]
    fn test_exchange_skipped_while_busy() {
        let config = ExchangeConfig::default();
        let mut director = ExchangeDirector::new(&config);
        let mut rng = StdRng::seed_from_u64(9);

        let mut fired = Vec::new();
        for _ in 0..60 {
            fired.extend(director.tick(&config, 0.1, |side| side == Faction::Rival, &mut rng));
        }
        assert!(fired.is_empty());
        assert_eq!(director.rounds, 0);
    }
}
