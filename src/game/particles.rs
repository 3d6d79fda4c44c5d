//! Short-lived visual particles
//!
//! Purely cosmetic. The session reports effect requests through
//! [`GameObserver::on_effect`](super::events::GameObserver::on_effect) and a
//! front-end feeds them into a [`ParticleSystem`], which it advances on its
//! own clock.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::geometry::Vec2;

/// Reference frame rate the per-frame tuning values are expressed in
const FRAME_RATE: f32 = 60.0;

const DEFAULT_MAX_PARTICLES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleKind {
    FoodBurst,
    Trail,
    SpeedBoost,
    PowerBallTrail,
    Explosion,
    WallHit,
    Sparkle,
}

/// An RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Tuning for one kind of burst
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleConfig {
    pub count: usize,
    /// Probability that a request spawns anything at all
    pub spawn_chance: f32,
    /// Lifetime in frames at the reference rate
    pub lifetime_frames: u32,
    pub palette: &'static [Rgb],
    /// Full width of the random initial velocity, px per frame
    pub spread: f32,
    /// Downward acceleration, px per frame squared
    pub gravity: f32,
    /// Velocity multiplier per frame
    pub friction: f32,
    pub min_size: f32,
    pub max_size: f32,
    /// Random offset applied to the spawn position
    pub jitter: f32,
}

const FOOD_COLORS: &[Rgb] = &[
    Rgb(255, 0, 0),
    Rgb(255, 102, 102),
    Rgb(255, 170, 0),
    Rgb(255, 255, 0),
];
const BOOST_COLORS: &[Rgb] = &[Rgb(255, 215, 0), Rgb(255, 170, 0), Rgb(255, 102, 0)];
const BALL_COLORS: &[Rgb] = &[Rgb(0, 255, 255), Rgb(0, 136, 255), Rgb(255, 255, 255)];
const EXPLOSION_COLORS: &[Rgb] = &[
    Rgb(255, 0, 0),
    Rgb(255, 102, 0),
    Rgb(255, 170, 0),
    Rgb(255, 255, 255),
];
const WALL_COLORS: &[Rgb] = &[Rgb(255, 255, 255), Rgb(204, 204, 204), Rgb(153, 153, 153)];
const TRAIL_COLORS: &[Rgb] = &[Rgb(0, 255, 136)];
const SPARKLE_COLORS: &[Rgb] = &[Rgb(255, 255, 255)];

impl ParticleConfig {
    pub fn for_kind(kind: ParticleKind) -> Self {
        let base = Self {
            count: 1,
            spawn_chance: 1.0,
            lifetime_frames: 30,
            palette: SPARKLE_COLORS,
            spread: 4.0,
            gravity: 0.0,
            friction: 0.98,
            min_size: 1.0,
            max_size: 4.0,
            jitter: 0.0,
        };

        match kind {
            ParticleKind::FoodBurst => Self {
                count: 8,
                lifetime_frames: 40,
                palette: FOOD_COLORS,
                spread: 8.0,
                min_size: 2.0,
                max_size: 6.0,
                ..base
            },
            ParticleKind::Trail => Self {
                spawn_chance: 0.3,
                lifetime_frames: 20,
                palette: TRAIL_COLORS,
                spread: 2.0,
                friction: 0.95,
                max_size: 3.0,
                ..base
            },
            ParticleKind::SpeedBoost => Self {
                count: 5,
                palette: BOOST_COLORS,
                spread: 6.0,
                min_size: 2.0,
                max_size: 5.0,
                ..base
            },
            ParticleKind::PowerBallTrail => Self {
                lifetime_frames: 25,
                palette: BALL_COLORS,
                spread: 3.0,
                ..base
            },
            ParticleKind::Explosion => Self {
                count: 12,
                lifetime_frames: 50,
                palette: EXPLOSION_COLORS,
                spread: 10.0,
                gravity: 0.1,
                min_size: 2.0,
                max_size: 7.0,
                ..base
            },
            ParticleKind::WallHit => Self {
                count: 6,
                lifetime_frames: 35,
                palette: WALL_COLORS,
                spread: 6.0,
                ..base
            },
            ParticleKind::Sparkle => Self {
                spawn_chance: 0.2,
                lifetime_frames: 15,
                spread: 1.0,
                max_size: 3.0,
                jitter: 12.0,
                ..base
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    /// Velocity in px per frame at the reference rate
    pub vel: Vec2,
    pub size: f32,
    pub color: Rgb,
    pub gravity: f32,
    pub friction: f32,
    /// Remaining life in frames
    pub life: f32,
    pub max_life: f32,
}

impl Particle {
    /// Opacity fading linearly from 1 to 0 over the lifetime
    pub fn alpha(&self) -> f32 {
        if self.max_life > 0.0 {
            (self.life / self.max_life).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Bounded pool of particles; the oldest are dropped first when full
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    max_particles: usize,
    rng: StdRng,
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            particles: Vec::new(),
            max_particles: DEFAULT_MAX_PARTICLES,
            rng,
        }
    }

    pub fn with_capacity(mut self, max_particles: usize) -> Self {
        self.max_particles = max_particles;
        self
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn spawn(&mut self, kind: ParticleKind, pos: Vec2) {
        let config = ParticleConfig::for_kind(kind);
        self.spawn_with(&config, pos);
    }

    pub fn spawn_with(&mut self, config: &ParticleConfig, pos: Vec2) {
        if config.palette.is_empty() || self.rng.gen::<f32>() >= config.spawn_chance {
            return;
        }

        for _ in 0..config.count {
            let offset = Vec2::new(
                (self.rng.gen::<f32>() - 0.5) * config.jitter * 2.0,
                (self.rng.gen::<f32>() - 0.5) * config.jitter * 2.0,
            );
            let vel = Vec2::new(
                (self.rng.gen::<f32>() - 0.5) * config.spread,
                (self.rng.gen::<f32>() - 0.5) * config.spread,
            );
            let size = if config.max_size > config.min_size {
                self.rng.gen_range(config.min_size..config.max_size)
            } else {
                config.min_size
            };
            let color = config.palette[self.rng.gen_range(0..config.palette.len())];
            let life = config.lifetime_frames as f32;

            self.particles.push(Particle {
                pos: pos + offset,
                vel,
                size,
                color,
                gravity: config.gravity,
                friction: config.friction,
                life,
                max_life: life,
            });
        }
        self.enforce_cap();
    }

    /// Advance every particle by `dt` seconds and drop expired ones
    pub fn update(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let frames = dt * FRAME_RATE;

        for p in &mut self.particles {
            p.pos += p.vel.scaled(frames);
            p.vel.y += p.gravity * frames;
            let damping = p.friction.powf(frames);
            p.vel = p.vel.scaled(damping);
            p.life -= frames;
        }
        self.particles.retain(|p| p.life > 0.0);
        self.enforce_cap();
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    fn enforce_cap(&mut self) {
        if self.particles.len() > self.max_particles {
            let excess = self.particles.len() - self.max_particles;
            self.particles.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_food_burst_spawns_eight() {
        let mut system = ParticleSystem::with_seed(1);
        system.spawn(ParticleKind::FoodBurst, Vec2::new(50.0, 50.0));
        assert_eq!(system.len(), 8);
        assert!(system.particles().iter().all(|p| FOOD_COLORS.contains(&p.color)));
    }

    #[test]
    fn test_cap_drops_oldest() {
        let mut system = ParticleSystem::with_seed(2).with_capacity(20);
        system.spawn(ParticleKind::FoodBurst, Vec2::new(1.0, 1.0));
        for _ in 0..3 {
            system.spawn(ParticleKind::Explosion, Vec2::new(100.0, 100.0));
        }
        assert_eq!(system.len(), 20);
        // The food burst was the oldest and is gone entirely
        assert!(system.particles().iter().all(|p| EXPLOSION_COLORS.contains(&p.color)));
    }

    #[test]
    fn test_particles_expire() {
        let mut system = ParticleSystem::with_seed(3);
        system.spawn(ParticleKind::WallHit, Vec2::new(10.0, 10.0));
        assert_eq!(system.len(), 6);

        system.update(0.3);
        assert_eq!(system.len(), 6);
        assert!(system.particles().iter().all(|p| p.alpha() < 1.0));

        system.update(0.3);
        assert!(system.is_empty());
    }

    #[test]
    fn test_gravity_pulls_down() {
        let mut system = ParticleSystem::with_seed(4);
        let config = ParticleConfig {
            spread: 0.0,
            friction: 1.0,
            count: 1,
            ..ParticleConfig::for_kind(ParticleKind::Explosion)
        };
        system.spawn_with(&config, Vec2::new(0.0, 0.0));
        system.update(0.2);
        system.update(0.2);
        assert!(system.particles()[0].pos.y > 0.0);
    }

    #[test]
    fn test_update_ignores_bad_dt() {
        let mut system = ParticleSystem::with_seed(5);
        system.spawn(ParticleKind::FoodBurst, Vec2::new(50.0, 50.0));
        let before = system.particles().to_vec();
        system.update(f32::NAN);
        system.update(-1.0);
        assert_eq!(system.particles(), before.as_slice());
    }
}
