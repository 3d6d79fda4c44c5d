//! Core game logic for the slither snake game
//!
//! This module contains all of the simulation without any I/O or rendering
//! dependencies. A front-end drives a [`GameSession`] with `tick` and reacts
//! to side effects through a [`GameObserver`].

pub mod abilities;
pub mod ai;
pub mod collision;
pub mod config;
pub mod engine;
pub mod events;
pub mod geometry;
pub mod movement;
pub mod particles;
pub mod state;
pub mod timer;

// Re-export commonly used types
pub use abilities::Ability;
pub use ai::{Behavior, Rival};
pub use collision::GameOverReason;
pub use config::{GameConfig, GameMode, RivalContact, RivalProfile};
pub use engine::{GamePhase, GameSession, TickReport, World};
pub use events::{EffectEvent, EventLog, GameObserver, GameOverSummary, NullObserver, SoundEvent};
pub use geometry::Vec2;
pub use particles::{ParticleKind, ParticleSystem};
pub use state::{Faction, Field, Food, Obstacle, Projectile, Segment, Snake};
