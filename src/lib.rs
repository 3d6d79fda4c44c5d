//! Slither Snake - a continuous-space snake game with a rival AI snake
//!
//! This library provides:
//! - Core simulation (game module): steering, chain movement, collisions,
//!   the rival's decision loop and projectile duels, session state machine
//! - Terminal front-end pieces (input, render, modes)
//! - Session metrics and persisted settings/stats (metrics, storage)

pub mod game;
pub mod input;
pub mod metrics;
pub mod modes;
pub mod render;
pub mod storage;
