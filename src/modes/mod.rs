pub mod play;
pub mod simulate;

pub use play::{PlayMode, PlayObserver};
pub use simulate::{Pilot, RoundResult, SimulateConfig, SimulateMode};
