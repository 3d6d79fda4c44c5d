use super::collision::GameOverReason;
use super::config::GameMode;
use super::geometry::Vec2;
use super::particles::ParticleKind;

/// Named audio cues emitted by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEvent {
    Eat,
    Success,
    Hit,
    Explosion,
    SpeedBoost,
    Whoosh,
}

impl SoundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SoundEvent::Eat => "eat",
            SoundEvent::Success => "success",
            SoundEvent::Hit => "hit",
            SoundEvent::Explosion => "explosion",
            SoundEvent::SpeedBoost => "speedboost",
            SoundEvent::Whoosh => "whoosh",
        }
    }
}

/// A request for a visual effect at a field position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectEvent {
    pub kind: ParticleKind,
    pub pos: Vec2,
}

/// Payload delivered once when a round ends
#[derive(Debug, Clone, PartialEq)]
pub struct GameOverSummary {
    pub score: u32,
    pub snake_length: usize,
    /// Simulated seconds spent running
    pub elapsed_time: f32,
    pub mode: GameMode,
    pub reason: GameOverReason,
    pub is_win: bool,
}

/// Receives side effects from the session
///
/// Every method has a no-op default so collaborators only implement what
/// they consume.
pub trait GameObserver {
    fn on_sound(&mut self, _sound: SoundEvent) {}

    fn on_effect(&mut self, _effect: EffectEvent) {}

    fn on_score(&mut self, _score: u32) {}

    /// Whole seconds left on the time-attack clock, reported on change
    fn on_timer(&mut self, _seconds_left: u32) {}

    fn on_game_over(&mut self, _summary: &GameOverSummary) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl GameObserver for NullObserver {}

/// Observer that records everything it receives
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub sounds: Vec<SoundEvent>,
    pub effects: Vec<EffectEvent>,
    pub scores: Vec<u32>,
    pub timers: Vec<u32>,
    pub game_overs: Vec<GameOverSummary>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn count_sound(&self, sound: SoundEvent) -> usize {
        self.sounds.iter().filter(|s| **s == sound).count()
    }

    pub fn count_effect(&self, kind: ParticleKind) -> usize {
        self.effects.iter().filter(|e| e.kind == kind).count()
    }
}

impl GameObserver for EventLog {
    fn on_sound(&mut self, sound: SoundEvent) {
        self.sounds.push(sound);
    }

    fn on_effect(&mut self, effect: EffectEvent) {
        self.effects.push(effect);
    }

    fn on_score(&mut self, score: u32) {
        self.scores.push(score);
    }

    fn on_timer(&mut self, seconds_left: u32) {
        self.timers.push(seconds_left);
    }

    fn on_game_over(&mut self, summary: &GameOverSummary) {
        self.game_overs.push(summary.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_records() {
        let mut log = EventLog::new();
        log.on_sound(SoundEvent::Eat);
        log.on_sound(SoundEvent::Eat);
        log.on_effect(EffectEvent {
            kind: ParticleKind::FoodBurst,
            pos: Vec2::new(1.0, 2.0),
        });
        log.on_score(10);

        assert_eq!(log.count_sound(SoundEvent::Eat), 2);
        assert_eq!(log.count_effect(ParticleKind::FoodBurst), 1);
        assert_eq!(log.scores, vec![10]);

        log.clear();
        assert!(log.sounds.is_empty());
    }

    #[test]
    fn test_sound_names() {
        assert_eq!(SoundEvent::SpeedBoost.name(), "speedboost");
        assert_eq!(SoundEvent::Whoosh.name(), "whoosh");
    }
}
