/// A countdown in simulated seconds, advanced only by the session tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Countdown {
    remaining: f32,
}

impl Countdown {
    pub fn new() -> Self {
        Self { remaining: 0.0 }
    }

    /// A countdown that starts already running
    pub fn started(duration: f32) -> Self {
        let mut countdown = Self::new();
        countdown.start(duration);
        countdown
    }

    pub fn start(&mut self, duration: f32) {
        self.remaining = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
    }

    pub fn clear(&mut self) {
        self.remaining = 0.0;
    }

    /// Advance by `dt`. Returns true exactly on the tick the countdown expires.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.remaining <= 0.0 {
            return false;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            true
        } else {
            false
        }
    }

    pub fn is_running(&self) -> bool {
        self.remaining > 0.0
    }

    pub fn is_ready(&self) -> bool {
        !self.is_running()
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }
}

/// An effect that stays active for a duration and then refuses to restart
/// until its cooldown has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimedAbility {
    pub active: Countdown,
    pub cooldown: Countdown,
    pub activations: u32,
}

impl TimedAbility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_activate(&self) -> bool {
        self.active.is_ready() && self.cooldown.is_ready()
    }

    /// Start the effect if allowed. Cooldown runs from activation.
    pub fn try_activate(&mut self, duration: f32, cooldown: f32) -> bool {
        if !self.can_activate() {
            return false;
        }
        self.active.start(duration);
        self.cooldown.start(cooldown);
        self.activations += 1;
        true
    }

    /// Returns true on the tick the effect ends
    pub fn tick(&mut self, dt: f32) -> bool {
        self.cooldown.tick(dt);
        self.active.tick(dt)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_running()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
