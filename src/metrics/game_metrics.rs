use std::time::{Duration, Instant};

use crate::game::GameOverSummary;

/// Format seconds as `MM:SS`
pub fn format_time(secs: f32) -> String {
    let total_secs = if secs.is_finite() { secs.max(0.0) as u64 } else { 0 };
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}", minutes, seconds)
}

/// Metrics for the current process, shown alongside the game
pub struct GameMetrics {
    pub games_played: u32,
    pub wins: u32,
    pub best_score: u32,
    pub total_score: u64,
    /// Frames drawn in the current one-second window
    frames: u32,
    window_start: Instant,
    pub fps: f32,
}

impl GameMetrics {
    pub fn new() -> Self {
        Self {
            games_played: 0,
            wins: 0,
            best_score: 0,
            total_score: 0,
            frames: 0,
            window_start: Instant::now(),
            fps: 0.0,
        }
    }

    /// Count a drawn frame, refreshing the rate once per second
    pub fn on_frame(&mut self) {
        self.frames += 1;
        let window = self.window_start.elapsed();
        if window >= Duration::from_secs(1) {
            self.fps = self.frames as f32 / window.as_secs_f32();
            self.frames = 0;
            self.window_start = Instant::now();
        }
    }

    pub fn on_game_over(&mut self, summary: &GameOverSummary) {
        self.games_played += 1;
        self.total_score += summary.score as u64;
        if summary.is_win {
            self.wins += 1;
        }
        if summary.score > self.best_score {
            self.best_score = summary.score;
        }
    }

    pub fn average_score(&self) -> f32 {
        if self.games_played == 0 {
            0.0
        } else {
            self.total_score as f32 / self.games_played as f32
        }
    }
}

impl Default for GameMetrics {
    fn default() -> Self {
        Self::new()
    }
}
