use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{stderr, Stderr};
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{info, trace, warn};

use crate::game::{
    EffectEvent, GameConfig, GameObserver, GameOverSummary, GamePhase, GameSession, ParticleSystem,
    SoundEvent,
};
use crate::input::{InputHandler, KeyAction};
use crate::metrics::GameMetrics;
use crate::render::Renderer;
use crate::storage::{SaveData, Storage};

/// Collects what the session emits for the terminal front-end
pub struct PlayObserver {
    pub particles: ParticleSystem,
    sound_enabled: bool,
    finished: Option<GameOverSummary>,
}

impl PlayObserver {
    pub fn new(sound_enabled: bool) -> Self {
        Self {
            particles: ParticleSystem::new(),
            sound_enabled,
            finished: None,
        }
    }

    /// The summary of a round that ended since the last call
    pub fn take_finished(&mut self) -> Option<GameOverSummary> {
        self.finished.take()
    }
}

impl GameObserver for PlayObserver {
    fn on_sound(&mut self, sound: SoundEvent) {
        // No audio backend in the terminal, cues only go to the log
        if self.sound_enabled {
            trace!(sound = sound.name(), "Sound cue");
        }
    }

    fn on_effect(&mut self, effect: EffectEvent) {
        self.particles.spawn(effect.kind, effect.pos);
    }

    fn on_game_over(&mut self, summary: &GameOverSummary) {
        self.finished = Some(summary.clone());
    }
}

pub struct PlayMode {
    session: GameSession<PlayObserver>,
    metrics: GameMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    storage: Storage,
    save: SaveData,
    should_quit: bool,
    last_tick: Instant,
}

impl PlayMode {
    pub fn new(config: GameConfig, storage: Storage, save: SaveData, seed: Option<u64>) -> Self {
        let settings = &save.settings;
        let observer = PlayObserver::new(settings.sound_enabled);
        let renderer = Renderer::new(settings.theme);
        let input_handler = InputHandler::new(settings.controls);

        let mut session = match seed {
            Some(seed) => GameSession::with_seed(config, observer, seed),
            None => GameSession::new(config, observer),
        };
        session.start();

        Self {
            session,
            metrics: GameMetrics::new(),
            renderer,
            input_handler,
            storage,
            save,
            should_quit: false,
            last_tick: Instant::now(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        // Run game loop with cleanup
        let result = self.run_game_loop(&mut terminal).await;

        // Cleanup terminal
        self.cleanup_terminal(&mut terminal)?;

        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        // Simulation runs at 60 Hz with measured deltas
        let mut tick_timer = interval(Duration::from_millis(16));

        // Render at 30 FPS (33ms per frame)
        let mut render_timer = interval(Duration::from_millis(33));

        self.last_tick = Instant::now();

        loop {
            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event);
                    }
                }

                // Game logic tick
                _ = tick_timer.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(self.last_tick).as_secs_f32();
                    self.last_tick = now;
                    self.advance(dt);
                }

                // Render frame
                _ = render_timer.tick() => {
                    self.metrics.on_frame();
                    let high_score = self.save.high_score;
                    terminal.draw(|frame| {
                        self.renderer.render(
                            frame,
                            &self.session,
                            &self.session.observer().particles,
                            &self.metrics,
                            high_score,
                        );
                    }).context("Failed to draw frame")?;
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        info!(
            games = self.metrics.games_played,
            best = self.metrics.best_score,
            average = self.metrics.average_score(),
            "Leaving play mode"
        );
        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            // Only process key press events, not release
            if key.kind != KeyEventKind::Press {
                return;
            }

            match self.input_handler.handle_key_event(key) {
                KeyAction::Steer(heading) => self.session.steer(heading),
                KeyAction::Use(ability) => {
                    self.session.trigger(ability);
                }
                KeyAction::TogglePause => {
                    self.session.toggle_pause();
                }
                KeyAction::Restart => self.restart(),
                KeyAction::Quit => self.should_quit = true,
                KeyAction::None => {}
            }
        }
    }

    /// Step the session and particles by `dt` seconds of wall time
    fn advance(&mut self, dt: f32) {
        let phase = self.session.phase();
        self.session.tick(dt);
        if phase != GamePhase::Paused {
            self.session.observer_mut().particles.update(dt);
        }

        if let Some(summary) = self.session.observer_mut().take_finished() {
            self.record_game(&summary);
        }
    }

    fn record_game(&mut self, summary: &GameOverSummary) {
        self.metrics.on_game_over(summary);
        if self.save.record_game(summary) {
            info!(score = summary.score, "New high score");
        }
        if let Err(err) = self.storage.save(&self.save) {
            warn!(error = %format!("{err:#}"), "Failed to save stats");
        }
    }

    fn restart(&mut self) {
        self.session.observer_mut().particles.clear();
        self.session.restart();
        self.last_tick = Instant::now();
        info!(mode = self.session.config().mode.name(), "Round restarted");
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Ability, GameOverReason, ParticleKind, Vec2};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use tempfile::TempDir;

    fn mode(dir: &TempDir) -> PlayMode {
        let storage = Storage::new(dir.path().join("save.json"));
        PlayMode::new(GameConfig::small(), storage, SaveData::default(), Some(7))
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn drive_into_wall(mode: &mut PlayMode) {
        let player = &mut mode.session.world_mut().player;
        player.heading = std::f32::consts::PI;
        player.target_heading = std::f32::consts::PI;
        for _ in 0..200 {
            mode.advance(0.1);
        }
    }

    #[test]
    fn test_play_mode_starts_running() {
        let dir = TempDir::new().unwrap();
        let mode = mode(&dir);
        assert_eq!(mode.session.phase(), GamePhase::Running);
        assert_eq!(mode.session.score(), 0);
    }

    #[test]
    fn test_pause_key_toggles() {
        let dir = TempDir::new().unwrap();
        let mut mode = mode(&dir);

        mode.handle_event(key(KeyCode::Char('p')));
        assert_eq!(mode.session.phase(), GamePhase::Paused);

        let head = mode.session.world().player.head_pos();
        mode.advance(0.1);
        assert_eq!(mode.session.world().player.head_pos(), head);

        mode.handle_event(key(KeyCode::Char('p')));
        assert_eq!(mode.session.phase(), GamePhase::Running);
    }

    #[test]
    fn test_steer_key_sets_target() {
        let dir = TempDir::new().unwrap();
        let mut mode = mode(&dir);
        mode.handle_event(key(KeyCode::Up));
        let target = mode.session.world().player.target_heading;
        assert!((target + std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_boost_spawns_particles() {
        let dir = TempDir::new().unwrap();
        let mut mode = mode(&dir);
        mode.handle_event(key(KeyCode::Char(' ')));
        assert!(mode.session.abilities().boost.is_active());
        assert!(!mode.session.observer().particles.is_empty());
        assert!(!mode.session.trigger(Ability::SpeedBoost));
    }

    #[test]
    fn test_particles_age_out() {
        let mut observer = PlayObserver::new(false);
        observer.on_effect(EffectEvent {
            kind: ParticleKind::Explosion,
            pos: Vec2::new(10.0, 10.0),
        });
        assert_eq!(observer.particles.len(), 12);

        for _ in 0..120 {
            observer.particles.update(1.0 / 60.0);
        }
        assert!(observer.particles.is_empty());
    }

    #[test]
    fn test_game_over_is_recorded_and_saved() {
        let dir = TempDir::new().unwrap();
        let mut mode = mode(&dir);
        mode.save.high_score = 0;
        drive_into_wall(&mut mode);

        assert_eq!(mode.session.phase(), GamePhase::GameOver);
        assert_eq!(mode.session.summary().map(|s| s.reason), Some(GameOverReason::Wall));
        assert_eq!(mode.metrics.games_played, 1);
        assert_eq!(mode.save.stats.games_played, 1);

        let saved = Storage::new(dir.path().join("save.json")).load();
        assert_eq!(saved.stats.games_played, 1);

        // Further ticks don't record the round twice
        mode.advance(0.1);
        assert_eq!(mode.save.stats.games_played, 1);
    }

    #[test]
    fn test_restart_key() {
        let dir = TempDir::new().unwrap();
        let mut mode = mode(&dir);
        drive_into_wall(&mut mode);
        assert_eq!(mode.session.phase(), GamePhase::GameOver);

        mode.handle_event(key(KeyCode::Char('r')));
        assert_eq!(mode.session.phase(), GamePhase::Running);
        assert_eq!(mode.session.score(), 0);
        assert!(mode.session.summary().is_none());
    }

    #[test]
    fn test_quit_key() {
        let dir = TempDir::new().unwrap();
        let mut mode = mode(&dir);
        mode.handle_event(key(KeyCode::Char('q')));
        assert!(mode.should_quit);
    }
}
