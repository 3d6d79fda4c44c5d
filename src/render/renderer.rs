use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Context, Points},
        Block, BorderType, Borders, Clear, Paragraph,
    },
    Frame,
};

use crate::game::particles::Rgb;
use crate::game::{GameObserver, GamePhase, GameSession, ParticleSystem, Snake, Vec2};
use crate::metrics::{format_time, GameMetrics};
use crate::storage::Theme;

/// Colours used to draw the field
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub snake: Color,
    pub head: Color,
    pub boosted_head: Color,
    pub rival: Color,
    pub rival_resting: Color,
    pub food: Color,
    pub obstacle: Color,
    pub player_ball: Color,
    pub rival_ball: Color,
    pub border: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                snake: Color::Rgb(76, 175, 80),
                head: Color::Rgb(129, 199, 132),
                boosted_head: Color::Rgb(255, 215, 0),
                rival: Color::Rgb(255, 152, 0),
                rival_resting: Color::DarkGray,
                food: Color::Rgb(255, 82, 82),
                obstacle: Color::Rgb(102, 102, 102),
                player_ball: Color::Rgb(0, 255, 255),
                rival_ball: Color::Rgb(255, 102, 0),
                border: Color::White,
            },
            Theme::Neon => Self {
                snake: Color::Rgb(255, 0, 255),
                head: Color::Rgb(255, 128, 255),
                boosted_head: Color::Rgb(255, 215, 0),
                rival: Color::Rgb(255, 255, 0),
                rival_resting: Color::DarkGray,
                food: Color::Rgb(0, 255, 0),
                obstacle: Color::Rgb(0, 255, 255),
                player_ball: Color::Rgb(0, 136, 255),
                rival_ball: Color::Rgb(255, 0, 128),
                border: Color::Rgb(0, 255, 255),
            },
            Theme::Retro => Self {
                snake: Color::Rgb(255, 107, 53),
                head: Color::Rgb(255, 160, 110),
                boosted_head: Color::Rgb(255, 215, 0),
                rival: Color::Rgb(222, 184, 135),
                rival_resting: Color::Rgb(90, 70, 60),
                food: Color::Rgb(197, 40, 47),
                obstacle: Color::Rgb(139, 69, 19),
                player_ball: Color::Rgb(255, 235, 160),
                rival_ball: Color::Rgb(197, 40, 47),
                border: Color::Rgb(205, 133, 63),
            },
        }
    }
}

fn rgb(color: Rgb) -> Color {
    Color::Rgb(color.0, color.1, color.2)
}

pub struct Renderer {
    palette: Palette,
}

impl Renderer {
    pub fn new(theme: Theme) -> Self {
        Self {
            palette: Palette::for_theme(theme),
        }
    }

    pub fn render<O: GameObserver>(
        &self,
        frame: &mut Frame,
        session: &GameSession<O>,
        particles: &ParticleSystem,
        metrics: &GameMetrics,
        high_score: u32,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Game area
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        // Render header with basic stats
        let stats = self.render_stats(session, metrics, high_score);
        frame.render_widget(stats, chunks[0]);

        let game_area = chunks[1];
        let field = self.render_field(session, particles);
        frame.render_widget(field, game_area);

        match session.phase() {
            GamePhase::Paused => {
                let area = centered_rect(30, 5, game_area);
                frame.render_widget(Clear, area);
                frame.render_widget(self.render_paused(), area);
            }
            GamePhase::GameOver => {
                let area = centered_rect(44, 10, game_area);
                frame.render_widget(Clear, area);
                frame.render_widget(self.render_game_over(session, high_score), area);
            }
            GamePhase::Idle | GamePhase::Running => {}
        }

        // Render footer with controls
        let controls = self.render_controls();
        frame.render_widget(controls, chunks[2]);
    }

    fn render_field<'a, O: GameObserver>(
        &'a self,
        session: &'a GameSession<O>,
        particles: &'a ParticleSystem,
    ) -> Canvas<'a, impl Fn(&mut Context<'_>) + 'a> {
        let world = session.world();
        let (width, height) = (world.field.width as f64, world.field.height as f64);
        let palette = self.palette;
        let boosted = session.abilities().boost.is_active();
        let title = format!(" {} ", session.config().mode.name());

        Canvas::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .border_style(Style::default().fg(palette.border))
                    .title(title),
            )
            .marker(Marker::Braille)
            .x_bounds([0.0, width])
            .y_bounds([0.0, height])
            .paint(move |ctx| {
                // Canvas y grows upwards, field y grows downwards
                let flip = |p: Vec2| (p.x as f64, height - p.y as f64);

                for obstacle in &world.obstacles {
                    let (x, y) = flip(obstacle.pos);
                    ctx.draw(&Circle {
                        x,
                        y,
                        radius: obstacle.size as f64,
                        color: palette.obstacle,
                    });
                }

                if let Some(food) = world.food {
                    let (x, y) = flip(food.pos);
                    ctx.draw(&Circle {
                        x,
                        y,
                        radius: session.config().food.radius as f64,
                        color: palette.food,
                    });
                }

                if let Some(rival) = &world.rival {
                    let color = if rival.is_active() {
                        palette.rival
                    } else {
                        palette.rival_resting
                    };
                    draw_snake(ctx, &rival.snake, color, color, &flip);
                }

                let head = if boosted { palette.boosted_head } else { palette.head };
                let body = if session.player_active() {
                    palette.snake
                } else {
                    palette.rival_resting
                };
                draw_snake(ctx, &world.player, body, head, &flip);

                for ball in &world.projectiles {
                    let (x, y) = flip(ball.pos);
                    let color = match ball.owner {
                        crate::game::Faction::Player => palette.player_ball,
                        crate::game::Faction::Rival => palette.rival_ball,
                    };
                    ctx.draw(&Circle {
                        x,
                        y,
                        radius: ball.size as f64,
                        color,
                    });
                }

                ctx.layer();
                for particle in particles.particles() {
                    if particle.alpha() <= 0.1 {
                        continue;
                    }
                    let coords = [flip(particle.pos)];
                    ctx.draw(&Points {
                        coords: &coords,
                        color: rgb(particle.color),
                    });
                }
            })
    }

    fn render_stats<O: GameObserver>(
        &self,
        session: &GameSession<O>,
        metrics: &GameMetrics,
        high_score: u32,
    ) -> Paragraph<'_> {
        let label = Style::default().fg(Color::Yellow);
        let value = Style::default().fg(Color::White);

        let clock = match session.time_left() {
            Some(left) => format!("{} left", format_time(left.ceil())),
            None => format_time(session.elapsed()),
        };

        let abilities = session.abilities();
        let boost = if abilities.auto_boost.is_active() {
            "AUTO".to_string()
        } else if abilities.boost.is_active() {
            "ON".to_string()
        } else if abilities.boost.can_activate() {
            "ready".to_string()
        } else {
            format!("{:.1}s", abilities.boost.cooldown.remaining())
        };
        let ball = if abilities.can_launch() {
            "ready".to_string()
        } else {
            format!("{:.1}s", abilities.ball_cooldown.remaining())
        };

        let mut spans = vec![
            Span::styled("Score: ", label),
            Span::styled(session.score().to_string(), value.add_modifier(Modifier::BOLD)),
            Span::raw("   "),
            Span::styled("Best: ", label),
            Span::styled(high_score.max(session.score()).to_string(), value),
            Span::raw("   "),
            Span::styled("Length: ", label),
            Span::styled(session.world().player.len().to_string(), value),
            Span::raw("   "),
            Span::styled("Time: ", label),
            Span::styled(clock, value),
            Span::raw("   "),
            Span::styled("Level: ", label),
            Span::styled(session.config().level.to_string(), value),
            Span::raw("   "),
            Span::styled("Boost: ", label),
            Span::styled(boost, value),
            Span::raw("   "),
            Span::styled("Ball: ", label),
            Span::styled(ball, value),
            Span::raw("   "),
        ];
        if session.rival_in_rapid_exchange() {
            let alert = Style::default().fg(Color::Red).add_modifier(Modifier::BOLD);
            spans.push(Span::styled("RAPID FIRE", alert));
            spans.push(Span::raw("   "));
        }
        let fps = format!("{:.0} fps", metrics.fps);
        spans.push(Span::styled(fps, Style::default().fg(Color::DarkGray)));

        Paragraph::new(vec![Line::from(spans)]).alignment(Alignment::Center)
    }

    fn render_paused(&self) -> Paragraph<'_> {
        let text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "PAUSED",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )]),
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::Gray)),
                Span::styled("P", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                Span::styled(" to resume", Style::default().fg(Color::Gray)),
            ]),
        ];

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        )
    }

    fn render_game_over<O: GameObserver>(
        &self,
        session: &GameSession<O>,
        high_score: u32,
    ) -> Paragraph<'_> {
        let (headline, color, reason) = match session.summary() {
            Some(summary) if summary.is_win => ("YOU WIN", Color::Green, summary.reason.message()),
            Some(summary) => ("GAME OVER", Color::Red, summary.reason.message()),
            None => ("GAME OVER", Color::Red, ""),
        };
        let score = session.score();

        let mut text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                headline,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )]),
            Line::from(Span::styled(reason, Style::default().fg(Color::Gray))),
            Line::from(""),
            Line::from(vec![
                Span::styled("Final Score: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    score.to_string(),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
            ]),
        ];

        if score > 0 && score >= high_score {
            text.push(Line::from(Span::styled(
                "New high score!",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
        } else {
            text.push(Line::from(""));
        }

        text.push(Line::from(vec![
            Span::styled("Press ", Style::default().fg(Color::Gray)),
            Span::styled("R", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::styled(" to restart or ", Style::default().fg(Color::Gray)),
            Span::styled("Q", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::styled(" to quit", Style::default().fg(Color::Gray)),
        ]));

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        )
    }

    fn render_controls(&self) -> Paragraph<'_> {
        let text = vec![Line::from(vec![
            Span::styled("↑↓←→", Style::default().fg(Color::Cyan)),
            Span::raw(" or "),
            Span::styled("WASD", Style::default().fg(Color::Cyan)),
            Span::raw(" to steer | "),
            Span::styled("Space", Style::default().fg(Color::Cyan)),
            Span::raw(" boost | "),
            Span::styled("F", Style::default().fg(Color::Cyan)),
            Span::raw(" power ball | "),
            Span::styled("P", Style::default().fg(Color::Cyan)),
            Span::raw(" pause | "),
            Span::styled("Q", Style::default().fg(Color::Red)),
            Span::raw(" to quit"),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(Theme::Dark)
    }
}

fn draw_snake(
    ctx: &mut Context<'_>,
    snake: &Snake,
    body: Color,
    head: Color,
    flip: &impl Fn(Vec2) -> (f64, f64),
) {
    for (i, segment) in snake.segments.iter().enumerate().rev() {
        let (x, y) = flip(segment.pos);
        let (color, radius) = if i == 0 {
            (head, segment.size as f64 * 1.2)
        } else {
            (body, segment.size as f64)
        };
        ctx.draw(&Circle { x, y, radius, color });
    }
}

/// A `width` x `height` rectangle centred in `area`, shrunk to fit
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{EventLog, GameConfig};
    use ratatui::{backend::TestBackend, Terminal};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_centered_rect_fits() {
        let area = Rect::new(0, 0, 20, 10);
        let rect = centered_rect(30, 4, area);
        assert_eq!(rect.width, 20);
        assert_eq!(rect.y, 3);
    }

    #[test]
    fn test_render_running_and_paused() {
        let mut session = GameSession::with_seed(GameConfig::default(), EventLog::new(), 1);
        session.start();
        session.tick(1.0 / 60.0);

        let renderer = Renderer::new(Theme::Neon);
        let particles = ParticleSystem::with_seed(1);
        let metrics = GameMetrics::new();
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();

        terminal
            .draw(|frame| renderer.render(frame, &session, &particles, &metrics, 0))
            .unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Score:"));
        assert!(!text.contains("PAUSED"));

        session.pause();
        terminal
            .draw(|frame| renderer.render(frame, &session, &particles, &metrics, 0))
            .unwrap();
        assert!(buffer_text(&terminal).contains("PAUSED"));
    }

    #[test]
    fn test_render_flags_rapid_exchange() {
        use crate::game::config::AttackConfig;
        use crate::game::Vec2;
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let mut session = GameSession::with_seed(GameConfig::default(), EventLog::new(), 4);
        session.start();
        let renderer = Renderer::default();
        let mut terminal = Terminal::new(TestBackend::new(160, 40)).unwrap();
        let draw = |terminal: &mut Terminal<TestBackend>, session: &GameSession<EventLog>| {
            terminal
                .draw(|frame| {
                    let particles = ParticleSystem::with_seed(5);
                    renderer.render(frame, session, &particles, &GameMetrics::new(), 0)
                })
                .unwrap();
        };

        draw(&mut terminal, &session);
        assert!(!buffer_text(&terminal).contains("RAPID FIRE"));

        let attack = AttackConfig {
            fire_chance: 1.0,
            aggressiveness_weight: 1.0,
            rapid_exchange_chance: 1.0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(5);
        if let Some(rival) = session.world_mut().rival.as_mut() {
            rival.attack.unlocked = true;
            let from = Vec2::new(100.0, 100.0);
            let ball = rival
                .attack
                .consider_launch(&attack, 1.0, from, Vec2::new(260.0, 100.0), 0.0, &mut rng);
            assert!(ball.is_some());
        }
        assert!(session.rival_in_rapid_exchange());

        draw(&mut terminal, &session);
        assert!(buffer_text(&terminal).contains("RAPID FIRE"));
    }

    #[test]
    fn test_render_game_over() {
        let mut session = GameSession::with_seed(GameConfig::small(), EventLog::new(), 2);
        session.start();
        session.world_mut().player.heading = std::f32::consts::PI;
        session.world_mut().player.target_heading = std::f32::consts::PI;
        for _ in 0..200 {
            session.tick(0.1);
        }

        let renderer = Renderer::default();
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal
            .draw(|frame| {
                let particles = ParticleSystem::with_seed(3);
                renderer.render(frame, &session, &particles, &GameMetrics::new(), 10)
            })
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("GAME OVER"));
        assert!(text.contains("Hit wall"));
    }
}
