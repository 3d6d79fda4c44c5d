use std::fmt;

use super::config::{GameConfig, RivalContact};
use super::geometry::{distance, Vec2};
use super::state::{Field, Food, Obstacle, Projectile, Snake};

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameOverReason {
    /// Player head hit a wall
    Wall,
    /// Player head hit its own body
    SelfCollision,
    /// Player head hit an obstacle
    Obstacle,
    /// Player head touched the rival under a lethal contact policy
    Rival,
    /// Time-attack clock ran out
    TimeUp,
    /// No free spot was left for food
    BoardFull,
}

impl GameOverReason {
    /// Rounds ended by surviving the clock or filling the board count as wins
    pub fn is_win(&self) -> bool {
        matches!(self, GameOverReason::TimeUp | GameOverReason::BoardFull)
    }

    pub fn message(&self) -> &'static str {
        match self {
            GameOverReason::Wall => "Hit wall",
            GameOverReason::SelfCollision => "Hit yourself",
            GameOverReason::Obstacle => "Hit obstacle",
            GameOverReason::Rival => "Collided with rival",
            GameOverReason::TimeUp => "Time's up!",
            GameOverReason::BoardFull => "Board full",
        }
    }
}

impl fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

pub fn hits_wall(field: &Field, head: Vec2, radius: f32) -> bool {
    field.crosses_edge(head, radius)
}

/// Candidate head against the player's own chain, ignoring the first `skip`
/// segments
pub fn hits_self(snake: &Snake, head: Vec2, threshold: f32, skip: usize) -> bool {
    snake.touches(head, threshold, skip)
}

pub fn hits_obstacle(obstacles: &[Obstacle], head: Vec2, radius: f32) -> bool {
    obstacles
        .iter()
        .any(|o| distance(head, o.pos) < radius + o.size)
}

/// Player head against every segment of the rival
pub fn hits_snake(other: &Snake, head: Vec2, radius: f32) -> bool {
    other
        .segments
        .iter()
        .any(|s| distance(head, s.pos) < radius + s.size)
}

pub fn reaches_food(food: &Food, head: Vec2, radius: f32, food_radius: f32) -> bool {
    distance(head, food.pos) < radius + food_radius
}

/// Projectile against a snake head
pub fn projectile_hits_head(projectile: &Projectile, target: &Snake) -> bool {
    let head = target.head();
    distance(projectile.pos, head.pos) < projectile.size + head.size
}

/// Terminal checks for a candidate player head, in priority order
///
/// `rival` is `None` when there is no rival or it is out of play.
pub fn detect_terminal(
    config: &GameConfig,
    field: &Field,
    player: &Snake,
    head: Vec2,
    obstacles: &[Obstacle],
    rival: Option<(&Snake, RivalContact)>,
) -> Option<GameOverReason> {
    let radius = player.radius();

    if hits_wall(field, head, radius) {
        return Some(GameOverReason::Wall);
    }

    let threshold = radius * config.player.self_collision_factor;
    if hits_self(player, head, threshold, config.player.self_skip) {
        return Some(GameOverReason::SelfCollision);
    }

    if hits_obstacle(obstacles, head, radius) {
        return Some(GameOverReason::Obstacle);
    }

    if let Some((rival, RivalContact::Lethal)) = rival {
        if hits_snake(rival, head, radius) {
            return Some(GameOverReason::Rival);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::Faction;

    fn player() -> Snake {
        Snake::new(Vec2::new(300.0, 300.0), 0.0, 3, 15.0, 15.0)
    }

    #[test]
    fn test_wall_collision_is_symmetric() {
        let field = Field::new(600.0, 600.0);
        let margin = 15.0;
        let eps = 0.5;
        assert!(hits_wall(&field, Vec2::new(margin - eps, 300.0), margin));
        assert!(hits_wall(&field, Vec2::new(600.0 - margin + eps, 300.0), margin));
        assert!(hits_wall(&field, Vec2::new(300.0, margin - eps), margin));
        assert!(hits_wall(&field, Vec2::new(300.0, 600.0 - margin + eps), margin));
        assert!(!hits_wall(&field, Vec2::new(margin + eps, 300.0), margin));
        assert!(!hits_wall(&field, Vec2::new(600.0 - margin - eps, 300.0), margin));
    }

    #[test]
    fn test_self_collision_ignores_neck() {
        let snake = Snake::new(Vec2::new(300.0, 300.0), 0.0, 6, 10.0, 10.0);
        // Right on top of segment 1, which is skipped
        let head = Vec2::new(290.0, 300.0);
        assert!(!hits_self(&snake, Vec2::new(300.0, 280.0), 12.0, 3));
        assert!(hits_self(&snake, Vec2::new(270.0, 300.0), 12.0, 3));
        assert!(!hits_self(&snake, head, 5.0, 3));
    }

    #[test]
    fn test_obstacle_collision() {
        let obstacles = [Obstacle {
            pos: Vec2::new(100.0, 100.0),
            size: 20.0,
        }];
        assert!(hits_obstacle(&obstacles, Vec2::new(130.0, 100.0), 15.0));
        assert!(!hits_obstacle(&obstacles, Vec2::new(140.0, 100.0), 15.0));
    }

    #[test]
    fn test_food_reach() {
        let food = Food {
            pos: Vec2::new(50.0, 50.0),
        };
        assert!(reaches_food(&food, Vec2::new(70.0, 50.0), 15.0, 12.0));
        assert!(!reaches_food(&food, Vec2::new(80.0, 50.0), 15.0, 12.0));
    }

    #[test]
    fn test_projectile_hits_head() {
        let target = player();
        let ball = Projectile {
            pos: Vec2::new(315.0, 300.0),
            vel: Vec2::ZERO,
            size: 6.0,
            owner: Faction::Rival,
        };
        assert!(projectile_hits_head(&ball, &target));

        let miss = Projectile {
            pos: Vec2::new(330.0, 300.0),
            ..ball
        };
        assert!(!projectile_hits_head(&miss, &target));
    }

    #[test]
    fn test_detect_terminal_priority() {
        let config = GameConfig::default();
        let field = Field::new(600.0, 600.0);
        let snake = player();
        let obstacles = [Obstacle {
            pos: Vec2::new(10.0, 300.0),
            size: 20.0,
        }];
        // Both wall and obstacle: wall wins
        let head = Vec2::new(5.0, 300.0);
        let reason = detect_terminal(&config, &field, &snake, head, &obstacles, None);
        assert_eq!(reason, Some(GameOverReason::Wall));

        let head = Vec2::new(40.0, 300.0);
        let reason = detect_terminal(&config, &field, &snake, head, &obstacles, None);
        assert_eq!(reason, Some(GameOverReason::Obstacle));
    }

    #[test]
    fn test_rival_contact_policy() {
        let config = GameConfig::default();
        let field = Field::new(600.0, 600.0);
        let snake = player();
        let rival = Snake::new(Vec2::new(330.0, 300.0), 0.0, 3, 10.0, 10.0);
        let head = Vec2::new(305.0, 300.0);

        let contact = Some((&rival, RivalContact::Lethal));
        let lethal = detect_terminal(&config, &field, &snake, head, &[], contact);
        assert_eq!(lethal, Some(GameOverReason::Rival));

        let phased = detect_terminal(
            &config,
            &field,
            &snake,
            head,
            &[],
            Some((&rival, RivalContact::PassThrough)),
        );
        assert_eq!(phased, None);
    }

    #[test]
    fn test_reason_messages() {
        assert!(GameOverReason::TimeUp.is_win());
        assert!(GameOverReason::BoardFull.is_win());
        assert!(!GameOverReason::Wall.is_win());
        assert_eq!(GameOverReason::SelfCollision.to_string(), "Hit yourself");
    }
}
