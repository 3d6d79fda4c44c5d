use std::f32::consts::{FRAC_PI_2, PI};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::game::Ability;
use crate::storage::ControlScheme;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyAction {
    /// Set the target heading, in radians
    Steer(f32),
    Use(Ability),
    TogglePause,
    Restart,
    Quit,
    None,
}

pub const HEADING_UP: f32 = -FRAC_PI_2;
pub const HEADING_DOWN: f32 = FRAC_PI_2;
pub const HEADING_LEFT: f32 = PI;
pub const HEADING_RIGHT: f32 = 0.0;

pub struct InputHandler {
    controls: ControlScheme,
}

impl InputHandler {
    pub fn new(controls: ControlScheme) -> Self {
        Self { controls }
    }

    pub fn handle_key_event(&self, key: KeyEvent) -> KeyAction {
        // Handle Ctrl+C
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyAction::Quit;
        }

        if let Some(heading) = self.steering(key.code) {
            return KeyAction::Steer(heading);
        }

        match key.code {
            KeyCode::Char(' ') => KeyAction::Use(Ability::SpeedBoost),
            KeyCode::Char('f') | KeyCode::Char('F') | KeyCode::Enter => {
                KeyAction::Use(Ability::PowerBall)
            }

            // Controls
            KeyCode::Char('p') | KeyCode::Char('P') => KeyAction::TogglePause,
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => KeyAction::Quit,
            KeyCode::Char('r') | KeyCode::Char('R') => KeyAction::Restart,

            _ => KeyAction::None,
        }
    }

    fn steering(&self, code: KeyCode) -> Option<f32> {
        if self.controls.arrows() {
            let heading = match code {
                KeyCode::Up => Some(HEADING_UP),
                KeyCode::Down => Some(HEADING_DOWN),
                KeyCode::Left => Some(HEADING_LEFT),
                KeyCode::Right => Some(HEADING_RIGHT),
                _ => None,
            };
            if heading.is_some() {
                return heading;
            }
        }

        if self.controls.wasd() {
            if let KeyCode::Char(c) = code {
                return match c.to_ascii_lowercase() {
                    'w' => Some(HEADING_UP),
                    's' => Some(HEADING_DOWN),
                    'a' => Some(HEADING_LEFT),
                    'd' => Some(HEADING_RIGHT),
                    _ => None,
                };
            }
        }

        None
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new(ControlScheme::Both)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_arrow_keys() {
        let handler = InputHandler::new(ControlScheme::Arrows);
        let key = |code| handler.handle_key_event(press(code));

        assert_eq!(key(KeyCode::Up), KeyAction::Steer(HEADING_UP));
        assert_eq!(key(KeyCode::Down), KeyAction::Steer(HEADING_DOWN));
        assert_eq!(key(KeyCode::Left), KeyAction::Steer(HEADING_LEFT));
        assert_eq!(key(KeyCode::Right), KeyAction::Steer(HEADING_RIGHT));

        // WASD is not bound under the arrows scheme
        assert_eq!(key(KeyCode::Char('w')), KeyAction::None);
    }

    #[test]
    fn test_wasd_keys() {
        let handler = InputHandler::new(ControlScheme::Wasd);
        let key = |code| handler.handle_key_event(press(code));

        assert_eq!(key(KeyCode::Char('w')), KeyAction::Steer(HEADING_UP));
        assert_eq!(key(KeyCode::Char('a')), KeyAction::Steer(HEADING_LEFT));
        assert_eq!(key(KeyCode::Char('s')), KeyAction::Steer(HEADING_DOWN));
        assert_eq!(key(KeyCode::Char('d')), KeyAction::Steer(HEADING_RIGHT));
        assert_eq!(key(KeyCode::Up), KeyAction::None);
    }

    #[test]
    fn test_wasd_uppercase() {
        let handler = InputHandler::default();

        let w_upper = KeyEvent::new(KeyCode::Char('W'), KeyModifiers::SHIFT);
        assert_eq!(handler.handle_key_event(w_upper), KeyAction::Steer(HEADING_UP));
    }

    #[test]
    fn test_ability_keys() {
        let handler = InputHandler::default();

        assert_eq!(
            handler.handle_key_event(press(KeyCode::Char(' '))),
            KeyAction::Use(Ability::SpeedBoost)
        );
        assert_eq!(
            handler.handle_key_event(press(KeyCode::Char('f'))),
            KeyAction::Use(Ability::PowerBall)
        );
        assert_eq!(
            handler.handle_key_event(press(KeyCode::Enter)),
            KeyAction::Use(Ability::PowerBall)
        );
    }

    #[test]
    fn test_quit_keys() {
        let handler = InputHandler::default();

        assert_eq!(handler.handle_key_event(press(KeyCode::Char('q'))), KeyAction::Quit);

        let q_upper = KeyEvent::new(KeyCode::Char('Q'), KeyModifiers::SHIFT);
        assert_eq!(handler.handle_key_event(q_upper), KeyAction::Quit);

        assert_eq!(handler.handle_key_event(press(KeyCode::Esc)), KeyAction::Quit);
    }

    #[test]
    fn test_pause_and_restart_keys() {
        let handler = InputHandler::default();

        assert_eq!(handler.handle_key_event(press(KeyCode::Char('p'))), KeyAction::TogglePause);
        assert_eq!(handler.handle_key_event(press(KeyCode::Char('r'))), KeyAction::Restart);

        let r_upper = KeyEvent::new(KeyCode::Char('R'), KeyModifiers::SHIFT);
        assert_eq!(handler.handle_key_event(r_upper), KeyAction::Restart);
    }

    #[test]
    fn test_unknown_key() {
        let handler = InputHandler::default();
        assert_eq!(handler.handle_key_event(press(KeyCode::Char('x'))), KeyAction::None);
    }

    #[test]
    fn test_ctrl_c() {
        let handler = InputHandler::default();

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handler.handle_key_event(ctrl_c), KeyAction::Quit);
    }
}
