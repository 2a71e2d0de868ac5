/// Keyboard intake.
///
/// Drains crossterm events once per frame and turns them into the two
/// intents the core accepts:
///   - a turn request (last direction key pressed this frame)
///   - session commands (menu navigation, confirm, back)
///
/// Turns are edge-like: the player controller buffers them, so holding a
/// key is never needed. Auto-repeat events are accepted for turns and
/// ignored for commands, so a held arrow does not race through the menu.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::Direction;
use crate::sim::menu::Command;

#[derive(Default)]
pub struct InputState {
    /// Key events read during the most recent `drain_events` call.
    pub raw_events: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState { raw_events: Vec::with_capacity(8) }
    }

    /// Read every pending terminal event without blocking.
    pub fn drain_events(&mut self) {
        self.raw_events.clear();
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                if key.kind != KeyEventKind::Release {
                    self.raw_events.push(key);
                }
            }
        }
    }

    /// Most recent direction key this frame.
    pub fn turn(&self) -> Option<Direction> {
        self.raw_events.iter().rev().find_map(|k| key_direction(k.code))
    }

    /// Session commands in arrival order. Repeats are dropped.
    pub fn commands(&self) -> Vec<Command> {
        self.raw_events
            .iter()
            .filter(|k| k.kind == KeyEventKind::Press)
            .filter_map(|k| key_command(k.code))
            .collect()
    }

    /// Ctrl+C anywhere quits.
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
        })
    }
}

/// Arrow keys and WASD.
pub fn key_direction(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Direction::Right),
        _ => None,
    }
}

pub fn key_command(code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Enter | KeyCode::Char(' ') => Some(Command::Confirm),
        KeyCode::Esc => Some(Command::Back),
        other => key_direction(other).map(|d| match d {
            Direction::Up => Command::Up,
            Direction::Down => Command::Down,
            Direction::Left => Command::Left,
            _ => Command::Right,
        }),
    }
}
