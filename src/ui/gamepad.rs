/// Gamepad intake using gilrs.
///
/// Produces the same intents as the keyboard: a turn request and session
/// commands. Button names for confirm/cancel come from `[gamepad]` in
/// config.toml.
///
/// Default mapping:
///   D-pad / Left Stick    →  Turn / menu navigation
///   Start / A             →  Confirm
///   Select / B            →  Back

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};
#[cfg(feature = "gamepad")]
use log::info;

use crate::config::GamepadConfig;
use crate::domain::entity::Direction;
use crate::sim::menu::Command;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical face/shoulder buttons, addressable by name in config.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,      // South
    B,      // East
    X,      // West
    Y,      // North
    L1,
    R1,
    Start,
    Select,
}

const BTN_COUNT: usize = 8;

impl Btn {
    pub fn from_name(s: &str) -> Option<Btn> {
        match s.trim().to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Index into the per-direction arrays.
fn dir_slot(dir: Direction) -> Option<usize> {
    match dir {
        Direction::Up => Some(0),
        Direction::Down => Some(1),
        Direction::Left => Some(2),
        Direction::Right => Some(3),
        Direction::None => None,
    }
}

const SLOT_DIRS: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

impl BtnState {
    fn set(&mut self, held: bool) {
        if held && !self.held {
            self.just_pressed = true;
        }
        self.held = held;
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; BTN_COUNT],
    dpad: [BtnState; 4],
    stick: [BtnState; 4],
    stick_x: f32,
    stick_y: f32,

    confirm: Vec<Btn>,
    cancel: Vec<Btn>,

    pub connected: bool,
}

impl GamepadState {
    pub fn new(cfg: &GamepadConfig) -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                if has_pad {
                    info!("gamepad detected");
                }
                (Some(g), has_pad)
            }
            Err(_) => (None, false),
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        let mut pad = GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs,
            buttons: [BtnState::default(); BTN_COUNT],
            dpad: [BtnState::default(); 4],
            stick: [BtnState::default(); 4],
            stick_x: 0.0,
            stick_y: 0.0,
            confirm: vec![Btn::Start, Btn::A],
            cancel: vec![Btn::Select, Btn::B],
            connected,
        };
        pad.apply_config(cfg);
        pad
    }

    /// Replace the confirm/cancel bindings. Unknown names are skipped; an
    /// empty result keeps the default binding.
    pub fn apply_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let confirm = parse_list(&cfg.confirm);
        if !confirm.is_empty() {
            self.confirm = confirm;
        }
        let cancel = parse_list(&cfg.cancel);
        if !cancel.is_empty() {
            self.cancel = cancel;
        }
    }

    pub fn update(&mut self) {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let Some(gilrs) = &mut self.gilrs else {
            return;
        };
        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => self.set_button(btn, false),
                EventType::AxisChanged(Axis::LeftStickX, value, _) => self.stick_x = value,
                EventType::AxisChanged(Axis::LeftStickY, value, _) => self.stick_y = value,
                EventType::Connected => self.connected = true,
                EventType::Disconnected => {
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        let (x, y) = (self.stick_x, self.stick_y);
        self.stick[0].set(y > STICK_DEADZONE);
        self.stick[1].set(y < -STICK_DEADZONE);
        self.stick[2].set(x < -STICK_DEADZONE);
        self.stick[3].set(x > STICK_DEADZONE);
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, btn: Button, held: bool) {
        let dpad = match btn {
            Button::DPadUp => Direction::Up,
            Button::DPadDown => Direction::Down,
            Button::DPadLeft => Direction::Left,
            Button::DPadRight => Direction::Right,
            other => {
                if let Some(b) = Btn::from_gilrs(other) {
                    self.buttons[b as usize].set(held);
                }
                return;
            }
        };
        if let Some(slot) = dir_slot(dpad) {
            self.dpad[slot].set(held);
        }
    }

    // ── Intents ──

    /// Direction freshly pressed on the d-pad or stick this frame.
    pub fn turn(&self) -> Option<Direction> {
        SLOT_DIRS
            .iter()
            .copied()
            .find(|&d| dir_slot(d).is_some_and(|i| self.dpad[i].just_pressed || self.stick[i].just_pressed))
    }

    pub fn commands(&self) -> Vec<Command> {
        let mut out = Vec::new();
        if let Some(dir) = self.turn() {
            out.push(match dir {
                Direction::Up => Command::Up,
                Direction::Down => Command::Down,
                Direction::Left => Command::Left,
                _ => Command::Right,
            });
        }
        if self.any_just_pressed(&self.confirm) {
            out.push(Command::Confirm);
        }
        if self.any_just_pressed(&self.cancel) {
            out.push(Command::Back);
        }
        out
    }

    // ── Internal ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].just_pressed)
    }

    fn clear_just_pressed(&mut self) {
        for b in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            b.just_pressed = false;
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for b in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            *b = BtnState::default();
        }
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(confirm: &[&str], cancel: &[&str]) -> GamepadConfig {
        GamepadConfig {
            confirm: confirm.iter().map(|s| s.to_string()).collect(),
            cancel: cancel.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn button_names_are_case_insensitive() {
        assert_eq!(Btn::from_name("start"), Some(Btn::Start));
        assert_eq!(Btn::from_name(" Back "), Some(Btn::Select));
        assert_eq!(Btn::from_name("south"), Some(Btn::A));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn config_overrides_bindings_and_ignores_junk() {
        let mut pad = GamepadState::new(&cfg(&["X"], &["nope"]));
        assert_eq!(pad.confirm, vec![Btn::X]);
        assert_eq!(pad.cancel, vec![Btn::Select, Btn::B]);

        pad.buttons[Btn::X as usize].set(true);
        pad.dpad[dir_slot(Direction::Left).unwrap_or(0)].set(true);
        assert_eq!(pad.turn(), Some(Direction::Left));
        assert_eq!(pad.commands(), vec![Command::Left, Command::Confirm]);

        pad.clear_just_pressed();
        assert!(pad.commands().is_empty());
    }
}
