/// Title menu: Start / Difficulty / Exit.
///
/// Up/Down move the cursor (wrapping), Left/Right change the difficulty
/// while it is selected, Confirm activates the item under the cursor.

use super::world::Difficulty;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MenuItem {
    Start,
    Difficulty,
    Exit,
}

impl MenuItem {
    pub const ALL: [MenuItem; 3] = [MenuItem::Start, MenuItem::Difficulty, MenuItem::Exit];

    pub fn label(self) -> &'static str {
        match self {
            MenuItem::Start => "Start Game",
            MenuItem::Difficulty => "Difficulty",
            MenuItem::Exit => "Exit",
        }
    }
}

/// Session-level intents from the input layer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Up,
    Down,
    Left,
    Right,
    Confirm,
    Back,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MenuAction {
    Start,
    Exit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Menu {
    pub selected: usize,
    pub difficulty: Difficulty,
}

impl Menu {
    pub fn new(difficulty: Difficulty) -> Self {
        Menu { selected: 0, difficulty }
    }

    pub fn current(&self) -> MenuItem {
        MenuItem::ALL[self.selected % MenuItem::ALL.len()]
    }

    pub fn handle(&mut self, cmd: Command) -> Option<MenuAction> {
        let n = MenuItem::ALL.len();
        match cmd {
            Command::Up => self.selected = (self.selected + n - 1) % n,
            Command::Down => self.selected = (self.selected + 1) % n,
            Command::Left if self.current() == MenuItem::Difficulty => {
                self.difficulty = self.difficulty.easier();
            }
            Command::Right if self.current() == MenuItem::Difficulty => {
                self.difficulty = self.difficulty.harder();
            }
            Command::Confirm => match self.current() {
                MenuItem::Start => return Some(MenuAction::Start),
                MenuItem::Exit => return Some(MenuAction::Exit),
                MenuItem::Difficulty => {}
            },
            _ => {}
        }
        None
    }
}
