/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound; `main` also uses
/// `NewHighScore` to persist the record.

use crate::domain::entity::Cell;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    PelletEaten { cell: Cell },
    BonusEaten { cell: Cell },
    /// `frightened` = how many ghosts it scared.
    EnergizerEaten { cell: Cell, frightened: usize },
    GhostEaten { id: usize },
    GhostHome { id: usize },
    GhostRespawned { id: usize },
    PlayerDied { lives_left: u32 },
    PlayerRespawned,
    LevelWon { score: u32 },
    GameOver { score: u32 },
    NewHighScore { score: u32 },
}

impl GameEvent {
    /// Points this event added to the score.
    pub fn points(&self) -> u32 {
        use crate::domain::rules::*;
        match self {
            GameEvent::PelletEaten { .. } => PELLET_REWARD,
            GameEvent::BonusEaten { .. } => BONUS_REWARD,
            GameEvent::EnergizerEaten { .. } => ENERGIZER_REWARD,
            GameEvent::GhostEaten { .. } => GHOST_REWARD,
            _ => 0,
        }
    }
}
