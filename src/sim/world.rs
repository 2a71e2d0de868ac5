/// WorldState: the whole session in one owned aggregate.
///
/// Nothing in the simulation is global. `main` owns one `WorldState` and
/// threads it through `step::step` and the `level` session functions.
///
/// ## Layers
///
///   - `grid`     the maze as loaded. **Never mutated.**
///   - entities   player, ghosts, pellets, bonuses (rebuilt per board)
///   - session    phase, score, lives, high score, difficulty, menu
///   - `rng`      every random draw of the session; seeding it makes a
///                run reproducible.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{GameConfig, SpeedConfig};
use crate::domain::entity::{Bonus, Cell, Pellet};
use crate::domain::ghost::{Ghost, GhostTuning, Personality};
use crate::domain::grid::GridMap;
use crate::domain::player::{Player, PlayerTuning};
use super::menu::Menu;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Menu,
    Playing,
    Win,
    GameOver,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// 1 = easy, 2 = medium, 3 = hard; anything else clamps.
    pub fn from_level(level: u8) -> Self {
        match level {
            0 | 1 => Difficulty::Easy,
            2 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn harder(self) -> Self {
        Difficulty::from_level(self.level() + 1)
    }

    pub fn easier(self) -> Self {
        Difficulty::from_level(self.level() - 1)
    }

    /// Ghost base speed for this preset.
    pub fn ghost_speed(self, speed: &SpeedConfig) -> f32 {
        match self {
            Difficulty::Easy => speed.easy,
            Difficulty::Medium => speed.medium,
            Difficulty::Hard => speed.hard,
        }
    }
}

/// Spawn cells for one board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub player: Cell,
    pub ghosts: Vec<(Personality, Cell)>,
}

/// Constants of a running game, resolved from config + difficulty.
#[derive(Clone, Debug, PartialEq)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub ghost: GhostTuning,
    pub lives: u32,
}

impl Tuning {
    pub fn new(config: &GameConfig, difficulty: Difficulty) -> Self {
        let t = &config.timing;
        Tuning {
            player: PlayerTuning {
                speed: config.speed.player,
                portal_cooldown: t.player_portal_cooldown,
                death_frames: t.death_frames,
                death_step: t.death_step,
                initial_invulnerability: t.initial_invulnerability,
                respawn_invulnerability: t.respawn_invulnerability,
            },
            ghost: GhostTuning {
                base_speed: difficulty.ghost_speed(&config.speed),
                ticks_per_second: t.ticks_per_second,
                frightened_ticks: t.frightened_secs * t.ticks_per_second,
                respawn_ticks: t.ghost_respawn_secs * t.ticks_per_second,
                portal_cooldown: t.ghost_portal_cooldown,
            },
            lives: config.lives,
        }
    }
}

pub struct WorldState {
    // ── Map ──
    /// The maze. Never mutated after load.
    pub grid: GridMap,
    pub layout: Layout,

    // ── Entities ──
    pub player: Player,
    pub ghosts: Vec<Ghost>,
    pub pellets: Vec<Pellet>,
    pub bonuses: Vec<Bonus>,

    // ── Session ──
    pub phase: Phase,
    pub score: u32,
    pub high_score: u32,
    pub lives: u32,
    pub difficulty: Difficulty,
    pub tuning: Tuning,
    pub tick: u64,
    pub menu: Menu,

    pub rng: StdRng,
}

// ── Construction ──

impl WorldState {
    /// A session sitting on the title menu, board already populated.
    pub fn new(grid: GridMap, layout: Layout, config: &GameConfig, seed: u64) -> Self {
        let difficulty = Difficulty::from_level(config.difficulty);
        let tuning = Tuning::new(config, difficulty);
        let mut world = WorldState {
            player: Player::new(layout.player, tuning.player.initial_invulnerability),
            grid,
            layout,
            ghosts: vec![],
            pellets: vec![],
            bonuses: vec![],
            phase: Phase::Menu,
            score: 0,
            high_score: 0,
            lives: tuning.lives,
            difficulty,
            tuning,
            tick: 0,
            menu: Menu::new(difficulty),
            rng: StdRng::seed_from_u64(seed),
        };
        world.populate();
        world
    }

    /// Fresh board: every pellet and bonus back, agents on their spawns.
    /// Score, lives and phase are left alone.
    pub fn populate(&mut self) {
        self.pellets = self.grid.pellet_cells().iter().map(|&cell| Pellet { cell }).collect();
        self.bonuses = self
            .grid
            .bonus_markers()
            .iter()
            .map(|&(cell, kind)| Bonus::new(cell, kind))
            .collect();
        self.player = Player::new(self.layout.player, self.tuning.player.initial_invulnerability);

        let grid = &self.grid;
        let rng = &mut self.rng;
        self.ghosts = self
            .layout
            .ghosts
            .iter()
            .enumerate()
            .map(|(id, &(personality, start))| Ghost::new(id, personality, start, grid, &mut *rng))
            .collect();
        self.tick = 0;
    }

    pub fn pellets_left(&self) -> usize {
        self.pellets.len()
    }

    pub fn any_bonus_active(&self) -> bool {
        self.bonuses.iter().any(|b| b.active)
    }

    /// Whole seconds of invulnerability left, rounded up, for the HUD.
    pub fn immunity_secs(&self) -> u32 {
        let tps = self.tuning.ghost.ticks_per_second.max(1);
        if self.player.invulnerable == 0 {
            0
        } else {
            self.player.invulnerable / tps + 1
        }
    }
}
