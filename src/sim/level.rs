/// Board loader and session flow.
///
/// ## Sources (priority order):
///   1. `--map` on the command line
///   2. `map_file` in `config.toml`
///   3. The built-in 20×18 maze
///
/// A map that fails to load is reported and the built-in maze is used.
///
/// ## Spawns
///   Player on (1,1); ghosts on the four fixed pen cells. A custom map that
///   lacks those cells gets the first open cell for the player and its pen
///   cells, in reading order, for the ghosts.
///
/// ## Session flow
///
///   Menu ──Start──▶ Playing ──board cleared──▶ Win ──Confirm──▶ Playing (score kept)
///                     │                         └──Back──▶ Menu
///                     ├──last life lost──▶ GameOver ──Confirm──▶ Playing (new game)
///                     │                              └──Back──▶ Menu
///                     └──Back──▶ Menu

use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

use crate::config::GameConfig;
use crate::domain::entity::Cell;
use crate::domain::ghost::Personality;
use crate::domain::grid::{GridMap, MapError};
use crate::domain::tile::{Mover, Tile};
use super::highscore::HighScoreStore;
use super::menu::{Command, MenuAction};
use super::world::{Layout, Phase, Tuning, WorldState};

pub const DEFAULT_MAP: &str = "\
11111111111111111111
100000000011000000E1
10111011101101110101
10000000000000000001
10111110111110111101
10000010000E10000001
11110111101111011111
P000010000000000000P
11110101111110101111
10000000001000000001
10111111101111111101
10000000000000000001
10111110111110110101
10000E100000000000E1
11111111111HH1111111
111111111HHHHHH11111
111111111HHHHHH11111
11111111111111111111
";

pub const PLAYER_SPAWN: Cell = Cell::new(1, 1);

pub const GHOST_SPAWNS: [(Personality, Cell); 4] = [
    (Personality::DirectPursuer, Cell::new(12, 15)),
    (Personality::Ambusher, Cell::new(12, 16)),
    (Personality::MirrorPursuer, Cell::new(13, 16)),
    (Personality::Opportunist, Cell::new(13, 15)),
];

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("cannot read map {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Map(#[from] MapError),
}

/// What the caller should do after a session command.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionAction {
    Continue,
    Quit,
}

// ══════════════════════════════════════════════════════════════
// Loading
// ══════════════════════════════════════════════════════════════

/// Parse the map at `path`, or the built-in maze when `None`.
pub fn load_map(path: Option<&Path>) -> Result<GridMap, LevelError> {
    match path {
        None => Ok(GridMap::from_text(DEFAULT_MAP)?),
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .map_err(|source| LevelError::Io { path: p.to_path_buf(), source })?;
            Ok(GridMap::from_text(&text)?)
        }
    }
}

/// Spawn cells for `grid`.
pub fn layout_for(grid: &GridMap) -> Result<Layout, MapError> {
    let cells: Vec<Cell> = (0..grid.height() as i32)
        .flat_map(|y| (0..grid.width() as i32).map(move |x| Cell::new(x, y)))
        .collect();

    let player = if grid.tile_at(PLAYER_SPAWN) == Tile::Open {
        PLAYER_SPAWN
    } else {
        cells
            .iter()
            .copied()
            .find(|&c| grid.tile_at(c) == Tile::Open && grid.admits(c, Mover::Player))
            .ok_or(MapError::MissingSpawn("player"))?
    };

    let pens: Vec<Cell> = cells.into_iter().filter(|&c| grid.tile_at(c) == Tile::Pen).collect();
    if pens.is_empty() {
        return Err(MapError::MissingSpawn("ghost"));
    }
    let ghosts = GHOST_SPAWNS
        .iter()
        .enumerate()
        .map(|(i, &(personality, cell))| {
            if grid.tile_at(cell) == Tile::Pen {
                (personality, cell)
            } else {
                (personality, pens[i % pens.len()])
            }
        })
        .collect();

    Ok(Layout { player, ghosts })
}

/// Build the session world. `map` overrides the configured map file; a
/// broken custom map falls back to the built-in one.
pub fn build_world(
    config: &GameConfig,
    map: Option<&Path>,
    seed: u64,
) -> Result<WorldState, LevelError> {
    let Some(path) = map.or(config.map_file.as_deref()) else {
        return default_world(config, seed);
    };
    match load_board(Some(path)) {
        Ok((grid, layout)) => {
            info!("map loaded from {}", path.display());
            Ok(WorldState::new(grid, layout, config, seed))
        }
        Err(e) => {
            warn!("{e}; using the built-in maze");
            default_world(config, seed)
        }
    }
}

/// Built-in maze world with no map override.
pub fn default_world(config: &GameConfig, seed: u64) -> Result<WorldState, LevelError> {
    let (grid, layout) = load_board(None)?;
    Ok(WorldState::new(grid, layout, config, seed))
}

fn load_board(path: Option<&Path>) -> Result<(GridMap, Layout), LevelError> {
    let grid = load_map(path)?;
    let layout = layout_for(&grid)?;
    Ok((grid, layout))
}

// ══════════════════════════════════════════════════════════════
// Session flow
// ══════════════════════════════════════════════════════════════

/// New game at the menu's difficulty: score reset, record reloaded.
pub fn start_new_game(world: &mut WorldState, config: &GameConfig, high_score: u32) {
    world.difficulty = world.menu.difficulty;
    world.tuning = Tuning::new(config, world.difficulty);
    world.score = 0;
    world.lives = world.tuning.lives;
    world.high_score = high_score;
    world.populate();
    world.phase = Phase::Playing;
    info!(
        "new game: difficulty {}, ghost speed {:.2}",
        world.difficulty.label(),
        world.tuning.ghost.base_speed
    );
}

/// Fresh board after a win. Score carries over, lives refill.
pub fn continue_after_win(world: &mut WorldState, high_score: u32) {
    world.lives = world.tuning.lives;
    world.high_score = world.high_score.max(high_score);
    world.populate();
    world.phase = Phase::Playing;
    info!("next board, score {}", world.score);
}

pub fn return_to_menu(world: &mut WorldState) {
    world.menu.difficulty = world.difficulty;
    world.phase = Phase::Menu;
}

/// Apply a session command for the current phase.
pub fn handle_command(
    world: &mut WorldState,
    cmd: Command,
    config: &GameConfig,
    store: &dyn HighScoreStore,
) -> SessionAction {
    match world.phase {
        Phase::Menu => match world.menu.handle(cmd) {
            Some(MenuAction::Start) => start_new_game(world, config, store.load()),
            Some(MenuAction::Exit) => return SessionAction::Quit,
            None => {}
        },
        Phase::Playing => {
            if cmd == Command::Back {
                return_to_menu(world);
            }
        }
        Phase::Win => match cmd {
            Command::Confirm => continue_after_win(world, store.load()),
            Command::Back => return_to_menu(world),
            _ => {}
        },
        Phase::GameOver => match cmd {
            Command::Confirm => start_new_game(world, config, store.load()),
            Command::Back => return_to_menu(world),
            _ => {}
        },
    }
    SessionAction::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::highscore::MemoryStore;

    #[test]
    fn builtin_maze_matches_original_layout() {
        let grid = load_map(None).unwrap();
        assert_eq!((grid.width(), grid.height()), (20, 18));
        assert_eq!(grid.bonus_markers().len(), 4);
        assert!(grid.portal_side(Cell::new(0, 7)).is_some());
        assert!(grid.portal_side(Cell::new(19, 7)).is_some());

        let layout = layout_for(&grid).unwrap();
        assert_eq!(layout.player, PLAYER_SPAWN);
        assert_eq!(layout.ghosts, GHOST_SPAWNS.to_vec());
    }

    #[test]
    fn custom_map_without_fixed_spawns_falls_back() {
        let grid = GridMap::parse(&["11111", "11101", "10H01", "11111"]).unwrap();
        let layout = layout_for(&grid).unwrap();
        assert_eq!(layout.player, Cell::new(3, 1));
        assert!(layout.ghosts.iter().all(|&(_, c)| c == Cell::new(2, 2)));
        assert_eq!(layout.ghosts.len(), 4);

        let no_pen = GridMap::parse(&["111", "101", "111"]).unwrap();
        assert_eq!(layout_for(&no_pen).unwrap_err(), MapError::MissingSpawn("ghost"));
    }

    #[test]
    fn map_file_errors_are_typed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.txt");
        assert!(matches!(load_map(Some(&missing)), Err(LevelError::Io { .. })));

        let bad = dir.path().join("bad.txt");
        std::fs::write(&bad, "111\n1x1\n111\n").unwrap();
        assert!(matches!(
            load_map(Some(&bad)),
            Err(LevelError::Map(MapError::UnknownSymbol { symbol: 'x', .. }))
        ));
    }

    #[test]
    fn broken_custom_map_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.txt");
        std::fs::write(&bad, "11\n1\n").unwrap();
        let world = build_world(&GameConfig::default(), Some(&bad), 3).unwrap();
        assert_eq!(world.grid.width(), 20);
    }

    #[test]
    fn menu_start_then_back_then_exit() {
        let cfg = GameConfig::default();
        let store = MemoryStore::with(900);
        let mut world = default_world(&cfg, 9).unwrap();

        world.menu.handle(Command::Down);
        world.menu.handle(Command::Right);
        world.menu.handle(Command::Up);
        assert_eq!(handle_command(&mut world, Command::Confirm, &cfg, &store), SessionAction::Continue);
        assert_eq!(world.phase, Phase::Playing);
        assert_eq!(world.tuning.ghost.base_speed, cfg.speed.medium);
        assert_eq!(world.high_score, 900);
        assert_eq!(world.lives, 3);

        handle_command(&mut world, Command::Back, &cfg, &store);
        assert_eq!(world.phase, Phase::Menu);
        handle_command(&mut world, Command::Up, &cfg, &store);
        assert_eq!(handle_command(&mut world, Command::Confirm, &cfg, &store), SessionAction::Quit);
    }

    #[test]
    fn win_continue_keeps_score() {
        let cfg = GameConfig::default();
        let store = MemoryStore::default();
        let mut world = default_world(&cfg, 9).unwrap();
        start_new_game(&mut world, &cfg, 0);
        world.score = 1234;
        world.lives = 1;
        world.pellets.clear();
        world.phase = Phase::Win;

        handle_command(&mut world, Command::Confirm, &cfg, &store);
        assert_eq!(world.phase, Phase::Playing);
        assert_eq!(world.score, 1234);
        assert_eq!(world.lives, 3);
        assert_eq!(world.pellets_left(), world.grid.pellet_cells().len());
    }

    #[test]
    fn game_over_confirm_restarts_from_zero() {
        let cfg = GameConfig::default();
        let store = MemoryStore::with(50);
        let mut world = default_world(&cfg, 9).unwrap();
        start_new_game(&mut world, &cfg, 0);
        world.score = 40;
        world.phase = Phase::GameOver;
        handle_command(&mut world, Command::Confirm, &cfg, &store);
        assert_eq!(world.phase, Phase::Playing);
        assert_eq!(world.score, 0);
        assert_eq!(world.high_score, 50);
    }
}
