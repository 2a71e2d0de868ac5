/// Read-only view of one tick for the presentation layer.
///
/// Built after `step` and handed to the renderer; nothing in it can write
/// back into the world. The grid and menu are borrowed, everything else is
/// copied out.

use crate::domain::entity::{BonusKind, Cell, Direction, Position};
use crate::domain::ghost::{Appearance, GhostState};
use crate::domain::grid::GridMap;
use super::menu::Menu;
use super::world::{Difficulty, Phase, WorldState};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerView {
    pub pos: Position,
    pub dir: Direction,
    pub alive: bool,
    /// Shrink progress `0.0..=1.0` while dying.
    pub death_progress: f32,
    pub invulnerable: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GhostView {
    pub id: usize,
    pub pos: Position,
    pub dir: Direction,
    pub state: GhostState,
    pub appearance: Appearance,
    /// Fade-in progress while respawning, 1.0 otherwise.
    pub fade: f32,
}

/// Active bonuses only.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BonusView {
    pub cell: Cell,
    pub kind: BonusKind,
    pub lit: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot<'a> {
    pub grid: &'a GridMap,
    pub menu: &'a Menu,
    pub phase: Phase,
    pub tick: u64,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    pub pellets: Vec<Cell>,
    pub bonuses: Vec<BonusView>,
    pub score: u32,
    pub high_score: u32,
    pub lives: u32,
    pub immunity_secs: u32,
    pub difficulty: Difficulty,
}

impl<'a> Snapshot<'a> {
    pub fn of(world: &'a WorldState) -> Self {
        let p = &world.player;
        Snapshot {
            grid: &world.grid,
            menu: &world.menu,
            phase: world.phase,
            tick: world.tick,
            player: PlayerView {
                pos: p.pos,
                dir: p.dir,
                alive: p.alive,
                death_progress: p.death_progress(&world.tuning.player),
                invulnerable: p.invulnerable,
            },
            ghosts: world
                .ghosts
                .iter()
                .map(|g| GhostView {
                    id: g.id,
                    pos: g.pos,
                    dir: g.dir,
                    state: g.state,
                    appearance: g.appearance(),
                    fade: g.respawn_progress(&world.tuning.ghost),
                })
                .collect(),
            pellets: world.pellets.iter().map(|p| p.cell).collect(),
            bonuses: world
                .bonuses
                .iter()
                .filter(|b| b.active)
                .map(|b| BonusView { cell: b.cell, kind: b.kind, lit: b.lit() })
                .collect(),
            score: world.score,
            high_score: world.high_score,
            lives: world.lives,
            immunity_secs: world.immunity_secs(),
            difficulty: world.difficulty,
        }
    }

    /// Is there a pellet on `cell`?
    pub fn pellet_at(&self, cell: Cell) -> bool {
        self.pellets.contains(&cell)
    }

    pub fn bonus_at(&self, cell: Cell) -> Option<&BonusView> {
        self.bonuses.iter().find(|b| b.cell == cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::sim::level;

    #[test]
    fn hides_consumed_bonuses() {
        let mut world = level::default_world(&GameConfig::default(), 2).unwrap();
        let first = world.bonuses[0].cell;
        world.bonuses[0].active = false;
        let snap = Snapshot::of(&world);
        assert_eq!(snap.bonuses.len(), world.bonuses.len() - 1);
        assert!(snap.bonus_at(first).is_none());
        assert_eq!(snap.ghosts.len(), 4);
        assert!(snap.ghosts.iter().all(|g| g.fade == 1.0));
    }
}
