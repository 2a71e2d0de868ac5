/// Agent Motion Model — shared by the player and the ghosts.
///
/// ## Contract
///
/// Continuous pixel position + discrete intended direction + speed
/// → next continuous position. The discrete cell is always derived
/// from the position by rounding (`Position::cell`).
///
///   - **Walkable**: direction is non-zero and the next cell admits the mover.
///     Eyes (eaten ghosts) bypass the map.
///   - **Centered**: both axis offsets from the cell anchor are below
///     `CENTER_EPSILON`. Turns and decisions happen only when centered.
///   - **Stuck**: current direction not walkable → direction cleared and
///     position snapped to the cell anchor.
///   - **Portal**: centered on an edge portal moving outward → relocated to
///     the cell just inside the opposite edge, cooldown armed. While the
///     portal is open for an agent, the outward step counts as walkable so
///     the agent can reach the portal centre; while it is closed the agent
///     stops on the edge cell like at any wall.

use super::entity::{Direction, Position};
use super::grid::{GridMap, PortalExit};
use super::tile::Mover;

/// Distance (px, per axis) under which an agent counts as centered.
pub const CENTER_EPSILON: f32 = 2.0;

/// Largest per-tick step on the grid. Must stay below the centre window
/// (`2 * CENTER_EPSILON`) so every cell centre gets a centered tick.
pub const MAX_STEP: f32 = 3.9;

/// Outcome of one `advance` call.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Advance {
    Moved,
    Stuck,
}

#[inline]
pub fn is_centered(pos: Position) -> bool {
    let (ox, oy) = pos.offset_from_cell();
    ox.abs() < CENTER_EPSILON && oy.abs() < CENTER_EPSILON
}

/// Move to the pixel-aligned position of the current cell.
#[inline]
pub fn snap(pos: &mut Position) {
    *pos = Position::at_cell(pos.cell());
}

/// Can `mover` standing at `pos` head along `dir`? `portal_open` lets the
/// outward step off an edge portal count as a move.
#[inline]
pub fn can_move(
    grid: &GridMap,
    pos: Position,
    dir: Direction,
    mover: Mover,
    portal_open: bool,
) -> bool {
    let cell = pos.cell();
    grid.can_step(cell, dir, mover) || (portal_open && grid.portal_exit(cell, dir).is_some())
}

/// Walkable directions from `pos`, in `Direction::CARDINALS` order.
pub fn open_directions(
    grid: &GridMap,
    pos: Position,
    mover: Mover,
    portal_open: bool,
) -> Vec<Direction> {
    Direction::CARDINALS
        .iter()
        .copied()
        .filter(|&d| can_move(grid, pos, d, mover, portal_open))
        .collect()
}

/// Apply the stuck policy, then move `speed` pixels along `dir`.
///
/// An outward step on an edge portal stops at the portal's anchor, so the
/// agent is centered there for `try_portal` and never leaves the map.
pub fn advance(
    grid: &GridMap,
    pos: &mut Position,
    dir: &mut Direction,
    speed: f32,
    mover: Mover,
    portal_open: bool,
) -> Advance {
    if !can_move(grid, *pos, *dir, mover, portal_open) {
        *dir = Direction::None;
        snap(pos);
        return Advance::Stuck;
    }
    let outward = grid.portal_exit(pos.cell(), *dir).is_some();
    *pos = pos.moved(*dir, speed);
    if outward {
        let (ox, _) = pos.offset_from_cell();
        let (dx, _) = dir.delta();
        if ox * dx as f32 > 0.0 {
            snap(pos);
        }
    }
    Advance::Moved
}

/// Portal traversal. Only fires when centered, cooled down, on an edge
/// portal and heading outward.
pub fn try_portal(
    grid: &GridMap,
    pos: &mut Position,
    dir: Direction,
    cooldown: &mut u32,
    cooldown_ticks: u32,
) -> Option<PortalExit> {
    if *cooldown > 0 || !is_centered(*pos) {
        return None;
    }
    let exit = grid.portal_exit(pos.cell(), dir)?;
    *pos = Position::at_cell(exit.to);
    *cooldown = cooldown_ticks;
    Some(exit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{Cell, TILE_SIZE};
    use proptest::prelude::*;

    fn corridor() -> GridMap {
        GridMap::parse(&[
            "1111111",
            "P00000P",
            "1011101",
            "1000001",
            "1111111",
        ])
        .unwrap()
    }

    #[test]
    fn centered_within_epsilon() {
        let c = Position::at_cell(Cell::new(2, 1));
        assert!(is_centered(c));
        assert!(is_centered(Position { px: c.px + 1.9, py: c.py - 1.9 }));
        assert!(!is_centered(Position { px: c.px + 2.0, py: c.py }));
    }

    #[test]
    fn moves_along_open_corridor() {
        let g = corridor();
        let mut pos = Position::at_cell(Cell::new(2, 1));
        let mut dir = Direction::Right;
        assert_eq!(advance(&g, &mut pos, &mut dir, 1.5, Mover::Player, false), Advance::Moved);
        assert_eq!(pos.px, 2.0 * TILE_SIZE + 1.5);
        assert_eq!(dir, Direction::Right);
    }

    #[test]
    fn stuck_policy_zeroes_and_snaps() {
        let g = corridor();
        let mut pos = Position { px: 2.0 * TILE_SIZE + 1.0, py: TILE_SIZE };
        let mut dir = Direction::Up;
        assert_eq!(advance(&g, &mut pos, &mut dir, 1.5, Mover::Player, false), Advance::Stuck);
        assert_eq!(dir, Direction::None);
        assert_eq!(pos, Position::at_cell(Cell::new(2, 1)));
    }

    #[test]
    fn no_direction_is_never_walkable() {
        let g = corridor();
        let pos = Position::at_cell(Cell::new(2, 1));
        assert!(!can_move(&g, pos, Direction::None, Mover::Ghost, true));
        assert!(can_move(&g, pos, Direction::None, Mover::Eyes, false));
    }

    #[test]
    fn closed_portal_is_a_wall() {
        let g = corridor();
        let mut pos = Position { px: 10.0, py: TILE_SIZE };
        let mut dir = Direction::Left;
        assert_eq!(advance(&g, &mut pos, &mut dir, 1.5, Mover::Player, true), Advance::Moved);
        assert_eq!(advance(&g, &mut pos, &mut dir, 1.5, Mover::Player, false), Advance::Stuck);
        assert_eq!(pos, Position::at_cell(Cell::new(0, 1)));
        assert_eq!(
            open_directions(&g, pos, Mover::Player, true),
            vec![Direction::Right, Direction::Left]
        );
        assert_eq!(open_directions(&g, pos, Mover::Player, false), vec![Direction::Right]);
    }

    #[test]
    fn portal_round_trip_is_symmetric() {
        let g = corridor();
        let mut cooldown: u32 = 0;

        let mut pos = Position::at_cell(Cell::new(0, 1));
        let exit = try_portal(&g, &mut pos, Direction::Left, &mut cooldown, 10).unwrap();
        assert_eq!(pos.cell(), Cell::new(5, 1));
        assert_eq!(exit.to, Cell::new(5, 1));
        assert_eq!(cooldown, 10);

        // Still cooling down: the opposite portal does not fire.
        let mut at_right = Position::at_cell(Cell::new(6, 1));
        assert!(try_portal(&g, &mut at_right, Direction::Right, &mut cooldown, 10).is_none());

        cooldown = 0;
        try_portal(&g, &mut at_right, Direction::Right, &mut cooldown, 10).unwrap();
        assert_eq!(at_right.cell(), Cell::new(1, 1));
    }

    #[test]
    fn portal_needs_outward_heading_and_centering() {
        let g = corridor();
        let mut cooldown: u32 = 0;
        let mut pos = Position::at_cell(Cell::new(0, 1));
        assert!(try_portal(&g, &mut pos, Direction::Right, &mut cooldown, 10).is_none());
        let mut off = Position { px: 5.0, py: TILE_SIZE };
        assert!(try_portal(&g, &mut off, Direction::Left, &mut cooldown, 10).is_none());
    }

    #[test]
    fn outward_step_stops_on_the_portal_anchor() {
        let g = corridor();
        let anchor = Position::at_cell(Cell::new(6, 1));
        let mut pos = Position { px: anchor.px - 1.0, py: anchor.py };
        let mut dir = Direction::Right;
        assert_eq!(advance(&g, &mut pos, &mut dir, MAX_STEP, Mover::Ghost, true), Advance::Moved);
        assert_eq!(pos, anchor);
        assert_eq!(advance(&g, &mut pos, &mut dir, MAX_STEP, Mover::Ghost, true), Advance::Moved);
        assert_eq!(pos, anchor);
        assert!(is_centered(pos));

        let mut cooldown: u32 = 0;
        let exit = try_portal(&g, &mut pos, dir, &mut cooldown, 15).unwrap();
        assert_eq!(exit.to, Cell::new(1, 1));
    }

    #[test]
    fn max_step_never_skips_a_centre() {
        let g = corridor();
        let mut pos = Position { px: TILE_SIZE + 3.0, py: TILE_SIZE };
        let mut dir = Direction::Right;
        let mut centred = vec![];
        for _ in 0..40 {
            advance(&g, &mut pos, &mut dir, MAX_STEP, Mover::Ghost, false);
            if is_centered(pos) {
                centred.push(pos.cell().x);
            }
        }
        centred.dedup();
        assert_eq!(centred, vec![2, 3, 4, 5, 6]);
    }

    fn dir_strategy() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::Up),
            Just(Direction::Down),
            Just(Direction::Left),
            Just(Direction::Right),
            Just(Direction::None),
        ]
    }

    proptest! {
        #[test]
        fn agents_never_rest_inside_walls(
            turns in proptest::collection::vec(dir_strategy(), 1..200),
            speed in 0.5f32..1.9,
        ) {
            let g = corridor();
            let mut pos = Position::at_cell(Cell::new(1, 3));
            let mut dir = Direction::None;
            let mut cooldown: u32 = 0;
            for want in turns {
                cooldown = cooldown.saturating_sub(1);
                if try_portal(&g, &mut pos, dir, &mut cooldown, 10).is_some() {
                    prop_assert!(g.admits(pos.cell(), Mover::Player));
                    continue;
                }
                let open = cooldown == 0;
                if is_centered(pos) && can_move(&g, pos, want, Mover::Player, open) {
                    dir = want;
                    snap(&mut pos);
                }
                if advance(&g, &mut pos, &mut dir, speed, Mover::Player, open) == Advance::Stuck {
                    prop_assert_eq!(pos, Position::at_cell(pos.cell()));
                }
                prop_assert!(g.admits(pos.cell(), Mover::Player));
                let (ox, oy) = pos.offset_from_cell();
                prop_assert!(ox.abs() <= TILE_SIZE / 2.0 && oy.abs() <= TILE_SIZE / 2.0);
            }
        }
    }
}
