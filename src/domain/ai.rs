/// Ghost AI: target selection and the intersection decision.
///
/// Everything here is a pure function of its inputs plus the session rng.
/// Other agents are only seen through a `PursuitView`, taken once at the
/// start of a tick, so the order in which ghosts update never matters.
///
/// Decision, at a centered cell:
///   1. Candidates = walkable cardinal directions.
///   2. Drop the reversal if anything else remains.
///   3. Frightened → uniform random candidate.
///      Otherwise → candidate whose next cell is nearest the target,
///      ties broken uniformly at random.

use rand::seq::SliceRandom;
use rand::Rng;

use super::entity::{Cell, Direction};
use super::ghost::Personality;

/// Ambusher aims this many tiles ahead of the player.
pub const AMBUSH_LEAD: i32 = 4;

/// Opportunist gives up the chase inside this radius (tiles).
pub const OPPORTUNIST_RADIUS: i32 = 8;

/// Frightened random targets stay this far inside the map edge.
pub const RANDOM_TARGET_MARGIN: i32 = 2;

/// Read-only view of the other agents, captured before anyone moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PursuitView {
    pub player_cell: Cell,
    pub player_dir: Direction,
    /// Cell of the direct pursuer, if it is out hunting. `None` while it is
    /// absent, eaten or respawning.
    pub direct_pursuer: Option<Cell>,
}

/// Chase-mode target for `personality` standing on `own`.
pub fn pursuit_target(
    personality: Personality,
    own: Cell,
    scatter_corner: Cell,
    view: &PursuitView,
) -> Cell {
    let player = view.player_cell;
    match personality {
        Personality::DirectPursuer => player,
        Personality::Ambusher => player.offset(view.player_dir, AMBUSH_LEAD),
        Personality::MirrorPursuer => match view.direct_pursuer {
            Some(d) => Cell::new(2 * player.x - d.x, 2 * player.y - d.y),
            None => player,
        },
        Personality::Opportunist => {
            if own.dist_sq(player) >= OPPORTUNIST_RADIUS * OPPORTUNIST_RADIUS {
                player
            } else {
                scatter_corner
            }
        }
    }
}

/// Uniform random cell inside the map, `RANDOM_TARGET_MARGIN` from the edge.
pub fn random_target<R: Rng + ?Sized>(width: usize, height: usize, rng: &mut R) -> Cell {
    let span = |len: usize| {
        let lo = RANDOM_TARGET_MARGIN;
        let hi = (len as i32 - 1 - RANDOM_TARGET_MARGIN).max(lo);
        (lo, hi)
    };
    let (x0, x1) = span(width);
    let (y0, y1) = span(height);
    Cell::new(rng.gen_range(x0..=x1), rng.gen_range(y0..=y1))
}

/// Candidates left after the no-reversal rule.
pub fn without_reversal(options: &[Direction], current: Direction) -> Vec<Direction> {
    let back = current.opposite();
    if options.len() > 1 && !back.is_none() && options.contains(&back) {
        options.iter().copied().filter(|&d| d != back).collect()
    } else {
        options.to_vec()
    }
}

/// Intersection decision. Returns `Direction::None` when boxed in.
pub fn choose_direction<R: Rng + ?Sized>(
    options: &[Direction],
    current: Direction,
    from: Cell,
    target: Cell,
    frightened: bool,
    rng: &mut R,
) -> Direction {
    let candidates = without_reversal(options, current);
    if candidates.is_empty() {
        return Direction::None;
    }
    if frightened {
        return *candidates.choose(rng).unwrap_or(&Direction::None);
    }

    let best = candidates
        .iter()
        .map(|&d| from.offset(d, 1).dist_sq(target))
        .min()
        .unwrap_or(0);
    let nearest: Vec<Direction> = candidates
        .iter()
        .copied()
        .filter(|&d| from.offset(d, 1).dist_sq(target) == best)
        .collect();
    *nearest.choose(rng).unwrap_or(&Direction::None)
}
