/// Scoring and contact geometry.
///
/// Pure rules, no world access. The resolver in `sim::step` decides
/// *when* to ask; this module answers *whether* two things touch and
/// *what* they are worth.
///
///   Agent body   tile box inset 4 px on every side (16×16)
///   Pellet       8×8 box centred in its tile
///   Bonus        player centre within half a tile of the bonus centre

use super::entity::{Bonus, BonusKind, Cell, Position, TILE_SIZE};

pub const PELLET_REWARD: u32 = 10;
pub const BONUS_REWARD: u32 = 50;
pub const ENERGIZER_REWARD: u32 = 100;
pub const GHOST_REWARD: u32 = 200;

pub const HITBOX_INSET: f32 = 4.0;
pub const PELLET_SIZE: f32 = 8.0;
pub const BONUS_PICKUP_RADIUS: f32 = TILE_SIZE / 2.0;

/// Axis-aligned box in pixels.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    /// Strict overlap: boxes that only share an edge do not touch.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

/// Body box of an agent standing at `pos`.
pub fn body(pos: Position) -> Rect {
    Rect {
        x: pos.px + HITBOX_INSET,
        y: pos.py + HITBOX_INSET,
        w: TILE_SIZE - 2.0 * HITBOX_INSET,
        h: TILE_SIZE - 2.0 * HITBOX_INSET,
    }
}

pub fn pellet_box(cell: Cell) -> Rect {
    let offset = (TILE_SIZE - PELLET_SIZE) / 2.0;
    Rect {
        x: cell.x as f32 * TILE_SIZE + offset,
        y: cell.y as f32 * TILE_SIZE + offset,
        w: PELLET_SIZE,
        h: PELLET_SIZE,
    }
}

#[inline]
pub fn bodies_touch(a: Position, b: Position) -> bool {
    body(a).overlaps(&body(b))
}

#[inline]
pub fn touches_pellet(player: Position, pellet: Cell) -> bool {
    body(player).overlaps(&pellet_box(pellet))
}

/// Active bonus within pickup range of the player's centre.
pub fn reaches_bonus(player: Position, bonus: &Bonus) -> bool {
    if !bonus.active {
        return false;
    }
    let (px, py) = player.center();
    let (bx, by) = bonus.center();
    let (dx, dy) = (px - bx, py - by);
    (dx * dx + dy * dy).sqrt() < BONUS_PICKUP_RADIUS
}

pub fn bonus_reward(kind: BonusKind) -> u32 {
    match kind {
        BonusKind::Energizer => ENERGIZER_REWARD,
        BonusKind::Score => BONUS_REWARD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bodies_overlap_within_inset() {
        let a = Position::at_cell(Cell::new(3, 3));
        // 15 px apart: 16 px boxes still overlap.
        assert!(bodies_touch(a, Position { px: a.px + 15.0, py: a.py }));
        // 16 px apart: edges meet, no contact.
        assert!(!bodies_touch(a, Position { px: a.px + 16.0, py: a.py }));
        assert!(!bodies_touch(a, Position::at_cell(Cell::new(4, 4))));
    }

    #[test]
    fn pellet_needs_player_inside_its_tile() {
        let cell = Cell::new(2, 2);
        assert!(touches_pellet(Position::at_cell(cell), cell));
        // Pellet box spans x 56..64; a body at px 37 spans 41..57.
        let near = Position { px: 2.0 * TILE_SIZE - 11.0, py: 2.0 * TILE_SIZE };
        assert!(touches_pellet(near, cell));
        let edge = Position { px: 2.0 * TILE_SIZE - 12.0, py: 2.0 * TILE_SIZE };
        assert!(!touches_pellet(edge, cell));
    }

    #[test]
    fn bonus_radius_is_half_tile() {
        let b = Bonus::new(Cell::new(5, 5), BonusKind::Score);
        let on = Position::at_cell(Cell::new(5, 5));
        assert!(reaches_bonus(on, &b));
        assert!(reaches_bonus(Position { px: on.px + 11.9, py: on.py }, &b));
        assert!(!reaches_bonus(Position { px: on.px + 12.0, py: on.py }, &b));

        let mut spent = b.clone();
        spent.active = false;
        assert!(!reaches_bonus(on, &spent));
    }

    #[test]
    fn rewards() {
        assert_eq!(bonus_reward(BonusKind::Energizer), 100);
        assert_eq!(bonus_reward(BonusKind::Score), 50);
        assert_eq!(PELLET_REWARD + GHOST_REWARD, 210);
    }
}
