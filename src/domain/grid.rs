/// GridMap: the immutable symbolic maze.
///
/// ## Map format
///
/// One character per cell, one line per row, all rows the same length:
///
///   '1' = Wall               '0' = Open + pellet
///   'P' = Portal             'H' = Pen (ghost house interior)
///   'E' = Open + energizer   'B' = Open + score bonus
///
/// Portals must sit on the outer columns and come in pairs: a row with a
/// portal at `x = 0` has its partner at `x = width - 1`.
///
/// The map is never mutated after parsing. Pickups live in the world, not here;
/// the grid only remembers where they start.

use thiserror::Error;

use super::entity::{BonusKind, Cell, Direction};
use super::tile::{Mover, Tile};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("map has no rows")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged { row: usize, found: usize, expected: usize },
    #[error("unknown map symbol {symbol:?} at ({x}, {y})")]
    UnknownSymbol { symbol: char, x: usize, y: usize },
    #[error("portal at ({x}, {y}) is not on an outer column")]
    PortalNotOnEdge { x: usize, y: usize },
    #[error("portal on row {row} has no partner on the opposite edge")]
    UnpairedPortal { row: usize },
    #[error("map has no usable {0} spawn cell")]
    MissingSpawn(&'static str),
}

/// Which edge a portal sits on.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PortalSide {
    Left,
    Right,
}

impl PortalSide {
    pub fn opposite(self) -> PortalSide {
        match self {
            PortalSide::Left => PortalSide::Right,
            PortalSide::Right => PortalSide::Left,
        }
    }
}

/// Result of stepping outward through a portal.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PortalExit {
    /// Cell just inside the opposite edge.
    pub to: Cell,
    /// Portal that was entered.
    pub entered: PortalSide,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GridMap {
    tiles: Vec<Vec<Tile>>,
    width: usize,
    height: usize,
    pellet_cells: Vec<Cell>,
    bonus_markers: Vec<(Cell, BonusKind)>,
}

impl GridMap {
    /// Parse map text. Blank lines are ignored; trailing whitespace is trimmed.
    pub fn from_text(text: &str) -> Result<Self, MapError> {
        let rows: Vec<&str> = text
            .lines()
            .map(|l| l.trim_end())
            .filter(|l| !l.is_empty())
            .collect();
        Self::parse(&rows)
    }

    pub fn parse(rows: &[&str]) -> Result<Self, MapError> {
        let height = rows.len();
        if height == 0 {
            return Err(MapError::Empty);
        }
        let width = rows[0].chars().count();
        if width == 0 {
            return Err(MapError::Empty);
        }

        let mut tiles = vec![vec![Tile::Wall; width]; height];
        let mut pellet_cells = Vec::new();
        let mut bonus_markers = Vec::new();

        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(MapError::Ragged { row: y, found, expected: width });
            }
            for (x, ch) in row.chars().enumerate() {
                let tile = Tile::from_symbol(ch)
                    .ok_or(MapError::UnknownSymbol { symbol: ch, x, y })?;
                if tile.is_portal() && x != 0 && x != width - 1 {
                    return Err(MapError::PortalNotOnEdge { x, y });
                }
                tiles[y][x] = tile;

                let cell = Cell::new(x as i32, y as i32);
                match ch {
                    '0' => pellet_cells.push(cell),
                    'E' => bonus_markers.push((cell, BonusKind::Energizer)),
                    'B' => bonus_markers.push((cell, BonusKind::Score)),
                    _ => {}
                }
            }
        }

        for (y, row) in tiles.iter().enumerate() {
            if row[0].is_portal() != row[width - 1].is_portal() {
                return Err(MapError::UnpairedPortal { row: y });
            }
        }

        Ok(GridMap { tiles, width, height, pellet_cells, bonus_markers })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0
            && (cell.x as usize) < self.width
            && (cell.y as usize) < self.height
    }

    /// Tile at `cell`. Out of bounds reads as wall.
    #[inline]
    pub fn tile_at(&self, cell: Cell) -> Tile {
        if self.in_bounds(cell) {
            self.tiles[cell.y as usize][cell.x as usize]
        } else {
            Tile::Wall
        }
    }

    /// Can `mover` occupy `cell`? Eyes ignore the map entirely.
    #[inline]
    pub fn admits(&self, cell: Cell, mover: Mover) -> bool {
        if mover == Mover::Eyes {
            return true;
        }
        self.in_bounds(cell) && self.tile_at(cell).admits(mover)
    }

    /// Is a move from `from` one step along `dir` legal?
    pub fn can_step(&self, from: Cell, dir: Direction, mover: Mover) -> bool {
        if mover == Mover::Eyes {
            return true;
        }
        if dir.is_none() {
            return false;
        }
        self.admits(from.offset(dir, 1), mover)
    }

    /// Every direction out of `from` that `mover` may take, in
    /// `Direction::CARDINALS` order.
    pub fn open_directions(&self, from: Cell, mover: Mover) -> Vec<Direction> {
        Direction::CARDINALS
            .iter()
            .copied()
            .filter(|&d| self.can_step(from, d, mover))
            .collect()
    }

    /// Outward move through the portal at `cell`, if there is one.
    pub fn portal_exit(&self, cell: Cell, dir: Direction) -> Option<PortalExit> {
        if !self.tile_at(cell).is_portal() {
            return None;
        }
        let last = self.width as i32 - 1;
        if cell.x == 0 && dir == Direction::Left {
            Some(PortalExit { to: Cell::new(last - 1, cell.y), entered: PortalSide::Left })
        } else if cell.x == last && dir == Direction::Right {
            Some(PortalExit { to: Cell::new(1, cell.y), entered: PortalSide::Right })
        } else {
            None
        }
    }

    /// Which edge portal `cell` is, if any.
    pub fn portal_side(&self, cell: Cell) -> Option<PortalSide> {
        if !self.tile_at(cell).is_portal() {
            return None;
        }
        if cell.x == 0 {
            Some(PortalSide::Left)
        } else if cell.x == self.width as i32 - 1 {
            Some(PortalSide::Right)
        } else {
            None
        }
    }

    /// Cells that start with a pellet.
    pub fn pellet_cells(&self) -> &[Cell] {
        &self.pellet_cells
    }

    /// Cells that start with an energizer or score bonus.
    pub fn bonus_markers(&self) -> &[(Cell, BonusKind)] {
        &self.bonus_markers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &[&str] = &[
        "11111",
        "1E0B1",
        "P000P",
        "11H11",
    ];

    #[test]
    fn parses_markers() {
        let g = GridMap::parse(SMALL).unwrap();
        assert_eq!(g.width(), 5);
        assert_eq!(g.height(), 4);
        assert_eq!(g.pellet_cells().len(), 4);
        assert_eq!(g.bonus_markers().len(), 2);
        assert_eq!(g.tile_at(Cell::new(2, 3)), Tile::Pen);
        assert_eq!(g.tile_at(Cell::new(-1, 0)), Tile::Wall);
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = GridMap::parse(&["111", "11"]).unwrap_err();
        assert_eq!(err, MapError::Ragged { row: 1, found: 2, expected: 3 });
    }

    #[test]
    fn rejects_unknown_symbols() {
        let err = GridMap::parse(&["1x1"]).unwrap_err();
        assert_eq!(err, MapError::UnknownSymbol { symbol: 'x', x: 1, y: 0 });
    }

    #[test]
    fn rejects_inner_and_unpaired_portals() {
        assert_eq!(
            GridMap::parse(&["1P01"]).unwrap_err(),
            MapError::PortalNotOnEdge { x: 1, y: 0 }
        );
        assert_eq!(
            GridMap::parse(&["1111", "P001"]).unwrap_err(),
            MapError::UnpairedPortal { row: 1 }
        );
        assert_eq!(GridMap::from_text("\n\n").unwrap_err(), MapError::Empty);
    }

    #[test]
    fn pen_blocks_player_but_not_ghost() {
        let g = GridMap::parse(SMALL).unwrap();
        let above_pen = Cell::new(2, 2);
        assert!(!g.can_step(above_pen, Direction::Down, Mover::Player));
        assert!(g.can_step(above_pen, Direction::Down, Mover::Ghost));
        assert!(!g.can_step(above_pen, Direction::None, Mover::Ghost));
    }

    #[test]
    fn eyes_pass_walls() {
        let g = GridMap::parse(SMALL).unwrap();
        assert!(g.can_step(Cell::new(1, 1), Direction::Up, Mover::Eyes));
        assert!(!g.can_step(Cell::new(1, 1), Direction::Up, Mover::Ghost));
    }

    #[test]
    fn open_directions_follow_cardinal_order() {
        let g = GridMap::parse(SMALL).unwrap();
        let dirs = g.open_directions(Cell::new(2, 2), Mover::Ghost);
        assert_eq!(
            dirs,
            vec![Direction::Right, Direction::Left, Direction::Down, Direction::Up]
        );
        let from_bonus_row = g.open_directions(Cell::new(1, 1), Mover::Ghost);
        assert_eq!(from_bonus_row, vec![Direction::Right, Direction::Down]);
    }

    #[test]
    fn portal_exit_lands_just_inside_opposite_edge() {
        let g = GridMap::parse(SMALL).unwrap();
        let exit = g.portal_exit(Cell::new(0, 2), Direction::Left).unwrap();
        assert_eq!(exit.to, Cell::new(3, 2));
        assert_eq!(exit.entered, PortalSide::Left);

        let back = g.portal_exit(Cell::new(4, 2), Direction::Right).unwrap();
        assert_eq!(back.to, Cell::new(1, 2));
        assert_eq!(back.entered, PortalSide::Right);

        assert!(g.portal_exit(Cell::new(0, 2), Direction::Right).is_none());
        assert!(g.portal_exit(Cell::new(1, 2), Direction::Left).is_none());
        assert_eq!(g.portal_side(Cell::new(4, 2)), Some(PortalSide::Right));
    }
}
