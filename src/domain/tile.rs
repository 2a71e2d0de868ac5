/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Wall,
    Open,
    Portal, // horizontal wrap cell on the outer columns
    Pen,    // ghost house interior
}

/// Who is asking to enter a tile.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mover {
    Player,
    Ghost,
    /// Eaten ghost flying home: walls do not apply.
    Eyes,
}

impl Tile {
    /// Map symbol → tile. Pickup markers (`0`, `E`, `B`) are open floor.
    pub fn from_symbol(ch: char) -> Option<Tile> {
        match ch {
            '1' => Some(Tile::Wall),
            '0' | 'E' | 'B' => Some(Tile::Open),
            'P' => Some(Tile::Portal),
            'H' => Some(Tile::Pen),
            _ => None,
        }
    }

    pub fn is_wall(self) -> bool {
        matches!(self, Tile::Wall)
    }

    pub fn is_portal(self) -> bool {
        matches!(self, Tile::Portal)
    }

    /// Can `mover` occupy this tile?
    pub fn admits(self, mover: Mover) -> bool {
        match mover {
            Mover::Eyes => true,
            Mover::Ghost => !self.is_wall(),
            Mover::Player => !matches!(self, Tile::Wall | Tile::Pen),
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Wall
    }
}
