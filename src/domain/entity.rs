/// Entities shared by every agent: directions, grid cells, continuous
/// positions, and the two pickup kinds (pellets and bonuses).

/// Edge length of one grid cell in pixels.
pub const TILE_SIZE: f32 = 24.0;

/// Movement direction. `None` is the zero vector.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// Enumeration order for decision making: right, left, down, up.
    pub const CARDINALS: [Direction; 4] = [
        Direction::Right,
        Direction::Left,
        Direction::Down,
        Direction::Up,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::None => (0, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::None => Direction::None,
        }
    }

    pub fn is_none(self) -> bool {
        self == Direction::None
    }

    /// Dominant-axis direction of an arbitrary vector (used for eyes heading home).
    pub fn from_vector(dx: f32, dy: f32) -> Direction {
        if dx == 0.0 && dy == 0.0 {
            Direction::None
        } else if dx.abs() >= dy.abs() {
            if dx < 0.0 { Direction::Left } else { Direction::Right }
        } else if dy < 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

impl Default for Direction {
    fn default() -> Self {
        Direction::None
    }
}

/// A discrete grid coordinate. May lie outside the map (targets often do).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Cell { x, y }
    }

    /// The cell `n` steps away along `dir`.
    pub fn offset(self, dir: Direction, n: i32) -> Cell {
        let (dx, dy) = dir.delta();
        Cell { x: self.x + dx * n, y: self.y + dy * n }
    }

    /// Squared Euclidean distance. Exact, so ties compare reliably.
    pub fn dist_sq(self, other: Cell) -> i32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn dist(self, other: Cell) -> f32 {
        (self.dist_sq(other) as f32).sqrt()
    }
}

/// Continuous pixel position of an agent's top-left corner.
///
/// The discrete cell is never stored: `cell()` recomputes it as the
/// nearest-tile rounding every time it is asked for.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Position {
    pub px: f32,
    pub py: f32,
}

impl Position {
    /// Pixel-aligned position of `cell`.
    pub fn at_cell(cell: Cell) -> Self {
        Position {
            px: cell.x as f32 * TILE_SIZE,
            py: cell.y as f32 * TILE_SIZE,
        }
    }

    pub fn cell(self) -> Cell {
        Cell {
            x: (self.px / TILE_SIZE).round() as i32,
            y: (self.py / TILE_SIZE).round() as i32,
        }
    }

    /// Per-axis offset from the pixel-aligned position of the current cell.
    pub fn offset_from_cell(self) -> (f32, f32) {
        let anchor = Position::at_cell(self.cell());
        (self.px - anchor.px, self.py - anchor.py)
    }

    pub fn center(self) -> (f32, f32) {
        (self.px + TILE_SIZE / 2.0, self.py + TILE_SIZE / 2.0)
    }

    pub fn moved(self, dir: Direction, speed: f32) -> Position {
        let (dx, dy) = dir.delta();
        Position {
            px: self.px + dx as f32 * speed,
            py: self.py + dy as f32 * speed,
        }
    }
}

/// A static pellet. Collected pellets are removed from the world list.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Pellet {
    pub cell: Cell,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BonusKind {
    Energizer,
    Score,
}

/// Energizer or scoring bonus; consumed by flipping `active`.
#[derive(Clone, Debug)]
pub struct Bonus {
    pub cell: Cell,
    pub kind: BonusKind,
    pub active: bool,
    pub blink_timer: u32,
}

/// Blink period of non-energizer bonuses, in ticks.
pub const BONUS_BLINK_PERIOD: u32 = 30;

impl Bonus {
    pub fn new(cell: Cell, kind: BonusKind) -> Self {
        Bonus { cell, kind, active: true, blink_timer: 0 }
    }

    pub fn is_energizer(&self) -> bool {
        self.kind == BonusKind::Energizer
    }

    /// Pixel centre of the bonus.
    pub fn center(&self) -> (f32, f32) {
        Position::at_cell(self.cell).center()
    }

    /// Drawn radius in pixels.
    pub fn radius(&self) -> f32 {
        if self.is_energizer() { 10.0 } else { 6.0 }
    }

    /// Energizers are always lit; score bonuses blink.
    pub fn lit(&self) -> bool {
        self.is_energizer() || self.blink_timer % BONUS_BLINK_PERIOD < BONUS_BLINK_PERIOD / 2
    }
}
