/// Player Controller.
///
/// Input is two buffered turns: `next` (most recent) and `buffer` (the one
/// it displaced). At every centered tick the controller tries `next`, then
/// `buffer`, then keeps going straight under the stuck policy.
///
/// Death is a fixed-length shrink animation. On completion the player
/// reappears on the spawn cell with a short invulnerability window.

use super::entity::{Cell, Direction, Position};
use super::grid::GridMap;
use super::motion::{self, Advance};
use super::tile::Mover;

/// Per-session player constants (from `[timing]` / `[speed]` config).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerTuning {
    pub speed: f32,
    pub portal_cooldown: u32,
    pub death_frames: u32,
    pub death_step: u32,
    pub initial_invulnerability: u32,
    pub respawn_invulnerability: u32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        PlayerTuning {
            speed: 1.5,
            portal_cooldown: 10,
            death_frames: 60,
            death_step: 2,
            initial_invulnerability: 180,
            respawn_invulnerability: 120,
        }
    }
}

/// What happened to the player this tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlayerTick {
    Moved,
    Stuck,
    Teleported,
    Dying,
    Respawned,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Position,
    pub dir: Direction,
    pub next: Direction,
    pub buffer: Direction,
    pub alive: bool,
    /// Death animation progress, 0..=death_frames.
    pub death_frame: u32,
    pub invulnerable: u32,
    pub portal_cooldown: u32,
    pub spawn: Cell,
}

impl Player {
    pub fn new(spawn: Cell, invulnerable: u32) -> Self {
        Player {
            pos: Position::at_cell(spawn),
            dir: Direction::None,
            next: Direction::None,
            buffer: Direction::None,
            alive: true,
            death_frame: 0,
            invulnerable,
            portal_cooldown: 0,
            spawn,
        }
    }

    #[inline]
    pub fn cell(&self) -> Cell {
        self.pos.cell()
    }

    #[inline]
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable > 0
    }

    /// Record a turn request. A new request demotes the previous `next`
    /// to `buffer`; repeating the pending request changes nothing.
    pub fn turn(&mut self, dir: Direction) {
        if dir.is_none() || dir == self.next {
            return;
        }
        if !self.next.is_none() {
            self.buffer = self.next;
        }
        self.next = dir;
    }

    /// Enter the death sequence. Movement and buffered input stop.
    pub fn kill(&mut self) {
        self.alive = false;
        self.death_frame = 0;
        self.dir = Direction::None;
        self.next = Direction::None;
        self.buffer = Direction::None;
    }

    /// Shrink progress in `0.0..=1.0` for the presentation layer.
    pub fn death_progress(&self, tuning: &PlayerTuning) -> f32 {
        if tuning.death_frames == 0 {
            return 1.0;
        }
        self.death_frame.min(tuning.death_frames) as f32 / tuning.death_frames as f32
    }

    pub fn update(&mut self, grid: &GridMap, tuning: &PlayerTuning) -> PlayerTick {
        if !self.alive {
            self.death_frame += tuning.death_step;
            if self.death_frame > tuning.death_frames {
                self.respawn(tuning.respawn_invulnerability);
                return PlayerTick::Respawned;
            }
            return PlayerTick::Dying;
        }

        self.invulnerable = self.invulnerable.saturating_sub(1);
        self.portal_cooldown = self.portal_cooldown.saturating_sub(1);

        if motion::try_portal(
            grid,
            &mut self.pos,
            self.dir,
            &mut self.portal_cooldown,
            tuning.portal_cooldown,
        )
        .is_some()
        {
            return PlayerTick::Teleported;
        }

        let portal_open = self.portal_cooldown == 0;
        if motion::is_centered(self.pos) {
            if motion::can_move(grid, self.pos, self.next, Mover::Player, portal_open) {
                self.set_dir(self.next);
                self.next = Direction::None;
            } else if motion::can_move(grid, self.pos, self.buffer, Mover::Player, portal_open) {
                self.set_dir(self.buffer);
                self.buffer = Direction::None;
            }
        }

        match motion::advance(grid, &mut self.pos, &mut self.dir, tuning.speed, Mover::Player, portal_open) {
            Advance::Moved => PlayerTick::Moved,
            Advance::Stuck => PlayerTick::Stuck,
        }
    }

    fn set_dir(&mut self, dir: Direction) {
        if dir != self.dir {
            motion::snap(&mut self.pos);
        }
        self.dir = dir;
    }

    fn respawn(&mut self, invulnerable: u32) {
        let spawn = self.spawn;
        *self = Player::new(spawn, invulnerable);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::TILE_SIZE;

    fn grid() -> GridMap {
        GridMap::parse(&[
            "1111111",
            "1000001",
            "P01110P",
            "1000001",
            "1111111",
        ])
        .unwrap()
    }

    fn run(p: &mut Player, g: &GridMap, t: &PlayerTuning, ticks: u32) {
        for _ in 0..ticks {
            p.update(g, t);
        }
    }

    #[test]
    fn turn_demotes_previous_request() {
        let mut p = Player::new(Cell::new(1, 1), 0);
        p.turn(Direction::Right);
        p.turn(Direction::Down);
        assert_eq!(p.next, Direction::Down);
        assert_eq!(p.buffer, Direction::Right);
        p.turn(Direction::Down);
        assert_eq!(p.buffer, Direction::Right);
        p.turn(Direction::None);
        assert_eq!(p.next, Direction::Down);
    }

    #[test]
    fn falls_back_to_buffer_when_next_is_blocked() {
        let g = grid();
        let t = PlayerTuning::default();
        let mut p = Player::new(Cell::new(1, 1), 0);
        p.turn(Direction::Right);
        p.turn(Direction::Up); // wall above
        p.update(&g, &t);
        assert_eq!(p.dir, Direction::Right);
        assert_eq!(p.next, Direction::Up);
        assert_eq!(p.buffer, Direction::None);
        assert_eq!(p.pos.px, TILE_SIZE + t.speed);
    }

    #[test]
    fn buffered_turn_waits_for_the_intersection() {
        let g = grid();
        let t = PlayerTuning::default();
        let mut p = Player::new(Cell::new(2, 1), 0);
        p.turn(Direction::Left);
        p.update(&g, &t);
        p.turn(Direction::Down);
        // (1,2) is open, (2,2) is wall: the turn fires on reaching x = 1.
        run(&mut p, &g, &t, 20);
        assert_eq!(p.dir, Direction::Down);
        assert_eq!(p.pos.px, TILE_SIZE);
    }

    #[test]
    fn walking_into_wall_stops_on_cell() {
        let g = grid();
        let t = PlayerTuning::default();
        let mut p = Player::new(Cell::new(4, 1), 0);
        p.turn(Direction::Right);
        run(&mut p, &g, &t, 40);
        assert_eq!(p.dir, Direction::None);
        assert_eq!(p.pos, Position::at_cell(Cell::new(5, 1)));
    }

    #[test]
    fn portal_wraps_and_keeps_heading() {
        let g = grid();
        let t = PlayerTuning::default();
        let mut p = Player::new(Cell::new(1, 2), 0);
        p.turn(Direction::Left);
        let mut teleported = false;
        for _ in 0..40 {
            if p.update(&g, &t) == PlayerTick::Teleported {
                teleported = true;
                break;
            }
        }
        assert!(teleported);
        assert_eq!(p.cell(), Cell::new(5, 2));
        assert_eq!(p.dir, Direction::Left);
        assert_eq!(p.portal_cooldown, t.portal_cooldown);
    }

    #[test]
    fn death_animation_then_respawn_with_shorter_immunity() {
        let g = grid();
        let t = PlayerTuning::default();
        let mut p = Player::new(Cell::new(1, 1), t.initial_invulnerability);
        p.pos = Position::at_cell(Cell::new(4, 3));
        p.invulnerable = 0;
        p.kill();
        assert!(!p.alive);

        // 2 per tick, respawn once past 60.
        for _ in 0..30 {
            assert_eq!(p.update(&g, &t), PlayerTick::Dying);
        }
        assert_eq!(p.death_progress(&t), 1.0);
        assert_eq!(p.update(&g, &t), PlayerTick::Respawned);
        assert!(p.alive);
        assert_eq!(p.cell(), Cell::new(1, 1));
        assert_eq!(p.dir, Direction::None);
        assert_eq!(p.invulnerable, t.respawn_invulnerability);
        assert!(t.initial_invulnerability > t.respawn_invulnerability);
    }

    #[test]
    fn invulnerability_counts_down_while_alive() {
        let g = grid();
        let t = PlayerTuning::default();
        let mut p = Player::new(Cell::new(1, 1), 3);
        run(&mut p, &g, &t, 2);
        assert!(p.is_invulnerable());
        p.update(&g, &t);
        assert!(!p.is_invulnerable());
        p.update(&g, &t);
        assert_eq!(p.invulnerable, 0);
    }
}
