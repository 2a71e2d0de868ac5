/// Ghost Behavior Engine: one ghost's state machine and movement.
///
/// ## States
///
///   Scatter ⇄ Chase        periodic, per-personality durations
///   any but Eaten → Frightened   (energizer, external)
///   Frightened → Chase     timer expiry
///   Frightened → Eaten     caught by the player (external)
///   Eaten → Respawning     eyes reach the start cell
///   Respawning → Scatter   in-house timer expiry, full reset
///
/// Respawning counts as part of the eaten cycle: it cannot hurt the
/// player. An energizer cuts it short.
///
/// ## Movement per tick
///
///   Eaten       straight-line homing, walls ignored
///   Respawning  parked in the pen
///   otherwise   portal → decision (centered, new cell or blocked) → advance

use rand::seq::SliceRandom;
use rand::Rng;

use super::ai::{self, PursuitView};
use super::entity::{Cell, Direction, Position};
use super::grid::{GridMap, PortalSide};
use super::motion;
use super::tile::Mover;

/// Frightened ghosts move at half speed.
pub const FRIGHTENED_SPEED_FACTOR: f32 = 0.5;
/// Eyes fly home at twice the base speed.
pub const EATEN_SPEED_FACTOR: f32 = 2.0;

// ══════════════════════════════════════════════════════════════
// Personality
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Personality {
    DirectPursuer,
    Ambusher,
    MirrorPursuer,
    Opportunist,
}

/// Constant record attached to a personality.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Profile {
    pub scatter_corner: Cell,
    pub speed_factor: f32,
    pub scatter_secs: u32,
    pub chase_secs: u32,
}

impl Personality {
    pub const ALL: [Personality; 4] = [
        Personality::DirectPursuer,
        Personality::Ambusher,
        Personality::MirrorPursuer,
        Personality::Opportunist,
    ];

    /// Profile for a `width × height` map. Scatter corners sit one cell
    /// inside the outer wall.
    pub fn profile(self, width: usize, height: usize) -> Profile {
        let right = width as i32 - 2;
        let bottom = height as i32 - 2;
        match self {
            Personality::DirectPursuer => Profile {
                scatter_corner: Cell::new(right, 1),
                speed_factor: 1.05,
                scatter_secs: 7,
                chase_secs: 20,
            },
            Personality::Ambusher => Profile {
                scatter_corner: Cell::new(1, 1),
                speed_factor: 1.0,
                scatter_secs: 7,
                chase_secs: 20,
            },
            Personality::MirrorPursuer => Profile {
                scatter_corner: Cell::new(right, bottom),
                speed_factor: 0.95,
                scatter_secs: 5,
                chase_secs: 20,
            },
            Personality::Opportunist => Profile {
                scatter_corner: Cell::new(1, bottom),
                speed_factor: 0.9,
                scatter_secs: 5,
                chase_secs: 20,
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Personality::DirectPursuer => "direct",
            Personality::Ambusher => "ambusher",
            Personality::MirrorPursuer => "mirror",
            Personality::Opportunist => "opportunist",
        }
    }
}

// ══════════════════════════════════════════════════════════════
// State
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GhostState {
    Scatter,
    Chase,
    Frightened,
    Eaten,
    Respawning,
}

impl GhostState {
    /// Eaten or waiting in the pen.
    pub fn is_eaten_cycle(self) -> bool {
        matches!(self, GhostState::Eaten | GhostState::Respawning)
    }
}

/// What the presentation layer should draw. Derived from state so colour
/// never feeds back into behaviour.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Appearance {
    Body(Personality),
    Frightened,
    Eyes,
    Fading,
}

/// Notable transitions reported by `Ghost::update`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GhostEvent {
    ModeSwitched(GhostState),
    FrightEnded,
    ReachedHome,
    Respawned,
}

/// Per-session ghost constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GhostTuning {
    /// Difficulty speed, px/tick, before the personality factor.
    pub base_speed: f32,
    pub ticks_per_second: u32,
    pub frightened_ticks: u32,
    pub respawn_ticks: u32,
    pub portal_cooldown: u32,
}

impl Default for GhostTuning {
    fn default() -> Self {
        GhostTuning {
            base_speed: 1.0,
            ticks_per_second: 60,
            frightened_ticks: 300,
            respawn_ticks: 180,
            portal_cooldown: 15,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Ghost
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Ghost {
    pub id: usize,
    pub personality: Personality,
    pub profile: Profile,
    pub pos: Position,
    pub dir: Direction,
    pub state: GhostState,
    /// Ticks spent in the current scatter/chase phase.
    pub state_timer: u32,
    pub frightened_timer: u32,
    pub respawn_timer: u32,
    pub start: Cell,
    pub portal_cooldown: u32,
    /// Side the ghost last came out of; that portal stays shut until the
    /// ghost has stood on it once.
    pub last_portal: Option<PortalSide>,
    pub last_decision: Option<Cell>,
}

impl Ghost {
    pub fn new<R: Rng + ?Sized>(
        id: usize,
        personality: Personality,
        start: Cell,
        grid: &GridMap,
        rng: &mut R,
    ) -> Self {
        let mut ghost = Ghost {
            id,
            personality,
            profile: personality.profile(grid.width(), grid.height()),
            pos: Position::at_cell(start),
            dir: Direction::None,
            state: GhostState::Scatter,
            state_timer: 0,
            frightened_timer: 0,
            respawn_timer: 0,
            start,
            portal_cooldown: 0,
            last_portal: None,
            last_decision: None,
        };
        ghost.reset(grid, rng);
        ghost
    }

    #[inline]
    pub fn cell(&self) -> Cell {
        self.pos.cell()
    }

    pub fn appearance(&self) -> Appearance {
        match self.state {
            GhostState::Scatter | GhostState::Chase => Appearance::Body(self.personality),
            GhostState::Frightened => Appearance::Frightened,
            GhostState::Eaten => Appearance::Eyes,
            GhostState::Respawning => Appearance::Fading,
        }
    }

    /// Fade-in progress while respawning, `0.0..=1.0`.
    pub fn respawn_progress(&self, tuning: &GhostTuning) -> f32 {
        if self.state != GhostState::Respawning || tuning.respawn_ticks == 0 {
            return 1.0;
        }
        1.0 - self.respawn_timer as f32 / tuning.respawn_ticks as f32
    }

    /// Pixels per tick. Eyes ignore the grid; every other state is capped
    /// at `motion::MAX_STEP` so the ghost cannot skip a cell centre.
    pub fn speed(&self, tuning: &GhostTuning) -> f32 {
        let base = tuning.base_speed;
        match self.state {
            GhostState::Eaten => base * EATEN_SPEED_FACTOR,
            GhostState::Frightened => {
                (base * self.profile.speed_factor * FRIGHTENED_SPEED_FACTOR).min(motion::MAX_STEP)
            }
            _ => (base * self.profile.speed_factor).min(motion::MAX_STEP),
        }
    }

    // ── External transitions ──

    /// Energizer hit. Returns false only for eyes heading home; a ghost
    /// still waiting in the pen cuts its respawn short and comes out
    /// frightened. Half the time the ghost turns around on the spot.
    pub fn frighten<R: Rng + ?Sized>(&mut self, ticks: u32, rng: &mut R) -> bool {
        if self.state == GhostState::Eaten {
            return false;
        }
        self.state = GhostState::Frightened;
        self.frightened_timer = ticks;
        self.respawn_timer = 0;
        if rng.gen_bool(0.5) {
            self.dir = self.dir.opposite();
            self.last_decision = None;
        }
        true
    }

    /// Caught by the player while frightened.
    pub fn eat(&mut self) {
        self.state = GhostState::Eaten;
        self.frightened_timer = 0;
        self.state_timer = 0;
        self.last_decision = None;
    }

    /// Back to the start cell in scatter with a fresh random heading.
    pub fn reset<R: Rng + ?Sized>(&mut self, grid: &GridMap, rng: &mut R) {
        self.pos = Position::at_cell(self.start);
        self.state = GhostState::Scatter;
        self.state_timer = 0;
        self.frightened_timer = 0;
        self.respawn_timer = 0;
        self.portal_cooldown = 0;
        self.last_portal = None;
        self.last_decision = None;
        let options = grid.open_directions(self.start, Mover::Ghost);
        self.dir = options.choose(rng).copied().unwrap_or(Direction::None);
    }

    // ── Tick ──

    pub fn update<R: Rng + ?Sized>(
        &mut self,
        grid: &GridMap,
        view: &PursuitView,
        tuning: &GhostTuning,
        rng: &mut R,
    ) -> Option<GhostEvent> {
        match self.state {
            GhostState::Eaten => return self.fly_home(tuning),
            GhostState::Respawning => {
                self.respawn_timer = self.respawn_timer.saturating_sub(1);
                if self.respawn_timer == 0 {
                    self.reset(grid, rng);
                    return Some(GhostEvent::Respawned);
                }
                return None;
            }
            _ => {}
        }

        let event = self.advance_timers(tuning);

        self.portal_cooldown = self.portal_cooldown.saturating_sub(1);
        if self.handle_portal(grid, tuning) {
            return event;
        }

        if motion::is_centered(self.pos) {
            let cell = self.cell();
            let open = self.portal_open(grid);
            let blocked = !motion::can_move(grid, self.pos, self.dir, Mover::Ghost, open);
            if blocked || self.last_decision != Some(cell) {
                self.last_decision = Some(cell);
                self.decide(grid, view, rng);
            }
        }

        let open = self.portal_open(grid);
        let speed = self.speed(tuning);
        motion::advance(grid, &mut self.pos, &mut self.dir, speed, Mover::Ghost, open);
        event
    }

    fn advance_timers(&mut self, tuning: &GhostTuning) -> Option<GhostEvent> {
        let tps = tuning.ticks_per_second;
        match self.state {
            GhostState::Frightened => {
                self.frightened_timer = self.frightened_timer.saturating_sub(1);
                if self.frightened_timer == 0 {
                    self.state = GhostState::Chase;
                    self.state_timer = 0;
                    return Some(GhostEvent::FrightEnded);
                }
                None
            }
            GhostState::Scatter | GhostState::Chase => {
                self.state_timer += 1;
                let (limit, next) = if self.state == GhostState::Scatter {
                    (self.profile.scatter_secs * tps, GhostState::Chase)
                } else {
                    (self.profile.chase_secs * tps, GhostState::Scatter)
                };
                if self.state_timer >= limit {
                    self.state = next;
                    self.state_timer = 0;
                    return Some(GhostEvent::ModeSwitched(next));
                }
                None
            }
            GhostState::Eaten | GhostState::Respawning => None,
        }
    }

    fn portal_open(&self, grid: &GridMap) -> bool {
        if self.portal_cooldown > 0 {
            return false;
        }
        match grid.portal_side(self.cell()) {
            Some(side) => self.last_portal != Some(side),
            None => true,
        }
    }

    /// Returns true when the ghost was relocated.
    fn handle_portal(&mut self, grid: &GridMap, tuning: &GhostTuning) -> bool {
        if self.portal_cooldown > 0 || !motion::is_centered(self.pos) {
            return false;
        }
        let Some(side) = grid.portal_side(self.cell()) else {
            return false;
        };
        if self.last_portal == Some(side) {
            self.last_portal = None;
            return false;
        }
        match motion::try_portal(grid, &mut self.pos, self.dir, &mut self.portal_cooldown, tuning.portal_cooldown) {
            Some(exit) => {
                self.last_portal = Some(exit.entered.opposite());
                self.last_decision = None;
                true
            }
            None => false,
        }
    }

    fn decide<R: Rng + ?Sized>(&mut self, grid: &GridMap, view: &PursuitView, rng: &mut R) {
        let cell = self.cell();
        let target = match self.state {
            GhostState::Scatter => self.profile.scatter_corner,
            GhostState::Frightened => ai::random_target(grid.width(), grid.height(), rng),
            GhostState::Chase => {
                ai::pursuit_target(self.personality, cell, self.profile.scatter_corner, view)
            }
            GhostState::Eaten | GhostState::Respawning => return,
        };

        let options = motion::open_directions(grid, self.pos, Mover::Ghost, self.portal_open(grid));
        let frightened = self.state == GhostState::Frightened;
        let dir = ai::choose_direction(&options, self.dir, cell, target, frightened, rng);
        if dir != self.dir {
            motion::snap(&mut self.pos);
        }
        self.dir = dir;
    }

    /// Eyes glide straight at the start cell, ignoring walls.
    fn fly_home(&mut self, tuning: &GhostTuning) -> Option<GhostEvent> {
        if self.cell() == self.start {
            self.pos = Position::at_cell(self.start);
            self.dir = Direction::None;
            self.state = GhostState::Respawning;
            self.respawn_timer = tuning.respawn_ticks;
            return Some(GhostEvent::ReachedHome);
        }
        let home = Position::at_cell(self.start);
        let dx = home.px - self.pos.px;
        let dy = home.py - self.pos.py;
        let len = (dx * dx + dy * dy).sqrt();
        let step = self.speed(tuning).min(len);
        self.pos.px += dx / len * step;
        self.pos.py += dy / len * step;
        self.dir = Direction::from_vector(dx, dy);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::motion::MAX_STEP;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Open field with a portal row and a pen pocket in the middle.
    fn field() -> GridMap {
        GridMap::parse(&[
            "111111111",
            "100000001",
            "101101101",
            "P0000000P",
            "101HHH101",
            "100000001",
            "111111111",
        ])
        .unwrap()
    }

    fn ghost(p: Personality, start: Cell) -> (Ghost, GridMap, StdRng) {
        let g = field();
        let mut rng = StdRng::seed_from_u64(11);
        let ghost = Ghost::new(0, p, start, &g, &mut rng);
        (ghost, g, rng)
    }

    fn run(
        ghost: &mut Ghost,
        g: &GridMap,
        t: &GhostTuning,
        rng: &mut StdRng,
        ticks: u32,
    ) -> Vec<GhostEvent> {
        let view = PursuitView::default();
        (0..ticks).filter_map(|_| ghost.update(g, &view, t, rng)).collect()
    }

    #[test]
    fn profiles_follow_map_size() {
        let p = Personality::MirrorPursuer.profile(20, 18);
        assert_eq!(p.scatter_corner, Cell::new(18, 16));
        assert_eq!(p.scatter_secs, 5);
        assert_eq!(Personality::DirectPursuer.profile(20, 18).scatter_corner, Cell::new(18, 1));
        assert_eq!(Personality::Opportunist.profile(20, 18).scatter_corner, Cell::new(1, 16));
    }

    #[test]
    fn starts_in_scatter_with_walkable_heading() {
        let (gh, g, _) = ghost(Personality::Ambusher, Cell::new(4, 4));
        assert_eq!(gh.state, GhostState::Scatter);
        assert!(g.can_step(gh.cell(), gh.dir, Mover::Ghost));
    }

    #[test]
    fn scatter_chase_alternation_is_periodic() {
        let (mut gh, g, mut rng) = ghost(Personality::DirectPursuer, Cell::new(4, 3));
        let t = GhostTuning::default();
        let view = PursuitView::default();
        for _ in 0..419 {
            assert_eq!(gh.update(&g, &view, &t, &mut rng), None);
        }
        assert_eq!(gh.state, GhostState::Scatter);
        assert_eq!(
            gh.update(&g, &view, &t, &mut rng),
            Some(GhostEvent::ModeSwitched(GhostState::Chase))
        );
        let events = run(&mut gh, &g, &t, &mut rng, 1200);
        assert_eq!(events, vec![GhostEvent::ModeSwitched(GhostState::Scatter)]);
        assert_eq!(gh.state, GhostState::Scatter);
    }

    #[test]
    fn frightened_expires_into_chase_and_restores_body() {
        let (mut gh, g, mut rng) = ghost(Personality::Opportunist, Cell::new(4, 3));
        let t = GhostTuning::default();
        assert!(gh.frighten(t.frightened_ticks, &mut rng));
        assert_eq!(gh.appearance(), Appearance::Frightened);
        assert!((gh.speed(&t) - 0.45).abs() < 1e-6);

        let events = run(&mut gh, &g, &t, &mut rng, t.frightened_ticks);
        assert_eq!(events, vec![GhostEvent::FrightEnded]);
        assert_eq!(gh.state, GhostState::Chase);
        assert_eq!(gh.appearance(), Appearance::Body(Personality::Opportunist));
    }

    #[test]
    fn only_eyes_ignore_energizers() {
        let (mut gh, g, mut rng) = ghost(Personality::Ambusher, Cell::new(4, 4));
        let t = GhostTuning::default();
        gh.frighten(t.frightened_ticks, &mut rng);
        gh.eat();
        assert!(!gh.frighten(t.frightened_ticks, &mut rng));
        assert_eq!(gh.state, GhostState::Eaten);

        gh.state = GhostState::Respawning;
        gh.respawn_timer = 100;
        assert!(gh.frighten(t.frightened_ticks, &mut rng));
        assert_eq!(gh.state, GhostState::Frightened);
        assert_eq!(gh.respawn_timer, 0);
        assert_eq!(gh.appearance(), Appearance::Frightened);

        // Counts down as frightened, never finishing the respawn.
        let events = run(&mut gh, &g, &t, &mut rng, t.frightened_ticks);
        assert_eq!(events, vec![GhostEvent::FrightEnded]);
        assert_eq!(gh.state, GhostState::Chase);
    }

    #[test]
    fn eyes_fly_through_walls_then_respawn() {
        let (mut gh, g, mut rng) = ghost(Personality::MirrorPursuer, Cell::new(4, 4));
        let t = GhostTuning::default();
        // Caught in the top-left corner; a straight line home crosses walls.
        gh.pos = Position::at_cell(Cell::new(1, 1));
        gh.frighten(t.frightened_ticks, &mut rng);
        gh.eat();
        assert_eq!(gh.appearance(), Appearance::Eyes);
        assert_eq!(gh.speed(&t), 2.0);

        let view = PursuitView::default();
        let mut reached = None;
        for _ in 0..60 {
            if let Some(e) = gh.update(&g, &view, &t, &mut rng) {
                reached = Some(e);
                break;
            }
        }
        assert_eq!(reached, Some(GhostEvent::ReachedHome));
        assert_eq!(gh.state, GhostState::Respawning);
        assert_eq!(gh.pos, Position::at_cell(Cell::new(4, 4)));
        assert_eq!(gh.appearance(), Appearance::Fading);
        assert_eq!(gh.respawn_progress(&t), 0.0);

        let events = run(&mut gh, &g, &t, &mut rng, t.respawn_ticks - 1);
        assert!(events.is_empty());
        assert_eq!(gh.update(&g, &view, &t, &mut rng), Some(GhostEvent::Respawned));
        assert_eq!(gh.state, GhostState::Scatter);
        assert_eq!(gh.pos, Position::at_cell(Cell::new(4, 4)));
        assert_eq!(gh.respawn_progress(&t), 1.0);
    }

    #[test]
    fn portal_wraps_and_blocks_immediate_return() {
        let (mut gh, g, mut rng) = ghost(Personality::DirectPursuer, Cell::new(1, 3));
        let t = GhostTuning::default();
        gh.pos = Position::at_cell(Cell::new(0, 3));
        gh.dir = Direction::Left;
        gh.last_decision = Some(Cell::new(0, 3));
        let view = PursuitView::default();
        gh.update(&g, &view, &t, &mut rng);
        assert_eq!(gh.cell(), Cell::new(7, 3));
        assert_eq!(gh.last_portal, Some(PortalSide::Right));
        assert_eq!(gh.portal_cooldown, t.portal_cooldown);

        // Standing on the right portal clears the block without wrapping.
        gh.pos = Position::at_cell(Cell::new(8, 3));
        gh.dir = Direction::Right;
        gh.portal_cooldown = 0;
        gh.update(&g, &view, &t, &mut rng);
        assert_eq!(gh.last_portal, None);
        assert_eq!(gh.cell(), Cell::new(8, 3));
    }

    #[test]
    fn fastest_ghost_wraps_instead_of_leaving_the_map() {
        let g = field();
        let t = GhostTuning { base_speed: MAX_STEP, ..GhostTuning::default() };
        let view = PursuitView { player_cell: Cell::new(20, 3), ..PursuitView::default() };
        for seed in 0..5 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut gh = Ghost::new(0, Personality::DirectPursuer, Cell::new(4, 3), &g, &mut rng);
            gh.state = GhostState::Chase;
            gh.pos = Position::at_cell(Cell::new(7, 3));
            gh.dir = Direction::Right;
            gh.last_portal = Some(PortalSide::Right);
            assert!(gh.speed(&t) <= MAX_STEP);
            for _ in 0..120 {
                gh.update(&g, &view, &t, &mut rng);
                assert!(g.admits(gh.cell(), Mover::Ghost), "seed {seed}: ghost at {:?}", gh.cell());
            }
        }
    }

    #[test]
    fn only_decides_once_per_cell() {
        let (mut gh, g, mut rng) = ghost(Personality::DirectPursuer, Cell::new(4, 3));
        let t = GhostTuning { base_speed: 0.5, ..GhostTuning::default() };
        let view = PursuitView::default();
        gh.update(&g, &view, &t, &mut rng);
        let first = gh.last_decision;
        assert_eq!(first, Some(Cell::new(4, 3)));
        let heading = gh.dir;
        // Still centered on the same cell next tick: heading is kept.
        gh.update(&g, &view, &t, &mut rng);
        assert_eq!(gh.dir, heading);
    }
}
