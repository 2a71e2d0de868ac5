/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Input intake (buffered turn)
///   2. Pursuit view snapshot (positions before anyone moves)
///   3. Player movement / death sequence
///   4. Ghost movement and state machines
///   5. Bonus blink timers
///   6. Ghost contact (eat / die)
///   7. Pellet and bonus pickup
///   8. Win check
///
/// Steps 6 and 7 are skipped while the player is dying.
/// The resolver is the only writer of score, lives and ghost-eaten
/// transitions.

use log::{debug, info};

use crate::domain::ai::PursuitView;
use crate::domain::entity::Direction;
use crate::domain::ghost::{GhostEvent, GhostState, Personality};
use crate::domain::player::PlayerTick;
use crate::domain::rules::{self, GHOST_REWARD, PELLET_REWARD};
use super::event::GameEvent;
use super::world::{Phase, WorldState};

/// Per-tick input from the input layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub turn: Option<Direction>,
}

impl FrameInput {
    pub fn turn(dir: Direction) -> Self {
        FrameInput { turn: Some(dir) }
    }
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput) -> Vec<GameEvent> {
    if world.phase != Phase::Playing {
        return vec![];
    }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;

    if let Some(dir) = input.turn {
        world.player.turn(dir);
    }

    let view = pursuit_view(world);
    resolve_player(world, &mut events);
    resolve_ghosts(world, &view, &mut events);
    resolve_bonus_blink(world);

    if world.player.alive && resolve_ghost_contact(world, &mut events) {
        return events;
    }
    if world.player.alive {
        resolve_pellets(world, &mut events);
        resolve_bonuses(world, &mut events);
    }

    resolve_win(world, &mut events);
    events
}

/// Where the player and the direct pursuer stand right now.
pub fn pursuit_view(world: &WorldState) -> PursuitView {
    let direct_pursuer = world
        .ghosts
        .iter()
        .find(|g| g.personality == Personality::DirectPursuer && !g.state.is_eaten_cycle())
        .map(|g| g.cell());
    PursuitView {
        player_cell: world.player.cell(),
        player_dir: world.player.dir,
        direct_pursuer,
    }
}

// ══════════════════════════════════════════════════════════════
// Agents
// ══════════════════════════════════════════════════════════════

fn resolve_player(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.player.update(&world.grid, &world.tuning.player) == PlayerTick::Respawned {
        debug!("player respawned at {:?}", world.player.spawn);
        events.push(GameEvent::PlayerRespawned);
    }
}

fn resolve_ghosts(world: &mut WorldState, view: &PursuitView, events: &mut Vec<GameEvent>) {
    let WorldState { grid, ghosts, tuning, rng, .. } = world;
    for g in ghosts.iter_mut() {
        match g.update(grid, view, &tuning.ghost, &mut *rng) {
            Some(GhostEvent::ReachedHome) => events.push(GameEvent::GhostHome { id: g.id }),
            Some(GhostEvent::Respawned) => events.push(GameEvent::GhostRespawned { id: g.id }),
            Some(GhostEvent::ModeSwitched(state)) => {
                debug!("ghost {} ({}) -> {:?}", g.id, g.personality.name(), state);
            }
            Some(GhostEvent::FrightEnded) | None => {}
        }
    }
}

fn resolve_bonus_blink(world: &mut WorldState) {
    for b in world.bonuses.iter_mut().filter(|b| b.active && !b.is_energizer()) {
        b.blink_timer = b.blink_timer.wrapping_add(1);
    }
}

// ══════════════════════════════════════════════════════════════
// Collision
// ══════════════════════════════════════════════════════════════

/// Returns true when the game ended.
fn resolve_ghost_contact(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    let player_pos = world.player.pos;

    for i in 0..world.ghosts.len() {
        let g = &mut world.ghosts[i];
        if !rules::bodies_touch(player_pos, g.pos) {
            continue;
        }

        if g.state == GhostState::Frightened {
            g.eat();
            world.score += GHOST_REWARD;
            debug!("ghost {} eaten", g.id);
            events.push(GameEvent::GhostEaten { id: g.id });
        } else if !g.state.is_eaten_cycle() && !world.player.is_invulnerable() {
            world.lives = world.lives.saturating_sub(1);
            world.player.kill();
            info!("caught by ghost {}, {} lives left", g.id, world.lives);
            events.push(GameEvent::PlayerDied { lives_left: world.lives });

            if world.lives == 0 {
                world.phase = Phase::GameOver;
                info!("game over, score {}", world.score);
                events.push(GameEvent::GameOver { score: world.score });
                record_high_score(world, events);
                return true;
            }
            return false;
        }
    }
    false
}

// ══════════════════════════════════════════════════════════════
// Pickups
// ══════════════════════════════════════════════════════════════

fn resolve_pellets(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let player_pos = world.player.pos;
    let before = world.pellets.len();
    world.pellets.retain(|p| {
        if rules::touches_pellet(player_pos, p.cell) {
            events.push(GameEvent::PelletEaten { cell: p.cell });
            false
        } else {
            true
        }
    });
    world.score += (before - world.pellets.len()) as u32 * PELLET_REWARD;
}

fn resolve_bonuses(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let player_pos = world.player.pos;
    let frightened_ticks = world.tuning.ghost.frightened_ticks;

    for i in 0..world.bonuses.len() {
        if !rules::reaches_bonus(player_pos, &world.bonuses[i]) {
            continue;
        }
        let bonus = &mut world.bonuses[i];
        bonus.active = false;
        let (cell, kind) = (bonus.cell, bonus.kind);
        world.score += rules::bonus_reward(kind);

        if bonus.is_energizer() {
            let rng = &mut world.rng;
            let frightened = world
                .ghosts
                .iter_mut()
                .map(|g| g.frighten(frightened_ticks, &mut *rng))
                .filter(|&scared| scared)
                .count();
            debug!("energizer at {cell:?} frightened {frightened} ghosts");
            events.push(GameEvent::EnergizerEaten { cell, frightened });
        } else {
            events.push(GameEvent::BonusEaten { cell });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Win / high score
// ══════════════════════════════════════════════════════════════

fn resolve_win(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.phase != Phase::Playing {
        return;
    }
    if world.pellets.is_empty() && !world.any_bonus_active() {
        world.phase = Phase::Win;
        info!("board cleared, score {}", world.score);
        events.push(GameEvent::LevelWon { score: world.score });
        record_high_score(world, events);
    }
}

fn record_high_score(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.score > world.high_score {
        world.high_score = world.score;
        events.push(GameEvent::NewHighScore { score: world.score });
    }
}
