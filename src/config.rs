/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the current
/// directory or `~/.local/share/mazechase`, first match wins.
/// Missing file, missing keys or a broken file all fall back to defaults.
///
/// ```toml
/// [game]
/// difficulty = 1          # 1 easy, 2 medium, 3 hard
/// lives = 3
/// map_file = "maze.txt"   # optional, replaces the built-in maze
///
/// [timing]
/// ticks_per_second = 60
/// frightened_secs = 5
/// ghost_respawn_secs = 3
///
/// [speed]
/// player = 1.5
/// easy = 0.6
/// ```

use log::{info, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::motion::MAX_STEP;

// ── Public Config Struct ──

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    /// Menu difficulty preset on startup, 1..=3.
    pub difficulty: u8,
    pub lives: u32,
    pub map_file: Option<PathBuf>,
    pub timing: TimingConfig,
    pub speed: SpeedConfig,
    pub gamepad: GamepadConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimingConfig {
    pub ticks_per_second: u32,
    pub frightened_secs: u32,
    pub ghost_respawn_secs: u32,
    pub initial_invulnerability: u32, // ticks, new game
    pub respawn_invulnerability: u32, // ticks, after a death
    pub death_frames: u32,
    pub death_step: u32,
    pub player_portal_cooldown: u32,
    pub ghost_portal_cooldown: u32,
}

/// Pixels per tick.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeedConfig {
    pub player: f32,
    pub easy: f32,
    pub medium: f32,
    pub hard: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    game: TomlGame,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlGame {
    #[serde(default = "default_difficulty")]
    difficulty: u8,
    #[serde(default = "default_lives")]
    lives: u32,
    #[serde(default)]
    map_file: Option<String>,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tps")]
    ticks_per_second: u32,
    #[serde(default = "default_frightened")]
    frightened_secs: u32,
    #[serde(default = "default_ghost_respawn")]
    ghost_respawn_secs: u32,
    #[serde(default = "default_initial_invuln")]
    initial_invulnerability: u32,
    #[serde(default = "default_respawn_invuln")]
    respawn_invulnerability: u32,
    #[serde(default = "default_death_frames")]
    death_frames: u32,
    #[serde(default = "default_death_step")]
    death_step: u32,
    #[serde(default = "default_player_portal")]
    player_portal_cooldown: u32,
    #[serde(default = "default_ghost_portal")]
    ghost_portal_cooldown: u32,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_player_speed")]
    player: f32,
    #[serde(default = "default_easy")]
    easy: f32,
    #[serde(default = "default_medium")]
    medium: f32,
    #[serde(default = "default_hard")]
    hard: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

// ── Defaults ──

fn default_difficulty() -> u8 { 1 }
fn default_lives() -> u32 { 3 }

fn default_tps() -> u32 { 60 }
fn default_frightened() -> u32 { 5 }
fn default_ghost_respawn() -> u32 { 3 }
fn default_initial_invuln() -> u32 { 180 }
fn default_respawn_invuln() -> u32 { 120 }
fn default_death_frames() -> u32 { 60 }
fn default_death_step() -> u32 { 2 }   // ~half a second of shrinking
fn default_player_portal() -> u32 { 10 }
fn default_ghost_portal() -> u32 { 15 }

fn default_player_speed() -> f32 { 1.5 }
fn default_easy() -> f32 { 0.6 }
fn default_medium() -> f32 { 1.0 }
fn default_hard() -> f32 { 1.4 }

fn default_confirm() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into(), "B".into()] }

impl Default for TomlGame {
    fn default() -> Self {
        TomlGame {
            difficulty: default_difficulty(),
            lives: default_lives(),
            map_file: None,
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            ticks_per_second: default_tps(),
            frightened_secs: default_frightened(),
            ghost_respawn_secs: default_ghost_respawn(),
            initial_invulnerability: default_initial_invuln(),
            respawn_invulnerability: default_respawn_invuln(),
            death_frames: default_death_frames(),
            death_step: default_death_step(),
            player_portal_cooldown: default_player_portal(),
            ghost_portal_cooldown: default_ghost_portal(),
        }
    }
}

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            player: default_player_speed(),
            easy: default_easy(),
            medium: default_medium(),
            hard: default_hard(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

// ── Conversion ──

/// Speeds must stay positive and below the centering window, otherwise an
/// agent can skip over a cell centre. Ghost personality factors are capped
/// again per ghost.
const MAX_SPEED: f32 = MAX_STEP;
const MIN_SPEED: f32 = 0.05;

fn clamp_speed(name: &str, v: f32, fallback: f32) -> f32 {
    if !v.is_finite() {
        warn!("speed.{name} is not a number, using {fallback}");
        return fallback;
    }
    let clamped = v.clamp(MIN_SPEED, MAX_SPEED);
    if clamped != v {
        warn!("speed.{name} = {v} out of range, clamped to {clamped}");
    }
    clamped
}

impl From<TomlConfig> for GameConfig {
    fn from(t: TomlConfig) -> Self {
        GameConfig {
            difficulty: t.game.difficulty.clamp(1, 3),
            lives: t.game.lives.max(1),
            map_file: t.game.map_file.filter(|s| !s.trim().is_empty()).map(PathBuf::from),
            timing: TimingConfig {
                ticks_per_second: t.timing.ticks_per_second.max(1),
                frightened_secs: t.timing.frightened_secs,
                ghost_respawn_secs: t.timing.ghost_respawn_secs,
                initial_invulnerability: t.timing.initial_invulnerability,
                respawn_invulnerability: t.timing.respawn_invulnerability,
                death_frames: t.timing.death_frames,
                death_step: t.timing.death_step.max(1),
                player_portal_cooldown: t.timing.player_portal_cooldown,
                ghost_portal_cooldown: t.timing.ghost_portal_cooldown,
            },
            speed: SpeedConfig {
                player: clamp_speed("player", t.speed.player, default_player_speed()),
                easy: clamp_speed("easy", t.speed.easy, default_easy()),
                medium: clamp_speed("medium", t.speed.medium, default_medium()),
                hard: clamp_speed("hard", t.speed.hard, default_hard()),
            },
            gamepad: GamepadConfig {
                confirm: t.gamepad.confirm,
                cancel: t.gamepad.cancel,
            },
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from(TomlConfig::default())
    }
}

// ── Loading ──

impl GameConfig {
    /// Parse config text. Absent sections and keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TomlConfig>(text).map(GameConfig::from)
    }

    /// Load config from the first `config.toml` found.
    /// A relative `map_file` resolves against the directory the config came from.
    pub fn load() -> Self {
        for dir in candidate_dirs() {
            let path = dir.join("config.toml");
            if !path.exists() {
                continue;
            }
            return match Self::load_file(&path) {
                Some(mut cfg) => {
                    info!("config loaded from {}", path.display());
                    if let Some(map) = cfg.map_file.take() {
                        cfg.map_file = Some(if map.is_absolute() { map } else { dir.join(map) });
                    }
                    cfg
                }
                None => GameConfig::default(),
            };
        }
        info!("no config.toml found, using defaults");
        GameConfig::default()
    }

    fn load_file(path: &Path) -> Option<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                warn!("could not read {}: {e}", path.display());
                return None;
            }
        };
        match Self::from_toml_str(&text) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                warn!("config.toml parse error: {e}; using default settings");
                None
            }
        }
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data home (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/mazechase)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/mazechase");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}
