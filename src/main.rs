/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use clap::Parser;
use log::{info, warn};

use config::GameConfig;
use domain::entity::Direction;
use sim::event::GameEvent;
use sim::highscore::{self, FileStore, HighScoreStore, MemoryStore};
use sim::level::{self, SessionAction};
use sim::menu::Command;
use sim::snapshot::Snapshot;
use sim::step::{self, FrameInput};
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::{cues_for, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const LOG_FILE: &str = "mazechase.log";

/// Terminal maze chase: clear every pellet while four ghosts hunt you.
#[derive(Parser, Debug)]
#[command(name = "mazechase", version, about)]
struct Args {
    /// Seed for every random draw of the session (default: clock)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Starting difficulty: 1 easy, 2 medium, 3 hard
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=3))]
    difficulty: Option<u8>,

    /// Map file replacing the built-in maze
    #[arg(short, long)]
    map: Option<PathBuf>,

    /// Keep the high score in memory only
    #[arg(long)]
    no_save: bool,
}

fn main() {
    let args = Args::parse();
    init_logging();

    let mut config = GameConfig::load();
    if let Some(d) = args.difficulty {
        config.difficulty = d;
    }
    let seed = args.seed.unwrap_or_else(clock_seed);
    info!("seed {seed}, difficulty {}", config.difficulty);

    let store: Box<dyn HighScoreStore> = if args.no_save {
        Box::new(MemoryStore::default())
    } else {
        Box::new(FileStore::in_data_dir())
    };

    let mut world = match level::build_world(&config, args.map.as_deref(), seed) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Cannot build the maze: {e}");
            return;
        }
    };
    world.high_score = store.load();

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();
    if sound.is_none() {
        warn!("no audio output, playing silently");
    }

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), store.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing mazechase!");
    println!("Score: {}   Record: {}", world.score, world.high_score);
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    store: &dyn HighScoreStore,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new(&config.gamepad);
    let tick_rate = Duration::from_secs_f64(1.0 / config.timing.ticks_per_second.max(1) as f64);
    let mut last_tick = Instant::now();
    let mut pending_turn: Option<Direction> = None;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            info!("quit by Ctrl+C");
            break;
        }

        if world.phase == Phase::Playing {
            if let Some(dir) = kb.turn().or_else(|| gp.turn()) {
                pending_turn = Some(dir);
            }
        }

        if handle_commands(world, &kb, &gp, store, config) == SessionAction::Quit {
            info!("quit from menu");
            break;
        }
        if world.phase != Phase::Playing {
            pending_turn = None;
        }

        if last_tick.elapsed() >= tick_rate {
            let events = step::step(world, FrameInput { turn: pending_turn.take() });
            process_events(sound, store, &events);
            last_tick = Instant::now();
        }

        renderer.render(&Snapshot::of(world))?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// While playing, direction keys steer the player and only Back reaches
/// the session; everywhere else every command does.
fn handle_commands(
    world: &mut WorldState,
    kb: &InputState,
    gp: &GamepadState,
    store: &dyn HighScoreStore,
    config: &GameConfig,
) -> SessionAction {
    for cmd in kb.commands().into_iter().chain(gp.commands()) {
        if world.phase == Phase::Playing && cmd != Command::Back {
            continue;
        }
        if level::handle_command(world, cmd, config, store) == SessionAction::Quit {
            return SessionAction::Quit;
        }
    }
    SessionAction::Continue
}

fn process_events(sound: Option<&SoundEngine>, store: &dyn HighScoreStore, events: &[GameEvent]) {
    for event in events {
        if let GameEvent::NewHighScore { score } = event {
            store.save(*score);
        }
    }
    if let Some(sfx) = sound {
        for cue in cues_for(events) {
            sfx.play(cue);
        }
    }
}

/// Log to `mazechase.log` in the data directory; the terminal is in raw
/// mode, so stderr is only a fallback.
fn init_logging() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    let path = highscore::data_dir().join(LOG_FILE);
    match File::create(&path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(_) => {
            builder.target(env_logger::Target::Stderr);
            builder.filter_level(log::LevelFilter::Warn);
        }
    }
    builder.init();
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
