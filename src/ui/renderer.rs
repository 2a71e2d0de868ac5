/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame into the `front` buffer from a `Snapshot`
///   2. Compare each glyph with the `back` buffer (previous frame)
///   3. Emit terminal commands only for glyphs that changed
///   4. Batch everything with `queue!`, flush once
///   5. Swap front/back
///
/// Each maze cell is two terminal columns wide. Agents are placed from
/// their pixel positions at half-cell horizontal resolution, so movement
/// between cells reads smoothly.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{BonusKind, Cell, Direction, Position, TILE_SIZE};
use crate::domain::ghost::{Appearance, Personality};
use crate::domain::tile::Tile;
use crate::sim::menu::MenuItem;
use crate::sim::snapshot::{GhostView, PlayerView, Snapshot};
use crate::sim::world::Phase;

// ── Glyph: the unit of the frame buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Glyph {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Glyph {
    /// Explicit background for every cell so inter-row gaps match.
    const BASE_BG: Color = Color::Rgb { r: 10, g: 10, b: 20 };

    const BLANK: Glyph = Glyph { ch: ' ', fg: Color::White, bg: Glyph::BASE_BG };

    /// Never equal to a real glyph; forces a full repaint.
    const INVALID: Glyph = Glyph { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color) -> Self {
        Glyph { ch, fg, bg: Glyph::BASE_BG }
    }
}

// ── FrameBuffer ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Glyph>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Glyph::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            *self = FrameBuffer::new(w, h);
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Glyph::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, g: Glyph) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = g;
        }
    }

    fn get(&self, x: usize, y: usize) -> Glyph {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Glyph::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i, y, Glyph::new(ch, fg));
        }
    }

    /// Two-column sprite.
    fn put_pair(&mut self, x: usize, y: usize, pair: [char; 2], fg: Color) {
        self.set(x, y, Glyph::new(pair[0], fg));
        self.set(x + 1, y, Glyph::new(pair[1], fg));
    }
}

// ── Layout ──

const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const WALL: Color = Color::Rgb { r: 40, g: 60, b: 220 };
const PEN: Color = Color::Rgb { r: 60, g: 40, b: 80 };
const PORTAL: Color = Color::Rgb { r: 180, g: 80, b: 220 };
const PELLET: Color = Color::Rgb { r: 250, g: 200, b: 160 };
const PLAYER: Color = Color::Rgb { r: 255, g: 230, b: 0 };
const FRIGHTENED: Color = Color::Rgb { r: 40, g: 80, b: 255 };
const ACCENT: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const DIM: Color = Color::DarkGrey;

/// Terminal column of a pixel x coordinate, relative to the map origin.
fn screen_col(px: f32) -> usize {
    ((px / TILE_SIZE) * CELL_W as f32).round().max(0.0) as usize
}

fn screen_row(py: f32) -> usize {
    (py / TILE_SIZE).round().max(0.0) as usize
}

fn player_glyph(p: &PlayerView) -> [char; 2] {
    if !p.alive {
        return match p.death_progress {
            x if x < 0.34 => ['◉', ' '],
            x if x < 0.67 => ['○', ' '],
            _ => ['·', ' '],
        };
    }
    match p.dir {
        Direction::Right => ['ᗧ', ' '],
        Direction::Left => [' ', 'ᗤ'],
        Direction::Up => ['ᗢ', ' '],
        Direction::Down => ['ᗣ', ' '],
        Direction::None => ['●', ' '],
    }
}

fn personality_color(p: Personality) -> Color {
    match p {
        Personality::DirectPursuer => Color::Rgb { r: 255, g: 40, b: 40 },
        Personality::Ambusher => Color::Rgb { r: 255, g: 150, b: 220 },
        Personality::MirrorPursuer => Color::Rgb { r: 60, g: 230, b: 255 },
        Personality::Opportunist => Color::Rgb { r: 255, g: 170, b: 60 },
    }
}

/// Sprite and colour for a ghost, or `None` on an invisible blink frame.
fn ghost_sprite(g: &GhostView, tick: u64) -> Option<([char; 2], Color)> {
    match g.appearance {
        Appearance::Body(p) => Some((['ᗣ', 'ᗣ'], personality_color(p))),
        Appearance::Frightened => Some((['ᗣ', 'ᗣ'], FRIGHTENED)),
        Appearance::Eyes => Some((['°', '°'], Color::White)),
        Appearance::Fading => {
            // Blinks faster as it fades in.
            let period = if g.fade < 0.5 { 16 } else { 8 };
            (tick / period % 2 == 0).then_some((['ᗣ', 'ᗣ'], DIM))
        }
    }
}

fn hud_line(s: &Snapshot) -> String {
    let mut hud = format!(
        " Score: {:<6} Record: {:<6} Lives: {}  {}",
        s.score,
        s.high_score,
        s.lives,
        s.difficulty.label()
    );
    if s.immunity_secs > 0 {
        hud.push_str(&format!("  Immune: {}s", s.immunity_secs));
    }
    hud
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Glyph::BASE_BG),
            Clear(ClearType::All)
        )?;
        self.sync_size()?;
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, snap: &Snapshot) -> io::Result<()> {
        self.sync_size()?;

        if self.last_phase != Some(snap.phase) {
            self.invalidate()?;
            self.last_phase = Some(snap.phase);
        }

        self.front.clear();
        match snap.phase {
            Phase::Menu => self.compose_menu(snap),
            Phase::Playing => self.compose_board(snap),
            Phase::Win => {
                self.compose_board(snap);
                self.compose_banner(snap, "BOARD CLEARED", ACCENT, "ENTER: Next board   ESC: Menu");
            }
            Phase::GameOver => {
                self.compose_board(snap);
                self.compose_banner(snap, "GAME OVER", Color::Rgb { r: 255, g: 60, b: 60 }, "ENTER: New game   ESC: Menu");
            }
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn sync_size(&mut self) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.invalidate()?;
        }
        Ok(())
    }

    fn invalidate(&mut self) -> io::Result<()> {
        self.back.cells.fill(Glyph::INVALID);
        queue!(self.writer, SetBackgroundColor(Glyph::BASE_BG), Clear(ClearType::All))
    }

    // ── Diff flush ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Glyph::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let g = self.front.get(x, y);
                if g == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if g.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(g.fg))?;
                    last_fg = g.fg;
                }
                if g.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(g.bg))?;
                    last_bg = g.bg;
                }
                queue!(self.writer, Print(g.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose ──

    fn compose_menu(&mut self, s: &Snapshot) {
        let title = [
            r" __  __               ___ _                  ",
            r"|  \/  |__ _ ______  / __| |_  __ _ ___ ___ ",
            r"| |\/| / _` |_ / -_)| (__| ' \/ _` (_-</ -_)",
            r"|_|  |_\__,_/__\___| \___|_||_\__,_/__/\___|",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(4, 2 + i, line, PLAYER);
        }

        let base = 9;
        for (i, item) in MenuItem::ALL.iter().enumerate() {
            let selected = s.menu.selected == i;
            let label = match item {
                MenuItem::Difficulty => format!("{}: ◀ {} ▶", item.label(), s.menu.difficulty.label()),
                other => other.label().to_string(),
            };
            let (marker, color) = if selected { ("▸ ", ACCENT) } else { ("  ", Color::White) };
            self.front.put_str(10, base + i * 2, &format!("{marker}{label}"), color);
        }

        self.front.put_str(10, base + 8, &format!("Record: {}", s.high_score), DIM);
        let help = [
            "↑↓ / WS   Select        ←→ / AD  Difficulty",
            "ENTER     Confirm       ESC      Back",
            "Ctrl+C    Quit",
        ];
        for (i, line) in help.iter().enumerate() {
            self.front.put_str(6, base + 10 + i, line, DIM);
        }
    }

    fn compose_board(&mut self, s: &Snapshot) {
        let hud_bg_width = self.front.width;
        for x in 0..hud_bg_width {
            self.front.set(x, HUD_ROW, Glyph { ch: ' ', fg: Color::White, bg: Color::Rgb { r: 20, g: 20, b: 60 } });
        }
        for (i, ch) in hud_line(s).chars().enumerate() {
            self.front.set(i, HUD_ROW, Glyph { ch, fg: Color::White, bg: Color::Rgb { r: 20, g: 20, b: 60 } });
        }

        let grid = s.grid;
        for gy in 0..grid.height() {
            for gx in 0..grid.width() {
                let cell = Cell::new(gx as i32, gy as i32);
                let (col, row) = (gx * CELL_W, MAP_ROW + gy);
                self.compose_tile(s, cell, col, row);
            }
        }

        for g in &s.ghosts {
            if let Some((pair, color)) = ghost_sprite(g, s.tick) {
                self.put_agent(g.pos, pair, color);
            }
        }

        let p = &s.player;
        let blink_off = p.alive && p.invulnerable > 0 && (s.tick / 8) % 2 == 1;
        let color = if blink_off { DIM } else { PLAYER };
        self.put_agent(p.pos, player_glyph(p), color);

        let help_row = MAP_ROW + grid.height() + 1;
        self.front.put_str(0, help_row, " ←→↑↓/WASD: Move   ESC: Menu   Ctrl+C: Quit", DIM);
    }

    fn compose_tile(&mut self, s: &Snapshot, cell: Cell, col: usize, row: usize) {
        let (pair, color) = match s.grid.tile_at(cell) {
            Tile::Wall => (['█', '█'], WALL),
            Tile::Pen => (['░', '░'], PEN),
            Tile::Portal => (['⇆', ' '], PORTAL),
            Tile::Open => {
                if let Some(b) = s.bonus_at(cell) {
                    match (b.kind, b.lit) {
                        (BonusKind::Energizer, _) => (['●', ' '], PELLET),
                        (BonusKind::Score, true) => (['◆', ' '], ACCENT),
                        (BonusKind::Score, false) => ([' ', ' '], PELLET),
                    }
                } else if s.pellet_at(cell) {
                    (['·', ' '], PELLET)
                } else {
                    ([' ', ' '], PELLET)
                }
            }
        };
        self.front.put_pair(col, row, pair, color);
    }

    fn put_agent(&mut self, pos: Position, pair: [char; 2], color: Color) {
        self.front.put_pair(screen_col(pos.px), MAP_ROW + screen_row(pos.py), pair, color);
    }

    fn compose_banner(&mut self, s: &Snapshot, title: &str, color: Color, hint: &str) {
        let width = s.grid.width() * CELL_W;
        let box_w = 34;
        let x = width.saturating_sub(box_w) / 2;
        let y = MAP_ROW + (s.grid.height() / 2).saturating_sub(2);
        let bar: String = "═".repeat(box_w - 2);
        let score = format!("Score: {}", s.score);

        self.front.put_str(x, y, &format!("╔{bar}╗"), color);
        for r in 1..4 {
            self.front.put_str(x, y + r, &format!("║{}║", " ".repeat(box_w - 2)), color);
        }
        self.front.put_str(x, y + 4, &format!("╚{bar}╝"), color);

        let center = |text: &str| x + (box_w.saturating_sub(text.chars().count())) / 2;
        self.front.put_str(center(title), y + 1, title, color);
        self.front.put_str(center(&score), y + 2, &score, Color::White);
        self.front.put_str(center(hint), y + 3, hint, DIM);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::sim::level;

    #[test]
    fn pixel_positions_map_to_half_cells() {
        assert_eq!(screen_col(0.0), 0);
        assert_eq!(screen_col(TILE_SIZE), 2);
        assert_eq!(screen_col(TILE_SIZE * 1.5), 3);
        assert_eq!(screen_col(-1.5), 0);
        assert_eq!(screen_row(TILE_SIZE * 3.4), 3);
    }

    #[test]
    fn hud_shows_immunity_only_while_it_lasts() {
        let cfg = GameConfig::default();
        let mut world = level::default_world(&cfg, 1).unwrap();
        world.score = 120;
        let line = hud_line(&Snapshot::of(&world));
        assert!(line.contains("Score: 120"));
        assert!(line.contains("Immune: 4s"));

        world.player.invulnerable = 0;
        assert!(!hud_line(&Snapshot::of(&world)).contains("Immune"));
    }

    #[test]
    fn dying_player_shrinks() {
        let mut p = PlayerView {
            pos: Position::default(),
            dir: Direction::Left,
            alive: true,
            death_progress: 0.0,
            invulnerable: 0,
        };
        assert_eq!(player_glyph(&p), [' ', 'ᗤ']);
        p.alive = false;
        p.death_progress = 0.9;
        assert_eq!(player_glyph(&p), ['·', ' ']);
    }
}
