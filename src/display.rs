//! Terminal rendering and input backends for the game loop.
//!
//! All terminal I/O lives here. [`TermFrontend`] rasterizes the scene into
//! a glyph buffer (raycast wall columns, billboard sprites with per-type
//! transparency), overlays the active popup, and draws the status line and
//! the health/reload meters. [`TermInput`] is the non-blocking poll-one-key
//! input source.

use std::io::Write;
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    style::{self, Attribute, Color, Print, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal, QueueableCommand,
};
use glam::Vec2;

use crate::level::{Frontend, Hud, InputSource, Key, Popup, Scene};
use crate::map::{Map, Walls};

/// Horizontal field of view in radians.
const FOV: f32 = 1.2;
/// Rays stop after this many cells.
const MAX_DIST: f32 = 24.0;
/// Wall shading, nearest first.
const SHADES: [char; 5] = ['█', '▓', '▒', '░', ' '];
const FLOOR: char = '.';

const C_HEALTH: Color = Color::Green;
const C_RELOAD: Color = Color::Red;

const DEAD_MSG: [&str; 2] = ["You died.", "Press Y to return to the menu."];
const PAUSE_MSG: [&str; 2] = ["Game paused.", "Press P to resume."];
const QUIT_MSG: [&str; 2] = [
    "Are you sure you want to quit?",
    "Press Y to confirm or N to cancel.",
];

// ── Frontend ──────────────────────────────────────────────────────────────────

pub struct TermFrontend<W: Write> {
    out: W,
}

impl<W: Write> TermFrontend<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Frontend for TermFrontend<W> {
    fn viewport(&self) -> (u16, u16) {
        terminal::size().unwrap_or((80, 24))
    }

    fn present(&mut self, scene: &Scene) -> std::io::Result<()> {
        render(&mut self.out, scene)
    }

    fn alert(&mut self) {
        // Terminal bell.
        let _ = self.out.queue(Print('\x07'));
    }
}

/// Render one complete frame.
fn render<W: Write>(out: &mut W, scene: &Scene) -> std::io::Result<()> {
    let (w, h) = terminal::size().unwrap_or((80, 24));
    if w == 0 || h < 2 {
        return Ok(());
    }
    // Bottom row is reserved for the meters.
    let view_w = w as usize;
    let view_h = (h - 1) as usize;

    let mut buf = vec![vec![' '; view_w]; view_h];
    let mut depth = vec![f32::MAX; view_w];
    draw_walls(&mut buf, &mut depth, scene);
    draw_sprites(&mut buf, &depth, scene);
    if let Some(popup) = scene.hud.popup {
        let msg = match popup {
            Popup::Dead => &DEAD_MSG,
            Popup::Paused => &PAUSE_MSG,
            Popup::Quitting => &QUIT_MSG,
        };
        overlay_popup(&mut buf, msg);
    }

    for (y, row) in buf.iter().enumerate() {
        out.queue(cursor::MoveTo(0, y as u16))?;
        out.queue(Print(row.iter().collect::<String>()))?;
    }

    draw_status(out, &scene.hud)?;
    // Health takes the left half of the bottom row, reload the right.
    let half = view_w / 2;
    draw_meter(out, 0, h - 1, half, "HEALTH", scene.hud.health, C_HEALTH)?;
    draw_meter(
        out,
        half as u16,
        h - 1,
        view_w - half,
        "RELOAD",
        scene.hud.reload,
        C_RELOAD,
    )?;

    out.queue(style::ResetColor)?;
    out.flush()
}

// ── Walls ─────────────────────────────────────────────────────────────────────

fn draw_walls(buf: &mut [Vec<char>], depth: &mut [f32], scene: &Scene) {
    let view_w = depth.len();
    let view_h = buf.len();
    for (x, d) in depth.iter_mut().enumerate() {
        let rel = (0.5 - (x as f32 + 0.5) / view_w as f32) * FOV;
        let dir = Vec2::from_angle(scene.player.facing + rel);
        let dist = cast(scene.map, scene.player.pos, dir, MAX_DIST);
        let perp = (dist * rel.cos()).max(0.05);
        *d = perp;

        let wall_h = ((view_h as f32 / perp) as usize).min(view_h);
        let top = (view_h - wall_h) / 2;
        let shade_idx = ((dist / MAX_DIST * SHADES.len() as f32) as usize).min(SHADES.len() - 1);
        let shade = SHADES[shade_idx];
        for row in buf.iter_mut().take(top + wall_h).skip(top) {
            row[x] = shade;
        }
        for row in buf.iter_mut().take(view_h).skip(top + wall_h) {
            row[x] = FLOOR;
        }
    }
}

/// Distance along `dir` to the first blocked cell edge, capped at
/// `max_dist`. Steps the grid DDA-style and consults the wall mask of the
/// cell being exited.
fn cast(map: &Map, origin: Vec2, dir: Vec2, max_dist: f32) -> f32 {
    let mut cx = origin.x.floor() as i32;
    let mut cy = origin.y.floor() as i32;
    let step_x: i32 = if dir.x >= 0.0 { 1 } else { -1 };
    let step_y: i32 = if dir.y >= 0.0 { 1 } else { -1 };
    let delta_x = if dir.x != 0.0 {
        (1.0 / dir.x).abs()
    } else {
        f32::INFINITY
    };
    let delta_y = if dir.y != 0.0 {
        (1.0 / dir.y).abs()
    } else {
        f32::INFINITY
    };
    let mut side_x = if dir.x >= 0.0 {
        (cx as f32 + 1.0 - origin.x) * delta_x
    } else {
        (origin.x - cx as f32) * delta_x
    };
    let mut side_y = if dir.y >= 0.0 {
        (cy as f32 + 1.0 - origin.y) * delta_y
    } else {
        (origin.y - cy as f32) * delta_y
    };
    loop {
        if side_x < side_y {
            let through = if step_x > 0 { Walls::EAST } else { Walls::WEST };
            if side_x > max_dist || map.walls_at(cx, cy).contains(through) {
                return side_x.min(max_dist);
            }
            cx += step_x;
            side_x += delta_x;
        } else {
            let through = if step_y > 0 { Walls::SOUTH } else { Walls::NORTH };
            if side_y > max_dist || map.walls_at(cx, cy).contains(through) {
                return side_y.min(max_dist);
            }
            cy += step_y;
            side_y += delta_y;
        }
    }
}

// ── Sprites ───────────────────────────────────────────────────────────────────

fn draw_sprites(buf: &mut [Vec<char>], depth: &[f32], scene: &Scene) {
    let view_w = depth.len() as i32;
    let view_h = buf.len() as i32;

    // Painter's order: far sprites first so near ones draw over them.
    let mut order: Vec<_> = scene
        .ents
        .iter()
        .map(|id| {
            let rel = scene.ents.pos(id) - scene.player.pos;
            (id, rel.length())
        })
        .collect();
    order.sort_by(|a, b| b.1.total_cmp(&a.1));

    for (id, dist) in order {
        if dist < 0.1 {
            continue;
        }
        let rel = scene.ents.pos(id) - scene.player.pos;
        let angle = wrap_angle(rel.y.atan2(rel.x) - scene.player.facing);
        if angle.abs() > FOV {
            continue;
        }
        let perp = dist * angle.cos();
        if perp < 0.1 {
            continue;
        }
        let texture = scene.ents.texture(scene.catalog, id);
        let transparent = scene.ents.transparent(scene.catalog, id);
        let size = scene.ents.footprint(scene.catalog, id);
        let sh = ((view_h as f32 * size.y / perp) as i32).max(1);
        // Terminal cells are about twice as tall as wide.
        let sw = ((view_h as f32 * size.x * 2.0 / perp) as i32).max(1);
        let centre_col = ((0.5 - angle / FOV) * view_w as f32) as i32;
        let centre_row = view_h / 2;
        for sy in 0..sh {
            let row = centre_row - sh / 2 + sy;
            if row < 0 || row >= view_h {
                continue;
            }
            for sx in 0..sw {
                let col = centre_col - sw / 2 + sx;
                if col < 0 || col >= view_w || perp >= depth[col as usize] {
                    continue;
                }
                let tx = (sx as usize * texture.width()) / sw as usize;
                let ty = (sy as usize * texture.height()) / sh as usize;
                let glyph = texture.get(tx, ty);
                if glyph != transparent {
                    buf[row as usize][col as usize] = glyph;
                }
            }
        }
    }
}

fn wrap_angle(a: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    (a + PI).rem_euclid(TAU) - PI
}

// ── HUD ───────────────────────────────────────────────────────────────────────

fn draw_status<W: Write>(out: &mut W, hud: &Hud) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(0, 0))?;
    out.queue(SetAttribute(Attribute::Bold))?;
    if hud.won {
        out.queue(Print("YOU WIN! Press Y to return to menu."))?;
    } else {
        out.queue(Print(format!("TARGETS LEFT: {}", hud.remaining)))?;
    }
    out.queue(SetAttribute(Attribute::Reset))?;
    Ok(())
}

fn draw_meter<W: Write>(
    out: &mut W,
    x: u16,
    y: u16,
    width: usize,
    label: &str,
    fraction: f32,
    color: Color,
) -> std::io::Result<()> {
    let padded = format!("{label:<width$}");
    let filled = (fraction.clamp(0.0, 1.0) * width as f32) as usize;
    out.queue(cursor::MoveTo(x, y))?;
    out.queue(SetForegroundColor(Color::Black))?;
    out.queue(SetBackgroundColor(color))?;
    out.queue(Print(&padded[..filled]))?;
    out.queue(style::ResetColor)?;
    out.queue(Print(&padded[filled..]))?;
    Ok(())
}

fn overlay_popup(buf: &mut [Vec<char>], lines: &[&str]) {
    let view_h = buf.len();
    if view_h == 0 {
        return;
    }
    let view_w = buf[0].len();
    let inner = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let box_w = (inner + 4).min(view_w);
    let box_h = lines.len() + 2;
    if box_h > view_h {
        return;
    }
    let left = (view_w - box_w) / 2;
    let top = (view_h - box_h) / 2;
    for y in 0..box_h {
        for x in 0..box_w {
            let edge_y = y == 0 || y == box_h - 1;
            let edge_x = x == 0 || x == box_w - 1;
            buf[top + y][left + x] = match (edge_x, edge_y) {
                (false, false) => ' ',
                (true, true) => '+',
                (false, true) => '-',
                (true, false) => '|',
            };
        }
    }
    for (i, line) in lines.iter().enumerate() {
        for (j, c) in line.chars().enumerate() {
            if left + 2 + j < view_w {
                buf[top + 1 + i][left + 2 + j] = c;
            }
        }
    }
}

// ── Input ─────────────────────────────────────────────────────────────────────

/// Non-blocking crossterm input: at most one decoded key per poll.
pub struct TermInput;

impl InputSource for TermInput {
    fn poll_key(&mut self) -> Option<Key> {
        while event::poll(Duration::ZERO).unwrap_or(false) {
            let ev = match event::read() {
                Ok(ev) => ev,
                Err(_) => return None,
            };
            let Event::Key(KeyEvent { code, kind, .. }) = ev else {
                continue;
            };
            if kind == KeyEventKind::Release {
                continue;
            }
            if let Some(key) = decode_key(code) {
                return Some(key);
            }
        }
        None
    }
}

fn decode_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Esc => Some(Key::Quit),
        KeyCode::Enter => Some(Key::Confirm),
        // Space and shifted letters shoot, like holding fire.
        KeyCode::Char(c) if c == ' ' || c.is_ascii_uppercase() => Some(Key::Shoot),
        KeyCode::Char(c) => match c {
            'w' => Some(Key::Forward),
            's' => Some(Key::Back),
            'a' => Some(Key::StrafeLeft),
            'd' => Some(Key::StrafeRight),
            'q' => Some(Key::TurnCcw),
            'e' => Some(Key::TurnCw),
            'p' => Some(Key::Pause),
            'x' => Some(Key::Quit),
            'y' => Some(Key::Confirm),
            'n' => Some(Key::Cancel),
            _ => None,
        },
        _ => None,
    }
}
