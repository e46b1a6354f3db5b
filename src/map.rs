//! Level geometry: the wall grid, the entity seed list, and the wall-slide
//! collision resolver shared by the player and every entity.

use bitflags::bitflags;
use glam::Vec2;

use crate::ent::{Team, TypeId};

bitflags! {
    /// Blocked compass directions of one cell. A set bit means the edge on
    /// that side cannot be crossed.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct Walls: u8 {
        const NORTH = 1 << 0;
        const SOUTH = 1 << 1;
        const WEST = 1 << 2;
        const EAST = 1 << 3;
    }
}

/// Where one entity starts when the level is seeded.
#[derive(Clone, Copy, Debug)]
pub struct EntStart {
    pub ty: TypeId,
    pub team: Team,
    pub pos: Vec2,
}

/// A loaded level board. Consumed read-only by the simulation; the seed
/// list is used once at level start.
pub struct Map {
    pub name: String,
    /// Level that must be complete before this one unlocks.
    pub prereq: Option<String>,
    width: usize,
    height: usize,
    walls: Vec<Walls>,
    solid: Vec<bool>,
    pub starts: Vec<EntStart>,
    pub player_start: Vec2,
    /// Type fired by the player's own shots.
    pub player_bullet: Option<TypeId>,
}

// Footprint edges that land exactly on a grid line are touching, not
// penetrating; the epsilon keeps them out of the neighbouring cell span.
const EDGE_EPS: f32 = 1e-6;

impl Map {
    /// Build a board from rows of tiles: `#` is solid, anything else open.
    /// Short rows are padded with solid tiles; the border always blocks.
    pub fn from_layout<S: AsRef<str>>(name: impl Into<String>, rows: &[S]) -> Self {
        let height = rows.len();
        let width = rows
            .iter()
            .map(|r| r.as_ref().chars().count())
            .max()
            .unwrap_or(0);
        let tiles: Vec<Vec<bool>> = rows
            .iter()
            .map(|r| {
                let mut row: Vec<bool> = r.as_ref().chars().map(|c| c == '#').collect();
                row.resize(width, true);
                row
            })
            .collect();
        let solid = |x: i64, y: i64| -> bool {
            if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                return true;
            }
            tiles[y as usize][x as usize]
        };
        let mut walls = Vec::with_capacity(width * height);
        let mut solid_cells = Vec::with_capacity(width * height);
        for y in 0..height as i64 {
            for x in 0..width as i64 {
                let mut w = Walls::empty();
                if solid(x, y) {
                    w = Walls::all();
                } else {
                    w.set(Walls::NORTH, solid(x, y - 1));
                    w.set(Walls::SOUTH, solid(x, y + 1));
                    w.set(Walls::WEST, solid(x - 1, y));
                    w.set(Walls::EAST, solid(x + 1, y));
                }
                walls.push(w);
                solid_cells.push(solid(x, y));
            }
        }
        Self {
            name: name.into(),
            prereq: None,
            width,
            height,
            walls,
            solid: solid_cells,
            starts: Vec::new(),
            player_start: Vec2::ZERO,
            player_bullet: None,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Blocked directions of the cell at (x, y). Everything outside the
    /// board is fully blocked.
    pub fn walls_at(&self, x: i32, y: i32) -> Walls {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return Walls::all();
        }
        self.walls[y as usize * self.width + x as usize]
    }

    /// Whether the cell at (x, y) is a solid tile. Everything outside the
    /// board is solid.
    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return true;
        }
        self.solid[y as usize * self.width + x as usize]
    }

    /// Correct a candidate position so the square footprint of half-width
    /// `radius` centred on it does not straddle any blocked cell edge.
    ///
    /// Each axis is clamped independently: a diagonal move into a wall
    /// loses only its blocked component and keeps sliding along the other
    /// axis. A displacement fast enough to carry the centre itself into a
    /// solid cell is first ejected back across the nearest open edge, so a
    /// single-tick move of up to a full cell cannot tunnel. The caller
    /// learns whether anything was hit by comparing the corrected position
    /// with the candidate it passed in.
    pub fn check_walls(&self, pos: &mut Vec2, radius: f32) {
        let cx = pos.x.floor() as i32;
        let cy = pos.y.floor() as i32;
        if self.is_solid(cx, cy) {
            self.eject(pos, radius, cx, cy);
        }
        self.clamp_axes(pos, radius);
    }

    // Push a centre that crossed into a solid cell back across the nearest
    // open edge or corner, leaving the footprint just clear of the cell.
    // A cell with no open neighbour at all leaves the position alone.
    fn eject(&self, pos: &mut Vec2, radius: f32, cx: i32, cy: i32) {
        let mut best: Option<(f32, Vec2)> = None;
        for dy in -1i32..=1 {
            for dx in -1i32..=1 {
                if (dx == 0 && dy == 0) || self.is_solid(cx + dx, cy + dy) {
                    continue;
                }
                let x = match dx {
                    -1 => cx as f32 - radius,
                    1 => (cx + 1) as f32 + radius,
                    _ => pos.x,
                };
                let y = match dy {
                    -1 => cy as f32 - radius,
                    1 => (cy + 1) as f32 + radius,
                    _ => pos.y,
                };
                let to = Vec2::new(x, y);
                let cost = (to - *pos).length_squared();
                if best.map_or(true, |(c, _)| cost < c) {
                    best = Some((cost, to));
                }
            }
        }
        if let Some((_, to)) = best {
            *pos = to;
        }
    }

    fn clamp_axes(&self, pos: &mut Vec2, radius: f32) {
        let cx = pos.x.floor() as i32;
        let cy = pos.y.floor() as i32;
        let rows = span(pos.y - radius, pos.y + radius);
        let cols = span(pos.x - radius, pos.x + radius);

        // Every open row (or column) the footprint overlaps is consulted, so
        // a wall line continuing into a neighbouring cell still clamps.
        // Solid neighbours are skipped: penetration into those belongs to
        // the other axis's clamp, and consulting them would stop slides
        // along the wall they form.
        let blocks = |x: i32, y: i32, dir: Walls| {
            (!self.is_solid(x, y) || (x == cx && y == cy)) && self.walls_at(x, y).contains(dir)
        };

        let west = cx as f32;
        if pos.x - radius < west && rows.clone().any(|r| blocks(cx, r, Walls::WEST)) {
            pos.x = west + radius;
        }
        let east = (cx + 1) as f32;
        if pos.x + radius > east && rows.clone().any(|r| blocks(cx, r, Walls::EAST)) {
            pos.x = east - radius;
        }
        let north = cy as f32;
        if pos.y - radius < north && cols.clone().any(|c| blocks(c, cy, Walls::NORTH)) {
            pos.y = north + radius;
        }
        let south = (cy + 1) as f32;
        if pos.y + radius > south && cols.clone().any(|c| blocks(c, cy, Walls::SOUTH)) {
            pos.y = south - radius;
        }
    }
}

// Grid rows/columns covered by the closed interval [lo, hi].
fn span(lo: f32, hi: f32) -> std::ops::RangeInclusive<i32> {
    (lo.floor() as i32)..=((hi - EDGE_EPS).floor() as i32)
}
