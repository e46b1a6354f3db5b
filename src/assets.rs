//! Asset loading: glyph textures, entity type documents, and maps.
//!
//! Everything is cached by name for the lifetime of one [`Loader`], which
//! lives as long as the level session. Missing or malformed assets are
//! logged and substituted with safe defaults instead of failing the level;
//! the one exception is the map itself, without which the level cannot
//! start.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use glam::Vec2;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::ent::{EntityType, Frame, Team, TypeCatalog, TypeId};
use crate::map::{EntStart, Map};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("map {name:?} is not a valid map document: {source}")]
    BadMap {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

// ── Textures ──────────────────────────────────────────────────────────────────

/// A rectangular grid of glyphs loaded from a line-based art file.
#[derive(Debug, PartialEq, Eq)]
pub struct Texture {
    width: usize,
    height: usize,
    cells: Vec<char>,
}

impl Texture {
    /// The 1x1 blank texture substituted for anything missing.
    pub fn empty() -> Self {
        Self {
            width: 1,
            height: 1,
            cells: vec![' '],
        }
    }

    /// Parse line art: one row per line, short rows padded with blanks to
    /// the widest. Empty input yields the empty texture.
    pub fn from_art(text: &str) -> Self {
        let rows: Vec<&str> = text.lines().collect();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        if width == 0 || rows.is_empty() {
            return Self::empty();
        }
        let mut cells = Vec::with_capacity(width * rows.len());
        for row in &rows {
            let mut count = 0;
            for c in row.chars() {
                cells.push(c);
                count += 1;
            }
            cells.resize(cells.len() + width - count, ' ');
        }
        Self {
            width,
            height: rows.len(),
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Glyph at (x, y); blank outside the grid.
    pub fn get(&self, x: usize, y: usize) -> char {
        if x >= self.width || y >= self.height {
            return ' ';
        }
        self.cells[y * self.width + x]
    }
}

// ── Document shapes ───────────────────────────────────────────────────────────

// A frame is either "texture" or ["texture", duration].
#[derive(Deserialize)]
#[serde(untagged)]
enum FrameDoc {
    Plain(String),
    Timed(String, i32),
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct EntTypeDoc {
    name: Option<String>,
    width: Option<f32>,
    height: Option<f32>,
    speed: Option<f32>,
    /// Percent in the file, probability in core.
    turn_chance: Option<f64>,
    shoot_chance: Option<f64>,
    transparent: Option<String>,
    frames: Option<Vec<FrameDoc>>,
    random_start_frame: Option<bool>,
    death_spawn: Option<String>,
    bullet: Option<String>,
    lifetime: Option<i64>,
    wall_die: Option<bool>,
    wall_block: Option<bool>,
}

#[derive(Deserialize)]
struct MapEntDoc {
    #[serde(rename = "type")]
    ty: String,
    team: Team,
    pos: [f32; 2],
}

#[derive(Deserialize)]
struct MapDoc {
    name: Option<String>,
    #[serde(default)]
    prereq: Option<String>,
    layout: Vec<String>,
    player: [f32; 2],
    #[serde(default)]
    player_bullet: Option<String>,
    #[serde(default)]
    ents: Vec<MapEntDoc>,
}

// ── Loader ────────────────────────────────────────────────────────────────────

/// Name-keyed loader for one level session's assets, rooted at a data
/// directory with `ents/`, `textures/`, and `maps/` below it.
pub struct Loader {
    root: PathBuf,
    catalog: TypeCatalog,
    textures: HashMap<String, Rc<Texture>>,
}

impl Loader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            catalog: TypeCatalog::new(),
            textures: HashMap::new(),
        }
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    /// Hand the catalog to the level session; textures stay alive through
    /// the frames that reference them.
    pub fn into_catalog(self) -> TypeCatalog {
        self.catalog
    }

    /// Load a glyph texture, or return the cached one. A missing or
    /// unreadable file logs a warning and yields the shared empty texture.
    pub fn texture(&mut self, name: &str) -> Rc<Texture> {
        if let Some(t) = self.textures.get(name) {
            return t.clone();
        }
        let path = self.root.join("textures").join(name);
        let texture = match fs::read_to_string(&path) {
            Ok(text) => Rc::new(Texture::from_art(&text)),
            Err(err) => {
                warn!(name, %err, "texture missing, using empty texture");
                self.catalog.empty_texture().clone()
            }
        };
        self.textures.insert(name.to_string(), texture.clone());
        texture
    }

    /// Load an entity type by name, or return the already-loaded one.
    ///
    /// The name is registered in the catalog before `death_spawn`/`bullet`
    /// are resolved, so reference cycles terminate. Problems never fail the
    /// level: a missing file or invalid document logs and leaves the
    /// defaulted type in place.
    pub fn ent_type(&mut self, name: &str) -> TypeId {
        if let Some(id) = self.catalog.lookup(name) {
            return id;
        }
        let id = self.catalog.reserve(name);
        let path = self.root.join("ents").join(format!("{name}.json"));
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                warn!(name, %err, "entity type missing, using defaults");
                return id;
            }
        };
        let doc: EntTypeDoc = match serde_json::from_str(&text) {
            Ok(doc) => doc,
            Err(err) => {
                error!(name, %err, "entity type is not a valid document");
                return id;
            }
        };
        let ty = self.build_ent_type(name, doc);
        self.catalog.fill(id, ty);
        id
    }

    fn build_ent_type(&mut self, name: &str, doc: EntTypeDoc) -> EntityType {
        let mut ty = EntityType::named(name);
        match doc.name {
            Some(n) => ty.name = n,
            None => warn!(name, "entity type has no \"name\" attribute"),
        }
        if let Some(w) = doc.width {
            ty.width = w;
        }
        if let Some(h) = doc.height {
            ty.height = h;
        }
        if let Some(s) = doc.speed {
            ty.speed = s;
        }
        // Chance fields are percentages in the asset.
        if let Some(c) = doc.turn_chance {
            ty.turn_chance = (c / 100.0).clamp(0.0, 1.0);
        }
        if let Some(c) = doc.shoot_chance {
            ty.shoot_chance = (c / 100.0).clamp(0.0, 1.0);
        }
        if let Some(t) = doc.transparent {
            if let Some(c) = t.chars().next() {
                ty.transparent = c;
            }
        }
        ty.random_start_frame = doc.random_start_frame.unwrap_or(false);
        for frame in doc.frames.unwrap_or_default() {
            let (texture_name, duration) = match frame {
                FrameDoc::Plain(n) => (n, 1),
                FrameDoc::Timed(n, d) => (n, d),
            };
            ty.frames.push(Frame {
                texture: self.texture(&texture_name),
                duration,
            });
        }
        // Nested references resolve after this type's slot is registered.
        ty.death_spawn = doc.death_spawn.map(|n| self.ent_type(&n));
        ty.bullet = doc.bullet.map(|n| self.ent_type(&n));
        if let Some(l) = doc.lifetime {
            ty.lifetime = l;
        }
        ty.wall_die = doc.wall_die.unwrap_or(false);
        ty.wall_block = doc.wall_block.unwrap_or(false);
        ty
    }

    /// Load a map and everything it references. A missing or structurally
    /// invalid map document fails the level start.
    pub fn map(&mut self, name: &str) -> Result<Map, LoadError> {
        let path = self.root.join("maps").join(format!("{name}.json"));
        let text = fs::read_to_string(&path).map_err(|source| LoadError::Io { path, source })?;
        let doc: MapDoc = serde_json::from_str(&text).map_err(|source| LoadError::BadMap {
            name: name.to_string(),
            source,
        })?;
        let mut map = Map::from_layout(doc.name.unwrap_or_else(|| name.to_string()), &doc.layout);
        map.prereq = doc.prereq;
        map.player_start = Vec2::from(doc.player);
        map.player_bullet = doc.player_bullet.map(|n| self.ent_type(&n));
        for e in doc.ents {
            map.starts.push(EntStart {
                ty: self.ent_type(&e.ty),
                team: e.team,
                pos: Vec2::from(e.pos),
            });
        }
        Ok(map)
    }
}

/// Names of the maps available under a data root, sorted. Dot files are
/// skipped; one io error fails the whole enumeration with its path.
pub fn list_maps(root: impl AsRef<Path>) -> Result<Vec<String>, LoadError> {
    let dir = root.as_ref().join("maps");
    let entries = fs::read_dir(&dir).map_err(|source| LoadError::Io {
        path: dir.clone(),
        source,
    })?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Io {
            path: dir.clone(),
            source,
        })?;
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if file_name.starts_with('.') {
            continue;
        }
        if let Some(stem) = file_name.strip_suffix(".json") {
            names.push(stem.to_string());
        }
    }
    names.sort();
    Ok(names)
}
