//! Entity templates and the live-instance pool.
//!
//! An [`EntityType`] is a shared, immutable template: animation frames,
//! movement/behaviour parameters, and links to the types it spawns on death
//! or fires as bullets. Templates live in a [`TypeCatalog`] arena and refer
//! to each other by [`TypeId`], so `death_spawn`/`bullet` cycles are plain
//! indices rather than pointer cycles.
//!
//! [`Ents`] owns every live instance in a level. Slots stay index-stable for
//! the duration of a tick; [`Ents::clean_up`] compacts dead slots once per
//! tick after all other logic has run.

use std::collections::HashMap;
use std::rc::Rc;

use glam::Vec2;
use rand::Rng;
use serde::Deserialize;

use crate::assets::Texture;

// ── Teams ─────────────────────────────────────────────────────────────────────

/// Which side an instance fights for. Collision policy lives in
/// [`crate::physics::teams_collide`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Player,
    Ally,
    Enemy,
}

// ── Entity types ──────────────────────────────────────────────────────────────

/// One animation frame: a glyph texture shown for `duration` ticks.
#[derive(Clone, Debug)]
pub struct Frame {
    pub texture: Rc<Texture>,
    pub duration: i32,
}

/// Handle into a [`TypeCatalog`]. Two instances are "of the same type" iff
/// their `TypeId`s are equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeId(usize);

/// Shared template for one kind of entity. Immutable once registered.
#[derive(Clone, Debug)]
pub struct EntityType {
    pub name: String,
    /// Collision/render footprint, in map cells.
    pub width: f32,
    pub height: f32,
    /// Distance covered per tick when the entity decides to approach.
    pub speed: f32,
    /// Per-tick probability of re-aiming at the player, in [0, 1].
    pub turn_chance: f64,
    /// Per-tick probability of firing `bullet`, in [0, 1].
    pub shoot_chance: f64,
    /// Glyph treated as see-through when the sprite is drawn.
    pub transparent: char,
    /// Never empty once the type is in a catalog.
    pub frames: Vec<Frame>,
    pub random_start_frame: bool,
    /// Type this entity turns into when its lifetime runs out.
    pub death_spawn: Option<TypeId>,
    /// Type spawned by [`crate::physics::shoot_bullets`].
    pub bullet: Option<TypeId>,
    /// Ticks to live; -1 means the instance only dies when killed.
    pub lifetime: i64,
    /// Dies on contact with a wall.
    pub wall_die: bool,
    /// Stops at walls and recoils off them.
    pub wall_block: bool,
}

impl EntityType {
    /// A template with every field at its documented default.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            width: 1.0,
            height: 1.0,
            speed: 0.0,
            turn_chance: 0.0,
            shoot_chance: 0.0,
            transparent: ' ',
            frames: Vec::new(),
            random_start_frame: false,
            death_spawn: None,
            bullet: None,
            lifetime: -1,
            wall_die: false,
            wall_block: false,
        }
    }

    /// Half the side of the square collision footprint.
    pub fn radius(&self) -> f32 {
        self.width / 2.0
    }
}

/// Name-keyed arena of entity types for one level session.
///
/// `reserve` registers a slot under a name before its fields are resolved,
/// which is what lets `death_spawn`/`bullet` reference chains contain cycles:
/// a nested load of a name already reserved just returns the existing id.
pub struct TypeCatalog {
    types: Vec<EntityType>,
    by_name: HashMap<String, TypeId>,
    empty_texture: Rc<Texture>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self {
            types: Vec::new(),
            by_name: HashMap::new(),
            empty_texture: Rc::new(Texture::empty()),
        }
    }

    /// The shared 1x1 blank texture used when a type declares no frames.
    pub fn empty_texture(&self) -> &Rc<Texture> {
        &self.empty_texture
    }

    /// Register a fully-built type. The id is also recorded under
    /// `ty.name`, making later `lookup` calls return this same slot.
    pub fn insert(&mut self, ty: EntityType) -> TypeId {
        let id = TypeId(self.types.len());
        self.by_name.insert(ty.name.clone(), id);
        let ty = self.normalize(ty);
        self.types.push(ty);
        id
    }

    /// Register a default-valued slot under `name` so that nested references
    /// to it resolve before its own fields do.
    pub fn reserve(&mut self, name: &str) -> TypeId {
        self.insert(EntityType::named(name))
    }

    /// Replace the contents of a reserved slot. The name key used to reserve
    /// the slot is kept, so repeated loads of that name stay idempotent.
    pub fn fill(&mut self, id: TypeId, ty: EntityType) {
        self.types[id.0] = self.normalize(ty);
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: TypeId) -> &EntityType {
        &self.types[id.0]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    // A type with no declared frames gets one blank frame of duration 0, so
    // the animation machine never sees an empty frame list.
    fn normalize(&self, mut ty: EntityType) -> EntityType {
        if ty.frames.is_empty() {
            ty.frames.push(Frame {
                texture: self.empty_texture.clone(),
                duration: 0,
            });
        }
        ty
    }
}

impl Default for TypeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

// ── Instances ─────────────────────────────────────────────────────────────────

/// Handle to a live instance. Valid until the next [`Ents::clean_up`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntId(usize);

struct Ent {
    ty: TypeId,
    pos: Vec2,
    vel: Vec2,
    team: Team,
    frame: usize,
    frame_ticks: i32,
    lifetime: i64,
    worth: bool,
    killed: bool,
}

/// Dense pool of live entity instances.
pub struct Ents {
    ents: Vec<Ent>,
}

impl Ents {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ents: Vec::with_capacity(capacity),
        }
    }

    /// Append a fresh instance of `ty`. Starts with zero velocity, the
    /// type's full lifetime, and frame 0 unless the type asks for a random
    /// start frame.
    pub fn add(
        &mut self,
        catalog: &TypeCatalog,
        ty: TypeId,
        team: Team,
        pos: Vec2,
        rng: &mut impl Rng,
    ) -> EntId {
        let t = catalog.get(ty);
        let frame = if t.random_start_frame {
            rng.gen_range(0..t.frames.len())
        } else {
            0
        };
        let id = EntId(self.ents.len());
        self.ents.push(Ent {
            ty,
            pos,
            vel: Vec2::ZERO,
            team,
            frame,
            frame_ticks: t.frames[frame].duration,
            lifetime: t.lifetime,
            worth: false,
            killed: false,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.ents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ents.is_empty()
    }

    /// Every slot currently in the pool, dead-flagged ones included until
    /// the next `clean_up`.
    pub fn iter(&self) -> impl Iterator<Item = EntId> {
        (0..self.ents.len()).map(EntId)
    }

    /// Every unordered pair of slots, each exactly once.
    pub fn pairs(&self) -> impl Iterator<Item = (EntId, EntId)> {
        let n = self.ents.len();
        (0..n).flat_map(move |a| ((a + 1)..n).map(move |b| (EntId(a), EntId(b))))
    }

    pub fn ty(&self, id: EntId) -> TypeId {
        self.ents[id.0].ty
    }

    pub fn team(&self, id: EntId) -> Team {
        self.ents[id.0].team
    }

    pub fn pos(&self, id: EntId) -> Vec2 {
        self.ents[id.0].pos
    }

    pub fn pos_mut(&mut self, id: EntId) -> &mut Vec2 {
        &mut self.ents[id.0].pos
    }

    pub fn vel(&self, id: EntId) -> Vec2 {
        self.ents[id.0].vel
    }

    pub fn vel_mut(&mut self, id: EntId) -> &mut Vec2 {
        &mut self.ents[id.0].vel
    }

    /// Whether killing this instance counts toward winning the level.
    pub fn worth(&self, id: EntId) -> bool {
        self.ents[id.0].worth
    }

    pub fn worth_mut(&mut self, id: EntId) -> &mut bool {
        &mut self.ents[id.0].worth
    }

    pub fn radius(&self, catalog: &TypeCatalog, id: EntId) -> f32 {
        catalog.get(self.ents[id.0].ty).radius()
    }

    /// The texture of the instance's current animation frame.
    pub fn texture<'a>(&self, catalog: &'a TypeCatalog, id: EntId) -> &'a Rc<Texture> {
        let e = &self.ents[id.0];
        &catalog.get(e.ty).frames[e.frame].texture
    }

    pub fn transparent(&self, catalog: &TypeCatalog, id: EntId) -> char {
        catalog.get(self.ents[id.0].ty).transparent
    }

    /// Render footprint (width, height) in map cells.
    pub fn footprint(&self, catalog: &TypeCatalog, id: EntId) -> Vec2 {
        let t = catalog.get(self.ents[id.0].ty);
        Vec2::new(t.width, t.height)
    }

    /// Force-kill an instance regardless of its lifetime counter. It stays
    /// in the pool, flagged, until the next `clean_up`.
    pub fn kill(&mut self, id: EntId) {
        self.ents[id.0].killed = true;
    }

    pub fn is_dead(&self, catalog: &TypeCatalog, id: EntId) -> bool {
        let e = &self.ents[id.0];
        e.killed || (catalog.get(e.ty).lifetime >= 0 && e.lifetime < 0)
    }

    /// Count of live objective-worth instances, the level's win counter.
    pub fn remaining_worth(&self, catalog: &TypeCatalog) -> usize {
        self.iter()
            .filter(|&id| self.worth(id) && !self.is_dead(catalog, id))
            .count()
    }

    /// Advance every instance's animation/lifetime machine by one tick.
    ///
    /// Instances with a non-negative type lifetime count down; while the
    /// counter stays at or above zero they keep animating. When it goes
    /// negative, a type with `death_spawn` is reinitialized in place as a
    /// fresh instance of that type at its current position (team and
    /// objective worth carry over with the slot); a type without one has its
    /// counter pinned at -1, which is the dead state `clean_up` removes.
    pub fn tick(&mut self, catalog: &TypeCatalog, rng: &mut impl Rng) {
        for i in 0..self.ents.len() {
            let t = catalog.get(self.ents[i].ty);
            if t.lifetime >= 0 {
                self.ents[i].lifetime -= 1;
                if self.ents[i].lifetime < 0 {
                    match t.death_spawn {
                        Some(next) => self.respawn(i, catalog, next, rng),
                        None => self.ents[i].lifetime = -1,
                    }
                    continue;
                }
            }
            let e = &mut self.ents[i];
            e.frame_ticks -= 1;
            if e.frame_ticks <= 0 {
                e.frame = (e.frame + 1) % t.frames.len();
                e.frame_ticks = t.frames[e.frame].duration;
            }
        }
    }

    /// Compact the pool, removing every dead instance. Invalidates handles;
    /// run once per tick, after everything that reads instance state.
    pub fn clean_up(&mut self, catalog: &TypeCatalog) {
        let mut i = 0;
        while i < self.ents.len() {
            if self.is_dead(catalog, EntId(i)) {
                self.ents.swap_remove(i);
            } else {
                i += 1;
            }
        }
    }

    // Overwrite slot i with a fresh instance of `ty` at its own position.
    // The slot is reused rather than reallocated so handles held elsewhere
    // in the current tick stay valid.
    fn respawn(&mut self, i: usize, catalog: &TypeCatalog, ty: TypeId, rng: &mut impl Rng) {
        let t = catalog.get(ty);
        let frame = if t.random_start_frame {
            rng.gen_range(0..t.frames.len())
        } else {
            0
        };
        let e = &mut self.ents[i];
        e.ty = ty;
        e.vel = Vec2::ZERO;
        e.frame = frame;
        e.frame_ticks = t.frames[frame].duration;
        e.lifetime = t.lifetime;
    }
}
