//! The player: movement intents, health, and shooting.
//!
//! The game loop only touches the operations published here; the body
//! position and radius are owned by the player and wall-corrected by
//! [`crate::physics::move_ents`] like any other footprint.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use crate::ent::{Ents, Team, TypeCatalog, TypeId};
use crate::physics;

const MAX_HEALTH: f32 = 1.0;
/// Health lost per tick of contact with an enemy body.
const HIT_DAMAGE: f32 = 0.05;
/// Cells moved per walk tick.
const WALK_SPEED: f32 = 0.08;
/// Radians rotated per turn tick.
const TURN_STEP: f32 = 0.06;
/// Ticks between shots.
const RELOAD_TICKS: u32 = 15;
/// Half-width of the player's square footprint.
pub const RADIUS: f32 = 0.25;

pub struct Player {
    pub pos: Vec2,
    /// Facing angle in radians; 0 looks along +x.
    pub facing: f32,
    pub radius: f32,
    bullet: Option<TypeId>,
    health: f32,
    reload: u32,
}

impl Player {
    pub fn new(pos: Vec2, bullet: Option<TypeId>) -> Self {
        Self {
            pos,
            facing: 0.0,
            radius: RADIUS,
            bullet,
            health: MAX_HEALTH,
            reload: 0,
        }
    }

    /// Step one walk tick at `offset` radians relative to the facing
    /// direction (0 forward, pi back, +-pi/2 strafing).
    pub fn walk(&mut self, offset: f32) {
        self.pos += Vec2::from_angle(self.facing + offset) * WALK_SPEED;
    }

    pub fn turn_ccw(&mut self) {
        self.facing = (self.facing + TURN_STEP) % TAU;
    }

    pub fn turn_cw(&mut self) {
        self.facing = (self.facing - TURN_STEP) % TAU;
    }

    /// Fire the player's bullet type, if armed, loaded, and alive.
    pub fn try_shoot(&mut self, ents: &mut Ents, catalog: &TypeCatalog, rng: &mut impl Rng) {
        if self.is_dead() || self.reload > 0 {
            return;
        }
        let bullet = match self.bullet {
            Some(b) => b,
            None => return,
        };
        let id = ents.add(catalog, bullet, Team::Ally, self.pos, rng);
        *ents.vel_mut(id) = Vec2::from_angle(self.facing) * catalog.get(bullet).speed;
        self.reload = RELOAD_TICKS;
    }

    /// Take contact damage from every overlapping enemy body. Transient
    /// bodies (anything with a finite lifetime, i.e. bullets and blasts)
    /// burn up on impact; persistent monsters keep grinding.
    pub fn collide(&mut self, ents: &mut Ents, catalog: &TypeCatalog) {
        let ids: Vec<_> = ents.iter().collect();
        for id in ids {
            if ents.team(id) != Team::Enemy {
                continue;
            }
            let hit = physics::bodies_collide(
                self.pos,
                self.radius,
                ents.pos(id),
                ents.radius(catalog, id),
            );
            if hit {
                self.health = (self.health - HIT_DAMAGE).max(0.0);
                if catalog.get(ents.ty(id)).lifetime >= 0 {
                    ents.kill(id);
                }
            }
        }
    }

    /// Per-tick upkeep: advance the reload counter.
    pub fn tick(&mut self) {
        self.reload = self.reload.saturating_sub(1);
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn health_fraction(&self) -> f32 {
        self.health / MAX_HEALTH
    }

    pub fn reload_fraction(&self) -> f32 {
        1.0 - self.reload as f32 / RELOAD_TICKS as f32
    }
}
