//! Per-tick movement, collision, and bullet-spawning logic.
//!
//! The game loop runs these in a fixed order each tick: player wall
//! resolution and entity movement ([`move_ents`]), then pairwise entity
//! collision ([`hit_ents`]), then bullet spawning ([`shoot_bullets`]).
//! Later steps consume state the earlier ones mutate, so the order is part
//! of the contract. All randomness flows through the injected RNG.

use glam::Vec2;
use rand::Rng;

use crate::ent::{EntId, Ents, Team, TypeCatalog};
use crate::map::Map;
use crate::player::Player;

/// Weighted coin flip: succeeds with probability `chance` in [0, 1].
pub fn chance_decide(rng: &mut impl Rng, chance: f64) -> bool {
    rng.gen::<f64>() < chance
}

/// Collision policy between teams: same team never collides, and only
/// pairs with an enemy on one side collide at all.
pub fn teams_collide(a: Team, b: Team) -> bool {
    a != b && (a == Team::Enemy || b == Team::Enemy)
}

/// Square-footprint overlap test for two bodies of half-widths `ra`, `rb`.
pub fn bodies_collide(pa: Vec2, ra: f32, pb: Vec2, rb: f32) -> bool {
    (pa.x - pb.x).abs() < ra + rb && (pa.y - pb.y).abs() < ra + rb
}

/// Move every entity for one tick and resolve wall contact.
///
/// The player's own position is wall-corrected first. Each entity then
/// integrates its velocity, may re-aim toward the player (a `turn_chance`
/// coin flip), and has its footprint wall-corrected. A `wall_die` type that
/// got corrected perishes; a `wall_block` type commits the corrected
/// position and folds the correction into its velocity so it recoils from
/// the wall on the next tick.
pub fn move_ents(
    ents: &mut Ents,
    catalog: &TypeCatalog,
    map: &Map,
    player: &mut Player,
    rng: &mut impl Rng,
) {
    map.check_walls(&mut player.pos, player.radius);
    let ids: Vec<EntId> = ents.iter().collect();
    for id in ids {
        let ty = catalog.get(ents.ty(id));
        let pos = ents.pos(id) + ents.vel(id);
        *ents.pos_mut(id) = pos;
        let disp = if chance_decide(rng, ty.turn_chance) {
            (pos - player.pos).normalize_or_zero() * -ty.speed
        } else {
            Vec2::ZERO
        };
        let mut corrected = pos;
        map.check_walls(&mut corrected, ty.radius());
        if ty.wall_die && corrected != pos {
            ents.kill(id);
        } else if ty.wall_block {
            let disp = disp + (corrected - pos);
            *ents.pos_mut(id) = corrected;
            let vel = ents.vel_mut(id);
            if disp.x != 0.0 {
                vel.x = disp.x;
            }
            if disp.y != 0.0 {
                vel.y = disp.y;
            }
        }
    }
}

/// Test every collidable pair of instances. A hit involving the player's
/// side raises `alert` so the presentation layer can beep; damage itself is
/// the player controller's business, not this resolver's.
pub fn hit_ents(ents: &Ents, catalog: &TypeCatalog, mut alert: impl FnMut()) {
    for (a, b) in ents.pairs() {
        let (ta, tb) = (ents.team(a), ents.team(b));
        if !teams_collide(ta, tb) {
            continue;
        }
        let hit = bodies_collide(
            ents.pos(a),
            ents.radius(catalog, a),
            ents.pos(b),
            ents.radius(catalog, b),
        );
        if hit
            && (matches!(ta, Team::Ally | Team::Player) || matches!(tb, Team::Ally | Team::Player))
        {
            alert();
        }
    }
}

/// Let every armed entity take its `shoot_chance` coin flip and spawn a
/// bullet on success. The bullet starts at the shooter's position, on the
/// shooter's team, moving with the shooter plus the bullet type's speed
/// along the shooter's heading. A standing shooter fires a bullet with no
/// added component, since normalizing a zero vector is a no-op.
pub fn shoot_bullets(ents: &mut Ents, catalog: &TypeCatalog, rng: &mut impl Rng) {
    let ids: Vec<EntId> = ents.iter().collect();
    for id in ids {
        let ty = catalog.get(ents.ty(id));
        let bullet_ty = match ty.bullet {
            Some(b) => b,
            None => continue,
        };
        if !chance_decide(rng, ty.shoot_chance) {
            continue;
        }
        let pos = ents.pos(id);
        let vel = ents.vel(id);
        let team = ents.team(id);
        let speed = catalog.get(bullet_ty).speed;
        let bullet = ents.add(catalog, bullet_ty, team, pos, rng);
        *ents.vel_mut(bullet) = vel + vel.normalize_or_zero() * speed;
    }
}
