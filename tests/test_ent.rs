use std::rc::Rc;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use termraider::assets::Texture;
use termraider::ent::{EntityType, Ents, Frame, Team, TypeCatalog};

fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn frame(art: &str, duration: i32) -> Frame {
    Frame {
        texture: Rc::new(Texture::from_art(art)),
        duration,
    }
}

#[test]
fn frameless_type_gets_one_blank_frame() {
    let mut catalog = TypeCatalog::new();
    let id = catalog.insert(EntityType::named("ghost"));
    let t = catalog.get(id);
    assert_eq!(t.frames.len(), 1);
    assert_eq!(t.frames[0].duration, 0);
    assert_eq!(t.frames[0].texture.get(0, 0), ' ');
}

#[test]
fn catalog_lookup_finds_inserted_types() {
    let mut catalog = TypeCatalog::new();
    let a = catalog.insert(EntityType::named("a"));
    let b = catalog.reserve("b");
    assert_ne!(a, b);
    assert_eq!(catalog.lookup("a"), Some(a));
    assert_eq!(catalog.lookup("b"), Some(b));
    assert_eq!(catalog.lookup("c"), None);
    assert_eq!(catalog.len(), 2);
}

#[test]
fn finite_lifetime_expires_without_spawn() {
    let mut catalog = TypeCatalog::new();
    let mut blast = EntityType::named("blast");
    blast.lifetime = 3;
    let blast = catalog.insert(blast);

    let mut rng = rng();
    let mut ents = Ents::with_capacity(1);
    let id = ents.add(&catalog, blast, Team::Enemy, Vec2::new(2.0, 2.0), &mut rng);

    // Alive through the third tick, dead on the fourth
    for _ in 0..3 {
        ents.tick(&catalog, &mut rng);
        assert!(!ents.is_dead(&catalog, id));
    }
    ents.tick(&catalog, &mut rng);
    assert!(ents.is_dead(&catalog, id));

    // Ticking an expired slot again is a no-op, not a revival
    ents.tick(&catalog, &mut rng);
    assert!(ents.is_dead(&catalog, id));

    ents.clean_up(&catalog);
    assert!(ents.is_empty());
}

#[test]
fn death_spawn_replaces_in_place() {
    let mut catalog = TypeCatalog::new();
    let mut cloud = EntityType::named("cloud");
    cloud.frames = vec![frame("o", 1)];
    let cloud = catalog.insert(cloud);
    let mut rocket = EntityType::named("rocket");
    rocket.lifetime = 1;
    rocket.death_spawn = Some(cloud);
    let rocket = catalog.insert(rocket);

    let mut rng = rng();
    let mut ents = Ents::with_capacity(1);
    let pos = Vec2::new(3.5, 1.5);
    let id = ents.add(&catalog, rocket, Team::Enemy, pos, &mut rng);
    *ents.worth_mut(id) = true;

    ents.tick(&catalog, &mut rng);
    assert_eq!(ents.ty(id), rocket);
    ents.tick(&catalog, &mut rng);

    // Same slot, same position, new type with its fresh state
    assert_eq!(ents.len(), 1);
    assert_eq!(ents.ty(id), cloud);
    assert_eq!(ents.pos(id), pos);
    assert!(!ents.is_dead(&catalog, id));

    // The slot keeps its team and objective worth
    assert_eq!(ents.team(id), Team::Enemy);
    assert!(ents.worth(id));

    // The replacement lives forever
    for _ in 0..10 {
        ents.tick(&catalog, &mut rng);
    }
    assert!(!ents.is_dead(&catalog, id));
}

#[test]
fn animation_advances_and_wraps() {
    let mut catalog = TypeCatalog::new();
    let mut spinner = EntityType::named("spinner");
    spinner.frames = vec![frame("a", 2), frame("b", 1)];
    let spinner = catalog.insert(spinner);
    let a = catalog.get(spinner).frames[0].texture.clone();
    let b = catalog.get(spinner).frames[1].texture.clone();

    let mut rng = rng();
    let mut ents = Ents::with_capacity(1);
    let id = ents.add(&catalog, spinner, Team::Ally, Vec2::ZERO, &mut rng);

    assert!(Rc::ptr_eq(ents.texture(&catalog, id), &a));
    ents.tick(&catalog, &mut rng); // two-tick frame, still showing
    assert!(Rc::ptr_eq(ents.texture(&catalog, id), &a));
    ents.tick(&catalog, &mut rng);
    assert!(Rc::ptr_eq(ents.texture(&catalog, id), &b));
    ents.tick(&catalog, &mut rng); // wraps back to the first frame
    assert!(Rc::ptr_eq(ents.texture(&catalog, id), &a));
}

#[test]
fn random_start_frame_uses_every_frame() {
    let mut catalog = TypeCatalog::new();
    let mut shimmer = EntityType::named("shimmer");
    shimmer.frames = (0..5).map(|i| frame(&i.to_string(), 1)).collect();
    shimmer.random_start_frame = true;
    let shimmer = catalog.insert(shimmer);

    let mut rng = rng();
    let mut ents = Ents::with_capacity(500);
    let mut counts = [0usize; 5];
    for _ in 0..500 {
        let id = ents.add(&catalog, shimmer, Team::Enemy, Vec2::ZERO, &mut rng);
        let tex = ents.texture(&catalog, id);
        let slot = catalog
            .get(shimmer)
            .frames
            .iter()
            .position(|f| Rc::ptr_eq(&f.texture, tex))
            .unwrap();
        counts[slot] += 1;
    }
    // Roughly uniform over 500 draws; anything near zero means a bias
    for &c in &counts {
        assert!(c > 50, "start frames should be roughly uniform: {counts:?}");
    }
}

#[test]
fn remaining_worth_counts_live_objectives() {
    let mut catalog = TypeCatalog::new();
    let monster = catalog.insert(EntityType::named("monster"));

    let mut rng = rng();
    let mut ents = Ents::with_capacity(5);
    let mut enemies = Vec::new();
    for i in 0..3 {
        let id = ents.add(
            &catalog,
            monster,
            Team::Enemy,
            Vec2::new(i as f32, 0.0),
            &mut rng,
        );
        *ents.worth_mut(id) = true;
        enemies.push(id);
    }
    for i in 0..2 {
        ents.add(
            &catalog,
            monster,
            Team::Ally,
            Vec2::new(i as f32, 2.0),
            &mut rng,
        );
    }
    assert_eq!(ents.remaining_worth(&catalog), 3);

    // A killed objective stops counting before compaction, too
    ents.kill(enemies[0]);
    assert_eq!(ents.remaining_worth(&catalog), 2);

    ents.clean_up(&catalog);
    assert_eq!(ents.len(), 4);
    assert_eq!(ents.remaining_worth(&catalog), 2);
}

#[test]
fn kill_overrides_a_forever_lifetime() {
    let mut catalog = TypeCatalog::new();
    let statue = catalog.insert(EntityType::named("statue"));

    let mut rng = rng();
    let mut ents = Ents::with_capacity(2);
    let doomed = ents.add(&catalog, statue, Team::Enemy, Vec2::ZERO, &mut rng);
    let spared = ents.add(&catalog, statue, Team::Enemy, Vec2::ONE, &mut rng);

    for _ in 0..50 {
        ents.tick(&catalog, &mut rng);
    }
    assert!(!ents.is_dead(&catalog, doomed));

    ents.kill(doomed);
    assert!(ents.is_dead(&catalog, doomed));
    assert!(!ents.is_dead(&catalog, spared));

    ents.clean_up(&catalog);
    assert_eq!(ents.len(), 1);
}

#[test]
fn pairs_visits_each_unordered_pair_once() {
    let mut catalog = TypeCatalog::new();
    let t = catalog.insert(EntityType::named("t"));
    let mut rng = rng();
    let mut ents = Ents::with_capacity(4);
    for _ in 0..4 {
        ents.add(&catalog, t, Team::Ally, Vec2::ZERO, &mut rng);
    }
    let pairs: Vec<_> = ents.pairs().collect();
    assert_eq!(pairs.len(), 6);
    for (a, b) in &pairs {
        assert_ne!(a, b);
    }
}
