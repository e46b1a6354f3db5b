use std::fs;
use std::path::PathBuf;

use termraider::assets::{list_maps, LoadError, Loader, Texture};
use termraider::ent::Team;
use termraider::map::Walls;

fn data_root(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("termraider-{}-{}", tag, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    for sub in ["ents", "textures", "maps"] {
        fs::create_dir_all(dir.join(sub)).unwrap();
    }
    dir
}

#[test]
fn texture_rows_are_padded_to_the_widest() {
    let t = Texture::from_art("ab\nc");
    assert_eq!(t.width(), 2);
    assert_eq!(t.height(), 2);
    assert_eq!(t.get(0, 0), 'a');
    assert_eq!(t.get(1, 1), ' ');
    // Outside the grid is blank
    assert_eq!(t.get(5, 5), ' ');
}

#[test]
fn empty_art_yields_the_blank_texture() {
    let t = Texture::from_art("");
    assert_eq!(t.width(), 1);
    assert_eq!(t.height(), 1);
    assert_eq!(t.get(0, 0), ' ');
}

#[test]
fn a_missing_type_falls_back_to_defaults() {
    let root = data_root("missing-type");
    let mut loader = Loader::new(&root);
    let id = loader.ent_type("nothing");
    assert_eq!(loader.catalog().lookup("nothing"), Some(id));
    // Asking again returns the same slot
    assert_eq!(loader.ent_type("nothing"), id);

    let t = loader.catalog().get(id);
    assert_eq!(t.width, 1.0);
    assert_eq!(t.lifetime, -1);
    assert_eq!(t.frames.len(), 1);
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn a_full_type_document_parses() {
    let root = data_root("full-type");
    fs::write(
        root.join("ents/imp.json"),
        r#"{
            "name": "imp",
            "width": 0.5,
            "speed": 0.04,
            "turn_chance": 25,
            "shoot_chance": 50,
            "lifetime": 120,
            "wall_block": true,
            "transparent": ".",
            "random_start_frame": true,
            "frames": ["imp1.txt", ["imp2.txt", 3]],
            "bullet": "spark"
        }"#,
    )
    .unwrap();
    fs::write(
        root.join("ents/spark.json"),
        r#"{"name": "spark", "speed": 0.2, "wall_die": true, "lifetime": 40}"#,
    )
    .unwrap();
    fs::write(root.join("textures/imp1.txt"), "/\\\noo").unwrap();
    fs::write(root.join("textures/imp2.txt"), "\\/\noo").unwrap();

    let mut loader = Loader::new(&root);
    let imp = loader.ent_type("imp");
    let spark = loader.catalog().lookup("spark").unwrap();

    let t = loader.catalog().get(imp);
    assert_eq!(t.width, 0.5);
    assert_eq!(t.radius(), 0.25);
    // Chances are percentages in the file, fractions in core
    assert!((t.turn_chance - 0.25).abs() < 1e-9);
    assert!((t.shoot_chance - 0.50).abs() < 1e-9);
    assert_eq!(t.lifetime, 120);
    assert!(t.wall_block);
    assert!(t.random_start_frame);
    assert_eq!(t.transparent, '.');
    assert_eq!(t.frames.len(), 2);
    assert_eq!(t.frames[0].duration, 1);
    assert_eq!(t.frames[1].duration, 3);
    assert_eq!(t.frames[0].texture.get(0, 0), '/');
    assert_eq!(t.bullet, Some(spark));

    let s = loader.catalog().get(spark);
    assert!(s.wall_die);
    assert_eq!(s.lifetime, 40);
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn death_spawn_cycles_resolve() {
    let root = data_root("cycle");
    fs::write(
        root.join("ents/phoenix.json"),
        r#"{"name": "phoenix", "lifetime": 10, "death_spawn": "ashes"}"#,
    )
    .unwrap();
    fs::write(
        root.join("ents/ashes.json"),
        r#"{"name": "ashes", "lifetime": 10, "death_spawn": "phoenix"}"#,
    )
    .unwrap();

    let mut loader = Loader::new(&root);
    let phoenix = loader.ent_type("phoenix");
    let ashes = loader.catalog().lookup("ashes").unwrap();
    assert_ne!(phoenix, ashes);
    assert_eq!(loader.catalog().get(phoenix).death_spawn, Some(ashes));
    assert_eq!(loader.catalog().get(ashes).death_spawn, Some(phoenix));
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn an_invalid_type_document_keeps_the_defaults() {
    let root = data_root("bad-type");
    fs::write(root.join("ents/junk.json"), "{not json").unwrap();
    let mut loader = Loader::new(&root);
    let id = loader.ent_type("junk");
    let t = loader.catalog().get(id);
    assert_eq!(t.speed, 0.0);
    assert_eq!(t.lifetime, -1);
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn a_missing_texture_is_blank() {
    let root = data_root("missing-texture");
    let mut loader = Loader::new(&root);
    let t = loader.texture("nope.txt");
    assert_eq!(t.width(), 1);
    assert_eq!(t.get(0, 0), ' ');
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn a_map_document_loads_with_its_references() {
    let root = data_root("map");
    fs::write(
        root.join("maps/yard.json"),
        r#####"{
            "name": "Yard",
            "prereq": "lobby",
            "layout": ["####", "#..#", "####"],
            "player": [1.5, 1.5],
            "player_bullet": "spark",
            "ents": [{"type": "imp", "team": "enemy", "pos": [2.5, 1.5]}]
        }"#####,
    )
    .unwrap();

    let mut loader = Loader::new(&root);
    let map = loader.map("yard").unwrap();
    assert_eq!(map.name, "Yard");
    assert_eq!(map.prereq.as_deref(), Some("lobby"));
    assert_eq!(map.player_start, glam::Vec2::new(1.5, 1.5));
    assert!(map.walls_at(1, 1).contains(Walls::WEST));
    assert!(!map.walls_at(1, 1).contains(Walls::EAST));

    assert_eq!(map.starts.len(), 1);
    assert_eq!(map.starts[0].team, Team::Enemy);
    assert_eq!(map.starts[0].pos, glam::Vec2::new(2.5, 1.5));
    // Referenced types were registered even though their files are missing
    assert_eq!(map.starts[0].ty, loader.catalog().lookup("imp").unwrap());
    assert_eq!(map.player_bullet, loader.catalog().lookup("spark"));
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn a_missing_map_is_an_error() {
    let root = data_root("missing-map");
    let mut loader = Loader::new(&root);
    assert!(matches!(loader.map("void"), Err(LoadError::Io { .. })));
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn an_invalid_map_is_an_error() {
    let root = data_root("bad-map");
    fs::write(root.join("maps/torn.json"), "][").unwrap();
    let mut loader = Loader::new(&root);
    assert!(matches!(loader.map("torn"), Err(LoadError::BadMap { .. })));
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn map_listing_is_sorted_and_skips_dot_files() {
    let root = data_root("listing");
    fs::write(root.join("maps/b.json"), "{}").unwrap();
    fs::write(root.join("maps/a.json"), "{}").unwrap();
    fs::write(root.join("maps/.hidden.json"), "{}").unwrap();
    fs::write(root.join("maps/notes.txt"), "").unwrap();

    let names = list_maps(&root).unwrap();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    let _ = fs::remove_dir_all(&root);
}
