use std::fs;
use std::path::PathBuf;

use termraider::save::SaveState;

fn save_file(tag: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "termraider-save-{}-{}.json",
        tag,
        std::process::id()
    ));
    let _ = fs::remove_file(&path);
    path
}

#[test]
fn in_memory_saves_track_completion() {
    let mut save = SaveState::in_memory();
    assert!(!save.is_complete("lobby"));
    save.mark_complete("lobby");
    assert!(save.is_complete("lobby"));
    assert!(!save.is_complete("yard"));
}

#[test]
fn marks_write_through_and_reload() {
    let path = save_file("roundtrip");
    let mut save = SaveState::load(&path);
    assert!(!save.is_complete("lobby"));
    save.mark_complete("lobby");
    save.mark_complete("yard");

    let reloaded = SaveState::load(&path);
    assert!(reloaded.is_complete("lobby"));
    assert!(reloaded.is_complete("yard"));
    assert!(!reloaded.is_complete("attic"));
    let _ = fs::remove_file(&path);
}

#[test]
fn a_corrupt_save_starts_fresh_and_recovers() {
    let path = save_file("corrupt");
    fs::write(&path, "not a save").unwrap();

    let mut save = SaveState::load(&path);
    assert!(!save.is_complete("lobby"));
    save.mark_complete("lobby");

    let reloaded = SaveState::load(&path);
    assert!(reloaded.is_complete("lobby"));
    let _ = fs::remove_file(&path);
}
