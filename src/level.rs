//! The per-frame game loop: input dispatch, modal popups, win/lose
//! detection, and the fixed per-tick simulation sequence.
//!
//! Rendering and input sit behind the [`Frontend`] and [`InputSource`]
//! traits so [`play_level`] runs unchanged against a real terminal or a
//! scripted harness in tests.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::ent::{Ents, Team, TypeCatalog};
use crate::map::Map;
use crate::physics;
use crate::player::Player;
use crate::save::SaveState;

/// Ticks one turn key press keeps rotating. Smooths out terminals whose
/// key repeat is slow to kick in.
pub const TURN_DURATION: i32 = 5;

// ── Collaborator contracts ────────────────────────────────────────────────────

/// Decoded input events. How raw keys map to these is the input backend's
/// business.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Forward,
    Back,
    StrafeLeft,
    StrafeRight,
    TurnCcw,
    TurnCw,
    Shoot,
    Pause,
    Quit,
    Confirm,
    Cancel,
}

/// Poll one event without blocking. `None` is the common, cheap answer.
pub trait InputSource {
    fn poll_key(&mut self) -> Option<Key>;
}

/// Modal popup currently owning the screen, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Popup {
    Dead,
    Paused,
    Quitting,
}

/// Everything the HUD needs for one frame.
#[derive(Clone, Copy, Debug)]
pub struct Hud {
    pub remaining: usize,
    pub won: bool,
    pub health: f32,
    pub reload: f32,
    pub popup: Option<Popup>,
}

/// One frame's worth of world state, borrowed for the duration of a draw.
pub struct Scene<'a> {
    pub map: &'a Map,
    pub ents: &'a Ents,
    pub catalog: &'a TypeCatalog,
    pub player: &'a Player,
    pub hud: Hud,
}

/// Rendering collaborator: draws the scene and reports the viewport size.
pub trait Frontend {
    fn viewport(&self) -> (u16, u16);
    fn present(&mut self, scene: &Scene) -> std::io::Result<()>;
    /// Audible feedback for a combat hit on the player's side.
    fn alert(&mut self);
}

/// How a level session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelOutcome {
    /// Player won and confirmed the return to menu.
    Won,
    /// Player quit, or died and returned to the menu.
    Aborted,
    /// The map's prerequisite level is not complete yet.
    Locked,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Playing,
    Paused,
    Quitting,
    Dead,
}

// ── Seeding ───────────────────────────────────────────────────────────────────

/// Create the instances the map asks for. Enemy-team instances are the
/// level's objectives.
pub fn seed_entities(catalog: &TypeCatalog, map: &Map, rng: &mut impl Rng) -> Ents {
    let mut ents = Ents::with_capacity(map.starts.len() * 2);
    for start in &map.starts {
        let id = ents.add(catalog, start.ty, start.team, start.pos, rng);
        *ents.worth_mut(id) = start.team == Team::Enemy;
    }
    ents
}

// ── Input decoding ────────────────────────────────────────────────────────────

// Translation keys latch: the same key again cancels, a different one
// replaces. Turn keys arm a counted burst of rotation ticks.
fn decode_movement(key: Key, translation: &mut Option<Key>, turn_ticks: &mut i32) {
    match key {
        Key::Forward | Key::Back | Key::StrafeLeft | Key::StrafeRight => {
            *translation = if *translation == Some(key) {
                None
            } else {
                Some(key)
            };
        }
        Key::TurnCcw => *turn_ticks = TURN_DURATION,
        Key::TurnCw => *turn_ticks = -TURN_DURATION,
        _ => {}
    }
}

fn apply_movement(player: &mut Player, translation: Option<Key>, turn_ticks: &mut i32) {
    use std::f32::consts::{FRAC_PI_2, PI};
    match translation {
        Some(Key::Forward) => player.walk(0.0),
        Some(Key::Back) => player.walk(PI),
        Some(Key::StrafeLeft) => player.walk(FRAC_PI_2),
        Some(Key::StrafeRight) => player.walk(-FRAC_PI_2),
        _ => {}
    }
    if *turn_ticks > 0 {
        player.turn_ccw();
        *turn_ticks -= 1;
    } else if *turn_ticks < 0 {
        player.turn_cw();
        *turn_ticks += 1;
    }
}

// ── The loop ──────────────────────────────────────────────────────────────────

/// Play one level to completion.
///
/// Each iteration: detect a viewport resize, recount objectives, redraw if
/// anything changed, poll one input event, then either service the current
/// modal popup (skipping the simulation) or dispatch movement intents and
/// run the full tick sequence. Winning is sticky; while dead, the world
/// keeps ticking behind the popup and only the return-to-menu confirm is
/// consumed. A win is recorded in the save state when the session ends.
pub fn play_level(
    map: &Map,
    catalog: &TypeCatalog,
    save: &mut SaveState,
    frontend: &mut impl Frontend,
    input: &mut impl InputSource,
    tick_rate: Duration,
    rng: &mut impl Rng,
) -> std::io::Result<LevelOutcome> {
    if let Some(prereq) = &map.prereq {
        if !save.is_complete(prereq) {
            return Ok(LevelOutcome::Locked);
        }
    }

    let mut ents = seed_entities(catalog, map, rng);
    let mut player = Player::new(map.player_start, map.player_bullet);
    let mut mode = Mode::Playing;
    let mut won = false;
    let mut redraw = true;
    let mut translation: Option<Key> = None;
    let mut turn_ticks: i32 = 0;
    let mut viewport = (0u16, 0u16);

    let outcome = loop {
        let frame_start = Instant::now();

        let size = frontend.viewport();
        let resized = size != viewport;
        if resized {
            viewport = size;
            redraw = true;
        }

        let remaining = ents.remaining_worth(catalog);
        won = won || (remaining == 0 && !player.is_dead());
        if !won && player.is_dead() && mode != Mode::Dead {
            // Dead outranks any popup already up.
            mode = Mode::Dead;
            redraw = true;
        }

        if redraw {
            let popup = match mode {
                Mode::Dead => Some(Popup::Dead),
                Mode::Quitting => Some(Popup::Quitting),
                Mode::Paused => Some(Popup::Paused),
                Mode::Playing => None,
            };
            frontend.present(&Scene {
                map,
                ents: &ents,
                catalog,
                player: &player,
                hud: Hud {
                    remaining,
                    won,
                    health: player.health_fraction(),
                    reload: player.reload_fraction(),
                    popup,
                },
            })?;
        }
        redraw = resized;

        let key = input.poll_key();

        // Paused and Quitting are fully modal: only their own keys are
        // consumed and the simulation below is skipped.
        match mode {
            Mode::Quitting => {
                match key {
                    Some(Key::Confirm) => break LevelOutcome::Aborted,
                    Some(Key::Cancel) => {
                        mode = Mode::Playing;
                        redraw = true;
                    }
                    _ => {}
                }
                pace(frame_start, tick_rate);
                continue;
            }
            Mode::Paused => {
                match key {
                    Some(Key::Pause) => {
                        mode = Mode::Playing;
                        redraw = true;
                    }
                    Some(Key::Quit) => {
                        mode = Mode::Quitting;
                        redraw = true;
                    }
                    _ => {}
                }
                pace(frame_start, tick_rate);
                continue;
            }
            Mode::Playing | Mode::Dead => {}
        }

        redraw = true;
        let mut shoot = false;
        if won && key == Some(Key::Confirm) {
            break LevelOutcome::Won;
        } else if mode == Mode::Dead {
            // Entities keep ticking behind the popup; only Confirm counts.
            if key == Some(Key::Confirm) {
                break LevelOutcome::Aborted;
            }
        } else {
            match key {
                Some(Key::Pause) => {
                    mode = Mode::Paused;
                    redraw = true;
                    pace(frame_start, tick_rate);
                    continue;
                }
                Some(Key::Quit) => {
                    mode = Mode::Quitting;
                    redraw = true;
                    pace(frame_start, tick_rate);
                    continue;
                }
                Some(Key::Shoot) => shoot = true,
                Some(k) => decode_movement(k, &mut translation, &mut turn_ticks),
                None => {}
            }
            apply_movement(&mut player, translation, &mut turn_ticks);
        }

        // The fixed per-tick sequence; order is a contract.
        physics::move_ents(&mut ents, catalog, map, &mut player, rng);
        player.collide(&mut ents, catalog);
        physics::hit_ents(&ents, catalog, || frontend.alert());
        if shoot {
            player.try_shoot(&mut ents, catalog, rng);
        }
        physics::shoot_bullets(&mut ents, catalog, rng);
        player.tick();
        ents.tick(catalog, rng);
        ents.clean_up(catalog);
        pace(frame_start, tick_rate);
    };

    if won {
        save.mark_complete(&map.name);
    }
    Ok(outcome)
}

fn pace(frame_start: Instant, tick_rate: Duration) {
    let elapsed = frame_start.elapsed();
    if elapsed < tick_rate {
        std::thread::sleep(tick_rate - elapsed);
    }
}
