//! Simulation core of a terminal-rendered first-person shooter.
//!
//! A level is a grid of walled cells populated by entities described by
//! shared, name-cached templates ([`ent::EntityType`]). Each frame the game
//! loop ([`level::play_level`]) polls one input event, resolves movement and
//! collisions against the wall grid, lets entities chase and shoot at the
//! player, advances every instance's animation/lifetime state machine, and
//! decides win/lose. Rendering and input are behind the [`level::Frontend`]
//! and [`level::InputSource`] traits so the whole loop runs headless in tests.

pub mod assets;
pub mod display;
pub mod ent;
pub mod level;
pub mod map;
pub mod physics;
pub mod player;
pub mod save;
