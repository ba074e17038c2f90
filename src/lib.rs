//! Grub match core - turn rotation, weapon lifecycle, terrain zones and
//! spreading fire for a turn-based artillery game.
//!
//! The crate is headless: rendering, physics, input polling and terrain
//! storage are reached through the traits in [`game::ports`].

pub mod config;
pub mod game;
pub mod util;
