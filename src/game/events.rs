//! Notifications produced by the match core.
//! Consumed by match flow and broadcast to clients for presentation.

use glam::Vec3;
use serde::Serialize;

use super::fire::FireId;
use super::grub::{DamageKind, GrubId};
use super::inventory::Ammo;
use super::zone::ZoneId;
use super::ClientId;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GameEvent {
    MatchStarted {
        seed: u64,
        teams: usize,
    },

    TurnStarted {
        turn: u32,
        team: usize,
        client: ClientId,
        grub: GrubId,
    },

    /// The turn is over; `forced` when a weapon used up its uses
    TurnEnded {
        team: usize,
        forced: bool,
    },

    WeaponEquipped {
        team: usize,
        grub: GrubId,
        weapon: String,
    },

    WeaponFired {
        team: usize,
        grub: GrubId,
        weapon: String,
        /// Charge at release, 0..=1
        charge: f32,
    },

    /// A projectile handed to external physics
    ProjectileLaunched {
        grub: GrubId,
        weapon: String,
        origin: Vec3,
        velocity: Vec3,
    },

    Impact {
        weapon: String,
        position: Vec3,
        radius: f32,
    },

    /// Sent to every client of the team
    AmmoGained {
        team: usize,
        recipients: Vec<ClientId>,
        weapon: String,
        amount: u32,
    },

    /// Sent to every client of the team
    WeaponPickedUp {
        team: usize,
        recipients: Vec<ClientId>,
        weapon: String,
        ammo: Ammo,
    },

    GrubDamaged {
        grub: GrubId,
        amount: f32,
        kind: DamageKind,
        health: f32,
    },

    GrubDied {
        grub: GrubId,
        team: usize,
    },

    TeamEliminated {
        team: usize,
    },

    ZoneAdded {
        zone: ZoneId,
    },

    ZoneRemoved {
        zone: ZoneId,
    },

    FireSpawned {
        fire: FireId,
        position: Vec3,
    },

    FireExpired {
        fire: FireId,
    },

    MatchEnded {
        winner: Option<usize>,
    },
}
