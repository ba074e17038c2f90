//! Collaborator interfaces the match core consumes.
//!
//! Rendering, physics, terrain storage and input polling live outside this
//! crate; the core only talks to them through these traits.

use glam::{Vec2, Vec3};
use serde::Serialize;

use super::grub::{DamageInfo, GrubId};
use super::ClientId;

/// Input actions the core polls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    PrimaryAttack,
}

pub trait InputSource {
    /// Held this step
    fn is_action_down(&self, client: ClientId, action: Action) -> bool;
    /// Went down this step
    fn is_action_pressed(&self, client: ClientId, action: Action) -> bool;
    /// Went up this step
    fn is_action_released(&self, client: ClientId, action: Action) -> bool;
}

/// Result of a ray or sweep
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TraceResult {
    pub hit: bool,
    pub point: Vec3,
    pub normal: Vec3,
}

impl TraceResult {
    pub fn miss(end: Vec3) -> Self {
        Self {
            hit: false,
            point: end,
            normal: Vec3::ZERO,
        }
    }
}

pub trait SpatialQuery {
    fn cast_ray(&self, from: Vec3, to: Vec3) -> TraceResult;
    fn cast_sphere_sweep(&self, radius: f32, from: Vec3, to: Vec3) -> TraceResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainModifyMode {
    Add,
    Remove,
}

pub trait TerrainMap {
    /// Edit the terrain in a disc on the (x, z) plane
    fn edit_circle(&mut self, center: Vec2, radius: f32, mode: TerrainModifyMode);
    /// A free spot to place a new grub
    fn spawn_location(&mut self) -> Vec3;
}

pub trait GrubEffects {
    fn apply_impulse(&mut self, grub: GrubId, impulse: Vec3);
    fn apply_damage(&mut self, grub: GrubId, damage: &DamageInfo);
}

/// Everything the host provides
pub trait World: InputSource + SpatialQuery + TerrainMap + GrubEffects {}

impl<T: InputSource + SpatialQuery + TerrainMap + GrubEffects> World for T {}

/// A deferred command against a grub
#[derive(Debug, Clone, PartialEq)]
pub enum GrubCommand {
    Impulse { grub: GrubId, impulse: Vec3 },
    Damage { grub: GrubId, damage: DamageInfo },
}

/// Collects grub effects during a step so they are applied after every
/// system has finished iterating.
#[derive(Debug, Default)]
pub struct EffectBuffer {
    commands: Vec<GrubCommand>,
}

impl EffectBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[GrubCommand] {
        &self.commands
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, GrubCommand> {
        self.commands.drain(..)
    }
}

impl GrubEffects for EffectBuffer {
    fn apply_impulse(&mut self, grub: GrubId, impulse: Vec3) {
        self.commands.push(GrubCommand::Impulse { grub, impulse });
    }

    fn apply_damage(&mut self, grub: GrubId, damage: &DamageInfo) {
        self.commands.push(GrubCommand::Damage {
            grub,
            damage: damage.clone(),
        });
    }
}
