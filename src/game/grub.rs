//! Grubs - the individual combatants of a team

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fire::FireId;
use super::zone::ZoneId;

pub const GRUB_MAX_HEALTH: f32 = 150.0;

/// Seconds a dying grub lingers before its death is finalised
pub const DEATH_SETTLE_SECONDS: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GrubId(pub Uuid);

impl GrubId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GrubId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GrubId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeState {
    Alive,
    Dying,
    Dead,
}

/// All the ways a grub can be damaged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageKind {
    None,
    Explosion,
    Melee,
    Fire,
    /// Falling from a great height
    Fall,
    /// Touching an instant kill zone
    KillTrigger,
    Admin,
}

/// What dealt the damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "id", rename_all = "snake_case")]
pub enum DamageSource {
    World,
    Grub(GrubId),
    Zone(ZoneId),
    Fire(FireId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageInfo {
    pub amount: f32,
    pub kind: DamageKind,
    pub source: DamageSource,
    /// Where the damage came from
    pub origin: Vec3,
    pub force: Vec3,
}

impl DamageInfo {
    pub fn from_explosion(amount: f32, origin: Vec3, force: Vec3, source: DamageSource) -> Self {
        Self {
            amount,
            kind: DamageKind::Explosion,
            source,
            origin,
            force,
        }
    }

    pub fn with_kind(mut self, kind: DamageKind) -> Self {
        self.kind = kind;
        self
    }
}

/// A single grub (authoritative)
#[derive(Debug, Clone)]
pub struct Grub {
    pub id: GrubId,
    pub name: String,
    /// Number of the owning team
    pub team: usize,
    pub position: Vec3,
    /// Normalised aim direction
    pub aim: Vec3,
    pub health: f32,
    pub life_state: LifeState,
    /// Inventory slot of the equipped weapon
    pub equipped: Option<usize>,
    pub died_at: Option<f32>,
}

impl Grub {
    pub fn new(name: String, team: usize, position: Vec3) -> Self {
        Self {
            id: GrubId::new(),
            name,
            team,
            position,
            aim: Vec3::new(1.0, 0.0, -0.5).normalize(),
            health: GRUB_MAX_HEALTH,
            life_state: LifeState::Alive,
            equipped: None,
            died_at: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.life_state == LifeState::Alive
    }

    pub fn is_dead(&self) -> bool {
        self.life_state == LifeState::Dead
    }

    /// Point the grub's weapon. Zero vectors are ignored.
    pub fn set_aim(&mut self, direction: Vec3) {
        if let Some(aim) = direction.try_normalize() {
            self.aim = aim;
        }
    }

    /// Apply damage, returns true if this hit started the grub dying
    pub fn take_damage(&mut self, damage: &DamageInfo, now: f32) -> bool {
        if !self.is_alive() {
            return false;
        }

        self.health = (self.health - damage.amount.max(0.0)).max(0.0);
        if self.health > 0.0 {
            return false;
        }

        self.life_state = LifeState::Dying;
        self.died_at = Some(now);
        true
    }

    /// Advance the death timer, returns true when death was finalised this step
    pub fn tick(&mut self, now: f32) -> bool {
        if self.life_state != LifeState::Dying {
            return false;
        }

        let died_at = self.died_at.unwrap_or(now);
        if now - died_at < DEATH_SETTLE_SECONDS {
            return false;
        }

        self.life_state = LifeState::Dead;
        true
    }
}

/// Read-only view of a grub taken at the start of a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrubPos {
    pub id: GrubId,
    pub team: usize,
    pub position: Vec3,
    pub alive: bool,
}

impl From<&Grub> for GrubPos {
    fn from(grub: &Grub) -> Self {
        Self {
            id: grub.id,
            team: grub.team,
            position: grub.position,
            alive: grub.is_alive(),
        }
    }
}
