//! Terrain zones - timed spatial triggers.
//!
//! Zones are committed with [`ZoneRegistry::finish`] and only join the live
//! set when the registry is ticked. Removals are staged the same way, so
//! logic running while the live set is iterated (a zone deciding to remove
//! itself from its own trigger) never changes the collection underneath it.

use std::collections::HashMap;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::util::deferred::{PendingOp, PendingOps};

use super::grub::{DamageInfo, DamageKind, DamageSource, Grub};
use super::ports::GrubEffects;
use super::{Authority, MatchError};

/// Expiry value for zones that never expire
pub const NEVER_EXPIRES: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub Uuid);

impl ZoneId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ZoneId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Shape of a zone, relative to its position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ZoneShape {
    /// Axis-aligned box centred on the position
    Box { size: Vec3 },
    Sphere { radius: f32 },
}

impl ZoneShape {
    /// Resolve into world space around `position`
    pub fn finish(&self, position: Vec3) -> ResolvedShape {
        match *self {
            ZoneShape::Box { size } => {
                let half = size * 0.5;
                ResolvedShape::Box {
                    mins: position - half,
                    maxs: position + half,
                }
            }
            ZoneShape::Sphere { radius } => ResolvedShape::Sphere {
                center: position,
                radius,
            },
        }
    }

    fn is_valid(&self) -> bool {
        match *self {
            ZoneShape::Box { size } => size.is_finite() && size.cmpgt(Vec3::ZERO).all(),
            ZoneShape::Sphere { radius } => radius.is_finite() && radius > 0.0,
        }
    }
}

/// World-space shape of a finished zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ResolvedShape {
    Box { mins: Vec3, maxs: Vec3 },
    Sphere { center: Vec3, radius: f32 },
}

impl ResolvedShape {
    pub fn contains(&self, point: Vec3) -> bool {
        match *self {
            ResolvedShape::Box { mins, maxs } => {
                point.cmpge(mins).all() && point.cmple(maxs).all()
            }
            ResolvedShape::Sphere { center, radius } => center.distance(point) <= radius,
        }
    }
}

/// What a zone does to grubs inside it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ZoneKind {
    Passive,
    Damage { amount: f32 },
    /// Deals whatever health the grub has left
    Kill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub position: Vec3,
    pub shape: ZoneShape,
    /// Turns until removal; negative never expires, 0 expires immediately
    pub expire_after_turns: i32,
    pub kind: ZoneKind,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            shape: ZoneShape::Box { size: Vec3::ONE },
            expire_after_turns: NEVER_EXPIRES,
            kind: ZoneKind::Passive,
        }
    }
}

impl ZoneConfig {
    pub fn validate(&self) -> Result<(), ZoneError> {
        if !self.position.is_finite() {
            return Err(ZoneError::InvalidPosition);
        }
        if !self.shape.is_valid() {
            return Err(ZoneError::InvalidShape(self.shape));
        }
        if self.expire_after_turns < NEVER_EXPIRES {
            return Err(ZoneError::InvalidExpiry(self.expire_after_turns));
        }
        if let ZoneKind::Damage { amount } = self.kind {
            if !amount.is_finite() || amount < 0.0 {
                return Err(ZoneError::InvalidDamage(amount));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ZoneError {
    #[error("zone position must be finite")]
    InvalidPosition,

    #[error("invalid zone shape {0:?}")]
    InvalidShape(ZoneShape),

    #[error("invalid zone expiry {0}, expected -1 or more")]
    InvalidExpiry(i32),

    #[error("invalid zone damage {0}")]
    InvalidDamage(f32),

    #[error("zone {0} not found")]
    NotFound(ZoneId),

    #[error("zone {0} was already finished")]
    AlreadyFinished(ZoneId),

    #[error(transparent)]
    Match(#[from] MatchError),
}

#[derive(Debug, Clone)]
pub struct TerrainZone {
    id: ZoneId,
    position: Vec3,
    shape: ZoneShape,
    resolved: Option<ResolvedShape>,
    expire_after_turns: i32,
    kind: ZoneKind,
}

impl TerrainZone {
    pub fn id(&self) -> ZoneId {
        self.id
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn shape(&self) -> ZoneShape {
        self.shape
    }

    pub fn kind(&self) -> ZoneKind {
        self.kind
    }

    pub fn expire_after_turns(&self) -> i32 {
        self.expire_after_turns
    }

    pub fn is_finished(&self) -> bool {
        self.resolved.is_some()
    }

    fn contains(&self, point: Vec3) -> bool {
        self.resolved
            .map(|shape| shape.contains(point))
            .unwrap_or(false)
    }
}

/// Zones that joined or left the live set during a tick
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ZoneDrain {
    pub added: Vec<ZoneId>,
    pub removed: Vec<ZoneId>,
}

pub struct ZoneRegistry {
    /// Every zone record, finished or not
    zones: HashMap<ZoneId, TerrainZone>,
    /// Zones visible to queries, in the order they went live
    live: Vec<ZoneId>,
    pending: PendingOps<ZoneId>,
    authority: Authority,
    debug: bool,
}

impl ZoneRegistry {
    pub fn new(authority: Authority) -> Self {
        Self {
            zones: HashMap::new(),
            live: Vec::new(),
            pending: PendingOps::new(),
            authority,
            debug: false,
        }
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Validate and stage a zone. It is invisible to queries until finished
    /// and ticked. An expiry of 0 queues its removal straight away.
    ///
    /// A zone must be finished within the turn it was created in; records
    /// still unfinished at turn end are dropped by [`Self::on_turn_end`].
    pub fn create(&mut self, config: ZoneConfig) -> Result<ZoneId, ZoneError> {
        self.authority.assert_server("zone.create")?;
        config.validate()?;

        let id = ZoneId::new();
        self.zones.insert(
            id,
            TerrainZone {
                id,
                position: config.position,
                shape: config.shape,
                resolved: None,
                expire_after_turns: NEVER_EXPIRES,
                kind: config.kind,
            },
        );
        self.set_expire_after_turns(id, config.expire_after_turns)?;
        Ok(id)
    }

    /// Resolve the shape and queue the zone to go live
    pub fn finish(&mut self, id: ZoneId) -> Result<(), ZoneError> {
        self.authority.assert_server("zone.finish")?;

        let zone = self.zones.get_mut(&id).ok_or(ZoneError::NotFound(id))?;
        if zone.resolved.is_some() {
            return Err(ZoneError::AlreadyFinished(id));
        }
        zone.resolved = Some(zone.shape.finish(zone.position));
        self.pending.queue_add(id);
        Ok(())
    }

    /// Turns until removal. Setting exactly 0 queues the zone for removal.
    pub fn set_expire_after_turns(&mut self, id: ZoneId, turns: i32) -> Result<(), ZoneError> {
        self.authority.assert_server("zone.set_expire")?;

        if turns < NEVER_EXPIRES {
            return Err(ZoneError::InvalidExpiry(turns));
        }
        let zone = self.zones.get_mut(&id).ok_or(ZoneError::NotFound(id))?;
        zone.expire_after_turns = turns;
        if turns == 0 {
            self.pending.queue_remove(id);
        }
        Ok(())
    }

    /// Queue a zone for removal at the next tick
    pub fn remove(&mut self, id: ZoneId) -> Result<(), ZoneError> {
        self.authority.assert_server("zone.remove")?;

        if !self.zones.contains_key(&id) {
            return Err(ZoneError::NotFound(id));
        }
        self.pending.queue_remove(id);
        Ok(())
    }

    /// Apply queued additions, then queued removals
    pub fn tick(&mut self) -> Result<ZoneDrain, MatchError> {
        self.authority.assert_server("zone.tick")?;

        let mut drain = ZoneDrain::default();
        let zones = &mut self.zones;
        let live = &mut self.live;
        self.pending.drain(|op| match op {
            PendingOp::Add(id) => {
                if zones.contains_key(&id) && !live.contains(&id) {
                    live.push(id);
                    drain.added.push(id);
                }
            }
            PendingOp::Remove(id) => {
                live.retain(|z| *z != id);
                if zones.remove(&id).is_some() {
                    drain.removed.push(id);
                }
            }
        });

        for id in &drain.removed {
            info!(zone_id = %id, "Zone removed");
        }

        if self.debug {
            for zone in self.live() {
                debug!(zone_id = %zone.id, shape = ?zone.resolved, kind = ?zone.kind, "zone debug");
            }
        }

        Ok(drain)
    }

    /// Count down every live zone with a turn limit and drop records that
    /// were never finished
    pub fn on_turn_end(&mut self) -> Result<(), MatchError> {
        self.authority.assert_server("zone.turn_end")?;

        for id in &self.live {
            let Some(zone) = self.zones.get_mut(id) else {
                continue;
            };
            if zone.expire_after_turns > 0 {
                zone.expire_after_turns -= 1;
                if zone.expire_after_turns == 0 {
                    self.pending.queue_remove(*id);
                }
            }
        }

        let before = self.zones.len();
        self.zones.retain(|_, zone| zone.resolved.is_some());
        let dropped = before - self.zones.len();
        if dropped > 0 {
            warn!(dropped, "Dropped zones that were never finished");
        }
        Ok(())
    }

    /// Whether `point` is inside a live zone; `None` if the zone is not live
    pub fn in_zone(&self, id: ZoneId, point: Vec3) -> Option<bool> {
        if !self.is_live(id) {
            return None;
        }
        self.zones.get(&id).map(|zone| zone.contains(point))
    }

    /// Live zones containing `point`
    pub fn zones_at(&self, point: Vec3) -> Vec<ZoneId> {
        self.live()
            .filter(|zone| zone.contains(point))
            .map(|zone| zone.id)
            .collect()
    }

    /// Act on a grub inside a live zone. Returns whether anything was applied.
    pub fn trigger(
        &self,
        id: ZoneId,
        grub: &Grub,
        effects: &mut dyn GrubEffects,
    ) -> Result<bool, ZoneError> {
        self.authority.assert_server("zone.trigger")?;

        if !self.is_live(id) {
            return Err(ZoneError::NotFound(id));
        }
        let zone = self.zones.get(&id).ok_or(ZoneError::NotFound(id))?;
        if !grub.is_alive() || !zone.contains(grub.position) {
            return Ok(false);
        }

        let (amount, kind) = match zone.kind {
            ZoneKind::Passive => return Ok(false),
            ZoneKind::Damage { amount } => (amount, DamageKind::Explosion),
            ZoneKind::Kill => (grub.health, DamageKind::KillTrigger),
        };

        effects.apply_damage(
            grub.id,
            &DamageInfo {
                amount,
                kind,
                source: DamageSource::Zone(id),
                origin: zone.position,
                force: Vec3::ZERO,
            },
        );
        Ok(true)
    }

    /// Trigger every live zone on every grub inside it
    pub fn trigger_occupants<'g>(
        &self,
        grubs: impl IntoIterator<Item = &'g Grub>,
        effects: &mut dyn GrubEffects,
    ) -> Result<usize, ZoneError> {
        let grubs: Vec<&Grub> = grubs.into_iter().filter(|g| g.is_alive()).collect();
        let mut triggered = 0;

        for &id in &self.live {
            for grub in &grubs {
                if self.trigger(id, grub, effects)? {
                    triggered += 1;
                }
            }
        }

        if triggered > 0 {
            info!(triggered, "Zones acted on grubs at end of turn");
        }
        Ok(triggered)
    }

    pub fn get(&self, id: ZoneId) -> Option<&TerrainZone> {
        self.zones.get(&id)
    }

    pub fn is_live(&self, id: ZoneId) -> bool {
        self.live.contains(&id)
    }

    pub fn is_remove_queued(&self, id: ZoneId) -> bool {
        self.pending.is_remove_queued(&id)
    }

    pub fn is_add_queued(&self, id: ZoneId) -> bool {
        self.pending.is_add_queued(&id)
    }

    pub fn live(&self) -> impl Iterator<Item = &TerrainZone> {
        self.live.iter().filter_map(|id| self.zones.get(id))
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
