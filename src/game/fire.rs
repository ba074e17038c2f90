//! Spreading fire - a self-propelled hazard that burns terrain and grubs.
//!
//! Fire runs on continuous simulation time, not on turns: each hazard lives
//! for a fixed number of seconds and pulses every [`FIRE_TICK_RATE`] seconds
//! regardless of whose turn it is.

use std::fmt;

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::util::deferred::{PendingOp, PendingOps};

use super::events::GameEvent;
use super::grub::{DamageInfo, DamageKind, DamageSource, GrubPos};
use super::ports::{GrubEffects, SpatialQuery, TerrainMap, TerrainModifyMode};

/// Seconds between move-and-damage pulses
pub const FIRE_TICK_RATE: f32 = 0.15;
/// Upper bound of the random initial pulse offset
pub const FIRE_PULSE_JITTER: f32 = 0.25;
/// Lifetime of one hazard in seconds
pub const FIRE_LIFETIME: f32 = 3.0;
/// Radius of terrain erosion and damage
pub const FIRE_SIZE: f32 = 20.0;
pub const FIRE_KNOCKBACK: f32 = 1000.0;
pub const FIRE_DAMAGE: f32 = 6.0;
/// Distance moved per pulse along the movement direction
pub const FIRE_STEP: f32 = 1.5;
const FIRE_SPAWN_JITTER: f32 = 30.0;
const FIRE_UPWARD_FORCE: f32 = 32.0;
const GROUNDED_SPEED: f32 = 5.0;
const FALLING_SPEED: f32 = 10.0;
const POSITION_LERP_RATE: f32 = 10.0;
/// Slack on the expiry comparison. Step times are rounded to f32, so a
/// hazard spawned at one step can land a few ulps short of its lifetime on
/// the step it should expire. Far below one simulation step.
const EXPIRY_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FireId(pub Uuid);

impl FireId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FireId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Outcome of one step of a hazard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireTick {
    Burning,
    Pulsed,
    Expired,
}

#[derive(Debug, Clone)]
pub struct FireHazard {
    id: FireId,
    /// Smoothed position for presentation
    position: Vec3,
    desired_position: Vec3,
    move_direction: Vec3,
    expires_at: f32,
    last_pulse_at: f32,
}

impl FireHazard {
    /// Start a fire near `start`, travelling roughly along `movement_direction`
    pub fn new<Q, R>(
        start: Vec3,
        movement_direction: Vec3,
        now: f32,
        spatial: &Q,
        rng: &mut R,
    ) -> Self
    where
        Q: SpatialQuery + ?Sized,
        R: Rng,
    {
        let jitter = rng.gen_range(0..FIRE_SPAWN_JITTER as u32) as f32;
        let position = start + Vec3::new(jitter, 0.0, 0.0);

        let trace = spatial.cast_ray(start, start + movement_direction);
        let move_direction = if trace.hit {
            reflect(movement_direction, trace.normal)
        } else {
            -movement_direction / 2.0
        };

        Self {
            id: FireId::new(),
            position,
            desired_position: position,
            move_direction,
            expires_at: now + FIRE_LIFETIME,
            last_pulse_at: now - rng.gen_range(0.0..FIRE_PULSE_JITTER),
        }
    }

    pub fn id(&self) -> FireId {
        self.id
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn desired_position(&self) -> Vec3 {
        self.desired_position
    }

    pub fn move_direction(&self) -> Vec3 {
        self.move_direction
    }

    pub fn expires_at(&self) -> f32 {
        self.expires_at
    }

    pub fn resolved(&self, now: f32) -> bool {
        now + EXPIRY_EPSILON >= self.expires_at
    }

    /// Advance one simulation step
    pub fn tick<W, R>(
        &mut self,
        now: f32,
        dt: f32,
        world: &mut W,
        targets: &[GrubPos],
        effects: &mut dyn GrubEffects,
        rng: &mut R,
    ) -> FireTick
    where
        W: TerrainMap + SpatialQuery + ?Sized,
        R: Rng,
    {
        let t = (dt * POSITION_LERP_RATE).clamp(0.0, 1.0);
        self.position = self.position.lerp(self.desired_position, t);

        if self.resolved(now) {
            return FireTick::Expired;
        }

        if now - self.last_pulse_at < FIRE_TICK_RATE {
            return FireTick::Burning;
        }

        self.pulse(world, targets, effects, rng);
        self.last_pulse_at = now;
        FireTick::Pulsed
    }

    /// Burn, hurt, then move
    fn pulse<W, R>(
        &mut self,
        world: &mut W,
        targets: &[GrubPos],
        effects: &mut dyn GrubEffects,
        rng: &mut R,
    ) where
        W: TerrainMap + SpatialQuery + ?Sized,
        R: Rng,
    {
        let center = self.desired_position;
        world.edit_circle(
            Vec2::new(center.x, center.z),
            FIRE_SIZE,
            TerrainModifyMode::Remove,
        );

        for target in targets {
            if !target.alive {
                continue;
            }
            let dist = center.distance(target.position);
            if dist > FIRE_SIZE {
                continue;
            }

            let distance_factor = 1.0 - (dist / FIRE_SIZE).clamp(0.0, 1.0);
            let dir = (target.position - center).normalize_or_zero();
            effects.apply_impulse(target.id, dir * FIRE_KNOCKBACK * distance_factor);
            effects.apply_damage(
                target.id,
                &DamageInfo::from_explosion(
                    FIRE_DAMAGE,
                    center,
                    Vec3::Z * FIRE_UPWARD_FORCE,
                    DamageSource::Fire(self.id),
                )
                .with_kind(DamageKind::Fire),
            );
        }

        self.desired_position += self.move_direction * FIRE_STEP;
        let sweep = world.cast_sphere_sweep(FIRE_SIZE * 1.5, self.position, self.desired_position);

        if sweep.hit {
            let wander = Vec3::new(rng.gen_range(-1.0..1.0), 0.0, rng.gen_range(-1.0..1.0));
            self.move_direction += wander * 2.5;
            self.move_direction += sweep.normal * 0.5;
            self.move_direction = self.move_direction.normalize_or_zero() * GROUNDED_SPEED;
        } else {
            self.move_direction += Vec3::NEG_Z * 2.5;
            self.move_direction = self.move_direction.normalize_or_zero() * FALLING_SPEED;
        }
    }
}

/// Mirror `direction` about the plane with `normal`
fn reflect(direction: Vec3, normal: Vec3) -> Vec3 {
    let n = normal.normalize_or_zero();
    direction - 2.0 * direction.dot(n) * n
}

/// Owns every burning hazard.
///
/// New fires are staged and join the live set at the end of the step, so a
/// weapon spawning fire mid-step never touches the list being iterated.
#[derive(Debug, Default)]
pub struct FireSystem {
    fires: Vec<FireHazard>,
    staged: Vec<FireHazard>,
    pending: PendingOps<FireId>,
}

impl FireSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a new hazard; it starts burning from the next step
    pub fn spawn<Q, R>(
        &mut self,
        start: Vec3,
        movement_direction: Vec3,
        now: f32,
        spatial: &Q,
        rng: &mut R,
    ) -> FireId
    where
        Q: SpatialQuery + ?Sized,
        R: Rng,
    {
        let fire = FireHazard::new(start, movement_direction, now, spatial, rng);
        let id = fire.id();
        self.staged.push(fire);
        self.pending.queue_add(id);
        id
    }

    /// Step every live hazard, then apply staged spawns and expiries
    #[allow(clippy::too_many_arguments)]
    pub fn tick<W, R>(
        &mut self,
        now: f32,
        dt: f32,
        world: &mut W,
        targets: &[GrubPos],
        effects: &mut dyn GrubEffects,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) where
        W: TerrainMap + SpatialQuery + ?Sized,
        R: Rng,
    {
        for fire in &mut self.fires {
            if fire.tick(now, dt, world, targets, effects, rng) == FireTick::Expired {
                self.pending.queue_remove(fire.id());
            }
        }

        let fires = &mut self.fires;
        let staged = &mut self.staged;
        self.pending.drain(|op| match op {
            PendingOp::Add(id) => {
                if let Some(index) = staged.iter().position(|f| f.id() == id) {
                    fires.push(staged.swap_remove(index));
                }
            }
            PendingOp::Remove(id) => {
                fires.retain(|f| f.id() != id);
                debug!(fire_id = %id, "fire burned out");
                events.push(GameEvent::FireExpired { fire: id });
            }
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &FireHazard> {
        self.fires.iter()
    }

    /// Live hazards
    pub fn len(&self) -> usize {
        self.fires.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fires.is_empty() && self.staged.is_empty()
    }

    /// No hazard is burning or waiting to start
    pub fn resolved(&self, now: f32) -> bool {
        self.staged.is_empty() && self.fires.iter().all(|f| f.resolved(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::game::sandbox::SandboxWorld;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn direction_reflects_off_surface_or_halves_back() {
        let world = SandboxWorld::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let grounded = FireHazard::new(Vec3::ZERO, Vec3::new(1.0, 0.0, -1.0), 2.0, &world, &mut rng);
        assert_eq!(grounded.move_direction(), Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(grounded.expires_at(), 2.0 + FIRE_LIFETIME);
        assert_eq!(grounded.position(), grounded.desired_position());
        assert!(grounded.position().x >= 0.0 && grounded.position().x < FIRE_SPAWN_JITTER);

        let airborne = FireHazard::new(
            Vec3::new(0.0, 0.0, 50.0),
            Vec3::new(2.0, 0.0, 0.0),
            0.0,
            &world,
            &mut rng,
        );
        assert_eq!(airborne.move_direction(), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn reflect_flips_normal_component() {
        let out = reflect(Vec3::new(1.0, 0.0, -1.0), Vec3::Z);
        assert_eq!(out, Vec3::new(1.0, 0.0, 1.0));
    }
}
