//! Shot resolution per weapon kind

use glam::{Vec2, Vec3};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

use super::events::GameEvent;
use super::fire::FireSystem;
use super::grub::{DamageInfo, DamageKind, DamageSource, GrubId, GrubPos};
use super::ports::{EffectBuffer, GrubEffects, TerrainModifyMode, World};
use super::turn::TurnFlow;
use super::ClientId;

/// Launch speed of flames thrown by incendiary weapons
const FLAME_LAUNCH_SPEED: f32 = 5.0;

fn one() -> u32 {
    1
}

/// What a weapon does when it goes off
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeaponBehavior {
    /// Hits grubs in front of the holder
    Melee {
        damage: f32,
        range: f32,
        knockback: f32,
    },

    /// Instant ray with a small blast at the hit point.
    /// `burst > 1` fires one ray every `burst_interval` seconds.
    Hitscan {
        damage: f32,
        range: f32,
        blast_radius: f32,
        #[serde(default)]
        knockback: f32,
        #[serde(default = "one")]
        burst: u32,
        #[serde(default)]
        burst_interval: f32,
    },

    /// Launch speed scales with charge; flight is simulated externally
    Projectile { min_speed: f32, max_speed: f32 },

    /// Sets fire where the ray lands
    Incendiary { range: f32, flames: u32 },
}

impl WeaponBehavior {
    /// Number of stages one trigger pull resolves in
    pub fn stages(&self) -> u32 {
        match self {
            WeaponBehavior::Hitscan { burst, .. } => (*burst).max(1),
            _ => 1,
        }
    }

    pub fn stage_interval(&self) -> f32 {
        match self {
            WeaponBehavior::Hitscan { burst_interval, .. } => burst_interval.max(0.0),
            _ => 0.0,
        }
    }

    /// Resolve one stage of a shot
    pub fn resolve(&self, weapon: &str, charge: f32, shooter: &Shooter, step: &mut StepContext<'_>) {
        match *self {
            WeaponBehavior::Melee {
                damage,
                range,
                knockback,
            } => {
                for target in step.targets {
                    if !target.alive || target.id == shooter.grub {
                        continue;
                    }
                    let offset = target.position - shooter.origin;
                    if offset.length() > range || offset.dot(shooter.aim) < 0.0 {
                        continue;
                    }
                    step.effects
                        .apply_impulse(target.id, shooter.aim * knockback);
                    let info = DamageInfo {
                        amount: damage,
                        kind: DamageKind::Melee,
                        source: DamageSource::Grub(shooter.grub),
                        origin: shooter.origin,
                        force: shooter.aim * knockback,
                    };
                    step.effects.apply_damage(target.id, &info);
                }
            }
            WeaponBehavior::Hitscan {
                damage,
                range,
                blast_radius,
                knockback,
                ..
            } => {
                let end = shooter.origin + shooter.aim * range;
                let trace = step.world.cast_ray(shooter.origin, end);
                if !trace.hit {
                    return;
                }
                step.world.edit_circle(
                    Vec2::new(trace.point.x, trace.point.z),
                    blast_radius,
                    TerrainModifyMode::Remove,
                );
                apply_blast(
                    trace.point,
                    blast_radius,
                    knockback,
                    damage,
                    DamageSource::Grub(shooter.grub),
                    step.targets,
                    &mut *step.effects,
                );
                step.events.push(GameEvent::Impact {
                    weapon: weapon.to_string(),
                    position: trace.point,
                    radius: blast_radius,
                });
            }
            WeaponBehavior::Projectile {
                min_speed,
                max_speed,
            } => {
                let speed = min_speed + (max_speed - min_speed) * charge.clamp(0.0, 1.0);
                step.events.push(GameEvent::ProjectileLaunched {
                    grub: shooter.grub,
                    weapon: weapon.to_string(),
                    origin: shooter.origin,
                    velocity: shooter.aim * speed,
                });
            }
            WeaponBehavior::Incendiary { range, flames } => {
                let end = shooter.origin + shooter.aim * range;
                let trace = step.world.cast_ray(shooter.origin, end);
                for _ in 0..flames {
                    let id = step.fires.spawn(
                        trace.point,
                        shooter.aim * FLAME_LAUNCH_SPEED,
                        step.now,
                        &*step.world,
                        &mut *step.rng,
                    );
                    step.events.push(GameEvent::FireSpawned {
                        fire: id,
                        position: trace.point,
                    });
                }
            }
        }
    }
}

/// Knockback and damage for every living grub within `radius` of `center`,
/// both scaled by `1 - distance / radius`
pub fn apply_blast(
    center: Vec3,
    radius: f32,
    knockback: f32,
    damage: f32,
    source: DamageSource,
    targets: &[GrubPos],
    effects: &mut dyn GrubEffects,
) {
    if radius <= 0.0 {
        return;
    }

    for target in targets {
        if !target.alive {
            continue;
        }
        let dist = center.distance(target.position);
        if dist > radius {
            continue;
        }

        let falloff = 1.0 - (dist / radius).clamp(0.0, 1.0);
        let dir = (target.position - center).normalize_or_zero();
        effects.apply_impulse(target.id, dir * knockback * falloff);
        effects.apply_damage(
            target.id,
            &DamageInfo::from_explosion(damage * falloff, center, dir * knockback, source),
        );
    }
}

/// The grub pulling the trigger
#[derive(Debug, Clone, Copy)]
pub struct Shooter {
    pub grub: GrubId,
    pub team: usize,
    /// Client whose input drives the weapon
    pub client: ClientId,
    pub origin: Vec3,
    pub aim: Vec3,
}

/// Everything a system may touch during one simulation step
pub struct StepContext<'a> {
    pub now: f32,
    pub dt: f32,
    pub world: &'a mut dyn World,
    pub effects: &'a mut EffectBuffer,
    pub fires: &'a mut FireSystem,
    pub rng: &'a mut ChaCha8Rng,
    pub turn: &'a mut TurnFlow,
    pub events: &'a mut Vec<GameEvent>,
    /// Grub positions at the start of the step
    pub targets: &'a [GrubPos],
}
