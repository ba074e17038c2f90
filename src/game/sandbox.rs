//! In-process world for the headless binary and tests.
//!
//! A flat ground plane at `z = ground`, scripted per-client input and a
//! record of every terrain edit, impulse and damage command the core issues.

use std::collections::HashSet;

use glam::{Vec2, Vec3};
use tracing::trace;

use super::grub::{DamageInfo, GrubId};
use super::ports::{
    Action, GrubEffects, InputSource, SpatialQuery, TerrainMap, TerrainModifyMode, TraceResult,
};
use super::r#match::{GameMatch, MatchPhase};
use super::weapon::FiringType;
use super::ClientId;

/// Horizontal distance between spawned grubs
const SPAWN_SPACING: f32 = 64.0;
/// Charge the autopilot holds a charged weapon to before letting go
const AUTOPILOT_CHARGE: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainEdit {
    pub center: Vec2,
    pub radius: f32,
    pub mode: TerrainModifyMode,
}

#[derive(Debug, Default)]
pub struct SandboxWorld {
    ground: f32,
    held: HashSet<(ClientId, Action)>,
    pressed: HashSet<(ClientId, Action)>,
    released: HashSet<(ClientId, Action)>,
    next_spawn_x: f32,
    pub edits: Vec<TerrainEdit>,
    pub impulses: Vec<(GrubId, Vec3)>,
    pub damage: Vec<(GrubId, DamageInfo)>,
}

impl SandboxWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ground(ground: f32) -> Self {
        Self {
            ground,
            ..Self::default()
        }
    }

    /// Press and hold an action
    pub fn press(&mut self, client: ClientId, action: Action) {
        if self.held.insert((client, action)) {
            self.pressed.insert((client, action));
        }
    }

    pub fn release(&mut self, client: ClientId, action: Action) {
        if self.held.remove(&(client, action)) {
            self.released.insert((client, action));
        }
    }

    /// Forget this step's press and release edges; held actions stay held
    pub fn end_frame(&mut self) {
        self.pressed.clear();
        self.released.clear();
    }

    /// Play the active client of a running match: equipped weapons are
    /// tapped, charged weapons are held to a fixed charge and let go.
    pub fn autopilot(&mut self, game: &GameMatch) {
        if game.phase() != MatchPhase::InProgress {
            return;
        }
        let Some(team) = game.teams().current_team() else {
            return;
        };
        let client = team.active_client();
        let action = Action::PrimaryAttack;

        let weapon = match team.active_weapon() {
            Some(weapon) if !game.turn().movement_only() => weapon,
            _ => {
                self.release(client, action);
                return;
            }
        };

        if !self.is_action_down(client, action) {
            if weapon.resolved() {
                self.press(client, action);
            }
            return;
        }

        let keep_charging =
            weapon.asset().firing_type == FiringType::Charged && weapon.charge() < AUTOPILOT_CHARGE;
        if !keep_charging {
            self.release(client, action);
        }
    }

    /// Whether a point lies on or below the ground
    fn below(&self, point: Vec3, margin: f32) -> bool {
        point.z <= self.ground + margin
    }

    fn trace_plane(&self, from: Vec3, to: Vec3, plane: f32) -> TraceResult {
        if from.z < plane {
            return TraceResult {
                hit: true,
                point: from,
                normal: Vec3::Z,
            };
        }
        if to.z > plane {
            return TraceResult::miss(to);
        }

        let span = from.z - to.z;
        let t = if span > f32::EPSILON {
            (from.z - plane) / span
        } else {
            0.0
        };
        TraceResult {
            hit: true,
            point: from.lerp(to, t),
            normal: Vec3::Z,
        }
    }
}

impl InputSource for SandboxWorld {
    fn is_action_down(&self, client: ClientId, action: Action) -> bool {
        self.held.contains(&(client, action))
    }

    fn is_action_pressed(&self, client: ClientId, action: Action) -> bool {
        self.pressed.contains(&(client, action))
    }

    fn is_action_released(&self, client: ClientId, action: Action) -> bool {
        self.released.contains(&(client, action))
    }
}

impl SpatialQuery for SandboxWorld {
    fn cast_ray(&self, from: Vec3, to: Vec3) -> TraceResult {
        self.trace_plane(from, to, self.ground)
    }

    fn cast_sphere_sweep(&self, radius: f32, from: Vec3, to: Vec3) -> TraceResult {
        // Sphere touching the ground anywhere along the sweep
        if self.below(from, radius) || self.below(to, radius) {
            let mut trace = self.trace_plane(from, to, self.ground + radius);
            trace.hit = true;
            return trace;
        }
        TraceResult::miss(to)
    }
}

impl TerrainMap for SandboxWorld {
    fn edit_circle(&mut self, center: Vec2, radius: f32, mode: TerrainModifyMode) {
        trace!(?center, radius, ?mode, "terrain edit");
        self.edits.push(TerrainEdit {
            center,
            radius,
            mode,
        });
    }

    fn spawn_location(&mut self) -> Vec3 {
        let location = Vec3::new(self.next_spawn_x, 0.0, self.ground);
        self.next_spawn_x += SPAWN_SPACING;
        location
    }
}

impl GrubEffects for SandboxWorld {
    fn apply_impulse(&mut self, grub: GrubId, impulse: Vec3) {
        self.impulses.push((grub, impulse));
    }

    fn apply_damage(&mut self, grub: GrubId, damage: &DamageInfo) {
        self.damage.push((grub, damage.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn ray_into_ground_hits_at_plane() {
        let world = SandboxWorld::new();
        let trace = world.cast_ray(Vec3::new(0.0, 0.0, 10.0), Vec3::new(10.0, 0.0, -10.0));
        assert!(trace.hit);
        assert_eq!(trace.point, Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(trace.normal, Vec3::Z);
    }

    #[test]
    fn ray_above_ground_misses() {
        let world = SandboxWorld::new();
        let trace = world.cast_ray(Vec3::new(0.0, 0.0, 10.0), Vec3::new(10.0, 0.0, 5.0));
        assert!(!trace.hit);
        assert_eq!(trace.point, Vec3::new(10.0, 0.0, 5.0));
    }

    #[test]
    fn press_edges_last_one_frame() {
        let mut world = SandboxWorld::new();
        let client = Uuid::new_v4();

        world.press(client, Action::PrimaryAttack);
        assert!(world.is_action_pressed(client, Action::PrimaryAttack));
        world.end_frame();
        assert!(!world.is_action_pressed(client, Action::PrimaryAttack));
        assert!(world.is_action_down(client, Action::PrimaryAttack));

        world.release(client, Action::PrimaryAttack);
        assert!(world.is_action_released(client, Action::PrimaryAttack));
        assert!(!world.is_action_down(client, Action::PrimaryAttack));
    }

    #[test]
    fn spawn_locations_are_spaced_along_x() {
        let mut world = SandboxWorld::with_ground(2.0);
        assert_eq!(world.spawn_location(), Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(world.spawn_location(), Vec3::new(SPAWN_SPACING, 0.0, 2.0));
    }
}
