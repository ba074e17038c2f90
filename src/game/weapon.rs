//! Weapon definitions and the per-instance firing state machine

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use super::events::GameEvent;
use super::inventory::Ammo;
use super::ports::Action;
use super::shot::{Shooter, StepContext, WeaponBehavior};

/// Charge units needed for a full-power shot; one unit per step held
pub const MAX_CHARGE: u32 = 100;

fn one() -> u32 {
    1
}

/// The way a weapon fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FiringType {
    /// Fires on the press edge
    Instant,
    /// Charges while held, fires on release or at full charge
    Charged,
}

/// A weapon kind definition
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeaponAsset {
    pub name: String,
    pub model: String,
    pub firing_type: FiringType,
    /// Times the weapon may be fired per turn
    #[serde(default = "one")]
    pub uses: u32,
    #[serde(default)]
    pub infinite_ammo: bool,
    /// Ammo billed when the weapon is put away after being used
    #[serde(default = "one")]
    pub ammo_cost: u32,
    pub behavior: WeaponBehavior,
}

/// Stages of a multi-stage shot still to resolve
#[derive(Debug, Clone, Copy)]
struct PendingStages {
    remaining: u32,
    next_at: f32,
    charge: f32,
}

/// A weapon instance held in a team inventory
#[derive(Debug, Clone)]
pub struct Weapon {
    asset: Arc<WeaponAsset>,
    ammo: Ammo,
    charge: u32,
    is_charging: bool,
    is_firing: bool,
    visible: bool,
    last_fire_at: Option<f32>,
    current_uses: u32,
    pending: Option<PendingStages>,
}

impl Weapon {
    pub fn new(asset: Arc<WeaponAsset>) -> Self {
        let ammo = if asset.infinite_ammo {
            Ammo::Unlimited
        } else {
            Ammo::Limited(0)
        };

        Self {
            asset,
            ammo,
            charge: 0,
            is_charging: false,
            is_firing: false,
            visible: false,
            last_fire_at: None,
            current_uses: 0,
            pending: None,
        }
    }

    pub fn asset(&self) -> &Arc<WeaponAsset> {
        &self.asset
    }

    pub fn name(&self) -> &str {
        &self.asset.name
    }

    pub fn ammo(&self) -> Ammo {
        self.ammo
    }

    pub fn add_ammo(&mut self, amount: u32) {
        self.ammo.add(amount);
    }

    pub fn take_ammo(&mut self) {
        self.ammo.take(self.asset.ammo_cost);
    }

    pub fn charge(&self) -> u32 {
        self.charge
    }

    pub fn is_charging(&self) -> bool {
        self.is_charging
    }

    pub fn is_firing(&self) -> bool {
        self.is_firing
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Times fired since it was equipped this turn
    pub fn current_uses(&self) -> u32 {
        self.current_uses
    }

    /// Not mid-action; safe for turn logic to move on
    pub fn resolved(&self) -> bool {
        !self.is_firing && !self.is_charging
    }

    pub fn time_since_fire(&self, now: f32) -> Option<f32> {
        self.last_fire_at.map(|at| now - at)
    }

    /// Equipped by a grub
    pub fn active_start(&mut self) {
        self.visible = true;
    }

    /// Put away. Bills ammo once if the weapon was used and always clears
    /// the per-turn use count, even when a charge or shot was interrupted.
    pub fn active_end(&mut self) {
        if self.current_uses > 0 {
            self.take_ammo();
        }

        self.visible = false;
        self.current_uses = 0;
        self.charge = 0;
        self.is_charging = false;
        // Remaining stages of an interrupted shot are dropped
        self.pending = None;
        self.is_firing = false;
    }

    /// Run one simulation step for the equipped weapon
    pub fn simulate(&mut self, shooter: &Shooter, step: &mut StepContext<'_>) {
        if self.pending.is_some() {
            self.continue_firing(shooter, step);
        }

        if step.turn.movement_only() || (self.is_firing && self.asset.uses <= 1) {
            return;
        }

        self.check_fire_input(shooter, step);
    }

    fn check_fire_input(&mut self, shooter: &Shooter, step: &mut StepContext<'_>) {
        let client = shooter.client;

        match self.asset.firing_type {
            FiringType::Charged => {
                if step.world.is_action_down(client, Action::PrimaryAttack) {
                    self.is_charging = true;
                    self.charge = (self.charge + 1).min(MAX_CHARGE);
                    if self.charge < MAX_CHARGE {
                        return;
                    }

                    self.is_charging = false;
                    self.fire(shooter, step);
                    self.charge = 0;
                    return;
                }

                if self.is_charging && step.world.is_action_released(client, Action::PrimaryAttack)
                {
                    self.is_charging = false;
                    self.fire(shooter, step);
                    self.charge = 0;
                }
            }
            FiringType::Instant => {
                if step.world.is_action_pressed(client, Action::PrimaryAttack) {
                    self.fire(shooter, step);
                }
            }
        }
    }

    fn fire(&mut self, shooter: &Shooter, step: &mut StepContext<'_>) {
        self.is_firing = true;
        self.last_fire_at = Some(step.now);
        self.current_uses += 1;

        let charge = self.charge as f32 / MAX_CHARGE as f32;
        step.events.push(GameEvent::WeaponFired {
            team: shooter.team,
            grub: shooter.grub,
            weapon: self.asset.name.clone(),
            charge,
        });

        if self.on_fire(charge, shooter, step) {
            return;
        }

        self.is_firing = false;
        self.on_fire_finish(shooter, step);
    }

    /// Resolve the first stage, returns true while more stages remain
    fn on_fire(&mut self, charge: f32, shooter: &Shooter, step: &mut StepContext<'_>) -> bool {
        let behavior = &self.asset.behavior;
        behavior.resolve(&self.asset.name, charge, shooter, step);

        let stages = behavior.stages();
        if stages <= 1 {
            return false;
        }

        self.pending = Some(PendingStages {
            remaining: stages - 1,
            next_at: step.now + behavior.stage_interval(),
            charge,
        });
        true
    }

    fn continue_firing(&mut self, shooter: &Shooter, step: &mut StepContext<'_>) {
        let Some(mut pending) = self.pending else {
            return;
        };
        if step.now < pending.next_at {
            return;
        }

        let behavior = &self.asset.behavior;
        behavior.resolve(&self.asset.name, pending.charge, shooter, step);
        pending.remaining -= 1;
        pending.next_at = step.now + behavior.stage_interval();

        if pending.remaining > 0 {
            self.pending = Some(pending);
            return;
        }

        debug!(weapon = %self.asset.name, "multi-stage shot resolved");
        self.pending = None;
        self.is_firing = false;
        self.on_fire_finish(shooter, step);
    }

    fn on_fire_finish(&mut self, shooter: &Shooter, step: &mut StepContext<'_>) {
        if self.current_uses >= self.asset.uses {
            step.turn.use_turn(shooter.team, true, step.events);
        }
    }
}
