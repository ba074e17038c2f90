//! Team rotation - who acts next within one team

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{error, info, warn};

use super::catalog::WeaponCatalog;
use super::events::GameEvent;
use super::grub::{Grub, GrubId};
use super::inventory::{Ammo, Inventory, PickupOutcome};
use super::ports::TerrainMap;
use super::shot::{Shooter, StepContext};
use super::weapon::{Weapon, WeaponAsset};
use super::{Authority, ClientId, MatchError};

/// A named, numbered group of grubs and the clients controlling them
#[derive(Debug, Clone)]
pub struct Team {
    name: String,
    number: usize,
    /// Participating clients, front is next to act
    clients: VecDeque<ClientId>,
    grubs: VecDeque<Grub>,
    active_client: ClientId,
    active_grub: GrubId,
    inventory: Inventory,
    authority: Authority,
}

impl Team {
    /// Build a team with `grub_count` grubs placed by the terrain.
    /// The first client and grub start out active.
    pub fn new<T: TerrainMap + ?Sized>(
        clients: Vec<ClientId>,
        name: String,
        number: usize,
        catalog: &WeaponCatalog,
        grub_count: usize,
        terrain: &mut T,
        authority: Authority,
    ) -> Result<Self, MatchError> {
        let clients: VecDeque<ClientId> = clients.into();
        let Some(&active_client) = clients.front() else {
            return Err(MatchError::NoClients);
        };
        if grub_count == 0 {
            return Err(MatchError::NoGrubs);
        }

        let grubs: VecDeque<Grub> = (0..grub_count)
            .map(|i| Grub::new(format!("Grub {}", i + 1), number, terrain.spawn_location()))
            .collect();
        let active_grub = grubs[0].id;

        info!(team = %name, number, clients = clients.len(), grubs = grub_count, "Team created");

        Ok(Self {
            name,
            number,
            clients,
            grubs,
            active_client,
            active_grub,
            inventory: Inventory::from_catalog(catalog),
            authority,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self) -> usize {
        self.number
    }

    /// Clients in rotation order
    pub fn clients(&self) -> impl Iterator<Item = &ClientId> {
        self.clients.iter()
    }

    /// Grubs in rotation order
    pub fn grubs(&self) -> impl Iterator<Item = &Grub> {
        self.grubs.iter()
    }

    pub fn grub(&self, id: GrubId) -> Option<&Grub> {
        self.grubs.iter().find(|g| g.id == id)
    }

    pub fn grub_mut(&mut self, id: GrubId) -> Option<&mut Grub> {
        self.grubs.iter_mut().find(|g| g.id == id)
    }

    pub fn active_client(&self) -> ClientId {
        self.active_client
    }

    pub fn active_grub_id(&self) -> GrubId {
        self.active_grub
    }

    pub fn active_grub(&self) -> Option<&Grub> {
        self.grub(self.active_grub)
    }

    pub fn active_grub_mut(&mut self) -> Option<&mut Grub> {
        let id = self.active_grub;
        self.grub_mut(id)
    }

    /// Weapon equipped by the active grub
    pub fn active_weapon(&self) -> Option<&Weapon> {
        let slot = self.active_grub()?.equipped?;
        self.inventory.get(slot)
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Every grub's death has been finalised
    pub fn team_dead(&self) -> bool {
        self.grubs.iter().all(Grub::is_dead)
    }

    /// Move the front client to the back and make the new front active
    pub fn pick_next_client(&mut self) -> Result<ClientId, MatchError> {
        self.authority.assert_server("team.pick_next_client")?;

        self.clients.rotate_left(1);
        if let Some(&front) = self.clients.front() {
            self.active_client = front;
        }
        Ok(self.active_client)
    }

    /// Rotate to the next grub that is not dead.
    ///
    /// Gives up after one full rotation; the grub list is then back in its
    /// original order and the team is reported as eliminated.
    pub fn pick_next_grub(&mut self) -> Result<GrubId, MatchError> {
        self.authority.assert_server("team.pick_next_grub")?;

        for _ in 0..self.grubs.len() {
            self.grubs.rotate_left(1);
            let Some(front) = self.grubs.front() else {
                break;
            };
            if !front.is_dead() {
                self.active_grub = front.id;
                return Ok(self.active_grub);
            }
        }

        warn!(team = %self.name, "No living grub left to pick");
        Err(MatchError::TeamEliminated {
            team: self.name.clone(),
        })
    }

    /// Grant ammo for a carried weapon kind. Returns false if the kind is
    /// not carried, which is logged and otherwise ignored.
    pub fn give_ammo(
        &mut self,
        weapon: &str,
        amount: u32,
        events: &mut Vec<GameEvent>,
    ) -> Result<bool, MatchError> {
        self.authority.assert_server("team.give_ammo")?;

        let Some(index) = self.inventory.position(weapon) else {
            error!(team = %self.name, weapon, "Cannot give ammo for a weapon the team does not carry");
            return Ok(false);
        };

        if let Some(item) = self.inventory.get_mut(index) {
            item.add_ammo(amount);
        }

        events.push(GameEvent::AmmoGained {
            team: self.number,
            recipients: self.clients.iter().copied().collect(),
            weapon: weapon.to_string(),
            amount,
        });
        Ok(true)
    }

    /// Pick up one unit of a weapon kind
    pub fn pick_up_weapon(
        &mut self,
        asset: Arc<WeaponAsset>,
        events: &mut Vec<GameEvent>,
    ) -> Result<PickupOutcome, MatchError> {
        self.authority.assert_server("team.pick_up_weapon")?;

        let mut weapon = Weapon::new(asset);
        weapon.add_ammo(1);
        let name = weapon.name().to_string();

        let outcome = self.inventory.add(weapon);
        let ammo = self
            .inventory
            .get(outcome.index())
            .map(|w| w.ammo())
            .unwrap_or(Ammo::Limited(0));

        info!(team = %self.name, weapon = %name, ?outcome, "Weapon picked up");
        events.push(GameEvent::WeaponPickedUp {
            team: self.number,
            recipients: self.clients.iter().copied().collect(),
            weapon: name,
            ammo,
        });
        Ok(outcome)
    }

    /// Equip inventory slot `slot` on the active grub
    pub fn equip(&mut self, slot: usize, events: &mut Vec<GameEvent>) -> Result<(), MatchError> {
        self.authority.assert_server("team.equip")?;

        let Some(grub) = self.active_grub() else {
            return Err(MatchError::GrubCannotAct);
        };
        if !grub.is_alive() {
            return Err(MatchError::GrubCannotAct);
        }
        if grub.equipped == Some(slot) {
            return Ok(());
        }

        let Some(weapon) = self.inventory.get(slot) else {
            return Err(MatchError::InvalidWeaponSlot(slot));
        };
        if !weapon.ammo().has_any() {
            return Err(MatchError::NoAmmo(weapon.name().to_string()));
        }

        self.holster()?;

        let grub_id = self.active_grub;
        let weapon = self
            .inventory
            .get_mut(slot)
            .ok_or(MatchError::InvalidWeaponSlot(slot))?;
        weapon.active_start();
        let name = weapon.name().to_string();

        if let Some(grub) = self.active_grub_mut() {
            grub.equipped = Some(slot);
        }
        self.inventory.set_last_used(slot);

        events.push(GameEvent::WeaponEquipped {
            team: self.number,
            grub: grub_id,
            weapon: name,
        });
        Ok(())
    }

    /// Put away the active grub's weapon
    pub fn holster(&mut self) -> Result<(), MatchError> {
        self.authority.assert_server("team.holster")?;

        let slot = self.active_grub_mut().and_then(|grub| grub.equipped.take());
        if let Some(weapon) = slot.and_then(|slot| self.inventory.get_mut(slot)) {
            weapon.active_end();
        }
        Ok(())
    }

    /// Finalise deaths and drive the active grub's weapon for one step
    pub fn simulate(&mut self, step: &mut StepContext<'_>, is_active_team: bool) {
        for grub in self.grubs.iter_mut() {
            if !grub.tick(step.now) {
                continue;
            }

            info!(team = %self.name, grub = %grub.name, "Grub died");
            step.events.push(GameEvent::GrubDied {
                grub: grub.id,
                team: self.number,
            });

            if let Some(weapon) = grub.equipped.take().and_then(|s| self.inventory.get_mut(s)) {
                weapon.active_end();
            }
        }

        if !is_active_team {
            return;
        }

        let active_grub = self.active_grub;
        let Some(grub) = self.grubs.iter().find(|g| g.id == active_grub) else {
            return;
        };
        if !grub.is_alive() {
            return;
        }
        let Some(slot) = grub.equipped else {
            return;
        };

        let shooter = Shooter {
            grub: grub.id,
            team: self.number,
            client: self.active_client,
            origin: grub.position,
            aim: grub.aim,
        };
        if let Some(weapon) = self.inventory.get_mut(slot) {
            weapon.simulate(&shooter, step);
        }
    }
}
