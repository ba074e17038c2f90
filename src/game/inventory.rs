//! Team weapon inventory

use serde::{Deserialize, Serialize};

use super::catalog::WeaponCatalog;
use super::weapon::Weapon;

/// Remaining ammo for a weapon. Serialised as `-1` for unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum Ammo {
    Unlimited,
    Limited(u32),
}

impl Ammo {
    pub fn is_unlimited(self) -> bool {
        self == Ammo::Unlimited
    }

    /// Whether the weapon can be used at all
    pub fn has_any(self) -> bool {
        !matches!(self, Ammo::Limited(0))
    }

    /// Unlimited ammo is never incremented
    pub fn add(&mut self, amount: u32) {
        if let Ammo::Limited(count) = self {
            *count = count.saturating_add(amount);
        }
    }

    /// Unlimited ammo is never decremented
    pub fn take(&mut self, amount: u32) {
        if let Ammo::Limited(count) = self {
            *count = count.saturating_sub(amount);
        }
    }
}

impl From<i32> for Ammo {
    fn from(value: i32) -> Self {
        if value < 0 {
            Ammo::Unlimited
        } else {
            Ammo::Limited(value as u32)
        }
    }
}

impl From<Ammo> for i32 {
    fn from(ammo: Ammo) -> Self {
        match ammo {
            Ammo::Unlimited => -1,
            Ammo::Limited(count) => count.min(i32::MAX as u32) as i32,
        }
    }
}

/// Result of handing a weapon to an inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupOutcome {
    /// First weapon of its kind, stored at `index`
    Added { index: usize },
    /// Already carried; the existing entry's ammo went up
    AmmoIncreased { index: usize, ammo: Ammo },
    /// Already carried with unlimited ammo, nothing changed
    Unchanged { index: usize },
}

impl PickupOutcome {
    pub fn index(self) -> usize {
        match self {
            PickupOutcome::Added { index }
            | PickupOutcome::AmmoIncreased { index, .. }
            | PickupOutcome::Unchanged { index } => index,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Inventory {
    items: Vec<Weapon>,
    last_used: Option<usize>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// One weapon per catalog entry
    pub fn from_catalog(catalog: &WeaponCatalog) -> Self {
        let mut inventory = Self::new();
        for asset in catalog.iter() {
            inventory.add(Weapon::new(asset.clone()));
        }
        inventory
    }

    /// Add a weapon. Picking up a kind already carried adds one ammo to the
    /// existing entry instead of a second entry.
    pub fn add(&mut self, weapon: Weapon) -> PickupOutcome {
        if let Some(index) = self.position(weapon.name()) {
            let existing = &mut self.items[index];
            if existing.ammo().is_unlimited() {
                return PickupOutcome::Unchanged { index };
            }
            existing.add_ammo(1);
            return PickupOutcome::AmmoIncreased {
                index,
                ammo: existing.ammo(),
            };
        }

        self.items.push(weapon);
        PickupOutcome::Added {
            index: self.items.len() - 1,
        }
    }

    pub fn is_carrying(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|item| item.name() == name)
    }

    pub fn has_ammo(&self, index: usize) -> bool {
        self.items
            .get(index)
            .map(|item| item.ammo().has_any())
            .unwrap_or(false)
    }

    pub fn get(&self, index: usize) -> Option<&Weapon> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Weapon> {
        self.items.get_mut(index)
    }

    pub fn items(&self) -> &[Weapon] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Last weapon equipped, kept for UI and resume
    pub fn last_used(&self) -> Option<usize> {
        self.last_used
    }

    pub fn set_last_used(&mut self, index: usize) {
        if index < self.items.len() {
            self.last_used = Some(index);
        }
    }
}
