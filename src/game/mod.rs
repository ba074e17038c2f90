//! Match simulation modules

pub mod catalog;
pub mod events;
pub mod fire;
pub mod grub;
pub mod inventory;
pub mod manager;
pub mod r#match;
pub mod ports;
pub mod runner;
pub mod sandbox;
pub mod shot;
pub mod snapshot;
pub mod team;
pub mod turn;
pub mod weapon;
pub mod zone;

pub use catalog::{CatalogError, WeaponCatalog};
pub use events::GameEvent;
pub use fire::{FireHazard, FireId, FireSystem};
pub use grub::{DamageInfo, DamageKind, DamageSource, Grub, GrubId, LifeState};
pub use inventory::{Ammo, Inventory, PickupOutcome};
pub use manager::TeamManager;
pub use r#match::{GameMatch, MatchPhase};
pub use ports::{Action, GrubEffects, InputSource, SpatialQuery, TerrainMap, TraceResult, World};
pub use runner::{MatchRunner, RunOutcome, StepHooks};
pub use sandbox::SandboxWorld;
pub use snapshot::{MatchSnapshot, SnapshotBuilder};
pub use team::Team;
pub use turn::TurnFlow;
pub use weapon::{FiringType, Weapon, WeaponAsset, MAX_CHARGE};
pub use zone::{ZoneConfig, ZoneError, ZoneId, ZoneKind, ZoneRegistry, ZoneShape};

use tracing::error;
use uuid::Uuid;

/// A participating client (player connection or bot)
pub type ClientId = Uuid;

/// Which side of the simulation a component lives on.
///
/// Only the authoritative side may mutate turn, inventory or zone state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    Server,
    Client,
}

impl Authority {
    pub fn is_server(self) -> bool {
        self == Authority::Server
    }

    /// Reject `op` unless running on the authoritative side
    pub fn assert_server(self, op: &'static str) -> Result<(), MatchError> {
        if self.is_server() {
            return Ok(());
        }
        error!(op, "mutating operation invoked without authority");
        Err(MatchError::NotAuthoritative { op })
    }
}

/// Precondition violations in turn and inventory handling
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("{op} requires server authority")]
    NotAuthoritative { op: &'static str },

    #[error("team index {index} out of range ({len} teams)")]
    TeamIndexOutOfRange { index: usize, len: usize },

    #[error("team {team} has no living grubs")]
    TeamEliminated { team: String },

    #[error("a team needs at least one client")]
    NoClients,

    #[error("a team needs at least one grub")]
    NoGrubs,

    #[error("a match needs at least two teams, has {0}")]
    NotEnoughTeams(usize),

    #[error("match is not in progress")]
    MatchNotRunning,

    #[error("no weapon in inventory slot {0}")]
    InvalidWeaponSlot(usize),

    #[error("{0} has no ammo")]
    NoAmmo(String),

    #[error("active grub cannot act")]
    GrubCannotAct,
}
