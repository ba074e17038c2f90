//! Snapshot building for presentation clients

use glam::Vec3;
use serde::Serialize;
use uuid::Uuid;

use super::events::GameEvent;
use super::fire::FireId;
use super::grub::{GrubId, LifeState};
use super::inventory::Ammo;
use super::r#match::{GameMatch, MatchPhase};
use super::zone::{ZoneId, ZoneKind, ZoneShape};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrubSnapshot {
    pub id: GrubId,
    pub name: String,
    pub position: Vec3,
    pub health: f32,
    pub life_state: LifeState,
    pub equipped: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeaponSnapshot {
    pub name: String,
    pub ammo: Ammo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSnapshot {
    pub name: String,
    pub number: usize,
    pub active_grub: GrubId,
    pub dead: bool,
    pub grubs: Vec<GrubSnapshot>,
    pub weapons: Vec<WeaponSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneSnapshot {
    pub id: ZoneId,
    pub position: Vec3,
    pub shape: ZoneShape,
    pub kind: ZoneKind,
    pub expire_after_turns: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FireSnapshot {
    pub id: FireId,
    pub position: Vec3,
}

/// Read-only view of a match, sent to presentation clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSnapshot {
    pub match_id: Uuid,
    pub tick: u64,
    pub phase: MatchPhase,
    pub turn: u32,
    pub active_team: usize,
    pub movement_only: bool,
    pub teams: Vec<TeamSnapshot>,
    pub zones: Vec<ZoneSnapshot>,
    pub fires: Vec<FireSnapshot>,
    pub events: Vec<GameEvent>,
}

impl MatchSnapshot {
    pub fn capture(game: &GameMatch, events: Vec<GameEvent>) -> Self {
        let teams = game
            .teams()
            .teams()
            .iter()
            .map(|team| {
                let inventory = team.inventory();
                TeamSnapshot {
                    name: team.name().to_string(),
                    number: team.number(),
                    active_grub: team.active_grub_id(),
                    dead: team.team_dead(),
                    grubs: team
                        .grubs()
                        .map(|g| GrubSnapshot {
                            id: g.id,
                            name: g.name.clone(),
                            position: g.position,
                            health: g.health,
                            life_state: g.life_state,
                            equipped: g
                                .equipped
                                .and_then(|slot| inventory.get(slot))
                                .map(|w| w.name().to_string()),
                        })
                        .collect(),
                    weapons: inventory
                        .items()
                        .iter()
                        .map(|w| WeaponSnapshot {
                            name: w.name().to_string(),
                            ammo: w.ammo(),
                        })
                        .collect(),
                }
            })
            .collect();

        let zones = game
            .zones()
            .live()
            .map(|z| ZoneSnapshot {
                id: z.id(),
                position: z.position(),
                shape: z.shape(),
                kind: z.kind(),
                expire_after_turns: z.expire_after_turns(),
            })
            .collect();

        let fires = game
            .fires()
            .iter()
            .map(|f| FireSnapshot {
                id: f.id(),
                position: f.position(),
            })
            .collect();

        Self {
            match_id: game.id(),
            tick: game.tick(),
            phase: game.phase(),
            turn: game.turn_number(),
            active_team: game.teams().current_index(),
            movement_only: game.turn().movement_only(),
            teams,
            zones,
            fires,
            events,
        }
    }
}

/// Decides when a snapshot goes out
pub struct SnapshotBuilder {
    /// Tick counter since last snapshot
    ticks_since_snapshot: u32,
    /// Snapshot interval in ticks
    snapshot_interval: u32,
    /// Events held back until the next snapshot
    pending_events: Vec<GameEvent>,
}

impl SnapshotBuilder {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            ticks_since_snapshot: 0,
            snapshot_interval: snapshot_interval.max(1),
            pending_events: Vec::new(),
        }
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_snapshot += 1;
        if self.ticks_since_snapshot >= self.snapshot_interval {
            self.ticks_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Force snapshot on next check (used for important events)
    pub fn force_next(&mut self) {
        self.ticks_since_snapshot = self.snapshot_interval;
    }

    /// Queue events for the next snapshot
    pub fn push_events(&mut self, events: impl IntoIterator<Item = GameEvent>) {
        self.pending_events.extend(events);
    }

    /// Build a snapshot carrying every event queued since the last one
    pub fn build(&mut self, game: &GameMatch) -> MatchSnapshot {
        MatchSnapshot::capture(game, std::mem::take(&mut self.pending_events))
    }
}

/// Snapshot size stats for debugging
#[derive(Debug, Default)]
pub struct SnapshotStats {
    pub total_snapshots: u64,
    pub total_bytes: u64,
    pub avg_events_per_snapshot: f32,
}

impl SnapshotStats {
    pub fn record(&mut self, event_count: usize, bytes: usize) {
        self.total_snapshots += 1;
        self.total_bytes += bytes as u64;

        // Running average
        let n = self.total_snapshots as f32;
        self.avg_events_per_snapshot =
            self.avg_events_per_snapshot * ((n - 1.0) / n) + (event_count as f32 / n);
    }
}
