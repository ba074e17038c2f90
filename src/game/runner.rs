//! Headless match driver - the fixed-rate tick loop and turn flow

use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::util::time::{SIMULATION_TPS, SNAPSHOT_TPS, TICK_DURATION_MICROS};

use super::events::GameEvent;
use super::ports::World;
use super::r#match::{GameMatch, MatchPhase};
use super::sandbox::SandboxWorld;
use super::snapshot::{MatchSnapshot, SnapshotBuilder, SnapshotStats};
use super::MatchError;

/// Per-step hooks the host world gets around the simulation step
pub trait StepHooks {
    /// Feed input for the coming step
    fn before_step(&mut self, _game: &GameMatch) {}
    /// Clear per-step input edges
    fn after_step(&mut self) {}
}

impl StepHooks for SandboxWorld {
    fn before_step(&mut self, game: &GameMatch) {
        self.autopilot(game);
    }

    fn after_step(&mut self) {
        self.end_frame();
    }
}

/// How a run finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Ended { winner: Option<usize> },
    TurnLimit,
    Shutdown,
}

/// Drives a [`GameMatch`] and plays the external game flow: equips a weapon
/// at the start of each turn and advances the turn once it is spent.
pub struct MatchRunner<W> {
    game: GameMatch,
    world: W,
    snapshot_tx: broadcast::Sender<MatchSnapshot>,
    snapshot_builder: SnapshotBuilder,
    stats: SnapshotStats,
    max_turns: u32,
}

impl<W: World + StepHooks> MatchRunner<W> {
    pub fn new(game: GameMatch, world: W, max_turns: u32) -> Self {
        let (snapshot_tx, _) = broadcast::channel(64);
        Self {
            game,
            world,
            snapshot_tx,
            snapshot_builder: SnapshotBuilder::new(SIMULATION_TPS / SNAPSHOT_TPS),
            stats: SnapshotStats::default(),
            max_turns,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MatchSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn game(&self) -> &GameMatch {
        &self.game
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    /// One simulation step plus turn flow. Returns every event raised.
    pub fn step(&mut self) -> Result<Vec<GameEvent>, MatchError> {
        self.world.before_step(&self.game);
        let mut events = self.game.run_tick(&mut self.world)?;
        self.world.after_step();

        if self.game.phase() == MatchPhase::InProgress {
            self.drive_turn()?;
            events.extend(self.game.take_events());
        }

        let important = events.iter().any(|e| {
            matches!(
                e,
                GameEvent::TurnStarted { .. } | GameEvent::MatchEnded { .. }
            )
        });
        self.snapshot_builder.push_events(events.iter().cloned());
        if important {
            self.snapshot_builder.force_next();
        }
        if self.snapshot_builder.should_send() {
            self.broadcast();
        }

        Ok(events)
    }

    fn drive_turn(&mut self) -> Result<(), MatchError> {
        let spent = self.game.turn().used_turn() && self.game.is_resolved();
        let time_up = self.game.time_in_turn() >= self.game.config().turn_seconds;
        let stuck = !self.game.active_grub_can_act() && self.game.is_resolved();

        if spent || time_up || stuck {
            if time_up && !spent {
                info!(turn = self.game.turn_number(), "Turn timed out");
            }
            return self.game.advance_turn(&mut self.world);
        }

        if !self.game.turn().movement_only() {
            self.equip_for_turn();
        }
        Ok(())
    }

    /// Give the active grub a weapon if it has none; rotates through the
    /// inventory turn by turn
    fn equip_for_turn(&mut self) {
        let Some(team) = self.game.teams().current_team() else {
            return;
        };
        if team.active_weapon().is_some() || !self.game.active_grub_can_act() {
            return;
        }

        let inventory = team.inventory();
        let len = inventory.len();
        if len == 0 {
            return;
        }
        let start = self.game.turn_number() as usize % len;
        let slot = (0..len)
            .map(|offset| (start + offset) % len)
            .find(|&slot| inventory.has_ammo(slot));

        if let Some(slot) = slot {
            if let Err(e) = self.game.equip_weapon(slot) {
                warn!(error = %e, slot, "Could not equip weapon");
            }
        }
    }

    fn broadcast(&mut self) {
        let snapshot = self.snapshot_builder.build(&self.game);
        let bytes = serde_json::to_vec(&snapshot).map(|b| b.len()).unwrap_or(0);
        self.stats.record(snapshot.events.len(), bytes);

        // No subscribers is fine
        let _ = self.snapshot_tx.send(snapshot);
    }

    fn finished(&self) -> Option<RunOutcome> {
        if self.game.phase() == MatchPhase::Ended {
            let winner = self.game.teams().living_teams().first().copied();
            return Some(RunOutcome::Ended { winner });
        }
        if self.game.turn_number() > self.max_turns {
            return Some(RunOutcome::TurnLimit);
        }
        None
    }

    /// Run the authoritative tick loop until the match ends, the turn limit
    /// is hit or `shutdown` resolves
    pub async fn run<F>(mut self, shutdown: F) -> Result<RunOutcome, MatchError>
    where
        F: Future<Output = ()>,
    {
        info!(match_id = %self.game.id(), "Match loop started");

        let mut tick_interval = interval(Duration::from_micros(TICK_DURATION_MICROS));
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let outcome = loop {
            tokio::select! {
                _ = tick_interval.tick() => {}
                _ = &mut shutdown => break RunOutcome::Shutdown,
            }

            self.step()?;

            if let Some(outcome) = self.finished() {
                break outcome;
            }
        };

        self.snapshot_builder.force_next();
        self.broadcast();

        info!(
            match_id = %self.game.id(),
            ?outcome,
            ticks = self.game.tick(),
            turns = self.game.turn_number(),
            "Match loop stopped"
        );
        debug!(
            snapshots = self.stats.total_snapshots,
            bytes = self.stats.total_bytes,
            avg_events = self.stats.avg_events_per_snapshot,
            "Snapshot stats"
        );
        Ok(outcome)
    }
}
