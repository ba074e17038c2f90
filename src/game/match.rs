//! Match state and the authoritative simulation step

use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::util::time::SimClock;

use super::catalog::WeaponCatalog;
use super::events::GameEvent;
use super::fire::{FireId, FireSystem};
use super::grub::GrubId;
use super::inventory::PickupOutcome;
use super::manager::TeamManager;
use super::ports::{EffectBuffer, GrubCommand, SpatialQuery, TerrainMap, World};
use super::shot::StepContext;
use super::snapshot::MatchSnapshot;
use super::turn::TurnFlow;
use super::zone::{ZoneConfig, ZoneError, ZoneId, ZoneRegistry};
use super::{Authority, ClientId, MatchError};

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Teams are being added
    Waiting,
    /// Match in progress
    InProgress,
    /// Match ended
    Ended,
}

/// One match: teams, zones, fire and turn flow, advanced one step at a time.
///
/// Owned by whoever drives the simulation and passed explicitly; nothing in
/// here is global.
pub struct GameMatch {
    id: Uuid,
    seed: u64,
    phase: MatchPhase,
    clock: SimClock,
    rng: ChaCha8Rng,
    config: GameConfig,
    catalog: WeaponCatalog,
    authority: Authority,
    teams: TeamManager,
    zones: ZoneRegistry,
    fires: FireSystem,
    turn: TurnFlow,
    /// Grub commands collected during a step
    effects: EffectBuffer,
    /// Events raised by commands, delivered with the next step
    outbox: Vec<GameEvent>,
    turn_number: u32,
    turn_started_at: f32,
    /// Teams already reported as eliminated
    eliminated: Vec<bool>,
}

impl GameMatch {
    pub fn new(seed: u64, config: GameConfig, catalog: WeaponCatalog, authority: Authority) -> Self {
        let mut zones = ZoneRegistry::new(authority);
        zones.set_debug(config.zone_debug);

        Self {
            id: Uuid::new_v4(),
            seed,
            phase: MatchPhase::Waiting,
            clock: SimClock::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
            catalog,
            authority,
            teams: TeamManager::new(authority),
            zones,
            fires: FireSystem::new(),
            turn: TurnFlow::new(),
            effects: EffectBuffer::new(),
            outbox: Vec::new(),
            turn_number: 0,
            turn_started_at: 0.0,
            eliminated: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn catalog(&self) -> &WeaponCatalog {
        &self.catalog
    }

    pub fn teams(&self) -> &TeamManager {
        &self.teams
    }

    pub fn zones(&self) -> &ZoneRegistry {
        &self.zones
    }

    pub fn fires(&self) -> &FireSystem {
        &self.fires
    }

    pub fn turn(&self) -> &TurnFlow {
        &self.turn
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    pub fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// Simulation time in seconds
    pub fn now(&self) -> f32 {
        self.clock.now()
    }

    /// Seconds since the current turn started
    pub fn time_in_turn(&self) -> f32 {
        self.clock.now() - self.turn_started_at
    }

    /// Events raised by commands since the last step
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Add a team before the match starts
    pub fn add_team<T: TerrainMap + ?Sized>(
        &mut self,
        clients: Vec<ClientId>,
        terrain: &mut T,
    ) -> Result<usize, MatchError> {
        if self.phase != MatchPhase::Waiting {
            return Err(MatchError::MatchNotRunning);
        }
        let index = self
            .teams
            .add_team(clients, &self.catalog, &self.config, terrain)?;
        self.eliminated.push(false);
        Ok(index)
    }

    /// Activate the first team and begin turn one
    pub fn start(&mut self) -> Result<(), MatchError> {
        self.authority.assert_server("match.start")?;

        if self.phase != MatchPhase::Waiting {
            return Err(MatchError::MatchNotRunning);
        }
        if self.teams.len() < 2 {
            return Err(MatchError::NotEnoughTeams(self.teams.len()));
        }

        self.teams.set_active_team(0)?;
        self.phase = MatchPhase::InProgress;
        self.outbox.push(GameEvent::MatchStarted {
            seed: self.seed,
            teams: self.teams.len(),
        });
        info!(match_id = %self.id, seed = self.seed, teams = self.teams.len(), "Match started");

        self.begin_turn();
        Ok(())
    }

    /// Run a single simulation step against the host world
    pub fn run_tick(&mut self, world: &mut dyn World) -> Result<Vec<GameEvent>, MatchError> {
        self.authority.assert_server("match.tick")?;

        let mut events = self.take_events();
        if self.phase != MatchPhase::InProgress {
            return Ok(events);
        }

        let now = self.clock.advance();
        let dt = self.clock.dt();
        let targets = self.teams.grub_positions();

        {
            let mut step = StepContext {
                now,
                dt,
                world: &mut *world,
                effects: &mut self.effects,
                fires: &mut self.fires,
                rng: &mut self.rng,
                turn: &mut self.turn,
                events: &mut events,
                targets: &targets,
            };
            self.teams.simulate(&mut step);
        }

        self.fires.tick(
            now,
            dt,
            &mut *world,
            &targets,
            &mut self.effects,
            &mut self.rng,
            &mut events,
        );

        // Zone adds and removes only become visible here
        let drain = self.zones.tick()?;
        events.extend(drain.added.into_iter().map(|zone| GameEvent::ZoneAdded { zone }));
        events.extend(drain.removed.into_iter().map(|zone| GameEvent::ZoneRemoved { zone }));

        self.apply_effects(world, &mut events);
        Ok(events)
    }

    /// Apply the grub commands collected this step, then report teams
    /// whose last grub died
    fn apply_effects(&mut self, world: &mut dyn World, events: &mut Vec<GameEvent>) {
        let now = self.clock.now();

        for command in self.effects.drain() {
            match command {
                GrubCommand::Impulse { grub, impulse } => {
                    world.apply_impulse(grub, impulse);
                }
                GrubCommand::Damage { grub, damage } => {
                    let Some(target) = self.teams.grub_mut(grub) else {
                        warn!(grub = %grub, "Damage for unknown grub");
                        continue;
                    };
                    if !target.is_alive() {
                        continue;
                    }

                    let started_dying = target.take_damage(&damage, now);
                    events.push(GameEvent::GrubDamaged {
                        grub,
                        amount: damage.amount,
                        kind: damage.kind,
                        health: target.health,
                    });
                    if started_dying {
                        info!(grub = %target.name, kind = ?damage.kind, "Grub is dying");
                    }
                    world.apply_damage(grub, &damage);
                }
            }
        }

        for (index, team) in self.teams.teams().iter().enumerate() {
            let Some(reported) = self.eliminated.get_mut(index) else {
                continue;
            };
            if !*reported && team.team_dead() {
                *reported = true;
                warn!(team = %team.name(), "Team eliminated");
                events.push(GameEvent::TeamEliminated { team: index });
            }
        }
    }

    /// End the current turn and hand over to the next living team.
    ///
    /// Holsters the active weapon, counts down zone expiry, lets zones act
    /// on their occupants and ends the match when fewer than two teams are
    /// left.
    pub fn advance_turn(&mut self, world: &mut dyn World) -> Result<(), MatchError> {
        self.authority.assert_server("match.advance_turn")?;

        if self.phase != MatchPhase::InProgress {
            return Err(MatchError::MatchNotRunning);
        }

        let current = self.teams.current_index();
        if let Some(team) = self.teams.current_team_mut() {
            team.holster()?;
        }
        if !self.turn.used_turn() {
            self.turn.use_turn(current, false, &mut self.outbox);
        }

        self.zones.on_turn_end()?;
        if let Err(e) = self.zones.trigger_occupants(self.teams.grubs(), &mut self.effects) {
            error!(error = %e, "Zone trigger failed");
        }
        let mut events = std::mem::take(&mut self.outbox);
        self.apply_effects(world, &mut events);
        self.outbox = events;

        self.turn.reset();

        let living = self.teams.living_teams();
        if living.len() < 2 {
            self.end(living.first().copied());
            return Ok(());
        }

        self.teams.cycle_living()?;
        self.begin_turn();
        Ok(())
    }

    fn begin_turn(&mut self) {
        self.turn_number += 1;
        self.turn_started_at = self.clock.now();

        let Some(team) = self.teams.current_team() else {
            return;
        };
        info!(
            match_id = %self.id,
            turn = self.turn_number,
            team = %team.name(),
            "Turn started"
        );
        self.outbox.push(GameEvent::TurnStarted {
            turn: self.turn_number,
            team: self.teams.current_index(),
            client: team.active_client(),
            grub: team.active_grub_id(),
        });
    }

    fn end(&mut self, winner: Option<usize>) {
        self.phase = MatchPhase::Ended;
        info!(match_id = %self.id, winner = ?winner, turns = self.turn_number, "Match ended");
        self.outbox.push(GameEvent::MatchEnded { winner });
    }

    fn require_running(&self, op: &'static str) -> Result<(), MatchError> {
        self.authority.assert_server(op)?;
        if self.phase != MatchPhase::InProgress {
            return Err(MatchError::MatchNotRunning);
        }
        Ok(())
    }

    /// Equip an inventory slot on the active grub of the active team
    pub fn equip_weapon(&mut self, slot: usize) -> Result<(), MatchError> {
        self.require_running("match.equip_weapon")?;

        let team = self
            .teams
            .current_team_mut()
            .ok_or(MatchError::MatchNotRunning)?;
        team.equip(slot, &mut self.outbox)
    }

    pub fn holster(&mut self) -> Result<(), MatchError> {
        self.require_running("match.holster")?;

        match self.teams.current_team_mut() {
            Some(team) => team.holster(),
            None => Ok(()),
        }
    }

    /// Point the active grub's weapon
    pub fn set_aim(&mut self, direction: Vec3) -> Result<(), MatchError> {
        self.require_running("match.set_aim")?;

        let grub = self
            .teams
            .current_team_mut()
            .and_then(|team| team.active_grub_mut())
            .ok_or(MatchError::GrubCannotAct)?;
        grub.set_aim(direction);
        Ok(())
    }

    /// Sync a grub's position from external physics
    pub fn set_grub_position(&mut self, grub: GrubId, position: Vec3) -> Result<(), MatchError> {
        self.authority.assert_server("match.set_grub_position")?;

        if let Some(grub) = self.teams.grub_mut(grub) {
            grub.position = position;
        }
        Ok(())
    }

    pub fn give_ammo(&mut self, team: usize, weapon: &str, amount: u32) -> Result<bool, MatchError> {
        self.authority.assert_server("match.give_ammo")?;

        let len = self.teams.len();
        let team = self
            .teams
            .team_mut(team)
            .ok_or(MatchError::TeamIndexOutOfRange { index: team, len })?;
        team.give_ammo(weapon, amount, &mut self.outbox)
    }

    /// Hand a team one unit of a catalog weapon. Unknown kinds are logged
    /// and ignored.
    pub fn pick_up_weapon(
        &mut self,
        team: usize,
        weapon: &str,
    ) -> Result<Option<PickupOutcome>, MatchError> {
        self.authority.assert_server("match.pick_up_weapon")?;

        let Some(asset) = self.catalog.get(weapon).cloned() else {
            error!(weapon, "Unknown weapon kind picked up");
            return Ok(None);
        };

        let len = self.teams.len();
        let team = self
            .teams
            .team_mut(team)
            .ok_or(MatchError::TeamIndexOutOfRange { index: team, len })?;
        team.pick_up_weapon(asset, &mut self.outbox).map(Some)
    }

    /// Start a fire outside of any weapon, e.g. from an exploding barrel
    pub fn spawn_fire<Q: SpatialQuery + ?Sized>(
        &mut self,
        position: Vec3,
        direction: Vec3,
        spatial: &Q,
    ) -> Result<FireId, MatchError> {
        self.authority.assert_server("match.spawn_fire")?;

        let id = self
            .fires
            .spawn(position, direction, self.clock.now(), spatial, &mut self.rng);
        self.outbox.push(GameEvent::FireSpawned { fire: id, position });
        Ok(id)
    }

    pub fn create_zone(&mut self, config: ZoneConfig) -> Result<ZoneId, ZoneError> {
        self.authority.assert_server("match.create_zone")?;
        self.zones.create(config)
    }

    pub fn finish_zone(&mut self, id: ZoneId) -> Result<(), ZoneError> {
        self.zones.finish(id)
    }

    pub fn remove_zone(&mut self, id: ZoneId) -> Result<(), ZoneError> {
        self.zones.remove(id)
    }

    /// The active weapon, every fire and every pending grub command have
    /// finished; turn logic may move on
    pub fn is_resolved(&self) -> bool {
        let weapon_resolved = self
            .teams
            .current_team()
            .and_then(|team| team.active_weapon())
            .map(|weapon| weapon.resolved())
            .unwrap_or(true);

        weapon_resolved && self.fires.resolved(self.clock.now()) && self.effects.is_empty()
    }

    /// The active grub is alive and may act
    pub fn active_grub_can_act(&self) -> bool {
        self.teams
            .current_team()
            .and_then(|team| team.active_grub())
            .map(|grub| grub.is_alive())
            .unwrap_or(false)
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot::capture(self, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::sandbox::SandboxWorld;

    fn two_team_match() -> (GameMatch, SandboxWorld) {
        let mut world = SandboxWorld::new();
        let config = GameConfig {
            grub_count: 2,
            ..GameConfig::default()
        };
        let catalog = WeaponCatalog::builtin().unwrap();
        let mut game = GameMatch::new(7, config, catalog, Authority::Server);
        game.add_team(vec![Uuid::new_v4()], &mut world).unwrap();
        game.add_team(vec![Uuid::new_v4()], &mut world).unwrap();
        (game, world)
    }

    #[test]
    fn start_requires_two_teams() {
        let mut world = SandboxWorld::new();
        let catalog = WeaponCatalog::builtin().unwrap();
        let mut game = GameMatch::new(1, GameConfig::default(), catalog, Authority::Server);
        game.add_team(vec![Uuid::new_v4()], &mut world).unwrap();

        assert_eq!(game.start(), Err(MatchError::NotEnoughTeams(1)));
        assert_eq!(game.phase(), MatchPhase::Waiting);
    }

    #[test]
    fn start_emits_match_and_turn_started() {
        let (mut game, _world) = two_team_match();
        game.start().unwrap();

        let events = game.take_events();
        assert!(matches!(events[0], GameEvent::MatchStarted { seed: 7, teams: 2 }));
        assert!(matches!(events[1], GameEvent::TurnStarted { turn: 1, team: 0, .. }));
        assert_eq!(game.turn_number(), 1);
    }

    #[test]
    fn teams_cannot_join_a_running_match() {
        let (mut game, mut world) = two_team_match();
        game.start().unwrap();
        assert_eq!(
            game.add_team(vec![Uuid::new_v4()], &mut world),
            Err(MatchError::MatchNotRunning)
        );
    }

    #[test]
    fn commands_are_rejected_before_start() {
        let (mut game, _world) = two_team_match();
        assert_eq!(game.equip_weapon(0), Err(MatchError::MatchNotRunning));
    }
}
