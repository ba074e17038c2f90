//! Turn manager - whose turn it is across teams

use tracing::info;

use crate::config::{team_name, GameConfig};

use super::catalog::WeaponCatalog;
use super::grub::{Grub, GrubId, GrubPos};
use super::ports::TerrainMap;
use super::shot::StepContext;
use super::team::Team;
use super::{Authority, ClientId, MatchError};

/// Owns the teams of one match and the index of the active team
#[derive(Debug, Clone)]
pub struct TeamManager {
    teams: Vec<Team>,
    current: usize,
    authority: Authority,
}

impl TeamManager {
    pub fn new(authority: Authority) -> Self {
        Self {
            teams: Vec::new(),
            current: 0,
            authority,
        }
    }

    /// Append a team with the next generated name and number
    pub fn add_team<T: TerrainMap + ?Sized>(
        &mut self,
        clients: Vec<ClientId>,
        catalog: &WeaponCatalog,
        config: &GameConfig,
        terrain: &mut T,
    ) -> Result<usize, MatchError> {
        self.authority.assert_server("manager.add_team")?;

        let number = self.teams.len();
        let team = Team::new(
            clients,
            team_name(number),
            number,
            catalog,
            config.grub_count,
            terrain,
            self.authority,
        )?;
        self.teams.push(team);
        Ok(number)
    }

    /// Make `index` the active team and let it pick its next client and grub
    pub fn set_active_team(&mut self, index: usize) -> Result<(), MatchError> {
        self.authority.assert_server("manager.set_active_team")?;

        let len = self.teams.len();
        let team = self
            .teams
            .get_mut(index)
            .ok_or(MatchError::TeamIndexOutOfRange { index, len })?;

        // An eliminated team fails here and nothing is changed
        let grub = team.pick_next_grub()?;
        let client = team.pick_next_client()?;
        self.current = index;

        info!(team = %team.name(), client = %client, grub = %grub, "Active team changed");
        Ok(())
    }

    /// Activate the next team, wrapping from the last back to the first
    pub fn cycle(&mut self) -> Result<usize, MatchError> {
        self.authority.assert_server("manager.cycle")?;

        if self.teams.is_empty() {
            return Err(MatchError::TeamIndexOutOfRange { index: 0, len: 0 });
        }
        let next = (self.current + 1) % self.teams.len();
        self.set_active_team(next)?;
        Ok(next)
    }

    /// Like [`cycle`](Self::cycle) but skips eliminated teams, trying each
    /// team at most once
    pub fn cycle_living(&mut self) -> Result<usize, MatchError> {
        self.authority.assert_server("manager.cycle")?;

        let len = self.teams.len();
        let mut next = self.current;
        for _ in 0..len {
            next = (next + 1) % len;
            if !self.teams[next].team_dead() {
                self.set_active_team(next)?;
                return Ok(next);
            }
        }
        Err(MatchError::NotEnoughTeams(0))
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_team(&self) -> Option<&Team> {
        self.teams.get(self.current)
    }

    pub fn current_team_mut(&mut self) -> Option<&mut Team> {
        self.teams.get_mut(self.current)
    }

    pub fn team(&self, index: usize) -> Option<&Team> {
        self.teams.get(index)
    }

    pub fn team_mut(&mut self, index: usize) -> Option<&mut Team> {
        self.teams.get_mut(index)
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Indices of teams with at least one grub not yet dead
    pub fn living_teams(&self) -> Vec<usize> {
        self.teams
            .iter()
            .enumerate()
            .filter(|(_, team)| !team.team_dead())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn grubs(&self) -> impl Iterator<Item = &Grub> {
        self.teams.iter().flat_map(|team| team.grubs())
    }

    pub fn grub_positions(&self) -> Vec<GrubPos> {
        self.grubs().map(GrubPos::from).collect()
    }

    pub fn grub_mut(&mut self, id: GrubId) -> Option<&mut Grub> {
        self.teams.iter_mut().find_map(|team| team.grub_mut(id))
    }

    /// Forward one step to every team, top down
    pub fn simulate(&mut self, step: &mut StepContext<'_>) {
        let current = self.current;
        for (index, team) in self.teams.iter_mut().enumerate() {
            team.simulate(step, index == current);
        }
    }
}
