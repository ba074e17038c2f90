use std::collections::HashSet;

use glam::Vec3;
use uuid::Uuid;

use grub_match_core::config::GameConfig;
use grub_match_core::game::{
    Authority, DamageInfo, DamageSource, GameEvent, GrubId, MatchError, SandboxWorld, Team,
    TeamManager, WeaponCatalog,
};

fn team_with(grubs: usize, clients: usize, authority: Authority) -> Team {
    let mut world = SandboxWorld::new();
    let catalog = WeaponCatalog::builtin().unwrap();
    let clients = (0..clients).map(|_| Uuid::new_v4()).collect();
    Team::new(clients, "Alpha".into(), 0, &catalog, grubs, &mut world, authority).unwrap()
}

fn kill(team: &mut Team, id: GrubId) {
    let grub = team.grub_mut(id).unwrap();
    let lethal = DamageInfo::from_explosion(1000.0, Vec3::ZERO, Vec3::ZERO, DamageSource::World);
    grub.take_damage(&lethal, 0.0);
    grub.tick(10.0);
    assert!(grub.is_dead());
}

#[test]
fn fourth_pick_wraps_to_first_of_three() {
    let mut team = team_with(3, 1, Authority::Server);

    let picks: Vec<GrubId> = (0..4).map(|_| team.pick_next_grub().unwrap()).collect();

    assert_eq!(picks[3], picks[0]);
    let distinct: HashSet<_> = picks[..3].iter().collect();
    assert_eq!(distinct.len(), 3);
}

#[test]
fn rotation_is_a_permutation() {
    let mut team = team_with(4, 3, Authority::Server);
    let grubs_before: HashSet<GrubId> = team.grubs().map(|g| g.id).collect();
    let clients_before: HashSet<Uuid> = team.clients().copied().collect();

    for _ in 0..7 {
        team.pick_next_grub().unwrap();
        team.pick_next_client().unwrap();
    }

    let grubs_after: Vec<GrubId> = team.grubs().map(|g| g.id).collect();
    let clients_after: Vec<Uuid> = team.clients().copied().collect();
    assert_eq!(grubs_after.len(), 4);
    assert_eq!(clients_after.len(), 3);
    assert_eq!(grubs_after.into_iter().collect::<HashSet<_>>(), grubs_before);
    assert_eq!(clients_after.into_iter().collect::<HashSet<_>>(), clients_before);
}

#[test]
fn every_client_gets_a_turn_each_cycle() {
    let mut team = team_with(1, 3, Authority::Server);
    let picked: HashSet<Uuid> = (0..3).map(|_| team.pick_next_client().unwrap()).collect();
    assert_eq!(picked.len(), 3);
    assert_eq!(team.active_client(), *team.clients().next().unwrap());
}

#[test]
fn dead_grubs_are_never_picked() {
    let mut team = team_with(3, 1, Authority::Server);
    let ids: Vec<GrubId> = team.grubs().map(|g| g.id).collect();
    kill(&mut team, ids[1]);
    kill(&mut team, ids[2]);

    for _ in 0..6 {
        let picked = team.pick_next_grub().unwrap();
        assert_eq!(picked, ids[0]);
        assert!(team.active_grub().unwrap().is_alive());
    }
    assert!(!team.team_dead());
}

#[test]
fn all_dead_team_reports_elimination_instead_of_spinning() {
    let mut team = team_with(3, 1, Authority::Server);
    let order: Vec<GrubId> = team.grubs().map(|g| g.id).collect();
    for id in &order {
        kill(&mut team, *id);
    }

    assert!(team.team_dead());
    assert_eq!(
        team.pick_next_grub(),
        Err(MatchError::TeamEliminated {
            team: "Alpha".into()
        })
    );
    let after: Vec<GrubId> = team.grubs().map(|g| g.id).collect();
    assert_eq!(after, order);
}

#[test]
fn rotation_without_authority_is_rejected() {
    let mut team = team_with(2, 2, Authority::Client);
    let before = team.active_client();

    assert!(matches!(
        team.pick_next_client(),
        Err(MatchError::NotAuthoritative { .. })
    ));
    assert!(matches!(
        team.pick_next_grub(),
        Err(MatchError::NotAuthoritative { .. })
    ));
    assert_eq!(team.active_client(), before);
}

#[test]
fn team_needs_a_client() {
    let mut world = SandboxWorld::new();
    let catalog = WeaponCatalog::builtin().unwrap();
    let result = Team::new(
        Vec::new(),
        "Alpha".into(),
        0,
        &catalog,
        2,
        &mut world,
        Authority::Server,
    );
    assert!(matches!(result, Err(MatchError::NoClients)));
}

fn manager(teams: usize) -> TeamManager {
    let mut world = SandboxWorld::new();
    let catalog = WeaponCatalog::builtin().unwrap();
    let config = GameConfig {
        grub_count: 2,
        ..GameConfig::default()
    };
    let mut manager = TeamManager::new(Authority::Server);
    for _ in 0..teams {
        manager
            .add_team(vec![Uuid::new_v4()], &catalog, &config, &mut world)
            .unwrap();
    }
    manager
}

#[test]
fn teams_get_generated_names_and_sequential_numbers() {
    let manager = manager(3);
    let names: Vec<&str> = manager.teams().iter().map(|t| t.name()).collect();
    let numbers: Vec<usize> = manager.teams().iter().map(|t| t.number()).collect();
    assert_eq!(names, vec!["Alpha", "Bravo", "Charlie"]);
    assert_eq!(numbers, vec![0, 1, 2]);
}

#[test]
fn cycle_wraps_back_to_first_team() {
    let mut manager = manager(3);
    manager.set_active_team(0).unwrap();

    assert_eq!(manager.cycle().unwrap(), 1);
    assert_eq!(manager.cycle().unwrap(), 2);
    assert_eq!(manager.cycle().unwrap(), 0);
    assert_eq!(manager.current_index(), 0);
}

#[test]
fn set_active_team_picks_fresh_grub() {
    let mut manager = manager(2);
    let before = manager.team(1).unwrap().active_grub_id();

    manager.set_active_team(1).unwrap();

    let team = manager.current_team().unwrap();
    assert_eq!(team.number(), 1);
    assert_ne!(team.active_grub_id(), before);
}

#[test]
fn eliminated_team_is_never_made_active() {
    let mut world = SandboxWorld::new();
    let catalog = WeaponCatalog::builtin().unwrap();
    let config = GameConfig {
        grub_count: 2,
        ..GameConfig::default()
    };
    let mut manager = TeamManager::new(Authority::Server);
    manager
        .add_team(vec![Uuid::new_v4()], &catalog, &config, &mut world)
        .unwrap();
    manager
        .add_team(
            vec![Uuid::new_v4(), Uuid::new_v4()],
            &catalog,
            &config,
            &mut world,
        )
        .unwrap();
    manager.set_active_team(0).unwrap();

    let (clients_before, client_before, grub_before) = {
        let team = manager.team_mut(1).unwrap();
        let ids: Vec<GrubId> = team.grubs().map(|g| g.id).collect();
        for id in ids {
            kill(team, id);
        }
        let clients: Vec<Uuid> = team.clients().copied().collect();
        (clients, team.active_client(), team.active_grub_id())
    };

    assert!(matches!(
        manager.set_active_team(1),
        Err(MatchError::TeamEliminated { .. })
    ));
    assert_eq!(manager.current_index(), 0);

    let team = manager.team(1).unwrap();
    assert_eq!(team.clients().copied().collect::<Vec<_>>(), clients_before);
    assert_eq!(team.active_client(), client_before);
    assert_eq!(team.active_grub_id(), grub_before);
}

#[test]
fn out_of_range_team_index_is_rejected() {
    let mut manager = manager(2);
    manager.set_active_team(1).unwrap();

    assert_eq!(
        manager.set_active_team(5),
        Err(MatchError::TeamIndexOutOfRange { index: 5, len: 2 })
    );
    assert_eq!(manager.current_index(), 1);
}

#[test]
fn client_side_manager_cannot_add_teams() {
    let mut world = SandboxWorld::new();
    let catalog = WeaponCatalog::builtin().unwrap();
    let mut manager = TeamManager::new(Authority::Client);

    let result = manager.add_team(
        vec![Uuid::new_v4()],
        &catalog,
        &GameConfig::default(),
        &mut world,
    );
    assert!(matches!(result, Err(MatchError::NotAuthoritative { .. })));
    assert!(manager.is_empty());
}

#[test]
fn ammo_for_unlimited_weapon_stays_unlimited() {
    let mut team = team_with(1, 2, Authority::Server);
    let mut events = Vec::new();

    assert!(team.give_ammo("Bazooka", 5, &mut events).unwrap());

    let slot = team.inventory().position("Bazooka").unwrap();
    assert!(team.inventory().get(slot).unwrap().ammo().is_unlimited());
    match &events[..] {
        [GameEvent::AmmoGained {
            recipients, amount, ..
        }] => {
            assert_eq!(recipients.len(), 2);
            assert_eq!(*amount, 5);
        }
        other => panic!("unexpected events {other:?}"),
    }
}

#[test]
fn ammo_for_unheld_weapon_is_a_no_op() {
    let mut team = team_with(1, 1, Authority::Server);
    let mut events = Vec::new();

    assert!(!team.give_ammo("Holy Hand Grenade", 3, &mut events).unwrap());
    assert!(events.is_empty());
}
