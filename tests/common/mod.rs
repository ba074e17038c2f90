#![allow(dead_code)]

use uuid::Uuid;

use grub_match_core::config::GameConfig;
use grub_match_core::game::{
    Authority, GameEvent, GameMatch, SandboxWorld, Team, Weapon, WeaponCatalog,
};

pub const TEST_CATALOG: &str = r#"[
    {"name": "Bazooka", "model": "bazooka", "firing_type": "charged", "infinite_ammo": true,
     "behavior": {"kind": "projectile", "min_speed": 200.0, "max_speed": 1200.0}},
    {"name": "Bat", "model": "bat", "firing_type": "instant", "infinite_ammo": true,
     "behavior": {"kind": "melee", "damage": 20.0, "range": 48.0, "knockback": 1500.0}},
    {"name": "Grenade", "model": "grenade", "firing_type": "instant", "uses": 2,
     "behavior": {"kind": "melee", "damage": 10.0, "range": 10.0, "knockback": 100.0}},
    {"name": "Minigun", "model": "minigun", "firing_type": "instant",
     "behavior": {"kind": "hitscan", "damage": 4.0, "range": 1200.0, "blast_radius": 8.0,
                  "knockback": 80.0, "burst": 10, "burst_interval": 0.05}},
    {"name": "Petrol Bomb", "model": "petrol", "firing_type": "charged",
     "behavior": {"kind": "incendiary", "range": 800.0, "flames": 3}}
]"#;

/// A started two-team match against the sandbox world
pub struct Harness {
    pub game: GameMatch,
    pub world: SandboxWorld,
}

impl Harness {
    pub fn new(grub_count: usize) -> Self {
        let catalog = WeaponCatalog::from_json(TEST_CATALOG).unwrap();
        let config = GameConfig {
            grub_count,
            ..GameConfig::default()
        };
        let mut world = SandboxWorld::new();
        let mut game = GameMatch::new(42, config, catalog, Authority::Server);
        game.add_team(vec![Uuid::new_v4()], &mut world).unwrap();
        game.add_team(vec![Uuid::new_v4()], &mut world).unwrap();
        game.start().unwrap();
        game.take_events();
        Self { game, world }
    }

    /// One simulation step; input edges are cleared afterwards
    pub fn tick(&mut self) -> Vec<GameEvent> {
        let events = self.game.run_tick(&mut self.world).unwrap();
        self.world.end_frame();
        events
    }

    pub fn ticks(&mut self, n: usize) -> Vec<GameEvent> {
        (0..n).flat_map(|_| self.tick()).collect()
    }

    pub fn team(&self) -> &Team {
        self.game.teams().current_team().unwrap()
    }

    pub fn client(&self) -> Uuid {
        self.team().active_client()
    }

    pub fn slot(&self, weapon: &str) -> usize {
        self.team().inventory().position(weapon).unwrap()
    }

    pub fn weapon(&self, name: &str) -> &Weapon {
        self.team().inventory().get(self.slot(name)).unwrap()
    }

    pub fn equip(&mut self, weapon: &str) {
        let slot = self.slot(weapon);
        self.game.equip_weapon(slot).unwrap();
    }
}

pub fn count<F: Fn(&GameEvent) -> bool>(events: &[GameEvent], f: F) -> usize {
    events.iter().filter(|e| f(e)).count()
}

pub fn turn_ended(e: &GameEvent) -> bool {
    matches!(e, GameEvent::TurnEnded { .. })
}
