use glam::Vec3;

use grub_match_core::game::ports::EffectBuffer;
use grub_match_core::game::zone::ResolvedShape;
use grub_match_core::game::{
    Authority, DamageKind, Grub, MatchError, ZoneConfig, ZoneError, ZoneId, ZoneKind,
    ZoneRegistry, ZoneShape,
};

fn sphere(radius: f32, expire_after_turns: i32, kind: ZoneKind) -> ZoneConfig {
    ZoneConfig {
        position: Vec3::ZERO,
        shape: ZoneShape::Sphere { radius },
        expire_after_turns,
        kind,
    }
}

#[test]
fn zone_expiring_now_is_queued_and_gone_after_drain() {
    let mut zones = ZoneRegistry::new(Authority::Server);
    let id = zones.create(sphere(5.0, 0, ZoneKind::Passive)).unwrap();

    assert!(zones.is_remove_queued(id));

    zones.finish(id).unwrap();
    let drain = zones.tick().unwrap();

    assert!(!zones.is_live(id));
    assert!(zones.get(id).is_none());
    assert_eq!(drain.removed, vec![id]);
    assert!(zones.is_empty());
}

#[test]
fn zone_is_invisible_until_finished_and_drained() {
    let mut zones = ZoneRegistry::new(Authority::Server);
    let id = zones.create(sphere(5.0, -1, ZoneKind::Passive)).unwrap();
    let grub = Grub::new("Grub 1".into(), 0, Vec3::ZERO);
    let mut effects = EffectBuffer::new();

    assert_eq!(zones.in_zone(id, Vec3::ZERO), None);
    assert_eq!(
        zones.trigger(id, &grub, &mut effects),
        Err(ZoneError::NotFound(id))
    );

    zones.finish(id).unwrap();
    assert!(zones.is_add_queued(id));
    assert_eq!(zones.in_zone(id, Vec3::ZERO), None);
    assert!(zones.zones_at(Vec3::ZERO).is_empty());

    zones.tick().unwrap();
    assert_eq!(zones.in_zone(id, Vec3::ZERO), Some(true));
    assert_eq!(zones.in_zone(id, Vec3::new(10.0, 0.0, 0.0)), Some(false));
    assert_eq!(zones.zones_at(Vec3::ZERO), vec![id]);
}

#[test]
fn turn_counter_expires_zone_after_its_last_turn() {
    let mut zones = ZoneRegistry::new(Authority::Server);
    let id = zones.create(sphere(5.0, 2, ZoneKind::Passive)).unwrap();
    zones.finish(id).unwrap();
    zones.tick().unwrap();

    zones.on_turn_end().unwrap();
    zones.tick().unwrap();
    assert!(zones.is_live(id));
    assert_eq!(zones.get(id).unwrap().expire_after_turns(), 1);

    zones.on_turn_end().unwrap();
    assert!(zones.is_remove_queued(id));
    zones.tick().unwrap();
    assert!(!zones.is_live(id));
}

#[test]
fn permanent_zone_survives_turn_ends() {
    let mut zones = ZoneRegistry::new(Authority::Server);
    let id = zones.create(sphere(5.0, -1, ZoneKind::Passive)).unwrap();
    zones.finish(id).unwrap();
    zones.tick().unwrap();

    for _ in 0..10 {
        zones.on_turn_end().unwrap();
        zones.tick().unwrap();
    }
    assert!(zones.is_live(id));
}

#[test]
fn kill_zone_deals_remaining_health() {
    let mut zones = ZoneRegistry::new(Authority::Server);
    let id = zones.create(sphere(5.0, -1, ZoneKind::Kill)).unwrap();
    zones.finish(id).unwrap();
    zones.tick().unwrap();

    let mut grub = Grub::new("Grub 1".into(), 0, Vec3::new(1.0, 0.0, 0.0));
    grub.health = 42.0;
    let mut effects = EffectBuffer::new();

    assert!(zones.trigger(id, &grub, &mut effects).unwrap());
    assert_eq!(effects.len(), 1);
    match &effects.commands()[0] {
        grub_match_core::game::ports::GrubCommand::Damage { damage, .. } => {
            assert_eq!(damage.amount, 42.0);
            assert_eq!(damage.kind, DamageKind::KillTrigger);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn grubs_outside_or_passive_zones_are_untouched() {
    let mut zones = ZoneRegistry::new(Authority::Server);
    let passive = zones.create(sphere(5.0, -1, ZoneKind::Passive)).unwrap();
    let damage = zones
        .create(sphere(5.0, -1, ZoneKind::Damage { amount: 10.0 }))
        .unwrap();
    zones.finish(passive).unwrap();
    zones.finish(damage).unwrap();
    zones.tick().unwrap();

    let inside = Grub::new("Grub 1".into(), 0, Vec3::ZERO);
    let outside = Grub::new("Grub 2".into(), 0, Vec3::new(50.0, 0.0, 0.0));
    let mut effects = EffectBuffer::new();

    let hits = zones
        .trigger_occupants([&inside, &outside], &mut effects)
        .unwrap();
    assert_eq!(hits, 1);
    assert_eq!(effects.len(), 1);
}

#[test]
fn box_zone_resolves_to_world_bounds() {
    let mut zones = ZoneRegistry::new(Authority::Server);
    let id = zones
        .create(ZoneConfig {
            position: Vec3::new(10.0, 0.0, 0.0),
            shape: ZoneShape::Box {
                size: Vec3::splat(4.0),
            },
            ..ZoneConfig::default()
        })
        .unwrap();
    zones.finish(id).unwrap();
    zones.tick().unwrap();

    assert_eq!(
        ZoneShape::Box {
            size: Vec3::splat(4.0)
        }
        .finish(Vec3::new(10.0, 0.0, 0.0)),
        ResolvedShape::Box {
            mins: Vec3::new(8.0, -2.0, -2.0),
            maxs: Vec3::new(12.0, 2.0, 2.0),
        }
    );
    assert_eq!(zones.in_zone(id, Vec3::new(11.9, 1.0, -1.0)), Some(true));
    assert_eq!(zones.in_zone(id, Vec3::new(12.1, 0.0, 0.0)), Some(false));
}

#[test]
fn invalid_configs_fail_eagerly() {
    let mut zones = ZoneRegistry::new(Authority::Server);
    assert!(matches!(
        zones.create(sphere(5.0, -3, ZoneKind::Passive)),
        Err(ZoneError::InvalidExpiry(-3))
    ));
    assert!(matches!(
        zones.create(sphere(5.0, -1, ZoneKind::Damage { amount: -1.0 })),
        Err(ZoneError::InvalidDamage(_))
    ));
    assert!(zones.is_empty());
}

#[test]
fn client_side_registry_rejects_mutation() {
    let mut zones = ZoneRegistry::new(Authority::Client);

    assert!(matches!(
        zones.create(sphere(5.0, 0, ZoneKind::Passive)),
        Err(ZoneError::Match(MatchError::NotAuthoritative { .. }))
    ));
    assert!(zones.is_empty());

    let id = ZoneId::new();
    assert!(matches!(
        zones.set_expire_after_turns(id, 0),
        Err(ZoneError::Match(MatchError::NotAuthoritative { .. }))
    ));
    assert!(!zones.is_remove_queued(id));
    assert!(matches!(
        zones.finish(id),
        Err(ZoneError::Match(MatchError::NotAuthoritative { .. }))
    ));
    assert!(matches!(
        zones.remove(id),
        Err(ZoneError::Match(MatchError::NotAuthoritative { .. }))
    ));
    assert!(matches!(
        zones.tick(),
        Err(MatchError::NotAuthoritative { .. })
    ));
    assert!(matches!(
        zones.on_turn_end(),
        Err(MatchError::NotAuthoritative { .. })
    ));
}

#[test]
fn unfinished_zones_are_dropped_at_turn_end() {
    let mut zones = ZoneRegistry::new(Authority::Server);
    let abandoned = zones.create(sphere(5.0, -1, ZoneKind::Passive)).unwrap();
    let kept = zones.create(sphere(5.0, -1, ZoneKind::Passive)).unwrap();
    zones.finish(kept).unwrap();
    zones.tick().unwrap();

    zones.on_turn_end().unwrap();
    zones.tick().unwrap();

    assert!(zones.get(abandoned).is_none());
    assert_eq!(
        zones.finish(abandoned),
        Err(ZoneError::NotFound(abandoned))
    );
    assert!(zones.is_live(kept));
    assert_eq!(zones.len(), 1);
}
