//! End-to-end tests: creatures, the shared query batch and result routing

use void_limbs::prelude::*;
use void_physics::{CollisionLayer, FlatGround, QueryConfig, GROUND_MASK};

const DT: f32 = 1.0 / 60.0;

fn flat_world() -> CrawlerWorld<FlatGround> {
    CrawlerWorld::new(FlatGround::new(0.0), QueryConfig::default()).unwrap()
}

fn seeded() -> CrawlerConfig {
    CrawlerConfig::default().with_seed(2024)
}

#[test]
fn test_every_request_answered_in_one_step() {
    let mut world = flat_world();
    for i in 0..5 {
        world
            .spawn_creature(seeded(), BodyMotion::at(Vec3::new(i as f32 * 10.0, 1.0, 0.0)))
            .unwrap();
    }

    for _ in 0..240 {
        let stats = world.step(DT);
        assert_eq!(stats.traced, stats.delivered + stats.skipped);
        assert_eq!(stats.skipped, 0);
        assert!(world.scheduler().is_empty());
    }

    for (_, creature) in world.creatures() {
        assert!(creature.deployed_count() >= creature.minimum_anchored());
        assert!(creature.ground_clearance().is_some());
    }
}

#[test]
fn test_results_for_removed_creature_are_skipped() {
    let mut world = flat_world();
    let keep = world.spawn_creature(seeded(), BodyMotion::at(Vec3::Y)).unwrap();
    let gone = world.spawn_creature(seeded(), BodyMotion::at(Vec3::Y)).unwrap();
    world.step(DT);

    assert!(world.remove_creature(gone).is_some());
    assert!(world.remove_creature(gone).is_none());
    world.scheduler_mut().enqueue(
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, -1.0, 0.0),
        GROUND_MASK,
        QueryReceiver::Creature(gone),
        7,
    );

    let stats = world.step(DT);
    assert_eq!(stats.skipped, 1);
    assert!(world.creature(keep).is_some());
    assert!(matches!(
        world.set_motion(gone, BodyMotion::default()),
        Err(LimbError::CreatureNotFound(_))
    ));
}

#[test]
fn test_staged_requests_are_routed() {
    let mut world = flat_world();
    let id = world.spawn_creature(seeded(), BodyMotion::at(Vec3::new(0.0, 3.0, 0.0))).unwrap();
    let stager = world.scheduler().stager();

    let handle = std::thread::spawn(move || {
        stager.enqueue(
            Vec3::new(0.0, 3.0, 0.0),
            Vec3::new(0.0, -3.0, 0.0),
            GROUND_MASK,
            QueryReceiver::Creature(id),
            1_000_000,
        );
    });
    handle.join().unwrap();

    let stats = world.step(DT);
    assert!(stats.traced >= 2);
    assert_eq!(stats.skipped, 0);
}

#[test]
fn test_obstacle_between_foot_and_body_blocks_growth() {
    // a low shelf of rock covering the whole area, under the body
    let ground = FlatGround::new(0.0).with_block(
        Vec3::new(-20.0, 0.3, -20.0),
        Vec3::new(20.0, 0.5, 20.0),
        CollisionLayer::OBSTACLES,
    );
    let mut world = CrawlerWorld::new(ground, QueryConfig::default()).unwrap();
    let id = world
        .spawn_creature(seeded(), BodyMotion::at(Vec3::new(0.0, 1.5, 0.0)))
        .unwrap();

    let mut obstructed = 0;
    for _ in 0..300 {
        world.step(DT);
        let creature = world.creature_mut(id).unwrap();
        assert_eq!(creature.deployed_count(), 0);
        obstructed += creature
            .drain_events()
            .filter(|e| matches!(e, LimbEvent::Retracting { reason: RetractReason::Obstructed, .. }))
            .count();
    }
    assert!(obstructed > 0);
    // the shelf is not ground, so the body probe sees the plane below it
    let clearance = world.creature(id).unwrap().ground_clearance().unwrap();
    assert!((clearance - 1.5).abs() < 1e-4);
}

#[test]
fn test_walking_creature_keeps_pool_bounded() {
    let mut world = flat_world();
    let config = CrawlerConfig::skittering().with_seed(5).with_placement(PlacementConfig {
        pool_prewarm: 4,
        ..CrawlerConfig::skittering().placement
    });
    let ceiling = config.placement.limb_ceiling();
    let id = world.spawn_creature(config, BodyMotion::default()).unwrap();

    let velocity = Vec3::new(1.2, 0.0, 0.4);
    let mut position = Vec3::new(0.0, 0.6, 0.0);
    let mut recycled = 0;
    for _ in 0..1800 {
        position += velocity * DT;
        world.set_motion(id, BodyMotion::new(position, velocity)).unwrap();
        world.step(DT);

        let creature = world.creature_mut(id).unwrap();
        assert!(creature.pool().live() <= ceiling);
        recycled += creature
            .drain_events()
            .filter(|e| matches!(e, LimbEvent::Recycled { .. }))
            .count();

        let pool = creature.pool();
        assert!(pool.constructed() <= 4 + pool.peak_live());
    }
    assert!(recycled > 0);

    let creature = world.creature(id).unwrap();
    let references = creature.limb_views().filter(|v| v.is_reference).count();
    assert_eq!(references, usize::from(creature.deployed_count() > 0));
}

#[test]
fn test_seeded_runs_are_reproducible() {
    fn run() -> Vec<LimbEvent> {
        let mut world = flat_world();
        let id = world.spawn_creature(seeded(), BodyMotion::default()).unwrap();
        let mut events = Vec::new();
        for frame in 0..300 {
            let position = Vec3::new(frame as f32 * 0.02, 1.0, 0.0);
            world.set_motion(id, BodyMotion::new(position, Vec3::X * 1.2)).unwrap();
            world.step(DT);
            events.extend(world.creature_mut(id).unwrap().drain_events());
        }
        events
    }

    let first = run();
    assert!(!first.is_empty());
    assert_eq!(first, run());
}
