//! Terrain tracing and batched queries against a Rapier-backed world

use approx::assert_relative_eq;
use void_physics::prelude::*;

fn slope(x: f32, _z: f32) -> f32 {
    x * 0.25
}

fn terrain() -> TerrainWorld {
    let mut world = TerrainWorld::new();
    world
        .add_collider(ColliderDesc::new(ColliderShape::sampled_heightfield(
            33, 33, 32.0, 32.0, slope,
        )))
        .unwrap();
    world
        .add_collider(
            ColliderDesc::obstacle(ColliderShape::cuboid(0.5, 0.5, 0.5))
                .with_position(4.0, 1.5, 4.0),
        )
        .unwrap();
    world.sync();
    world
}

#[test]
fn test_heightfield_follows_height_function() {
    let world = terrain();
    for &(x, z) in &[(0.0f32, 0.0f32), (-6.0, 3.0), (10.0, -10.0)] {
        let hit = world
            .trace(Vec3::new(x, 20.0, z), Vec3::NEG_Y, 40.0, GROUND_MASK)
            .expect("ground under every sample");
        assert_relative_eq!(hit.point.y, slope(x, z), epsilon = 1e-3);
        assert!(hit.normal.y > 0.9);
    }
}

#[test]
fn test_obstacle_only_on_clearance_mask() {
    let world = terrain();
    let from = Vec3::new(4.0, 10.0, 4.0);
    let to = Vec3::new(4.0, -10.0, 4.0);

    let ground = world.trace_segment(from, to, GROUND_MASK).unwrap();
    assert_relative_eq!(ground.point.y, slope(4.0, 4.0), epsilon = 1e-3);

    let blocked = world.trace_segment(from, to, CLEARANCE_MASK).unwrap();
    assert_relative_eq!(blocked.point.y, 2.0, epsilon = 1e-3);
}

#[test]
fn test_parallel_flush_keeps_enqueue_order() {
    let world = terrain();
    let mut scheduler = QueryScheduler::<usize>::new(QueryConfig::always_parallel()).unwrap();

    let origins: Vec<Vec3> = (0..200)
        .map(|i| Vec3::new((i % 20) as f32 - 10.0, 15.0, (i / 20) as f32 - 5.0))
        .collect();
    for (i, origin) in origins.iter().enumerate() {
        scheduler.enqueue(*origin, *origin - Vec3::Y * 30.0, GROUND_MASK, i, i as u64 * 3);
    }

    let mut seen = Vec::new();
    let stats = scheduler.flush(&world, &mut |receiver: usize, result: &QueryResult| {
        assert_eq!(result.request_id, receiver as u64 * 3);
        assert!(result.hit);
        let origin = origins[receiver];
        assert_relative_eq!(result.point.y, slope(origin.x, origin.z), epsilon = 1e-3);
        seen.push(receiver);
        true
    });

    assert!(stats.parallel);
    assert_eq!(stats.traced, 200);
    assert_eq!(stats.delivered, 200);
    assert_eq!(seen, (0..200).collect::<Vec<_>>());
    assert!(scheduler.is_empty());
}

#[test]
fn test_serial_and_parallel_agree() {
    let world = terrain();
    let requests: Vec<(Vec3, Vec3)> = (0..64)
        .map(|i| {
            let x = i as f32 * 0.37 - 8.0;
            (Vec3::new(x, 6.0, 4.0), Vec3::new(x * 0.5, -4.0, 3.0))
        })
        .collect();

    let collect = |config: QueryConfig| {
        let mut scheduler = QueryScheduler::<u32>::new(config).unwrap();
        for (i, (from, to)) in requests.iter().enumerate() {
            scheduler.enqueue(*from, *to, CLEARANCE_MASK, i as u32, i as u64);
        }
        let mut results = Vec::new();
        scheduler.flush(&world, &mut |_: u32, result: &QueryResult| {
            results.push(*result);
            true
        });
        results
    };

    let serial = collect(QueryConfig::serial());
    let parallel = collect(QueryConfig::always_parallel());
    assert_eq!(serial.len(), 64);
    assert_eq!(serial, parallel);
}

#[test]
fn test_misses_report_target() {
    let world = terrain();
    let mut scheduler = QueryScheduler::<()>::new(QueryConfig::default()).unwrap();
    let target = Vec3::new(0.0, 30.0, 0.0);
    scheduler.enqueue(Vec3::new(0.0, 20.0, 0.0), target, GROUND_MASK, (), 1);

    let mut answer = None;
    scheduler.flush(&world, &mut |_: (), result: &QueryResult| {
        answer = Some(*result);
        true
    });
    let answer = answer.unwrap();
    assert!(!answer.hit);
    assert_eq!(answer.point, target);
    assert_eq!(answer.normal, Vec3::ZERO);
}

#[test]
fn test_raw_query_reports_world_distance() {
    let world = terrain();
    let options = RaycastOptions::default()
        .with_max_distance(20.0)
        .with_mask(CLEARANCE_MASK);
    let hit = world
        .query()
        .raycast([4.0, 10.0, 4.0], [0.0, -2.0, 0.0], &options)
        .unwrap();
    assert_relative_eq!(hit.distance, 8.0, epsilon = 1e-3);
    assert_relative_eq!(hit.point[1], 2.0, epsilon = 1e-3);
    assert_relative_eq!(hit.normal[1], 1.0, epsilon = 1e-3);
}
