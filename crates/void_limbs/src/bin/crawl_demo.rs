//! Headless crawl demo
//!
//! Builds rolling heightfield terrain with a few boulders, lets three creatures
//! walk circles over it and logs what their limbs are doing.
//!
//! Run with `RUST_LOG=debug` for per-limb detail.

use void_limbs::prelude::*;
use void_physics::{ColliderDesc, ColliderHandle, ColliderShape, QueryConfig, TerrainWorld};

const FRAMES: u64 = 1200;
const DT: f32 = 1.0 / 60.0;
const REPORT_EVERY: u64 = 120;
const BOULDER_CLEARED_AT: u64 = FRAMES / 2;

fn ground_height(x: f32, z: f32) -> f32 {
    (x * 0.35).sin() * 0.6 + (z * 0.25).cos() * 0.4
}

fn build_terrain() -> void_physics::Result<(TerrainWorld, Vec<ColliderHandle>)> {
    let mut terrain = TerrainWorld::new();
    terrain.add_collider(ColliderDesc::new(ColliderShape::sampled_heightfield(
        65,
        65,
        64.0,
        64.0,
        ground_height,
    )))?;

    let mut boulders = Vec::new();
    for &(x, z) in &[(6.0, 0.0), (-4.0, 5.0), (0.0, -7.0)] {
        boulders.push(terrain.add_collider(
            ColliderDesc::obstacle(ColliderShape::sphere(0.8)).with_position(x, ground_height(x, z) + 0.4, z),
        )?);
    }

    terrain.sync();
    Ok((terrain, boulders))
}

struct Walker {
    id: CreatureId,
    radius: f32,
    speed: f32,
    phase: f32,
}

impl Walker {
    fn motion(&self, time: f32) -> BodyMotion {
        let angle = self.phase + time * self.speed / self.radius;
        let (x, z) = (angle.cos() * self.radius, angle.sin() * self.radius);
        let position = Vec3::new(x, ground_height(x, z) + 0.8, z);
        let velocity = Vec3::new(-angle.sin(), 0.0, angle.cos()) * self.speed;
        BodyMotion::new(position, velocity)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (terrain, mut boulders) = build_terrain()?;
    log::info!("Terrain ready: {} colliders", terrain.collider_count());

    let mut world = CrawlerWorld::new(terrain, QueryConfig::default())?;

    let mut walkers = Vec::new();
    for (i, (config, radius, speed)) in [
        (CrawlerConfig::skittering(), 5.0, 2.0),
        (CrawlerConfig::default(), 8.0, 1.2),
        (CrawlerConfig::lumbering(), 11.0, 0.6),
    ]
    .into_iter()
    .enumerate()
    {
        let mut walker = Walker {
            id: CreatureId(0),
            radius,
            speed,
            phase: i as f32 * 2.1,
        };
        walker.id = world.spawn_creature(config.with_seed(7 + i as u64), walker.motion(0.0))?;
        walkers.push(walker);
    }

    let mut totals = [0usize; 4];
    for frame in 1..=FRAMES {
        if frame == BOULDER_CLEARED_AT {
            if let Some(boulder) = boulders.pop() {
                let terrain = world.tracer_mut();
                terrain.remove_collider(boulder)?;
                terrain.sync();
                log::info!("frame {}: boulder cleared, {} colliders left", frame, terrain.collider_count());
            }
        }

        let time = frame as f32 * DT;
        for walker in &walkers {
            world.set_motion(walker.id, walker.motion(time))?;
        }

        let stats = world.step(DT);

        for walker in &walkers {
            if let Some(creature) = world.creature_mut(walker.id) {
                for event in creature.drain_events() {
                    match event {
                        LimbEvent::Spawned { .. } => totals[0] += 1,
                        LimbEvent::Retracting { reason: RetractReason::Obstructed, .. } => totals[1] += 1,
                        LimbEvent::Recycled { .. } => totals[2] += 1,
                        LimbEvent::SpawnAborted { .. } => totals[3] += 1,
                        _ => {}
                    }
                }
            }
        }

        if frame % REPORT_EVERY == 0 {
            log::info!(
                "frame {}: traced {} (parallel: {}), skipped {}",
                frame,
                stats.traced,
                stats.parallel,
                stats.skipped
            );
            for (id, creature) in world.creatures() {
                let pool = creature.pool();
                log::info!(
                    "  {}: {} deployed / {} anchored (floor {}), {} live, {} constructed, clearance {:?}",
                    id,
                    creature.deployed_count(),
                    creature.ledger().anchored(),
                    creature.minimum_anchored(),
                    pool.live(),
                    pool.constructed(),
                    creature.ground_clearance()
                );
            }
        }
    }

    log::info!(
        "Done: {} limbs spawned, {} obstructed, {} recycled, {} placements without ground",
        totals[0],
        totals[1],
        totals[2],
        totals[3]
    );
    Ok(())
}
