//! Per-creature limb placement and bookkeeping

use crate::config::CrawlerConfig;
use crate::error::Result;
use crate::events::LimbEvent;
use crate::ids::{CreatureId, LimbId, QueryReceiver};
use crate::ledger::AnchorLedger;
use crate::limb::{LimbController, LimbPhase, LimbSpawn, LimbTick};
use crate::placement::{heading, propose_candidate, resolve_foot};
use crate::pool::LimbPool;
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use void_physics::{GroundTracer, QueryResult, QueryScheduler};

/// Body state supplied by whatever moves the creature
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BodyMotion {
    pub position: Vec3,
    pub velocity: Vec3,
}

impl BodyMotion {
    pub fn new(position: Vec3, velocity: Vec3) -> Self {
        Self { position, velocity }
    }

    /// A body standing still at `position`
    pub fn at(position: Vec3) -> Self {
        Self::new(position, Vec3::ZERO)
    }
}

/// Read-only snapshot of one live limb for renderers
#[derive(Debug, Clone, Copy)]
pub struct LimbView<'a> {
    pub id: LimbId,
    pub polyline: &'a [Vec3],
    pub deployed: bool,
    pub progression: f32,
    pub phase: LimbPhase,
    pub is_reference: bool,
}

/// Decides when and where a creature plants new limbs, drives its limbs each
/// tick and routes their query results.
///
/// # Tick order
///
/// 1. Refresh the moving flag on the [`AnchorLedger`]
/// 2. Enqueue the periodic body ground probe
/// 3. Attempt a placement if the cooldown has elapsed
/// 4. Update every live limb
/// 5. Return fully retracted limbs to the pool
/// 6. Re-elect the reference limb
///
/// Query results arrive through [`on_query_result`](Self::on_query_result)
/// after the owner flushes the shared scheduler.
pub struct LimbPlacementCoordinator {
    creature: CreatureId,
    config: CrawlerConfig,
    pool: LimbPool,
    ledger: AnchorLedger,
    rng: SmallRng,
    motion: BodyMotion,
    frame: u64,
    cooldown: f32,
    body_probe_timer: f32,
    body_probe_request: Option<u64>,
    ground_clearance: Option<f32>,
    next_request_id: u64,
    reference: Option<LimbId>,
    events: Vec<LimbEvent>,
    recycle_scratch: Vec<LimbId>,
}

impl LimbPlacementCoordinator {
    /// Create a coordinator for `creature`
    pub fn new(creature: CreatureId, config: CrawlerConfig) -> Result<Self> {
        config.validate()?;

        let rng = match config.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::seed_from_u64(rand::random()),
        };
        let pool = LimbPool::new(
            config.limb.resolution,
            config.limb.update_divisor,
            config.placement.pool_prewarm,
        );
        let ledger = AnchorLedger::new(
            config.placement.minimum_anchored_limbs,
            config.placement.hold_floor_at_rest,
        );

        log::debug!(
            "{} coordinator: up to {} limbs, floor {}",
            creature,
            config.placement.limb_ceiling(),
            config.placement.minimum_anchored_limbs
        );

        Ok(Self {
            creature,
            pool,
            ledger,
            rng,
            motion: BodyMotion::default(),
            frame: 0,
            cooldown: 0.0,
            body_probe_timer: 0.0,
            body_probe_request: None,
            ground_clearance: None,
            next_request_id: 1,
            reference: None,
            events: Vec::new(),
            recycle_scratch: Vec::with_capacity(config.placement.limb_ceiling()),
            config,
        })
    }

    /// Advance one frame
    pub fn tick<T>(&mut self, dt: f32, tracer: &T, scheduler: &mut QueryScheduler<QueryReceiver>)
    where
        T: GroundTracer + ?Sized,
    {
        self.frame += 1;

        let (_, speed) = heading(self.motion.velocity, &self.config.placement);
        let moving = speed > self.config.placement.move_speed_threshold;
        self.ledger.set_moving(moving);

        self.probe_body(dt, scheduler);

        self.cooldown -= dt;
        if self.cooldown <= 0.0 && self.wants_limbs(moving) {
            self.try_spawn(tracer);
            self.cooldown = self.config.placement.new_leg_cooldown;
        }

        self.update_limbs(dt, scheduler);
        self.recycle();
        self.refresh_reference();
    }

    fn wants_limbs(&self, moving: bool) -> bool {
        if self.pool.live() >= self.config.placement.limb_ceiling() {
            return false;
        }
        let extending = self.pool.iter().filter(|(_, limb)| limb.grow_target() == 1.0).count();
        moving || extending < self.ledger.minimum()
    }

    fn probe_body(&mut self, dt: f32, scheduler: &mut QueryScheduler<QueryReceiver>) {
        self.body_probe_timer -= dt;
        if self.body_probe_timer > 0.0 {
            return;
        }
        self.body_probe_timer = self.config.placement.body_probe_interval;

        let request_id = self.next_request_id();
        self.body_probe_request = Some(request_id);
        let origin = self.motion.position;
        scheduler.enqueue(
            origin,
            origin + Vec3::NEG_Y * self.config.placement.body_probe_depth,
            self.config.limb.ground_mask,
            QueryReceiver::Creature(self.creature),
            request_id,
        );
    }

    /// Try to plant one group of limbs. Returns how many were spawned.
    fn try_spawn<T: GroundTracer + ?Sized>(&mut self, tracer: &T) -> usize {
        let placement = &self.config.placement;
        let body = self.motion.position;

        let candidate = propose_candidate(body, self.motion.velocity, placement, &mut self.rng);
        let Some(ground) = resolve_foot(candidate, body, placement, self.config.limb.ground_mask, tracer)
        else {
            log::debug!("{} found no ground under {:?}", self.creature, candidate);
            self.events.push(LimbEvent::SpawnAborted { candidate });
            return 0;
        };

        let spawn = LimbSpawn {
            anchor: self.anchor(),
            foot: ground.point,
            ground_normal: ground.normal,
            lifetime: self.rng.gen_range(placement.lifetime_min..=placement.lifetime_max),
        };

        let ceiling = placement.limb_ceiling();
        let mut spawned = 0;
        for _ in 0..placement.parts_per_leg {
            if self.pool.live() >= ceiling {
                break;
            }
            let (id, limb) = self.pool.acquire();
            limb.initialize(&spawn, &self.config.limb, tracer, &mut self.rng);
            self.events.push(LimbEvent::Spawned { limb: id, foot: spawn.foot });
            spawned += 1;
        }

        log::debug!(
            "{} planted {} limbs at {:?} ({} live)",
            self.creature,
            spawned,
            spawn.foot,
            self.pool.live()
        );
        spawned
    }

    fn update_limbs(&mut self, dt: f32, scheduler: &mut QueryScheduler<QueryReceiver>) {
        let mut ctx = LimbTick {
            frame: self.frame,
            dt,
            anchor: self.motion.position + Vec3::from_array(self.config.placement.anchor_offset),
            creature: self.creature,
            config: &self.config.limb,
            scheduler,
            ledger: &mut self.ledger,
            events: &mut self.events,
            next_request_id: &mut self.next_request_id,
        };
        for (id, limb) in self.pool.iter_mut() {
            limb.update(id, &mut ctx);
        }
    }

    fn recycle(&mut self) {
        let mut scratch = std::mem::take(&mut self.recycle_scratch);
        scratch.clear();
        scratch.extend(
            self.pool
                .iter()
                .filter(|(_, limb)| limb.phase() == LimbPhase::Recyclable)
                .map(|(id, _)| id),
        );
        for &id in &scratch {
            if self.pool.release(id) {
                self.events.push(LimbEvent::Recycled { limb: id });
            }
        }
        self.recycle_scratch = scratch;
    }

    fn refresh_reference(&mut self) {
        let current = self.reference.and_then(|id| self.pool.get(id));
        if current.is_some_and(LimbController::is_deployed) {
            return;
        }
        // a retracting limb only takes the role when nothing is anchored
        self.reference = self
            .pool
            .iter()
            .find(|(_, limb)| limb.is_anchored())
            .or_else(|| self.pool.iter().find(|(_, limb)| limb.is_deployed()))
            .map(|(id, _)| id);
    }

    /// Handle a flushed query result. Returns `false` when the receiver no
    /// longer exists (its limb was recycled).
    pub fn on_query_result(&mut self, receiver: QueryReceiver, result: &QueryResult) -> bool {
        match receiver {
            QueryReceiver::Limb { limb, .. } => match self.pool.get_mut(limb) {
                Some(controller) => {
                    controller.on_clearance_result(limb, result, &mut self.ledger, &mut self.events);
                    true
                }
                None => false,
            },
            QueryReceiver::Creature(_) => {
                if self.body_probe_request == Some(result.request_id) {
                    self.body_probe_request = None;
                    self.ground_clearance = result
                        .hit
                        .then(|| self.motion.position.y - result.point.y);
                }
                true
            }
        }
    }

    fn next_request_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    /// Update the body state used by the next tick
    pub fn set_motion(&mut self, motion: BodyMotion) {
        self.motion = motion;
    }

    pub fn motion(&self) -> BodyMotion {
        self.motion
    }

    /// Where limbs attach to the body
    pub fn anchor(&self) -> Vec3 {
        self.motion.position + Vec3::from_array(self.config.placement.anchor_offset)
    }

    pub fn creature(&self) -> CreatureId {
        self.creature
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Deployed and anchored counts
    pub fn ledger(&self) -> &AnchorLedger {
        &self.ledger
    }

    /// Limbs past the deploy threshold
    pub fn deployed_count(&self) -> usize {
        self.ledger.deployed()
    }

    /// Configured anchored floor
    pub fn minimum_anchored(&self) -> usize {
        self.ledger.minimum()
    }

    pub fn pool(&self) -> &LimbPool {
        &self.pool
    }

    /// Look up a live limb
    pub fn limb(&self, id: LimbId) -> Option<&LimbController> {
        self.pool.get(id)
    }

    /// The deployed limb chosen for body-relative effects
    pub fn reference_limb(&self) -> Option<LimbId> {
        self.reference
    }

    /// Height of the body above the ground from the last body probe
    pub fn ground_clearance(&self) -> Option<f32> {
        self.ground_clearance
    }

    /// Frames ticked so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Snapshot every live limb
    pub fn limb_views(&self) -> impl Iterator<Item = LimbView<'_>> {
        self.pool.iter().map(move |(id, limb)| LimbView {
            id,
            polyline: limb.polyline(),
            deployed: limb.is_deployed(),
            progression: limb.progression(),
            phase: limb.phase(),
            is_reference: self.reference == Some(id),
        })
    }

    /// Take the events recorded since the last drain
    pub fn drain_events(&mut self) -> impl Iterator<Item = LimbEvent> + '_ {
        self.events.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LimbConfig, PlacementConfig};
    use crate::events::RetractReason;
    use void_physics::{FlatGround, QueryConfig};

    const DT: f32 = 1.0 / 60.0;

    fn config() -> CrawlerConfig {
        CrawlerConfig::default()
            .with_seed(42)
            .with_limb(LimbConfig::default().with_update_divisor(1))
    }

    fn run(
        coordinator: &mut LimbPlacementCoordinator,
        ground: &FlatGround,
        scheduler: &mut QueryScheduler<QueryReceiver>,
        frames: usize,
    ) {
        for _ in 0..frames {
            coordinator.tick(DT, ground, scheduler);
            scheduler.flush(ground, &mut |receiver: QueryReceiver, result: &QueryResult| {
                coordinator.on_query_result(receiver, result)
            });
        }
    }

    fn scheduler() -> QueryScheduler<QueryReceiver> {
        QueryScheduler::new(QueryConfig::default()).unwrap()
    }

    #[test]
    fn test_at_rest_spawns_up_to_floor() {
        let ground = FlatGround::new(0.0);
        let mut scheduler = scheduler();
        let mut coordinator = LimbPlacementCoordinator::new(CreatureId(0), config()).unwrap();
        coordinator.set_motion(BodyMotion::at(Vec3::new(0.0, 1.0, 0.0)));

        run(&mut coordinator, &ground, &mut scheduler, 600);

        // one group of parts_per_leg covers the floor of two
        assert!(coordinator.deployed_count() >= coordinator.minimum_anchored());
        assert!(coordinator.pool().live() <= config().placement.parts_per_leg);
        assert!(coordinator.reference_limb().is_some());
    }

    #[test]
    fn test_moving_respects_ceiling() {
        let ground = FlatGround::new(0.0);
        let mut scheduler = scheduler();
        let mut coordinator = LimbPlacementCoordinator::new(CreatureId(0), config()).unwrap();
        let ceiling = coordinator.config().placement.limb_ceiling();

        let mut position = Vec3::new(0.0, 1.0, 0.0);
        let velocity = Vec3::new(0.0, 0.0, 1.5);
        for _ in 0..900 {
            position += velocity * DT;
            coordinator.set_motion(BodyMotion::new(position, velocity));
            run(&mut coordinator, &ground, &mut scheduler, 1);
            assert!(coordinator.pool().live() <= ceiling);
            assert!(coordinator.deployed_count() <= coordinator.pool().live());
        }
        assert!(coordinator.pool().peak_live() > 0);
    }

    #[test]
    fn test_no_ground_aborts_and_applies_cooldown() {
        let ground = FlatGround::new(0.0).with_hole([-50.0, -50.0], [50.0, 50.0]);
        let mut scheduler = scheduler();
        let mut coordinator = LimbPlacementCoordinator::new(CreatureId(0), config()).unwrap();
        coordinator.set_motion(BodyMotion::at(Vec3::new(0.0, 1.0, 0.0)));

        // 0.3 s cooldown over one second: four attempts
        run(&mut coordinator, &ground, &mut scheduler, 60);
        let events: Vec<_> = coordinator.drain_events().collect();
        assert_eq!(events.len(), 4);
        assert!(events.iter().all(|e| matches!(e, LimbEvent::SpawnAborted { .. })));
        assert_eq!(coordinator.pool().constructed(), 0);
        assert_eq!(coordinator.ground_clearance(), None);
    }

    #[test]
    fn test_body_probe_reports_clearance() {
        let ground = FlatGround::new(-0.5);
        let mut scheduler = scheduler();
        let mut coordinator = LimbPlacementCoordinator::new(CreatureId(0), config()).unwrap();
        coordinator.set_motion(BodyMotion::at(Vec3::new(0.0, 1.0, 0.0)));
        run(&mut coordinator, &ground, &mut scheduler, 1);
        let clearance = coordinator.ground_clearance().unwrap();
        assert!((clearance - 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_recycled_limbs_go_back_to_pool() {
        let ground = FlatGround::new(0.0);
        let mut scheduler = scheduler();
        let placement = PlacementConfig::default().with_minimum_anchored(0).with_lifetime(0.2, 0.3);
        let mut coordinator =
            LimbPlacementCoordinator::new(CreatureId(0), config().with_placement(placement)).unwrap();

        let mut position = Vec3::new(0.0, 1.0, 0.0);
        let velocity = Vec3::new(1.0, 0.0, 0.0);
        let mut recycled = 0;
        for _ in 0..900 {
            position += velocity * DT;
            coordinator.set_motion(BodyMotion::new(position, velocity));
            run(&mut coordinator, &ground, &mut scheduler, 1);
            recycled += coordinator
                .drain_events()
                .filter(|e| matches!(e, LimbEvent::Recycled { .. }))
                .count();
        }
        assert!(recycled > 0);
        assert!(coordinator.pool().constructed() <= coordinator.pool().peak_live());
    }

    #[test]
    fn test_stale_limb_result_is_skipped() {
        let ground = FlatGround::new(0.0);
        let mut scheduler = scheduler();
        let mut coordinator = LimbPlacementCoordinator::new(CreatureId(0), config()).unwrap();
        coordinator.set_motion(BodyMotion::at(Vec3::new(0.0, 1.0, 0.0)));
        run(&mut coordinator, &ground, &mut scheduler, 1);

        let (id, _) = coordinator.pool().iter().next().unwrap();
        let gone = LimbId::new(id.index(), id.generation() + 1);
        let result = QueryResult {
            request_id: 1,
            hit: true,
            point: Vec3::ZERO,
            normal: Vec3::Y,
        };
        let receiver = QueryReceiver::Limb {
            creature: CreatureId(0),
            limb: gone,
        };
        assert!(!coordinator.on_query_result(receiver, &result));
        assert!(!coordinator
            .drain_events()
            .any(|e| matches!(e, LimbEvent::Retracting { reason: RetractReason::Obstructed, .. })));
    }

    #[test]
    fn test_reference_limb_is_deployed() {
        let ground = FlatGround::new(0.0);
        let mut scheduler = scheduler();
        let mut coordinator = LimbPlacementCoordinator::new(CreatureId(0), config()).unwrap();
        coordinator.set_motion(BodyMotion::at(Vec3::new(0.0, 1.0, 0.0)));
        run(&mut coordinator, &ground, &mut scheduler, 300);

        let views: Vec<_> = coordinator.limb_views().collect();
        let references: Vec<_> = views.iter().filter(|v| v.is_reference).collect();
        assert_eq!(references.len(), 1);
        assert!(coordinator.limb(references[0].id).unwrap().is_deployed());
        for view in &views {
            assert!(!view.polyline.is_empty());
        }
    }

    #[test]
    fn test_reference_survives_group_retraction() {
        let ground = FlatGround::new(0.0);
        let mut scheduler = scheduler();
        let mut placement = PlacementConfig::default().with_lifetime(2.0, 2.0);
        placement.hold_floor_at_rest = false;
        let mut coordinator =
            LimbPlacementCoordinator::new(CreatureId(0), config().with_placement(placement)).unwrap();
        coordinator.set_motion(BodyMotion::at(Vec3::new(0.0, 1.0, 0.0)));

        // the whole group expires on one frame, then shrinks past the deploy threshold
        let mut retracting_only = 0;
        for _ in 0..240 {
            run(&mut coordinator, &ground, &mut scheduler, 1);
            if coordinator.deployed_count() == 0 {
                continue;
            }
            if coordinator.ledger().anchored() == 0 {
                retracting_only += 1;
            }
            let reference = coordinator.reference_limb().unwrap();
            assert!(coordinator.limb(reference).unwrap().is_deployed());
        }
        assert!(retracting_only > 0);
    }
}
