//! Crawler world - every creature sharing one tracer and one query batch

use crate::config::CrawlerConfig;
use crate::coordinator::{BodyMotion, LimbPlacementCoordinator};
use crate::error::{LimbError, Result};
use crate::ids::{CreatureId, QueryReceiver};
use std::collections::BTreeMap;
use void_physics::{FlushStats, GroundTracer, QueryConfig, QueryResult, QueryScheduler};

/// Owns the ground, the frame's query batch and all creatures.
///
/// [`step`](Self::step) ticks every creature in id order, then flushes the
/// batch once and routes each result to its creature. A result for a creature
/// removed in the meantime is dropped and counted in [`FlushStats::skipped`].
pub struct CrawlerWorld<T: GroundTracer> {
    tracer: T,
    scheduler: QueryScheduler<QueryReceiver>,
    creatures: BTreeMap<CreatureId, LimbPlacementCoordinator>,
    next_id: u32,
    frame: u64,
    last_flush: FlushStats,
}

impl<T: GroundTracer> CrawlerWorld<T> {
    /// Create a world over `tracer`
    pub fn new(tracer: T, query: QueryConfig) -> Result<Self> {
        Ok(Self {
            tracer,
            scheduler: QueryScheduler::new(query)?,
            creatures: BTreeMap::new(),
            next_id: 0,
            frame: 0,
            last_flush: FlushStats::default(),
        })
    }

    /// Add a creature
    pub fn spawn_creature(&mut self, config: CrawlerConfig, motion: BodyMotion) -> Result<CreatureId> {
        let id = CreatureId(self.next_id);
        let mut coordinator = LimbPlacementCoordinator::new(id, config)?;
        coordinator.set_motion(motion);
        self.next_id += 1;
        self.creatures.insert(id, coordinator);
        log::info!("Spawned {} at {:?}", id, motion.position);
        Ok(id)
    }

    /// Remove a creature and all its limbs
    pub fn remove_creature(&mut self, id: CreatureId) -> Option<LimbPlacementCoordinator> {
        let removed = self.creatures.remove(&id);
        if removed.is_some() {
            log::info!("Removed {}", id);
        }
        removed
    }

    /// Update a creature's body state for the next step
    pub fn set_motion(&mut self, id: CreatureId, motion: BodyMotion) -> Result<()> {
        self.creatures
            .get_mut(&id)
            .ok_or(LimbError::CreatureNotFound(id))?
            .set_motion(motion);
        Ok(())
    }

    /// Advance every creature by `dt` and resolve the frame's queries
    pub fn step(&mut self, dt: f32) -> FlushStats {
        self.frame += 1;

        for coordinator in self.creatures.values_mut() {
            coordinator.tick(dt, &self.tracer, &mut self.scheduler);
        }

        let creatures = &mut self.creatures;
        let stats = self.scheduler.flush(
            &self.tracer,
            &mut |receiver: QueryReceiver, result: &QueryResult| match creatures.get_mut(&receiver.creature()) {
                Some(coordinator) => coordinator.on_query_result(receiver, result),
                None => false,
            },
        );

        if stats.skipped > 0 {
            log::trace!("frame {}: {} results for departed receivers", self.frame, stats.skipped);
        }
        self.last_flush = stats;
        stats
    }

    pub fn creature(&self, id: CreatureId) -> Option<&LimbPlacementCoordinator> {
        self.creatures.get(&id)
    }

    pub fn creature_mut(&mut self, id: CreatureId) -> Option<&mut LimbPlacementCoordinator> {
        self.creatures.get_mut(&id)
    }

    /// All creatures in id order
    pub fn creatures(&self) -> impl Iterator<Item = (CreatureId, &LimbPlacementCoordinator)> {
        self.creatures.iter().map(|(id, c)| (*id, c))
    }

    pub fn creature_count(&self) -> usize {
        self.creatures.len()
    }

    pub fn tracer(&self) -> &T {
        &self.tracer
    }

    /// Mutable access to the ground, e.g. to add terrain between steps
    pub fn tracer_mut(&mut self) -> &mut T {
        &mut self.tracer
    }

    /// The shared query batch
    pub fn scheduler(&self) -> &QueryScheduler<QueryReceiver> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut QueryScheduler<QueryReceiver> {
        &mut self.scheduler
    }

    /// Steps taken so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Statistics of the most recent flush
    pub fn last_flush(&self) -> FlushStats {
        self.last_flush
    }
}
