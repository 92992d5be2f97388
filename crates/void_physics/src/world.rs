//! Terrain world - static colliders and the query pipeline that traces against them

use crate::collider::{ColliderDesc, ColliderHandle};
use crate::error::{PhysicsError, Result};
use crate::query::PhysicsQuery;
use rapier3d::prelude as rapier;

/// Static collision geometry that limbs are planted on.
///
/// Colliders are never simulated; the world only exists to answer line
/// traces. Call [`TerrainWorld::sync`] after editing colliders so the query
/// pipeline sees the change.
pub struct TerrainWorld {
    /// Query pipeline
    query_pipeline: rapier::QueryPipeline,

    /// Rigid body set (always empty, required by the query API)
    bodies: rapier::RigidBodySet,

    /// Collider set
    colliders: rapier::ColliderSet,

    /// Island manager (needed for collider removal)
    islands: rapier::IslandManager,

    /// Colliders changed since the last sync
    dirty: bool,
}

impl TerrainWorld {
    /// Create an empty terrain world
    pub fn new() -> Self {
        Self {
            query_pipeline: rapier::QueryPipeline::new(),
            bodies: rapier::RigidBodySet::new(),
            colliders: rapier::ColliderSet::new(),
            islands: rapier::IslandManager::new(),
            dirty: false,
        }
    }

    // ==================== Colliders ====================

    /// Add a static collider
    pub fn add_collider(&mut self, desc: ColliderDesc) -> Result<ColliderHandle> {
        desc.shape.validate()?;
        let handle = ColliderHandle(self.colliders.insert(desc.to_rapier_builder()));
        self.dirty = true;
        log::debug!("terrain collider added: {:?}", handle);
        Ok(handle)
    }

    /// Remove a collider
    pub fn remove_collider(&mut self, handle: ColliderHandle) -> Result<()> {
        self.colliders
            .remove(handle.0, &mut self.islands, &mut self.bodies, false)
            .ok_or(PhysicsError::ColliderNotFound(handle))?;
        self.dirty = true;
        log::debug!("terrain collider removed: {:?}", handle);
        Ok(())
    }

    /// Sync the query pipeline with the current colliders
    pub fn sync(&mut self) {
        if self.dirty {
            self.query_pipeline.update(&self.colliders);
            self.dirty = false;
        }
    }

    /// Whether colliders changed since the last sync
    pub fn needs_sync(&self) -> bool {
        self.dirty
    }

    // ==================== Queries ====================

    /// Get a query interface for raycasting
    pub fn query(&self) -> PhysicsQuery<'_> {
        PhysicsQuery {
            query_pipeline: &self.query_pipeline,
            colliders: &self.colliders,
            bodies: &self.bodies,
        }
    }

    // ==================== Debug ====================

    /// Get number of colliders
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }
}

impl Default for TerrainWorld {
    fn default() -> Self {
        Self::new()
    }
}
