//! Physics queries (raycasting)

use crate::layers::CollisionGroups;
use rapier3d::prelude as rapier;

/// Result of a raycast query
#[derive(Debug, Clone, Copy)]
pub struct RaycastHit {
    /// Hit point in world space
    pub point: [f32; 3],
    /// Surface normal at hit point
    pub normal: [f32; 3],
    /// Distance from ray origin
    pub distance: f32,
}

/// Options for raycast queries
#[derive(Debug, Clone)]
pub struct RaycastOptions {
    /// Maximum distance for the ray
    pub max_distance: f32,
    /// Collision groups filter
    pub filter: CollisionGroups,
}

impl Default for RaycastOptions {
    fn default() -> Self {
        Self {
            max_distance: f32::MAX,
            filter: CollisionGroups::ALL,
        }
    }
}

impl RaycastOptions {
    /// Set maximum distance
    pub fn with_max_distance(mut self, distance: f32) -> Self {
        self.max_distance = distance;
        self
    }

    /// Only hit colliders whose membership intersects `mask`
    pub fn with_mask(mut self, mask: u32) -> Self {
        self.filter = CollisionGroups::query(mask);
        self
    }
}

/// Query interface for the terrain world
pub struct PhysicsQuery<'a> {
    pub(crate) query_pipeline: &'a rapier::QueryPipeline,
    pub(crate) colliders: &'a rapier::ColliderSet,
    pub(crate) bodies: &'a rapier::RigidBodySet,
}

impl<'a> PhysicsQuery<'a> {
    /// Cast a ray and get the first hit.
    ///
    /// `direction` does not need to be normalized; the reported distance is
    /// always in world units.
    pub fn raycast(
        &self,
        origin: [f32; 3],
        direction: [f32; 3],
        options: &RaycastOptions,
    ) -> Option<RaycastHit> {
        let dir = rapier::Vector::new(direction[0], direction[1], direction[2]);
        let length = dir.norm();
        if length <= f32::EPSILON {
            return None;
        }

        let ray = rapier::Ray::new(
            rapier::Point::new(origin[0], origin[1], origin[2]),
            dir / length,
        );

        let filter = rapier::QueryFilter::new()
            .groups(rapier::InteractionGroups::new(
                rapier::Group::from_bits_truncate(options.filter.memberships),
                rapier::Group::from_bits_truncate(options.filter.filter),
            ));

        let (_, intersection) = self.query_pipeline.cast_ray_and_get_normal(
            self.bodies,
            self.colliders,
            &ray,
            options.max_distance,
            true,
            filter,
        )?;

        let point = ray.point_at(intersection.time_of_impact);

        Some(RaycastHit {
            point: [point.x, point.y, point.z],
            normal: [
                intersection.normal.x,
                intersection.normal.y,
                intersection.normal.z,
            ],
            distance: intersection.time_of_impact,
        })
    }
}
