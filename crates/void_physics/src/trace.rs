//! Ground tracing interface shared by immediate and batched queries

use crate::layers::{layer_in_mask, CollisionLayer};
use crate::query::RaycastOptions;
use crate::world::TerrainWorld;
use glam::Vec3;

/// A single line trace hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceHit {
    /// Hit point in world space
    pub point: Vec3,
    /// Surface normal at the hit point
    pub normal: Vec3,
    /// Distance from the trace origin
    pub distance: f32,
}

/// Anything that can answer "what does this line hit first".
///
/// Implementors must be `Sync`: batched traces are fanned out across the
/// rayon pool and share one reference to the tracer.
pub trait GroundTracer: Sync {
    /// Trace from `origin` along `direction` (need not be normalized) up to
    /// `max_distance`, hitting only objects whose layer is in `mask`.
    fn trace(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: u32) -> Option<TraceHit>;

    /// Trace the segment `from -> to`
    fn trace_segment(&self, from: Vec3, to: Vec3, mask: u32) -> Option<TraceHit> {
        let delta = to - from;
        let length = delta.length();
        if length <= f32::EPSILON {
            return None;
        }
        self.trace(from, delta / length, length, mask)
    }
}

impl<T: GroundTracer + ?Sized> GroundTracer for &T {
    fn trace(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: u32) -> Option<TraceHit> {
        (**self).trace(origin, direction, max_distance, mask)
    }
}

impl GroundTracer for TerrainWorld {
    fn trace(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: u32) -> Option<TraceHit> {
        let options = RaycastOptions::default()
            .with_max_distance(max_distance)
            .with_mask(mask);
        self.query()
            .raycast(origin.to_array(), direction.to_array(), &options)
            .map(|hit| TraceHit {
                point: Vec3::from_array(hit.point),
                normal: Vec3::from_array(hit.normal),
                distance: hit.distance,
            })
    }
}

/// An axis-aligned box standing on or above [`FlatGround`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    pub min: Vec3,
    pub max: Vec3,
    pub layer: CollisionLayer,
}

/// Analytic ground: an infinite horizontal plane on the terrain layer, with
/// optional rectangular holes and box-shaped blocks.
///
/// Cheap and deterministic, used by tests and headless tools that do not need
/// a full collider set.
#[derive(Debug, Clone, Default)]
pub struct FlatGround {
    /// Plane height
    pub height: f32,
    /// XZ rectangles (`min`, `max`) with no ground
    pub holes: Vec<([f32; 2], [f32; 2])>,
    /// Boxes
    pub blocks: Vec<Block>,
}

impl FlatGround {
    /// Plane at `height`
    pub fn new(height: f32) -> Self {
        Self {
            height,
            ..Default::default()
        }
    }

    /// Cut a hole in the plane
    pub fn with_hole(mut self, min: [f32; 2], max: [f32; 2]) -> Self {
        self.holes.push((min, max));
        self
    }

    /// Add a box on `layer`
    pub fn with_block(mut self, min: Vec3, max: Vec3, layer: CollisionLayer) -> Self {
        self.blocks.push(Block { min, max, layer });
        self
    }

    fn in_hole(&self, x: f32, z: f32) -> bool {
        self.holes
            .iter()
            .any(|(min, max)| x >= min[0] && x <= max[0] && z >= min[1] && z <= max[1])
    }

    fn trace_plane(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<TraceHit> {
        let above = origin.y - self.height;
        if above.abs() <= f32::EPSILON {
            return (!self.in_hole(origin.x, origin.z)).then(|| TraceHit {
                point: origin,
                normal: Vec3::Y,
                distance: 0.0,
            });
        }
        if dir.y.abs() <= f32::EPSILON {
            return None;
        }
        let t = -above / dir.y;
        if t < 0.0 || t > max_distance {
            return None;
        }
        let point = origin + dir * t;
        if self.in_hole(point.x, point.z) {
            return None;
        }
        let normal = if above > 0.0 { Vec3::Y } else { Vec3::NEG_Y };
        Some(TraceHit { point, normal, distance: t })
    }

    fn trace_block(block: &Block, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<TraceHit> {
        let mut t_enter = 0.0f32;
        let mut t_exit = max_distance;
        let mut normal = -dir;

        for axis in 0..3 {
            let o = origin[axis];
            let d = dir[axis];
            let (lo, hi) = (block.min[axis], block.max[axis]);
            if d.abs() <= f32::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let (mut t0, mut t1) = ((lo - o) / d, (hi - o) / d);
            let mut face = Vec3::ZERO;
            face[axis] = -d.signum();
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            if t0 > t_enter {
                t_enter = t0;
                normal = face;
            }
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return None;
            }
        }

        Some(TraceHit {
            point: origin + dir * t_enter,
            normal,
            distance: t_enter,
        })
    }
}

impl GroundTracer for FlatGround {
    fn trace(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: u32) -> Option<TraceHit> {
        let dir = direction.try_normalize()?;
        let mut best = None::<TraceHit>;

        if layer_in_mask(mask, CollisionLayer::TERRAIN) {
            best = self.trace_plane(origin, dir, max_distance);
        }

        for block in self.blocks.iter().filter(|b| layer_in_mask(mask, b.layer)) {
            if let Some(hit) = Self::trace_block(block, origin, dir, max_distance) {
                if best.map_or(true, |b| hit.distance < b.distance) {
                    best = Some(hit);
                }
            }
        }

        best
    }
}
