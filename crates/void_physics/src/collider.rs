//! Static terrain colliders

use crate::error::{PhysicsError, Result};
use crate::layers::{CollisionGroups, CollisionLayer};
use rapier3d::prelude as rapier;
use serde::{Deserialize, Serialize};

/// Handle to a collider in the terrain world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderHandle(pub(crate) rapier::ColliderHandle);

/// Collision shape type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ColliderShape {
    /// Sphere with radius
    Sphere {
        radius: f32,
    },
    /// Box with half-extents
    Box {
        half_extents: [f32; 3],
    },
    /// Triangle mesh
    TriMesh {
        vertices: Vec<[f32; 3]>,
        indices: Vec<[u32; 3]>,
    },
    /// Heightfield terrain, `rows * cols` heights in row-major order
    HeightField {
        heights: Vec<f32>,
        rows: usize,
        cols: usize,
        scale: [f32; 3],
    },
}

impl Default for ColliderShape {
    fn default() -> Self {
        Self::Box {
            half_extents: [0.5, 0.5, 0.5],
        }
    }
}

impl ColliderShape {
    /// Create a sphere shape
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Create a box shape from half-extents
    pub fn cuboid(hx: f32, hy: f32, hz: f32) -> Self {
        Self::Box {
            half_extents: [hx, hy, hz],
        }
    }

    /// Create a heightfield by sampling `height(x, z)` on a regular grid
    /// centred on the origin and spanning `size_x` by `size_z`.
    pub fn sampled_heightfield<F>(rows: usize, cols: usize, size_x: f32, size_z: f32, height: F) -> Self
    where
        F: Fn(f32, f32) -> f32,
    {
        let mut heights = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            // Rapier maps rows to Z and columns to X
            let z = (r as f32 / (rows.max(2) - 1) as f32 - 0.5) * size_z;
            for c in 0..cols {
                let x = (c as f32 / (cols.max(2) - 1) as f32 - 0.5) * size_x;
                heights.push(height(x, z));
            }
        }
        Self::HeightField {
            heights,
            rows,
            cols,
            scale: [size_x, 1.0, size_z],
        }
    }

    /// Check the shape can be built
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Sphere { radius } if *radius <= 0.0 => Err(PhysicsError::ShapeCreationFailed(
                format!("sphere radius must be positive, got {radius}"),
            )),
            Self::Box { half_extents } if half_extents.iter().any(|e| *e <= 0.0) => Err(
                PhysicsError::ShapeCreationFailed(format!("box extents must be positive, got {half_extents:?}")),
            ),
            Self::TriMesh { vertices, indices } => {
                let count = vertices.len() as u32;
                if indices.is_empty() {
                    return Err(PhysicsError::ShapeCreationFailed("trimesh has no triangles".to_string()));
                }
                if indices.iter().flatten().any(|i| *i >= count) {
                    return Err(PhysicsError::ShapeCreationFailed(
                        "trimesh index out of range".to_string(),
                    ));
                }
                Ok(())
            }
            Self::HeightField { heights, rows, cols, .. } => {
                if *rows < 2 || *cols < 2 {
                    return Err(PhysicsError::ShapeCreationFailed(format!(
                        "heightfield needs at least 2x2 samples, got {rows}x{cols}"
                    )));
                }
                if heights.len() != rows * cols {
                    return Err(PhysicsError::ShapeCreationFailed(format!(
                        "heightfield expects {} samples, got {}",
                        rows * cols,
                        heights.len()
                    )));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Build a Rapier shared shape
    pub(crate) fn to_rapier(&self) -> rapier::SharedShape {
        match self {
            Self::Sphere { radius } => rapier::SharedShape::ball(*radius),
            Self::Box { half_extents } => {
                rapier::SharedShape::cuboid(half_extents[0], half_extents[1], half_extents[2])
            }
            Self::TriMesh { vertices, indices } => {
                let rapier_verts: Vec<_> = vertices
                    .iter()
                    .map(|v| rapier::Point::new(v[0], v[1], v[2]))
                    .collect();
                rapier::SharedShape::trimesh(rapier_verts, indices.clone())
            }
            Self::HeightField {
                heights,
                rows,
                cols,
                scale,
            } => {
                let matrix = rapier::nalgebra::DMatrix::from_row_slice(*rows, *cols, heights);
                rapier::SharedShape::heightfield(
                    matrix,
                    rapier::Vector::new(scale[0], scale[1], scale[2]),
                )
            }
        }
    }
}

/// Description for creating a terrain collider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColliderDesc {
    /// Collision shape
    pub shape: ColliderShape,
    /// World-space position
    pub position: [f32; 3],
    /// Collision groups
    pub collision_groups: CollisionGroups,
}

impl Default for ColliderDesc {
    fn default() -> Self {
        Self {
            shape: ColliderShape::default(),
            position: [0.0, 0.0, 0.0],
            collision_groups: CollisionGroups::static_on(CollisionLayer::TERRAIN),
        }
    }
}

impl ColliderDesc {
    /// Create a new ground collider description with a shape
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            ..Default::default()
        }
    }

    /// Create an obstacle that blocks clearance checks but is not walkable
    pub fn obstacle(shape: ColliderShape) -> Self {
        Self {
            shape,
            collision_groups: CollisionGroups::static_on(CollisionLayer::OBSTACLES),
            ..Default::default()
        }
    }

    /// Set world position
    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = [x, y, z];
        self
    }

    /// Build a Rapier collider builder
    pub(crate) fn to_rapier_builder(&self) -> rapier::ColliderBuilder {
        rapier::ColliderBuilder::new(self.shape.to_rapier())
            .translation(rapier::Vector::new(
                self.position[0],
                self.position[1],
                self.position[2],
            ))
            .collision_groups(rapier::InteractionGroups::new(
                rapier::Group::from_bits_truncate(self.collision_groups.memberships),
                rapier::Group::from_bits_truncate(self.collision_groups.filter),
            ))
    }
}
