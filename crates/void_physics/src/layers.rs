//! Collision layers and filtering

use serde::{Deserialize, Serialize};

/// A collision layer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionLayer(pub u32);

impl CollisionLayer {
    /// Walkable ground (terrain meshes, heightfields)
    pub const TERRAIN: Self = Self(1);
    /// Static obstacles that block limbs but are not planted on
    pub const OBSTACLES: Self = Self(2);

    /// Get the layer as a bitmask
    pub const fn as_mask(&self) -> u32 {
        1 << self.0
    }
}

/// Whether a query with `mask` can hit objects on `layer`
pub const fn layer_in_mask(mask: u32, layer: CollisionLayer) -> bool {
    mask & layer.as_mask() != 0
}

/// Mask used when planting feet
pub const GROUND_MASK: u32 = CollisionLayer::TERRAIN.as_mask();

/// Mask used for limb clearance checks
pub const CLEARANCE_MASK: u32 = CollisionLayer::TERRAIN.as_mask() | CollisionLayer::OBSTACLES.as_mask();

/// Collision groups for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionGroups {
    /// Which groups this object belongs to (membership)
    pub memberships: u32,
    /// Which groups this object can collide with (filter)
    pub filter: u32,
}

impl CollisionGroups {
    /// Create collision groups that collide with everything
    pub const ALL: Self = Self {
        memberships: u32::MAX,
        filter: u32::MAX,
    };

    /// Groups for a static piece of the world on a single layer, visible to every query
    pub fn static_on(layer: CollisionLayer) -> Self {
        Self {
            memberships: layer.as_mask(),
            filter: u32::MAX,
        }
    }

    /// Groups for a query that only wants to hit objects in `mask`
    pub fn query(mask: u32) -> Self {
        Self {
            memberships: u32::MAX,
            filter: mask,
        }
    }

    /// Check if two groups can collide
    pub fn can_collide(&self, other: &CollisionGroups) -> bool {
        (self.memberships & other.filter) != 0 && (other.memberships & self.filter) != 0
    }
}

impl Default for CollisionGroups {
    fn default() -> Self {
        Self::ALL
    }
}
