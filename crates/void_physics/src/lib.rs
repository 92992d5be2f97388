//! Void Physics - terrain queries and batched line tracing
//!
//! This crate answers "what does this line hit" for the procedural limb
//! system, both immediately and as a once-per-frame batch.
//!
//! # Features
//!
//! - Static terrain colliders backed by Rapier 3D (heightfields, meshes, boxes)
//! - Collision layers and query masks
//! - The [`GroundTracer`] interface, implemented by [`TerrainWorld`] and the
//!   analytic [`FlatGround`]
//! - [`QueryScheduler`]: deferred segment traces resolved in one parallel
//!   batch per frame, results delivered in enqueue order
//!
//! # Architecture
//!
//! ```text
//!   limbs / creatures           (any number, any time during the frame)
//!         │ enqueue(origin, target, mask, receiver, id)
//!         ▼
//! ┌──────────────────┐  flush()  ┌──────────────┐
//! │  QueryScheduler  │──────────▶│ GroundTracer │  (rayon fan-out)
//! └──────────────────┘           └──────────────┘
//!         │ deliver(receiver, result)   in enqueue order
//!         ▼
//!   ResultDispatch
//! ```
//!
//! # Example
//!
//! ```ignore
//! use void_physics::prelude::*;
//!
//! let mut terrain = TerrainWorld::new();
//! terrain.add_collider(ColliderDesc::new(ColliderShape::cuboid(50.0, 0.5, 50.0)))?;
//! terrain.sync();
//!
//! let mut scheduler = QueryScheduler::new(QueryConfig::default())?;
//! scheduler.enqueue(Vec3::Y * 2.0, Vec3::NEG_Y, GROUND_MASK, 7u32, 1);
//! scheduler.flush(&terrain, &mut |receiver: u32, result: &QueryResult| {
//!     println!("{receiver}: hit={}", result.hit);
//!     true
//! });
//! ```

pub mod batch;
pub mod collider;
pub mod config;
pub mod error;
pub mod layers;
pub mod query;
pub mod trace;
pub mod world;

pub mod prelude {
    //! Common imports for physics functionality
    pub use crate::batch::{FlushStats, QueryRequest, QueryResult, QueryScheduler, QueryStager, ResultDispatch};
    pub use crate::collider::{ColliderDesc, ColliderHandle, ColliderShape};
    pub use crate::config::QueryConfig;
    pub use crate::error::{PhysicsError, Result};
    pub use crate::layers::{layer_in_mask, CollisionGroups, CollisionLayer, CLEARANCE_MASK, GROUND_MASK};
    pub use crate::query::{RaycastHit, RaycastOptions};
    pub use crate::trace::{Block, FlatGround, GroundTracer, TraceHit};
    pub use crate::world::TerrainWorld;
    pub use glam::Vec3;
}

pub use prelude::*;
