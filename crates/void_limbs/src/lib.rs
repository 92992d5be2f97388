//! Void Limbs - procedural limbs for crawling creatures
//!
//! Creatures grow curved limbs toward ground points chosen ahead of their
//! direction of travel, keep a minimum number planted, and let the rest expire
//! and retract. Limbs check their own ground clearance through the batched
//! [`QueryScheduler`](void_physics::QueryScheduler), so every clearance answer
//! arrives exactly one frame after it was asked.
//!
//! # Features
//!
//! - Eight-handle Bézier limbs sampled into reusable polylines
//! - Growth, deployment and retraction by exponential smoothing
//! - Anchored-limb floor honoured by natural expiry
//! - Forward-biased placement with ground probing
//! - Pooled limb controllers with generational handles
//! - Lifecycle events for audio and VFX hooks
//!
//! # Architecture
//!
//! ```text
//!  CrawlerWorld
//!   ├ LimbPlacementCoordinator (one per creature)
//!   │   ├ AnchorLedger
//!   │   └ LimbPool
//!   │       └ LimbController ──enqueue──┐
//!   │                                   ▼
//!   ├ QueryScheduler<QueryReceiver> ◀───┘
//!   │       │ flush, once per step
//!   │       ▼
//!   └ GroundTracer ──results routed by QueryReceiver──▶ coordinators
//! ```
//!
//! # Example
//!
//! ```ignore
//! use void_limbs::prelude::*;
//! use void_physics::{FlatGround, QueryConfig};
//!
//! let mut world = CrawlerWorld::new(FlatGround::new(0.0), QueryConfig::default())?;
//! let spider = world.spawn_creature(CrawlerConfig::skittering(), BodyMotion::at(Vec3::Y))?;
//!
//! for _ in 0..600 {
//!     world.set_motion(spider, BodyMotion::new(position, velocity))?;
//!     world.step(1.0 / 60.0);
//!     for view in world.creature(spider).unwrap().limb_views() {
//!         draw_line_strip(view.polyline);
//!     }
//! }
//! ```

pub mod config;
pub mod coordinator;
pub mod curve;
pub mod error;
pub mod events;
pub mod ids;
pub mod ledger;
pub mod limb;
pub mod placement;
pub mod pool;
pub mod world;

pub mod prelude {
    //! Common imports for the limb system
    pub use crate::config::{CrawlerConfig, LimbConfig, PlacementConfig};
    pub use crate::coordinator::{BodyMotion, LimbPlacementCoordinator, LimbView};
    pub use crate::error::{LimbError, Result};
    pub use crate::events::{LimbEvent, RetractReason};
    pub use crate::ids::{CreatureId, LimbId, QueryReceiver};
    pub use crate::ledger::AnchorLedger;
    pub use crate::limb::{LimbController, LimbPhase, LimbSpawn, HANDLE_COUNT};
    pub use crate::pool::LimbPool;
    pub use crate::world::CrawlerWorld;
    pub use glam::Vec3;
}

pub use prelude::*;
