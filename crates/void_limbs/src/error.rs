//! Error types for the limb system

use crate::ids::CreatureId;
use thiserror::Error;

/// Limb system errors.
///
/// Runtime conditions such as missing ground or obstructed limbs are not
/// errors; they are handled where they are detected.
#[derive(Debug, Error)]
pub enum LimbError {
    /// Invalid configuration
    #[error("Invalid limb configuration: {0}")]
    InvalidConfig(String),

    /// Creature not registered with the world
    #[error("Creature not found: {0:?}")]
    CreatureNotFound(CreatureId),

    /// Error from the physics layer
    #[error(transparent)]
    Physics(#[from] void_physics::PhysicsError),
}

/// Result type for limb operations
pub type Result<T> = std::result::Result<T, LimbError>;
