//! Lifecycle notifications for audio, VFX and other outside consumers

use crate::ids::LimbId;
use glam::Vec3;

/// Why a limb started retracting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetractReason {
    /// Lifetime ran out
    Expired,
    /// A clearance trace found something between foot and body
    Obstructed,
    /// The body moved too far from the foot
    Overstretched,
}

/// Something that happened to a creature's limbs during a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LimbEvent {
    Spawned { limb: LimbId, foot: Vec3 },
    Deployed { limb: LimbId },
    Retracting { limb: LimbId, reason: RetractReason },
    Recycled { limb: LimbId },
    /// A placement attempt found no ground under `candidate`
    SpawnAborted { candidate: Vec3 },
}
