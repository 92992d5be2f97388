//! Per-creature counts of planted limbs

/// Deployed and anchored limb counts for one creature.
///
/// *Deployed* limbs have grown past the deploy threshold. *Anchored* limbs are
/// deployed limbs that are not retracting. Natural expiry may only release an
/// anchored limb while the anchored count stays at or above the floor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorLedger {
    deployed: usize,
    anchored: usize,
    minimum: usize,
    moving: bool,
    hold_at_rest: bool,
}

impl AnchorLedger {
    /// Create a ledger with the given floor
    pub fn new(minimum: usize, hold_at_rest: bool) -> Self {
        Self {
            deployed: 0,
            anchored: 0,
            minimum,
            moving: false,
            hold_at_rest,
        }
    }

    /// Limbs past the deploy threshold
    pub fn deployed(&self) -> usize {
        self.deployed
    }

    /// Deployed limbs that are not retracting
    pub fn anchored(&self) -> usize {
        self.anchored
    }

    /// Configured floor
    pub fn minimum(&self) -> usize {
        self.minimum
    }

    /// Whether the body is moving
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub(crate) fn set_moving(&mut self, moving: bool) {
        self.moving = moving;
    }

    /// Whether the floor is currently enforced
    pub fn floor_active(&self) -> bool {
        self.moving || self.hold_at_rest
    }

    /// Whether one anchored limb may retract naturally without breaking the floor
    pub fn can_release_anchor(&self) -> bool {
        !self.floor_active() || self.anchored > self.minimum
    }

    pub(crate) fn on_deployed(&mut self) {
        self.deployed += 1;
        self.anchored += 1;
    }

    pub(crate) fn on_undeployed(&mut self) {
        debug_assert!(self.deployed > 0, "deployed count underflow");
        self.deployed = self.deployed.saturating_sub(1);
    }

    pub(crate) fn on_anchor_released(&mut self) {
        debug_assert!(self.anchored > 0, "anchored count underflow");
        self.anchored = self.anchored.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_blocks_release() {
        let mut ledger = AnchorLedger::new(2, true);
        ledger.on_deployed();
        ledger.on_deployed();
        assert!(!ledger.can_release_anchor());

        ledger.on_deployed();
        assert!(ledger.can_release_anchor());
        ledger.on_anchor_released();
        assert!(!ledger.can_release_anchor());
        assert_eq!(ledger.deployed(), 3);
        assert_eq!(ledger.anchored(), 2);
    }

    #[test]
    fn test_floor_only_in_motion() {
        let mut ledger = AnchorLedger::new(1, false);
        ledger.on_deployed();
        assert!(ledger.can_release_anchor());

        ledger.set_moving(true);
        assert!(!ledger.can_release_anchor());
    }
}
