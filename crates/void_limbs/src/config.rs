//! Limb and placement configuration

use crate::error::{LimbError, Result};
use serde::{Deserialize, Serialize};
use void_physics::{CLEARANCE_MASK, GROUND_MASK};

/// Per-limb growth, shape and cadence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimbConfig {
    /// Curve samples over the full length of a limb
    pub resolution: usize,

    /// Growth speed range (exponential smoothing rate, 1/s)
    pub growth_speed_min: f32,
    pub growth_speed_max: f32,

    /// Wobble speed range for the handle offsets (rad/s)
    pub wobble_speed_min: f32,
    pub wobble_speed_max: f32,

    /// Largest perturbation applied to the interior handles
    pub handle_offset: f32,

    /// Vertical lift of the foot handle above the planted point
    pub foot_lift: f32,

    /// Horizontal spread of the secondary tip around the foot
    pub tip_spread: f32,

    /// Height above the foot from which the tip is snapped to the ground
    pub tip_probe_height: f32,

    /// Minimum time between clearance traces of one limb (s)
    pub clearance_interval: f32,

    /// Clearance traces start this far above the foot
    pub clearance_offset: f32,

    /// Limbs update once every `update_divisor` frames
    pub update_divisor: u32,

    /// Progression above which a limb counts as deployed
    pub deploy_threshold: f32,

    /// Progression below which a retracting limb is recycled
    pub recycle_threshold: f32,

    /// A limb never expires naturally before this long (s)
    pub min_active_duration: f32,

    /// Anchor to foot distance beyond which a limb is torn loose
    pub max_anchor_distance: f32,

    /// Layers feet and tips are planted on
    pub ground_mask: u32,

    /// Layers that obstruct a growing limb
    pub clearance_mask: u32,
}

impl Default for LimbConfig {
    fn default() -> Self {
        Self {
            resolution: 16,
            growth_speed_min: 3.0,
            growth_speed_max: 5.0,
            wobble_speed_min: 0.5,
            wobble_speed_max: 2.0,
            handle_offset: 0.15,
            foot_lift: 0.05,
            tip_spread: 0.2,
            tip_probe_height: 1.0,
            clearance_interval: 0.15,
            clearance_offset: 0.1,
            update_divisor: 2,
            deploy_threshold: 0.9,
            recycle_threshold: 0.05,
            min_active_duration: 0.5,
            max_anchor_distance: 4.0,
            ground_mask: GROUND_MASK,
            clearance_mask: CLEARANCE_MASK,
        }
    }
}

impl LimbConfig {
    /// Set update divisor
    pub fn with_update_divisor(mut self, divisor: u32) -> Self {
        self.update_divisor = divisor;
        self
    }

    /// Set curve resolution
    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the growth speed range
    pub fn with_growth_speed(mut self, min: f32, max: f32) -> Self {
        self.growth_speed_min = min;
        self.growth_speed_max = max;
        self
    }

    /// Set the maximum anchor distance
    pub fn with_max_anchor_distance(mut self, distance: f32) -> Self {
        self.max_anchor_distance = distance;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.resolution == 0 {
            return invalid("resolution must be at least 1");
        }
        if self.update_divisor == 0 {
            return invalid("update_divisor must be at least 1");
        }
        check_range("growth_speed", self.growth_speed_min, self.growth_speed_max)?;
        check_range("wobble_speed", self.wobble_speed_min, self.wobble_speed_max)?;
        if self.growth_speed_min <= 0.0 {
            return invalid("growth_speed_min must be positive");
        }
        if !(0.0 < self.recycle_threshold
            && self.recycle_threshold < self.deploy_threshold
            && self.deploy_threshold < 1.0)
        {
            return invalid("thresholds must satisfy 0 < recycle < deploy < 1");
        }
        check_non_negative("handle_offset", self.handle_offset)?;
        check_non_negative("tip_spread", self.tip_spread)?;
        check_non_negative("tip_probe_height", self.tip_probe_height)?;
        check_non_negative("clearance_interval", self.clearance_interval)?;
        check_non_negative("min_active_duration", self.min_active_duration)?;
        if !self.foot_lift.is_finite() || !self.clearance_offset.is_finite() {
            return invalid("foot_lift and clearance_offset must be finite");
        }
        if self.max_anchor_distance.is_nan() || self.max_anchor_distance <= 0.0 {
            return invalid("max_anchor_distance must be positive");
        }
        Ok(())
    }
}

/// Where and how often new limbs are planted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Number of leg groups the creature may have at once
    pub number_of_legs: usize,

    /// Limbs planted per group
    pub parts_per_leg: usize,

    /// Placement radius around the forward origin, also the forward reach
    pub new_leg_radius: f32,

    /// Minimum planar distance between body and a new foot
    pub min_leg_distance: f32,

    /// Time between spawn attempts (s)
    pub new_leg_cooldown: f32,

    /// Group lifetime range (s)
    pub lifetime_min: f32,
    pub lifetime_max: f32,

    /// Anchored limbs that natural expiry may not go below
    pub minimum_anchored_limbs: usize,

    /// Also hold the anchored floor while the body is at rest
    pub hold_floor_at_rest: bool,

    /// Planar speed above which the body counts as moving
    pub move_speed_threshold: f32,

    /// Candidates further than this from the velocity direction are mirrored to the front (deg)
    pub mirror_angle: f32,

    /// Candidates further than this from the velocity direction are pulled into the cone (deg)
    pub cone_angle: f32,

    /// How far a candidate outside the cone is blended back toward the velocity direction
    pub cone_blend: f32,

    /// Ground probe starts this far above the candidate
    pub ground_probe_height: f32,

    /// Ground probe reaches this far below the candidate
    pub ground_probe_depth: f32,

    /// Re-trace from the body toward the ground hit and keep the first ground contact
    pub refine_with_body_trace: bool,

    /// Forward direction used when the body is not moving
    pub fallback_forward: [f32; 3],

    /// Anchor position relative to the body
    pub anchor_offset: [f32; 3],

    /// Limb controllers constructed up front
    pub pool_prewarm: usize,

    /// Time between body ground-clearance probes (s)
    pub body_probe_interval: f32,

    /// Body ground probe reach (below the body)
    pub body_probe_depth: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            number_of_legs: 4,
            parts_per_leg: 4,
            new_leg_radius: 1.5,
            min_leg_distance: 0.75,
            new_leg_cooldown: 0.3,
            lifetime_min: 1.5,
            lifetime_max: 3.0,
            minimum_anchored_limbs: 2,
            hold_floor_at_rest: true,
            move_speed_threshold: 0.1,
            mirror_angle: 90.0,
            cone_angle: 45.0,
            cone_blend: 0.5,
            ground_probe_height: 5.0,
            ground_probe_depth: 10.0,
            refine_with_body_trace: true,
            fallback_forward: [0.0, 0.0, 1.0],
            anchor_offset: [0.0, 0.0, 0.0],
            pool_prewarm: 0,
            body_probe_interval: 0.25,
            body_probe_depth: 10.0,
        }
    }
}

impl PlacementConfig {
    /// Most limbs a creature may have alive at once
    pub fn limb_ceiling(&self) -> usize {
        self.number_of_legs * self.parts_per_leg
    }

    /// Set leg counts
    pub fn with_legs(mut self, number_of_legs: usize, parts_per_leg: usize) -> Self {
        self.number_of_legs = number_of_legs;
        self.parts_per_leg = parts_per_leg;
        self
    }

    /// Set the anchored floor
    pub fn with_minimum_anchored(mut self, minimum: usize) -> Self {
        self.minimum_anchored_limbs = minimum;
        self
    }

    /// Set the group lifetime range
    pub fn with_lifetime(mut self, min: f32, max: f32) -> Self {
        self.lifetime_min = min;
        self.lifetime_max = max;
        self
    }

    /// Set spawn cooldown
    pub fn with_cooldown(mut self, cooldown: f32) -> Self {
        self.new_leg_cooldown = cooldown;
        self
    }

    /// Set pool warm-up size
    pub fn with_prewarm(mut self, count: usize) -> Self {
        self.pool_prewarm = count;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.number_of_legs == 0 || self.parts_per_leg == 0 {
            return invalid("number_of_legs and parts_per_leg must be at least 1");
        }
        if self.minimum_anchored_limbs > self.limb_ceiling() {
            return invalid("minimum_anchored_limbs exceeds number_of_legs * parts_per_leg");
        }
        check_range("lifetime", self.lifetime_min, self.lifetime_max)?;
        if self.new_leg_radius.is_nan() || self.new_leg_radius <= 0.0 {
            return invalid("new_leg_radius must be positive");
        }
        check_non_negative("min_leg_distance", self.min_leg_distance)?;
        if !(0.0..=1.0).contains(&self.cone_blend) {
            return invalid("cone_blend must be within [0, 1]");
        }
        if self.ground_probe_height.is_nan() || self.ground_probe_height <= 0.0 {
            return invalid("ground_probe_height must be positive");
        }
        check_non_negative("ground_probe_depth", self.ground_probe_depth)?;
        check_non_negative("new_leg_cooldown", self.new_leg_cooldown)?;
        check_non_negative("body_probe_interval", self.body_probe_interval)?;
        let forward = self.fallback_forward;
        if forward[0] * forward[0] + forward[2] * forward[2] <= f32::EPSILON {
            return invalid("fallback_forward needs a horizontal component");
        }
        Ok(())
    }
}

/// Full configuration for one crawling creature
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub limb: LimbConfig,
    pub placement: PlacementConfig,
    /// Fixed seed for reproducible runs; entropy when absent
    pub rng_seed: Option<u64>,
}

impl CrawlerConfig {
    /// A small spider-like creature: many short, quick limbs
    pub fn skittering() -> Self {
        Self {
            limb: LimbConfig {
                growth_speed_min: 6.0,
                growth_speed_max: 9.0,
                max_anchor_distance: 2.5,
                ..Default::default()
            },
            placement: PlacementConfig {
                number_of_legs: 6,
                parts_per_leg: 2,
                new_leg_radius: 0.9,
                min_leg_distance: 0.4,
                new_leg_cooldown: 0.12,
                lifetime_min: 0.6,
                lifetime_max: 1.2,
                minimum_anchored_limbs: 3,
                ..Default::default()
            },
            rng_seed: None,
        }
    }

    /// A heavy creature with few, slow, long-lived tendrils
    pub fn lumbering() -> Self {
        Self {
            limb: LimbConfig {
                growth_speed_min: 1.5,
                growth_speed_max: 2.5,
                handle_offset: 0.3,
                max_anchor_distance: 6.0,
                ..Default::default()
            },
            placement: PlacementConfig {
                number_of_legs: 3,
                parts_per_leg: 3,
                new_leg_radius: 2.5,
                min_leg_distance: 1.5,
                new_leg_cooldown: 0.8,
                lifetime_min: 3.0,
                lifetime_max: 5.0,
                minimum_anchored_limbs: 3,
                ..Default::default()
            },
            rng_seed: None,
        }
    }

    /// Set the RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Replace the limb settings
    pub fn with_limb(mut self, limb: LimbConfig) -> Self {
        self.limb = limb;
        self
    }

    /// Replace the placement settings
    pub fn with_placement(mut self, placement: PlacementConfig) -> Self {
        self.placement = placement;
        self
    }

    /// Reject inconsistent settings
    pub fn validate(&self) -> Result<()> {
        self.limb.validate()?;
        self.placement.validate()?;
        if self.placement.min_leg_distance > self.limb.max_anchor_distance {
            return invalid("min_leg_distance is beyond max_anchor_distance; every limb would tear loose");
        }
        Ok(())
    }
}

fn invalid(message: &str) -> Result<()> {
    Err(LimbError::InvalidConfig(message.to_string()))
}

fn check_range(name: &str, min: f32, max: f32) -> Result<()> {
    if min.is_nan() || max.is_nan() || min > max || min < 0.0 {
        return Err(LimbError::InvalidConfig(format!(
            "{name} range is invalid: [{min}, {max}]"
        )));
    }
    Ok(())
}

fn check_non_negative(name: &str, value: f32) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(LimbError::InvalidConfig(format!(
            "{name} must be finite and not negative: {value}"
        )));
    }
    Ok(())
}
