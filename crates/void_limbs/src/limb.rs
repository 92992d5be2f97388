//! Single limb lifecycle: growth, wobble, clearance checks and retraction

use crate::config::LimbConfig;
use crate::curve;
use crate::events::{LimbEvent, RetractReason};
use crate::ids::{CreatureId, LimbId, QueryReceiver};
use crate::ledger::AnchorLedger;
use glam::{Quat, Vec3};
use rand::Rng;
use std::f32::consts::TAU;
use void_physics::{GroundTracer, QueryResult, QueryScheduler};

/// Control points per limb: anchor, five interior handles, foot, tip
pub const HANDLE_COUNT: usize = 8;

const INTERIOR_HANDLES: usize = 5;
const FOOT_HANDLE: usize = 6;
const TIP_HANDLE: usize = 7;

/// Where a limb is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimbPhase {
    /// Initialized, waiting for its first update
    Spawning,
    /// Extending toward the foot
    Growing,
    /// Grown past the deploy threshold and planted
    Deployed,
    /// Shrinking back toward the anchor
    Retracting,
    /// Fully retracted, waiting to be returned to the pool
    Recyclable,
    /// Inert in the pool
    Pooled,
}

/// Everything needed to plant a limb
#[derive(Debug, Clone, Copy)]
pub struct LimbSpawn {
    /// Current attachment point on the body
    pub anchor: Vec3,
    /// Planted position
    pub foot: Vec3,
    /// Ground normal at the foot
    pub ground_normal: Vec3,
    /// Time until natural expiry (s)
    pub lifetime: f32,
}

/// Shared state handed to each limb during a creature tick
pub struct LimbTick<'a> {
    pub frame: u64,
    pub dt: f32,
    pub anchor: Vec3,
    pub creature: CreatureId,
    pub config: &'a LimbConfig,
    pub scheduler: &'a mut QueryScheduler<QueryReceiver>,
    pub ledger: &'a mut AnchorLedger,
    pub events: &'a mut Vec<LimbEvent>,
    pub next_request_id: &'a mut u64,
}

/// One procedurally animated limb.
///
/// Controllers live in a [`LimbPool`](crate::pool::LimbPool) and are reused:
/// [`initialize`](Self::initialize) plants one, [`update`](Self::update)
/// drives it every frame that matches its frame phase, and the pool
/// deactivates it once it has fully retracted.
#[derive(Debug, Clone)]
pub struct LimbController {
    phase: LimbPhase,
    frame_phase: u32,

    anchor: Vec3,
    foot: Vec3,
    ground_normal: Vec3,
    tip: Vec3,
    handles: [Vec3; HANDLE_COUNT],
    offsets: [Vec3; INTERIOR_HANDLES],

    progression: f32,
    grow_target: f32,
    deployed: bool,

    growth_speed: f32,
    wobble_speed: f32,

    lifetime_remaining: f32,
    min_active_remaining: f32,
    expiry_deferred: bool,

    clearance_timer: f32,
    latest_request: Option<u64>,
    obstructed: bool,

    pending_dt: f32,
    polyline: Vec<Vec3>,
}

impl LimbController {
    /// Create an inert controller that updates on frames where
    /// `frame % divisor == frame_phase`
    pub fn new(frame_phase: u32, resolution: usize) -> Self {
        Self {
            phase: LimbPhase::Pooled,
            frame_phase,
            anchor: Vec3::ZERO,
            foot: Vec3::ZERO,
            ground_normal: Vec3::Y,
            tip: Vec3::ZERO,
            handles: [Vec3::ZERO; HANDLE_COUNT],
            offsets: [Vec3::ZERO; INTERIOR_HANDLES],
            progression: 0.0,
            grow_target: 0.0,
            deployed: false,
            growth_speed: 1.0,
            wobble_speed: 0.0,
            lifetime_remaining: 0.0,
            min_active_remaining: 0.0,
            expiry_deferred: false,
            clearance_timer: 0.0,
            latest_request: None,
            obstructed: false,
            pending_dt: 0.0,
            polyline: Vec::with_capacity(resolution + 2),
        }
    }

    /// Plant the limb. Snaps the secondary tip to the ground with an
    /// immediate trace and rolls the per-limb random parameters.
    pub fn initialize<T, R>(&mut self, spawn: &LimbSpawn, config: &LimbConfig, tracer: &T, rng: &mut R)
    where
        T: GroundTracer + ?Sized,
        R: Rng + ?Sized,
    {
        self.phase = LimbPhase::Spawning;
        self.anchor = spawn.anchor;
        self.foot = spawn.foot;
        self.ground_normal = match spawn.ground_normal.try_normalize() {
            Some(normal) => normal,
            None => {
                log::warn!("degenerate ground normal at {:?}, using +Y", spawn.foot);
                Vec3::Y
            }
        };

        let angle = rng.gen_range(0.0..TAU);
        let spread = config.tip_spread * rng.gen::<f32>().sqrt();
        let probe = spawn.foot + Vec3::new(angle.cos() * spread, config.tip_probe_height, angle.sin() * spread);
        self.tip = tracer
            .trace(probe, Vec3::NEG_Y, config.tip_probe_height * 2.0, config.ground_mask)
            .map_or(spawn.foot, |hit| hit.point);

        let axis = (self.foot - self.anchor).try_normalize().unwrap_or(Vec3::Y);
        let (side, up) = axis.any_orthonormal_pair();
        for offset in &mut self.offsets {
            let theta = rng.gen_range(0.0..TAU);
            let magnitude = rng.gen_range(0.0..=config.handle_offset);
            *offset = (side * theta.cos() + up * theta.sin()) * magnitude;
        }

        self.growth_speed = rng.gen_range(config.growth_speed_min..=config.growth_speed_max);
        self.wobble_speed = rng.gen_range(config.wobble_speed_min..=config.wobble_speed_max);
        if rng.gen::<bool>() {
            self.wobble_speed = -self.wobble_speed;
        }

        self.progression = 0.0;
        self.grow_target = 1.0;
        self.deployed = false;
        self.lifetime_remaining = spawn.lifetime;
        self.min_active_remaining = config.min_active_duration;
        self.expiry_deferred = false;
        self.clearance_timer = config.clearance_interval;
        self.latest_request = None;
        self.obstructed = false;
        self.pending_dt = 0.0;

        self.refresh_shape(config);
    }

    /// Advance the limb by one frame. Returns whether the limb did any work;
    /// off-phase frames only accumulate elapsed time.
    pub fn update(&mut self, id: LimbId, ctx: &mut LimbTick<'_>) -> bool {
        if matches!(self.phase, LimbPhase::Pooled | LimbPhase::Recyclable) {
            return false;
        }

        self.pending_dt += ctx.dt;
        let divisor = ctx.config.update_divisor.max(1) as u64;
        if ctx.frame % divisor != self.frame_phase as u64 % divisor {
            return false;
        }
        let dt = std::mem::take(&mut self.pending_dt);
        let config = ctx.config;

        self.anchor = ctx.anchor;
        if self.phase == LimbPhase::Spawning {
            self.phase = LimbPhase::Growing;
        }

        self.clearance_timer += dt;
        if self.phase == LimbPhase::Growing
            && !self.obstructed
            && self.clearance_timer >= config.clearance_interval
        {
            self.request_clearance(id, ctx);
        }

        self.lifetime_remaining -= dt;
        self.min_active_remaining = (self.min_active_remaining - dt).max(0.0);
        self.check_retraction(id, ctx);

        let blend = 1.0 - (-self.growth_speed * dt).exp();
        self.progression = (self.progression + (self.grow_target - self.progression) * blend).clamp(0.0, 1.0);

        if !self.deployed && self.grow_target == 1.0 && self.progression > config.deploy_threshold {
            self.deployed = true;
            self.phase = LimbPhase::Deployed;
            ctx.ledger.on_deployed();
            ctx.events.push(LimbEvent::Deployed { limb: id });
        } else if self.deployed && self.progression < config.deploy_threshold {
            self.deployed = false;
            ctx.ledger.on_undeployed();
        }

        if self.grow_target == 0.0 && self.progression < config.recycle_threshold {
            self.phase = LimbPhase::Recyclable;
            log::trace!("{} recyclable", id);
        }

        self.rotate_offsets(dt);
        self.refresh_shape(config);
        true
    }

    /// Apply the answer to this limb's clearance trace. Returns `false` when
    /// the answer is stale (a newer request is outstanding, or none is).
    pub fn on_clearance_result(
        &mut self,
        id: LimbId,
        result: &QueryResult,
        ledger: &mut AnchorLedger,
        events: &mut Vec<LimbEvent>,
    ) -> bool {
        if self.latest_request != Some(result.request_id) {
            return false;
        }
        self.latest_request = None;

        if result.hit {
            self.obstructed = true;
            log::debug!("{} obstructed at {:?}", id, result.point);
            self.begin_retraction(id, RetractReason::Obstructed, ledger, events);
        }
        true
    }

    fn request_clearance(&mut self, id: LimbId, ctx: &mut LimbTick<'_>) {
        self.clearance_timer = 0.0;
        let request_id = *ctx.next_request_id;
        *ctx.next_request_id += 1;
        self.latest_request = Some(request_id);

        let origin = self.foot + Vec3::Y * ctx.config.clearance_offset;
        ctx.scheduler.enqueue(
            origin,
            self.anchor,
            ctx.config.clearance_mask,
            QueryReceiver::Limb {
                creature: ctx.creature,
                limb: id,
            },
            request_id,
        );
    }

    fn check_retraction(&mut self, id: LimbId, ctx: &mut LimbTick<'_>) {
        if self.grow_target == 0.0 {
            return;
        }

        if self.anchor.distance(self.foot) > ctx.config.max_anchor_distance {
            self.begin_retraction(id, RetractReason::Overstretched, ctx.ledger, ctx.events);
            return;
        }

        let expired = self.lifetime_remaining <= 0.0 && self.min_active_remaining <= 0.0;
        if self.phase != LimbPhase::Deployed || !expired {
            return;
        }

        if ctx.ledger.can_release_anchor() {
            self.begin_retraction(id, RetractReason::Expired, ctx.ledger, ctx.events);
        } else if !self.expiry_deferred {
            self.expiry_deferred = true;
            log::debug!(
                "{} expiry deferred: {} anchored, floor {}",
                id,
                ctx.ledger.anchored(),
                ctx.ledger.minimum()
            );
        }
    }

    fn begin_retraction(
        &mut self,
        id: LimbId,
        reason: RetractReason,
        ledger: &mut AnchorLedger,
        events: &mut Vec<LimbEvent>,
    ) {
        if self.grow_target == 0.0 {
            return;
        }
        self.grow_target = 0.0;
        if self.deployed {
            ledger.on_anchor_released();
        }
        self.phase = LimbPhase::Retracting;
        events.push(LimbEvent::Retracting { limb: id, reason });
        log::debug!("{} retracting ({:?}) at progression {:.2}", id, reason, self.progression);
    }

    fn rotate_offsets(&mut self, dt: f32) {
        let Some(axis) = (self.foot - self.anchor).try_normalize() else {
            return;
        };
        let rotation = Quat::from_axis_angle(axis, self.wobble_speed * dt);
        for offset in &mut self.offsets {
            *offset = rotation * *offset;
        }
    }

    fn refresh_shape(&mut self, config: &LimbConfig) {
        self.handles[0] = self.anchor;
        for (i, offset) in self.offsets.iter().enumerate() {
            let t = (i + 1) as f32 / FOOT_HANDLE as f32;
            self.handles[i + 1] = self.anchor.lerp(self.foot, t) + *offset;
        }
        self.handles[FOOT_HANDLE] = self.foot + self.ground_normal * config.foot_lift;
        self.handles[TIP_HANDLE] = self.tip;

        curve::sample_into(&self.handles, config.resolution, self.progression, &mut self.polyline);
    }

    /// Return to the inert pooled state
    pub(crate) fn deactivate(&mut self) {
        debug_assert!(!self.deployed, "deactivating a deployed limb");
        self.phase = LimbPhase::Pooled;
        self.progression = 0.0;
        self.grow_target = 0.0;
        self.latest_request = None;
        self.pending_dt = 0.0;
        self.polyline.clear();
    }

    /// Current phase
    pub fn phase(&self) -> LimbPhase {
        self.phase
    }

    /// Update slot among `update_divisor` frames
    pub fn frame_phase(&self) -> u32 {
        self.frame_phase
    }

    /// Growth blend in [0, 1]
    pub fn progression(&self) -> f32 {
        self.progression
    }

    /// 1 while extending, 0 once retracting
    pub fn grow_target(&self) -> f32 {
        self.grow_target
    }

    /// Whether the limb counts as deployed
    pub fn is_deployed(&self) -> bool {
        self.deployed
    }

    /// Deployed and not retracting
    pub fn is_anchored(&self) -> bool {
        self.deployed && self.grow_target == 1.0
    }

    /// Whether a clearance trace found an obstruction
    pub fn is_obstructed(&self) -> bool {
        self.obstructed
    }

    /// Request id of the outstanding clearance trace
    pub fn pending_request(&self) -> Option<u64> {
        self.latest_request
    }

    /// Remaining lifetime (negative once expired)
    pub fn lifetime_remaining(&self) -> f32 {
        self.lifetime_remaining
    }

    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    pub fn foot(&self) -> Vec3 {
        self.foot
    }

    pub fn tip(&self) -> Vec3 {
        self.tip
    }

    /// Control points from the last update
    pub fn handles(&self) -> &[Vec3; HANDLE_COUNT] {
        &self.handles
    }

    /// Sampled curve from the anchor to the current growth tip
    pub fn polyline(&self) -> &[Vec3] {
        &self.polyline
    }
}
