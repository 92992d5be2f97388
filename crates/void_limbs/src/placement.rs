//! Choosing where the next group of limbs is planted
//!
//! Candidates are generated in the XZ plane around a point ahead of the body,
//! reshaped so they favour the direction of travel, then dropped onto the
//! ground with an immediate trace.

use crate::config::PlacementConfig;
use glam::Vec3;
use rand::Rng;
use std::f32::consts::TAU;
use void_physics::{GroundTracer, TraceHit};

/// Extra reach for the body refine trace so it can still hit the probed surface
const REFINE_MARGIN: f32 = 1e-3;

/// Project onto the ground plane
#[inline]
pub fn planar(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Uniform random point in a horizontal disc around the origin
pub fn random_in_disc<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> Vec3 {
    let angle = rng.gen_range(0.0..TAU);
    let r = radius * rng.gen::<f32>().sqrt();
    Vec3::new(angle.cos() * r, 0.0, angle.sin() * r)
}

/// Planar heading and speed of the body; falls back to the configured
/// forward direction when the body is still
pub fn heading(velocity: Vec3, config: &PlacementConfig) -> (Vec3, f32) {
    let flat = planar(velocity);
    let speed = flat.length();
    let fallback = planar(Vec3::from_array(config.fallback_forward))
        .try_normalize()
        .unwrap_or(Vec3::Z);
    let direction = if speed > f32::EPSILON { flat / speed } else { fallback };
    (direction, speed)
}

/// Propose a foot position (at body height) for the next limb group
pub fn propose_candidate<R: Rng + ?Sized>(
    body: Vec3,
    velocity: Vec3,
    config: &PlacementConfig,
    rng: &mut R,
) -> Vec3 {
    let (direction, speed) = heading(velocity, config);
    let origin = direction * config.new_leg_radius;
    let offset = origin + random_in_disc(rng, config.new_leg_radius);
    body + shape_offset(offset, direction, speed, config)
}

/// Reshape a planar offset from the body so it favours the heading.
///
/// Mirrors candidates behind a moving body to the front, pushes candidates
/// that are too close out to `min_leg_distance`, and bends candidates outside
/// the forward cone part of the way back toward the heading. The cone blend
/// keeps the offset's length.
pub fn shape_offset(offset: Vec3, direction: Vec3, speed: f32, config: &PlacementConfig) -> Vec3 {
    let mut offset = planar(offset);
    let moving = speed > config.move_speed_threshold;

    if moving && angle_deg(offset, direction) > config.mirror_angle {
        offset -= direction * (2.0 * offset.dot(direction));
    }

    let distance = offset.length();
    if distance < config.min_leg_distance {
        offset = match offset.try_normalize() {
            Some(dir) => dir * config.min_leg_distance,
            None => direction * config.min_leg_distance,
        };
    }

    if moving && angle_deg(offset, direction) > config.cone_angle {
        let length = offset.length();
        let bent = (offset / length).lerp(direction, config.cone_blend);
        offset = bent.try_normalize().unwrap_or(direction) * length;
    }

    offset
}

/// Drop a candidate onto the ground.
///
/// Probes straight down through the candidate, then optionally re-traces from
/// the body toward that hit and keeps the first ground contact on the way, so
/// feet don't end up on the far side of a ridge.
pub fn resolve_foot<T: GroundTracer + ?Sized>(
    candidate: Vec3,
    body: Vec3,
    config: &PlacementConfig,
    mask: u32,
    tracer: &T,
) -> Option<TraceHit> {
    let start = candidate + Vec3::Y * config.ground_probe_height;
    let reach = config.ground_probe_height + config.ground_probe_depth;
    let hit = tracer.trace(start, Vec3::NEG_Y, reach, mask)?;

    if !config.refine_with_body_trace {
        return Some(hit);
    }

    let toward = hit.point - body;
    let Some(direction) = toward.try_normalize() else {
        return Some(hit);
    };
    let refined = tracer.trace_segment(body, hit.point + direction * REFINE_MARGIN, mask);
    Some(refined.unwrap_or(hit))
}

fn angle_deg(a: Vec3, b: Vec3) -> f32 {
    if a.length_squared() <= f32::EPSILON || b.length_squared() <= f32::EPSILON {
        return 0.0;
    }
    a.angle_between(b).to_degrees()
}
