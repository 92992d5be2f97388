//! De Casteljau evaluation over fixed-size handle arrays
//!
//! Both functions work on stack copies and caller-owned buffers, so sampling
//! a limb every frame allocates nothing once the buffer has grown to
//! `resolution + 2` points.

use glam::Vec3;

/// Evaluate the curve defined by `handles` at `t` (clamped to [0, 1])
pub fn evaluate<const N: usize>(handles: &[Vec3; N], t: f32) -> Vec3 {
    if N == 0 {
        return Vec3::ZERO;
    }
    let t = t.clamp(0.0, 1.0);
    let mut points = *handles;
    for level in 1..N {
        for i in 0..N - level {
            points[i] = points[i].lerp(points[i + 1], t);
        }
    }
    points[0]
}

/// Sample the curve from `t = 0` to `t = t_end` at `resolution` steps per
/// unit of `t`, replacing the contents of `out`.
///
/// The point at exactly `t_end` is always the last one written, even when
/// `t_end` falls between two steps.
pub fn sample_into<const N: usize>(handles: &[Vec3; N], resolution: usize, t_end: f32, out: &mut Vec<Vec3>) {
    out.clear();
    let t_end = t_end.clamp(0.0, 1.0);
    let resolution = resolution.max(1);
    let step = 1.0 / resolution as f32;

    for i in 0..=resolution {
        let t = i as f32 * step;
        if t >= t_end - step * 1e-3 {
            break;
        }
        out.push(evaluate(handles, t));
    }
    out.push(evaluate(handles, t_end));
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line() -> [Vec3; 4] {
        [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
        ]
    }

    #[test]
    fn test_endpoints() {
        let handles = [Vec3::ZERO, Vec3::new(1.0, 2.0, 0.0), Vec3::new(3.0, -1.0, 2.0)];
        assert_eq!(evaluate(&handles, 0.0), handles[0]);
        assert_relative_eq!(evaluate(&handles, 1.0).distance(handles[2]), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_quadratic_midpoint() {
        let handles = [Vec3::ZERO, Vec3::new(1.0, 2.0, 0.0), Vec3::new(2.0, 0.0, 0.0)];
        let mid = evaluate(&handles, 0.5);
        assert_relative_eq!(mid.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(mid.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_uniform_handles_are_linear() {
        let p = evaluate(&line(), 0.25);
        assert_relative_eq!(p.x, 0.75, epsilon = 1e-6);
    }

    #[test]
    fn test_sample_ends_exactly_at_progression() {
        let handles = line();
        let mut out = Vec::with_capacity(18);
        for &t_end in &[0.0f32, 0.05, 0.33, 0.5, 0.999, 1.0] {
            sample_into(&handles, 16, t_end, &mut out);
            let last = *out.last().unwrap();
            assert_relative_eq!(last.distance(evaluate(&handles, t_end)), 0.0, epsilon = 1e-6);
            assert!(out.len() <= 18);
        }
    }

    #[test]
    fn test_sample_counts() {
        let handles = line();
        let mut out = Vec::new();

        sample_into(&handles, 4, 1.0, &mut out);
        assert_eq!(out.len(), 5);

        sample_into(&handles, 4, 0.6, &mut out);
        // t = 0, 0.25, 0.5, then the exact tip
        assert_eq!(out.len(), 4);

        sample_into(&handles, 4, 0.0, &mut out);
        assert_eq!(out, vec![handles[0]]);
    }

    #[test]
    fn test_sampling_reuses_capacity() {
        let handles = line();
        let mut out = Vec::with_capacity(18);
        let ptr = out.as_ptr();
        for step in 0..=20 {
            sample_into(&handles, 16, step as f32 / 20.0, &mut out);
        }
        assert_eq!(out.as_ptr(), ptr);
    }
}
