//! Centripetal Catmull-Rom curves
//!
//! Evaluated with the Barry-Goldman pyramid so that unevenly spaced control
//! points do not produce cusps or self-intersections.

use glam::Vec3;

const ALPHA: f32 = 0.5;
const MIN_KNOT_SPAN: f32 = 1e-4;

fn segment(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, u: f32) -> Vec3 {
    let knot = |a: Vec3, b: Vec3| a.distance(b).powf(ALPHA).max(MIN_KNOT_SPAN);

    let t0 = 0.0;
    let t1 = t0 + knot(p0, p1);
    let t2 = t1 + knot(p1, p2);
    let t3 = t2 + knot(p2, p3);
    let t = t1 + (t2 - t1) * u;

    let a1 = p0 * ((t1 - t) / (t1 - t0)) + p1 * ((t - t0) / (t1 - t0));
    let a2 = p1 * ((t2 - t) / (t2 - t1)) + p2 * ((t - t1) / (t2 - t1));
    let a3 = p2 * ((t3 - t) / (t3 - t2)) + p3 * ((t - t2) / (t3 - t2));
    let b1 = a1 * ((t2 - t) / (t2 - t0)) + a2 * ((t - t0) / (t2 - t0));
    let b2 = a2 * ((t3 - t) / (t3 - t1)) + a3 * ((t - t1) / (t3 - t1));
    b1 * ((t2 - t) / (t2 - t1)) + b2 * ((t - t1) / (t2 - t1))
}

/// Sample a closed loop through `points` at `samples` evenly spaced parameters
///
/// The first sample equals the first control point; the loop wraps back to
/// it without repeating it.
pub fn sample_closed(points: &[Vec3], samples: usize) -> Vec<Vec3> {
    let n = points.len();
    if n < 3 || samples == 0 {
        return points.to_vec();
    }

    (0..samples)
        .map(|k| {
            let u = k as f32 / samples as f32 * n as f32;
            let seg = (u.floor() as usize).min(n - 1);
            let local = u - seg as f32;
            segment(
                points[(seg + n - 1) % n],
                points[seg],
                points[(seg + 1) % n],
                points[(seg + 2) % n],
                local,
            )
        })
        .collect()
}

/// Sample an open curve through `points`, including both endpoints
///
/// Missing outer control points are mirrored from the ends.
pub fn sample_open(points: &[Vec3], samples: usize) -> Vec<Vec3> {
    let n = points.len();
    if n < 2 || samples < 2 {
        return points.to_vec();
    }

    let first_ghost = points[0] * 2.0 - points[1];
    let last_ghost = points[n - 1] * 2.0 - points[n - 2];
    let at = |i: isize| -> Vec3 {
        if i < 0 {
            first_ghost
        } else if i as usize >= n {
            last_ghost
        } else {
            points[i as usize]
        }
    };

    (0..samples)
        .map(|k| {
            let u = k as f32 / (samples - 1) as f32 * (n - 1) as f32;
            let seg = (u.floor() as usize).min(n - 2);
            let local = u - seg as f32;
            let s = seg as isize;
            segment(at(s - 1), at(s), at(s + 1), at(s + 2), local)
        })
        .collect()
}
