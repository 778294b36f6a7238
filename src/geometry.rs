use crate::world::Wall;

/// Below this the ray and segment are treated as parallel. Rays exactly
/// aligned with a wall therefore pass through it.
pub const PARALLEL_EPSILON: f32 = 1e-6;

/// Bias added to the edge height in the crossing test so horizontal edges never
/// divide by zero.
const CROSSING_BIAS: f32 = 1e-6;

#[inline]
fn cross(a: [f32; 2], b: [f32; 2]) -> f32 {
    a[0] * b[1] - a[1] * b[0]
}

/// Ray parameter `t` of the hit between the ray `origin + t * dir` and the
/// segment `a`-`b`.
///
/// Only hits strictly ahead of the origin (`t > 0`) and within the segment,
/// endpoints included, are reported. `t` is measured in multiples of `dir`,
/// so it is a distance only when `dir` is unit length.
pub fn intersect_ray_segment(
    origin: [f32; 2],
    dir: [f32; 2],
    a: [f32; 2],
    b: [f32; 2],
) -> Option<f32> {
    let seg = [b[0] - a[0], b[1] - a[1]];
    let denom = cross(dir, seg);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }

    let d = [a[0] - origin[0], a[1] - origin[1]];
    let t = cross(d, seg) / denom;
    let u = cross(d, dir) / denom;

    if t > 0.0 && (0.0..=1.0).contains(&u) {
        Some(t)
    } else {
        None
    }
}

/// Euclidean distance from `p` to the closest point of segment `a`-`b`.
pub fn point_to_segment_distance(p: [f32; 2], a: [f32; 2], b: [f32; 2]) -> f32 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let len2 = dx * dx + dy * dy;

    if len2 == 0.0 {
        return (p[0] - a[0]).hypot(p[1] - a[1]);
    }

    let t = (((p[0] - a[0]) * dx + (p[1] - a[1]) * dy) / len2).clamp(0.0, 1.0);
    let closest = [a[0] + t * dx, a[1] + t * dy];
    (p[0] - closest[0]).hypot(p[1] - closest[1])
}

/// Even-odd containment over a sector's walls, one edge per wall.
///
/// Walls that do not form a closed loop give meaningless answers. Points on an
/// edge land wherever the crossing rule puts them.
pub fn point_in_polygon(p: [f32; 2], walls: &[Wall]) -> bool {
    let [x, y] = p;
    let mut inside = false;
    for wall in walls {
        let [x1, y1] = wall.start;
        let [x2, y2] = wall.end;
        if (y1 > y) != (y2 > y) && x < (x2 - x1) * (y - y1) / (y2 - y1 + CROSSING_BIAS) + x1 {
            inside = !inside;
        }
    }
    inside
}
