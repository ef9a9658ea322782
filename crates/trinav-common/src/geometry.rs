//! 2D geometry operations on the XZ plane (Y-up coordinate system)
//!
//! Cells, corridors and the spatial index only reason about the footprint of
//! a triangle. Height is resolved separately from the cell plane.

use glam::Vec3;

/// Calculate twice the signed area of a 2D triangle on the XZ plane.
///
/// The sign indicates the winding order:
/// - Positive: clockwise (when looking down Y axis)
/// - Negative: counter-clockwise (when looking down Y axis)
/// - Zero: degenerate (collinear points)
#[inline]
pub fn tri_area_2d(a: &Vec3, b: &Vec3, c: &Vec3) -> f32 {
    let abx = b.x - a.x;
    let abz = b.z - a.z;
    let acx = c.x - a.x;
    let acz = c.z - a.z;
    acx * abz - abx * acz
}

/// Check if three points are collinear (on XZ plane).
#[inline]
pub fn collinear_2d(a: &Vec3, b: &Vec3, c: &Vec3, eps: f32) -> bool {
    tri_area_2d(a, b, c).abs() <= eps
}

/// Calculate squared distance between two points on the XZ plane.
#[inline]
pub fn dist_sqr_2d(a: &Vec3, b: &Vec3) -> f32 {
    let dx = b.x - a.x;
    let dz = b.z - a.z;
    dx * dx + dz * dz
}

/// Calculate distance between two points on the XZ plane.
#[inline]
pub fn dist_2d(a: &Vec3, b: &Vec3) -> f32 {
    dist_sqr_2d(a, b).sqrt()
}

/// Checks whether two points coincide on the XZ plane within `eps`.
#[inline]
pub fn equal_2d(a: &Vec3, b: &Vec3, eps: f32) -> bool {
    (a.x - b.x).abs() <= eps && (a.z - b.z).abs() <= eps
}

/// Calculate the squared distance from a point to a line segment on the XZ plane.
pub fn dist_point_segment_sqr_2d(p: &Vec3, a: &Vec3, b: &Vec3) -> f32 {
    let q = closest_point_on_segment_2d(p, a, b);
    dist_sqr_2d(p, &q)
}

/// Find the closest point on a line segment to a given point (on XZ plane).
///
/// The returned point is interpolated along the segment in all three axes.
pub fn closest_point_on_segment_2d(p: &Vec3, a: &Vec3, b: &Vec3) -> Vec3 {
    let dx = b.x - a.x;
    let dz = b.z - a.z;
    let d = dx * dx + dz * dz;
    if d < f32::EPSILON {
        // Segment is a point
        return *a;
    }

    let t = ((p.x - a.x) * dx + (p.z - a.z) * dz) / d;
    a.lerp(*b, t.clamp(0.0, 1.0))
}

/// 2D perpendicular product (cross product magnitude on XZ plane).
#[inline]
pub fn perp_2d(x1: f32, z1: f32, x2: f32, z2: f32) -> f32 {
    x1 * z2 - z1 * x2
}

/// Intersects segment `a1 -> a2` with segment `b1 -> b2` on the XZ plane.
///
/// Returns the normalized positions `(s, t)` of the intersection along each
/// segment, or `None` when the segments are parallel or do not meet. Touching
/// at an endpoint counts as an intersection.
pub fn intersect_segments_2d(a1: &Vec3, a2: &Vec3, b1: &Vec3, b2: &Vec3) -> Option<(f32, f32)> {
    const EPS: f32 = 1e-6;

    let ux = a2.x - a1.x;
    let uz = a2.z - a1.z;
    let vx = b2.x - b1.x;
    let vz = b2.z - b1.z;
    let wx = a1.x - b1.x;
    let wz = a1.z - b1.z;

    let d = perp_2d(ux, uz, vx, vz);
    if d.abs() < EPS {
        return None;
    }

    let s = perp_2d(vx, vz, wx, wz) / d;
    let t = perp_2d(ux, uz, wx, wz) / d;
    if !(-EPS..=1.0 + EPS).contains(&s) || !(-EPS..=1.0 + EPS).contains(&t) {
        return None;
    }

    Some((s.clamp(0.0, 1.0), t.clamp(0.0, 1.0)))
}

/// Checks if a point lies inside or on the border of a triangle's footprint.
///
/// Winding independent.
pub fn point_in_triangle_2d(p: &Vec3, a: &Vec3, b: &Vec3, c: &Vec3) -> bool {
    let d1 = tri_area_2d(a, b, p);
    let d2 = tri_area_2d(b, c, p);
    let d3 = tri_area_2d(c, a, p);

    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}
