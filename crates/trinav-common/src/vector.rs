//! Vector utilities

use glam::Vec3;

/// Calculates the distance between two points
#[inline]
pub fn distance(a: &Vec3, b: &Vec3) -> f32 {
    (*b - *a).length()
}

/// Calculates the squared distance between two points
#[inline]
pub fn distance_squared(a: &Vec3, b: &Vec3) -> f32 {
    (*b - *a).length_squared()
}

/// Sum of the absolute per-axis differences between two points
#[inline]
pub fn manhattan_distance(a: &Vec3, b: &Vec3) -> f32 {
    let d = (*b - *a).abs();
    d.x + d.y + d.z
}

/// Largest absolute per-axis difference between two points
#[inline]
pub fn longest_axis_distance(a: &Vec3, b: &Vec3) -> f32 {
    (*b - *a).abs().max_element()
}

/// Builds a position from a flat `[x, y, z, ...]` buffer
#[inline]
pub fn vec3_at(buffer: &[f32], index: usize) -> Option<Vec3> {
    let base = index.checked_mul(3)?;
    let slice = buffer.get(base..base + 3)?;
    Some(Vec3::new(slice[0], slice[1], slice[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distances() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, -2.0, 3.0);

        assert_eq!(distance(&a, &b), 5.0);
        assert_eq!(distance_squared(&a, &b), 25.0);
        assert_eq!(manhattan_distance(&a, &b), 7.0);
        assert_eq!(longest_axis_distance(&a, &b), 4.0);
    }

    #[test]
    fn test_vec3_at() {
        let buffer = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(vec3_at(&buffer, 1), Some(Vec3::new(3.0, 4.0, 5.0)));
        assert_eq!(vec3_at(&buffer, 2), None);
    }
}
