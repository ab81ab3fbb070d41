//! Pose helpers for placing a companion next to its owner.

use glam::{Quat, Vec3};
use std::f64::consts::TAU;

/// Offset from the owner's eye to the companion, before the angular shift.
///
/// The look direction is inverted and the vertical component made non-negative.
/// Horizontal components whose magnitude is below `floor` are replaced by
/// `floor`, which keeps the companion from sitting inside the owner when they
/// look straight along an axis.
pub fn companion_offset(look_direction: Vec3, floor: f32) -> Vec3 {
    let mut offset = -look_direction.normalize_or_zero();
    offset.y = offset.y.abs();
    if offset.x.abs() < floor {
        offset.x = floor;
    }
    if offset.z.abs() < floor {
        offset.z = floor;
    }
    offset
}

/// Rotate `v` by `radians` around the vertical axis.
pub fn rotate_around_y(v: Vec3, radians: f32) -> Vec3 {
    Quat::from_rotation_y(radians) * v
}

/// World position of the companion for an owner at `eye` looking along `look_direction`.
pub fn companion_position(eye: Vec3, look_direction: Vec3, floor: f32, rotation_radians: f32) -> Vec3 {
    eye + rotate_around_y(companion_offset(look_direction, floor), rotation_radians)
}

/// Vertical bob for the given tick. Bounded by `amplitude` for every tick value.
pub fn bob_offset(tick: u64, speed: f64, amplitude: f64) -> f32 {
    ((tick as f64 / TAU * speed).sin() * amplitude) as f32
}

/// Continuous spin yaw in degrees, wrapped to `[0, 360)`.
pub fn spin_yaw(tick: u64, speed: f64) -> f32 {
    let yaw = (speed * tick as f64 / TAU).rem_euclid(360.0) as f32;
    if yaw >= 360.0 {
        0.0
    } else {
        yaw
    }
}

/// Yaw in degrees of a look direction (0 along +Z, clockwise seen from above).
pub fn yaw_degrees(look_direction: Vec3) -> f32 {
    if look_direction.x == 0.0 && look_direction.z == 0.0 {
        return 0.0;
    }
    (-look_direction.x).atan2(look_direction.z).to_degrees()
}

/// Length of the horizontal (x/z) part of a vector.
pub fn horizontal_length(v: Vec3) -> f32 {
    (v.x * v.x + v.z * v.z).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_6;

    #[test]
    fn test_offset_floors_horizontal_axes() {
        let directions = [
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.3, -0.9, 0.1),
            Vec3::ZERO,
        ];
        for dir in directions {
            let offset = companion_offset(dir, 0.5);
            assert!(offset.x.abs() >= 0.5, "x too small for {:?}: {:?}", dir, offset);
            assert!(offset.z.abs() >= 0.5, "z too small for {:?}: {:?}", dir, offset);
            assert!(offset.y >= 0.0);
        }
    }

    #[test]
    fn test_offset_inverts_look_direction() {
        let offset = companion_offset(Vec3::new(-1.0, 0.0, 0.0), 0.5);
        assert!((offset.x - 1.0).abs() < 1e-6);
        assert_eq!(offset.z, 0.5);
    }

    #[test]
    fn test_rotation_matches_right_handed_yaw() {
        let rotated = rotate_around_y(Vec3::new(1.0, 0.0, 0.0), FRAC_PI_6);
        assert!((rotated.x - FRAC_PI_6.cos()).abs() < 1e-5);
        assert!((rotated.z + FRAC_PI_6.sin()).abs() < 1e-5);
    }

    #[test]
    fn test_bob_is_bounded_under_wraparound() {
        for tick in [0, 1, 17, 1_000_000, u64::MAX - 1, u64::MAX] {
            assert!(bob_offset(tick, 0.5, 0.15).abs() <= 0.15 + f32::EPSILON);
        }
    }

    #[test]
    fn test_spin_yaw_wraps() {
        for tick in [0, 10, 100_000, u64::MAX] {
            let yaw = spin_yaw(tick, 20.0);
            assert!((0.0..360.0).contains(&yaw));
        }
    }
}
