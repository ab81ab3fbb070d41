use crate::config::MovementThresholds;
use crate::utils::math::horizontal_length;
use crate::world::{OwnerSnapshot, StanceFlags};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse motion/stance state of an owner.
///
/// Variants are declared in priority order: when several apply, the first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementCategory {
    Flying,
    Swimming,
    Sneaking,
    Sprinting,
    Riding,
    Walking,
    Idle,
}

impl MovementCategory {
    pub const ALL: [MovementCategory; 7] = [
        MovementCategory::Flying,
        MovementCategory::Swimming,
        MovementCategory::Sneaking,
        MovementCategory::Sprinting,
        MovementCategory::Riding,
        MovementCategory::Walking,
        MovementCategory::Idle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementCategory::Flying => "flying",
            MovementCategory::Swimming => "swimming",
            MovementCategory::Sneaking => "sneaking",
            MovementCategory::Sprinting => "sprinting",
            MovementCategory::Riding => "riding",
            MovementCategory::Walking => "walking",
            MovementCategory::Idle => "idle",
        }
    }
}

impl fmt::Display for MovementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an owner's current movement.
pub fn classify(owner: &OwnerSnapshot, thresholds: &MovementThresholds) -> MovementCategory {
    let flags = owner.flags;
    if flags.intersects(StanceFlags::FLYING | StanceFlags::GLIDING) {
        MovementCategory::Flying
    } else if flags.contains(StanceFlags::SWIMMING) {
        MovementCategory::Swimming
    } else if flags.contains(StanceFlags::SNEAKING) {
        MovementCategory::Sneaking
    } else if flags.contains(StanceFlags::SPRINTING) {
        MovementCategory::Sprinting
    } else if flags.contains(StanceFlags::IN_VEHICLE) {
        MovementCategory::Riding
    } else if is_moving(owner, thresholds) {
        MovementCategory::Walking
    } else {
        MovementCategory::Idle
    }
}

fn is_moving(owner: &OwnerSnapshot, thresholds: &MovementThresholds) -> bool {
    if horizontal_length(owner.velocity) > thresholds.walk_speed_epsilon {
        return true;
    }
    thresholds
        .facing_threshold
        .map_or(false, |limit| horizontal_length(owner.look_direction) > limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::OwnerId;
    use glam::Vec3;

    fn owner(flags: StanceFlags, velocity: Vec3) -> OwnerSnapshot {
        let mut snapshot = OwnerSnapshot::new(OwnerId::new_v4(), "tester", "overworld");
        snapshot.flags = flags;
        snapshot.velocity = velocity;
        snapshot
    }

    #[test]
    fn test_priority_order() {
        let thresholds = MovementThresholds::default();
        let cases = [
            (StanceFlags::all(), MovementCategory::Flying),
            (StanceFlags::GLIDING | StanceFlags::SWIMMING, MovementCategory::Flying),
            (StanceFlags::SWIMMING | StanceFlags::SNEAKING, MovementCategory::Swimming),
            (StanceFlags::SNEAKING | StanceFlags::SPRINTING, MovementCategory::Sneaking),
            (StanceFlags::SPRINTING | StanceFlags::IN_VEHICLE, MovementCategory::Sprinting),
            (StanceFlags::IN_VEHICLE, MovementCategory::Riding),
        ];
        for (flags, expected) in cases {
            assert_eq!(classify(&owner(flags, Vec3::new(1.0, 0.0, 0.0)), &thresholds), expected);
        }
    }

    #[test]
    fn test_walking_from_horizontal_velocity() {
        let thresholds = MovementThresholds::default();
        assert_eq!(
            classify(&owner(StanceFlags::empty(), Vec3::new(0.1, 0.0, 0.0)), &thresholds),
            MovementCategory::Walking
        );
        // Falling straight down is not walking.
        assert_eq!(
            classify(&owner(StanceFlags::empty(), Vec3::new(0.0, -0.5, 0.0)), &thresholds),
            MovementCategory::Idle
        );
        assert_eq!(
            classify(&owner(StanceFlags::empty(), Vec3::ZERO), &thresholds),
            MovementCategory::Idle
        );
    }

    #[test]
    fn test_facing_threshold_is_optional() {
        let mut stationary = owner(StanceFlags::empty(), Vec3::ZERO);
        stationary.look_direction = Vec3::new(0.0, 0.0, 1.0);

        let default = MovementThresholds::default();
        assert_eq!(classify(&stationary, &default), MovementCategory::Idle);

        let tuned = MovementThresholds {
            facing_threshold: Some(0.5),
            ..MovementThresholds::default()
        };
        assert_eq!(classify(&stationary, &tuned), MovementCategory::Walking);
    }
}
