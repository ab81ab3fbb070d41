use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identity of a connected owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub Uuid);

impl OwnerId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags::bitflags! {
    /// Observable stance of an owner as reported by the host.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StanceFlags: u16 {
        const INVISIBLE = 0x0001;
        const FLYING = 0x0002;
        const GLIDING = 0x0004;
        const SWIMMING = 0x0008;
        const SNEAKING = 0x0010;
        const SPRINTING = 0x0020;
        const IN_VEHICLE = 0x0040;
    }
}

/// Everything the companion system reads about an owner in one tick.
#[derive(Debug, Clone)]
pub struct OwnerSnapshot {
    pub id: OwnerId,
    pub name: String,
    pub world: String,
    pub eye_position: Vec3,
    pub look_direction: Vec3,
    /// Blocks per tick.
    pub velocity: Vec3,
    pub flags: StanceFlags,
    pub active_pet: Option<String>,
    /// Owner's level in the active pet.
    pub active_pet_level: u32,
}

impl OwnerSnapshot {
    pub fn new(id: OwnerId, name: impl Into<String>, world: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            world: world.into(),
            eye_position: Vec3::new(0.0, 1.62, 0.0),
            look_direction: Vec3::Z,
            velocity: Vec3::ZERO,
            flags: StanceFlags::empty(),
            active_pet: None,
            active_pet_level: 0,
        }
    }

    pub fn with_pet(mut self, pet_id: impl Into<String>, level: u32) -> Self {
        self.active_pet = Some(pet_id.into());
        self.active_pet_level = level;
        self
    }

    pub fn is_invisible(&self) -> bool {
        self.flags.contains(StanceFlags::INVISIBLE)
    }
}
