//! The narrow surface the companion system needs from the host world.

use crate::world::owner::{OwnerId, OwnerSnapshot};
use glam::Vec3;
use std::fmt;
use thiserror::Error;

/// Handle to a drawable entity owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityHandle(pub u64);

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum WorldError {
    #[error("Unknown world: {0}")]
    UnknownWorld(String),

    #[error("Spawn rejected: {reason}")]
    SpawnRejected { reason: String },

    #[error("Entity not found: {0}")]
    UnknownEntity(EntityHandle),
}

/// Description of a companion display entity: an invisible, inert body with a
/// visible name tag and, optionally, a textured head.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySpec {
    pub world: String,
    pub position: Vec3,
    pub label: String,
    pub head_texture: Option<String>,
    pub visible_body: bool,
    pub small: bool,
    pub gravity: bool,
    pub collidable: bool,
    pub invulnerable: bool,
    pub persistent: bool,
}

impl DisplaySpec {
    pub fn companion(world: impl Into<String>, position: Vec3, label: impl Into<String>) -> Self {
        Self {
            world: world.into(),
            position,
            label: label.into(),
            head_texture: None,
            visible_body: false,
            small: true,
            gravity: false,
            collidable: false,
            invulnerable: true,
            persistent: false,
        }
    }

    pub fn with_head_texture(mut self, texture: impl Into<String>) -> Self {
        self.head_texture = Some(texture.into());
        self
    }
}

/// Host world operations. All calls happen on the tick thread.
pub trait HostWorld {
    /// Connected owners, in a stable order for the duration of a tick.
    fn online_owners(&self) -> Vec<OwnerId>;

    fn owner(&self, id: OwnerId) -> Option<OwnerSnapshot>;

    fn find_owner(&self, name: &str) -> Option<OwnerId>;

    fn spawn_display(&mut self, spec: DisplaySpec) -> Result<EntityHandle, WorldError>;

    /// Remove an entity. Unknown handles are ignored.
    fn despawn(&mut self, entity: EntityHandle);

    fn is_alive(&self, entity: EntityHandle) -> bool;

    fn move_entity(&mut self, entity: EntityHandle, world: &str, position: Vec3);

    fn set_rotation(&mut self, entity: EntityHandle, yaw: f32, pitch: f32);

    fn set_label(&mut self, entity: EntityHandle, label: &str);
}
