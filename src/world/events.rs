use crate::world::owner::OwnerId;
use glam::Vec3;
use std::time::SystemTime;

/// Host notifications that invalidate an owner's companion.
///
/// Each of these forces immediate teardown; the next tick rebuilds the
/// companion at the owner's new location if they still qualify.
#[derive(Debug, Clone, PartialEq)]
pub enum OwnerEventKind {
    /// The owner left the world.
    Disconnect,
    /// The owner was moved discontinuously within or across worlds.
    Teleport { from: Vec3, to: Vec3 },
    /// The owner is now in a different world.
    WorldChange { from: String, to: String },
}

#[derive(Debug, Clone)]
pub struct OwnerEvent {
    pub owner: OwnerId,
    pub kind: OwnerEventKind,
    pub timestamp: SystemTime,
}

impl OwnerEvent {
    pub fn new(owner: OwnerId, kind: OwnerEventKind) -> Self {
        Self {
            owner,
            kind,
            timestamp: SystemTime::now(),
        }
    }

    pub fn disconnect(owner: OwnerId) -> Self {
        Self::new(owner, OwnerEventKind::Disconnect)
    }

    pub fn teleport(owner: OwnerId, from: Vec3, to: Vec3) -> Self {
        Self::new(owner, OwnerEventKind::Teleport { from, to })
    }

    pub fn world_change(owner: OwnerId, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(
            owner,
            OwnerEventKind::WorldChange {
                from: from.into(),
                to: to.into(),
            },
        )
    }

    pub fn label(&self) -> &'static str {
        match self.kind {
            OwnerEventKind::Disconnect => "disconnect",
            OwnerEventKind::Teleport { .. } => "teleport",
            OwnerEventKind::WorldChange { .. } => "world change",
        }
    }
}
