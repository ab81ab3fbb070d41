//! Per-tick lifecycle of companion entities.
//!
//! Every connected owner is in one of two states: no companion, or exactly one
//! tracked companion whose pet matches the owner's active pet. Each tick moves
//! owners between those states and, for present companions, updates pose,
//! label and orientation or animation.

use crate::config::{DisplaySettings, PetDefinition, Registry, SkinDefinition, TextureSelector};
use crate::pets::backend::{BackendRegistry, CompanionBackend, RefreshRequest};
use crate::pets::selection::SkinSelections;
use crate::utils::math::{bob_offset, companion_position, spin_yaw, yaw_degrees};
use crate::world::{DisplaySpec, EntityHandle, HostWorld, OwnerEvent, OwnerId, OwnerSnapshot};
use glam::Vec3;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Read-only state a tick needs besides the world.
pub struct DisplayContext<'a> {
    pub settings: &'a DisplaySettings,
    pub pets: &'a Registry<PetDefinition>,
    pub skins: &'a Registry<SkinDefinition>,
    pub selections: &'a SkinSelections,
    pub backends: &'a BackendRegistry,
}

struct TrackedCompanion {
    entity: EntityHandle,
    pet: Arc<PetDefinition>,
    backend: Box<dyn CompanionBackend>,
}

#[derive(Default)]
pub struct CompanionDisplay {
    tracked: HashMap<OwnerId, TrackedCompanion>,
    tick: u64,
}

impl CompanionDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting from `tick`. Mostly useful for exercising wraparound.
    pub fn with_tick(tick: u64) -> Self {
        Self {
            tracked: HashMap::new(),
            tick,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_tracked(&self, owner: OwnerId) -> bool {
        self.tracked.contains_key(&owner)
    }

    pub fn entity_of(&self, owner: OwnerId) -> Option<EntityHandle> {
        self.tracked.get(&owner).map(|t| t.entity)
    }

    pub fn tracked_pet(&self, owner: OwnerId) -> Option<&str> {
        self.tracked.get(&owner).map(|t| t.pet.id.as_str())
    }

    pub fn backend_kind(&self, owner: OwnerId) -> Option<&'static str> {
        self.tracked.get(&owner).map(|t| t.backend.kind())
    }

    /// Advance every owner by one tick, then bump the tick counter.
    pub fn tick_all(&mut self, world: &mut dyn HostWorld, ctx: &DisplayContext<'_>) {
        let online = world.online_owners();

        let departed: Vec<OwnerId> = self
            .tracked
            .keys()
            .filter(|id| !online.contains(*id))
            .copied()
            .collect();
        for owner in departed {
            self.remove(world, owner);
        }

        for owner in online {
            self.update_owner(world, ctx, owner);
        }

        self.tick = self.tick.wrapping_add(1);
    }

    /// Tear down and immediately re-evaluate one owner.
    pub fn refresh(&mut self, world: &mut dyn HostWorld, ctx: &DisplayContext<'_>, owner: OwnerId) {
        self.remove(world, owner);
        self.update_owner(world, ctx, owner);
    }

    pub fn refresh_all(&mut self, world: &mut dyn HostWorld, ctx: &DisplayContext<'_>) {
        for owner in world.online_owners() {
            self.refresh(world, ctx, owner);
        }
    }

    /// Disconnects, teleports and world changes all tear the companion down;
    /// the next tick recreates it where appropriate.
    pub fn handle_event(&mut self, world: &mut dyn HostWorld, event: &OwnerEvent) {
        if self.remove(world, event.owner) {
            debug!("Removed companion of {} on {}", event.owner, event.label());
        }
    }

    /// Despawn the owner's companion. Returns whether one was tracked.
    pub fn remove(&mut self, world: &mut dyn HostWorld, owner: OwnerId) -> bool {
        match self.tracked.remove(&owner) {
            Some(companion) => {
                world.despawn(companion.entity);
                true
            }
            None => false,
        }
    }

    pub fn shutdown(&mut self, world: &mut dyn HostWorld) {
        let count = self.tracked.len();
        for (_, companion) in self.tracked.drain() {
            world.despawn(companion.entity);
        }
        info!("Companion display shut down, removed {} companions", count);
    }

    fn update_owner(&mut self, world: &mut dyn HostWorld, ctx: &DisplayContext<'_>, id: OwnerId) {
        let Some(owner) = world.owner(id) else {
            self.remove(world, id);
            return;
        };
        if owner.is_invisible() {
            self.remove(world, id);
            return;
        }
        let Some(pet) = owner.active_pet.as_deref().and_then(|pet_id| ctx.pets.get(pet_id)) else {
            self.remove(world, id);
            return;
        };

        if let Some(companion) = self.tracked.get(&id) {
            if companion.pet.id != pet.id {
                debug!("{} switched pet {} -> {}", owner.name, companion.pet.id, pet.id);
                self.remove(world, id);
            } else if !world.is_alive(companion.entity) {
                debug!("Companion {} of {} is gone, recreating", companion.entity, owner.name);
                self.remove(world, id);
            }
        }

        let skin = ctx.selections.active_skin(id, ctx.skins);
        let position = self.position_for(&owner, ctx.settings);
        let label = ctx
            .settings
            .format_label(&owner.name, &pet.name, owner.active_pet_level);

        if !self.tracked.contains_key(&id) {
            let selector = TextureSelector::for_pet(&pet, skin.as_deref());
            let mut backend = ctx.backends.create(id, &pet, &selector);
            let spec = DisplaySpec::companion(owner.world.clone(), position, label.clone());
            match backend.spawn(world, spec) {
                Ok(entity) => {
                    debug!("Spawned {} companion {} for {}", backend.kind(), entity, owner.name);
                    self.tracked.insert(id, TrackedCompanion { entity, pet, backend });
                }
                Err(e) => {
                    warn!("Failed to spawn companion for {}: {}", owner.name, e);
                    return;
                }
            }
        }

        let tick = self.tick;
        let Some(companion) = self.tracked.get_mut(&id) else {
            return;
        };
        world.move_entity(companion.entity, &owner.world, position);
        world.set_label(companion.entity, &label);

        if companion.backend.is_model_driven() {
            world.set_rotation(companion.entity, yaw_degrees(owner.look_direction), 0.0);
            companion.backend.refresh(&RefreshRequest {
                owner: &owner,
                skin: skin.as_deref(),
                thresholds: &ctx.settings.movement,
                tick,
                force: false,
            });
        } else {
            let yaw = if ctx.settings.spin.enabled {
                spin_yaw(tick, ctx.settings.spin.speed)
            } else {
                yaw_degrees(owner.look_direction)
            };
            world.set_rotation(companion.entity, yaw, 0.0);
        }
    }

    fn position_for(&self, owner: &OwnerSnapshot, settings: &DisplaySettings) -> Vec3 {
        let base = companion_position(
            owner.eye_position,
            owner.look_direction,
            settings.pose.floor,
            settings.pose.rotation_radians,
        );
        base + Vec3::Y * bob_offset(self.tick, settings.bob.speed, settings.bob.amplitude)
    }
}
