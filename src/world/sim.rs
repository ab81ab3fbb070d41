//! In-memory host used by the headless binary and the test suite.

use crate::world::events::OwnerEvent;
use crate::world::host::{DisplaySpec, EntityHandle, HostWorld, WorldError};
use crate::world::owner::{OwnerId, OwnerSnapshot};
use glam::Vec3;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct SimEntity {
    pub spec: DisplaySpec,
    pub world: String,
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub label: String,
    pub alive: bool,
}

#[derive(Debug, Default)]
pub struct SimulatedWorld {
    owners: BTreeMap<OwnerId, OwnerSnapshot>,
    entities: HashMap<EntityHandle, SimEntity>,
    next_entity: u64,
    reject_spawns: bool,
    spawned_total: u64,
}

impl SimulatedWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, owner: OwnerSnapshot) -> OwnerId {
        let id = owner.id;
        self.owners.insert(id, owner);
        id
    }

    /// Remove an owner and return the event the host would deliver.
    pub fn disconnect(&mut self, id: OwnerId) -> OwnerEvent {
        self.owners.remove(&id);
        OwnerEvent::disconnect(id)
    }

    pub fn teleport(&mut self, id: OwnerId, to: Vec3) -> Option<OwnerEvent> {
        let owner = self.owners.get_mut(&id)?;
        let from = owner.eye_position;
        owner.eye_position = to;
        Some(OwnerEvent::teleport(id, from, to))
    }

    pub fn change_world(&mut self, id: OwnerId, to: &str) -> Option<OwnerEvent> {
        let owner = self.owners.get_mut(&id)?;
        let from = std::mem::replace(&mut owner.world, to.to_string());
        Some(OwnerEvent::world_change(id, from, to))
    }

    pub fn owner_mut(&mut self, id: OwnerId) -> Option<&mut OwnerSnapshot> {
        self.owners.get_mut(&id)
    }

    pub fn entity(&self, handle: EntityHandle) -> Option<&SimEntity> {
        self.entities.get(&handle)
    }

    /// Entities currently alive in the world.
    pub fn live_entities(&self) -> impl Iterator<Item = (&EntityHandle, &SimEntity)> + '_ {
        self.entities.iter().filter(|(_, e)| e.alive)
    }

    pub fn live_entity_count(&self) -> usize {
        self.live_entities().count()
    }

    pub fn spawned_total(&self) -> u64 {
        self.spawned_total
    }

    /// Mark an entity dead without removing it, as a host would after external damage.
    pub fn kill(&mut self, handle: EntityHandle) {
        if let Some(entity) = self.entities.get_mut(&handle) {
            entity.alive = false;
        }
    }

    pub fn set_reject_spawns(&mut self, reject: bool) {
        self.reject_spawns = reject;
    }
}

impl HostWorld for SimulatedWorld {
    fn online_owners(&self) -> Vec<OwnerId> {
        self.owners.keys().copied().collect()
    }

    fn owner(&self, id: OwnerId) -> Option<OwnerSnapshot> {
        self.owners.get(&id).cloned()
    }

    fn find_owner(&self, name: &str) -> Option<OwnerId> {
        self.owners
            .values()
            .find(|o| o.name.eq_ignore_ascii_case(name))
            .map(|o| o.id)
    }

    fn spawn_display(&mut self, spec: DisplaySpec) -> Result<EntityHandle, WorldError> {
        if self.reject_spawns {
            return Err(WorldError::SpawnRejected {
                reason: "spawning disabled".to_string(),
            });
        }
        self.next_entity += 1;
        self.spawned_total += 1;
        let handle = EntityHandle(self.next_entity);
        debug!("Spawned {} at {:?} in {}", handle, spec.position, spec.world);
        self.entities.insert(
            handle,
            SimEntity {
                world: spec.world.clone(),
                position: spec.position,
                yaw: 0.0,
                pitch: 0.0,
                label: spec.label.clone(),
                alive: true,
                spec,
            },
        );
        Ok(handle)
    }

    fn despawn(&mut self, entity: EntityHandle) {
        self.entities.remove(&entity);
    }

    fn is_alive(&self, entity: EntityHandle) -> bool {
        self.entities.get(&entity).map_or(false, |e| e.alive)
    }

    fn move_entity(&mut self, entity: EntityHandle, world: &str, position: Vec3) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.world = world.to_string();
            e.position = position;
        }
    }

    fn set_rotation(&mut self, entity: EntityHandle, yaw: f32, pitch: f32) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.yaw = yaw;
            e.pitch = pitch;
        }
    }

    fn set_label(&mut self, entity: EntityHandle, label: &str) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.label = label.to_string();
        }
    }
}
