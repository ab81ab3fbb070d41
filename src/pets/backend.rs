//! Visual bodies for companions.
//!
//! A backend spawns the drawable entity and, when it is model-driven, keeps
//! that entity's animation in step with the owner. Backends are chosen by the
//! tag of the pet's texture selector through a [`BackendRegistry`]; bare
//! literals and unknown tags get a [`SkullBackend`].

use crate::config::{
    AnimationSettings, MovementThresholds, PetDefinition, SkinDefinition, TextureSelector,
    MODEL_BACKEND_TAG,
};
use crate::pets::animation::resolve_animation;
use crate::pets::dispatch::{contain_panic, AnimationDispatcher, PlaybackParams};
use crate::pets::engine::{EngineError, ModelEngine, ModelHandle};
use crate::pets::movement::classify;
use crate::world::{DisplaySpec, EntityHandle, HostWorld, OwnerId, OwnerSnapshot, WorldError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Inputs for one animation refresh.
pub struct RefreshRequest<'a> {
    pub owner: &'a OwnerSnapshot,
    pub skin: Option<&'a SkinDefinition>,
    pub thresholds: &'a MovementThresholds,
    pub tick: u64,
    /// Re-send the animation even if it has not changed.
    pub force: bool,
}

pub trait CompanionBackend {
    /// Backend name for logs.
    fn kind(&self) -> &'static str;

    /// Spawn the drawable described by `spec` (already positioned and labelled).
    fn spawn(&mut self, world: &mut dyn HostWorld, spec: DisplaySpec) -> Result<EntityHandle, WorldError>;

    /// Whether orientation is driven by an animated model rather than by yaw.
    fn is_model_driven(&self) -> bool {
        false
    }

    fn refresh(&mut self, _request: &RefreshRequest<'_>) {}
}

/// Static head-textured display.
pub struct SkullBackend {
    texture: String,
}

impl SkullBackend {
    pub fn new(texture: impl Into<String>) -> Self {
        Self {
            texture: texture.into(),
        }
    }
}

impl CompanionBackend for SkullBackend {
    fn kind(&self) -> &'static str {
        "skull"
    }

    fn spawn(&mut self, world: &mut dyn HostWorld, spec: DisplaySpec) -> Result<EntityHandle, WorldError> {
        world.spawn_display(spec.with_head_texture(self.texture.clone()))
    }
}

/// Display whose body is a model from the external animation engine.
pub struct ModelBackend {
    engine: Arc<dyn ModelEngine>,
    model_id: String,
    dispatcher: AnimationDispatcher,
    retrigger_interval: u64,
    model: Option<ModelHandle>,
    last_played: Option<String>,
    last_failed: Option<String>,
    force_refresh: bool,
    last_sent_tick: Option<u64>,
}

impl ModelBackend {
    pub fn new(engine: Arc<dyn ModelEngine>, model_id: impl Into<String>, settings: &AnimationSettings) -> Self {
        Self {
            engine,
            model_id: model_id.into(),
            dispatcher: AnimationDispatcher::new(PlaybackParams::from(settings)),
            retrigger_interval: settings.retrigger_interval_ticks,
            model: None,
            last_played: None,
            last_failed: None,
            force_refresh: false,
            last_sent_tick: None,
        }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn last_played(&self) -> Option<&str> {
        self.last_played.as_deref()
    }

    fn attach_model(&mut self, entity: EntityHandle) -> Result<(), EngineError> {
        let engine = Arc::clone(&self.engine);
        let model_id = self.model_id.clone();
        let model = contain_panic(|| engine.create_model(&model_id))
            .map_err(EngineError::Unavailable)??;
        contain_panic(|| engine.bind_model(entity, &model)).map_err(EngineError::Unavailable)??;
        self.model = Some(model);
        self.force_refresh = true;
        Ok(())
    }

    fn retrigger_due(&self, tick: u64) -> bool {
        if self.retrigger_interval == 0 {
            return false;
        }
        self.last_sent_tick
            .map_or(false, |sent| tick.wrapping_sub(sent) >= self.retrigger_interval)
    }
}

impl CompanionBackend for ModelBackend {
    fn kind(&self) -> &'static str {
        "model"
    }

    fn spawn(&mut self, world: &mut dyn HostWorld, spec: DisplaySpec) -> Result<EntityHandle, WorldError> {
        let entity = world.spawn_display(spec)?;
        match self.attach_model(entity) {
            Ok(()) => info!("Attached model '{}' to {}", self.model_id, entity),
            Err(e) => warn!(
                "Companion {} has no model, continuing without one: {}",
                entity, e
            ),
        }
        Ok(entity)
    }

    fn is_model_driven(&self) -> bool {
        self.model.is_some()
    }

    fn refresh(&mut self, request: &RefreshRequest<'_>) {
        let Some(model) = self.model.clone() else {
            return;
        };

        let category = classify(request.owner, request.thresholds);
        let resolved = resolve_animation(request.skin, category);
        if !resolved.should_dispatch() {
            return;
        }
        let animation = resolved.animation_id();

        let force = request.force || self.force_refresh || self.retrigger_due(request.tick);
        if !force && self.last_played.as_deref() == Some(animation) {
            return;
        }

        match self.dispatcher.play(&model, animation) {
            Ok(success) => {
                debug!(
                    "Owner {} is {}: played '{}' via {} ({})",
                    request.owner.name, category, animation, success.strategy, success.operation
                );
                self.last_played = Some(animation.to_string());
                self.last_failed = None;
                self.force_refresh = false;
                self.last_sent_tick = Some(request.tick);
            }
            Err(e) => {
                if self.last_failed.as_deref() != Some(animation) {
                    warn!("Animation for model '{}' not played: {}", self.model_id, e);
                    self.last_failed = Some(animation.to_string());
                } else {
                    debug!("Animation for model '{}' still not played: {}", self.model_id, e);
                }
            }
        }
    }
}

/// What a backend factory gets to build from.
pub struct BackendSpec<'a> {
    pub owner: OwnerId,
    pub pet: &'a PetDefinition,
    /// Selector text after the `tag:` prefix.
    pub payload: &'a str,
}

pub type BackendFactory = Box<dyn Fn(&BackendSpec<'_>) -> Box<dyn CompanionBackend>>;

/// Backend constructors keyed by texture-selector tag.
#[derive(Default)]
pub struct BackendRegistry {
    factories: HashMap<String, BackendFactory>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tag: impl Into<String>, factory: BackendFactory) {
        let tag = tag.into();
        info!("Registering companion backend for '{}'", tag);
        self.factories.insert(tag, factory);
    }

    /// Route `modelengine:` selectors to `engine`.
    pub fn register_model_engine(&mut self, engine: Arc<dyn ModelEngine>, settings: &AnimationSettings) {
        let settings = settings.clone();
        self.register(
            MODEL_BACKEND_TAG,
            Box::new(move |spec: &BackendSpec<'_>| -> Box<dyn CompanionBackend> {
                Box::new(ModelBackend::new(Arc::clone(&engine), spec.payload, &settings))
            }),
        );
    }

    /// Build the backend for `pet` as seen by `owner`.
    pub fn create(&self, owner: OwnerId, pet: &PetDefinition, selector: &TextureSelector) -> Box<dyn CompanionBackend> {
        match selector {
            TextureSelector::Literal(texture) => Box::new(SkullBackend::new(texture.clone())),
            TextureSelector::Backend { tag, payload } => match self.factories.get(tag) {
                Some(factory) => factory(&BackendSpec { owner, pet, payload }),
                None => {
                    debug!("No backend for '{}', using skull display for pet {}", tag, pet.id);
                    Box::new(SkullBackend::new(selector.to_string()))
                }
            },
        }
    }
}
