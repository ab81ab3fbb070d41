use crate::config::{DefinitionSet, DisplaySettings, PetDefinition, Registry, SkinDefinition};
use crate::pets::backend::BackendRegistry;
use crate::pets::commands::{self, CommandError, CommandSender, SkinOutcome};
use crate::pets::display::{CompanionDisplay, DisplayContext};
use crate::pets::engine::ModelEngine;
use crate::pets::selection::{SelectionStore, SkinSelections};
use crate::world::{HostWorld, OwnerEvent, OwnerId};
use std::sync::Arc;
use tracing::info;

/// Everything the companion system owns between enable and disable.
pub struct CompanionApp {
    settings: DisplaySettings,
    pets: Registry<PetDefinition>,
    skins: Registry<SkinDefinition>,
    selections: SkinSelections,
    backends: BackendRegistry,
    display: CompanionDisplay,
}

impl CompanionApp {
    /// Register definitions, load stored selections and pick backends.
    /// The model backend is only available when `engine` is present.
    pub fn enable(
        settings: DisplaySettings,
        definitions: DefinitionSet,
        engine: Option<Arc<dyn ModelEngine>>,
        store: Box<dyn SelectionStore>,
    ) -> Self {
        let mut backends = BackendRegistry::new();
        match engine {
            Some(engine) => {
                info!("Animation engine '{}' found, model companions enabled", engine.name());
                backends.register_model_engine(engine, &settings.animation);
            }
            None => info!("No animation engine, companions use skull displays"),
        }

        let mut app = Self {
            settings,
            pets: Registry::new(),
            skins: Registry::new(),
            selections: SkinSelections::new(store),
            backends,
            display: CompanionDisplay::new(),
        };
        app.register_definitions(definitions);
        app.selections.load(&app.skins);
        app
    }

    pub fn settings(&self) -> &DisplaySettings {
        &self.settings
    }

    pub fn display(&self) -> &CompanionDisplay {
        &self.display
    }

    pub fn pets(&self) -> &Registry<PetDefinition> {
        &self.pets
    }

    pub fn skins(&self) -> &Registry<SkinDefinition> {
        &self.skins
    }

    pub fn selections(&self) -> &SkinSelections {
        &self.selections
    }

    pub fn tick(&mut self, world: &mut dyn HostWorld) {
        if !self.settings.enabled {
            return;
        }
        let (display, ctx) = self.split();
        display.tick_all(world, &ctx);
    }

    pub fn handle_event(&mut self, world: &mut dyn HostWorld, event: &OwnerEvent) {
        self.display.handle_event(world, event);
    }

    /// Rebuild one owner's companion. While disabled this only tears down.
    pub fn refresh_owner(&mut self, world: &mut dyn HostWorld, owner: OwnerId) {
        if !self.settings.enabled {
            self.display.remove(world, owner);
            return;
        }
        let (display, ctx) = self.split();
        display.refresh(world, &ctx, owner);
    }

    pub fn refresh_all(&mut self, world: &mut dyn HostWorld) {
        if !self.settings.enabled {
            self.display.shutdown(world);
            return;
        }
        let (display, ctx) = self.split();
        display.refresh_all(world, &ctx);
    }

    /// Replace all definitions, re-validate selections and rebuild every companion.
    pub fn reload(&mut self, world: &mut dyn HostWorld, definitions: DefinitionSet) {
        self.register_definitions(definitions);
        self.selections.load(&self.skins);
        self.refresh_all(world);
    }

    pub fn set_skin(
        &mut self,
        world: &mut dyn HostWorld,
        sender: CommandSender,
        skin_id: &str,
        target: Option<&str>,
    ) -> Result<SkinOutcome, CommandError> {
        let outcome = commands::set_skin(sender, skin_id, target, world, &self.skins, &mut self.selections)?;
        self.refresh_owner(world, outcome.target);
        Ok(outcome)
    }

    pub fn remove_skin(
        &mut self,
        world: &mut dyn HostWorld,
        sender: CommandSender,
        target: Option<&str>,
    ) -> Result<SkinOutcome, CommandError> {
        let outcome = commands::remove_skin(sender, target, world, &self.skins, &mut self.selections)?;
        self.refresh_owner(world, outcome.target);
        Ok(outcome)
    }

    /// Remove every companion, then persist selections.
    pub fn disable(mut self, world: &mut dyn HostWorld) {
        self.display.shutdown(world);
        self.selections.save();
        info!("Companion system disabled");
    }

    fn register_definitions(&mut self, definitions: DefinitionSet) {
        self.pets.clear();
        self.skins.clear();
        for pet in definitions.pets {
            self.pets.register(pet);
        }
        for skin in definitions.skins {
            self.skins.register(skin);
        }
        info!("Registered {} pets and {} skins", self.pets.len(), self.skins.len());
    }

    fn split(&mut self) -> (&mut CompanionDisplay, DisplayContext<'_>) {
        let Self {
            settings,
            pets,
            skins,
            selections,
            backends,
            display,
        } = self;
        let ctx = DisplayContext {
            settings: &*settings,
            pets: &*pets,
            skins: &*skins,
            selections: &*selections,
            backends: &*backends,
        };
        (display, ctx)
    }
}
