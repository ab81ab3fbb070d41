pub mod settings;
pub mod definitions;

// Re-export commonly used types
pub use settings::{
    DisplaySettings, BobSettings, SpinSettings, PoseSettings, MovementThresholds,
    AnimationSettings, ConfigError,
    load_display_settings, load_display_settings_from, save_display_settings,
    save_display_settings_to, settings_path, data_dir,
};
pub use definitions::{
    PetDefinition, SkinDefinition, TextureSelector, Registry, DefinitionSet, Identified,
    MODEL_BACKEND_TAG, DEFAULT_IDLE_ANIMATION,
};
