//! Pet and skin definitions and the registries that hold them.
//!
//! Definitions are immutable once registered. A reload clears a registry and
//! registers the new set; nothing is ever edited in place.

use crate::config::settings::ConfigError;
use crate::pets::movement::MovementCategory;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Prefix naming the external model backend in a texture selector.
pub const MODEL_BACKEND_TAG: &str = "modelengine";

/// Animation played when nothing more specific applies.
pub const DEFAULT_IDLE_ANIMATION: &str = "idle";

/// Anything stored in a [`Registry`].
pub trait Identified {
    fn id(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetDefinition {
    pub id: String,
    pub name: String,
    /// Reference to the leveling curve owned by the progression system.
    #[serde(default)]
    pub level_curve: String,
    /// Either a literal appearance token or `backend:payload`.
    pub texture: String,
}

impl Identified for PetDefinition {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkinDefinition {
    pub id: String,
    pub display_name: String,
    /// Base appearance token used when the model backend is not in play.
    pub texture: String,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub use_model_engine: bool,
    #[serde(default)]
    pub use_custom_animations: bool,
    #[serde(default)]
    pub animations: HashMap<MovementCategory, String>,
    #[serde(default)]
    pub idle_animation: Option<String>,
}

impl SkinDefinition {
    /// Texture selector this skin imposes on the pet it decorates.
    pub fn texture_selector(&self) -> String {
        match (&self.model_id, self.use_model_engine) {
            (Some(model_id), true) => format!("{}:{}", MODEL_BACKEND_TAG, model_id),
            _ => self.texture.clone(),
        }
    }

    pub fn idle_animation(&self) -> &str {
        self.idle_animation.as_deref().unwrap_or(DEFAULT_IDLE_ANIMATION)
    }
}

impl Identified for SkinDefinition {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A parsed texture selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureSelector {
    /// A bare appearance token.
    Literal(String),
    /// `tag:payload`, where `tag` names a backend.
    Backend { tag: String, payload: String },
}

impl TextureSelector {
    /// Split at the first `:`. Anything without a colon is a literal.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((tag, payload)) => TextureSelector::Backend {
                tag: tag.to_string(),
                payload: payload.to_string(),
            },
            None => TextureSelector::Literal(raw.to_string()),
        }
    }

    /// Resolve the selector for a pet, letting an active skin take precedence.
    pub fn for_pet(pet: &PetDefinition, skin: Option<&SkinDefinition>) -> Self {
        match skin {
            Some(skin) => Self::parse(&skin.texture_selector()),
            None => Self::parse(&pet.texture),
        }
    }
}

impl fmt::Display for TextureSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureSelector::Literal(token) => write!(f, "{}", token),
            TextureSelector::Backend { tag, payload } => write!(f, "{}:{}", tag, payload),
        }
    }
}

/// Identifier-keyed store of shared, immutable definitions.
#[derive(Debug)]
pub struct Registry<T> {
    entries: BTreeMap<String, Arc<T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T: Identified> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, replacing any previous one with the same id.
    pub fn register(&mut self, definition: T) -> Arc<T> {
        let definition = Arc::new(definition);
        self.entries
            .insert(definition.id().to_string(), Arc::clone(&definition));
        definition
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, id: &str) -> Option<Arc<T>> {
        self.entries.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn values(&self) -> impl Iterator<Item = &Arc<T>> + '_ {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A batch of definitions as delivered by the configuration source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefinitionSet {
    #[serde(default, rename = "pet")]
    pub pets: Vec<PetDefinition>,
    #[serde(default, rename = "skin")]
    pub skins: Vec<SkinDefinition>,
}

impl DefinitionSet {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFINITIONS: &str = r#"
[[pet]]
id = "fox"
name = "Fox"
level_curve = "default"
texture = "eyJ0ZXh0dXJlcyI6"

[[pet]]
id = "dragon"
name = "Dragon"
texture = "modelengine:dragon_model"

[[skin]]
id = "arctic"
display_name = "Arctic"
texture = "eyJhcmN0aWMi"
model_id = "arctic_fox"
use_model_engine = true
use_custom_animations = true
idle_animation = "sit"

[skin.animations]
sprinting = "run"
walking = "walk"
"#;

    #[test]
    fn test_parse_definition_set() {
        let set = DefinitionSet::from_toml_str(DEFINITIONS).unwrap();
        assert_eq!(set.pets.len(), 2);
        assert_eq!(set.skins.len(), 1);

        let skin = &set.skins[0];
        assert_eq!(skin.animations.get(&MovementCategory::Sprinting).map(String::as_str), Some("run"));
        assert_eq!(skin.idle_animation(), "sit");
        assert_eq!(skin.texture_selector(), "modelengine:arctic_fox");
    }

    #[test]
    fn test_texture_selector_parse() {
        assert_eq!(
            TextureSelector::parse("modelengine:dragon:v2"),
            TextureSelector::Backend {
                tag: "modelengine".to_string(),
                payload: "dragon:v2".to_string()
            }
        );
        assert_eq!(
            TextureSelector::parse("eyJ0ZXh0"),
            TextureSelector::Literal("eyJ0ZXh0".to_string())
        );
    }

    #[test]
    fn test_skin_without_model_uses_base_texture() {
        let skin = SkinDefinition {
            id: "plain".to_string(),
            display_name: "Plain".to_string(),
            texture: "abc".to_string(),
            model_id: Some("ignored".to_string()),
            use_model_engine: false,
            use_custom_animations: false,
            animations: HashMap::new(),
            idle_animation: None,
        };
        assert_eq!(skin.texture_selector(), "abc");
        assert_eq!(skin.idle_animation(), DEFAULT_IDLE_ANIMATION);
    }

    #[test]
    fn test_registry_clear_and_reregister() {
        let mut registry = Registry::new();
        registry.register(PetDefinition {
            id: "fox".to_string(),
            name: "Fox".to_string(),
            level_curve: String::new(),
            texture: "a".to_string(),
        });
        assert!(registry.contains("fox"));
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.get("fox").is_none());
    }
}
