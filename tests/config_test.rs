use pet_companion::config::{
    load_display_settings_from, save_display_settings_to, DefinitionSet, DisplaySettings,
    TextureSelector,
};
use std::env;
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

fn temp_settings_path() -> PathBuf {
    env::temp_dir()
        .join(format!("pet-companion-test-{}", Uuid::new_v4()))
        .join("display.toml")
}

#[test]
fn test_settings_save_and_load() {
    let path = temp_settings_path();

    let mut settings = DisplaySettings::default();
    settings.spin.enabled = true;
    settings.spin.speed = 45.0;
    settings.name_template = "%pet% of %player%".to_string();
    settings.animation.retrigger_interval_ticks = 40;
    settings.movement.facing_threshold = Some(0.3);

    save_display_settings_to(&path, &settings).expect("Failed to save settings");
    let loaded = load_display_settings_from(&path).expect("Failed to load settings");

    assert!(loaded.spin.enabled);
    assert_eq!(loaded.spin.speed, 45.0);
    assert_eq!(loaded.format_label("Alex", "Fox", 2), "Fox of Alex");
    assert_eq!(loaded.animation.retrigger_interval_ticks, 40);
    assert_eq!(loaded.movement.facing_threshold, Some(0.3));
    assert_eq!(loaded.tick_interval_ms, 50);

    if let Some(dir) = path.parent() {
        let _ = fs::remove_dir_all(dir);
    }
}

#[test]
fn test_missing_file_gives_defaults() {
    let loaded = load_display_settings_from(&temp_settings_path()).expect("Missing file should be allowed");
    assert!(loaded.enabled);
    assert_eq!(loaded.pose.floor, 0.5);
    assert_eq!(loaded.animation.instant_token, "INSTANT");
}

#[test]
fn test_environment_overrides_file() {
    let path = temp_settings_path();
    let mut settings = DisplaySettings::default();
    settings.animation.blend_in = 0.5;
    save_display_settings_to(&path, &settings).unwrap();

    env::set_var("PET_COMPANION__ANIMATION__BLEND_IN", "0.75");
    let loaded = load_display_settings_from(&path);
    env::remove_var("PET_COMPANION__ANIMATION__BLEND_IN");

    assert_eq!(loaded.unwrap().animation.blend_in, 0.75);

    if let Some(dir) = path.parent() {
        let _ = fs::remove_dir_all(dir);
    }
}

#[test]
fn test_definitions_with_skin_override() {
    let set = DefinitionSet::from_toml_str(
        r#"
[[pet]]
id = "fox"
name = "Fox"
texture = "eyJmb3gi"

[[skin]]
id = "ember"
display_name = "Ember"
texture = "eyJlbWJlciI"
model_id = "ember_fox"
use_model_engine = true
"#,
    )
    .unwrap();

    let pet = &set.pets[0];
    let skin = &set.skins[0];
    assert_eq!(TextureSelector::for_pet(pet, None), TextureSelector::Literal("eyJmb3gi".to_string()));
    assert_eq!(
        TextureSelector::for_pet(pet, Some(skin)),
        TextureSelector::Backend {
            tag: "modelengine".to_string(),
            payload: "ember_fox".to_string()
        }
    );
    assert!(!skin.use_custom_animations);
}

#[test]
fn test_malformed_definitions_rejected() {
    assert!(DefinitionSet::from_toml_str("[[pet]]\nid = 3\n").is_err());
}
