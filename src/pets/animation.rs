use crate::config::{SkinDefinition, DEFAULT_IDLE_ANIMATION};
use crate::pets::movement::MovementCategory;

/// Outcome of mapping a movement category to an animation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedAnimation {
    /// The skin does not drive animations; nothing should be dispatched.
    Default,
    /// Animation to play through the external engine.
    Play(String),
}

impl ResolvedAnimation {
    pub fn animation_id(&self) -> &str {
        match self {
            ResolvedAnimation::Default => DEFAULT_IDLE_ANIMATION,
            ResolvedAnimation::Play(id) => id,
        }
    }

    pub fn should_dispatch(&self) -> bool {
        matches!(self, ResolvedAnimation::Play(_))
    }
}

/// Pick the animation for `category` under `skin`.
///
/// Without a skin, or with a skin that does not enable both model rendering
/// and custom animations, the result is the default idle animation and no
/// dispatch. Categories missing from the skin's table map to its idle animation.
pub fn resolve_animation(skin: Option<&SkinDefinition>, category: MovementCategory) -> ResolvedAnimation {
    let Some(skin) = skin else {
        return ResolvedAnimation::Default;
    };
    if !skin.use_model_engine || !skin.use_custom_animations {
        return ResolvedAnimation::Default;
    }
    let id = skin
        .animations
        .get(&category)
        .cloned()
        .unwrap_or_else(|| skin.idle_animation().to_string());
    ResolvedAnimation::Play(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn skin(use_model_engine: bool, use_custom_animations: bool) -> SkinDefinition {
        let mut animations = HashMap::new();
        animations.insert(MovementCategory::Sprinting, "run".to_string());
        animations.insert(MovementCategory::Flying, "soar".to_string());
        SkinDefinition {
            id: "test".to_string(),
            display_name: "Test".to_string(),
            texture: "abc".to_string(),
            model_id: Some("model".to_string()),
            use_model_engine,
            use_custom_animations,
            animations,
            idle_animation: None,
        }
    }

    #[test]
    fn test_disabled_model_engine_always_idle() {
        let skin = skin(false, true);
        for category in MovementCategory::ALL {
            let resolved = resolve_animation(Some(&skin), category);
            assert_eq!(resolved, ResolvedAnimation::Default);
            assert_eq!(resolved.animation_id(), "idle");
            assert!(!resolved.should_dispatch());
        }
    }

    #[test]
    fn test_disabled_custom_animations_idle() {
        let skin = skin(true, false);
        assert_eq!(
            resolve_animation(Some(&skin), MovementCategory::Sprinting),
            ResolvedAnimation::Default
        );
    }

    #[test]
    fn test_no_skin_is_default() {
        assert_eq!(
            resolve_animation(None, MovementCategory::Flying),
            ResolvedAnimation::Default
        );
    }

    #[test]
    fn test_table_lookup_and_fallback() {
        let mut skin = skin(true, true);
        assert_eq!(
            resolve_animation(Some(&skin), MovementCategory::Sprinting),
            ResolvedAnimation::Play("run".to_string())
        );
        assert_eq!(
            resolve_animation(Some(&skin), MovementCategory::Walking),
            ResolvedAnimation::Play("idle".to_string())
        );

        skin.idle_animation = Some("sit".to_string());
        assert_eq!(
            resolve_animation(Some(&skin), MovementCategory::Riding),
            ResolvedAnimation::Play("sit".to_string())
        );
    }
}
