//! Capability-probing animation dispatch.
//!
//! The installed engine may expose any of several call shapes for "play this
//! animation". [`AnimationDispatcher::play`] walks an ordered cascade of
//! strategies against the model (and first against any animation sub-object
//! the model exposes) and stops at the first call that succeeds. Every attempt
//! runs in its own failure domain: an error or a panic inside the engine is
//! logged and the next attempt proceeds.

use crate::config::AnimationSettings;
use crate::pets::engine::{DynValue, InvokeError, ModelHandle, OperationSignature, ParamKind};
use std::collections::HashSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;
use tracing::debug;

/// Name of the canonical five-argument play operation.
pub const RICH_OPERATION: &str = "playAnimation";

const ANIMATION_KEYWORDS: [&str; 3] = ["play", "animat", "state"];

/// Normalized accessor names, in priority order, that expose an animation sub-object.
const NESTED_ACCESSORS: [&str; 4] = ["getanimationhandler", "animationhandler", "gethandle", "handle"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `playAnimation(id, blend_in, blend_out, speed, force)`.
    Rich,
    /// Single-argument state setter taking an enum or a string.
    StateCall,
    /// Any other single-string operation named like play/animate/state.
    NamedCall,
    /// A five-argument operation invoked with synthesized arguments.
    Adapted,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Rich => "rich",
            Strategy::StateCall => "state",
            Strategy::NamedCall => "named",
            Strategy::Adapted => "adapted",
        };
        f.write_str(name)
    }
}

/// Which object accepted the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchTarget {
    /// A sub-object reached through the named accessor.
    Nested(String),
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSuccess {
    pub strategy: Strategy,
    pub operation: String,
    pub target: DispatchTarget,
    /// Attempts made before and including the successful one.
    pub attempts: usize,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("No compatible animation call for '{animation}' on model '{model}' after {attempts} attempts")]
    NoCompatibleCall {
        animation: String,
        model: String,
        attempts: usize,
    },
}

/// Arguments for the canonical play call.
#[derive(Debug, Clone)]
pub struct PlaybackParams {
    pub blend_in: f64,
    pub blend_out: f64,
    pub speed: f64,
    pub force: bool,
    pub instant_token: String,
}

impl From<&AnimationSettings> for PlaybackParams {
    fn from(settings: &AnimationSettings) -> Self {
        Self {
            blend_in: settings.blend_in,
            blend_out: settings.blend_out,
            speed: settings.speed,
            force: true,
            instant_token: settings.instant_token.clone(),
        }
    }
}

impl Default for PlaybackParams {
    fn default() -> Self {
        Self::from(&AnimationSettings::default())
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnimationDispatcher {
    params: PlaybackParams,
}

/// Bookkeeping for one `play` call.
struct Probe<'a> {
    animation: &'a str,
    attempts: usize,
}

impl AnimationDispatcher {
    pub fn new(params: PlaybackParams) -> Self {
        Self { params }
    }

    /// Make the engine play `animation` on `model`.
    ///
    /// Nested animation objects are tried before the model itself. Each
    /// operation is invoked at most once per object.
    pub fn play(&self, model: &ModelHandle, animation: &str) -> Result<DispatchSuccess, DispatchError> {
        let mut probe = Probe {
            animation,
            attempts: 0,
        };

        for (accessor, nested) in nested_targets(model) {
            if let Some(success) = self.cascade(&nested, DispatchTarget::Nested(accessor), &mut probe) {
                return Ok(success);
            }
        }
        if let Some(success) = self.cascade(model, DispatchTarget::Model, &mut probe) {
            return Ok(success);
        }

        Err(DispatchError::NoCompatibleCall {
            animation: animation.to_string(),
            model: model.type_name().to_string(),
            attempts: probe.attempts,
        })
    }

    fn cascade(&self, target: &ModelHandle, label: DispatchTarget, probe: &mut Probe<'_>) -> Option<DispatchSuccess> {
        let operations = declared_operations(target);
        let mut tried: HashSet<(String, usize)> = HashSet::new();

        // 1. Canonical call, attempted whether or not it is declared.
        let rich_args = self.rich_args(probe.animation);
        if attempt(target, RICH_OPERATION, &rich_args, Strategy::Rich, probe, &mut tried) {
            return Some(success(Strategy::Rich, RICH_OPERATION, label, probe));
        }
        let rich_shape = rich_shape();
        for op in operations
            .iter()
            .filter(|op| op.params == rich_shape && is_animation_like(op))
        {
            if attempt(target, &op.name, &rich_args, Strategy::Rich, probe, &mut tried) {
                return Some(success(Strategy::Rich, &op.name, label, probe));
            }
        }

        // 2. State setters.
        for op in operations.iter().filter(|op| op.arity() == 1 && op.normalized_name().contains("state")) {
            let arg = match &op.params[0] {
                ParamKind::Enum { type_name, variants } => {
                    match variants.iter().find(|v| v.eq_ignore_ascii_case(probe.animation)) {
                        Some(variant) => DynValue::Enum {
                            type_name: type_name.clone(),
                            variant: variant.clone(),
                        },
                        None => continue,
                    }
                }
                ParamKind::Text => DynValue::Text(probe.animation.to_string()),
                _ => continue,
            };
            if attempt(target, &op.name, &[arg], Strategy::StateCall, probe, &mut tried) {
                return Some(success(Strategy::StateCall, &op.name, label, probe));
            }
        }

        // 3. Anything else that looks like it plays a named animation.
        for op in operations
            .iter()
            .filter(|op| op.params == [ParamKind::Text] && is_animation_like(op))
        {
            let args = [DynValue::Text(probe.animation.to_string())];
            if attempt(target, &op.name, &args, Strategy::NamedCall, probe, &mut tried) {
                return Some(success(Strategy::NamedCall, &op.name, label, probe));
            }
        }

        // 4. Five-argument operations with a shape we were not built against.
        for op in operations
            .iter()
            .filter(|op| op.arity() == 5 && op.params != rich_shape && is_animation_like(op))
        {
            let Some(args) = self.synthesize_args(op, probe.animation) else {
                debug!("Skipping {}: cannot synthesize arguments for {:?}", op.name, op.params);
                continue;
            };
            if attempt(target, &op.name, &args, Strategy::Adapted, probe, &mut tried) {
                return Some(success(Strategy::Adapted, &op.name, label, probe));
            }
        }

        None
    }

    fn rich_args(&self, animation: &str) -> [DynValue; 5] {
        [
            DynValue::Text(animation.to_string()),
            DynValue::Float(self.params.blend_in),
            DynValue::Float(self.params.blend_out),
            DynValue::Float(self.params.speed),
            DynValue::Boolean(self.params.force),
        ]
    }

    /// Plausible arguments for an unknown signature. The first string slot
    /// carries the animation id; later string slots get the instant token.
    fn synthesize_args(&self, op: &OperationSignature, animation: &str) -> Option<Vec<DynValue>> {
        let mut id_placed = false;
        op.params
            .iter()
            .map(|kind| match kind {
                ParamKind::Float => Some(DynValue::Float(1.0)),
                ParamKind::Integer => Some(DynValue::Integer(1)),
                ParamKind::Boolean => Some(DynValue::Boolean(true)),
                ParamKind::Text if !id_placed => {
                    id_placed = true;
                    Some(DynValue::Text(animation.to_string()))
                }
                ParamKind::Text => Some(DynValue::Text(self.params.instant_token.clone())),
                ParamKind::Enum { type_name, variants } => variants
                    .iter()
                    .find(|v| v.eq_ignore_ascii_case(animation))
                    .or_else(|| variants.first())
                    .map(|variant| DynValue::Enum {
                        type_name: type_name.clone(),
                        variant: variant.clone(),
                    }),
                ParamKind::Opaque(_) => None,
            })
            .collect()
    }
}

fn rich_shape() -> [ParamKind; 5] {
    [
        ParamKind::Text,
        ParamKind::Float,
        ParamKind::Float,
        ParamKind::Float,
        ParamKind::Boolean,
    ]
}

fn is_animation_like(op: &OperationSignature) -> bool {
    let name = op.normalized_name();
    ANIMATION_KEYWORDS.iter().any(|keyword| name.contains(keyword))
}

fn success(strategy: Strategy, operation: &str, target: DispatchTarget, probe: &Probe<'_>) -> DispatchSuccess {
    DispatchSuccess {
        strategy,
        operation: operation.to_string(),
        target,
        attempts: probe.attempts,
    }
}

/// Invoke one candidate in isolation. Returns whether it succeeded.
fn attempt(
    target: &ModelHandle,
    operation: &str,
    args: &[DynValue],
    strategy: Strategy,
    probe: &mut Probe<'_>,
    tried: &mut HashSet<(String, usize)>,
) -> bool {
    if !tried.insert((operation.to_string(), args.len())) {
        return false;
    }
    probe.attempts += 1;
    match guarded(operation, || target.invoke(operation, args)) {
        Ok(_) => {
            debug!(
                "Played '{}' on {} via {} strategy ({})",
                probe.animation,
                target.type_name(),
                strategy,
                operation
            );
            true
        }
        Err(e) => {
            debug!(
                "{} strategy failed for '{}' on {}: {}",
                strategy,
                probe.animation,
                target.type_name(),
                e
            );
            false
        }
    }
}

/// Declared operations, or none if the object cannot even describe itself.
fn declared_operations(target: &ModelHandle) -> Vec<OperationSignature> {
    guarded("operations", || Ok(target.operations())).unwrap_or_else(|e| {
        debug!("Could not list operations of {}: {}", target.type_name(), e);
        Vec::new()
    })
}

/// Sub-objects reachable through zero-argument accessors such as
/// `getAnimationHandler` or `getHandle`, in accessor priority order.
fn nested_targets(model: &ModelHandle) -> Vec<(String, ModelHandle)> {
    let operations = declared_operations(model);
    let mut nested = Vec::new();
    for accessor_name in NESTED_ACCESSORS {
        for op in operations.iter().filter(|op| op.arity() == 0) {
            if op.normalized_name() != accessor_name || nested.iter().any(|(accessor, _)| accessor == &op.name) {
                continue;
            }
            match guarded(&op.name, || model.invoke(&op.name, &[])) {
                Ok(DynValue::Object(object)) => nested.push((op.name.clone(), object)),
                Ok(other) => debug!("Accessor {} returned {:?}, not an object", op.name, other),
                Err(e) => debug!("Accessor {} failed: {}", op.name, e),
            }
        }
    }
    nested
}

/// Run an engine call, converting a panic into an [`InvokeError`].
fn guarded<T>(operation: &str, call: impl FnOnce() -> Result<T, InvokeError>) -> Result<T, InvokeError> {
    contain_panic(call).unwrap_or_else(|message| {
        Err(InvokeError::Panicked {
            operation: operation.to_string(),
            message,
        })
    })
}

/// Run `call`, turning a panic into its message.
pub(crate) fn contain_panic<T>(call: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(call)).map_err(|payload| {
        payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pets::scripted::{ModelSpec, ScriptedModel};
    use std::sync::Arc;

    fn text_op(name: &str) -> OperationSignature {
        OperationSignature::new(name, vec![ParamKind::Text])
    }

    fn handle(model: &Arc<ScriptedModel>) -> ModelHandle {
        model.clone()
    }

    #[test]
    fn test_rich_call_preferred() {
        let model = Arc::new(ScriptedModel::new(ModelSpec::canonical("ActiveModel")));
        let result = AnimationDispatcher::default().play(&handle(&model), "run").unwrap();

        assert_eq!(result.strategy, Strategy::Rich);
        assert_eq!(result.target, DispatchTarget::Model);
        let played = model.play_requests();
        assert_eq!(played.len(), 1);
        assert_eq!(
            played[0].args,
            vec![
                DynValue::Text("run".to_string()),
                DynValue::Float(0.2),
                DynValue::Float(0.2),
                DynValue::Float(1.0),
                DynValue::Boolean(true),
            ]
        );
    }

    #[test]
    fn test_rich_shape_under_other_name() {
        let spec = ModelSpec::new("ActiveModelV4").operation(OperationSignature::new(
            "play_animation",
            vec![
                ParamKind::Text,
                ParamKind::Float,
                ParamKind::Float,
                ParamKind::Float,
                ParamKind::Boolean,
            ],
        ));
        let model = Arc::new(ScriptedModel::new(spec));
        let result = AnimationDispatcher::default().play(&handle(&model), "run").unwrap();

        assert_eq!(result.strategy, Strategy::Rich);
        assert_eq!(result.operation, "play_animation");
        assert_eq!(result.attempts, 2);
        let played = model.play_requests();
        assert_eq!(played.len(), 1);
        assert_eq!(played[0].args[0], DynValue::Text("run".to_string()));
        assert_eq!(played[0].args[4], DynValue::Boolean(true));
    }

    #[test]
    fn test_state_enum_matched_case_insensitively() {
        let spec = ModelSpec::new("ActiveModel").operation(OperationSignature::new(
            "setState",
            vec![ParamKind::Enum {
                type_name: "ModelState".to_string(),
                variants: vec!["IDLE".to_string(), "RUN".to_string()],
            }],
        ));
        let model = Arc::new(ScriptedModel::new(spec));
        let result = AnimationDispatcher::default().play(&handle(&model), "run").unwrap();

        assert_eq!(result.strategy, Strategy::StateCall);
        assert_eq!(
            model.play_requests()[0].args,
            vec![DynValue::Enum {
                type_name: "ModelState".to_string(),
                variant: "RUN".to_string()
            }]
        );
    }

    #[test]
    fn test_named_call_after_failed_state_call() {
        let spec = ModelSpec::new("ActiveModel")
            .operation(text_op("setState"))
            .failing("setState", "state machine locked")
            .operation(text_op("animate"));
        let model = Arc::new(ScriptedModel::new(spec));
        let result = AnimationDispatcher::default().play(&handle(&model), "walk").unwrap();

        assert_eq!(result.strategy, Strategy::NamedCall);
        assert_eq!(result.operation, "animate");
        // rich + setState + animate
        assert_eq!(result.attempts, 3);
    }

    #[test]
    fn test_adapted_call_synthesizes_arguments() {
        let spec = ModelSpec::new("LegacyModel").operation(OperationSignature::new(
            "play_animation",
            vec![
                ParamKind::Text,
                ParamKind::Integer,
                ParamKind::Float,
                ParamKind::Boolean,
                ParamKind::Text,
            ],
        ));
        let model = Arc::new(ScriptedModel::new(spec));
        let result = AnimationDispatcher::default().play(&handle(&model), "fly").unwrap();

        assert_eq!(result.strategy, Strategy::Adapted);
        assert_eq!(
            model.play_requests()[0].args,
            vec![
                DynValue::Text("fly".to_string()),
                DynValue::Integer(1),
                DynValue::Float(1.0),
                DynValue::Boolean(true),
                DynValue::Text("INSTANT".to_string()),
            ]
        );
    }

    #[test]
    fn test_nested_handler_tried_first() {
        let handler = ModelSpec::canonical("AnimationHandler");
        let spec = ModelSpec::canonical("ActiveModel").nested("getAnimationHandler", handler);
        let model = Arc::new(ScriptedModel::new(spec));
        let result = AnimationDispatcher::default().play(&handle(&model), "idle").unwrap();

        assert_eq!(result.target, DispatchTarget::Nested("getAnimationHandler".to_string()));
        assert!(model.play_requests().is_empty());
        let nested = model.nested_model("getAnimationHandler").unwrap();
        assert_eq!(nested.play_requests().len(), 1);
    }

    #[test]
    fn test_only_exact_accessors_are_followed() {
        let spec = ModelSpec::canonical("ActiveModel")
            .operation(OperationSignature::new("handleRemoval", Vec::new()))
            .operation(OperationSignature::new("unhandledReset", Vec::new()));
        let model = Arc::new(ScriptedModel::new(spec));
        let result = AnimationDispatcher::default().play(&handle(&model), "idle").unwrap();

        assert_eq!(result.target, DispatchTarget::Model);
        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].operation, RICH_OPERATION);
    }

    #[test]
    fn test_falls_back_to_model_when_nested_fails() {
        let handler = ModelSpec::canonical("AnimationHandler").failing(RICH_OPERATION, "no bones");
        let spec = ModelSpec::canonical("ActiveModel").nested("getHandle", handler);
        let model = Arc::new(ScriptedModel::new(spec));
        let result = AnimationDispatcher::default().play(&handle(&model), "idle").unwrap();

        assert_eq!(result.target, DispatchTarget::Model);
        assert_eq!(model.play_requests().len(), 1);
    }

    #[test]
    fn test_panicking_engine_is_contained() {
        let spec = ModelSpec::canonical("ActiveModel")
            .panicking(RICH_OPERATION)
            .operation(text_op("playState"));
        let model = Arc::new(ScriptedModel::new(spec));
        let result = AnimationDispatcher::default().play(&handle(&model), "idle").unwrap();

        assert_eq!(result.operation, "playState");
    }

    #[test]
    fn test_no_compatible_call_tries_each_operation_once() {
        let spec = ModelSpec::new("OpaqueModel")
            .operation(text_op("teleport"))
            .operation(OperationSignature::new("setColor", vec![ParamKind::Integer]))
            .operation(OperationSignature::new(
                "playEffect",
                vec![
                    ParamKind::Opaque("Particle".to_string()),
                    ParamKind::Float,
                    ParamKind::Float,
                    ParamKind::Float,
                    ParamKind::Boolean,
                ],
            ));
        let model = Arc::new(ScriptedModel::new(spec));
        let err = AnimationDispatcher::default().play(&handle(&model), "run").unwrap_err();

        let DispatchError::NoCompatibleCall { animation, model: name, attempts } = err;
        assert_eq!(animation, "run");
        assert_eq!(name, "OpaqueModel");
        assert_eq!(attempts, 1);
        assert_eq!(model.calls().len(), 1);
        assert!(model.play_requests().is_empty());
    }
}
