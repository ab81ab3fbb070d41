//! A scriptable stand-in for the external animation engine.
//!
//! Models are described by a [`ModelSpec`]: declared operations, per-operation
//! behaviour and nested sub-objects. Every invocation is recorded so callers
//! can check exactly what reached the engine.

use crate::pets::dispatch::RICH_OPERATION;
use crate::pets::engine::{
    DynValue, EngineError, EngineObject, InvokeError, ModelEngine, ModelHandle,
    OperationSignature, ParamKind,
};
use crate::world::EntityHandle;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    Accept,
    Fail(String),
    Panic,
}

#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub type_name: String,
    pub operations: Vec<OperationSignature>,
    pub behaviors: HashMap<String, Behavior>,
    pub nested: Vec<(String, ModelSpec)>,
}

impl ModelSpec {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            operations: Vec::new(),
            behaviors: HashMap::new(),
            nested: Vec::new(),
        }
    }

    /// A model exposing the canonical five-argument play operation.
    pub fn canonical(type_name: impl Into<String>) -> Self {
        Self::new(type_name).operation(OperationSignature::new(
            RICH_OPERATION,
            vec![
                ParamKind::Text,
                ParamKind::Float,
                ParamKind::Float,
                ParamKind::Float,
                ParamKind::Boolean,
            ],
        ))
    }

    pub fn operation(mut self, signature: OperationSignature) -> Self {
        self.operations.push(signature);
        self
    }

    pub fn failing(mut self, operation: &str, reason: &str) -> Self {
        self.behaviors
            .insert(operation.to_string(), Behavior::Fail(reason.to_string()));
        self
    }

    pub fn panicking(mut self, operation: &str) -> Self {
        self.behaviors.insert(operation.to_string(), Behavior::Panic);
        self
    }

    /// Expose `spec` through a zero-argument accessor named `accessor`.
    pub fn nested(mut self, accessor: &str, spec: ModelSpec) -> Self {
        self.operations
            .push(OperationSignature::new(accessor, Vec::new()));
        self.nested.push((accessor.to_string(), spec));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: String,
    pub args: Vec<DynValue>,
    pub succeeded: bool,
}

pub struct ScriptedModel {
    spec: ModelSpec,
    nested: Vec<(String, Arc<ScriptedModel>)>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    pub fn new(spec: ModelSpec) -> Self {
        let nested = spec
            .nested
            .iter()
            .map(|(accessor, nested)| (accessor.clone(), Arc::new(ScriptedModel::new(nested.clone()))))
            .collect();
        Self {
            spec,
            nested,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn nested_model(&self, accessor: &str) -> Option<Arc<ScriptedModel>> {
        self.nested
            .iter()
            .find(|(name, _)| name == accessor)
            .map(|(_, model)| Arc::clone(model))
    }

    /// Every invocation except accessor lookups, successful or not.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock_calls().clone()
    }

    /// Invocations that the model accepted.
    pub fn play_requests(&self) -> Vec<RecordedCall> {
        self.lock_calls()
            .iter()
            .filter(|call| call.succeeded)
            .cloned()
            .collect()
    }

    fn lock_calls(&self) -> MutexGuard<'_, Vec<RecordedCall>> {
        // A panic scripted into `invoke` never holds this lock.
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, operation: &str, args: &[DynValue], succeeded: bool) {
        self.lock_calls().push(RecordedCall {
            operation: operation.to_string(),
            args: args.to_vec(),
            succeeded,
        });
    }
}

impl EngineObject for ScriptedModel {
    fn type_name(&self) -> &str {
        &self.spec.type_name
    }

    fn operations(&self) -> Vec<OperationSignature> {
        self.spec.operations.clone()
    }

    fn invoke(&self, operation: &str, args: &[DynValue]) -> Result<DynValue, InvokeError> {
        if args.is_empty() {
            if let Some(model) = self.nested_model(operation) {
                let handle: ModelHandle = model;
                return Ok(DynValue::Object(handle));
            }
        }

        let candidates: Vec<&OperationSignature> = self
            .spec
            .operations
            .iter()
            .filter(|op| op.name == operation)
            .collect();
        if candidates.is_empty() {
            self.record(operation, args, false);
            return Err(InvokeError::NoSuchOperation(operation.to_string()));
        }
        if !candidates.iter().any(|op| op.accepts(args)) {
            self.record(operation, args, false);
            return Err(InvokeError::ArgumentMismatch {
                operation: operation.to_string(),
                reason: format!("{:?} does not fit any declared overload", args),
            });
        }

        match self.spec.behaviors.get(operation).unwrap_or(&Behavior::Accept) {
            Behavior::Accept => {
                self.record(operation, args, true);
                Ok(DynValue::Unit)
            }
            Behavior::Fail(reason) => {
                self.record(operation, args, false);
                Err(InvokeError::Failed {
                    operation: operation.to_string(),
                    reason: reason.clone(),
                })
            }
            Behavior::Panic => {
                self.record(operation, args, false);
                panic!("scripted panic in {}", operation);
            }
        }
    }
}

/// Engine that instantiates [`ScriptedModel`]s from registered prototypes.
#[derive(Default)]
pub struct ScriptedEngine {
    prototypes: HashMap<String, ModelSpec>,
    created: Mutex<Vec<(String, Arc<ScriptedModel>)>>,
    bindings: Mutex<Vec<EntityHandle>>,
    reject_binds: bool,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model_id: &str, spec: ModelSpec) -> Self {
        self.prototypes.insert(model_id.to_string(), spec);
        self
    }

    pub fn rejecting_binds(mut self) -> Self {
        self.reject_binds = true;
        self
    }

    /// Models created so far, oldest first.
    pub fn created_models(&self) -> Vec<(String, Arc<ScriptedModel>)> {
        self.created
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last_model(&self) -> Option<Arc<ScriptedModel>> {
        self.created_models().pop().map(|(_, model)| model)
    }

    pub fn bindings(&self) -> Vec<EntityHandle> {
        self.bindings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ModelEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn create_model(&self, model_id: &str) -> Result<ModelHandle, EngineError> {
        let spec = self
            .prototypes
            .get(model_id)
            .ok_or_else(|| EngineError::ModelNotFound(model_id.to_string()))?;
        let model = Arc::new(ScriptedModel::new(spec.clone()));
        self.created
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((model_id.to_string(), Arc::clone(&model)));
        Ok(model)
    }

    fn bind_model(&self, entity: EntityHandle, _model: &ModelHandle) -> Result<(), EngineError> {
        if self.reject_binds {
            return Err(EngineError::BindFailed {
                entity,
                reason: "entity type not supported".to_string(),
            });
        }
        self.bindings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(entity);
        Ok(())
    }
}
