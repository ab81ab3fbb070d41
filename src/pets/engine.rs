//! Contract with the external animation engine.
//!
//! The engine is optional and independently versioned, so its models are
//! exposed as reflective objects: each declares its operations with parameter
//! kinds and is invoked by name with dynamically typed arguments. Nothing here
//! assumes a particular engine version; [`crate::pets::dispatch`] does the probing.

use crate::world::EntityHandle;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Declared kind of one operation parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    Text,
    Float,
    Integer,
    Boolean,
    Enum { type_name: String, variants: Vec<String> },
    /// A type the dispatcher cannot construct.
    Opaque(String),
}

/// Name and parameter list of an operation a model declares.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationSignature {
    pub name: String,
    pub params: Vec<ParamKind>,
}

impl OperationSignature {
    pub fn new(name: impl Into<String>, params: Vec<ParamKind>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Lowercase name with `_` and `-` removed, for loose matching.
    pub fn normalized_name(&self) -> String {
        normalize_operation_name(&self.name)
    }

    /// Whether `args` fit this signature one-to-one.
    pub fn accepts(&self, args: &[DynValue]) -> bool {
        self.params.len() == args.len()
            && self.params.iter().zip(args).all(|(kind, arg)| arg.fits(kind))
    }
}

pub fn normalize_operation_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// A dynamically typed argument or return value.
#[derive(Clone)]
pub enum DynValue {
    Unit,
    Text(String),
    Float(f64),
    Integer(i64),
    Boolean(bool),
    Enum { type_name: String, variant: String },
    Object(ModelHandle),
}

impl DynValue {
    pub fn fits(&self, kind: &ParamKind) -> bool {
        match (self, kind) {
            (DynValue::Text(_), ParamKind::Text) => true,
            (DynValue::Float(_), ParamKind::Float) => true,
            (DynValue::Integer(_), ParamKind::Integer) => true,
            (DynValue::Boolean(_), ParamKind::Boolean) => true,
            (
                DynValue::Enum { type_name, variant },
                ParamKind::Enum { type_name: expected, variants },
            ) => type_name == expected && variants.contains(variant),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            DynValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Debug for DynValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynValue::Unit => write!(f, "()"),
            DynValue::Text(text) => write!(f, "{:?}", text),
            DynValue::Float(value) => write!(f, "{}", value),
            DynValue::Integer(value) => write!(f, "{}", value),
            DynValue::Boolean(value) => write!(f, "{}", value),
            DynValue::Enum { type_name, variant } => write!(f, "{}::{}", type_name, variant),
            DynValue::Object(object) => write!(f, "<{}>", object.type_name()),
        }
    }
}

impl PartialEq for DynValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DynValue::Unit, DynValue::Unit) => true,
            (DynValue::Text(a), DynValue::Text(b)) => a == b,
            (DynValue::Float(a), DynValue::Float(b)) => a == b,
            (DynValue::Integer(a), DynValue::Integer(b)) => a == b,
            (DynValue::Boolean(a), DynValue::Boolean(b)) => a == b,
            (
                DynValue::Enum { type_name: ta, variant: va },
                DynValue::Enum { type_name: tb, variant: vb },
            ) => ta == tb && va == vb,
            (DynValue::Object(a), DynValue::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvokeError {
    #[error("No such operation: {0}")]
    NoSuchOperation(String),

    #[error("Argument mismatch calling {operation}: {reason}")]
    ArgumentMismatch { operation: String, reason: String },

    #[error("{operation} failed: {reason}")]
    Failed { operation: String, reason: String },

    #[error("{operation} panicked: {message}")]
    Panicked { operation: String, message: String },
}

/// A model instance (or one of its sub-objects) inside the external engine.
pub trait EngineObject: Send + Sync {
    fn type_name(&self) -> &str;

    /// Operations this object declares.
    fn operations(&self) -> Vec<OperationSignature>;

    fn invoke(&self, operation: &str, args: &[DynValue]) -> Result<DynValue, InvokeError>;
}

/// Shared handle to an engine object. Owned by exactly one tracked companion.
pub type ModelHandle = Arc<dyn EngineObject>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Animation engine unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to bind model to {entity}: {reason}")]
    BindFailed { entity: EntityHandle, reason: String },
}

/// Entry points of the external engine.
pub trait ModelEngine: Send + Sync {
    fn name(&self) -> &str;

    fn create_model(&self, model_id: &str) -> Result<ModelHandle, EngineError>;

    /// Attach `model` to a host entity so the engine renders it there.
    fn bind_model(&self, entity: EntityHandle, model: &ModelHandle) -> Result<(), EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_name() {
        assert_eq!(normalize_operation_name("play_Animation"), "playanimation");
        assert_eq!(normalize_operation_name("get-animation-handler"), "getanimationhandler");
    }

    #[test]
    fn test_signature_accepts() {
        let sig = OperationSignature::new(
            "setState",
            vec![ParamKind::Enum {
                type_name: "ModelState".to_string(),
                variants: vec!["WALK".to_string(), "IDLE".to_string()],
            }],
        );
        assert!(sig.accepts(&[DynValue::Enum {
            type_name: "ModelState".to_string(),
            variant: "WALK".to_string()
        }]));
        assert!(!sig.accepts(&[DynValue::Text("WALK".to_string())]));
        assert!(!sig.accepts(&[]));
    }
}
