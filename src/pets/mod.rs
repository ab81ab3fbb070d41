pub mod movement;
pub mod animation;
pub mod engine;
pub mod dispatch;
pub mod scripted;
pub mod backend;
pub mod selection;
pub mod display;
pub mod commands;

pub use movement::{classify, MovementCategory};
pub use animation::{resolve_animation, ResolvedAnimation};
pub use engine::{
    DynValue, EngineError, EngineObject, InvokeError, ModelEngine, ModelHandle,
    OperationSignature, ParamKind,
};
pub use dispatch::{AnimationDispatcher, DispatchError, DispatchSuccess, PlaybackParams, Strategy};
pub use scripted::{ModelSpec, ScriptedEngine, ScriptedModel};
pub use backend::{
    BackendFactory, BackendRegistry, BackendSpec, CompanionBackend, ModelBackend,
    RefreshRequest, SkullBackend,
};
pub use selection::{
    FileSelectionStore, MemorySelectionStore, SelectionMap, SelectionStore, SkinSelections,
    StoreError,
};
pub use display::{CompanionDisplay, DisplayContext};
pub use commands::{remove_skin, set_skin, CommandError, CommandSender, SkinOutcome};
