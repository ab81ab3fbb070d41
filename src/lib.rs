// Pet Companion: owner-following companion displays with adaptive animation

pub mod utils;
pub mod config;
pub mod world;
pub mod pets;
pub mod app;

// Re-export commonly used types for convenience
pub use app::CompanionApp;
pub use config::{DefinitionSet, DisplaySettings};
pub use pets::{CompanionDisplay, ModelEngine};
pub use world::{HostWorld, OwnerEvent, OwnerId, OwnerSnapshot, SimulatedWorld};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
