pub mod owner;
pub mod events;
pub mod host;
pub mod sim;

pub use owner::{OwnerId, OwnerSnapshot, StanceFlags};
pub use events::{OwnerEvent, OwnerEventKind};
pub use host::{DisplaySpec, EntityHandle, HostWorld, WorldError};
pub use sim::{SimEntity, SimulatedWorld};
