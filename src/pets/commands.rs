//! Skin selection commands, after argument parsing and permission checks.
//!
//! The functions here only update [`SkinSelections`] and build feedback
//! text. Refreshing the affected companion is left to the caller, which owns
//! the display.

use crate::config::{Registry, SkinDefinition};
use crate::pets::selection::{SkinSelections, StoreError};
use crate::world::{HostWorld, OwnerId};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Who issued a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSender {
    Console,
    /// A connected owner. Operators may act on other owners.
    Owner { id: OwnerId, operator: bool },
}

impl CommandSender {
    fn may_target_others(&self) -> bool {
        match self {
            CommandSender::Console => true,
            CommandSender::Owner { operator, .. } => *operator,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Invalid skin: {0}")]
    UnknownSkin(String),

    #[error("Player {0} not found or offline!")]
    PlayerNotFound(String),

    #[error("{}", no_skin_message(.player.as_deref()))]
    NoSkinActive { player: Option<String> },

    #[error("Usage from console: {usage}")]
    ConsoleNeedsTarget { usage: &'static str },
}

fn no_skin_message(player: Option<&str>) -> String {
    match player {
        Some(player) => format!("{} doesn't have an active skin!", player),
        None => "You don't have an active skin!".to_string(),
    }
}

/// Result of a successful skin command.
#[derive(Debug, Clone)]
pub struct SkinOutcome {
    /// Owner whose companion should be refreshed.
    pub target: OwnerId,
    pub skin: Arc<SkinDefinition>,
    /// Message for the sender.
    pub feedback: String,
    /// Message for the target when someone else issued the command.
    pub target_feedback: Option<String>,
}

struct Target {
    id: OwnerId,
    name: String,
    by_other: bool,
}

fn resolve_target(
    sender: CommandSender,
    target_name: Option<&str>,
    world: &dyn HostWorld,
    usage: &'static str,
) -> Result<Target, CommandError> {
    if let Some(name) = target_name.filter(|_| sender.may_target_others()) {
        let id = world
            .find_owner(name)
            .ok_or_else(|| CommandError::PlayerNotFound(name.to_string()))?;
        let name = world.owner(id).map(|o| o.name).unwrap_or_else(|| name.to_string());
        return Ok(Target { id, name, by_other: true });
    }
    match sender {
        CommandSender::Console => Err(CommandError::ConsoleNeedsTarget { usage }),
        CommandSender::Owner { id, .. } => {
            let name = world.owner(id).map(|o| o.name).unwrap_or_default();
            Ok(Target { id, name, by_other: false })
        }
    }
}

/// `skin set <skin> [player]`
pub fn set_skin(
    sender: CommandSender,
    skin_id: &str,
    target_name: Option<&str>,
    world: &dyn HostWorld,
    skins: &Registry<SkinDefinition>,
    selections: &mut SkinSelections,
) -> Result<SkinOutcome, CommandError> {
    let skin = skins
        .get(skin_id)
        .ok_or_else(|| CommandError::UnknownSkin(skin_id.to_string()))?;
    let target = resolve_target(sender, target_name, world, "skin set <skin> <player>")?;

    selections.set(target.id, &skin.id, skins).map_err(|e| match e {
        StoreError::UnknownSkin(id) => CommandError::UnknownSkin(id),
        _ => CommandError::UnknownSkin(skin_id.to_string()),
    })?;
    info!("Skin of {} set to '{}'", target.name, skin.id);

    let own = format!("Set skin to {}!", skin.display_name);
    Ok(if target.by_other {
        SkinOutcome {
            target: target.id,
            feedback: format!("Set skin {} for player {}!", skin.display_name, target.name),
            target_feedback: Some(own),
            skin,
        }
    } else {
        SkinOutcome {
            target: target.id,
            feedback: own,
            target_feedback: None,
            skin,
        }
    })
}

/// `skin remove [player]`
pub fn remove_skin(
    sender: CommandSender,
    target_name: Option<&str>,
    world: &dyn HostWorld,
    skins: &Registry<SkinDefinition>,
    selections: &mut SkinSelections,
) -> Result<SkinOutcome, CommandError> {
    let target = resolve_target(sender, target_name, world, "skin remove <player>")?;
    let Some(skin) = selections.active_skin(target.id, skins) else {
        return Err(CommandError::NoSkinActive {
            player: target.by_other.then(|| target.name.clone()),
        });
    };

    selections.remove(target.id);
    info!("Skin '{}' removed from {}", skin.id, target.name);

    let own = format!("Removed skin {}!", skin.display_name);
    Ok(if target.by_other {
        SkinOutcome {
            target: target.id,
            feedback: format!("Removed skin {} from player {}!", skin.display_name, target.name),
            target_feedback: Some(own),
            skin,
        }
    } else {
        SkinOutcome {
            target: target.id,
            feedback: own,
            target_feedback: None,
            skin,
        }
    })
}
