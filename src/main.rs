use anyhow::Context;
use glam::Vec3;
use pet_companion::config::{load_display_settings, DefinitionSet};
use pet_companion::pets::{CommandSender, FileSelectionStore, MemorySelectionStore, ModelSpec, ScriptedEngine, SelectionStore};
use pet_companion::utils::logging::init_logging;
use pet_companion::world::StanceFlags;
use pet_companion::{CompanionApp, OwnerEvent, OwnerId, OwnerSnapshot, SimulatedWorld, APP_NAME, VERSION};
use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

const DEFAULT_TICKS: u64 = 200;

const DEFINITIONS: &str = r#"
[[pet]]
id = "fox"
name = "Fox"
level_curve = "standard"
texture = "eyJ0ZXh0dXJlcyI6eyJTS0lOIjp7InVybCI6ImZveCJ9fX0="

[[pet]]
id = "dragon"
name = "Dragon"
level_curve = "steep"
texture = "modelengine:dragon_model"

[[skin]]
id = "ember"
display_name = "Ember Fox"
texture = "eyJlbWJlciI6dHJ1ZX0="
model_id = "ember_fox"
use_model_engine = true
use_custom_animations = true

[skin.animations]
walking = "walk"
sprinting = "run"
flying = "fly"
"#;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging(Some(Path::new("log.txt"))).context("Failed to initialize logging")?;
    info!("{} v{} starting", APP_NAME, VERSION);

    let ticks = match env::args().nth(1) {
        Some(arg) => arg
            .parse::<u64>()
            .with_context(|| format!("Invalid tick count: {}", arg))?,
        None => DEFAULT_TICKS,
    };

    let settings = load_display_settings().unwrap_or_else(|e| {
        warn!("Falling back to default settings: {}", e);
        Default::default()
    });
    let definitions = DefinitionSet::from_toml_str(DEFINITIONS).context("Built-in definitions are invalid")?;

    let engine = Arc::new(
        ScriptedEngine::new()
            .with_model("dragon_model", ModelSpec::canonical("ActiveModel"))
            .with_model("ember_fox", ModelSpec::canonical("ActiveModel")),
    );
    let store: Box<dyn SelectionStore> = match FileSelectionStore::in_data_dir() {
        Some(store) => {
            info!("Skin selections stored at {:?}", store.path());
            Box::new(store)
        }
        None => Box::new(MemorySelectionStore::new()),
    };

    let tick_interval = Duration::from_millis(settings.tick_interval_ms.max(1));
    let mut app = CompanionApp::enable(settings, definitions, Some(engine.clone()), store);

    let mut world = SimulatedWorld::new();
    let alex = world.connect(OwnerSnapshot::new(OwnerId::new_v4(), "Alex", "overworld").with_pet("fox", 12));
    let sam = world.connect(OwnerSnapshot::new(OwnerId::new_v4(), "Sam", "overworld").with_pet("dragon", 3));

    if let Err(e) = app.set_skin(&mut world, CommandSender::Owner { id: alex, operator: false }, "ember", None) {
        warn!("{}", e);
    }

    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<OwnerEvent>();
    let mut interval = tokio::time::interval(tick_interval);
    let mut elapsed = 0u64;

    while elapsed < ticks {
        tokio::select! {
            Some(event) = events_rx.recv() => {
                app.handle_event(&mut world, &event);
            }
            _ = interval.tick() => {
                for event in script_step(&mut world, elapsed, alex, sam) {
                    // The receiver lives until the end of main.
                    let _ = events_tx.send(event);
                }
                app.tick(&mut world);
                elapsed += 1;
            }
        }
    }

    info!(
        "Ran {} ticks: {} companions live, {} spawned, {} models created",
        ticks,
        app.display().tracked_count(),
        world.spawned_total(),
        engine.created_models().len()
    );
    app.disable(&mut world);
    Ok(())
}

/// Drive the simulated owners through a repeating routine.
fn script_step(world: &mut SimulatedWorld, tick: u64, alex: OwnerId, sam: OwnerId) -> Vec<OwnerEvent> {
    let phase = tick % 120;
    let mut events = Vec::new();

    if let Some(owner) = world.owner_mut(alex) {
        owner.flags = match phase {
            20..=49 => StanceFlags::SPRINTING,
            80..=99 => StanceFlags::FLYING,
            _ => StanceFlags::empty(),
        };
        owner.velocity = if (10..60).contains(&phase) {
            Vec3::new(0.2, 0.0, 0.1)
        } else {
            Vec3::ZERO
        };
        owner.eye_position += owner.velocity;
        owner.look_direction = Vec3::new((tick as f32 * 0.05).sin(), -0.2, (tick as f32 * 0.05).cos());
    }

    match phase {
        60 => events.extend(world.teleport(sam, Vec3::new(100.0, 64.0, -40.0))),
        110 => events.extend(world.change_world(sam, "nether")),
        115 => events.extend(world.change_world(sam, "overworld")),
        _ => {}
    }
    events
}
