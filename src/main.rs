//! Crossing Lanes Demo
//!
//! Drives a scripted character through a generated map and logs what the
//! generator produces. Pass a JSON config path as the first argument to
//! override the defaults.

use anyhow::{Context, Result};
use tracing::{info, debug};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crossing_lanes::{
    FixedVec2, TileCoord, TICK_RATE, VERSION,
    map::{
        DeathCause, DefaultCatalog, JumpTarget, MapConfig, MapEvent, MapManager, MapSinks, MapSkin,
    },
};

/// Rows the scripted character walks forward.
const DEMO_ROWS: i32 = 250;

/// Ticks spent on each row before stepping.
const TICKS_PER_ROW: u32 = 20;

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Crossing Lanes v{}", VERSION);

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config {path}"))?;
            MapConfig::from_json(&json).with_context(|| format!("invalid config {path}"))?
        }
        None => MapConfig::default(),
    };

    info!("Seed: {}", config.seed);
    info!("Window: {} lanes, lookahead {}", config.active_lane_count, config.min_rows_ahead);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let first = demo_run(&config, MapSkin::Classic)?;

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let replay = demo_run(&config, MapSkin::Classic)?;
    if first == replay {
        info!("Determinism verified: hashes match");
    } else {
        anyhow::bail!(
            "replay diverged: {} != {}",
            hex::encode(first),
            hex::encode(replay)
        );
    }

    Ok(())
}

/// Walk a character forward, sidestepping anything that is not solid ground.
fn demo_run(config: &MapConfig, skin: MapSkin) -> Result<[u8; 32]> {
    info!("=== Starting Demo Run ({}) ===", skin.name());

    let mut map = MapManager::new(config.clone(), Box::new(DefaultCatalog), MapSinks::default())?;
    if skin != map.skin() {
        map.create_new_map(skin)?;
    }

    map.initialize_character_reference(FixedVec2::ZERO);
    let activation = map.activate_map();
    info!("Activated {} lanes ({} to {})", activation.lanes_created, map.lowest_row(), map.highest_row());

    let mut column = 0;
    let mut sets = 0;
    let mut coins = 0;
    let mut lanes = activation.lanes_created;

    'walk: for row in 1..=DEMO_ROWS {
        // Prefer straight ahead, then the nearest open column
        let target = (0..=8)
            .flat_map(|offset| [column + offset, column - offset])
            .find(|&candidate| matches!(map.jump_target(TileCoord::new(row, candidate)), JumpTarget::Ground | JumpTarget::Platform(_)));

        let Some(next_column) = target else {
            let position = TileCoord::new(row, column).center();
            let request = map.notify_death(DeathCause::Drowned, position);
            info!("No way forward at row {}: camera {:?}", row, request.behavior);
            break 'walk;
        };
        column = next_column;

        for _ in 0..TICKS_PER_ROW {
            let result = map.update(TileCoord::new(row, column).center());
            lanes += result.lanes_created;

            for event in &result.events {
                match event {
                    MapEvent::LaneSetStarted { kind, start_row, target_count } => {
                        sets += 1;
                        debug!("Set {:?} at row {} ({} lanes)", kind, start_row, target_count);
                    }
                    MapEvent::CoinCollected { total, .. } => coins = *total,
                    _ => {}
                }
            }
        }

        if row % 50 == 0 {
            info!("Row {}: window {}..={}, {} sets so far", row, map.lowest_row(), map.highest_row(), sets);
        }
    }

    info!("=== Run Results ===");
    info!("Best row: {}", map.highest_reached_row());
    info!("Lanes created: {}", lanes);
    info!("Coins: {}", coins);
    info!("Pool wraps onto live records: {}", map.pools().live_reuse_count());

    let hash = map.map_hash();
    info!("Final Map Hash: {}", hex::encode(hash));

    Ok(hash)
}
