//! DishaNav daemon: simulated robot, navigation loop and status page

use std::env;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use disha_nav::config::{Config, NavigationMode};
use disha_nav::credentials::EepromCredentialStore;
use disha_nav::devices::sim::Simulation;
use disha_nav::error::{Error, Result};
use disha_nav::network::NetworkManager;
use disha_nav::status::StatusServer;
use disha_nav::{NavigationCycle, ScanCycle, SharedMap};

const DEFAULT_CONFIG: &str = "disha.toml";

/// Parse config path from command line arguments.
///
/// Supports `disha-nav <path>`, `disha-nav --config <path>` and
/// `disha-nav -c <path>`. Returns None when no path was given.
fn parse_config_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }

    args.get(1).filter(|a| !a.starts_with('-')).cloned()
}

fn load_config() -> Result<(Config, String)> {
    match parse_config_path() {
        Some(path) => Ok((Config::load(&path)?, path)),
        None if Path::new(DEFAULT_CONFIG).exists() => {
            Ok((Config::load(DEFAULT_CONFIG)?, DEFAULT_CONFIG.to_string()))
        }
        None => Ok((Config::default(), "built-in defaults".to_string())),
    }
}

fn main() -> Result<()> {
    let (config, source) = load_config()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("DishaNav v{} starting...", env!("CARGO_PKG_VERSION"));
    log::info!("Using config: {}", source);

    let sim = Simulation::new(&config.simulation, &config.robot);

    // Network bring-up happens before navigation starts, so the credential
    // store is never touched while the cycle runs
    let store = EepromCredentialStore::open(
        &config.storage.credentials_path,
        config.storage.image_size,
    )?;
    let mut network = NetworkManager::new(
        config.network.clone(),
        Box::new(sim.link()),
        Box::new(store),
    );
    let mode = network.bring_up()?.clone();
    log::info!("Network: {:?}", mode);
    let network = Arc::new(Mutex::new(network));

    let map = Arc::new(SharedMap::new(config.map.capacity));

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let server = StatusServer::start(
        &config.network.http_bind,
        Arc::clone(&map),
        Some(network),
        Arc::clone(&running),
    )?;

    // Spin mode keeps the sensor fixed and turns the whole chassis instead
    let mut scanner = ScanCycle::new(config.scan.clone(), Box::new(sim.range_sensor()));
    if config.navigation.mode == NavigationMode::Stepped {
        scanner = scanner.with_sweep(Box::new(sim.sweep_mount()));
    }
    let mut navigation =
        NavigationCycle::new(&config, scanner, Box::new(sim.drive()), Arc::clone(&map))?;

    let nav_running = Arc::clone(&running);
    let nav_handle = thread::Builder::new()
        .name("navigation".to_string())
        .spawn(move || {
            let cycles = navigation.run(&nav_running);
            // max_cycles reached: take the status server down with us
            nav_running.store(false, Ordering::Relaxed);
            cycles
        })?;

    log::info!("DishaNav running. Press Ctrl-C to stop.");

    let cycles = nav_handle
        .join()
        .map_err(|_| Error::Other("navigation thread panicked".to_string()))?;
    server.join();

    let snapshot = map.snapshot();
    let truth = sim.true_pose();
    log::info!(
        "Finished after {} cycles: pose ({:.1}, {:.1}, {:.1}°), {} obstacles ({} evicted)",
        cycles,
        snapshot.pose.x,
        snapshot.pose.y,
        snapshot.pose.heading_deg,
        snapshot.obstacle_count,
        snapshot.evicted
    );
    log::info!(
        "Simulated chassis ended at ({:.1}, {:.1}, {:.1}°) in the room",
        truth.x,
        truth.y,
        truth.heading_deg
    );

    Ok(())
}
