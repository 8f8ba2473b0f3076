//! CapyLauncher - app catalog service for the Capy desktop
//!
//! Single-threaded event loop: backend events, catalog timers and the debug
//! console all run on one current-thread runtime.

mod console;
mod services;

use capy_apps::{
    DesktopInventory, IconTheme, InventoryDirs, XdgAutostart, get_autostart_directories,
    get_config_path, get_state_directory,
};
use capy_catalog::events::drain;
use capy_catalog::ordering::system_locale;
use capy_catalog::persist::JsonStore;
use capy_catalog::{AppCatalog, BackendEvent, CatalogConfig, CatalogServices, CatalogStorage};
use console::Command;
use log::{debug, info, warn};
use std::error::Error;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio::time::Instant;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Starting CapyLauncher {}...", VERSION);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(run())
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config_path = get_config_path();
    let config = CatalogConfig::load(&config_path);
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Cannot write default config {}: {}", config_path.display(), e);
        }
    }

    let state_dir = get_state_directory();
    let (tx, rx) = unbounded_channel::<BackendEvent>();

    let inventory = Arc::new(DesktopInventory::new(
        InventoryDirs::from_environment(),
        JsonStore::open(state_dir.join("new_installs.json")),
        tx.clone(),
    ));
    let icons = Arc::new(IconTheme::new());
    icons.build_index();
    let autostart_dirs = get_autostart_directories();

    let backends = CatalogServices {
        inventory: Box::new(inventory.clone()),
        session: Box::new(XdgAutostart::new(autostart_dirs.clone())),
        icons: Box::new(icons.clone()),
    };
    let storage = CatalogStorage::in_dir(&state_dir, config.icon_cache_enabled);
    let locale = system_locale();
    debug!("Locale: {:?}", locale);

    let mut catalog = AppCatalog::new(&config, backends, storage, VERSION, locale.as_deref());
    if let Err(e) = catalog.load_from_backend() {
        warn!("Starting with an empty catalog: {}", e);
    }

    let status = services::start_all(inventory, icons, &autostart_dirs, tx);
    info!(
        "Watching apps: {}, autostart: {}, icons: {}",
        status.watching_apps, status.watching_autostart, status.watching_icons
    );

    println!("{}", console::run(&mut catalog, Command::List(capy_catalog::View::All)));
    event_loop(&mut catalog, rx).await;

    info!("CapyLauncher stopped");
    Ok(())
}

async fn event_loop(catalog: &mut AppCatalog, mut backend: UnboundedReceiver<BackendEvent>) {
    let mut notifications = catalog.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        let deadline = catalog.next_deadline().map(Instant::from_std);

        tokio::select! {
            Some(event) = backend.recv() => {
                debug!("Backend event: {:?}", event);
                catalog.handle_event(event);
            }
            _ = sleep_until(deadline) => {
                catalog.poll_timers(std::time::Instant::now());
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match console::parse(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => println!("{}", console::run(catalog, command)),
                    Ok(None) => {}
                    Err(e) => println!("{e}"),
                },
                Ok(None) => {
                    debug!("stdin closed, console disabled");
                    stdin_open = false;
                }
                Err(e) => {
                    warn!("stdin error: {}", e);
                    stdin_open = false;
                }
            },
            else => break,
        }

        for event in drain(&mut notifications) {
            info!("{}", console::describe(&event));
        }
    }
}

/// Sleep until `deadline`, or forever when no timer is pending.
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
