mod app;
mod components;
mod config;
mod error;
mod event;
mod handler;
mod inventory;
mod logging;
mod theme;
mod tree;
mod tui;
mod ui;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::app::App;
use crate::config::{AppConfig, GeneralConfig, InventoryConfig, LoggingConfig, ThemeConfig};
use crate::event::{Event, EventHandler};
use crate::inventory::InventorySource;
use crate::tree::navigator::TreeNavigator;
use crate::tui::{install_panic_hook, Tui};

/// Browse a flat object-storage inventory as a folder tree.
#[derive(Parser, Debug)]
#[command(name = "invtree", version, about)]
struct Cli {
    /// Inventory to load: a URL, a Parquet file, or a directory holding dated inventories
    source: Option<String>,

    /// Folder to open first, e.g. "photos/2024"
    #[arg(long)]
    folder: Option<String>,

    /// Path to a config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Do not read size and date columns
    #[arg(long)]
    no_metadata: bool,

    /// Disable mouse capture
    #[arg(long)]
    no_mouse: bool,

    /// Color scheme: dark, light, or custom
    #[arg(long)]
    theme: Option<String>,

    /// Log level: error, warn, info, debug, or trace
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Flags as a partial config, merged on top of every config file.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            inventory: InventoryConfig {
                source: self.source.clone(),
                ..Default::default()
            },
            general: GeneralConfig {
                initial_folder: self.folder.clone(),
                mouse: self.no_mouse.then_some(false),
                fetch_metadata: self.no_metadata.then_some(false),
                ..Default::default()
            },
            logging: LoggingConfig {
                level: self.log_level.clone(),
                ..Default::default()
            },
            theme: ThemeConfig {
                scheme: self.theme.clone(),
                ..Default::default()
            },
        }
    }
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let cfg = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));

    let _log_guard = logging::init(&cfg.log_directory(), cfg.log_level())?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting invtree");

    let source = InventorySource::parse(cfg.source()).resolve(cfg.extension())?;
    let source_label = source.to_string();
    let (index, reader) = match inventory::load_index(&source, &cfg.columns()).await {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!(source = %source_label, error = %e, "inventory load failed");
            return Err(e);
        }
    };

    let navigator = TreeNavigator::new(index, cfg.initial_folder());
    let reader = cfg.fetch_metadata().then_some(reader);
    tracing::debug!(scheme = cfg.theme_scheme(), "resolving theme");
    let theme = theme::resolve_theme(&cfg.theme);
    let mut app = App::new(
        navigator,
        reader,
        source_label,
        cfg.link_prefix().to_string(),
        theme,
    );

    install_panic_hook();

    let mut tui = Tui::new(cfg.mouse_enabled())?;
    let mut events = EventHandler::new(Duration::from_millis(16));
    let event_tx = events.sender();

    if let Some(job) = app.navigated() {
        job.spawn(event_tx.clone());
    }

    let result = run(&mut tui, &mut app, &mut events, &event_tx).await;
    tui.restore()?;
    tracing::info!("exiting");
    result
}

async fn run(
    tui: &mut Tui,
    app: &mut App,
    events: &mut EventHandler,
    event_tx: &tokio::sync::mpsc::UnboundedSender<Event>,
) -> error::Result<()> {
    while !app.should_quit {
        tui.draw(app)?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(app, key, event_tx),
            Event::Mouse(mouse) => handler::handle_mouse_event(app, mouse, event_tx),
            Event::MetadataLoaded(update) => app.handle_metadata(update),
            Event::Tick => {}
            Event::Resize(_, _) => {}
        }
    }
    Ok(())
}
