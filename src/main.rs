mod app;
mod channel;
mod cli;
mod event;
mod input;
mod keys;
mod logging;
mod settings;
mod storage;
mod theme;
mod tui;
mod viewport;
mod views;
mod widgets;

#[cfg(test)]
mod test_utils;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ratatui::layout::Rect;

use app::{App, AppConfig};
use channel::{FirebaseChannel, LocalChannel, Location, MessageChannel};
use cli::{Cli, Commands};
use event::{Event, EventHandler};
use settings::Settings;
use storage::{Storage, StorageLocation};
use theme::{Theme, ThemeVariant};
use tui::Tui;
use viewport::{ChatView, TerminalTitle};

const TICK_MS: u64 = 250;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Key {
        latitude,
        longitude,
    }) = &cli.command
    {
        println!("{}", Location::new(*latitude, *longitude).key());
        return Ok(());
    }
    run_tui(cli).await
}

fn load_settings(config_dir: Option<&PathBuf>) -> Settings {
    config_dir
        .map(|dir| {
            let path = settings::settings_path(dir);
            Settings::load(&path).unwrap_or_else(|e| {
                eprintln!("Warning: {e:#}");
                Settings::default()
            })
        })
        .unwrap_or_default()
}

// Priority: CLI flag > settings file > default
fn resolve_location(cli: &Cli, settings: &Settings) -> Location {
    let configured = settings.location();
    Location::new(
        cli.lat.unwrap_or(configured.latitude),
        cli.lon.unwrap_or(configured.longitude),
    )
}

fn resolve_theme(cli: &Cli, settings: &Settings) -> Theme {
    let variant = if cli.light {
        ThemeVariant::Light
    } else {
        settings.theme.unwrap_or_default()
    };
    Theme::for_variant(variant)
}

fn open_channel(cli: &Cli, settings: &Settings) -> Result<Arc<dyn MessageChannel>> {
    if cli.offline {
        tracing::info!("offline: rooms are kept in memory");
        return Ok(Arc::new(LocalChannel::new()));
    }
    let url = cli
        .database_url
        .as_deref()
        .unwrap_or_else(|| settings.database_url());
    let channel = FirebaseChannel::new(url, settings.poll_interval())
        .with_context(|| format!("Failed to connect to {url}"))?;
    Ok(Arc::new(channel))
}

async fn remembered_username(storage: Option<&Storage>) -> String {
    let Some(storage) = storage else {
        return String::new();
    };
    match storage.username().await {
        Ok(name) => name.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read remembered username");
            String::new()
        }
    }
}

async fn run_tui(cli: Cli) -> Result<()> {
    let config_dir = settings::config_dir(cli.config_dir.as_ref());
    let settings = load_settings(config_dir.as_ref());

    let _log_guard = config_dir.as_ref().and_then(|dir| {
        match logging::init(&settings::log_dir(dir), cli.verbose) {
            Ok((guard, path)) => {
                if cli.verbose {
                    eprintln!("Logging to {}", path.display());
                }
                Some(guard)
            }
            Err(e) => {
                eprintln!("Logging disabled: {e:#}");
                None
            }
        }
    });

    let storage = config_dir.as_ref().and_then(|dir| {
        match Storage::open(StorageLocation::Path(settings::db_path(dir))) {
            Ok(s) => Some(s),
            Err(e) => {
                eprintln!("Storage disabled: {e}");
                tracing::warn!(error = %e, "storage disabled");
                None
            }
        }
    });

    let username = match &cli.username {
        Some(name) => name.clone(),
        None => remembered_username(storage.as_ref()).await,
    };
    let location = resolve_location(&cli, &settings);
    let channel = open_channel(&cli, &settings)?;
    tracing::info!(key = %location.key(), %location, "starting");

    let mut terminal = tui::init()?;
    let chat = ChatView::mount(
        Box::new(TerminalTitle::stdout(settings.title.clone())),
        settings.scroll_tolerance(),
    );
    let mut app = App::new(
        channel,
        chat,
        AppConfig {
            location,
            username,
            theme: resolve_theme(&cli, &settings),
            storage,
            config_dir,
        },
    );
    app.start();

    let mut events = EventHandler::new(TICK_MS);
    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    // Restore the title while the terminal is still ours.
    app.chat.unmount();
    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    loop {
        while let Ok(event) = app.event_rx.try_recv() {
            app.handle_channel_event(event);
        }

        let size = terminal.size()?;
        app.layout(Rect::new(0, 0, size.width, size.height));
        terminal.draw(|frame| views::render(frame, app))?;

        if app.should_quit {
            break;
        }

        tokio::select! {
            event = events.next() => match event? {
                Event::Key(key) => {
                    if let Some(msg) = keys::handle_key(key) {
                        app.update(msg);
                    }
                }
                Event::Mouse(mouse) => {
                    if let Some(msg) = keys::handle_mouse(mouse) {
                        app.update(msg);
                    }
                }
                Event::Resize | Event::Tick => {}
            },
            Some(event) = app.event_rx.recv() => {
                app.handle_channel_event(event);
            }
        }
    }
    Ok(())
}
