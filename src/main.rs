mod app;
mod components;
mod config;
mod error;
mod event;
mod fs;
mod handler;
mod render;
mod theme;
mod tui;
mod ui;

use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::app::App;
use crate::config::AppConfig;
use crate::event::{Event, EventHandler};
use crate::tui::{install_panic_hook, Tui};

/// A progressive markdown tree viewer for the terminal.
#[derive(Parser, Debug)]
#[command(name = "mdt", version, about)]
struct Cli {
    /// Directory to browse or markdown file to view (defaults to current
    /// directory)
    path: Option<PathBuf>,

    /// Include files and directories matched by .gitignore
    #[arg(short, long)]
    include_ignored: bool,
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let settings = AppConfig::load().resolve();

    let mut events = EventHandler::new(Duration::from_millis(16));
    let event_tx = events.sender();

    // Pick the session from how we were invoked: piped input, a file
    // argument, or a directory to browse.
    let mut app = if !std::io::stdin().is_terminal() && cli.path.is_none() {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        App::new_piped(text, settings.clone(), event_tx)
    } else {
        let path = cli.path.unwrap_or_else(|| PathBuf::from("."));
        let path = path.canonicalize().map_err(|_| {
            error::AppError::InvalidPath(format!("{} does not exist", path.display()))
        })?;
        if path.is_dir() {
            App::new_dual(path, cli.include_ignored, settings.clone(), event_tx)
        } else {
            App::new_document(path, settings.clone(), event_tx)
        }
    };

    install_panic_hook();
    let mut tui = Tui::new(settings.mouse)?;

    let (width, height) = tui.size()?;
    app.width = width;
    app.height = height;
    app.start();

    loop {
        tui.terminal_mut().draw(|frame| {
            ui::render(&mut app, frame);
        })?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key),
            Event::Mouse(mouse) => handler::handle_mouse_event(&mut app, mouse),
            Event::Tick => {}
            Event::Resize(w, h) => app.resize(w, h),
            Event::ScanComplete { depth, tree } => app.handle_scan_complete(depth, tree),
            Event::Deepen => app.handle_deepen(),
            Event::ContentReady { path, text, lines } => {
                app.handle_content_ready(path, text, lines)
            }
        }

        if app.should_quit {
            break;
        }
    }

    tui.restore()?;
    Ok(())
}
