use std::fs::{self, OpenOptions};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;

use aiisel_chat::backend::{ChatBackend, HttpBackend};
use aiisel_chat::config::Config;
use aiisel_chat::widget::ChatWidget;
use app::App;

const DEFAULT_LOG_FILTER: &str = "aiisel_chat=info,aiisel=info";

#[derive(Parser)]
#[command(name = "aiisel")]
#[command(about = "Chat with the ISEL assistant from the terminal")]
#[command(version)]
struct Cli {
    /// Chat backend URL
    #[arg(long, global = true, env = "AIISEL_ENDPOINT")]
    endpoint: Option<String>,
    /// Give up on the backend after this many seconds (0 waits forever)
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat widget (default)
    Chat,
    /// Send a single message and print the reply
    Ask {
        /// Message to send
        #[arg(required = true)]
        message: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?.with_overrides(cli.endpoint, cli.timeout);

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            init_file_logging();
            run_chat(&config).await
        }
        Commands::Ask { message } => {
            init_stderr_logging();
            ask(&config, &message.join(" ")).await
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into())
}

/// The terminal belongs to the widget, so interactive sessions log to a file
fn init_file_logging() {
    let log_file = Config::config_dir().and_then(|dir| {
        fs::create_dir_all(&dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("aiisel.log"))?;
        Ok(file)
    });

    // Without a usable log location the session simply runs unlogged
    if let Ok(file) = log_file {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

fn build_backend(config: &Config) -> Result<Arc<dyn ChatBackend>> {
    let backend = match config.request_timeout() {
        Some(timeout) => HttpBackend::with_timeout(config.endpoint(), timeout)?,
        None => HttpBackend::new(config.endpoint()),
    };
    Ok(Arc::new(backend))
}

async fn run_chat(config: &Config) -> Result<()> {
    let backend = build_backend(config)?;
    tracing::info!(endpoint = %config.endpoint(), "starting chat widget");

    let mut session = tui::TerminalSession::enter()?;
    let mut events = tui::EventHandler::new();
    let mut app = App::new(backend, events.sender());

    let result = run_event_loop(&mut session.terminal, &mut app, &mut events).await;

    drop(session);
    tracing::info!(messages = app.widget.conversation().len(), "chat widget closed");
    result
}

async fn run_event_loop(
    terminal: &mut tui::Tui,
    app: &mut App,
    events: &mut tui::EventHandler,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}

async fn ask(config: &Config, message: &str) -> Result<()> {
    let backend = build_backend(config)?;
    let mut widget = ChatWidget::new();

    widget.send(backend.as_ref(), message).await;

    // Blank messages are ignored and leave only the greeting behind
    if widget.conversation().len() > 1 {
        println!("{}", widget.conversation().last().text);
    }
    Ok(())
}
