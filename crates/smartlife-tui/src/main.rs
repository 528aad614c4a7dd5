use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use smartlife_core::{BackendClient, Config, Settings};
use tracing::info;

mod app;
mod commands;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "smartlife", version)]
#[command(about = "Terminal chat client for the Smart Life knowledge backend")]
struct Cli {
    /// Backend base URL
    #[arg(long, env = "SMARTLIFE_BASE_URL")]
    base_url: Option<String>,

    /// User id sent with knowledge and chat requests
    #[arg(long, env = "SMARTLIFE_USER_ID")]
    user_id: Option<String>,

    /// Name shown for your messages
    #[arg(long, env = "SMARTLIFE_USER_NAME")]
    user_name: Option<String>,

    /// Per-request timeout in seconds (default: wait forever)
    #[arg(long)]
    timeout: Option<u64>,

    /// Config file (default: <config dir>/smartlife/config.json)
    #[arg(long, env = "SMARTLIFE_CONFIG")]
    config: Option<PathBuf>,

    /// Log file (default: <data dir>/smartlife/smartlife.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List category tabs
    Categories,
    /// List preset questions for a category
    Questions {
        category_id: String,
    },
    /// Fetch the knowledge-backed answer for a preset question
    Ask {
        knowledge_id: String,
    },
    /// Send one free-text message
    Chat {
        prompt: String,
    },
    /// Show resolved settings
    Config {
        /// Write a config file with the defaults if none exists
        #[arg(long)]
        init: bool,
    },
}

impl Cli {
    /// Flag values as a config layer
    fn overrides(&self) -> Config {
        Config {
            base_url: self.base_url.clone(),
            user_id: self.user_id.clone(),
            user_name: self.user_name.clone(),
            assistant_name: None,
            request_timeout_secs: self.timeout,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    let settings = Config::load_from(&config_path)?
        .merge(cli.overrides())
        .resolve();

    logging::init_with_fallback(
        cli.log_file.as_deref(),
        logging::default_log_path(),
        cli.verbose,
    )?;
    info!(base_url = %settings.base_url, user_id = %settings.user_id, "starting");

    let client = match settings.request_timeout {
        Some(timeout) => BackendClient::with_timeout(&settings.base_url, &settings.user_id, timeout)?,
        None => BackendClient::new(&settings.base_url, &settings.user_id),
    };

    match cli.command {
        None => run_tui(&client, &settings).await,
        Some(Commands::Categories) => commands::list_categories(&client).await,
        Some(Commands::Questions { category_id }) => {
            commands::list_questions(&client, &category_id).await
        }
        Some(Commands::Ask { knowledge_id }) => {
            commands::ask_knowledge(&client, &settings, &knowledge_id).await
        }
        Some(Commands::Chat { prompt }) => commands::chat_once(&client, &settings, &prompt).await,
        Some(Commands::Config { init }) => commands::show_config(&config_path, &settings, init),
    }
}

async fn run_tui(client: &BackendClient, settings: &Settings) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut events = EventHandler::new();
    let mut app = App::new(settings);

    // Category loader fires once at startup
    let request = app.session.start();
    events.dispatch(client, request);

    let result = run_loop(&mut terminal, &mut app, &mut events, client).await;

    tui::restore()?;
    info!("exiting");
    result
}

async fn run_loop(
    terminal: &mut Tui,
    app: &mut App,
    events: &mut EventHandler,
    client: &BackendClient,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        if let Some(request) = handler::handle_event(app, event) {
            events.dispatch(client, request);
        }
    }
    Ok(())
}
