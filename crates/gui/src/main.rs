use anyhow::{Context, Result};
use std::{
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
    sync::{Arc, LazyLock, PoisonError, RwLock},
};
use tracing::{error, info};

use app::App;
use clap::Parser;
use common::network::NetworkClient;
use iced::Theme;
use settings::keymap::Config;
use tracing_subscriber::EnvFilter;
use url::Url;

mod alert;
mod app;
mod chart;
mod icons;
mod records;
mod settings;
mod timer;
mod upload;

const DARK_THEME: Theme = Theme::TokyoNight;
const LIGHT_THEME: Theme = Theme::Light;
const DEFAULT_LOG_FILTER: &str = "stockledger=info,common=info";

static CONFIG: LazyLock<RwLock<Config>> = LazyLock::new(|| RwLock::new(Config::default()));

#[derive(Parser, Debug)]
#[command(
    version,
    name = "Stock Ledger",
    about = "Browse inventory records and import stock sheets from an inventory server."
)]
struct Args {
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Overrides the server set in the config file.
    #[arg(long, short)]
    server: Option<Url>,
}

fn init_logging() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let subscriber = tracing_subscriber::fmt()
        .with_writer(io::stdout)
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Could not read config {}", path.display()))?;
    Config::from_str(&source).with_context(|| format!("Invalid config {}", path.display()))
}

fn main() -> Result<()> {
    init_logging()?;

    let args = Args::parse();
    if let Some(path) = &args.config {
        match load_config(path) {
            Ok(config) => *CONFIG.write().unwrap_or_else(PoisonError::into_inner) = config,
            Err(e) => error!("{:#}, using the default config", e),
        }
    }

    let (server, progress, dark_mode) = {
        let mut config = CONFIG.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(server) = args.server {
            config.server = server;
        }
        (config.server.clone(), config.progress, config.dark_mode)
    };

    info!("Using inventory server {}", server);
    let network = Arc::new(NetworkClient::new(server)?);

    iced::application(
        move || App::boot(network.clone(), progress, dark_mode),
        App::update,
        App::view,
    )
    .antialiasing(true)
    .window_size((1200.0, 800.0))
    .theme(theme)
    .subscription(App::subscription)
    .exit_on_close_request(false)
    .title("Stock Ledger")
    .run()?;
    Ok(())
}

pub fn theme(app: &App) -> Theme {
    match app.dark_mode {
        true => DARK_THEME,
        false => LIGHT_THEME,
    }
}
