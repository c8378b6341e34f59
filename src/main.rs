use std::path::PathBuf;
use std::sync::Arc;

use eyre::{Result, WrapErr};
use log::{debug, info};

mod cli;

use cli::{Cli, Command};
use ytsum::config::Config;
use ytsum::transcript::TranscriptService;
use ytsum::youtube::YouTubeProvider;

/// Route `log` output to the append-only file at [`log_path`]
fn setup_logging() -> Result<()> {
    let path = log_path();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).wrap_err_with(|| format!("creating log directory {}", dir.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .wrap_err_with(|| format!("opening log file {}", path.display()))?;

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();

    info!("ytsum {} logging to {}", env!("GIT_DESCRIBE"), path.display());
    Ok(())
}

fn log_path() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("ytsum").join("logs").join("ytsum.log")
}

fn build_after_help() -> String {
    let log_path = log_path();
    let config_path = ytsum::config::config_path();

    format!(
        "\nConfig is read from: {}\nLogs are written to: {}",
        config_path.display(),
        log_path.display()
    )
}

/// Everything with side effects that must happen before any route exists
fn startup(cli: &Cli) -> Result<(Config, TranscriptService)> {
    setup_logging()?;

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    debug!("Loaded config: {config:?}");

    let provider = YouTubeProvider::with_timeout(config.request_timeout()).wrap_err("building HTTP client")?;
    let service = TranscriptService::new(Arc::new(provider));

    Ok((config, service))
}

#[tokio::main]
async fn main() -> Result<()> {
    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    let (mut config, service) = startup(&cli)?;

    match cli.command {
        Command::Serve {
            host,
            port,
            static_dir,
            well_known_dir,
        } => {
            // CLI flags take priority over the config file
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(dir) = static_dir {
                config.static_dir = dir;
            }
            if let Some(dir) = well_known_dir {
                config.well_known_dir = dir;
            }

            if cli.verbose {
                eprintln!("Listening on http://{}", config.bind_addr());
                eprintln!("Plugin manifest: {}", config.well_known_dir.display());
            }

            ytsum::server::serve(&config, service).await
        }
        Command::Transcript { url, langs, summary } => {
            let languages = if langs.is_empty() { config.languages.clone() } else { langs };

            if cli.verbose {
                eprintln!("Languages: {}", languages.join(", "));
            }

            let text = service.get_transcript(&url, &languages).await?;
            let rendered = if summary {
                ytsum::summary::truncate_words(&text, config.summary_words)
            } else {
                text
            };

            println!("{rendered}");
            Ok(())
        }
    }
}
