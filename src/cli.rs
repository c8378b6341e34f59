use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ytsum",
    about = "YouTube transcript summary plugin server",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Config file (default: ~/.config/ytsum/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print progress and settings to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory holding logo.png
        #[arg(long)]
        static_dir: Option<PathBuf>,

        /// Directory served under /.well-known (must contain ai-plugin.json)
        #[arg(long)]
        well_known_dir: Option<PathBuf>,
    },

    /// Fetch one transcript and print it
    Transcript {
        /// YouTube video URL
        url: String,

        /// Preferred caption language, repeat for fallbacks (default: ru, en)
        #[arg(short, long = "lang")]
        langs: Vec<String>,

        /// Print only the first words, as /summary does
        #[arg(short, long)]
        summary: bool,
    },
}
