//! Vela CLI - headless playback driver and SMB share browser
//!
//! `vela play` opens a real player session through the mpv adapter and
//! prints telemetry ticks; `vela smb-ls` lists a directory on an SMB share.

use clap::{Parser, Subcommand};

mod commands;

/// Vela player toolkit
#[derive(Parser)]
#[command(name = "vela")]
#[command(version)]
#[command(about = "Vela player toolkit", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a URL through the engine adapter, printing telemetry ticks
    Play {
        /// Media URL or file path
        url: String,

        /// Title shown in logs
        #[arg(short, long)]
        title: Option<String>,

        /// Playback speed factor
        #[arg(long)]
        speed: Option<f64>,

        /// Engine output volume (0-100)
        #[arg(long)]
        volume: Option<f64>,

        /// Stop after this many seconds (0 = play to the end)
        #[arg(long, default_value = "0")]
        limit: u64,

        /// Disable hardware decoding
        #[arg(long)]
        no_hwdec: bool,
    },

    /// List a directory on an SMB share
    SmbLs {
        /// Server host name or address
        host: String,

        /// Share name
        share: String,

        /// Share-relative directory
        #[arg(default_value = "/")]
        path: String,

        #[arg(short, long, default_value = "")]
        username: String,

        #[arg(short, long, default_value = "")]
        password: String,

        #[arg(short, long, default_value = "")]
        domain: String,

        /// Print the raw JSON listing
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(level).init();

    match cli.command {
        Commands::Play {
            url,
            title,
            speed,
            volume,
            limit,
            no_hwdec,
        } => commands::play(url, title, speed, volume, limit, no_hwdec).await,
        Commands::SmbLs {
            host,
            share,
            path,
            username,
            password,
            domain,
            json,
        } => commands::smb_ls(host, share, path, username, password, domain, json),
    }
}
