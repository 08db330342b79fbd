//! CLI subcommand implementations

use anyhow::Context;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use vela_core::gesture::HeadlessSurface;
use vela_core::{MediaSource, PlayerSession, PlayerState, SessionConfig};
use vela_engine::EngineOptions;
use vela_smb::{SmbConfig, SmbShare};

/// Open a session and print telemetry until end of file, Ctrl-C, or the
/// optional time limit.
pub async fn play(
    url: String,
    title: Option<String>,
    speed: Option<f64>,
    volume: Option<f64>,
    limit: u64,
    no_hwdec: bool,
) -> anyhow::Result<()> {
    let options = EngineOptions {
        hwdec: !no_hwdec,
        ..EngineOptions::default()
    };
    let adapter = vela_engine::create_adapter(&options).context(
        "failed to start the playback engine (build with --features mpv and install libmpv)",
    )?;

    let mut source = MediaSource::new(url);
    source.title = title.unwrap_or_default();

    println!("Opening: {}", source.url);
    let session = PlayerSession::open(
        source,
        SessionConfig::default(),
        adapter,
        Arc::new(HeadlessSurface::default()),
    )
    .await?;

    if let Some(factor) = speed {
        session.set_speed(factor).await?;
    }
    if let Some(level) = volume {
        session.set_volume(level).await?;
    }

    let mut telemetry = session.subscribe_telemetry();
    let mut state = session.subscribe_state();
    let started = Instant::now();

    println!("Playing... Press Ctrl+C to stop.");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow();
                println!("state: {current}");
                if current == PlayerState::Ended {
                    break;
                }
            }
            changed = telemetry.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = telemetry.borrow().clone();
                print!(
                    "\r{} / {}  {}  {:.2}x   ",
                    snapshot.position_text,
                    snapshot.duration_text,
                    snapshot.speed_text,
                    snapshot.speed_factor
                );
                let _ = std::io::stdout().flush();
            }
        }

        if limit > 0 && started.elapsed() >= Duration::from_secs(limit) {
            println!();
            break;
        }
    }

    let summary = session.close().await;
    println!(
        "Stopped at {} / {}",
        vela_core::telemetry::format_clock(summary.position_ms as f64 / 1000.0),
        vela_core::telemetry::format_clock(summary.duration_ms as f64 / 1000.0)
    );
    Ok(())
}

/// List one directory of an SMB share as text or JSON
pub fn smb_ls(
    host: String,
    share: String,
    path: String,
    username: String,
    password: String,
    domain: String,
    json: bool,
) -> anyhow::Result<()> {
    let config = SmbConfig {
        host,
        share,
        username,
        password,
        domain,
    };
    let share = SmbShare::connect(&config).context("SMB connection failed")?;

    if json {
        println!("{}", share.list_directory_json(&path)?);
        return Ok(());
    }

    let entries = share.list_directory(&path)?;
    for entry in &entries {
        let kind = if entry.is_directory { "<dir>" } else { "     " };
        let size = entry.size.map(format_size).unwrap_or_default();
        println!("{kind} {size:>10} {}", entry.name);
    }
    println!("{} entries", entries.len());
    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }
}
