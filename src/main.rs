use anyhow::{Context, Result};
use clap::Parser;
use matrix_composer::cli::{Cli, Command, PanelAction, WifiAction};
use matrix_composer::config::SessionConfig;
use matrix_composer::core::{FixedInterval, FrameIterator};
use matrix_composer::glyph::FontBook;
use matrix_composer::preview::{save_png, TerminalPreview};
use matrix_composer::scheduler::{ContentMode, PreviewController, SessionState};
use matrix_composer::upload::{DeviceClient, Dispatcher, HttpLink, WifiStatus};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

// === Constants ===

const PREVIEW_HZ: f64 = 60.0;
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);
const RATE_LOG_MS: f64 = 1000.0;

fn load_config(cli: &Cli) -> Result<SessionConfig> {
    let mut config = match &cli.session {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(url) = &cli.device {
        config.device.url = Some(url.clone());
    }
    Ok(config)
}

fn load_fonts(config: &SessionConfig) -> FontBook {
    let mut fonts = FontBook::new();
    for entry in &config.fonts {
        fonts.register_file(&entry.family, &entry.path);
    }
    fonts
}

fn device_client(config: &SessionConfig) -> Option<DeviceClient> {
    let url = config.device.url.as_deref()?;
    let link = HttpLink::new(url, Duration::from_millis(config.device.timeout_ms));
    Some(DeviceClient::new(Arc::new(link)))
}

fn require_client(config: &SessionConfig) -> Result<DeviceClient> {
    device_client(config).context("no device URL; pass --device or set device.url")
}

fn controller(config: SessionConfig) -> Result<PreviewController> {
    let fonts = load_fonts(&config);
    let dispatcher = device_client(&config).map(Dispatcher::new);
    let mut session = SessionState::new(config);
    session.load_resources(&fonts)?;
    Ok(PreviewController::new(session, fonts, dispatcher))
}

fn run_preview(
    config: SessionConfig,
    mode: ContentMode,
    seconds: f64,
    out: Option<PathBuf>,
    terminal: bool,
) -> Result<()> {
    let mut ctl = controller(config)?;
    ctl.activate(mode)?;

    let mut term = terminal.then(TerminalPreview::new);
    let mut last = None;
    let limit_ms = seconds.max(0.0) * 1000.0;
    let stdout = io::stdout();
    let mut rate_log = FixedInterval::new(RATE_LOG_MS);
    let mut drawn = 0u32;

    for tick in FrameIterator::with_rate(PREVIEW_HZ) {
        if limit_ms > 0.0 && tick.time_ms >= limit_ms {
            break;
        }
        if let Some(frame) = ctl.tick(tick.time_ms) {
            if let Some(term) = term.as_mut() {
                term.draw(&frame, &mut stdout.lock())?;
            }
            last = Some(frame);
            drawn += 1;
        }
        if rate_log.tick(tick.delta_ms) {
            log::debug!("{drawn} preview frames in the last second");
            drawn = 0;
        }
    }

    ctl.deactivate();
    if let Some(dispatcher) = ctl.dispatcher() {
        if !dispatcher.wait_idle(DRAIN_TIMEOUT) {
            log::warn!("last upload still running at exit");
        }
        log::info!(
            "{} uploads started, {} failed",
            dispatcher.started(),
            dispatcher.failed()
        );
    }

    if let (Some(path), Some(frame)) = (out, last) {
        save_png(&frame, &path)?;
        println!("Saved {}", path.display());
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(&cli)?;
    match cli.command {
        Command::Preview { mode, seconds, out, terminal } => {
            run_preview(config, mode.into(), seconds, out, terminal)
        }
        Command::Apply => {
            let mut ctl = controller(config)?;
            ctl.apply_text().context("Upload failed")?;
            println!("Applied");
            Ok(())
        }
        Command::Theme { path } => {
            if path.is_some() {
                config.theme.path = path;
            }
            let ctl = controller(config)?;
            ctl.upload_theme_file().context("Upload failed")?;
            let stored = ctl.client().map(|c| c.theme_status()).transpose()?;
            println!("Theme uploaded (stored: {})", stored.unwrap_or(false));
            Ok(())
        }
        Command::Panel { action } => {
            let client = require_client(&config)?;
            match action {
                PanelAction::Info => {
                    let info = client.panel_info()?;
                    println!("{} row(s) x {} column(s)", info.rows, info.cols);
                }
                PanelAction::Layout { layout } => {
                    client.set_panel_layout(layout.into())?;
                    println!("Layout set");
                }
            }
            Ok(())
        }
        Command::Youtube { channel } => {
            let client = require_client(&config)?;
            match channel {
                Some(id) => {
                    client.set_yt_channel(&id)?;
                    println!("Channel set to {id}");
                }
                None => match client.yt_channel()? {
                    Some(id) => {
                        let count = client.yt_stats(&id)?;
                        println!("{id}: {}", count.as_deref().unwrap_or("no data"));
                    }
                    None => println!("No channel stored"),
                },
            }
            Ok(())
        }
        Command::Wifi { action } => {
            let client = require_client(&config)?;
            match action {
                WifiAction::Status => print_wifi(&client.wifi_status()?),
                WifiAction::Scan => {
                    for net in client.wifi_scan()? {
                        let lock = if net.secure { "secured" } else { "open" };
                        println!("{:>4} dBm  {:<7}  {}", net.rssi, lock, net.ssid);
                    }
                }
                WifiAction::Connect { ssid, pass } => print_wifi(&client.wifi_connect(&ssid, &pass)?),
            }
            Ok(())
        }
        Command::Stop => {
            let client = require_client(&config)?;
            client.stop_clock()?;
            client.stop_theme()?;
            println!("Stopped");
            Ok(())
        }
    }
}

fn print_wifi(status: &WifiStatus) {
    let state = status
        .status
        .clone()
        .unwrap_or_else(|| if status.connected { "connected".into() } else { "disconnected".into() });
    println!(
        "{state}: {} {}",
        status.ssid.as_deref().unwrap_or("-"),
        status.ip.as_deref().unwrap_or("-")
    );
}

fn main() -> Result<()> {
    env_logger::init();
    run(Cli::parse())
}
