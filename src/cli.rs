// cli.rs - Command-line interface configuration
use crate::scheduler::ContentMode;
use crate::upload::PanelLayout;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "matrix-composer")]
#[command(about = "Compose, preview and upload content for an RGB LED matrix", long_about = None)]
pub struct Cli {
    /// Session file (JSON); defaults apply when omitted
    #[arg(short, long, global = true)]
    pub session: Option<PathBuf>,

    /// Panel URL, overriding the session file
    #[arg(short, long, global = true)]
    pub device: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run a content loop locally, uploading when a device is set
    Preview {
        #[arg(value_enum, default_value = "text")]
        mode: ModeArg,
        /// Seconds to run; 0 runs until interrupted
        #[arg(short = 't', long, default_value = "10")]
        seconds: f64,
        /// Save the last drawn frame as PNG
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Mirror frames in the terminal
        #[arg(long, default_value = "false")]
        terminal: bool,
    },
    /// Send the configured text to the panel once
    Apply,
    /// Upload the theme file for standalone playback on the panel
    Theme {
        /// Theme file, overriding the session file
        path: Option<PathBuf>,
    },
    /// Panel geometry
    Panel {
        #[command(subcommand)]
        action: PanelAction,
    },
    /// Subscriber counter channel
    Youtube {
        /// Channel id to store; prints the stored one when omitted
        channel: Option<String>,
    },
    /// Station-mode network
    Wifi {
        #[command(subcommand)]
        action: WifiAction,
    },
    /// Stop device-side clock and theme playback
    Stop,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PanelAction {
    Info,
    Layout {
        #[arg(value_enum)]
        layout: LayoutArg,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum WifiAction {
    Status,
    Scan,
    Connect { ssid: String, pass: String },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Text,
    Clock,
    Video,
    Theme,
    Youtube,
    /// Date, time and equalizer layout
    Dashboard,
    /// Study/break countdown
    Timer,
}

impl From<ModeArg> for ContentMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Text => ContentMode::Text,
            ModeArg::Clock => ContentMode::Clock,
            ModeArg::Video => ContentMode::Video,
            ModeArg::Theme => ContentMode::Theme,
            ModeArg::Youtube => ContentMode::YouTube,
            ModeArg::Dashboard => ContentMode::Dashboard,
            ModeArg::Timer => ContentMode::Timer,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutArg {
    #[value(name = "1x1")]
    Single,
    #[value(name = "1x2")]
    Wide,
    #[value(name = "2x1")]
    Tall,
}

impl From<LayoutArg> for PanelLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Single => PanelLayout::Single,
            LayoutArg::Wide => PanelLayout::Wide,
            LayoutArg::Tall => PanelLayout::Tall,
        }
    }
}
