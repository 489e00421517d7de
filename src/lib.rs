pub mod cli;
pub mod codec;
pub mod compositor;
pub mod config;
pub mod core;
pub mod glyph;
pub mod media;
pub mod preview;
pub mod scheduler;
pub mod theme;
pub mod upload;

pub use compositor::{Compositor, Scene};
pub use config::SessionConfig;
pub use core::{Canvas, Color, DisplayContext, Frame};
pub use scheduler::{ContentMode, PreviewController, SessionState};
