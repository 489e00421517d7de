//! Everything that talks to the panel over HTTP.

pub mod client;
pub mod dispatcher;
pub mod link;
pub mod meta;
pub mod multipart;

pub use client::{DeviceClient, PanelInfo, PanelLayout, WifiNetwork, WifiStatus, CLOCK_UPLOAD_TIMEOUT};
pub use dispatcher::Dispatcher;
pub use link::{DeviceLink, HttpLink, DEFAULT_TIMEOUT};
pub use meta::{Motion, UploadMeta};
pub use multipart::Multipart;
