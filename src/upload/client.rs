use super::link::DeviceLink;
use super::meta::UploadMeta;
use super::multipart::Multipart;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Clock frames are dropped after this long so a stalled request never
/// holds back the next second
pub const CLOCK_UPLOAD_TIMEOUT: Duration = Duration::from_millis(500);

const OCTET_STREAM: &str = "application/octet-stream";

/// Panel grid as reported by `/panel_info`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelInfo {
    pub rows: u32,
    pub cols: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PanelInfoReply {
    Nested { layout: PanelInfo },
    Flat(PanelInfo),
}

/// Chained panel arrangements the firmware supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PanelLayout {
    #[serde(rename = "1x1")]
    Single,
    #[serde(rename = "1x2")]
    Wide,
    #[serde(rename = "2x1")]
    Tall,
}

impl PanelLayout {
    pub fn as_str(self) -> &'static str {
        match self {
            PanelLayout::Single => "1x1",
            PanelLayout::Wide => "1x2",
            PanelLayout::Tall => "2x1",
        }
    }
}

impl fmt::Display for PanelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One access point from `/wifi_scan`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiNetwork {
    pub ssid: String,
    #[serde(default)]
    pub rssi: i32,
    #[serde(default)]
    pub secure: bool,
}

/// Station state from `/wifi_status` and `/wifi_connect`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiStatus {
    pub connected: bool,
    pub status: Option<String>,
    pub ssid: Option<String>,
    pub ip: Option<String>,
}

#[derive(Deserialize)]
struct StatsReply {
    #[serde(rename = "subscriberCount", default)]
    subscriber_count: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ChannelReply {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Deserialize)]
struct ThemeStatusReply {
    #[serde(default)]
    theme_uploaded: bool,
}

/// Typed wrapper over every endpoint the panel exposes
#[derive(Clone)]
pub struct DeviceClient {
    link: Arc<dyn DeviceLink>,
}

impl DeviceClient {
    pub fn new(link: Arc<dyn DeviceLink>) -> Self {
        Self { link }
    }

    pub fn link(&self) -> &dyn DeviceLink {
        self.link.as_ref()
    }

    /// `POST /upload`: a wire payload plus its display parameters
    pub fn upload(&self, filename: &str, payload: &[u8], meta: &UploadMeta) -> Result<()> {
        self.upload_with_timeout(filename, payload, meta, None)
    }

    pub fn upload_with_timeout(
        &self,
        filename: &str,
        payload: &[u8],
        meta: &UploadMeta,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let form = meta.fields().into_iter().fold(
            Multipart::new().file("image", filename, OCTET_STREAM, payload),
            |form, (name, value)| form.text(name, value),
        );
        self.link
            .post_multipart("/upload", form, timeout)
            .with_context(|| format!("uploading {filename}"))?;
        Ok(())
    }

    /// `POST /upload_bg`: the opaque layer the device scrolls text over
    pub fn upload_bg(&self, payload: &[u8]) -> Result<()> {
        let form = Multipart::new().file("image", "bg.rgb565", OCTET_STREAM, payload);
        self.link
            .post_multipart("/upload_bg", form, None)
            .context("uploading background")?;
        Ok(())
    }

    /// `POST /upload_theme`: the raw theme file for on-device playback
    pub fn upload_theme(&self, filename: &str, bytes: &[u8]) -> Result<()> {
        let form = Multipart::new().file("file", filename, OCTET_STREAM, bytes);
        self.link
            .post_multipart("/upload_theme", form, None)
            .with_context(|| format!("uploading theme {filename}"))?;
        Ok(())
    }

    pub fn panel_info(&self) -> Result<PanelInfo> {
        let body = self.link.get("/panel_info", &[])?;
        let reply: PanelInfoReply =
            serde_json::from_str(&body).with_context(|| format!("parsing panel info {body:?}"))?;
        Ok(match reply {
            PanelInfoReply::Nested { layout } => layout,
            PanelInfoReply::Flat(info) => info,
        })
    }

    pub fn set_panel_layout(&self, layout: PanelLayout) -> Result<()> {
        self.link
            .post_form("/panel_layout", &[("layout", layout.as_str())])?;
        Ok(())
    }

    /// Subscriber count as display text, `None` when the device has no figure yet
    pub fn yt_stats(&self, channel_id: &str) -> Result<Option<String>> {
        let body = self.link.get("/yt_stats", &[("id", channel_id)])?;
        let reply: StatsReply =
            serde_json::from_str(&body).with_context(|| format!("parsing stats {body:?}"))?;
        Ok(match reply.subscriber_count {
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    /// Channel id stored on the device
    pub fn yt_channel(&self) -> Result<Option<String>> {
        let body = self.link.get("/yt_channel", &[])?;
        let reply: ChannelReply = serde_json::from_str(&body).context("parsing channel reply")?;
        Ok(reply.id.filter(|id| !id.is_empty()))
    }

    pub fn set_yt_channel(&self, channel_id: &str) -> Result<()> {
        let id = channel_id.trim();
        if id.is_empty() {
            bail!("channel id is empty");
        }
        self.link.post_form("/yt_channel", &[("id", id)])?;
        Ok(())
    }

    pub fn wifi_status(&self) -> Result<WifiStatus> {
        let body = self.link.get("/wifi_status", &[])?;
        serde_json::from_str(&body).context("parsing wifi status")
    }

    pub fn wifi_scan(&self) -> Result<Vec<WifiNetwork>> {
        let body = self.link.get("/wifi_scan", &[])?;
        serde_json::from_str(&body).context("parsing wifi scan")
    }

    pub fn wifi_connect(&self, ssid: &str, pass: &str) -> Result<WifiStatus> {
        let form = Multipart::new().text("ssid", ssid).text("pass", pass);
        let body = self.link.post_multipart("/wifi_connect", form, None)?;
        let mut status: WifiStatus = serde_json::from_str(&body).unwrap_or_default();
        if status.status.as_deref() == Some("connected") {
            status.connected = true;
        }
        Ok(status)
    }

    /// Stop the device's own clock rendering
    pub fn stop_clock(&self) -> Result<()> {
        self.link.post_form("/stop_clock", &[])?;
        Ok(())
    }

    /// Stop on-device theme playback
    pub fn stop_theme(&self) -> Result<()> {
        self.link.post_form("/stop_theme", &[])?;
        Ok(())
    }

    /// Whether a theme file is stored on the device
    pub fn theme_status(&self) -> Result<bool> {
        let body = self.link.get("/theme_status", &[])?;
        let reply: ThemeStatusReply = serde_json::from_str(&body).context("parsing theme status")?;
        Ok(reply.theme_uploaded)
    }
}
