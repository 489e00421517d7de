#![allow(dead_code)]

use anyhow::{bail, Result};
use matrix_composer::upload::{DeviceClient, DeviceLink, Dispatcher, Multipart};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One multipart POST as the panel would have received it
#[derive(Debug, Clone)]
pub struct Post {
    pub path: String,
    pub body: Vec<u8>,
}

impl Post {
    pub fn contains(&self, needle: &str) -> bool {
        self.body
            .windows(needle.len())
            .any(|w| w == needle.as_bytes())
    }

    /// The `filename` of the first file part
    pub fn filename(&self) -> Option<String> {
        let text = String::from_utf8_lossy(&self.body);
        let start = text.find("filename=\"")? + "filename=\"".len();
        let end = text[start..].find('"')?;
        Some(text[start..start + end].to_string())
    }
}

/// Device stand-in that records every request
#[derive(Default)]
pub struct RecordingLink {
    pub posts: Mutex<Vec<Post>>,
    pub gets: Mutex<Vec<(String, Vec<(String, String)>)>>,
    pub replies: Mutex<Vec<(String, String)>>,
    /// Simulated request time
    pub latency: Option<Duration>,
}

impl RecordingLink {
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    pub fn reply(&self, path: &str, body: &str) {
        self.replies
            .lock()
            .unwrap()
            .push((path.to_string(), body.to_string()));
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }

    pub fn uploads_named(&self, filename: &str) -> usize {
        self.posts()
            .iter()
            .filter(|p| p.filename().as_deref() == Some(filename))
            .count()
    }

    fn pause(&self) {
        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }
    }
}

impl DeviceLink for RecordingLink {
    fn post_multipart(&self, path: &str, form: Multipart, _timeout: Option<Duration>) -> Result<String> {
        self.pause();
        let (_, body) = form.finish();
        self.posts.lock().unwrap().push(Post {
            path: path.to_string(),
            body,
        });
        Ok("{}".to_string())
    }

    fn post_form(&self, _path: &str, _fields: &[(&str, &str)]) -> Result<String> {
        self.pause();
        Ok(String::new())
    }

    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        self.pause();
        let query = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.gets.lock().unwrap().push((path.to_string(), query));
        let replies = self.replies.lock().unwrap();
        match replies.iter().find(|(p, _)| p == path) {
            Some((_, body)) => Ok(body.clone()),
            None => bail!("{path} returned HTTP 404"),
        }
    }
}

pub fn dispatcher(link: Arc<RecordingLink>) -> Dispatcher {
    Dispatcher::new(DeviceClient::new(link))
}
