use super::multipart::Multipart;
use anyhow::{anyhow, bail, Context, Result};
use std::time::Duration;

/// Default request timeout for one-shot actions
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport to the panel's HTTP server.
///
/// Every call returns the response body on a 2xx status and an error
/// otherwise. Nothing is retried.
pub trait DeviceLink: Send + Sync {
    fn post_multipart(&self, path: &str, form: Multipart, timeout: Option<Duration>) -> Result<String>;

    /// URL-encoded form POST
    fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Result<String>;

    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String>;
}

/// Blocking HTTP link backed by a `ureq` agent
pub struct HttpLink {
    base: String,
    agent: ureq::Agent,
}

impl HttpLink {
    /// `base` is the device root, e.g. `http://192.168.4.1`
    pub fn new(base: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            base: base.trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }
}

fn read_body(url: &str, result: Result<ureq::Response, ureq::Error>) -> Result<String> {
    match result {
        Ok(response) => response
            .into_string()
            .with_context(|| format!("reading response from {url}")),
        Err(ureq::Error::Status(code, _)) => bail!("{url} returned HTTP {code}"),
        Err(e) => Err(anyhow!("request to {url} failed: {e}")),
    }
}

impl DeviceLink for HttpLink {
    fn post_multipart(&self, path: &str, form: Multipart, timeout: Option<Duration>) -> Result<String> {
        let url = self.url(path);
        let (content_type, body) = form.finish();
        let mut request = self.agent.post(&url).set("Content-Type", &content_type);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        log::trace!("POST {url} ({} bytes)", body.len());
        read_body(&url, request.send_bytes(&body))
    }

    fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Result<String> {
        let url = self.url(path);
        log::trace!("POST {url} (form)");
        read_body(&url, self.agent.post(&url).send_form(fields))
    }

    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        let url = self.url(path);
        let request = query
            .iter()
            .fold(self.agent.get(&url), |req, (k, v)| req.query(k, v));
        log::trace!("GET {url}");
        read_body(&url, request.call())
    }
}
