use chrono::Utc;
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// `multipart/form-data` body builder
#[derive(Debug, Clone)]
pub struct Multipart {
    boundary: String,
    body: Vec<u8>,
}

impl Multipart {
    /// Fresh form with a boundary unique to this process
    pub fn new() -> Self {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self::with_boundary(&format!("----matrix-composer-{nanos:x}-{seq}"))
    }

    pub fn with_boundary(boundary: &str) -> Self {
        Self {
            boundary: boundary.to_string(),
            body: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Plain text field
    pub fn text(mut self, name: &str, value: impl Display) -> Self {
        self.open_part();
        self.body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
        self
    }

    /// Binary file field
    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.open_part();
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Value for the request's `Content-Type` header
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Close the form, returning the header value and the body
    pub fn finish(mut self) -> (String, Vec<u8>) {
        let content_type = self.content_type();
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (content_type, self.body)
    }

    fn open_part(&mut self) {
        self.body
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
    }
}

impl Default for Multipart {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_layout() {
        let (ct, body) = Multipart::with_boundary("XYZ")
            .file("image", "img.rgb565", "application/octet-stream", &[1, 0, 2, 0])
            .text("bg", "#000000")
            .finish();
        assert_eq!(ct, "multipart/form-data; boundary=XYZ");

        let mut expected = Vec::new();
        expected.extend_from_slice(
            b"--XYZ\r\nContent-Disposition: form-data; name=\"image\"; filename=\"img.rgb565\"\r\n\
              Content-Type: application/octet-stream\r\n\r\n",
        );
        expected.extend_from_slice(&[1, 0, 2, 0]);
        expected.extend_from_slice(
            b"\r\n--XYZ\r\nContent-Disposition: form-data; name=\"bg\"\r\n\r\n#000000\r\n--XYZ--\r\n",
        );
        assert_eq!(body, expected);
    }

    #[test]
    fn boundaries_differ() {
        assert_ne!(Multipart::new().boundary(), Multipart::new().boundary());
    }
}
