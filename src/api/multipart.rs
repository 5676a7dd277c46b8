//! Minimal `multipart/form-data` body builder for the analysis upload.

/// Accumulates form parts into a single request body.
pub(crate) struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        let nanos = chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default();
        Self::with_boundary(format!("----docinsight{nanos:x}"))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.open_part();
        self.push(&format!(
            "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
            quote(name)
        ));
        self.push(value);
        self.push("\r\n");
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.open_part();
        self.push(&format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            quote(name),
            quote(file_name)
        ));
        self.push(&format!("Content-Type: {content_type}\r\n\r\n"));
        self.body.extend_from_slice(bytes);
        self.push("\r\n");
        self
    }

    /// Close the form. Returns the `Content-Type` header value and the body.
    pub fn finish(mut self) -> (String, Vec<u8>) {
        let closing = format!("--{}--\r\n", self.boundary);
        self.push(&closing);
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }

    fn open_part(&mut self) {
        let opening = format!("--{}\r\n", self.boundary);
        self.push(&opening);
    }

    fn push(&mut self, text: &str) {
        self.body.extend_from_slice(text.as_bytes());
    }
}

/// Escape a value for use inside a quoted header parameter.
fn quote(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
