use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use serde::Deserialize;

use super::multipart::MultipartForm;
use super::{AnalysisApi, DocumentUpload, ModelCatalog};
use crate::cancel::CancellationToken;
use crate::config::schema::ApiConfig;
use crate::error::ClientError;
use crate::report::Report;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How often a pending analysis checks its cancellation token.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Synchronous HTTP implementation of [`AnalysisApi`] built on `ureq`.
///
/// The analysis upload runs on a worker thread so the caller can keep
/// polling the cancellation token. A cancelled request is abandoned: its
/// worker finishes or times out in the background and the response is
/// dropped.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    agent: ureq::Agent,
    models_url: String,
    analyze_url: String,
}

impl HttpApiClient {
    pub fn from_config(config: &ApiConfig) -> Self {
        let base = config.base_url.trim_end_matches('/');
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();

        Self {
            agent,
            models_url: join_url(base, &config.models_path),
            analyze_url: join_url(base, &config.analyze_path),
        }
    }

    pub fn models_url(&self) -> &str {
        &self.models_url
    }

    pub fn analyze_url(&self) -> &str {
        &self.analyze_url
    }
}

impl AnalysisApi for HttpApiClient {
    fn fetch_models(&self) -> Result<ModelCatalog, ClientError> {
        match self.agent.get(&self.models_url).call() {
            Ok(response) => response
                .into_json::<ModelCatalog>()
                .map_err(|e| ClientError::Decode(format!("invalid model catalog: {e}"))),
            Err(ureq::Error::Status(status, _)) => Err(ClientError::Server {
                status,
                detail: None,
            }),
            Err(ureq::Error::Transport(err)) => Err(ClientError::Network(err.to_string())),
        }
    }

    fn perform_analysis(
        &self,
        api_key: &str,
        file: &DocumentUpload,
        model_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Report, ClientError> {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let (content_type, body) = MultipartForm::new()
            .file("file", &file.file_name, file.content_type(), &file.bytes)
            .text("model_name", model_name)
            .finish();

        let request = self
            .agent
            .post(&self.analyze_url)
            .set("Authorization", &format!("Bearer {api_key}"))
            .set("Content-Type", &content_type);

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(send_analysis(request, &body));
        });

        loop {
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }
            match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(result) => return result,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(ClientError::Network(
                        "analysis worker exited without a response".to_string(),
                    ));
                }
            }
        }
    }
}

fn send_analysis(request: ureq::Request, body: &[u8]) -> Result<Report, ClientError> {
    match request.send_bytes(body) {
        Ok(response) => response
            .into_json::<Report>()
            .map_err(|e| ClientError::Decode(format!("invalid analysis report: {e}"))),
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().ok();
            Err(ClientError::Server {
                status,
                detail: Some(error_detail(status, body.as_deref())),
            })
        }
        Err(ureq::Error::Transport(err)) => Err(ClientError::Network(err.to_string())),
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Human-readable message for a failed analysis response.
///
/// Uses the JSON `detail` field when present (strings verbatim, structured
/// validation details as compact JSON), otherwise a generic status message.
pub(crate) fn error_detail(status: u16, body: Option<&str>) -> String {
    let detail = body
        .and_then(|b| serde_json::from_str::<ErrorBody>(b).ok())
        .and_then(|e| e.detail);

    match detail {
        Some(serde_json::Value::String(message)) if !message.is_empty() => message,
        Some(serde_json::Value::Null) | Some(serde_json::Value::String(_)) | None => {
            format!("HTTP error! Status: {status}")
        }
        Some(other) => other.to_string(),
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{base}/{}", path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_joins_configured_paths() {
        let config = ApiConfig {
            base_url: "http://localhost:8000/".to_string(),
            ..ApiConfig::default()
        };
        let client = HttpApiClient::from_config(&config);
        assert_eq!(
            client.models_url(),
            "http://localhost:8000/api/v1/get-available-models"
        );
        assert_eq!(
            client.analyze_url(),
            "http://localhost:8000/api/v1/analyze-document"
        );
    }

    #[test]
    fn error_detail_uses_string_detail() {
        assert_eq!(
            error_detail(401, Some(r#"{"detail": "Invalid API key."}"#)),
            "Invalid API key."
        );
    }

    #[test]
    fn error_detail_falls_back_for_opaque_bodies() {
        assert_eq!(
            error_detail(502, Some("<html>Bad Gateway</html>")),
            "HTTP error! Status: 502"
        );
        assert_eq!(error_detail(500, None), "HTTP error! Status: 500");
        assert_eq!(error_detail(500, Some("{}")), "HTTP error! Status: 500");
    }

    #[test]
    fn error_detail_renders_structured_detail() {
        let message = error_detail(422, Some(r#"{"detail": [{"msg": "field required"}]}"#));
        assert_eq!(message, r#"[{"msg":"field required"}]"#);
    }

    #[test]
    fn cancelled_token_short_circuits_without_network() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..ApiConfig::default()
        };
        let client = HttpApiClient::from_config(&config);
        let token = CancellationToken::new();
        token.cancel();

        let result = client.perform_analysis(
            "key",
            &DocumentUpload::new("a.txt", b"text".to_vec()),
            "openai:gpt-4o",
            &token,
        );
        assert!(matches!(result, Err(ClientError::Cancelled)));
    }
}
