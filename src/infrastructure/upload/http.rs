//! VoiceMap backend uploader

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::application::ports::{UploadError, Uploader};
use crate::domain::audio::CapturedAudio;
use crate::domain::transcription::{Endpoint, TranscriptionResult};

/// Multipart field the backend reads the audio from
const AUDIO_FIELD: &str = "audio";

/// Upper bound on one upload, response included
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

// Response body of both routes. Success carries `transcription` (older
// deployments use `text` or `message`), failure carries `error`.

#[derive(Debug, Default, Deserialize)]
struct ServerResponse {
    text: Option<String>,
    transcription: Option<String>,
    message: Option<String>,
    error: Option<String>,
    #[serde(default)]
    gloss: Vec<String>,
    #[serde(default)]
    videos: Vec<String>,
}

impl ServerResponse {
    fn text(&self) -> Option<&str> {
        [&self.text, &self.transcription, &self.message]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .map(str::trim)
            .find(|text| !text.is_empty())
    }
}

/// Uploads payloads to a VoiceMap server over HTTP
pub struct HttpUploader {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpUploader {
    /// Create an uploader for the server at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            timeout: DEFAULT_UPLOAD_TIMEOUT,
        }
    }

    /// Give up on a request that has not completed within `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), endpoint.path())
    }

    fn build_form(audio: &CapturedAudio) -> Result<reqwest::multipart::Form, UploadError> {
        let part = reqwest::multipart::Part::bytes(audio.data().to_vec())
            .file_name(audio.filename().to_string())
            .mime_str(audio.mime_type().as_str())
            .map_err(|e| UploadError::RequestFailed(e.to_string()))?;
        Ok(reqwest::multipart::Form::new().part(AUDIO_FIELD, part))
    }

    fn parse_success(body: &str) -> Result<TranscriptionResult, UploadError> {
        let response: ServerResponse =
            serde_json::from_str(body).map_err(|e| UploadError::ParseError(e.to_string()))?;
        let text = response.text().ok_or(UploadError::EmptyResponse)?.to_string();
        Ok(TranscriptionResult::new(text).with_signs(response.gloss, response.videos))
    }

    fn parse_failure(endpoint: Endpoint, status: u16, body: &str) -> UploadError {
        let message = serde_json::from_str::<ServerResponse>(body)
            .ok()
            .and_then(|response| response.error)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| endpoint.fallback_error().to_string());
        UploadError::Server { status, message }
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload(
        &self,
        endpoint: Endpoint,
        audio: &CapturedAudio,
    ) -> Result<TranscriptionResult, UploadError> {
        let url = self.endpoint_url(endpoint);
        debug!(
            "Uploading {} ({} bytes, {}) to {}",
            audio.filename(),
            audio.size_bytes(),
            audio.mime_type(),
            url
        );

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .multipart(Self::build_form(audio)?)
            .send()
            .await
            .map_err(request_failed)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(request_failed)?;

        if !status.is_success() {
            return Err(Self::parse_failure(endpoint, status.as_u16(), &body));
        }

        let result = Self::parse_success(&body)?;
        info!("{} upload finished: {} characters", endpoint, result.text().len());
        Ok(result)
    }
}

fn request_failed(e: reqwest::Error) -> UploadError {
    if e.is_timeout() {
        UploadError::RequestFailed(format!("server did not answer in time ({})", e))
    } else {
        UploadError::RequestFailed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_joins_paths() {
        let uploader = HttpUploader::new("http://localhost:5001/");
        assert_eq!(
            uploader.endpoint_url(Endpoint::Transcribe),
            "http://localhost:5001/transcribe"
        );
        assert_eq!(
            uploader.endpoint_url(Endpoint::SignLanguage),
            "http://localhost:5001/sign-language"
        );
    }

    #[test]
    fn parse_success_prefers_text_then_transcription() {
        let result =
            HttpUploader::parse_success(r#"{"text": "", "transcription": "hello there"}"#).unwrap();
        assert_eq!(result.text(), "hello there");

        let result = HttpUploader::parse_success(r#"{"message": "fallback"}"#).unwrap();
        assert_eq!(result.text(), "fallback");
    }

    #[test]
    fn parse_success_reads_signs() {
        let body = r#"{"transcription": "hello", "gloss": ["HELLO"], "videos": ["hello.mp4"]}"#;
        let result = HttpUploader::parse_success(body).unwrap();
        assert_eq!(result.gloss(), ["HELLO".to_string()]);
        assert_eq!(result.videos(), ["hello.mp4".to_string()]);
    }

    #[test]
    fn parse_success_without_text_is_empty_response() {
        let err = HttpUploader::parse_success(r#"{"gloss": []}"#).unwrap_err();
        assert_eq!(err, UploadError::EmptyResponse);
    }

    #[test]
    fn parse_success_rejects_malformed_json() {
        let err = HttpUploader::parse_success("<html>").unwrap_err();
        assert!(matches!(err, UploadError::ParseError(_)));
    }

    #[test]
    fn parse_failure_uses_server_error() {
        let err = HttpUploader::parse_failure(Endpoint::Transcribe, 400, r#"{"error": "No audio file"}"#);
        assert_eq!(
            err,
            UploadError::Server {
                status: 400,
                message: "No audio file".to_string()
            }
        );
    }

    #[test]
    fn parse_failure_falls_back_per_endpoint() {
        let err = HttpUploader::parse_failure(Endpoint::SignLanguage, 502, "Bad Gateway");
        assert_eq!(err.to_string(), "Processing failed");

        let err = HttpUploader::parse_failure(Endpoint::Transcribe, 500, "{}");
        assert_eq!(err.to_string(), "Transcription failed");
    }

    #[tokio::test]
    async fn stalled_server_times_out() {
        use crate::domain::audio::{AudioData, AudioMimeType};
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"transcription": "too late"}"#)
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let audio = CapturedAudio::with_optional_filename(
            AudioData::new(vec![1, 2, 3], AudioMimeType::Wav),
            None,
        );
        let uploader = HttpUploader::new(server.uri()).with_timeout(Duration::from_millis(200));

        let started = std::time::Instant::now();
        let err = uploader
            .upload(Endpoint::Transcribe, &audio)
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::RequestFailed(ref m) if m.contains("in time")));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn default_timeout_is_bounded() {
        let uploader = HttpUploader::new("http://localhost:5001");
        assert_eq!(uploader.timeout, DEFAULT_UPLOAD_TIMEOUT);
    }
}
