// src/api_client.rs
use crate::error::ApiError;
use crate::types::{
    AudioOverviewResponse, ChatRequest, ChatResponse, HealthResponse, SummarizeRequest, SummaryRecord,
};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Instant;
use tracing::{debug, info, warn};

/// The two endpoints the page controller talks to.
#[async_trait]
pub trait SummaryBackend: Send + Sync {
    async fn summarize(&self, query: &str) -> Result<SummaryRecord, ApiError>;
    async fn chat(&self, video_id: &str, question: &str) -> Result<String, ApiError>;
}

/// Relative link to the audio overview page of a summarized video.
/// The controller never fetches it.
pub fn audio_overview_path(video_id: &str) -> String {
    format!("/audio-overview/{}", urlencoding::encode(video_id))
}

#[derive(Debug, Clone)]
pub struct YouNoteClient {
    client: Client,
    base_url: String,
}

impl YouNoteClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute form of [`audio_overview_path`]
    pub fn audio_overview_url(&self, video_id: &str) -> String {
        format!("{}{}", self.base_url, audio_overview_path(video_id))
    }

    /// Ask the server to build (or reuse) the spoken overview for a video.
    /// Returns the path of the generated audio file.
    pub async fn generate_audio(&self, video_id: &str) -> Result<String, ApiError> {
        info!(video_id = %video_id, "🎙️ Requesting audio overview");

        let response = self
            .client
            .get(format!("{}/generate-audio/{}", self.base_url, urlencoding::encode(video_id)))
            .send()
            .await?;

        let audio = check_status(response)?.json::<AudioOverviewResponse>().await?;
        info!(video_id = %video_id, audio_path = %audio.audio_path, "✅ Audio overview ready");
        Ok(audio.audio_path)
    }

    pub async fn health(&self) -> Result<String, ApiError> {
        let response = self.client.get(format!("{}/health", self.base_url)).send().await?;
        let health = check_status(response)?.json::<HealthResponse>().await?;
        Ok(health.status)
    }
}

#[async_trait]
impl SummaryBackend for YouNoteClient {
    async fn summarize(&self, query: &str) -> Result<SummaryRecord, ApiError> {
        let started = Instant::now();
        // Unique parameter so intermediaries never answer from cache
        let cache_buster = chrono::Utc::now().timestamp_millis().to_string();

        debug!(query = %query, "Sending summarize request");

        let response = self
            .client
            .post(format!("{}/summarize", self.base_url))
            .query(&[("t", cache_buster)])
            .json(&SummarizeRequest { query: query.to_string() })
            .send()
            .await?;

        let record = check_status(response)?.json::<SummaryRecord>().await?;
        info!(
            video_id = %record.video_id,
            elapsed_ms = %started.elapsed().as_millis(),
            "✅ Summary received"
        );
        Ok(record)
    }

    async fn chat(&self, video_id: &str, question: &str) -> Result<String, ApiError> {
        let started = Instant::now();

        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .json(&ChatRequest {
                video_id: video_id.to_string(),
                question: question.to_string(),
            })
            .send()
            .await?;

        let chat = check_status(response)?.json::<ChatResponse>().await?;
        debug!(video_id = %video_id, elapsed_ms = %started.elapsed().as_millis(), "Chat answer received");
        Ok(chat.answer)
    }
}

fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    warn!(status = %status.as_u16(), url = %response.url(), "YouNote server returned an error status");
    Err(ApiError::Status {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or_default().to_string(),
    })
}
