use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::Provider;
use crate::errors::GenerationError;
use crate::extract::extract_html;
use crate::log::{log_saved_paths, Transcript};
use crate::prompt::GenerationRequest;
use crate::wire::{ErrorBody, GenerateContentResponse};

pub const QUOTA_MESSAGE: &str =
    "Gemini API quota exceeded. Please try again later or upgrade your Gemini API plan.";

/// Used when a 429 body is JSON but carries no `error.message`.
const DEFAULT_429_MESSAGE: &str = "API quota exceeded";

pub struct GeminiProvider {
    endpoint: String,
    model: String,
    client: Client,
    transcript: Option<Transcript>,
}

impl GeminiProvider {
    pub fn new(endpoint: String, model: String, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self { endpoint, model, client: builder.build()?, transcript: None })
    }

    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = Some(transcript);
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn send(&self, api_key: &str, req: &GenerationRequest) -> Result<String, GenerationError> {
        if api_key.is_empty() {
            return Err(GenerationError::MissingCredential);
        }

        let url = self.url();
        let body = req.to_wire();
        let stage = req.shape().as_str();
        tracing::debug!(%url, stage, turns = body.contents.len(), "POST generateContent");

        let resp = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::TransportFailure(e.without_url().to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| GenerationError::TransportFailure(e.without_url().to_string()))?;

        tracing::debug!(status = status.as_u16(), bytes = text.len(), "generateContent returned");
        tracing::trace!(body = %text, "raw response");

        if let Some(t) = self.transcript.as_ref().filter(|t| t.enabled()) {
            match t.save_stage(stage, &body, status.as_u16(), &text) {
                Ok(saved) => log_saved_paths(stage, &saved),
                Err(e) => tracing::warn!(error = %e, "could not save transcript"),
            }
        }

        if !status.is_success() {
            let err = classify_failure(status.as_u16(), &text);
            tracing::warn!(status = status.as_u16(), error = %err, "Gemini API error");
            return Err(err);
        }

        parse_success(&text)
    }
}

/// Maps a non-success response to the error taxonomy.
///
/// A `google.rpc.QuotaFailure` detail is authoritative. Without one, a 429
/// whose message contains "quota" or "exceeded" (case-sensitive) still counts
/// as a quota failure, for providers that only send prose. A 429 body that is
/// JSON but has no `error.message` reads as "API quota exceeded".
pub fn classify_failure(status: u16, body: &str) -> GenerationError {
    let Some(parsed) = ErrorBody::parse(body) else {
        return GenerationError::ApiError { status, message: None };
    };
    tracing::debug!(code = ?parsed.code(), status = ?parsed.status(), "provider error body");

    if status == 429 {
        let text = parsed.message().unwrap_or(DEFAULT_429_MESSAGE);
        if parsed.reports_quota_failure() || text.contains("quota") || text.contains("exceeded") {
            return GenerationError::QuotaExceeded { message: QUOTA_MESSAGE.into() };
        }
    }

    GenerationError::ApiError { status, message: parsed.message().map(str::to_string) }
}

/// Decodes a success body and runs the first candidate's text through the extractor.
pub fn parse_success(body: &str) -> Result<String, GenerationError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
    let finish = parsed.candidates.first().and_then(|c| c.finish_reason.clone());
    tracing::debug!(candidates = parsed.candidates.len(), ?finish, "decoded response");
    let text = parsed.first_text().ok_or(GenerationError::EmptyResponse)?;
    extract_html(&text)
}
