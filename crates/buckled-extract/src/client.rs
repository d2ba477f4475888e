//! The extraction client: rate-limited, time-bounded collaborator calls with
//! degraded fallbacks. Collaborator problems never surface as errors; only
//! an unsupported upload is rejected.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};

use buckled_core::{Error, ExtractedServiceData, Result, UserSessionData};

use crate::backend::{BackendError, CompletionBackend, CompletionRequest, OpenRouterBackend};
use crate::config::ExtractionConfig;
use crate::normalize::normalize;
use crate::prompts;
use crate::rate_limit::RateLimiter;
use crate::records::{self, Stamp};
use crate::upload::UploadedDocument;

pub struct ExtractionClient {
    backend: Arc<dyn CompletionBackend>,
    limiter: Arc<RateLimiter>,
    vision_model: String,
    text_model: String,
    request_timeout: Duration,
    retry_delay: Duration,
}

impl ExtractionClient {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        limiter: Arc<RateLimiter>,
        config: &ExtractionConfig,
    ) -> Self {
        Self {
            backend,
            limiter,
            vision_model: config.vision_model.clone(),
            text_model: config.text_model.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
            retry_delay: Duration::from_millis(config.rate_limit_retry_ms),
        }
    }

    /// Client backed by the configured OpenAI-compatible endpoint.
    pub fn from_config(config: &ExtractionConfig, limiter: Arc<RateLimiter>) -> Result<Self> {
        let backend = OpenRouterBackend::new(
            config.base_url.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.request_timeout_secs.max(1)),
        )
        .map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self::new(Arc::new(backend), limiter, config))
    }

    /// Interpret a typed description. Always returns a record.
    pub async fn extract_from_text(
        &self,
        input: &str,
        session: Option<&UserSessionData>,
    ) -> ExtractedServiceData {
        let started = Instant::now();
        let normalized = normalize(input);
        debug!(
            "Normalized '{}' -> '{}' ({})",
            input, normalized.standardized, normalized.confidence
        );

        let request = prompts::text_request(&self.text_model, input, &normalized, session);
        let result = self.call_with_retry(&request).await;
        let stamp = stamp_since(started);

        match result {
            Ok(reply) => records::text_record(input, &reply, stamp),
            Err(e) => {
                warn!("Text extraction degraded to local normalization: {}", e);
                records::text_degraded_record(input, &normalized, &e.to_string(), stamp)
            }
        }
    }

    /// Read an uploaded document. Fails only when the upload is not an
    /// accepted type, before any collaborator call.
    pub async fn extract_from_document(
        &self,
        document: &UploadedDocument,
        session: Option<&UserSessionData>,
    ) -> Result<ExtractedServiceData> {
        document.validate()?;

        let started = Instant::now();
        let metadata = document.metadata(Utc::now());
        info!(
            "Analyzing document {} ({} bytes, {})",
            metadata.file_name, metadata.file_size, metadata.mime_type
        );

        let request = prompts::document_request(&self.vision_model, document.to_data_url(), session);
        let result = self.call_with_retry(&request).await;
        let stamp = stamp_since(started);

        Ok(match result {
            Ok(reply) => records::document_record(&reply, metadata, stamp),
            Err(e) => {
                warn!("Document analysis failed: {}", e);
                records::document_failure_record(metadata, &e.to_string(), stamp)
            }
        })
    }

    /// True when the collaborator answers a minimal prompt.
    pub async fn test_connection(&self) -> bool {
        let request = prompts::ping_request(&self.text_model);
        match self.call(&request).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Connection test failed: {}", e);
                false
            }
        }
    }

    /// One call; on a rate-limit response wait, restart the interval and
    /// retry exactly once. The retry goes out as soon as the wait ends.
    async fn call_with_retry(&self, request: &CompletionRequest) -> std::result::Result<String, BackendError> {
        match self.call(request).await {
            Err(BackendError::RateLimited) => {
                warn!(
                    "Rate limited; retrying once in {}ms",
                    self.retry_delay.as_millis()
                );
                tokio::time::sleep(self.retry_delay).await;
                self.limiter.reset().await;
                self.send(request).await
            }
            other => other,
        }
    }

    async fn call(&self, request: &CompletionRequest) -> std::result::Result<String, BackendError> {
        self.limiter.acquire().await;
        self.send(request).await
    }

    async fn send(&self, request: &CompletionRequest) -> std::result::Result<String, BackendError> {
        match tokio::time::timeout(self.request_timeout, self.backend.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(self.request_timeout)),
        }
    }
}

fn stamp_since(started: Instant) -> Stamp {
    Stamp {
        timestamp: Utc::now(),
        processing_time: started.elapsed().as_millis() as u64,
    }
}
