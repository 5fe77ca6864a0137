//! DeepL API v2 provider
//!
//! # Authentication
//!
//! Every request carries `Authorization: DeepL-Auth-Key <key>`. Keys of the
//! free plan end in `:fx` and are served from `api-free.deepl.com`; all
//! other keys go to `api.deepl.com`.
//!
//! # Documents
//!
//! Document translation is a three-step exchange: upload the file, poll its
//! status until DeepL reports `done` or `error`, then download the result.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;

use crate::error::{TranslatorError, TranslatorResult};
use crate::provider::{DocumentStatus, TextOptions, TranslationProvider, Usage};

const PRO_API_URL: &str = "https://api.deepl.com";
const FREE_API_URL: &str = "https://api-free.deepl.com";

/// DeepL answers 456 when the character quota is exhausted
const QUOTA_EXCEEDED: u16 = 456;

/// Upper bound for the pause between two document status polls
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct TranslateResponse {
    translations: Vec<TranslatedText>,
}

#[derive(Deserialize)]
struct TranslatedText {
    text: String,
}

#[derive(Deserialize)]
struct DocumentHandle {
    document_id: String,
    document_key: String,
}

#[derive(Deserialize)]
struct DocumentState {
    status: String,
    seconds_remaining: Option<u64>,
    error_message: Option<String>,
}

/// DeepL API client bound to one authentication key
#[derive(Clone)]
pub struct DeepLProvider {
    auth_key: String,
    client: reqwest::Client,
    base_url: String,
}

impl DeepLProvider {
    /// Create a provider for `auth_key` with a per-request `timeout`
    ///
    /// # Errors
    ///
    /// `TranslatorError::Config` if the key is blank, `Network` if the HTTP
    /// client cannot be built.
    pub fn new(auth_key: String, timeout: Duration) -> TranslatorResult<Self> {
        let base_url = Self::default_base_url(&auth_key).to_string();
        Self::with_base_url(auth_key, timeout, base_url)
    }

    /// Create a provider talking to a custom endpoint (proxies, test servers)
    pub fn with_base_url(
        auth_key: String,
        timeout: Duration,
        base_url: String,
    ) -> TranslatorResult<Self> {
        if auth_key.trim().is_empty() {
            return Err(TranslatorError::Config(
                "DeepL authentication key cannot be empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            auth_key,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Free-plan keys carry a `:fx` suffix
    pub fn default_base_url(auth_key: &str) -> &'static str {
        if auth_key.ends_with(":fx") {
            FREE_API_URL
        } else {
            PRO_API_URL
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v2/{}", self.base_url, path)
    }

    fn auth_header(&self) -> String {
        format!("DeepL-Auth-Key {}", self.auth_key)
    }

    /// Build the JSON body of a `/v2/translate` request
    fn text_request_body(
        texts: &[String],
        source: Option<&str>,
        target: &str,
        options: &TextOptions,
    ) -> serde_json::Value {
        let mut body = json!({
            "text": texts,
            "target_lang": target,
        });

        if let Some(source) = source {
            body["source_lang"] = json!(source);
        }
        if let Some(tag_handling) = options.tag_handling {
            body["tag_handling"] = json!(tag_handling.as_str());
        }
        if !options.splitting_tags.is_empty() {
            body["splitting_tags"] = json!(options.splitting_tags);
        }

        body
    }

    /// Turn non-success HTTP statuses into typed errors
    async fn check_status(response: reqwest::Response) -> TranslatorResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        Err(match status {
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
                TranslatorError::Authentication(error_text)
            }
            StatusCode::TOO_MANY_REQUESTS => TranslatorError::RateLimitExceeded,
            s if s.as_u16() == QUOTA_EXCEEDED => TranslatorError::QuotaExceeded,
            s => TranslatorError::Provider(format!("HTTP {}: {}", s, error_text)),
        })
    }

    async fn upload_document(
        &self,
        input: &Path,
        source: Option<&str>,
        target: &str,
    ) -> TranslatorResult<DocumentHandle> {
        let bytes = tokio::fs::read(input).await?;
        let file_name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let mut form = Form::new()
            .text("target_lang", target.to_string())
            .part("file", Part::bytes(bytes).file_name(file_name));
        if let Some(source) = source {
            form = form.text("source_lang", source.to_string());
        }

        let response = self
            .client
            .post(self.endpoint("document"))
            .header("Authorization", self.auth_header())
            .multipart(form)
            .send()
            .await?;

        Ok(Self::check_status(response).await?.json().await?)
    }

    async fn document_state(&self, handle: &DocumentHandle) -> TranslatorResult<DocumentState> {
        let response = self
            .client
            .post(self.endpoint(&format!("document/{}", handle.document_id)))
            .header("Authorization", self.auth_header())
            .json(&json!({ "document_key": handle.document_key }))
            .send()
            .await?;

        Ok(Self::check_status(response).await?.json().await?)
    }

    async fn download_document(
        &self,
        handle: &DocumentHandle,
        output: &Path,
    ) -> TranslatorResult<()> {
        let response = self
            .client
            .post(self.endpoint(&format!("document/{}/result", handle.document_id)))
            .header("Authorization", self.auth_header())
            .json(&json!({ "document_key": handle.document_key }))
            .send()
            .await?;

        let bytes = Self::check_status(response).await?.bytes().await?;
        tokio::fs::write(output, &bytes).await?;
        Ok(())
    }
}

impl std::fmt::Debug for DeepLProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepLProvider")
            .field("auth_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl TranslationProvider for DeepLProvider {
    async fn translate_text(
        &self,
        texts: &[String],
        source: Option<&str>,
        target: &str,
        options: &TextOptions,
    ) -> TranslatorResult<Vec<String>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = Self::text_request_body(texts, source, target, options);
        let response = self
            .client
            .post(self.endpoint("translate"))
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?;

        let parsed: TranslateResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| TranslatorError::Provider(format!("Failed to parse response: {}", e)))?;

        Ok(parsed.translations.into_iter().map(|t| t.text).collect())
    }

    async fn translate_document(
        &self,
        input: &Path,
        output: &Path,
        source: Option<&str>,
        target: &str,
    ) -> TranslatorResult<DocumentStatus> {
        let handle = self.upload_document(input, source, target).await?;
        tracing::debug!(document_id = %handle.document_id, "Document uploaded");

        loop {
            let state = self.document_state(&handle).await?;
            match state.status.as_str() {
                "done" => break,
                "error" => {
                    return Ok(DocumentStatus::failed(
                        state
                            .error_message
                            .unwrap_or_else(|| "Unknown document translation error".to_string()),
                    ));
                }
                _ => {
                    let wait = Duration::from_secs(state.seconds_remaining.unwrap_or(1).max(1))
                        .min(MAX_POLL_INTERVAL);
                    tokio::time::sleep(wait).await;
                }
            }
        }

        self.download_document(&handle, output).await?;
        Ok(DocumentStatus::done())
    }

    async fn usage(&self) -> TranslatorResult<Usage> {
        let response = self
            .client
            .get(self.endpoint("usage"))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        Ok(Self::check_status(response).await?.json().await?)
    }

    fn provider_name(&self) -> &str {
        "DeepL"
    }
}
