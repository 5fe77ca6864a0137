//! DeepL-backed translator handler
//!
//! [`TranslationDispatcher`] ties the pieces together: it maps host locales
//! to DeepL codes, decides between one direct request and the chunked path,
//! and runs document jobs one after another with per-job failure isolation.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use deepl_handler::{HandlerConfig, LocalFileStorage, MemoryStore, TranslationDispatcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handler = TranslationDispatcher::with_deepl(
//!         &HandlerConfig::from_env(),
//!         Arc::new(MemoryStore::new()),
//!         Arc::new(LocalFileStorage),
//!     );
//!     let texts = vec!["Hallo Welt".to_string()];
//!     let results = handler.translate(&texts, Some("ger-DE"), "eng-GB", &[]).await?;
//!     println!("{:?}", results);
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::chunker::RequestSizeChunker;
use crate::config::HandlerConfig;
use crate::credentials::{ClientCache, DeepLFactory, ProviderFactory};
use crate::error::{TranslatorError, TranslatorResult};
use crate::handler::{TranslateOption, TranslatorHandler};
use crate::language::{is_allowed_language, map_language};
use crate::provider::{TagHandling, TextOptions, TranslationProvider};
use crate::settings::{HandlerSettings, KeyValueStore, SettingsStore, settings_schema};
use crate::storage::{DocumentJob, FileStorage};

/// Tags of the host's XML that always start a new sentence
const SPLITTING_TAGS: [&str; 2] = ["paragraph", "c"];

/// Translator handler backed by a [`TranslationProvider`]
pub struct TranslationDispatcher {
    clients: Arc<ClientCache>,
    settings: SettingsStore,
    storage: Arc<dyn FileStorage>,
    chunker: RequestSizeChunker,
    temp_dir: PathBuf,
}

impl TranslationDispatcher {
    /// Build a dispatcher whose clients come from `factory`
    pub fn new(
        config: &HandlerConfig,
        factory: Arc<dyn ProviderFactory>,
        store: Arc<dyn KeyValueStore>,
        storage: Arc<dyn FileStorage>,
    ) -> Self {
        let clients = Arc::new(ClientCache::new(factory));
        Self {
            settings: SettingsStore::new(store, Arc::clone(&clients)),
            clients,
            storage,
            chunker: RequestSizeChunker::new(config.max_request_bytes),
            temp_dir: config.temp_dir.clone(),
        }
    }

    /// Build a dispatcher talking to the DeepL API
    pub fn with_deepl(
        config: &HandlerConfig,
        store: Arc<dyn KeyValueStore>,
        storage: Arc<dyn FileStorage>,
    ) -> Self {
        let factory = DeepLFactory::new(config.timeout(), config.api_url.clone());
        Self::new(config, Arc::new(factory), store, storage)
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Provider options for the host's option flags
    pub fn text_options(options: &[TranslateOption]) -> TextOptions {
        if options.contains(&TranslateOption::StructuredMarkup) {
            TextOptions {
                tag_handling: Some(TagHandling::Xml),
                splitting_tags: SPLITTING_TAGS.iter().map(|t| t.to_string()).collect(),
            }
        } else {
            TextOptions::default()
        }
    }

    async fn client(&self) -> TranslatorResult<Arc<dyn TranslationProvider>> {
        let key = self.settings.auth_key()?;
        self.clients.client(&key).await
    }

    /// Translate texts from `source` (auto-detected when `None`) to `target`
    ///
    /// A batch that fits the request ceiling goes out as one request.
    /// Otherwise every text is sent on its own and oversized texts are split.
    ///
    /// # Errors
    ///
    /// `UnsupportedLanguage` for unknown locales, `MissingCredentials`
    /// without a stored key, and any provider error. A failure anywhere fails
    /// the whole batch.
    pub async fn translate(
        &self,
        texts: &[String],
        source: Option<&str>,
        target: &str,
        options: &[TranslateOption],
    ) -> TranslatorResult<Vec<String>> {
        let source = source.map(|code| map_language(code, true)).transpose()?;
        let target = map_language(target, false)?;
        let text_options = Self::text_options(options);

        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let client = self.client().await?;
        let batch_bytes = RequestSizeChunker::batch_size(texts);

        let results = if self.chunker.needs_chunking(texts) {
            tracing::debug!(
                items = texts.len(),
                bytes = batch_bytes,
                ceiling = self.chunker.max_bytes(),
                "Batch exceeds request ceiling, translating item by item"
            );
            let client = client.as_ref();
            let text_options = &text_options;
            self.chunker
                .chunk_translate(texts, move |piece| async move {
                    let translated = client
                        .translate_text(&[piece], source, target, text_options)
                        .await?;
                    single_result(translated)
                })
                .await?
        } else {
            tracing::debug!(items = texts.len(), bytes = batch_bytes, "Translating batch directly");
            client
                .translate_text(texts, source, target, &text_options)
                .await?
        };

        if results.len() != texts.len() {
            return Err(TranslatorError::Provider(format!(
                "expected {} translations, got {}",
                texts.len(),
                results.len()
            )));
        }

        Ok(results)
    }

    /// Translate documents into `target`, one job after another
    ///
    /// A job whose output already exists is not sent again. A failing job
    /// is logged and skipped; the others still run. Every job yields a path,
    /// which may not exist if its translation failed.
    ///
    /// # Errors
    ///
    /// Only `UnsupportedLanguage`, checked before any job runs.
    pub async fn translate_document(
        &self,
        jobs: &[DocumentJob],
        source: Option<&str>,
        target: &str,
        _options: &[TranslateOption],
    ) -> TranslatorResult<Vec<PathBuf>> {
        let source_code = source.map(|code| map_language(code, true)).transpose()?;
        let target_code = map_language(target, false)?;

        let mut paths = Vec::with_capacity(jobs.len());
        for job in jobs {
            let output = job.output_path(&self.temp_dir, target);

            if let Err(e) = self.run_document_job(job, &output, source_code, target_code).await {
                tracing::error!(
                    file = %job.original_filename,
                    locale = target,
                    error = %e,
                    "Document translation failed"
                );
            }

            paths.push(self.storage.realpath(&output).unwrap_or(output));
        }

        Ok(paths)
    }

    async fn run_document_job(
        &self,
        job: &DocumentJob,
        output: &Path,
        source: Option<&str>,
        target: &str,
    ) -> TranslatorResult<()> {
        if self.storage.exists(output) {
            tracing::debug!(output = %output.display(), "Translated document already present");
            return Ok(());
        }

        self.storage.fetch(&job.file_path)?;

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let client = self.client().await?;
        let status = client
            .translate_document(&job.file_path, output, source, target)
            .await?;

        if !status.done {
            return Err(TranslatorError::DocumentTranslation(
                status
                    .error_message
                    .unwrap_or_else(|| "Document translation did not finish".to_string()),
            ));
        }

        tracing::info!(
            file = %job.original_filename,
            output = %output.display(),
            "Document translated"
        );
        Ok(())
    }
}

fn single_result(mut translated: Vec<String>) -> TranslatorResult<String> {
    match translated.len() {
        1 => Ok(translated.remove(0)),
        n => Err(TranslatorError::Provider(format!(
            "expected 1 translation, got {}",
            n
        ))),
    }
}

impl std::fmt::Debug for TranslationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationDispatcher")
            .field("chunker", &self.chunker)
            .field("temp_dir", &self.temp_dir)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TranslatorHandler for TranslationDispatcher {
    fn identifier(&self) -> &str {
        "deepl"
    }

    fn settings_schema(&self) -> serde_json::Value {
        settings_schema()
    }

    async fn get_settings(&self) -> HandlerSettings {
        self.settings.get_settings().await
    }

    async fn store_settings(&self, settings: HandlerSettings) -> TranslatorResult<()> {
        self.settings.store_settings(settings).await
    }

    async fn delete_settings(&self) -> TranslatorResult<()> {
        self.settings.delete_settings().await
    }

    async fn translate(
        &self,
        texts: &[String],
        source: Option<&str>,
        target: &str,
        options: &[TranslateOption],
    ) -> TranslatorResult<Vec<String>> {
        TranslationDispatcher::translate(self, texts, source, target, options).await
    }

    async fn translate_document(
        &self,
        jobs: &[DocumentJob],
        source: Option<&str>,
        target: &str,
        options: &[TranslateOption],
    ) -> TranslatorResult<Vec<PathBuf>> {
        TranslationDispatcher::translate_document(self, jobs, source, target, options).await
    }

    fn is_allowed_language(&self, code: &str) -> bool {
        is_allowed_language(code)
    }
}
