//! Contract between the host CMS and a translator backend
//!
//! The host only ever sees this trait: it lists handlers by identifier,
//! renders their settings form from the schema, checks which locales a
//! handler can serve and then asks for texts or documents to be translated.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TranslatorResult;
use crate::settings::HandlerSettings;
use crate::storage::DocumentJob;

/// Flags the host may pass along with a translation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslateOption {
    /// Texts are the host's structured XML (`<paragraph>`, `<c>`, ...)
    /// and must be translated tag-aware
    StructuredMarkup,
}

/// A translation backend as seen by the host
#[async_trait]
pub trait TranslatorHandler: Send + Sync {
    /// Stable identifier used by the host to pick this handler
    fn identifier(&self) -> &str;

    /// JSON schema of the settings form
    fn settings_schema(&self) -> serde_json::Value;

    async fn get_settings(&self) -> HandlerSettings;

    async fn store_settings(&self, settings: HandlerSettings) -> TranslatorResult<()>;

    async fn delete_settings(&self) -> TranslatorResult<()>;

    /// Translate texts; the result is index-aligned with `texts`
    async fn translate(
        &self,
        texts: &[String],
        source: Option<&str>,
        target: &str,
        options: &[TranslateOption],
    ) -> TranslatorResult<Vec<String>>;

    /// Translate documents; one output path per job, in job order
    async fn translate_document(
        &self,
        jobs: &[DocumentJob],
        source: Option<&str>,
        target: &str,
        options: &[TranslateOption],
    ) -> TranslatorResult<Vec<PathBuf>>;

    /// Translate documents grouped per content attribute
    ///
    /// Groups run in order through [`translate_document`](Self::translate_document)
    /// and the result keeps the grouping.
    async fn translate_document_groups(
        &self,
        groups: &[Vec<DocumentJob>],
        source: Option<&str>,
        target: &str,
        options: &[TranslateOption],
    ) -> TranslatorResult<Vec<Vec<PathBuf>>> {
        let mut results = Vec::with_capacity(groups.len());
        for group in groups {
            results.push(self.translate_document(group, source, target, options).await?);
        }
        Ok(results)
    }

    fn is_allowed_language(&self, code: &str) -> bool;
}
