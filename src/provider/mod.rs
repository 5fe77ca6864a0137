//! Translation provider seam
//!
//! The handler never talks HTTP itself. Everything provider-specific sits
//! behind [`TranslationProvider`], so the dispatcher can be driven by the
//! real DeepL client or by the deterministic [`MockProvider`] in tests.
//!
//! # Example
//!
//! ```ignore
//! use deepl_handler::provider::{DeepLProvider, TextOptions, TranslationProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = DeepLProvider::new("your-key:fx".to_string(), std::time::Duration::from_secs(30))?;
//!     let texts = vec!["Hello".to_string(), "Goodbye".to_string()];
//!     let results = provider
//!         .translate_text(&texts, Some("en"), "de", &TextOptions::default())
//!         .await?;
//!     println!("{:?}", results);
//!     Ok(())
//! }
//! ```

pub mod deepl;
pub mod mock;

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TranslatorResult;

pub use deepl::DeepLProvider;
pub use mock::{DocumentFailure, MockCall, MockMode, MockProvider};

/// How the provider should treat markup in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagHandling {
    Xml,
}

impl TagHandling {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagHandling::Xml => "xml",
        }
    }
}

/// Per-request formatting options passed to the provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextOptions {
    /// Parse the text as markup instead of plain text
    pub tag_handling: Option<TagHandling>,
    /// Tags that always start a new sentence
    pub splitting_tags: Vec<String>,
}

/// Outcome of a document translation that ran to completion
///
/// A present `error_message` is a soft failure: the call itself went
/// through but the provider could not translate the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentStatus {
    pub done: bool,
    pub error_message: Option<String>,
}

impl DocumentStatus {
    pub fn done() -> Self {
        Self {
            done: true,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            done: false,
            error_message: Some(message.into()),
        }
    }
}

/// Account usage for the current billing period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Usage {
    pub character_count: u64,
    pub character_limit: u64,
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Characters: {} of {}",
            self.character_count, self.character_limit
        )
    }
}

/// A machine translation backend
///
/// Every method is one provider round-trip (document translation polls
/// until the provider is done). Implementations apply their own per-call
/// timeout and never retry.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Translate a batch of texts in one request
    ///
    /// `source` of `None` lets the provider detect the language. The result
    /// has one entry per input text, in input order.
    async fn translate_text(
        &self,
        texts: &[String],
        source: Option<&str>,
        target: &str,
        options: &TextOptions,
    ) -> TranslatorResult<Vec<String>>;

    /// Translate the file at `input` and write the result to `output`
    async fn translate_document(
        &self,
        input: &Path,
        output: &Path,
        source: Option<&str>,
        target: &str,
    ) -> TranslatorResult<DocumentStatus>;

    /// Current account usage
    async fn usage(&self) -> TranslatorResult<Usage>;

    /// Name of this provider, used in logs
    fn provider_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_display() {
        let usage = Usage {
            character_count: 1234,
            character_limit: 500000,
        };
        assert_eq!(usage.to_string(), "Characters: 1234 of 500000");
    }

    #[test]
    fn test_usage_deserializes_from_api_shape() {
        let usage: Usage =
            serde_json::from_str(r#"{"character_count": 10, "character_limit": 20}"#).unwrap();
        assert_eq!(usage.character_count, 10);
        assert_eq!(usage.character_limit, 20);
    }

    #[test]
    fn test_document_status_constructors() {
        assert!(DocumentStatus::done().error_message.is_none());
        let failed = DocumentStatus::failed("bad file");
        assert!(!failed.done);
        assert_eq!(failed.error_message.as_deref(), Some("bad file"));
    }

    #[test]
    fn test_tag_handling_names() {
        assert_eq!(TagHandling::Xml.as_str(), "xml");
        assert_eq!(
            serde_json::to_string(&TagHandling::Xml).unwrap(),
            "\"xml\""
        );
    }
}
