//! Mock translation provider for testing
//!
//! A deterministic, network-free provider. Besides producing predictable
//! translations it records every call, so tests can assert how many
//! provider round-trips a dispatch actually made and with what arguments.
//!
//! # Example
//!
//! ```ignore
//! use deepl_handler::provider::{MockMode, MockProvider, TextOptions, TranslationProvider};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockProvider::new(MockMode::Suffix);
//!     let texts = vec!["hello".to_string()];
//!     let result = mock.translate_text(&texts, Some("en"), "fr", &TextOptions::default()).await.unwrap();
//!     assert_eq!(result, vec!["hello_fr"]);
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{TranslatorError, TranslatorResult};
use crate::provider::{DocumentStatus, TextOptions, TranslationProvider, Usage};

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append target suffix: "hello" → "hello_fr"
    Suffix,

    /// Use predefined mappings: (text, target) → translation,
    /// falling back to suffix mode
    Mappings(HashMap<(String, String), String>),

    /// Every call fails with a provider error
    Error(String),

    /// Return input unchanged
    NoOp,
}

/// How a document job should fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentFailure {
    /// Call completes but reports an error message
    Soft(String),
    /// Call fails outright
    Hard(String),
}

/// A recorded provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Text {
        texts: Vec<String>,
        source: Option<String>,
        target: String,
        options: TextOptions,
    },
    Document {
        input: PathBuf,
        output: PathBuf,
        source: Option<String>,
        target: String,
    },
    Usage,
}

/// Mock provider that simulates translation and records its calls
#[derive(Debug)]
pub struct MockProvider {
    mode: MockMode,
    usage: Usage,
    /// Keyed by input file name
    document_failures: HashMap<String, DocumentFailure>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockProvider {
    /// Create a new MockProvider with the given mode
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            usage: Usage {
                character_count: 0,
                character_limit: 500_000,
            },
            document_failures: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Report this usage from [`TranslationProvider::usage`]
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    /// Make documents whose input file is named `file_name` fail
    pub fn with_document_failure(
        mut self,
        file_name: impl Into<String>,
        failure: DocumentFailure,
    ) -> Self {
        self.document_failures.insert(file_name.into(), failure);
        self
    }

    /// All calls so far, oldest first
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock_calls().clone()
    }

    /// Texts sent in each text call, one entry per call
    pub fn text_calls(&self) -> Vec<Vec<String>> {
        self.lock_calls()
            .iter()
            .filter_map(|call| match call {
                MockCall::Text { texts, .. } => Some(texts.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn document_call_count(&self) -> usize {
        self.lock_calls()
            .iter()
            .filter(|call| matches!(call, MockCall::Document { .. }))
            .count()
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<MockCall>> {
        // a poisoned log is still a usable log
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: MockCall) {
        self.lock_calls().push(call);
    }

    /// Apply translation logic based on the mode
    fn apply_translation(&self, text: &str, target: &str) -> TranslatorResult<String> {
        match &self.mode {
            MockMode::Suffix => Ok(format!("{}_{}", text, target)),
            MockMode::Mappings(map) => {
                let key = (text.to_string(), target.to_string());
                Ok(map
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| format!("{}_{}", text, target)))
            }
            MockMode::Error(msg) => Err(TranslatorError::Provider(msg.clone())),
            MockMode::NoOp => Ok(text.to_string()),
        }
    }
}

#[async_trait]
impl TranslationProvider for MockProvider {
    async fn translate_text(
        &self,
        texts: &[String],
        source: Option<&str>,
        target: &str,
        options: &TextOptions,
    ) -> TranslatorResult<Vec<String>> {
        self.record(MockCall::Text {
            texts: texts.to_vec(),
            source: source.map(str::to_string),
            target: target.to_string(),
            options: options.clone(),
        });

        texts
            .iter()
            .map(|text| self.apply_translation(text, target))
            .collect()
    }

    async fn translate_document(
        &self,
        input: &Path,
        output: &Path,
        source: Option<&str>,
        target: &str,
    ) -> TranslatorResult<DocumentStatus> {
        self.record(MockCall::Document {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            source: source.map(str::to_string),
            target: target.to_string(),
        });

        let file_name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match self.document_failures.get(&file_name) {
            Some(DocumentFailure::Soft(msg)) => return Ok(DocumentStatus::failed(msg.clone())),
            Some(DocumentFailure::Hard(msg)) => {
                return Err(TranslatorError::DocumentTranslation(msg.clone()));
            }
            None => {}
        }

        let content = tokio::fs::read_to_string(input).await?;
        let translated = self.apply_translation(&content, target)?;
        tokio::fs::write(output, translated).await?;

        Ok(DocumentStatus::done())
    }

    async fn usage(&self) -> TranslatorResult<Usage> {
        self.record(MockCall::Usage);
        match &self.mode {
            MockMode::Error(msg) => Err(TranslatorError::Provider(msg.clone())),
            _ => Ok(self.usage),
        }
    }

    fn provider_name(&self) -> &str {
        "Mock Provider"
    }
}
