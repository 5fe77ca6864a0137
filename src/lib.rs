//! DeepL translator handler for content-management hosts
//!
//! Exposes the host's translate / translate-document contract
//! ([`TranslatorHandler`]) on top of the DeepL API. Texts are mapped from
//! host locale codes to DeepL codes, and batches that exceed the provider's
//! request ceiling are split item by item, with oversized items cut into
//! pieces and glued back together in order.
//!
//! # Workflow Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use deepl_handler::{
//!     HandlerConfig, HandlerSettings, LocalFileStorage, MemoryStore, TranslateOption,
//!     TranslationDispatcher, TranslatorHandler,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handler = TranslationDispatcher::with_deepl(
//!         &HandlerConfig::from_env(),
//!         Arc::new(MemoryStore::new()),
//!         Arc::new(LocalFileStorage),
//!     );
//!     handler.store_settings(HandlerSettings::with_key("your-key:fx")).await?;
//!
//!     let texts = vec!["<paragraph>Guten Morgen</paragraph>".to_string()];
//!     let translated = handler
//!         .translate(&texts, Some("ger-DE"), "eng-GB", &[TranslateOption::StructuredMarkup])
//!         .await?;
//!     println!("{:?}", translated);
//!     Ok(())
//! }
//! ```

pub mod chunker;
pub mod config;
pub mod credentials;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod language;
pub mod provider;
pub mod settings;
pub mod storage;

// Integration tests (only available during testing)
#[cfg(test)]
mod integration_tests;

pub use chunker::{DEFAULT_MAX_REQUEST_BYTES, RequestSizeChunker};
pub use config::HandlerConfig;
pub use credentials::{ClientCache, DeepLFactory, ProviderFactory};
pub use dispatcher::TranslationDispatcher;
pub use error::{TranslatorError, TranslatorResult};
pub use handler::{TranslateOption, TranslatorHandler};
pub use language::{is_allowed_language, map_language};
pub use provider::{
    DeepLProvider, DocumentStatus, MockMode, MockProvider, TextOptions, TranslationProvider, Usage,
};
pub use settings::{
    HandlerSettings, JsonFileStore, KeyValueStore, MemoryStore, SettingsStore, settings_schema,
};
pub use storage::{DocumentJob, FileStorage, LocalFileStorage};
