//! Error types for the translator handler

/// Everything that can go wrong while talking to the provider or the host.
///
/// Text translation propagates these to the caller. Document translation
/// logs them per job and carries on, and the settings usage lookup turns
/// them into display text.
#[derive(Debug, thiserror::Error)]
pub enum TranslatorError {
    /// Host locale code has no entry in the provider language table
    #[error("Language {0} not found in translator engine")]
    UnsupportedLanguage(String),

    /// No authentication key has been stored yet
    #[error("Missing credentials: no DeepL authentication key configured")]
    MissingCredentials,

    /// Provider rejected the key
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Account character quota is used up
    #[error("Quota exceeded for this billing period")]
    QuotaExceeded,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Provider answered, but not with something usable
    #[error("Provider error: {0}")]
    Provider(String),

    /// Transport failure, including timeouts
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Provider reported a failure for a single document
    #[error("Document translation failed: {0}")]
    DocumentTranslation(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for handler operations
pub type TranslatorResult<T> = Result<T, TranslatorError>;
