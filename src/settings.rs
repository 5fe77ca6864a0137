//! Provider credentials and account usage
//!
//! Settings are one JSON blob in the host's key/value store. Only the key
//! (plus any extra fields the host puts there) is persisted; `usage` is
//! derived from a live quota lookup every time settings are read.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::credentials::ClientCache;
use crate::error::{TranslatorError, TranslatorResult};

/// Storage key of the settings blob
pub const SETTINGS_STORAGE_KEY: &str = "deepl_settings";

/// String-keyed blob storage provided by the host
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> TranslatorResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> TranslatorResult<()>;
    fn remove(&self, key: &str) -> TranslatorResult<()>;
}

/// In-process store, mostly for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> TranslatorResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| TranslatorError::Settings("settings store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> TranslatorResult<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> TranslatorResult<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> TranslatorResult<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> TranslatorResult<serde_json::Map<String, serde_json::Value>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(serde_json::Map::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(serde_json::Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &serde_json::Map<String, serde_json::Value>) -> TranslatorResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> TranslatorResult<Option<String>> {
        Ok(self
            .read_all()?
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> TranslatorResult<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), json!(value));
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> TranslatorResult<()> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// Handler settings as exchanged with the host's configuration UI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandlerSettings {
    /// DeepL authentication key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Account usage text; derived, never persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    /// Fields this handler does not know about, kept as they are
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl HandlerSettings {
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    /// The key, if one is set and not blank
    pub fn auth_key(&self) -> Option<&str> {
        self.key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

/// JSON schema of the settings form
pub fn settings_schema() -> serde_json::Value {
    json!({
        "title": "DeepL",
        "type": "object",
        "properties": {
            "key": {
                "type": "string",
                "title": "Authentication key (from https://www.deepl.com/account/summary)",
            },
            "usage": {
                "type": "string",
                "title": "Account usage",
                "readonly": true,
            },
        },
    })
}

/// Persists credentials and answers usage lookups
#[derive(Clone)]
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
    clients: Arc<ClientCache>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KeyValueStore>, clients: Arc<ClientCache>) -> Self {
        Self { store, clients }
    }

    /// Persisted settings without the usage lookup
    ///
    /// A missing or unreadable blob reads as empty settings.
    pub fn load(&self) -> HandlerSettings {
        match self.store.get(SETTINGS_STORAGE_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Ignoring malformed stored settings");
                HandlerSettings::default()
            }),
            Ok(None) => HandlerSettings::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored settings");
                HandlerSettings::default()
            }
        }
    }

    /// Stored authentication key
    ///
    /// # Errors
    ///
    /// `MissingCredentials` when no usable key is stored.
    pub fn auth_key(&self) -> TranslatorResult<String> {
        self.load()
            .auth_key()
            .map(str::to_string)
            .ok_or(TranslatorError::MissingCredentials)
    }

    /// Settings with `usage` filled from a live lookup
    ///
    /// Never fails: if the lookup fails, `usage` holds the error text.
    pub async fn get_settings(&self) -> HandlerSettings {
        let mut settings = self.load();
        let Some(key) = settings.auth_key().map(str::to_string) else {
            return settings;
        };

        let usage = match self.clients.client(&key).await {
            Ok(client) => client.usage().await.map(|u| u.to_string()),
            Err(e) => Err(e),
        };

        settings.usage = Some(usage.unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Usage lookup failed");
            e.to_string()
        }));
        settings
    }

    /// Persist settings; a missing or blank key deletes them instead
    pub async fn store_settings(&self, mut settings: HandlerSettings) -> TranslatorResult<()> {
        settings.usage = None;
        if settings.auth_key().is_none() {
            return self.delete_settings().await;
        }

        self.store
            .set(SETTINGS_STORAGE_KEY, &serde_json::to_string(&settings)?)?;
        self.clients.invalidate().await;
        Ok(())
    }

    pub async fn delete_settings(&self) -> TranslatorResult<()> {
        self.store.remove(SETTINGS_STORAGE_KEY)?;
        self.clients.invalidate().await;
        Ok(())
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("clients", &self.clients)
            .finish_non_exhaustive()
    }
}
