//! End-to-end tests of the handler against the mock provider
//!
//! Each test drives [`TranslationDispatcher`] through the public
//! [`TranslatorHandler`] contract, the way a host would.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::provider::{DocumentFailure, MockCall, MockMode, MockProvider, TranslationProvider};
use crate::{
    HandlerConfig, HandlerSettings, LocalFileStorage, MemoryStore, TranslateOption,
    TranslationDispatcher, TranslatorError, TranslatorHandler, TranslatorResult,
};
use crate::storage::DocumentJob;

fn handler(provider: Arc<MockProvider>, config: HandlerConfig) -> TranslationDispatcher {
    let factory = move |_key: &str| -> TranslatorResult<Arc<dyn TranslationProvider>> {
        Ok(provider.clone())
    };
    TranslationDispatcher::new(
        &config,
        Arc::new(factory),
        Arc::new(MemoryStore::new()),
        Arc::new(LocalFileStorage),
    )
}

async fn configured(provider: Arc<MockProvider>, config: HandlerConfig) -> TranslationDispatcher {
    let handler = handler(provider, config);
    handler
        .store_settings(HandlerSettings::with_key("test-key"))
        .await
        .unwrap();
    handler
}

fn config_with_temp(temp_dir: &Path) -> HandlerConfig {
    HandlerConfig {
        temp_dir: temp_dir.to_path_buf(),
        ..HandlerConfig::default()
    }
}

fn write_job(dir: &Path, name: &str, content: &str) -> DocumentJob {
    let path = dir.join(format!("stored-{}", name));
    std::fs::write(&path, content).unwrap();
    DocumentJob::new(name, path)
}

// ============================================================================
// Chunked text translation
// ============================================================================

#[tokio::test]
async fn test_two_large_items_are_translated_whole_on_chunked_path() {
    let provider = Arc::new(MockProvider::new(MockMode::NoOp));
    let handler = configured(provider.clone(), HandlerConfig::default()).await;

    let items = vec!["a".repeat(50_000), "b".repeat(50_000)];
    let results = handler
        .translate(&items, Some("eng-GB"), "ger-DE", &[])
        .await
        .unwrap();

    assert_eq!(results, items);
    // batch exceeds 76824 bytes, so one call per item, none of them split
    let calls = provider.text_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], vec!["a".repeat(50_000)]);
    assert_eq!(calls[1], vec!["b".repeat(50_000)]);
}

#[tokio::test]
async fn test_batch_under_ceiling_is_one_call() {
    let provider = Arc::new(MockProvider::new(MockMode::Suffix));
    let handler = configured(provider.clone(), HandlerConfig::default()).await;

    let items = vec!["x".repeat(30_000), "y".repeat(30_000), "z".to_string()];
    let results = handler
        .translate(&items, None, "fre-FR", &[])
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[2], "z_fr");
    assert_eq!(provider.text_calls(), vec![items]);
}

#[tokio::test]
async fn test_oversized_item_split_into_ceiling_pieces() {
    let provider = Arc::new(MockProvider::new(MockMode::Suffix));
    let handler = configured(
        provider.clone(),
        HandlerConfig {
            max_request_bytes: 1_000,
            ..HandlerConfig::default()
        },
    )
    .await;

    let big = "q".repeat(2_500);
    let items = vec!["small".to_string(), big];
    let results = handler
        .translate(&items, Some("ger-DE"), "ita-IT", &[])
        .await
        .unwrap();

    let calls = provider.text_calls();
    // "small" + ceil(2500 / 1000) pieces
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[1][0].len(), 1_000);
    assert_eq!(calls[2][0].len(), 1_000);
    assert_eq!(calls[3][0].len(), 500);

    assert_eq!(results.len(), 2);
    assert_eq!(results[0], "small_it");
    let expected = format!(
        "{}_it{}_it{}_it",
        "q".repeat(1_000),
        "q".repeat(1_000),
        "q".repeat(500)
    );
    assert_eq!(results[1], expected);
}

#[tokio::test]
async fn test_failing_piece_fails_whole_batch() {
    let provider = Arc::new(MockProvider::new(MockMode::Error("quota".to_string())));
    let handler = configured(
        provider.clone(),
        HandlerConfig {
            max_request_bytes: 10,
            ..HandlerConfig::default()
        },
    )
    .await;

    let items = vec!["0123456789abcdef".to_string(), "tail".to_string()];
    let result = handler.translate(&items, None, "ger-DE", &[]).await;

    assert!(matches!(result, Err(TranslatorError::Provider(_))));
    // stopped at the first piece
    assert_eq!(provider.text_calls().len(), 1);
}

#[tokio::test]
async fn test_markup_flag_reaches_provider() {
    let provider = Arc::new(MockProvider::new(MockMode::NoOp));
    let handler = configured(provider.clone(), HandlerConfig::default()).await;

    let items = vec!["<paragraph>Hallo</paragraph>".to_string()];
    handler
        .translate(&items, Some("ger-DE"), "eng-GB", &[TranslateOption::StructuredMarkup])
        .await
        .unwrap();

    match &provider.calls()[0] {
        MockCall::Text { options, .. } => {
            assert_eq!(options.splitting_tags, vec!["paragraph", "c"]);
        }
        other => panic!("Expected text call, got {:?}", other),
    }
}

// ============================================================================
// Document translation
// ============================================================================

#[tokio::test]
async fn test_document_translated_to_deterministic_path() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(MockProvider::new(MockMode::Suffix));
    let handler = configured(provider.clone(), config_with_temp(&dir.path().join("out"))).await;

    let job = write_job(dir.path(), "letter.txt", "hello");
    let paths = handler
        .translate_document(&[job], Some("eng-GB"), "ger-DE", &[])
        .await
        .unwrap();

    assert_eq!(paths.len(), 1);
    assert!(paths[0].ends_with("ger-DE/ger-DE_letter.txt"));
    assert_eq!(std::fs::read_to_string(&paths[0]).unwrap(), "hello_de");

    match &provider.calls()[0] {
        MockCall::Document { source, target, .. } => {
            assert_eq!(source.as_deref(), Some("en"));
            assert_eq!(target, "de");
        }
        other => panic!("Expected document call, got {:?}", other),
    }
}

#[tokio::test]
async fn test_existing_output_is_not_translated_again() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(MockProvider::new(MockMode::Suffix));
    let handler = configured(provider.clone(), config_with_temp(&dir.path().join("out"))).await;

    let job = write_job(dir.path(), "letter.txt", "hello");
    let first = handler
        .translate_document(std::slice::from_ref(&job), None, "fre-FR", &[])
        .await
        .unwrap();
    let second = handler
        .translate_document(std::slice::from_ref(&job), None, "fre-FR", &[])
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(provider.document_call_count(), 1);
}

#[tokio::test]
async fn test_failing_job_does_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(
        MockProvider::new(MockMode::Suffix)
            .with_document_failure("stored-two.txt", DocumentFailure::Hard("boom".to_string())),
    );
    let handler = configured(provider.clone(), config_with_temp(&dir.path().join("out"))).await;

    let jobs = vec![
        write_job(dir.path(), "one.txt", "1"),
        write_job(dir.path(), "two.txt", "2"),
        write_job(dir.path(), "three.txt", "3"),
    ];
    let paths = handler
        .translate_document(&jobs, None, "ger-DE", &[])
        .await
        .unwrap();

    assert_eq!(paths.len(), 3);
    assert!(paths[0].ends_with("ger-DE_one.txt"));
    assert!(paths[1].ends_with("ger-DE_two.txt"));
    assert!(paths[2].ends_with("ger-DE_three.txt"));

    assert_eq!(std::fs::read_to_string(&paths[0]).unwrap(), "1_de");
    assert!(!paths[1].exists());
    assert_eq!(std::fs::read_to_string(&paths[2]).unwrap(), "3_de");
    assert_eq!(provider.document_call_count(), 3);
}

#[tokio::test]
async fn test_soft_failure_is_logged_and_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(
        MockProvider::new(MockMode::Suffix).with_document_failure(
            "stored-scan.pdf",
            DocumentFailure::Soft("Unsupported file".to_string()),
        ),
    );
    let handler = configured(provider.clone(), config_with_temp(&dir.path().join("out"))).await;

    let jobs = vec![
        write_job(dir.path(), "scan.pdf", "binary"),
        write_job(dir.path(), "notes.txt", "text"),
    ];
    let paths = handler
        .translate_document(&jobs, None, "swe-SE", &[])
        .await
        .unwrap();

    assert_eq!(paths.len(), 2);
    assert!(!paths[0].exists());
    assert_eq!(std::fs::read_to_string(&paths[1]).unwrap(), "text_sv");
}

#[tokio::test]
async fn test_missing_input_file_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(MockProvider::new(MockMode::Suffix));
    let handler = configured(provider.clone(), config_with_temp(&dir.path().join("out"))).await;

    let jobs = vec![
        DocumentJob::new("ghost.txt", dir.path().join("does-not-exist")),
        write_job(dir.path(), "real.txt", "r"),
    ];
    let paths = handler
        .translate_document(&jobs, None, "ger-DE", &[])
        .await
        .unwrap();

    assert_eq!(paths.len(), 2);
    assert!(!paths[0].exists());
    assert!(paths[1].exists());
    assert_eq!(provider.document_call_count(), 1);
}

#[tokio::test]
async fn test_document_unsupported_target_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(MockProvider::new(MockMode::Suffix));
    let handler = configured(provider.clone(), config_with_temp(dir.path())).await;

    let jobs = vec![write_job(dir.path(), "a.txt", "a")];
    let result = handler.translate_document(&jobs, None, "xyz-CC", &[]).await;

    assert!(matches!(result, Err(TranslatorError::UnsupportedLanguage(_))));
    assert_eq!(provider.document_call_count(), 0);
}

#[tokio::test]
async fn test_document_groups_keep_shape() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(MockProvider::new(MockMode::Suffix));
    let handler = configured(provider.clone(), config_with_temp(&dir.path().join("out"))).await;

    let groups = vec![
        vec![write_job(dir.path(), "a.txt", "a"), write_job(dir.path(), "b.txt", "b")],
        vec![],
        vec![write_job(dir.path(), "c.txt", "c")],
    ];
    let handler: &dyn TranslatorHandler = &handler;
    let paths: Vec<Vec<PathBuf>> = handler
        .translate_document_groups(&groups, None, "ger-DE", &[])
        .await
        .unwrap();

    assert_eq!(paths.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 0, 1]);
    assert!(paths[2][0].ends_with("ger-DE_c.txt"));
}

// ============================================================================
// Settings and credentials
// ============================================================================

#[tokio::test]
async fn test_settings_round_trip_through_handler() {
    let provider = Arc::new(MockProvider::new(MockMode::Suffix));
    let handler = handler(provider.clone(), HandlerConfig::default());

    let mut settings = HandlerSettings::with_key("k");
    settings.usage = Some("ignored".to_string());
    handler.store_settings(settings).await.unwrap();

    let read = handler.get_settings().await;
    assert_eq!(read.key.as_deref(), Some("k"));
    assert_ne!(read.usage.as_deref(), Some("ignored"));
    assert_eq!(read.usage.as_deref(), Some("Characters: 0 of 500000"));

    handler
        .store_settings(HandlerSettings::with_key(""))
        .await
        .unwrap();
    assert_eq!(handler.get_settings().await, HandlerSettings::default());
}

#[tokio::test]
async fn test_changing_key_rebuilds_client() {
    let created = Arc::new(std::sync::Mutex::new(Vec::new()));
    let log = Arc::clone(&created);
    let factory = move |key: &str| -> TranslatorResult<Arc<dyn TranslationProvider>> {
        log.lock().unwrap().push(key.to_string());
        Ok(Arc::new(MockProvider::new(MockMode::Suffix)))
    };
    let handler = TranslationDispatcher::new(
        &HandlerConfig::default(),
        Arc::new(factory),
        Arc::new(MemoryStore::new()),
        Arc::new(LocalFileStorage),
    );
    let items = vec!["x".to_string()];

    handler.store_settings(HandlerSettings::with_key("first")).await.unwrap();
    handler.translate(&items, None, "ger-DE", &[]).await.unwrap();
    handler.translate(&items, None, "ger-DE", &[]).await.unwrap();

    handler.store_settings(HandlerSettings::with_key("second")).await.unwrap();
    handler.translate(&items, None, "ger-DE", &[]).await.unwrap();

    assert_eq!(*created.lock().unwrap(), vec!["first", "second"]);
}
