use std::io::Write;

use serial_test::serial;

use super::*;

const ENV_KEYS: [&str; 9] = [
    "SQUADSENSE_STORE_BACKEND",
    "SQUADSENSE_QDRANT_URL",
    "SQUADSENSE_COLLECTION_PREFIX",
    "SQUADSENSE_CODE_MAX_CHARS",
    "SQUADSENSE_DOC_MAX_CHARS",
    "SQUADSENSE_DOC_OVERLAP_CHARS",
    "SQUADSENSE_INGEST_CONCURRENCY",
    "SQUADSENSE_TOP_K",
    "SQUADSENSE_LOG_LEVEL",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

#[test]
fn defaults() {
    let config = Config::default();
    assert_eq!(config.ingest.code_max_chars, 2048);
    assert_eq!(config.ingest.doc_max_chars, 1500);
    assert_eq!(config.ingest.doc_overlap_chars, 150);
    assert_eq!(config.ingest.upsert_batch, 64);
    assert!(config.ingest.concurrency >= 1);
    assert_eq!(config.store.backend, StoreBackend::Memory);
    assert_eq!(config.store.qdrant_url, "http://localhost:6334");
    assert_eq!(config.store.collection_prefix, "squadsense_");
    assert_eq!(config.store.embedding_dimensions, 384);
    assert_eq!(config.retrieval.default_top_k, 5);
    assert_eq!(config.logging.level, "info");
    config.validate().unwrap();
}

#[test]
#[serial]
fn missing_file_uses_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.ingest.code_max_chars, 2048);
}

#[test]
#[serial]
fn parse_valid_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("squadsense.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(
        f,
        r#"
[ingest]
code_max_chars = 1200
concurrency = 2

[store]
backend = "qdrant"
qdrant_url = "http://qdrant:6334"

[retrieval]
default_top_k = 8
"#
    )
    .unwrap();

    clear_env();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.ingest.code_max_chars, 1200);
    assert_eq!(config.ingest.doc_max_chars, 1500);
    assert_eq!(config.ingest.concurrency, 2);
    assert_eq!(config.store.backend, StoreBackend::Qdrant);
    assert_eq!(config.store.qdrant_url, "http://qdrant:6334");
    assert_eq!(config.store.collection_prefix, "squadsense_");
    assert_eq!(config.retrieval.default_top_k, 8);
}

#[test]
#[serial]
fn malformed_toml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[ingest\ncode_max_chars = ").unwrap();
    clear_env();

    let err = Config::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse config file"));
}

#[test]
#[serial]
fn env_overrides() {
    clear_env();
    let mut config = Config::default();

    unsafe {
        std::env::set_var("SQUADSENSE_STORE_BACKEND", "qdrant");
        std::env::set_var("SQUADSENSE_QDRANT_URL", "http://env:6334");
        std::env::set_var("SQUADSENSE_DOC_MAX_CHARS", "900");
        std::env::set_var("SQUADSENSE_TOP_K", "3");
        std::env::set_var("SQUADSENSE_LOG_LEVEL", "debug");
    };
    config.apply_env_overrides();
    clear_env();

    assert_eq!(config.store.backend, StoreBackend::Qdrant);
    assert_eq!(config.store.qdrant_url, "http://env:6334");
    assert_eq!(config.ingest.doc_max_chars, 900);
    assert_eq!(config.retrieval.default_top_k, 3);
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn invalid_env_values_ignored() {
    clear_env();
    let mut config = Config::default();

    unsafe {
        std::env::set_var("SQUADSENSE_STORE_BACKEND", "postgres");
        std::env::set_var("SQUADSENSE_CODE_MAX_CHARS", "lots");
    };
    config.apply_env_overrides();
    clear_env();

    assert_eq!(config.store.backend, StoreBackend::Memory);
    assert_eq!(config.ingest.code_max_chars, 2048);
}

#[test]
#[serial]
fn env_applied_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("squadsense.toml");
    std::fs::write(&path, "[ingest]\ncode_max_chars = 1000\n").unwrap();

    clear_env();
    unsafe { std::env::set_var("SQUADSENSE_CODE_MAX_CHARS", "3000") };
    let config = Config::load(&path);
    clear_env();

    assert_eq!(config.unwrap().ingest.code_max_chars, 3000);
}

#[test]
fn overlap_must_be_below_budget() {
    let mut config = Config::default();
    config.ingest.doc_overlap_chars = config.ingest.doc_max_chars;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("doc_overlap_chars"));
}

#[test]
fn zero_values_rejected() {
    let mut config = Config::default();
    config.ingest.code_max_chars = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.ingest.concurrency = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.store.embedding_dimensions = 0;
    assert!(config.validate().is_err());
}

#[test]
fn ingest_config_mirrors_settings() {
    let mut config = Config::default();
    config.ingest.code_max_chars = 1200;
    config.ingest.doc_overlap_chars = 100;
    let ingest = config.ingest_config();
    assert_eq!(ingest.merger.max_chars, 1200);
    assert_eq!(ingest.document.max_chars, 1500);
    assert_eq!(ingest.document.overlap_chars, 100);
    assert_eq!(ingest.upsert_batch, 64);
}
