//! Environment-variable overrides. Kept in their own test binary because
//! they mutate process-wide env state.

use std::env;
use std::fs;

use localrag_core::config::{Config, ProviderKind};
use tempfile::TempDir;

#[test]
fn env_switches_accept_numeric_and_textual_bools() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[embedding]\nprovider = \"openai\"\n").unwrap();

    env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");
    env::set_var("APP_CHUNKING__CHUNK_SIZE", "800");
    let settings = Config::load_from(tmp.path(), "test").settings().expect("numeric switch");
    assert!(settings.use_fake_embeddings);
    assert_eq!(settings.embedding.provider, ProviderKind::Fake);
    assert_eq!(settings.chunking.chunk_size, 800);

    env::set_var("APP_USE_FAKE_EMBEDDINGS", "0");
    let settings = Config::load_from(tmp.path(), "test").settings().expect("numeric off");
    assert!(!settings.use_fake_embeddings);
    assert_eq!(settings.embedding.provider, ProviderKind::OpenAi);

    env::set_var("APP_USE_FAKE_EMBEDDINGS", "true");
    let settings = Config::load_from(tmp.path(), "test").settings().expect("textual switch");
    assert_eq!(settings.embedding.provider, ProviderKind::Fake);

    env::remove_var("APP_USE_FAKE_EMBEDDINGS");
    env::remove_var("APP_CHUNKING__CHUNK_SIZE");
}
