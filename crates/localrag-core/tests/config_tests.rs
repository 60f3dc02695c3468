use std::fs;
use std::path::Path;

use localrag_core::config::{expand_path, resolve_with_base, Config, ProviderKind, Settings};
use localrag_core::Error;
use tempfile::TempDir;

#[test]
fn defaults_are_valid() {
    let settings = Settings::default();
    settings.validate().expect("defaults validate");
    assert_eq!(settings.chunking.chunk_size, 1000);
    assert_eq!(settings.chunking.overlap, 200);
    assert_eq!(settings.retrieval.top_k, 5);
    assert_eq!(settings.embedding.max_retries, 1);
}

#[test]
fn env_specific_file_overrides_base_file() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[chunking]\nchunk_size = 400\noverlap = 50\n\n[retrieval]\ntop_k = 3\n",
    )
    .unwrap();
    fs::write(tmp.path().join("config.test.toml"), "[retrieval]\ntop_k = 7\n").unwrap();

    let settings = Config::load_from(tmp.path(), "test").settings().expect("settings");
    assert_eq!(settings.chunking.chunk_size, 400);
    assert_eq!(settings.chunking.overlap, 50);
    assert_eq!(settings.retrieval.top_k, 7);
    assert_eq!(settings.embedding.model, "text-embedding-ada-002", "untouched keys keep defaults");

    let top_k: usize = Config::load_from(tmp.path(), "prod").get("retrieval.top_k").unwrap();
    assert_eq!(top_k, 3, "other environments ignore config.test.toml");
}

#[test]
fn invalid_chunking_is_a_startup_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[chunking]\nchunk_size = 100\noverlap = 100\n").unwrap();
    let err = Config::load_from(tmp.path(), "test").settings().expect_err("overlap == size");
    assert!(err.to_string().contains("overlap"), "got {err}");
}

#[test]
fn zero_top_k_is_rejected() {
    let mut settings = Settings::default();
    settings.retrieval.top_k = 0;
    assert!(matches!(settings.validate(), Err(Error::Config(_))));
}

#[test]
fn fake_provider_from_file() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[embedding]\nprovider = \"fake\"\nfake_dim = 64\n").unwrap();
    let settings = Config::load_from(tmp.path(), "dev").settings().unwrap();
    assert_eq!(settings.embedding.provider, ProviderKind::Fake);
    assert_eq!(settings.embedding.fake_dim, 64);
}

#[test]
fn relative_paths_resolve_against_base() {
    let base = Path::new("/srv/localrag");
    assert_eq!(resolve_with_base(base, "data"), base.join("data"));
    assert_eq!(resolve_with_base(base, "/abs/docs"), Path::new("/abs/docs"));
    assert_eq!(expand_path("plain/dir"), Path::new("plain/dir"));
}

#[test]
fn load_uses_working_directory_layering() {
    // crate directories carry no config.toml, so defaults come through
    let settings = Config::load().settings().expect("settings");
    assert_eq!(settings.embedding.model, "text-embedding-ada-002");
}
