// ZoneLens - tests/e2e_local.rs
//
// End-to-end tests for the local filesystem backend, zone resolution,
// the pattern playground, config loading, and settings persistence.
//
// These tests exercise a real directory tree on disk (tempfile), real walkdir
// traversal, and the real background-thread controllers.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use zonelens::app::debounce::PatternDebouncer;
use zonelens::app::settings::{Settings, Theme};
use zonelens::app::store::DesignerStore;
use zonelens::core::model::ZoneDraft;
use zonelens::core::provider::BlueprintProvider;
use zonelens::core::tree::flatten_paths;
use zonelens::platform::config::{load_config, AppConfig, BackendKind};
use zonelens::platform::fs::{build_tree, LocalProvider};
use zonelens::platform::open_provider;
use zonelens::util::error::ProviderError;

// =============================================================================
// Helpers
// =============================================================================

const TIMEOUT: Duration = Duration::from_secs(5);

/// Small Go-style project:
///
/// ```text
/// cmd/server/main.go
/// internal/api/handler.go
/// internal/api/handler_test.go
/// internal/apikeys/keys.go
/// web/index.html
/// go.mod
/// ```
fn sample_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let files = [
        "cmd/server/main.go",
        "internal/api/handler.go",
        "internal/api/handler_test.go",
        "internal/apikeys/keys.go",
        "web/index.html",
        "go.mod",
    ];
    for rel in files {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"").unwrap();
    }
    dir
}

fn local_store(root: &Path) -> (Arc<LocalProvider>, DesignerStore) {
    let provider = Arc::new(LocalProvider::new(root));
    let project = provider.catalog().project("").unwrap();
    let mut store = DesignerStore::new(provider.clone());
    store.select_project(project);
    assert!(store.wait(TIMEOUT), "load did not finish");
    assert!(store.error().is_none(), "load failed: {:?}", store.error());
    (provider, store)
}

// =============================================================================
// Local backend
// =============================================================================

#[test]
fn e2e_tree_lists_directories_first_with_relative_paths() {
    let dir = sample_project();
    let tree = build_tree(dir.path()).unwrap();

    assert!(tree.is_root());
    let names: Vec<&str> = tree.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["cmd", "internal", "web", "go.mod"]);

    let paths = flatten_paths(&tree);
    assert!(paths.contains(&"internal/api/handler.go"));
    assert!(paths.contains(&"cmd/server"));
    assert!(paths.iter().all(|p| !p.starts_with('/') && !p.contains('\\')));
}

#[test]
fn e2e_matching_uses_search_semantics_over_all_paths() {
    let dir = sample_project();
    let provider = LocalProvider::new(dir.path());
    let paths = provider.fetch_matching_paths(r"_test\.go$", "").unwrap();
    assert_eq!(paths, vec!["internal/api/handler_test.go"]);

    let paths = provider.fetch_matching_paths("api", "").unwrap();
    assert_eq!(
        paths,
        vec![
            "internal/api",
            "internal/api/handler.go",
            "internal/api/handler_test.go",
            "internal/apikeys",
            "internal/apikeys/keys.go",
        ]
    );
}

#[test]
fn e2e_invalid_pattern_and_missing_root() {
    let dir = sample_project();
    let provider = LocalProvider::new(dir.path());
    assert!(matches!(
        provider.fetch_matching_paths("[abc", ""),
        Err(ProviderError::InvalidPattern { .. })
    ));

    let missing = LocalProvider::new(&dir.path().join("nope"));
    assert!(matches!(
        missing.fetch_tree(""),
        Err(ProviderError::RootUnreadable { .. })
    ));
}

// =============================================================================
// Resolution through the store
// =============================================================================

#[test]
fn e2e_explicit_directory_claims_descendants_only() {
    let dir = sample_project();
    let (_, mut store) = local_store(dir.path());

    let zone = store
        .create_zone(ZoneDraft {
            name: "api".to_string(),
            ..Default::default()
        })
        .unwrap();
    store.assign_path(&zone.id, "internal/api/").unwrap();
    assert!(store.wait(TIMEOUT));

    let highlights = store.highlights().unwrap();
    assert!(highlights.is_highlighted("internal/api"));
    assert!(highlights.is_highlighted("internal/api/handler.go"));
    assert!(!highlights.is_highlighted("internal/apikeys"));
    assert!(!highlights.is_highlighted("internal/apikeys/keys.go"));
}

#[test]
fn e2e_pattern_and_explicit_zones_union() {
    let dir = sample_project();
    let (provider, mut store) = local_store(dir.path());

    store
        .create_zone(ZoneDraft {
            name: "tests".to_string(),
            pattern: r"_test\.go$".to_string(),
            ..Default::default()
        })
        .unwrap();
    let api = store
        .create_zone(ZoneDraft {
            name: "api".to_string(),
            ..Default::default()
        })
        .unwrap();
    store.assign_path(&api.id, "internal/api").unwrap();
    store
        .create_zone(ZoneDraft {
            name: "broken".to_string(),
            pattern: "(".to_string(),
            ..Default::default()
        })
        .unwrap();
    assert!(store.wait(TIMEOUT));

    let highlights = store.highlights().unwrap();
    assert_eq!(
        highlights.zones_for("internal/api/handler_test.go"),
        ["tests".to_string(), "api".to_string()]
    );
    assert_eq!(highlights.skipped.len(), 1);
    assert_eq!(highlights.skipped[0].zone, "broken");
    assert_eq!(provider.catalog().zones("").len(), 3);
}

#[test]
fn e2e_new_file_shows_up_after_refresh() {
    let dir = sample_project();
    let (_, mut store) = local_store(dir.path());
    store
        .create_zone(ZoneDraft {
            name: "web".to_string(),
            pattern: r"^web/".to_string(),
            ..Default::default()
        })
        .unwrap();
    assert!(store.wait(TIMEOUT));
    assert!(!store.highlights().unwrap().is_highlighted("web/app.js"));

    fs::write(dir.path().join("web/app.js"), b"").unwrap();
    store.refresh();
    assert!(store.wait(TIMEOUT));
    assert!(store.highlights().unwrap().is_highlighted("web/app.js"));
}

// =============================================================================
// Playground
// =============================================================================

#[test]
fn e2e_playground_against_local_tree() {
    let dir = sample_project();
    let provider = Arc::new(LocalProvider::new(dir.path()));
    let mut debouncer = PatternDebouncer::new(provider, "");

    let t0 = Instant::now();
    debouncer.set_pattern("go", t0);
    debouncer.set_pattern(r"\.mod$", t0 + Duration::from_millis(10));
    assert!(debouncer.poll(t0 + Duration::from_secs(1)));
    assert!(debouncer.wait(TIMEOUT));
    assert_eq!(debouncer.state().paths, vec!["go.mod"]);
    assert_eq!(debouncer.state().pattern, r"\.mod$");
}

// =============================================================================
// Config and settings
// =============================================================================

#[test]
fn e2e_config_selects_local_backend_with_seeds() {
    let project = sample_project();
    let cfg_dir = TempDir::new().unwrap();
    let cfg_path = cfg_dir.path().join("config.toml");
    let root = project.path().to_string_lossy().replace('\\', "/");
    fs::write(
        &cfg_path,
        format!(
            r#"
[backend]
kind = "local"
root_dir = "{root}"

[[zones]]
name = "entrypoints"
paths = ["cmd"]
"#
        ),
    )
    .unwrap();

    let (config, warnings) = load_config(&cfg_path);
    assert!(warnings.is_empty(), "{warnings:?}");
    assert_eq!(config.backend, BackendKind::Local);

    let provider = open_provider(&config).unwrap();
    let zones = provider.fetch_zones("").unwrap();
    assert_eq!(zones.len(), 1);
    assert!(zones[0].explicit_paths.contains("cmd"));
    assert!(provider.fetch_tree("").is_ok());
}

#[test]
fn e2e_missing_and_malformed_config() {
    let dir = TempDir::new().unwrap();
    let (config, warnings) = load_config(&dir.path().join("absent.toml"));
    assert!(warnings.is_empty());
    assert_eq!(config.backend, AppConfig::default().backend);

    let bad = dir.path().join("config.toml");
    fs::write(&bad, "[backend\nkind = ").unwrap();
    let (config, warnings) = load_config(&bad);
    assert_eq!(warnings.len(), 1);
    assert_eq!(config.backend, BackendKind::Mock);
}

#[test]
fn e2e_settings_round_trip() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");
    assert_eq!(Settings::load(&data_dir).theme, Theme::Light);

    Settings { theme: Theme::Dark }.save(&data_dir).unwrap();
    assert_eq!(Settings::load(&data_dir).theme, Theme::Dark);
}
