// ZoneLens - platform/mod.rs
//
// Platform abstraction layer: backends, config, and platform directories.
// Dependencies: core model and provider trait, standard library, directories,
// walkdir, ureq.
// Must NOT depend on: app.

pub mod config;
pub mod fs;
pub mod http;
pub mod memory;

use crate::core::model::{Agent, ZoneDraft};
use crate::core::provider::BlueprintProvider;
use crate::core::tree::normalize_path;
use crate::util::error::ProviderError;
use config::{AppConfig, BackendKind};
use memory::Catalog;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Build the backend selected by `config`.
///
/// Seeds from config (zones, agents, ignored paths) are loaded into the mock
/// and local catalogs. The http backend owns its own data and ignores them;
/// `root_dir` selects the server-side root it asks for.
pub fn open_provider(config: &AppConfig) -> Result<Arc<dyn BlueprintProvider>, ProviderError> {
    let provider: Arc<dyn BlueprintProvider> = match config.backend {
        BackendKind::Mock => {
            let mock = memory::MockProvider::new();
            seed_catalog(mock.catalog(), config)?;
            Arc::new(mock)
        }
        BackendKind::Local => {
            let root = config
                .root_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from("."));
            let local = fs::LocalProvider::new(&root);
            seed_catalog(local.catalog(), config)?;
            Arc::new(local)
        }
        BackendKind::Http => {
            let seeds = config.zones.len() + config.agents.len() + config.ignored_paths.len();
            if seeds > 0 {
                tracing::warn!(count = seeds, "Config seeds are ignored by the http backend");
            }
            let root = config
                .root_dir
                .as_ref()
                .map(|r| r.to_string_lossy().into_owned())
                .unwrap_or_default();
            Arc::new(
                http::HttpProvider::new(
                    &config.backend_url,
                    Duration::from_secs(config.timeout_secs),
                )
                .with_root(&root),
            )
        }
    };
    tracing::info!(backend = provider.kind(), "Backend ready");
    Ok(provider)
}

fn seed_catalog(catalog: &Catalog, config: &AppConfig) -> Result<(), ProviderError> {
    for seed in &config.agents {
        catalog.add_agent(Agent {
            id: seed.id.clone(),
            name: seed.name.clone(),
            description: seed.description.clone(),
            prompt: seed.prompt.clone(),
        })?;
    }
    for path in config.ignored_paths.iter().map(|p| normalize_path(p)) {
        if path.is_empty() {
            tracing::warn!("The project root cannot be ignored; entry skipped");
            continue;
        }
        catalog.add_ignored_path("", &path)?;
    }
    for seed in &config.zones {
        let zone = catalog.create_zone(&ZoneDraft {
            name: seed.name.clone(),
            pattern: seed.pattern.clone(),
            purpose: seed.purpose.clone(),
            ..Default::default()
        })?;
        for path in &seed.paths {
            catalog.assign_path(&zone.id, &normalize_path(path))?;
        }
    }
    Ok(())
}
