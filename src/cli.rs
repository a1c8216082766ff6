// ZoneLens - cli.rs
//
// Command execution for the binary. Each subcommand opens the configured
// backend, drives the library controllers, and prints text or JSON to stdout.
// Diagnostics go to stderr through tracing.

use crate::app::debounce::{MatchState, PatternDebouncer};
use crate::app::settings::{Settings, Theme};
use crate::app::store::DesignerStore;
use crate::core::model::{Project, TreeNode, ZoneDraft, ZoneHighlights};
use crate::core::pattern;
use crate::core::provider::{BlueprintProvider, ProviderMatcher};
use crate::core::tree::{find_node, normalize_path};
use crate::platform::config::{AppConfig, PlatformPaths};
use crate::platform::open_provider;
use crate::util::constants::{COMMAND_WAIT_SECS, PLAYGROUND_TICK_MS};
use crate::util::error::{ProviderError, Result, ZoneLensError};
use crate::{Command, ThemeArg};
use serde::Serialize;
use std::io::BufRead;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Flags shared by every subcommand.
pub struct Options {
    pub project: String,
    pub json: bool,
}

pub fn run(command: Command, config: &AppConfig, paths: &PlatformPaths, opts: &Options) -> Result<()> {
    if let Command::Theme { value } = command {
        return theme(value, paths, opts);
    }

    let provider = open_provider(config)?;
    match command {
        Command::Projects => print_list(opts, &provider.list_projects()?, |p| {
            format!("{}\t{}\t{}", p.id, p.name, p.root_dir)
        }),
        Command::Agents => print_list(opts, &provider.list_agents()?, |a| {
            format!("{}\t{}\t{}", a.id, a.name, a.description)
        }),
        Command::Zones => {
            let project = pick_project(provider.as_ref(), &opts.project)?;
            print_list(opts, &provider.fetch_zones(&project.id)?, |z| {
                format!("{}\t{}\t{}", z.id, z.name, z.pattern)
            })
        }
        Command::Tree { all, at } => {
            let store = load_store(provider, &opts.project)?;
            let tree = if all {
                store.tree().cloned()
            } else {
                store.visible_tree()
            };
            let Some(mut tree) = tree else {
                return Ok(());
            };
            if let Some(at) = at {
                let at = normalize_path(&at);
                tree = find_node(&tree, &at)
                    .cloned()
                    .ok_or(ProviderError::NotFound {
                        kind: "path",
                        id: at,
                    })?;
            }
            if opts.json {
                return print_json(&tree);
            }
            let highlights = store.highlights().cloned().unwrap_or_default();
            print_tree(&tree, &highlights, 0);
            Ok(())
        }
        Command::Match { pattern } => {
            let project = pick_project(provider.as_ref(), &opts.project)?;
            let matcher = ProviderMatcher::new(provider.as_ref(), &project.id);
            let matches = pattern::evaluate(&pattern, &matcher)?;
            print_list(opts, &matches, String::clone)
        }
        Command::Resolve => {
            let store = load_store(provider, &opts.project)?;
            let highlights = store.highlights().cloned().unwrap_or_default();
            if opts.json {
                return print_json(&highlights);
            }
            for (path, zones) in &highlights.path_to_zones {
                println!("{}\t{}", display_path(path), zones.join(", "));
            }
            for skipped in &highlights.skipped {
                eprintln!("skipped zone '{}': {}", skipped.zone, skipped.reason);
            }
            Ok(())
        }
        Command::CreateZone {
            name,
            pattern,
            purpose,
            constraints,
            agent,
        } => {
            let mut store = load_store(provider, &opts.project)?;
            let zone = store.create_zone(ZoneDraft {
                project_id: String::new(),
                name,
                pattern,
                purpose,
                constraints,
                assigned_agent_id: agent,
            })?;
            wait_for(&mut store)?;
            print_one(opts, &zone, |z| format!("{}\t{}", z.id, z.name))
        }
        Command::Assign { zone_id, path } => {
            let mut store = load_store(provider, &opts.project)?;
            let zone = store.assign_path(&zone_id, &path)?;
            wait_for(&mut store)?;
            print_one(opts, &zone, |z| {
                let paths: Vec<&str> = z.explicit_paths.iter().map(|p| display_path(p)).collect();
                format!("{}\t{}\t{}", z.id, z.name, paths.join(", "))
            })
        }
        Command::Ignore { path } => {
            let mut store = load_store(provider, &opts.project)?;
            let project = store.ignore_path(&path)?;
            print_ignored(opts, &project)
        }
        Command::Unignore { path } => {
            let mut store = load_store(provider, &opts.project)?;
            let project = store.unignore_path(&path)?;
            print_ignored(opts, &project)
        }
        Command::Playground => {
            let project = pick_project(provider.as_ref(), &opts.project)?;
            playground(provider, &project.id, opts)
        }
        Command::Theme { .. } => Ok(()),
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// The project named by `id`, or the backend's first project when `id` is
/// empty. A backend with no projects yields its implicit default project.
fn pick_project(provider: &dyn BlueprintProvider, id: &str) -> Result<Project> {
    let projects = provider.list_projects()?;
    let found = if id.is_empty() {
        projects.into_iter().next()
    } else {
        projects.into_iter().find(|p| p.id == id)
    };
    match found {
        Some(project) => Ok(project),
        None if id.is_empty() => Ok(Project::default()),
        None => Err(ProviderError::NotFound {
            kind: "project",
            id: id.to_string(),
        }
        .into()),
    }
}

fn load_store(provider: Arc<dyn BlueprintProvider>, project_id: &str) -> Result<DesignerStore> {
    let project = pick_project(provider.as_ref(), project_id)?;
    let mut store = DesignerStore::new(provider);
    store.select_project(project);
    wait_for(&mut store)?;
    Ok(store)
}

fn wait_for(store: &mut DesignerStore) -> Result<()> {
    if !store.wait(Duration::from_secs(COMMAND_WAIT_SECS)) {
        tracing::warn!("Timed out waiting for project load");
    }
    match store.take_error() {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "."
    } else {
        path
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(ZoneLensError::Render)?;
    println!("{text}");
    Ok(())
}

fn print_list<T: Serialize>(opts: &Options, items: &[T], line: impl Fn(&T) -> String) -> Result<()> {
    if opts.json {
        return print_json(items);
    }
    for item in items {
        println!("{}", line(item));
    }
    Ok(())
}

fn print_one<T: Serialize>(opts: &Options, item: &T, line: impl Fn(&T) -> String) -> Result<()> {
    if opts.json {
        return print_json(item);
    }
    println!("{}", line(item));
    Ok(())
}

fn print_ignored(opts: &Options, project: &Project) -> Result<()> {
    if opts.json {
        return print_json(project);
    }
    for path in &project.ignored_paths {
        println!("{path}");
    }
    Ok(())
}

fn print_tree(node: &TreeNode, highlights: &ZoneHighlights, depth: usize) {
    let marker = if node.is_directory { "/" } else { "" };
    let zones = highlights.zones_for(&node.path);
    if zones.is_empty() {
        println!("{:indent$}{}{marker}", "", node.name, indent = depth * 2);
    } else {
        println!(
            "{:indent$}{}{marker}  [{}]",
            "",
            node.name,
            zones.join(", "),
            indent = depth * 2
        );
    }
    for child in &node.children {
        print_tree(child, highlights, depth + 1);
    }
}

// =============================================================================
// Playground
// =============================================================================

/// Each stdin line replaces the pattern, as if typed into the input field.
/// Settled results are printed; EOF drains pending work and exits.
fn playground(provider: Arc<dyn BlueprintProvider>, project_id: &str, opts: &Options) -> Result<()> {
    let (tx, rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let tick = Duration::from_millis(PLAYGROUND_TICK_MS);
    let mut debouncer = PatternDebouncer::new(provider, project_id);
    let mut input_open = true;

    loop {
        let now = Instant::now();
        if debouncer.poll(now) && !debouncer.state().loading {
            report(debouncer.state(), opts)?;
        }

        let wait = debouncer
            .next_deadline()
            .map_or(tick, |d| d.saturating_duration_since(now).min(tick));

        if !input_open {
            if debouncer.next_deadline().is_none() && !debouncer.state().loading {
                return Ok(());
            }
            std::thread::sleep(wait);
            continue;
        }

        match rx.recv_timeout(wait) {
            Ok(line) => {
                debouncer.set_pattern(&line, Instant::now());
                if line.trim().is_empty() {
                    report(debouncer.state(), opts)?;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => input_open = false,
        }
    }
}

fn report(state: &MatchState, opts: &Options) -> Result<()> {
    if opts.json {
        let value = serde_json::json!({
            "pattern": state.pattern,
            "paths": state.paths,
            "error": state.error.as_ref().map(ToString::to_string),
            "invalid_pattern": state.invalid_pattern(),
        });
        return print_json(&value);
    }
    match &state.error {
        Some(e) if state.invalid_pattern() => println!("invalid pattern: {e}"),
        Some(e) => println!("error (retryable): {e}"),
        None if state.pattern.is_empty() => println!("(idle)"),
        None => {
            println!("{}: {} match(es)", state.pattern, state.paths.len());
            for path in &state.paths {
                println!("  {}", display_path(path));
            }
        }
    }
    Ok(())
}

// =============================================================================
// Theme
// =============================================================================

fn theme(value: Option<ThemeArg>, paths: &PlatformPaths, opts: &Options) -> Result<()> {
    let mut settings = Settings::load(&paths.data_dir);
    if let Some(value) = value {
        settings.theme = match value {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Toggle => settings.theme.toggled(),
        };
        settings.save(&paths.data_dir)?;
        tracing::info!(theme = %settings.theme, "Theme saved");
    }
    print_one(opts, &settings, |s| s.theme.to_string())
}
