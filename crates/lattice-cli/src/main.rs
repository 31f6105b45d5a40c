// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Lattice developer CLI.
//!
//! Compiles a JSON object graph into a resource snapshot and prints the
//! dependency-ordered monikers, or the moniker map on its own. Logs go to
//! stderr and honour `RUST_LOG`.
//!
//! # Usage
//! ```text
//! lattice compile graph.json [--json] [--arg KEY=VALUE]...
//! lattice monikers graph.json
//! lattice config show
//! ```

// The CLI is expected to print to stdout.
#![allow(clippy::print_stdout)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context as _, Result};
use clap::{Parser, Subcommand};
use lattice_core::{
    assign_monikers, AssignConfig, CompileArgs, ContextBuilder, PackageName, Snapshot,
    SnapshotError,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;
mod document;

use config::{CliConfig, ConfigService, FsConfigStore, CLI_CONFIG_KEY};
use document::{GraphDocument, LoadedGraph, SnapshotReport};

#[derive(Parser, Debug)]
#[command(author, version, about = "Compile object graphs into resource snapshots")]
struct Cli {
    /// Directory holding `lattice.json` (defaults to the platform config dir)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
    /// Maximum edges moniker assignment may walk (overrides config)
    #[arg(long, global = true)]
    budget: Option<u64>,
    /// Package name recorded in the snapshot (overrides config)
    #[arg(long, global = true)]
    package: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a snapshot and print its resources in dependency order
    Compile {
        /// Object graph document (JSON)
        file: PathBuf,
        /// Emit a JSON report instead of plain text
        #[arg(long)]
        json: bool,
        /// Compile argument as KEY=VALUE (repeatable)
        #[arg(long = "arg", value_parser = parse_arg)]
        args: Vec<(String, String)>,
    },
    /// Print the moniker assigned to every reachable resource
    Monikers {
        /// Object graph document (JSON)
        file: PathBuf,
    },
    /// Inspect or update persisted settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective settings as JSON
    Show,
    /// Persist a new default traversal budget
    SetBudget {
        /// Budget in edges
        budget: u64,
    },
    /// Persist a default package name
    SetPackage {
        /// Package name
        name: String,
    },
}

fn parse_arg(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))?;
    if key.is_empty() {
        return Err(format!("empty key in {raw:?}"));
    }
    Ok((key.to_owned(), value.to_owned()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let store = match &cli.config_dir {
        Some(dir) => FsConfigStore::at(dir),
        None => FsConfigStore::new().context("locating config directory")?,
    };
    let service = ConfigService::new(store);
    let mut settings: CliConfig = service
        .load(CLI_CONFIG_KEY)
        .context("loading settings")?
        .unwrap_or_default();
    debug!(?settings, "loaded settings");

    match cli.command {
        Command::Compile { file, json, args } => {
            let assign = effective_assign(&settings, cli.budget);
            let pkg = PackageName::new(package_name(cli.package, &settings, &file));
            compile(&file, pkg, args.into_iter().collect(), &assign, json)
        }
        Command::Monikers { file } => {
            let assign = effective_assign(&settings, cli.budget);
            monikers(&file, &assign)
        }
        Command::Config { action } => {
            match action {
                ConfigAction::Show => {}
                ConfigAction::SetBudget { budget } => {
                    settings.assign = settings.assign.with_traversal_budget(budget);
                    service.save(CLI_CONFIG_KEY, &settings).context("saving settings")?;
                    info!(budget, "saved traversal budget");
                }
                ConfigAction::SetPackage { name } => {
                    settings.package = Some(name);
                    service.save(CLI_CONFIG_KEY, &settings).context("saving settings")?;
                    info!("saved default package");
                }
            }
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}

fn effective_assign(settings: &CliConfig, budget: Option<u64>) -> AssignConfig {
    match budget {
        Some(budget) => settings.assign.with_traversal_budget(budget),
        None => settings.assign,
    }
}

/// `--package`, then the configured default, then the graph file's stem.
fn package_name(flag: Option<String>, settings: &CliConfig, file: &Path) -> String {
    flag.or_else(|| settings.package.clone())
        .or_else(|| {
            file.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "default".to_owned())
}

fn load_graph(path: &Path) -> Result<LoadedGraph> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    GraphDocument::parse(&text)?
        .into_graph()
        .with_context(|| format!("building graph from {}", path.display()))
}

/// Rewrites snapshot errors so cycles name objects by label.
fn describe(err: SnapshotError, graph: &LoadedGraph) -> anyhow::Error {
    match err {
        SnapshotError::Cycle(cycle) => {
            let mut path: Vec<String> = cycle.cycle.iter().map(|id| graph.label(id)).collect();
            if let Some(first) = path.first().cloned() {
                path.push(first);
            }
            anyhow!("dependency cycle: {}", path.join(" -> "))
        }
        other => anyhow::Error::new(other),
    }
}

fn compile(
    path: &Path,
    pkg: PackageName,
    args: CompileArgs,
    assign: &AssignConfig,
    json: bool,
) -> Result<()> {
    let graph = load_graph(path)?;
    let snapshot = Snapshot::from_graph(ContextBuilder::new(), pkg, args, &graph.store, assign)
        .map_err(|err| describe(err, &graph))
        .with_context(|| format!("compiling {}", path.display()))?;

    if json {
        let report = SnapshotReport::new(&snapshot, &graph);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for resource in snapshot.resources() {
            println!("{}", resource.moniker());
        }
        println!("digest {}", snapshot.digest_hex());
    }
    Ok(())
}

fn monikers(path: &Path, assign: &AssignConfig) -> Result<()> {
    let graph = load_graph(path)?;
    let map = assign_monikers(&graph.store, assign).map_err(|err| describe(err, &graph))?;
    let by_moniker: BTreeMap<_, _> = map
        .iter()
        .map(|(id, moniker)| (moniker, graph.label(id)))
        .collect();
    debug!(count = by_moniker.len(), "assigned monikers");
    for (moniker, label) in by_moniker {
        println!("{moniker}\t{label}");
    }
    Ok(())
}
