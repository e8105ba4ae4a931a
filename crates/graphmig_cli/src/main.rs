//! `graphmig` command-line entry point.
//!
//! # Responsibility
//! - Load a project, report its model version, and run migrations or delint.
//! - Save only after the whole run succeeded and `--dry-run` is off.

use clap::{Parser, Subcommand, ValueEnum};
use graphmig_core::{
    default_log_level, delint, init_logging, open_store, ClassHierarchy, DelintReport,
    DomainObjectRepository, LogTarget, MigrationError, MigrationOutcome, MigrationRegistry,
    RunConfig, StoreKind,
};
use log::{error, info};
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(
    name = "graphmig",
    version,
    about = "Upgrade project object graphs between model versions"
)]
struct Cli {
    /// TOML run configuration; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Write rolling log files to this absolute directory instead of stderr
    #[arg(long = "log-dir", global = true)]
    log_dir: Option<PathBuf>,
    #[arg(long = "log-level", global = true)]
    log_level: Option<String>,
    /// Project format; inferred from the file extension when omitted
    #[arg(long, global = true, value_enum)]
    store: Option<StoreArg>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum StoreArg {
    Xml,
    Sqlite,
}

impl From<StoreArg> for StoreKind {
    fn from(value: StoreArg) -> Self {
        match value {
            StoreArg::Xml => StoreKind::Xml,
            StoreArg::Sqlite => StoreKind::Sqlite,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Show the stored model version and whether an upgrade is required
    Status {
        project: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Apply migration steps up to the target version
    Migrate {
        project: PathBuf,
        /// Stop at this version instead of the latest
        #[arg(long)]
        target: Option<u32>,
        /// Run every step but do not save
        #[arg(long = "dry-run", default_value_t = false)]
        dry_run: bool,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Remove zombies and dangling references without changing the version
    Delint {
        project: PathBuf,
        #[arg(long = "dry-run", default_value_t = false)]
        dry_run: bool,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Serialize)]
struct StatusReport {
    project: String,
    stored_version: u32,
    latest_version: Option<u32>,
    oldest_supported: Option<u32>,
    needs_migration: bool,
    objects: usize,
}

#[derive(Serialize)]
struct MigrateReport {
    status: &'static str,
    dry_run: bool,
    outcome: MigrationOutcome,
    delint: Option<DelintReport>,
    saved: bool,
    elapsed_ms: u128,
}

#[derive(Serialize)]
struct DelintRunReport {
    status: &'static str,
    dry_run: bool,
    report: DelintReport,
    saved: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            // Error displays already embed their causes.
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let mut config = match &cli.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(dir) = cli.log_dir {
        config.log_dir = Some(dir);
    }
    if let Some(store) = cli.store {
        config.store = Some(store.into());
    }
    start_logging(&config);

    match cli.command {
        Command::Status { project, json } => status(&project, &config, json),
        Command::Migrate {
            project,
            target,
            dry_run,
            json,
        } => {
            if target.is_some() {
                config.target_version = target;
            }
            migrate(&project, &config, dry_run, json)
        }
        Command::Delint {
            project,
            dry_run,
            json,
        } => delint_project(&project, &config, dry_run, json),
    }
}

fn start_logging(config: &RunConfig) {
    let target = match &config.log_dir {
        Some(dir) => LogTarget::Directory(dir.clone()),
        None => LogTarget::Stderr,
    };
    if let Err(message) = init_logging(&config.log_level, target) {
        eprintln!("warning: logging disabled: {message}");
        // A bad level should not also lose the fallback.
        let _ = init_logging(default_log_level(), LogTarget::Stderr);
    }
}

fn status(project: &Path, config: &RunConfig, json: bool) -> CliResult<()> {
    let store = open_store(project, config.store)?;
    let repo = store.load(ClassHierarchy::standard())?;
    let registry = MigrationRegistry::builtin();
    let stored_version = repo.current_version();

    let report = StatusReport {
        project: project.display().to_string(),
        stored_version,
        latest_version: registry.latest_version(),
        oldest_supported: registry.oldest_version(),
        needs_migration: registry.needs_migration(stored_version),
        objects: repo.len(),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("project: {}", report.project);
    println!("objects: {}", report.objects);
    println!("stored version: {}", report.stored_version);
    if let Some(latest) = report.latest_version {
        println!("latest version: {latest}");
    }
    match registry.check_supported(stored_version) {
        Err(MigrationError::VersionTooOld {
            oldest_supported, ..
        }) => println!(
            "warning: version {stored_version} predates {oldest_supported}; this release cannot upgrade it"
        ),
        Err(MigrationError::VersionTooNew {
            latest_supported, ..
        }) => println!(
            "warning: version {stored_version} is newer than {latest_supported}; use a newer release"
        ),
        _ if report.needs_migration => println!("upgrade required: run `graphmig migrate`"),
        _ => println!("up to date"),
    }
    Ok(())
}

fn migrate(project: &Path, config: &RunConfig, dry_run: bool, json: bool) -> CliResult<()> {
    let started_at = Instant::now();
    let mut store = open_store(project, config.store)?;
    let mut repo = store.load(ClassHierarchy::standard())?;
    let registry = MigrationRegistry::builtin();
    if let Err(err) = registry.check_supported(repo.current_version()) {
        if !json {
            eprintln!("warning: {err}");
        }
    }

    let outcome = registry.migrate(&mut repo, config.target_version)?;
    let delint_report = if config.delint_after_migration {
        Some(delint(&mut repo)?)
    } else {
        None
    };

    let changed = !outcome.is_noop() || delint_report.as_ref().is_some_and(|r| !r.is_clean());
    let saved = changed && !dry_run;
    if saved {
        store.save(&mut repo)?;
    }
    info!(
        "event=cli_migrate module=cli status=ok start_version={} end_version={} dry_run={dry_run} saved={saved}",
        outcome.start_version, outcome.end_version
    );

    let report = MigrateReport {
        status: if outcome.is_noop() { "up_to_date" } else { "migrated" },
        dry_run,
        outcome,
        delint: delint_report,
        saved,
        elapsed_ms: started_at.elapsed().as_millis(),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.outcome.is_noop() {
        println!("nothing to do at version {}", report.outcome.end_version);
    } else {
        println!(
            "migrated {} -> {} ({} steps){}",
            report.outcome.start_version,
            report.outcome.end_version,
            report.outcome.applied.len(),
            if dry_run { ", not saved (dry run)" } else { "" }
        );
    }
    Ok(())
}

fn delint_project(project: &Path, config: &RunConfig, dry_run: bool, json: bool) -> CliResult<()> {
    let mut store = open_store(project, config.store)?;
    let mut repo = store.load(ClassHierarchy::standard())?;
    let report = delint(&mut repo)?;
    let saved = !report.is_clean() && !dry_run;
    if saved {
        store.save(&mut repo)?;
    }

    if json {
        let report = DelintRunReport {
            status: if report.is_clean() { "clean" } else { "repaired" },
            dry_run,
            report,
            saved,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "removed {} zombies and {} dangling references{}",
            report.zombies_removed.len(),
            report.dangling_references_removed,
            if dry_run && !report.is_clean() {
                " (dry run, not saved)"
            } else {
                ""
            }
        );
    }
    Ok(())
}
