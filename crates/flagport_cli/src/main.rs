//! Migration orchestration entry point.
//!
//! # Responsibility
//! - Select a source-format migrator, wire its collaborators, run it once.
//! - Print success counts and every collected error string.
//!
//! # Invariants
//! - A run with zero successes but no fatal error exits successfully and
//!   reports "No features migrated."
//! - Only fatal migration failures and usage errors exit non-zero.

use flagport_core::db::open_db;
use flagport_core::{
    default_log_level, init_logging, FeatureFlagsMigrator, FeatureStatesMigrator, Migrator,
    SqliteEntityResolver, SqliteFlagDriver, SqliteSourceConnection, TagResolverRegistry,
};
use log::info;
use rusqlite::Connection;
use std::process::ExitCode;

const USAGE: &str = "usage: flagport_cli <feature-flags|feature-states> <source-db> <target-db> \
[--entity <tag>=<table>[:<kind>]]...

environment:
  FLAGPORT_LOG_DIR    absolute directory for rolling log files (optional)
  FLAGPORT_LOG_LEVEL  trace|debug|info|warn|error (default per build mode)";

struct Options {
    migrator: String,
    source_path: String,
    target_path: String,
    /// `(tag, table, kind)` triples for entity resolution.
    entities: Vec<(String, String, String)>,
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(code) => code,
        Err(message) => {
            eprintln!("error: {message}");
            eprintln!("{USAGE}");
            ExitCode::from(2)
        }
    }
}

fn run(args: &[String]) -> Result<ExitCode, String> {
    let options = parse_args(args)?;
    init_logging_from_env()?;

    let source = Connection::open(&options.source_path)
        .map_err(|err| format!("could not open source database: {err}"))?;
    let target =
        open_db(&options.target_path).map_err(|err| format!("could not open target store: {err}"))?;

    let mut registry = TagResolverRegistry::new();
    for (tag, table, kind) in &options.entities {
        let resolver = SqliteEntityResolver::try_new(&source, table.clone(), kind.clone())
            .map_err(|err| format!("could not register entity tag `{tag}`: {err}"))?;
        registry.register(tag.clone(), resolver);
    }

    let connection = SqliteSourceConnection::new(&source);
    let driver = SqliteFlagDriver::new(&target);
    let mut migrator: Box<dyn Migrator + '_> = match options.migrator.as_str() {
        "feature-flags" => Box::new(FeatureFlagsMigrator::new(connection, registry, driver)),
        "feature-states" => Box::new(FeatureStatesMigrator::new(connection, registry, driver)),
        other => return Err(format!("unknown migrator `{other}`")),
    };

    info!(
        "event=cli_run module=cli status=start migrator={} source={} target={}",
        options.migrator, options.source_path, options.target_path
    );

    let outcome = migrator.migrate();
    let stats = migrator.statistics();

    if stats.features == 0 {
        println!("No features migrated.");
    } else {
        println!(
            "Migrated {} features ({} contexts).",
            stats.features, stats.contexts
        );
    }
    for error in &stats.errors {
        println!("{error}");
    }

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            eprintln!("error: {err}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut positional = Vec::new();
    let mut entities = Vec::new();

    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--entity" => {
                let spec = args
                    .get(index + 1)
                    .ok_or("--entity requires a <tag>=<table>[:<kind>] argument")?;
                entities.push(parse_entity_spec(spec)?);
                index += 2;
            }
            "--help" | "-h" => return Err("help requested".to_string()),
            other => {
                positional.push(other.to_string());
                index += 1;
            }
        }
    }

    let [migrator, source_path, target_path] = <[String; 3]>::try_from(positional)
        .map_err(|_| "expected exactly three positional arguments".to_string())?;

    Ok(Options {
        migrator,
        source_path,
        target_path,
        entities,
    })
}

fn parse_entity_spec(spec: &str) -> Result<(String, String, String), String> {
    let (tag, rest) = spec
        .split_once('=')
        .ok_or_else(|| format!("invalid entity spec `{spec}`; expected <tag>=<table>[:<kind>]"))?;
    if tag.is_empty() || rest.is_empty() {
        return Err(format!("invalid entity spec `{spec}`"));
    }
    let (table, kind) = match rest.split_once(':') {
        Some((table, kind)) if !table.is_empty() && !kind.is_empty() => (table, kind),
        Some(_) => return Err(format!("invalid entity spec `{spec}`")),
        None => (rest, rest),
    };
    Ok((tag.to_string(), table.to_string(), kind.to_string()))
}

fn init_logging_from_env() -> Result<(), String> {
    let Ok(log_dir) = std::env::var("FLAGPORT_LOG_DIR") else {
        return Ok(());
    };
    let level =
        std::env::var("FLAGPORT_LOG_LEVEL").unwrap_or_else(|_| default_log_level().to_string());
    init_logging(&level, &log_dir)
}
