//! manifest-sync: Update a Lua manifest script from its branch archive.
//!
//! Reads the `addappid(...)` identifier from the script, downloads
//! `https://github.com/<repo>/archive/refs/heads/<identifier>.zip`, rewrites
//! every `setManifestid(...)` version found in the archive, and writes
//! `<identifier>.zip` to the output directory.
//!
//! # Usage
//!
//! ```bash
//! # Use the default repository from repo.json
//! manifest-sync 1234.lua
//!
//! # Pick a named repository and output directory
//! manifest-sync 1234.lua --repo FairyRoot --output ~/Desktop/updated
//! ```

use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use manifest_sync::{
    FetchConfig, Pipeline, PipelineConfig, RepositoryCatalog, RunContext, RunOutcome, Severity,
};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

/// Update the manifest versions of a Lua script and repackage it.
#[derive(Parser, Debug)]
#[command(name = "manifest-sync")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the .lua script
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Directory receiving <identifier>.zip
    #[arg(short, long, default_value = manifest_sync::config::DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// Repository name from the catalog (default: the catalog's default)
    #[arg(short, long)]
    repo: Option<String>,

    /// Repository catalog file
    #[arg(long, default_value = "repo.json")]
    repos_file: PathBuf,

    /// Write the built-in repository catalog to --repos-file if it is missing
    #[arg(long)]
    init_repos: bool,

    /// Host serving branch archives
    #[arg(long, default_value = manifest_sync::config::DEFAULT_ARCHIVE_HOST)]
    host: String,

    /// Download timeout in seconds
    #[arg(short, long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Validate TLS certificates of the archive host
    #[arg(long)]
    verify_tls: bool,

    /// Directory for temporary workspaces (default: system temp dir)
    #[arg(long)]
    temp_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    if args.init_repos && !args.repos_file.exists() {
        if let Err(e) = RepositoryCatalog::write_default(&args.repos_file) {
            error!("Failed to write {}: {}", args.repos_file.display(), e);
            process::exit(1);
        }
        info!("Wrote default catalog to {}", args.repos_file.display());
    }

    // Validate script path
    if !args.script.is_file() {
        error!("Script not found: {}", args.script.display());
        process::exit(1);
    }

    let catalog = match RepositoryCatalog::load(&args.repos_file) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load repositories: {}", e);
            process::exit(1);
        }
    };
    let repository = catalog.resolve(args.repo.as_deref()).to_string();

    let mut config = PipelineConfig::default().with_archive_host(&args.host);
    if let Some(temp_dir) = &args.temp_dir {
        config = config.with_temp_root(temp_dir);
    }
    let fetch = FetchConfig::default()
        .with_timeout(Duration::from_secs(args.timeout))
        .with_verify_tls(args.verify_tls);

    let pipeline = match Pipeline::with_http(config, fetch) {
        Ok(p) => Arc::new(p),
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            process::exit(1);
        }
    };

    let ctx = RunContext::new(&args.script, &args.output).with_repository(repository);
    let (events, handle) = pipeline.spawn(ctx);

    // Events are already logged by the pipeline; only surface warnings here
    // so they stand out in non-verbose output.
    for event in events {
        if event.severity == Severity::Warning {
            warn!("{}", event.message);
        }
    }

    match handle.join() {
        Ok(RunOutcome::Succeeded(report)) => {
            info!("Identifier: {}", report.app_id);
            info!("Manifest IDs updated: {}", report.replacements);
            info!("Manifest files packaged: {}", report.payload_count);
            if let Some(hash) = &report.archive_hash {
                info!("Archive hash: {}", hash);
            }
            println!("{}", report.output_path.display());
        }
        Ok(RunOutcome::Failed(failure)) => {
            error!("Update failed: {}", failure);
            process::exit(1);
        }
        Err(_) => {
            error!("Pipeline worker panicked");
            process::exit(1);
        }
    }
}
