//! flowbake main entry point
//!
//! This is the command-line interface for the flowbake static site exporter.

use clap::Parser;
use flowbake::config::{load_config_with_hash, Config};
use flowbake::crawler::run_export;
use flowbake::output::{print_statistics, DirectoryMaterializer, ExportStatistics, Materializer};
use flowbake::Site;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// flowbake: bake a hosted site into a static bundle
///
/// flowbake fetches every page of a site from its dev host, relocates marked
/// images, inlines a pruned stylesheet, and writes a bundle that references
/// the production target host.
#[derive(Parser, Debug)]
#[command(name = "flowbake")]
#[command(version)]
#[command(about = "Static exporter for hosted marketing sites", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Write the bundle here instead of the configured output directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Validate config and show what would be exported without any network access
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let output_dir = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.build.output_dir));

    if cli.dry_run {
        handle_dry_run(&config, &output_dir)?;
    } else {
        handle_export(&config, output_dir, cli.quiet).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("flowbake=info,warn"),
            1 => EnvFilter::new("flowbake=debug,info"),
            2 => EnvFilter::new("flowbake=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be exported
fn handle_dry_run(config: &Config, output_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let site = Site::from_config(config)?;

    println!("=== flowbake Dry Run ===\n");

    println!("Site:");
    println!("  Dev host: {}", site.dev_host());
    println!("  Target host: {}", site.target_host());

    println!("\nFetch:");
    println!("  Max attempts: {}", config.fetch.max_attempts);
    println!("  Retry delay: {}s", config.fetch.retry_delay_secs);
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  User agent: {}", config.fetch.user_agent);

    println!("\nBuild:");
    println!("  Output: {}", output_dir.display());
    println!("  Concurrency: {}", config.build.concurrency);
    println!("  Assets dir: {}", config.build.assets_dir);
    println!("  Image marker: {}", config.build.image_marker);
    println!("  Skip-sitemap marker: {}", config.build.skip_sitemap_marker);
    println!("  Skip-fetch marker: {}", config.build.skip_fetch_marker);
    println!("  Proxy: {}", config.build.proxy_url);

    println!("\nPlatform hosts:");
    for host in &config.platform.asset_hosts {
        println!("  - {} (assets)", host);
    }
    for host in &config.platform.library_hosts {
        println!("  - {} (library)", host);
    }

    println!("\nExtra files:");
    println!(
        "  robots.txt: {}",
        if config.robots_txt.is_some() {
            "configured"
        } else {
            "upstream, if published"
        }
    );
    println!("  _redirects: {}", yes_no(config.redirects.is_some()));
    println!("  _headers: {}", yes_no(config.headers.is_some()));

    println!("\n✓ Configuration is valid");
    println!("✓ Would export {} into {}", site.dev_url(""), output_dir.display());

    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Handles the main export operation
async fn handle_export(
    config: &Config,
    output_dir: PathBuf,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let bundle = match run_export(config).await {
        Ok(bundle) => bundle,
        Err(e) => {
            tracing::error!("Export failed: {}", e);
            return Err(e.into());
        }
    };

    let materializer = DirectoryMaterializer::new(output_dir);
    materializer.materialize(&bundle)?;

    if !quiet {
        let stats = ExportStatistics::from_bundle(&bundle, &config.build.assets_dir);
        print_statistics(&stats);
    }

    Ok(())
}
