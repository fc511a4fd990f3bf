//! Hemmer Config Generator CLI
//!
//! Command-line interface for generating configuration from the live objects
//! of a management API.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use hemmer_config_generator_client::{
    parse_duration, ApiClient, Auth, ClientConfig, DEFAULT_RETRIES,
};
use hemmer_config_generator_common::Catalog;
use hemmer_config_generator_discovery::{discover, RelationshipGraph, RootSelector};
use hemmer_config_generator_generator::{ConfigWriter, DEFAULT_REGISTRY};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "hemmer-config-generator")]
#[command(version, about = "Generate configuration from a live management API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover a root object and everything below it, then write configuration
    #[command(after_help = "EXAMPLES:\n  \
        # Generate configuration for one message VPN\n  \
        HEMMER_USERNAME=admin HEMMER_PASSWORD=admin \\\n  \
        hemmer-config-generator generate \\\n    \
        --catalog catalogs/solacebroker.yaml \\\n    \
        --url https://broker:1943 \\\n    \
        solacebroker_msg_vpn.mq default mq.tf\n\n  \
        # Multi-segment identifiers are '/'-separated, with '/' inside values escaped as %2F\n  \
        hemmer-config-generator generate \\\n    \
        --catalog catalogs/solacebroker.yaml \\\n    \
        solacebroker_msg_vpn_queue.orders default/orders orders")]
    Generate {
        /// Entity catalog (YAML, or JSON with a .json extension)
        #[arg(short, long)]
        catalog: PathBuf,

        #[command(flatten)]
        connection: ConnectionArgs,

        /// Registry host written into required_providers
        #[arg(long, env = "HEMMER_REGISTRY_OVERRIDE", default_value = DEFAULT_REGISTRY)]
        registry: String,

        /// Root resource as <type>[.<name>]
        address: String,

        /// '/'-separated values of the root type's path placeholders
        identifier: String,

        /// Output file (.tf is appended when missing)
        file: PathBuf,
    },

    /// Load a catalog and display its entity types and relationships
    #[command(after_help = "EXAMPLES:\n  \
        hemmer-config-generator catalog --catalog catalogs/solacebroker.yaml")]
    Catalog {
        /// Entity catalog (YAML, or JSON with a .json extension)
        #[arg(short, long)]
        catalog: PathBuf,
    },
}

/// Management API connection settings
#[derive(Args)]
struct ConnectionArgs {
    /// Base URL of the management API
    #[arg(long, env = "HEMMER_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Username for basic authentication
    #[arg(long, env = "HEMMER_USERNAME")]
    username: Option<String>,

    /// Password for basic authentication
    #[arg(long, env = "HEMMER_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Takes precedence over username and password
    #[arg(long, env = "HEMMER_BEARER_TOKEN", hide_env_values = true)]
    bearer_token: Option<String>,

    /// Retries on transport errors and HTTP 429
    #[arg(long, env = "HEMMER_RETRIES", default_value_t = DEFAULT_RETRIES)]
    retries: u32,

    /// First wait before a retry
    #[arg(long, env = "HEMMER_RETRY_MIN_INTERVAL", default_value = "3s", value_parser = parse_duration)]
    retry_min_interval: Duration,

    /// Longest wait between retries
    #[arg(long, env = "HEMMER_RETRY_MAX_INTERVAL", default_value = "30s", value_parser = parse_duration)]
    retry_max_interval: Duration,

    /// Timeout for a single request
    #[arg(long, env = "HEMMER_REQUEST_TIMEOUT_DURATION", default_value = "1m", value_parser = parse_duration)]
    request_timeout: Duration,

    /// Minimum time between two requests
    #[arg(long, env = "HEMMER_REQUEST_MIN_INTERVAL", default_value = "100ms", value_parser = parse_duration)]
    request_min_interval: Duration,

    /// Accept invalid TLS certificates
    #[arg(long, env = "HEMMER_INSECURE_SKIP_VERIFY")]
    insecure_skip_verify: bool,
}

impl ConnectionArgs {
    fn client_config(&self, base_path: &str) -> Result<ClientConfig> {
        let auth = Auth::from_credentials(
            self.username.clone(),
            self.password.clone(),
            self.bearer_token.clone(),
        )
        .context("Invalid credentials")?;

        let mut config = ClientConfig::new(&self.url, base_path, auth);
        config.retries = self.retries;
        config.retry_min_interval = self.retry_min_interval;
        config.retry_max_interval = self.retry_max_interval;
        config.request_timeout = self.request_timeout;
        config.request_min_interval = self.request_min_interval;
        config.insecure_skip_verify = self.insecure_skip_verify;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            catalog,
            connection,
            registry,
            address,
            identifier,
            file,
        } => generate_command(GenerateConfig {
            catalog_path: catalog.as_path(),
            connection: &connection,
            registry: &registry,
            address: &address,
            identifier: &identifier,
            output: file.as_path(),
        }),
        Commands::Catalog { catalog } => catalog_command(catalog.as_path(), cli.verbose),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "✗ Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; `RUST_LOG` overrides the level chosen by `--verbose`
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

struct GenerateConfig<'a> {
    catalog_path: &'a Path,
    connection: &'a ConnectionArgs,
    registry: &'a str,
    address: &'a str,
    identifier: &'a str,
    output: &'a Path,
}

fn generate_command(config: GenerateConfig) -> Result<()> {
    println!(
        "{} Loading catalog: {}",
        "→".cyan(),
        config.catalog_path.display()
    );
    let catalog = Catalog::load(config.catalog_path).context("Failed to load catalog")?;

    let client_config = config.connection.client_config(&catalog.api.base_path)?;
    let client = ApiClient::new(client_config).context("Failed to create API client")?;

    if let (Some(about_path), Some(version_field)) =
        (&catalog.api.about_path, &catalog.api.version_field)
    {
        match client.api_version(about_path, version_field) {
            Ok(Some(version)) => info!("Connected to {} (API version {})", config.connection.url, version),
            Ok(None) => info!("Connected to {}", config.connection.url),
            Err(e) => warn!("Could not query API version from {}: {}", about_path, e),
        }
    }

    println!(
        "{} Discovering {} '{}' from {}",
        "→".cyan(),
        config.address.yellow(),
        config.identifier,
        config.connection.url
    );
    let root = RootSelector::parse(config.address, config.identifier);
    let resources = discover(&catalog, &client, &root).context("Discovery failed")?;
    println!("{} Discovered {} resources", "✓".green(), resources.len());

    println!("{} Writing configuration...", "→".cyan());
    let writer = ConfigWriter::new(catalog.provider.clone(), config.registry)
        .context("Failed to create config writer")?;
    let path = writer
        .write(&resources, config.address, &config.connection.url, config.output)
        .context("Failed to write configuration")?;

    println!("\n{}", "✓ Generation complete!".green().bold());
    println!("  📄 {}", path.display());

    Ok(())
}

fn catalog_command(catalog_path: &Path, verbose: bool) -> Result<()> {
    println!(
        "{} Loading catalog: {}",
        "→".cyan(),
        catalog_path.display()
    );
    let catalog = Catalog::load(catalog_path).context("Failed to load catalog")?;
    let graph = RelationshipGraph::build(&catalog);

    println!("\n{}", "✓ Catalog loaded!".green().bold());
    println!("\n{}", "Provider:".bold());
    println!("  Name: {}", catalog.provider.name.yellow());
    println!("  Source: {}", catalog.provider.source.yellow());
    println!("  Entity types: {}", catalog.entities().len());

    println!("\n{}", "Relationships:".bold());
    for root in graph.roots() {
        for (depth, name) in graph.descendants(root) {
            let Some(entity) = catalog.entity(name) else {
                continue;
            };
            println!(
                "  {}• {} {}",
                "  ".repeat(depth),
                entity.output_type.cyan(),
                entity.path.as_str().dimmed()
            );
            if verbose {
                for attribute in &entity.attributes {
                    let marker = if attribute.identifying { " (identifying)" } else { "" };
                    println!(
                        "  {}    {}: {}{}",
                        "  ".repeat(depth),
                        attribute.name,
                        attribute.kind.as_str(),
                        marker
                    );
                }
            }
        }
    }

    Ok(())
}
