//! ec2-instance-check - query the EC2 instance metadata service
//!
//! Each invocation builds one metadata resource from the given options and
//! answers a single question about it.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use ec2_instance_check::config::ConfigLoader;
use ec2_instance_check::{MetadataError, MetadataResource, ResourceConfig, Transport};

/// Exit status for a resource that was skipped
const EXIT_SKIPPED: u8 = 2;

#[derive(Parser)]
#[command(name = "ec2-instance-check")]
#[command(author, version, about = "Query the EC2 instance metadata service", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// YAML or JSON file with resource options
    #[arg(long, env = "EC2_INSTANCE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Inline YAML or JSON resource options
    #[arg(long, global = true)]
    options: Option<String>,

    /// Metadata API version ("latest" or e.g. 2016-06-30)
    #[arg(long, env = "EC2_METADATA_VERSION", global = true)]
    metadata_version: Option<String>,

    /// Connect timeout in seconds
    #[arg(long, env = "EC2_METADATA_TIMEOUT", global = true)]
    timeout: Option<String>,

    /// Path to the curl executable
    #[arg(long, env = "EC2_CURL_PATH", global = true)]
    curl_path: Option<String>,

    /// Path to the wget executable
    #[arg(long, env = "EC2_WGET_PATH", global = true)]
    wget_path: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that this machine is an EC2 instance
    Exists,
    /// Print a metadata property (e.g. meta-data/public-ipv4, user-data)
    Get {
        /// Property path below the API version
        property: String,
    },
    /// Show the resolved options and transport
    Resolve,
    /// Any other name is looked up as a property path
    #[command(external_subcommand)]
    Property(Vec<String>),
}

#[derive(Serialize)]
struct Resolution<'a> {
    config: &'a ResourceConfig,
    transport: &'a Transport,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, MetadataError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut loader = ConfigLoader::new()
        .with_optional_override("version", cli.metadata_version)
        .with_optional_override("timeout", cli.timeout)
        .with_optional_override("curl_path", cli.curl_path)
        .with_optional_override("wget_path", cli.wget_path);
    if let Some(path) = cli.config {
        loader = loader.with_file(path);
    }
    if let Some(options) = cli.options {
        loader = loader.with_inline(options);
    }
    let options = loader.load().await?;

    let resource = MetadataResource::new(options.as_ref()).await;
    if let Some(reason) = resource.skip_reason() {
        eprintln!("skipped: {}", reason);
        return Ok(ExitCode::from(EXIT_SKIPPED));
    }

    match cli.command {
        Commands::Exists => {
            let exists = resource.exists().await;
            info!("Instance metadata service identity check: {}", exists);
            println!("{}", exists);
            if !exists {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Get { property } => {
            print!("{}", resource.get(&property).await);
        }
        Commands::Resolve => {
            if let Some(config) = resource.config() {
                let resolution = Resolution {
                    config,
                    transport: resource.transport(),
                };
                println!("{}", serde_json::to_string_pretty(&resolution)?);
            }
        }
        Commands::Property(args) => {
            let property = args.first().ok_or_else(|| {
                MetadataError::Config("missing property name".to_string())
            })?;
            print!("{}", resource.get(property).await);
        }
    }

    Ok(ExitCode::SUCCESS)
}
