use anyhow::Result;
use clap::{Parser, Subcommand};
use lightlink::{ChainSpecification, Request, WELL_KNOWN_NETWORKS};
use tracing::error;

#[derive(Parser)]
#[command(name = "lightlink")]
#[command(about = "Inspect chain specifications and JSON-RPC requests for light-client engines")]
#[command(version)]
struct Cli {
    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the chain specifications bundled with the crate
    Chains,
    /// Validate a chain specification file
    Validate {
        /// Path to a chain specification JSON file
        file: String,
    },
    /// Validate a JSON-RPC 2.0 request and print its canonical encoding
    Encode {
        /// Request JSON text
        json: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    match cli.command {
        Commands::Chains => {
            println!("Bundled chain specifications:");
            for network in WELL_KNOWN_NETWORKS {
                let spec = ChainSpecification::well_known(network)
                    .expect("well-known network is bundled");
                println!("  {network}: {} (id: {})", spec.name(), spec.id());
            }
        }

        Commands::Validate { file } => match ChainSpecification::from_file(&file) {
            Ok(spec) => {
                println!("✅ Valid chain specification:");
                println!("  Name: {}", spec.name());
                println!("  Id: {}", spec.id());
                println!("  Fields: {}", spec.document().len());
            }
            Err(e) => {
                error!("❌ Invalid chain specification: {}", e);
                std::process::exit(1);
            }
        },

        Commands::Encode { json } => match Request::from_json(&json) {
            Ok(request) => {
                println!("✅ Valid JSON-RPC 2.0 request:");
                println!("  Method: {}", request.method());
                match request.id() {
                    Some(id) => println!("  Id: {id}"),
                    None => println!("  Id: none (notification)"),
                }
                println!("  Encoded: {}", request.to_json()?);
            }
            Err(e) => {
                error!("❌ Invalid request: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
