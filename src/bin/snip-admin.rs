use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use snip::allocator::{AllocateError, CodeAllocator};
use snip::config::Config;
use snip::shortcode::ShortCode;
use snip::storage;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "snip-admin")]
#[command(about = "Snip link registry management CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the urls table and indexes if missing
    Init,
    /// Shorten a URL, printing the existing code if it was shortened before
    Shorten {
        /// Absolute http(s) URL
        url: String,
    },
    /// Show the stored record for a short code
    Info {
        /// Six-character short code
        code: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Schema is created on connect
    let store = storage::connect(&config.database).await?;

    match cli.command {
        Commands::Init => {
            println!("✅ Database schema is ready");
        }
        Commands::Shorten { url } => {
            let allocator = CodeAllocator::new(Arc::clone(&store));
            match allocator.allocate(&url).await {
                Ok(allocation) => {
                    let status = if allocation.created { "Created" } else { "Existing" };
                    println!(
                        "✅ {}: {}/{} -> {}",
                        status,
                        config.public.base_url,
                        allocation.short_code(),
                        allocation.record.original_url
                    );
                }
                Err(AllocateError::InvalidUrl(e)) => bail!("{e}"),
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Info { code } => {
            let code = ShortCode::parse(&code)?;
            match store.find_by_code(code.as_str()).await? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => bail!("Short code '{}' not found", code),
            }
        }
    }

    Ok(())
}
