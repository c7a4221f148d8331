use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod catalog;
mod config;
mod embeddings;
mod intent;
mod recommend;
mod storage;
mod wishlist;

use intent::ShoppingIntent;

/// wishcart - voice shopping list assistant
/// Keeps per-user wishlists against a store catalog and recommends products
#[derive(Parser)]
#[command(name = "wishcart")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Shopping-list assistant with embedding-based recommendations", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and configuration
    Init,

    /// Load the starter catalog, skipping products that already exist
    Seed,

    /// List the store catalog
    Catalog,

    /// Show current status
    Status,

    /// Inspect or change a user's wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },

    /// Recommend products for a user based on their wishlist
    Recommend {
        /// Username
        username: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Normalize a transcribed voice command (and parse it with the language model when available)
    Parse {
        /// Transcribed text
        text: String,
    },
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Show a user's wishlist
    Show {
        username: String,
        /// Print the wishlist as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a product, matched against the catalog
    Add {
        username: String,
        product: String,
        #[arg(long, default_value = "1")]
        quantity: i64,
        #[arg(long, default_value = "unknown")]
        category: String,
    },

    /// Remove a product, matched against the wishlist
    Remove {
        username: String,
        product: String,
    },

    /// Apply an intent JSON object produced by the language model
    Apply {
        username: String,
        /// Intent JSON with product, quantity, category, action and status
        intent: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // JSON output goes to stdout, keep logs quiet unless asked
    let wants_json = matches!(
        cli.command,
        Commands::Recommend { json: true, .. }
            | Commands::Wishlist { action: WishlistAction::Show { json: true, .. } }
    );
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else if wants_json {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init => {
            info!("Initializing wishcart");
            storage::init().await?;
        }
        Commands::Seed => {
            catalog::seed_command().await?;
        }
        Commands::Catalog => {
            catalog::list_command().await?;
        }
        Commands::Status => {
            storage::show_status().await?;
        }
        Commands::Wishlist { action } => match action {
            WishlistAction::Show { username, json } => {
                wishlist::show_command(&username, json).await?;
            }
            WishlistAction::Add { username, product, quantity, category } => {
                let intent = manual_intent("add", product, quantity, category);
                wishlist::apply_command(&username, &intent).await?;
            }
            WishlistAction::Remove { username, product } => {
                let intent = manual_intent("remove", product, 1, "unknown".to_string());
                wishlist::apply_command(&username, &intent).await?;
            }
            WishlistAction::Apply { username, intent } => {
                wishlist::apply_json_command(&username, &intent).await?;
            }
        },
        Commands::Recommend { username, json } => {
            recommend::recommend_command(&username, json).await?;
        }
        Commands::Parse { text } => {
            let config = storage::load_config()?;
            intent::parse_command(&text, &config.intent).await?;
        }
    }

    Ok(())
}

fn manual_intent(action: &str, product: String, quantity: i64, category: String) -> ShoppingIntent {
    ShoppingIntent {
        product,
        quantity,
        category,
        action: action.to_string(),
        status: "manual".to_string(),
    }
}
