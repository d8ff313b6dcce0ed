//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "compass",
    version,
    about = "Retrieval-augmented banking product recommendations",
    long_about = "Compass recommends a single banking product per customer by matching the \
                  customer's profile against a semantically indexed product knowledge base \
                  and asking an external language model to justify the best fit."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/compass/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the vector index from the knowledge base, or load it if current
    Index {
        /// Discard any persisted index and rebuild from scratch
        #[arg(long)]
        rebuild: bool,
    },

    /// Generate a product recommendation for a customer
    Recommend {
        /// Customer id from the processed customer table
        customer_id: u64,

        /// Emit the full recommendation record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Retrieve the nearest product descriptions for free-form text
    Search {
        /// Search query text
        query: String,

        /// Maximum number of results to return
        #[arg(short = 'k', long, default_value = "3")]
        limit: usize,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_recommend() {
        let cli = Cli::try_parse_from(["compass", "recommend", "125", "--json"]).unwrap();
        match cli.command {
            Commands::Recommend { customer_id, json } => {
                assert_eq!(customer_id, 125);
                assert!(json);
            }
            _ => panic!("expected recommend command"),
        }
    }

    #[test]
    fn parse_search_default_limit() {
        let cli = Cli::try_parse_from(["compass", "search", "low fee checking"]).unwrap();
        match cli.command {
            Commands::Search { limit, .. } => assert_eq!(limit, 3),
            _ => panic!("expected search command"),
        }
    }
}
