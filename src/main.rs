use compass::cli::{Cli, Commands, ConfigAction};
use compass::config::Config;
use compass::error::{CompassError, Result};
use compass::llm::GroqClient;
use compass::profile::ProfileStore;
use compass::recommend::{Recommender, ResourceCell};
use std::sync::Arc;

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse_args();

    match cli.command {
        Commands::Index { rebuild } => {
            cmd_index(cli.config, rebuild)?;
        }
        Commands::Recommend { customer_id, json } => {
            cmd_recommend(cli.config, customer_id, json)?;
        }
        Commands::Search { query, limit, json } => {
            cmd_search(cli.config, &query, limit, json)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("compass=info"));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn cmd_index(config_path: Option<std::path::PathBuf>, rebuild: bool) -> Result<()> {
    let config = load_config(config_path)?;

    let resources = if rebuild {
        compass::recommend::Resources::rebuild(&config)?
    } else {
        compass::recommend::Resources::open(&config)?
    };

    println!("✓ Index ready");
    println!("  Documents: {}", resources.knowledge.len());
    println!(
        "  Vectors:   {} ({}D, {})",
        resources.index.len(),
        resources.index.dimension(),
        resources.provider.model_name()
    );
    println!("  Artifact:  {}", config.index_path().display());

    Ok(())
}

fn cmd_recommend(
    config_path: Option<std::path::PathBuf>,
    customer_id: u64,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;

    // Credentials are resolved before any per-request work: a missing key is
    // a startup failure, not a request failure.
    let client = Arc::new(GroqClient::from_env(&config.llm)?);

    let profiles = Arc::new(ProfileStore::load(&config.profiles.path)?);

    let rt = tokio::runtime::Runtime::new().map_err(|e| CompassError::Io {
        source: e,
        context: "Failed to create tokio runtime".to_string(),
    })?;

    rt.block_on(async {
        let cell = ResourceCell::new();
        let resources = cell.get_or_open(&config).await?;

        let recommender = Recommender::new(
            resources,
            profiles,
            client,
            config.llm.model.clone(),
            config.llm.temperature,
            config.retrieval.top_k,
        );

        let recommendation = match recommender.recommend(customer_id).await {
            Ok(r) => r,
            Err(CompassError::CustomerNotFound { id }) => {
                println!("Customer {} was not found in the profile table.", id);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if json {
            let rendered = serde_json::to_string_pretty(&recommendation).map_err(|e| {
                CompassError::Json {
                    source: e,
                    context: "Failed to serialize recommendation".to_string(),
                }
            })?;
            println!("{}", rendered);
        } else {
            println!("Customer {}", recommendation.customer_id);
            println!("  {}", recommendation.query);
            println!("\nRetrieved products:");
            for (i, doc) in recommendation.documents.iter().enumerate() {
                let headline = doc.text.lines().next().unwrap_or_default();
                println!("  {}. {} (distance {:.4})", i + 1, headline, doc.distance);
            }
            println!("\nRecommendation ({}):", recommendation.model);
            println!("{}", recommendation.text);
        }

        Ok(())
    })
}

fn cmd_search(
    config_path: Option<std::path::PathBuf>,
    query: &str,
    limit: usize,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let resources = compass::recommend::Resources::open(&config)?;

    let results = resources.search(query, limit)?;

    if json {
        let rendered =
            serde_json::to_string_pretty(&results).map_err(|e| CompassError::Json {
                source: e,
                context: "Failed to serialize search results".to_string(),
            })?;
        println!("{}", rendered);
    } else {
        for (i, doc) in results.iter().enumerate() {
            let headline = doc.text.lines().next().unwrap_or_default();
            println!("{}. {} (distance {:.4})", i + 1, headline, doc.distance);
        }
    }

    Ok(())
}

fn cmd_config(config_path: Option<std::path::PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            let json = serde_json::to_string_pretty(&config).map_err(|e| CompassError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;
            println!("{}", json);
        }
        ConfigAction::Validate { file } => {
            let path = match file {
                Some(p) => p,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = Config::default_path()?;

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| CompassError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            let config = Config::default();
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<std::path::PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(p) => p,
        None => Config::default_path()?,
    };

    let mut config = if path.exists() {
        Config::load(&path)?
    } else {
        tracing::warn!(
            "Config file not found, using defaults. Run 'compass config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    };

    config.storage.data_dir = expand_path(&config.storage.data_dir)?;
    config.knowledge_base.path = expand_path(&config.knowledge_base.path)?;
    config.profiles.path = expand_path(&config.profiles.path)?;

    Ok(config)
}

fn expand_path(path: &std::path::Path) -> Result<std::path::PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| CompassError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| CompassError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}
