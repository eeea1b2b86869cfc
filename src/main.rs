//! Deskroute service entry point

use clap::{Parser, Subcommand};
use deskroute::chat::{ChatServer, Readiness};
use deskroute::config::{ConfigError, RouterConfig};
use deskroute::engine::WorkflowEngine;
use deskroute::llm::{
    AnthropicConfig, AnthropicProvider, LlmProvider, OpenAiConfig, OpenAiProvider,
};
use deskroute::observability::init_default_logging;
use deskroute::routing::{Dispatcher, QualityGate};
use deskroute::search::{TavilyClient, TavilyConfig, WebSearch};
use deskroute::specialists::{
    HumanEscalation, OrderSpecialist, SupportSpecialist, WebSearchSpecialist,
};
use deskroute::store::{KnowledgeBase, OrderStore};
use std::net::IpAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// LLM-routed customer support request router
#[derive(Parser)]
#[command(name = "deskroute")]
#[command(about = "LLM-routed customer support request router")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the router service
    Run,
    /// Validate configuration
    Config {
        /// Show the parsed configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();
    info!("Starting deskroute v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run => run_service(config).await,
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {e}");
        process::exit(1);
    }
}

fn load_configuration(config_path: &Option<PathBuf>) -> Result<RouterConfig, ConfigError> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            RouterConfig::load_from_file(path)
        }
        None => {
            for path_str in ["deskroute.toml", "config/deskroute.toml"] {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return RouterConfig::load_from_file(&path);
                }
            }
            error!("No configuration file found. Provide one with -c/--config or create deskroute.toml");
            process::exit(1);
        }
    }
}

fn handle_config_command(
    config: RouterConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // load_configuration already validated; reaching here means it parsed
    println!("Configuration is valid");
    if show {
        println!("{}", toml::to_string_pretty(&config)?);
    }
    Ok(())
}

fn build_provider(
    config: &RouterConfig,
) -> Result<Arc<dyn LlmProvider>, Box<dyn std::error::Error + Send + Sync>> {
    let api_key = config.llm_api_key()?;
    let provider: Arc<dyn LlmProvider> = match config.llm.provider.as_str() {
        "openai" => {
            let mut provider_config = OpenAiConfig {
                api_key,
                ..Default::default()
            };
            if let Some(base_url) = &config.llm.base_url {
                provider_config.base_url = base_url.clone();
            }
            Arc::new(OpenAiProvider::new(provider_config)?)
        }
        "anthropic" => {
            let mut provider_config = AnthropicConfig {
                api_key,
                ..Default::default()
            };
            if let Some(base_url) = &config.llm.base_url {
                provider_config.base_url = base_url.clone();
            }
            Arc::new(AnthropicProvider::new(provider_config)?)
        }
        other => return Err(format!("unknown LLM provider `{other}`").into()),
    };
    Ok(provider)
}

fn build_order_store(
    config: &RouterConfig,
) -> Result<Option<Arc<OrderStore>>, Box<dyn std::error::Error + Send + Sync>> {
    let Some(section) = &config.orders else {
        warn!("no [orders] section; order specialist will run degraded");
        return Ok(None);
    };
    let store = match &section.seed_script {
        Some(script_path) => {
            let script = std::fs::read_to_string(script_path)?;
            OrderStore::open_seeded(&section.db_path, &script)?
        }
        None => OrderStore::open(&section.db_path)?,
    };
    info!(path = %section.db_path.display(), "order database opened");
    Ok(Some(Arc::new(store)))
}

fn build_knowledge(
    config: &RouterConfig,
) -> Result<Option<Arc<KnowledgeBase>>, Box<dyn std::error::Error + Send + Sync>> {
    let Some(section) = &config.knowledge else {
        warn!("no [knowledge] section; support specialist will run degraded");
        return Ok(None);
    };
    let mut kb = KnowledgeBase::with_chunking(section.chunk_chars, section.overlap_chars);
    for path in &section.files {
        kb.ingest_file(path)?;
    }
    info!(passages = kb.len(), "knowledge base loaded");
    Ok(Some(Arc::new(kb)))
}

fn build_search(
    config: &RouterConfig,
) -> Result<Option<Arc<dyn WebSearch>>, Box<dyn std::error::Error + Send + Sync>> {
    let Some(section) = &config.search else {
        warn!("no [search] section; web search specialist will run degraded");
        return Ok(None);
    };
    let api_key = config
        .search_api_key()?
        .unwrap_or_default();
    let mut search_config = TavilyConfig {
        api_key,
        max_results: section.max_results,
        ..Default::default()
    };
    if let Some(base_url) = &section.base_url {
        search_config.base_url = base_url.clone();
    }
    Ok(Some(Arc::new(TavilyClient::new(search_config)?)))
}

fn build_engine(
    config: &RouterConfig,
    provider: Arc<dyn LlmProvider>,
) -> Result<(WorkflowEngine, Readiness), Box<dyn std::error::Error + Send + Sync>> {
    let model = &config.llm.model;
    let order_store = build_order_store(config)?;
    let knowledge = build_knowledge(config)?;
    let search = build_search(config)?;

    let readiness = Readiness {
        provider: provider.name().to_string(),
        orders: order_store.is_some(),
        knowledge: knowledge.is_some(),
        search: search.is_some(),
    };

    let mut order = OrderSpecialist::new(provider.clone(), model, order_store);
    if let Some(section) = &config.orders {
        order = order.with_row_cap(section.row_cap);
    }
    let mut support = SupportSpecialist::new(knowledge);
    if let Some(section) = &config.knowledge {
        support = support.with_top_k(section.top_k);
    }
    let web_search = WebSearchSpecialist::new(provider.clone(), model, search);

    let engine = WorkflowEngine::new(
        Dispatcher::new(provider.clone(), model),
        QualityGate::new(provider, model),
        Box::new(order),
        Box::new(support),
        Box::new(web_search),
        Box::new(HumanEscalation::new()),
    )
    .with_max_dispatch_cycles(config.workflow.max_dispatch_cycles);

    Ok((engine, readiness))
}

async fn run_service(
    config: RouterConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let provider = build_provider(&config)?;
    if let Err(e) = provider.health_check().await {
        warn!("LLM provider health check failed: {e}");
    }

    let (engine, readiness) = build_engine(&config, provider)?;
    let bind_address: IpAddr = config.service.bind_address.parse()?;
    let server = ChatServer::new(Arc::new(engine), readiness, bind_address, config.service.port);

    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    tokio::select! {
        result = server.start() => result,
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down gracefully...");
            Ok(())
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
            Ok(())
        }
    }
}
