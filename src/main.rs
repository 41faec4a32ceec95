use std::panic;
use std::sync::Arc;

use devcognition::config::{Config, RunMode};
use devcognition::console;
use devcognition::mesh::{MeshNode, ReplicationEngine, Role};
use devcognition::routes::{cors_layer, create_app};
use devcognition::services::insight_service::InsightService;
use devcognition::services::journal_service::Journal;
use devcognition::services::scratchpad_service::Scratchpad;
use devcognition::services::storage_service::FileStore;
use devcognition::solo::SoloConsole;
use devcognition::transport::{RelayTransport, Transport};
use devcognition::websocket::RelayState;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to info level, but allow debug for our app
            "devcognition=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });

    info!(
        "Environment: {} (development: {}), log level {}",
        config.environment,
        config.is_development(),
        config.log_level
    );

    match config.mode {
        RunMode::Relay => run_relay(&config).await,
        RunMode::Host => run_peer(&config, Role::Host).await,
        RunMode::Join => run_peer(&config, Role::Joiner).await,
        RunMode::Solo => run_solo(&config).await,
    }
}

async fn run_relay(config: &Config) {
    info!("Starting relay...");
    let state = Arc::new(RelayState::new(config.relay_channel_capacity));
    let app_routes = create_app(state).layer(cors_layer(&config.cors_origins()));

    let listener = tokio::net::TcpListener::bind(config.server_address())
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", config.server_address()));

    info!("🚀 Relay running on http://{}", config.server_address());
    info!("📡 Peers connect to ws://{}/mesh/{}", config.server_address(), config.mesh_channel);
    info!("📚 Swagger UI available at http://{}/swagger", config.server_address());

    axum::serve(listener, app_routes)
        .await
        .expect("Server failed to start");
}

async fn run_peer(config: &Config, role: Role) {
    let transport = match RelayTransport::connect(&config.relay_url, &config.mesh_channel).await {
        Ok(transport) => Arc::new(transport),
        Err(e) => {
            error!("Cannot reach relay: {}", e);
            return;
        }
    };

    let engine = ReplicationEngine::new(transport.clone(), config.peer_name());
    let node = match MeshNode::start(engine, role) {
        Ok(node) => node.with_welcome_timeout(config.welcome_timeout()),
        Err(e) => {
            error!("Failed to start mesh session: {}", e);
            return;
        }
    };
    info!("Started mesh session as {} on channel {}", role, config.mesh_channel);

    let (commands, rx) = mpsc::channel(64);
    let node_task = tokio::spawn(node.run(rx));

    console::run(commands).await;

    if let Err(e) = node_task.await {
        error!("Mesh node task failed: {}", e);
    }
    transport.close();
}

async fn run_solo(config: &Config) {
    let store = FileStore::new(config.data_dir.clone());
    info!("Journal data in {}", store.dir().display());
    let insights = InsightService::from_config(config.gemini_api_key.as_deref(), &config.gemini_model);
    if insights.is_enabled() {
        info!("AI insights enabled with model {}", config.gemini_model);
    }
    SoloConsole::new(Journal::open(store.clone()), Scratchpad::open(store), insights)
        .run()
        .await;
}
