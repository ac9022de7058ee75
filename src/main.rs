use connhub::client::WsConnection;
use connhub::config::{Settings, load_config};
use connhub::hub::Hub;
use connhub::transport::start_websocket_server;
use connhub::utils::logging;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            logging::init("info");
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    logging::init(&config.log.level);

    if let Err(e) = run_server(config).await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }
}

async fn run_server(config: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let (mut hub, handle) = Hub::<WsConnection>::new(&config.hub);

    let hub_task = tokio::spawn(async move {
        hub.run().await;
    });

    let outcome = tokio::select! {
        result = start_websocket_server(&addr, handle.clone(), &config.hub) => {
            if result.is_ok() {
                error!("WebSocket server exited unexpectedly.");
            }
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
            Ok(())
        }
    };

    handle.shutdown();
    hub_task.await?;
    info!(stats = ?handle.stats(), "final hub stats");

    outcome?;
    Ok(())
}
