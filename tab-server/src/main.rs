use tab_server::{Config, Server, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    let _log_guard = setup_environment(&config);

    tracing::info!(
        environment = %config.environment,
        port = config.http_port,
        "Tab server starting"
    );

    let server = Server::new(config).await?;

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
