use magnate::MagnateServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "magnate=info,info".into()),
        )
        .init();

    let addr = std::env::var("MAGNATE_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let server = MagnateServer::builder().bind(&addr).build().await?;
    tracing::info!(%addr, "Magnate listening");

    server.run().await?;
    Ok(())
}
