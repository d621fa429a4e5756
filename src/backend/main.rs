/**
 * LuxeMarket Edge Server Entry Point
 *
 * Starts the caching reverse proxy in front of the storefront origin.
 */

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = luxemarket::backend::ServerConfig::from_env()?;
    let app = luxemarket::backend::create_app(&config).await?;

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting edge server on {} (origin {})", addr, config.origin);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<std::net::SocketAddr>()).await?;

    Ok(())
}

#[cfg(not(feature = "ssr"))]
fn main() {
    eprintln!("The edge server requires the 'ssr' feature to be enabled.");
    eprintln!("Run with: cargo run --bin luxemarket-edge --features ssr");
    std::process::exit(1);
}
