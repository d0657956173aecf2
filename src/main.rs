use std::net::SocketAddr;
use std::sync::Arc;
use vibe_cart::cart::AppState;
use vibe_cart::config::Config;
use vibe_cart::router::create_app_router;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vibe_cart=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Initialize application state (rehydrates the stored cart)
    let state = Arc::new(AppState::from_config(&config)?);

    // Build application router with all routes and middleware
    let app = create_app_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Cart service running on http://{} (backend {})", addr, config.api_url);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
