use heladeria::{load_catalog, router, AppState, Ledger, SalesArchive, Settings};
use std::net::SocketAddr;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let settings = Settings::from_env();
    let catalog = load_catalog(&settings.catalog_path)
        .await
        .inspect_err(|err| error!("{err}"))?;
    info!(flavors = catalog.flavors.len(), "catalog loaded");

    let archive = SalesArchive::new(settings.sales_path.clone());
    info!("sales archive at {}", archive.path().display());
    let state = AppState::new(Ledger::new(&catalog), archive);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
