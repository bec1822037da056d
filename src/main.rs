use airbnb_forecast::api::{self, state::AppState};
use airbnb_forecast::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "airbnb_forecast=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env();
    let state = AppState::from_settings(&settings)?;
    let app = api::router(state, &settings);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    tracing::info!(addr = %settings.bind_addr, "Forecast API listening");
    axum::serve(listener, app).await?;

    Ok(())
}
