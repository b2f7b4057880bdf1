//! waste-market-gateway server entry point.
//!
//! Starts the Axum HTTP server, the auction sweeper and, when enabled, the
//! PostgreSQL event log.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use waste_market_gateway::api;
use waste_market_gateway::app_state::AppState;
use waste_market_gateway::config::MarketConfig;
use waste_market_gateway::domain::AccountRole;
use waste_market_gateway::persistence::{PostgresPersistence, spawn_cleanup, spawn_event_log};
use waste_market_gateway::service::{OpenAccountCommand, spawn_sweeper};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = MarketConfig::from_env().map_err(|err| anyhow::anyhow!(err))?;
    tracing::info!(addr = %config.listen_addr, "starting waste-market-gateway");

    let app_state = AppState::new(config.event_bus_capacity);

    if let Some(admin_id) = config.bootstrap_admin_id {
        app_state
            .account_service
            .open_account(OpenAccountCommand {
                account_id: Some(admin_id),
                role: AccountRole::Administrator,
                display_name: "Bootstrap administrator".to_string(),
                opening_cash: None,
            })
            .await
            .context("failed to open bootstrap administrator")?;
        tracing::info!(%admin_id, "bootstrap administrator ready");
    }

    if config.persistence_enabled {
        match PostgresPersistence::connect(&config).await {
            Ok(persistence) => {
                spawn_event_log(persistence.clone(), app_state.event_bus.subscribe());
                spawn_cleanup(persistence, config.cleanup_after_days);
                tracing::info!("event log enabled");
            }
            Err(err) => {
                tracing::warn!(error = %err, "event log unavailable, continuing in memory only");
            }
        }
    }

    if config.sweep_interval_secs > 0 {
        spawn_sweeper(
            Arc::clone(&app_state.auction_service),
            Duration::from_secs(config.sweep_interval_secs),
        );
    }

    let app = api::build_app(
        app_state,
        Duration::from_secs(config.request_timeout_secs),
    );

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// `LOG_FORMAT=json` switches to structured JSON lines; `RUST_LOG` sets the
/// filter and defaults to `info`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
