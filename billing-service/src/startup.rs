//! Application startup and lifecycle management.

use crate::config::BillingConfig;
use crate::handlers::{bills, business, health};
use crate::services::aggregation::AggregationClient;
use crate::services::channels::{
    MockEmailChannel, MockSmsChannel, Msg91SmsChannel, NotificationChannel, SmtpEmailChannel,
};
use crate::services::{init_metrics, BillStore, BillingService, Dispatcher};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::request_id_middleware;
use service_core::observability::extract_request_id;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub billing: BillingService,
}

/// The customer notification transports a dispatcher uses.
#[derive(Clone)]
pub struct Channels {
    pub email: Arc<dyn NotificationChannel>,
    pub sms: Arc<dyn NotificationChannel>,
}

impl Channels {
    /// Real transports where enabled in config, mocks otherwise.
    pub fn from_config(config: &BillingConfig) -> Result<Self, AppError> {
        let email: Arc<dyn NotificationChannel> = if config.smtp.enabled {
            tracing::info!(host = %config.smtp.host, "Using SMTP email channel");
            Arc::new(
                SmtpEmailChannel::new(config.smtp.clone())
                    .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?,
            )
        } else {
            tracing::warn!("SMTP not enabled - using mock email channel");
            Arc::new(MockEmailChannel::new(true))
        };

        let sms: Arc<dyn NotificationChannel> = if config.msg91.enabled {
            tracing::info!("Using Msg91 SMS channel");
            Arc::new(
                Msg91SmsChannel::new(config.msg91.clone(), config.dispatch.timeout())
                    .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?,
            )
        } else {
            tracing::warn!("Msg91 not enabled - using mock SMS channel");
            Arc::new(MockSmsChannel::new(true))
        };

        Ok(Self { email, sms })
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    http_listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with channels chosen from the configuration.
    pub async fn build(config: BillingConfig) -> Result<Self, AppError> {
        let channels = Channels::from_config(&config)?;
        Self::build_with_channels(config, channels).await
    }

    /// Build the application with the given notification channels.
    /// Tests use this to inject mocks they can inspect.
    pub async fn build_with_channels(
        config: BillingConfig,
        channels: Channels,
    ) -> Result<Self, AppError> {
        init_metrics();

        let aggregation = AggregationClient::new(
            config.webhook.url.clone(),
            config.dispatch.timeout(),
            config.webhook.amount_format,
            config.webhook.items_format,
        )
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create aggregation client");
            AppError::ConfigError(anyhow::anyhow!(e))
        })?;

        let dispatcher = Dispatcher::new(
            aggregation,
            channels.email,
            channels.sms,
            config.dispatch.timeout(),
        );

        let store = if config.store.seed_fixtures {
            BillStore::with_fixtures()
                .map_err(|e| AppError::InternalError(anyhow::anyhow!("seed fixtures: {}", e)))?
        } else {
            BillStore::new()
        };

        let billing = BillingService::new(dispatcher, store, config.business.clone());

        let state = AppState { billing };

        let http_addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let http_listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %http_addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        tracing::info!(
            http_port = http_port,
            webhook_url = %config.webhook.url,
            "Billing service listener bound"
        );

        Ok(Self {
            http_port,
            http_listener,
            state,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    pub fn store(&self) -> &BillStore {
        self.state.billing.store()
    }

    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health::health_check))
            .route("/ready", get(health::readiness_check))
            .route("/metrics", get(health::metrics_handler))
            .route("/bills", post(bills::send_bill).get(bills::list_bills))
            .route("/bills/totals", post(bills::compute_totals))
            .route("/bills/validate", post(bills::validate_bill))
            .route("/bills/:bill_number", get(bills::get_bill))
            .route(
                "/business",
                get(business::get_business).put(business::update_business),
            )
            .layer(middleware::from_fn(metrics_middleware))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                    let request_id =
                        extract_request_id(request.headers()).unwrap_or_else(|| "-".to_string());

                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                }),
            )
            // Outermost, so the span above sees the id it assigns.
            .layer(middleware::from_fn(request_id_middleware))
            .with_state(state)
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = Self::router(self.state);

        tracing::info!(
            service = "billing-service",
            version = env!("CARGO_PKG_VERSION"),
            http_port = self.http_port,
            "Service ready to accept connections"
        );

        axum::serve(self.http_listener, router).await.map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}
