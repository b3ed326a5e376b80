//! HTTP Server configuration and startup.

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, patch, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use decor_types::{CheckoutProvider, MarketplaceRepository};

use super::handlers::{self, AppState};
use crate::MarketplaceService;

/// HTTP Server for the marketplace API.
pub struct HttpServer<R: MarketplaceRepository, P: CheckoutProvider> {
    state: Arc<AppState<R, P>>,
}

impl<R: MarketplaceRepository, P: CheckoutProvider> HttpServer<R, P> {
    /// Creates a new HTTP server with the given service.
    pub fn new(service: MarketplaceService<R, P>) -> Self {
        Self {
            state: Arc::new(AppState { service }),
        }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/users", post(handlers::register_user::<R, P>))
            .route("/users", get(handlers::list_users::<R, P>))
            .route("/users/{id}/role", get(handlers::get_user_role::<R, P>))
            .route("/users/{id}", patch(handlers::update_user_role::<R, P>))
            .route(
                "/users/{id}/status",
                patch(handlers::update_user_status::<R, P>),
            )
            .route("/users/{id}", delete(handlers::delete_user::<R, P>))
            .route("/services", post(handlers::create_listing::<R, P>))
            .route("/services", get(handlers::list_listings::<R, P>))
            .route("/services/{id}", get(handlers::get_listing::<R, P>))
            .route("/services/{id}", patch(handlers::update_listing::<R, P>))
            .route("/services/{id}", delete(handlers::delete_listing::<R, P>))
            .route("/bookings", post(handlers::create_booking::<R, P>))
            .route("/bookings", get(handlers::list_bookings::<R, P>))
            .route("/bookings/{id}", patch(handlers::update_booking::<R, P>))
            .route("/bookings/{id}", delete(handlers::delete_booking::<R, P>))
            .route(
                "/bookings/{id}/role",
                patch(handlers::assign_decorator::<R, P>),
            )
            .route(
                "/bookings/{id}/status",
                patch(handlers::update_delivery_status::<R, P>),
            )
            .route(
                "/decorators",
                get(handlers::list_decorator_bookings::<R, P>),
            )
            .route(
                "/payment-checkout-session",
                post(handlers::create_checkout_session::<R, P>),
            )
            .route("/payment-success", patch(handlers::settle_payment::<R, P>))
            .route("/payments", get(handlers::list_payments::<R, P>))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
