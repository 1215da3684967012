//! HTTP surface of the flag store.
//!
//! Two routes share one [`FlagStore`]:
//!
//! - `GET /flags` returns `{"projectIds": [...]}`
//! - `POST /flags` takes `{"projectId": "...", "flagged": true|false}` and
//!   returns the updated set in the same shape
//!
//! Bodies that do not match the request schema are answered with `400` and
//! leave the store untouched.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::CONTENT_TYPE, Method},
    routing::get,
    Json, Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::flags::{FlagSet, FlagStore, SetFlagRequest};

/// Build the router for the flag endpoints.
pub fn router(store: Arc<FlagStore>, cors_max_age: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(cors_max_age);

    Router::new()
        .route("/flags", get(get_flags).post(set_flag))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(store)
}

async fn get_flags(State(store): State<Arc<FlagStore>>) -> Json<FlagSet> {
    Json(store.get_flags())
}

async fn set_flag(
    State(store): State<Arc<FlagStore>>,
    payload: std::result::Result<Json<SetFlagRequest>, JsonRejection>,
) -> Result<Json<FlagSet>> {
    let Json(request) = payload.map_err(|rejection| Error::validation(rejection.body_text()))?;

    if request.project_id.as_str().trim().is_empty() {
        return Err(Error::validation("projectId must not be empty"));
    }

    Ok(Json(store.set_flag(request.project_id, request.flagged)))
}

/// A bound, not yet serving, flag service.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    store: Arc<FlagStore>,
    cors_max_age: Duration,
}

impl Server {
    /// Bind the listener described by `config.server` with a fresh store.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn bind(config: &Config) -> Result<Self> {
        let address = config.bind_address()?;
        info!("Binding to {address}");

        let listener = TcpListener::bind(address).await?;
        Ok(Self {
            listener,
            store: Arc::new(FlagStore::new()),
            cors_max_age: config.cors_max_age(),
        })
    }

    /// The address actually bound (useful with port 0).
    ///
    /// # Errors
    ///
    /// Returns an error if the socket has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// The store backing this server.
    #[must_use]
    pub fn store(&self) -> Arc<FlagStore> {
        Arc::clone(&self.store)
    }

    /// Serve until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the accept loop fails.
    pub async fn run(self) -> Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve until `shutdown` resolves, then discard the flag set.
    ///
    /// # Errors
    ///
    /// Returns an error if the accept loop fails.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let address = self.local_addr()?;
        let app = router(Arc::clone(&self.store), self.cors_max_age);

        info!("Flag service running on {address}");
        axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        let discarded = self.store.reset();
        info!(discarded, "Flag service stopped, flags discarded");
        Ok(())
    }
}

/// Bind and serve the flag service described by `config`.
///
/// # Errors
///
/// Returns an error if binding or serving fails.
pub async fn start_server(config: &Config) -> Result<()> {
    Server::bind(config).await?.run().await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
