/// HTTP server: spawns axum on a background tokio task.
use crate::api::api_router;
use crate::state::AppState;
use axum::http::{header, HeaderValue};
use axum::Router;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api_router()
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until `shutdown` flips to `true`. Returns the bound port
/// (useful when the configured port is 0) and the server task.
pub async fn spawn_server(
    state: AppState,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(u16, JoinHandle<()>), Box<dyn std::error::Error>> {
    let port = state.port;
    let bind_addr = state.bind_address.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", bind_addr, port)).await?;
    let actual_port = listener.local_addr()?.port();

    log::info!(
        "HTTP server listening on http://{}:{}",
        bind_addr,
        actual_port
    );

    let handle = tokio::spawn(async move {
        let signal = async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
            log::info!("HTTP server shutting down");
        };
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .await
        {
            log::error!("HTTP server exited with error: {}", e);
        }
    });

    Ok((actual_port, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::app_state;

    #[tokio::test]
    async fn test_binds_ephemeral_port_and_stops() {
        let (tx, rx) = watch::channel(false);
        let (port, handle) = spawn_server(app_state(), rx).await.unwrap();
        assert_ne!(port, 0);
        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
