mod config;

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State, WebSocketUpgrade},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use lifeline_api::auth::{self, AppState, AppStateInner};
use lifeline_api::middleware::{decode_token, require_auth};
use lifeline_api::profile;
use lifeline_db::Database;
use lifeline_gateway::GatewayState;
use lifeline_gateway::commands::SessionContext;
use lifeline_gateway::connection;
use lifeline_gateway::media::MediaStore;

use crate::config::Config;

#[derive(Clone)]
struct ServerState {
    gateway: GatewayState,
    jwt_secret: String,
}

#[derive(Debug, Deserialize)]
struct GatewayQuery {
    token: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lifeline=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database and media
    let db = Arc::new(Database::open(&config.db_path)?);
    let media = MediaStore::new(config.media_dir.clone()).await?;

    let gateway = GatewayState::new(db.clone(), media);
    let app_state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        token_days: config.token_days,
    });

    let state = ServerState {
        gateway,
        jwt_secret: config.jwt_secret.clone(),
    };

    // Routes
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/me", get(profile::me).put(profile::update_me))
        .layer(middleware::from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state);

    let ws_route = Router::new()
        .route("/gateway", get(ws_upgrade))
        .route("/group/{group_name}", get(room_upgrade))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(ws_route)
        .nest_service("/media", ServeDir::new(&config.media_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Lifeline server listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// The session a gateway token admits, if any. Missing, malformed, forged
/// and expired tokens all admit nobody.
fn admit(jwt_secret: &str, token: Option<&str>) -> Option<SessionContext> {
    token
        .and_then(|token| decode_token(jwt_secret, token))
        .map(SessionContext::from)
}

/// Sessions without a valid token are refused before the upgrade.
async fn ws_upgrade(
    State(state): State<ServerState>,
    Query(query): Query<GatewayQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(session) = admit(&state.jwt_secret, query.token.as_deref()) else {
        warn!("Rejected gateway upgrade without a valid token");
        return StatusCode::UNAUTHORIZED.into_response();
    };

    ws.on_upgrade(move |socket| connection::handle_session(socket, state.gateway, session))
}

async fn room_upgrade(
    State(state): State<ServerState>,
    Path(group_name): Path<String>,
    Query(query): Query<GatewayQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(session) = admit(&state.jwt_secret, query.token.as_deref()) else {
        warn!("Rejected group {} upgrade without a valid token", group_name);
        return StatusCode::UNAUTHORIZED.into_response();
    };

    ws.on_upgrade(move |socket| {
        connection::handle_room_session(socket, state.gateway, session, group_name)
    })
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
