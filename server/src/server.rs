use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers::{
    clear_conversation_handler, create_session_handler, delete_conversation_handler,
    delete_session_handler, get_session_handler, health_handler, index_handler,
    list_conversations_handler, new_conversation_handler, select_conversation_handler,
    send_message_handler,
};
use crate::infrastructure::{spawn_idle_sweeper, AppState, ClientIdentity};
use crate::modules::chat::{create_gateway, ChatModule};
use crate::modules::config::AppConfig;

/// 构建路由
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/health", get(health_handler))
        .route("/api/sessions", post(create_session_handler))
        .route(
            "/api/sessions/:session_id",
            get(get_session_handler).delete(delete_session_handler),
        )
        .route(
            "/api/sessions/:session_id/new",
            post(new_conversation_handler),
        )
        .route(
            "/api/sessions/:session_id/clear",
            post(clear_conversation_handler),
        )
        .route(
            "/api/sessions/:session_id/conversations",
            get(list_conversations_handler),
        )
        .route(
            "/api/sessions/:session_id/conversations/:conversation_id",
            axum::routing::delete(delete_conversation_handler),
        )
        .route(
            "/api/sessions/:session_id/conversations/:conversation_id/select",
            post(select_conversation_handler),
        )
        .route(
            "/api/sessions/:session_id/messages",
            post(send_message_handler),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 根据配置组装应用状态
pub async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let gateway = create_gateway(&config.model.gateway_config())
        .context("Failed to create model gateway")?;

    let chat = ChatModule::new_with_persistence(
        config.storage.data_dir.clone(),
        config.storage.identity_scheme,
        gateway,
        config.model.context_builder(),
        config.model.generation_options(),
    )
    .await
    .with_context(|| {
        format!(
            "Failed to initialize storage in {}",
            config.storage.data_dir.display()
        )
    })?;

    let default_user = config
        .default_user()
        .map_err(|e| anyhow::anyhow!("Invalid default user: {}", e))?;
    let identity = ClientIdentity::new(config.server.trust_forwarded_for, default_user);

    Ok(AppState::new(
        chat,
        identity,
        config.ui.clone(),
        config.server.session_idle_timeout(),
    ))
}

pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let state = build_state(&config).await?;
    let sweeper = spawn_idle_sweeper(state.sessions.clone());
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.abort();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Server shutting down signal received");
}
