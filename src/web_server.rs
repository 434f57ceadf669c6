use anyhow::{Context, Result};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    serve, Json, Router,
};
use minijinja::Environment;
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, net::SocketAddr, path::Path, sync::Arc};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::{Gatekeeper, LoginOutcome};
use crate::bot::{AppKind, ChatBot, Exchange};
use crate::constants::{
    CHAT_FAILURE, LABEL_CHAT_ROOM, LABEL_LOGIN, LABEL_LOGIN_STATUS, LABEL_PASSWORD,
    LABEL_USERNAME,
};
use crate::error::ChatError;
use crate::session::SessionStore;

// Shared application state
#[derive(Clone)]
pub struct AppState {
    app: AppKind,
    bot: Arc<dyn ChatBot>,
    gatekeeper: Arc<Gatekeeper>,
    sessions: Arc<SessionStore>,
    templates: Arc<Environment<'static>>,
}

impl AppState {
    pub fn new(app: AppKind, bot: Arc<dyn ChatBot>, gatekeeper: Gatekeeper) -> Result<Self> {
        let templates = create_minijinja_env().context("Failed to initialize template engine")?;
        Ok(Self {
            app,
            bot,
            gatekeeper: Arc::new(gatekeeper),
            sessions: Arc::new(SessionStore::new()),
            templates: Arc::new(templates),
        })
    }
}

// Templates are compiled into the binary so the server runs from any directory.
fn create_minijinja_env() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("index.html", include_str!("../templates/index.html"))?;
    Ok(env)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub session_id: Uuid,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub history: Vec<Exchange>,
}

#[derive(Debug)]
enum ApiError {
    UnknownSession,
    NotLoggedIn,
    EmptyMessage,
    Upstream(ChatError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::UnknownSession => (StatusCode::NOT_FOUND, "unknown session"),
            ApiError::NotLoggedIn => (StatusCode::UNAUTHORIZED, "login required"),
            ApiError::EmptyMessage => (StatusCode::BAD_REQUEST, "message is empty"),
            ApiError::Upstream(e) => {
                // Details stay in the log; the browser gets a generic message.
                error!("Chat request failed: {}", e);
                (StatusCode::BAD_GATEWAY, CHAT_FAILURE)
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, (StatusCode, Html<String>)> {
    let session_id = state.sessions.create().await;
    state
        .templates
        .get_template("index.html")
        .and_then(|tmpl| {
            tmpl.render(minijinja::context! {
                title => state.app.title(),
                session_id => session_id.to_string(),
                label_username => LABEL_USERNAME,
                label_password => LABEL_PASSWORD,
                label_login => LABEL_LOGIN,
                label_login_status => LABEL_LOGIN_STATUS,
                label_chat_room => LABEL_CHAT_ROOM,
            })
        })
        .map(Html)
        .map_err(|e| {
            error!("Failed to render template: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("Internal Server Error: {}", e)),
            )
        })
}

async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginOutcome>, ApiError> {
    state
        .sessions
        .login(
            request.session_id,
            &state.gatekeeper,
            &request.username,
            &request.password,
        )
        .await
        .map(Json)
        .ok_or(ApiError::UnknownSession)
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let id = request.session_id;
    let login = state
        .sessions
        .login_state(id)
        .await
        .ok_or(ApiError::UnknownSession)?;
    if !login.is_logged_in() {
        warn!(session = %id, "Chat attempted before login");
        return Err(ApiError::NotLoggedIn);
    }
    if request.message.trim().is_empty() {
        return Err(ApiError::EmptyMessage);
    }

    // Turns in one session are serialized; the store lock itself is free
    // during the model call.
    let _turn = state
        .sessions
        .begin_turn(id)
        .await
        .ok_or(ApiError::UnknownSession)?;
    let history = state
        .sessions
        .history(id)
        .await
        .ok_or(ApiError::UnknownSession)?;
    let reply = state
        .bot
        .reply(&history, &request.message)
        .await
        .map_err(ApiError::Upstream)?;

    let history = state
        .sessions
        .record(id, Exchange::new(request.message, reply.clone()))
        .await
        .ok_or(ApiError::UnknownSession)?;
    Ok(Json(ChatResponse { reply, history }))
}

pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    // Serve static files from the configured directory
    let static_files_service = ServeDir::new(static_dir).not_found_service(tower::service_fn(
        |_: Request| async { Ok::<_, Infallible>((StatusCode::NOT_FOUND, "Not Found").into_response()) },
    ));

    Router::new()
        .route("/", get(index_handler))
        .route("/api/login", post(login_handler))
        .route("/api/chat", post(chat_handler))
        .nest_service("/static", static_files_service)
        .with_state(state)
        .layer(TraceLayer::new_for_http()) // Add request logging
}

pub async fn start_web_server(addr: SocketAddr, state: AppState, static_dir: &Path) -> Result<()> {
    let app = build_router(state, static_dir);
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
