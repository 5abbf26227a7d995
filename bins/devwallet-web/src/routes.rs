//! Axum router and HTTP handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use devwallet_session::{Command, ErrorKind, SessionError, SessionSnapshot};

use crate::AppState;

// Embed the web UI at compile time.
const INDEX_HTML: &str = include_str!("static/index.html");

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(web_ui))
        .route("/api/session", get(api_session))
        .route("/api/commands", post(api_command))
        .with_state(state)
        .layer(cors)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Serve the embedded web UI.
async fn web_ui() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// `GET /api/session`: latest session snapshot.
async fn api_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.snapshot())
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: ErrorKind,
    session: SessionSnapshot,
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::ProviderUnavailable | ErrorKind::FaucetUnavailable => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ErrorKind::UserRejected => StatusCode::FORBIDDEN,
        ErrorKind::ProviderError | ErrorKind::NetworkError => StatusCode::BAD_GATEWAY,
        ErrorKind::ConfirmationTimeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::InsufficientFunds | ErrorKind::Rejected => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::PreconditionViolation => StatusCode::CONFLICT,
    }
}

fn error_response(state: &AppState, err: SessionError) -> Response {
    let kind = err.kind();
    let body = ErrorBody {
        error: err.to_string(),
        kind,
        session: state.session.snapshot(),
    };
    (status_for(kind), Json(body)).into_response()
}

/// `POST /api/commands`: run one session command and return the new state.
async fn api_command(State(state): State<AppState>, Json(command): Json<Command>) -> Response {
    info!(command = command.name(), "Command received");
    match state.session.execute(command).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => error_response(&state, e),
    }
}
