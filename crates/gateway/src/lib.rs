//! HTTP gateway for Amino Chat.
//!
//! Exposes the chat endpoint used by the embedded widget, a FAQ listing,
//! a health check, and the widget itself.
//!
//! Built on Axum for async HTTP.

pub mod frontend;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, DefaultBodyLimit};
use axum::http::{HeaderValue, Method, header};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::{self, Next},
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{Instrument, error, info, info_span, warn};

use aminochat_chat::ChatService;
use aminochat_config::GatewayConfig;
use aminochat_core::{Error, FaqEntry};

const INVALID_BODY: &str = "Invalid request body";
const INTERNAL_ERROR: &str = "Internal Server Error";

/// Shared application state for the gateway.
pub struct GatewayState {
    pub chat: ChatService,
}

pub type SharedState = Arc<GatewayState>;

/// Build the router with all routes and layers.
///
/// Layers applied:
/// - CORS (any origin unless `allowed_origins` is set)
/// - request body size limit
/// - in-memory rate limiting per client address (`/health` exempt)
/// - HTTP trace logging
pub fn build_router(state: SharedState, config: &GatewayConfig) -> Router {
    let mut app = Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/faq", get(faq_handler))
        .with_state(state);

    if config.serve_frontend {
        app = app.merge(frontend::frontend_router());
    }

    let mut app = app.layer(DefaultBodyLimit::max(config.max_body_bytes));

    if config.rate_limit_per_minute > 0 {
        let rate_limiter = Arc::new(RateLimiter::new(
            config.rate_limit_per_minute as usize,
            Duration::from_secs(60),
        ));
        app = app.layer(middleware::from_fn(move |req, next| {
            let limiter = rate_limiter.clone();
            rate_limit_middleware(limiter, req, next)
        }));
    }

    app.layer(cors_layer(&config.allowed_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}

/// Serve an already-built chat service until Ctrl-C.
pub async fn serve(chat: ChatService, config: &GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(GatewayState { chat });
    let app = build_router(state, config);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Gateway listening");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("Could not install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
}

// --- Rate Limiter ---

/// In-memory sliding-window rate limiter keyed by client address.
///
/// Thread-safe via `std::sync::Mutex` (non-async, held briefly).
struct RateLimiter {
    max_requests: usize,
    window: Duration,
    clients: std::sync::Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` if the client is within its limit.
    fn check(&self, client_key: &str) -> bool {
        let now = Instant::now();
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());

        // Evict idle clients once the map gets large
        if clients.len() > 10_000 {
            clients.retain(|_, timestamps| {
                timestamps
                    .last()
                    .is_some_and(|t| now.duration_since(*t) < self.window)
            });
        }

        let timestamps = clients.entry(client_key.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < self.window);

        if timestamps.len() >= self.max_requests {
            return false;
        }

        timestamps.push(now);
        true
    }
}

/// Keyed by the peer IP when the server was started with connect info,
/// otherwise every caller shares the "anonymous" bucket.
async fn rate_limit_middleware(
    limiter: Arc<RateLimiter>,
    req: axum::extract::Request,
    next: Next,
) -> Result<axum::response::Response, StatusCode> {
    if req.uri().path() == "/health" {
        return Ok(next.run(req).await);
    }

    let client_key = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    if !limiter.check(&client_key) {
        warn!(client = %client_key, "Rate limit exceeded");
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    Ok(next.run(req).await)
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct ChatRequest {
    #[serde(rename = "userInput")]
    user_input: String,
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

/// Map a pipeline error to a response. Server-side details are logged and
/// never returned.
fn to_api_error(err: Error) -> ApiError {
    if err.is_client_error() {
        return api_error(StatusCode::BAD_REQUEST, INVALID_BODY);
    }
    error!(error = %err, "Chat request failed");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
}

/// `POST /chat`: `{ "userInput": "..." }` → `{ "response": "<p>…</p>" }`.
async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!(reason = %rejection.body_text(), "Rejected chat request");
        api_error(StatusCode::BAD_REQUEST, INVALID_BODY)
    })?;

    let request_id = uuid::Uuid::new_v4();
    let span = info_span!("chat", %request_id);

    async move {
        info!(input_len = payload.user_input.len(), "Chat request received");
        let reply = state
            .chat
            .handle_chat(&payload.user_input)
            .await
            .map_err(to_api_error)?;
        info!(category = reply.category.id(), safety_blocked = reply.safety_blocked, "Chat reply sent");
        Ok::<_, ApiError>(Json(ChatResponse {
            response: reply.response,
        }))
    }
    .instrument(span)
    .await
}

#[derive(Serialize)]
struct FaqResponse {
    entries: Vec<FaqEntry>,
}

/// `GET /faq`: suggested questions with their answers.
async fn faq_handler(State(state): State<SharedState>) -> Result<Json<FaqResponse>, ApiError> {
    let entries = state.chat.faq().await.map_err(to_api_error)?;
    Ok(Json(FaqResponse { entries }))
}
