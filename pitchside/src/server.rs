use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, get, post, routes, Build, Rocket, State};
use serde::{Deserialize, Serialize};

use common::ServerConfig;

use crate::news::{GatewayError, NewsGateway, NewsItem};
use crate::subscriptions::{StoreError, SubscriptionSet, SubscriptionStore};

/// Application state stored inside Rocket managed state.
#[derive(Clone)]
pub struct AppState {
    pub started_at: DateTime<Utc>,
    pub store: SubscriptionStore,
    /// `None` when no API key is configured; news routes then answer 503.
    pub gateway: Option<NewsGateway>,
}

impl AppState {
    pub fn new(store: SubscriptionStore, gateway: Option<NewsGateway>) -> Self {
        Self {
            started_at: Utc::now(),
            store,
            gateway,
        }
    }

    fn gateway(&self) -> Result<&NewsGateway, ApiError> {
        self.gateway.as_ref().ok_or_else(|| {
            api_error(
                Status::ServiceUnavailable,
                "llm_unavailable",
                "no chat-completion provider is configured".to_string(),
            )
        })
    }
}

/// Error payload returned by every failing JSON route
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

type ApiError = (Status, Json<ErrorBody>);

fn api_error(status: Status, kind: &str, message: String) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: kind.to_string(),
            message,
        }),
    )
}

fn store_error(e: StoreError) -> ApiError {
    let (status, kind) = match &e {
        StoreError::InvalidCategory(_) => (Status::BadRequest, "invalid_category"),
        StoreError::InvalidTerm => (Status::BadRequest, "invalid_term"),
        StoreError::Persistence(_) => (Status::InternalServerError, "persistence"),
    };
    api_error(status, kind, e.to_string())
}

fn gateway_error(e: GatewayError) -> ApiError {
    let status = match &e {
        GatewayError::InvalidQuery => Status::BadRequest,
        GatewayError::RateLimited(_) => Status::TooManyRequests,
        GatewayError::Transport(_) => Status::GatewayTimeout,
        GatewayError::NoResults | GatewayError::SummaryUnavailable => Status::NotFound,
        GatewayError::Auth(_)
        | GatewayError::Forbidden(_)
        | GatewayError::Upstream { .. }
        | GatewayError::MalformedResponse(_) => Status::BadGateway,
    };
    api_error(status, e.kind(), e.to_string())
}

/// Response structure for `/api/v1/status`.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    uptime_seconds: i64,
    model: Option<String>,
}

/// Body of subscribe / unsubscribe calls
#[derive(Deserialize)]
struct SubscriptionChange {
    term: String,
    category: String,
}

#[derive(Deserialize)]
struct SummaryRequest {
    title: String,
}

#[derive(Serialize)]
struct SummaryResponse {
    title: String,
    summary: String,
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

#[get("/api/v1/status")]
async fn status(state: &State<AppState>) -> Json<StatusResponse> {
    let uptime = (Utc::now() - state.started_at).num_seconds();

    Json(StatusResponse {
        status: "ok",
        uptime_seconds: uptime,
        model: state.gateway.as_ref().map(|g| g.model().to_string()),
    })
}

#[get("/api/v1/subscriptions")]
async fn list_subscriptions(state: &State<AppState>) -> Json<SubscriptionSet> {
    Json(state.store.load().await)
}

#[post("/api/v1/subscriptions", data = "<body>")]
async fn add_subscription(
    state: &State<AppState>,
    body: Json<SubscriptionChange>,
) -> Result<Json<SubscriptionSet>, ApiError> {
    state
        .store
        .add(&body.term, &body.category)
        .await
        .map(Json)
        .map_err(store_error)
}

#[delete("/api/v1/subscriptions", data = "<body>")]
async fn remove_subscription(
    state: &State<AppState>,
    body: Json<SubscriptionChange>,
) -> Result<Json<SubscriptionSet>, ApiError> {
    state
        .store
        .remove(&body.term, &body.category)
        .await
        .map(Json)
        .map_err(store_error)
}

/// Free-text search; a missing `query` is treated as empty.
#[get("/api/v1/news?<query>")]
async fn news(state: &State<AppState>, query: Option<String>) -> Result<Json<Vec<NewsItem>>, ApiError> {
    let gateway = state.gateway()?;
    gateway
        .fetch_news(query.as_deref().unwrap_or_default())
        .await
        .map(Json)
        .map_err(gateway_error)
}

#[get("/api/v1/news/latest")]
async fn latest_news(state: &State<AppState>) -> Result<Json<Vec<NewsItem>>, ApiError> {
    let gateway = state.gateway()?;
    gateway.latest_news().await.map(Json).map_err(gateway_error)
}

#[get("/api/v1/news/upcoming")]
async fn upcoming_matches(state: &State<AppState>) -> Result<Json<Vec<NewsItem>>, ApiError> {
    let gateway = state.gateway()?;
    gateway.upcoming_matches().await.map(Json).map_err(gateway_error)
}

#[post("/api/v1/summary", data = "<body>")]
async fn summary(
    state: &State<AppState>,
    body: Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let gateway = state.gateway()?;
    let summary = gateway.summarize(&body.title).await.map_err(gateway_error)?;
    Ok(Json(SummaryResponse {
        title: body.into_inner().title,
        summary,
    }))
}

/// Assemble the Rocket instance with managed state and all routes mounted.
pub fn build_rocket(state: AppState, figment: rocket::figment::Figment) -> Rocket<Build> {
    rocket::custom(figment).manage(state).mount(
        "/",
        routes![
            health,
            status,
            list_subscriptions,
            add_subscription,
            remove_subscription,
            news,
            latest_news,
            upcoming_matches,
            summary,
        ],
    )
}

/// Build and launch the Rocket server bound to `server.bind:server.port`.
///
/// This function blocks until the Rocket server shuts down (it awaits `rocket.launch().await`).
pub async fn launch_rocket(state: AppState, server: &ServerConfig) -> Result<()> {
    let fig = rocket::Config::figment()
        .merge(("address", server.bind.clone()))
        .merge(("port", server.port));

    tracing::info!(bind = %server.bind, port = server.port, "Starting Rocket HTTP server");
    build_rocket(state, fig)
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}
