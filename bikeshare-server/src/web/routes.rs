//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::query::StationSummary;
use crate::store::{StationStore, StoreError};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<S: StationStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/v2/stations",
            get(list_stations::<S>).post(create_station::<S>),
        )
        .route("/api/v2/stations/summary", get(station_summary::<S>))
        .route(
            "/api/v2/stations/:number",
            get(get_station::<S>).put(replace_station::<S>),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Filtered, sorted, paged station list.
async fn list_stations<S: StationStore>(
    State(state): State<AppState<S>>,
    Query(params): Query<ListStationsParams>,
) -> Result<Json<PagedStationsResponse>, AppError> {
    let page = state.stations.list_stations(&params.into_query()).await?;
    Ok(Json(PagedStationsResponse::from_page(&page)))
}

/// Network-wide totals.
async fn station_summary<S: StationStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<StationSummary>, AppError> {
    let summary = state.stations.get_summary().await?;
    Ok(Json(*summary))
}

async fn get_station<S: StationStore>(
    State(state): State<AppState<S>>,
    Path(number): Path<u32>,
) -> Result<Json<StationResult>, AppError> {
    let station = state
        .stations
        .get_station(number)
        .await?
        .ok_or_else(|| AppError::station_not_found(number))?;
    Ok(Json(StationResult::from_station(&station)))
}

async fn create_station<S: StationStore>(
    State(state): State<AppState<S>>,
    Json(input): Json<StationInput>,
) -> Result<Response, AppError> {
    let number = input.number.ok_or_else(|| AppError::BadRequest {
        message: "station number is required".to_string(),
    })?;

    let created = state
        .stations
        .create_station(input.into_station(number))
        .await?;

    let location = format!("/api/v2/stations/{}", created.number);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(StationResult::from_station(&created)),
    )
        .into_response())
}

/// Full replace; the path number wins over any number in the body.
async fn replace_station<S: StationStore>(
    State(state): State<AppState<S>>,
    Path(number): Path<u32>,
    Json(input): Json<StationInput>,
) -> Result<Json<StationResult>, AppError> {
    let updated = state
        .stations
        .replace_station(number, input.into_station(number))
        .await?
        .ok_or_else(|| AppError::station_not_found(number))?;
    Ok(Json(StationResult::from_station(&updated)))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Conflict { message: String },
    GatewayTimeout { message: String },
    BadGateway { message: String },
}

impl AppError {
    fn station_not_found(number: u32) -> Self {
        AppError::NotFound {
            message: format!("station {number} not found"),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        let message = e.to_string();
        match e {
            StoreError::DuplicateKey(_) => AppError::Conflict { message },
            StoreError::Invalid(_) => AppError::BadRequest { message },
            StoreError::Timeout(_) => AppError::GatewayTimeout { message },
            StoreError::Http(_) | StoreError::Api { .. } | StoreError::Json { .. } => {
                AppError::BadGateway { message }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Conflict { message } => (StatusCode::CONFLICT, message),
            AppError::GatewayTimeout { message } => (StatusCode::GATEWAY_TIMEOUT, message),
            AppError::BadGateway { message } => (StatusCode::BAD_GATEWAY, message),
        };

        if status.is_server_error() {
            warn!(%status, %message, "request failed");
        } else {
            debug!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
