use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use crate::application::AppError;
use crate::domain::parse_month_year;

use super::dto::{
    non_empty, parse_subscription_id, CreatedResponse, ErrorResponse, HealthResponse, ListQuery,
    SubscriptionRequest, SubscriptionResponse, TotalQuery, TotalResponse,
};
use super::AppState;

/// POST /subscriptions
#[utoipa::path(
    post,
    path = "/subscriptions",
    summary = "Create subscription",
    tags = ["Subscriptions"],
    request_body = SubscriptionRequest,
    responses(
        (status = 201, description = "Subscription created", body = CreatedResponse),
        (status = 400, description = "Malformed or invalid body", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn create_subscription(
    State(state): State<AppState>,
    payload: Result<Json<SubscriptionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let id = state.service.create_subscription(request.into_input()?).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// GET /subscriptions/{id}
#[utoipa::path(
    get,
    path = "/subscriptions/{id}",
    summary = "Get subscription",
    tags = ["Subscriptions"],
    params(("id" = String, Path, description = "Subscription id (UUID)")),
    responses(
        (status = 200, description = "The subscription", body = SubscriptionResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "No such subscription", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn get_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let id = parse_subscription_id(&id)?;
    let subscription = state.service.get_subscription(id).await?;
    Ok(Json(SubscriptionResponse::from(&subscription)))
}

/// PUT /subscriptions/{id}
#[utoipa::path(
    put,
    path = "/subscriptions/{id}",
    summary = "Replace subscription",
    description = "Overwrites every field. A missing end_date makes the subscription open-ended.",
    tags = ["Subscriptions"],
    params(("id" = String, Path, description = "Subscription id (UUID)")),
    request_body = SubscriptionRequest,
    responses(
        (status = 204, description = "Subscription replaced"),
        (status = 400, description = "Malformed id or body", body = ErrorResponse),
        (status = 404, description = "No such subscription", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn update_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SubscriptionRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let id = parse_subscription_id(&id)?;
    let Json(request) = payload?;
    state
        .service
        .update_subscription(id, request.into_input()?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /subscriptions/{id}
#[utoipa::path(
    delete,
    path = "/subscriptions/{id}",
    summary = "Delete subscription",
    tags = ["Subscriptions"],
    params(("id" = String, Path, description = "Subscription id (UUID)")),
    responses(
        (status = 204, description = "Subscription deleted"),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "No such subscription", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn delete_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_subscription_id(&id)?;
    state.service.delete_subscription(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /subscriptions
#[utoipa::path(
    get,
    path = "/subscriptions",
    summary = "List subscriptions",
    description = "Newest start month first, then by service name.",
    tags = ["Subscriptions"],
    params(ListQuery),
    responses(
        (status = 200, description = "One page of subscriptions", body = Vec<SubscriptionResponse>),
        (status = 400, description = "Malformed user_id", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<SubscriptionResponse>>, AppError> {
    let Query(query) = query?;
    let subscriptions = state
        .service
        .list_subscriptions(&query.filter()?, query.page())
        .await?;

    Ok(Json(
        subscriptions.iter().map(SubscriptionResponse::from).collect(),
    ))
}

/// GET /subscriptions/total
#[utoipa::path(
    get,
    path = "/subscriptions/total",
    summary = "Total cost over a range of months",
    description = "Sums price times overlapping months for every matching subscription.",
    tags = ["Subscriptions"],
    params(TotalQuery),
    responses(
        (status = 200, description = "Aggregated cost", body = TotalResponse),
        (status = 400, description = "Missing or malformed parameters", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn total_cost(
    State(state): State<AppState>,
    query: Result<Query<TotalQuery>, QueryRejection>,
) -> Result<Json<TotalResponse>, AppError> {
    let Query(query) = query?;

    let (Some(from), Some(to)) = (
        non_empty(query.from.as_deref()),
        non_empty(query.to.as_deref()),
    ) else {
        return Err(AppError::validation("from and to are required (MM-YYYY)"));
    };

    let from = parse_month_year(from).map_err(|e| AppError::validation(format!("from: {e}")))?;
    let to = parse_month_year(to).map_err(|e| AppError::validation(format!("to: {e}")))?;

    let report = state
        .service
        .total_cost(&query.filter()?, from, to)
        .await?;
    Ok(Json(TotalResponse {
        total: report.total,
    }))
}

/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    summary = "Health check",
    tags = ["Health"],
    responses(
        (status = 200, description = "Database reachable", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let (status, label) = match state.service.health().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };
    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
        }),
    )
}
