use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use crates::{
    domain::{
        repositories::subscriptions::SubscriptionRepository,
        value_objects::{
            dates::parse_period_bound,
            subscription_filters::{DEFAULT_LIST_LIMIT, SubscriptionFilter},
            subscriptions::{InsertSubscriptionModel, UpdateSubscriptionModel},
        },
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::subscriptions::SubscriptionPostgres,
    },
};
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    axum_http::error_responses::ErrorResponse,
    usecases::subscriptions::{SubscriptionError, SubscriptionUseCase},
};

// Run example
//   curl "http://localhost:$SERVER_PORT/subscriptions/cost?user_id=$USER_ID&start_date=2025-01&end_date=2025-06"

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let subscriptions_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let subscriptions_usecase = SubscriptionUseCase::new(Arc::new(subscriptions_repository));

    Router::new()
        .route("/", get(list).post(create))
        .route("/cost", get(calculate_cost))
        .route("/:id", get(read).put(update).delete(remove))
        .with_state(Arc::new(subscriptions_usecase))
}

/// Query values arrive as raw strings so malformed input can be reported
/// (or defaulted) here instead of by the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct ListSubscriptionsParams {
    pub user_id: Option<String>,
    pub service_name: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CostParams {
    pub user_id: Option<String>,
    pub service_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub async fn create<T>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<T>>>,
    payload: Result<Json<InsertSubscriptionModel>, JsonRejection>,
) -> Response
where
    T: SubscriptionRepository + Send + Sync + 'static,
{
    let Json(insert_subscription_model) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_json(rejection),
    };

    info!(
        user_id = %insert_subscription_model.user_id,
        "subscriptions: create request received"
    );

    match subscriptions_usecase.create(insert_subscription_model).await {
        Ok(subscription) => (StatusCode::CREATED, Json(subscription)).into_response(),
        Err(err) => usecase_failure("create", err),
    }
}

pub async fn read<T>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<T>>>,
    Path(raw_id): Path<String>,
) -> Response
where
    T: SubscriptionRepository + Send + Sync + 'static,
{
    let id = match parse_uuid("id", &raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match subscriptions_usecase.read(id).await {
        Ok(subscription) => Json(subscription).into_response(),
        Err(err) => usecase_failure("read", err),
    }
}

pub async fn update<T>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<T>>>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateSubscriptionModel>, JsonRejection>,
) -> Response
where
    T: SubscriptionRepository + Send + Sync + 'static,
{
    let id = match parse_uuid("id", &raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let Json(update_subscription_model) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_json(rejection),
    };

    info!(%id, "subscriptions: update request received");

    match subscriptions_usecase
        .update(id, update_subscription_model)
        .await
    {
        Ok(subscription) => Json(subscription).into_response(),
        Err(err) => usecase_failure("update", err),
    }
}

pub async fn remove<T>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<T>>>,
    Path(raw_id): Path<String>,
) -> Response
where
    T: SubscriptionRepository + Send + Sync + 'static,
{
    let id = match parse_uuid("id", &raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    info!(%id, "subscriptions: delete request received");

    match subscriptions_usecase.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => usecase_failure("delete", err),
    }
}

pub async fn list<T>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<T>>>,
    Query(params): Query<ListSubscriptionsParams>,
) -> Response
where
    T: SubscriptionRepository + Send + Sync + 'static,
{
    let user_id = match parse_optional_uuid("user_id", params.user_id.as_deref()) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    let limit = parse_i64_or(params.limit.as_deref(), DEFAULT_LIST_LIMIT);
    let offset = parse_i64_or(params.offset.as_deref(), 0);

    match subscriptions_usecase
        .list(
            SubscriptionFilter::new(user_id, params.service_name),
            limit,
            offset,
        )
        .await
    {
        Ok(subscriptions) => Json(subscriptions).into_response(),
        Err(err) => usecase_failure("list", err),
    }
}

pub async fn calculate_cost<T>(
    State(subscriptions_usecase): State<Arc<SubscriptionUseCase<T>>>,
    Query(params): Query<CostParams>,
) -> Response
where
    T: SubscriptionRepository + Send + Sync + 'static,
{
    let user_id = match parse_optional_uuid("user_id", params.user_id.as_deref()) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    let period_start = match parse_period_param("start_date", params.start_date.as_deref()) {
        Ok(date) => date,
        Err(response) => return response,
    };
    let period_end = match parse_period_param("end_date", params.end_date.as_deref()) {
        Ok(date) => date,
        Err(response) => return response,
    };

    info!(
        user_id = ?user_id,
        %period_start,
        %period_end,
        "subscriptions: cost request received"
    );

    match subscriptions_usecase
        .calculate_cost(
            SubscriptionFilter::new(user_id, params.service_name),
            period_start,
            period_end,
        )
        .await
    {
        Ok(cost) => Json(cost).into_response(),
        Err(err) => usecase_failure("calculate_cost", err),
    }
}

fn usecase_failure(handler: &'static str, err: SubscriptionError) -> Response {
    match &err {
        SubscriptionError::Store { .. } => {
            error!(handler, error = ?err, "subscriptions: usecase failed");
        }
        _ => warn!(handler, error = %err, "subscriptions: request rejected"),
    }
    err.into_response()
}

fn bad_request(message: String) -> Response {
    ErrorResponse::new(StatusCode::BAD_REQUEST, message).into_response()
}

fn bad_json(rejection: JsonRejection) -> Response {
    warn!(error = %rejection.body_text(), "subscriptions: malformed request body");
    bad_request(rejection.body_text())
}

fn parse_uuid(name: &str, raw: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| bad_request(format!("{name} must be a valid UUID, got `{raw}`")))
}

/// Absent or blank means "no filter".
fn parse_optional_uuid(name: &str, raw: Option<&str>) -> Result<Option<Uuid>, Response> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_uuid(name, value).map(Some),
    }
}

fn parse_period_param(name: &str, raw: Option<&str>) -> Result<NaiveDate, Response> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(bad_request(format!("{name} is required")));
    }

    parse_period_bound(raw).ok_or_else(|| {
        bad_request(format!(
            "{name} must be YYYY-MM or YYYY-MM-DD, got `{raw}`"
        ))
    })
}

fn parse_i64_or(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
