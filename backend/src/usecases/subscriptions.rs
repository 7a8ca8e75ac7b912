use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{NaiveDate, Utc};
use crates::domain::{
    entities::subscriptions::{InsertSubscriptionEntity, UpdateSubscriptionEntity},
    repositories::subscriptions::SubscriptionRepository,
    value_objects::{
        billing_periods::{BillingPeriod, InvalidRange},
        subscription_filters::SubscriptionFilter,
        subscriptions::{
            CostDto, InsertSubscriptionModel, SubscriptionDto, SubscriptionValidationError,
            UpdateSubscriptionModel,
        },
    },
};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error(transparent)]
    Validation(#[from] SubscriptionValidationError),
    #[error("subscription with id {0} not found")]
    NotFound(Uuid),
    #[error(transparent)]
    InvalidRange(#[from] InvalidRange),
    /// Display never includes the underlying store error.
    #[error("failed to {operation} subscriptions ({target})")]
    Store {
        operation: &'static str,
        target: String,
        #[source]
        source: anyhow::Error,
    },
}

impl SubscriptionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SubscriptionError::Validation(_) | SubscriptionError::InvalidRange(_) => {
                StatusCode::BAD_REQUEST
            }
            SubscriptionError::NotFound(_) => StatusCode::NOT_FOUND,
            SubscriptionError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn store(operation: &'static str, target: impl Into<String>, source: anyhow::Error) -> Self {
        SubscriptionError::Store {
            operation,
            target: target.into(),
            source,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, SubscriptionError>;

fn describe_filter(filter: &SubscriptionFilter) -> String {
    format!(
        "user_id={}, service_name={}",
        filter
            .user_id
            .map(|user_id| user_id.to_string())
            .unwrap_or_default(),
        filter.service_name_fragment().unwrap_or_default()
    )
}

pub struct SubscriptionUseCase<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    subscription_repository: Arc<S>,
}

impl<S> SubscriptionUseCase<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repository: Arc<S>) -> Self {
        Self {
            subscription_repository,
        }
    }

    pub async fn create(&self, model: InsertSubscriptionModel) -> UseCaseResult<SubscriptionDto> {
        debug!(
            user_id = %model.user_id,
            service_name = %model.service_name,
            "subscriptions: create requested"
        );

        model.validate().inspect_err(|err| {
            warn!(user_id = %model.user_id, error = %err, "subscriptions: invalid create request");
        })?;

        let now = Utc::now();
        let insert_entity = InsertSubscriptionEntity {
            id: Uuid::new_v4(),
            service_name: model.service_name,
            price: model.price,
            user_id: model.user_id,
            start_date: model.start_date,
            end_date: model.end_date,
            created_at: now,
            updated_at: now,
        };
        let user_id = insert_entity.user_id;

        let subscription = self
            .subscription_repository
            .create(insert_entity)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "subscriptions: failed to create subscription");
                SubscriptionError::store("create", format!("user_id={user_id}"), err)
            })?;

        info!(subscription_id = %subscription.id, "subscriptions: subscription created");

        Ok(SubscriptionDto::from(subscription))
    }

    pub async fn read(&self, id: Uuid) -> UseCaseResult<SubscriptionDto> {
        debug!(%id, "subscriptions: read requested");

        let subscription = self
            .subscription_repository
            .find_by_id(id)
            .await
            .map_err(|err| {
                error!(%id, db_error = ?err, "subscriptions: failed to fetch subscription");
                SubscriptionError::store("read", format!("id={id}"), err)
            })?
            .ok_or(SubscriptionError::NotFound(id))?;

        Ok(SubscriptionDto::from(subscription))
    }

    pub async fn update(
        &self,
        id: Uuid,
        model: UpdateSubscriptionModel,
    ) -> UseCaseResult<SubscriptionDto> {
        debug!(%id, "subscriptions: update requested");

        model.validate().inspect_err(|err| {
            warn!(%id, error = %err, "subscriptions: invalid update request");
        })?;

        let update_entity = UpdateSubscriptionEntity {
            service_name: model.service_name,
            price: model.price,
            start_date: model.start_date,
            end_date: model.end_date,
            updated_at: Utc::now(),
        };

        let subscription = self
            .subscription_repository
            .update(id, update_entity)
            .await
            .map_err(|err| {
                error!(%id, db_error = ?err, "subscriptions: failed to update subscription");
                SubscriptionError::store("update", format!("id={id}"), err)
            })?
            .ok_or(SubscriptionError::NotFound(id))?;

        info!(%id, "subscriptions: subscription updated");

        Ok(SubscriptionDto::from(subscription))
    }

    pub async fn delete(&self, id: Uuid) -> UseCaseResult<()> {
        debug!(%id, "subscriptions: delete requested");

        let deleted = self
            .subscription_repository
            .delete(id)
            .await
            .map_err(|err| {
                error!(%id, db_error = ?err, "subscriptions: failed to delete subscription");
                SubscriptionError::store("delete", format!("id={id}"), err)
            })?;

        if deleted == 0 {
            return Err(SubscriptionError::NotFound(id));
        }

        info!(%id, "subscriptions: subscription deleted");

        Ok(())
    }

    pub async fn list(
        &self,
        filter: SubscriptionFilter,
        limit: i64,
        offset: i64,
    ) -> UseCaseResult<Vec<SubscriptionDto>> {
        let query = filter.list_query(limit, offset);
        debug!(
            filter = %describe_filter(&filter),
            limit = query.pagination.limit,
            offset = query.pagination.offset,
            "subscriptions: list requested"
        );

        let subscriptions = self
            .subscription_repository
            .list(query)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "subscriptions: failed to list subscriptions");
                SubscriptionError::store("list", describe_filter(&filter), err)
            })?;

        info!(
            filter = %describe_filter(&filter),
            count = subscriptions.len(),
            "subscriptions: subscriptions listed"
        );

        Ok(subscriptions.into_iter().map(SubscriptionDto::from).collect())
    }

    pub async fn calculate_cost(
        &self,
        filter: SubscriptionFilter,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> UseCaseResult<CostDto> {
        debug!(
            filter = %describe_filter(&filter),
            %period_start,
            %period_end,
            "subscriptions: cost calculation requested"
        );

        let period = BillingPeriod::new(period_start, period_end).inspect_err(|err| {
            warn!(error = %err, "subscriptions: invalid cost period");
        })?;

        let total = self
            .subscription_repository
            .aggregate_cost(filter.cost_query(period))
            .await
            .map_err(|err| {
                error!(db_error = ?err, "subscriptions: failed to calculate cost");
                SubscriptionError::store("aggregate cost of", describe_filter(&filter), err)
            })?;

        info!(
            filter = %describe_filter(&filter),
            total,
            "subscriptions: cost calculated"
        );

        Ok(CostDto { total })
    }
}
