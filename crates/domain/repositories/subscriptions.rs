use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::subscriptions::{
        InsertSubscriptionEntity, SubscriptionEntity, UpdateSubscriptionEntity,
    },
    value_objects::subscription_filters::{CostQuery, ListQuery},
};

/// Record store for subscriptions.
///
/// Implementations translate the typed predicates of [`ListQuery`] and
/// [`CostQuery`] into their native query language. `aggregate_cost` must sum
/// on the store side.
#[automock]
#[async_trait]
pub trait SubscriptionRepository {
    async fn create(&self, insert_entity: InsertSubscriptionEntity) -> Result<SubscriptionEntity>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SubscriptionEntity>>;

    /// Returns `None` when no row has this id.
    async fn update(
        &self,
        id: Uuid,
        update_entity: UpdateSubscriptionEntity,
    ) -> Result<Option<SubscriptionEntity>>;

    /// Returns the number of deleted rows.
    async fn delete(&self, id: Uuid) -> Result<usize>;

    async fn list(&self, query: ListQuery) -> Result<Vec<SubscriptionEntity>>;

    async fn aggregate_cost(&self, query: CostQuery) -> Result<i64>;
}
