use anyhow::Result;
use async_trait::async_trait;
use diesel::{
    RunQueryDsl, delete, dsl::sql, insert_into, pg::Pg, prelude::*, sql_types::{BigInt, Integer},
    update,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::subscriptions},
};
use domain::{
    entities::subscriptions::{
        InsertSubscriptionEntity, SubscriptionEntity, UpdateSubscriptionEntity,
    },
    repositories::subscriptions::SubscriptionRepository,
    value_objects::subscription_filters::{
        CostQuery, DateField, IdField, ListQuery, PredicateSet, SubscriptionPredicate, TextField,
    },
};

// Must stay in step with `billing_periods::month_index`.
const START_MONTH_INDEX: &str =
    "(EXTRACT(YEAR FROM start_date)::int * 12 + EXTRACT(MONTH FROM start_date)::int - 1)";
const END_MONTH_INDEX: &str =
    "(EXTRACT(YEAR FROM end_date)::int * 12 + EXTRACT(MONTH FROM end_date)::int - 1)";

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn create(&self, insert_entity: InsertSubscriptionEntity) -> Result<SubscriptionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(subscriptions::table)
            .values(&insert_entity)
            .returning(SubscriptionEntity::as_returning())
            .get_result::<SubscriptionEntity>(&mut conn)?;

        Ok(result)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscriptions::table
            .find(id)
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn update(
        &self,
        id: Uuid,
        update_entity: UpdateSubscriptionEntity,
    ) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(subscriptions::table.find(id))
            .set(&update_entity)
            .returning(SubscriptionEntity::as_returning())
            .get_result::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn delete(&self, id: Uuid) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let deleted = delete(subscriptions::table.find(id)).execute(&mut conn)?;

        Ok(deleted)
    }

    async fn list(&self, query: ListQuery) -> Result<Vec<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = list_statement(&query).load::<SubscriptionEntity>(&mut conn)?;

        Ok(results)
    }

    async fn aggregate_cost(&self, query: CostQuery) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let total = cost_statement(&query).get_result::<i64>(&mut conn)?;

        Ok(total)
    }
}

fn list_statement(query: &ListQuery) -> subscriptions::BoxedQuery<'static, Pg> {
    let statement = subscriptions::table
        .order(subscriptions::created_at.desc())
        .limit(query.pagination.limit)
        .offset(query.pagination.offset)
        .into_boxed();

    apply_predicates(statement, &query.predicates)
}

/// One aggregate row: `price × months` summed over the candidates, with the
/// overlap window clamped in month-index space.
fn cost_statement(query: &CostQuery) -> subscriptions::BoxedQuery<'static, Pg, BigInt> {
    let period_start = query.period.start_month_index();
    let period_end = query.period.end_month_index();

    let total = sql::<BigInt>(&format!(
        "COALESCE(SUM(price::bigint * GREATEST(0, LEAST(COALESCE({END_MONTH_INDEX}, "
    ))
    .bind::<Integer, _>(period_end)
    .sql("), ")
    .bind::<Integer, _>(period_end)
    .sql(&format!(") - GREATEST({START_MONTH_INDEX}, "))
    .bind::<Integer, _>(period_start)
    .sql(") + 1)), 0)::bigint");

    let statement = subscriptions::table.select(total).into_boxed();

    apply_predicates(statement, &query.predicates)
}

fn apply_predicates<'a, ST>(
    mut statement: subscriptions::BoxedQuery<'a, Pg, ST>,
    predicates: &PredicateSet,
) -> subscriptions::BoxedQuery<'a, Pg, ST> {
    for predicate in predicates.iter() {
        statement = match predicate {
            SubscriptionPredicate::Equals(IdField::UserId, user_id) => {
                statement.filter(subscriptions::user_id.eq(*user_id))
            }
            SubscriptionPredicate::ILikeSubstring(TextField::ServiceName, fragment) => {
                statement.filter(subscriptions::service_name.ilike(substring_pattern(fragment)))
            }
            SubscriptionPredicate::DateLte(DateField::StartDate, date) => {
                statement.filter(subscriptions::start_date.le(*date))
            }
            SubscriptionPredicate::DateLte(DateField::EndDate, date) => {
                statement.filter(subscriptions::end_date.le(*date))
            }
            SubscriptionPredicate::DateGteOrNull(DateField::StartDate, date) => {
                statement.filter(subscriptions::start_date.ge(*date))
            }
            SubscriptionPredicate::DateGteOrNull(DateField::EndDate, date) => statement.filter(
                subscriptions::end_date
                    .is_null()
                    .or(subscriptions::end_date.ge(*date)),
            ),
        };
    }

    statement
}

/// `%fragment%` with LIKE wildcards in the fragment matched literally.
fn substring_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
