use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::billing_periods::BillingPeriod;

pub const DEFAULT_LIST_LIMIT: i64 = 100;
pub const MAX_LIST_LIMIT: i64 = 1000;

/// Optional filters shared by the list and cost paths.
///
/// `None` means the filter is absent. A service name made only of whitespace
/// is also treated as absent once composed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriptionFilter {
    pub user_id: Option<Uuid>,
    pub service_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdField {
    UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    ServiceName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    StartDate,
    EndDate,
}

/// Store-agnostic filter condition. Adapters translate each variant into
/// their native query language and bind the value as a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionPredicate {
    Equals(IdField, Uuid),
    /// Case-insensitive substring match. The value is already trimmed.
    ILikeSubstring(TextField, String),
    DateLte(DateField, NaiveDate),
    /// Matches when the field is null or on/after the date.
    DateGteOrNull(DateField, NaiveDate),
}

/// Ordered, AND-combined list of predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredicateSet(Vec<SubscriptionPredicate>);

impl PredicateSet {
    pub fn push(&mut self, predicate: SubscriptionPredicate) {
        self.0.push(predicate);
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubscriptionPredicate> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    /// Clamps out-of-range bounds instead of rejecting them.
    pub fn normalize(limit: i64, offset: i64) -> Self {
        let limit = if limit <= 0 || limit > MAX_LIST_LIMIT {
            DEFAULT_LIST_LIMIT
        } else {
            limit
        };

        Self {
            limit,
            offset: offset.max(0),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

/// List path: results are always ordered by `created_at` descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub predicates: PredicateSet,
    pub pagination: Pagination,
}

/// Cost path: filter predicates followed by the candidate predicates for
/// the period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostQuery {
    pub predicates: PredicateSet,
    pub period: BillingPeriod,
}

impl SubscriptionFilter {
    pub fn new(user_id: Option<Uuid>, service_name: Option<String>) -> Self {
        Self {
            user_id,
            service_name,
        }
    }

    /// Trimmed service-name fragment, `None` when absent or blank.
    pub fn service_name_fragment(&self) -> Option<&str> {
        self.service_name
            .as_deref()
            .map(str::trim)
            .filter(|fragment| !fragment.is_empty())
    }

    pub fn predicates(&self) -> PredicateSet {
        let mut predicates = PredicateSet::default();

        if let Some(user_id) = self.user_id {
            predicates.push(SubscriptionPredicate::Equals(IdField::UserId, user_id));
        }

        if let Some(fragment) = self.service_name_fragment() {
            predicates.push(SubscriptionPredicate::ILikeSubstring(
                TextField::ServiceName,
                fragment.to_string(),
            ));
        }

        predicates
    }

    pub fn list_query(&self, limit: i64, offset: i64) -> ListQuery {
        ListQuery {
            predicates: self.predicates(),
            pagination: Pagination::normalize(limit, offset),
        }
    }

    pub fn cost_query(&self, period: BillingPeriod) -> CostQuery {
        let mut predicates = self.predicates();
        predicates.push(SubscriptionPredicate::DateLte(
            DateField::StartDate,
            period.end(),
        ));
        predicates.push(SubscriptionPredicate::DateGteOrNull(
            DateField::EndDate,
            period.start(),
        ));

        CostQuery { predicates, period }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn pagination_out_of_range_limits_fall_back_to_default() {
        assert_eq!(Pagination::normalize(0, 0).limit, 100);
        assert_eq!(Pagination::normalize(-3, 0).limit, 100);
        assert_eq!(Pagination::normalize(5000, 0).limit, 100);
        assert_eq!(Pagination::normalize(1001, 0).limit, 100);
    }

    #[test]
    fn pagination_keeps_limits_inside_bounds() {
        assert_eq!(Pagination::normalize(1, 0).limit, 1);
        assert_eq!(Pagination::normalize(1000, 0).limit, 1000);
    }

    #[test]
    fn negative_offset_is_clamped_to_zero() {
        assert_eq!(Pagination::normalize(10, -5).offset, 0);
        assert_eq!(Pagination::normalize(10, 7).offset, 7);
    }

    #[test]
    fn no_filters_compose_to_empty_predicate_set() {
        let query = SubscriptionFilter::default().list_query(0, -1);

        assert!(query.predicates.is_empty());
        assert_eq!(query.pagination, Pagination::default());
    }

    #[test]
    fn user_and_service_filters_keep_their_order() {
        let user_id = Uuid::new_v4();
        let filter = SubscriptionFilter::new(Some(user_id), Some("  plus ".to_string()));

        let predicates: Vec<_> = filter.predicates().iter().cloned().collect();

        assert_eq!(
            predicates,
            vec![
                SubscriptionPredicate::Equals(IdField::UserId, user_id),
                SubscriptionPredicate::ILikeSubstring(TextField::ServiceName, "plus".to_string()),
            ]
        );
    }

    #[test]
    fn blank_service_name_is_treated_as_absent() {
        let filter = SubscriptionFilter::new(None, Some(" \t ".to_string()));

        assert_eq!(filter.service_name_fragment(), None);
        assert!(filter.predicates().is_empty());
    }

    #[test]
    fn empty_service_name_differs_from_missing_only_before_composition() {
        let empty = SubscriptionFilter::new(None, Some(String::new()));
        let missing = SubscriptionFilter::default();

        assert_ne!(empty, missing);
        assert_eq!(empty.predicates(), missing.predicates());
    }

    #[test]
    fn cost_query_appends_candidate_predicates() {
        let user_id = Uuid::new_v4();
        let period = BillingPeriod::new(date(2025, 1, 20), date(2025, 6, 3)).unwrap();
        let filter = SubscriptionFilter::new(Some(user_id), None);

        let query = filter.cost_query(period);
        let predicates: Vec<_> = query.predicates.iter().cloned().collect();

        assert_eq!(
            predicates,
            vec![
                SubscriptionPredicate::Equals(IdField::UserId, user_id),
                SubscriptionPredicate::DateLte(DateField::StartDate, date(2025, 6, 1)),
                SubscriptionPredicate::DateGteOrNull(DateField::EndDate, date(2025, 1, 1)),
            ]
        );
        assert_eq!(query.period, period);
    }
}
