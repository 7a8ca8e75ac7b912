use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    entities::subscriptions::SubscriptionEntity,
    value_objects::dates::{deserialize_optional_date, deserialize_patch_date},
};

pub const MIN_SERVICE_NAME_LEN: usize = 2;
pub const MAX_SERVICE_NAME_LEN: usize = 100;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubscriptionValidationError {
    #[error(
        "service_name must be between {min} and {max} characters, got {0}",
        min = MIN_SERVICE_NAME_LEN,
        max = MAX_SERVICE_NAME_LEN
    )]
    ServiceNameLength(usize),
    #[error("price must be positive, got {0}")]
    NonPositivePrice(i32),
    #[error("price must not be negative, got {0}")]
    NegativePrice(i32),
}

pub fn validate_service_name(service_name: &str) -> Result<(), SubscriptionValidationError> {
    let length = service_name.chars().count();
    if !(MIN_SERVICE_NAME_LEN..=MAX_SERVICE_NAME_LEN).contains(&length) {
        return Err(SubscriptionValidationError::ServiceNameLength(length));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsertSubscriptionModel {
    pub service_name: String,
    pub price: i32,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub end_date: Option<NaiveDate>,
}

impl InsertSubscriptionModel {
    pub fn validate(&self) -> Result<(), SubscriptionValidationError> {
        validate_service_name(&self.service_name)?;
        if self.price <= 0 {
            return Err(SubscriptionValidationError::NonPositivePrice(self.price));
        }
        Ok(())
    }
}

/// Partial update. Price is only checked for sign here; positivity is a
/// creation rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateSubscriptionModel {
    pub service_name: Option<String>,
    pub price: Option<i32>,
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_patch_date")]
    pub end_date: Option<Option<NaiveDate>>,
}

impl UpdateSubscriptionModel {
    pub fn validate(&self) -> Result<(), SubscriptionValidationError> {
        if let Some(service_name) = &self.service_name {
            validate_service_name(service_name)?;
        }
        if let Some(price) = self.price.filter(|price| *price < 0) {
            return Err(SubscriptionValidationError::NegativePrice(price));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionDto {
    pub id: Uuid,
    pub service_name: String,
    pub price: i32,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SubscriptionEntity> for SubscriptionDto {
    fn from(value: SubscriptionEntity) -> Self {
        Self {
            id: value.id,
            service_name: value.service_name,
            price: value.price,
            user_id: value.user_id,
            start_date: value.start_date,
            end_date: value.end_date,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CostDto {
    pub total: i64,
}
