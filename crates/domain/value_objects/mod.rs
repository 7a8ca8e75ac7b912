pub mod billing_periods;
pub mod dates;
pub mod subscription_filters;
pub mod subscriptions;
