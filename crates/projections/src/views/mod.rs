//! Read model views shipped with the crate.

pub mod aggregate_activity;
pub mod user_profiles;

pub use aggregate_activity::{AggregateActivity, AggregateActivityView};
pub use user_profiles::{UserProfile, UserProfileView};
