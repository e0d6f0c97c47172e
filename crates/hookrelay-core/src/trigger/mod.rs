//! Trigger subscription matching.

pub mod expression;
pub mod matcher;

pub use expression::{ExpressionError, SubscriptionEvaluator};
pub use matcher::TriggerMatcher;
