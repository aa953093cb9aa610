//! Alerting for LinkedWeld
//!
//! Raises document expiry and budget alerts, stores them as notifications and
//! forwards them to outbound channels.

mod evaluator;
mod notifier;
pub mod rules;

pub use evaluator::{AlertEvaluator, SweepReport};
pub use notifier::{NotificationError, NotificationSender};
pub use rules::{budget_alert, budget_level, budget_summary, document_alert};
