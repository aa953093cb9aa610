//! # LinkedWeld
//!
//! Workforce and project management for welding subcontractors.
//!
//! LinkedWeld keeps worker records, tracks document and certificate expiry,
//! watches project budgets against their expenses, and moves candidates
//! through a recruitment pipeline until they are hired.
//!
//! ## Architecture
//!
//! - **Storage**: a [`db::Store`] backed by in-memory tables or SQLite
//! - **Alerting**: expiry and budget rules, a periodic sweep and outbound notifiers
//! - **API**: REST API with a `{success, data|error}` envelope
//! - **TUI**: Terminal-based dashboard
//!
//! ## Quick Start
//!
//! ```bash
//! # Start the API server
//! linkedweld serve
//!
//! # View the TUI dashboard
//! linkedweld dashboard
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod alerting;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod models;
pub mod recruitment;
pub mod tui;

pub use config::Config;
pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::alerting::{AlertEvaluator, NotificationSender};
    pub use crate::config::Config;
    pub use crate::db::{open_store, Store};
    pub use crate::error::{Error, Result};
    pub use crate::models::*;
}
