//! Terminal User Interface for LinkedWeld
//!
//! A terminal dashboard over workers, projects, the recruitment pipeline and
//! current alerts.

mod app;
mod components;
mod event;
mod ui;

pub use app::{ActiveTab, App};
pub use event::{Event, EventHandler};
