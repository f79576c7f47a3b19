//! Data models for the TaskRelay application.
//!
//! This module contains the core data structures used throughout the application:
//! - [`Notification`]: A tagged progress message travelling from worker to UI
//! - [`DisplayState`]: Status label, transcript and trigger availability rendered by the window
//! - [`AppState`]: The central state container wrapping the display and run bookkeeping
//! - [`RelayConfig`]: Worker pacing and window settings loaded from `TaskRelay Config.yaml`
//!
//! # Architecture Note
//!
//! - **Serializable**: Config structs derive `Serialize`/`Deserialize` for YAML persistence
//! - **Immutable messages**: `Notification` has no setters once built
//! - **Guarded state**: AppState is wrapped in `Arc<RwLock<>>` by [`StateManager`](crate::state::StateManager)

pub mod app_state;
pub mod config;
pub mod display;
pub mod notification;

pub use app_state::{AppState, RunId};
pub use config::{ConfigError, RelayConfig, RelaySettings};
pub use display::{DisplayState, RunStatus};
pub use notification::{Notification, RunState};
