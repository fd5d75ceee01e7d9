//! Library crate for gameshow-host: game storage, board editing and live
//! session control for a two-team quiz show.

/// Host configuration.
pub mod config;
/// Persistence layer.
pub mod dao;
/// Input payloads, projections and notices.
pub mod dto;
/// Service-level errors.
pub mod error;
/// Operations exposed to the presentation layer.
pub mod services;
/// Runtime state: games, sessions and notifications.
pub mod state;
