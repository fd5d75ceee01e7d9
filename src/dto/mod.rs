/// Session notices.
pub mod events;
/// Game requests and projections.
pub mod game;
/// Public phase tags.
pub mod phase;
/// Session views.
pub mod session;
/// Validation helpers.
pub mod validation;
