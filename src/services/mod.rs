/// Board and game editing.
pub mod editor_service;
/// Game catalogue and sign-in.
pub mod game_service;
/// Session notice construction and broadcasting.
pub mod session_events;
/// Host actions on the active session.
pub mod session_service;
