/// Whole-data-set load and save.
pub mod app_store;
/// Key/value blob media.
pub mod blob_store;
/// Game collection operations.
pub mod game;
/// Persisted record shapes.
pub mod models;
/// Storage error types.
pub mod storage;
