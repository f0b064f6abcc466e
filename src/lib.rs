//! PointSync - Cloud sync service for the points system
//! Single-document JSON store with timestamped backup rotation

pub mod engine;
