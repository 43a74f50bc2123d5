//! Core data models for the asset library.
//!
//! Assets and folders map to SQLite tables via `sqlx::FromRow` and serialize
//! as JSON via `serde`. `FileKind` is the pure preview classification.

pub mod asset;
pub mod file_kind;
pub mod folder;
pub mod user;
