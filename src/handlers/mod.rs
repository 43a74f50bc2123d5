//! Axum handlers. Each module maps one resource onto its repository.

pub mod asset_handlers;
pub mod auth_handlers;
pub mod folder_handlers;
pub mod health_handlers;
pub mod object_handlers;
