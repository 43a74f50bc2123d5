//! Repositories and the collaborators they sit on.

pub mod asset_repository;
pub mod auth_service;
pub mod error;
pub mod folder_repository;
pub mod library_view;
pub mod object_store;
pub mod session;
pub mod url_signer;
