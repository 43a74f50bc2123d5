//! Shared fixtures: in-memory SQLite, temp-dir object store, fake stores.

#![allow(dead_code)]

use asset_library::{
    build_state,
    config::AppConfig,
    db,
    models::{asset::UploadFile, user::SessionUser},
    services::{
        object_store::{ObjectReader, ObjectStore, ObjectStoreError, PutOptions, StoreResult},
        session::Session,
        url_signer::SignedUrl,
    },
    state::AppState,
};
use async_trait::async_trait;
use bytes::Bytes;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::{
    io,
    sync::{Arc, Mutex},
    time::Duration,
};
use tempfile::TempDir;

pub const SECRET: &str = "integration-secret";
pub const PUBLIC_URL: &str = "http://assets.test";

pub struct TestLibrary {
    /// Keeps the object directory alive for the test's duration.
    pub dir: TempDir,
    pub pool: Arc<SqlitePool>,
    pub state: AppState,
}

/// A single-connection in-memory database with the schema applied.
pub async fn memory_pool() -> Arc<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory sqlite");
    db::run_migrations(&pool).await.expect("apply migrations");
    Arc::new(pool)
}

pub fn config(dir: &TempDir) -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        storage_dir: dir.path().to_string_lossy().into_owned(),
        database_url: "sqlite::memory:".into(),
        bucket: "assets".into(),
        public_url: PUBLIC_URL.into(),
        signing_secret: SECRET.into(),
        signed_url_ttl: Duration::from_secs(60),
        max_upload_bytes: 1024 * 1024,
    }
}

pub async fn library() -> TestLibrary {
    let dir = tempfile::tempdir().expect("temp dir");
    let pool = memory_pool().await;
    let state = build_state(&config(&dir), pool.clone());
    TestLibrary { dir, pool, state }
}

pub fn user(id: &str) -> SessionUser {
    SessionUser {
        id: id.into(),
        email: format!("{id}@example.com"),
    }
}

pub fn signed_in(id: &str) -> Session {
    Session::signed_in(user(id))
}

pub fn file(name: &str, content: &'static [u8]) -> UploadFile {
    UploadFile {
        filename: name.into(),
        content_type: None,
        bytes: Bytes::from_static(content),
    }
}

/// Wraps another store and records every key written.
pub struct RecordingStore<S> {
    pub inner: S,
    pub puts: Mutex<Vec<String>>,
}

impl<S> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            puts: Mutex::new(Vec::new()),
        }
    }

    pub fn put_keys(&self) -> Vec<String> {
        self.puts.lock().unwrap().clone()
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for RecordingStore<S> {
    async fn put_object(&self, key: &str, bytes: Bytes, options: PutOptions) -> StoreResult<()> {
        self.puts.lock().unwrap().push(key.to_string());
        self.inner.put_object(key, bytes, options).await
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> StoreResult<SignedUrl> {
        self.inner.signed_url(key, ttl).await
    }

    async fn open_object(&self, key: &str) -> StoreResult<ObjectReader> {
        self.inner.open_object(key).await
    }

    async fn delete_object(&self, key: &str) -> StoreResult<()> {
        self.inner.delete_object(key).await
    }
}

/// Rejects every write; reads find nothing.
pub struct FailingStore;

#[async_trait]
impl ObjectStore for FailingStore {
    async fn put_object(&self, _key: &str, _bytes: Bytes, _options: PutOptions) -> StoreResult<()> {
        Err(ObjectStoreError::Io(io::Error::other("disk full")))
    }

    async fn signed_url(&self, key: &str, _ttl: Duration) -> StoreResult<SignedUrl> {
        Err(ObjectStoreError::NotFound(key.to_string()))
    }

    async fn open_object(&self, key: &str) -> StoreResult<ObjectReader> {
        Err(ObjectStoreError::NotFound(key.to_string()))
    }

    async fn delete_object(&self, key: &str) -> StoreResult<()> {
        Err(ObjectStoreError::NotFound(key.to_string()))
    }
}
