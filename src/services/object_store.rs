//! src/services/object_store.rs
//!
//! Object store seam plus the local-disk implementation. Payloads live at
//! `base_path/{bucket}/{aa}/{bb}/{digest}` where `digest` is the hex
//! MD5 of `bucket/key` and `aa`, `bb` are its first two bytes. The logical
//! key never becomes a file name, so its length is bounded only by
//! `MAX_OBJECT_KEY_LEN`. Read access is handed out as HMAC-signed URLs.

use async_trait::async_trait;
use bytes::Bytes;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::{AsyncRead, AsyncWriteExt},
};
use tracing::debug;
use uuid::Uuid;

use super::url_signer::{SignatureError, SignedUrl, UrlSigner};

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("object `{0}` already exists")]
    AlreadyExists(String),
    #[error("object `{0}` not found")]
    NotFound(String),
    #[error("invalid object key")]
    InvalidObjectKey,
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StoreResult<T> = Result<T, ObjectStoreError>;

/// Options for a single write.
#[derive(Clone, Copy, Debug, Default)]
pub struct PutOptions {
    /// Replace an existing object at the same key. When false an existing
    /// key fails the write with `AlreadyExists`.
    pub overwrite: bool,
}

/// Streaming reader over an object's bytes.
pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

/// Binary content addressed by key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, key: &str, bytes: Bytes, options: PutOptions) -> StoreResult<()>;

    /// A URL readable without credentials until `ttl` elapses.
    async fn signed_url(&self, key: &str, ttl: Duration) -> StoreResult<SignedUrl>;

    async fn open_object(&self, key: &str) -> StoreResult<ObjectReader>;

    async fn delete_object(&self, key: &str) -> StoreResult<()>;
}

const MAX_OBJECT_KEY_LEN: usize = 1024;

/// Object store on the local filesystem.
#[derive(Clone, Debug)]
pub struct LocalObjectStore {
    base_path: PathBuf,
    bucket: String,
    signer: Arc<UrlSigner>,
}

impl LocalObjectStore {
    pub fn new(base_path: impl Into<PathBuf>, bucket: impl Into<String>, signer: Arc<UrlSigner>) -> Self {
        Self {
            base_path: base_path.into(),
            bucket: bucket.into(),
            signer,
        }
    }

    /// Rejects keys that are empty or too long, have an empty, `.` or `..`
    /// segment, or contain backslashes or control characters. Dots inside a
    /// segment (`Q1..final.pdf`) are fine.
    fn ensure_key_safe(key: &str) -> StoreResult<()> {
        if key.is_empty() || key.len() > MAX_OBJECT_KEY_LEN {
            return Err(ObjectStoreError::InvalidObjectKey);
        }
        if key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(ObjectStoreError::InvalidObjectKey);
        }
        if key.bytes().any(|b| b.is_ascii_control() || b == b'\\') {
            return Err(ObjectStoreError::InvalidObjectKey);
        }
        Ok(())
    }

    fn bucket_root(&self) -> PathBuf {
        self.base_path.join(&self.bucket)
    }

    fn object_path(&self, key: &str) -> PathBuf {
        let digest = md5::compute(format!("{}/{}", self.bucket, key));
        let mut path = self.bucket_root();
        path.push(format!("{:02x}", digest[0]));
        path.push(format!("{:02x}", digest[1]));
        path.push(format!("{:x}", digest));
        path
    }

    /// Remove empty directories from `start` up to, not including, the bucket root.
    async fn prune_empty_dirs(&self, start: &Path) {
        let stop = self.bucket_root();
        let mut current = start.to_path_buf();
        while current.starts_with(&stop) && current != stop {
            match fs::remove_dir(&current).await {
                Ok(_) => match current.parent() {
                    Some(parent) => current = parent.to_path_buf(),
                    None => break,
                },
                Err(err) if err.kind() == ErrorKind::NotFound => break,
                Err(err) if err.kind() == ErrorKind::DirectoryNotEmpty => break,
                Err(err) => {
                    debug!("failed to prune directory {}: {}", current.display(), err);
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    /// Write to a temp file, fsync, then move into place. Without
    /// `overwrite` the move is a hard link, which fails atomically if the
    /// key is already taken.
    async fn put_object(&self, key: &str, bytes: Bytes, options: PutOptions) -> StoreResult<()> {
        Self::ensure_key_safe(key)?;
        let file_path = self.object_path(key);
        let parent = file_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            ObjectStoreError::Io(io::Error::new(
                ErrorKind::Other,
                "object path missing parent directory",
            ))
        })?;
        fs::create_dir_all(&parent).await?;

        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;
        let written = async {
            file.write_all(&bytes).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;
        drop(file);
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(ObjectStoreError::Io(err));
        }

        if options.overwrite {
            if let Err(err) = fs::rename(&tmp_path, &file_path).await {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(ObjectStoreError::Io(err));
            }
        } else {
            let linked = fs::hard_link(&tmp_path, &file_path).await;
            let _ = fs::remove_file(&tmp_path).await;
            match linked {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    return Err(ObjectStoreError::AlreadyExists(key.to_string()));
                }
                Err(err) => return Err(ObjectStoreError::Io(err)),
            }
        }

        debug!("stored {} bytes at {}", bytes.len(), file_path.display());
        Ok(())
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> StoreResult<SignedUrl> {
        Self::ensure_key_safe(key)?;
        if !fs::try_exists(self.object_path(key)).await? {
            return Err(ObjectStoreError::NotFound(key.to_string()));
        }
        Ok(self.signer.sign(key, ttl)?)
    }

    async fn open_object(&self, key: &str) -> StoreResult<ObjectReader> {
        Self::ensure_key_safe(key)?;
        let file = File::open(self.object_path(key)).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                ObjectStoreError::NotFound(key.to_string())
            } else {
                ObjectStoreError::Io(err)
            }
        })?;
        Ok(Box::new(file))
    }

    async fn delete_object(&self, key: &str) -> StoreResult<()> {
        Self::ensure_key_safe(key)?;
        let file_path = self.object_path(key);
        match fs::remove_file(&file_path).await {
            Ok(_) => debug!("removed physical file {}", file_path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(ObjectStoreError::NotFound(key.to_string()));
            }
            Err(err) => return Err(ObjectStoreError::Io(err)),
        }
        if let Some(parent) = file_path.parent() {
            self.prune_empty_dirs(parent).await;
        }
        Ok(())
    }
}
