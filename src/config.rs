use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use clap::Parser;
use std::{env, str::FromStr, time::Duration};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    pub database_url: String,
    /// Bucket literal recorded on every asset row.
    pub bucket: String,
    /// Externally reachable base URL, used to build signed and magic links.
    pub public_url: String,
    pub signing_secret: String,
    pub signed_url_ttl: Duration,
    pub max_upload_bytes: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("storage_dir", &self.storage_dir)
            .field("database_url", &self.database_url)
            .field("bucket", &self.bucket)
            .field("public_url", &self.public_url)
            .field("signing_secret", &"<redacted>")
            .field("signed_url_ttl", &self.signed_url_ttl)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Internal asset library API")]
pub struct Args {
    /// Host to bind to (overrides ASSET_LIBRARY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides ASSET_LIBRARY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where asset payloads are stored (overrides ASSET_LIBRARY_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Database URL (overrides ASSET_LIBRARY_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Bucket name recorded on assets (overrides ASSET_LIBRARY_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Public base URL for generated links (overrides ASSET_LIBRARY_PUBLIC_URL)
    #[arg(long)]
    pub public_url: Option<String>,

    /// Signed URL lifetime in seconds (overrides ASSET_LIBRARY_SIGNED_URL_TTL_SECS)
    #[arg(long)]
    pub signed_url_ttl_secs: Option<u64>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("ASSET_LIBRARY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parse_env("ASSET_LIBRARY_PORT", 3000u16)?;
        let env_storage =
            env::var("ASSET_LIBRARY_STORAGE_DIR").unwrap_or_else(|_| "./data/objects".into());
        let env_db = env::var("ASSET_LIBRARY_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/meta/asset_library.db".into());
        let env_bucket = env::var("ASSET_LIBRARY_BUCKET").unwrap_or_else(|_| "assets".into());
        let env_ttl = parse_env("ASSET_LIBRARY_SIGNED_URL_TTL_SECS", 60u64)?;
        let max_upload_bytes = parse_env("ASSET_LIBRARY_MAX_UPLOAD_BYTES", 50 * 1024 * 1024)?;

        let port = args.port.unwrap_or(env_port);
        let public_url = args
            .public_url
            .or_else(|| env::var("ASSET_LIBRARY_PUBLIC_URL").ok())
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", port));

        let signing_secret = match env::var("ASSET_LIBRARY_SIGNING_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!(
                    "ASSET_LIBRARY_SIGNING_SECRET not set, signed URLs will not survive a restart"
                );
                URL_SAFE_NO_PAD.encode(rand::random::<[u8; 32]>())
            }
        };

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port,
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            database_url: args.database_url.unwrap_or(env_db),
            bucket: args.bucket.unwrap_or(env_bucket),
            public_url,
            signing_secret,
            signed_url_ttl: Duration::from_secs(args.signed_url_ttl_secs.unwrap_or(env_ttl)),
            max_upload_bytes,
        };

        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Read and parse an env var, falling back to `default` when unset.
fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}
