//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DB_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `MAX_UPLOAD_BYTES` (optional): request body limit, defaults to 12 MiB
/// - `STORAGE_DRIVER` (optional): `local`, `s3` or `memory`, defaults to `local`
/// - `STORAGE_ROOT` / `STORAGE_PUBLIC_URL`: local disk location and its public base URL
/// - `S3_BUCKET`, `S3_REGION`, `S3_ENDPOINT`, `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`: S3 disk
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    #[serde(default = "default_storage_driver")]
    pub storage_driver: String,

    #[serde(default = "default_storage_root")]
    pub storage_root: String,

    pub storage_public_url: Option<String>,

    pub s3_bucket: Option<String>,

    #[serde(default = "default_s3_region")]
    pub s3_region: String,

    /// Custom S3-compatible endpoint. Switches the disk to path-style URLs.
    pub s3_endpoint: Option<String>,

    pub aws_access_key_id: Option<String>,

    pub aws_secret_access_key: Option<String>,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    5
}

/// Large enough for a 10 MiB upload plus the other form fields.
fn default_max_upload_bytes() -> usize {
    12 * 1024 * 1024
}

fn default_storage_driver() -> String {
    "local".to_string()
}

fn default_storage_root() -> String {
    "storage/app/public".to_string()
}

fn default_s3_region() -> String {
    "us-east-1".to_string()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        envy::from_env::<Config>()
    }

    /// Public base URL for locally stored files.
    pub fn local_public_url(&self) -> String {
        self.storage_public_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}/storage", self.server_port))
    }
}
