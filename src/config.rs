//! Service configuration
//!
//! Everything the service needs (AWS region, credentials, bucket, HTTP
//! settings) lives in one [`ServiceConfig`] that is handed to constructors.
//! There are no process-wide clients.

use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::config::Credentials;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

const ENV_PREFIX: &str = "MEDSCRIBE_";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(String),
    #[error("invalid value '{value}' for {name}: {reason}")]
    Invalid {
        name: String,
        value: String,
        reason: String,
    },
}

/// AWS connection settings
#[derive(Clone, PartialEq)]
pub struct AwsSettings {
    pub region: String,
    /// When both keys are present they are used as static credentials,
    /// otherwise the SDK default credential chain applies.
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

impl fmt::Debug for AwsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsSettings")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl AwsSettings {
    /// Build the shared SDK configuration used by the S3 and Transcribe clients
    pub async fn load_sdk_config(&self, operation_timeout: Duration) -> SdkConfig {
        let timeouts = TimeoutConfig::builder()
            .operation_timeout(operation_timeout)
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .timeout_config(timeouts);

        if let (Some(key_id), Some(secret)) = (&self.access_key_id, &self.secret_access_key) {
            log::info!("[Config] Using static AWS credentials for {}", self.region);
            loader = loader.credentials_provider(Credentials::new(
                key_id.clone(),
                secret.clone(),
                None,
                None,
                "medscribe-config",
            ));
        } else {
            log::info!("[Config] Using default AWS credential chain for {}", self.region);
        }

        loader.load().await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Address to listen on (default: 127.0.0.1)
    pub bind_address: IpAddr,
    /// Port to listen on (default: 5000)
    pub port: u16,
    /// Bucket that receives uploads and transcription output
    pub bucket: String,
    /// Key prefix for uploaded audio
    pub upload_prefix: String,
    /// Local directory for in-flight uploads
    pub staging_dir: PathBuf,
    pub max_upload_bytes: u64,
    /// Upper bound for each AWS operation
    pub request_timeout_secs: u64,
    pub aws: AwsSettings,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::from([127, 0, 0, 1]),
            port: 5000,
            bucket: String::new(),
            upload_prefix: "uploads/".to_string(),
            staging_dir: PathBuf::from("temp_uploads"),
            max_upload_bytes: 200 * 1024 * 1024,
            request_timeout_secs: 30,
            aws: AwsSettings::default(),
        }
    }
}

impl ServiceConfig {
    /// Load from the process environment (after reading an optional `.env`)
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenv::dotenv() {
            Ok(path) => log::info!("[Config] Loaded .env from {:?}", path),
            Err(e) => log::debug!("[Config] No .env file loaded: {}", e),
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from any variable source; unset variables keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{}{}", ENV_PREFIX, suffix));
        let mut config = Self::default();

        if let Some(value) = var("BIND_ADDRESS") {
            config.bind_address = parse_value("MEDSCRIBE_BIND_ADDRESS", &value)?;
        }
        if let Some(value) = var("PORT") {
            config.port = parse_value("MEDSCRIBE_PORT", &value)?;
        }
        config.bucket = var("BUCKET")
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing("MEDSCRIBE_BUCKET".to_string()))?;
        if let Some(value) = var("UPLOAD_PREFIX") {
            config.upload_prefix = value;
        }
        if let Some(value) = var("STAGING_DIR") {
            config.staging_dir = PathBuf::from(value);
        }
        if let Some(value) = var("MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = parse_value("MEDSCRIBE_MAX_UPLOAD_BYTES", &value)?;
        }
        if let Some(value) = var("REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_value("MEDSCRIBE_REQUEST_TIMEOUT_SECS", &value)?;
        }

        if let Some(region) = lookup("AWS_REGION") {
            config.aws.region = region;
        }
        config.aws.access_key_id = lookup("AWS_ACCESS_KEY_ID");
        config.aws.secret_access_key = lookup("AWS_SECRET_ACCESS_KEY");

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::Missing("MEDSCRIBE_BUCKET".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(invalid("MEDSCRIBE_MAX_UPLOAD_BYTES", "0", "must be positive"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("MEDSCRIBE_REQUEST_TIMEOUT_SECS", "0", "must be positive"));
        }
        match (&self.aws.access_key_id, &self.aws.secret_access_key) {
            (Some(_), None) => Err(ConfigError::Missing("AWS_SECRET_ACCESS_KEY".to_string())),
            (None, Some(_)) => Err(ConfigError::Missing("AWS_ACCESS_KEY_ID".to_string())),
            _ => Ok(()),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_value<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| invalid(name, value, &e.to_string()))
}

fn invalid(name: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
