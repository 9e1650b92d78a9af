use super::types::*;
use crate::error_handling::types::ConfigError;
use clap::Parser;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_API_BASE_URL: &str = "https://api.agora.io/v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;
pub const DEFAULT_EXPIRY_SECS: u32 = 72000;
pub const DEFAULT_SERVICE_NAME: &str = "Agora Server";

/// Raw runtime parameters as given on the command line or in the environment.
///
/// Every value can be set with a `--flag`, with the environment variable
/// named in its `env` attribute, or in the TOML file passed with
/// `--config-file`. Values are only checked for presence and shape once
/// they are merged into a [`Config`] by [`Config::resolve`].
///
/// The environment variable names mirror the ones historically used by the
/// deployment (`APP_ID`, `vendor`, `accessKey`, ...) so existing `.env`
/// files keep working.
#[derive(Parser, Clone, Default)]
#[command(name = "rtcgate")]
#[command(version = "0.1.0")]
#[command(about = "Token issuer and cloud-recording proxy for real-time channels")]
pub struct Configuration {
    /// Optional TOML file holding any of the values below
    ///
    /// Command-line flags and environment variables take precedence over the
    /// file.
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Application identifier issued by the platform
    #[arg(long, env = "APP_ID")]
    pub app_id: Option<String>,

    /// Application certificate used as the token signing key
    #[arg(long, env = "APP_CERTIFICATE", hide_env_values = true)]
    pub app_certificate: Option<String>,

    /// Customer key for the recording REST API
    #[arg(long, env = "CUSTOMER_KEY")]
    pub customer_key: Option<String>,

    /// Legacy name of the customer key
    #[arg(long, env = "CUSTOMERID", hide = true)]
    pub customer_id: Option<String>,

    /// Customer secret for the recording REST API
    #[arg(long, env = "CUSTOMER_SECRET", hide_env_values = true)]
    pub customer_secret: Option<String>,

    /// Storage vendor code
    #[arg(long, env = "vendor")]
    pub vendor: Option<String>,

    /// Storage region code
    #[arg(long, env = "region")]
    pub region: Option<String>,

    /// Storage bucket recordings are uploaded to
    #[arg(long, env = "bucket")]
    pub bucket: Option<String>,

    /// Storage access key
    #[arg(long, env = "accessKey")]
    pub access_key: Option<String>,

    /// Storage secret key
    #[arg(long, env = "secretKey", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Port the HTTP server listens on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Address the HTTP server binds to
    #[arg(long, env = "BIND_ADDRESS")]
    pub bind_address: Option<IpAddr>,

    /// Base URL of the recording REST API, without the `/apps/<id>` suffix
    #[arg(long, env = "RECORDING_API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Timeout applied to every outbound recording API call
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    /// Retries for idempotent recording calls (acquire, query)
    #[arg(long, env = "MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// Initial backoff between retries, doubled after each attempt
    #[arg(long, env = "RETRY_BACKOFF_MS")]
    pub retry_backoff_ms: Option<u64>,

    /// Token lifetime used when a request does not carry `expiry`
    #[arg(long, env = "DEFAULT_EXPIRY_SECS")]
    pub default_expiry_secs: Option<u32>,

    /// Label returned by `GET /`
    #[arg(long, env = "SERVICE_NAME")]
    pub service_name: Option<String>,
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("config_file", &self.config_file)
            .field("app_id", &self.app_id)
            .field("app_certificate", &redact_option(&self.app_certificate))
            .field("customer_key", &self.customer_key)
            .field("customer_id", &self.customer_id)
            .field("customer_secret", &redact_option(&self.customer_secret))
            .field("vendor", &self.vendor)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("access_key", &self.access_key)
            .field("secret_key", &redact_option(&self.secret_key))
            .field("port", &self.port)
            .field("bind_address", &self.bind_address)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("default_expiry_secs", &self.default_expiry_secs)
            .field("service_name", &self.service_name)
            .finish()
    }
}

/// Layout of the optional TOML configuration file.
#[derive(Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfiguration {
    pub app_id: Option<String>,
    pub app_certificate: Option<String>,
    pub customer_key: Option<String>,
    pub customer_secret: Option<String>,
    pub vendor: Option<i64>,
    pub region: Option<i64>,
    pub bucket: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub port: Option<u16>,
    pub bind_address: Option<IpAddr>,
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_backoff_ms: Option<u64>,
    pub default_expiry_secs: Option<u32>,
    pub service_name: Option<String>,
}

impl fmt::Debug for FileConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileConfiguration")
            .field("app_id", &self.app_id)
            .field("app_certificate", &redact_option(&self.app_certificate))
            .field("customer_key", &self.customer_key)
            .field("customer_secret", &redact_option(&self.customer_secret))
            .field("vendor", &self.vendor)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("access_key", &self.access_key)
            .field("secret_key", &redact_option(&self.secret_key))
            .field("port", &self.port)
            .field("bind_address", &self.bind_address)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("default_expiry_secs", &self.default_expiry_secs)
            .field("service_name", &self.service_name)
            .finish()
    }
}

impl FileConfiguration {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// Validated, immutable process configuration.
///
/// Built once at startup and shared by reference (`Arc<Config>`) with the
/// token issuer, the recording proxy and the web server.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub app: AppCredentials,
    pub customer: CustomerCredentials,
    pub storage: StorageConfig,
    pub bind_address: IpAddr,
    pub port: u16,
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub default_expiry_secs: u32,
    pub service_name: String,
}

impl Config {
    /// Parses the process arguments and environment, then resolves them.
    pub fn from_args() -> Result<Self, ConfigError> {
        Self::resolve(Configuration::parse())
    }

    /// Merges command-line/environment values over the optional file and
    /// validates the result.
    pub fn resolve(args: Configuration) -> Result<Self, ConfigError> {
        let file = match &args.config_file {
            Some(path) => FileConfiguration::from_file(path)?,
            None => FileConfiguration::default(),
        };
        Self::merge(args, file)
    }

    fn merge(args: Configuration, file: FileConfiguration) -> Result<Self, ConfigError> {
        let app = AppCredentials {
            app_id: required("app_id", args.app_id, file.app_id)?,
            app_certificate: required("app_certificate", args.app_certificate, file.app_certificate)?,
        };

        let customer = CustomerCredentials {
            key: required(
                "customer_key",
                non_empty(args.customer_key).or(non_empty(args.customer_id)),
                file.customer_key,
            )?,
            secret: required("customer_secret", args.customer_secret, file.customer_secret)?,
        };

        let storage = StorageConfig {
            vendor: integer("vendor", args.vendor, file.vendor)?,
            region: integer("region", args.region, file.region)?,
            bucket: required("bucket", args.bucket, file.bucket)?,
            access_key: required("access_key", args.access_key, file.access_key)?,
            secret_key: required("secret_key", args.secret_key, file.secret_key)?,
        };

        let port = args.port.or(file.port).unwrap_or(DEFAULT_PORT);
        if port == 0 {
            return Err(ConfigError::InvalidValue(
                "port".to_string(),
                "must be between 1 and 65535".to_string(),
            ));
        }

        let bind_address = match args.bind_address.or(file.bind_address) {
            Some(addr) => addr,
            None => DEFAULT_BIND_ADDRESS.parse().map_err(|_| {
                ConfigError::InvalidValue("bind_address".to_string(), DEFAULT_BIND_ADDRESS.to_string())
            })?,
        };

        let api_base_url = non_empty(args.api_base_url)
            .or(non_empty(file.api_base_url))
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "api_base_url".to_string(),
                format!("{} is not an http(s) URL", api_base_url),
            ));
        }
        let api_base_url = api_base_url.trim_end_matches('/').to_string();

        let timeout_secs = args
            .request_timeout_secs
            .or(file.request_timeout_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "request_timeout_secs".to_string(),
                "must be greater than 0".to_string(),
            ));
        }

        Ok(Config {
            app,
            customer,
            storage,
            bind_address,
            port,
            api_base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            max_retries: args
                .max_retries
                .or(file.max_retries)
                .unwrap_or(DEFAULT_MAX_RETRIES),
            retry_backoff: Duration::from_millis(
                args.retry_backoff_ms
                    .or(file.retry_backoff_ms)
                    .unwrap_or(DEFAULT_RETRY_BACKOFF_MS),
            ),
            default_expiry_secs: args
                .default_expiry_secs
                .or(file.default_expiry_secs)
                .unwrap_or(DEFAULT_EXPIRY_SECS),
            service_name: non_empty(args.service_name)
                .or(non_empty(file.service_name))
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(
    key: &str,
    cli: Option<String>,
    file: Option<String>,
) -> Result<String, ConfigError> {
    non_empty(cli)
        .or(non_empty(file))
        .ok_or_else(|| ConfigError::MissingValue(key.to_string()))
}

fn integer(key: &str, cli: Option<String>, file: Option<i64>) -> Result<i64, ConfigError> {
    match non_empty(cli) {
        Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), format!("{} is not an integer", raw))
        }),
        None => file.ok_or_else(|| ConfigError::MissingValue(key.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const ENV_KEYS: &[&str] = &[
        "CONFIG_FILE",
        "APP_ID",
        "APP_CERTIFICATE",
        "CUSTOMER_KEY",
        "CUSTOMERID",
        "CUSTOMER_SECRET",
        "vendor",
        "region",
        "bucket",
        "accessKey",
        "secretKey",
        "PORT",
        "BIND_ADDRESS",
        "RECORDING_API_BASE_URL",
        "REQUEST_TIMEOUT_SECS",
        "MAX_RETRIES",
        "RETRY_BACKOFF_MS",
        "DEFAULT_EXPIRY_SECS",
        "SERVICE_NAME",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    fn full_args() -> Vec<&'static str> {
        vec![
            "rtcgate",
            "--app-id",
            "appid",
            "--app-certificate",
            "cert",
            "--customer-key",
            "ckey",
            "--customer-secret",
            "csecret",
            "--vendor",
            "1",
            "--region",
            "3",
            "--bucket",
            "recordings",
            "--access-key",
            "ak",
            "--secret-key",
            "sk",
        ]
    }

    #[test]
    #[serial]
    fn test_from_args_with_defaults() {
        clear_env();
        let args = Configuration::try_parse_from(full_args()).unwrap_or_else(|e| panic!("{}", e));
        let config = Config::resolve(args).unwrap();

        assert_eq!(config.app.app_id, "appid");
        assert_eq!(config.app.app_certificate, "cert");
        assert_eq!(config.customer.key, "ckey");
        assert_eq!(config.storage.vendor, 1);
        assert_eq!(config.storage.region, 3);
        assert_eq!(config.storage.bucket, "recordings");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.default_expiry_secs, 72000);
        assert_eq!(config.service_name, "Agora Server");
    }

    #[test]
    #[serial]
    fn test_from_environment() {
        clear_env();
        std::env::set_var("APP_ID", "env-app");
        std::env::set_var("APP_CERTIFICATE", "env-cert");
        std::env::set_var("CUSTOMERID", "legacy-key");
        std::env::set_var("CUSTOMER_SECRET", "env-secret");
        std::env::set_var("vendor", "2");
        std::env::set_var("region", "0");
        std::env::set_var("bucket", "env-bucket");
        std::env::set_var("accessKey", "env-ak");
        std::env::set_var("secretKey", "env-sk");
        std::env::set_var("PORT", "9000");

        let args = Configuration::try_parse_from(["rtcgate"]).unwrap_or_else(|e| panic!("{}", e));
        let result = Config::resolve(args);
        clear_env();
        let config = result.unwrap();

        assert_eq!(config.app.app_id, "env-app");
        assert_eq!(config.customer.key, "legacy-key");
        assert_eq!(config.storage.vendor, 2);
        assert_eq!(config.storage.bucket, "env-bucket");
        assert_eq!(config.port, 9000);
    }

    #[test]
    #[serial]
    fn test_customer_key_wins_over_legacy_name() {
        clear_env();
        let mut argv = full_args();
        argv.extend(["--customer-id", "legacy"]);
        let args = Configuration::try_parse_from(argv).unwrap();
        let config = Config::resolve(args).unwrap();
        assert_eq!(config.customer.key, "ckey");
    }

    #[test]
    #[serial]
    fn test_missing_value_is_named() {
        clear_env();
        let argv: Vec<&str> = full_args()
            .into_iter()
            .filter(|a| *a != "--bucket" && *a != "recordings")
            .collect();
        let args = Configuration::try_parse_from(argv).unwrap();
        match Config::resolve(args) {
            Err(ConfigError::MissingValue(key)) => assert_eq!(key, "bucket"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_empty_value_counts_as_missing() {
        clear_env();
        let mut args = Configuration::try_parse_from(full_args()).unwrap();
        args.app_id = Some("  ".to_string());
        match Config::resolve(args) {
            Err(ConfigError::MissingValue(key)) => assert_eq!(key, "app_id"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_non_numeric_vendor() {
        clear_env();
        let mut args = Configuration::try_parse_from(full_args()).unwrap();
        args.vendor = Some("s3".to_string());
        match Config::resolve(args) {
            Err(ConfigError::InvalidValue(key, _)) => assert_eq!(key, "vendor"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_rejects_bad_base_url_and_zero_values() {
        clear_env();
        let mut args = Configuration::try_parse_from(full_args()).unwrap();
        args.api_base_url = Some("ftp://example.com".to_string());
        assert!(matches!(
            Config::resolve(args),
            Err(ConfigError::InvalidValue(ref key, _)) if key == "api_base_url"
        ));

        let mut args = Configuration::try_parse_from(full_args()).unwrap();
        args.port = Some(0);
        assert!(matches!(
            Config::resolve(args),
            Err(ConfigError::InvalidValue(ref key, _)) if key == "port"
        ));

        let mut args = Configuration::try_parse_from(full_args()).unwrap();
        args.request_timeout_secs = Some(0);
        assert!(matches!(
            Config::resolve(args),
            Err(ConfigError::InvalidValue(ref key, _)) if key == "request_timeout_secs"
        ));
    }

    #[test]
    #[serial]
    fn test_base_url_trailing_slash_is_trimmed() {
        clear_env();
        let mut args = Configuration::try_parse_from(full_args()).unwrap();
        args.api_base_url = Some("http://127.0.0.1:9999/v1/".to_string());
        let config = Config::resolve(args).unwrap();
        assert_eq!(config.api_base_url, "http://127.0.0.1:9999/v1");
    }

    #[test]
    #[serial]
    fn test_file_values_are_overridden_by_flags() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
app_id = "file-app"
app_certificate = "file-cert"
customer_key = "file-key"
customer_secret = "file-secret"
vendor = 1
region = 7
bucket = "file-bucket"
access_key = "file-ak"
secret_key = "file-sk"
port = 7000
max_retries = 5
service_name = "From File"
"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let args = Configuration::try_parse_from([
            "rtcgate",
            "--config-file",
            path.as_str(),
            "--app-id",
            "cli-app",
        ])
        .unwrap();
        let config = Config::resolve(args).unwrap();

        assert_eq!(config.app.app_id, "cli-app");
        assert_eq!(config.app.app_certificate, "file-cert");
        assert_eq!(config.storage.region, 7);
        assert_eq!(config.port, 7000);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.service_name, "From File");
    }

    #[test]
    fn test_raw_configuration_debug_hides_secrets() {
        let args = Configuration::try_parse_from([
            "rtcgate",
            "--app-certificate",
            "CERT-SECRET",
            "--customer-secret",
            "CUST-SECRET",
            "--secret-key",
            "SK-SECRET",
            "--bucket",
            "recordings",
        ])
        .unwrap();
        let printed = format!("{:?}", args);
        assert!(!printed.contains("CERT-SECRET"), "{}", printed);
        assert!(!printed.contains("CUST-SECRET"), "{}", printed);
        assert!(!printed.contains("SK-SECRET"), "{}", printed);
        assert!(printed.contains("recordings"));
        assert!(printed.contains(REDACTED));

        let file = FileConfiguration {
            app_certificate: Some("CERT-SECRET".to_string()),
            customer_secret: Some("CUST-SECRET".to_string()),
            secret_key: Some("SK-SECRET".to_string()),
            ..FileConfiguration::default()
        };
        let printed = format!("{:?}", file);
        assert!(!printed.contains("CERT-SECRET"), "{}", printed);
        assert!(!printed.contains("CUST-SECRET"), "{}", printed);
        assert!(!printed.contains("SK-SECRET"), "{}", printed);
    }

    #[test]
    fn test_unknown_file_key_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "apps_id = \"typo\"").unwrap();
        assert!(matches!(
            FileConfiguration::from_file(file.path()),
            Err(ConfigError::TomlError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            FileConfiguration::from_file(Path::new("/nonexistent/rtcgate.toml")),
            Err(ConfigError::IoError(_))
        ));
    }
}
