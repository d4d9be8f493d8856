use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

const DEFAULT_JWT_SECRET: &str = "change-me";

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub email: EmailConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
    pub bootstrap: Option<BootstrapAdminConfig>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    pub expiry_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub user: String,
    pub password: Secret<String>,
    pub from_name: String,
    pub smtp_host: String,
    /// Front-end origin used to build reset links, without trailing slash.
    pub app_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Empty means "mirror the caller's origin".
    pub allowed_origins: Vec<String>,
    pub slow_request_threshold_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub max_requests: u32,
    pub auth_max_requests: u32,
    pub window_ms: u64,
}

/// First super administrator, created at start-up when no super admin exists.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapAdminConfig {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub user_name: String,
    pub password: Secret<String>,
}

impl AdminConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let environment = resolve_environment()?;
        let is_prod = environment == Environment::Prod;

        let config = AdminConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("admin-service"), false)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), false)?,
            log_level: get_env("LOG_LEVEL", Some("info"), false)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
            database: DatabaseConfig {
                url: Secret::new(database_url(is_prod)?),
                max_connections: parse_env("DB_MAX_CONNECTIONS", 5)?,
                min_connections: parse_env("DB_MIN_CONNECTIONS", 0)?,
                run_migrations: parse_env("RUN_MIGRATIONS", true)?,
            },
            jwt: JwtConfig {
                secret: Secret::new(get_env("JWT_SECRET", Some(DEFAULT_JWT_SECRET), is_prod)?),
                expiry_hours: parse_env("JWT_EXPIRY_HOURS", 12)?,
            },
            email: EmailConfig {
                user: get_env("EMAIL_USER", Some(""), is_prod)?,
                password: Secret::new(get_env("EMAIL_PASSWORD", Some(""), is_prod)?),
                from_name: get_env("EMAIL_FROM_NAME", Some("CYACC Admin"), false)?,
                smtp_host: get_env("SMTP_HOST", Some("smtp.gmail.com"), false)?,
                app_base_url: env::var("APP_BASE_URL")
                    .or_else(|_| env::var("FRONTEND_URL"))
                    .unwrap_or_else(|_| "http://localhost:3000".to_string())
                    .trim_end_matches('/')
                    .to_string(),
            },
            security: SecurityConfig {
                allowed_origins: allowed_origins(is_prod)?,
                slow_request_threshold_ms: parse_env("SLOW_REQUEST_THRESHOLD_MS", 1000)?,
            },
            rate_limit: RateLimitConfig {
                enabled: parse_env("RATE_LIMIT_ENABLED", true)?,
                max_requests: parse_env("RATE_LIMIT_MAX", 500)?,
                auth_max_requests: parse_env("AUTH_RATE_LIMIT_MAX", 5)?,
                window_ms: parse_env("RATE_LIMIT_WINDOW", 900_000)?,
            },
            bootstrap: bootstrap_admin()?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.jwt.expiry_hours <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_EXPIRY_HOURS must be positive"
            )));
        }

        if self.rate_limit.window_ms == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "RATE_LIMIT_WINDOW must be positive"
            )));
        }

        if self.environment == Environment::Prod {
            if self.jwt.secret.expose_secret() == DEFAULT_JWT_SECRET {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "JWT_SECRET must be changed in production"
                )));
            }

            if self.security.allowed_origins.is_empty() {
                tracing::warn!("ALLOWED_ORIGINS is empty in production; every origin is mirrored");
            }
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Prod
    }
}

fn resolve_environment() -> Result<Environment, AppError> {
    let raw = env::var("ENVIRONMENT")
        .or_else(|_| env::var("NODE_ENV"))
        .unwrap_or_else(|_| "dev".to_string());

    raw.parse()
        .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))
}

/// `DATABASE_URL`, or one assembled from the `DB_*` parts.
fn database_url(is_prod: bool) -> Result<String, AppError> {
    if let Ok(url) = env::var("DATABASE_URL") {
        if !url.is_empty() {
            return Ok(url);
        }
    }

    let host = get_env("DB_HOST", Some("localhost"), false)?;
    let port = get_env("DB_PORT", Some("5432"), false)?;
    let name = get_env("DB_NAME", Some("cyacc_admin"), is_prod)?;
    let user = get_env("DB_USER", Some("postgres"), is_prod)?;
    let password = get_env("DB_PASSWORD", Some(""), is_prod)?;
    let ssl: bool = parse_env("DB_SSL", false)?;

    let credentials = if password.is_empty() {
        urlencoding::encode(&user).into_owned()
    } else {
        format!(
            "{}:{}",
            urlencoding::encode(&user),
            urlencoding::encode(&password)
        )
    };

    let mut url = format!("postgres://{}@{}:{}/{}", credentials, host, port, name);
    if ssl {
        url.push_str("?sslmode=require");
    }
    Ok(url)
}

/// `*` means "mirror the request origin" and is refused in production.
fn allowed_origins(is_prod: bool) -> Result<Vec<String>, AppError> {
    let raw = get_env("ALLOWED_ORIGINS", Some(""), false)?;
    let entries: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if is_prod && entries.iter().any(|o| o == "*") {
        return Err(AppError::ConfigError(anyhow::anyhow!(
            "ALLOWED_ORIGINS must not contain '*' in production"
        )));
    }

    Ok(entries.into_iter().filter(|o| o != "*").collect())
}

fn bootstrap_admin() -> Result<Option<BootstrapAdminConfig>, AppError> {
    let Ok(user_name) = env::var("BOOTSTRAP_ADMIN_USER_NAME") else {
        return Ok(None);
    };

    Ok(Some(BootstrapAdminConfig {
        first_name: get_env("BOOTSTRAP_ADMIN_FIRST_NAME", Some("Super"), false)?,
        last_name: get_env("BOOTSTRAP_ADMIN_LAST_NAME", Some("Admin"), false)?,
        email: get_env("BOOTSTRAP_ADMIN_EMAIL", None, false)?,
        user_name,
        password: Secret::new(get_env("BOOTSTRAP_ADMIN_PASSWORD", None, false)?),
    }))
}

/// Read a variable; in production a missing value is an error even when a
/// development default exists.
fn get_env(key: &str, default: Option<&str>, required_in_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if required_in_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("Invalid value for {}: {}", key, e))
        }),
        _ => Ok(default),
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" | "test" => Ok(Environment::Dev),
            "prod" | "production" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
