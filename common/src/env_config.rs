use std::{env, str::FromStr, sync::Arc};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Backend used for plan and user records.
pub enum RecordStoreKind {
    Postgres,
    /// Process-local store for tests and local runs. Starts with the seeded
    /// plans only; there is no way to create users, so authenticated routes
    /// answer "Authentication required" until a caller inserts them.
    Memory,
}

impl FromStr for RecordStoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "pg" => Ok(RecordStoreKind::Postgres),
            "memory" => Ok(RecordStoreKind::Memory),
            other => Err(format!("unknown record store: {}", other)),
        }
    }
}

#[derive(Clone, Debug)]
/// Configuration struct for the server.
///
/// Holds the server binding, database, caller-token and logging settings,
/// plus the Stripe credentials and the billing constants applied by the
/// webhook handlers.
pub struct Config {
    // environment
    pub environment: String, // development or production
    /// Which record store implementation to use.
    pub record_store: RecordStoreKind,
    /// The URL of the database to connect to. Empty when the memory store is used.
    pub database_url: String,
    /// Configuration for JWT (JSON Web Token) caller identity.
    pub jwt_config: JwtConfig,
    /// The hostname or IP address the server will bind to.
    pub server_host: String,
    /// The port number the server will listen on.
    pub server_port: u16,
    /// The number of worker threads to spawn for handling requests.
    pub num_workers: usize,
    /// The allowed origin for CORS (Cross-Origin Resource Sharing).
    pub cors_allowed_origin: String,
    /// A boolean indicating whether console logging is enabled.
    pub console_logging_enabled: bool,
    /// File the logger mirrors its output to.
    pub log_file: String,
    /// Stripe billing settings
    pub stripe: StripeConfig,
    /// Constants applied to user records by webhook handlers
    pub billing: BillingConfig,
}

#[derive(Clone, Debug)]
pub struct StripeConfig {
    /// Stripe secret key. Checked per request, may be empty.
    pub secret_key: String,
    /// Stripe webhook signing secret. Checked per request, may be empty.
    pub webhook_secret: String,
    /// Maximum age in seconds of a signed webhook timestamp.
    pub webhook_tolerance_secs: i64,
    /// Return stub checkout sessions instead of calling Stripe.
    pub checkout_dry_run: bool,
}

impl StripeConfig {
    pub fn has_secret_key(&self) -> bool {
        !self.secret_key.trim().is_empty()
    }

    pub fn has_webhook_secret(&self) -> bool {
        !self.webhook_secret.trim().is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct BillingConfig {
    /// Usage limit given back to a user whose subscription is deleted.
    pub free_tier_usage_limit: i32,
    /// Length of the billing period opened by a completed checkout.
    pub billing_period_days: i64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        BillingConfig {
            free_tier_usage_limit: 15,
            billing_period_days: 30,
        }
    }
}

#[derive(Clone, Debug)]
/// Configuration for JSON Web Token (JWT) authentication.
///
/// This struct contains the secret key used to sign JWTs and
/// the expiration time in hours for issued tokens.
pub struct JwtConfig {
    /// The secret key used to sign and verify JWTs.
    pub secret: String,
    /// The expiration time for JWTs in hours.
    pub expiration_hours: i64,
}

impl JwtConfig {
    /// Creates a new `JwtConfig` instance from environment variables.
    ///
    /// Reads the JWT configuration from environment variables:
    /// - `JWT_SECRET`: Required. The secret key for JWT signing.
    /// - `JWT_EXPIRATION_HOURS`: Optional. Defaults to 24 hours if not provided.
    ///
    /// # Panics
    ///
    /// This function will panic if `JWT_SECRET` environment variable is not set.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        JwtConfig {
            secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            expiration_hours: parse_or(env::var("JWT_EXPIRATION_HOURS").ok(), 24),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    ///
    /// # Environment Variables
    ///
    /// Required:
    /// - `JWT_SECRET`: Secret key for JWT signing (via `JwtConfig::from_env()`)
    /// - `DATABASE_URL`: Connection string for the database, unless `RECORD_STORE=memory`
    ///
    /// Optional (with defaults):
    /// - `ENVIRONMENT`: "development" or "production" (default: "development")
    /// - `RECORD_STORE`: "postgres" or "memory" (default: "postgres")
    /// - `IP`: Server host (default: "127.0.0.1")
    /// - `PORT`: Server port (default: 8080)
    /// - `WORKERS`: Number of worker threads (default: 4)
    /// - `CORS_ALLOWED_ORIGIN`: Allowed CORS origin (default: "http://localhost:3000")
    /// - `ENABLE_CONSOLE_LOGGING`: Whether to enable console logging (default: true)
    /// - `LOG_FILE`: Log file path (default: "billing.log")
    /// - `STRIPE_SECRET_KEY`, `STRIPE_WEBHOOK_SECRET`: Stripe credentials (default: empty)
    /// - `STRIPE_WEBHOOK_TOLERANCE_SECS`: Webhook timestamp tolerance (default: 300)
    /// - `STRIPE_CHECKOUT_DRY_RUN`: Stub checkout sessions (default: false)
    /// - `FREE_TIER_USAGE_LIMIT`: Limit restored on cancellation (default: 15)
    /// - `BILLING_PERIOD_DAYS`: Period opened by checkout (default: 30)
    ///
    /// # Panics
    ///
    /// This function will panic if required environment variables are missing
    /// or `RECORD_STORE` names an unknown store.
    pub fn from_env() -> Arc<Self> {
        dotenvy::dotenv().ok();

        let record_store = env::var("RECORD_STORE")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse::<RecordStoreKind>()
            .expect("RECORD_STORE must be 'postgres' or 'memory'");

        let database_url = match record_store {
            RecordStoreKind::Postgres => {
                env::var("DATABASE_URL").expect("DATABASE_URL must be set")
            }
            RecordStoreKind::Memory => env::var("DATABASE_URL").unwrap_or_default(),
        };

        let billing_defaults = BillingConfig::default();

        Arc::new(Config {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            record_store,
            database_url,
            jwt_config: JwtConfig::from_env(),
            server_host: env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: parse_or(env::var("PORT").ok(), 8080),
            num_workers: parse_or(env::var("WORKERS").ok(), 4),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            console_logging_enabled: flag_or(env::var("ENABLE_CONSOLE_LOGGING").ok(), true),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "billing.log".to_string()),
            stripe: StripeConfig {
                secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
                webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
                webhook_tolerance_secs: parse_or(
                    env::var("STRIPE_WEBHOOK_TOLERANCE_SECS").ok(),
                    300,
                ),
                checkout_dry_run: flag_or(env::var("STRIPE_CHECKOUT_DRY_RUN").ok(), false),
            },
            billing: BillingConfig {
                free_tier_usage_limit: parse_or(
                    env::var("FREE_TIER_USAGE_LIMIT").ok(),
                    billing_defaults.free_tier_usage_limit,
                ),
                billing_period_days: parse_or(
                    env::var("BILLING_PERIOD_DAYS").ok(),
                    billing_defaults.billing_period_days,
                ),
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn flag_or(value: Option<String>, default: bool) -> bool {
    match value {
        Some(v) => matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"),
        None => default,
    }
}
