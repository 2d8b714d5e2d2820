use std::{env, io::Write, time::Duration};

use log::*;
use paystack_tools::PaystackConfig;
use rand::{thread_rng, Rng};
use serde_json::json;
use settle_common::{
    helpers::{parse_boolean_flag, parse_env},
    Secret,
};
use settlement_engine::queue::ConsumerConfig;
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_TSS_HOST: &str = "127.0.0.1";
const DEFAULT_TSS_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/settlement.db";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_QUEUE_PREFETCH: usize = 10;
const DEFAULT_QUEUE_POLL_MS: u64 = 500;
const DEFAULT_SETTLEMENT_INTERVAL: Duration = Duration::from_secs(60 * 60);
const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    /// Apply the embedded migrations on start-up
    pub run_migrations: bool,
    pub auth: AuthConfig,
    pub paystack: PaystackConfig,
    /// The key Paystack signs webhook bodies with. Paystack uses the account's secret key, so this defaults to
    /// `paystack.secret_key`.
    pub webhook_secret: Secret<String>,
    pub queue: ConsumerConfig,
    /// Time between runs of the rider settlement sweep
    pub settlement_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_TSS_HOST.to_string(),
            port: DEFAULT_TSS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            run_migrations: true,
            auth: AuthConfig::default(),
            paystack: PaystackConfig::default(),
            webhook_secret: Secret::default(),
            queue: ConsumerConfig {
                prefetch: DEFAULT_QUEUE_PREFETCH,
                poll_interval: Duration::from_millis(DEFAULT_QUEUE_POLL_MS),
            },
            settlement_interval: DEFAULT_SETTLEMENT_INTERVAL,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("TSS_HOST").ok().unwrap_or_else(|| DEFAULT_TSS_HOST.into());
        let port = env_or_default("TSS_PORT", DEFAULT_TSS_PORT);
        let database_url = env::var("TSS_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ TSS_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let db_max_connections = env_or_default("TSS_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS);
        let run_migrations = parse_boolean_flag(env::var("TSS_RUN_MIGRATIONS").ok(), true);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let paystack = PaystackConfig::new_from_env_or_default();
        let webhook_secret = match Secret::from_env("TSS_PAYSTACK_WEBHOOK_SECRET") {
            Some(s) => s,
            None => {
                info!("🪛️ TSS_PAYSTACK_WEBHOOK_SECRET is not set. Webhooks will be checked against the Paystack secret key.");
                paystack.secret_key.clone()
            },
        };
        if webhook_secret.is_empty() {
            error!("🪛️ There is no webhook signing secret. Every Paystack webhook will be rejected.");
        }
        let queue = ConsumerConfig {
            prefetch: env_or_default("TSS_QUEUE_PREFETCH", DEFAULT_QUEUE_PREFETCH).max(1),
            poll_interval: Duration::from_millis(env_or_default("TSS_QUEUE_POLL_MS", DEFAULT_QUEUE_POLL_MS)),
        };
        let settlement_interval = match env_or_default("TSS_SETTLEMENT_INTERVAL_SECS", 0u64) {
            0 => DEFAULT_SETTLEMENT_INTERVAL,
            secs => Duration::from_secs(secs),
        };
        Self {
            host,
            port,
            database_url,
            db_max_connections,
            run_migrations,
            auth,
            paystack,
            webhook_secret,
            queue,
            settlement_interval,
        }
    }
}

fn env_or_default<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match parse_env::<T>(name) {
        Some(Ok(v)) => v,
        Some(Err(e)) => {
            error!("🪛️ {e}. Using the default, {default}, instead.");
            default
        },
        None => {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
            default
        },
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The shared secret used to sign and verify HS256 access tokens.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. DO NOT operate in \
             production like this, since every token becomes invalid when the server restarts. 🚨️🚨️🚨️"
        );
        let mut key = [0u8; 32];
        thread_rng().fill(&mut key);
        let secret = hex::encode(key);
        match &mut tmpfile {
            Some((f, p)) => {
                let key_data = json!({ "jwt_secret": secret }).to_string();
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production instance, \
                         you are doing it wrong! Set the TSS_JWT_SECRET environment variable instead. 🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT secret.");
            },
        }
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: &str) -> Result<Self, ServerError> {
        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ServerError::ConfigurationError(format!(
                "The JWT secret must be at least {MIN_JWT_SECRET_LENGTH} characters long"
            )));
        }
        Ok(Self { jwt_secret: Secret::new(jwt_secret.to_string()) })
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("TSS_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [TSS_JWT_SECRET]")))?;
        Self::new(&secret)
    }
}
