use std::{env, time::Duration};

use log::*;
use rand::RngCore;
use widget_payment_engine::{
    helpers::{Encryption, UrlSigner},
    wpe_api::{auth_api::DEFAULT_TOKEN_TTL_HOURS, recovery_api::DEFAULT_LINK_EXPIRY_MINUTES},
    SQLITE_DB_URL,
};
use wpg_common::{helpers::parse_boolean_flag, Secret};

use crate::errors::ServerError;

const DEFAULT_WPG_HOST: &str = "127.0.0.1";
const DEFAULT_WPG_PORT: u16 = 4001;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:4000";
const DEFAULT_RECEIPT_EXPIRY_MINUTES: i64 = 10;
const DEFAULT_STRIPE_API_URL: &str = "https://api.stripe.com/v1";
const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_MAIL_FROM: &str = "info@widgets.com";
const SECRET_KEY_LENGTH: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Key for link signatures and link encryption. Must be 16, 24 or 32 bytes.
    pub secret_key: Secret<Vec<u8>>,
    pub token_ttl: chrono::Duration,
    pub reset_link_expiry_minutes: i64,
    pub receipt_expiry_minutes: i64,
    /// Base URL of the web front end. Reset and receipt links point here.
    pub frontend_url: String,
    pub stripe: StripeConfig,
    pub mail: MailConfig,
    /// If set, and there are no staff accounts yet, this account is created at start-up.
    pub initial_admin: Option<AdminBootstrap>,
}

#[derive(Clone, Debug)]
pub struct StripeConfig {
    pub api_url: String,
    pub secret: Secret<String>,
    /// The publishable key. It is not used by the server, but is logged at start-up so misconfigurations are obvious.
    pub publishable_key: String,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Secret<String>,
    pub from: String,
    /// When true, mail is logged instead of sent.
    pub disabled: bool,
}

#[derive(Clone, Debug)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: Secret<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_WPG_HOST.to_string(),
            port: DEFAULT_WPG_PORT,
            database_url: SQLITE_DB_URL.to_string(),
            secret_key: Secret::new(random_key()),
            token_ttl: chrono::Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
            reset_link_expiry_minutes: DEFAULT_LINK_EXPIRY_MINUTES,
            receipt_expiry_minutes: DEFAULT_RECEIPT_EXPIRY_MINUTES,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            stripe: StripeConfig::default(),
            mail: MailConfig::default(),
            initial_admin: None,
        }
    }
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_STRIPE_API_URL.to_string(),
            secret: Secret::default(),
            publishable_key: String::default(),
            timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            username: None,
            password: Secret::default(),
            from: DEFAULT_MAIL_FROM.to_string(),
            disabled: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("WPG_HOST").ok().unwrap_or_else(|| DEFAULT_WPG_HOST.into());
        let port = parse_or_default("WPG_PORT", DEFAULT_WPG_PORT);
        let database_url = env::var("WPG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ WPG_DATABASE_URL is not set. Using the default, {SQLITE_DB_URL}");
            SQLITE_DB_URL.to_string()
        });
        let secret_key = secret_key_from_env();
        let token_ttl = chrono::Duration::hours(parse_or_default("WPG_TOKEN_TTL_HOURS", DEFAULT_TOKEN_TTL_HOURS));
        let reset_link_expiry_minutes =
            parse_or_default("WPG_RESET_LINK_EXPIRY_MINUTES", DEFAULT_LINK_EXPIRY_MINUTES);
        let receipt_expiry_minutes = parse_or_default("WPG_RECEIPT_EXPIRY_MINUTES", DEFAULT_RECEIPT_EXPIRY_MINUTES);
        let frontend_url = env::var("WPG_FRONTEND_URL").ok().unwrap_or_else(|| {
            info!("🪛️ WPG_FRONTEND_URL is not set. Links will point at {DEFAULT_FRONTEND_URL}");
            DEFAULT_FRONTEND_URL.to_string()
        });
        let initial_admin = match (env::var("WPG_ADMIN_EMAIL").ok(), env::var("WPG_ADMIN_PASSWORD").ok()) {
            (Some(email), Some(password)) => Some(AdminBootstrap { email, password: Secret::new(password) }),
            (Some(_), None) | (None, Some(_)) => {
                warn!("🪛️ WPG_ADMIN_EMAIL and WPG_ADMIN_PASSWORD must be set together. No initial admin will be created.");
                None
            },
            (None, None) => None,
        };
        Self {
            host,
            port,
            database_url,
            secret_key,
            token_ttl,
            reset_link_expiry_minutes,
            receipt_expiry_minutes,
            frontend_url,
            stripe: StripeConfig::from_env_or_default(),
            mail: MailConfig::from_env_or_default(),
            initial_admin,
        }
    }

    pub fn url_signer(&self) -> Result<UrlSigner, ServerError> {
        UrlSigner::new(self.secret_key.reveal()).map_err(|e| ServerError::ConfigurationError(e.to_string()))
    }

    pub fn encryption(&self) -> Result<Encryption, ServerError> {
        Encryption::new(self.secret_key.reveal()).map_err(|e| ServerError::ConfigurationError(e.to_string()))
    }

    /// Where the browser is sent after paying. The sealed receipt travels in this link's query string.
    pub fn receipt_url(&self) -> String {
        format!("{}/receipt", self.frontend_url.trim_end_matches('/'))
    }
}

impl StripeConfig {
    pub fn from_env_or_default() -> Self {
        let api_url = env::var("WPG_STRIPE_API_URL").ok().unwrap_or_else(|| DEFAULT_STRIPE_API_URL.to_string());
        let secret = env::var("WPG_STRIPE_SECRET").ok().unwrap_or_else(|| {
            error!("🪛️ WPG_STRIPE_SECRET is not set. Every call to the payment gateway will be rejected.");
            String::default()
        });
        let publishable_key = env::var("WPG_STRIPE_KEY").ok().unwrap_or_default();
        let timeout = Duration::from_secs(parse_or_default("WPG_GATEWAY_TIMEOUT_SECS", DEFAULT_GATEWAY_TIMEOUT.as_secs()));
        Self { api_url, secret: Secret::new(secret), publishable_key, timeout }
    }
}

impl MailConfig {
    pub fn from_env_or_default() -> Self {
        let disabled = parse_boolean_flag(env::var("WPG_MAIL_DISABLED").ok(), false);
        let smtp_host = env::var("WPG_SMTP_HOST").ok().unwrap_or_else(|| {
            if !disabled {
                warn!("🪛️ WPG_SMTP_HOST is not set. Using localhost");
            }
            "localhost".to_string()
        });
        let smtp_port = parse_or_default("WPG_SMTP_PORT", DEFAULT_SMTP_PORT);
        let username = env::var("WPG_SMTP_USERNAME").ok().filter(|s| !s.is_empty());
        let password = Secret::new(env::var("WPG_SMTP_PASSWORD").ok().unwrap_or_default());
        let from = env::var("WPG_MAIL_FROM").ok().unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string());
        if disabled {
            info!("🪛️ Outgoing mail is disabled. Messages will be written to the log instead.");
        }
        Self { smtp_host, smtp_port, username, password, from, disabled }
    }
}

fn parse_or_default<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}

fn secret_key_from_env() -> Secret<Vec<u8>> {
    match env::var("WPG_SECRET_KEY") {
        Ok(s) if matches!(s.len(), 16 | 24 | 32) => Secret::new(s.into_bytes()),
        Ok(s) => {
            warn!(
                "🪛️ WPG_SECRET_KEY must be 16, 24 or 32 bytes long, but is {} bytes. Using a random key for this \
                 session. Links issued now will stop working when the server restarts.",
                s.len()
            );
            Secret::new(random_key())
        },
        Err(_) => {
            warn!(
                "🪛️ WPG_SECRET_KEY is not set. Using a random key for this session. Links issued now will stop \
                 working when the server restarts."
            );
            Secret::new(random_key())
        },
    }
}

fn random_key() -> Vec<u8> {
    let mut key = vec![0u8; SECRET_KEY_LENGTH];
    rand::thread_rng().fill_bytes(&mut key);
    key
}
