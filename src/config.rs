use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    /// When set, gateway orders are fabricated locally instead of calling
    /// the hosted Razorpay API. Never enable in production.
    pub payments_sandbox: bool,
    pub razorpay_key_id: Option<String>,
    pub razorpay_key_secret: Option<String>,
    pub razorpay_base_url: String,
    pub platform_account_id: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            payments_sandbox: parse_or_default("PAYMENTS_SANDBOX", false)?,
            razorpay_key_id: env::var("RAZORPAY_KEY_ID").ok(),
            razorpay_key_secret: env::var("RAZORPAY_KEY_SECRET").ok(),
            razorpay_base_url: env::var("RAZORPAY_BASE_URL")
                .unwrap_or_else(|_| "https://api.razorpay.com".to_string()),
            platform_account_id: env::var("RAZORPAY_PLATFORM_ACCOUNT_ID")
                .unwrap_or_else(|_| "platform".to_string()),
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
