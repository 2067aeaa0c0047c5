use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use dotenvy::dotenv;

use crate::pdf::payslip::PayslipTemplate;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub api_prefix: String,
    pub log_dir: String,
    pub max_upload_bytes: usize,

    // Sessions
    pub session_ttl: Duration,
    pub session_capacity: u64,

    // Rate limiting
    pub rate_upload_per_min: u32,
    pub rate_generate_per_min: u32,

    pub template: PayslipTemplate,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; every key is optional.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let defaults = PayslipTemplate::default();
        let template = PayslipTemplate {
            organization_name: lookup("PAYSLIP_ORG_NAME").unwrap_or(defaults.organization_name),
            address_lines: lookup("PAYSLIP_ORG_ADDRESS")
                .map(|raw| raw.split('|').map(|l| l.trim().to_string()).collect())
                .unwrap_or(defaults.address_lines),
            period: lookup("PAYSLIP_PERIOD").unwrap_or(defaults.period),
            signer_name: lookup("PAYSLIP_SIGNER_NAME").unwrap_or(defaults.signer_name),
            signer_title: lookup("PAYSLIP_SIGNER_TITLE").unwrap_or(defaults.signer_title),
            contact_note: lookup("PAYSLIP_CONTACT_NOTE").unwrap_or(defaults.contact_note),
        };

        Ok(Self {
            server_addr: text("SERVER_ADDR", "127.0.0.1:8080"),
            api_prefix: text("API_PREFIX", "/api/v1"),
            log_dir: text("LOG_DIR", "logs"),
            max_upload_bytes: positive(&lookup, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,

            session_ttl: Duration::from_secs(positive(&lookup, "SESSION_TTL_SECS", 1800)?), // 30 min idle
            session_capacity: positive(&lookup, "SESSION_CAPACITY", 1000)?,

            rate_upload_per_min: positive(&lookup, "RATE_UPLOAD_PER_MIN", 30)?,
            rate_generate_per_min: positive(&lookup, "RATE_GENERATE_PER_MIN", 120)?,

            template,
        })
    }
}

fn positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr + PartialOrd + Default,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a number, got {raw:?}"))?,
        None => default,
    };
    if value <= T::default() {
        bail!("{key} must be greater than zero");
    }
    Ok(value)
}
