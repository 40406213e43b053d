use std::env;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_SLOT_REFERENCE_MINUTES: u32 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Duration class the slot index counts free intervals against.
    pub slot_reference_minutes: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            slot_reference_minutes: DEFAULT_SLOT_REFERENCE_MINUTES,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            bind_addr: env::var("APP_BIND_ADDR")
                .unwrap_or_else(|_| {
                    warn!("APP_BIND_ADDR not set, using default");
                    DEFAULT_BIND_ADDR.to_string()
                }),
            slot_reference_minutes: Self::parse_reference_minutes(
                env::var("SLOT_REFERENCE_MINUTES").ok().as_deref(),
            ),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - check APP_BIND_ADDR");
        }

        config
    }

    fn parse_reference_minutes(raw: Option<&str>) -> u32 {
        match raw.map(|value| value.trim().parse::<u32>()) {
            Some(Ok(minutes)) if minutes > 0 => minutes,
            Some(_) => {
                warn!("SLOT_REFERENCE_MINUTES is not a positive integer, using default");
                DEFAULT_SLOT_REFERENCE_MINUTES
            }
            None => {
                warn!("SLOT_REFERENCE_MINUTES not set, using default");
                DEFAULT_SLOT_REFERENCE_MINUTES
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.bind_addr.is_empty() && self.slot_reference_minutes > 0
    }
}
