//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `CART_DATA_DIR` - Directory holding the persisted cart (default: `.cart`)
//! - `CART_STORAGE_KEY` - Storage key for the cart (default: `cart`)
//! - `CART_FREE_SHIPPING_THRESHOLD` - Subtotal from which shipping is free (default: 75.00)
//! - `CART_FLAT_SHIPPING_FEE` - Shipping fee below the threshold (default: 7.50)
//! - `CART_CURRENCY_SYMBOL` - Symbol used when formatting prices (default: €)
//! - `CART_OUTBOX_DIR` - Where submitted orders are written (default: `<data dir>/outbox`)

use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::{Money, ShippingPolicy};

const DEFAULT_DATA_DIR: &str = ".cart";
const DEFAULT_STORAGE_KEY: &str = "cart";
const DEFAULT_CURRENCY_SYMBOL: &str = "€";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    pub data_dir: PathBuf,
    pub storage_key: String,
    pub shipping: ShippingPolicy,
    pub currency_symbol: String,
    pub outbox_dir: PathBuf,
}

impl Default for CartConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from(DEFAULT_DATA_DIR);
        Self {
            outbox_dir: data_dir.join("outbox"),
            data_dir,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            shipping: ShippingPolicy::default(),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }
}

impl CartConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let data_dir = get("CART_DATA_DIR").map_or(defaults.data_dir, PathBuf::from);
        let outbox_dir = get("CART_OUTBOX_DIR").map_or_else(|| data_dir.join("outbox"), PathBuf::from);
        let storage_key = get("CART_STORAGE_KEY").unwrap_or(defaults.storage_key);
        if storage_key.contains(['/', '\\']) {
            return Err(ConfigError::InvalidEnvVar("CART_STORAGE_KEY".into(), "must not contain path separators".into()));
        }

        let shipping = ShippingPolicy {
            free_threshold: parse_money("CART_FREE_SHIPPING_THRESHOLD", get("CART_FREE_SHIPPING_THRESHOLD"))?
                .unwrap_or(defaults.shipping.free_threshold),
            flat_fee: parse_money("CART_FLAT_SHIPPING_FEE", get("CART_FLAT_SHIPPING_FEE"))?
                .unwrap_or(defaults.shipping.flat_fee),
        };

        Ok(Self {
            data_dir,
            storage_key,
            shipping,
            currency_symbol: get("CART_CURRENCY_SYMBOL").unwrap_or(defaults.currency_symbol),
            outbox_dir,
        })
    }
}

fn parse_money(name: &str, raw: Option<String>) -> Result<Option<Money>, ConfigError> {
    let Some(raw) = raw else { return Ok(None) };
    let amount = Decimal::from_str(&raw).map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string()))?;
    Money::new(amount).map(Some).map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string()))
}
