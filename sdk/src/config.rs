//! Configuration management for gateway access
//!
//! Values come from environment variables with sensible defaults so that
//! the same code can target the sandbox or production gateway without
//! recompilation.

use std::env;
use std::fmt;
use std::str::FromStr;

/// Gateway environment the merchant account lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development gateway
    Development,
    /// Sandbox gateway for integration testing
    #[default]
    Sandbox,
    /// Live gateway
    Production,
}

impl Environment {
    /// Base URL of the gateway API for this environment
    #[must_use]
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Development => "http://localhost:3000",
            Self::Sandbox => "https://api.sandbox.braintreegateway.com:443",
            Self::Production => "https://api.braintreegateway.com:443",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "sandbox" => Ok(Self::Sandbox),
            "production" => Ok(Self::Production),
            other => Err(format!("Unknown gateway environment: {other}")),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Centralized configuration for gateway access
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Gateway environment
    pub environment: Environment,

    /// Merchant account identifier, scopes every API path
    pub merchant_id: String,
}

impl GatewayConfig {
    /// Create a new configuration instance with values from environment variables
    /// or sensible defaults if not set
    #[must_use]
    pub fn new() -> Self {
        Self {
            environment: env::var("GATEWAY_ENVIRONMENT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),

            merchant_id: env::var("GATEWAY_MERCHANT_ID")
                .unwrap_or_else(|_| "merchant_id".to_string()),
        }
    }

    /// Configuration for an explicit environment and merchant
    #[must_use]
    pub fn with_merchant(environment: Environment, merchant_id: impl Into<String>) -> Self {
        Self {
            environment,
            merchant_id: merchant_id.into(),
        }
    }

    /// Merchant-scoped path prefix, e.g. `/merchants/merchant_id`
    #[must_use]
    pub fn merchant_path(&self) -> String {
        format!("/merchants/{}", self.merchant_id)
    }

    /// Absolute URL for a merchant-relative path
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}{}", self.environment.base_url(), self.merchant_path(), path)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new()
    }
}
