//! Contract for the remote payment gateway
//!
//! The record layer never talks to the network itself. It drives an
//! implementation of [`Gateway`], one blocking call per operation, and turns
//! the returned gateway objects back into records.

use crate::{
    config::GatewayConfig,
    error::Result,
    types::{CreditCard, Plan, RemoteSubscription, SubscriptionParams},
};
use std::fmt;

/// Blocking client for the gateway's subscription API
///
/// Implementations report a missing record as [`Error::NotFound`],
/// rejected input as [`Error::RemoteValidation`] and transport or service
/// trouble as [`Error::Remote`].
///
/// [`Error::NotFound`]: crate::Error::NotFound
/// [`Error::RemoteValidation`]: crate::Error::RemoteValidation
/// [`Error::Remote`]: crate::Error::Remote
pub trait Gateway {
    /// Fetch a subscription by id
    fn find_subscription(&self, id: &str) -> Result<RemoteSubscription>;

    /// Create a subscription
    fn create_subscription(&self, params: &SubscriptionParams) -> Result<RemoteSubscription>;

    /// Update an existing subscription
    fn update_subscription(
        &self,
        id: &str,
        params: &SubscriptionParams,
    ) -> Result<RemoteSubscription>;

    /// Cancel a subscription; canceled subscriptions cannot be reactivated
    fn cancel_subscription(&self, id: &str) -> Result<RemoteSubscription>;

    /// Every plan configured for the merchant
    fn list_plans(&self) -> Result<Vec<Plan>>;

    /// Fetch a vaulted credit card by payment method token
    fn find_credit_card(&self, token: &str) -> Result<CreditCard>;
}

/// HTTP method of a gateway endpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        })
    }
}

/// Gateway endpoint behind each [`Gateway`] call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    FindSubscription { id: String },
    CreateSubscription,
    UpdateSubscription { id: String },
    CancelSubscription { id: String },
    ListPlans,
    FindCreditCard { token: String },
}

impl Endpoint {
    #[must_use]
    pub const fn method(&self) -> Method {
        match self {
            Self::FindSubscription { .. } | Self::ListPlans | Self::FindCreditCard { .. } => {
                Method::Get
            }
            Self::CreateSubscription => Method::Post,
            Self::UpdateSubscription { .. } | Self::CancelSubscription { .. } => Method::Put,
        }
    }

    /// Path relative to the merchant prefix
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::FindSubscription { id } | Self::UpdateSubscription { id } => {
                format!("/subscriptions/{id}")
            }
            Self::CreateSubscription => "/subscriptions".to_string(),
            Self::CancelSubscription { id } => format!("/subscriptions/{id}/cancel"),
            Self::ListPlans => "/plans".to_string(),
            Self::FindCreditCard { token } => format!("/payment_methods/credit_card/{token}"),
        }
    }

    /// Merchant-scoped path, e.g. `/merchants/acme/subscriptions/abc`
    #[must_use]
    pub fn merchant_path(&self, config: &GatewayConfig) -> String {
        format!("{}{}", config.merchant_path(), self.path())
    }

    /// Absolute URL in the configured environment
    #[must_use]
    pub fn url(&self, config: &GatewayConfig) -> String {
        config.url_for(&self.path())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    #[test]
    fn test_endpoint_paths() {
        let cancel = Endpoint::CancelSubscription {
            id: "subscription_id".to_string(),
        };
        assert_eq!(cancel.method(), Method::Put);
        assert_eq!(cancel.to_string(), "PUT /subscriptions/subscription_id/cancel");

        let card = Endpoint::FindCreditCard {
            token: "credit_card_id".to_string(),
        };
        assert_eq!(card.method(), Method::Get);
        assert_eq!(card.path(), "/payment_methods/credit_card/credit_card_id");

        assert_eq!(Endpoint::CreateSubscription.method(), Method::Post);
        assert_eq!(Endpoint::ListPlans.path(), "/plans");
    }

    #[test]
    fn test_endpoint_merchant_scoping() {
        let config = GatewayConfig::with_merchant(Environment::Production, "acme");
        let find = Endpoint::FindSubscription {
            id: "abc".to_string(),
        };

        assert_eq!(find.merchant_path(&config), "/merchants/acme/subscriptions/abc");
        assert_eq!(
            find.url(&config),
            "https://api.braintreegateway.com:443/merchants/acme/subscriptions/abc"
        );
    }
}
