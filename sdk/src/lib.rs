//! Subscription Gateway - validated subscription records over a payment gateway
//!
//! This crate wraps the subscription API of a payment gateway in a record
//! type with local validation and lazy associations. It includes:
//!
//! - Attribute extraction from field maps, JSON payloads and gateway objects
//! - Local validation with field-keyed error messages
//! - Create, update and cancel persistence through a [`Gateway`] implementation
//! - Lazily loaded plan and credit card, read-only add-ons, discounts and transactions
//!
//! # Example Usage
//!
//! ```rust
//! use subscription_gateway::{Attribute, Fields, MemoryGateway, Plan, Subscription};
//!
//! # fn main() -> subscription_gateway::Result<()> {
//! let gateway = MemoryGateway::default();
//! gateway.insert_plan(Plan {
//!     id: "gold".to_string(),
//!     name: "Gold".to_string(),
//!     price: "25.00".to_string(),
//!     billing_frequency: 1,
//!     number_of_billing_cycles: None,
//!     billing_day_of_month: None,
//!     trial_period: false,
//!     trial_duration: None,
//!     trial_duration_unit: None,
//!     add_ons: Vec::new(),
//!     discounts: Vec::new(),
//! })?;
//! gateway.insert_credit_card(subscription_gateway::CreditCard {
//!     token: "card".to_string(),
//!     cardholder_name: None,
//!     bin: "411111".to_string(),
//!     last_4: "1111".to_string(),
//!     expiration_month: "12".to_string(),
//!     expiration_year: "2040".to_string(),
//!     card_type: "Visa".to_string(),
//!     default: true,
//! })?;
//!
//! let mut subscription = Subscription::new(
//!     Fields::new()
//!         .with(Attribute::PlanId, "gold")
//!         .with(Attribute::PaymentMethodToken, "card"),
//! );
//! assert!(subscription.save(&gateway)?);
//! assert!(subscription.is_persisted());
//! assert_eq!(subscription.price().as_deref(), Some("25.00"));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod associations;
pub mod attributes;
pub mod config;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod subscription;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use associations::{Association, ReadOnlyCollection};
pub use attributes::{Attribute, AttributeSource, AttributeValue, Fields, Numericality};
pub use config::{Environment, GatewayConfig};
pub use error::{Error, Result};
pub use gateway::{Endpoint, Gateway, Method};
pub use memory::MemoryGateway;
pub use subscription::{RecordState, Subscription};
pub use types::{
    CreditCard, DurationUnit, Modification, Plan, RemoteSubscription, RemoteValidationError,
    SubscriptionParams, SubscriptionStatus, Transaction, TransactionKind,
};
pub use validation::{validate, Context, Errors};
