//! Gateway-side record types and request parameters

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription status as reported by the gateway
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Canceled,
    Expired,
    #[serde(rename = "Past Due")]
    PastDue,
    Pending,
}

impl SubscriptionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Canceled => "Canceled",
            Self::Expired => "Expired",
            Self::PastDue => "Past Due",
            Self::Pending => "Pending",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Canceled" => Ok(Self::Canceled),
            "Expired" => Ok(Self::Expired),
            "Past Due" => Ok(Self::PastDue),
            "Pending" => Ok(Self::Pending),
            other => Err(format!("Unknown subscription status: {other}")),
        }
    }
}

/// Unit of a trial duration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Day,
    Month,
}

impl DurationUnit {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Month => "month",
        }
    }
}

impl FromStr for DurationUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Self::Day),
            "month" => Ok(Self::Month),
            other => Err(format!("Unknown trial duration unit: {other}")),
        }
    }
}

/// Add-on or discount attached to a plan or subscription
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modification {
    /// Modification identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Amount as a decimal string
    pub amount: String,
    /// How many times the modification applies per billing cycle
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Cycles the modification applies for; absent when it never expires
    #[serde(default)]
    pub number_of_billing_cycles: Option<u32>,
    /// Whether the modification applies indefinitely
    #[serde(default)]
    pub never_expires: bool,
}

const fn default_quantity() -> u32 {
    1
}

/// Kind of a gateway transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Sale,
    Credit,
}

/// Transaction charged for a subscription billing cycle
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction identifier
    pub id: String,
    /// Amount as a decimal string
    pub amount: String,
    /// Gateway status, e.g. `submitted_for_settlement`
    pub status: String,
    /// Sale or credit
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Billing plan a subscription is created from
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Plan identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Price as a decimal string
    pub price: String,
    /// Billing frequency in months
    pub billing_frequency: u32,
    /// Default billing cycle count; absent when subscriptions never expire
    #[serde(default)]
    pub number_of_billing_cycles: Option<u32>,
    /// Default day of month the plan bills on
    #[serde(default)]
    pub billing_day_of_month: Option<u32>,
    /// Whether subscriptions start with a trial
    #[serde(default)]
    pub trial_period: bool,
    /// Default trial length
    #[serde(default)]
    pub trial_duration: Option<u32>,
    /// Default trial length unit
    #[serde(default)]
    pub trial_duration_unit: Option<DurationUnit>,
    /// Add-ons inherited by new subscriptions
    #[serde(default)]
    pub add_ons: Vec<Modification>,
    /// Discounts inherited by new subscriptions
    #[serde(default)]
    pub discounts: Vec<Modification>,
}

/// Vaulted credit card a subscription charges
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCard {
    /// Payment method token
    pub token: String,
    /// Name printed on the card
    #[serde(default)]
    pub cardholder_name: Option<String>,
    /// First six digits
    pub bin: String,
    /// Last four digits
    pub last_4: String,
    /// Two-digit expiration month
    pub expiration_month: String,
    /// Four-digit expiration year
    pub expiration_year: String,
    /// Card brand, e.g. `Visa`
    pub card_type: String,
    /// Whether this is the customer's default payment method
    #[serde(default)]
    pub default: bool,
}

/// Subscription object as returned by the gateway
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSubscription {
    pub id: String,
    pub plan_id: String,
    pub payment_method_token: String,
    #[serde(default)]
    pub merchant_account_id: Option<String>,
    /// Price as a decimal string
    pub price: String,
    /// Outstanding balance as a decimal string
    #[serde(default)]
    pub balance: Option<String>,
    #[serde(default)]
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub billing_day_of_month: Option<u32>,
    #[serde(default)]
    pub number_of_billing_cycles: Option<u32>,
    #[serde(default)]
    pub current_billing_cycle: Option<u32>,
    #[serde(default)]
    pub days_past_due: Option<u32>,
    #[serde(default)]
    pub failure_count: u32,
    #[serde(default)]
    pub trial_period: bool,
    #[serde(default)]
    pub trial_duration: Option<u32>,
    #[serde(default)]
    pub trial_duration_unit: Option<DurationUnit>,
    #[serde(default)]
    pub first_billing_date: Option<NaiveDate>,
    #[serde(default)]
    pub next_billing_date: Option<NaiveDate>,
    #[serde(default)]
    pub billing_period_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub billing_period_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub paid_through_date: Option<NaiveDate>,
    #[serde(default)]
    pub next_bill_amount: Option<String>,
    #[serde(default)]
    pub never_expires: bool,
    #[serde(default)]
    pub add_ons: Vec<Modification>,
    #[serde(default)]
    pub discounts: Vec<Modification>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// Attributes sent to the gateway on create or update
///
/// Absent fields are left out of the request body entirely.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_day_of_month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_billing_cycles: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub never_expires: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_period: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_duration_unit: Option<DurationUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_billing_date: Option<NaiveDate>,
}

/// Single validation error reported by the gateway
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteValidationError {
    /// Attribute the error refers to, `base` for record-level errors
    pub attribute: String,
    /// Gateway error code
    pub code: String,
    /// Human readable message
    pub message: String,
}
