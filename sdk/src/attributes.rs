//! Attribute extraction and coercion
//!
//! A [`Subscription`](crate::Subscription) keeps the values it was given in
//! their original shape ([`AttributeValue`]) so that they read back exactly
//! as supplied. Coercion into numbers, dates and booleans happens on demand,
//! during validation and when gateway parameters are built.
//!
//! Input of any shape is normalized through the [`AttributeSource`] trait:
//! field mappings, gateway records and JSON documents all implement it.

use crate::types::RemoteSubscription;
use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

static INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("integer pattern compiles"));

static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+(\.\d+)?$").expect("decimal pattern compiles"));

/// Date formats accepted for textual dates, tried in order
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %b %Y", "%B %d, %Y"];

/// Known subscription attributes
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attribute {
    Id,
    PlanId,
    PaymentMethodToken,
    MerchantAccountId,
    Price,
    Balance,
    Status,
    BillingDayOfMonth,
    NumberOfBillingCycles,
    CurrentBillingCycle,
    DaysPastDue,
    FailureCount,
    TrialPeriod,
    TrialDuration,
    TrialDurationUnit,
    FirstBillingDate,
    NextBillingDate,
    BillingPeriodStartDate,
    BillingPeriodEndDate,
    PaidThroughDate,
    NextBillAmount,
    NeverExpires,
}

impl Attribute {
    /// Every known attribute, in declaration order
    pub const ALL: [Self; 22] = [
        Self::Id,
        Self::PlanId,
        Self::PaymentMethodToken,
        Self::MerchantAccountId,
        Self::Price,
        Self::Balance,
        Self::Status,
        Self::BillingDayOfMonth,
        Self::NumberOfBillingCycles,
        Self::CurrentBillingCycle,
        Self::DaysPastDue,
        Self::FailureCount,
        Self::TrialPeriod,
        Self::TrialDuration,
        Self::TrialDurationUnit,
        Self::FirstBillingDate,
        Self::NextBillingDate,
        Self::BillingPeriodStartDate,
        Self::BillingPeriodEndDate,
        Self::PaidThroughDate,
        Self::NextBillAmount,
        Self::NeverExpires,
    ];

    /// Attributes the gateway accepts when creating a subscription
    pub const CREATE: [Self; 12] = [
        Self::Id,
        Self::PlanId,
        Self::PaymentMethodToken,
        Self::MerchantAccountId,
        Self::Price,
        Self::BillingDayOfMonth,
        Self::NumberOfBillingCycles,
        Self::NeverExpires,
        Self::TrialPeriod,
        Self::TrialDuration,
        Self::TrialDurationUnit,
        Self::FirstBillingDate,
    ];

    /// Attributes the gateway accepts when updating a subscription
    pub const UPDATE: [Self; 7] = [
        Self::Id,
        Self::PlanId,
        Self::PaymentMethodToken,
        Self::MerchantAccountId,
        Self::Price,
        Self::NumberOfBillingCycles,
        Self::NeverExpires,
    ];

    /// Snake-case field name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::PlanId => "plan_id",
            Self::PaymentMethodToken => "payment_method_token",
            Self::MerchantAccountId => "merchant_account_id",
            Self::Price => "price",
            Self::Balance => "balance",
            Self::Status => "status",
            Self::BillingDayOfMonth => "billing_day_of_month",
            Self::NumberOfBillingCycles => "number_of_billing_cycles",
            Self::CurrentBillingCycle => "current_billing_cycle",
            Self::DaysPastDue => "days_past_due",
            Self::FailureCount => "failure_count",
            Self::TrialPeriod => "trial_period",
            Self::TrialDuration => "trial_duration",
            Self::TrialDurationUnit => "trial_duration_unit",
            Self::FirstBillingDate => "first_billing_date",
            Self::NextBillingDate => "next_billing_date",
            Self::BillingPeriodStartDate => "billing_period_start_date",
            Self::BillingPeriodEndDate => "billing_period_end_date",
            Self::PaidThroughDate => "paid_through_date",
            Self::NextBillAmount => "next_bill_amount",
            Self::NeverExpires => "never_expires",
        }
    }
}

impl FromStr for Attribute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|attribute| attribute.as_str() == s)
            .ok_or_else(|| format!("Unknown subscription attribute: {s}"))
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single attribute value in the shape it was supplied
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Bool(bool),
    Date(NaiveDate),
}

/// Outcome of reading a value as a number
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Numericality {
    /// Whole number
    Integer(i64),
    /// Number with a fractional part (or written as a decimal)
    Decimal(f64),
    /// Not a number at all
    NotANumber,
}

impl AttributeValue {
    /// Convert a JSON value; `null`, arrays and objects have no attribute form
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Decimal)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Text that is empty or whitespace only
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.as_text().is_some_and(|s| s.trim().is_empty())
    }

    #[must_use]
    pub fn numericality(&self) -> Numericality {
        match self {
            Self::Integer(i) => Numericality::Integer(*i),
            Self::Decimal(d) if d.is_finite() => Numericality::Decimal(*d),
            Self::Text(s) => {
                let s = s.trim();
                if INTEGER.is_match(s) {
                    s.parse()
                        .map_or(Numericality::NotANumber, Numericality::Integer)
                } else if DECIMAL.is_match(s) {
                    s.parse()
                        .map_or(Numericality::NotANumber, Numericality::Decimal)
                } else {
                    Numericality::NotANumber
                }
            }
            Self::Decimal(_) | Self::Bool(_) | Self::Date(_) => Numericality::NotANumber,
        }
    }

    /// Whole-number reading of the value
    #[must_use]
    pub fn to_integer(&self) -> Option<i64> {
        match self.numericality() {
            Numericality::Integer(i) => Some(i),
            Numericality::Decimal(_) | Numericality::NotANumber => None,
        }
    }

    /// Whole-number reading that fits the gateway's unsigned fields
    #[must_use]
    pub fn to_u32(&self) -> Option<u32> {
        self.to_integer().and_then(|i| u32::try_from(i).ok())
    }

    /// Decimal string suitable for amount fields
    #[must_use]
    pub fn to_decimal_string(&self) -> Option<String> {
        match (self, self.numericality()) {
            (_, Numericality::NotANumber) => None,
            (Self::Text(s), _) => Some(s.trim().to_string()),
            (_, Numericality::Integer(i)) => Some(i.to_string()),
            (_, Numericality::Decimal(d)) => Some(d.to_string()),
        }
    }

    /// Truthiness of the value
    ///
    /// Text is true only for `true`, `t`, `1`, `yes` or `on`, case-insensitive.
    #[must_use]
    pub fn to_bool(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Integer(i) => *i != 0,
            Self::Text(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "t" | "1" | "yes" | "on"
            ),
            Self::Decimal(_) | Self::Date(_) => false,
        }
    }

    /// Calendar date reading of the value
    #[must_use]
    pub fn to_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(*date),
            Self::Text(s) => parse_date(s.trim()),
            Self::Integer(_) | Self::Decimal(_) | Self::Bool(_) => None,
        }
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|datetime| datetime.date_naive())
        })
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Date(date) => write!(f, "{date}"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<NaiveDate> for AttributeValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

/// Anything a subscription's attributes can be read from
pub trait AttributeSource {
    /// Value of a known attribute, if the source has one
    fn attribute(&self, attribute: Attribute) -> Option<AttributeValue>;

    /// Whether the source represents a record stored remotely.
    ///
    /// `None` when the source cannot tell; extraction treats that as new.
    fn persisted(&self) -> Option<bool> {
        None
    }
}

/// Mapping of known attributes to their values
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fields {
    values: BTreeMap<Attribute, AttributeValue>,
}

impl Fields {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from name/value pairs; names that are not known attributes are dropped
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttributeValue>,
    {
        pairs
            .into_iter()
            .filter_map(|(name, value)| {
                let attribute = name.as_ref().parse::<Attribute>().ok()?;
                Some((attribute, value.into()))
            })
            .collect()
    }

    /// Copy every known attribute the source provides
    pub fn extract<S: AttributeSource + ?Sized>(source: &S) -> Self {
        Attribute::ALL
            .into_iter()
            .filter_map(|attribute| source.attribute(attribute).map(|value| (attribute, value)))
            .collect()
    }

    #[must_use]
    pub fn with(mut self, attribute: Attribute, value: impl Into<AttributeValue>) -> Self {
        self.values.insert(attribute, value.into());
        self
    }

    pub fn insert(
        &mut self,
        attribute: Attribute,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        self.values.insert(attribute, value.into())
    }

    pub fn remove(&mut self, attribute: Attribute) -> Option<AttributeValue> {
        self.values.remove(&attribute)
    }

    #[must_use]
    pub fn get(&self, attribute: Attribute) -> Option<&AttributeValue> {
        self.values.get(&attribute)
    }

    /// Value of the attribute unless it is absent or blank text
    #[must_use]
    pub fn present(&self, attribute: Attribute) -> Option<&AttributeValue> {
        self.get(attribute).filter(|value| !value.is_blank())
    }

    #[must_use]
    pub fn contains(&self, attribute: Attribute) -> bool {
        self.values.contains_key(&attribute)
    }

    /// Overwrite this mapping's entries with every entry of `other`
    pub fn merge(&mut self, other: Self) {
        self.values.extend(other.values);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attribute, &AttributeValue)> {
        self.values.iter().map(|(attribute, value)| (*attribute, value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(Attribute, AttributeValue)> for Fields {
    fn from_iter<T: IntoIterator<Item = (Attribute, AttributeValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl AttributeSource for Fields {
    fn attribute(&self, attribute: Attribute) -> Option<AttributeValue> {
        self.get(attribute).cloned()
    }
}

/// JSON objects are read key by key; a boolean `persisted` key reports the
/// record state. Any other JSON shape yields no attributes.
impl AttributeSource for Value {
    fn attribute(&self, attribute: Attribute) -> Option<AttributeValue> {
        self.get(attribute.as_str()).and_then(AttributeValue::from_json)
    }

    fn persisted(&self) -> Option<bool> {
        self.get("persisted").and_then(Value::as_bool)
    }
}

impl AttributeSource for RemoteSubscription {
    fn attribute(&self, attribute: Attribute) -> Option<AttributeValue> {
        match attribute {
            Attribute::Id => Some(self.id.clone().into()),
            Attribute::PlanId => Some(self.plan_id.clone().into()),
            Attribute::PaymentMethodToken => Some(self.payment_method_token.clone().into()),
            Attribute::MerchantAccountId => self.merchant_account_id.clone().map(Into::into),
            Attribute::Price => Some(self.price.clone().into()),
            Attribute::Balance => self.balance.clone().map(Into::into),
            Attribute::Status => Some(self.status.as_str().into()),
            Attribute::BillingDayOfMonth => self.billing_day_of_month.map(Into::into),
            Attribute::NumberOfBillingCycles => self.number_of_billing_cycles.map(Into::into),
            Attribute::CurrentBillingCycle => self.current_billing_cycle.map(Into::into),
            Attribute::DaysPastDue => self.days_past_due.map(Into::into),
            Attribute::FailureCount => Some(self.failure_count.into()),
            Attribute::TrialPeriod => Some(self.trial_period.into()),
            Attribute::TrialDuration => self.trial_duration.map(Into::into),
            Attribute::TrialDurationUnit => self.trial_duration_unit.map(|u| u.as_str().into()),
            Attribute::FirstBillingDate => self.first_billing_date.map(Into::into),
            Attribute::NextBillingDate => self.next_billing_date.map(Into::into),
            Attribute::BillingPeriodStartDate => self.billing_period_start_date.map(Into::into),
            Attribute::BillingPeriodEndDate => self.billing_period_end_date.map(Into::into),
            Attribute::PaidThroughDate => self.paid_through_date.map(Into::into),
            Attribute::NextBillAmount => self.next_bill_amount.clone().map(Into::into),
            Attribute::NeverExpires => Some(self.never_expires.into()),
        }
    }

    fn persisted(&self) -> Option<bool> {
        Some(true)
    }
}
