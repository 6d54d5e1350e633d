//! Validation rules for subscription records
//!
//! [`validate`] is a pure function: it reads a record's attributes and
//! returns every failing rule as a message keyed by field name. Each rule is
//! a small function of its own; the record is valid iff no rule adds a
//! message.

use crate::attributes::{Attribute, AttributeValue, Fields, Numericality};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

static ID_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("id pattern compiles"));

/// Smallest accepted trial length
pub const MIN_TRIAL_DURATION: i64 = 1;

/// Largest accepted trial length
pub const MAX_TRIAL_DURATION: i64 = 9999;

/// Accepted trial duration units
pub const TRIAL_DURATION_UNITS: [&str; 2] = ["day", "month"];

pub const BLANK: &str = "can't be blank";
pub const INVALID: &str = "is invalid";
pub const NOT_A_NUMBER: &str = "is not a number";
pub const NOT_AN_INTEGER: &str = "must be an integer";
pub const NOT_INCLUDED: &str = "is not included in the list";
pub const IN_THE_PAST: &str = "cannot be in the past";

/// Whether a day of month can be billed on
///
/// Days 29 and 30 do not occur every month; 31 stands for "last day".
#[must_use]
pub const fn is_billing_day(day: i64) -> bool {
    matches!(day, 1..=28 | 31)
}

/// Whether an identifier has the gateway's accepted format
#[must_use]
pub fn is_valid_id(id: &str) -> bool {
    ID_FORMAT.is_match(id)
}

/// Error messages keyed by field name
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Errors {
    messages: BTreeMap<String, Vec<String>>,
}

impl Errors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.messages
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Messages recorded for a field; empty when the field is fine
    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.messages.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Messages recorded for an attribute
    #[must_use]
    pub fn on(&self, attribute: Attribute) -> &[String] {
        self.get(attribute.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.values().all(Vec::is_empty)
    }

    /// Number of messages across all fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.values().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.messages.iter().flat_map(|(field, messages)| {
            messages
                .iter()
                .map(move |message| (field.as_str(), message.as_str()))
        })
    }

    /// Messages prefixed with the humanized field name, e.g. "Price is not a number"
    #[must_use]
    pub fn full_messages(&self) -> Vec<String> {
        self.iter()
            .map(|(field, message)| {
                if field == "base" {
                    message.to_string()
                } else {
                    format!("{} {message}", humanize(field))
                }
            })
            .collect()
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_messages().join(", "))
    }
}

/// `plan_id` -> `Plan`, `billing_day_of_month` -> `Billing day of month`
fn humanize(field: &str) -> String {
    let trimmed = field
        .strip_suffix("_id")
        .filter(|rest| !rest.is_empty())
        .unwrap_or(field);
    let spaced = trimmed.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Inputs a rule may look at besides the attributes
#[derive(Clone, Copy, Debug)]
pub struct Context {
    /// Record has not been stored remotely yet
    pub new_record: bool,
    /// Calendar date "today" is evaluated against
    pub today: NaiveDate,
}

type Rule = fn(&Fields, &Context, &mut Errors);

const RULES: &[Rule] = &[
    validate_id,
    validate_billing_day_of_month,
    validate_number_of_billing_cycles,
    validate_payment_method_token,
    validate_plan_id,
    validate_price,
    validate_trial_duration,
    validate_trial_duration_unit,
    validate_first_billing_date,
];

/// Run every rule against the attributes
#[must_use]
pub fn validate(fields: &Fields, context: &Context) -> Errors {
    let mut errors = Errors::default();
    for rule in RULES {
        rule(fields, context, &mut errors);
    }
    errors
}

fn integer_or_message(value: &AttributeValue) -> Result<i64, &'static str> {
    match value.numericality() {
        Numericality::Integer(i) => Ok(i),
        Numericality::Decimal(_) => Err(NOT_AN_INTEGER),
        Numericality::NotANumber => Err(NOT_A_NUMBER),
    }
}

fn trial_period(fields: &Fields) -> bool {
    fields
        .get(Attribute::TrialPeriod)
        .is_some_and(AttributeValue::to_bool)
}

fn validate_id(fields: &Fields, _: &Context, errors: &mut Errors) {
    let Some(value) = fields.present(Attribute::Id) else {
        return;
    };
    if !is_valid_id(&value.to_string()) {
        errors.add(Attribute::Id.as_str(), INVALID);
    }
}

fn validate_billing_day_of_month(fields: &Fields, _: &Context, errors: &mut Errors) {
    let Some(value) = fields.get(Attribute::BillingDayOfMonth) else {
        return;
    };
    match integer_or_message(value) {
        Ok(day) if is_billing_day(day) => {}
        Ok(_) => errors.add(Attribute::BillingDayOfMonth.as_str(), NOT_INCLUDED),
        Err(message) => errors.add(Attribute::BillingDayOfMonth.as_str(), message),
    }
}

fn validate_number_of_billing_cycles(fields: &Fields, _: &Context, errors: &mut Errors) {
    let field = Attribute::NumberOfBillingCycles.as_str();
    let Some(value) = fields.get(Attribute::NumberOfBillingCycles) else {
        return;
    };
    let cycles = match integer_or_message(value) {
        Ok(cycles) => cycles,
        Err(message) => return errors.add(field, message),
    };
    if cycles < 1 {
        return errors.add(field, "must be greater than 0");
    }
    if u32::try_from(cycles).is_err() {
        return errors.add(field, format!("must be less than or equal to {}", u32::MAX));
    }
    let current = fields
        .get(Attribute::CurrentBillingCycle)
        .and_then(AttributeValue::to_integer);
    if let Some(current) = current {
        if cycles <= current {
            errors.add(field, format!("must be greater than {current}"));
        }
    }
}

fn validate_payment_method_token(fields: &Fields, context: &Context, errors: &mut Errors) {
    if context.new_record && fields.present(Attribute::PaymentMethodToken).is_none() {
        errors.add(Attribute::PaymentMethodToken.as_str(), BLANK);
    }
}

fn validate_plan_id(fields: &Fields, context: &Context, errors: &mut Errors) {
    if context.new_record && fields.present(Attribute::PlanId).is_none() {
        errors.add(Attribute::PlanId.as_str(), BLANK);
    }
}

fn validate_price(fields: &Fields, _: &Context, errors: &mut Errors) {
    if let Some(value) = fields.get(Attribute::Price) {
        if value.numericality() == Numericality::NotANumber {
            errors.add(Attribute::Price.as_str(), NOT_A_NUMBER);
        }
    }
}

fn validate_trial_duration(fields: &Fields, _: &Context, errors: &mut Errors) {
    if !trial_period(fields) {
        return;
    }
    let field = Attribute::TrialDuration.as_str();
    let Some(value) = fields.present(Attribute::TrialDuration) else {
        return errors.add(field, BLANK);
    };
    match integer_or_message(value) {
        Ok(duration) if duration < MIN_TRIAL_DURATION => errors.add(
            field,
            format!("must be greater than or equal to {MIN_TRIAL_DURATION}"),
        ),
        Ok(duration) if duration > MAX_TRIAL_DURATION => errors.add(
            field,
            format!("must be less than or equal to {MAX_TRIAL_DURATION}"),
        ),
        Ok(_) => {}
        Err(message) => errors.add(field, message),
    }
}

fn validate_trial_duration_unit(fields: &Fields, _: &Context, errors: &mut Errors) {
    if !trial_period(fields) {
        return;
    }
    let field = Attribute::TrialDurationUnit.as_str();
    let Some(value) = fields.present(Attribute::TrialDurationUnit) else {
        return errors.add(field, BLANK);
    };
    if !value
        .as_text()
        .is_some_and(|unit| TRIAL_DURATION_UNITS.contains(&unit))
    {
        errors.add(field, NOT_INCLUDED);
    }
}

// Persisted records report historic first billing dates and the update call
// does not send the field, so only records about to be created are checked.
fn validate_first_billing_date(fields: &Fields, context: &Context, errors: &mut Errors) {
    if !context.new_record {
        return;
    }
    let field = Attribute::FirstBillingDate.as_str();
    let Some(value) = fields.get(Attribute::FirstBillingDate) else {
        return;
    };
    match value.to_date() {
        Some(date) if date < context.today => errors.add(field, IN_THE_PAST),
        Some(_) => {}
        None => errors.add(field, INVALID),
    }
}
