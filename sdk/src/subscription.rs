//! Subscription record
//!
//! [`Subscription`] wraps a gateway subscription with local validation,
//! create/update/cancel persistence and lazily loaded associations.
//!
//! # Example
//!
//! ```rust
//! use subscription_gateway::{Attribute, Fields, MemoryGateway, Subscription};
//!
//! # fn main() -> subscription_gateway::Result<()> {
//! let gateway = MemoryGateway::default();
//! let mut subscription = Subscription::new(
//!     Fields::new()
//!         .with(Attribute::Price, "10.00")
//!         .with(Attribute::BillingDayOfMonth, 30),
//! );
//!
//! // Invalid records never reach the gateway.
//! assert!(!subscription.save(&gateway)?);
//! assert!(!subscription.errors().on(Attribute::PlanId).is_empty());
//! assert!(gateway.requests()?.is_empty());
//! # Ok(())
//! # }
//! ```

use crate::{
    associations::{Association, ReadOnlyCollection},
    attributes::{Attribute, AttributeSource, AttributeValue, Fields},
    error::{Error, Result},
    gateway::Gateway,
    types::{
        CreditCard, DurationUnit, Modification, Plan, RemoteSubscription, SubscriptionParams,
        SubscriptionStatus, Transaction,
    },
    validation::{validate, Context, Errors},
};
use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

/// Where a record stands relative to the remote store
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordState {
    /// Built locally, not stored remotely yet
    New,
    /// Known to exist remotely
    Persisted,
    /// Canceled remotely; no further persistence is possible
    Canceled,
}

/// Subscription record backed by a payment gateway
#[derive(Clone, Debug)]
pub struct Subscription {
    attributes: Fields,
    state: RecordState,
    errors: Errors,
    remote: Option<RemoteSubscription>,
    plan: Association<Plan>,
    credit_card: Association<CreditCard>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl Subscription {
    /// New, unsaved record from a field mapping
    #[must_use]
    pub fn new(attributes: Fields) -> Self {
        Self::with_state(attributes, RecordState::New)
    }

    fn with_state(attributes: Fields, state: RecordState) -> Self {
        Self {
            attributes,
            state,
            errors: Errors::default(),
            remote: None,
            plan: Association::new(),
            credit_card: Association::new(),
        }
    }

    /// Look a subscription up by id
    pub fn find<G: Gateway + ?Sized>(gateway: &G, id: &str) -> Result<Self> {
        debug!(
            service = "subscription-gateway",
            component = "subscription",
            event = "find",
            id = %id,
            "Fetching subscription"
        );
        gateway.find_subscription(id).map(Self::from_remote)
    }

    /// Wrap a subscription object returned by the gateway
    #[must_use]
    pub fn from_remote(remote: RemoteSubscription) -> Self {
        let mut subscription = Self::with_state(Fields::new(), RecordState::Persisted);
        subscription.rehydrate(remote);
        subscription
    }

    /// Copy known attributes from any source
    ///
    /// The record counts as persisted only when the source says so.
    pub fn extract<S: AttributeSource + ?Sized>(source: &S) -> Self {
        let state = if source.persisted().unwrap_or(false) {
            RecordState::Persisted
        } else {
            RecordState::New
        };
        Self::with_state(Fields::extract(source), state)
    }

    /// Cancel a subscription by id without loading it first
    pub fn cancel_by_id<G: Gateway + ?Sized>(gateway: &G, id: &str) -> Result<()> {
        let canceled = gateway.cancel_subscription(id)?;
        info!(
            service = "subscription-gateway",
            component = "subscription",
            event = "canceled",
            id = %canceled.id,
            "Subscription canceled"
        );
        Ok(())
    }

    /// Same as [`Subscription::cancel_by_id`]; the gateway has no hard delete
    pub fn delete_by_id<G: Gateway + ?Sized>(gateway: &G, id: &str) -> Result<()> {
        Self::cancel_by_id(gateway, id)
    }

    #[must_use]
    pub const fn state(&self) -> RecordState {
        self.state
    }

    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.state == RecordState::Persisted
    }

    #[must_use]
    pub fn is_new_record(&self) -> bool {
        self.state == RecordState::New
    }

    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.state == RecordState::Canceled
    }

    #[must_use]
    pub const fn attributes(&self) -> &Fields {
        &self.attributes
    }

    /// Value exactly as supplied or as returned by the gateway
    #[must_use]
    pub fn get(&self, attribute: Attribute) -> Option<&AttributeValue> {
        self.attributes.get(attribute)
    }

    fn text(&self, attribute: Attribute) -> Option<&str> {
        self.attributes
            .present(attribute)
            .and_then(AttributeValue::as_text)
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.text(Attribute::Id)
    }

    #[must_use]
    pub fn plan_id(&self) -> Option<&str> {
        self.text(Attribute::PlanId)
    }

    #[must_use]
    pub fn payment_method_token(&self) -> Option<&str> {
        self.text(Attribute::PaymentMethodToken)
    }

    #[must_use]
    pub fn merchant_account_id(&self) -> Option<&str> {
        self.text(Attribute::MerchantAccountId)
    }

    /// Price as supplied; requests carry its trimmed decimal form
    #[must_use]
    pub fn price(&self) -> Option<String> {
        self.get(Attribute::Price).map(ToString::to_string)
    }

    #[must_use]
    pub fn status(&self) -> Option<SubscriptionStatus> {
        self.text(Attribute::Status).and_then(|s| s.parse().ok())
    }

    #[must_use]
    pub fn billing_day_of_month(&self) -> Option<u32> {
        self.get(Attribute::BillingDayOfMonth)
            .and_then(AttributeValue::to_u32)
    }

    #[must_use]
    pub fn number_of_billing_cycles(&self) -> Option<u32> {
        self.get(Attribute::NumberOfBillingCycles)
            .and_then(AttributeValue::to_u32)
    }

    #[must_use]
    pub fn current_billing_cycle(&self) -> Option<u32> {
        self.get(Attribute::CurrentBillingCycle)
            .and_then(AttributeValue::to_u32)
    }

    #[must_use]
    pub fn trial_period(&self) -> bool {
        self.get(Attribute::TrialPeriod)
            .is_some_and(AttributeValue::to_bool)
    }

    #[must_use]
    pub fn trial_duration(&self) -> Option<u32> {
        self.get(Attribute::TrialDuration)
            .and_then(AttributeValue::to_u32)
    }

    #[must_use]
    pub fn trial_duration_unit(&self) -> Option<DurationUnit> {
        self.text(Attribute::TrialDurationUnit)
            .and_then(|unit| unit.parse().ok())
    }

    #[must_use]
    pub fn first_billing_date(&self) -> Option<NaiveDate> {
        self.get(Attribute::FirstBillingDate)
            .and_then(AttributeValue::to_date)
    }

    #[must_use]
    pub fn next_billing_date(&self) -> Option<NaiveDate> {
        self.get(Attribute::NextBillingDate)
            .and_then(AttributeValue::to_date)
    }

    /// Whether billing continues indefinitely
    ///
    /// False as soon as a billing cycle count is set; otherwise the gateway's
    /// flag when known, and true for records without one.
    #[must_use]
    pub fn never_expires(&self) -> bool {
        self.get(Attribute::NumberOfBillingCycles).is_none()
            && self
                .get(Attribute::NeverExpires)
                .map_or(true, AttributeValue::to_bool)
    }

    /// Set one attribute; changing a foreign key drops the cached association
    pub fn set(&mut self, attribute: Attribute, value: impl Into<AttributeValue>) {
        match attribute {
            Attribute::PlanId => self.plan.reset(),
            Attribute::PaymentMethodToken => self.credit_card.reset(),
            _ => {}
        }
        self.attributes.insert(attribute, value);
    }

    pub fn assign_attributes(&mut self, fields: Fields) {
        for (attribute, value) in fields.iter() {
            self.set(attribute, value.clone());
        }
    }

    /// Messages from the last validation or save
    #[must_use]
    pub const fn errors(&self) -> &Errors {
        &self.errors
    }

    /// Run validation, replacing the error mapping
    pub fn is_valid(&mut self) -> bool {
        let context = Context {
            new_record: self.is_new_record(),
            today: today(),
        };
        self.errors = validate(&self.attributes, &context);
        self.errors.is_empty()
    }

    /// Create or update remotely
    ///
    /// Returns `Ok(false)` when the record is invalid, locally or according
    /// to the gateway; the reasons are in [`Subscription::errors`]. Invalid
    /// records are never sent.
    pub fn save<G: Gateway + ?Sized>(&mut self, gateway: &G) -> Result<bool> {
        self.ensure_not_canceled()?;
        if !self.is_valid() {
            warn!(
                service = "subscription-gateway",
                component = "subscription",
                event = "validation_failed",
                errors = %self.errors,
                "Subscription not saved"
            );
            return Ok(false);
        }

        let result = if self.is_new_record() {
            gateway.create_subscription(&self.create_params())
        } else {
            let id = self.persisted_id()?;
            gateway.update_subscription(&id, &self.update_params())
        };

        match result {
            Ok(remote) => {
                info!(
                    service = "subscription-gateway",
                    component = "subscription",
                    event = if self.is_new_record() { "created" } else { "updated" },
                    id = %remote.id,
                    "Subscription saved"
                );
                self.rehydrate(remote);
                Ok(true)
            }
            Err(Error::RemoteValidation(remote_errors)) => {
                for error in remote_errors {
                    self.errors.add(error.attribute, error.message);
                }
                warn!(
                    service = "subscription-gateway",
                    component = "subscription",
                    event = "remote_validation_failed",
                    errors = %self.errors,
                    "Gateway rejected subscription"
                );
                Ok(false)
            }
            Err(other) => Err(other),
        }
    }

    /// Like [`Subscription::save`], but an invalid record is an error
    pub fn save_strict<G: Gateway + ?Sized>(&mut self, gateway: &G) -> Result<()> {
        if self.save(gateway)? {
            Ok(())
        } else {
            Err(Error::RecordInvalid(self.errors.clone()))
        }
    }

    /// Assign the fields, then [`save`](Subscription::save)
    pub fn update_attributes<G: Gateway + ?Sized>(
        &mut self,
        gateway: &G,
        fields: Fields,
    ) -> Result<bool> {
        self.assign_attributes(fields);
        self.save(gateway)
    }

    /// Assign the fields, then [`save_strict`](Subscription::save_strict)
    pub fn update_attributes_strict<G: Gateway + ?Sized>(
        &mut self,
        gateway: &G,
        fields: Fields,
    ) -> Result<()> {
        self.assign_attributes(fields);
        self.save_strict(gateway)
    }

    /// Cancel remotely; the record cannot be saved afterwards
    pub fn cancel<G: Gateway + ?Sized>(&mut self, gateway: &G) -> Result<()> {
        self.ensure_not_canceled()?;
        if self.is_new_record() {
            return Err(Error::InvalidState(
                "cannot cancel a subscription that was never saved".to_string(),
            ));
        }
        let id = self.persisted_id()?;
        let canceled = gateway.cancel_subscription(&id)?;
        info!(
            service = "subscription-gateway",
            component = "subscription",
            event = "canceled",
            id = %id,
            "Subscription canceled"
        );
        self.rehydrate(canceled);
        self.state = RecordState::Canceled;
        Ok(())
    }

    /// Same as [`Subscription::cancel`]
    pub fn destroy<G: Gateway + ?Sized>(&mut self, gateway: &G) -> Result<()> {
        self.cancel(gateway)
    }

    /// Replace local state with the gateway's current copy
    pub fn reload<G: Gateway + ?Sized>(&mut self, gateway: &G) -> Result<()> {
        if self.is_new_record() {
            return Err(Error::InvalidState(
                "cannot reload a subscription that was never saved".to_string(),
            ));
        }
        let id = self.persisted_id()?;
        let remote = gateway.find_subscription(&id)?;
        self.rehydrate(remote);
        Ok(())
    }

    /// Plan named by `plan_id`, fetched once
    pub fn plan<G: Gateway + ?Sized>(&mut self, gateway: &G) -> Result<Option<&Plan>> {
        let plan_id = self.plan_id().map(ToString::to_string);
        self.plan.get_or_load(|| {
            let Some(plan_id) = plan_id else {
                return Ok(None);
            };
            debug!(
                service = "subscription-gateway",
                component = "subscription",
                event = "load_plan",
                plan_id = %plan_id,
                "Loading plan"
            );
            Ok(gateway
                .list_plans()?
                .into_iter()
                .find(|plan| plan.id == plan_id))
        })
    }

    /// Credit card named by `payment_method_token`, fetched once
    pub fn credit_card<G: Gateway + ?Sized>(
        &mut self,
        gateway: &G,
    ) -> Result<Option<&CreditCard>> {
        let token = self.payment_method_token().map(ToString::to_string);
        self.credit_card.get_or_load(|| {
            let Some(token) = token else {
                return Ok(None);
            };
            debug!(
                service = "subscription-gateway",
                component = "subscription",
                event = "load_credit_card",
                "Loading credit card"
            );
            gateway.find_credit_card(&token).map(Some)
        })
    }

    #[must_use]
    pub fn add_ons(&self) -> ReadOnlyCollection<'_, Modification> {
        let items = self.remote.as_ref().map(|r| r.add_ons.as_slice());
        ReadOnlyCollection::new("add_ons", items.unwrap_or_default())
    }

    #[must_use]
    pub fn discounts(&self) -> ReadOnlyCollection<'_, Modification> {
        let items = self.remote.as_ref().map(|r| r.discounts.as_slice());
        ReadOnlyCollection::new("discounts", items.unwrap_or_default())
    }

    #[must_use]
    pub fn transactions(&self) -> ReadOnlyCollection<'_, Transaction> {
        let items = self.remote.as_ref().map(|r| r.transactions.as_slice());
        ReadOnlyCollection::new("transactions", items.unwrap_or_default())
    }

    /// Parameters a create call would send
    #[must_use]
    pub fn create_params(&self) -> SubscriptionParams {
        self.params_for(&Attribute::CREATE)
    }

    /// Parameters an update call would send
    #[must_use]
    pub fn update_params(&self) -> SubscriptionParams {
        self.params_for(&Attribute::UPDATE)
    }

    fn params_for(&self, allowed: &[Attribute]) -> SubscriptionParams {
        let mut params = SubscriptionParams::default();
        for &attribute in allowed {
            let Some(value) = self.attributes.present(attribute) else {
                continue;
            };
            match attribute {
                Attribute::Id => params.id = Some(value.to_string()),
                Attribute::PlanId => params.plan_id = Some(value.to_string()),
                Attribute::PaymentMethodToken => {
                    params.payment_method_token = Some(value.to_string());
                }
                Attribute::MerchantAccountId => {
                    params.merchant_account_id = Some(value.to_string());
                }
                Attribute::Price => params.price = value.to_decimal_string(),
                Attribute::BillingDayOfMonth => params.billing_day_of_month = value.to_u32(),
                Attribute::NumberOfBillingCycles => {
                    params.number_of_billing_cycles = value.to_u32();
                }
                Attribute::NeverExpires => params.never_expires = Some(value.to_bool()),
                Attribute::TrialPeriod => params.trial_period = Some(value.to_bool()),
                Attribute::TrialDuration => params.trial_duration = value.to_u32(),
                Attribute::TrialDurationUnit => {
                    params.trial_duration_unit = value.as_text().and_then(|u| u.parse().ok());
                }
                Attribute::FirstBillingDate => params.first_billing_date = value.to_date(),
                _ => {}
            }
        }
        // A cycle count contradicts a never-expiring flag carried over from the gateway.
        if params.number_of_billing_cycles.is_some() && params.never_expires.is_some() {
            params.never_expires = Some(false);
        }
        params
    }

    fn persisted_id(&self) -> Result<String> {
        self.remote
            .as_ref()
            .map(|remote| remote.id.clone())
            .or_else(|| self.id().map(ToString::to_string))
            .ok_or_else(|| Error::InvalidState("persisted subscription has no id".to_string()))
    }

    fn ensure_not_canceled(&self) -> Result<()> {
        if self.is_canceled() {
            return Err(Error::InvalidState(format!(
                "subscription {} has been canceled",
                self.id().unwrap_or_default()
            )));
        }
        Ok(())
    }

    fn rehydrate(&mut self, remote: RemoteSubscription) {
        self.attributes = Fields::extract(&remote);
        self.state = if remote.status == SubscriptionStatus::Canceled {
            RecordState::Canceled
        } else {
            RecordState::Persisted
        };
        self.remote = Some(remote);
        self.errors.clear();
        self.plan.reset();
        self.credit_card.reset();
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self::new(Fields::new())
    }
}

impl From<Fields> for Subscription {
    fn from(fields: Fields) -> Self {
        Self::new(fields)
    }
}

impl From<RemoteSubscription> for Subscription {
    fn from(remote: RemoteSubscription) -> Self {
        Self::from_remote(remote)
    }
}
