//! In-memory gateway
//!
//! [`MemoryGateway`] keeps subscriptions, plans and credit cards in process
//! and answers [`Gateway`] calls the way the remote service does, including
//! its validation errors. Every served call is recorded as an [`Endpoint`]
//! so callers can assert which requests were (or were not) issued. It can
//! also be told to fail the next call with a transport error.

use crate::{
    config::GatewayConfig,
    error::{Error, Result},
    gateway::{Endpoint, Gateway},
    types::{
        CreditCard, Plan, RemoteSubscription, RemoteValidationError, SubscriptionParams,
        SubscriptionStatus,
    },
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Default)]
struct Store {
    subscriptions: HashMap<String, RemoteSubscription>,
    plans: Vec<Plan>,
    credit_cards: HashMap<String, CreditCard>,
    requests: Vec<Endpoint>,
    next_id: u64,
    fail_next: bool,
}

impl Store {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id = self.next_id.saturating_add(1);
        format!("{prefix}{:06}", self.next_id)
    }
}

/// Gateway double backed by in-process maps
#[derive(Debug)]
pub struct MemoryGateway {
    config: GatewayConfig,
    store: Mutex<Store>,
}

impl MemoryGateway {
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            store: Mutex::new(Store::default()),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn store(&self) -> Result<MutexGuard<'_, Store>> {
        self.store
            .lock()
            .map_err(|_| Error::from("memory gateway store poisoned"))
    }

    /// Record an endpoint call and honor a pending failure
    fn serve(&self, endpoint: Endpoint) -> Result<MutexGuard<'_, Store>> {
        let mut store = self.store()?;
        debug!(
            service = "subscription-gateway",
            component = "memory_gateway",
            method = %endpoint.method(),
            url = %endpoint.url(&self.config),
            "Serving gateway request"
        );
        store.requests.push(endpoint);
        if store.fail_next {
            store.fail_next = false;
            return Err(Error::Remote("Mock configured to fail".to_string()));
        }
        Ok(store)
    }

    /// Seed a subscription as if it already existed remotely
    pub fn insert_subscription(&self, subscription: RemoteSubscription) -> Result<()> {
        self.store()?
            .subscriptions
            .insert(subscription.id.clone(), subscription);
        Ok(())
    }

    pub fn insert_plan(&self, plan: Plan) -> Result<()> {
        let mut store = self.store()?;
        store.plans.retain(|existing| existing.id != plan.id);
        store.plans.push(plan);
        Ok(())
    }

    pub fn insert_credit_card(&self, card: CreditCard) -> Result<()> {
        self.store()?.credit_cards.insert(card.token.clone(), card);
        Ok(())
    }

    /// Stored copy of a subscription, without recording a request
    pub fn subscription(&self, id: &str) -> Result<Option<RemoteSubscription>> {
        Ok(self.store()?.subscriptions.get(id).cloned())
    }

    pub fn subscription_count(&self) -> Result<usize> {
        Ok(self.store()?.subscriptions.len())
    }

    /// Endpoints served so far, oldest first
    pub fn requests(&self) -> Result<Vec<Endpoint>> {
        Ok(self.store()?.requests.clone())
    }

    /// Merchant-scoped paths of the endpoints served so far
    pub fn request_paths(&self) -> Result<Vec<String>> {
        Ok(self
            .store()?
            .requests
            .iter()
            .map(|endpoint| format!("{} {}", endpoint.method(), endpoint.merchant_path(&self.config)))
            .collect())
    }

    pub fn clear_requests(&self) -> Result<()> {
        self.store()?.requests.clear();
        Ok(())
    }

    /// Configures whether the next call should fail with a transport error
    pub fn set_fail_next(&self, fail: bool) -> Result<()> {
        self.store()?.fail_next = fail;
        Ok(())
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new(GatewayConfig::default())
    }
}

fn remote_error(attribute: &str, code: &str, message: &str) -> Error {
    Error::RemoteValidation(vec![RemoteValidationError {
        attribute: attribute.to_string(),
        code: code.to_string(),
        message: message.to_string(),
    }])
}

fn check_payment_method(store: &Store, token: &str) -> Result<()> {
    if store.credit_cards.contains_key(token) {
        Ok(())
    } else {
        Err(remote_error(
            "payment_method_token",
            "91903",
            "Payment method token is invalid.",
        ))
    }
}

fn find_plan<'a>(store: &'a Store, plan_id: &str) -> Result<&'a Plan> {
    store
        .plans
        .iter()
        .find(|plan| plan.id == plan_id)
        .ok_or_else(|| remote_error("plan_id", "91904", "Plan ID is invalid."))
}

impl Gateway for MemoryGateway {
    fn find_subscription(&self, id: &str) -> Result<RemoteSubscription> {
        let store = self.serve(Endpoint::FindSubscription { id: id.to_string() })?;
        store
            .subscriptions
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("subscription with id {id}")))
    }

    fn create_subscription(&self, params: &SubscriptionParams) -> Result<RemoteSubscription> {
        let mut store = self.serve(Endpoint::CreateSubscription)?;

        let plan_id = params.plan_id.as_deref().unwrap_or_default();
        let plan = find_plan(&store, plan_id)?.clone();
        let token = params.payment_method_token.as_deref().unwrap_or_default();
        check_payment_method(&store, token)?;

        let id = match &params.id {
            Some(id) if store.subscriptions.contains_key(id) => {
                return Err(remote_error("id", "81906", "ID has already been taken."));
            }
            Some(id) => id.clone(),
            None => store.next_id("sub_"),
        };

        let today = Utc::now().date_naive();
        let first_billing_date = params.first_billing_date.unwrap_or(today);
        let number_of_billing_cycles = params
            .number_of_billing_cycles
            .or(plan.number_of_billing_cycles);

        let subscription = RemoteSubscription {
            id: id.clone(),
            plan_id: plan.id,
            payment_method_token: token.to_string(),
            merchant_account_id: params.merchant_account_id.clone(),
            price: params.price.clone().unwrap_or(plan.price),
            status: if first_billing_date > today {
                SubscriptionStatus::Pending
            } else {
                SubscriptionStatus::Active
            },
            billing_day_of_month: params.billing_day_of_month.or(plan.billing_day_of_month),
            number_of_billing_cycles,
            trial_period: params.trial_period.unwrap_or(plan.trial_period),
            trial_duration: params.trial_duration.or(plan.trial_duration),
            trial_duration_unit: params.trial_duration_unit.or(plan.trial_duration_unit),
            first_billing_date: Some(first_billing_date),
            never_expires: params
                .never_expires
                .unwrap_or(number_of_billing_cycles.is_none()),
            add_ons: plan.add_ons,
            discounts: plan.discounts,
            ..RemoteSubscription::default()
        };

        store.subscriptions.insert(id, subscription.clone());
        Ok(subscription)
    }

    fn update_subscription(
        &self,
        id: &str,
        params: &SubscriptionParams,
    ) -> Result<RemoteSubscription> {
        let mut store = self.serve(Endpoint::UpdateSubscription { id: id.to_string() })?;

        let current = store
            .subscriptions
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("subscription with id {id}")))?;
        if current.status == SubscriptionStatus::Canceled {
            return Err(remote_error(
                "base",
                "81901",
                "Cannot edit a canceled subscription.",
            ));
        }
        if let Some(plan_id) = &params.plan_id {
            find_plan(&store, plan_id)?;
        }
        if let Some(token) = &params.payment_method_token {
            check_payment_method(&store, token)?;
        }
        let new_id = params.id.clone().unwrap_or_else(|| id.to_string());
        if new_id != id && store.subscriptions.contains_key(&new_id) {
            return Err(remote_error("id", "81906", "ID has already been taken."));
        }

        let mut updated = current;
        updated.id.clone_from(&new_id);
        if let Some(plan_id) = &params.plan_id {
            updated.plan_id.clone_from(plan_id);
        }
        if let Some(token) = &params.payment_method_token {
            updated.payment_method_token.clone_from(token);
        }
        if params.merchant_account_id.is_some() {
            updated.merchant_account_id.clone_from(&params.merchant_account_id);
        }
        if let Some(price) = &params.price {
            updated.price.clone_from(price);
        }
        if params.number_of_billing_cycles.is_some() {
            updated.number_of_billing_cycles = params.number_of_billing_cycles;
        }
        if params.never_expires == Some(true) && params.number_of_billing_cycles.is_none() {
            updated.number_of_billing_cycles = None;
        }
        updated.never_expires = updated.number_of_billing_cycles.is_none();

        store.subscriptions.remove(id);
        store.subscriptions.insert(new_id, updated.clone());
        Ok(updated)
    }

    fn cancel_subscription(&self, id: &str) -> Result<RemoteSubscription> {
        let mut store = self.serve(Endpoint::CancelSubscription { id: id.to_string() })?;

        let subscription = store
            .subscriptions
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("subscription with id {id}")))?;
        if subscription.status == SubscriptionStatus::Canceled {
            return Err(remote_error(
                "status",
                "81905",
                "Subscription has already been canceled.",
            ));
        }
        subscription.status = SubscriptionStatus::Canceled;
        Ok(subscription.clone())
    }

    fn list_plans(&self) -> Result<Vec<Plan>> {
        let store = self.serve(Endpoint::ListPlans)?;
        Ok(store.plans.clone())
    }

    fn find_credit_card(&self, token: &str) -> Result<CreditCard> {
        let store = self.serve(Endpoint::FindCreditCard {
            token: token.to_string(),
        })?;
        store
            .credit_cards
            .get(token)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("payment method with token {token}")))
    }
}
