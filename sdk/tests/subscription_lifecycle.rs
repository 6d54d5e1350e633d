//! Integration tests for the subscription record against the in-memory gateway
//!
//! Test coverage:
//! - Lookup and wrapping of gateway objects (find, from_remote, extract)
//! - Local validation short-circuiting persistence (no request issued)
//! - Create and update through `save` / `update_attributes` and their strict variants
//! - Cancellation by id and through a loaded record
//! - Lazy plan and credit card loading, read-only collections
//!
//! Gateway objects are seeded from the JSON fixtures under `tests/fixtures/`.

use serde_json::json;
use subscription_gateway::{
    Attribute, CreditCard, Environment, Error, Fields, GatewayConfig, MemoryGateway, Plan,
    RemoteSubscription, Subscription, SubscriptionStatus,
};

const SUBSCRIPTION_FIXTURE: &str = include_str!("fixtures/subscription.json");
const PLANS_FIXTURE: &str = include_str!("fixtures/plans.json");
const CREDIT_CARD_FIXTURE: &str = include_str!("fixtures/credit_card.json");

const FIND_PATH: &str = "GET /merchants/merchant_id/subscriptions/subscription_id";
const UPDATE_PATH: &str = "PUT /merchants/merchant_id/subscriptions/subscription_id";
const CANCEL_PATH: &str = "PUT /merchants/merchant_id/subscriptions/subscription_id/cancel";

fn remote_subscription() -> RemoteSubscription {
    serde_json::from_str(SUBSCRIPTION_FIXTURE).unwrap()
}

fn gateway() -> MemoryGateway {
    let gateway = MemoryGateway::new(GatewayConfig::with_merchant(
        Environment::Sandbox,
        "merchant_id",
    ));
    gateway.insert_subscription(remote_subscription()).unwrap();
    let plans: Vec<Plan> = serde_json::from_str(PLANS_FIXTURE).unwrap();
    for plan in plans {
        gateway.insert_plan(plan).unwrap();
    }
    let card: CreditCard = serde_json::from_str(CREDIT_CARD_FIXTURE).unwrap();
    gateway.insert_credit_card(card).unwrap();
    gateway
}

/// Fetch the fixture subscription and forget the lookup request
fn found(gateway: &MemoryGateway) -> Subscription {
    let subscription = Subscription::find(gateway, "subscription_id").unwrap();
    gateway.clear_requests().unwrap();
    subscription
}

fn new_subscription() -> Fields {
    Fields::new()
        .with(Attribute::PlanId, "plan_id")
        .with(Attribute::PaymentMethodToken, "credit_card_id")
        .with(Attribute::Price, "10.00")
}

// ============================================================================
// Construction
// ============================================================================

/// Looking a subscription up yields a persisted record mirroring the gateway object
#[test]
fn test_find_returns_persisted_record() {
    let gateway = gateway();
    let subscription = Subscription::find(&gateway, "subscription_id").unwrap();

    assert!(subscription.is_persisted());
    assert!(!subscription.is_new_record());
    assert_eq!(subscription.id(), Some("subscription_id"));
    assert_eq!(subscription.plan_id(), Some("plan_id"));
    assert_eq!(subscription.payment_method_token(), Some("credit_card_id"));
    assert_eq!(subscription.merchant_account_id(), Some("merchant_account_id"));
    assert_eq!(subscription.price().as_deref(), Some("56.00"));
    assert_eq!(subscription.status(), Some(SubscriptionStatus::Active));
    assert_eq!(subscription.billing_day_of_month(), Some(31));
    assert_eq!(subscription.current_billing_cycle(), Some(1));
    assert_eq!(subscription.number_of_billing_cycles(), None);
    assert!(subscription.never_expires());
    assert!(!subscription.trial_period());
    assert_eq!(
        subscription.first_billing_date().map(|d| d.to_string()),
        Some("2013-01-31".to_string())
    );
    assert_eq!(gateway.request_paths().unwrap(), [FIND_PATH]);
}

#[test]
fn test_find_missing_subscription_is_not_found() {
    let gateway = gateway();

    let error = Subscription::find(&gateway, "missing").unwrap_err();
    assert!(matches!(error, Error::NotFound(_)));
}

/// Wrapping a gateway object does not issue a request
#[test]
fn test_from_remote_wraps_without_request() {
    let gateway = gateway();
    let subscription = Subscription::from(remote_subscription());

    assert!(subscription.is_persisted());
    assert_eq!(subscription.id(), Some("subscription_id"));
    assert!(gateway.requests().unwrap().is_empty());
}

/// A plain mapping builds a new record; unknown keys are dropped
#[test]
fn test_extract_from_json_mapping() {
    let source = json!({
        "id": "new_id",
        "plan_id": "plan_id",
        "billing_day_of_month": 15,
        "favorite_color": "blue",
    });
    let subscription = Subscription::extract(&source);

    assert!(subscription.is_new_record());
    assert_eq!(subscription.id(), Some("new_id"));
    assert_eq!(subscription.billing_day_of_month(), Some(15));
    assert_eq!(subscription.attributes().len(), 3);
}

#[test]
fn test_extract_from_persisted_source() {
    let source = json!({"id": "subscription_id", "persisted": true});
    let subscription = Subscription::extract(&source);

    assert!(subscription.is_persisted());
    assert_eq!(subscription.id(), Some("subscription_id"));
}

// ============================================================================
// Create
// ============================================================================

/// An invalid record never reaches the gateway
#[test]
fn test_invalid_save_issues_no_request() {
    let gateway = gateway();
    let mut subscription = Subscription::new(Fields::new().with(Attribute::Price, "abc"));

    assert!(!subscription.save(&gateway).unwrap());
    assert!(subscription.is_new_record());
    assert_eq!(subscription.errors().on(Attribute::PlanId), ["can't be blank"]);
    assert_eq!(subscription.errors().on(Attribute::Price), ["is not a number"]);
    assert!(gateway.requests().unwrap().is_empty());
}

#[test]
fn test_save_creates_subscription() {
    let gateway = gateway();
    let mut subscription = Subscription::new(new_subscription());

    assert!(subscription.save(&gateway).unwrap());
    assert!(subscription.is_persisted());
    assert!(subscription.errors().is_empty());

    let id = subscription.id().unwrap().to_string();
    assert!(id.starts_with("sub_"));
    assert_eq!(subscription.price().as_deref(), Some("10.00"));
    assert_eq!(subscription.status(), Some(SubscriptionStatus::Active));
    assert!(subscription.transactions().is_empty());
    assert_eq!(
        gateway.request_paths().unwrap(),
        ["POST /merchants/merchant_id/subscriptions"]
    );
    assert!(gateway.subscription(&id).unwrap().is_some());
}

#[test]
fn test_save_with_explicit_id() {
    let gateway = gateway();
    let mut subscription = Subscription::new(new_subscription().with(Attribute::Id, "my_id"));

    assert!(subscription.save(&gateway).unwrap());
    assert_eq!(subscription.id(), Some("my_id"));
}

/// Ids are checked as written, so padding is not sent to the gateway
#[test]
fn test_padded_id_is_rejected_before_create() {
    let gateway = gateway();
    let mut subscription = Subscription::new(new_subscription().with(Attribute::Id, " abc "));

    assert!(!subscription.save(&gateway).unwrap());
    assert_eq!(subscription.errors().on(Attribute::Id), ["is invalid"]);
    assert!(gateway.requests().unwrap().is_empty());
}

/// Cycle counts the gateway cannot hold are rejected instead of being dropped
#[test]
fn test_out_of_range_billing_cycles_are_rejected_before_create() {
    let gateway = gateway();

    for cycles in ["-3", "0", "5000000000"] {
        let mut subscription = Subscription::new(
            new_subscription().with(Attribute::NumberOfBillingCycles, cycles),
        );

        assert!(!subscription.save(&gateway).unwrap(), "{cycles}");
        assert_eq!(
            subscription.errors().on(Attribute::NumberOfBillingCycles).len(),
            1,
            "{cycles}"
        );
    }
    assert!(gateway.requests().unwrap().is_empty());
    assert_eq!(gateway.subscription_count().unwrap(), 1);
}

#[test]
fn test_billing_cycles_reach_the_gateway() {
    let gateway = gateway();
    let mut subscription =
        Subscription::new(new_subscription().with(Attribute::NumberOfBillingCycles, "12"));

    assert!(subscription.save(&gateway).unwrap());
    let id = subscription.id().unwrap().to_string();
    let stored = gateway.subscription(&id).unwrap().unwrap();
    assert_eq!(stored.number_of_billing_cycles, Some(12));
    assert!(!stored.never_expires);
    assert!(!subscription.never_expires());
}

/// Gateway-side validation errors land in the record's error mapping
#[test]
fn test_save_merges_remote_validation_errors() {
    let gateway = gateway();
    let mut subscription =
        Subscription::new(new_subscription().with(Attribute::PlanId, "unknown_plan"));

    assert!(!subscription.save(&gateway).unwrap());
    assert!(subscription.is_new_record());
    assert_eq!(
        subscription.errors().on(Attribute::PlanId),
        ["Plan ID is invalid."]
    );
    assert_eq!(gateway.requests().unwrap().len(), 1);
}

#[test]
fn test_save_strict_reports_invalid_record() {
    let gateway = gateway();
    let mut subscription = Subscription::new(
        Fields::new().with(Attribute::PaymentMethodToken, "credit_card_id"),
    );

    let error = subscription.save_strict(&gateway).unwrap_err();
    assert!(error.is_validation());
    assert_eq!(error.to_string(), "Validation failed: Plan can't be blank");
    assert!(gateway.requests().unwrap().is_empty());
}

#[test]
fn test_save_strict_reports_remote_validation() {
    let gateway = gateway();
    let mut subscription =
        Subscription::new(new_subscription().with(Attribute::Id, "subscription_id"));

    let error = subscription.save_strict(&gateway).unwrap_err();
    match error {
        Error::RecordInvalid(errors) => {
            assert_eq!(errors.on(Attribute::Id), ["ID has already been taken."]);
        }
        other => panic!("expected RecordInvalid, got {other:?}"),
    }
}

/// Transport failures surface as errors rather than a false result
#[test]
fn test_save_propagates_gateway_failure() {
    let gateway = gateway();
    gateway.set_fail_next(true).unwrap();
    let mut subscription = Subscription::new(new_subscription());

    let error = subscription.save(&gateway).unwrap_err();
    assert!(matches!(error, Error::Remote(_)));
    assert!(subscription.is_new_record());
}

// ============================================================================
// Update
// ============================================================================

#[test]
fn test_update_attributes_sends_update() {
    let gateway = gateway();
    let mut subscription = found(&gateway);

    let updated = subscription
        .update_attributes(&gateway, Fields::new().with(Attribute::Price, "10"))
        .unwrap();

    assert!(updated);
    assert_eq!(subscription.price().as_deref(), Some("10"));
    assert_eq!(gateway.request_paths().unwrap(), [UPDATE_PATH]);
    let stored = gateway.subscription("subscription_id").unwrap().unwrap();
    assert_eq!(stored.price, "10");
}

#[test]
fn test_update_attributes_with_invalid_price_issues_no_request() {
    let gateway = gateway();
    let mut subscription = found(&gateway);

    let updated = subscription
        .update_attributes(&gateway, Fields::new().with(Attribute::Price, "f".repeat(256)))
        .unwrap();

    assert!(!updated);
    assert_eq!(subscription.errors().on(Attribute::Price), ["is not a number"]);
    assert!(gateway.requests().unwrap().is_empty());
}

#[test]
fn test_update_attributes_strict_fails_on_invalid_record() {
    let gateway = gateway();
    let mut subscription = found(&gateway);

    let result = subscription
        .update_attributes_strict(&gateway, Fields::new().with(Attribute::Price, "f".repeat(256)));

    assert!(matches!(result, Err(Error::RecordInvalid(_))));
    assert!(gateway.requests().unwrap().is_empty());
}

#[test]
fn test_update_attributes_strict_succeeds() {
    let gateway = gateway();
    let mut subscription = found(&gateway);

    subscription
        .update_attributes_strict(&gateway, Fields::new().with(Attribute::Price, "12.50"))
        .unwrap();

    assert_eq!(subscription.price().as_deref(), Some("12.50"));
}

/// Billing cycle counts at or below the current cycle are rejected locally
#[test]
fn test_update_rejects_exhausted_billing_cycles() {
    let gateway = gateway();
    let mut subscription = found(&gateway);

    let updated = subscription
        .update_attributes(
            &gateway,
            Fields::new().with(Attribute::NumberOfBillingCycles, 1),
        )
        .unwrap();

    assert!(!updated);
    assert_eq!(
        subscription.errors().on(Attribute::NumberOfBillingCycles),
        ["must be greater than 1"]
    );
}

#[test]
fn test_update_with_billing_cycles_ends_never_expires() {
    let gateway = gateway();
    let mut subscription = found(&gateway);

    assert!(subscription
        .update_attributes(
            &gateway,
            Fields::new().with(Attribute::NumberOfBillingCycles, 12),
        )
        .unwrap());

    assert_eq!(subscription.number_of_billing_cycles(), Some(12));
    assert!(!subscription.never_expires());
}

/// Renaming a subscription updates it under its previous id
#[test]
fn test_update_renames_subscription() {
    let gateway = gateway();
    let mut subscription = found(&gateway);
    subscription.set(Attribute::Id, "renamed_id");

    assert!(subscription.save(&gateway).unwrap());
    assert_eq!(subscription.id(), Some("renamed_id"));
    assert_eq!(gateway.request_paths().unwrap(), [UPDATE_PATH]);
    assert!(gateway.subscription("subscription_id").unwrap().is_none());
    assert!(gateway.subscription("renamed_id").unwrap().is_some());
}

#[test]
fn test_reload_replaces_local_changes() {
    let gateway = gateway();
    let mut subscription = found(&gateway);
    subscription.set(Attribute::Price, "99.00");

    subscription.reload(&gateway).unwrap();

    assert_eq!(subscription.price().as_deref(), Some("56.00"));
    assert_eq!(gateway.request_paths().unwrap(), [FIND_PATH]);
}

#[test]
fn test_reload_new_record_is_invalid_state() {
    let gateway = gateway();
    let mut subscription = Subscription::new(new_subscription());

    let error = subscription.reload(&gateway).unwrap_err();
    assert!(matches!(error, Error::InvalidState(_)));
}

// ============================================================================
// Cancel
// ============================================================================

/// Canceling by id issues exactly one cancel request
#[test]
fn test_cancel_by_id_issues_only_cancel_request() {
    let gateway = gateway();

    Subscription::cancel_by_id(&gateway, "subscription_id").unwrap();

    assert_eq!(gateway.request_paths().unwrap(), [CANCEL_PATH]);
    let stored = gateway.subscription("subscription_id").unwrap().unwrap();
    assert_eq!(stored.status, SubscriptionStatus::Canceled);
}

#[test]
fn test_delete_by_id_cancels() {
    let gateway = gateway();

    Subscription::delete_by_id(&gateway, "subscription_id").unwrap();

    assert_eq!(gateway.request_paths().unwrap(), [CANCEL_PATH]);
}

#[test]
fn test_cancel_by_id_missing_subscription() {
    let gateway = gateway();

    let error = Subscription::cancel_by_id(&gateway, "missing").unwrap_err();
    assert!(matches!(error, Error::NotFound(_)));
}

#[test]
fn test_cancel_record_blocks_further_persistence() {
    let gateway = gateway();
    let mut subscription = found(&gateway);

    subscription.cancel(&gateway).unwrap();
    assert!(subscription.is_canceled());
    assert!(!subscription.is_persisted());
    assert_eq!(subscription.status(), Some(SubscriptionStatus::Canceled));
    assert_eq!(gateway.request_paths().unwrap(), [CANCEL_PATH]);

    assert!(matches!(
        subscription.save(&gateway),
        Err(Error::InvalidState(_))
    ));
    assert!(matches!(
        subscription.cancel(&gateway),
        Err(Error::InvalidState(_))
    ));
    assert_eq!(gateway.requests().unwrap().len(), 1);
}

#[test]
fn test_destroy_cancels_record() {
    let gateway = gateway();
    let mut subscription = found(&gateway);

    subscription.destroy(&gateway).unwrap();

    assert!(subscription.is_canceled());
}

#[test]
fn test_cancel_new_record_is_invalid_state() {
    let gateway = gateway();
    let mut subscription = Subscription::new(new_subscription());

    let error = subscription.cancel(&gateway).unwrap_err();
    assert!(matches!(error, Error::InvalidState(_)));
    assert!(gateway.requests().unwrap().is_empty());
}

// ============================================================================
// Associations
// ============================================================================

#[test]
fn test_plan_is_loaded_once() {
    let gateway = gateway();
    let mut subscription = found(&gateway);

    let plan = subscription.plan(&gateway).unwrap().cloned().unwrap();
    assert_eq!(plan.id, "plan_id");
    assert_eq!(plan.price, "56.00");

    subscription.plan(&gateway).unwrap();
    assert_eq!(
        gateway.request_paths().unwrap(),
        ["GET /merchants/merchant_id/plans"]
    );
}

/// Changing the plan id drops the cached plan
#[test]
fn test_plan_follows_plan_id_changes() {
    let gateway = gateway();
    let mut subscription = found(&gateway);
    subscription.plan(&gateway).unwrap();

    subscription.set(Attribute::PlanId, "trial_plan_id");
    let plan = subscription.plan(&gateway).unwrap().unwrap();

    assert_eq!(plan.id, "trial_plan_id");
    assert!(plan.trial_period);
    assert_eq!(gateway.requests().unwrap().len(), 2);
}

#[test]
fn test_unknown_plan_loads_as_none() {
    let gateway = gateway();
    let mut subscription = Subscription::new(Fields::new().with(Attribute::PlanId, "nope"));

    assert!(subscription.plan(&gateway).unwrap().is_none());
}

#[test]
fn test_credit_card_is_loaded_once() {
    let gateway = gateway();
    let mut subscription = found(&gateway);

    let card = subscription.credit_card(&gateway).unwrap().cloned().unwrap();
    assert_eq!(card.token, "credit_card_id");
    assert_eq!(card.last_4, "1111");

    subscription.credit_card(&gateway).unwrap();
    assert_eq!(
        gateway.request_paths().unwrap(),
        ["GET /merchants/merchant_id/payment_methods/credit_card/credit_card_id"]
    );
}

#[test]
fn test_missing_foreign_keys_load_nothing() {
    let gateway = gateway();
    let mut subscription = Subscription::default();

    assert!(subscription.plan(&gateway).unwrap().is_none());
    assert!(subscription.credit_card(&gateway).unwrap().is_none());
    assert!(gateway.requests().unwrap().is_empty());
}

#[test]
fn test_collections_mirror_gateway_object() {
    let remote = remote_subscription();
    let subscription = Subscription::from(remote.clone());

    assert_eq!(subscription.add_ons().len(), remote.add_ons.len());
    assert_eq!(subscription.discounts().len(), remote.discounts.len());
    assert_eq!(subscription.transactions().len(), remote.transactions.len());

    let add_ons = subscription.add_ons();
    let add_on = &add_ons[0];
    assert_eq!(add_on.id, "add_on_id");
    assert_eq!(add_on.quantity, 2);
    let amounts: Vec<&str> = subscription
        .transactions()
        .iter()
        .map(|transaction| transaction.amount.as_str())
        .collect();
    assert_eq!(amounts, ["56.00"]);
}

#[test]
fn test_collections_cannot_create_members() {
    let subscription = Subscription::from(remote_subscription());

    for error in [
        subscription.add_ons().create().unwrap_err(),
        subscription.discounts().create().unwrap_err(),
    ] {
        assert!(matches!(error, Error::NotSupported(_)));
    }
    assert!(matches!(
        subscription.transactions().create(),
        Err(Error::NotSupported(_))
    ));
}
