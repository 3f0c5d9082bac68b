use mtgate_core::account::entity::{
    AccountUpdate, FundsDirection, FundsRequest, FundsSnapshot, Login, NewAccount, PasswordKind,
    PasswordReset,
};
use mtgate_core::common::{FailureKind, StatusCode};
use mtgate_core::config::DealerConfig;
use mtgate_core::test_utils::{FakeCall, FakeDealer, FakeDealerFactory, FakeOp, sample_account};
use mtgate_manager::account::AccountService;
use mtgate_manager::registry::SessionRegistry;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;

struct Harness {
    service: Arc<AccountService>,
    dealer: Arc<FakeDealer>,
    factory: Arc<FakeDealerFactory>,
}

fn harness_with(dealer: FakeDealer) -> Harness {
    let dealer = Arc::new(dealer);
    let factory = Arc::new(FakeDealerFactory::new().with_session(dealer.clone()));
    let mut configs = HashMap::new();
    configs.insert(
        "T1".to_string(),
        DealerConfig {
            server_addr: "10.0.0.1:443".to_string(),
            account: 1,
            password: "manager".to_string(),
        },
    );
    let registry = SessionRegistry::new(configs, factory.clone());
    Harness {
        service: AccountService::new(registry),
        dealer,
        factory,
    }
}

fn harness() -> Harness {
    harness_with(FakeDealer::new())
}

fn alice() -> NewAccount {
    NewAccount {
        name: "Alice".to_string(),
        password: "Secret1".to_string(),
        password_investor: "Invest1".to_string(),
        group: "demo".to_string(),
        city: "Berlin".to_string(),
        email: "alice@example.com".to_string(),
        phone: "+49".to_string(),
    }
}

fn funds(login: i32, amount: Decimal, is_credit: i32) -> FundsRequest {
    FundsRequest {
        login: Login(login),
        amount,
        comment: "test".to_string(),
        is_credit,
    }
}

#[tokio::test]
async fn test_add_account_returns_issued_login() {
    let h = harness_with(FakeDealer::new().with_next_login(1001));

    let result = h.service.add_account("T1", alice()).await;

    assert_eq!(result.code, StatusCode::Success);
    assert_eq!(result.code.code(), 100);
    assert_eq!(result.message, "Added");
    assert_eq!(result.payload, Some(Login(1001)));
    assert_eq!(result.failure, None);
}

#[tokio::test]
async fn test_add_account_backend_failure_is_surfaced_verbatim() {
    let h = harness();
    h.dealer.fail(FakeOp::Create, "Invalid group").await;

    let result = h.service.add_account("T1", alice()).await;

    assert_eq!(result.code, StatusCode::Failure);
    assert_eq!(result.message, "Invalid group");
    assert_eq!(result.failure, Some(FailureKind::BackendOperationFailed));
    assert_eq!(result.payload, None);
}

#[tokio::test]
async fn test_unknown_token_makes_no_backend_call() {
    let h = harness();

    let result = h.service.get_account_info("unknown-token", Login(1001)).await;

    assert_eq!(result.code.code(), 0);
    assert_eq!(result.message, "ManagerToken not found, check token");
    assert_eq!(result.failure, Some(FailureKind::UnknownToken));
    assert_eq!(h.factory.constructions(), 0);
    assert!(h.dealer.calls().await.is_empty());
}

#[tokio::test]
async fn test_get_account_info_maps_fields() {
    let h = harness();
    let mut account = sample_account(1001, dec!(250.5), dec!(200));
    account.credit = dec!(10);
    account.agent_account = 7;
    h.dealer.insert_account(account).await;

    let result = h.service.get_account_info("T1", Login(1001)).await;

    assert!(result.is_success());
    let info = result.payload.unwrap();
    assert_eq!(info.name, "Alice");
    assert_eq!(info.group, "demo");
    assert!(info.enabled);
    assert_eq!(info.leverage, 100);
    assert_eq!(info.balance, dec!(250.5));
    assert_eq!(info.credit, dec!(10));
    assert_eq!(info.agent_account, 7);
}

#[tokio::test]
async fn test_update_branches_on_its_own_result() {
    let h = harness();
    h.dealer.insert_account(sample_account(1001, dec!(0), dec!(0))).await;
    h.dealer.fail(FakeOp::Update, "Account is locked").await;

    let update = AccountUpdate {
        login: Login(1001),
        name: "Alice B".to_string(),
        password: String::new(),
        password_investor: String::new(),
        group: "real".to_string(),
        city: String::new(),
        email: String::new(),
        phone: String::new(),
    };
    let failed = h.service.update_account("T1", update.clone()).await;
    assert_eq!(failed.code, StatusCode::Failure);
    assert_eq!(failed.message, "Account is locked");

    h.dealer.clear_failure(FakeOp::Update).await;
    let ok = h.service.update_account("T1", update).await;
    assert!(ok.is_success());
    assert_eq!(ok.message, "Updated");
    assert_eq!(h.dealer.account(Login(1001)).await.unwrap().group, "real");

    // 后端失败不影响注册表状态
    assert_eq!(h.factory.constructions(), 1);
}

#[tokio::test]
async fn test_delete_account() {
    let h = harness();
    h.dealer.insert_account(sample_account(1001, dec!(0), dec!(0))).await;

    let result = h.service.delete_account("T1", Login(1001)).await;

    assert!(result.is_success());
    assert_eq!(result.message, "Deleted");
    assert!(h.dealer.account(Login(1001)).await.is_none());

    h.dealer.fail(FakeOp::Delete, "Account not found").await;
    let failed = h.service.delete_account("T1", Login(1001)).await;
    assert_eq!(failed.message, "Account not found");
}

#[tokio::test]
async fn test_reset_password_precedence() {
    let h = harness();

    let master = h
        .service
        .reset_password(
            "T1",
            PasswordReset {
                login: Login(1001),
                password: "abc".to_string(),
                password_investor: String::new(),
            },
        )
        .await;
    assert!(master.is_success());
    assert_eq!(master.message, "Reset");

    let investor = h
        .service
        .reset_password(
            "T1",
            PasswordReset {
                login: Login(1001),
                password: String::new(),
                password_investor: "xyz".to_string(),
            },
        )
        .await;
    assert!(investor.is_success());

    assert_eq!(
        h.dealer.calls().await,
        vec![
            FakeCall::ResetPassword {
                login: Login(1001),
                secret: "abc".to_string(),
                kind: PasswordKind::Master,
            },
            FakeCall::ResetPassword {
                login: Login(1001),
                secret: "xyz".to_string(),
                kind: PasswordKind::Investor,
            },
        ]
    );
}

#[tokio::test]
async fn test_reset_password_without_secret_is_rejected_locally() {
    let h = harness();

    let result = h
        .service
        .reset_password(
            "T1",
            PasswordReset {
                login: Login(1001),
                password: String::new(),
                password_investor: String::new(),
            },
        )
        .await;

    assert_eq!(result.code, StatusCode::Failure);
    assert_eq!(result.failure, Some(FailureKind::InvalidRequest));
    assert!(h.dealer.calls().await.is_empty());
    assert_eq!(h.factory.constructions(), 0);
}

#[tokio::test]
async fn test_withdraw_above_free_margin_never_reaches_backend() {
    let h = harness();
    h.dealer.insert_account(sample_account(1001, dec!(100), dec!(100))).await;

    let rejected = h.service.withdraw("T1", funds(1001, dec!(150.0), 0)).await;

    assert_eq!(rejected.code, StatusCode::Failure);
    assert_eq!(rejected.failure, Some(FailureKind::InsufficientFreeMargin));
    assert_eq!(rejected.message, "Failed withdraw more than free margin");
    assert!(!h.dealer.funds_touched().await);

    let allowed = h.service.withdraw("T1", funds(1001, dec!(100.0), 0)).await;
    assert!(allowed.is_success());
    assert_eq!(allowed.message, "Withdrawn");
    assert!(h.dealer.funds_touched().await);
}

#[tokio::test]
async fn test_withdraw_rejection_echoes_pre_fetch_snapshot() {
    let h = harness();
    let mut account = sample_account(1001, dec!(300), dec!(200));
    account.credit = dec!(25);
    h.dealer.insert_account(account).await;

    let result = h.service.withdraw("T1", funds(1001, dec!(500), 0)).await;

    assert_eq!(result.code.code(), 0);
    assert_eq!(result.message, "Failed withdraw more than free margin");
    assert_eq!(
        result.payload,
        Some(FundsSnapshot {
            balance: dec!(300),
            credit: dec!(25),
        })
    );
}

#[tokio::test]
async fn test_withdraw_success_reports_post_operation_balance() {
    let h = harness();
    h.dealer.insert_account(sample_account(1001, dec!(300), dec!(300))).await;

    let result = h.service.withdraw("T1", funds(1001, dec!(120), 0)).await;

    assert!(result.is_success());
    assert_eq!(result.payload.unwrap().balance, dec!(180));
}

#[tokio::test]
async fn test_withdraw_backend_failure_echoes_snapshot() {
    let h = harness();
    h.dealer.insert_account(sample_account(1001, dec!(300), dec!(300))).await;
    h.dealer.fail(FakeOp::AdjustFunds, "Trade is disabled").await;

    let result = h.service.withdraw("T1", funds(1001, dec!(50), 0)).await;

    assert_eq!(result.code, StatusCode::Failure);
    assert_eq!(result.message, "Trade is disabled");
    assert_eq!(result.failure, Some(FailureKind::BackendOperationFailed));
    assert_eq!(result.payload.unwrap().balance, dec!(300));
}

#[tokio::test]
async fn test_withdraw_refresh_failure_echoes_pre_fetch_snapshot() {
    let h = harness();
    h.dealer.insert_account(sample_account(1001, dec!(300), dec!(300))).await;
    // 第一次查询 (出金前) 正常，第二次查询 (出金后刷新) 失败
    h.dealer.fail_nth(FakeOp::Get, 2, "Network problem").await;

    let result = h.service.withdraw("T1", funds(1001, dec!(120), 0)).await;

    assert!(result.is_success());
    assert_eq!(result.message, "Withdrawn");
    assert_eq!(
        result.payload,
        Some(FundsSnapshot {
            balance: dec!(300),
            credit: Decimal::ZERO,
        })
    );
    assert_eq!(h.dealer.account(Login(1001)).await.unwrap().balance, dec!(180));
    let gets = h
        .dealer
        .calls()
        .await
        .iter()
        .filter(|c| matches!(c, FakeCall::Get(_)))
        .count();
    assert_eq!(gets, 2);
}

#[tokio::test]
async fn test_withdraw_prefers_reported_snapshot() {
    let h = harness_with(FakeDealer::new().with_funds_report(true));
    h.dealer.insert_account(sample_account(1001, dec!(300), dec!(300))).await;

    let result = h.service.withdraw("T1", funds(1001, dec!(120), 0)).await;

    assert!(result.is_success());
    assert_eq!(result.payload.unwrap().balance, dec!(180));
    let calls = h.dealer.calls().await;
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[0], FakeCall::Get(Login(1001))));
    assert!(matches!(calls[1], FakeCall::AdjustFunds(_)));
}

#[tokio::test]
async fn test_deposit_refetches_balance() {
    let h = harness();
    h.dealer.insert_account(sample_account(1001, dec!(100), dec!(100))).await;

    let result = h.service.deposit("T1", funds(1001, dec!(50), 0)).await;

    assert!(result.is_success());
    assert_eq!(result.message, "Deposited");
    assert_eq!(
        result.payload,
        Some(FundsSnapshot {
            balance: dec!(150),
            credit: Decimal::ZERO,
        })
    );
    let calls = h.dealer.calls().await;
    assert!(matches!(calls.last(), Some(FakeCall::Get(Login(1001)))));
}

#[tokio::test]
async fn test_deposit_prefers_reported_snapshot() {
    let h = harness_with(FakeDealer::new().with_funds_report(true));
    h.dealer.insert_account(sample_account(1001, dec!(100), dec!(100))).await;

    let result = h.service.deposit("T1", funds(1001, dec!(50), 0)).await;

    assert_eq!(result.payload.unwrap().balance, dec!(150));
    let calls = h.dealer.calls().await;
    assert_eq!(calls.len(), 1);
}

#[tokio::test]
async fn test_credit_flag_mapping() {
    let h = harness();
    h.dealer.insert_account(sample_account(1001, dec!(100), dec!(100))).await;

    let credit = h.service.deposit("T1", funds(1001, dec!(30), 1)).await;
    assert_eq!(credit.payload.unwrap().credit, dec!(30));

    let not_credit = h.service.deposit("T1", funds(1001, dec!(30), 2)).await;
    let snapshot = not_credit.payload.unwrap();
    assert_eq!(snapshot.credit, dec!(30));
    assert_eq!(snapshot.balance, dec!(130));

    let adjustments: Vec<_> = h
        .dealer
        .calls()
        .await
        .into_iter()
        .filter_map(|c| match c {
            FakeCall::AdjustFunds(a) => Some((a.direction, a.is_credit)),
            _ => None,
        })
        .collect();
    assert_eq!(
        adjustments,
        vec![
            (FundsDirection::Deposit, true),
            (FundsDirection::Deposit, false)
        ]
    );
}

#[tokio::test]
async fn test_deposit_success_survives_refresh_failure() {
    let h = harness();
    h.dealer.insert_account(sample_account(1001, dec!(100), dec!(100))).await;
    h.dealer.fail(FakeOp::Get, "Network problem").await;

    let result = h.service.deposit("T1", funds(1001, dec!(10), 0)).await;

    assert!(result.is_success());
    assert_eq!(result.payload, None);
    assert_eq!(h.dealer.account(Login(1001)).await.unwrap().balance, dec!(110));
}

#[tokio::test]
async fn test_deposit_failure_has_no_payload() {
    let h = harness();
    h.dealer.fail(FakeOp::AdjustFunds, "Invalid account").await;

    let result = h.service.deposit("T1", funds(1001, dec!(10), 0)).await;

    assert_eq!(result.code, StatusCode::Failure);
    assert_eq!(result.message, "Invalid account");
    assert_eq!(result.payload, None);
}
