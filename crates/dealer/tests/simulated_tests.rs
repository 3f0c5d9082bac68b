use mtgate_core::account::entity::{
    FundsAdjustment, FundsDirection, Login, NewAccount, PasswordKind,
};
use mtgate_core::config::DealerConfig;
use mtgate_core::dealer::error::DealerError;
use mtgate_core::dealer::port::{BackendSession, SessionFactory};
use mtgate_dealer::simulated::{FIRST_LOGIN, SimulatedDealer, SimulatedDealerFactory};
use rust_decimal_macros::dec;
use std::sync::Arc;

fn new_account(name: &str) -> NewAccount {
    NewAccount {
        name: name.to_string(),
        password: "Master1".to_string(),
        password_investor: "Invest1".to_string(),
        group: "demo".to_string(),
        ..Default::default()
    }
}

fn deposit(login: Login, amount: rust_decimal::Decimal) -> FundsAdjustment {
    FundsAdjustment {
        login,
        direction: FundsDirection::Deposit,
        amount,
        comment: "load".to_string(),
        is_credit: false,
    }
}

#[tokio::test]
async fn test_account_lifecycle() {
    let dealer = SimulatedDealer::new("127.0.0.1:443");

    let login = dealer.create_account(&new_account("Alice")).await.unwrap();
    assert_eq!(login, Login(FIRST_LOGIN));
    let second = dealer.create_account(&new_account("Bob")).await.unwrap();
    assert_eq!(second, Login(FIRST_LOGIN + 1));

    let snapshot = dealer
        .adjust_funds(&deposit(login, dec!(500)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.balance, dec!(500));

    let account = dealer.get_account(login).await.unwrap();
    assert_eq!(account.name, "Alice");
    assert_eq!(account.free_margin, dec!(500));
    assert_eq!(account.leverage, 100);

    dealer
        .reset_password(login, "Changed1", PasswordKind::Investor)
        .await
        .unwrap();
    assert!(dealer.check_password(login, "Changed1", PasswordKind::Investor).await);
    assert!(dealer.check_password(login, "Master1", PasswordKind::Master).await);

    dealer.delete_account(login).await.unwrap();
    let err = dealer.get_account(login).await.unwrap_err();
    assert_eq!(err, DealerError::Operation("Invalid account".to_string()));
}

#[tokio::test]
async fn test_create_rejects_empty_name() {
    let dealer = SimulatedDealer::new("127.0.0.1:443");
    let err = dealer.create_account(&new_account("  ")).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid parameters");
}

#[tokio::test]
async fn test_closed_session_rejects_calls() {
    let dealer = SimulatedDealer::new("127.0.0.1:443");
    let login = dealer.create_account(&new_account("Alice")).await.unwrap();

    dealer.close().await.unwrap();
    dealer.close().await.unwrap();

    assert!(dealer.is_closed());
    assert_eq!(dealer.get_account(login).await.unwrap_err(), DealerError::Closed);
    assert_eq!(
        dealer.create_account(&new_account("Bob")).await.unwrap_err(),
        DealerError::Closed
    );
}

#[tokio::test]
async fn test_factory_validates_address() {
    let factory = SimulatedDealerFactory::new();
    let mut config = DealerConfig {
        server_addr: String::new(),
        account: 1,
        password: "manager".to_string(),
    };

    let err = factory.connect("T1", &config).await.err().unwrap();
    assert!(matches!(err, DealerError::Connect(_)));

    config.server_addr = "10.0.0.1:443".to_string();
    assert!(factory.connect("T1", &config).await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deposits_are_consistent() {
    let dealer = Arc::new(SimulatedDealer::new("127.0.0.1:443"));
    let login = dealer.create_account(&new_account("Alice")).await.unwrap();

    let handles: Vec<_> = (0..100)
        .map(|_| {
            let dealer = dealer.clone();
            tokio::spawn(async move { dealer.adjust_funds(&deposit(login, dec!(10))).await })
        })
        .collect();
    for h in handles {
        h.await.unwrap().unwrap();
    }

    let account = dealer.get_account(login).await.unwrap();
    assert_eq!(account.balance, dec!(1000));
}
