use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fbc_market::api::HttpSettlementGateway;
use fbc_market::config::{AppConfig, SettlementConfig, SettlementMode, StorageConfig};
use fbc_market::core::Marketplace;
use fbc_market::interfaces::{Persistence, SettlementGateway};
use fbc_market::settlement::{DealStatus, NewDeal};
use fbc_market::store::JsonFilePersistence;
use fbc_market::types::DealId;
use fbc_market::Error;

fn settlement_config(server: &MockServer) -> SettlementConfig {
    SettlementConfig {
        mode: SettlementMode::Http,
        base_url: server.uri(),
        timeout_ms: 500,
        retries: 2,
        max_backoff_ms: 10,
    }
}

fn confirm_path(id: &str) -> String {
    format!("/api/deals/{id}/confirm")
}

#[tokio::test]
async fn accepted_confirmation_carries_backend_timestamp() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(confirm_path("d1")))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dealId": "d1",
            "acceptedAt": "2025-01-20T10:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpSettlementGateway::new(&settlement_config(&server)).unwrap();
    let confirmation = gateway.confirm_deal(&DealId::from("d1")).await.unwrap();

    assert_eq!(confirmation.deal_id, DealId::from("d1"));
    assert_eq!(confirmation.accepted_at, Utc.with_ymd_and_hms(2025, 1, 20, 10, 0, 0).unwrap());
}

#[tokio::test]
async fn empty_success_body_is_still_an_acceptance() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(confirm_path("d2")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpSettlementGateway::new(&settlement_config(&server)).unwrap();
    let confirmation = gateway.confirm_deal(&DealId::from("d2")).await.unwrap();
    assert_eq!(confirmation.deal_id, DealId::from("d2"));
}

#[tokio::test]
async fn confirmation_for_another_deal_is_rejected_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(confirm_path("d6")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dealId": "d7",
            "acceptedAt": "2025-01-20T10:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpSettlementGateway::new(&settlement_config(&server)).unwrap();
    let err = gateway.confirm_deal(&DealId::from("d6")).await.unwrap_err();
    assert!(matches!(err, Error::SettlementRejected { ref deal_id, .. } if deal_id == &DealId::from("d6")));
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(confirm_path("d3")))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpSettlementGateway::new(&settlement_config(&server)).unwrap();
    let err = gateway.confirm_deal(&DealId::from("d3")).await.unwrap_err();

    match err {
        Error::SettlementRejected { deal_id, reason } => {
            assert_eq!(deal_id, DealId::from("d3"));
            assert_eq!(reason, "HTTP 403: Access denied. You do not have permission.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn server_errors_are_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(confirm_path("d4")))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(confirm_path("d4")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpSettlementGateway::new(&settlement_config(&server)).unwrap();
    assert!(gateway.confirm_deal(&DealId::from("d4")).await.is_ok());
}

#[tokio::test]
async fn exhausted_retries_become_a_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(confirm_path("d5")))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let gateway = HttpSettlementGateway::new(&settlement_config(&server)).unwrap();
    let err = gateway.confirm_deal(&DealId::from("d5")).await.unwrap_err();
    assert!(matches!(err, Error::SettlementRejected { ref reason, .. } if reason.starts_with("HTTP 500")));
}

#[tokio::test]
async fn marketplace_from_config_settles_over_http_and_saves_to_disk() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("fbc.owner.config.json");

    let config = AppConfig {
        storage: StorageConfig { path: store_path.clone() },
        settlement: SettlementConfig {
            retries: 0,
            ..settlement_config(&server)
        },
        ..AppConfig::default()
    };

    let market = Marketplace::from_config(&config).unwrap();
    let deal = market
        .create_deal(NewDeal::new("50.00".parse().unwrap()).with_referrer("@ref1"))
        .await
        .unwrap()
        .value;

    Mock::given(method("PUT"))
        .and(path(confirm_path(deal.id.as_str())))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let confirmed = market.confirm_deal(&deal.id).await.unwrap();
    assert!(confirmed.is_persisted());
    assert_eq!(confirmed.value.entries[1].amount.to_string(), "5.00");

    let reloaded = JsonFilePersistence::new(&store_path).load().unwrap();
    assert_eq!(reloaded.deals.get(&deal.id).unwrap().status, DealStatus::Released);
    assert_eq!(reloaded.balances().display().referral_balance, "5.00");
    assert_eq!(reloaded.balances().display().creator_balance, "50.00");
}
