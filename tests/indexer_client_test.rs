use alloy::primitives::{Address, B256, U256};
use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lendscope::indexer::{ActionKind, IndexerClient, TransactionRecord};
use lendscope::models::PoolRef;

fn sample_pools() -> Vec<PoolRef> {
    vec![
        PoolRef {
            chain_id: 1,
            address: Address::repeat_byte(0x01),
        },
        PoolRef {
            chain_id: 42161,
            address: Address::repeat_byte(0x02),
        },
    ]
}

fn sample_records() -> Vec<TransactionRecord> {
    vec![
        TransactionRecord {
            action: ActionKind::Borrow,
            pool: Address::repeat_byte(0x01),
            actor: Address::repeat_byte(0xaa),
            amount: U256::from(2_000_000u64),
            tx_hash: B256::repeat_byte(0x10),
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        },
        TransactionRecord {
            action: ActionKind::Deposit,
            pool: Address::repeat_byte(0x01),
            actor: Address::repeat_byte(0xaa),
            amount: U256::from(5_000_000u64),
            tx_hash: B256::repeat_byte(0x11),
            timestamp: Utc.with_ymd_and_hms(2025, 5, 30, 9, 30, 0).unwrap(),
        },
    ]
}

#[tokio::test]
async fn lists_pools_across_chains() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pools"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::to_value(sample_pools()).unwrap()),
        )
        .mount(&server)
        .await;

    let client = IndexerClient::new(&server.uri()).unwrap();
    let pools = client.list_pools().await.unwrap();

    assert_eq!(pools, sample_pools());
}

#[tokio::test]
async fn fetches_pool_history_in_listed_order() {
    let server = MockServer::start().await;
    let pool = PoolRef {
        chain_id: 1,
        address: Address::repeat_byte(0x01),
    };
    Mock::given(method("GET"))
        .and(path(format!("/pools/1/{}/transactions", pool.address)))
        .and(query_param("limit", "50"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::to_value(sample_records()).unwrap()),
        )
        .mount(&server)
        .await;

    let client = IndexerClient::new(&server.uri()).unwrap();
    let records = client.pool_history(&pool, 50).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].action, ActionKind::Borrow);
    assert_eq!(records[0].amount, U256::from(2_000_000u64));
    assert_eq!(records[1].action, ActionKind::Deposit);
    assert!(records[0].timestamp > records[1].timestamp);
}

#[tokio::test]
async fn fetches_account_history() {
    let server = MockServer::start().await;
    let account = Address::repeat_byte(0xaa);
    Mock::given(method("GET"))
        .and(path(format!("/accounts/{account}/transactions")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::to_value(sample_records()).unwrap()),
        )
        .mount(&server)
        .await;

    let client = IndexerClient::new(&server.uri()).unwrap();
    let records = client.account_history(account, 10).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].actor, account);
}

#[tokio::test]
async fn surfaces_error_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pools"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = IndexerClient::new(&server.uri()).unwrap();
    let result = client.list_pools().await;
    assert!(result.is_err());
}

#[tokio::test]
async fn rejects_malformed_payloads() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pools"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"not": "a list"})))
        .mount(&server)
        .await;

    let client = IndexerClient::new(&server.uri()).unwrap();
    assert!(client.list_pools().await.is_err());
}
