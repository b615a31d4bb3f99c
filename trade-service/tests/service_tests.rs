use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::error::Error;
use common::model::trade::Trade;
use common::model::user::{SessionContext, UserAccount};
use trade_service::{
    InMemoryTradeBackend, SettlementDispatch, TradeBackend, TradeService, TradeServiceConfig,
};

fn service_over(backend: Arc<InMemoryTradeBackend>) -> TradeService {
    let session = SessionContext {
        current_user: Some(UserAccount {
            id: 5,
            login_id: "desk".to_string(),
        }),
        users: Vec::new(),
    };
    // Zero settlement delay so deferred saves run immediately under test.
    let config = TradeServiceConfig::new("http://unused.test".to_string(), 5, 0);
    TradeService::new(backend, session, config)
}

fn bookable_trade() -> Trade {
    let mut trade = Trade::draft();
    trade.book_name = Some("RATES-NY".to_string());
    trade.counterparty_name = Some("ACME Bank".to_string());
    trade
}

#[tokio::test]
async fn test_create_assigns_identifier_and_uti() {
    let backend = Arc::new(InMemoryTradeBackend::new());
    let service = service_over(backend.clone());
    let mut trade = bookable_trade();

    let outcome = service.save(&mut trade, None).await.unwrap();
    assert!(outcome.created);
    assert!(matches!(outcome.settlement, SettlementDispatch::NotRequested));
    assert_eq!(trade.trade_id.as_deref(), Some(outcome.trade_id.as_str()));
    assert!(trade.uti_code.as_deref().unwrap().starts_with("UTI-"));
    assert!(backend.trades.contains_key(&outcome.trade_id));
}

#[tokio::test]
async fn test_create_defers_settlement_save_to_matching_entity() {
    let backend = Arc::new(InMemoryTradeBackend::new());
    let service = service_over(backend.clone());
    let mut trade = bookable_trade();

    let outcome = service
        .save(&mut trade, Some("Settle via DVP through custodian."))
        .await
        .unwrap();
    assert!(matches!(outcome.settlement, SettlementDispatch::Deferred));

    // At the moment the save returns, persistence may not have run yet;
    // awaiting the task makes it deterministic.
    outcome.settlement_task.unwrap().await.unwrap();

    let record = backend.settlements.get(&outcome.trade_id).unwrap().clone();
    assert_eq!(record.entity_type, "TRADE");
    assert_eq!(record.entity_id.to_string(), outcome.trade_id);
    assert_eq!(record.field_name, "SETTLEMENT_INSTRUCTIONS");
    assert_eq!(record.field_value, "Settle via DVP through custodian.");
    assert!(service.pending_settlement(&outcome.trade_id).is_none());
}

#[tokio::test]
async fn test_update_refetches_backend_state() {
    let backend = Arc::new(InMemoryTradeBackend::new());
    let service = service_over(backend.clone());
    let mut trade = bookable_trade();

    service.save(&mut trade, None).await.unwrap();
    assert_eq!(trade.version, Some(1));

    trade.counterparty_name = Some("Other Bank".to_string());
    let outcome = service.save(&mut trade, None).await.unwrap();
    assert!(!outcome.created);
    // Local state was replaced with the persisted representation.
    assert_eq!(trade.version, Some(2));
    assert_eq!(trade.counterparty_name.as_deref(), Some("Other Bank"));
}

#[tokio::test]
async fn test_invalid_trade_never_reaches_the_backend() {
    let backend = Arc::new(InMemoryTradeBackend::new());
    let service = service_over(backend.clone());
    let mut trade = bookable_trade();
    trade.legs[0].currency = None;

    let err = service.save(&mut trade, None).await.unwrap_err();
    assert!(err.is_validation());
    assert!(backend.trades.is_empty());
}

#[tokio::test]
async fn test_settlement_floor_is_five_on_the_save_path() {
    let backend = Arc::new(InMemoryTradeBackend::new());
    let service = service_over(backend.clone());
    let mut trade = bookable_trade();
    service.save(&mut trade, None).await.unwrap();

    let outcome = service.save(&mut trade, Some("1234")).await.unwrap();
    assert!(matches!(outcome.settlement, SettlementDispatch::Rejected(_)));

    let outcome = service.save(&mut trade, Some("12345")).await.unwrap();
    assert!(matches!(outcome.settlement, SettlementDispatch::Saved));
}

#[tokio::test]
async fn test_rejected_settlement_does_not_block_the_trade_save() {
    let backend = Arc::new(InMemoryTradeBackend::new());
    let service = service_over(backend.clone());
    let mut trade = bookable_trade();

    let outcome = service
        .save(&mut trade, Some("bad; instruction with forbidden chars"))
        .await
        .unwrap();
    assert!(outcome.created);
    assert!(matches!(outcome.settlement, SettlementDispatch::Rejected(_)));
    assert!(backend.settlements.is_empty());
}

#[tokio::test]
async fn test_failed_settlement_save_is_pending_then_retried() {
    let backend = Arc::new(InMemoryTradeBackend::new());
    let service = service_over(backend.clone());
    let mut trade = bookable_trade();
    service.save(&mut trade, None).await.unwrap();
    let trade_id = trade.trade_id.clone().unwrap();

    backend.fail_settlement_saves.store(true, Ordering::SeqCst);
    let outcome = service
        .save(&mut trade, Some("Pay to nostro account."))
        .await
        .unwrap();
    assert!(matches!(outcome.settlement, SettlementDispatch::PendingRetry(_)));
    assert_eq!(
        service.pending_settlement(&trade_id).as_deref(),
        Some("Pay to nostro account.")
    );

    backend.fail_settlement_saves.store(false, Ordering::SeqCst);
    assert!(service.retry_settlement(&trade_id).await.unwrap());
    assert!(service.pending_settlement(&trade_id).is_none());
    assert_eq!(
        backend.settlements.get(&trade_id).unwrap().field_value,
        "Pay to nostro account."
    );
}

#[tokio::test]
async fn test_retry_without_pending_marker_is_a_noop() {
    let backend = Arc::new(InMemoryTradeBackend::new());
    let service = service_over(backend);
    assert!(!service.retry_settlement("1042").await.unwrap());
}

#[tokio::test]
async fn test_privilege_failure_surfaces_as_such() {
    let backend = Arc::new(InMemoryTradeBackend::new());
    let service = service_over(backend.clone());
    let mut trade = bookable_trade();
    service.save(&mut trade, None).await.unwrap();

    backend.deny_settlement_saves.store(true, Ordering::SeqCst);
    let outcome = service
        .save(&mut trade, Some("Pay to nostro account."))
        .await
        .unwrap();
    match outcome.settlement {
        SettlementDispatch::PendingRetry(reason) => {
            assert!(reason.contains("Insufficient privilege"))
        }
        other => panic!("expected PendingRetry, got {:?}", other),
    }

    backend.deny_settlement_saves.store(false, Ordering::SeqCst);
    let trade_id = trade.trade_id.unwrap();
    assert!(service.retry_settlement(&trade_id).await.unwrap());
}

#[tokio::test]
async fn test_terminate_lifecycle() {
    let backend = Arc::new(InMemoryTradeBackend::new());
    let service = service_over(backend.clone());
    let mut trade = bookable_trade();
    service.save(&mut trade, None).await.unwrap();

    service.terminate(&mut trade).await.unwrap();
    assert!(trade.is_terminated());

    let err = service.terminate(&mut trade).await.unwrap_err();
    assert_eq!(err.to_string(), "Trade is already terminated.");

    // Terminated trades reject further saves.
    let err = service.save(&mut trade, None).await.unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_terminate_requires_an_identifier() {
    let backend = Arc::new(InMemoryTradeBackend::new());
    let service = service_over(backend);
    let mut trade = bookable_trade();

    let err = service.terminate(&mut trade).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot terminate: trade identifier is missing."
    );
}

#[tokio::test]
async fn test_load_settlement_defaults_to_empty() {
    let backend = Arc::new(InMemoryTradeBackend::new());
    let service = service_over(backend.clone());
    let mut trade = bookable_trade();
    service.save(&mut trade, None).await.unwrap();

    let text = service
        .load_settlement(trade.trade_id.as_deref().unwrap())
        .await
        .unwrap();
    assert_eq!(text, "");
}

#[tokio::test]
async fn test_load_unknown_trade_is_not_found() {
    let backend = Arc::new(InMemoryTradeBackend::new());
    let service = service_over(backend);
    let err = service.load("9999").await.unwrap_err();
    assert!(matches!(err, Error::TradeNotFound(_)));
}

#[tokio::test]
async fn test_export_quotes_fields_containing_quotes() {
    use common::model::settlement::SettlementInstruction;

    let backend = InMemoryTradeBackend::new();
    backend.settlements.insert(
        "1000".to_string(),
        SettlementInstruction::for_trade(1000, "pay \"as agreed\" via agent"),
    );
    backend.settlements.insert(
        "1001".to_string(),
        SettlementInstruction::for_trade(1001, "amount, then netting"),
    );

    let export = backend.export_settlements(false, false).await.unwrap();
    let csv = String::from_utf8(export.body).unwrap();
    // A field with embedded quotes must be wrapped, not left as bare
    // doubled quotes; commas wrap as before.
    assert!(csv.contains("1000,\"pay \"\"as agreed\"\" via agent\",false"));
    assert!(csv.contains("1001,\"amount, then netting\",false"));
}

#[tokio::test]
async fn test_in_memory_backend_round_trips_create_and_fetch() {
    let backend = InMemoryTradeBackend::new();
    let dto = serde_json::json!({
        "bookName": "RATES-NY",
        "counterpartyName": "ACME Bank",
        "tradeLegs": [{}, {}]
    });
    let created = backend.create_trade(&dto).await.unwrap();
    let id = created["tradeId"].as_str().unwrap();

    let fetched = backend.get_trade(id).await.unwrap();
    assert_eq!(fetched.trade_id.as_deref(), Some(id));
    assert_eq!(fetched.book_name.as_deref(), Some("RATES-NY"));
    assert_eq!(fetched.version, Some(1));
}
