//! Integration tests for lightlink
//!
//! Exercises the full facade over the in-process mock engine: chain
//! lifecycle, request validation, and response delivery.

use futures::StreamExt;
use lightlink::engine::{Engine, MockEngine};
use lightlink::{BufferPolicy, Chain, Client, LightlinkError, Request, RequestId, Response};
use serde_json::json;
use std::sync::Arc;

fn client_with_engine() -> (Client, Arc<MockEngine>) {
    let engine = Arc::new(MockEngine::new());
    (Client::new(engine.clone()), engine)
}

#[test]
fn test_add_chain() {
    let (client, _) = client_with_engine();
    let chain = Chain::polkadot();
    assert!(!client.is_valid(&chain));

    client.add_chain(&chain).unwrap();
    assert!(client.is_valid(&chain));
}

#[test]
fn test_add_chain_already_added() {
    let (client, _) = client_with_engine();
    let chain = Chain::polkadot();
    client.add_chain(&chain).unwrap();

    let err = client.add_chain(&chain).unwrap_err();
    assert!(matches!(err, LightlinkError::AlreadyRegistered));
}

#[test]
fn test_remove_chain() {
    let (client, _) = client_with_engine();
    let chain = Chain::polkadot();
    client.add_chain(&chain).unwrap();
    assert!(client.is_valid(&chain));

    client.remove_chain(&chain).unwrap();
    assert!(!client.is_valid(&chain));
    assert!(chain.id().is_none());
}

#[test]
fn test_remove_chain_not_added() {
    let (client, _) = client_with_engine();
    let chain = Chain::polkadot();

    let err = client.remove_chain(&chain).unwrap_err();
    assert!(matches!(err, LightlinkError::NotRegistered));
    assert!(!client.is_valid(&chain));
}

#[test]
fn test_request_invalid_json() {
    let err = Request::from_json("invalid json").unwrap_err();
    assert!(matches!(err, LightlinkError::InvalidJson(_)));
}

#[test]
fn test_request_invalid_jsonrpc_version() {
    let err = Request::from_json(
        r#"{"id":1,"jsonrpc":"1.0","method":"system_chain","params":[]}"#,
    )
    .unwrap_err();
    assert!(matches!(err, LightlinkError::InvalidRequest(_)));
}

#[test]
fn test_request_chain_not_added() {
    let (client, _) = client_with_engine();
    let chain = Chain::polkadot();
    let request = Request::from_json(
        r#"{"id":1,"jsonrpc":"2.0","method":"system_chain","params":[]}"#,
    )
    .unwrap();

    let err = client.send(&request, &chain).unwrap_err();
    assert!(matches!(err, LightlinkError::NotRegistered));
}

#[tokio::test]
async fn test_system_chain_round_trip() {
    let (client, _) = client_with_engine();
    let chain = Chain::polkadot();
    client.add_chain(&chain).unwrap();

    let request = Request::from_json(
        r#"{"id":1,"jsonrpc":"2.0","method":"system_chain","params":[]}"#,
    )
    .unwrap();
    client.send(&request, &chain).unwrap();

    let response = client.response(&chain).await.unwrap().expect("a response");
    assert_eq!(response.id(), Some(&RequestId::from(1)));
    assert_eq!(response.result(), Some(&json!("Polkadot")));
}

#[tokio::test]
async fn test_responses_arrive_in_arrival_order() {
    let (client, engine) = client_with_engine();
    let chain = Chain::westend();
    let id = client.add_chain(&chain).unwrap();

    for n in 0..10 {
        engine.push_raw(id, format!(r#"{{"jsonrpc":"2.0","id":{n},"result":{n}}}"#));
    }

    let mut last = -1;
    for _ in 0..10 {
        let response = client.response(&chain).await.unwrap().unwrap();
        let n = response.result().unwrap().as_i64().unwrap();
        assert!(n > last, "responses reordered: {n} after {last}");
        last = n;
    }
}

#[tokio::test]
async fn test_pending_pull_resolves_after_remove() {
    let (client, _) = client_with_engine();
    let client = Arc::new(client);
    let chain = Chain::rococo();
    client.add_chain(&chain).unwrap();

    let pending = {
        let client = client.clone();
        let chain = chain.clone();
        tokio::spawn(async move { client.response(&chain).await })
    };
    tokio::task::yield_now().await;

    client.remove_chain(&chain).unwrap();

    // Never hangs: the pull resolves to NotRegistered or end-of-stream.
    match pending.await.unwrap() {
        Err(LightlinkError::NotRegistered) | Ok(None) => {}
        other => panic!("unexpected pull outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_subscription_stream_delivers_responses() {
    let (client, _) = client_with_engine();
    let chain = Chain::kusama();
    client.add_chain(&chain).unwrap();

    let mut stream = client.responses(&chain).unwrap();

    for n in 1..=3 {
        let request = Request::new("system_chain", Some(json!([])), Some(RequestId::from(n)))
            .unwrap();
        client.send(&request, &chain).unwrap();
    }

    for n in 1..=3 {
        let response: Response = stream.next().await.unwrap().unwrap();
        assert_eq!(response.id(), Some(&RequestId::from(n)));
        assert_eq!(response.result(), Some(&json!("Kusama")));
    }

    client.remove_chain(&chain).unwrap();
    match stream.next().await {
        None | Some(Err(LightlinkError::NotRegistered)) => {}
        other => panic!("stream did not terminate after removal: {other:?}"),
    }
}

#[tokio::test]
async fn test_subscription_requires_added_chain() {
    let (client, _) = client_with_engine();
    let err = client.responses(&Chain::polkadot()).unwrap_err();
    assert!(matches!(err, LightlinkError::NotRegistered));
}

#[tokio::test]
async fn test_fail_fast_policy_surfaces_overflow() {
    let (client, engine) = client_with_engine();
    let chain = Chain::westend();
    let id = client.add_chain(&chain).unwrap();

    let mut stream = client
        .responses_with_policy(&chain, BufferPolicy::Error(2))
        .unwrap();

    for n in 0..8 {
        engine.push_raw(id, format!(r#"{{"jsonrpc":"2.0","id":{n},"result":{n}}}"#));
    }

    // Let the polling task overrun the buffer before anything is consumed.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let mut items = Vec::new();
    while let Some(item) = stream.next().await {
        items.push(item);
    }
    assert!(items.iter().any(|i| matches!(i, Err(LightlinkError::Overflow))));
    assert!(items.len() <= 3, "buffer exceeded its capacity: {items:?}");
}

#[tokio::test]
async fn test_chains_are_isolated() {
    let (client, engine) = client_with_engine();
    let polkadot = Chain::polkadot();
    let kusama = Chain::kusama();
    let polkadot_id = client.add_chain(&polkadot).unwrap();
    let kusama_id = client.add_chain(&kusama).unwrap();
    assert_ne!(polkadot_id, kusama_id);

    engine.push_raw(
        polkadot_id,
        r#"{"jsonrpc":"2.0","id":1,"result":"for-polkadot"}"#.to_string(),
    );
    engine.push_raw(
        kusama_id,
        r#"{"jsonrpc":"2.0","id":2,"result":"for-kusama"}"#.to_string(),
    );

    let kusama_response = client.response(&kusama).await.unwrap().unwrap();
    assert_eq!(kusama_response.result(), Some(&json!("for-kusama")));
    let polkadot_response = client.response(&polkadot).await.unwrap().unwrap();
    assert_eq!(polkadot_response.result(), Some(&json!("for-polkadot")));
}

#[test]
fn test_readding_removed_chain_gets_fresh_handle() {
    let (client, _) = client_with_engine();
    let chain = Chain::polkadot();
    let first = client.add_chain(&chain).unwrap();
    client.remove_chain(&chain).unwrap();
    let second = client.add_chain(&chain).unwrap();
    assert_ne!(first, second);
    assert!(client.is_valid(&chain));
}

#[test]
fn test_notifications_produce_no_response() {
    let (client, engine) = client_with_engine();
    let chain = Chain::polkadot();
    let id = client.add_chain(&chain).unwrap();

    let notification = Request::notification("system_chain", Some(json!([]))).unwrap();
    client.send(&notification, &chain).unwrap();

    // The engine saw the request but queued nothing.
    assert!(engine.is_valid_chain(id));
}

#[test]
fn test_version_constants() {
    assert!(!lightlink::VERSION.is_empty());
    assert_eq!(lightlink::WELL_KNOWN_NETWORKS.len(), 4);
}
