//! End-to-end bridge tests against a fake host over HTTP.

mod support;

use std::time::{Duration, Instant};

use anyhow::Result;
use psbridge_core::{BridgeError, CommandResult, Session};
use psbridge_session::{Bridge, Channel, LayerId, Sequence, SubCommand, target};
use serde_json::json;
use support::FakeHost;

fn bridge_for(host: &FakeHost, timeout: Duration) -> Result<Bridge> {
    let session = Session::new("photoshop", host.endpoint(), timeout)?;
    Ok(Bridge::connect(&session)?)
}

#[tokio::test]
async fn test_success_payload_returned_unchanged() -> Result<()> {
    let host = FakeHost::spawn().await?;
    let bridge = bridge_for(&host, Duration::from_secs(5))?;

    let result = bridge.dispatch("getDocumentInfo", json!({})).await?;
    assert_eq!(
        result,
        CommandResult::Success(json!({"width": 800, "height": 600}))
    );

    let received = host.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["app"], "photoshop");
    assert_eq!(received[0]["operation"], "getDocumentInfo");
    assert_eq!(received[0]["params"], json!({}));
    assert!(received[0]["id"].as_str().is_some_and(|id| id.len() == 36));
    Ok(())
}

#[tokio::test]
async fn test_host_error_is_a_result_not_a_failure() -> Result<()> {
    let host = FakeHost::spawn().await?;
    let bridge = bridge_for(&host, Duration::from_secs(5))?;

    let result = bridge.dispatch("getLayers", json!({})).await?;
    assert_eq!(result.error(), Some("no document open"));

    let err = bridge.call("getLayers", json!({})).await.unwrap_err();
    assert!(matches!(err, BridgeError::Application { .. }));
    Ok(())
}

#[tokio::test]
async fn test_timeout_then_recovers() -> Result<()> {
    let host = FakeHost::spawn().await?;
    let timeout = Duration::from_secs(1);
    let bridge = bridge_for(&host, timeout)?;

    let started = Instant::now();
    let err = bridge.dispatch("hang", json!({})).await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, BridgeError::Timeout(d) if d == timeout), "got {err:?}");
    assert!(elapsed >= timeout, "returned early after {elapsed:?}");
    assert!(elapsed < timeout + Duration::from_millis(900), "took {elapsed:?}");

    // The next call is unaffected by the stuck one.
    let result = bridge.dispatch("getDocumentInfo", json!({})).await?;
    assert!(result.is_success());
    Ok(())
}

#[tokio::test]
async fn test_malformed_and_mismatched_responses() -> Result<()> {
    let host = FakeHost::spawn().await?;
    let bridge = bridge_for(&host, Duration::from_secs(5))?;

    let err = bridge.dispatch("garbage", json!({})).await.unwrap_err();
    assert!(matches!(err, BridgeError::Protocol(_)), "got {err:?}");

    let err = bridge.dispatch("wrongId", json!({})).await.unwrap_err();
    assert!(matches!(err, BridgeError::Protocol(_)), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn test_sequence_over_http() -> Result<()> {
    let host = FakeHost::spawn().await?;
    let bridge = bridge_for(&host, Duration::from_secs(5))?;

    let sequence = Sequence::targeting(LayerId(42))
        .then(target::select_channel(Channel::Mask))
        .then(SubCommand::new("getLayers", json!({})))
        .restore_with(target::select_channel(Channel::Rgb));

    let err = bridge.run(sequence).await.unwrap_err();
    let BridgeError::SequenceAborted(abort) = err else {
        panic!("expected abort, got {err:?}");
    };
    assert_eq!(abort.step, 2);

    let operations: Vec<_> = host
        .received()
        .iter()
        .map(|body| body["operation"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(
        operations,
        vec![
            "executeBatchPlayCommand",
            "executeBatchPlayCommand",
            "getLayers",
            "executeBatchPlayCommand"
        ]
    );
    Ok(())
}
