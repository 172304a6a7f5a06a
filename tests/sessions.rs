//! Session lifecycle and routing: attach, detach, close, per-session
//! event isolation.

mod common;

use std::time::Duration;

use serde_json::json;
use tokio::time::timeout;

use chromium_cdp::{Error, TargetId};

#[tokio::test]
async fn attached_session_injects_its_id() {
    common::init_tracing();
    let (browser, mut ws) = common::connected().await;

    let session = common::attach_session(&browser, &mut ws, "T1", "S1").await;
    assert_eq!(session.session_id().as_str(), "S1");
    assert!(session.is_open());

    let call = session.send_command("Page.enable", None);
    let serve = async {
        let envelope = common::recv_envelope(&mut ws).await;
        assert_eq!(envelope["sessionId"], "S1");
        assert_eq!(envelope["method"], "Page.enable");

        let id = envelope["id"].as_u64().expect("numeric id");
        common::respond(&mut ws, id, Some("S1"), json!({"ok": true})).await;
    };

    let (result, ()) = tokio::join!(call, serve);
    assert_eq!(result.expect("result")["ok"], true);
}

#[tokio::test]
async fn attach_failure_maps_to_attach_failed() {
    let (browser, mut ws) = common::connected().await;
    let target_id = TargetId::new("missing").expect("target id");

    let attach = browser.attach_to_target(&target_id);
    let serve = async {
        let envelope = common::recv_envelope(&mut ws).await;
        let id = envelope["id"].as_u64().expect("numeric id");
        common::respond_error(&mut ws, id, -32602, "No target with given id found").await;
    };

    let (result, ()) = tokio::join!(attach, serve);
    let err = result.expect_err("attach must fail");
    assert!(matches!(err, Error::AttachFailed { .. }), "unexpected error: {err}");
    assert_eq!(browser.open_session_count(), 0);
}

#[tokio::test]
async fn closing_root_closes_every_descendant() {
    let (browser, mut ws) = common::connected().await;

    let session = common::attach_session(&browser, &mut ws, "T1", "S1").await;
    let child = common::attach_child_session(&session, &mut ws, "T2", "S2").await;
    assert_eq!(browser.open_session_count(), 2);

    browser.close();

    assert_eq!(browser.open_session_count(), 0);
    assert!(!session.is_open());

    let err = session
        .send_command("Page.enable", None)
        .await
        .expect_err("closed");
    assert!(matches!(err, Error::SessionClosed { .. }));

    let err = child
        .send_command("Page.enable", None)
        .await
        .expect_err("closed");
    assert!(matches!(err, Error::SessionClosed { .. }));
}

#[tokio::test]
async fn detach_leaves_siblings_and_connection_alive() {
    let (browser, mut ws) = common::connected().await;

    let first = common::attach_session(&browser, &mut ws, "T1", "S1").await;
    let second = common::attach_session(&browser, &mut ws, "T2", "S2").await;

    let detach = first.detach();
    let serve = async {
        let envelope = common::recv_envelope(&mut ws).await;
        assert_eq!(envelope["method"], "Target.detachFromTarget");
        assert_eq!(envelope["params"]["sessionId"], "S1");
        assert!(envelope.get("sessionId").is_none());

        let id = envelope["id"].as_u64().expect("numeric id");
        common::respond(&mut ws, id, None, json!({})).await;
    };
    let (detached, ()) = tokio::join!(detach, serve);
    detached.expect("detach");

    assert!(!first.is_open());
    assert!(!browser.is_closed());

    // Detaching again is a no-op, no wire traffic needed.
    first.detach().await.expect("idempotent detach");

    let err = first
        .send_command("Page.enable", None)
        .await
        .expect_err("closed");
    assert!(matches!(err, Error::SessionClosed { .. }));

    // The sibling still works over the same connection.
    let call = second.send_command("Runtime.enable", None);
    let serve = common::serve_ok(&mut ws);
    let (result, ()) = tokio::join!(call, serve);
    assert!(result.is_ok());
}

#[tokio::test]
async fn detach_closes_descendants_but_not_root() {
    let (browser, mut ws) = common::connected().await;

    let session = common::attach_session(&browser, &mut ws, "T1", "S1").await;
    let child = common::attach_child_session(&session, &mut ws, "T2", "S2").await;

    let detach = session.detach();
    let serve = common::serve_ok(&mut ws);
    let (detached, ()) = tokio::join!(detach, serve);
    detached.expect("detach");

    assert!(!child.is_open());
    let err = child
        .send_command("Page.enable", None)
        .await
        .expect_err("closed");
    assert!(matches!(err, Error::SessionClosed { .. }));

    // The root session is untouched.
    let call = browser.send_command("Target.getTargets", None);
    let serve = async {
        let envelope = common::recv_envelope(&mut ws).await;
        let id = envelope["id"].as_u64().expect("numeric id");
        common::respond(&mut ws, id, None, json!({"targetInfos": []})).await;
    };
    let (result, ()) = tokio::join!(call, serve);
    assert!(result.expect("targets")["targetInfos"].is_array());
}

#[tokio::test]
async fn close_target_closes_the_session() {
    let (browser, mut ws) = common::connected().await;

    let session = common::attach_session(&browser, &mut ws, "T1", "S1").await;

    let close = session.close_target();
    let serve = async {
        let envelope = common::recv_envelope(&mut ws).await;
        assert_eq!(envelope["method"], "Target.closeTarget");
        assert_eq!(envelope["params"]["targetId"], "T1");

        let id = envelope["id"].as_u64().expect("numeric id");
        common::respond(&mut ws, id, None, json!({"success": true})).await;
    };
    let (closed, ()) = tokio::join!(close, serve);
    closed.expect("close target");

    assert!(!session.is_open());
    assert!(!browser.is_closed());

    // Idempotent: no second command goes out.
    session.close_target().await.expect("idempotent close");
}

#[tokio::test]
async fn events_are_isolated_per_session() {
    let (browser, mut ws) = common::connected().await;

    let first = common::attach_session(&browser, &mut ws, "T1", "S1").await;
    let second = common::attach_session(&browser, &mut ws, "T2", "S2").await;

    let mut first_events = first
        .subscribe("Network.requestWillBeSent")
        .expect("subscribe");
    let mut second_events = second
        .subscribe("Network.requestWillBeSent")
        .expect("subscribe");
    let mut root_events = browser
        .subscribe("Network.requestWillBeSent")
        .expect("subscribe");

    common::emit_event(
        &mut ws,
        "Network.requestWillBeSent",
        Some("S1"),
        json!({"requestId": "r1"}),
    )
    .await;

    let params = first_events.next_event().await.expect("event for S1");
    assert_eq!(params["requestId"], "r1");

    // Neither the sibling nor the root subscriber sees S1's event.
    assert!(
        timeout(Duration::from_millis(50), second_events.next_event())
            .await
            .is_err()
    );
    assert!(
        timeout(Duration::from_millis(50), root_events.next_event())
            .await
            .is_err()
    );

    // A root-scoped event goes only to the root subscriber.
    common::emit_event(
        &mut ws,
        "Network.requestWillBeSent",
        None,
        json!({"requestId": "r2"}),
    )
    .await;

    let params = root_events.next_event().await.expect("root event");
    assert_eq!(params["requestId"], "r2");
    assert!(
        timeout(Duration::from_millis(50), first_events.next_event())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn detach_drops_stale_subscriptions() {
    let (browser, mut ws) = common::connected().await;

    let session = common::attach_session(&browser, &mut ws, "T1", "S1").await;
    let mut events = session.subscribe("Page.loadEventFired").expect("subscribe");

    let detach = session.detach();
    let serve = common::serve_ok(&mut ws);
    let (detached, ()) = tokio::join!(detach, serve);
    detached.expect("detach");

    // The registration died with the session: the stream ends rather
    // than seeing events for a browser-reused "S1".
    common::emit_event(&mut ws, "Page.loadEventFired", Some("S1"), json!({})).await;

    let ended = timeout(Duration::from_secs(1), events.next_event())
        .await
        .expect("must not hang");
    assert!(ended.is_none());
}

#[tokio::test]
async fn subscribe_on_closed_session_fails() {
    let (browser, mut ws) = common::connected().await;

    let session = common::attach_session(&browser, &mut ws, "T1", "S1").await;

    let detach = session.detach();
    let serve = common::serve_ok(&mut ws);
    let (detached, ()) = tokio::join!(detach, serve);
    detached.expect("detach");

    let err = session
        .subscribe("Page.loadEventFired")
        .expect_err("closed session");
    assert!(matches!(err, Error::SessionClosed { .. }));
}
