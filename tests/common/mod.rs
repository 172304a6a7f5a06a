//! Shared helpers driving the browser side of the protocol in-memory.
//!
//! Tests run a real WebSocket handshake over `tokio::io::duplex`: the
//! crate side gets a [`Browser`], the test keeps the raw server stream
//! and plays the browser, reading envelopes and writing responses and
//! events frame by frame.

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::io::DuplexStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async, client_async};

use chromium_cdp::{Browser, ConnectOptions, Session, TargetId, Transport};

/// The fake browser's end of the wire.
pub type WsServer = WebSocketStream<DuplexStream>;

/// Installs a tracing subscriber honoring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Builds a connected [`Browser`] plus the browser-side stream.
pub async fn connected() -> (Browser, WsServer) {
    connected_with(ConnectOptions::default()).await
}

/// Builds a connected [`Browser`] with explicit options.
pub async fn connected_with(options: ConnectOptions) -> (Browser, WsServer) {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);

    let (client, server) = tokio::join!(
        client_async("ws://localhost/devtools/browser", client_io),
        accept_async(server_io),
    );

    let transport = Transport::from_stream(client.expect("client handshake").0);
    let browser = Browser::from_transport_with(transport, options);

    (browser, server.expect("server handshake"))
}

/// Reads the next outbound envelope as JSON.
pub async fn recv_envelope(ws: &mut WsServer) -> Value {
    loop {
        match ws.next().await.expect("frame").expect("frame ok") {
            Message::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("envelope json");
            }
            _ => continue,
        }
    }
}

/// Sends a raw text frame, valid JSON or not.
pub async fn send_raw(ws: &mut WsServer, text: &str) {
    ws.send(Message::Text(text.to_string().into()))
        .await
        .expect("send frame");
}

/// Sends a success response for a command ID.
pub async fn respond(ws: &mut WsServer, id: u64, session_id: Option<&str>, result: Value) {
    let mut reply = json!({"id": id, "result": result});
    if let Some(session_id) = session_id {
        reply["sessionId"] = json!(session_id);
    }
    send_raw(ws, &reply.to_string()).await;
}

/// Sends an error response for a command ID.
pub async fn respond_error(ws: &mut WsServer, id: u64, code: i64, message: &str) {
    let reply = json!({"id": id, "error": {"code": code, "message": message}});
    send_raw(ws, &reply.to_string()).await;
}

/// Publishes an event, optionally scoped to a session.
pub async fn emit_event(ws: &mut WsServer, method: &str, session_id: Option<&str>, params: Value) {
    let mut event = json!({"method": method, "params": params});
    if let Some(session_id) = session_id {
        event["sessionId"] = json!(session_id);
    }
    send_raw(ws, &event.to_string()).await;
}

/// Attaches to a target, playing the browser side of the handshake.
///
/// Asserts the attach envelope's shape on the way through.
pub async fn attach_session(
    browser: &Browser,
    ws: &mut WsServer,
    target: &str,
    session: &str,
) -> Session {
    let target_id = TargetId::new(target).expect("target id");

    let attach = browser.attach_to_target(&target_id);
    let serve = async {
        let envelope = recv_envelope(ws).await;
        assert_eq!(envelope["method"], "Target.attachToTarget");
        assert_eq!(envelope["params"]["targetId"], target);
        assert_eq!(envelope["params"]["flatten"], true);

        let id = envelope["id"].as_u64().expect("numeric id");
        respond(ws, id, None, json!({"sessionId": session})).await;
    };

    let (attached, ()) = tokio::join!(attach, serve);
    attached.expect("attach")
}

/// Attaches a child session from an existing session.
pub async fn attach_child_session(
    parent: &Session,
    ws: &mut WsServer,
    target: &str,
    session: &str,
) -> Session {
    let target_id = TargetId::new(target).expect("target id");

    let attach = parent.attach_to_target(&target_id);
    let serve = async {
        let envelope = recv_envelope(ws).await;
        assert_eq!(envelope["method"], "Target.attachToTarget");
        assert_eq!(envelope["sessionId"], parent.session_id().as_str());

        let id = envelope["id"].as_u64().expect("numeric id");
        respond(
            ws,
            id,
            Some(parent.session_id().as_str()),
            json!({"sessionId": session}),
        )
        .await;
    };

    let (attached, ()) = tokio::join!(attach, serve);
    attached.expect("attach child")
}

/// Services one command round trip with an empty success result.
pub async fn serve_ok(ws: &mut WsServer) {
    let envelope = recv_envelope(ws).await;
    let id = envelope["id"].as_u64().expect("numeric id");
    let session_id = envelope["sessionId"].as_str().map(str::to_owned);
    respond(ws, id, session_id.as_deref(), json!({})).await;
}
