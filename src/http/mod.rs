//! Thin HTTP/1.1 + JSON adapter (§6). Hand-rolled request parsing over
//! a raw `TcpStream`, the same shape as the rest of the tree's wire
//! protocols: read into a growable buffer, try to parse a complete
//! message, dispatch, encode, write, close.
//!
//! One request per connection (`Connection: close`) — the core assumes
//! serial access (§5), so there is no value in keeping sockets open
//! across requests here.

use std::sync::Arc;

use bytes::BytesMut;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

use crate::error::{CoreError, MutationOutcome};
use crate::store::Store;

mod request;

use request::{ParseOutcome, Request};

type SharedStore = Arc<Mutex<Store>>;

/// Binds `port` and serves `/api/v1/*` until the process exits.
pub async fn serve(port: u16, store: Store) -> std::io::Result<()> {
    let shared: SharedStore = Arc::new(Mutex::new(store));
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "listening");

    loop {
        let (stream, addr) = listener.accept().await?;
        let shared = Arc::clone(&shared);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, shared).await {
                warn!(%addr, error = %e, "connection error");
            }
        });
    }
}

async fn handle_connection(mut stream: TcpStream, store: SharedStore) -> std::io::Result<()> {
    let mut buffer = BytesMut::with_capacity(4096);
    let request = loop {
        match Request::try_parse(&buffer) {
            ParseOutcome::Complete(req) => break req,
            ParseOutcome::Invalid => {
                stream.write_all(&bad_request().encode()).await?;
                return Ok(());
            }
            ParseOutcome::Incomplete => {}
        }
        let mut chunk = [0u8; 4096];
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buffer.extend_from_slice(&chunk[..n]);
    };

    // dispatch() runs Store's blocking device I/O (including fsync)
    // inline on this task rather than via spawn_blocking, so a slow
    // fsync briefly occupies a worker thread other connections are
    // scheduled on. Acceptable at the scale this adapter targets; for a
    // disk with high fsync latency this would want spawn_blocking.
    let response = dispatch(&request, &store);
    stream.write_all(&response.encode()).await?;
    Ok(())
}

struct HttpResponse {
    status: u16,
    body: Value,
}

impl HttpResponse {
    fn encode(&self) -> Vec<u8> {
        let reason = match self.status {
            200 => "OK",
            204 => "No Content",
            400 => "Bad Request",
            500 => "Internal Server Error",
            507 => "Insufficient Storage",
            _ => "Unknown",
        };
        let body = if self.status == 204 { String::new() } else { self.body.to_string() };
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status,
            reason,
            body.len(),
            body
        )
        .into_bytes()
    }
}

fn bad_request() -> HttpResponse {
    HttpResponse { status: 400, body: json!({"error": "bad request"}) }
}

fn no_content() -> HttpResponse {
    HttpResponse { status: 204, body: Value::Null }
}

fn ok(body: Value) -> HttpResponse {
    HttpResponse { status: 200, body }
}

fn from_core_error(e: CoreError) -> HttpResponse {
    if e.is_log_full() {
        HttpResponse { status: 507, body: json!({"error": "log full"}) }
    } else {
        error!(error = %e, "core error");
        HttpResponse { status: 500, body: json!({"error": "internal error"}) }
    }
}

fn node_id(body: &Value) -> Option<u64> {
    body.get("node_id")?.as_u64()
}

fn node_pair(body: &Value) -> Option<(u64, u64)> {
    Some((body.get("node_a_id")?.as_u64()?, body.get("node_b_id")?.as_u64()?))
}

fn dispatch(req: &Request, store: &SharedStore) -> HttpResponse {
    match req.path.as_str() {
        "/api/v1/add_node" => {
            let Some(id) = node_id(&req.body) else { return bad_request() };
            let mut store = store.lock();
            match store.add_vertex(id) {
                Ok(MutationOutcome::Applied) => ok(json!({"node_id": id})),
                Ok(_) => no_content(),
                Err(e) => from_core_error(e),
            }
        }
        "/api/v1/remove_node" => {
            let Some(id) = node_id(&req.body) else { return bad_request() };
            let mut store = store.lock();
            match store.remove_vertex(id) {
                Ok(MutationOutcome::Applied) => ok(json!({"node_id": id})),
                Ok(MutationOutcome::NoOp) => no_content(),
                Ok(MutationOutcome::BadRequest) => bad_request(),
                Err(e) => from_core_error(e),
            }
        }
        "/api/v1/get_node" => {
            let Some(id) = node_id(&req.body) else { return bad_request() };
            let store = store.lock();
            ok(json!({"in_graph": store.get_node(id) as u8}))
        }
        "/api/v1/get_neighbors" => {
            let Some(id) = node_id(&req.body) else { return bad_request() };
            let store = store.lock();
            match store.get_neighbors(id) {
                Some(neighbors) => ok(json!({"node_id": id, "neighbors": neighbors})),
                None => bad_request(),
            }
        }
        "/api/v1/add_edge" => {
            let Some((a, b)) = node_pair(&req.body) else { return bad_request() };
            let mut store = store.lock();
            match store.add_edge(a, b) {
                Ok(MutationOutcome::Applied) => ok(json!({"node_a_id": a, "node_b_id": b})),
                Ok(MutationOutcome::NoOp) => no_content(),
                Ok(MutationOutcome::BadRequest) => bad_request(),
                Err(e) => from_core_error(e),
            }
        }
        "/api/v1/remove_edge" => {
            let Some((a, b)) = node_pair(&req.body) else { return bad_request() };
            let mut store = store.lock();
            match store.remove_edge(a, b) {
                Ok(MutationOutcome::Applied) => ok(json!({"node_a_id": a, "node_b_id": b})),
                Ok(MutationOutcome::NoOp) => no_content(),
                Ok(MutationOutcome::BadRequest) => bad_request(),
                Err(e) => from_core_error(e),
            }
        }
        "/api/v1/get_edge" => {
            let Some((a, b)) = node_pair(&req.body) else { return bad_request() };
            let store = store.lock();
            ok(json!({"in_graph": store.get_edge(a, b) as u8}))
        }
        "/api/v1/shortest_path" => {
            let Some((a, b)) = node_pair(&req.body) else { return bad_request() };
            let mut store = store.lock();
            match store.shortest_path(a, b) {
                Some(-1) => no_content(),
                Some(distance) => ok(json!({"distance": distance})),
                None => bad_request(),
            }
        }
        "/api/v1/checkpoint" => {
            let mut store = store.lock();
            match store.checkpoint() {
                Ok(()) => ok(json!({})),
                Err(e) => from_core_error(e),
            }
        }
        _ => HttpResponse { status: 400, body: json!({"error": "unknown endpoint"}) },
    }
}
