//! Shared mock servers for integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

/// Request line of an HTTP request, e.g. `POST /api/v0/pin/add?arg=Qm.. HTTP/1.1`,
/// plus whether an `Authorization` header was sent.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct SeenRequest {
    pub request_line: String,
    pub authorized: bool,
}

async fn read_http_request(socket: &mut TcpStream) -> Option<SeenRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);

    let mut body_read = buf.len() - header_end;
    while body_read < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body_read += n;
    }

    Some(SeenRequest {
        request_line: head.lines().next().unwrap_or_default().to_string(),
        authorized: head.lines().any(|l| l.to_lowercase().starts_with("authorization:")),
    })
}

/// Start a programmable HTTP gateway. `f` maps each request to `(status, body)`.
#[allow(dead_code)]
pub async fn start_mock_gateway<F>(f: F) -> (SocketAddr, Arc<Mutex<Vec<SeenRequest>>>)
where
    F: Fn(&SeenRequest) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let seen_task = seen.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let seen = seen_task.clone();
                    tokio::spawn(async move {
                        let request = match read_http_request(&mut socket).await {
                            Some(request) => request,
                            None => return,
                        };
                        let (status, body) = f(&request);
                        seen.lock().unwrap().push(request);

                        let status_text = match status {
                            200 => "200 OK",
                            403 => "403 Forbidden",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            _ => "200 OK",
                        };
                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, seen)
}

/// JSON-RPC error returned by a mock node handler.
pub type RpcFailure = (i64, String);

/// A mock node speaking JSON-RPC over websocket.
#[allow(dead_code)]
pub struct MockNode {
    pub url: String,
    pub connections: Arc<AtomicUsize>,
    pub requests: Arc<Mutex<Vec<(String, Value)>>>,
}

/// Start a mock node answering every request through `handler`.
///
/// With `drop_first_connection`, the first socket is closed as soon as its
/// first request arrives, without an answer.
#[allow(dead_code)]
pub async fn start_mock_node<F>(handler: F, drop_first_connection: bool) -> MockNode
where
    F: Fn(&str, &Value) -> Result<Value, RpcFailure> + Send + Sync + 'static,
{
    start_mock_node_with_pushes(handler, |_: &str, _: &Value| Vec::new(), drop_first_connection).await
}

/// Like [`start_mock_node`], and after each reply sends the frames `push`
/// returns for that request (subscription notifications).
#[allow(dead_code)]
pub async fn start_mock_node_with_pushes<F, P>(handler: F, push: P, drop_first_connection: bool) -> MockNode
where
    F: Fn(&str, &Value) -> Result<Value, RpcFailure> + Send + Sync + 'static,
    P: Fn(&str, &Value) -> Vec<Value> + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let handler = Arc::new(handler);
    let push = Arc::new(push);

    let connections_task = connections.clone();
    let requests_task = requests.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let number = connections_task.fetch_add(1, Ordering::SeqCst);
            let handler = handler.clone();
            let push = push.clone();
            let requests = requests_task.clone();

            tokio::spawn(async move {
                let mut ws = match tokio_tungstenite::accept_async(socket).await {
                    Ok(ws) => ws,
                    Err(_) => return,
                };

                while let Some(Ok(message)) = ws.next().await {
                    let text = match message {
                        Message::Text(text) => text.to_string(),
                        Message::Close(_) => break,
                        _ => continue,
                    };
                    let request: Value = match serde_json::from_str(&text) {
                        Ok(request) => request,
                        Err(_) => continue,
                    };
                    let method = request["method"].as_str().unwrap_or_default().to_string();
                    let params = request["params"].clone();
                    requests.lock().unwrap().push((method.clone(), params.clone()));

                    if drop_first_connection && number == 0 {
                        return;
                    }

                    let reply = match handler(&method, &params) {
                        Ok(result) => json!({"jsonrpc": "2.0", "id": request["id"], "result": result}),
                        Err((code, message)) => json!({
                            "jsonrpc": "2.0",
                            "id": request["id"],
                            "error": {"code": code, "message": message}
                        }),
                    };
                    if ws.send(Message::Text(reply.to_string().into())).await.is_err() {
                        break;
                    }
                    for frame in push(&method, &params) {
                        if ws.send(Message::Text(frame.to_string().into())).await.is_err() {
                            return;
                        }
                    }
                }
            });
        }
    });

    MockNode {
        url: format!("ws://{}", addr),
        connections,
        requests,
    }
}
