//! End-to-end tests: a real listener on an ephemeral port, driven by a
//! hyper HTTP/1.1 client.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use dirserve::config::{AppState, Config};
use dirserve::server;
use futures::future::join_all;
use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::client::conn::http1;
use hyper::header::{HeaderMap, ALLOW, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use tempfile::TempDir;
use tokio::net::TcpStream;

struct Fetched {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

/// Lay out `<tmp>/static` plus a file outside of it, start the server on
/// 127.0.0.1:0 and return its address.
async fn start_server() -> (TempDir, SocketAddr) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("static");
    std::fs::create_dir_all(root.join("js")).unwrap();
    std::fs::create_dir_all(root.join("docs")).unwrap();
    std::fs::write(root.join("index.html"), "<h1>home</h1>").unwrap();
    std::fs::write(root.join("js/app.js"), "console.log('app');").unwrap();
    std::fs::write(root.join("docs/index.html"), "<h1>docs</h1>").unwrap();
    std::fs::write(dir.path().join("secret.txt"), "top secret").unwrap();

    let mut cfg = Config::load_from("dirserve-integration-test-no-file").unwrap();
    cfg.server.host = "127.0.0.1".to_string();
    cfg.server.port = 0;
    cfg.server.root = path_str(&root);

    let listener = server::create_listener(cfg.socket_addr().unwrap()).unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(AppState::new(cfg));
    tokio::spawn(server::serve(listener, state, std::future::pending()));

    (dir, addr)
}

fn path_str(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

async fn fetch(addr: SocketAddr, method: Method, uri: &str) -> Fetched {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut sender, conn) = http1::handshake(TokioIo::new(stream)).await.unwrap();
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("host", addr.to_string())
        .body(Empty::<Bytes>::new())
        .unwrap();
    let res = sender.send_request(req).await.unwrap();

    let status = res.status();
    let headers = res.headers().clone();
    let body = res.into_body().collect().await.unwrap().to_bytes();
    Fetched {
        status,
        headers,
        body,
    }
}

async fn get(addr: SocketAddr, uri: &str) -> Fetched {
    fetch(addr, Method::GET, uri).await
}

#[tokio::test]
async fn serves_file_bytes_with_content_type() {
    let (_dir, addr) = start_server().await;

    let res = get(addr, "/js/app.js").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(&res.body[..], b"console.log('app');");
    assert_eq!(
        res.headers.get(CONTENT_TYPE).unwrap(),
        "text/javascript; charset=utf-8"
    );
    assert_eq!(res.headers.get(CONTENT_LENGTH).unwrap(), "19");
}

#[tokio::test]
async fn root_serves_index() {
    let (_dir, addr) = start_server().await;

    let res = get(addr, "/").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(&res.body[..], b"<h1>home</h1>");

    let res = get(addr, "/docs").await;
    assert_eq!(res.status, StatusCode::MOVED_PERMANENTLY);
    assert_eq!(res.headers.get(LOCATION).unwrap(), "docs/");

    let res = get(addr, "/docs/").await;
    assert_eq!(&res.body[..], b"<h1>docs</h1>");
}

#[tokio::test]
async fn missing_file_is_404() {
    let (_dir, addr) = start_server().await;

    let res = get(addr, "/nope.html").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(&res.body[..], b"404 page not found\n");
}

#[tokio::test]
async fn traversal_never_leaves_root() {
    let (_dir, addr) = start_server().await;

    let res = get(addr, "/../secret.txt").await;
    assert_eq!(res.status, StatusCode::MOVED_PERMANENTLY);
    assert_eq!(res.headers.get(LOCATION).unwrap(), "/secret.txt");

    let res = get(addr, "/secret.txt").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = get(addr, "/%2e%2e/secret.txt").await;
    assert_ne!(res.status, StatusCode::OK);
    assert!(!res.body.windows(10).any(|w| w == b"top secret"));
}

#[tokio::test]
async fn head_has_headers_without_body() {
    let (_dir, addr) = start_server().await;

    let res = fetch(addr, Method::HEAD, "/index.html").await;
    // `/index.html` redirects to `./`
    assert_eq!(res.status, StatusCode::MOVED_PERMANENTLY);
    assert!(res.body.is_empty());

    let res = fetch(addr, Method::HEAD, "/js/app.js").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.headers.get(CONTENT_LENGTH).unwrap(), "19");
    assert!(res.body.is_empty());
}

#[tokio::test]
async fn other_methods_are_rejected() {
    let (_dir, addr) = start_server().await;

    let res = fetch(addr, Method::POST, "/js/app.js").await;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.headers.get(ALLOW).unwrap(), "GET, HEAD");
}

#[tokio::test]
async fn concurrent_requests_all_succeed() {
    let (_dir, addr) = start_server().await;

    let requests = (0..32).map(|i| async move {
        let uri = if i % 2 == 0 { "/js/app.js" } else { "/" };
        get(addr, uri).await
    });

    for res in join_all(requests).await {
        assert_eq!(res.status, StatusCode::OK);
        assert!(!res.body.is_empty());
    }
}

#[tokio::test]
async fn malformed_paths_are_rejected() {
    let (_dir, addr) = start_server().await;

    let res = get(addr, "/%FF").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = get(addr, "/index%00.html").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}
