//! Integration tests for the REST client against a loopback HTTP server
//!
//! The routes mirror the Sauce Labs v1 tunnel endpoints so the client is
//! exercised over a real HTTP round trip, including auth headers and
//! error mapping.

use axum::extract::Path;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{delete, get};
use axum::{Json, Router};
use sauce_connect_rest::{RestError, SauceRestClient, TunnelId};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr) -> SauceRestClient {
    SauceRestClient::new("acct", "secret-key").with_base_url(format!("http://{}", addr))
}

#[tokio::test]
async fn test_list_tunnels_parses_ids_in_wire_order() {
    let app = Router::new().route(
        "/rest/v1/{account}/tunnels",
        get(|| async { Json(vec!["t-1".to_string(), "t-2".to_string(), "t-0".to_string()]) }),
    );
    let addr = spawn_server(app).await;

    let tunnels = client_for(addr).list_tunnels().await.unwrap();
    assert_eq!(
        tunnels,
        vec![
            TunnelId::from("t-1"),
            TunnelId::from("t-2"),
            TunnelId::from("t-0")
        ]
    );
}

#[tokio::test]
async fn test_list_tunnels_sends_basic_auth() {
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&seen);
    let app = Router::new().route(
        "/rest/v1/{account}/tunnels",
        get(move |headers: HeaderMap| async move {
            if let Some(auth) = headers.get(header::AUTHORIZATION) {
                recorded
                    .lock()
                    .unwrap()
                    .push(auth.to_str().unwrap_or_default().to_string());
            }
            Json(Vec::<String>::new())
        }),
    );
    let addr = spawn_server(app).await;

    client_for(addr).list_tunnels().await.unwrap();

    // base64("acct:secret-key")
    let headers = seen.lock().unwrap();
    assert_eq!(headers.as_slice(), ["Basic YWNjdDpzZWNyZXQta2V5"]);
}

#[tokio::test]
async fn test_list_tunnels_maps_server_error_to_remote_unavailable() {
    let app = Router::new().route(
        "/rest/v1/{account}/tunnels",
        get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let addr = spawn_server(app).await;

    let err = client_for(addr).list_tunnels().await.unwrap_err();
    assert!(matches!(err, RestError::RemoteUnavailable(_)), "{err}");
}

#[tokio::test]
async fn test_list_tunnels_rejects_non_array_payload() {
    let app = Router::new().route(
        "/rest/v1/{account}/tunnels",
        get(|| async { Json(serde_json::json!({ "tunnels": ["t-1"] })) }),
    );
    let addr = spawn_server(app).await;

    let err = client_for(addr).list_tunnels().await.unwrap_err();
    assert!(matches!(err, RestError::MalformedResponse(_)), "{err}");
}

#[tokio::test]
async fn test_list_tunnels_unreachable_endpoint() {
    // Nothing listens on port 1
    let client = SauceRestClient::new("acct", "key").with_base_url("http://127.0.0.1:1");

    let err = client.list_tunnels().await.unwrap_err();
    assert!(matches!(err, RestError::RemoteUnavailable(_)), "{err}");
}

#[tokio::test]
async fn test_delete_tunnel_hits_tunnel_resource_and_discards_body() {
    let deleted: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&deleted);
    let app = Router::new().route(
        "/rest/v1/{account}/tunnels/{id}",
        delete(
            move |Path((account, id)): Path<(String, String)>| async move {
                recorded.lock().unwrap().push(format!("{}/{}", account, id));
                Json(serde_json::json!({ "result": true }))
            },
        ),
    );
    let addr = spawn_server(app).await;

    client_for(addr)
        .delete_tunnel(&TunnelId::from("t-9"))
        .await
        .unwrap();

    assert_eq!(deleted.lock().unwrap().as_slice(), ["acct/t-9"]);
}

#[tokio::test]
async fn test_delete_tunnel_maps_missing_tunnel_to_remote_unavailable() {
    let app = Router::new().route(
        "/rest/v1/{account}/tunnels/{id}",
        delete(|| async { StatusCode::NOT_FOUND }),
    );
    let addr = spawn_server(app).await;

    let err = client_for(addr)
        .delete_tunnel(&TunnelId::from("gone"))
        .await
        .unwrap_err();
    assert!(matches!(err, RestError::RemoteUnavailable(_)), "{err}");
}
